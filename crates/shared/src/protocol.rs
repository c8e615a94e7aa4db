use serde::{Deserialize, Serialize};

use crate::domain::{IncidentId, IncidentStatus};

pub const INCIDENTS_PATH: &str = "/incidents";

pub fn incident_path(id: IncidentId) -> String {
    format!("{INCIDENTS_PATH}/{id}")
}

/// Body of `POST /incidents`. The server requires `title` and `description`
/// to be present; `status` falls back to `open`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIncidentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
}

/// Body of `PUT /incidents/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<IncidentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
