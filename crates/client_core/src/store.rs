use std::sync::Arc;

use shared::{domain::Incident, protocol::INCIDENTS_PATH};

use crate::{
    error::TransportError,
    transport::{decode, describe, Method, Transport},
};

/// Read-only client view of the server's incidents. Holds nothing between
/// calls; the server stays authoritative.
#[derive(Clone)]
pub struct IncidentStoreProxy {
    transport: Arc<dyn Transport>,
}

impl IncidentStoreProxy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Incidents exactly as the server returned them, in its order.
    pub async fn list(&self) -> Result<Vec<Incident>, TransportError> {
        let value = self
            .transport
            .request(Method::Get, INCIDENTS_PATH, None)
            .await?;
        decode(&describe(Method::Get, INCIDENTS_PATH), value)
    }
}
