use shared::{
    domain::{Incident, IncidentId, IncidentStatus},
    error::{ApiError, ErrorCode},
    protocol::{CreateIncidentRequest, UpdateStatusRequest},
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_incidents(ctx: &ApiContext) -> Result<Vec<Incident>, ApiError> {
    ctx.storage.list_incidents().await.map_err(internal)
}

/// Stores a new incident. Title and description must be present but may be
/// empty; the status defaults to `open`.
pub async fn create_incident(
    ctx: &ApiContext,
    request: CreateIncidentRequest,
) -> Result<Incident, ApiError> {
    let (Some(title), Some(description)) = (request.title, request.description) else {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "'title' and 'description' are required fields",
        ));
    };
    let status = request.status.unwrap_or(IncidentStatus::Open);

    let incident = ctx
        .storage
        .create_incident(&title, &description, status)
        .await
        .map_err(internal)?;
    info!(incident_id = incident.id.0, %status, "incident created");
    Ok(incident)
}

pub async fn update_incident_status(
    ctx: &ApiContext,
    incident_id: IncidentId,
    request: UpdateStatusRequest,
) -> Result<Incident, ApiError> {
    ensure_incident_exists(ctx, incident_id).await?;

    let status = request
        .status
        .ok_or_else(|| ApiError::new(ErrorCode::Validation, "'status' field is required"))?;

    let incident = ctx
        .storage
        .update_incident_status(incident_id, status)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "Incident not found"))?;
    info!(incident_id = incident_id.0, %status, "incident status updated");
    Ok(incident)
}

pub async fn ensure_incident_exists(
    ctx: &ApiContext,
    incident_id: IncidentId,
) -> Result<(), ApiError> {
    match ctx
        .storage
        .get_incident(incident_id)
        .await
        .map_err(internal)?
    {
        Some(_) => Ok(()),
        None => Err(ApiError::new(ErrorCode::NotFound, "Incident not found")),
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}
