use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use server_api::{
    create_incident, ensure_incident_exists, list_incidents, update_incident_status, ApiContext,
};
use shared::{
    domain::{Incident, IncidentId},
    error::{ApiError, ErrorCode},
    protocol::{CreateIncidentRequest, HealthResponse, UpdateStatusRequest},
};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, %database_url, "incident server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/incidents", get(http_list_incidents).post(http_create_incident))
        .route("/incidents/:incident_id", put(http_update_incident_status))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| api_error(ApiError::new(ErrorCode::Internal, e.to_string())))?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

async fn http_list_incidents(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Incident>>> {
    list_incidents(&state.api).await.map(Json).map_err(api_error)
}

async fn http_create_incident(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateIncidentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Incident>)> {
    let Json(request) = payload.map_err(invalid_payload)?;
    let incident = create_incident(&state.api, request)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(incident)))
}

async fn http_update_incident_status(
    State(state): State<Arc<AppState>>,
    Path(incident_id): Path<i64>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Incident>> {
    let incident_id = IncidentId(incident_id);
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            // An unknown id reports 404 even when the body is also bad.
            ensure_incident_exists(&state.api, incident_id)
                .await
                .map_err(api_error)?;
            return Err(invalid_payload(rejection));
        }
    };

    update_incident_status(&state.api, incident_id, request)
        .await
        .map(Json)
        .map_err(api_error)
}

fn invalid_payload(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    warn!(error = %rejection.body_text(), "rejected incident payload");
    api_error(ApiError::new(
        ErrorCode::Validation,
        format!("Invalid JSON payload: {}", rejection.body_text()),
    ))
}

fn api_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => {
            error!(message = %err.message, "internal error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
