use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use tracing::info;

use service::licenses::{DeleteOutcome, License, MutationOutcome, MutationRequest};

use crate::errors::ApiError;
use crate::state::ServerState;

/// Body of a `POST /api` answer. `error` only appears on a delete miss.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub data: Vec<License>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<MutationOutcome> for MutationResponse {
    fn from(outcome: MutationOutcome) -> Self {
        match outcome {
            MutationOutcome::Added(data) | MutationOutcome::Deleted(DeleteOutcome::Removed(data)) => {
                Self { success: true, data, error: None }
            }
            MutationOutcome::Deleted(DeleteOutcome::NotFound { data, message }) => {
                Self { success: false, data, error: Some(message) }
            }
        }
    }
}

#[utoipa::path(get, path = "/api", tag = "licenses", responses((status = 200, description = "All licenses", body = [crate::openapi::LicenseDoc]), (status = 500, description = "Storage unavailable")))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<License>>, ApiError> {
    let licenses = state.licenses.list().await?;
    Ok(Json(licenses))
}

#[utoipa::path(post, path = "/api", tag = "licenses", request_body = crate::openapi::MutationRequestDoc, responses((status = 200, description = "Mutation applied, or delete target missing (success=false)", body = crate::openapi::MutationResponseDoc), (status = 400, description = "Invalid or duplicate id"), (status = 403, description = "Wrong admin password"), (status = 405, description = "Unknown action"), (status = 500, description = "Storage unavailable")))]
pub async fn mutate(
    State(state): State<ServerState>,
    body: Result<Json<MutationRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(req) = body?;
    let action = req.action.clone();
    let resp = MutationResponse::from(state.licenses.apply(req).await?);
    info!(%action, success = resp.success, count = resp.data.len(), "license mutation");
    Ok(Json(resp))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
