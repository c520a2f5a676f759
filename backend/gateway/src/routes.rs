use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::{error, info};

use screentask_core::TaskError;

use crate::auth::RequireAuth;
use crate::server::GatewayState;

/// Maps a `TaskError` onto the HTTP contract.
#[derive(Debug)]
pub struct ApiError(pub TaskError);

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self.0 {
            TaskError::Authentication(d) => (
                StatusCode::UNAUTHORIZED,
                "User not found or error fetching user",
                d,
            ),
            TaskError::Listing(d) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list screenshots",
                d,
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
                other.to_string(),
            ),
        };
        (status, Json(json!({ "error": message, "details": details }))).into_response()
    }
}

/// `GET /api/user-outputs`: screenshots turned into tasks.
pub async fn user_outputs(
    State(state): State<Arc<GatewayState>>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>, ApiError> {
    let tasks = state.pipeline.run(&user.id).await.map_err(|e| {
        error!(user_id = %user.id, error = %e, "Task generation failed");
        ApiError(e)
    })?;

    if tasks.is_empty() {
        return Ok(Json(json!({ "error": "No screenshots found" })));
    }

    info!(user_id = %user.id, tasks = tasks.len(), "Returning tasks");
    Ok(Json(json!({ "tasks": tasks })))
}

/// `GET /api/user-screenshots`: the caller's screenshots with public URLs.
pub async fn user_screenshots(
    State(state): State<Arc<GatewayState>>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>, ApiError> {
    let files = state.pipeline.enumerator().list(&user.id).await?;
    Ok(Json(json!({ "files": files })))
}
