//! Server status endpoint

use axum::Json;
use serde::{Deserialize, Serialize};

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub module: String,
    pub version: String,
}

/// GET /api/status
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        module: "perfmap-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
