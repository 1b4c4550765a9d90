use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::warn;

use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET /
pub async fn root() -> ApiResponse<()> {
    ApiResponse::ok_message("Serveur Outil Suivi Dev")
}

/// GET /health - 503 while the database cannot be reached
pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response(),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable",
                    }
                })),
            )
                .into_response()
        }
    }
}
