// handlers/public/mod.rs - endpoints on the public allow-list
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - service information
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Freelance API (Rust)",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Freelance marketplace API with role-based route authorization",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "me": "/api/me (authenticated)",
                "missions": "/api/missions[/:id] (role policy, ownership for writes)",
                "roles": "/api/users/:identity/role (admin)",
            }
        }
    }))
}

/// GET /health - store health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let accounts = state.accounts.health_check().await;
    let missions = state.missions.health_check().await;

    match accounts.and(missions) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

/// Fallback for unrouted paths. Runs behind the gate like any other route.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}
