use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    schemas::{validate_input, LoginInput},
    services::passkey::verify_passkey,
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/auth/login", axum::routing::post(login))
}

/// Passkey check only. The session window is reported to the client, which
/// keeps the flag itself; no token is issued.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginInput>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;

    let Some(expected) = state.config.admin_passkey.as_deref() else {
        tracing::warn!("Login attempted but ADMIN_PASSKEY is not configured");
        return Err(AppError::Unauthorized("Login is not configured.".to_string()));
    };
    if !verify_passkey(expected, &payload.password) {
        tracing::info!("Rejected login attempt");
        return Err(AppError::Unauthorized("Invalid password.".to_string()));
    }

    let expires_at = Utc::now() + Duration::hours(state.config.auth_session_hours.max(1));
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "expiresAt": expires_at.to_rfc3339(),
    })))
}
