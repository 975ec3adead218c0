//! Account route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use shipdesk_core::UserRole;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::Registration;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A freshly issued token with its user.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// `POST /api/auth/register`
///
/// Every self-registered account is a shipper.
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>)> {
    let Json(registration) = body?;
    let user = state
        .auth()
        .register(registration, UserRole::Shipper)
        .await?;
    let token = state.tokens().issue(&user)?;
    Ok((StatusCode::CREATED, Json(Session { token, user })))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Session>> {
    let Json(request) = body?;
    let user = state.auth().login(&request.email, &request.password).await?;
    let token = state.tokens().issue(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(Session { token, user }))
}

/// `GET /api/auth/me`
pub async fn me(State(state): State<AppState>, RequireAuth(caller): RequireAuth) -> Result<Json<User>> {
    Ok(Json(state.auth().current_user(caller.id).await?))
}
