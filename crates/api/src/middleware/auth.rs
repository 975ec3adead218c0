//! Bearer-token extractors.
//!
//! Handlers ask for the caller by taking [`RequireAuth`] or [`RequireAdmin`]
//! as an argument:
//!
//! ```rust,ignore
//! async fn me(RequireAuth(user): RequireAuth) -> impl IntoResponse {
//!     format!("Hello, {}!", user.email)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use shipdesk_core::{UserId, UserRole};

use crate::error::{AppError, set_sentry_user};
use crate::services::shipments::Actor;
use crate::state::AppState;

/// The caller: a verified token's subject, with the account's current role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            role: self.role,
        }
    }
}

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 when the header is missing, malformed, forged or
/// expired, or the account is gone. The role is read from the account, so
/// role changes apply to tokens already issued.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_owned()))?;
        let claims = state.tokens().verify(token)?;
        let user = state.auth().current_user(claims.sub).await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(AuthUser {
            id: user.id,
            email: user.email.as_str().to_owned(),
            role: user.role,
        }))
    }
}

/// Extractor that requires an admin token.
///
/// Anonymous callers get 401, authenticated non-admins 403.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            tracing::warn!(user_id = %user.id, role = %user.role, "Admin route refused");
            return Err(AppError::Forbidden("Admin access required".to_owned()));
        }
        Ok(Self(user))
    }
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
