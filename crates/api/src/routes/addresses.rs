//! Address book route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::db::AddressStore;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressDetails, FieldErrors, NewAddress};
use crate::state::AppState;

/// Body of a create-address request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateAddress {
    #[serde(flatten)]
    pub details: AddressDetails,
    pub is_default: bool,
}

/// `GET /api/addresses`: default first, then newest.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.store().list_addresses(caller.id).await?))
}

/// `POST /api/addresses`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    body: std::result::Result<Json<CreateAddress>, JsonRejection>,
) -> Result<(StatusCode, Json<Address>)> {
    let Json(request) = body?;
    let details = request.details.normalized();

    let mut errors = FieldErrors::new();
    details.validate("address", &mut errors);
    errors.into_result().map_err(AppError::Validation)?;

    let address = state
        .store()
        .create_address(NewAddress {
            user_id: caller.id,
            details,
            is_default: request.is_default,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}
