//! Carrier and quote route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::error::Result;
use crate::models::Carrier;
use crate::services::shipments::{Quote, QuoteRequest};
use crate::state::AppState;

/// `GET /api/carriers`: active carriers ordered by name.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Carrier>>> {
    let carriers = state.carriers().list_active().await?;
    Ok(Json(carriers.as_ref().clone()))
}

/// `POST /api/quotes`
pub async fn quote(
    State(state): State<AppState>,
    body: std::result::Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<Quote>> {
    let Json(request) = body?;
    Ok(Json(state.shipments().quote(request).await?))
}
