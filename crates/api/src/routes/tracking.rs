//! Public tracking lookup.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use super::shipments::ShipmentDetailView;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackingQuery {
    pub number: String,
}

/// `GET /api/tracking?number=`
///
/// Answers `null` when nothing matches, including input that cannot be a
/// tracking number.
pub async fn lookup(
    State(state): State<AppState>,
    query: std::result::Result<Query<TrackingQuery>, QueryRejection>,
) -> Result<Json<Option<ShipmentDetailView>>> {
    let Ok(Query(query)) = query else {
        return Ok(Json(None));
    };
    let detail = state.shipments().lookup(&query.number).await?;
    Ok(Json(detail.map(ShipmentDetailView::from)))
}
