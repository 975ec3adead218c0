//! Shipment route handlers (owner-scoped dashboard API).

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Serialize;

use shipdesk_core::{ShipmentId, ShipmentStatus, StatusTone};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Shipment, ShipmentDetail, TrackingEvent};
use crate::services::shipments::{CreateShipment, ListParams, ShipmentStats, StatusUpdate};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A shipment with its display helpers.
#[derive(Debug, Serialize)]
pub struct ShipmentView {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub status_label: &'static str,
    pub status_tone: StatusTone,
    /// Statuses the shipment may move to next.
    pub next_statuses: Vec<ShipmentStatus>,
}

impl From<Shipment> for ShipmentView {
    fn from(shipment: Shipment) -> Self {
        let status = shipment.status;
        Self {
            shipment,
            status_label: status.label(),
            status_tone: status.tone(),
            next_statuses: status.next_statuses(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: TrackingEvent,
    pub status_label: &'static str,
    pub status_tone: StatusTone,
}

impl From<TrackingEvent> for EventView {
    fn from(event: TrackingEvent) -> Self {
        let status = event.status;
        Self {
            event,
            status_label: status.label(),
            status_tone: status.tone(),
        }
    }
}

/// A shipment and its history, newest event first.
#[derive(Debug, Serialize)]
pub struct ShipmentDetailView {
    #[serde(flatten)]
    pub shipment: ShipmentView,
    pub events: Vec<EventView>,
}

impl From<ShipmentDetail> for ShipmentDetailView {
    fn from(detail: ShipmentDetail) -> Self {
        Self {
            shipment: detail.shipment.into(),
            events: detail.events.into_iter().map(EventView::from).collect(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/shipments?status=&limit=&offset=`
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<ShipmentView>>> {
    let Query(params) = params?;
    let shipments = state.shipments().list(caller.id, params).await?;
    Ok(Json(shipments.into_iter().map(ShipmentView::from).collect()))
}

/// `POST /api/shipments`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    body: std::result::Result<Json<CreateShipment>, JsonRejection>,
) -> Result<(StatusCode, Json<ShipmentDetailView>)> {
    let Json(request) = body?;
    let detail = state.shipments().create(caller.id, request).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// `GET /api/shipments/stats`
pub async fn stats(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ShipmentStats>> {
    Ok(Json(state.shipments().stats(caller.id).await?))
}

/// `GET /api/shipments/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    id: std::result::Result<Path<ShipmentId>, PathRejection>,
) -> Result<Json<ShipmentDetailView>> {
    let Path(id) = id?;
    let detail = state.shipments().get_for_owner(caller.id, id).await?;
    Ok(Json(detail.into()))
}

/// `POST /api/shipments/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    id: std::result::Result<Path<ShipmentId>, PathRejection>,
    body: std::result::Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<ShipmentDetailView>> {
    let Path(id) = id?;
    let Json(update) = body?;
    let detail = state
        .shipments()
        .transition(caller.actor(), id, update)
        .await?;
    Ok(Json(detail.into()))
}
