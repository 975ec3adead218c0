//! Shipment lifecycle: creation, queries, status changes and cost.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use shipdesk_core::{
    CarrierId, CostBreakdown, ServiceOptions, ShipmentId, ShipmentStatus, ShippingFees,
    TrackingNumber, TrackingNumberGenerator, TransitionError, UserId, UserRole,
};

use super::carriers::CarrierDirectory;
use crate::db::{RepositoryError, ShipmentStore, Store};
use crate::models::{
    AddressDetails, Carrier, FieldErrors, NewShipment, NewTrackingEvent, PackageDetails,
    Shipment, ShipmentDetail, ShipmentFilter, trim_optional,
};

/// Description of the event written when a shipment is created.
pub const CREATED_DESCRIPTION: &str = "Shipment created and ready for pickup";

/// Attempts at allocating an unused tracking number.
const MAX_TRACKING_ATTEMPTS: u32 = 5;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

/// Errors from shipment operations.
#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error("invalid shipment: {0}")]
    Validation(FieldErrors),

    /// Missing, or owned by someone else.
    #[error("shipment not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Lost a race, or ran out of tracking numbers.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Body of a create-shipment request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateShipment {
    pub carrier_id: String,
    pub sender: AddressDetails,
    pub recipient: AddressDetails,
    pub package: PackageDetails,
    pub insurance: bool,
    pub signature_required: bool,
}

impl CreateShipment {
    const fn options(&self) -> ServiceOptions {
        ServiceOptions {
            insurance: self.insurance,
            signature_required: self.signature_required,
        }
    }
}

/// Body of a quote request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteRequest {
    pub carrier_id: String,
    pub insurance: bool,
    pub signature_required: bool,
}

/// A priced quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub carrier_id: CarrierId,
    pub carrier_name: String,
    #[serde(flatten)]
    pub breakdown: CostBreakdown,
}

/// A requested status change.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: ShipmentStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// When it physically happened; defaults to now.
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
}

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: UserRole,
}

/// Listing parameters as received.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<ShipmentStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListParams {
    /// Apply the default and maximum page size.
    #[must_use]
    pub fn into_filter(self) -> ShipmentFilter {
        ShipmentFilter {
            status: self.status,
            limit: Some(
                self.limit
                    .unwrap_or(DEFAULT_PAGE_SIZE)
                    .clamp(1, MAX_PAGE_SIZE),
            ),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentStats {
    pub total: u64,
    /// Every status, including those with no shipments.
    pub by_status: BTreeMap<&'static str, u64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    /// Shipments not yet in a terminal state.
    pub active: u64,
}

/// Shipment operations.
pub struct ShipmentService<'a> {
    store: &'a dyn Store,
    carriers: &'a CarrierDirectory,
    tracking: &'a TrackingNumberGenerator,
    fees: ShippingFees,
}

impl<'a> ShipmentService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        carriers: &'a CarrierDirectory,
        tracking: &'a TrackingNumberGenerator,
        fees: ShippingFees,
    ) -> Self {
        Self {
            store,
            carriers,
            tracking,
            fees,
        }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Validate and persist a new shipment with its creation event.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentError::Validation` listing every bad field, or
    /// `ShipmentError::Conflict` if no unused tracking number was found.
    pub async fn create(
        &self,
        owner: UserId,
        request: CreateShipment,
    ) -> Result<ShipmentDetail, ShipmentError> {
        let options = request.options();
        let sender = request.sender.normalized();
        let recipient = request.recipient.normalized();
        let package = request.package.normalized();

        let mut errors = FieldErrors::new();
        sender.validate("sender", &mut errors);
        recipient.validate("recipient", &mut errors);
        package.validate(&mut errors);
        let carrier = self
            .resolve_carrier(&request.carrier_id, &package.service_type, &mut errors)
            .await?;

        let Some(carrier) = carrier.filter(|_| errors.is_empty()) else {
            return Err(ShipmentError::Validation(errors));
        };

        let cost = self.fees.quote(carrier.base_rate, options).total;
        let initial_event = NewTrackingEvent {
            status: ShipmentStatus::Pending,
            description: CREATED_DESCRIPTION.to_owned(),
            location: sender.origin_location(),
            event_time: Utc::now(),
        };

        for attempt in 1..=MAX_TRACKING_ATTEMPTS {
            let new = NewShipment {
                tracking_number: self.tracking.generate(),
                user_id: owner,
                carrier_id: carrier.id.clone(),
                sender: sender.clone(),
                recipient: recipient.clone(),
                package: package.clone(),
                options,
                cost,
                estimated_delivery: None,
                initial_event: initial_event.clone(),
            };

            match self.store.create_shipment(new).await {
                Ok(detail) => {
                    info!(
                        shipment_id = %detail.shipment.id,
                        tracking_number = %detail.shipment.tracking_number,
                        carrier_id = %carrier.id,
                        "Shipment created"
                    );
                    return Ok(detail);
                }
                Err(RepositoryError::Conflict(_)) => {
                    warn!(attempt, "Tracking number collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ShipmentError::Conflict(
            "could not allocate a unique tracking number".to_owned(),
        ))
    }

    /// Find the active carrier for a request, recording problems in `errors`.
    async fn resolve_carrier(
        &self,
        raw_id: &str,
        service_type: &str,
        errors: &mut FieldErrors,
    ) -> Result<Option<Carrier>, ShipmentError> {
        if raw_id.trim().is_empty() {
            errors.add("carrier_id", "is required");
            return Ok(None);
        }
        let Ok(id) = CarrierId::parse(raw_id) else {
            errors.add("carrier_id", "unknown carrier");
            return Ok(None);
        };
        let Some(carrier) = self.carriers.get(&id).await?.filter(|c| c.is_active) else {
            errors.add("carrier_id", "unknown carrier");
            return Ok(None);
        };

        if !service_type.is_empty() && !carrier.offers(service_type) {
            errors.add(
                "package.service_type",
                format!("not offered by {}", carrier.name),
            );
        }
        Ok(Some(carrier))
    }

    // =========================================================================
    // Cost
    // =========================================================================

    /// Price a carrier and service options without creating anything.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentError::Validation` for an unknown carrier.
    pub async fn quote(&self, request: QuoteRequest) -> Result<Quote, ShipmentError> {
        let mut errors = FieldErrors::new();
        let carrier = self
            .resolve_carrier(&request.carrier_id, "", &mut errors)
            .await?;
        let Some(carrier) = carrier else {
            return Err(ShipmentError::Validation(errors));
        };

        let options = ServiceOptions {
            insurance: request.insurance,
            signature_required: request.signature_required,
        };
        Ok(Quote {
            breakdown: self.fees.quote(carrier.base_rate, options),
            carrier_id: carrier.id,
            carrier_name: carrier.name,
        })
    }

    /// Replace the stored cost with the one derived from the carrier and
    /// current fees. The stored value is kept when the carrier is gone.
    async fn reconcile_cost(&self, shipment: &mut Shipment) -> Result<(), ShipmentError> {
        let Some(carrier) = self.carriers.get(&shipment.carrier_id).await? else {
            return Ok(());
        };
        let derived = self.fees.quote(carrier.base_rate, shipment.options()).total;
        if derived != shipment.cost {
            warn!(
                shipment_id = %shipment.id,
                stored = %shipment.cost,
                derived = %derived,
                "Stored shipment cost differs from derived cost"
            );
            shipment.cost = derived;
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// One of the owner's shipments with its events.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentError::NotFound` if the shipment does not exist or
    /// belongs to someone else.
    pub async fn get_for_owner(
        &self,
        owner: UserId,
        id: ShipmentId,
    ) -> Result<ShipmentDetail, ShipmentError> {
        let mut detail = self
            .store
            .get_shipment(id)
            .await?
            .filter(|d| d.shipment.user_id == owner)
            .ok_or(ShipmentError::NotFound)?;
        self.reconcile_cost(&mut detail.shipment).await?;
        Ok(detail)
    }

    /// The owner's shipments, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentError::Repository` if the store fails.
    pub async fn list(
        &self,
        owner: UserId,
        params: ListParams,
    ) -> Result<Vec<Shipment>, ShipmentError> {
        let mut shipments = self
            .store
            .list_shipments(owner, params.into_filter())
            .await?;
        for shipment in &mut shipments {
            self.reconcile_cost(shipment).await?;
        }
        Ok(shipments)
    }

    /// Public lookup by tracking number. Input that cannot be a tracking
    /// number finds nothing.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentError::Repository` if the store fails.
    pub async fn lookup(&self, raw: &str) -> Result<Option<ShipmentDetail>, ShipmentError> {
        let Ok(number) = TrackingNumber::parse(raw) else {
            return Ok(None);
        };
        let Some(mut detail) = self.store.find_by_tracking_number(&number).await? else {
            return Ok(None);
        };
        self.reconcile_cost(&mut detail.shipment).await?;
        Ok(Some(detail))
    }

    /// Counters over all of the owner's shipments.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentError::Repository` if the store fails.
    pub async fn stats(&self, owner: UserId) -> Result<ShipmentStats, ShipmentError> {
        let shipments = self
            .store
            .list_shipments(owner, ShipmentFilter::default())
            .await?;

        let mut stats = ShipmentStats {
            total: 0,
            by_status: ShipmentStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect(),
            total_cost: Decimal::ZERO,
            active: 0,
        };
        for mut shipment in shipments {
            self.reconcile_cost(&mut shipment).await?;
            stats.total += 1;
            *stats.by_status.entry(shipment.status.as_str()).or_default() += 1;
            stats.total_cost += shipment.cost;
            if !shipment.status.is_terminal() {
                stats.active += 1;
            }
        }
        Ok(stats)
    }

    // =========================================================================
    // Status changes
    // =========================================================================

    /// Move a shipment to a new status and append the matching event.
    ///
    /// Carriers and admins may move any shipment; a shipper may only cancel
    /// their own.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentError::NotFound` for missing shipments (and other
    /// shippers' shipments), `ShipmentError::Forbidden` for a shipper asking
    /// for anything but a cancellation, `ShipmentError::Transition` for an
    /// illegal move and `ShipmentError::Conflict` if the status changed
    /// concurrently.
    pub async fn transition(
        &self,
        actor: Actor,
        id: ShipmentId,
        mut update: StatusUpdate,
    ) -> Result<ShipmentDetail, ShipmentError> {
        let current = self
            .store
            .get_shipment(id)
            .await?
            .ok_or(ShipmentError::NotFound)?
            .shipment;

        if !actor.role.operates_shipments() {
            if current.user_id != actor.user_id {
                return Err(ShipmentError::NotFound);
            }
            if update.status != ShipmentStatus::Cancelled {
                return Err(ShipmentError::Forbidden(
                    "only carriers and admins can update shipment progress",
                ));
            }
        }

        let target = current.status.transition_to(update.status)?;

        trim_optional(&mut update.description);
        trim_optional(&mut update.location);
        let event = NewTrackingEvent {
            status: target,
            description: update
                .description
                .unwrap_or_else(|| target.label().to_owned()),
            location: update.location,
            event_time: update.event_time.unwrap_or_else(Utc::now),
        };

        let mut detail = self
            .store
            .transition_shipment(id, current.status, event)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => ShipmentError::Conflict(message),
                RepositoryError::NotFound => ShipmentError::NotFound,
                other => ShipmentError::Repository(other),
            })?;

        info!(
            shipment_id = %id,
            from = %current.status,
            to = %target,
            actor_id = %actor.user_id,
            "Shipment status changed"
        );
        self.reconcile_cost(&mut detail.shipment).await?;
        Ok(detail)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::db::MemoryStore;
    use crate::models::NewCarrier;

    struct Fixture {
        store: Arc<MemoryStore>,
        carriers: CarrierDirectory,
        tracking: TrackingNumberGenerator,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::with_carriers([
                NewCarrier {
                    id: CarrierId::parse("carrier-1").unwrap(),
                    name: "Carrier One".to_owned(),
                    base_rate: Decimal::from_str("20.00").unwrap(),
                    service_types: vec!["standard".to_owned(), "express".to_owned()],
                    is_active: true,
                },
                NewCarrier {
                    id: CarrierId::parse("retired").unwrap(),
                    name: "Retired".to_owned(),
                    base_rate: Decimal::from_str("9.00").unwrap(),
                    service_types: vec![],
                    is_active: false,
                },
            ]));
            let carriers = CarrierDirectory::new(store.clone(), Duration::from_secs(300));
            Self {
                store,
                carriers,
                tracking: TrackingNumberGenerator::default(),
            }
        }

        fn service(&self) -> ShipmentService<'_> {
            ShipmentService::new(
                self.store.as_ref(),
                &self.carriers,
                &self.tracking,
                ShippingFees::default(),
            )
        }
    }

    fn address(city: &str) -> AddressDetails {
        AddressDetails {
            name: "Alice".to_owned(),
            email: "a@x.com".to_owned(),
            phone: "+966500000000".to_owned(),
            street: "1 King Rd".to_owned(),
            city: city.to_owned(),
            state: "Eastern".to_owned(),
            zip: "31411".to_owned(),
            country: "SA".to_owned(),
            ..AddressDetails::default()
        }
    }

    fn request() -> CreateShipment {
        CreateShipment {
            carrier_id: "carrier-1".to_owned(),
            sender: address("Dammam"),
            recipient: address("Riyadh"),
            package: PackageDetails {
                weight: Decimal::from_str("2.5").unwrap(),
                length: Decimal::from(30),
                width: Decimal::from(20),
                height: Decimal::from(10),
                value: Decimal::from(100),
                description: "Documents".to_owned(),
                service_type: "standard".to_owned(),
            },
            insurance: true,
            signature_required: false,
        }
    }

    fn shipper(user_id: UserId) -> Actor {
        Actor {
            user_id,
            role: UserRole::Shipper,
        }
    }

    fn update(status: ShipmentStatus) -> StatusUpdate {
        StatusUpdate {
            status,
            description: None,
            location: None,
            event_time: None,
        }
    }

    #[tokio::test]
    async fn create_writes_one_pending_event_at_the_sender_city() {
        let fixture = Fixture::new();
        let owner = UserId::generate();
        let detail = fixture.service().create(owner, request()).await.unwrap();

        assert_eq!(detail.shipment.status, ShipmentStatus::Pending);
        assert_eq!(detail.shipment.cost, Decimal::from(25));
        assert_eq!(detail.shipment.user_id, owner);
        assert_eq!(detail.events.len(), 1);
        assert_eq!(detail.events[0].status, ShipmentStatus::Pending);
        assert_eq!(detail.events[0].description, CREATED_DESCRIPTION);
        assert_eq!(detail.events[0].location.as_deref(), Some("Dammam"));
    }

    #[tokio::test]
    async fn tracking_number_collisions_are_retried() {
        let fixture = Fixture::new();
        let service = fixture.service();
        let owner = UserId::generate();

        fixture.store.collide_next_inserts(MAX_TRACKING_ATTEMPTS - 1);
        let detail = service.create(owner, request()).await.unwrap();
        assert_eq!(detail.events.len(), 1);
        assert_eq!(service.list(owner, ListParams::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tracking_number_retries_are_bounded() {
        let fixture = Fixture::new();
        let service = fixture.service();
        let owner = UserId::generate();

        fixture.store.collide_next_inserts(MAX_TRACKING_ATTEMPTS);
        let err = service.create(owner, request()).await.unwrap_err();
        assert!(matches!(err, ShipmentError::Conflict(_)));
        assert!(service.list(owner, ListParams::default()).await.unwrap().is_empty());

        // The store recovers once the collisions are used up.
        assert!(service.create(owner, request()).await.is_ok());
    }

    #[tokio::test]
    async fn blank_sender_city_is_rejected() {
        let fixture = Fixture::new();
        let mut req = request();
        req.sender.city = "   ".to_owned();
        let err = fixture
            .service()
            .create(UserId::generate(), req)
            .await
            .unwrap_err();
        let ShipmentError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields.get("sender.city"), Some("is required"));
        assert_eq!(fields.iter().count(), 1);
    }

    #[tokio::test]
    async fn create_reports_all_problems() {
        let fixture = Fixture::new();
        let err = fixture
            .service()
            .create(UserId::generate(), CreateShipment::default())
            .await
            .unwrap_err();

        let ShipmentError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        for field in [
            "carrier_id",
            "sender.name",
            "recipient.email",
            "package.weight",
            "package.description",
        ] {
            assert!(fields.get(field).is_some(), "missing error for {field}");
        }
    }

    #[tokio::test]
    async fn create_rejects_inactive_carriers_and_unknown_services() {
        let fixture = Fixture::new();

        let mut retired = request();
        retired.carrier_id = "retired".to_owned();
        let Err(ShipmentError::Validation(fields)) =
            fixture.service().create(UserId::generate(), retired).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(fields.get("carrier_id"), Some("unknown carrier"));

        let mut overnight = request();
        overnight.package.service_type = "overnight".to_owned();
        let Err(ShipmentError::Validation(fields)) =
            fixture.service().create(UserId::generate(), overnight).await
        else {
            panic!("expected validation error");
        };
        assert!(fields.get("package.service_type").is_some());
    }

    #[tokio::test]
    async fn cost_matches_every_flag_combination() {
        let fixture = Fixture::new();
        for (insurance, signature_required, expected) in [
            (false, false, "20.00"),
            (true, false, "25.00"),
            (false, true, "23.00"),
            (true, true, "28.00"),
        ] {
            let mut req = request();
            req.insurance = insurance;
            req.signature_required = signature_required;
            let detail = fixture
                .service()
                .create(UserId::generate(), req)
                .await
                .unwrap();
            assert_eq!(detail.shipment.cost, Decimal::from_str(expected).unwrap());
        }
    }

    #[tokio::test]
    async fn other_owners_cannot_see_a_shipment() {
        let fixture = Fixture::new();
        let owner = UserId::generate();
        let detail = fixture.service().create(owner, request()).await.unwrap();
        let id = detail.shipment.id;

        assert!(fixture.service().get_for_owner(owner, id).await.is_ok());
        assert!(matches!(
            fixture.service().get_for_owner(UserId::generate(), id).await,
            Err(ShipmentError::NotFound)
        ));
    }

    #[tokio::test]
    async fn lookup_never_errors_on_bad_input() {
        let fixture = Fixture::new();
        let service = fixture.service();
        assert!(service.lookup("").await.unwrap().is_none());
        assert!(service.lookup("not a number").await.unwrap().is_none());
        assert!(service.lookup("TRK00000000ZZZZ").await.unwrap().is_none());

        let detail = service.create(UserId::generate(), request()).await.unwrap();
        let number = detail.shipment.tracking_number.as_str().to_lowercase();
        let found = service.lookup(&format!(" {number} ")).await.unwrap().unwrap();
        assert_eq!(found.shipment.id, detail.shipment.id);
    }

    #[tokio::test]
    async fn carriers_move_shipments_forward_one_step_at_a_time() {
        let fixture = Fixture::new();
        let service = fixture.service();
        let detail = service.create(UserId::generate(), request()).await.unwrap();
        let id = detail.shipment.id;
        let carrier = Actor {
            user_id: UserId::generate(),
            role: UserRole::Carrier,
        };

        assert!(matches!(
            service
                .transition(carrier, id, update(ShipmentStatus::InTransit))
                .await,
            Err(ShipmentError::Transition(TransitionError::NotAllowed { .. }))
        ));

        let picked = service
            .transition(carrier, id, update(ShipmentStatus::PickedUp))
            .await
            .unwrap();
        assert_eq!(picked.shipment.status, ShipmentStatus::PickedUp);
        assert_eq!(picked.events.len(), 2);
        assert_eq!(picked.events[0].description, "Picked up");

        assert!(matches!(
            service
                .transition(carrier, id, update(ShipmentStatus::Pending))
                .await,
            Err(ShipmentError::Transition(_))
        ));
    }

    #[tokio::test]
    async fn shippers_may_only_cancel_their_own() {
        let fixture = Fixture::new();
        let service = fixture.service();
        let owner = UserId::generate();
        let id = service.create(owner, request()).await.unwrap().shipment.id;

        assert!(matches!(
            service
                .transition(shipper(owner), id, update(ShipmentStatus::PickedUp))
                .await,
            Err(ShipmentError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .transition(
                    shipper(UserId::generate()),
                    id,
                    update(ShipmentStatus::Cancelled)
                )
                .await,
            Err(ShipmentError::NotFound)
        ));

        let cancelled = service
            .transition(shipper(owner), id, update(ShipmentStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.shipment.status, ShipmentStatus::Cancelled);
        assert!(matches!(
            service
                .transition(shipper(owner), id, update(ShipmentStatus::Cancelled))
                .await,
            Err(ShipmentError::Transition(TransitionError::Terminal { .. }))
        ));
    }

    #[tokio::test]
    async fn reads_report_the_derived_cost() {
        let fixture = Fixture::new();
        let owner = UserId::generate();
        let detail = fixture.service().create(owner, request()).await.unwrap();
        assert_eq!(detail.shipment.cost, Decimal::from(25));

        let raised = ShipmentService::new(
            fixture.store.as_ref(),
            &fixture.carriers,
            &fixture.tracking,
            ShippingFees {
                insurance: Decimal::from(7),
                signature: Decimal::from(3),
            },
        );
        let read = raised.get_for_owner(owner, detail.shipment.id).await.unwrap();
        assert_eq!(read.shipment.cost, Decimal::from(27));

        let stored = fixture
            .store
            .get_shipment(detail.shipment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.shipment.cost, Decimal::from(25));
    }

    #[tokio::test]
    async fn stats_count_every_status() {
        let fixture = Fixture::new();
        let service = fixture.service();
        let owner = UserId::generate();
        let first = service.create(owner, request()).await.unwrap().shipment.id;
        service.create(owner, request()).await.unwrap();
        service.create(UserId::generate(), request()).await.unwrap();
        service
            .transition(shipper(owner), first, update(ShipmentStatus::Cancelled))
            .await
            .unwrap();

        let stats = service.stats(owner).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.by_status["pending"], 1);
        assert_eq!(stats.by_status["cancelled"], 1);
        assert_eq!(stats.by_status["delivered"], 0);
        assert_eq!(stats.by_status.len(), ShipmentStatus::ALL.len());
        assert_eq!(stats.total_cost, Decimal::from(50));
    }

    #[test]
    fn page_size_is_clamped() {
        let filter = ListParams::default().into_filter();
        assert_eq!(filter.limit, Some(DEFAULT_PAGE_SIZE));
        let filter = ListParams {
            limit: Some(10_000),
            ..ListParams::default()
        }
        .into_filter();
        assert_eq!(filter.limit, Some(MAX_PAGE_SIZE));
        let filter = ListParams {
            limit: Some(0),
            offset: Some(5),
            ..ListParams::default()
        }
        .into_filter();
        assert_eq!(filter.limit, Some(1));
        assert_eq!(filter.offset, 5);
    }

    #[tokio::test]
    async fn quote_prices_without_creating() {
        let fixture = Fixture::new();
        let quote = fixture
            .service()
            .quote(QuoteRequest {
                carrier_id: "carrier-1".to_owned(),
                insurance: true,
                signature_required: true,
            })
            .await
            .unwrap();
        assert_eq!(quote.breakdown.total, Decimal::from(28));
        assert_eq!(quote.carrier_name, "Carrier One");

        assert!(matches!(
            fixture
                .service()
                .quote(QuoteRequest {
                    carrier_id: "nobody".to_owned(),
                    ..QuoteRequest::default()
                })
                .await,
            Err(ShipmentError::Validation(_))
        ));
    }
}
