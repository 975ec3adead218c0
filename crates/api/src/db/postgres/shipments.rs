//! Shipments and tracking events.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use shipdesk_core::{
    AddressId, CarrierId, ShipmentId, ShipmentStatus, TrackingEventId, TrackingNumber, UserId,
};

use super::addresses::{ADDRESS_COLUMNS, AddressRow, insert_address};
use super::{PgStore, conflict_on_unique};
use crate::db::{RepositoryError, ShipmentStore};
use crate::models::{
    Address, NewShipment, NewTrackingEvent, PackageDetails, Shipment, ShipmentDetail,
    ShipmentFilter, TrackingEvent,
};

const SHIPMENT_COLUMNS: &str = "id, tracking_number, user_id, carrier_id, sender_address_id, \
     recipient_address_id, weight, length, width, height, declared_value, description, \
     service_type, insurance, signature_required, status, cost, estimated_delivery, \
     created_at, updated_at";

const EVENT_COLUMNS: &str =
    "id, shipment_id, status, description, location, event_time, created_at";

#[derive(sqlx::FromRow)]
struct ShipmentRow {
    id: ShipmentId,
    tracking_number: TrackingNumber,
    user_id: UserId,
    carrier_id: CarrierId,
    sender_address_id: AddressId,
    recipient_address_id: AddressId,
    weight: Decimal,
    length: Decimal,
    width: Decimal,
    height: Decimal,
    declared_value: Decimal,
    description: String,
    service_type: String,
    insurance: bool,
    signature_required: bool,
    status: ShipmentStatus,
    cost: Decimal,
    estimated_delivery: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ShipmentRow {
    fn into_shipment(self, sender: Address, recipient: Address) -> Shipment {
        Shipment {
            id: self.id,
            tracking_number: self.tracking_number,
            user_id: self.user_id,
            carrier_id: self.carrier_id,
            sender,
            recipient,
            package: PackageDetails {
                weight: self.weight,
                length: self.length,
                width: self.width,
                height: self.height,
                value: self.declared_value,
                description: self.description,
                service_type: self.service_type,
            },
            insurance: self.insurance,
            signature_required: self.signature_required,
            status: self.status,
            cost: self.cost,
            estimated_delivery: self.estimated_delivery,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: TrackingEventId,
    shipment_id: ShipmentId,
    status: ShipmentStatus,
    description: String,
    location: Option<String>,
    event_time: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for TrackingEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            shipment_id: row.shipment_id,
            status: row.status,
            description: row.description,
            location: row.location,
            event_time: row.event_time,
            created_at: row.created_at,
        }
    }
}

/// Append an event. `created_at` is kept strictly increasing per shipment,
/// even when the clock has not advanced since the previous event.
async fn insert_event(
    conn: &mut PgConnection,
    shipment_id: ShipmentId,
    event: &NewTrackingEvent,
) -> Result<TrackingEvent, sqlx::Error> {
    let sql = format!(
        "INSERT INTO tracking_events \
             (id, shipment_id, status, description, location, event_time, created_at) \
         SELECT $1, $2, $3, $4, $5, $6, \
                GREATEST(clock_timestamp(), MAX(created_at) + interval '1 microsecond') \
         FROM tracking_events WHERE shipment_id = $2 \
         RETURNING {EVENT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, EventRow>(&sql)
        .bind(TrackingEventId::generate())
        .bind(shipment_id)
        .bind(event.status)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.event_time)
        .fetch_one(&mut *conn)
        .await?;

    Ok(row.into())
}

/// Events of one shipment, newest first; ties broken by insertion order.
async fn load_events<'e>(
    executor: impl PgExecutor<'e>,
    shipment_id: ShipmentId,
) -> Result<Vec<TrackingEvent>, sqlx::Error> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM tracking_events \
         WHERE shipment_id = $1 \
         ORDER BY created_at DESC, seq DESC"
    );
    let rows = sqlx::query_as::<_, EventRow>(&sql)
        .bind(shipment_id)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(TrackingEvent::from).collect())
}

fn take_address(
    addresses: &mut HashMap<AddressId, Address>,
    id: AddressId,
) -> Result<Address, RepositoryError> {
    addresses
        .remove(&id)
        .ok_or_else(|| RepositoryError::DataCorruption(format!("missing address {id}")))
}

impl PgStore {
    /// Resolve the sender/recipient rows of `rows` with a single query.
    async fn attach_addresses(
        &self,
        rows: Vec<ShipmentRow>,
    ) -> Result<Vec<Shipment>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows
            .iter()
            .flat_map(|r| [r.sender_address_id.as_uuid(), r.recipient_address_id.as_uuid()])
            .collect();
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ANY($1)");
        let mut addresses: HashMap<AddressId, Address> = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| {
                let address = Address::from(row);
                (address.id, address)
            })
            .collect();

        let mut shipments = Vec::with_capacity(rows.len());
        for row in rows {
            let sender = take_address(&mut addresses, row.sender_address_id)?;
            let recipient = take_address(&mut addresses, row.recipient_address_id)?;
            shipments.push(row.into_shipment(sender, recipient));
        }
        Ok(shipments)
    }

    async fn load_detail(
        &self,
        row: Option<ShipmentRow>,
    ) -> Result<Option<ShipmentDetail>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let shipment_id = row.id;
        let shipment = self
            .attach_addresses(vec![row])
            .await?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)?;
        let events = load_events(&self.pool, shipment_id).await?;

        Ok(Some(ShipmentDetail { shipment, events }))
    }
}

#[async_trait]
impl ShipmentStore for PgStore {
    async fn create_shipment(
        &self,
        new: NewShipment,
    ) -> Result<ShipmentDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sender = insert_address(&mut tx, new.user_id, &new.sender, false, false).await?;
        let recipient = insert_address(&mut tx, new.user_id, &new.recipient, false, false).await?;

        let sql = format!(
            "INSERT INTO shipments (id, tracking_number, user_id, carrier_id, \
                 sender_address_id, recipient_address_id, weight, length, width, height, \
                 declared_value, description, service_type, insurance, signature_required, \
                 status, cost, estimated_delivery) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18) \
             RETURNING {SHIPMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ShipmentRow>(&sql)
            .bind(ShipmentId::generate())
            .bind(&new.tracking_number)
            .bind(new.user_id)
            .bind(&new.carrier_id)
            .bind(sender.id)
            .bind(recipient.id)
            .bind(new.package.weight)
            .bind(new.package.length)
            .bind(new.package.width)
            .bind(new.package.height)
            .bind(new.package.value)
            .bind(&new.package.description)
            .bind(&new.package.service_type)
            .bind(new.options.insurance)
            .bind(new.options.signature_required)
            .bind(new.initial_event.status)
            .bind(new.cost)
            .bind(new.estimated_delivery)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "tracking number already exists"))?;

        let event = insert_event(&mut tx, row.id, &new.initial_event).await?;
        tx.commit().await?;

        Ok(ShipmentDetail {
            shipment: row.into_shipment(sender, recipient),
            events: vec![event],
        })
    }

    async fn get_shipment(
        &self,
        id: ShipmentId,
    ) -> Result<Option<ShipmentDetail>, RepositoryError> {
        let sql = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1");
        let row = sqlx::query_as::<_, ShipmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        self.load_detail(row).await
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<ShipmentDetail>, RepositoryError> {
        let sql = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE tracking_number = $1");
        let row = sqlx::query_as::<_, ShipmentRow>(&sql)
            .bind(tracking_number)
            .fetch_optional(&self.pool)
            .await?;

        self.load_detail(row).await
    }

    async fn list_shipments(
        &self,
        user_id: UserId,
        filter: ShipmentFilter,
    ) -> Result<Vec<Shipment>, RepositoryError> {
        let sql = format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments \
             WHERE user_id = $1 AND ($2::shipment_status IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, ShipmentRow>(&sql)
            .bind(user_id)
            .bind(filter.status)
            .bind(filter.limit.map(i64::from))
            .bind(i64::from(filter.offset))
            .fetch_all(&self.pool)
            .await?;

        self.attach_addresses(rows).await
    }

    async fn transition_shipment(
        &self,
        id: ShipmentId,
        expected: ShipmentStatus,
        event: NewTrackingEvent,
    ) -> Result<ShipmentDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<(ShipmentId,)> = sqlx::query_as(
            r"
            UPDATE shipments
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING id
            ",
        )
        .bind(id)
        .bind(expected)
        .bind(event.status)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            let (exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM shipments WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists {
                RepositoryError::Conflict(format!("shipment is no longer {expected}"))
            } else {
                RepositoryError::NotFound
            });
        }

        insert_event(&mut tx, id, &event).await?;
        tx.commit().await?;

        self.get_shipment(id).await?.ok_or(RepositoryError::NotFound)
    }
}
