//! Carriers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shipdesk_core::CarrierId;

use super::PgStore;
use crate::db::{CarrierStore, RepositoryError};
use crate::models::{Carrier, NewCarrier};

#[derive(sqlx::FromRow)]
struct CarrierRow {
    id: CarrierId,
    name: String,
    base_rate: Decimal,
    service_types: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CarrierRow> for Carrier {
    fn from(row: CarrierRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            base_rate: row.base_rate,
            service_types: row.service_types,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CarrierStore for PgStore {
    async fn list_carriers(&self, active_only: bool) -> Result<Vec<Carrier>, RepositoryError> {
        let rows = sqlx::query_as::<_, CarrierRow>(
            r"
            SELECT id, name, base_rate, service_types, is_active, created_at, updated_at
            FROM carriers
            WHERE is_active OR NOT $1
            ORDER BY name, id
            ",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Carrier::from).collect())
    }

    async fn get_carrier(&self, id: &CarrierId) -> Result<Option<Carrier>, RepositoryError> {
        let row = sqlx::query_as::<_, CarrierRow>(
            r"
            SELECT id, name, base_rate, service_types, is_active, created_at, updated_at
            FROM carriers
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Carrier::from))
    }

    async fn upsert_carrier(&self, carrier: NewCarrier) -> Result<Carrier, RepositoryError> {
        let row = sqlx::query_as::<_, CarrierRow>(
            r"
            INSERT INTO carriers (id, name, base_rate, service_types, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                base_rate = EXCLUDED.base_rate,
                service_types = EXCLUDED.service_types,
                is_active = EXCLUDED.is_active,
                updated_at = now()
            RETURNING id, name, base_rate, service_types, is_active, created_at, updated_at
            ",
        )
        .bind(&carrier.id)
        .bind(&carrier.name)
        .bind(carrier.base_rate)
        .bind(&carrier.service_types)
        .bind(carrier.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}
