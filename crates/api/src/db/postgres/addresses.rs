//! Address book and shipment address copies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use shipdesk_core::{AddressId, UserId};

use super::PgStore;
use crate::db::{AddressStore, RepositoryError};
use crate::models::{Address, AddressDetails, NewAddress};

pub(super) const ADDRESS_COLUMNS: &str = "id, user_id, label, name, company, email, phone, \
     street, city, state, zip, country, is_default, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: Option<String>,
    name: String,
    company: Option<String>,
    email: String,
    phone: String,
    street: String,
    city: String,
    state: String,
    zip: String,
    country: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            details: AddressDetails {
                label: row.label,
                name: row.name,
                company: row.company,
                email: row.email,
                phone: row.phone,
                street: row.street,
                city: row.city,
                state: row.state,
                zip: row.zip,
                country: row.country,
            },
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insert an address row on an open connection or transaction.
///
/// `saved` is true for address-book entries and false for the copies
/// written with a shipment.
pub(super) async fn insert_address(
    conn: &mut PgConnection,
    user_id: UserId,
    details: &AddressDetails,
    is_default: bool,
    saved: bool,
) -> Result<Address, sqlx::Error> {
    let sql = format!(
        "INSERT INTO addresses (id, user_id, label, name, company, email, phone, street, \
         city, state, zip, country, is_default, saved) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING {ADDRESS_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AddressRow>(&sql)
        .bind(AddressId::generate())
        .bind(user_id)
        .bind(&details.label)
        .bind(&details.name)
        .bind(&details.company)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.street)
        .bind(&details.city)
        .bind(&details.state)
        .bind(&details.zip)
        .bind(&details.country)
        .bind(is_default)
        .bind(saved)
        .fetch_one(&mut *conn)
        .await?;

    Ok(row.into())
}

#[async_trait]
impl AddressStore for PgStore {
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses \
             WHERE user_id = $1 AND saved \
             ORDER BY is_default DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn create_address(&self, address: NewAddress) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            // Row lock on the owner serializes concurrent default changes.
            sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(address.user_id)
                .fetch_optional(&mut *tx)
                .await?;

            sqlx::query(
                r"
                UPDATE addresses
                SET is_default = false, updated_at = now()
                WHERE user_id = $1 AND is_default
                ",
            )
            .bind(address.user_id)
            .execute(&mut *tx)
            .await?;
        }

        let created = insert_address(
            &mut tx,
            address.user_id,
            &address.details,
            address.is_default,
            true,
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }
}
