//! Storage for the Shipdesk API.
//!
//! # Database: `PostgreSQL`
//!
//! ## Tables
//!
//! - `users` - Accounts (argon2 password hashes, roles)
//! - `addresses` - Address book entries and per-shipment address copies
//! - `carriers` - Shipping providers (seeded from YAML)
//! - `shipments` - Shipments, one row each, unique tracking number
//! - `tracking_events` - Append-only shipment history
//! - `site_settings`, `hero_slides`, `client_logos`, `content_sections` -
//!   Marketing content
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p shipdesk-cli -- migrate
//! ```
//!
//! # Backends
//!
//! Handlers and services talk to the [`Store`] trait. [`PgStore`] is the
//! production backend; [`MemoryStore`] keeps everything in process and is
//! used by the test suites. Both enforce the same uniqueness rules and make
//! shipment creation and status changes atomic.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shipdesk_core::{
    CarrierId, ClientLogoId, ContentSectionId, Email, HeroSlideId, ShipmentId, ShipmentStatus,
    TrackingNumber, UserId, UserRole,
};

use crate::models::{
    Address, Carrier, ClientLogo, ContentSection, ContentSectionInput, HeroSlide, NewAddress,
    NewCarrier, NewClientLogo, NewHeroSlide, NewShipment, NewTrackingEvent, NewUser, Shipment,
    ShipmentDetail, ShipmentFilter, SiteSettings, SiteSettingsInput, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email) or a lost race.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store traits
// =============================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account.
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user with their password hash, for login.
    async fn get_user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Change a user's role. Returns [`RepositoryError::NotFound`] for an
    /// unknown email.
    async fn set_user_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    /// A user's address book: default first, then newest first.
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError>;

    /// Add an address-book entry. A new default clears the old one in the
    /// same transaction.
    async fn create_address(&self, address: NewAddress) -> Result<Address, RepositoryError>;
}

#[async_trait]
pub trait CarrierStore: Send + Sync {
    /// Carriers ordered by name.
    async fn list_carriers(&self, active_only: bool) -> Result<Vec<Carrier>, RepositoryError>;

    async fn get_carrier(&self, id: &CarrierId) -> Result<Option<Carrier>, RepositoryError>;

    /// Insert a carrier or replace the one with the same id.
    async fn upsert_carrier(&self, carrier: NewCarrier) -> Result<Carrier, RepositoryError>;
}

#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Persist both addresses, the shipment and its first event atomically.
    ///
    /// Returns [`RepositoryError::Conflict`] if the tracking number is taken;
    /// nothing is written in that case.
    async fn create_shipment(&self, shipment: NewShipment)
    -> Result<ShipmentDetail, RepositoryError>;

    async fn get_shipment(&self, id: ShipmentId)
    -> Result<Option<ShipmentDetail>, RepositoryError>;

    async fn find_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<ShipmentDetail>, RepositoryError>;

    /// A user's shipments, newest first.
    async fn list_shipments(
        &self,
        user_id: UserId,
        filter: ShipmentFilter,
    ) -> Result<Vec<Shipment>, RepositoryError>;

    /// Set the status and append `event` atomically, provided the shipment
    /// is still in `expected`.
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown shipment and
    /// [`RepositoryError::Conflict`] if its status changed meanwhile.
    async fn transition_shipment(
        &self,
        id: ShipmentId,
        expected: ShipmentStatus,
        event: NewTrackingEvent,
    ) -> Result<ShipmentDetail, RepositoryError>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_site_settings(&self) -> Result<Option<SiteSettings>, RepositoryError>;

    async fn upsert_site_settings(
        &self,
        settings: SiteSettingsInput,
    ) -> Result<SiteSettings, RepositoryError>;

    /// Slides by `sort_order`, then creation time.
    async fn list_hero_slides(&self, active_only: bool) -> Result<Vec<HeroSlide>, RepositoryError>;

    async fn create_hero_slide(&self, slide: NewHeroSlide) -> Result<HeroSlide, RepositoryError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete_hero_slide(&self, id: HeroSlideId) -> Result<bool, RepositoryError>;

    async fn list_client_logos(&self) -> Result<Vec<ClientLogo>, RepositoryError>;

    async fn create_client_logo(&self, logo: NewClientLogo)
    -> Result<ClientLogo, RepositoryError>;

    async fn delete_client_logo(&self, id: ClientLogoId) -> Result<bool, RepositoryError>;

    /// Sections ordered by title.
    async fn list_content_sections(
        &self,
        published_only: bool,
    ) -> Result<Vec<ContentSection>, RepositoryError>;

    async fn get_content_section_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ContentSection>, RepositoryError>;

    /// Returns [`RepositoryError::Conflict`] if the slug is taken.
    async fn create_content_section(
        &self,
        section: ContentSectionInput,
    ) -> Result<ContentSection, RepositoryError>;

    /// Returns `None` for an unknown id and [`RepositoryError::Conflict`] if
    /// the new slug is taken.
    async fn update_content_section(
        &self,
        id: ContentSectionId,
        section: ContentSectionInput,
    ) -> Result<Option<ContentSection>, RepositoryError>;

    async fn delete_content_section(&self, id: ContentSectionId) -> Result<bool, RepositoryError>;
}

/// Everything the API needs from storage.
#[async_trait]
pub trait Store: UserStore + AddressStore + CarrierStore + ShipmentStore + ContentStore {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
