//! Application state shared across handlers.

use std::sync::Arc;

use shipdesk_core::{TrackingNumberError, TrackingNumberGenerator};

use crate::config::ApiConfig;
use crate::db::Store;
use crate::services::{AuthService, CarrierDirectory, ShipmentService, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    carriers: CarrierDirectory,
    tracking: TrackingNumberGenerator,
    tokens: TokenService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `store` - Storage backend
    ///
    /// # Errors
    ///
    /// Returns an error if the configured tracking prefix is invalid.
    pub fn new(config: ApiConfig, store: Arc<dyn Store>) -> Result<Self, TrackingNumberError> {
        let tracking = TrackingNumberGenerator::new(&config.tracking_prefix)?;
        let carriers = CarrierDirectory::new(Arc::clone(&store), config.carrier_cache_ttl);
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                carriers,
                tracking,
                tokens,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Cached carrier lookups.
    #[must_use]
    pub fn carriers(&self) -> &CarrierDirectory {
        &self.inner.carriers
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store())
    }

    #[must_use]
    pub fn shipments(&self) -> ShipmentService<'_> {
        ShipmentService::new(
            self.store(),
            &self.inner.carriers,
            &self.inner.tracking,
            self.inner.config.fees,
        )
    }
}
