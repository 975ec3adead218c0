//! Carrier lookups, cached.
//!
//! Carriers are reference data that only change when an operator reseeds
//! them, so reads go through a `moka` cache (default 5-minute TTL). Misses are
//! not cached; a freshly seeded carrier is visible immediately.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use shipdesk_core::CarrierId;

use crate::db::{CarrierStore, RepositoryError, Store};
use crate::models::Carrier;

/// Cache key for carrier lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Carrier(CarrierId),
    Active,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Carrier(Box<Carrier>),
    Active(Arc<Vec<Carrier>>),
}

/// Read-through carrier cache in front of the store.
#[derive(Clone)]
pub struct CarrierDirectory {
    store: Arc<dyn Store>,
    cache: Cache<CacheKey, CacheValue>,
}

impl CarrierDirectory {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1000).time_to_live(ttl).build();
        Self { store, cache }
    }

    /// Look up a carrier by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn get(&self, id: &CarrierId) -> Result<Option<Carrier>, RepositoryError> {
        let key = CacheKey::Carrier(id.clone());
        if let Some(CacheValue::Carrier(carrier)) = self.cache.get(&key).await {
            debug!(carrier_id = %id, "Cache hit for carrier");
            return Ok(Some(*carrier));
        }

        let carrier = self.store.get_carrier(id).await?;
        if let Some(carrier) = &carrier {
            self.cache
                .insert(key, CacheValue::Carrier(Box::new(carrier.clone())))
                .await;
        }
        Ok(carrier)
    }

    /// Active carriers ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn list_active(&self) -> Result<Arc<Vec<Carrier>>, RepositoryError> {
        if let Some(CacheValue::Active(carriers)) = self.cache.get(&CacheKey::Active).await {
            debug!("Cache hit for active carriers");
            return Ok(carriers);
        }

        let carriers = Arc::new(self.store.list_carriers(true).await?);
        self.cache
            .insert(CacheKey::Active, CacheValue::Active(Arc::clone(&carriers)))
            .await;
        Ok(carriers)
    }

    /// Drop everything cached.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewCarrier;
    use rust_decimal::Decimal;

    fn carrier(id: &str, name: &str, rate: i64) -> NewCarrier {
        NewCarrier {
            id: CarrierId::parse(id).unwrap(),
            name: name.to_owned(),
            base_rate: Decimal::new(rate, 2),
            service_types: vec!["standard".to_owned()],
            is_active: true,
        }
    }

    #[tokio::test]
    async fn serves_cached_values_until_invalidated() {
        let store = Arc::new(MemoryStore::with_carriers([carrier(
            "carrier-1",
            "Carrier One",
            2000,
        )]));
        let directory = CarrierDirectory::new(store.clone(), Duration::from_secs(300));
        let id = CarrierId::parse("carrier-1").unwrap();

        assert_eq!(
            directory.get(&id).await.unwrap().unwrap().base_rate,
            Decimal::new(2000, 2)
        );

        store
            .upsert_carrier(carrier("carrier-1", "Carrier One", 2500))
            .await
            .unwrap();
        assert_eq!(
            directory.get(&id).await.unwrap().unwrap().base_rate,
            Decimal::new(2000, 2)
        );

        directory.invalidate_all().await;
        assert_eq!(
            directory.get(&id).await.unwrap().unwrap().base_rate,
            Decimal::new(2500, 2)
        );
    }

    #[tokio::test]
    async fn misses_are_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let directory = CarrierDirectory::new(store.clone(), Duration::from_secs(300));
        let id = CarrierId::parse("late").unwrap();

        assert!(directory.get(&id).await.unwrap().is_none());
        store
            .upsert_carrier(carrier("late", "Late Carrier", 100))
            .await
            .unwrap();
        assert!(directory.get(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn lists_only_active_carriers() {
        let mut inactive = carrier("old", "Old Carrier", 100);
        inactive.is_active = false;
        let store = Arc::new(MemoryStore::with_carriers([
            carrier("b", "Beta", 100),
            carrier("a", "Alpha", 100),
            inactive,
        ]));
        let directory = CarrierDirectory::new(store, Duration::from_secs(300));

        let names: Vec<_> = directory
            .list_active()
            .await
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["Alpha", "Beta"]);
    }
}
