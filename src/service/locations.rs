use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use tracing::{info, warn};

use crate::error::AppError;
use crate::model::location::{GeofencedLocation, LocationDraft};
use crate::store::Store;

/// Geofence registry. Reads of the location list go through a short-lived
/// cache keyed by `include_disabled`; any write drops the cache.
pub struct LocationRegistry {
    store: Arc<dyn Store>,
    cache: Cache<bool, Arc<Vec<GeofencedLocation>>>,
    /// Bumped on every write so a read that raced a write never stays cached.
    generation: AtomicU64,
}

impl LocationRegistry {
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(2).time_to_live(ttl).build();
        Self {
            store,
            cache,
            generation: AtomicU64::new(0),
        }
    }

    /// Enabled locations in declaration order.
    pub async fn enabled(&self) -> Result<Arc<Vec<GeofencedLocation>>, AppError> {
        self.list(false).await
    }

    pub async fn list(&self, include_disabled: bool) -> Result<Arc<Vec<GeofencedLocation>>, AppError> {
        if let Some(hit) = self.cache.get(&include_disabled).await {
            return Ok(hit);
        }
        let generation = self.generation.load(Ordering::Acquire);
        let fresh = Arc::new(self.store.list_locations(include_disabled).await?);
        self.remember(include_disabled, fresh.clone(), generation).await;
        Ok(fresh)
    }

    async fn remember(&self, key: bool, value: Arc<Vec<GeofencedLocation>>, read_at: u64) {
        self.cache.insert(key, value).await;
        if self.generation.load(Ordering::Acquire) != read_at {
            self.cache.invalidate(&key).await;
        }
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
    }

    pub async fn get(&self, id: u64) -> Result<GeofencedLocation, AppError> {
        self.store
            .find_location(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("location {id}")))
    }

    pub async fn create(
        &self,
        actor_id: u64,
        draft: &LocationDraft,
        now: DateTime<Utc>,
    ) -> Result<GeofencedLocation, AppError> {
        self.require_global_admin(actor_id).await?;
        draft.validate()?;

        let location = self.store.insert_location(draft, now).await?;
        self.invalidate();
        info!(location_id = location.id, actor_id, name = %location.name, "Location created");
        Ok(location)
    }

    pub async fn update(
        &self,
        actor_id: u64,
        id: u64,
        draft: &LocationDraft,
    ) -> Result<GeofencedLocation, AppError> {
        self.require_global_admin(actor_id).await?;
        draft.validate()?;

        let location = self
            .store
            .update_location(id, draft)
            .await?
            .ok_or_else(|| AppError::not_found(format!("location {id}")))?;
        self.invalidate();
        info!(location_id = id, actor_id, enabled = location.enabled, "Location updated");
        Ok(location)
    }

    pub async fn delete(&self, actor_id: u64, id: u64) -> Result<(), AppError> {
        self.require_global_admin(actor_id).await?;

        if !self.store.delete_location(id).await? {
            return Err(AppError::not_found(format!("location {id}")));
        }
        self.invalidate();
        info!(location_id = id, actor_id, "Location deleted");
        Ok(())
    }

    async fn require_global_admin(&self, actor_id: u64) -> Result<(), AppError> {
        match self.store.find_employee(actor_id).await? {
            Some(actor) if actor.is_global_admin() => Ok(()),
            _ => {
                warn!(actor_id, "Location change refused: not a global admin");
                Err(AppError::forbidden("Only global admins can manage locations"))
            }
        }
    }
}
