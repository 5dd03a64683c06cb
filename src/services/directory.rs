//! Display names for user references.
//!
//! Buildings, houses, devices and readings point at users by id. List
//! screens show the user's name instead, so every row needs a lookup.
//! Names are cached for a TTL so a page of rows costs at most one request
//! per distinct user.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache;

use crate::api::models::User;
use crate::api::{Resource, ResourceApi};
use crate::config::Config;
use crate::error::AppResult;

/// Shown for empty or unresolvable references.
pub const UNKNOWN_NAME: &str = "NA";

pub struct UserDirectory<A: ResourceApi<User>> {
    api: Arc<A>,
    names: Cache<i64, String>,
}

impl<A: ResourceApi<User>> UserDirectory<A> {
    pub fn new(api: Arc<A>, config: &Config) -> Self {
        let names = Cache::builder()
            .max_capacity(config.directory_cache_capacity)
            .time_to_live(Duration::from_secs(config.directory_cache_ttl_seconds))
            .build();
        Self { api, names }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// `first_name last_name` of user `id`.
    ///
    /// # Errors
    ///
    /// Returns the API error if the user is not cached and cannot be fetched.
    pub async fn display_name(&self, id: i64) -> AppResult<String> {
        if let Some(name) = self.names.get(&id).await {
            tracing::trace!(id, "directory_hit");
            return Ok(name);
        }

        let user = self.api.get(id).await?;
        let name = user.display_name();
        self.names.insert(id, name.clone()).await;
        tracing::debug!(id, name = %name, "directory_stored");
        Ok(name)
    }

    /// Seed the cache with a user already in hand.
    pub async fn remember(&self, user: &User) {
        self.names.insert(user.id, user.display_name()).await;
    }

    /// Forget a user whose name may have changed.
    pub async fn invalidate(&self, id: i64) {
        self.names.invalidate(&id).await;
    }

    /// Names for every user reference of `record`, keyed by field.
    pub async fn labels_for<T: Resource>(&self, record: &T) -> BTreeMap<&'static str, String> {
        let fields = record.user_fields();
        let lookups = fields.iter().map(|(_, id)| async move {
            match id {
                Some(id) => self.display_name(*id).await.unwrap_or_else(|e| {
                    tracing::warn!(id, error = %e, "Failed to resolve user");
                    UNKNOWN_NAME.to_string()
                }),
                None => UNKNOWN_NAME.to_string(),
            }
        });
        let names = join_all(lookups).await;

        fields
            .into_iter()
            .map(|(field, _)| field)
            .zip(names)
            .collect()
    }
}
