//! API client paired with a zone cache
//!
//! Strategies never talk to the raw client for reads; they go through
//! [`CachedClient::snapshot`] so repeated reads of one zone within the TTL
//! share a single fetch.

use std::fmt;
use std::sync::Arc;

use super::ZoneCache;
use crate::error::Result;
use crate::traits::DnsApiClient;
use crate::wire::{check_response, ZoneSnapshot};

/// A [`DnsApiClient`] plus the [`ZoneCache`] shared by every strategy
#[derive(Clone)]
pub struct CachedClient {
    client: Arc<dyn DnsApiClient>,
    cache: ZoneCache,
}

impl CachedClient {
    /// Pair a client with a cache
    pub fn new(client: Arc<dyn DnsApiClient>, cache: ZoneCache) -> Self {
        Self { client, cache }
    }

    /// The underlying API client
    pub fn client(&self) -> &dyn DnsApiClient {
        self.client.as_ref()
    }

    /// The shared zone cache
    pub fn cache(&self) -> &ZoneCache {
        &self.cache
    }

    /// Records of a zone, served from cache when fresh
    ///
    /// Error responses are rejected before they reach the cache.
    pub async fn snapshot(&self, zone: &str) -> Result<ZoneSnapshot> {
        let client = Arc::clone(&self.client);
        let data = self
            .cache
            .get_or_fetch(zone, || async move {
                let bytes = client.get_records(zone).await?;
                check_response(&bytes)?;
                Ok(bytes)
            })
            .await?;

        ZoneSnapshot::parse(zone, &data)
    }

    /// Drop the cached listing of a zone
    pub async fn invalidate(&self, zone: &str) {
        self.cache.invalidate(zone).await;
    }
}

impl fmt::Debug for CachedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedClient")
            .field("provider", &self.client.provider_name())
            .field("cache", &self.cache)
            .finish()
    }
}
