//! Cache-aside short link resolution.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::entities::{Link, LinkSnapshot, Resolved};
use crate::domain::errors::ResolveError;
use crate::domain::repositories::{DomainRepository, LinkRepository};
use crate::infrastructure::cache::{CacheService, snapshot_key};
use crate::utils::extract_domain::strip_port;

/// Tunables of the read path.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// TTL of cached snapshots in seconds.
    pub cache_ttl_seconds: u64,
    /// Deadline for a single cache round trip; exceeding it counts as a miss.
    pub cache_timeout: Duration,
    /// Deadline for a single database query; exceeding it is a transient error.
    pub storage_timeout: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 3600,
            cache_timeout: Duration::from_millis(250),
            storage_timeout: Duration::from_secs(3),
        }
    }
}

/// Resolves `(host, code)` to a destination, reading through the cache.
///
/// # Flow
///
/// 1. Strip the port from `host` and look up its custom domain (none ⇒ default scope)
/// 2. Query the cache under `link:{raw host}:{code}`
/// 3. On a miss or a corrupt payload, load the link from PostgreSQL and cache a snapshot
/// 4. Validate the snapshot: inactive ⇒ 410, expired ⇒ 410, otherwise redirect
///
/// Cache failures are absorbed as misses; database failures surface as
/// [`ResolveError::Transient`]. The service never writes to the database.
pub struct ResolveService {
    link_repository: Arc<dyn LinkRepository>,
    domain_repository: Arc<dyn DomainRepository>,
    cache: Arc<dyn CacheService>,
    options: ResolveOptions,
}

impl ResolveService {
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        domain_repository: Arc<dyn DomainRepository>,
        cache: Arc<dyn CacheService>,
        options: ResolveOptions,
    ) -> Self {
        Self {
            link_repository,
            domain_repository,
            cache,
            options,
        }
    }

    /// Resolves a short code requested on `host`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] if no link has this code in the host's scope
    /// - [`ResolveError::Inactive`] / [`ResolveError::Expired`] if the link exists but is unusable
    /// - [`ResolveError::Transient`] if the database failed or timed out
    pub async fn resolve(&self, host: &str, code: &str) -> Result<Resolved, ResolveError> {
        let domain_id = self.domain_scope(strip_port(host)).await?;
        let key = snapshot_key(host, code);

        if let Some(snapshot) = self.cached_snapshot(&key).await {
            return snapshot.validate(Utc::now());
        }

        let link = self
            .load_link(domain_id, code)
            .await?
            .ok_or(ResolveError::NotFound)?;

        let snapshot = LinkSnapshot::from_link(&link);
        self.store_snapshot(&key, &snapshot).await;

        snapshot.validate(Utc::now())
    }

    /// Drops the cached snapshot for `(host, code)`.
    ///
    /// Must be called by link create/update/delete flows with the same raw host
    /// that redirects use. Advisory: a missing key or an unreachable cache is
    /// logged, never returned.
    pub async fn invalidate(&self, host: &str, code: &str) {
        let key = snapshot_key(host, code);
        match timeout(self.options.cache_timeout, self.cache.invalidate(&key)).await {
            Ok(Ok(())) => debug!(key = %key, "Snapshot invalidated"),
            Ok(Err(e)) => warn!(key = %key, error = %e, "Failed to invalidate snapshot"),
            Err(_) => warn!(key = %key, "Snapshot invalidation timed out"),
        }
    }

    /// Verifies that the link store answers within the storage deadline.
    pub async fn check_storage(&self) -> Result<(), String> {
        match timeout(self.options.storage_timeout, self.link_repository.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("timed out".to_string()),
        }
    }

    /// Verifies that the cache backend is reachable.
    pub async fn check_cache(&self) -> bool {
        timeout(self.options.cache_timeout, self.cache.health_check())
            .await
            .unwrap_or(false)
    }

    async fn domain_scope(&self, host: &str) -> Result<Option<i64>, ResolveError> {
        match timeout(
            self.options.storage_timeout,
            self.domain_repository.find_by_name(host),
        )
        .await
        {
            Ok(Ok(domain)) => Ok(domain.map(|d| d.id)),
            Ok(Err(e)) => {
                warn!(host = %host, error = %e, "Domain lookup failed");
                Err(ResolveError::Transient(e.to_string()))
            }
            Err(_) => {
                warn!(host = %host, "Domain lookup timed out");
                Err(ResolveError::Transient("domain lookup timed out".to_string()))
            }
        }
    }

    async fn cached_snapshot(&self, key: &str) -> Option<LinkSnapshot> {
        match timeout(self.options.cache_timeout, self.cache.get(key)).await {
            Ok(Ok(Some(raw))) => {
                let snapshot = LinkSnapshot::from_json(&raw);
                if snapshot.is_none() {
                    debug!(key = %key, "Corrupt snapshot in cache, treating as miss");
                }
                snapshot
            }
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Cache read failed, falling back to database");
                None
            }
            Err(_) => {
                warn!(key = %key, "Cache read timed out, falling back to database");
                None
            }
        }
    }

    async fn load_link(
        &self,
        domain_id: Option<i64>,
        code: &str,
    ) -> Result<Option<Link>, ResolveError> {
        match timeout(
            self.options.storage_timeout,
            self.link_repository.find_by_scope_and_code(domain_id, code),
        )
        .await
        {
            Ok(Ok(link)) => Ok(link),
            Ok(Err(e)) => {
                warn!(code = %code, error = %e, "Link lookup failed");
                Err(ResolveError::Transient(e.to_string()))
            }
            Err(_) => {
                warn!(code = %code, "Link lookup timed out");
                Err(ResolveError::Transient("link lookup timed out".to_string()))
            }
        }
    }

    async fn store_snapshot(&self, key: &str, snapshot: &LinkSnapshot) {
        let json = match snapshot.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(link_id = snapshot.link_id, error = %e, "Failed to serialize snapshot");
                return;
            }
        };

        let ttl = Some(self.options.cache_ttl_seconds);
        match timeout(self.options.cache_timeout, self.cache.set(key, &json, ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(key = %key, error = %e, "Failed to cache snapshot"),
            Err(_) => warn!(key = %key, "Caching snapshot timed out"),
        }
    }
}
