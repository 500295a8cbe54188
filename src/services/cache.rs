use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::config::CacheSettings;
use crate::models::ExclusionSet;
use crate::services::events::BlockEvent;
use crate::services::store::{ExclusionResolver, StoreError};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

const DEFAULT_L1_SIZE: u64 = 10_000;
const DEFAULT_TTL_SECS: u64 = 300;

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache. L2 is Redis, shared across instances,
/// and optional: without it the manager runs on L1 alone.
pub struct CacheManager {
    // Store ConnectionManager in a Mutex for interior mutability
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// Create an L1-only cache manager
    pub fn local(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    pub async fn from_settings(settings: &CacheSettings) -> Result<Self, CacheError> {
        let l1_size = settings.l1_cache_size.unwrap_or(DEFAULT_L1_SIZE);
        let ttl_secs = settings.ttl_secs.unwrap_or(DEFAULT_TTL_SECS);

        match settings.redis_url.as_deref() {
            Some(url) => Self::new(url, l1_size, ttl_secs).await,
            None => {
                tracing::info!("No Redis URL configured, using in-process cache only");
                Ok(Self::local(l1_size, ttl_secs))
            }
        }
    }

    fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
        moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        // Try L1 cache first
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let Some(redis) = &self.redis else {
            tracing::trace!("Cache miss: {}", key);
            return Err(CacheError::CacheMiss(key.to_string()));
        };

        // Try L2 cache (Redis)
        let mut conn = redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        if let Some(json) = value {
            tracing::trace!("L2 cache hit: {}", key);

            // Populate L1 cache
            let bytes = json.as_bytes().to_vec();
            self.l1_cache.insert(key.to_string(), bytes).await;

            return Ok(serde_json::from_str(&json)?);
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in every configured tier
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        // Set in L1 cache (uses configured TTL)
        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from every configured tier
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("DEL")
                .arg(key)
                .query_async::<()>(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Invalidate all cache entries matching a pattern
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        // For L1, we need to iterate (clear all for simplicity)
        self.l1_cache.invalidate_all();

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let keys: Vec<String> = redis::cmd("KEYS")
                .arg(pattern)
                .query_async(&mut *conn)
                .await?;

            if !keys.is_empty() {
                redis::cmd("DEL")
                    .arg(keys)
                    .query_async::<()>(&mut *conn)
                    .await?;
            }
        }

        tracing::debug!("Invalidated cache pattern: {}", pattern);
        Ok(())
    }

    pub fn has_l2(&self) -> bool {
        self.redis.is_some()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_size: self.l1_cache.entry_count(),
            l2_enabled: self.has_l2(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub l1_size: u64,
    pub l2_enabled: bool,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a user's exclusion set
    pub fn exclusions(user_id: &str) -> String {
        format!("exclusions:{}", user_id)
    }

    pub fn all_exclusions() -> &'static str {
        "exclusions:*"
    }
}

/// Exclusion resolver with a read-through cache in front
///
/// Entries are dropped for both users of every block event; a lagging
/// subscriber drops them all.
pub struct CachedExclusions {
    inner: Arc<dyn ExclusionResolver>,
    cache: Arc<CacheManager>,
}

impl CachedExclusions {
    pub fn new(inner: Arc<dyn ExclusionResolver>, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }

    /// Apply one block event to the cache
    pub async fn invalidate(&self, event: &BlockEvent) {
        for user_id in event.affected_users() {
            if let Err(e) = self.cache.delete(&CacheKey::exclusions(user_id)).await {
                tracing::warn!("Failed to invalidate exclusions for {}: {}", user_id, e);
            }
        }
    }

    /// Keep the cache in step with block events until the sender goes away
    pub fn spawn_invalidation(self: Arc<Self>, mut events: broadcast::Receiver<BlockEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.invalidate(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Missed {} block events, dropping cached exclusions", skipped);
                        if let Err(e) = self.cache.invalidate_pattern(CacheKey::all_exclusions()).await {
                            tracing::warn!("Failed to drop cached exclusions: {}", e);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[async_trait]
impl ExclusionResolver for CachedExclusions {
    async fn excluded_ids(&self, user_id: &str) -> Result<ExclusionSet, StoreError> {
        let key = CacheKey::exclusions(user_id);

        match self.cache.get::<ExclusionSet>(&key).await {
            Ok(excluded) => return Ok(excluded),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Exclusion cache read failed for {}: {}", user_id, e),
        }

        let excluded = self.inner.excluded_ids(user_id).await?;
        if let Err(e) = self.cache.set(&key, &excluded).await {
            tracing::warn!("Exclusion cache write failed for {}: {}", user_id, e);
        }
        Ok(excluded)
    }
}
