use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::schema::Database;
use super::types::{CacheEntry, CacheError};
use super::FeedCache;

/// Converts a TTL to whole milliseconds, saturating on absurd values.
fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

impl Database {
    // ========================================================================
    // Feed Cache Operations
    // ========================================================================

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// `expires_at` is computed as `now + ttl`.
    pub async fn cache_put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Utc::now().timestamp_millis();
        let expires_at = now.saturating_add(ttl_millis(ttl));

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO feed_cache (key, value, stored_at, expires_at)
            VALUES (?, ?, ?, ?)
        "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch the entry for `key`, expired or not.
    pub async fn cache_lookup(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT value, expires_at FROM feed_cache WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value, expires_at)| CacheEntry {
            value,
            // Out-of-range timestamps read as already expired
            expires_at: DateTime::from_timestamp_millis(expires_at).unwrap_or(DateTime::UNIX_EPOCH),
        }))
    }

    /// Delete the entry for `key`, if any.
    pub async fn cache_delete(&self, key: &str) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM feed_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete all expired cache entries.
    ///
    /// Returns the number of entries evicted.
    pub async fn evict_expired(&self) -> Result<u64, CacheError> {
        let now = Utc::now().timestamp_millis();
        let result = sqlx::query("DELETE FROM feed_cache WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete every cache entry (`--clear-cache`).
    pub async fn clear_cache(&self) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM feed_cache")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FeedCache for Database {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.cache_lookup(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.cache_put(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.cache_delete(key).await
    }
}
