use crate::feed::Channel;

use super::schema::Database;
use super::types::DatabaseError;

/// Default TTL for cached channels (5 minutes).
pub const DEFAULT_CHANNEL_TTL_MINUTES: i64 = 5;

impl Database {
    // ========================================================================
    // Channel Cache Operations
    // ========================================================================

    /// Cache a fetched channel under its feed URL with a TTL.
    ///
    /// Inserts or replaces the JSON-encoded channel. `expires_at` is
    /// computed as `now + ttl_minutes` (clamped to at least one minute).
    pub async fn cache_channel(
        &self,
        url: &str,
        channel: &Channel,
        ttl_minutes: i64,
    ) -> Result<(), DatabaseError> {
        let payload = serde_json::to_string(channel)?;
        let ttl = ttl_minutes.max(1);
        let ttl_modifier = format!("+{ttl} minutes");

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO channel_cache
                (url, payload, fetched_at, expires_at, size_bytes)
            VALUES (?, ?, datetime('now'), datetime('now', ?), ?)
        "#,
        )
        .bind(url)
        .bind(&payload)
        .bind(&ttl_modifier)
        .bind(payload.len() as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieve the cached channel for a feed URL, if unexpired.
    pub async fn cached_channel(&self, url: &str) -> Result<Option<Channel>, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT payload FROM channel_cache
            WHERE url = ? AND expires_at > datetime('now')
        "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((payload,)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Delete all expired cache entries. Returns the number evicted.
    pub async fn evict_expired_channels(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM channel_cache WHERE expires_at < datetime('now')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
