//! Redis cache for analytics summaries.
//!
//! Best effort: every failure is logged and treated as a miss.

use redis::{Client as RedisClient, RedisResult};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analytics::aggregate::AnalyticsSummary;

pub fn cache_key(days: u32, application_id: Option<Uuid>) -> String {
    match application_id {
        Some(id) => format!("analytics:{days}:{id}"),
        None => format!("analytics:{days}:all"),
    }
}

pub async fn get_cached(client: &RedisClient, key: &str) -> Option<AnalyticsSummary> {
    match read(client, key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(summary) => {
                debug!("Analytics cache hit: {key}");
                Some(summary)
            }
            Err(e) => {
                warn!("Discarding unreadable analytics cache entry {key}: {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Analytics cache read failed for {key}: {e}");
            None
        }
    }
}

pub async fn put_cached(client: &RedisClient, key: &str, summary: &AnalyticsSummary, ttl_secs: u64) {
    if ttl_secs == 0 {
        return;
    }
    let payload = match serde_json::to_string(summary) {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to serialize analytics summary for cache: {e}");
            return;
        }
    };

    if let Err(e) = write(client, key, &payload, ttl_secs).await {
        warn!("Analytics cache write failed for {key}: {e}");
    }
}

async fn read(client: &RedisClient, key: &str) -> RedisResult<Option<String>> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    redis::cmd("GET").arg(key).query_async(&mut conn).await
}

async fn write(client: &RedisClient, key: &str, payload: &str, ttl_secs: u64) -> RedisResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(key)
        .arg(payload)
        .arg("EX")
        .arg(ttl_secs)
        .query_async(&mut conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_scopes() {
        assert_eq!(cache_key(30, None), "analytics:30:all");
        let id = Uuid::nil();
        assert_eq!(
            cache_key(7, Some(id)),
            "analytics:7:00000000-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_a_miss() {
        let client = RedisClient::open("redis://127.0.0.1:1/").unwrap();
        assert!(get_cached(&client, "analytics:30:all").await.is_none());
    }
}
