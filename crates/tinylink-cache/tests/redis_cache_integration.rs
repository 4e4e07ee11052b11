use std::time::Duration;

use tinylink_cache::{CacheError, RedisUrlCache, UrlCache};
use tinylink_core::ShortCode;
use tinylink_test_infra::redis::RedisServer;

/// Test fixture that manages a Redis container using test-infra.
struct RedisFixture {
    redis: RedisServer,
    redis_url: String,
}

impl RedisFixture {
    async fn start() -> Self {
        let redis = RedisServer::new().await.expect("Failed to start Redis");
        let redis_url = redis.url().await.expect("Failed to get Redis url");
        Self { redis, redis_url }
    }

    async fn cache(&self) -> RedisUrlCache {
        RedisUrlCache::connect(&self.redis_url)
            .await
            .expect("Failed to connect to Redis")
    }
}

fn code(s: &str) -> ShortCode {
    ShortCode::new_unchecked(s)
}

#[tokio::test]
async fn get_and_set_round_trip() {
    let fixture = RedisFixture::start().await;
    let cache = fixture.cache().await;
    let c = code("b");

    assert!(cache.get_url(&c).await.unwrap().is_none());

    cache
        .set_url(&c, "https://example.com/a", Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(
        cache.get_url(&c).await.unwrap().as_deref(),
        Some("https://example.com/a")
    );
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let fixture = RedisFixture::start().await;
    let cache = fixture.cache().await;
    let c = code("c");

    cache
        .set_url(&c, "https://example.com/short-lived", Duration::from_secs(1))
        .await
        .unwrap();
    assert!(cache.get_url(&c).await.unwrap().is_some());

    awaitility::at_most(Duration::from_secs(5))
        .poll_interval(Duration::from_millis(100))
        .until_async(|| async { cache.get_url(&c).await.unwrap().is_none() })
        .await;
}

#[tokio::test]
async fn key_prefix_isolates_caches() {
    let fixture = RedisFixture::start().await;
    let first = fixture.cache().await.with_key_prefix("first:");
    let second = fixture.cache().await.with_key_prefix("second:");
    let c = code("b");

    first
        .set_url(&c, "https://first.example", Duration::from_secs(60))
        .await
        .unwrap();

    assert!(second.get_url(&c).await.unwrap().is_none());
    assert_eq!(
        first.get_url(&c).await.unwrap().as_deref(),
        Some("https://first.example")
    );
}

#[tokio::test]
async fn stopped_redis_reports_errors_instead_of_hanging() {
    let fixture = RedisFixture::start().await;
    let cache = fixture
        .cache()
        .await
        .with_op_timeout(Duration::from_millis(200));
    let c = code("b");

    fixture.redis.stop().await.expect("Failed to stop Redis");

    let err = cache.get_url(&c).await.unwrap_err();
    assert!(matches!(
        err,
        CacheError::Unavailable(_) | CacheError::Timeout(_) | CacheError::Operation(_)
    ));

    let err = cache
        .set_url(&c, "https://example.com", Duration::from_secs(60))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::Unavailable(_) | CacheError::Timeout(_) | CacheError::Operation(_)
    ));
}

#[tokio::test]
async fn connect_to_unreachable_redis_fails() {
    let err = RedisUrlCache::connect("redis://127.0.0.1:1").await.unwrap_err();
    assert!(matches!(
        err,
        CacheError::Unavailable(_) | CacheError::Timeout(_) | CacheError::Operation(_)
    ));
}
