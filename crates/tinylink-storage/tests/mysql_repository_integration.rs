use std::time::Duration;

use sqlx::mysql::MySqlPoolOptions;
use tinylink_core::{Counter, ShortCode, UrlMapping};
use tinylink_storage::{MySqlRepository, ReadRepository, Repository, StorageError};
use tinylink_test_infra::mysql::{MySqlServer, MysqlConfig};

struct Fixture {
    _mysql: MySqlServer,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        let repo = MySqlRepository::new(pool);
        repo.migrate().await.expect("create schema");

        Self {
            _mysql: mysql,
            repo,
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn mapping(url: &str, counter: u64) -> UrlMapping {
    UrlMapping::allocate(url, Counter::new(counter))
}

#[tokio::test]
async fn insert_and_find_by_short_code() {
    let fixture = Fixture::start().await;
    let m = mapping("https://example.com/a", 1);

    fixture.repo.insert(&m).await.unwrap();

    let got = fixture
        .repo
        .find_by_short_code(&m.short_code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.original_url, "https://example.com/a");
    assert_eq!(got.short_code.as_str(), "b");
    assert_eq!(got.counter, Counter::FIRST);
    assert_eq!(
        got.created_at.as_millisecond(),
        m.created_at.as_millisecond()
    );
}

#[tokio::test]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(&mapping("https://one.example", 5))
        .await
        .unwrap();

    let err = fixture
        .repo
        .insert(&mapping("https://two.example", 5))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
async fn codes_differing_only_by_case_do_not_conflict() {
    let fixture = Fixture::start().await;
    // 1 -> "b", 27 -> "B"
    fixture
        .repo
        .insert(&mapping("https://lower.example", 1))
        .await
        .unwrap();
    fixture
        .repo
        .insert(&mapping("https://upper.example", 27))
        .await
        .unwrap();

    let upper = fixture
        .repo
        .find_by_short_code(&ShortCode::new_unchecked("B"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(upper.original_url, "https://upper.example");
}

#[tokio::test]
async fn find_by_max_counter_returns_highest() {
    let fixture = Fixture::start().await;
    assert!(fixture.repo.find_by_max_counter().await.unwrap().is_none());

    for (url, counter) in [("https://a.example", 2), ("https://b.example", 90), ("https://c.example", 14)] {
        fixture.repo.insert(&mapping(url, counter)).await.unwrap();
    }

    let max = fixture.repo.find_by_max_counter().await.unwrap().unwrap();
    assert_eq!(max.counter, Counter::new(90));
}

#[tokio::test]
async fn find_by_original_url_prefers_lowest_counter() {
    let fixture = Fixture::start().await;
    fixture
        .repo
        .insert(&mapping("https://dup.example", 8))
        .await
        .unwrap();
    fixture
        .repo
        .insert(&mapping("https://dup.example", 3))
        .await
        .unwrap();

    let found = fixture
        .repo
        .find_by_original_url("https://dup.example")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.counter, Counter::new(3));

    assert!(fixture
        .repo
        .find_by_original_url("https://missing.example")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let fixture = Fixture::start().await;
    fixture.repo.migrate().await.unwrap();
}

#[tokio::test]
async fn trailing_space_does_not_match_stored_code() {
    let fixture = Fixture::start().await;
    fixture
        .repo
        .insert(&mapping("https://example.com/a", 1))
        .await
        .unwrap();

    let padded = ShortCode::new("b ").unwrap();
    assert!(fixture
        .repo
        .find_by_short_code(&padded)
        .await
        .unwrap()
        .is_none());

    // "b " is a distinct key, not a duplicate of "b".
    let m = UrlMapping {
        short_code: padded.clone(),
        ..mapping("https://example.com/padded", 2)
    };
    fixture.repo.insert(&m).await.unwrap();
    let got = fixture
        .repo
        .find_by_short_code(&padded)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.original_url, "https://example.com/padded");
}

#[tokio::test]
async fn long_urls_are_stored_whole() {
    let fixture = Fixture::start().await;
    let long_url = format!("https://example.com/{}", "a".repeat(3000));
    let m = mapping(&long_url, 1);

    fixture.repo.insert(&m).await.unwrap();

    let by_code = fixture
        .repo
        .find_by_short_code(&m.short_code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_code.original_url, long_url);

    let by_url = fixture
        .repo
        .find_by_original_url(&long_url)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_url.counter, Counter::FIRST);
}
