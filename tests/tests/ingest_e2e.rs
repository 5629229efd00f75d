//! End-to-end ingest tests against ClickHouse.
//!
//! Requires Docker (or `HITSTATS_TEST_CLICKHOUSE_URL`); run with
//! `--ignored`.

use integration_tests::{fixtures, setup::ClickHouseContext};
use stats_core::{HitStore, IngestOutcome, RefScheme, Site};

#[tokio::test]
#[ignore = "requires Docker for the ClickHouse testcontainer"]
async fn test_ingest_round_trips_through_clickhouse() {
    let ctx = ClickHouseContext::new(Site::new(fixtures::SITE)).await;

    let out = ctx
        .ingestor
        .ingest(fixtures::hit(
            "blog/post/",
            "https://example.com/page?utm_source=x&ref=1",
            4,
        ))
        .await
        .expect("ingest failed");
    let IngestOutcome::Stored(stored) = out else {
        panic!("hit was not stored");
    };

    let hits = ctx.clickhouse.list_hits(fixtures::SITE).await.unwrap();
    assert_eq!(hits, vec![stored]);

    let hit = &hits[0];
    assert_eq!(hit.path, "/blog/post");
    assert_eq!(hit.referrer, "example.com/page");
    assert_eq!(hit.ref_params.as_deref(), Some("ref=1"));
    assert_eq!(hit.ref_scheme, Some(RefScheme::Http));
    assert_eq!(
        hit.ref_original.as_deref(),
        Some("https://example.com/page?utm_source=x&ref=1")
    );
    assert_eq!(hit.created_at, fixtures::june(4));
}

#[tokio::test]
#[ignore = "requires Docker for the ClickHouse testcontainer"]
async fn test_generated_referrer_stored_with_scheme_code() {
    let ctx = ClickHouseContext::new(Site::new(fixtures::SITE)).await;

    ctx.ingestor
        .ingest(fixtures::hit("/", "https://news.ycombinator.com/", 4))
        .await
        .unwrap();

    let hits = ctx.stats.list_hits().await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].referrer, "Hacker News");
    assert_eq!(hits[0].ref_scheme, Some(RefScheme::Generated));
    assert!(hits[0].ref_params.is_none());
}

#[tokio::test]
#[ignore = "requires Docker for the ClickHouse testcontainer"]
async fn test_blacklisted_hit_is_not_written() {
    let ctx = ClickHouseContext::new(Site::new(fixtures::SITE)).await;

    let out = ctx
        .ingestor
        .ingest(fixtures::hit("/", "http://darodar.com/", 4))
        .await
        .unwrap();
    assert!(!out.is_stored());

    let total = ctx
        .clickhouse
        .count_total(fixtures::SITE, &fixtures::june_range())
        .await
        .unwrap();
    assert_eq!(total, 0);
}
