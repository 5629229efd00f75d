//! Stats queries against ClickHouse.
//!
//! Requires Docker (or `HITSTATS_TEST_CLICKHOUSE_URL`); run with
//! `--ignored`. Against a shared server add `--test-threads=1`, since each
//! test truncates the tables.

use integration_tests::{fixtures, setup::ClickHouseContext};
use stats_core::{HitInput, Site};

async fn seed(ctx: &ClickHouseContext) {
    for (path, n) in [("/a", 4), ("/b", 3), ("/c", 2), ("/draft/x", 1)] {
        for input in fixtures::hits(path, n, 6) {
            ctx.ingestor.ingest(input).await.unwrap();
        }
    }
    for referrer in [
        "https://news.ycombinator.com/",
        "https://hckrnews.com/",
        "https://www.google.de/",
    ] {
        ctx.ingestor
            .ingest(fixtures::hit("/post", referrer, 7))
            .await
            .unwrap();
    }
    ctx.ingestor
        .ingest(HitInput::new(2, "/a", "").at(fixtures::june(6)))
        .await
        .unwrap();

    ctx.add_day_stat(fixtures::SITE, "/a", fixtures::june_day(6), &[(12, 4), (13, 40)])
        .await
        .unwrap();
    ctx.add_day_stat(fixtures::SITE, "/draft/x", fixtures::june_day(6), &[(12, 1)])
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires Docker for the ClickHouse testcontainer"]
async fn test_list_path_stats() {
    let ctx = ClickHouseContext::new(Site::new(fixtures::SITE).with_limits(2, 0)).await;
    seed(&ctx).await;

    let range = fixtures::june_range();
    let page = ctx
        .stats
        .list_path_stats(&range, &["/post".to_string()])
        .await
        .unwrap();

    assert!(page.more);
    assert_eq!(page.total, 13);
    let paths: Vec<&str> = page.rows.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/a", "/b"]);
    assert_eq!(page.rows[0].max, 40);
    assert_eq!(page.rows[1].max, 10);
    assert_eq!(page.total_display, 44);
    assert_eq!(page.rows[0].stats[0].day, fixtures::june_day(6));
}

#[tokio::test]
#[ignore = "requires Docker for the ClickHouse testcontainer"]
async fn test_list_referrers() {
    let ctx = ClickHouseContext::new(Site::new(fixtures::SITE).with_limits(0, 1)).await;
    seed(&ctx).await;

    let page = ctx
        .stats
        .list_referrers("/POST", &fixtures::june_range(), 0)
        .await
        .unwrap();
    assert!(page.more);
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].referrer, "Hacker News");
    assert_eq!(page.rows[0].count, 2);
}

#[tokio::test]
#[ignore = "requires Docker for the ClickHouse testcontainer"]
async fn test_paths_like_and_purge() {
    let ctx = ClickHouseContext::new(Site::new(fixtures::SITE)).await;
    seed(&ctx).await;

    assert_eq!(ctx.stats.list_paths().await.unwrap(), vec!["/a", "/draft/x"]);

    let preview = ctx.stats.list_paths_like("/DRAFT/%").await.unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].path, "/draft/x");

    ctx.stats.purge("/draft/%").await.unwrap();
    assert!(ctx.stats.list_paths_like("/draft/%").await.unwrap().is_empty());
    assert_eq!(ctx.stats.list_paths().await.unwrap(), vec!["/a"]);
}
