//! Ingest-then-query tests over the in-memory store.
//!
//! These run the same ingestor and aggregator the binary uses, without
//! needing Docker.

use integration_tests::{fixtures, setup::MemoryContext};
use stats_core::{HitInput, IngestOutcome, RefScheme, Site};

#[tokio::test]
async fn test_referrers_are_classified_on_the_way_in() {
    let ctx = MemoryContext::new(Site::new(fixtures::SITE));

    for referrer in fixtures::REFERRERS {
        let out = ctx
            .ingestor
            .ingest(fixtures::hit("about/", referrer, 3))
            .await
            .expect("ingest failed");
        assert!(out.is_stored(), "{} was not stored", referrer);
    }

    let hits = ctx.stats.list_hits().await.unwrap();
    assert_eq!(hits.len(), fixtures::REFERRERS.len());
    assert!(hits.iter().all(|h| h.path == "/about"));

    let labels: Vec<(&str, Option<RefScheme>)> = hits
        .iter()
        .map(|h| (h.referrer.as_str(), h.ref_scheme))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("Google", Some(RefScheme::Generated)),
            ("Hacker News", Some(RefScheme::Generated)),
            ("example.com/page", Some(RefScheme::Http)),
            ("en.wikipedia.org/wiki/Analytics", Some(RefScheme::Http)),
            ("www.reddit.com/r/rust", Some(RefScheme::Http)),
            ("Email", Some(RefScheme::Generated)),
            ("", None),
        ]
    );

    // ref_original is kept exactly for the hits whose referrer was rewritten
    for h in &hits {
        let generated = h.ref_scheme == Some(RefScheme::Generated);
        if generated {
            assert!(h.ref_params.is_none());
        }
        assert_eq!(
            h.ref_original.is_some(),
            !h.referrer.is_empty(),
            "ref_original for {:?}",
            h.referrer
        );
    }
    assert_eq!(hits[2].ref_params.as_deref(), Some("ref=1"));
}

#[tokio::test]
async fn test_blacklisted_and_invalid_hits_write_nothing() {
    let ctx = MemoryContext::new(Site::new(fixtures::SITE));

    let out = ctx
        .ingestor
        .ingest(fixtures::hit("/", "https://semalt.com/crawler.php?u=x", 3))
        .await
        .unwrap();
    assert_eq!(
        out,
        IngestOutcome::Dropped {
            host: "semalt.com".into()
        }
    );

    let err = ctx
        .ingestor
        .ingest(HitInput::new(fixtures::SITE, "", ""))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.http_status(), 400);

    assert_eq!(ctx.store.insert_count(), 0);
}

#[tokio::test]
async fn test_path_stats_after_ingest() {
    let ctx = MemoryContext::new(Site::new(fixtures::SITE).with_limits(2, 0));

    for (path, n) in [("/a", 4), ("/b", 3), ("/c", 2)] {
        for input in fixtures::hits(path, n, 5) {
            ctx.ingestor.ingest(input).await.unwrap();
        }
    }
    // Outside the range
    ctx.ingestor
        .ingest(HitInput::new(fixtures::SITE, "/a", "").at(fixtures::june(1) - chrono::Duration::days(2)))
        .await
        .unwrap();

    ctx.store
        .add_day_stat(fixtures::SITE, "/a", fixtures::june_day(5), &[(12, 4)]);

    let range = fixtures::june_range();
    let page = ctx.stats.list_path_stats(&range, &[]).await.unwrap();
    assert_eq!(page.total, 9);
    assert_eq!(page.total_display, 4);
    assert!(!page.more);
    assert_eq!(page.rows.len(), 2);
    assert!(page.rows.iter().all(|r| r.max >= 10));

    // Page on by excluding what was shown
    let shown: Vec<String> = page.rows.iter().map(|r| r.path.clone()).collect();
    let next = ctx.stats.list_path_stats(&range, &shown).await.unwrap();
    assert!(!next.more);
    assert_eq!(next.rows.len(), 1);
    assert_eq!(next.rows[0].path, "/c");
    assert_eq!(next.total, 9);
}

#[tokio::test]
async fn test_referrers_for_path() {
    let ctx = MemoryContext::new(Site::new(fixtures::SITE).with_limits(0, 2));

    for referrer in [
        "https://news.ycombinator.com/item?id=1",
        "https://hn.algolia.com/",
        "https://www.google.com/",
        "https://lobste.rs/t/rust",
    ] {
        ctx.ingestor
            .ingest(fixtures::hit("/Post", referrer, 10))
            .await
            .unwrap();
    }

    let range = fixtures::june_range();
    let first = ctx.stats.list_referrers("/post", &range, 0).await.unwrap();
    assert!(first.more);
    assert_eq!(first.rows[0].referrer, "Hacker News");
    assert_eq!(first.rows[0].count, 2);
    assert_eq!(first.rows[0].ref_scheme, Some(RefScheme::Generated));
    // count ties break on label, descending
    assert_eq!(first.rows[1].referrer, "lobste.rs");

    let second = ctx.stats.list_referrers("/post", &range, 2).await.unwrap();
    assert!(!second.more);
    assert_eq!(second.rows.len(), 1);
    assert_eq!(second.rows[0].referrer, "Google");
}
