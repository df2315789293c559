//! Discovery pipeline integration tests
//!
//! Drive full scan cycles against in-memory sources and a recording sink,
//! with the seen set persisted to a temporary directory.

use std::sync::Arc;
use std::time::Duration;

use mint_sniper::application::discovery;
use mint_sniper::application::{DiscoveryConfig, DiscoveryError, DiscoveryPipeline, NotificationDispatcher};
use mint_sniper::domain::{PairSnapshot, SeenTokenStore, SourceTag, TokenAudit, TokenCandidate};
use mint_sniper::ports::mocks::{RecordingSink, SinkBehavior, StaticPairLookup, StaticTokenSource};
use mint_sniper::ports::TokenSource;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn test_config() -> DiscoveryConfig {
    DiscoveryConfig {
        interval: Duration::from_millis(10),
        source_timeout: Duration::from_millis(200),
        max_candidates_per_source: 15,
        max_notifications_per_cycle: 10,
        dispatch_delay: Duration::ZERO,
        enrich: false,
    }
}

fn candidate(mint: &str, holders: u64) -> TokenCandidate {
    TokenCandidate::new(mint, format!("Token {}", mint), mint.to_uppercase(), SourceTag::JupiterRecent)
        .with_holders(holders)
}

fn pipeline(
    sources: Vec<Arc<dyn TokenSource>>,
    seen: SeenTokenStore,
    sink: Arc<RecordingSink>,
    config: DiscoveryConfig,
) -> DiscoveryPipeline {
    DiscoveryPipeline::new(sources, seen, NotificationDispatcher::new(sink), config)
}

#[tokio::test]
async fn test_restart_does_not_renotify() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seenTokens.json");
    let source: Arc<dyn TokenSource> = Arc::new(StaticTokenSource::new(
        SourceTag::JupiterRecent,
        vec![candidate("mintA", 20), candidate("mintB", 0)],
    ));

    let first_sink = Arc::new(RecordingSink::new());
    let first = pipeline(
        vec![source.clone()],
        SeenTokenStore::load(&seen_path).unwrap(),
        first_sink.clone(),
        test_config(),
    );
    let report = assert_ok!(first.run_cycle().await);
    assert_eq!(report.notified, 2);
    assert_eq!(first_sink.count(), 2);

    // Same process: nothing new
    let again = assert_ok!(first.run_cycle().await);
    assert_eq!(again.notified, 0);
    assert_eq!(again.already_seen, 2);

    // Fresh process over the same file
    let second_sink = Arc::new(RecordingSink::new());
    let second = pipeline(
        vec![source],
        SeenTokenStore::load(&seen_path).unwrap(),
        second_sink.clone(),
        test_config(),
    );
    let report = assert_ok!(second.run_cycle().await);
    assert_eq!(report.notified, 0);
    assert_eq!(report.already_seen, 2);
    assert_eq!(second_sink.count(), 0);
}

#[tokio::test]
async fn test_seen_mint_with_changed_fields_is_skipped() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let mut seen = SeenTokenStore::load(&seen_path).unwrap();
    seen.mark_seen("mintA").unwrap();

    let changed = candidate("mintA", 45).with_liquidity(99_000.0);
    let source = Arc::new(StaticTokenSource::new(SourceTag::DexScreener, vec![changed]));
    let sink = Arc::new(RecordingSink::new());

    let report = pipeline(vec![source], seen, sink.clone(), test_config())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.already_seen, 1);
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn test_cap_bounds_notifications_and_defers_the_rest() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let tokens: Vec<_> = (0..5).map(|i| candidate(&format!("mint{}", i), 0)).collect();
    let source = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, tokens));
    let sink = Arc::new(RecordingSink::new());

    let config = DiscoveryConfig {
        max_notifications_per_cycle: 2,
        ..test_config()
    };
    let pipeline = pipeline(vec![source], SeenTokenStore::load(&seen_path).unwrap(), sink.clone(), config);

    let report = assert_ok!(pipeline.run_cycle().await);
    assert_eq!(report.notified, 2);
    assert_eq!(report.deferred, 3);
    assert_eq!(pipeline.seen_count().await, 2);

    // Deferred tokens go out on later cycles
    let next = assert_ok!(pipeline.run_cycle().await);
    assert_eq!(next.notified, 2);
    assert_eq!(next.already_seen, 2);
    assert_eq!(sink.count(), 4);
}

#[tokio::test]
async fn test_highest_score_notified_first() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let source = Arc::new(StaticTokenSource::new(
        SourceTag::JupiterRecent,
        vec![candidate("low", 0), candidate("high", 30)],
    ));
    let sink = Arc::new(RecordingSink::new());
    let config = DiscoveryConfig {
        max_notifications_per_cycle: 1,
        ..test_config()
    };

    pipeline(vec![source], SeenTokenStore::load(&seen_path).unwrap(), sink.clone(), config)
        .run_cycle()
        .await
        .unwrap();

    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].text.contains("`high`"));
}

#[tokio::test]
async fn test_failed_dispatch_still_marks_seen() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let source = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, vec![candidate("mintA", 20)]));
    let sink = Arc::new(RecordingSink::failing());

    let pipeline = pipeline(vec![source], SeenTokenStore::load(&seen_path).unwrap(), sink, test_config());
    let report = assert_ok!(pipeline.run_cycle().await);

    assert_eq!(report.notified, 0);
    assert_eq!(report.dispatch_failures, 1);
    assert!(pipeline.is_seen("mintA").await);

    let reloaded = SeenTokenStore::load(&seen_path).unwrap();
    assert!(reloaded.contains("mintA"));

    // No retry
    let next = assert_ok!(pipeline.run_cycle().await);
    assert_eq!(next.dispatch_failures, 0);
    assert_eq!(next.already_seen, 1);
}

#[tokio::test]
async fn test_failing_and_slow_sources_do_not_abort_cycle() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let failing = Arc::new(StaticTokenSource::failing(SourceTag::Helius));
    let slow = Arc::new(
        StaticTokenSource::new(SourceTag::DexScreener, vec![candidate("slowMint", 0)])
            .with_delay(Duration::from_secs(5)),
    );
    let healthy = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, vec![candidate("mintA", 0)]));
    let sink = Arc::new(RecordingSink::new());

    let report = pipeline(
        vec![failing.clone(), slow.clone(), healthy],
        SeenTokenStore::load(&seen_path).unwrap(),
        sink.clone(),
        test_config(),
    )
    .run_cycle()
    .await
    .unwrap();

    assert_eq!(failing.call_count(), 1);
    assert_eq!(slow.call_count(), 1);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.notified, 1);
    assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn test_incomplete_and_suspicious_candidates_filtered() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let suspicious = candidate("sus", 30).with_audit(TokenAudit {
        is_suspicious: true,
        ..Default::default()
    });
    let nameless = TokenCandidate::new("anon", "", "ANON", SourceTag::Helius);
    let source = Arc::new(StaticTokenSource::new(
        SourceTag::JupiterRecent,
        vec![suspicious, nameless, candidate("ok", 0)],
    ));
    let sink = Arc::new(RecordingSink::new());

    let report = pipeline(vec![source], SeenTokenStore::load(&seen_path).unwrap(), sink, test_config())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.filtered_out, 2);
    assert_eq!(report.notified, 1);
}

#[tokio::test]
async fn test_persistence_failure_aborts_before_any_send() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let seen = SeenTokenStore::load(&seen_path).unwrap();

    // A directory where the file should be makes every write fail
    std::fs::create_dir(&seen_path).unwrap();

    let source = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, vec![candidate("mintA", 20)]));
    let sink = Arc::new(RecordingSink::new());
    let pipeline = pipeline(vec![source], seen, sink.clone(), test_config());

    let error = assert_err!(pipeline.run_cycle().await);
    assert!(matches!(error, DiscoveryError::Persist(_)));
    assert_eq!(sink.count(), 0);
    assert!(!pipeline.is_seen("mintA").await);
}

#[tokio::test]
async fn test_enrichment_fills_missing_display_fields() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let token = candidate("mintA", 20).with_liquidity(1_234.0);
    let source = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, vec![token]));
    let lookup = Arc::new(StaticPairLookup::new().with_pair(
        "mintA",
        PairSnapshot {
            price_usd: 0.5,
            market_cap_usd: 500_000.0,
            liquidity_usd: 9_999.0,
            volume_24h_usd: 42_000.0,
        },
    ));
    let sink = Arc::new(RecordingSink::new());
    let config = DiscoveryConfig {
        enrich: true,
        ..test_config()
    };

    pipeline(vec![source], SeenTokenStore::load(&seen_path).unwrap(), sink.clone(), config)
        .with_pair_lookup(lookup.clone())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(lookup.get_calls(), vec!["mintA".to_string()]);
    let text = &sink.messages()[0].text;
    assert!(text.contains("500,000"));
    assert!(text.contains("42,000"));
    // Feed-reported liquidity is kept
    assert!(text.contains("1,234"));
    assert!(!text.contains("9,999"));
}

#[tokio::test]
async fn test_preview_does_not_mutate() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let mut seen = SeenTokenStore::load(&seen_path).unwrap();
    seen.mark_seen("old").unwrap();

    let sources: Vec<Arc<dyn TokenSource>> = vec![Arc::new(StaticTokenSource::new(
        SourceTag::JupiterRecent,
        vec![candidate("old", 0), candidate("new", 30)],
    ))];

    let entries = discovery::preview(&sources, &test_config(), &seen).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].scored.token.mint, "new");
    assert!(!entries[0].already_seen);
    assert!(entries[1].already_seen);

    assert_eq!(seen.len(), 1);
    let reloaded = SeenTokenStore::load(&seen_path).unwrap();
    assert!(!reloaded.contains("new"));
}

#[tokio::test]
async fn test_run_loop_stops() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let source = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, vec![candidate("mintA", 0)]));
    let sink = Arc::new(RecordingSink::new());
    let pipeline = Arc::new(pipeline(
        vec![source.clone()],
        SeenTokenStore::load(&seen_path).unwrap(),
        sink.clone(),
        test_config(),
    ));

    let handle = tokio::spawn(Arc::clone(&pipeline).run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    pipeline.stop();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("run loop did not stop")
        .unwrap();

    assert!(source.call_count() >= 2);
    assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn test_panicking_source_only_loses_its_own_candidates() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let broken = Arc::new(StaticTokenSource::panicking(SourceTag::Helius));
    let healthy = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, vec![candidate("mintA", 20)]));
    let sink = Arc::new(RecordingSink::new());

    let pipeline = pipeline(
        vec![broken.clone(), healthy],
        SeenTokenStore::load(&seen_path).unwrap(),
        sink.clone(),
        test_config(),
    );
    let report = assert_ok!(pipeline.run_cycle().await);

    assert_eq!(broken.call_count(), 1);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.notified, 1);
    assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn test_run_loop_keeps_cycling_with_panicking_source() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let broken = Arc::new(StaticTokenSource::panicking(SourceTag::DexScreener));
    let healthy = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, vec![candidate("mintA", 0)]));
    let sink = Arc::new(RecordingSink::new());
    let pipeline = Arc::new(pipeline(
        vec![broken.clone(), healthy],
        SeenTokenStore::load(&seen_path).unwrap(),
        sink.clone(),
        test_config(),
    ));

    let handle = tokio::spawn(Arc::clone(&pipeline).run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    pipeline.stop();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("run loop did not stop")
        .unwrap();

    assert!(broken.call_count() >= 2);
    assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn test_run_loop_survives_panicking_cycle() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let source = Arc::new(StaticTokenSource::new(SourceTag::JupiterRecent, vec![candidate("mintA", 0)]));
    let sink = Arc::new(RecordingSink::with_behavior(SinkBehavior::Panic));
    let pipeline = Arc::new(pipeline(
        vec![source.clone()],
        SeenTokenStore::load(&seen_path).unwrap(),
        sink.clone(),
        test_config(),
    ));

    let handle = tokio::spawn(Arc::clone(&pipeline).run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    pipeline.stop();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("run loop did not stop")
        .unwrap();

    // The first cycle died mid-send; later cycles still ran and skip the seen mint
    assert!(source.call_count() >= 2);
    assert_eq!(sink.count(), 1);
    assert!(pipeline.is_seen("mintA").await);
}

#[tokio::test]
async fn test_hanging_sink_counts_as_dispatch_failure() {
    let dir = TempDir::new().unwrap();
    let seen_path = dir.path().join("seen.json");
    let source = Arc::new(StaticTokenSource::new(
        SourceTag::JupiterRecent,
        vec![candidate("mintA", 20), candidate("mintB", 0)],
    ));
    let sink = Arc::new(RecordingSink::with_behavior(SinkBehavior::Hang));
    let config = DiscoveryConfig {
        source_timeout: Duration::from_millis(50),
        ..test_config()
    };
    let pipeline = pipeline(vec![source], SeenTokenStore::load(&seen_path).unwrap(), sink.clone(), config);

    let report = tokio::time::timeout(Duration::from_secs(2), pipeline.run_cycle())
        .await
        .expect("cycle stalled on the sink");
    let report = assert_ok!(report);

    assert_eq!(report.notified, 0);
    assert_eq!(report.dispatch_failures, 2);
    assert_eq!(sink.count(), 2);
    assert!(pipeline.is_seen("mintA").await);
    assert!(pipeline.is_seen("mintB").await);
}
