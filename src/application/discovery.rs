//! Discovery Pipeline
//!
//! One cycle runs FETCH → FILTER → SCORE → RANK → DEDUP → NOTIFY. The seen
//! set is updated and persisted before each send, so a crash mid-cycle can
//! lose a notification but never duplicate one. Cycles never overlap: the
//! store lock is held for the whole cycle and the run loop only sleeps after
//! a cycle has finished.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use super::dispatcher::NotificationDispatcher;
use crate::domain::{PersistError, ScoredToken, SeenTokenStore, TokenCandidate};
use crate::ports::market_data::{PairLookup, TokenSource};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Seen-token persistence failed: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Pause between the end of one cycle and the start of the next
    pub interval: Duration,
    /// Upper bound on a single source fetch, pair lookup or send
    pub source_timeout: Duration,
    /// Candidates kept per source after filtering
    pub max_candidates_per_source: usize,
    /// New tokens announced per cycle; the rest wait for the next cycle
    pub max_notifications_per_cycle: usize,
    /// Pause between two consecutive sends
    pub dispatch_delay: Duration,
    /// Fill display fields from the pair feed before sending
    pub enrich: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            source_timeout: Duration::from_secs(10),
            max_candidates_per_source: 15,
            max_notifications_per_cycle: 10,
            dispatch_delay: Duration::from_millis(1000),
            enrich: true,
        }
    }
}

/// Counters for one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub filtered_out: usize,
    pub scored: usize,
    pub already_seen: usize,
    pub notified: usize,
    pub deferred: usize,
    pub dispatch_failures: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched={} filtered={} scored={} seen={} notified={} deferred={} failed={}",
            self.fetched,
            self.filtered_out,
            self.scored,
            self.already_seen,
            self.notified,
            self.deferred,
            self.dispatch_failures
        )
    }
}

/// A ranked candidate as shown by a dry run
#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub scored: ScoredToken,
    pub already_seen: bool,
}

pub struct DiscoveryPipeline {
    sources: Vec<Arc<dyn TokenSource>>,
    pair_lookup: Option<Arc<dyn PairLookup>>,
    dispatcher: NotificationDispatcher,
    seen: Mutex<SeenTokenStore>,
    config: DiscoveryConfig,
    shutdown: watch::Sender<bool>,
}

impl DiscoveryPipeline {
    pub fn new(
        sources: Vec<Arc<dyn TokenSource>>,
        seen: SeenTokenStore,
        dispatcher: NotificationDispatcher,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            sources,
            pair_lookup: None,
            dispatcher,
            seen: Mutex::new(seen),
            config,
            shutdown: watch::Sender::new(false),
        }
    }

    pub fn with_pair_lookup(mut self, lookup: Arc<dyn PairLookup>) -> Self {
        self.pair_lookup = Some(lookup);
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub async fn seen_count(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn is_seen(&self, mint: &str) -> bool {
        self.seen.lock().await.contains(mint)
    }

    /// Run cycles until `stop` is called.
    ///
    /// Each cycle runs in its own task so a panic is logged and the loop
    /// carries on.
    pub async fn run(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();

        tracing::info!(
            "Starting discovery - {} sources, interval {:?}, cap {}/cycle",
            self.sources.len(),
            self.config.interval,
            self.config.max_notifications_per_cycle
        );

        while !*shutdown.borrow() {
            let pipeline = Arc::clone(&self);
            match tokio::spawn(async move { pipeline.run_cycle().await }).await {
                Ok(Ok(report)) => tracing::info!("Cycle complete: {}", report),
                Ok(Err(e)) => tracing::error!("Cycle aborted: {}", e),
                Err(e) if e.is_panic() => tracing::error!("Cycle panicked: {}", e),
                Err(e) => tracing::error!("Cycle task failed: {}", e),
            }

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::info!("Discovery stopped");
    }

    /// Ask the run loop to exit after the current cycle
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
        tracing::info!("Stop signal sent to discovery");
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// One full scan cycle
    pub async fn run_cycle(&self) -> Result<CycleReport, DiscoveryError> {
        let mut seen = self.seen.lock().await;
        let mut report = CycleReport::default();

        let ranked = collect_ranked(&self.sources, &self.config, &mut report).await;

        for mut scored in ranked {
            let mint = scored.token.mint.clone();

            if seen.contains(&mint) {
                report.already_seen += 1;
                continue;
            }

            if report.notified + report.dispatch_failures >= self.config.max_notifications_per_cycle {
                report.deferred += 1;
                continue;
            }

            // Persist first; a failed write aborts the cycle before any send
            seen.mark_seen(&mint)?;

            if report.notified + report.dispatch_failures > 0 && !self.config.dispatch_delay.is_zero() {
                tokio::time::sleep(self.config.dispatch_delay).await;
            }

            self.enrich(&mut scored.token).await;

            let send = self.dispatcher.dispatch(&scored, Utc::now());
            match tokio::time::timeout(self.config.source_timeout, send).await {
                Ok(Ok(())) => report.notified += 1,
                Ok(Err(e)) => {
                    tracing::warn!(mint = %mint, "Notification failed, token stays seen: {}", e);
                    report.dispatch_failures += 1;
                }
                Err(_) => {
                    tracing::warn!(
                        mint = %mint,
                        "Notification timed out after {:?}, token stays seen",
                        self.config.source_timeout
                    );
                    report.dispatch_failures += 1;
                }
            }
        }

        Ok(report)
    }

    async fn enrich(&self, token: &mut TokenCandidate) {
        if !self.config.enrich {
            return;
        }
        let Some(lookup) = &self.pair_lookup else {
            return;
        };

        let lookup = tokio::time::timeout(self.config.source_timeout, lookup.lookup_pair(&token.mint));
        match lookup.await {
            Ok(Ok(Some(pair))) => token.enrich_from_pair(&pair),
            Ok(Ok(None)) => tracing::debug!(mint = %token.mint, "No pair listed yet"),
            Ok(Err(e)) => tracing::debug!(mint = %token.mint, "Pair lookup failed: {}", e),
            Err(_) => tracing::debug!(mint = %token.mint, "Pair lookup timed out"),
        }
    }
}

/// Fetch every source, filter, score and rank
pub async fn collect_ranked(
    sources: &[Arc<dyn TokenSource>],
    config: &DiscoveryConfig,
    report: &mut CycleReport,
) -> Vec<ScoredToken> {
    let mut candidates = Vec::new();

    for source in sources {
        // A panicking adapter only loses its own candidates
        let task_source = Arc::clone(source);
        let timeout = config.source_timeout;
        let fetched = match tokio::spawn(async move { task_source.fetch_or_empty(timeout).await }).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(source = %source.tag(), "Source task failed, skipping: {}", e);
                Vec::new()
            }
        };
        report.fetched += fetched.len();

        let kept = filter_candidates(fetched, config.max_candidates_per_source);
        tracing::debug!(source = %source.tag(), kept = kept.len(), "Candidates after filter");
        candidates.extend(kept);
    }

    report.filtered_out = report.fetched - candidates.len();

    let ranked = rank(candidates);
    report.scored = ranked.len();
    ranked
}

/// FETCH → RANK as a dry run: ranked candidates annotated with whether
/// `seen` already holds them. Nothing is persisted or sent.
pub async fn preview(
    sources: &[Arc<dyn TokenSource>],
    config: &DiscoveryConfig,
    seen: &SeenTokenStore,
) -> Vec<PreviewEntry> {
    let mut report = CycleReport::default();
    let ranked = collect_ranked(sources, config, &mut report).await;
    annotate(ranked, seen)
}

fn annotate(ranked: Vec<ScoredToken>, seen: &SeenTokenStore) -> Vec<PreviewEntry> {
    ranked
        .into_iter()
        .map(|scored| PreviewEntry {
            already_seen: seen.contains(&scored.token.mint),
            scored,
        })
        .collect()
}

/// Drop incomplete or suspicious candidates, then keep the first `cap`
pub fn filter_candidates(candidates: Vec<TokenCandidate>, cap: usize) -> Vec<TokenCandidate> {
    candidates
        .into_iter()
        .filter(|candidate| {
            if !candidate.is_complete() {
                return false;
            }
            if candidate.audit.is_suspicious {
                tracing::debug!("Skipping suspicious token: {}", candidate.symbol);
                return false;
            }
            true
        })
        .take(cap)
        .collect()
}

/// Score and sort descending; equal scores keep their input order
pub fn rank(candidates: Vec<TokenCandidate>) -> Vec<ScoredToken> {
    let mut scored: Vec<ScoredToken> = candidates.into_iter().map(ScoredToken::new).collect();
    scored.sort_by(|a, b| b.result.score.cmp(&a.result.score));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SourceTag, TokenAudit};

    fn token(mint: &str, holders: u64) -> TokenCandidate {
        TokenCandidate::new(mint, format!("{} name", mint), mint, SourceTag::JupiterRecent)
            .with_holders(holders)
    }

    #[test]
    fn test_filter_drops_incomplete_and_suspicious() {
        let suspicious = token("MintS", 20).with_audit(TokenAudit {
            is_suspicious: true,
            ..Default::default()
        });
        let nameless = TokenCandidate::new("MintN", "", "N", SourceTag::Helius);

        let kept = filter_candidates(vec![token("MintA", 0), suspicious, nameless], 15);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].mint, "MintA");
    }

    #[test]
    fn test_filter_caps_after_filtering() {
        let mut input = vec![TokenCandidate::new("Bad", "", "", SourceTag::Helius)];
        input.extend((0..20).map(|i| token(&format!("Mint{}", i), 0)));

        let kept = filter_candidates(input, 15);
        assert_eq!(kept.len(), 15);
        assert_eq!(kept[0].mint, "Mint0");
    }

    #[test]
    fn test_rank_is_descending_and_stable() {
        let ranked = rank(vec![
            token("Low1", 0),
            token("High", 30),
            token("Low2", 0),
            token("Mid", 60),
        ]);
        let mints: Vec<_> = ranked.iter().map(|s| s.token.mint.as_str()).collect();
        assert_eq!(mints, vec!["High", "Mid", "Low1", "Low2"]);
    }

    #[test]
    fn test_report_display() {
        let report = CycleReport {
            fetched: 3,
            notified: 1,
            ..Default::default()
        };
        assert!(report.to_string().starts_with("fetched=3"));
    }
}
