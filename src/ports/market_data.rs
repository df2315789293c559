//! Discovery source ports
//!
//! A `TokenSource` yields normalized candidates from one upstream feed.
//! A `PairLookup` fetches pair-level display data for a single mint.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{PairSnapshot, SourceTag, TokenCandidate};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    fn tag(&self) -> SourceTag;

    /// Fetch the latest candidates in feed order
    async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>, SourceError>;

    /// Fetch with a time bound, degrading any failure to an empty list
    async fn fetch_or_empty(&self, timeout: Duration) -> Vec<TokenCandidate> {
        let result = match tokio::time::timeout(timeout, self.fetch_candidates()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(timeout)),
        };

        match result {
            Ok(candidates) => {
                tracing::debug!(source = %self.tag(), count = candidates.len(), "Source fetched");
                candidates
            }
            Err(e) => {
                tracing::warn!(source = %self.tag(), "Source failed, skipping: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
pub trait PairLookup: Send + Sync {
    /// First (authoritative) pair for `mint`, if any is listed
    async fn lookup_pair(&self, mint: &str) -> Result<Option<PairSnapshot>, SourceError>;
}
