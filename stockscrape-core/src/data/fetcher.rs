//! Fetcher trait and structured fetch errors.
//!
//! The trait abstracts over where pages come from (live HTTP, saved pages on
//! disk, in-memory fixtures) so the pipeline can run offline and in tests.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Document;

/// Why a page could not be fetched. Network, status and decode failures are
/// kept distinct so a report can tell layout drift from an outage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("timed out after {timeout_ms}ms fetching {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("could not build fetcher: {reason}")]
    Setup { reason: String },
}

impl FetchError {
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Network { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => Some(url),
            FetchError::Setup { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Per-request settings shared by every fetcher that talks to a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Upper bound on one request, connect through body.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Source of parsed documents.
///
/// Implementations must bound every call by a timeout; a section worker
/// relies on `fetch` returning.
pub trait DocumentFetcher: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    fn fetch(&self, url: &str) -> Result<Document, FetchError>;
}
