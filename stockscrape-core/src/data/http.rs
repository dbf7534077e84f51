//! Live HTTP fetcher.
//!
//! One blocking GET per page with the configured timeout and browser user
//! agent. No retries: a failed page fails its section and the run moves on.

use std::time::Instant;

use super::fetcher::{DocumentFetcher, FetchError, FetcherConfig};
use crate::document::Document;

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Setup {
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else if err.is_decode() || err.is_body() {
            FetchError::Decode {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

impl DocumentFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let started = Instant::now();
        tracing::debug!(url, "GET");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.classify(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().map_err(|e| self.classify(url, e))?;
        tracing::debug!(
            url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched"
        );
        Ok(Document::parse(url, body))
    }
}
