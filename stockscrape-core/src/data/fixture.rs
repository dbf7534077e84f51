//! Offline fetchers: in-memory pages for tests, saved pages on disk for
//! reproducible runs.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use super::fetcher::{DocumentFetcher, FetchError};
use crate::document::Document;

#[derive(Debug, Clone)]
struct Canned {
    body: Result<String, FetchError>,
    delay: Duration,
}

/// Serves canned responses keyed by exact URL.
///
/// Unknown URLs answer HTTP 404. A response delayed past the fetcher's timeout
/// sleeps for the timeout and then fails with [`FetchError::Timeout`], the way
/// a real client would.
#[derive(Debug)]
pub struct StaticFetcher {
    pages: HashMap<String, Canned>,
    timeout: Duration,
    requests: Mutex<Vec<String>>,
}

impl Default for StaticFetcher {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
            timeout: Duration::from_secs(30),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(
            url.into(),
            Canned {
                body: Ok(html.into()),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn failing(mut self, url: impl Into<String>, err: FetchError) -> Self {
        self.pages.insert(
            url.into(),
            Canned {
                body: Err(err),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Delay the response for `url`. An unregistered URL becomes an empty page.
    pub fn delayed(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.pages
            .entry(url.into())
            .or_insert_with(|| Canned {
                body: Ok(String::new()),
                delay: Duration::ZERO,
            })
            .delay = delay;
        self
    }

    /// URLs requested so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl DocumentFetcher for StaticFetcher {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());

        let Some(canned) = self.pages.get(url) else {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        };

        if canned.delay > self.timeout {
            std::thread::sleep(self.timeout);
            return Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            });
        }
        if !canned.delay.is_zero() {
            std::thread::sleep(canned.delay);
        }

        canned.body.clone().map(|html| Document::parse(url, html))
    }
}

/// Reads pages saved as `<dir>/<last URL path segment>.html`.
///
/// `https://finance.yahoo.com/quote/VEDL.NS/key-statistics/` reads
/// `key-statistics.html`.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    dir: PathBuf,
}

impl DirFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let segment = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("index");
        self.dir.join(format!("{segment}.html"))
    }
}

impl DocumentFetcher for DirFetcher {
    fn name(&self) -> &str {
        "dir"
    }

    fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let path = self.path_for(url);
        tracing::debug!(url, path = %path.display(), "reading saved page");
        match std::fs::read_to_string(&path) {
            Ok(html) => Ok(Document::parse(url, html)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(FetchError::Decode {
                url: url.to_string(),
                reason: format!("{}: {e}", path.display()),
            }),
            Err(e) => Err(FetchError::Network {
                url: url.to_string(),
                reason: format!("{}: {e}", path.display()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_fetcher_serves_pages_and_records_requests() {
        let fetcher = StaticFetcher::new().page("https://a.test/x", "<h1>Hi</h1>");
        let doc = fetcher.fetch("https://a.test/x").unwrap();
        assert_eq!(doc.source(), "<h1>Hi</h1>");
        assert_eq!(
            fetcher.fetch("https://a.test/y").unwrap_err(),
            FetchError::Status {
                url: "https://a.test/y".into(),
                status: 404
            }
        );
        assert_eq!(fetcher.requests(), ["https://a.test/x", "https://a.test/y"]);
    }

    #[test]
    fn delay_past_timeout_is_a_timeout() {
        let fetcher = StaticFetcher::new()
            .with_timeout(Duration::from_millis(10))
            .page("u", "<p>")
            .delayed("u", Duration::from_secs(60));
        assert!(fetcher.fetch("u").unwrap_err().is_timeout());
    }

    #[test]
    fn dir_fetcher_maps_last_segment() {
        let fetcher = DirFetcher::new("/pages");
        assert_eq!(
            fetcher.path_for("https://finance.yahoo.com/quote/VEDL.NS/key-statistics/"),
            Path::new("/pages/key-statistics.html")
        );
        assert_eq!(
            fetcher.path_for("https://finance.yahoo.com/quote/VEDL.NS/history/?p=VEDL.NS"),
            Path::new("/pages/history.html")
        );
        assert_eq!(fetcher.path_for("https://"), Path::new("/pages/index.html"));
    }

    #[test]
    fn dir_fetcher_missing_file_is_404() {
        let dir = std::env::temp_dir().join("stockscrape-dir-fetcher-missing");
        let fetcher = DirFetcher::new(&dir);
        let err = fetcher.fetch("https://x.test/quote/ABC/news").unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn dir_fetcher_reads_saved_page() {
        let dir = std::env::temp_dir().join(format!("stockscrape-dir-fetcher-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("profile.html"), "<h1>Vedanta</h1>").unwrap();
        let doc = DirFetcher::new(&dir)
            .fetch("https://finance.yahoo.com/quote/VEDL.NS/profile/")
            .unwrap();
        assert_eq!(doc.source(), "<h1>Vedanta</h1>");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
