//! Parsed page: the opaque, queryable value a fetcher hands to the dispatcher.

use scraper::Html;

/// A fetched page: the source text plus its parsed HTML tree.
///
/// The tree is not `Send`; a document lives and dies on the worker that fetched it.
pub struct Document {
    url: String,
    source: String,
    html: Html,
}

impl Document {
    /// Parse `source` as an HTML document fetched from `url`.
    pub fn parse(url: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let html = Html::parse_document(&source);
        Self {
            url: url.into(),
            source,
            html,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The document exactly as it was received.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn html(&self) -> &Html {
        &self.html
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("source_len", &self.source.len())
            .finish()
    }
}
