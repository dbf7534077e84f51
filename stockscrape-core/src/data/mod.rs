//! Document fetchers: the collaborator that turns a URL into a [`Document`].
//!
//! [`Document`]: crate::document::Document

pub mod fetcher;
pub mod fixture;
pub mod http;

pub use fetcher::{DocumentFetcher, FetchError, FetcherConfig};
pub use fixture::{DirFetcher, StaticFetcher};
pub use http::HttpFetcher;
