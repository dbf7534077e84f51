//! StockScrape Core — turns scraped quote pages into typed records.
//!
//! This crate contains the extraction pipeline:
//! - Numeric normalizer for percentages and magnitude suffixes
//! - Selector dispatcher (named CSS patterns → ordered matched text)
//! - Positional schemas and the schema binder, with soft binding warnings
//! - Typed records (profile, statistics, news, history, financials)
//! - Document fetchers (HTTP, saved pages, in-memory fixtures)
//! - Site configuration and the per-section fetch → dispatch → bind pass

pub mod bind;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod document;
pub mod domain;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod warning;

pub use bind::{bind, bind_record, bind_row_records, bind_rows, BoundFields, FieldValue};
pub use config::{ConfigError, PageConfig, SectionConfig, SiteConfig};
pub use data::{DirFetcher, DocumentFetcher, FetchError, FetcherConfig, HttpFetcher, StaticFetcher};
pub use dispatch::{dispatch, ExtractionResult, Pattern, SelectorError, SelectorSet, RAW_KEY};
pub use document::Document;
pub use domain::{SectionKind, SectionRecord, StockRecord};
pub use normalize::{normalize, Normalized, NumericToken, UnitClass, UnitGrammar};
pub use pipeline::{bind_section, fetch_section, run_section, SectionOutput};
pub use schema::{FieldSchema, RowSchema, Scale, Schema, ValueType};
pub use warning::BindingWarning;
