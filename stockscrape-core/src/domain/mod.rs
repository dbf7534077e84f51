//! Typed records produced by binding.

pub mod financial;
pub mod history;
pub mod news;
pub mod profile;
pub mod record;
pub mod statistics;

pub use financial::{BalanceSheet, Financial, IncomeStatement};
pub use history::HistoricalPoint;
pub use news::NewsItem;
pub use profile::Profile;
pub use record::{field_paths, SectionKind, SectionKindParseError, SectionRecord, StockRecord};
pub use statistics::{Statistics, ValuationMetrics};
