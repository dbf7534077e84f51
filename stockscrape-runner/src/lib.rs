//! StockScrape Runner — assembles one instrument's record from its sections.
//!
//! This crate builds on `stockscrape-core` to provide:
//! - Concurrent section workers on a private thread pool
//! - Caller-driven cancellation and an overall deadline
//! - Commutative merge of bound sections into a `StockRecord`
//! - Per-section status, errors and binding warnings in an `AssemblyReport`
//! - Progress callbacks (silent or via `tracing`)

pub mod assembler;
pub mod progress;
pub mod report;

pub use assembler::{assemble, AssembleError, AssembleOptions};
pub use progress::{LogProgress, NoProgress, SectionProgress};
pub use report::{AssemblyReport, SectionError, SectionFailure, SectionReport, SectionStatus};
