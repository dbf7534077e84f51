//! Progress callbacks for an assembly run.
//!
//! All callbacks fire on the thread that called [`crate::assemble`], in the
//! order events arrive from the section workers.

use stockscrape_core::SectionKind;

use crate::report::{AssemblyReport, SectionReport, SectionStatus};

/// Callback trait for reporting assembly progress.
pub trait SectionProgress: Send {
    /// A section worker was scheduled.
    fn on_start(&self, section: SectionKind, index: usize, total: usize);

    /// Every page of the section was fetched; binding is next.
    fn on_fetched(&self, section: SectionKind);

    /// The section reached a terminal status.
    fn on_complete(&self, report: &SectionReport);

    /// The whole run is done.
    fn on_run_complete(&self, report: &AssemblyReport);
}

/// Discards every event.
pub struct NoProgress;

impl SectionProgress for NoProgress {
    fn on_start(&self, _section: SectionKind, _index: usize, _total: usize) {}
    fn on_fetched(&self, _section: SectionKind) {}
    fn on_complete(&self, _report: &SectionReport) {}
    fn on_run_complete(&self, _report: &AssemblyReport) {}
}

/// Maps progress events onto `tracing` events.
pub struct LogProgress;

impl SectionProgress for LogProgress {
    fn on_start(&self, section: SectionKind, index: usize, total: usize) {
        tracing::debug!(%section, "[{}/{}] scheduling section", index + 1, total);
    }

    fn on_fetched(&self, section: SectionKind) {
        tracing::debug!(%section, "section fetched");
    }

    fn on_complete(&self, report: &SectionReport) {
        match (report.status, &report.failure) {
            (SectionStatus::Bound, _) => tracing::info!(
                section = %report.section,
                warnings = report.warnings.len(),
                elapsed_ms = report.elapsed_ms,
                "section bound"
            ),
            (status, Some(failure)) => tracing::warn!(
                section = %report.section,
                %status,
                "section did not bind: {failure}"
            ),
            (status, None) => tracing::warn!(section = %report.section, %status, "section ended"),
        }
    }

    fn on_run_complete(&self, report: &AssemblyReport) {
        tracing::info!(
            symbol = %report.symbol,
            site = %report.site,
            bound = report.bound_count(),
            failed = report.failed_count(),
            cancelled = report.cancelled_count(),
            elapsed_ms = report.elapsed_ms,
            "assembly complete"
        );
    }
}
