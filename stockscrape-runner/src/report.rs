//! Aggregate run output: the merged record plus per-section status,
//! section-level errors and field-level binding warnings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockscrape_core::{BindingWarning, FetchError, SectionKind, StockRecord};

/// Where a section ended up. `Pending → Fetched → Bound`, or `Failed` /
/// `Cancelled` from either of the first two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Pending,
    Fetched,
    Bound,
    Failed,
    Cancelled,
}

impl SectionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SectionStatus::Bound | SectionStatus::Failed | SectionStatus::Cancelled
        )
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SectionStatus::Pending => "pending",
            SectionStatus::Fetched => "fetched",
            SectionStatus::Bound => "bound",
            SectionStatus::Failed => "failed",
            SectionStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Why a section produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionFailure {
    #[error("{error}")]
    Fetch { error: FetchError },

    #[error("cancelled before completion")]
    Cancelled,

    /// The worker died (panicked) without reporting a result.
    #[error("worker lost: {reason}")]
    WorkerLost { reason: String },
}

/// A section-level hard stop, as surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("section {section}: {cause}")]
pub struct SectionError {
    pub section: SectionKind,
    pub cause: SectionFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub section: SectionKind,
    pub status: SectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SectionFailure>,
    pub warnings: Vec<BindingWarning>,
    /// Schema fingerprint per page, so the layout version is on record.
    pub fingerprints: Vec<String>,
    pub elapsed_ms: u64,
}

impl SectionReport {
    pub fn pending(section: SectionKind, fingerprints: Vec<String>) -> Self {
        Self {
            section,
            status: SectionStatus::Pending,
            failure: None,
            warnings: Vec::new(),
            fingerprints,
            elapsed_ms: 0,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub symbol: String,
    /// Site label, e.g. `yahoo@2024-10`.
    pub site: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub record: StockRecord,
    /// In configuration order.
    pub sections: Vec<SectionReport>,
}

impl AssemblyReport {
    pub fn section(&self, kind: SectionKind) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.section == kind)
    }

    /// Section-level errors, including `Cancelled` markers.
    pub fn errors(&self) -> Vec<SectionError> {
        self.sections
            .iter()
            .filter_map(|s| {
                s.failure.clone().map(|cause| SectionError {
                    section: s.section,
                    cause,
                })
            })
            .collect()
    }

    /// Binding warnings from every bound section, in configuration order.
    pub fn warnings(&self) -> impl Iterator<Item = (SectionKind, &BindingWarning)> {
        self.sections
            .iter()
            .flat_map(|s| s.warnings.iter().map(move |w| (s.section, w)))
    }

    pub fn bound_count(&self) -> usize {
        self.count(SectionStatus::Bound)
    }

    pub fn failed_count(&self) -> usize {
        self.count(SectionStatus::Failed)
    }

    pub fn cancelled_count(&self) -> usize {
        self.count(SectionStatus::Cancelled)
    }

    /// Every configured section bound.
    pub fn is_complete(&self) -> bool {
        self.sections.iter().all(|s| s.status == SectionStatus::Bound)
    }

    fn count(&self, status: SectionStatus) -> usize {
        self.sections.iter().filter(|s| s.status == status).count()
    }
}
