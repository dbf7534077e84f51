//! Record assembly: one worker per section on a private rayon pool.
//!
//! Workers report over an `mpsc` channel. The calling thread owns the merge
//! target and the per-section reports; workers only ever hand back owned
//! section outputs. On cancellation or deadline the loop stops listening,
//! marks every unfinished section `Cancelled` and returns. Abandoned workers
//! run their current fetch to its own timeout and their sends are dropped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;

use stockscrape_core::{
    bind_section, fetch_section, DocumentFetcher, FetchError, SectionConfig, SectionOutput,
    SiteConfig, StockRecord,
};

use crate::progress::SectionProgress;
use crate::report::{AssemblyReport, SectionFailure, SectionReport, SectionStatus};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("could not build section worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Caller controls for one run.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Overall wall-clock budget, measured from the start of the run.
    pub deadline: Option<Duration>,
    /// Set to `true` from any thread to stop the run.
    pub cancel: Arc<AtomicBool>,
    /// How often the event loop re-checks cancellation while idle.
    pub poll_interval: Duration,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            deadline: None,
            cancel: Arc::new(AtomicBool::new(false)),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl AssembleOptions {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// What a section worker reports back.
enum SectionEvent {
    Fetched { index: usize },
    Bound { index: usize, output: SectionOutput },
    Failed { index: usize, error: FetchError },
    Lost { index: usize, reason: String },
}

impl SectionEvent {
    fn index(&self) -> usize {
        match self {
            SectionEvent::Fetched { index }
            | SectionEvent::Bound { index, .. }
            | SectionEvent::Failed { index, .. }
            | SectionEvent::Lost { index, .. } => *index,
        }
    }
}

/// Stop signal seen by workers: the caller's flag or the run's own.
#[derive(Clone)]
struct Halt {
    caller: Arc<AtomicBool>,
    run: Arc<AtomicBool>,
}

impl Halt {
    fn is_set(&self) -> bool {
        self.caller.load(Ordering::Relaxed) || self.run.load(Ordering::Relaxed)
    }
}

/// Fetch and bind every configured section of `site` for `symbol`, then merge
/// the bound sections into one record.
///
/// A section that fails, is cancelled or loses its worker leaves its slot of
/// the record at the zero value and shows up in [`AssemblyReport::errors`].
/// Only pool construction can fail the run as a whole.
pub fn assemble(
    fetcher: Arc<dyn DocumentFetcher>,
    site: &SiteConfig,
    symbol: &str,
    options: &AssembleOptions,
    progress: &dyn SectionProgress,
) -> Result<AssemblyReport, AssembleError> {
    let started = Instant::now();
    let started_at = Utc::now();
    let total = site.sections.len();

    let mut sections: Vec<SectionReport> = site
        .sections
        .iter()
        .map(|s| SectionReport::pending(s.kind, s.fingerprints()))
        .collect();
    let mut record = StockRecord::new(symbol);

    tracing::info!(
        symbol,
        site = %site.label(),
        fetcher = fetcher.name(),
        sections = total,
        "assembling record"
    );

    if total > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(total)
            .thread_name(|i| format!("stockscrape-section-{i}"))
            .build()?;

        let halt = Halt {
            caller: Arc::clone(&options.cancel),
            run: Arc::new(AtomicBool::new(false)),
        };
        let (tx, rx) = mpsc::channel();

        for (index, section) in site.sections.iter().enumerate() {
            progress.on_start(section.kind, index, total);
            let job = SectionJob {
                index,
                section: section.clone(),
                symbol: symbol.to_string(),
                fetcher: Arc::clone(&fetcher),
                halt: halt.clone(),
                tx: tx.clone(),
            };
            pool.spawn(move || job.run());
        }
        // Only the workers hold senders now, so the channel disconnects once
        // every job has finished.
        drop(tx);

        let deadline_at = options.deadline.map(|d| started + d);
        let mut open = total;

        while open > 0 {
            if options.is_cancelled() {
                tracing::warn!(symbol, open, "run cancelled");
                break;
            }
            let wait = match deadline_at {
                Some(at) => {
                    let now = Instant::now();
                    if now >= at {
                        tracing::warn!(symbol, open, "run deadline reached");
                        break;
                    }
                    options.poll_interval.min(at - now)
                }
                None => options.poll_interval,
            };

            match rx.recv_timeout(wait) {
                Ok(event) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    if apply(event, &mut sections, &mut record, elapsed_ms, progress) {
                        open -= 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    let failure = if halt.is_set() {
                        SectionFailure::Cancelled
                    } else {
                        SectionFailure::WorkerLost {
                            reason: "worker exited without reporting".to_string(),
                        }
                    };
                    finish_open(&mut sections, failure, started, progress);
                    open = 0;
                }
            }
        }

        if open > 0 {
            halt.run.store(true, Ordering::Relaxed);
            finish_open(&mut sections, SectionFailure::Cancelled, started, progress);
        }
        // Dropping the pool does not wait for abandoned workers.
    }

    let report = AssemblyReport {
        symbol: symbol.to_string(),
        site: site.label(),
        started_at,
        elapsed_ms: started.elapsed().as_millis() as u64,
        record,
        sections,
    };
    progress.on_run_complete(&report);
    Ok(report)
}

/// Fold one worker event into the run state. Returns `true` when the event
/// moved its section to a terminal status.
fn apply(
    event: SectionEvent,
    sections: &mut [SectionReport],
    record: &mut StockRecord,
    elapsed_ms: u64,
    progress: &dyn SectionProgress,
) -> bool {
    let Some(report) = sections.get_mut(event.index()) else {
        return false;
    };
    if report.status.is_terminal() {
        return false;
    }

    match event {
        SectionEvent::Fetched { .. } => {
            report.status = SectionStatus::Fetched;
            progress.on_fetched(report.section);
            return false;
        }
        SectionEvent::Bound { output, .. } => {
            report.status = SectionStatus::Bound;
            report.warnings = output.warnings;
            report.fingerprints = output.fingerprints;
            record.merge(output.record);
        }
        SectionEvent::Failed { error, .. } => {
            report.status = SectionStatus::Failed;
            report.failure = Some(SectionFailure::Fetch { error });
        }
        SectionEvent::Lost { reason, .. } => {
            report.status = SectionStatus::Failed;
            report.failure = Some(SectionFailure::WorkerLost { reason });
        }
    }
    report.elapsed_ms = elapsed_ms;
    progress.on_complete(report);
    true
}

fn finish_open(
    sections: &mut [SectionReport],
    failure: SectionFailure,
    started: Instant,
    progress: &dyn SectionProgress,
) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    for report in sections.iter_mut().filter(|r| !r.status.is_terminal()) {
        report.status = if matches!(failure, SectionFailure::Cancelled) {
            SectionStatus::Cancelled
        } else {
            SectionStatus::Failed
        };
        report.failure = Some(failure.clone());
        report.elapsed_ms = elapsed_ms;
        progress.on_complete(report);
    }
}

/// Everything one section worker owns.
struct SectionJob {
    index: usize,
    section: SectionConfig,
    symbol: String,
    fetcher: Arc<dyn DocumentFetcher>,
    halt: Halt,
    tx: Sender<SectionEvent>,
}

impl SectionJob {
    fn run(self) {
        let index = self.index;
        let tx = self.tx.clone();
        // A panic on a pool thread would otherwise abort the process.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.work()));
        if let Err(payload) = outcome {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker panicked".to_string());
            tracing::error!(index, %reason, "section worker panicked");
            // The receiver may already be gone after a cancel.
            let _ = tx.send(SectionEvent::Lost { index, reason });
        }
    }

    fn work(&self) {
        if self.halt.is_set() {
            return;
        }
        let kind = self.section.kind;
        tracing::debug!(section = %kind, symbol = %self.symbol, "fetching section");

        let extractions = match fetch_section(self.fetcher.as_ref(), &self.section, &self.symbol) {
            Ok(extractions) => extractions,
            Err(error) => {
                tracing::warn!(section = %kind, "section fetch failed: {error}");
                let _ = self.tx.send(SectionEvent::Failed {
                    index: self.index,
                    error,
                });
                return;
            }
        };
        let _ = self.tx.send(SectionEvent::Fetched { index: self.index });

        if self.halt.is_set() {
            return;
        }
        let output = bind_section(&self.section, &extractions);
        let _ = self.tx.send(SectionEvent::Bound {
            index: self.index,
            output,
        });
    }
}
