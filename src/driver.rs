//! Retry loop that drives a [`SearchEngine`] to a verified reconstruction.

use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::candidate::CandidateTable;
use crate::engine::{Reconstruction, SearchEngine, SearchJob, SearchOutcome};
use crate::stream::EncodedStream;
use crate::EnpakkError;

/// Limits on the retry loop. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    pub max_attempts: Option<u64>,
    pub max_duration: Option<Duration>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn attempts(max: u64) -> Self {
        Self {
            max_attempts: Some(max),
            max_duration: None,
        }
    }

    fn exceeded(&self, attempts: u64, elapsed: Duration) -> Option<String> {
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return Some(format!("no checksum match after {attempts} attempts"));
            }
        }
        if let Some(limit) = self.max_duration {
            if elapsed >= limit {
                return Some(format!(
                    "no checksum match within {:.1?} ({attempts} attempts)",
                    limit
                ));
            }
        }
        None
    }
}

/// Summary of the last [`SearchDriver::reconstruct`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub backend: String,
    pub blocks: usize,
    pub attempts: u64,
    pub elapsed_ms: u128,
    pub found: bool,
}

pub struct SearchDriver<E> {
    engine: E,
    budget: SearchBudget,
    progress: ProgressBar,
    report: Option<SearchReport>,
}

impl<E: SearchEngine> SearchDriver<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            budget: SearchBudget::unlimited(),
            progress: ProgressBar::hidden(),
            report: None,
        }
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Show a spinner that ticks once per dispatch.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn report(&self) -> Option<&SearchReport> {
        self.report.as_ref()
    }

    /// Reset the engine, dispatch it until it reports a match, then verify
    /// and return it. Fails with `SearchExhausted` once the budget is spent and
    /// with `Integrity` if the engine reports an unsound match.
    pub fn reconstruct(
        &mut self,
        stream: &EncodedStream,
        table: &CandidateTable,
    ) -> Result<Reconstruction, EnpakkError> {
        let job = SearchJob::new(stream, table);
        info!(
            expected = format_args!("{:#010x}", stream.expected_checksum),
            blocks = stream.block_count(),
            backend = self.engine.name(),
            "starting search"
        );
        check_coverage(&job)?;
        self.engine.reset();

        let start = Instant::now();
        let mut attempts = 0u64;
        let result = self.run(&job, start, &mut attempts);
        self.progress.finish_and_clear();

        self.report = Some(SearchReport {
            backend: self.engine.name().to_string(),
            blocks: stream.block_count(),
            attempts,
            elapsed_ms: start.elapsed().as_millis(),
            found: result.is_ok(),
        });
        if result.is_ok() {
            info!(attempts, "checksum matched");
        }
        result
    }

    fn run(
        &mut self,
        job: &SearchJob<'_>,
        start: Instant,
        attempts: &mut u64,
    ) -> Result<Reconstruction, EnpakkError> {
        loop {
            if let Some(reason) = self.budget.exceeded(*attempts, start.elapsed()) {
                return Err(EnpakkError::SearchExhausted(reason));
            }
            *attempts += 1;
            let outcome = self.engine.dispatch(job)?;
            self.progress.set_message(format!("attempt {attempts}"));
            self.progress.tick();
            match outcome {
                SearchOutcome::NotFound => debug!(attempt = *attempts, "no match yet"),
                SearchOutcome::Found(reconstruction) => {
                    if let Err(e) = reconstruction.verify(job) {
                        error!(backend = self.engine.name(), "unsound match: {e}");
                        return Err(e);
                    }
                    return Ok(reconstruction);
                }
            }
        }
    }
}

/// Reject streams that reference empty buckets and warn about positions
/// whose original block may have been cut by the bucket cap.
fn check_coverage(job: &SearchJob<'_>) -> Result<(), EnpakkError> {
    let mut capped = 0usize;
    for (position, &hash) in job.hashes.iter().enumerate() {
        if job.table.count(hash) == 0 {
            return Err(EnpakkError::EmptyBucket { position, hash });
        }
        if job.table.true_size(hash) > job.table.count(hash) {
            capped += 1;
        }
    }
    if capped > 0 {
        warn!(
            positions = capped,
            cap = job.table.cap(),
            "stream uses truncated buckets, the original may be unreachable"
        );
    }
    Ok(())
}
