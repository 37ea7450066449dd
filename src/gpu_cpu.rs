use tracing::trace;

use crate::candidate::CandidateTable;
use crate::engine::{Reconstruction, SearchEngine, SearchJob, SearchOutcome};
use crate::flat::{dispatch_seed, work_item_key, FlatCandidateTable};
use crate::{EnpakkError, BLOCK_SIZE};

/// CPU emulation of the `brute_crc32` kernel.
///
/// Runs the grid's work items one after another against the flattened
/// table, producing exactly the result the OpenCL build would.
pub struct GpuSearchEngine {
    grid: usize,
    seed: u64,
    dispatches: u64,
    flat: Option<FlatCandidateTable>,
}

impl GpuSearchEngine {
    pub fn new(grid: usize, seed: u64) -> Self {
        Self {
            grid: grid.max(1),
            seed,
            dispatches: 0,
            flat: None,
        }
    }

    /// Flatten `table` into emulated device memory.
    pub fn load_table(&mut self, table: &CandidateTable) -> Result<(), EnpakkError> {
        self.flat = Some(FlatCandidateTable::from_table(table));
        Ok(())
    }

    /// Whether dispatches run on an OpenCL device.
    pub fn is_accelerated(&self) -> bool {
        false
    }
}

impl SearchEngine for GpuSearchEngine {
    fn name(&self) -> &'static str {
        "gpu-emulated"
    }

    fn dispatch(&mut self, job: &SearchJob<'_>) -> Result<SearchOutcome, EnpakkError> {
        if self.flat.as_ref().map(FlatCandidateTable::stride) != Some(job.table.cap()) {
            self.load_table(job.table)?;
        }
        let seed = dispatch_seed(self.seed, self.dispatches);
        self.dispatches += 1;
        let Some(flat) = self.flat.as_ref() else {
            return Err(EnpakkError::Backend("candidate table not loaded".into()));
        };

        let mut out = Vec::with_capacity(job.hashes.len() * BLOCK_SIZE);
        for gid in 0..self.grid as u32 {
            let key = work_item_key(seed, gid);
            if flat.run_work_item(job.hashes, job.expected_checksum, key, &mut out) {
                trace!(dispatch = self.dispatches, gid, "emulated work item matched");
                return Ok(SearchOutcome::Found(Reconstruction::from_bytes(&out)));
            }
        }
        Ok(SearchOutcome::NotFound)
    }

    fn reset(&mut self) {
        self.flat = None;
    }
}
