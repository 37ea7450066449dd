use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::trace;

use crate::checksum::stream_checksum;
use crate::engine::{Reconstruction, SearchEngine, SearchJob, SearchOutcome};
use crate::{EnpakkError, BLOCK_SIZE};

/// Parallel uniform sampling over the candidate space.
///
/// Every dispatch draws `lanes` independent reconstructions, each lane
/// picking one candidate per position uniformly from its bucket. Lane RNGs
/// are keyed on `(seed, dispatch, lane)` so no two dispatches repeat the
/// same draws.
pub struct RandomSearchEngine {
    lanes: usize,
    seed: u64,
    dispatches: u64,
}

impl RandomSearchEngine {
    pub fn new(lanes: usize, seed: u64) -> Self {
        Self {
            lanes: lanes.max(1),
            seed,
            dispatches: 0,
        }
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }
}

impl SearchEngine for RandomSearchEngine {
    fn name(&self) -> &'static str {
        "random"
    }

    fn dispatch(&mut self, job: &SearchJob<'_>) -> Result<SearchOutcome, EnpakkError> {
        let dispatch = self.dispatches;
        self.dispatches += 1;
        let base = self.seed ^ dispatch.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let len = job.hashes.len() * BLOCK_SIZE;

        let hit = (0..self.lanes as u64)
            .into_par_iter()
            .map_init(
                || Vec::with_capacity(len),
                |buf: &mut Vec<u8>, lane| {
                    let mut rng = StdRng::seed_from_u64(base ^ lane.rotate_left(32));
                    buf.clear();
                    for &h in job.hashes {
                        let bucket = job.table.bucket(h);
                        if bucket.is_empty() {
                            return None;
                        }
                        buf.extend_from_slice(&bucket[rng.gen_range(0..bucket.len())]);
                    }
                    (stream_checksum(buf) == job.expected_checksum).then(|| buf.clone())
                },
            )
            .find_map_any(|found| found);

        trace!(dispatch, lanes = self.lanes, found = hit.is_some(), "random dispatch");
        Ok(match hit {
            Some(bytes) => SearchOutcome::Found(Reconstruction::from_bytes(&bytes)),
            None => SearchOutcome::NotFound,
        })
    }
}
