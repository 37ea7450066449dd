use rayon::prelude::*;
use tracing::{debug, trace};

use crate::checksum::stream_checksum;
use crate::engine::{JobKey, Reconstruction, SearchEngine, SearchJob, SearchOutcome};
use crate::{EnpakkError, BLOCK_SIZE};

/// Deterministic walk over the full Cartesian product of candidates.
///
/// Combinations are numbered in lexicographic order with position 0 most
/// significant. Each dispatch tests the next `chunk` combinations and keeps
/// the cursor, so repeated dispatches of one job cover the space exactly
/// once. A different job starts over from combination 0. The first match in
/// enumeration order wins.
pub struct ExhaustiveSearchEngine {
    chunk: u64,
    cursor: u128,
    space: Option<u128>,
    job: Option<JobKey>,
    dispatches: u64,
}

impl ExhaustiveSearchEngine {
    pub fn new(chunk: u64) -> Self {
        Self {
            chunk: chunk.max(1),
            cursor: 0,
            space: None,
            job: None,
            dispatches: 0,
        }
    }

    /// Combinations tested so far.
    pub fn cursor(&self) -> u128 {
        self.cursor
    }

    fn space_size(job: &SearchJob<'_>) -> Result<u128, EnpakkError> {
        job.hashes.iter().try_fold(1u128, |acc, &h| {
            acc.checked_mul(job.table.count(h) as u128).ok_or_else(|| {
                EnpakkError::Backend(format!(
                    "{} blocks overflow the exhaustive search space",
                    job.hashes.len()
                ))
            })
        })
    }
}

/// Write combination `index` into `out` as concatenated blocks.
fn write_combination(job: &SearchJob<'_>, mut index: u128, out: &mut Vec<u8>) {
    out.resize(job.hashes.len() * BLOCK_SIZE, 0);
    for (pos, &h) in job.hashes.iter().enumerate().rev() {
        let bucket = job.table.bucket(h);
        let radix = bucket.len() as u128;
        let block = bucket[(index % radix) as usize];
        index /= radix;
        out[pos * BLOCK_SIZE..(pos + 1) * BLOCK_SIZE].copy_from_slice(&block);
    }
}

impl SearchEngine for ExhaustiveSearchEngine {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn dispatch(&mut self, job: &SearchJob<'_>) -> Result<SearchOutcome, EnpakkError> {
        if !self.job.as_ref().is_some_and(|key| key.matches(job)) {
            self.reset();
            self.job = Some(JobKey::of(job));
        }
        let space = match self.space {
            Some(s) => s,
            None => {
                let s = Self::space_size(job)?;
                debug!(combinations = %s, "exhaustive search space");
                self.space = Some(s);
                s
            }
        };
        if self.cursor >= space {
            return Err(EnpakkError::SearchExhausted(format!(
                "all {space} combinations tested without a checksum match"
            )));
        }

        let start = self.cursor;
        let len = (space - start).min(self.chunk as u128) as u64;
        let hit = (0..len)
            .into_par_iter()
            .map_init(Vec::new, |buf: &mut Vec<u8>, offset| {
                write_combination(job, start + offset as u128, buf);
                (stream_checksum(buf) == job.expected_checksum).then(|| buf.clone())
            })
            .find_map_first(|found| found);

        self.cursor = start + len as u128;
        self.dispatches += 1;
        trace!(dispatch = self.dispatches, cursor = %self.cursor, "exhaustive dispatch");
        Ok(match hit {
            Some(bytes) => SearchOutcome::Found(Reconstruction::from_bytes(&bytes)),
            None => SearchOutcome::NotFound,
        })
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.space = None;
        self.job = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateTable;
    use crate::stream::EncodedStream;

    #[test]
    fn enumeration_is_lexicographic() {
        let table = CandidateTable::with_cap(3);
        let stream = EncodedStream {
            expected_checksum: 0,
            hashes: vec![0, 0],
        };
        let job = SearchJob::new(&stream, &table);
        let mut out = Vec::new();
        write_combination(&job, 0, &mut out);
        assert_eq!(out, vec![0, 0, 0, 0]);
        write_combination(&job, 1, &mut out);
        assert_eq!(out, vec![0, 0, 1, 7]);
        write_combination(&job, 3, &mut out);
        assert_eq!(out, vec![1, 7, 0, 0]);
    }

    #[test]
    fn cursor_advances_by_chunk() {
        let table = CandidateTable::with_cap(3);
        let stream = EncodedStream {
            expected_checksum: 0xDEAD_BEEF,
            hashes: vec![0, 0],
        };
        let job = SearchJob::new(&stream, &table);
        let mut engine = ExhaustiveSearchEngine::new(4);
        assert_eq!(engine.dispatch(&job).unwrap(), SearchOutcome::NotFound);
        assert_eq!(engine.cursor(), 4);
        assert_eq!(engine.dispatch(&job).unwrap(), SearchOutcome::NotFound);
        assert_eq!(engine.dispatch(&job).unwrap(), SearchOutcome::NotFound);
        assert_eq!(engine.cursor(), 9);
        assert!(matches!(
            engine.dispatch(&job),
            Err(EnpakkError::SearchExhausted(_))
        ));
    }

    #[test]
    fn oversized_space_is_a_backend_error() {
        let table = CandidateTable::build();
        let stream = EncodedStream {
            expected_checksum: 0,
            hashes: vec![0; 17],
        };
        let job = SearchJob::new(&stream, &table);
        let mut engine = ExhaustiveSearchEngine::new(16);
        assert!(matches!(engine.dispatch(&job), Err(EnpakkError::Backend(_))));
    }

    #[test]
    fn new_job_restarts_enumeration() {
        let table = CandidateTable::with_cap(3);
        let spent = EncodedStream {
            expected_checksum: 0xDEAD_BEEF,
            hashes: vec![0],
        };
        let mut engine = ExhaustiveSearchEngine::new(8);
        engine.dispatch(&SearchJob::new(&spent, &table)).unwrap();
        assert_eq!(engine.cursor(), 3);

        let stream = EncodedStream::encode(&[0, 0]);
        let outcome = engine.dispatch(&SearchJob::new(&stream, &table)).unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Found(Reconstruction::new(vec![[0, 0]]))
        );
        assert_eq!(engine.cursor(), 3);
    }
}
