//! Candidate table: every possible block grouped by its block hash.

use serde::Serialize;
use tracing::{debug, info};

use crate::checksum::block_hash;
use crate::{BLOCK_SIZE, BUCKET_COUNT, MAX_CANDIDATES};

/// One reconstructible unit of original data.
pub type Block = [u8; BLOCK_SIZE];

/// Mapping from block hash to the bounded set of blocks producing it.
///
/// Buckets are filled in enumeration order (`b1` outer, `b2` inner, both
/// ascending) and stop accepting blocks once they hold `cap` entries, so
/// later blocks of an over-full bucket are unreachable. The uncapped
/// population is kept alongside for completeness analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTable {
    cap: usize,
    buckets: Vec<Vec<Block>>,
    true_sizes: Vec<usize>,
}

/// Occupancy summary of a single bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketStats {
    pub hash: u8,
    pub count: usize,
    pub true_size: usize,
    pub truncated: bool,
    /// Hex of the first retained block, empty if the bucket is empty.
    pub first_block: String,
}

impl CandidateTable {
    /// Build the table with the reference cap of [`MAX_CANDIDATES`].
    pub fn build() -> Self {
        Self::with_cap(MAX_CANDIDATES)
    }

    /// Build the table keeping at most `cap` blocks per bucket.
    pub fn with_cap(cap: usize) -> Self {
        info!(cap, "precomputing candidate table");
        let mut buckets: Vec<Vec<Block>> = (0..BUCKET_COUNT)
            .map(|_| Vec::with_capacity(cap.min(256)))
            .collect();
        let mut true_sizes = vec![0usize; BUCKET_COUNT];

        for b1 in 0..=u8::MAX {
            for b2 in 0..=u8::MAX {
                let block = [b1, b2];
                let h = block_hash(&block) as usize;
                true_sizes[h] += 1;
                if buckets[h].len() < cap {
                    buckets[h].push(block);
                }
            }
        }

        let table = Self {
            cap,
            buckets,
            true_sizes,
        };
        debug!(
            truncated = table.truncated_buckets().len(),
            "candidate table ready"
        );
        table
    }

    /// Per-bucket cap this table was built with.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Retained blocks for `hash`, in enumeration order.
    pub fn bucket(&self, hash: u8) -> &[Block] {
        &self.buckets[hash as usize]
    }

    /// Number of retained blocks for `hash`.
    pub fn count(&self, hash: u8) -> usize {
        self.buckets[hash as usize].len()
    }

    /// Number of blocks in the full domain that hash to `hash`.
    pub fn true_size(&self, hash: u8) -> usize {
        self.true_sizes[hash as usize]
    }

    /// Hashes whose bucket lost blocks to the cap.
    pub fn truncated_buckets(&self) -> Vec<u8> {
        (0..=u8::MAX)
            .filter(|&h| self.true_size(h) > self.count(h))
            .collect()
    }

    pub fn bucket_report(&self) -> Vec<BucketStats> {
        (0..=u8::MAX)
            .map(|h| BucketStats {
                hash: h,
                count: self.count(h),
                true_size: self.true_size(h),
                truncated: self.true_size(h) > self.count(h),
                first_block: self.bucket(h).first().map(hex::encode).unwrap_or_default(),
            })
            .collect()
    }
}

impl Default for CandidateTable {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_fill_in_enumeration_order() {
        let table = CandidateTable::with_cap(3);
        assert_eq!(table.bucket(0), &[[0, 0], [1, 7], [2, 14]]);
        assert_eq!(table.count(0), 3);
        assert_eq!(table.true_size(0), 256);
    }

    #[test]
    fn small_cap_truncates_every_bucket() {
        let table = CandidateTable::with_cap(3);
        assert_eq!(table.truncated_buckets().len(), BUCKET_COUNT);
        assert!(table.bucket_report().iter().all(|b| b.truncated));
    }

    #[test]
    fn reference_cap_keeps_every_block() {
        let table = CandidateTable::build();
        assert!(table.truncated_buckets().is_empty());
        let total: usize = (0..=u8::MAX).map(|h| table.count(h)).sum();
        assert_eq!(total, 65536);
    }

    #[test]
    fn report_shows_first_block_in_hex() {
        let table = CandidateTable::with_cap(2);
        let report = table.bucket_report();
        assert_eq!(report[0].first_block, "0000");
        assert_eq!(report[0].count, 2);
    }

    #[test]
    fn zero_cap_leaves_buckets_empty() {
        let table = CandidateTable::with_cap(0);
        assert_eq!(table.count(0x87), 0);
        assert!(table.bucket_report()[0].first_block.is_empty());
    }
}
