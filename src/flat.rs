//! Fixed-stride form of the candidate table for crossing a device boundary.
//!
//! Layout: 256 buckets of `stride` blocks each, zero padded past the bucket
//! occupancy, plus a 256-entry `u32` count array. The work-item helpers
//! below mirror `kernels/brute_crc32.cl` exactly so the CPU emulation and
//! the OpenCL kernel pick the same candidates for the same seed. Every pick
//! is a splitmix64 hash of `(dispatch seed, gid, position)`.

use crate::candidate::{Block, CandidateTable};
use crate::checksum::stream_checksum;
use crate::{BLOCK_SIZE, BUCKET_COUNT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatCandidateTable {
    stride: usize,
    blocks: Vec<Block>,
    counts: Vec<u32>,
}

impl FlatCandidateTable {
    pub fn from_table(table: &CandidateTable) -> Self {
        let stride = table.cap();
        let mut blocks = vec![[0u8; BLOCK_SIZE]; BUCKET_COUNT * stride];
        let mut counts = vec![0u32; BUCKET_COUNT];
        for h in 0..=u8::MAX {
            let bucket = table.bucket(h);
            let base = h as usize * stride;
            blocks[base..base + bucket.len()].copy_from_slice(bucket);
            counts[h as usize] = bucket.len() as u32;
        }
        Self {
            stride,
            blocks,
            counts,
        }
    }

    /// Blocks reserved per bucket.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Flattened block storage as raw bytes.
    pub fn blocks(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Run one emulated work item: draw one candidate per position from
    /// the work item's `key`, writing the candidate stream to `out`.
    /// Returns whether its checksum equals `expected`.
    pub fn run_work_item(&self, hashes: &[u8], expected: u32, key: u64, out: &mut Vec<u8>) -> bool {
        out.clear();
        for (pos, &h) in hashes.iter().enumerate() {
            let count = self.counts[h as usize];
            if count == 0 {
                return false;
            }
            let pick = pick(key, pos as u32, count);
            out.extend_from_slice(&self.blocks[h as usize * self.stride + pick]);
        }
        stream_checksum(out) == expected
    }
}

const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;
const GID_MUL: u64 = 0xD1B5_4A32_D192_ED03;

/// splitmix64 output function. A bijection on `u64`.
pub fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Per-dispatch seed handed to every work item of that dispatch. Distinct
/// dispatches of one seed never share a value.
pub fn dispatch_seed(seed: u64, dispatch: u64) -> u64 {
    splitmix64(seed ^ dispatch.wrapping_mul(GOLDEN))
}

/// Key of work item `gid`. Distinct per `gid` within a dispatch.
pub fn work_item_key(dispatch_seed: u64, gid: u32) -> u64 {
    splitmix64(dispatch_seed ^ u64::from(gid).wrapping_mul(GID_MUL))
}

/// Candidate index for position `pos` of the work item keyed `key`.
pub fn pick(key: u64, pos: u32, count: u32) -> usize {
    (splitmix64(key ^ u64::from(pos).wrapping_mul(GOLDEN)) % u64::from(count)) as usize
}
