//! Reconstruction of data from block fingerprints.
//!
//! An `.enpakk` stream keeps only a CRC-8 per 2-byte block plus a CRC-32 of
//! the whole original. Many blocks share each CRC-8, so decompression is a
//! search: pick one hash-consistent block per position until the CRC-32 of
//! the concatenation matches.
//!
//! ```no_run
//! use enpakk::{compress, decompress, Config};
//!
//! let packed = compress(b"ABCD");
//! let config = Config { seed: Some(1), ..Config::default() };
//! let restored = decompress(&packed, &config)?;
//! assert_eq!(restored, b"ABCD");
//! # Ok::<(), enpakk::EnpakkError>(())
//! ```

pub mod candidate;
pub mod checksum;
pub mod config;
pub mod cpu;
pub mod driver;
pub mod engine;
mod error;
pub mod exhaustive;
pub mod flat;
pub mod gpu;
pub mod io_utils;
pub mod stream;

pub use candidate::{Block, BucketStats, CandidateTable};
pub use checksum::{block_hash, stream_checksum};
pub use config::Config;
pub use cpu::RandomSearchEngine;
pub use driver::{SearchBudget, SearchDriver, SearchReport};
pub use engine::{
    build_engine, Backend, JobKey, Reconstruction, SearchEngine, SearchJob, SearchOutcome,
};
pub use error::EnpakkError;
pub use exhaustive::ExhaustiveSearchEngine;
pub use flat::FlatCandidateTable;
pub use gpu::GpuSearchEngine;
pub use stream::EncodedStream;

/// Bytes per block.
pub const BLOCK_SIZE: usize = 2;
/// Bytes per block hash.
pub const HASH_SIZE: usize = 1;
/// Bytes of the leading stream checksum.
pub const CHECKSUM_SIZE: usize = 4;
/// Reference cap on blocks retained per bucket.
pub const MAX_CANDIDATES: usize = 300;
/// Number of distinct block hashes.
pub const BUCKET_COUNT: usize = 256;

/// Encode `data` into an `.enpakk` stream.
pub fn compress(data: &[u8]) -> Vec<u8> {
    EncodedStream::encode(data).to_bytes()
}

/// Decode an `.enpakk` stream using the backend and budget in `config`.
pub fn decompress(data: &[u8], config: &Config) -> Result<Vec<u8>, EnpakkError> {
    config.validate()?;
    let stream = EncodedStream::decode(data)?;
    let table = CandidateTable::with_cap(config.max_candidates);
    let mut driver = SearchDriver::new(build_engine(config)).with_budget(config.budget());
    Ok(driver.reconstruct(&stream, &table)?.into_bytes())
}
