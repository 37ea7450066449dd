//! Search backend contract.
//!
//! A backend receives the hash sequence, the candidate table and the
//! expected checksum, and performs one bounded unit of search per
//! [`SearchEngine::dispatch`]. It reports [`SearchOutcome::Found`] only with
//! a reconstruction whose blocks match every hash and whose concatenation
//! matches the checksum. Repeated dispatches with the same job must keep
//! making progress, so backends vary their partitioning between calls.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::candidate::{Block, CandidateTable};
use crate::checksum::{block_hash, stream_checksum};
use crate::config::Config;
use crate::cpu::RandomSearchEngine;
use crate::exhaustive::ExhaustiveSearchEngine;
use crate::gpu::GpuSearchEngine;
use crate::stream::EncodedStream;
use crate::{EnpakkError, BLOCK_SIZE};

/// Read-only inputs shared by every dispatch of one run.
#[derive(Debug, Clone, Copy)]
pub struct SearchJob<'a> {
    pub hashes: &'a [u8],
    pub table: &'a CandidateTable,
    pub expected_checksum: u32,
}

impl<'a> SearchJob<'a> {
    pub fn new(stream: &'a EncodedStream, table: &'a CandidateTable) -> Self {
        Self {
            hashes: &stream.hashes,
            table,
            expected_checksum: stream.expected_checksum,
        }
    }
}

/// Identity of a job, kept by backends that carry state between dispatches.
///
/// Tables are built deterministically from their cap, so the cap stands in
/// for the table contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobKey {
    hashes: Vec<u8>,
    cap: usize,
    expected_checksum: u32,
}

impl JobKey {
    pub fn of(job: &SearchJob<'_>) -> Self {
        Self {
            hashes: job.hashes.to_vec(),
            cap: job.table.cap(),
            expected_checksum: job.expected_checksum,
        }
    }

    pub fn matches(&self, job: &SearchJob<'_>) -> bool {
        self.expected_checksum == job.expected_checksum
            && self.cap == job.table.cap()
            && self.hashes == job.hashes
    }
}

/// A candidate assignment of one block per hash position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    blocks: Vec<Block>,
}

impl Reconstruction {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Split a concatenated candidate stream back into blocks. A trailing
    /// partial block is dropped and will fail [`Reconstruction::verify`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            blocks: bytes
                .chunks_exact(BLOCK_SIZE)
                .filter_map(|c| Block::try_from(c).ok())
                .collect(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.blocks.iter().flatten().copied().collect()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.to_bytes()
    }

    /// Check length, every per-position block hash and the stream checksum.
    pub fn verify(&self, job: &SearchJob<'_>) -> Result<(), EnpakkError> {
        if self.blocks.len() != job.hashes.len() {
            return Err(EnpakkError::Integrity(format!(
                "reconstruction has {} blocks, stream has {}",
                self.blocks.len(),
                job.hashes.len()
            )));
        }
        if let Some(pos) = self
            .blocks
            .iter()
            .zip(job.hashes)
            .position(|(b, &h)| block_hash(b) != h)
        {
            return Err(EnpakkError::Integrity(format!(
                "block {pos} does not hash to {:#04x}",
                job.hashes[pos]
            )));
        }
        let actual = stream_checksum(&self.to_bytes());
        if actual != job.expected_checksum {
            return Err(EnpakkError::Integrity(format!(
                "checksum {actual:#010x} does not match expected {:#010x}",
                job.expected_checksum
            )));
        }
        Ok(())
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Reconstruction),
    NotFound,
}

pub trait SearchEngine {
    /// Short backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Perform one bounded unit of search.
    fn dispatch(&mut self, job: &SearchJob<'_>) -> Result<SearchOutcome, EnpakkError>;

    /// Drop any state carried over from earlier jobs.
    fn reset(&mut self) {}
}

impl<E: SearchEngine + ?Sized> SearchEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn dispatch(&mut self, job: &SearchJob<'_>) -> Result<SearchOutcome, EnpakkError> {
        (**self).dispatch(job)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Selectable search backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Parallel uniform sampling on the CPU.
    #[default]
    Random,
    /// Deterministic enumeration of the full combination space.
    Exhaustive,
    /// OpenCL kernel, or its CPU emulation without the `gpu` feature.
    Gpu,
}

/// Construct the backend selected by `config`.
pub fn build_engine(config: &Config) -> Box<dyn SearchEngine> {
    let seed = config.seed.unwrap_or_else(rand::random);
    match config.backend {
        Backend::Random => Box::new(RandomSearchEngine::new(config.lanes, seed)),
        Backend::Exhaustive => Box::new(ExhaustiveSearchEngine::new(config.exhaustive_chunk)),
        Backend::Gpu => Box::new(GpuSearchEngine::new(config.lanes, seed)),
    }
}
