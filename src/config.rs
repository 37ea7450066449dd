use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::SearchBudget;
use crate::engine::Backend;
use crate::{EnpakkError, MAX_CANDIDATES};

/// Runtime configuration for the decompressor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum blocks retained per candidate bucket.
    pub max_candidates: usize,
    /// Search backend.
    pub backend: Backend,
    /// Work items (random draws) per dispatch for the random and gpu backends.
    pub lanes: usize,
    /// Combinations tested per dispatch by the exhaustive backend.
    pub exhaustive_chunk: u64,
    /// RNG seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Give up after this many dispatches.
    pub max_attempts: Option<u64>,
    /// Give up after this many seconds.
    pub max_duration_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_candidates: MAX_CANDIDATES,
            backend: Backend::Random,
            lanes: 8192,
            exhaustive_chunk: 1 << 20,
            seed: None,
            max_attempts: None,
            max_duration_secs: None,
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, EnpakkError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&text).map_err(|e| EnpakkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EnpakkError> {
        if self.max_candidates == 0 {
            return Err(EnpakkError::Config("max_candidates must be at least 1".into()));
        }
        if self.lanes == 0 {
            return Err(EnpakkError::Config("lanes must be at least 1".into()));
        }
        if self.exhaustive_chunk == 0 {
            return Err(EnpakkError::Config("exhaustive_chunk must be at least 1".into()));
        }
        Ok(())
    }

    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            max_attempts: self.max_attempts,
            max_duration: self.max_duration_secs.map(Duration::from_secs),
        }
    }
}
