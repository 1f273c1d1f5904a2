//! The run manifest (`run_manifest.json`).
//!
//! Written once when a run starts and rewritten with `finished_at` when it
//! ends. The config hash ties every result in the directory to the exact
//! configuration file that produced it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use docverdict_contracts::{
    error::{VerdictError, VerdictResult},
    result::RunId,
};
use docverdict_policy::{ExperimentConfig, ExtractorConfig, ValidatorConfig};

use crate::store::{to_json_bytes, write_atomic};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub experiment: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config_path: PathBuf,
    /// `sha256:<hex>` of the configuration file bytes.
    pub config_hash: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub num_documents: usize,
    pub primary_extractor: String,
    pub extractors: Vec<ExtractorConfig>,
    pub validators: Vec<ValidatorConfig>,
}

/// `sha256:` followed by the lowercase hex digest of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

/// [`hash_bytes`] over the contents of the file at `path`.
pub fn config_hash(path: &Path) -> VerdictResult<String> {
    let bytes = std::fs::read(path).map_err(|e| VerdictError::ConfigError {
        reason: format!("failed to read config file '{}': {}", path.display(), e),
    })?;
    Ok(hash_bytes(&bytes))
}

impl RunManifest {
    pub const FILE_NAME: &'static str = "run_manifest.json";

    /// A manifest for a run of `experiment` that starts now.
    pub fn start(
        run_id: RunId,
        experiment: &ExperimentConfig,
        config_path: &Path,
        input_dir: &Path,
        output_dir: &Path,
        num_documents: usize,
    ) -> VerdictResult<Self> {
        Ok(Self {
            run_id,
            experiment: experiment.name.clone(),
            started_at: Utc::now(),
            finished_at: None,
            config_path: config_path.to_path_buf(),
            config_hash: config_hash(config_path)?,
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            num_documents,
            primary_extractor: experiment.primary().to_string(),
            extractors: experiment.extractors.clone(),
            validators: experiment.validators.clone(),
        })
    }

    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.finished_at = Some(at);
    }

    /// Atomically write the manifest into `dir`, returning its path.
    pub fn write(&self, dir: &Path) -> VerdictResult<PathBuf> {
        let path = dir.join(Self::FILE_NAME);
        write_atomic(&path, &to_json_bytes(self)?)?;
        Ok(path)
    }

    pub fn read(path: &Path) -> VerdictResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VerdictError::ConfigError {
            reason: format!("failed to read manifest '{}': {}", path.display(), e),
        })?;
        serde_json::from_str(&contents).map_err(|e| VerdictError::ConfigError {
            reason: format!("malformed manifest '{}': {}", path.display(), e),
        })
    }
}
