//! Pipeline and experiment configuration.
//!
//! A `PipelineConfig` is deserialized from TOML. Every section is optional;
//! missing sections fall back to defaults. Experiments name the extractors
//! and semantic validators of one run:
//!
//! ```toml
//! [validation]
//! allow_extra_keys = true
//!
//! [reconcile]
//! fuzzy_cutoff = 0.92
//! numeric_tolerance = 0.01
//!
//! [[experiments]]
//! name = "gpt_vs_pixtral"
//! primary_extractor = "gpt"
//!
//! [[experiments.extractors]]
//! id = "gpt"
//! provider = "openai"
//! model = "gpt-4o"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use docverdict_contracts::error::{VerdictError, VerdictResult};
use docverdict_verify::ReconcileConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub validation: ValidationSettings,
    pub reconcile: ReconcileConfig,
    pub experiments: Vec<ExperimentConfig>,
}

/// Schema validator switches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// When false, keys outside the schema are reported as warnings.
    pub allow_extra_keys: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            allow_extra_keys: true,
        }
    }
}

/// One named experiment: which extractors and validators to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    /// Extractor whose output is validated. Defaults to the first extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_extractor: Option<String>,
    pub extractors: Vec<ExtractorConfig>,
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
    #[serde(default)]
    pub validator_defaults: ValidatorDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub id: String,
    pub provider: String,
    pub model: String,
    /// Map the extractor's keys onto the schema (aliases, fuzzy matching,
    /// numeric coercion) before validation.
    #[serde(default)]
    pub force_schema_shape: bool,
}

/// A semantic validator stage. Unset knobs come from `validator_defaults`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub id: String,
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_parse_error: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorDefaults {
    pub temperature: f64,
    pub max_tokens: u32,
    pub retry_on_parse_error: u32,
}

impl Default for ValidatorDefaults {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 1200,
            retry_on_parse_error: 0,
        }
    }
}

/// A validator with every knob filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValidator {
    pub id: String,
    pub provider: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub retry_on_parse_error: u32,
}

impl PipelineConfig {
    /// Parse and check a TOML document.
    ///
    /// Returns `VerdictError::ConfigError` if the TOML is malformed or an
    /// experiment is inconsistent (see [`ExperimentConfig::check`]).
    pub fn from_toml_str(s: &str) -> VerdictResult<Self> {
        let config: PipelineConfig = toml::from_str(s).map_err(|e| VerdictError::ConfigError {
            reason: format!("failed to parse pipeline TOML: {}", e),
        })?;

        let mut names = HashSet::new();
        for experiment in &config.experiments {
            if !names.insert(experiment.name.as_str()) {
                return Err(VerdictError::ConfigError {
                    reason: format!("experiment '{}' defined twice", experiment.name),
                });
            }
            experiment.check()?;
        }
        Ok(config)
    }

    /// Read the file at `path` and parse it with [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: &Path) -> VerdictResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VerdictError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The experiment called `name`.
    pub fn experiment(&self, name: &str) -> VerdictResult<&ExperimentConfig> {
        self.experiments
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| VerdictError::ConfigError {
                reason: format!(
                    "experiment '{}' not found (available: {})",
                    name,
                    self.experiment_names().join(", ")
                ),
            })
    }

    pub fn experiment_names(&self) -> Vec<&str> {
        self.experiments.iter().map(|e| e.name.as_str()).collect()
    }
}

impl ExperimentConfig {
    /// Reject experiments without extractors, with duplicate extractor or
    /// validator ids, or whose primary is not one of the extractors.
    pub fn check(&self) -> VerdictResult<()> {
        let fail = |reason: String| {
            Err(VerdictError::ConfigError {
                reason: format!("experiment '{}': {}", self.name, reason),
            })
        };

        if self.extractors.is_empty() {
            return fail("no extractors configured".to_string());
        }
        let mut ids = HashSet::new();
        for extractor in &self.extractors {
            if !ids.insert(extractor.id.as_str()) {
                return fail(format!("extractor id '{}' used twice", extractor.id));
            }
        }
        if let Some(primary) = &self.primary_extractor {
            if !ids.contains(primary.as_str()) {
                return fail(format!(
                    "primary_extractor '{}' is not among the extractors ({})",
                    primary,
                    self.extractor_ids().join(", ")
                ));
            }
        }
        let mut validator_ids = HashSet::new();
        for validator in &self.validators {
            if !validator_ids.insert(validator.id.as_str()) {
                return fail(format!("validator id '{}' used twice", validator.id));
            }
        }
        Ok(())
    }

    /// Id of the primary extractor.
    pub fn primary(&self) -> &str {
        self.primary_extractor
            .as_deref()
            .or_else(|| self.extractors.first().map(|e| e.id.as_str()))
            .unwrap_or_default()
    }

    pub fn extractor_ids(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.id.as_str()).collect()
    }

    /// Validators in stage order with defaults applied.
    pub fn resolved_validators(&self) -> Vec<ResolvedValidator> {
        let defaults = &self.validator_defaults;
        self.validators
            .iter()
            .map(|v| ResolvedValidator {
                id: v.id.clone(),
                provider: v.provider.clone(),
                model: v.model.clone(),
                temperature: v.temperature.unwrap_or(defaults.temperature),
                max_tokens: v.max_tokens.unwrap_or(defaults.max_tokens),
                retry_on_parse_error: v.retry_on_parse_error.unwrap_or(defaults.retry_on_parse_error),
            })
            .collect()
    }
}
