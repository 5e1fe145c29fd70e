//! Serializable generation configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file reproduces
//! the published demo data.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lsaprobe_core::detector::{DetectorConfig, DEFAULT_CURVE_STRIDE, DEFAULT_FPR_TARGETS};
use lsaprobe_core::rng::DEFAULT_SEED;
use lsaprobe_core::sampler::SamplerConfig;

use crate::ablation::{AblationConfig, AblationError};

/// Content-addressable hash of a configuration (BLAKE3 hex).
pub type ConfigHash = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid config: {0}")]
    Ablation(#[from] AblationError),
}

/// How generator state is shared between configuration points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// One stream threaded through every point in order, then the ablation.
    #[default]
    Sequential,
    /// Independent hash-derived stream per point; points run in parallel.
    Derived,
}

impl std::fmt::Display for SeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedMode::Sequential => f.write_str("sequential"),
            SeedMode::Derived => f.write_str("derived"),
        }
    }
}

/// Full configuration for one demo data generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub seed: u64,
    pub seed_mode: SeedMode,
    /// Trajectory positions (t / T) to evaluate, in output order.
    pub timesteps: Vec<f64>,
    /// Samples per population per timestep.
    pub n_samples: usize,
    pub curve_stride: usize,
    pub fpr_targets: Vec<f64>,
    /// Attack budgets (eta) for the ablation table.
    pub budgets: Vec<f64>,
    pub sampler: SamplerConfig,
    pub ablation: AblationConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            seed_mode: SeedMode::Sequential,
            timesteps: vec![0.2, 0.4, 0.6, 0.8],
            n_samples: 500,
            curve_stride: DEFAULT_CURVE_STRIDE,
            fpr_targets: DEFAULT_FPR_TARGETS.to_vec(),
            budgets: vec![0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8],
            sampler: SamplerConfig::default(),
            ablation: AblationConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations the generator cannot honour.
    ///
    /// Sampler parameters (std, mean, clamp) are checked by the sampler
    /// itself on every call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timesteps.is_empty() {
            return Err(ConfigError::Invalid("timesteps must not be empty".into()));
        }
        for (i, &t) in self.timesteps.iter().enumerate() {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "timestep {t} outside [0, 1]"
                )));
            }
            if self.timesteps[..i].iter().any(|&prev| timestep_key(prev) == timestep_key(t)) {
                return Err(ConfigError::Invalid(format!("duplicate timestep {t}")));
            }
        }
        if self.n_samples == 0 {
            return Err(ConfigError::Invalid("n_samples must be >= 1".into()));
        }
        if self.curve_stride == 0 {
            return Err(ConfigError::Invalid("curve_stride must be >= 1".into()));
        }
        for (i, &t) in self.fpr_targets.iter().enumerate() {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::Invalid(format!("fpr target {t} outside [0, 1]")));
            }
            // Operating points are keyed by percentage label.
            if self.fpr_targets[..i].iter().any(|&prev| fpr_label(prev) == fpr_label(t)) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate fpr target {t} (label {})",
                    fpr_label(t)
                )));
            }
        }
        if let Some(&b) = self.budgets.iter().find(|b| !b.is_finite() || **b < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "budget {b} must be finite and non-negative"
            )));
        }
        self.ablation.validate()?;
        Ok(())
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            curve_stride: self.curve_stride,
            fpr_targets: self.fpr_targets.clone(),
        }
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs produce identical data.
    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        let json = serde_json::to_string(self)
            .map_err(|e| ConfigError::Invalid(format!("config is not serializable: {e}")))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Total number of sampled costs across all timesteps.
    pub fn total_samples(&self) -> usize {
        self.n_samples * 2 * self.timesteps.len()
    }
}

/// JSON map key for a timestep: `0.2 -> "0.2"`, `1.0 -> "1.0"`.
pub fn timestep_key(t: f64) -> String {
    if t.fract() == 0.0 {
        format!("{t:.1}")
    } else {
        format!("{t}")
    }
}

/// Percentage label for an FPR target: `0.001 -> "0.1"`, `0.05 -> "5"`.
pub fn fpr_label(target: f64) -> String {
    let pct = (target * 100.0 * 1e6).round() / 1e6;
    format!("{pct}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ProbeConfig::from_toml("").unwrap();
        assert_eq!(config, ProbeConfig::default());
        assert_eq!(config.seed, 42);
        assert_eq!(config.timesteps, vec![0.2, 0.4, 0.6, 0.8]);
        assert_eq!(config.n_samples, 500);
        assert_eq!(config.total_samples(), 4000);
    }

    #[test]
    fn partial_toml_overrides() {
        let config = ProbeConfig::from_toml(
            r#"
seed = 7
seed_mode = "derived"
timesteps = [0.1, 0.9]

[sampler]
midpoint = 0.5

[sampler.member]
base_mean = 0.5
spread = 0.1
std = 0.1
clamp = [0.1, 0.9]
"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.seed_mode, SeedMode::Derived);
        assert_eq!(config.timesteps, vec![0.1, 0.9]);
        assert_eq!(config.sampler.midpoint, 0.5);
        assert_eq!(config.sampler.decay_rate, 0.5);
        assert_eq!(config.sampler.member.clamp, [0.1, 0.9]);
        assert_eq!(config.sampler.non_member, SamplerConfig::default().non_member);
    }

    #[test]
    fn toml_round_trip() {
        let config = ProbeConfig::default();
        let toml_str = config.to_toml().unwrap();
        let restored = ProbeConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            "timesteps = []",
            "timesteps = [0.2, 1.5]",
            "timesteps = [0.2, 0.2]",
            "n_samples = 0",
            "curve_stride = 0",
            "fpr_targets = [0.01, 2.0]",
            "fpr_targets = [0.01, 0.01]",
            "fpr_targets = [0.05, 0.0500000001]",
            "budgets = [-0.1]",
        ];
        for case in cases {
            let err = ProbeConfig::from_toml(case).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{case}: {err}");
        }
    }

    #[test]
    fn distinct_fpr_labels_accepted() {
        let config = ProbeConfig::from_toml("fpr_targets = [0.001, 0.0015, 0.01]").unwrap();
        let labels: Vec<String> = config.fpr_targets.iter().map(|&t| fpr_label(t)).collect();
        assert_eq!(labels, vec!["0.1", "0.15", "1"]);
    }

    #[test]
    fn bad_ablation_is_typed_error() {
        let err = ProbeConfig::from_toml("[ablation]\nnoise_std = -1.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Ablation(AblationError::InvalidNoise(_))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = ProbeConfig::from_toml("seed = \"forty-two\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn config_hash_deterministic() {
        let config = ProbeConfig::default();
        let h1 = config.config_hash().unwrap();
        let h2 = config.config_hash().unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn config_hash_changes_with_params() {
        let a = ProbeConfig::default();
        let mut b = a.clone();
        b.n_samples = 501;
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
    }

    #[test]
    fn timestep_keys_match_demo_format() {
        assert_eq!(timestep_key(0.2), "0.2");
        assert_eq!(timestep_key(0.6), "0.6");
        assert_eq!(timestep_key(1.0), "1.0");
        assert_eq!(timestep_key(0.0), "0.0");
    }

    #[test]
    fn fpr_labels_match_demo_format() {
        assert_eq!(fpr_label(0.001), "0.1");
        assert_eq!(fpr_label(0.01), "1");
        assert_eq!(fpr_label(0.05), "5");
    }

    #[test]
    fn detector_config_mirrors_fields() {
        let mut config = ProbeConfig::default();
        config.curve_stride = 3;
        let det = config.detector_config();
        assert_eq!(det.curve_stride, 3);
        assert_eq!(det.fpr_targets, config.fpr_targets);
    }
}
