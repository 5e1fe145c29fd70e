//! Generation orchestrator: sampler then detector metrics per timestep.
//!
//! Two seeding modes (see [`SeedMode`]):
//! - `Sequential`: one stream threaded through every timestep in order, then
//!   through the ablation noise. Reordering timesteps changes the data.
//! - `Derived`: each timestep and the ablation get their own BLAKE3-derived
//!   stream, so timesteps are evaluated in parallel with rayon and the
//!   output does not depend on thread count.
//!
//! Any failing timestep aborts the whole run; no partial output is returned.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use lsaprobe_core::detector::{evaluate, DetectorConfig, MetricsError};
use lsaprobe_core::domain::{MetricsBundle, PopulationPair};
use lsaprobe_core::rng::SeedHierarchy;
use lsaprobe_core::sampler::SamplerError;

use crate::ablation::{AblationError, AblationPoint};
use crate::config::{ConfigError, ProbeConfig, SeedMode};

/// Stream label for per-timestep sub-seeds.
pub const TIMESTEP_STREAM: &str = "timestep";
/// Stream label for the ablation sub-seed.
pub const ABLATION_STREAM: &str = "ablation";

/// Errors from a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("sampling failed at t={position}: {source}")]
    Sampling {
        position: f64,
        #[source]
        source: SamplerError,
    },
    #[error("metrics failed at t={position}: {source}")]
    Metrics {
        position: f64,
        #[source]
        source: MetricsError,
    },
    #[error("ablation failed: {0}")]
    Ablation(#[from] AblationError),
}

/// Costs and metrics for one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestepResult {
    pub position: f64,
    pub costs: PopulationPair,
    pub bundle: MetricsBundle,
}

/// Everything a run computes, in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub timesteps: Vec<TimestepResult>,
    pub ablation: Vec<AblationPoint>,
}

impl GenerationOutput {
    pub fn timestep(&self, position: f64) -> Option<&TimestepResult> {
        self.timesteps
            .iter()
            .find(|r| (r.position - position).abs() < 1e-12)
    }
}

/// Sample and evaluate a single timestep with the caller's generator.
pub fn evaluate_timestep<R: Rng + ?Sized>(
    config: &ProbeConfig,
    detector: &DetectorConfig,
    position: f64,
    rng: &mut R,
) -> Result<TimestepResult, GenerateError> {
    let costs = config
        .sampler
        .generate(position, config.n_samples, rng)
        .map_err(|source| GenerateError::Sampling { position, source })?;
    let bundle = evaluate(position, &costs, detector)
        .map_err(|source| GenerateError::Metrics { position, source })?;

    info!(
        t_ratio = position,
        auc = bundle.roc.auc,
        mean_gap = costs.mean_gap(),
        "timestep evaluated"
    );
    for m in &bundle.thresholds {
        debug!(
            t_ratio = position,
            target_fpr = m.target_fpr,
            tpr = m.tpr,
            threshold = m.threshold,
            "operating point"
        );
    }

    Ok(TimestepResult {
        position,
        costs,
        bundle,
    })
}

/// Run the full generation described by `config`.
pub fn run_generation(config: &ProbeConfig) -> Result<GenerationOutput, GenerateError> {
    config.validate()?;
    let seeds = SeedHierarchy::new(config.seed);
    let detector = config.detector_config();

    info!(
        seed = config.seed,
        seed_mode = %config.seed_mode,
        timesteps = config.timesteps.len(),
        n_samples = config.n_samples,
        "generating demo data"
    );

    let output = match config.seed_mode {
        SeedMode::Sequential => {
            let mut rng = seeds.sequential();
            let timesteps = config
                .timesteps
                .iter()
                .map(|&t| evaluate_timestep(config, &detector, t, &mut rng))
                .collect::<Result<Vec<_>, _>>()?;
            let ablation = config
                .ablation
                .sample(&config.budgets, &mut rng)?;
            GenerationOutput {
                timesteps,
                ablation,
            }
        }
        SeedMode::Derived => {
            let timesteps = config
                .timesteps
                .par_iter()
                .enumerate()
                .map(|(i, &t)| {
                    let sub_seed = seeds.sub_seed(TIMESTEP_STREAM, i as u64);
                    debug!(t_ratio = t, index = i, sub_seed, "derived timestep stream");
                    let mut rng = seeds.rng_for(TIMESTEP_STREAM, i as u64);
                    evaluate_timestep(config, &detector, t, &mut rng)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let mut rng = seeds.rng_for(ABLATION_STREAM, 0);
            let ablation = config
                .ablation
                .sample(&config.budgets, &mut rng)?;
            GenerationOutput {
                timesteps,
                ablation,
            }
        }
    };

    info!(
        timesteps = output.timesteps.len(),
        ablation_rows = output.ablation.len(),
        "generation complete"
    );
    Ok(output)
}
