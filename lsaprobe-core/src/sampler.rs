//! Adversarial cost sampler: synthetic member/non-member populations.
//!
//! Distinguishability peaks mid-trajectory: `separability` is 1.0 at the
//! configured midpoint and decays linearly with distance from it. Both
//! population means grow with separability, members faster than non-members.
//!
//! Samples come from a Gamma distribution reparametrized from (mean, std):
//! `shape = (mean / std)^2`, `scale = std^2 / mean`. The skew keeps costs
//! strictly positive. Every sample is then clamped into its population's
//! bounds.
//!
//! The generator is passed in explicitly. Members are drawn first, then
//! non-members, so the output depends on the caller's call order.

use rand::Rng;
use rand_distr::{Distribution, Gamma};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PopulationKind, PopulationPair, ScorePopulation};

// ─── Configuration ───────────────────────────────────────────────────

/// Mean/std/clamp parameters for one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationParams {
    /// Mean at zero separability.
    pub base_mean: f64,
    /// Added to the mean, scaled by separability.
    pub spread: f64,
    pub std: f64,
    /// Inclusive `[lo, hi]` bounds applied to every sample.
    pub clamp: [f64; 2],
}

impl PopulationParams {
    /// Members: higher mean, moderate variance.
    pub fn members() -> Self {
        Self {
            base_mean: 0.45,
            spread: 0.15,
            std: 0.12,
            clamp: [0.05, 0.95],
        }
    }

    /// Non-members: lower mean, higher variance.
    pub fn non_members() -> Self {
        Self {
            base_mean: 0.30,
            spread: 0.08,
            std: 0.15,
            clamp: [0.02, 0.85],
        }
    }

    pub fn mean_at(&self, separability: f64) -> f64 {
        self.base_mean + self.spread * separability
    }
}

/// Sampler configuration (defaults reproduce the demo data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Position of peak separability.
    pub midpoint: f64,
    /// Separability lost per unit distance from the midpoint.
    pub decay_rate: f64,
    pub member: PopulationParams,
    pub non_member: PopulationParams,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            midpoint: 0.6,
            decay_rate: 0.5,
            member: PopulationParams::members(),
            non_member: PopulationParams::non_members(),
        }
    }
}

/// Invalid sampler configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerError {
    #[error("invalid configuration: sample_count must be >= 1")]
    ZeroSampleCount,
    #[error("invalid configuration: position {0} outside [0, 1]")]
    PositionOutOfRange(f64),
    #[error("invalid configuration: {kind} std must be positive and finite, got {std}")]
    NonPositiveStd { kind: PopulationKind, std: f64 },
    #[error("invalid configuration: {kind} mean must be positive, got {mean}")]
    NonPositiveMean { kind: PopulationKind, mean: f64 },
    #[error("invalid configuration: {kind} clamp bounds [{lo}, {hi}] are not ordered")]
    InvalidClamp { kind: PopulationKind, lo: f64, hi: f64 },
    #[error("invalid configuration: gamma(shape={shape}, scale={scale}) rejected for {kind}: {reason}")]
    Distribution {
        kind: PopulationKind,
        shape: f64,
        scale: f64,
        reason: String,
    },
}

// ─── Sampling ────────────────────────────────────────────────────────

/// A validated Gamma draw plan for one population.
struct DrawPlan {
    gamma: Gamma<f64>,
    lo: f64,
    hi: f64,
}

impl DrawPlan {
    fn new(
        params: &PopulationParams,
        separability: f64,
        kind: PopulationKind,
    ) -> Result<Self, SamplerError> {
        let std = params.std;
        if !std.is_finite() || std <= 0.0 {
            return Err(SamplerError::NonPositiveStd { kind, std });
        }
        let mean = params.mean_at(separability);
        if !mean.is_finite() || mean <= 0.0 {
            return Err(SamplerError::NonPositiveMean { kind, mean });
        }
        let [lo, hi] = params.clamp;
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(SamplerError::InvalidClamp { kind, lo, hi });
        }

        let shape = (mean / std).powi(2);
        let scale = std * std / mean;
        let gamma = Gamma::new(shape, scale).map_err(|e| SamplerError::Distribution {
            kind,
            shape,
            scale,
            reason: e.to_string(),
        })?;

        Ok(Self { gamma, lo, hi })
    }

    fn draw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> ScorePopulation {
        (0..n)
            .map(|_| self.gamma.sample(rng).clamp(self.lo, self.hi))
            .collect()
    }
}

impl SamplerConfig {
    /// Separability at `position`: 1.0 at the midpoint, linear decay away from it.
    pub fn separability(&self, position: f64) -> f64 {
        1.0 - (position - self.midpoint).abs() * self.decay_rate
    }

    /// Draw `sample_count` member and non-member costs at `position`.
    ///
    /// All parameters are validated before the first draw, so a failure
    /// never consumes generator state.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        position: f64,
        sample_count: usize,
        rng: &mut R,
    ) -> Result<PopulationPair, SamplerError> {
        if sample_count == 0 {
            return Err(SamplerError::ZeroSampleCount);
        }
        if !(0.0..=1.0).contains(&position) {
            return Err(SamplerError::PositionOutOfRange(position));
        }

        let separability = self.separability(position);
        let members = DrawPlan::new(&self.member, separability, PopulationKind::Members)?;
        let non_members =
            DrawPlan::new(&self.non_member, separability, PopulationKind::NonMembers)?;

        Ok(PopulationPair {
            members: members.draw(sample_count, rng),
            non_members: non_members.draw(sample_count, rng),
        })
    }
}

/// Draw populations with the default sampler configuration.
pub fn generate<R: Rng + ?Sized>(
    position: f64,
    sample_count: usize,
    rng: &mut R,
) -> Result<PopulationPair, SamplerError> {
    SamplerConfig::default().generate(position, sample_count, rng)
}
