//! LSA-Probe Core: synthetic adversarial costs and detector metrics.
//!
//! This crate contains the statistical heart of the demo data generator:
//! - Domain types (score populations, ROC curves, operating points, bundles)
//! - Cost sampler calibrated by trajectory position
//! - ROC curve, AUC, and TPR@FPR from two unlabeled score populations
//! - Deterministic RNG hierarchy (sequential stream or hash-derived sub-seeds)
//!
//! Everything here is pure and in-memory. Randomness is always passed in.

pub mod detector;
pub mod domain;
pub mod rng;
pub mod sampler;

pub use detector::{
    evaluate, roc_curve, tpr_at_fpr, DetectorConfig, MetricsError, Ranking,
    DEFAULT_CURVE_STRIDE, DEFAULT_FPR_TARGETS,
};
pub use domain::{
    MetricsBundle, PopulationKind, PopulationPair, RocCurve, ScorePopulation, ThresholdMetric,
};
pub use rng::{SeedHierarchy, DEFAULT_SEED};
pub use sampler::{PopulationParams, SamplerConfig, SamplerError};
