//! Domain types shared by the sampler and the detector metrics.
//!
//! Everything here is built once and handed downstream; nothing is mutated
//! after construction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of the membership split a population belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationKind {
    Members,
    NonMembers,
}

impl fmt::Display for PopulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopulationKind::Members => f.write_str("members"),
            PopulationKind::NonMembers => f.write_str("non_members"),
        }
    }
}

/// A finite collection of adversarial costs. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScorePopulation(Vec<f64>);

impl ScorePopulation {
    pub fn new(scores: Vec<f64>) -> Self {
        Self(scores)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }

    /// Arithmetic mean. Returns 0.0 for an empty population.
    pub fn mean(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().sum::<f64>() / self.0.len() as f64
    }

    pub fn min(&self) -> Option<f64> {
        self.0.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.0.iter().copied().reduce(f64::max)
    }
}

impl From<Vec<f64>> for ScorePopulation {
    fn from(scores: Vec<f64>) -> Self {
        Self(scores)
    }
}

impl FromIterator<f64> for ScorePopulation {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Member and non-member costs for one configuration point.
///
/// Serializes as `{"members": [...], "non_members": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationPair {
    pub members: ScorePopulation,
    pub non_members: ScorePopulation,
}

impl PopulationPair {
    /// Difference between the member and non-member means.
    pub fn mean_gap(&self) -> f64 {
        self.members.mean() - self.non_members.mean()
    }

    pub fn total_samples(&self) -> usize {
        self.members.len() + self.non_members.len()
    }
}

/// ROC curve as stored for visualization, plus the area under the full curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub auc: f64,
}

impl RocCurve {
    pub fn len(&self) -> usize {
        self.fpr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fpr.is_empty()
    }

    /// Iterate `(fpr, tpr)` points in curve order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.fpr.iter().copied().zip(self.tpr.iter().copied())
    }
}

/// Operating point for a fixed false-positive-rate target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMetric {
    pub target_fpr: f64,
    /// Fraction of members ranked at or above the threshold.
    pub tpr: f64,
    /// Score at which the FPR target is first reached.
    pub threshold: f64,
}

/// All metrics computed for one configuration point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub position: f64,
    pub roc: RocCurve,
    pub thresholds: Vec<ThresholdMetric>,
}

impl MetricsBundle {
    /// Look up the operating point computed for `target_fpr`.
    pub fn threshold_for(&self, target_fpr: f64) -> Option<&ThresholdMetric> {
        self.thresholds
            .iter()
            .find(|m| (m.target_fpr - target_fpr).abs() < 1e-12)
    }
}
