//! Detector metrics: ROC curve, AUC, and TPR at fixed FPR targets.
//!
//! Members are the positive class and a higher cost means "more likely a
//! member". Both populations are pooled, labelled, and ranked by score
//! descending. Ties keep input order (members before non-members, each in
//! their original order), so every metric is deterministic.
//!
//! Key design choices:
//! - AUC is integrated over the full curve on integer TP/FP counts, so it does
//!   not depend on how many points are kept for storage.
//! - An FPR target that cannot be reached falls back to `tpr = 0.0` at the
//!   lowest pooled score instead of failing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MetricsBundle, PopulationKind, PopulationPair, RocCurve, ThresholdMetric};

/// Default stride used when thinning the stored ROC curve.
pub const DEFAULT_CURVE_STRIDE: usize = 10;

/// Default FPR operating points: 0.1%, 1%, 5%.
pub const DEFAULT_FPR_TARGETS: [f64; 3] = [0.001, 0.01, 0.05];

// ─── Configuration ───────────────────────────────────────────────────

/// What to compute for every configuration point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Keep every `curve_stride`-th ROC point (endpoints always kept).
    pub curve_stride: usize,
    /// FPR targets for the TPR@FPR operating points.
    pub fpr_targets: Vec<f64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            curve_stride: DEFAULT_CURVE_STRIDE,
            fpr_targets: DEFAULT_FPR_TARGETS.to_vec(),
        }
    }
}

/// Invalid input passed to the detector metrics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("invalid input: {0} population is empty")]
    EmptyPopulation(PopulationKind),
    #[error("invalid input: non-finite score {value} in {kind} population")]
    NonFiniteScore { kind: PopulationKind, value: f64 },
    #[error("invalid input: curve stride must be >= 1")]
    ZeroStride,
    #[error("invalid input: target FPR {0} outside [0, 1]")]
    TargetOutOfRange(f64),
}

// ─── Ranking ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Ranked {
    score: f64,
    is_member: bool,
}

/// Pooled member/non-member scores ranked by score descending.
///
/// Build once and reuse for the full curve and every operating point.
#[derive(Debug, Clone)]
pub struct Ranking {
    ranked: Vec<Ranked>,
    n_members: usize,
    n_non_members: usize,
}

impl Ranking {
    pub fn new(members: &[f64], non_members: &[f64]) -> Result<Self, MetricsError> {
        validate(members, PopulationKind::Members)?;
        validate(non_members, PopulationKind::NonMembers)?;

        let mut ranked: Vec<Ranked> = members
            .iter()
            .map(|&score| Ranked {
                score,
                is_member: true,
            })
            .chain(non_members.iter().map(|&score| Ranked {
                score,
                is_member: false,
            }))
            .collect();

        // sort_by is stable: equal scores keep pooled input order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(Self {
            ranked,
            n_members: members.len(),
            n_non_members: non_members.len(),
        })
    }

    pub fn from_pair(pair: &PopulationPair) -> Result<Self, MetricsError> {
        Self::new(pair.members.as_slice(), pair.non_members.as_slice())
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Lowest pooled score.
    pub fn lowest_score(&self) -> f64 {
        // Non-empty by construction.
        self.ranked.last().map_or(0.0, |r| r.score)
    }

    /// ROC curve thinned to every `curve_stride`-th point.
    ///
    /// The full curve is `(0,0)`, one point per ranked sample, then `(1,1)`.
    /// AUC is always taken over the full curve.
    pub fn roc_curve(&self, curve_stride: usize) -> Result<RocCurve, MetricsError> {
        if curve_stride == 0 {
            return Err(MetricsError::ZeroStride);
        }

        let n_m = self.n_members as f64;
        let n_n = self.n_non_members as f64;

        let mut fpr = Vec::with_capacity(self.ranked.len() + 2);
        let mut tpr = Vec::with_capacity(self.ranked.len() + 2);
        fpr.push(0.0);
        tpr.push(0.0);

        // Twice the area in units of (1 / n_members) x (1 / n_non_members).
        let mut doubled_area: u128 = 0;
        let (mut tp, mut fp) = (0usize, 0usize);
        for r in &self.ranked {
            if r.is_member {
                tp += 1;
            } else {
                fp += 1;
                // Horizontal step: trapezoid with equal heights tp on both sides.
                doubled_area += 2 * tp as u128;
            }
            tpr.push(tp as f64 / n_m);
            fpr.push(fp as f64 / n_n);
        }
        fpr.push(1.0);
        tpr.push(1.0);

        let denom = 2.0 * n_m * n_n;
        let auc = doubled_area as f64 / denom;

        Ok(RocCurve {
            fpr: thin(&fpr, curve_stride),
            tpr: thin(&tpr, curve_stride),
            auc,
        })
    }

    /// TPR at the earliest cut point whose false-positive count reaches
    /// `floor(target_fpr * n_non_members)`.
    ///
    /// A target that rounds to zero false positives, or one no cut point
    /// reaches, yields `tpr = 0.0` with the lowest pooled score as threshold.
    pub fn tpr_at_fpr(&self, target_fpr: f64) -> Result<ThresholdMetric, MetricsError> {
        if !(0.0..=1.0).contains(&target_fpr) {
            return Err(MetricsError::TargetOutOfRange(target_fpr));
        }

        let fp_target = (target_fpr * self.n_non_members as f64).floor() as usize;

        if fp_target > 0 {
            let (mut tp, mut fp) = (0usize, 0usize);
            for r in &self.ranked {
                if r.is_member {
                    tp += 1;
                } else {
                    fp += 1;
                }
                if fp >= fp_target {
                    return Ok(ThresholdMetric {
                        target_fpr,
                        tpr: tp as f64 / self.n_members as f64,
                        threshold: r.score,
                    });
                }
            }
        }

        Ok(ThresholdMetric {
            target_fpr,
            tpr: 0.0,
            threshold: self.lowest_score(),
        })
    }
}

fn validate(scores: &[f64], kind: PopulationKind) -> Result<(), MetricsError> {
    if scores.is_empty() {
        return Err(MetricsError::EmptyPopulation(kind));
    }
    if let Some(&value) = scores.iter().find(|s| !s.is_finite()) {
        return Err(MetricsError::NonFiniteScore { kind, value });
    }
    Ok(())
}

/// Every `stride`-th value starting at index 0, plus the last value.
fn thin(values: &[f64], stride: usize) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().step_by(stride).copied().collect();
    let last = values.len() - 1;
    if last % stride != 0 {
        out.push(values[last]);
    }
    out
}

// ─── Free-function entry points ──────────────────────────────────────

/// ROC curve and AUC for two score populations.
pub fn roc_curve(
    members: &[f64],
    non_members: &[f64],
    curve_stride: usize,
) -> Result<RocCurve, MetricsError> {
    Ranking::new(members, non_members)?.roc_curve(curve_stride)
}

/// TPR and score threshold at a fixed FPR target.
pub fn tpr_at_fpr(
    members: &[f64],
    non_members: &[f64],
    target_fpr: f64,
) -> Result<ThresholdMetric, MetricsError> {
    Ranking::new(members, non_members)?.tpr_at_fpr(target_fpr)
}

/// Full metrics bundle for one configuration point.
pub fn evaluate(
    position: f64,
    pair: &PopulationPair,
    config: &DetectorConfig,
) -> Result<MetricsBundle, MetricsError> {
    let ranking = Ranking::from_pair(pair)?;
    let roc = ranking.roc_curve(config.curve_stride)?;
    let thresholds = config
        .fpr_targets
        .iter()
        .map(|&target| ranking.tpr_at_fpr(target))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MetricsBundle {
        position,
        roc,
        thresholds,
    })
}
