//! Reported results from the paper, kept as plain data.
//!
//! None of these numbers are computed; they are copied into the demo so the
//! comparison charts can sit next to the synthetic curves.

use serde::{Deserialize, Serialize};

/// TPR@1%FPR and AUC for one distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub tpr_1: f64,
    pub auc: f64,
}

/// Baseline method scores, including TPR@0.1%FPR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineScore {
    pub tpr_1: f64,
    pub tpr_01: f64,
    pub auc: f64,
}

/// One row of the main results table (model × dataset).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MainResult {
    pub best_baseline: MetricScore,
    pub ours: MetricScore,
    pub delta_tpr: f64,
    pub delta_auc: f64,
}

const fn score(tpr_1: f64, auc: f64) -> MetricScore {
    MetricScore { tpr_1, auc }
}

/// Distance metrics compared at t/T = 0.6.
pub const METRIC_COMPARISON: &[(&str, MetricScore)] = &[
    ("CDPAM", score(0.20, 0.67)),
    ("MR-STFT", score(0.18, 0.65)),
    ("log-mel MSE", score(0.13, 0.61)),
    ("wave MSE", score(0.11, 0.59)),
];

pub const BASELINES: &[(&str, BaselineScore)] = &[
    (
        "Loss-based",
        BaselineScore {
            tpr_1: 0.08,
            tpr_01: 0.014,
            auc: 0.585,
        },
    ),
    (
        "Trajectory",
        BaselineScore {
            tpr_1: 0.10,
            tpr_01: 0.019,
            auc: 0.600,
        },
    ),
    (
        "SecMI",
        BaselineScore {
            tpr_1: 0.12,
            tpr_01: 0.023,
            auc: 0.630,
        },
    ),
    (
        "LSA-Probe (Ours)",
        BaselineScore {
            tpr_1: 0.20,
            tpr_01: 0.051,
            auc: 0.670,
        },
    ),
];

/// Table 1: best baseline vs. ours per model/dataset pair.
pub const MAIN_RESULTS: &[(&str, MainResult)] = &[
    (
        "DiffWave_MAESTRO",
        MainResult {
            best_baseline: score(0.09, 0.59),
            ours: score(0.14, 0.62),
            delta_tpr: 0.05,
            delta_auc: 0.03,
        },
    ),
    (
        "DiffWave_FMA",
        MainResult {
            best_baseline: score(0.07, 0.57),
            ours: score(0.12, 0.60),
            delta_tpr: 0.05,
            delta_auc: 0.03,
        },
    ),
    (
        "MusicLDM_MAESTRO",
        MainResult {
            best_baseline: score(0.12, 0.63),
            ours: score(0.20, 0.67),
            delta_tpr: 0.08,
            delta_auc: 0.04,
        },
    ),
    (
        "MusicLDM_FMA",
        MainResult {
            best_baseline: score(0.11, 0.62),
            ours: score(0.18, 0.66),
            delta_tpr: 0.07,
            delta_auc: 0.04,
        },
    ),
];
