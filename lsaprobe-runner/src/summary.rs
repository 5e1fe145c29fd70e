//! Per-timestep summary of a generated data set.

use serde::{Deserialize, Serialize};

use crate::config::{fpr_label, timestep_key};
use crate::export::{CostsTable, RocTable};

/// Headline numbers for one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestepSummary {
    pub t_ratio: f64,
    pub member_mean: f64,
    pub non_member_mean: f64,
    pub auc: f64,
    /// `(target_fpr, tpr)` pairs in target order.
    pub tpr_at: Vec<(f64, f64)>,
}

impl TimestepSummary {
    pub fn mean_gap(&self) -> f64 {
        self.member_mean - self.non_member_mean
    }
}

/// Join the costs and ROC tables by timestep.
///
/// Timesteps missing from either table are skipped.
pub fn summarize(costs: &CostsTable, roc: &RocTable, fpr_targets: &[f64]) -> Vec<TimestepSummary> {
    roc.timesteps
        .iter()
        .filter_map(|&t| {
            let key = timestep_key(t);
            let pair = costs.costs.get(&key)?;
            let record = roc.roc_data.get(&key)?;
            Some(TimestepSummary {
                t_ratio: t,
                member_mean: pair.members.mean(),
                non_member_mean: pair.non_members.mean(),
                auc: record.auc,
                tpr_at: fpr_targets
                    .iter()
                    .filter_map(|&f| record.tpr_at(f).map(|tpr| (f, tpr)))
                    .collect(),
            })
        })
        .collect()
}

/// Render summaries as a Markdown table.
pub fn format_summary(rows: &[TimestepSummary]) -> String {
    let targets: Vec<f64> = rows
        .first()
        .map(|r| r.tpr_at.iter().map(|(f, _)| *f).collect())
        .unwrap_or_default();

    let mut md = String::with_capacity(512);
    md.push_str("| t/T | Member mean | Non-member mean | Gap | AUC |");
    for &f in &targets {
        md.push_str(&format!(" TPR@{}%FPR |", fpr_label(f)));
    }
    md.push('\n');
    md.push_str("| --- | --- | --- | --- | --- |");
    for _ in &targets {
        md.push_str(" --- |");
    }
    md.push('\n');

    for r in rows {
        md.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.3} | {:.3} |",
            timestep_key(r.t_ratio),
            r.member_mean,
            r.non_member_mean,
            r.mean_gap(),
            r.auc
        ));
        for (_, tpr) in &r.tpr_at {
            md.push_str(&format!(" {:.1}% |", tpr * 100.0));
        }
        md.push('\n');
    }
    md
}
