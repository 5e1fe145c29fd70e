//! Export: JSON tables, CSV curves, and the run manifest.
//!
//! One JSON file per logical table, each a top-level object holding the key
//! list, a nested `key -> record` mapping, and a description:
//! - `adversarial_costs.json`, `roc_curves.json` (computed per timestep)
//! - `budget_ablation.json` (computed)
//! - `metric_comparison.json`, `baselines.json`, `main_results.json` (static)
//!
//! `manifest.json` carries a `schema_version`; newer versions are rejected on
//! load.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use lsaprobe_core::detector::DEFAULT_FPR_TARGETS;
use lsaprobe_core::domain::PopulationPair;

use crate::ablation::AblationPoint;
use crate::config::{fpr_label, timestep_key, ProbeConfig, SeedMode};
use crate::generate::GenerationOutput;
use crate::paper::{
    BaselineScore, MainResult, MetricScore, BASELINES, MAIN_RESULTS, METRIC_COMPARISON,
};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

pub const COSTS_FILE: &str = "adversarial_costs.json";
pub const ROC_FILE: &str = "roc_curves.json";
pub const ABLATION_FILE: &str = "budget_ablation.json";
pub const METRIC_COMPARISON_FILE: &str = "metric_comparison.json";
pub const BASELINES_FILE: &str = "baselines.json";
pub const MAIN_RESULTS_FILE: &str = "main_results.json";
pub const ROC_CSV_FILE: &str = "roc_curves.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

// ─── Table types ────────────────────────────────────────────────────

/// String-keyed rows that serialize as a JSON object in row order.
///
/// The static tables are rendered by iterating the object's keys, so row
/// order is part of the file format.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<T>(Vec<(String, T)>);

impl<T> OrderedMap<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> FromIterator<(String, T)> for OrderedMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Serialize> Serialize for OrderedMap<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<T> {
    type Value = OrderedMap<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of table rows")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut rows = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, T>()? {
            rows.push((k, v));
        }
        Ok(OrderedMap(rows))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedMap<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostsTable {
    pub timesteps: Vec<f64>,
    pub costs: BTreeMap<String, PopulationPair>,
    pub description: String,
}

/// ROC curve plus flattened operating points for one timestep.
///
/// Operating points serialize as `tpr_at_{pct}_fpr` and `threshold_{pct}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocRecord {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub auc: f64,
    #[serde(flatten)]
    pub operating_points: BTreeMap<String, f64>,
}

impl RocRecord {
    pub fn tpr_at(&self, target_fpr: f64) -> Option<f64> {
        self.operating_points
            .get(&format!("tpr_at_{}_fpr", fpr_label(target_fpr)))
            .copied()
    }

    pub fn threshold_at(&self, target_fpr: f64) -> Option<f64> {
        self.operating_points
            .get(&format!("threshold_{}", fpr_label(target_fpr)))
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocTable {
    pub timesteps: Vec<f64>,
    pub roc_data: BTreeMap<String, RocRecord>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AblationTable {
    pub budgets: Vec<f64>,
    pub data: Vec<AblationPoint>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparisonTable {
    pub metrics: Vec<String>,
    pub data: OrderedMap<MetricScore>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselinesTable {
    pub methods: Vec<String>,
    pub data: OrderedMap<BaselineScore>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainResultsTable {
    pub models: Vec<String>,
    pub data: OrderedMap<MainResult>,
    pub description: String,
}

/// The six demo tables.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoTables {
    pub costs: CostsTable,
    pub roc: RocTable,
    pub ablation: AblationTable,
    pub metric_comparison: MetricComparisonTable,
    pub baselines: BaselinesTable,
    pub main_results: MainResultsTable,
}

/// Provenance for one generated data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config_hash: String,
    pub seed: u64,
    pub seed_mode: SeedMode,
    pub generated_at: String,
    pub total_samples: usize,
    /// FPR targets the operating points were computed for.
    #[serde(default = "default_fpr_targets")]
    pub fpr_targets: Vec<f64>,
    pub files: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_fpr_targets() -> Vec<f64> {
    DEFAULT_FPR_TARGETS.to_vec()
}

// ─── Table assembly ─────────────────────────────────────────────────

fn static_table<T: Copy>(rows: &[(&str, T)]) -> (Vec<String>, OrderedMap<T>) {
    let keys = rows.iter().map(|(k, _)| k.to_string()).collect();
    let data = rows.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    (keys, data)
}

/// Build every table from a generation run.
pub fn build_tables(output: &GenerationOutput) -> DemoTables {
    let timesteps: Vec<f64> = output.timesteps.iter().map(|r| r.position).collect();

    let costs = output
        .timesteps
        .iter()
        .map(|r| (timestep_key(r.position), r.costs.clone()))
        .collect();

    let roc_data = output
        .timesteps
        .iter()
        .map(|r| {
            let mut operating_points = BTreeMap::new();
            for m in &r.bundle.thresholds {
                let label = fpr_label(m.target_fpr);
                operating_points.insert(format!("tpr_at_{label}_fpr"), m.tpr);
                operating_points.insert(format!("threshold_{label}"), m.threshold);
            }
            let record = RocRecord {
                fpr: r.bundle.roc.fpr.clone(),
                tpr: r.bundle.roc.tpr.clone(),
                auc: r.bundle.roc.auc,
                operating_points,
            };
            (timestep_key(r.position), record)
        })
        .collect();

    let (metrics, metric_data) = static_table(METRIC_COMPARISON);
    let (methods, baseline_data) = static_table(BASELINES);
    let (models, main_data) = static_table(MAIN_RESULTS);

    DemoTables {
        costs: CostsTable {
            timesteps: timesteps.clone(),
            costs,
            description: "Adversarial costs for members and non-members at different timesteps"
                .into(),
        },
        roc: RocTable {
            timesteps,
            roc_data,
            description: "ROC curves and TPR@FPR metrics for each timestep".into(),
        },
        ablation: AblationTable {
            budgets: output.ablation.iter().map(|p| p.budget).collect(),
            data: output.ablation.clone(),
            description: "TPR@1%FPR vs budget (eta) at t_ratio=0.6".into(),
        },
        metric_comparison: MetricComparisonTable {
            metrics,
            data: metric_data,
            description: "Performance comparison across different distance metrics".into(),
        },
        baselines: BaselinesTable {
            methods,
            data: baseline_data,
            description: "Comparison with baseline methods".into(),
        },
        main_results: MainResultsTable {
            models,
            data: main_data,
            description: "Main experimental results from paper (Table 1)".into(),
        },
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the stored ROC points as CSV: `timestep, point, fpr, tpr`.
pub fn export_roc_csv(table: &RocTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestep", "point", "fpr", "tpr"])?;
    for &t in &table.timesteps {
        let key = timestep_key(t);
        let Some(record) = table.roc_data.get(&key) else {
            bail!("ROC table has no record for timestep {key}");
        };
        for (i, (fpr, tpr)) in record.fpr.iter().zip(&record.tpr).enumerate() {
            wtr.write_record([
                key.clone(),
                i.to_string(),
                format!("{fpr:.6}"),
                format!("{tpr:.6}"),
            ])?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Writing ────────────────────────────────────────────────────────

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {name}"))?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(file = %path.display(), "wrote table");
    Ok(path)
}

/// Write all six tables, the ROC CSV, and the manifest into `output_dir`.
///
/// Returns the manifest that was written.
pub fn save_demo_data(
    output: &GenerationOutput,
    config: &ProbeConfig,
    output_dir: &Path,
) -> Result<Manifest> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let tables = build_tables(output);

    write_json(output_dir, COSTS_FILE, &tables.costs)?;
    write_json(output_dir, ROC_FILE, &tables.roc)?;
    write_json(output_dir, ABLATION_FILE, &tables.ablation)?;
    write_json(output_dir, METRIC_COMPARISON_FILE, &tables.metric_comparison)?;
    write_json(output_dir, BASELINES_FILE, &tables.baselines)?;
    write_json(output_dir, MAIN_RESULTS_FILE, &tables.main_results)?;

    let csv_path = output_dir.join(ROC_CSV_FILE);
    std::fs::write(&csv_path, export_roc_csv(&tables.roc)?)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let manifest = Manifest {
        schema_version: SCHEMA_VERSION,
        config_hash: config.config_hash()?,
        seed: config.seed,
        seed_mode: config.seed_mode,
        generated_at: chrono::Local::now().to_rfc3339(),
        total_samples: output
            .timesteps
            .iter()
            .map(|r| r.costs.total_samples())
            .sum(),
        fpr_targets: config.fpr_targets.clone(),
        files: [
            COSTS_FILE,
            ROC_FILE,
            ABLATION_FILE,
            METRIC_COMPARISON_FILE,
            BASELINES_FILE,
            MAIN_RESULTS_FILE,
            ROC_CSV_FILE,
        ]
        .iter()
        .map(|f| f.to_string())
        .collect(),
    };
    write_json(output_dir, MANIFEST_FILE, &manifest)?;

    Ok(manifest)
}

// ─── Loading ────────────────────────────────────────────────────────

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_manifest(json: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_json::from_str(json).context("failed to deserialize manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

fn read_file(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn load_manifest(dir: &Path) -> Result<Manifest> {
    import_manifest(&read_file(dir, MANIFEST_FILE)?)
}

pub fn load_roc_table(dir: &Path) -> Result<RocTable> {
    serde_json::from_str(&read_file(dir, ROC_FILE)?).context("failed to deserialize ROC table")
}

pub fn load_costs_table(dir: &Path) -> Result<CostsTable> {
    serde_json::from_str(&read_file(dir, COSTS_FILE)?).context("failed to deserialize costs table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsaprobe_core::domain::{MetricsBundle, RocCurve, ThresholdMetric};

    use crate::generate::TimestepResult;

    fn make_output() -> GenerationOutput {
        let costs = PopulationPair {
            members: vec![0.9, 0.8, 0.7].into(),
            non_members: vec![0.1, 0.2, 0.3].into(),
        };
        let bundle = MetricsBundle {
            position: 0.6,
            roc: RocCurve {
                fpr: vec![0.0, 0.0, 1.0],
                tpr: vec![0.0, 1.0, 1.0],
                auc: 1.0,
            },
            thresholds: vec![
                ThresholdMetric {
                    target_fpr: 0.001,
                    tpr: 0.0,
                    threshold: 0.1,
                },
                ThresholdMetric {
                    target_fpr: 0.05,
                    tpr: 1.0,
                    threshold: 0.3,
                },
            ],
        };
        GenerationOutput {
            timesteps: vec![TimestepResult {
                position: 0.6,
                costs,
                bundle,
            }],
            ablation: vec![AblationPoint {
                budget: 0.1,
                tpr_1: 0.1,
            }],
        }
    }

    #[test]
    fn roc_record_flattens_operating_points() {
        let tables = build_tables(&make_output());
        let json = serde_json::to_value(&tables.roc).unwrap();
        let record = &json["roc_data"]["0.6"];
        assert_eq!(record["auc"], 1.0);
        assert_eq!(record["tpr_at_0.1_fpr"], 0.0);
        assert_eq!(record["threshold_0.1"], 0.1);
        assert_eq!(record["tpr_at_5_fpr"], 1.0);
        assert_eq!(record["threshold_5"], 0.3);
        assert_eq!(json["timesteps"][0], 0.6);
    }

    #[test]
    fn roc_record_round_trips_through_json() {
        let tables = build_tables(&make_output());
        let json = serde_json::to_string(&tables.roc).unwrap();
        let restored: RocTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tables.roc);
        let record = &restored.roc_data["0.6"];
        assert_eq!(record.tpr_at(0.05), Some(1.0));
        assert_eq!(record.threshold_at(0.001), Some(0.1));
        assert_eq!(record.tpr_at(0.01), None);
    }

    #[test]
    fn costs_table_keys_by_timestep() {
        let tables = build_tables(&make_output());
        let json = serde_json::to_value(&tables.costs).unwrap();
        assert_eq!(json["costs"]["0.6"]["members"][0], 0.9);
        assert_eq!(json["costs"]["0.6"]["non_members"][2], 0.3);
        assert!(json["description"].as_str().unwrap().contains("Adversarial costs"));
    }

    #[test]
    fn static_tables_keep_declared_key_order() {
        let tables = build_tables(&make_output());
        assert_eq!(
            tables.baselines.methods,
            vec!["Loss-based", "Trajectory", "SecMI", "LSA-Probe (Ours)"]
        );
        assert_eq!(tables.metric_comparison.metrics[0], "CDPAM");
        assert_eq!(tables.main_results.models.len(), 4);
        assert_eq!(
            tables.main_results.data.get("MusicLDM_MAESTRO").unwrap().delta_tpr,
            0.08
        );

        let data_keys: Vec<&str> = tables.baselines.data.keys().collect();
        assert_eq!(data_keys, tables.baselines.methods);
        let data_keys: Vec<&str> = tables.main_results.data.keys().collect();
        assert_eq!(data_keys, tables.main_results.models);
    }

    fn key_position(json: &str, key: &str) -> usize {
        json.find(&format!("\"{key}\":")).unwrap()
    }

    #[test]
    fn static_table_objects_serialize_in_declared_order() {
        let tables = build_tables(&GenerationOutput {
            timesteps: vec![],
            ablation: vec![],
        });

        let json = serde_json::to_string(&tables.baselines).unwrap();
        let data = &json[json.find("\"data\":").unwrap()..];
        let positions: Vec<usize> = tables
            .baselines
            .methods
            .iter()
            .map(|m| key_position(data, m))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{data}");
        assert!(key_position(data, "Loss-based") < key_position(data, "LSA-Probe (Ours)"));

        let json = serde_json::to_string(&tables.main_results).unwrap();
        let data = &json[json.find("\"data\":").unwrap()..];
        let positions: Vec<usize> = tables
            .main_results
            .models
            .iter()
            .map(|m| key_position(data, m))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{data}");

        let json = serde_json::to_string(&tables.metric_comparison).unwrap();
        let data = &json[json.find("\"data\":").unwrap()..];
        let positions: Vec<usize> = tables
            .metric_comparison
            .metrics
            .iter()
            .map(|m| key_position(data, m))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{data}");
    }

    #[test]
    fn static_tables_read_back_in_declared_order() {
        let tables = build_tables(&make_output());
        let json = serde_json::to_string_pretty(&tables.main_results).unwrap();
        let restored: MainResultsTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tables.main_results);
        let keys: Vec<&str> = restored.data.keys().collect();
        assert_eq!(keys, restored.models);
    }

    #[test]
    fn ablation_table_lists_budgets() {
        let tables = build_tables(&make_output());
        assert_eq!(tables.ablation.budgets, vec![0.1]);
        let json = serde_json::to_value(&tables.ablation).unwrap();
        assert_eq!(json["data"][0]["tpr_1"], 0.1);
    }

    #[test]
    fn roc_csv_has_row_per_point() {
        let tables = build_tables(&make_output());
        let csv = export_roc_csv(&tables.roc).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestep,point,fpr,tpr");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "0.6,1,0.000000,1.000000");
    }

    #[test]
    fn manifest_rejects_future_schema() {
        let json = r#"{"schema_version":99,"config_hash":"abc","seed":42,"seed_mode":"sequential","generated_at":"now","total_samples":0,"files":[]}"#;
        let err = import_manifest(json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version 99"));
    }

    #[test]
    fn manifest_defaults_missing_schema_version() {
        let json = r#"{"config_hash":"abc","seed":42,"seed_mode":"derived","generated_at":"now","total_samples":6,"files":[]}"#;
        let manifest = import_manifest(json).unwrap();
        assert_eq!(manifest.schema_version, SCHEMA_VERSION);
        assert_eq!(manifest.seed_mode, SeedMode::Derived);
        assert_eq!(manifest.fpr_targets, DEFAULT_FPR_TARGETS.to_vec());
    }
}
