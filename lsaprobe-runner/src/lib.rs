//! LSA-Probe Runner: demo data generation, static tables, export.
//!
//! This crate builds on `lsaprobe-core` to provide:
//! - TOML configuration with defaults matching the published demo
//! - Timestep sweep (sequential stream or parallel derived streams)
//! - Budget ablation curve
//! - Reported paper tables as static data
//! - JSON/CSV export with a versioned manifest, and loaders
//! - Per-timestep summaries

pub mod ablation;
pub mod config;
pub mod export;
pub mod generate;
pub mod paper;
pub mod summary;

pub use ablation::{AblationConfig, AblationError, AblationPoint};
pub use config::{fpr_label, timestep_key, ConfigError, ProbeConfig, SeedMode};
pub use export::{
    build_tables, export_roc_csv, load_costs_table, load_manifest, load_roc_table,
    save_demo_data, DemoTables, Manifest, OrderedMap, RocRecord, RocTable, SCHEMA_VERSION,
};
pub use generate::{run_generation, GenerateError, GenerationOutput, TimestepResult};
pub use summary::{format_summary, summarize, TimestepSummary};
