//! LSA-Probe CLI: generate, configure, and inspect demo data.
//!
//! Commands:
//! - `generate`: run the timestep sweep and write all tables to a directory
//! - `init-config`: write the default configuration as TOML
//! - `inspect`: print the manifest and per-timestep summary of a data directory

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lsaprobe_runner::{
    format_summary, load_costs_table, load_manifest, load_roc_table, run_generation,
    save_demo_data, summarize, ProbeConfig, SeedMode,
};

#[derive(Parser)]
#[command(
    name = "lsaprobe",
    about = "LSA-Probe CLI: synthetic membership-inference demo data"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeedModeArg {
    Sequential,
    Derived,
}

impl From<SeedModeArg> for SeedMode {
    fn from(arg: SeedModeArg) -> Self {
        match arg {
            SeedModeArg::Sequential => SeedMode::Sequential,
            SeedModeArg::Derived => SeedMode::Derived,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all demo tables.
    Generate {
        /// Path to a TOML config file. Defaults reproduce the published demo.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Override samples per population per timestep.
        #[arg(long)]
        samples: Option<usize>,

        /// Override how generator state is shared between timesteps.
        #[arg(long, value_enum)]
        seed_mode: Option<SeedModeArg>,

        /// Output directory for the JSON/CSV tables.
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,
    },
    /// Write the default configuration as TOML.
    InitConfig {
        /// Destination file. Prints to stdout when omitted.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print the manifest and summary of a generated data directory.
    Inspect {
        /// Data directory written by `generate`.
        #[arg(default_value = "data")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            config,
            seed,
            samples,
            seed_mode,
            output_dir,
        } => run_generate(config, seed, samples, seed_mode, &output_dir),
        Commands::InitConfig { path, force } => run_init_config(path, force),
        Commands::Inspect { dir } => run_inspect(&dir),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_generate(
    config_path: Option<PathBuf>,
    seed: Option<u64>,
    samples: Option<usize>,
    seed_mode: Option<SeedModeArg>,
    output_dir: &Path,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ProbeConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ProbeConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(samples) = samples {
        config.n_samples = samples;
    }
    if let Some(mode) = seed_mode {
        config.seed_mode = mode.into();
    }
    config.validate()?;

    info!(output_dir = %output_dir.display(), "writing demo data");
    println!("Generating LSA-Probe demo data...");
    let output = run_generation(&config)?;
    let manifest = save_demo_data(&output, &config, output_dir)?;

    println!();
    for file in &manifest.files {
        println!("  wrote {file}");
    }
    println!();
    print_summary(output_dir, &config.fpr_targets)?;
    println!("Output directory: {}", output_dir.display());
    println!("Config hash:      {}", manifest.config_hash);
    println!("Total samples:    {}", manifest.total_samples);

    Ok(())
}

fn run_init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let toml_str = ProbeConfig::default().to_toml()?;
    match path {
        Some(path) => {
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            std::fs::write(&path, toml_str)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
        }
        None => print!("{toml_str}"),
    }
    Ok(())
}

fn run_inspect(dir: &Path) -> Result<()> {
    if !dir.exists() {
        bail!("data directory does not exist: {}", dir.display());
    }
    let manifest = load_manifest(dir)?;

    println!("Data directory: {}", dir.display());
    println!("  Schema version: {}", manifest.schema_version);
    println!("  Generated at:   {}", manifest.generated_at);
    println!("  Seed:           {} ({})", manifest.seed, manifest.seed_mode);
    println!("  Config hash:    {}", manifest.config_hash);
    println!("  Total samples:  {}", manifest.total_samples);
    println!();

    print_summary(dir, &manifest.fpr_targets)
}

fn print_summary(dir: &Path, fpr_targets: &[f64]) -> Result<()> {
    let costs = load_costs_table(dir)?;
    let roc = load_roc_table(dir)?;
    let rows = summarize(&costs, &roc, fpr_targets);
    if rows.is_empty() {
        println!("No timesteps found.");
    } else {
        println!("{}", format_summary(&rows));
    }
    Ok(())
}
