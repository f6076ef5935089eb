//! aact entrypoint: offline batch stages over alert dumps.
//! Each subcommand reads the previous stage's table; `run` chains them all.

use aact_features::{
    collectors::{drop_invalid, sort_by_timestamp},
    config::PipelineConfig,
    logging::StructuredLogger,
    pipeline::Pipeline,
    storage,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

/// Build labeled temporal feature matrices from AMiner/Wazuh alerts and evaluate a baseline.
#[derive(Parser, Debug)]
#[command(name = "aact")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, env = "AACT_CONFIG_PATH", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse every alert dump in a directory into one time-sorted table.
    Ingest {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Attach attack/benign labels using attack windows.
    Label {
        #[arg(long)]
        alerts: PathBuf,
        #[arg(long)]
        windows: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Build the static + temporal feature matrix from labeled alerts.
    Features {
        #[arg(long)]
        labeled: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Cross-validate the baseline classifier on a feature matrix.
    Evaluate {
        #[arg(long)]
        features: PathBuf,
        /// Overrides the configured number of folds.
        #[arg(long)]
        splits: Option<usize>,
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// All stages; writes every table and the report into the output directory.
    Run {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        windows: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn cmd_ingest(pipeline: &Pipeline, input_dir: &Path, output: &Path) -> CliResult {
    let (records, report) = pipeline.ingest(input_dir)?;
    if report.files_read == 0 {
        tracing::warn!(dir = %input_dir.display(), "no alert files read");
    }
    storage::write_alerts(output, &records)?;
    print_line(&report)
}

fn cmd_label(pipeline: &Pipeline, alerts: &Path, windows: &Path, output: &Path) -> CliResult {
    let records = storage::read_alerts(alerts)?;
    let (mut records, dropped) = drop_invalid(records);
    sort_by_timestamp(&mut records);
    let windows = storage::read_attack_windows(windows)?;
    let summary = pipeline.label(&mut records, windows);
    storage::write_alerts(output, &records)?;
    if dropped > 0 {
        info!(dropped, "rows without timestamp dropped before labeling");
    }
    print_line(&summary)
}

fn cmd_features(pipeline: &Pipeline, labeled: &Path, output: &Path) -> CliResult {
    let records = storage::read_alerts(labeled)?;
    let matrix = pipeline.features(records)?;
    storage::write_feature_matrix(output, &matrix)?;
    print_line(&serde_json::json!({
        "rows": matrix.n_rows(),
        "columns": matrix.n_cols(),
        "positives": matrix.positives(),
        "matrix_sha256": matrix.digest(),
    }))
}

fn cmd_evaluate(
    pipeline: &Pipeline,
    features: &Path,
    splits: Option<usize>,
    report_path: Option<&Path>,
) -> CliResult {
    let matrix = storage::read_feature_matrix(features)?;
    let report = match splits {
        Some(n) => {
            let mut config = pipeline.config().clone();
            config.eval.n_splits = n;
            Pipeline::new(config).evaluate(&matrix)?
        }
        None => pipeline.evaluate(&matrix)?,
    };
    if let Some(path) = report_path {
        storage::write_json(path, &report)?;
        info!(path = %path.display(), "report written");
    }
    print_line(&serde_json::json!({
        "fold_roc_auc": report.fold_aucs(),
        "mean_roc_auc": report.mean_roc_auc,
    }))
}

fn print_line(value: &impl serde::Serialize) -> CliResult {
    StructuredLogger::emit_json(value, &mut std::io::stdout().lock())?;
    Ok(())
}

fn main() -> CliResult {
    let cli = Cli::parse();
    let config = PipelineConfig::load(&cli.config);
    StructuredLogger::init(config.log.json, &config.log.level);
    info!(
        config = %cli.config.display(),
        window_secs = config.features.window_secs,
        "aact starting"
    );

    let pipeline = Pipeline::new(config);
    match &cli.command {
        Commands::Ingest { input_dir, output } => cmd_ingest(&pipeline, input_dir, output),
        Commands::Label { alerts, windows, output } => {
            cmd_label(&pipeline, alerts, windows, output)
        }
        Commands::Features { labeled, output } => cmd_features(&pipeline, labeled, output),
        Commands::Evaluate { features, splits, report } => {
            cmd_evaluate(&pipeline, features, *splits, report.as_deref())
        }
        Commands::Run { input_dir, windows, out_dir } => {
            let summary = pipeline.run(input_dir, windows, out_dir)?;
            info!(rows = summary.rows, digest = %summary.matrix_sha256, "run complete");
            print_line(&summary)
        }
    }
}
