//! sessiontrace CLI - prepare session datasets from check-in dumps
//!
//! Usage:
//!   sessiontrace-cli gowalla <trace> --output <file.json> [--min-checkins N] [--users N]
//!   sessiontrace-cli foursquare <trace> [--venues <file>] --output <file.json>
//!
//! Loads a raw dump, runs filtering, segmentation, dictionary building and
//! statistics, prints a summary and writes the dataset as JSON.

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sessiontrace::loader::{load_coordinates, load_foursquare_file, load_gowalla_file};
use sessiontrace::{
    DatasetVariant, LoadReport, Pipeline, PipelineConfig, PipelineReport, Result,
    FOURSQUARE_DELIMITER,
};

#[derive(Parser)]
#[command(name = "sessiontrace-cli")]
#[command(about = "Prepare per-user session datasets from check-in logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a tab-delimited Gowalla dump (newest check-in first per user)
    Gowalla {
        /// Check-in dump to load
        trace: PathBuf,

        /// Minimum check-ins per user (inclusive)
        #[arg(long)]
        min_checkins: Option<usize>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Process a Foursquare tweet dump
    Foursquare {
        /// Check-in dump to load
        trace: PathBuf,

        /// Side file with venue coordinates (defaults to the trace itself)
        #[arg(long)]
        venues: Option<PathBuf>,

        /// Users need more check-ins than this
        #[arg(long)]
        trace_min: Option<usize>,

        /// Locations need more global visits than this
        #[arg(long)]
        global_visit: Option<usize>,

        /// Check-ins closer than this many minutes are dropped
        #[arg(long)]
        min_gap: Option<u32>,

        /// Field delimiter of the dump
        #[arg(long, default_value_t = FOURSQUARE_DELIMITER)]
        delimiter: char,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Output JSON file
    #[arg(short, long)]
    output: PathBuf,

    /// JSON file with a full configuration (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum users to admit (0 = all)
    #[arg(long)]
    users: Option<usize>,

    /// Maximum interval in hours between two check-ins of a session
    #[arg(long)]
    hour_gap: Option<u32>,

    /// Sessions holding more visits than this are closed
    #[arg(long)]
    session_max: Option<usize>,

    /// Minimum visits per session
    #[arg(long)]
    session_min: Option<usize>,

    /// Minimum surviving sessions per user
    #[arg(long)]
    sessions_min: Option<usize>,

    /// Train/test ratio
    #[arg(long)]
    train_split: Option<f64>,

    /// Abort on the first per-user statistics error
    #[arg(long)]
    strict: bool,
}

impl CommonArgs {
    fn resolve(&self, variant: DatasetVariant) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::for_variant(variant),
        };
        config.variant = variant;
        if let Some(v) = self.users {
            config.max_users = v;
        }
        if let Some(v) = self.hour_gap {
            config.hour_gap = v;
        }
        if let Some(v) = self.session_max {
            config.session_max = v;
        }
        if let Some(v) = self.session_min {
            config.session_min = v;
        }
        if let Some(v) = self.sessions_min {
            config.sessions_count_min = v;
        }
        if let Some(v) = self.train_split {
            config.train_split = v;
        }
        config.strict |= self.strict;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Gowalla {
            trace,
            min_checkins,
            common,
        } => {
            let mut config = common.resolve(DatasetVariant::Gowalla)?;
            if let Some(v) = min_checkins {
                config.min_checkins = v;
            }
            let pipeline = Pipeline::new(config)?;
            print_parameters(pipeline.config());

            let load = load_gowalla_file(&trace)?;
            process(&pipeline, load, &common.output)
        }
        Commands::Foursquare {
            trace,
            venues,
            trace_min,
            global_visit,
            min_gap,
            delimiter,
            common,
        } => {
            let mut config = common.resolve(DatasetVariant::Foursquare)?;
            if let Some(v) = trace_min {
                config.trace_len_min = v;
            }
            if let Some(v) = global_visit {
                config.location_global_visit_min = v;
            }
            if let Some(v) = min_gap {
                config.min_gap = Some(v);
            }
            let pipeline = Pipeline::new(config)?;
            print_parameters(pipeline.config());

            let mut load = load_foursquare_file(&trace, delimiter)?;
            if let Some(path) = venues {
                let file = std::fs::File::open(&path)?;
                load.coordinates = load_coordinates(std::io::BufReader::new(file), delimiter)?.coordinates;
            }
            process(&pipeline, load, &common.output)
        }
    }
}

fn process(pipeline: &Pipeline, load: LoadReport, output: &Path) -> Result<()> {
    println!("\n{}", "=".repeat(60));
    println!(
        "Loaded {} check-ins ({} skipped) from {} users",
        load.loaded(),
        load.skipped,
        load.traces.len()
    );
    println!("{}", "=".repeat(60));

    let (dataset, report) = pipeline.run(&load.traces, &load.coordinates)?;
    print_report(&report);

    dataset.save_json(output)?;
    println!("\nSaved dataset to {}", output.display());
    Ok(())
}

fn print_parameters(config: &PipelineConfig) {
    println!("############ PARAMETER SETTINGS:");
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(config) {
        for (key, value) in map {
            println!("  {}: {}", key, value);
        }
    }
}

fn print_report(report: &PipelineReport) {
    println!(
        "\nraw users: {}  raw locations: {}",
        report.raw_users, report.raw_locations
    );
    println!(
        "admitted users: {}  excluded (too few sessions): {}",
        report.admitted_users, report.excluded_users
    );
    println!(
        "final users: {}  final locations: {}",
        report.final_users, report.final_locations
    );
    if !report.failed_users.is_empty() {
        println!("\n{} users excluded by statistics errors:", report.failed_users.len());
        for e in report.failed_users.iter().take(10) {
            println!("  [ERR] {}", e);
        }
    }
    if report.unmapped_locations > 0 {
        println!("{} locations missing from the coordinate lookup", report.unmapped_locations);
    }
}
