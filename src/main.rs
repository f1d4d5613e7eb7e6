use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::{settings::Style, Table, Tabled};

use trainload::coaching::{CoachingContext, SessionGoal};
use trainload::config::AppConfig;
use trainload::error::{describe_failure, ErrorSeverity};
use trainload::export::{self, ExportFormat};
use trainload::import::ImportManager;
use trainload::logging::init_logging;
use trainload::summary::{primary_sport_label, SummaryCalculator};
use trainload::{
    validate_batch, ActivityRecord, DateRange, EngineReport, LoadEstimator, ReadinessBand,
    TrainingLoadEngine, TrainingStatus,
};

/// trainload - Training Load Analytics CLI
///
/// Estimates per-activity training stress, tracks long-horizon fitness and
/// short-horizon fatigue, and reports whether the athlete is primed,
/// productive or fatigued.
#[derive(Parser)]
#[command(name = "trainload")]
#[command(version)]
#[command(about = "Training Load Analytics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Date window selection shared by the analysis commands
#[derive(clap::Args, Debug)]
struct WindowArgs {
    /// Window start (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Window end (YYYY-MM-DD), defaults to today
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Trailing window length in days ending at --to
    #[arg(short, long, conflicts_with = "from")]
    days: Option<u32>,

    /// Calendar year to date
    #[arg(long, conflicts_with_all = ["from", "days"])]
    ytd: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the fitness/fatigue series and current training status
    Analyze {
        /// Activity export (JSON or CSV) or a directory of them
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        window: WindowArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the series to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of most recent days shown in the table
        #[arg(short, long, default_value = "14")]
        limit: usize,
    },

    /// Monthly volume, year-to-date totals and primary sport
    Summary {
        /// Activity export (JSON or CSV) or a directory of them
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the workout-generation prompt for the current status
    Prompt {
        /// Activity export (JSON or CSV) or a directory of them
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        window: WindowArgs,

        /// Session goal (base, threshold, vo2, recovery)
        #[arg(short, long, default_value = "base")]
        goal: SessionGoal,

        /// Session length in minutes (30-120)
        #[arg(short, long, default_value = "60")]
        minutes: u32,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (severity, message) = describe_failure(&err);
            match severity {
                ErrorSeverity::Warning => tracing::warn!(error = %format!("{:#}", err), "Command failed"),
                ErrorSeverity::Error | ErrorSeverity::Critical => {
                    tracing::error!(error = %format!("{:#}", err), "Command failed")
                }
            }
            eprintln!("{} {}", "Error:".red().bold(), message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(Some(&config_path))
        .with_context(|| format!("Refusing to use config {}", config_path.display()))?;

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Analyze {
            file,
            window,
            format,
            output,
            limit,
        } => {
            let engine = TrainingLoadEngine::with_config(config.engine_config())
                .context("Invalid engine configuration")?;
            let range = resolve_window(&window, &config);
            let raw = importer(&config)
                .import_path(&file)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            let report = engine.analyze_raw(raw, Some(&range))?;

            match (output, format) {
                (Some(path), OutputFormat::Table) => {
                    let inferred = ExportFormat::from_path(&path).with_context(|| {
                        format!("Cannot infer export format from {}, pass --format", path.display())
                    })?;
                    export::export_report(&report, inferred, &path)?;
                    print_status(&report);
                    println!("{}", format!("✓ Exported to {}", path.display()).green());
                }
                (Some(path), format) => {
                    export::export_report(&report, export_format(format), &path)?;
                    println!("{}", format!("✓ Exported to {}", path.display()).green());
                }
                (None, OutputFormat::Table) => {
                    print_window(&range);
                    print_series_table(&report, limit);
                    print_status(&report);
                }
                (None, format) => {
                    export::write_report(&report, export_format(format), std::io::stdout().lock())?;
                }
            }
        }

        Commands::Summary { file } => {
            let records = load_records(&file, &config)?;
            let calculator = SummaryCalculator::new(LoadEstimator::with_config(config.estimator.clone()));
            print_summary(&calculator, &records, Local::now().date_naive());
        }

        Commands::Prompt {
            file,
            window,
            goal,
            minutes,
        } => {
            let engine = TrainingLoadEngine::with_config(config.engine_config())
                .context("Invalid engine configuration")?;
            let range = resolve_window(&window, &config);
            let records = load_records(&file, &config)?;
            let in_window: Vec<ActivityRecord> =
                range.filter_records(&records).into_iter().cloned().collect();

            let report = engine.analyze_window(&records, &range)?;
            let key = engine.cache_key(&in_window)?;
            tracing::debug!(key = %key, "Report cache key");

            let context = CoachingContext::build(&in_window, &report, goal, minutes)?;
            println!("{}", context.to_prompt());
        }

        Commands::Config { list, set, get } => {
            if list {
                println!("{}", format!("Configuration ({})", config_path.display()).bold());
                for (key, value) in config.list() {
                    println!("  {} = {}", key.cyan(), value);
                }
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .context("Expected key=value")?;
                config.set(key.trim(), value)?;
                config.save_to_file(&config_path)?;
                println!("{}", format!("✓ {} updated", key.trim()).green());
            } else if let Some(key) = get {
                match config.get(&key) {
                    Some(value) => println!("{}", value),
                    None => anyhow::bail!("Unknown configuration key: {}", key),
                }
            } else {
                println!("Use --list, --get <key> or --set <key=value>");
            }
        }
    }

    Ok(())
}

fn export_format(format: OutputFormat) -> ExportFormat {
    match format {
        OutputFormat::Csv => ExportFormat::Csv,
        OutputFormat::Json | OutputFormat::Table => ExportFormat::Json,
    }
}

/// Explicit flags win; otherwise the configured trailing window ending today
fn resolve_window(args: &WindowArgs, config: &AppConfig) -> DateRange {
    let today = Local::now().date_naive();
    let end = args.to.unwrap_or(today);

    if args.ytd {
        DateRange::year_to_date(end)
    } else if let Some(days) = args.days {
        DateRange::trailing_days(end, days)
    } else if args.from.is_some() {
        DateRange::new(args.from, Some(end))
    } else {
        DateRange::trailing_days(end, config.import.default_window_days)
    }
}

fn importer(config: &AppConfig) -> ImportManager {
    ImportManager::new().with_directory_extensions(&config.import.supported_formats)
}

fn load_records(path: &Path, config: &AppConfig) -> Result<Vec<ActivityRecord>> {
    let raw = importer(config)
        .import_path(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    Ok(validate_batch(raw)?)
}

fn print_window(range: &DateRange) {
    let show = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "…".to_string());
    println!(
        "{}",
        format!("Window {} → {}", show(range.start), show(range.end)).dimmed()
    );
}

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Load")]
    load: Decimal,
    #[tabled(rename = "Fitness")]
    fitness: Decimal,
    #[tabled(rename = "Fatigue")]
    fatigue: Decimal,
    #[tabled(rename = "Form")]
    form: Decimal,
}

fn print_series_table(report: &EngineReport, limit: usize) {
    if report.is_empty() {
        println!("{}", "No activities in the selected window".yellow());
        return;
    }

    let skip = report.series.len().saturating_sub(limit);
    let rows: Vec<SeriesRow> = report.series[skip..]
        .iter()
        .map(|p| SeriesRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            load: p.load.round_dp(1),
            fitness: p.fitness.round_dp(1),
            fatigue: p.fatigue.round_dp(1),
            form: p.form.round_dp(1),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn print_status(report: &EngineReport) {
    let label = match report.status {
        TrainingStatus::Ready(ReadinessBand::Primed) => report.status.label().green().bold(),
        TrainingStatus::Ready(ReadinessBand::Productive) => report.status.label().yellow().bold(),
        TrainingStatus::Ready(ReadinessBand::Fatigued) => report.status.label().red().bold(),
        TrainingStatus::InsufficientData => report.status.label().dimmed(),
    };

    match (&report.current, report.status.band()) {
        (Some(point), Some(band)) => {
            println!(
                "Fitness {}  Fatigue {}  Form {}",
                point.fitness.round_dp(1),
                point.fatigue.round_dp(1),
                point.form.round_dp(1)
            );
            println!("Status: {}  {}", label, band.recommendation().dimmed());
        }
        _ => println!("Status: {}", label),
    }
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Activities")]
    activities: u32,
    #[tabled(rename = "Distance (km)")]
    distance_km: Decimal,
    #[tabled(rename = "Time (h)")]
    hours: Decimal,
    #[tabled(rename = "Elevation (m)")]
    elevation_m: Decimal,
    #[tabled(rename = "Load")]
    load: Decimal,
}

fn print_summary(calculator: &SummaryCalculator, records: &[ActivityRecord], today: NaiveDate) {
    println!("{}", "Monthly volume".bold());
    let rows: Vec<MonthRow> = calculator
        .monthly_summaries(records)
        .into_iter()
        .map(|m| MonthRow {
            month: m.month_name,
            activities: m.totals.activity_count,
            distance_km: m.totals.distance_km.round_dp(1),
            hours: m.totals.moving_time_hours.round_dp(1),
            elevation_m: m.totals.elevation_gain_m.round_dp(0),
            load: m.totals.total_load.round_dp(0),
        })
        .collect();

    if rows.is_empty() {
        println!("{}", "No activities found".yellow());
    } else {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    let ytd = calculator.year_to_date(records, today);
    println!();
    println!("{}", "Year to date".bold());
    println!(
        "  {} activities, {} km, {} h, {} m climbing",
        ytd.activity_count,
        ytd.distance_km.round_dp(1),
        ytd.moving_time_hours.round_dp(1),
        ytd.elevation_gain_m.round_dp(0)
    );

    if let Some(last) = calculator.cumulative_distance(records).last() {
        println!("  Lifetime distance: {} km", last.cumulative_km.round_dp(1));
    }
    println!("  Primary sport: {}", primary_sport_label(records).cyan());
}
