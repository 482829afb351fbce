//! prodreport - operator productivity reports from shared spreadsheets
//!
//! A CLI tool that synchronizes the PPL, Convenios, RIPS and Facturacion
//! sheets into a local snapshot cache and reports per-operator productivity
//! under date, category and operator filters.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid date range, config, missing spreadsheet id, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod source;
mod state;

use analysis::{active_days, top_operators, Orchestrator};
use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{
    AggregationResult, FilterState, OperatorSelection, Report, ReportMetadata, ViewOutcome,
    ViewSection,
};
use source::{load_cached_snapshot, synchronize, CacheStore, SheetSource, SourceStatus};
use state::AppState;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Logging depends on `general.verbose`, so config loads first
    let (mut config, config_origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("prodreport v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_origin);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config).await {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .prodreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Set [source].spreadsheet_id, then run with --sync.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the snapshot, compute every requested view and write the report.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let today = Local::now().date_naive();
    let range = args.date_range(today, config.general.lookback_days)?;
    let filters = FilterState::new(
        config.filters.categories.iter().copied().collect(),
        args.operator_selection(),
        range,
    );
    debug!("Filters: {:?}", filters);

    // Step 1: Startup load from the snapshot cache
    let cache = config
        .cache
        .enabled
        .then(|| CacheStore::new(config.cache.dir.clone()));
    match &cache {
        Some(cache) => info!("Snapshot cache: {}", cache.dir().display()),
        None => info!("Snapshot cache disabled"),
    }
    let (snapshot, statuses) = load_cached_snapshot(cache.as_ref());
    let mut state = AppState::new(snapshot);

    // Step 2: Optional synchronization
    if args.sync {
        if config.source.spreadsheet_id.is_empty() {
            bail!(
                "--sync needs a spreadsheet id (--spreadsheet-id, PRODREPORT_SPREADSHEET_ID or [source].spreadsheet_id in {})",
                CONFIG_FILE_NAME
            );
        }

        println!("🔄 Synchronizing sources...");
        let sheets = SheetSource::new(&config.source)?;
        let (snapshot, statuses) =
            synchronize(&sheets, &config.source, cache.as_ref(), !args.quiet).await;
        state.replace(snapshot);
        print_statuses(&statuses);
    } else if !args.quiet {
        println!("📂 Loaded cached snapshot:");
        print_statuses(&statuses);
    }

    let snapshot = state.snapshot();
    let orchestrator = Orchestrator::new(&config.schema);
    let known_operators = orchestrator.known_operators(&snapshot);

    // Handle --list-operators: print and exit
    if args.list_operators {
        return handle_list_operators(&known_operators);
    }

    warn_unknown_operators(&filters.operators, &known_operators);

    // Step 3: Compute the views
    println!("\n📊 Computing views...");
    let sections = orchestrator.compute_views(&snapshot, &args.views(), &filters);

    // Step 4: Build and save the report
    let report = Report {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            filters,
            synchronized: args.sync,
            loaded_sources: snapshot.loaded_sources(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        sections,
        known_operators: known_operators.into_iter().collect(),
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = output_path(&args, &config);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📋 Summary:");
    for section in &report.sections {
        print_section_summary(section);
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!(
        "\n✅ Report complete! Saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Returns the configuration together with a description of where it came from.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, format!("loaded from {}", config_path.display())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, format!("loaded from {}", CONFIG_FILE_NAME))),
        Ok(None) => Ok((Config::default(), "defaults (no config file)".to_string())),
        Err(e) => Ok((
            Config::default(),
            format!("defaults ({} ignored: {:#})", CONFIG_FILE_NAME, e),
        )),
    }
}

/// The report path, switching the default extension for JSON output.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if args.output.is_none()
        && args.format == OutputFormat::Json
        && path.extension().is_some_and(|ext| ext == "md")
    {
        return path.with_extension("json");
    }
    path
}

fn print_statuses(statuses: &[SourceStatus]) {
    for status in statuses {
        println!("   {:<12} {}", status.kind.to_string(), status.origin);
    }
}

/// Handle --list-operators: print every known operator.
fn handle_list_operators(known: &BTreeSet<String>) -> Result<()> {
    if known.is_empty() {
        println!("\nNo operators found. Run with --sync to load data.");
        return Ok(());
    }

    println!("\n👥 {} operators:\n", known.len());
    for operator in known {
        println!("   {}", operator);
    }
    Ok(())
}

fn warn_unknown_operators(selection: &OperatorSelection, known: &BTreeSet<String>) {
    if let OperatorSelection::Only(names) = selection {
        for name in names.iter().filter(|n| !known.contains(*n)) {
            warn!("Operator '{}' does not appear in the loaded data", name);
        }
    }
}

fn print_section_summary(section: &ViewSection) {
    match &section.outcome {
        ViewOutcome::NoData { .. } => {
            println!("   {}: no data (run with --sync)", section.title);
        }
        ViewOutcome::CannotProcess { reason } => {
            println!("   {}: ⛔ {}", section.title, reason);
        }
        ViewOutcome::EmptyAfterFilter => {
            println!("   {}: no records match the filters", section.title);
        }
        ViewOutcome::Ready(view) => match &view.result {
            AggregationResult::Ranking(ranking) => {
                let leaders: Vec<String> = top_operators(ranking, 3)
                    .iter()
                    .map(|row| format!("{} {:.2}%", row.operator, row.percentage))
                    .collect();
                println!(
                    "   {}: {} records, top: {}",
                    section.title,
                    view.total_records,
                    leaders.join(", ")
                );
            }
            AggregationResult::TimeSeries(series) => {
                println!(
                    "   {}: {} records, {} operators over {} active days",
                    section.title,
                    view.total_records,
                    series.summary.len(),
                    active_days(series)
                );
            }
        },
    }
}
