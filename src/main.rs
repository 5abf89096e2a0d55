//! SurveyTally - course-interest survey aggregator
//!
//! A CLI tool that turns a survey export into frequency tables, tallies
//! and per-cohort breakdowns, writes a JSON results document and a
//! Markdown report, and serves a read-only dashboard.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing input, schema mismatch, IO failure, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod server;
mod survey;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, Command, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use report::{ReportOptions, REPORT_FILE, RESULTS_FILE};
use server::{AppState, DashboardServer};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use survey::{load_table, SurveyStore};
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

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("SurveyTally v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match args.command {
        Command::Analyze(ref a) => run_analyze(&args, a.format),
        Command::Report(ref r) => run_report(&args, r.results.clone(), r.output.clone()),
        Command::Serve(_) => run_serve(&args).await,
        Command::InitConfig => Ok(()),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .surveytally.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to map column headers, stoplists, report limits, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load config, apply CLI overrides and validate.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        // An explicit path must load.
        Some(ref config_path) => {
            info!("Loading config from: {}", config_path.display());
            Config::load(config_path)?
        }
        None => match Config::load_default() {
            Ok(Some(config)) => {
                info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
                config
            }
            Ok(None) => {
                debug!("No config file found, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!("Failed to load config: {:#}", e);
                Config::default()
            }
        },
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

fn spinner(args: &Args, message: &str) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn report_options(config: &Config) -> ReportOptions {
    ReportOptions {
        title: config.report.title.clone(),
        max_table_rows: config.report.max_table_rows,
        max_suggestions: config.report.max_suggestions,
    }
}

/// Load the export, assemble the results document and write the outputs.
fn run_analyze(args: &Args, format: OutputFormat) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(args)?;
    let input = config.input_path();
    let output_dir = config.output_dir();

    // Step 1: Load the export
    println!("📥 Reading survey export: {}", input.display());
    let pb = spinner(args, "Loading responses...");
    let table = load_table(&input, &config.schema()?, &config.load_options());
    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }
    let table = table?;
    println!("   {} responses from {}", table.len(), table.source());
    if table.is_empty() {
        println!("   ⚠️  No responses found; every section will be empty");
    }

    let missing = table.schema().missing();
    if !missing.is_empty() {
        println!(
            "   ⚠️  {} expected column(s) not found; affected sections will be empty",
            missing.len()
        );
    }

    // Step 2: Aggregate
    println!("\n📊 Computing aggregations...");
    let pb = spinner(args, "Aggregating...");
    let doc = report::assemble(&table, &config.assembly_options(), Utc::now());
    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }
    for warning in &doc.meta.warnings {
        println!("   ⚠️  {}", warning);
    }

    // Step 3: Write outputs
    println!("\n📝 Writing outputs...");
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    if format.writes_json() {
        let path = output_dir.join(RESULTS_FILE);
        report::write_results(&doc, &path)?;
        info!("Results written to {}", path.display());
        println!("   ✅ {}", path.display());
    }

    if format.writes_markdown() {
        let path = output_dir.join(REPORT_FILE);
        let markdown = report::generate_markdown_report(&doc, &report_options(&config));
        report::write_atomic(&path, &markdown)?;
        info!("Report written to {}", path.display());
        println!("   ✅ {}", path.display());
    }

    println!(
        "\n✨ Done in {:.1}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Render report.md from an existing results document.
fn run_report(args: &Args, results: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(args)?;
    let output_dir = config.output_dir();
    let results = results.unwrap_or_else(|| output_dir.join(RESULTS_FILE));
    let output = output.unwrap_or_else(|| output_dir.join(REPORT_FILE));

    if !results.exists() {
        bail!(
            "{} not found; run `surveytally analyze` first",
            results.display()
        );
    }

    println!("📄 Reading results: {}", results.display());
    let doc = report::read_results(&results)?;

    let markdown = report::generate_markdown_report(&doc, &report_options(&config));
    report::write_atomic(&output, &markdown)?;
    info!("Report written to {}", output.display());
    println!("✅ Report saved to: {}", output.display());
    Ok(())
}

/// Load the export once and serve the dashboard until stopped.
async fn run_serve(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let input = config.input_path();

    println!("📥 Reading survey export: {}", input.display());
    let store = SurveyStore::open(input, config.schema()?, config.load_options())?;
    println!("   {} responses loaded", store.snapshot().len());

    let state = AppState {
        store,
        results_path: config.output_dir().join(RESULTS_FILE),
        options: config.assembly_options(),
        title: config.report.title.clone(),
    };

    println!("🌐 Dashboard at http://{}", config.server.bind);
    let server = DashboardServer::new(
        config.server.bind.clone(),
        config.server.request_timeout_ms,
        state,
    );
    server.run().await
}
