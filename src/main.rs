//! covidlens - exploratory aggregates over the OWID COVID-19 dataset
//!
//! A CLI tool that loads a case/death/population CSV export, derives
//! global, continent and per-country summaries, and writes them as a
//! Markdown or JSON report with short written conclusions.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, load failure, empty dataset, unknown column, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{AnalysisKind, Args, OutputFormat};
use config::Config;
use error::AnalysisError;
use models::{Counter, Findings, LocationFilter, Report, ReportMetadata, Row};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
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

    // Load configuration first so `[general] verbose` can set the log level
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("covidlens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    config_source.log();

    if let Err(e) = run_exploration(&args, config) {
        error!("Exploration failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .covidlens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!(
        "✅ Created {} with default settings.",
        config::CONFIG_FILE_NAME
    );
    println!("   Edit it to set the dataset path, audited columns and case-study location.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete load, analyse, report workflow.
fn run_exploration(args: &Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let data_path = config.data.path.clone().context(
        "No dataset given: pass --data, set COVIDLENS_DATA, or add [data] path to .covidlens.toml",
    )?;

    let lenient = args.runs_all();
    let mut analyses = args.selected_analyses();
    let case_study = config.case_study.filter();

    require_case_study(&mut analyses, case_study.as_ref(), lenient)?;

    // Step 1: Load the dataset
    println!("📥 Loading dataset: {}", data_path.display());
    let dataset = loader::load_csv(
        &data_path,
        &loader::LoadOptions {
            show_progress: !args.quiet,
        },
    )?;

    // Step 2: Run the requested analyses
    println!("\n🔬 Running {} analyses...", analyses.len());
    let findings = run_analyses(
        &dataset.rows,
        &analyses,
        &config,
        case_study.as_ref(),
        lenient,
    )?;

    for section in report::empty_sections(&findings) {
        warn!("Analysis '{}' produced no rows", section);
    }

    // Step 3: Build the report
    println!("\n📝 Generating report...");
    let conclusions = analysis::summarize(&findings);

    let report = Report {
        metadata: ReportMetadata {
            dataset: data_path.display().to_string(),
            analysis_date: Utc::now(),
            rows_loaded: dataset.rows.len(),
            rows_skipped: dataset.skipped,
            case_study: findings.location_detail.as_ref().and(case_study.clone()),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        findings,
        conclusions,
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, config.general.top_n),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Exploration Summary:");
    println!("   Rows loaded: {}", report.metadata.rows_loaded);
    if report.metadata.rows_skipped > 0 {
        println!("   Rows skipped: {}", report.metadata.rows_skipped);
    }
    for conclusion in &report.conclusions {
        println!("   - {}", conclusion);
    }
    println!(
        "   Duration: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    println!(
        "\n✅ Exploration complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Drop or reject the location analysis when no case-study location is set.
///
/// Under `all` it is skipped with a warning; an explicit request fails.
fn require_case_study(
    analyses: &mut Vec<AnalysisKind>,
    case_study: Option<&LocationFilter>,
    lenient: bool,
) -> Result<()> {
    if case_study.is_some() || !analyses.contains(&AnalysisKind::Location) {
        return Ok(());
    }

    if !lenient {
        bail!("The location analysis needs --location or a [case_study] location in the config");
    }

    warn!("No case-study location configured; skipping location analysis");
    analyses.retain(|kind| *kind != AnalysisKind::Location);
    Ok(())
}

/// Run each selected analysis against the loaded rows.
///
/// With `lenient` set (the implicit `all` run), a dataset without a "World"
/// aggregate skips the global section instead of failing.
fn run_analyses(
    rows: &[Row],
    analyses: &[AnalysisKind],
    config: &Config,
    case_study: Option<&LocationFilter>,
    lenient: bool,
) -> Result<Findings> {
    let mut findings = Findings::default();

    for kind in analyses {
        debug!("Running analysis: {:?}", kind);

        match kind {
            AnalysisKind::All => {}
            AnalysisKind::NullAudit => {
                findings.null_audit = Some(analysis::null_audit(rows, &config.audit.null_columns)?);
            }
            AnalysisKind::Global => match analysis::global_totals(rows) {
                Ok(totals) => findings.global_totals = Some(totals),
                Err(e @ AnalysisError::NoWorldRow { .. }) if lenient => {
                    warn!("Skipping global numbers: {}", e);
                }
                Err(e) => return Err(e.into()),
            },
            AnalysisKind::ContinentCases => {
                findings.continent_cases = Some(analysis::continent_rollup(rows, Counter::Cases));
            }
            AnalysisKind::ContinentDeaths => {
                findings.continent_deaths = Some(analysis::continent_rollup(rows, Counter::Deaths));
            }
            AnalysisKind::InfectionRate => {
                findings.infection_rates = Some(analysis::rate_ranking(rows, Counter::Cases));
            }
            AnalysisKind::DeathRate => {
                findings.death_rates = Some(analysis::rate_ranking(rows, Counter::Deaths));
            }
            AnalysisKind::DeathsPerMillion => {
                findings.deaths_per_million = Some(analysis::per_million_ranking(rows));
            }
            AnalysisKind::Location => {
                if let Some(filter) = case_study {
                    findings.location_detail = Some(analysis::location_detail(rows, filter));
                }
            }
        }
    }

    Ok(findings)
}

/// Where the configuration came from, reported once logging is up.
#[derive(Debug)]
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    /// The default file exists but could not be loaded.
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => {
                info!("Loaded default config from {}", config::CONFIG_FILE_NAME)
            }
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_reader, LoadOptions};

    const FIXTURE: &str = include_str!("../fixtures/owid_sample.csv");

    fn fixture_rows() -> Vec<Row> {
        load_reader(FIXTURE.as_bytes(), &LoadOptions::default())
            .unwrap()
            .rows
    }

    #[test]
    fn test_run_all_analyses_on_fixture() {
        let rows = fixture_rows();
        let filter = LocationFilter::exact("Costa Rica");

        let findings = run_analyses(
            &rows,
            &AnalysisKind::CONCRETE,
            &Config::default(),
            Some(&filter),
            true,
        )
        .unwrap();

        assert!(findings.null_audit.is_some());
        let world = findings.global_totals.as_ref().unwrap();
        let continent_sum: f64 = findings
            .continent_cases
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.total)
            .sum();
        assert_eq!(continent_sum, world.total_cases);

        let detail = findings.location_detail.as_ref().unwrap();
        assert!(detail.iter().all(|d| d.location == "Costa Rica"));
        assert!(!findings
            .infection_rates
            .as_ref()
            .unwrap()
            .iter()
            .any(|r| r.location == "Atlantis"));
    }

    #[test]
    fn test_missing_world_is_lenient_only_for_all() {
        let rows: Vec<Row> = fixture_rows()
            .into_iter()
            .filter(|r| r.location != "World")
            .collect();

        let lenient = run_analyses(&rows, &[AnalysisKind::Global], &Config::default(), None, true)
            .unwrap();
        assert!(lenient.global_totals.is_none());

        let strict = run_analyses(&rows, &[AnalysisKind::Global], &Config::default(), None, false);
        assert!(strict.is_err());
    }

    #[test]
    fn test_missing_case_study_skipped_under_all() {
        let mut analyses = AnalysisKind::CONCRETE.to_vec();

        require_case_study(&mut analyses, None, true).unwrap();

        assert!(!analyses.contains(&AnalysisKind::Location));
        assert_eq!(analyses.len(), AnalysisKind::CONCRETE.len() - 1);
    }

    #[test]
    fn test_missing_case_study_fails_when_requested() {
        let mut analyses = vec![AnalysisKind::Global, AnalysisKind::Location];

        let err = require_case_study(&mut analyses, None, false).unwrap_err();

        assert!(err.to_string().contains("--location"));
        assert_eq!(analyses.len(), 2);
    }

    #[test]
    fn test_configured_case_study_keeps_location() {
        let filter = LocationFilter::substring("Rica");
        let mut analyses = vec![AnalysisKind::Location];

        require_case_study(&mut analyses, Some(&filter), false).unwrap();

        assert_eq!(analyses, vec![AnalysisKind::Location]);
    }

    #[test]
    fn test_unknown_null_column_fails() {
        let rows = fixture_rows();
        let mut config = Config::default();
        config.audit.null_columns = vec!["icu_patients".to_string()];

        let err = run_analyses(&rows, &[AnalysisKind::NullAudit], &config, None, true)
            .unwrap_err();
        assert!(err.to_string().contains("icu_patients"));
    }
}
