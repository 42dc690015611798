//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::MatchMode;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// covidlens - exploratory aggregates over the OWID COVID-19 dataset
///
/// Loads a case/death/population CSV export and produces global totals,
/// continent breakdowns, per-country infection and death rates, and a
/// single-country case study as a Markdown or JSON report.
///
/// Examples:
///   covidlens --data owid-covid-data.csv
///   covidlens --data owid-covid-data.csv --analysis global,continent-deaths
///   covidlens --data owid-covid-data.csv --analysis location --location "Costa Rica"
///   covidlens --data owid-covid-data.csv --location Rica --match substring --format json
///   covidlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the CSV dataset
    ///
    /// Can also be set via COVIDLENS_DATA env var or .covidlens.toml config.
    #[arg(short, long, value_name = "FILE", env = "COVIDLENS_DATA")]
    pub data: Option<PathBuf>,

    /// Analyses to run (comma-separated)
    ///
    /// Example: --analysis global,continent-cases,infection-rate
    #[arg(
        short,
        long,
        value_name = "ANALYSIS",
        value_delimiter = ',',
        default_value = "all"
    )]
    pub analysis: Vec<AnalysisKind>,

    /// Location for the single-location case study
    #[arg(short, long, value_name = "NAME")]
    pub location: Option<String>,

    /// How --location is matched against location names
    #[arg(long = "match", value_name = "MODE")]
    pub match_mode: Option<MatchMode>,

    /// Columns to include in the null audit (comma-separated)
    ///
    /// Example: --null-columns continent,population
    #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
    pub null_columns: Option<Vec<String>>,

    /// Rows shown per ranking in Markdown reports
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .covidlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .covidlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// An analysis that can be requested from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum AnalysisKind {
    /// Every analysis below
    All,
    /// Percentage of null values per column
    NullAudit,
    /// Worldwide cumulative cases and deaths
    Global,
    /// Total cases per continent
    ContinentCases,
    /// Total deaths per continent
    ContinentDeaths,
    /// Countries ranked by share of population infected
    InfectionRate,
    /// Countries ranked by share of population dead
    DeathRate,
    /// Countries ranked by deaths per million
    DeathsPerMillion,
    /// Day-by-day detail for one location
    Location,
}

impl AnalysisKind {
    /// Every concrete analysis, in report order.
    pub const CONCRETE: [AnalysisKind; 8] = [
        AnalysisKind::NullAudit,
        AnalysisKind::Global,
        AnalysisKind::ContinentCases,
        AnalysisKind::ContinentDeaths,
        AnalysisKind::InfectionRate,
        AnalysisKind::DeathRate,
        AnalysisKind::DeathsPerMillion,
        AnalysisKind::Location,
    ];
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The requested analyses with `all` expanded, deduplicated and in report order.
    pub fn selected_analyses(&self) -> Vec<AnalysisKind> {
        let mut selected: Vec<AnalysisKind> = if self.runs_all() {
            AnalysisKind::CONCRETE.to_vec()
        } else {
            self.analysis.clone()
        };

        selected.sort();
        selected.dedup();
        selected
    }

    /// Whether `all` was requested (explicitly or by default).
    pub fn runs_all(&self) -> bool {
        self.analysis.is_empty() || self.analysis.contains(&AnalysisKind::All)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if let Some(ref location) = self.location {
            if location.trim().is_empty() {
                return Err("--location must not be empty".to_string());
            }
        }

        // Validate dataset path if provided
        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Dataset does not exist: {}", data.display()));
            }
            if !data.is_file() {
                return Err(format!("Dataset path is not a file: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            data: None,
            analysis: vec![AnalysisKind::All],
            location: None,
            match_mode: None,
            null_columns: None,
            top: None,
            format: None,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_analysis_list() {
        let args = Args::try_parse_from([
            "covidlens",
            "--analysis",
            "global,continent-deaths",
            "--match",
            "substring",
        ])
        .unwrap();

        assert_eq!(
            args.analysis,
            vec![AnalysisKind::Global, AnalysisKind::ContinentDeaths]
        );
        assert_eq!(args.match_mode, Some(MatchMode::Substring));
        assert!(!args.runs_all());
    }

    #[test]
    fn test_default_runs_all() {
        let args = Args::try_parse_from(["covidlens"]).unwrap();

        assert!(args.runs_all());
        assert_eq!(args.selected_analyses(), AnalysisKind::CONCRETE.to_vec());
    }

    #[test]
    fn test_selected_analyses_dedup_and_order() {
        let mut args = make_args();
        args.analysis = vec![
            AnalysisKind::Location,
            AnalysisKind::Global,
            AnalysisKind::Location,
        ];

        assert_eq!(
            args.selected_analyses(),
            vec![AnalysisKind::Global, AnalysisKind::Location]
        );
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_top() {
        let mut args = make_args();
        args.top = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_dataset() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/nonexistent/owid-covid-data.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
