//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.covidlens.toml` files.

use crate::cli::OutputFormat;
use crate::models::{LocationFilter, MatchMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".covidlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Null audit settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Single-location case study settings.
    #[serde(default)]
    pub case_study: CaseStudyConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Rows shown per ranking in Markdown reports.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            verbose: false,
            top_n: default_top_n(),
        }
    }
}

fn default_output() -> String {
    "covidlens_report.md".to_string()
}

fn default_top_n() -> usize {
    20
}

/// Dataset location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the CSV export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Null audit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Columns to audit.
    #[serde(default = "default_null_columns")]
    pub null_columns: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            null_columns: default_null_columns(),
        }
    }
}

fn default_null_columns() -> Vec<String> {
    vec![
        "continent",
        "population",
        "total_cases",
        "total_deaths",
        "total_deaths_per_million",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Case study settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseStudyConfig {
    /// Location name or pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// How `location` is matched.
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl CaseStudyConfig {
    /// The configured location filter, if a location is set.
    pub fn filter(&self) -> Option<LocationFilter> {
        self.location.as_ref().map(|pattern| match self.match_mode {
            MatchMode::Exact => LocationFilter::exact(pattern.as_str()),
            MatchMode::Substring => LocationFilter::substring(pattern.as_str()),
        })
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = Some(data.clone());
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(top) = args.top {
            self.general.top_n = top;
        }

        if let Some(ref columns) = args.null_columns {
            self.audit.null_columns = columns.clone();
        }

        if let Some(ref location) = args.location {
            self.case_study.location = Some(location.clone());
        }
        if let Some(mode) = args.match_mode {
            self.case_study.match_mode = mode;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let mut config = Config::default();
        config.case_study.location = Some("Costa Rica".to_string());
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
