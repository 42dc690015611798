//! Dataset loader for OWID-style COVID-19 CSV exports.
//!
//! This module reads a headered CSV into memory and resolves the loosely
//! typed numeric columns once, so analyses never re-parse text.

use crate::models::{Numeric, Row};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Date formats accepted in the `date` column.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Options for loading a dataset.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Show a spinner while reading records.
    pub show_progress: bool,
}

/// Rows loaded into memory, plus load statistics.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub rows: Vec<Row>,
    /// Records skipped for an empty location, an unparseable date or
    /// invalid UTF-8.
    pub skipped: usize,
}

/// Header positions of the columns the loader understands.
#[derive(Debug, Clone, Copy)]
struct HeaderIndex {
    continent: Option<usize>,
    location: usize,
    date: usize,
    population: Option<usize>,
    total_cases: Option<usize>,
    total_deaths: Option<usize>,
    total_deaths_per_million: Option<usize>,
}

impl HeaderIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let Some(location) = find("location") else {
            bail!("CSV is missing required column 'location'");
        };
        let Some(date) = find("date") else {
            bail!("CSV is missing required column 'date'");
        };

        Ok(Self {
            continent: find("continent"),
            location,
            date,
            population: find("population"),
            total_cases: find("total_cases"),
            total_deaths: find("total_deaths"),
            total_deaths_per_million: find("total_deaths_per_million"),
        })
    }
}

/// Load a dataset from a CSV file on disk.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<LoadedDataset> {
    info!("Loading dataset from: {}", path.display());

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open dataset: {}", path.display()))?;

    load_reader(file, options)
        .with_context(|| format!("Failed to load dataset: {}", path.display()))
}

/// Load a dataset from any CSV reader.
pub fn load_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<LoadedDataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .context("Failed to read CSV header")?
        .clone();
    let index = HeaderIndex::from_headers(&headers)?;
    debug!("Header index: {:?}", index);

    let pb = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} rows {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    // Decoded per record: invalid UTF-8 skips only its own line.
    for (i, record) in csv_reader.byte_records().enumerate() {
        // Line 1 is the header.
        let line = i + 2;
        let record = record.with_context(|| format!("Malformed CSV record at line {}", line))?;

        let parsed = match StringRecord::from_byte_record(record) {
            Ok(record) => parse_record(&record, &index).ok_or("missing location or invalid date"),
            Err(_) => Err("field is not valid UTF-8"),
        };

        match parsed {
            Ok(row) => rows.push(row),
            Err(reason) => {
                warn!("Skipping line {}: {}", line, reason);
                skipped += 1;
            }
        }

        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("loaded");
    }

    info!("Loaded {} rows ({} skipped)", rows.len(), skipped);

    Ok(LoadedDataset { rows, skipped })
}

/// Build a row from a record, or `None` if its key columns are unusable.
fn parse_record(record: &StringRecord, index: &HeaderIndex) -> Option<Row> {
    let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

    let location = field(Some(index.location));
    if location.is_empty() {
        return None;
    }
    let date = parse_date(field(Some(index.date)))?;

    let continent = Some(field(index.continent))
        .filter(|c| !c.is_empty())
        .map(String::from);

    Some(Row {
        continent,
        location: location.to_string(),
        date,
        population: parse_population(field(index.population)),
        total_cases: Numeric::parse(field(index.total_cases)),
        total_deaths: Numeric::parse(field(index.total_deaths)),
        total_deaths_per_million: Numeric::parse(field(index.total_deaths_per_million)),
    })
}

/// Parse a date in any of the accepted formats.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Population arrives as integer or float text; negatives are rejected.
fn parse_population(raw: &str) -> Option<u64> {
    Numeric::parse(raw)
        .value()
        .filter(|p| *p >= 0.0)
        .map(|p| p.round() as u64)
}
