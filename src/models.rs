//! Data models for the COVID-19 explorer.
//!
//! This module contains the input row schema, the loosely typed numeric
//! wrapper resolved at load time, and the derived tables produced by the
//! aggregation engine.

use crate::error::AnalysisError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location name of the aggregate pseudo-location holding worldwide totals.
pub const WORLD_LOCATION: &str = "World";

/// A numeric cell from a loosely typed source column.
///
/// Parsed once at ingestion; unparseable text is kept for diagnostics but
/// behaves exactly like an absent value in every computation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Numeric {
    /// A successfully parsed value.
    Value(f64),
    /// Empty cell.
    #[default]
    Absent,
    /// Cell text that did not parse as a number.
    Unparseable(String),
}

impl Numeric {
    /// Coerce raw cell text into a numeric value.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Numeric::Absent;
        }

        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Numeric::Value(v),
            _ => Numeric::Unparseable(trimmed.to_string()),
        }
    }

    /// Returns the parsed value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether the cell counts as null.
    pub fn is_absent(&self) -> bool {
        self.value().is_none()
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Value(v)
    }
}

impl From<Option<f64>> for Numeric {
    fn from(v: Option<f64>) -> Self {
        v.map(Numeric::Value).unwrap_or(Numeric::Absent)
    }
}

/// One record per location per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Continent; absent for aggregate pseudo-locations.
    pub continent: Option<String>,
    /// Country name or aggregate pseudo-location ("World", "Europe", ...).
    pub location: String,
    /// Observation date.
    pub date: NaiveDate,
    /// Population, constant per location.
    pub population: Option<u64>,
    /// Cumulative confirmed cases.
    pub total_cases: Numeric,
    /// Cumulative confirmed deaths.
    pub total_deaths: Numeric,
    /// Deaths per million inhabitants, computed upstream.
    pub total_deaths_per_million: Numeric,
}

impl Row {
    /// Whether this row describes a real country rather than an aggregate.
    pub fn is_country(&self) -> bool {
        self.continent.is_some()
    }

    /// The cumulative counter selected by `counter`.
    pub fn counter(&self, counter: Counter) -> Option<f64> {
        match counter {
            Counter::Cases => self.total_cases.value(),
            Counter::Deaths => self.total_deaths.value(),
        }
    }

    /// Whether the given column is null on this row.
    pub fn is_null(&self, column: Column) -> bool {
        match column {
            Column::Continent => self.continent.is_none(),
            Column::Location => self.location.is_empty(),
            Column::Date => false,
            Column::Population => self.population.is_none(),
            Column::TotalCases => self.total_cases.is_absent(),
            Column::TotalDeaths => self.total_deaths.is_absent(),
            Column::TotalDeathsPerMillion => self.total_deaths_per_million.is_absent(),
        }
    }
}

/// Columns of the row schema, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Continent,
    Location,
    Date,
    Population,
    TotalCases,
    TotalDeaths,
    TotalDeathsPerMillion,
}

impl Column {
    /// All schema columns in source order.
    pub const ALL: [Column; 7] = [
        Column::Continent,
        Column::Location,
        Column::Date,
        Column::Population,
        Column::TotalCases,
        Column::TotalDeaths,
        Column::TotalDeathsPerMillion,
    ];

    /// The snake_case source column name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Continent => "continent",
            Column::Location => "location",
            Column::Date => "date",
            Column::Population => "population",
            Column::TotalCases => "total_cases",
            Column::TotalDeaths => "total_deaths",
            Column::TotalDeathsPerMillion => "total_deaths_per_million",
        }
    }

    /// Resolve a column name for an operation, failing with context.
    pub fn resolve(name: &str, operation: &'static str) -> Result<Self, AnalysisError> {
        name.parse::<Column>()
            .map_err(|_| AnalysisError::MissingColumn {
                operation,
                column: name.to_string(),
            })
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Column::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("unknown column: {}", s))
    }
}

/// Which cumulative counter an aggregation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Counter {
    Cases,
    Deaths,
}

impl Counter {
    /// Column label for a continent rollup of this counter.
    pub fn rollup_label(&self) -> &'static str {
        match self {
            Counter::Cases => "TotalCases",
            Counter::Deaths => "TotalDeaths",
        }
    }

    /// Column label for the per-location maximum in a rate ranking.
    pub fn highest_label(&self) -> &'static str {
        match self {
            Counter::Cases => "HighestInfectionCount",
            Counter::Deaths => "TotalDeathCount",
        }
    }

    /// Column label for the per-location rate in a rate ranking.
    pub fn rate_label(&self) -> &'static str {
        match self {
            Counter::Cases => "PercentPopulationInfected",
            Counter::Deaths => "PercentPopulationDead",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counter::Cases => write!(f, "Cases"),
            Counter::Deaths => write!(f, "Deaths"),
        }
    }
}

/// How a location pattern is matched in the case-study detail.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Location name must equal the pattern.
    #[default]
    Exact,
    /// Location name must contain the pattern.
    Substring,
}

/// Location selector for the single-location detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub pattern: String,
    pub mode: MatchMode,
}

impl LocationFilter {
    pub fn exact(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: MatchMode::Exact,
        }
    }

    pub fn substring(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: MatchMode::Substring,
        }
    }

    /// Whether a location name is selected by this filter.
    pub fn matches(&self, location: &str) -> bool {
        match self.mode {
            MatchMode::Exact => location == self.pattern,
            MatchMode::Substring => location.contains(&self.pattern),
        }
    }
}

/// Null percentage for one audited column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNullPercent {
    pub column: String,
    pub null_percent: f64,
}

/// Result of a null audit: a single row of per-column percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullAudit {
    /// Number of rows audited.
    pub total_rows: usize,
    /// Percentages in request order.
    pub columns: Vec<ColumnNullPercent>,
}

impl NullAudit {
    /// Look up the null percentage of a column.
    pub fn percent(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.null_percent)
    }
}

/// Worldwide cumulative totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalTotals {
    #[serde(rename = "TotalCumulativeCases")]
    pub total_cases: f64,
    #[serde(rename = "TotalCumulativeDeaths")]
    pub total_deaths: f64,
    #[serde(rename = "DeathPercentage")]
    pub death_percentage: Option<f64>,
}

/// One continent in a rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinentTotal {
    pub continent: String,
    pub counter: Counter,
    pub total: f64,
}

/// One location in an infection-rate or death-rate ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRate {
    pub location: String,
    pub population: u64,
    pub counter: Counter,
    /// Highest observed cumulative value.
    pub highest: f64,
    /// `100 * highest / population`.
    pub rate_percent: f64,
}

/// One location in the deaths-per-million ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPerMillion {
    pub location: String,
    pub population: Option<u64>,
    #[serde(rename = "TotalDeathsPerMillion")]
    pub deaths_per_million: f64,
}

/// One day of the single-location case study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDetail {
    pub location: String,
    pub date: NaiveDate,
    pub population: Option<u64>,
    pub total_cases: f64,
    pub total_deaths: Option<f64>,
    #[serde(rename = "DeathPercentage")]
    pub death_percentage: Option<f64>,
    #[serde(rename = "PercentPopulationInfected")]
    pub percent_population_infected: Option<f64>,
}

/// Outputs of one analysis run; each is present only if it was requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Findings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_audit: Option<NullAudit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_totals: Option<GlobalTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continent_cases: Option<Vec<ContinentTotal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continent_deaths: Option<Vec<ContinentTotal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infection_rates: Option<Vec<LocationRate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_rates: Option<Vec<LocationRate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deaths_per_million: Option<Vec<LocationPerMillion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_detail: Option<Vec<DailyDetail>>,
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the dataset that was analysed.
    pub dataset: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Rows loaded into memory.
    pub rows_loaded: usize,
    /// Records skipped during load.
    pub rows_skipped: usize,
    /// Case-study selector, if one was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_study: Option<LocationFilter>,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete exploration report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub findings: Findings,
    /// Short written conclusions.
    pub conclusions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_parse() {
        assert_eq!(Numeric::parse("42"), Numeric::Value(42.0));
        assert_eq!(Numeric::parse(" 3.5 "), Numeric::Value(3.5));
        assert_eq!(Numeric::parse(""), Numeric::Absent);
        assert_eq!(Numeric::parse("   "), Numeric::Absent);
        assert_eq!(
            Numeric::parse("n/a"),
            Numeric::Unparseable("n/a".to_string())
        );
        assert!(Numeric::parse("NaN").is_absent());
    }

    #[test]
    fn test_unparseable_behaves_as_absent() {
        let n = Numeric::parse("abc");
        assert_eq!(n.value(), None);
        assert!(n.is_absent());
    }

    #[test]
    fn test_column_from_str() {
        assert_eq!("continent".parse::<Column>(), Ok(Column::Continent));
        assert_eq!(
            "TOTAL_DEATHS_PER_MILLION".parse::<Column>(),
            Ok(Column::TotalDeathsPerMillion)
        );
        assert!("new_cases".parse::<Column>().is_err());
    }

    #[test]
    fn test_column_resolve_reports_operation() {
        let err = Column::resolve("bogus", "null_audit").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MissingColumn { operation: "null_audit", ref column } if column == "bogus"
        ));
    }

    #[test]
    fn test_location_filter_modes() {
        let exact = LocationFilter::exact("Costa Rica");
        assert!(exact.matches("Costa Rica"));
        assert!(!exact.matches("Costa Rica (region)"));

        let sub = LocationFilter::substring("Guinea");
        assert!(sub.matches("Guinea"));
        assert!(sub.matches("Papua New Guinea"));
        assert!(sub.matches("Equatorial Guinea"));
        assert!(!sub.matches("guinea"));
    }

    #[test]
    fn test_counter_labels() {
        assert_eq!(Counter::Cases.rollup_label(), "TotalCases");
        assert_eq!(Counter::Deaths.highest_label(), "TotalDeathCount");
        assert_eq!(Counter::Cases.rate_label(), "PercentPopulationInfected");
    }

    #[test]
    fn test_null_audit_lookup() {
        let audit = NullAudit {
            total_rows: 10,
            columns: vec![ColumnNullPercent {
                column: "continent".to_string(),
                null_percent: 20.0,
            }],
        };
        assert_eq!(audit.percent("continent"), Some(20.0));
        assert_eq!(audit.percent("population"), None);
    }
}
