//! Location and continent rollups.
//!
//! Counters in the dataset are cumulative, so every rollup first collapses
//! the date dimension with a maximum and only then sums across locations.

use super::{max_of, percentage};
use crate::error::AnalysisError;
use crate::models::{
    ContinentTotal, Counter, GlobalTotals, LocationPerMillion, LocationRate, Row, WORLD_LOCATION,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Keep only rows describing real countries.
///
/// Aggregate pseudo-locations ("World", continents, income groups) carry no
/// continent and would be double counted by any rollup.
pub fn country_rows<'a, I>(rows: I) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter().filter(|row| row.is_country()).collect()
}

/// Worldwide cumulative cases and deaths, read from the "World" location.
pub fn global_totals(rows: &[Row]) -> Result<GlobalTotals, AnalysisError> {
    const OPERATION: &str = "global_totals";

    if rows.is_empty() {
        return Err(AnalysisError::EmptyDataset {
            operation: OPERATION,
        });
    }

    let world: Vec<&Row> = rows
        .iter()
        .filter(|row| row.location == WORLD_LOCATION)
        .collect();

    if world.is_empty() {
        return Err(AnalysisError::NoWorldRow {
            operation: OPERATION,
        });
    }

    let total_cases =
        max_of(world.iter().filter_map(|r| r.counter(Counter::Cases))).unwrap_or(0.0);
    let total_deaths =
        max_of(world.iter().filter_map(|r| r.counter(Counter::Deaths))).unwrap_or(0.0);

    debug!(
        world_rows = world.len(),
        total_cases = total_cases,
        total_deaths = total_deaths,
        "Computed global totals"
    );

    Ok(GlobalTotals {
        total_cases,
        total_deaths,
        death_percentage: percentage(total_deaths, total_cases),
    })
}

/// Sum of latest per-country counters, grouped by continent.
///
/// Sorted by total (highest first), ties broken by continent name.
pub fn continent_rollup(rows: &[Row], counter: Counter) -> Vec<ContinentTotal> {
    // Phase 1: latest cumulative value per (continent, location).
    let mut per_location: BTreeMap<(&str, &str), f64> = BTreeMap::new();

    for row in country_rows(rows) {
        let (Some(continent), Some(value)) = (row.continent.as_deref(), row.counter(counter))
        else {
            continue;
        };

        per_location
            .entry((continent, row.location.as_str()))
            .and_modify(|max| *max = max.max(value))
            .or_insert(value);
    }

    // Phase 2: sum those values per continent.
    let mut per_continent: BTreeMap<&str, f64> = BTreeMap::new();
    for ((continent, _), value) in per_location {
        *per_continent.entry(continent).or_default() += value;
    }

    let mut totals: Vec<ContinentTotal> = per_continent
        .into_iter()
        .map(|(continent, total)| ContinentTotal {
            continent: continent.to_string(),
            counter,
            total,
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.continent.cmp(&b.continent))
    });

    totals
}

/// Group country rows by `(location, population)`, folding `value` with max.
fn max_per_location<'a>(
    rows: &'a [Row],
    value: impl Fn(&Row) -> Option<f64>,
) -> BTreeMap<(&'a str, Option<u64>), Option<f64>> {
    let mut groups: BTreeMap<(&str, Option<u64>), Option<f64>> = BTreeMap::new();

    for row in country_rows(rows) {
        let slot = groups
            .entry((row.location.as_str(), row.population))
            .or_insert(None);

        if let Some(v) = value(row) {
            *slot = max_of(slot.iter().copied().chain(Some(v)));
        }
    }

    groups
}

/// Per-country infection or death rate as a percentage of population.
///
/// Countries with an absent or zero population are dropped. Infection rates
/// can exceed 100% where `total_cases` counts reinfections.
pub fn rate_ranking(rows: &[Row], counter: Counter) -> Vec<LocationRate> {
    let mut ranking = Vec::new();

    for ((location, population), highest) in max_per_location(rows, |r| r.counter(counter)) {
        let Some(population) = population.filter(|p| *p > 0) else {
            debug!(
                location = %location,
                "Dropping location without population from rate ranking"
            );
            continue;
        };
        let Some(highest) = highest else {
            continue;
        };
        let Some(rate_percent) = percentage(highest, population as f64) else {
            continue;
        };

        ranking.push(LocationRate {
            location: location.to_string(),
            population,
            counter,
            highest,
            rate_percent,
        });
    }

    ranking.sort_by(|a, b| {
        b.rate_percent
            .total_cmp(&a.rate_percent)
            .then_with(|| a.location.cmp(&b.location))
    });

    ranking
}

/// Per-country deaths per million, taken as reported upstream.
pub fn per_million_ranking(rows: &[Row]) -> Vec<LocationPerMillion> {
    let mut ranking: Vec<LocationPerMillion> =
        max_per_location(rows, |r| r.total_deaths_per_million.value())
            .into_iter()
            .filter_map(|((location, population), highest)| {
                highest.map(|deaths_per_million| LocationPerMillion {
                    location: location.to_string(),
                    population,
                    deaths_per_million,
                })
            })
            .collect();

    ranking.sort_by(|a, b| {
        b.deaths_per_million
            .total_cmp(&a.deaths_per_million)
            .then_with(|| a.location.cmp(&b.location))
    });

    ranking
}
