//! Markdown report generation.
//!
//! This module renders the derived tables of an exploration run as a
//! Markdown document, or as pretty-printed JSON.

use crate::analysis::insights::format_count;
use crate::models::{
    ContinentTotal, Counter, DailyDetail, Findings, GlobalTotals, LocationPerMillion, LocationRate,
    NullAudit, Report, ReportMetadata,
};
use anyhow::Result;

/// Generate a complete Markdown report.
///
/// Rankings are cut to `top_n` rows; the JSON report is never truncated.
pub fn generate_markdown_report(report: &Report, top_n: usize) -> String {
    let findings = &report.findings;
    let mut output = String::new();

    // Title
    output.push_str("# COVID-19 Data Exploration\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    if let Some(ref audit) = findings.null_audit {
        output.push_str(&generate_null_audit_section(audit));
    }
    if let Some(ref totals) = findings.global_totals {
        output.push_str(&generate_global_section(totals));
    }
    for (counter, rollup) in [
        (Counter::Cases, &findings.continent_cases),
        (Counter::Deaths, &findings.continent_deaths),
    ] {
        if let Some(rollup) = rollup {
            output.push_str(&generate_continent_section(counter, rollup));
        }
    }
    if let Some(ref rates) = findings.infection_rates {
        output.push_str(&generate_rate_section(
            "Infection Rate by Country",
            rates,
            top_n,
        ));
    }
    if let Some(ref rates) = findings.death_rates {
        output.push_str(&generate_rate_section("Death Rate by Country", rates, top_n));
    }
    if let Some(ref ranking) = findings.deaths_per_million {
        output.push_str(&generate_per_million_section(ranking, top_n));
    }
    if let Some(ref detail) = findings.location_detail {
        output.push_str(&generate_detail_section(detail));
    }

    output.push_str(&generate_conclusions_section(&report.conclusions));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Rows Loaded:** {}\n", metadata.rows_loaded));
    if metadata.rows_skipped > 0 {
        section.push_str(&format!("- **Rows Skipped:** {}\n", metadata.rows_skipped));
    }
    if let Some(ref filter) = metadata.case_study {
        section.push_str(&format!(
            "- **Case Study:** {} ({:?} match)\n",
            filter.pattern, filter.mode
        ));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents from the sections present.
fn generate_table_of_contents(report: &Report) -> String {
    let findings = &report.findings;
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    let entries: [(bool, &str, &str); 8] = [
        (findings.null_audit.is_some(), "Null Audit", "null-audit"),
        (findings.global_totals.is_some(), "Global Numbers", "global-numbers"),
        (
            findings.continent_cases.is_some(),
            "Total Cases by Continent",
            "total-cases-by-continent",
        ),
        (
            findings.continent_deaths.is_some(),
            "Total Deaths by Continent",
            "total-deaths-by-continent",
        ),
        (
            findings.infection_rates.is_some(),
            "Infection Rate by Country",
            "infection-rate-by-country",
        ),
        (
            findings.death_rates.is_some(),
            "Death Rate by Country",
            "death-rate-by-country",
        ),
        (
            findings.deaths_per_million.is_some(),
            "Deaths per Million",
            "deaths-per-million",
        ),
        (findings.location_detail.is_some(), "Case Study", "case-study"),
    ];

    for (present, title, anchor) in entries {
        if present {
            toc.push_str(&format!("- [{}](#{})\n", title, anchor));
        }
    }

    if !report.conclusions.is_empty() {
        toc.push_str("- [Conclusions](#conclusions)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the null audit section.
fn generate_null_audit_section(audit: &NullAudit) -> String {
    let mut section = String::new();

    section.push_str("## Null Audit\n\n");
    section.push_str(&format!("*{} rows audited*\n\n", audit.total_rows));

    let headers: Vec<String> = audit
        .columns
        .iter()
        .map(|c| format!("{}_null_percent", c.column))
        .collect();
    section.push_str(&format!("| {} |\n", headers.join(" | ")));
    section.push_str(&format!("|{}\n", ":---:|".repeat(headers.len())));

    let values: Vec<String> = audit
        .columns
        .iter()
        .map(|c| format!("{:.2}", c.null_percent))
        .collect();
    section.push_str(&format!("| {} |\n\n", values.join(" | ")));

    section
}

/// Generate the global numbers section.
fn generate_global_section(totals: &GlobalTotals) -> String {
    let mut section = String::new();

    section.push_str("## Global Numbers\n\n");
    section.push_str("| TotalCumulativeCases | TotalCumulativeDeaths | DeathPercentage |\n");
    section.push_str("|---:|---:|---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        format_count(totals.total_cases),
        format_count(totals.total_deaths),
        format_percent(totals.death_percentage)
    ));

    section
}

/// Generate a continent rollup section.
fn generate_continent_section(counter: Counter, rollup: &[ContinentTotal]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Total {} by Continent\n\n", counter));

    if rollup.is_empty() {
        section.push_str("No continent had data for this counter.\n\n");
        return section;
    }

    section.push_str(&format!("| continent | {} |\n", counter.rollup_label()));
    section.push_str("|:---|---:|\n");
    for continent in rollup {
        section.push_str(&format!(
            "| {} | {} |\n",
            continent.continent,
            format_count(continent.total)
        ));
    }
    section.push('\n');

    section
}

/// Generate an infection-rate or death-rate ranking section.
fn generate_rate_section(title: &str, rates: &[LocationRate], top_n: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));

    let Some(first) = rates.first() else {
        section.push_str("No location had both a population and a value.\n\n");
        return section;
    };

    section.push_str(&format!(
        "| # | location | population | {} | {} |\n",
        first.counter.highest_label(),
        first.counter.rate_label()
    ));
    section.push_str("|---:|:---|---:|---:|---:|\n");

    for (i, rate) in rates.iter().take(top_n).enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {:.4} |\n",
            i + 1,
            rate.location,
            format_count(rate.population as f64),
            format_count(rate.highest),
            rate.rate_percent
        ));
    }
    section.push_str(&truncation_note(rates.len(), top_n));
    section.push('\n');

    section
}

/// Generate the deaths-per-million ranking section.
fn generate_per_million_section(ranking: &[LocationPerMillion], top_n: usize) -> String {
    let mut section = String::new();

    section.push_str("## Deaths per Million\n\n");

    if ranking.is_empty() {
        section.push_str("No location reported deaths per million.\n\n");
        return section;
    }

    section.push_str("| # | location | population | TotalDeathsPerMillion |\n");
    section.push_str("|---:|:---|---:|---:|\n");

    for (i, entry) in ranking.iter().take(top_n).enumerate() {
        let population = entry
            .population
            .map(|p| format_count(p as f64))
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(
            "| {} | {} | {} | {:.3} |\n",
            i + 1,
            entry.location,
            population,
            entry.deaths_per_million
        ));
    }
    section.push_str(&truncation_note(ranking.len(), top_n));
    section.push('\n');

    section
}

/// Generate the single-location case study section, one row per day.
fn generate_detail_section(detail: &[DailyDetail]) -> String {
    let mut section = String::new();

    section.push_str("## Case Study\n\n");

    if detail.is_empty() {
        section.push_str("No matching location rows with reported cases.\n\n");
        return section;
    }

    section.push_str(
        "| location | date | total_cases | total_deaths | DeathPercentage | PercentPopulationInfected |\n",
    );
    section.push_str("|:---|:---|---:|---:|---:|---:|\n");

    for day in detail {
        let deaths = day
            .total_deaths
            .map(format_count)
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            day.location,
            day.date,
            format_count(day.total_cases),
            deaths,
            format_percent(day.death_percentage),
            format_percent(day.percent_population_infected)
        ));
    }
    section.push('\n');

    section
}

/// Generate the conclusions section.
fn generate_conclusions_section(conclusions: &[String]) -> String {
    if conclusions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Conclusions\n\n");
    for (i, conclusion) in conclusions.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, conclusion));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by covidlens v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}%", v))
        .unwrap_or_else(|| "-".to_string())
}

fn truncation_note(total: usize, shown: usize) -> String {
    if total > shown {
        format!("\n*Showing {} of {} rows.*\n", shown, total)
    } else {
        String::new()
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Findings that produced no rows at all, for summary output.
pub fn empty_sections(findings: &Findings) -> Vec<&'static str> {
    let mut empty = Vec::new();

    if findings.continent_cases.as_ref().is_some_and(|v| v.is_empty()) {
        empty.push("continent-cases");
    }
    if findings.continent_deaths.as_ref().is_some_and(|v| v.is_empty()) {
        empty.push("continent-deaths");
    }
    if findings.infection_rates.as_ref().is_some_and(|v| v.is_empty()) {
        empty.push("infection-rate");
    }
    if findings.death_rates.as_ref().is_some_and(|v| v.is_empty()) {
        empty.push("death-rate");
    }
    if findings.deaths_per_million.as_ref().is_some_and(|v| v.is_empty()) {
        empty.push("deaths-per-million");
    }
    if findings.location_detail.as_ref().is_some_and(|v| v.is_empty()) {
        empty.push("location");
    }

    empty
}
