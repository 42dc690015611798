//! Short written conclusions drawn from computed findings.

use crate::models::{Counter, Findings};

/// Generate conclusion sentences for whichever findings are present.
pub fn summarize(findings: &Findings) -> Vec<String> {
    let mut conclusions = Vec::new();

    if let Some(aggregates) = findings
        .null_audit
        .as_ref()
        .and_then(|audit| audit.percent("continent"))
    {
        conclusions.push(format!(
            "{:.1}% of rows have no continent and describe aggregate pseudo-locations; they are excluded from country and continent figures.",
            aggregates
        ));
    }

    if let Some(ref totals) = findings.global_totals {
        let fatality = totals
            .death_percentage
            .map(|p| format!(", a case-fatality ratio of {:.2}%", p))
            .unwrap_or_default();
        conclusions.push(format!(
            "Worldwide, {} cumulative cases and {} deaths were recorded{}.",
            format_count(totals.total_cases),
            format_count(totals.total_deaths),
            fatality
        ));
    }

    for rollup in [&findings.continent_deaths, &findings.continent_cases]
        .into_iter()
        .flatten()
    {
        if let Some(top) = rollup.first() {
            let noun = match top.counter {
                Counter::Cases => "cases",
                Counter::Deaths => "deaths",
            };
            conclusions.push(format!(
                "{} has the highest total {} of any continent ({}).",
                top.continent,
                noun,
                format_count(top.total)
            ));
        }
    }

    if let Some(top) = findings.infection_rates.as_ref().and_then(|r| r.first()) {
        conclusions.push(format!(
            "{} has the highest infection rate: {:.2}% of its population.",
            top.location, top.rate_percent
        ));
    }

    if let Some(ref rates) = findings.infection_rates {
        let over_hundred = rates.iter().filter(|r| r.rate_percent > 100.0).count();
        if over_hundred > 0 {
            conclusions.push(format!(
                "{} location(s) report infection rates above 100%; total_cases counts reinfections, so these are expected.",
                over_hundred
            ));
        }
    }

    if let Some(top) = findings.death_rates.as_ref().and_then(|r| r.first()) {
        conclusions.push(format!(
            "{} has the highest death rate: {:.3}% of its population.",
            top.location, top.rate_percent
        ));
    }

    if let Some(top) = findings.deaths_per_million.as_ref().and_then(|r| r.first()) {
        conclusions.push(format!(
            "{} reports the most deaths per million ({:.1}).",
            top.location, top.deaths_per_million
        ));
    }

    if let Some(latest) = findings.location_detail.as_ref().and_then(|d| d.first()) {
        let mut sentence = format!(
            "As of {}, {} had {} cumulative cases",
            latest.date,
            latest.location,
            format_count(latest.total_cases)
        );
        if let Some(infected) = latest.percent_population_infected {
            sentence.push_str(&format!(" ({:.2}% of its population)", infected));
        }
        if let Some(fatality) = latest.death_percentage {
            sentence.push_str(&format!(
                " and a {:.2}% chance of dying if infected",
                fatality
            ));
        }
        sentence.push('.');
        conclusions.push(sentence);
    }

    conclusions
}

/// Render a counter with thousands separators.
pub fn format_count(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::world_fixture;
    use crate::analysis::{continent_rollup, global_totals, location_detail, rate_ranking};
    use crate::models::{ColumnNullPercent, LocationFilter, LocationRate, NullAudit};

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(1234567.4), "1,234,567");
    }

    #[test]
    fn test_summarize_empty_findings() {
        assert!(summarize(&Findings::default()).is_empty());
    }

    #[test]
    fn test_summarize_world_fixture() {
        let rows = world_fixture();
        let findings = Findings {
            global_totals: Some(global_totals(&rows).unwrap()),
            continent_deaths: Some(continent_rollup(&rows, Counter::Deaths)),
            infection_rates: Some(rate_ranking(&rows, Counter::Cases)),
            location_detail: Some(location_detail(&rows, &LocationFilter::exact("Alpha"))),
            ..Findings::default()
        };

        let conclusions = summarize(&findings);

        assert_eq!(conclusions.len(), 4);
        assert!(conclusions[0].contains("120 cumulative cases"));
        assert!(conclusions[1].starts_with("Asia has the highest total deaths"));
        assert!(conclusions[2].starts_with("Alpha has the highest infection rate"));
        assert!(conclusions[3].contains("As of 2021-01-02, Alpha"));
    }

    #[test]
    fn test_summarize_mentions_aggregate_share() {
        let findings = Findings {
            null_audit: Some(NullAudit {
                total_rows: 10,
                columns: vec![ColumnNullPercent {
                    column: "continent".to_string(),
                    null_percent: 20.0,
                }],
            }),
            ..Findings::default()
        };

        let conclusions = summarize(&findings);

        assert_eq!(conclusions.len(), 1);
        assert!(conclusions[0].starts_with("20.0% of rows have no continent"));
    }

    #[test]
    fn test_summarize_flags_reinfection_caveat() {
        let findings = Findings {
            infection_rates: Some(vec![LocationRate {
                location: "Reinfected".to_string(),
                population: 100,
                counter: Counter::Cases,
                highest: 150.0,
                rate_percent: 150.0,
            }]),
            ..Findings::default()
        };

        let conclusions = summarize(&findings);

        assert!(conclusions.iter().any(|c| c.contains("reinfections")));
    }
}
