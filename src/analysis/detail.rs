//! Day-by-day case study of a single location.

use super::{country_rows, percentage};
use crate::models::{DailyDetail, LocationFilter, Row};
use tracing::debug;

/// Daily case-fatality ratio and cumulative infection share for one location.
///
/// Rows without a positive `total_cases` are dropped. Ordered by location,
/// then most recent date first.
pub fn location_detail(rows: &[Row], filter: &LocationFilter) -> Vec<DailyDetail> {
    let mut dropped = 0usize;

    let mut detail: Vec<DailyDetail> = country_rows(rows)
        .into_iter()
        .filter(|row| filter.matches(&row.location))
        .filter_map(|row| {
            let Some(total_cases) = row.total_cases.value().filter(|c| *c > 0.0) else {
                dropped += 1;
                return None;
            };
            let total_deaths = row.total_deaths.value();
            let population = row.population.map(|p| p as f64).unwrap_or(0.0);

            Some(DailyDetail {
                location: row.location.clone(),
                date: row.date,
                population: row.population,
                total_cases,
                total_deaths,
                death_percentage: total_deaths.and_then(|d| percentage(d, total_cases)),
                percent_population_infected: percentage(total_cases, population),
            })
        })
        .collect();

    debug!(
        pattern = %filter.pattern,
        rows = detail.len(),
        dropped = dropped,
        "Built location detail"
    );

    detail.sort_by(|a, b| a.location.cmp(&b.location).then(b.date.cmp(&a.date)));
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{date, row};

    fn testland() -> Vec<Row> {
        vec![
            row(Some("Nowhere"), "Testland", "2021-01-01", Some(1000), Some(10.0), Some(1.0)),
            row(Some("Nowhere"), "Testland", "2021-01-02", Some(1000), Some(20.0), Some(2.0)),
            row(Some("Nowhere"), "Testland", "2021-01-03", Some(1000), Some(30.0), Some(3.0)),
        ]
    }

    #[test]
    fn test_location_detail_rates() {
        let rows = testland();
        let detail = location_detail(&rows, &LocationFilter::exact("Testland"));

        assert_eq!(detail.len(), 3);
        let latest = &detail[0];
        assert_eq!(latest.date, date("2021-01-03"));
        assert!((latest.death_percentage.unwrap() - 10.0).abs() < 1e-9);
        assert!((latest.percent_population_infected.unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_location_detail_ordering() {
        let mut rows = testland();
        rows.push(row(Some("Nowhere"), "Testland East", "2021-01-01", Some(10), Some(1.0), None));
        rows.reverse();

        let detail = location_detail(&rows, &LocationFilter::substring("Testland"));
        let keys: Vec<(&str, String)> = detail
            .iter()
            .map(|d| (d.location.as_str(), d.date.to_string()))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("Testland", "2021-01-03".to_string()),
                ("Testland", "2021-01-02".to_string()),
                ("Testland", "2021-01-01".to_string()),
                ("Testland East", "2021-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_location_detail_exact_excludes_compound_names() {
        let mut rows = testland();
        rows.push(row(Some("Nowhere"), "Testland East", "2021-01-01", Some(10), Some(1.0), None));

        let detail = location_detail(&rows, &LocationFilter::exact("Testland"));

        assert!(detail.iter().all(|d| d.location == "Testland"));
    }

    #[test]
    fn test_location_detail_drops_zero_cases() {
        let rows = vec![
            row(Some("X"), "Testland", "2020-01-01", Some(1000), Some(0.0), Some(0.0)),
            row(Some("X"), "Testland", "2020-01-02", Some(1000), None, None),
            row(Some("X"), "Testland", "2020-01-03", Some(1000), Some(5.0), None),
        ];

        let detail = location_detail(&rows, &LocationFilter::exact("Testland"));

        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0].death_percentage, None);
        assert!((detail[0].percent_population_infected.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_location_detail_ignores_aggregates() {
        let rows = vec![row(None, "Testland", "2021-01-01", Some(10), Some(1.0), Some(1.0))];

        assert!(location_detail(&rows, &LocationFilter::exact("Testland")).is_empty());
    }

    #[test]
    fn test_location_detail_without_population() {
        let rows = vec![row(Some("X"), "Testland", "2021-01-01", None, Some(4.0), Some(1.0))];

        let detail = location_detail(&rows, &LocationFilter::exact("Testland"));

        assert_eq!(detail[0].percent_population_infected, None);
        assert!((detail[0].death_percentage.unwrap() - 25.0).abs() < 1e-9);
    }
}
