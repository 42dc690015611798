//! Null auditing of dataset columns.

use crate::error::AnalysisError;
use crate::models::{Column, ColumnNullPercent, NullAudit, Row};
use tracing::debug;

/// Percentage of null values for each requested column.
///
/// Columns are resolved before any counting, so an unknown name fails even
/// on an empty dataset. Unparseable numerics count as null.
pub fn null_audit<S: AsRef<str>>(rows: &[Row], columns: &[S]) -> Result<NullAudit, AnalysisError> {
    const OPERATION: &str = "null_audit";

    let resolved = columns
        .iter()
        .map(|name| Column::resolve(name.as_ref(), OPERATION))
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(AnalysisError::EmptyDataset {
            operation: OPERATION,
        });
    }

    let total = rows.len() as f64;
    let columns = resolved
        .into_iter()
        .map(|column| {
            let nulls = rows.iter().filter(|row| row.is_null(column)).count();
            debug!(column = %column, nulls = nulls, "Audited column");
            ColumnNullPercent {
                column: column.name().to_string(),
                null_percent: 100.0 * nulls as f64 / total,
            }
        })
        .collect();

    Ok(NullAudit {
        total_rows: rows.len(),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::row;
    use crate::models::Numeric;

    fn ten_rows() -> Vec<Row> {
        (0..10)
            .map(|i| {
                let continent = if i < 2 { None } else { Some("Europe") };
                row(continent, "Somewhere", "2021-01-01", Some(100), Some(1.0), None)
            })
            .collect()
    }

    #[test]
    fn test_null_audit_continent() {
        let rows = ten_rows();
        let audit = null_audit(&rows, &["continent"]).unwrap();

        assert_eq!(audit.total_rows, 10);
        assert!((audit.percent("continent").unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_null_audit_multiple_columns_in_order() {
        let mut rows = ten_rows();
        rows[3].total_cases = Numeric::parse("not-a-number");

        let audit = null_audit(&rows, &["total_deaths", "total_cases", "date"]).unwrap();
        let names: Vec<&str> = audit.columns.iter().map(|c| c.column.as_str()).collect();

        assert_eq!(names, vec!["total_deaths", "total_cases", "date"]);
        assert_eq!(audit.percent("total_deaths"), Some(100.0));
        assert!((audit.percent("total_cases").unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(audit.percent("date"), Some(0.0));
    }

    #[test]
    fn test_null_audit_empty_dataset() {
        let err = null_audit(&[], &["continent"]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::EmptyDataset {
                operation: "null_audit"
            }
        );
    }

    #[test]
    fn test_null_audit_missing_column() {
        let rows = ten_rows();
        let err = null_audit(&rows, &["continent", "new_vaccinations"]).unwrap_err();

        assert_eq!(
            err,
            AnalysisError::MissingColumn {
                operation: "null_audit",
                column: "new_vaccinations".to_string(),
            }
        );
    }
}
