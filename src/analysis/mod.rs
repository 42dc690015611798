//! Aggregation engine.
//!
//! Every operation here is a pure function of a read-only row slice plus
//! parameters, returning a freshly derived table.

pub mod aggregator;
pub mod audit;
pub mod detail;
pub mod insights;

pub use aggregator::*;
pub use audit::null_audit;
pub use detail::location_detail;
pub use insights::summarize;

/// `100 * numerator / denominator`, or `None` when the denominator is not positive.
pub(crate) fn percentage(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(100.0 * numerator / denominator)
    } else {
        None
    }
}

/// Largest value of an iterator, ignoring ordering of the input.
pub(crate) fn max_of(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    values
        .into_iter()
        .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}
