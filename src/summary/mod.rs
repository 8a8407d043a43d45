//! # Summary Metrics
//!
//! The aggregation behind dashboard headline tiles and status charts:
//! per-value counts, distinct counts and percentage shares over a
//! filtered view. Pure read-only functions; rendering belongs to the
//! presentation layer.

use crate::filter::FilteredView;
use crate::workbook::NotFoundError;
use crate::workbook::Value;

/// Counts occurrences of each value of `column` across the view, in
/// first-seen order. Null cells are skipped.
pub fn value_counts(
    view: &FilteredView<'_>,
    column: &str,
) -> Result<Vec<(Value, usize)>, NotFoundError> {
    let index = column_index(view, column)?;
    let mut counts = Vec::<(Value, usize)>::new();
    for row in view.rows() {
        let value = &row.values()[index];
        if value.is_null() {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.clone(), 1)),
        }
    }
    Ok(counts)
}

/// Number of distinct non-null values of `column` across the view.
pub fn distinct_count(view: &FilteredView<'_>, column: &str) -> Result<usize, NotFoundError> {
    value_counts(view, column).map(|counts| counts.len())
}

/// Share, from 0 to 100, of view rows whose `column` holds `value`.
/// An empty view yields 0.0 rather than dividing by zero.
pub fn percentage(
    view: &FilteredView<'_>,
    column: &str,
    value: &Value,
) -> Result<f64, NotFoundError> {
    let index = column_index(view, column)?;
    let total = view.row_count();
    if total == 0 {
        return Ok(0.0);
    }
    let matching = view
        .rows()
        .filter(|row| &row.values()[index] == value)
        .count();
    Ok(matching as f64 * 100.0 / total as f64)
}

fn column_index(view: &FilteredView<'_>, column: &str) -> Result<usize, NotFoundError> {
    view.table()
        .column_index(column)
        .ok_or_else(|| NotFoundError::Column(column.to_owned()))
}
