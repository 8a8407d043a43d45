//! Merging pending edits back into tables and workbooks.
//!
//! Reconciliation is the only way table data changes after load, and it is
//! value-returning: the input table and workbook are never touched, so a
//! failed merge leaves the prior state fully usable.

use crate::edit::EditSet;
use crate::workbook::NotFoundError;
use crate::workbook::Row;
use crate::workbook::Table;
use crate::workbook::Workbook;
use log::debug;

/// Produces a new table with every pending edit applied.
///
/// Pure and total: rows whose identity appears in the edit set are copied
/// with the edited cells overwritten, all other rows pass through
/// unchanged, and edits naming a row identity absent from the table are
/// ignored. Row order, row count and the column set are preserved.
pub fn apply(table: &Table, edits: &EditSet) -> Table {
    let rows = table
        .rows()
        .map(|row| match edits.row_edits(row.id()) {
            None => row.clone(),
            Some(cells) => Row {
                id: row.id(),
                values: table
                    .columns()
                    .iter()
                    .zip(row.values())
                    .map(|(column, value)| {
                        cells.get(&column.name).cloned().unwrap_or_else(|| value.clone())
                    })
                    .collect(),
            },
        })
        .collect::<Vec<Row>>();

    debug!(
        "reconciled sheet '{}': {} pending edits over {} rows",
        table.name(),
        edits.len(),
        rows.len()
    );
    Table {
        name: table.name().to_owned(),
        columns: table.columns().to_vec(),
        rows,
    }
}

/// Returns a new workbook identical to the input except that sheet
/// `sheet_name` is replaced by `table` (renamed to the sheet, keeping the
/// workbook's name mapping intact).
pub fn merge_into_workbook(
    workbook: &Workbook,
    sheet_name: &str,
    table: Table,
) -> Result<Workbook, NotFoundError> {
    let mut merged = workbook.clone();
    let slot = merged
        .tables
        .iter_mut()
        .find(|candidate| candidate.name == sheet_name)
        .ok_or_else(|| NotFoundError::Sheet(sheet_name.to_owned()))?;
    let mut table = table;
    table.name = sheet_name.to_owned();
    *slot = table;
    Ok(merged)
}
