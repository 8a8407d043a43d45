//! Typed in-memory tables built from raw sheet data.

use crate::codec::RawCell;
use crate::codec::RawCellKind;
use crate::codec::RawSheet;
use crate::workbook::column::Column;
use crate::workbook::column::ColumnKind;
use crate::workbook::options::LoadOptions;
use crate::workbook::row::Row;
use crate::workbook::row::RowId;
use crate::workbook::value::parse_date;
use crate::workbook::value::Value;
use crate::workbook::NotFoundError;
use crate::workbook::SchemaError;
use log::debug;
use std::collections::HashSet;

/// One sheet's structured data: ordered typed columns and ordered rows
/// with stable identities.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub(crate) name: String,
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Row>,
}

impl Table {
    /// Builds a table from raw sheet data.
    ///
    /// Column kinds are inferred from the first non-null cell per column
    /// unless the column is declared as an enum in `options`. Text cells
    /// in date columns are parsed to dates where possible. Row identities
    /// come from the natural key column when one is usable (see
    /// `LoadOptions::key_column`), otherwise they are synthetic and
    /// sequential.
    pub fn load(name: &str, sheet: &RawSheet, options: &LoadOptions) -> Result<Table, SchemaError> {
        if sheet.columns.is_empty() {
            return Err(SchemaError::NoColumns(name.to_owned()));
        }
        let mut seen = HashSet::<&str>::new();
        for column in &sheet.columns {
            if !seen.insert(column.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    sheet: name.to_owned(),
                    column: column.to_owned(),
                });
            }
        }

        let columns: Vec<Column> = sheet
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let kind = match options.enum_values(column) {
                    Some(values) => ColumnKind::Enum(values.to_vec()),
                    None => infer_kind(sheet, index),
                };
                Column {
                    name: column.to_owned(),
                    kind,
                }
            })
            .collect();

        let identities = assign_identities(name, sheet, &columns, options)?;
        let rows = sheet
            .rows
            .iter()
            .zip(identities)
            .map(|(cells, id)| Row {
                id,
                values: columns
                    .iter()
                    .enumerate()
                    .map(|(index, column)| cell_value(cells.get(index), &column.kind))
                    .collect(),
            })
            .collect::<Vec<Row>>();

        debug!(
            "sheet '{}' loaded: {} columns, {} rows",
            name,
            columns.len(),
            rows.len()
        );
        Ok(Table {
            name: name.to_owned(),
            columns,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column, NotFoundError> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| NotFoundError::Column(name.to_owned()))
    }

    pub(crate) fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Read-only iteration over rows in load order. Restartable: each call
    /// yields a fresh iterator.
    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The value of `column` in `row`.
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> Result<&'a Value, NotFoundError> {
        self.column_index(column)
            .and_then(|index| row.values.get(index))
            .ok_or_else(|| NotFoundError::Column(column.to_owned()))
    }

    /// Returns a copy of this table guaranteed to carry `name`: appended
    /// with null-filled cells when the column is absent, unchanged when it
    /// already exists.
    pub fn ensure_column(&self, name: &str, kind: ColumnKind) -> Table {
        let mut table = self.clone();
        if table.column_index(name).is_some() {
            return table;
        }
        table.columns.push(Column {
            name: name.to_owned(),
            kind,
        });
        for row in &mut table.rows {
            row.values.push(Value::Null);
        }
        table
    }

    /// Converts the table back to raw sheet data for encoding.
    pub(crate) fn to_raw(&self) -> RawSheet {
        RawSheet {
            columns: self.columns.iter().map(|column| column.name.to_owned()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| row.values.iter().map(raw_cell).collect())
                .collect(),
        }
    }
}

/// Infers a column's kind from its first non-null cell; all-null columns
/// default to text.
fn infer_kind(sheet: &RawSheet, index: usize) -> ColumnKind {
    sheet
        .rows
        .iter()
        .filter_map(|cells| cells.get(index))
        .find(|cell| !cell.is_empty())
        .map(ColumnKind::infer)
        .unwrap_or(ColumnKind::Text)
}

/// Converts a raw cell to a value under the column's declared kind.
/// Payloads that fail to parse degrade to text rather than failing the
/// whole sheet.
fn cell_value(cell: Option<&RawCell>, kind: &ColumnKind) -> Value {
    let Some(cell) = cell else {
        return Value::Null;
    };
    match cell.kind {
        RawCellKind::Empty => Value::Null,
        RawCellKind::Number => match cell.value.parse::<f64>() {
            Ok(number) => Value::Number(number),
            Err(_) => Value::Text(cell.value.to_owned()),
        },
        RawCellKind::Date => match parse_date(&cell.value) {
            Some(date) => Value::Date(date),
            None => Value::Text(cell.value.to_owned()),
        },
        RawCellKind::Text => match kind {
            ColumnKind::Date => match parse_date(&cell.value) {
                Some(date) => Value::Date(date),
                None => Value::Text(cell.value.to_owned()),
            },
            _ => Value::Text(cell.value.to_owned()),
        },
    }
}

fn raw_cell(value: &Value) -> RawCell {
    match value {
        Value::Null => RawCell::empty(),
        Value::Text(text) => RawCell::text(text),
        Value::Number(number) => RawCell::number(*number),
        Value::Date(date) => RawCell::date(&date.format("%Y-%m-%d").to_string()),
    }
}

/// Picks row identities: the explicit key column when configured (its
/// values must be unique non-negative integers), else an auto-detected
/// `id` column, else synthetic sequential identities.
fn assign_identities(
    sheet_name: &str,
    sheet: &RawSheet,
    columns: &[Column],
    options: &LoadOptions,
) -> Result<Vec<RowId>, SchemaError> {
    if let Some(column) = &options.key_column {
        let index = columns
            .iter()
            .position(|candidate| candidate.name == *column)
            .ok_or_else(|| SchemaError::MissingKeyColumn {
                sheet: sheet_name.to_owned(),
                column: column.to_owned(),
            })?;
        natural_keys(sheet, index).ok_or_else(|| SchemaError::UnusableKeyColumn {
            sheet: sheet_name.to_owned(),
            column: column.to_owned(),
        })
    } else if let Some(index) = columns
        .iter()
        .position(|candidate| candidate.name.eq_ignore_ascii_case("id"))
    {
        Ok(natural_keys(sheet, index).unwrap_or_else(|| sequential_keys(sheet.rows.len())))
    } else {
        Ok(sequential_keys(sheet.rows.len()))
    }
}

/// Reads a column as natural keys. Returns `None` unless every cell holds
/// a distinct non-negative integer.
fn natural_keys(sheet: &RawSheet, index: usize) -> Option<Vec<RowId>> {
    let mut seen = HashSet::<u64>::new();
    let mut keys = Vec::with_capacity(sheet.rows.len());
    for cells in &sheet.rows {
        let key = integer_key(cells.get(index)?)?;
        if !seen.insert(key) {
            return None;
        }
        keys.push(RowId::new(key));
    }
    Some(keys)
}

fn integer_key(cell: &RawCell) -> Option<u64> {
    if cell.is_empty() {
        return None;
    }
    let number = cell.value.trim().parse::<f64>().ok()?;
    if number < 0.0 || number.fract() != 0.0 {
        return None;
    }
    Some(number as u64)
}

fn sequential_keys(count: usize) -> Vec<RowId> {
    (0..count as u64).map(RowId::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks_sheet() -> RawSheet {
        RawSheet {
            columns: vec![
                "Id".to_owned(),
                "Task Name".to_owned(),
                "Status".to_owned(),
                "Planned End".to_owned(),
                "Effort".to_owned(),
            ],
            rows: vec![
                vec![
                    RawCell::number(1.0),
                    RawCell::text("Design survey"),
                    RawCell::text("Pending"),
                    RawCell::text("2025-02-28"),
                    RawCell::number(2.5),
                ],
                vec![
                    RawCell::number(2.0),
                    RawCell::text("Field review"),
                    RawCell::text("Completed"),
                    RawCell::text("2025-03-14"),
                    RawCell::empty(),
                ],
            ],
        }
    }

    #[test]
    fn load_infers_column_kinds() {
        let table = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        assert_eq!(table.column("Id").unwrap().kind, ColumnKind::Number);
        assert_eq!(table.column("Task Name").unwrap().kind, ColumnKind::Text);
        assert_eq!(table.column("Planned End").unwrap().kind, ColumnKind::Date);
        assert_eq!(table.column("Effort").unwrap().kind, ColumnKind::Number);
    }

    #[test]
    fn load_applies_enum_declarations() {
        let options = LoadOptions {
            enum_columns: vec![(
                "Status".to_owned(),
                vec!["Pending".to_owned(), "In process".to_owned(), "Completed".to_owned()],
            )],
            ..LoadOptions::default()
        };
        let table = Table::load("Alpha", &tasks_sheet(), &options).unwrap();
        let column = table.column("Status").unwrap();
        assert!(matches!(column.kind, ColumnKind::Enum(_)));
        assert!(column.kind.allows(&Value::text("In process")));
        assert!(!column.kind.allows(&Value::text("Unknown")));
    }

    #[test]
    fn load_parses_dates_in_date_columns() {
        let table = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        let row = table.rows().next().unwrap();
        let value = table.value(row, "Planned End").unwrap();
        assert_eq!(value.as_date(), chrono::NaiveDate::from_ymd_opt(2025, 2, 28));
    }

    #[test]
    fn load_uses_natural_keys_from_id_column() {
        let table = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        let ids: Vec<RowId> = table.rows().map(Row::id).collect();
        assert_eq!(ids, vec![RowId::new(1), RowId::new(2)]);
    }

    #[test]
    fn load_falls_back_to_sequential_keys() {
        let mut sheet = tasks_sheet();
        // Duplicate ids disqualify the natural key
        sheet.rows[1][0] = RawCell::number(1.0);
        let table = Table::load("Alpha", &sheet, &LoadOptions::default()).unwrap();
        let ids: Vec<RowId> = table.rows().map(Row::id).collect();
        assert_eq!(ids, vec![RowId::new(0), RowId::new(1)]);
    }

    #[test]
    fn load_rejects_unusable_explicit_key() {
        let options = LoadOptions {
            key_column: Some("Task Name".to_owned()),
            ..LoadOptions::default()
        };
        let error = Table::load("Alpha", &tasks_sheet(), &options).unwrap_err();
        assert!(matches!(error, SchemaError::UnusableKeyColumn { .. }));
    }

    #[test]
    fn load_rejects_missing_explicit_key() {
        let options = LoadOptions {
            key_column: Some("Serial".to_owned()),
            ..LoadOptions::default()
        };
        let error = Table::load("Alpha", &tasks_sheet(), &options).unwrap_err();
        assert!(matches!(error, SchemaError::MissingKeyColumn { .. }));
    }

    #[test]
    fn load_rejects_zero_columns() {
        let error = Table::load("Empty", &RawSheet::default(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(error, SchemaError::NoColumns(_)));
    }

    #[test]
    fn load_rejects_duplicate_columns() {
        let sheet = RawSheet {
            columns: vec!["Status".to_owned(), "Status".to_owned()],
            rows: Vec::new(),
        };
        let error = Table::load("Alpha", &sheet, &LoadOptions::default()).unwrap_err();
        assert!(matches!(error, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn column_lookup_reports_missing() {
        let table = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        assert!(matches!(
            table.column("Assignee"),
            Err(NotFoundError::Column(_))
        ));
    }

    #[test]
    fn rows_iterate_in_load_order_and_restart() {
        let table = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        let first: Vec<RowId> = table.rows().map(Row::id).collect();
        let second: Vec<RowId> = table.rows().map(Row::id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ensure_column_appends_once() {
        let table = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        let with_comments = table.ensure_column("Comments", ColumnKind::Text);
        assert_eq!(with_comments.columns().len(), table.columns().len() + 1);
        for row in with_comments.rows() {
            assert_eq!(with_comments.value(row, "Comments").unwrap(), &Value::Null);
        }

        let again = with_comments.ensure_column("Comments", ColumnKind::Text);
        assert_eq!(again, with_comments);
    }

    #[test]
    fn raw_round_trip_preserves_data() {
        let table = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        let raw = table.to_raw();
        let reloaded = Table::load("Alpha", &raw, &LoadOptions::default()).unwrap();
        assert_eq!(reloaded, table);
    }
}
