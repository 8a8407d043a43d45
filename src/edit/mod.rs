//! # Edit Sessions
//!
//! Pending cell edits collected while the user works on a filtered view.
//! Edits are keyed by row identity and column name, validated against the
//! target table as they are recorded, and applied in one batch by the
//! reconciler.

pub mod reconcile;

use crate::workbook::RowId;
use crate::workbook::Table;
use crate::workbook::Value;
use std::collections::HashMap;
use thiserror::Error;

/// An edit targeted a column the table does not have, or a value an enum
/// column does not allow.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Column '{0}' is not a column of the target table")]
    InvalidColumn(String),

    #[error("Value '{value}' is not allowed for enum column '{column}'")]
    InvalidValue { column: String, value: String },
}

/// A sparse batch of not-yet-applied cell edits.
///
/// Created empty per editing session, filled by `set`, consumed by
/// `reconcile::apply` and then discarded or cleared for the next session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditSet {
    edits: HashMap<RowId, HashMap<String, Value>>,
}

impl EditSet {
    pub fn new() -> EditSet {
        EditSet::default()
    }

    /// Records or overwrites a pending edit against `table`.
    ///
    /// The row identity is not checked here: identities are assigned at
    /// load time and stay valid across filter and edit cycles, and the
    /// reconciler ignores entries for rows that are gone.
    pub fn set(
        &mut self,
        table: &Table,
        row: RowId,
        column: &str,
        value: Value,
    ) -> Result<(), EditError> {
        let declared = table
            .column(column)
            .map_err(|_| EditError::InvalidColumn(column.to_owned()))?;
        if !declared.kind.allows(&value) {
            return Err(EditError::InvalidValue {
                column: column.to_owned(),
                value: value.to_string(),
            });
        }
        self.edits
            .entry(row)
            .or_default()
            .insert(column.to_owned(), value);
        Ok(())
    }

    /// The pending value for a cell, if one was recorded.
    pub fn get(&self, row: RowId, column: &str) -> Option<&Value> {
        self.edits.get(&row).and_then(|cells| cells.get(column))
    }

    /// Discards every pending edit.
    pub fn clear(&mut self) {
        self.edits.clear();
    }

    /// Number of pending cell edits.
    pub fn len(&self) -> usize {
        self.edits.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub(crate) fn row_edits(&self, row: RowId) -> Option<&HashMap<String, Value>> {
        self.edits.get(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RawCell;
    use crate::codec::RawSheet;
    use crate::workbook::LoadOptions;

    fn tasks_table() -> Table {
        let sheet = RawSheet {
            columns: vec!["Id".to_owned(), "Status".to_owned(), "Comments".to_owned()],
            rows: vec![
                vec![RawCell::number(1.0), RawCell::text("Pending"), RawCell::empty()],
                vec![RawCell::number(2.0), RawCell::text("Completed"), RawCell::empty()],
            ],
        };
        let options = LoadOptions {
            enum_columns: vec![(
                "Status".to_owned(),
                vec!["Pending".to_owned(), "In process".to_owned(), "Completed".to_owned()],
            )],
            ..LoadOptions::default()
        };
        Table::load("Alpha", &sheet, &options).unwrap()
    }

    #[test]
    fn set_records_and_overwrites() {
        let table = tasks_table();
        let mut edits = EditSet::new();
        edits
            .set(&table, RowId::new(1), "Comments", Value::text("waiting on parts"))
            .unwrap();
        edits
            .set(&table, RowId::new(1), "Comments", Value::text("parts arrived"))
            .unwrap();

        assert_eq!(edits.len(), 1);
        assert_eq!(
            edits.get(RowId::new(1), "Comments"),
            Some(&Value::text("parts arrived"))
        );
    }

    #[test]
    fn get_is_absent_for_unedited_cells() {
        let edits = EditSet::new();
        assert_eq!(edits.get(RowId::new(1), "Comments"), None);
    }

    #[test]
    fn set_rejects_unknown_column() {
        let table = tasks_table();
        let mut edits = EditSet::new();
        let error = edits
            .set(&table, RowId::new(1), "Priority", Value::text("High"))
            .unwrap_err();
        assert!(matches!(error, EditError::InvalidColumn(_)));
        assert!(edits.is_empty());
    }

    #[test]
    fn set_rejects_value_outside_enum() {
        let table = tasks_table();
        let mut edits = EditSet::new();
        let error = edits
            .set(&table, RowId::new(1), "Status", Value::text("Cancelled"))
            .unwrap_err();
        assert!(matches!(error, EditError::InvalidValue { .. }));
    }

    #[test]
    fn set_accepts_null_for_enum_column() {
        let table = tasks_table();
        let mut edits = EditSet::new();
        edits
            .set(&table, RowId::new(1), "Status", Value::Null)
            .unwrap();
        assert_eq!(edits.get(RowId::new(1), "Status"), Some(&Value::Null));
    }

    #[test]
    fn clear_empties_the_session() {
        let table = tasks_table();
        let mut edits = EditSet::new();
        edits
            .set(&table, RowId::new(1), "Comments", Value::text("note"))
            .unwrap();
        edits.clear();
        assert!(edits.is_empty());
        assert_eq!(edits.len(), 0);
    }
}
