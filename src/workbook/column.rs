//! Column declarations and kind inference.

use crate::codec::RawCell;
use crate::codec::RawCellKind;
use crate::workbook::value::parse_date;
use crate::workbook::value::Value;

/// Declared kind of a table column.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnKind {
    Text,
    Number,
    Date,
    /// Closed, ordered set of allowed text values.
    Enum(Vec<String>),
}

/// A named, typed column of a table. Names are unique within their table.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnKind {
    /// Infers the kind from the first non-null cell of a column. Date
    /// columns are recognized by date cells or date-parseable text.
    pub(crate) fn infer(cell: &RawCell) -> ColumnKind {
        match cell.kind {
            RawCellKind::Number => ColumnKind::Number,
            RawCellKind::Date => ColumnKind::Date,
            RawCellKind::Text if parse_date(&cell.value).is_some() => ColumnKind::Date,
            _ => ColumnKind::Text,
        }
    }

    /// Checks a value against this kind's enum constraint. Null always
    /// passes; non-enum kinds accept any scalar.
    pub fn allows(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnKind::Enum(allowed), Value::Text(text)) => {
                allowed.iter().any(|candidate| candidate == text)
            }
            (ColumnKind::Enum(_), _) => false,
            _ => true,
        }
    }
}
