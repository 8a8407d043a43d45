//! # Workbook Model
//!
//! The uploaded document as a value: an insertion-ordered collection of
//! uniquely named tables, loaded once through the codec and thereafter
//! only replaced, never mutated in place. Every operation that changes a
//! workbook returns a new one, so callers can hold onto prior snapshots
//! and no locking discipline is needed.

mod column;
mod options;
mod row;
mod table;
mod value;

pub use column::Column;
pub use column::ColumnKind;
pub use options::LoadOptions;
pub use row::Row;
pub use row::RowId;
pub use table::Table;
pub use value::Value;

use crate::codec;
use crate::codec::CodecError;
use crate::error::SheetboardError;
use log::debug;
use std::path::Path;
use thiserror::Error;

/// Malformed or empty document structure.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Sheet '{0}' has no columns")]
    NoColumns(String),

    #[error("Sheet '{sheet}' declares column '{column}' more than once")]
    DuplicateColumn { sheet: String, column: String },

    #[error("Sheet '{sheet}' has no key column '{column}'")]
    MissingKeyColumn { sheet: String, column: String },

    #[error("Key column '{column}' of sheet '{sheet}' does not hold unique non-negative integers")]
    UnusableKeyColumn { sheet: String, column: String },
}

/// A sheet or column was referenced but is absent.
#[derive(Error, Debug)]
pub enum NotFoundError {
    #[error("Sheet '{0}' not found")]
    Sheet(String),

    #[error("Column '{0}' not found")]
    Column(String),
}

/// A sheet was created under an unusable name.
#[derive(Error, Debug)]
pub enum DuplicateNameError {
    #[error("Sheet '{0}' already exists")]
    Existing(String),

    #[error("Sheet name must not be empty")]
    Empty,
}

/// The whole document: uniquely named tables in insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct Workbook {
    pub(crate) tables: Vec<Table>,
}

impl Workbook {
    /// Assembles a workbook from already-loaded tables. At least one table
    /// is required and names must be unique.
    pub fn from_tables(tables: Vec<Table>) -> Result<Workbook, SheetboardError> {
        if tables.is_empty() {
            Err(SchemaError::NoSheets)?;
        }
        for (index, table) in tables.iter().enumerate() {
            if tables[..index].iter().any(|other| other.name == table.name) {
                Err(DuplicateNameError::Existing(table.name.to_owned()))?;
            }
        }
        Ok(Workbook { tables })
    }

    /// Decodes workbook bytes and loads every sheet into a table.
    pub fn load(bytes: &[u8], options: &LoadOptions) -> Result<Workbook, SheetboardError> {
        let sheets = codec::decode(bytes)?;
        if sheets.is_empty() {
            Err(SchemaError::NoSheets)?;
        }
        let tables = sheets
            .iter()
            .map(|(name, sheet)| Table::load(name, sheet, options))
            .collect::<Result<Vec<Table>, SchemaError>>()?;
        Workbook::from_tables(tables)
    }

    /// Reads and loads a workbook file.
    pub fn open<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Workbook, SheetboardError> {
        let bytes = std::fs::read(&path)?;
        debug!(
            "read workbook '{}': {} bytes",
            path.as_ref().display(),
            bytes.len()
        );
        Workbook::load(&bytes, options)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Sheet names in insertion order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tables.iter().map(|table| table.name.as_str())
    }

    /// Looks up a sheet's table by name.
    pub fn table(&self, name: &str) -> Result<&Table, NotFoundError> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .ok_or_else(|| NotFoundError::Sheet(name.to_owned()))
    }

    /// Returns a new workbook with an appended empty sheet copying
    /// `source`'s column structure (a new project seeded from an existing
    /// one's task layout).
    pub fn add_sheet(&self, name: &str, source: &Table) -> Result<Workbook, DuplicateNameError> {
        if name.is_empty() {
            return Err(DuplicateNameError::Empty);
        }
        if self.tables.iter().any(|table| table.name == name) {
            return Err(DuplicateNameError::Existing(name.to_owned()));
        }
        let mut workbook = self.clone();
        workbook.tables.push(Table {
            name: name.to_owned(),
            columns: source.columns.clone(),
            rows: Vec::new(),
        });
        Ok(workbook)
    }

    /// Re-encodes every sheet; sheet order is insertion order and equal
    /// workbooks serialize to equal bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        let sheets: Vec<(String, codec::RawSheet)> = self
            .tables
            .iter()
            .map(|table| (table.name.to_owned(), table.to_raw()))
            .collect();
        codec::encode(&sheets)
    }

    /// Serializes the workbook to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SheetboardError> {
        let bytes = self.serialize()?;
        std::fs::write(&path, &bytes)?;
        debug!(
            "wrote workbook '{}': {} bytes",
            path.as_ref().display(),
            bytes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RawCell;
    use crate::codec::RawSheet;

    fn tasks_sheet() -> RawSheet {
        RawSheet {
            columns: vec!["Id".to_owned(), "Task Name".to_owned(), "Status".to_owned()],
            rows: vec![
                vec![
                    RawCell::number(1.0),
                    RawCell::text("Design survey"),
                    RawCell::text("Pending"),
                ],
                vec![
                    RawCell::number(2.0),
                    RawCell::text("Field review"),
                    RawCell::text("Completed"),
                ],
            ],
        }
    }

    fn workbook() -> Workbook {
        let alpha = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        let beta = Table::load("Beta", &tasks_sheet(), &LoadOptions::default()).unwrap();
        Workbook::from_tables(vec![alpha, beta]).unwrap()
    }

    #[test]
    fn from_tables_rejects_empty() {
        let error = Workbook::from_tables(Vec::new()).unwrap_err();
        assert!(matches!(
            error,
            SheetboardError::Schema(SchemaError::NoSheets)
        ));
    }

    #[test]
    fn from_tables_rejects_duplicate_names() {
        let table = Table::load("Alpha", &tasks_sheet(), &LoadOptions::default()).unwrap();
        let error = Workbook::from_tables(vec![table.clone(), table]).unwrap_err();
        assert!(matches!(error, SheetboardError::DuplicateName(_)));
    }

    #[test]
    fn table_lookup() {
        let workbook = workbook();
        assert_eq!(workbook.table("Beta").unwrap().name(), "Beta");
        assert!(matches!(
            workbook.table("Gamma"),
            Err(NotFoundError::Sheet(_))
        ));
    }

    #[test]
    fn add_sheet_copies_columns_without_rows() {
        let workbook = workbook();
        let source = workbook.table("Alpha").unwrap();
        let extended = workbook.add_sheet("NewProj", source).unwrap();

        let sheet = extended.table("NewProj").unwrap();
        assert_eq!(sheet.columns(), source.columns());
        assert!(sheet.is_empty());
        // The input workbook is untouched
        assert_eq!(workbook.tables().len(), 2);
    }

    #[test]
    fn add_sheet_rejects_existing_and_empty_names() {
        let workbook = workbook();
        let source = workbook.table("Alpha").unwrap().clone();
        let extended = workbook.add_sheet("NewProj", &source).unwrap();

        assert!(matches!(
            extended.add_sheet("NewProj", &source),
            Err(DuplicateNameError::Existing(_))
        ));
        assert!(matches!(
            extended.add_sheet("", &source),
            Err(DuplicateNameError::Empty)
        ));
    }

    #[test]
    fn serialize_load_round_trip() {
        let workbook = workbook();
        let bytes = workbook.serialize().unwrap();
        let reloaded = Workbook::load(&bytes, &LoadOptions::default()).unwrap();
        assert_eq!(reloaded, workbook);
    }

    #[test]
    fn serialize_preserves_sheet_order() {
        let workbook = workbook();
        let bytes = workbook.serialize().unwrap();
        let reloaded = Workbook::load(&bytes, &LoadOptions::default()).unwrap();
        let names: Vec<&str> = reloaded.sheet_names().collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }
}
