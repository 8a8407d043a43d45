//! # Sheetboard
//!
//! The core engine behind spreadsheet-backed dashboards: load a workbook
//! into typed in-memory tables, filter rows with composable predicates,
//! collect cell edits against stable row identities, and reconcile the
//! edits back into the workbook for export.
//!
//! ## Features
//!
//! - **Typed tables**: sheets become tables of text, number and date
//!   columns, with enum columns (fixed allowed values) declared at load
//! - **Stable row identities**: natural keys when the data has them,
//!   synthetic sequential ids otherwise, never derived from display order
//! - **Composable filtering**: per-column accepted-value sets combined
//!   with logical AND, evaluated into read-only views
//! - **Batched editing**: sparse edit sets validated as they are recorded
//!   and merged atomically by the reconciler
//! - **Deterministic export**: workbooks re-encode to a zip+XML package
//!   that decodes back to exactly the same data
//! - **Value semantics**: mutating operations return new workbooks and
//!   tables; prior snapshots stay valid
//!
//! ## Pipeline
//!
//! Workbook is loaded once, a table is selected, a filter spec produces a
//! view, edits accumulate against row identities from the unfiltered
//! table, the reconciler folds them back in, and the workbook serializes
//! for download:
//!
//! ```
//! use sheetboard::{filter, reconcile, EditSet, FilterSpec, LoadOptions};
//! use sheetboard::{RawCell, RawSheet, RowId, Table, Value};
//!
//! let sheet = RawSheet {
//!     columns: vec!["Id".to_owned(), "Task Name".to_owned(), "Status".to_owned()],
//!     rows: vec![
//!         vec![RawCell::number(1.0), RawCell::text("Design"), RawCell::text("Pending")],
//!         vec![RawCell::number(2.0), RawCell::text("Review"), RawCell::text("Completed")],
//!     ],
//! };
//! let options = LoadOptions {
//!     enum_columns: vec![("Status".to_owned(), vec![
//!         "Pending".to_owned(), "In process".to_owned(), "Completed".to_owned(),
//!     ])],
//!     ..LoadOptions::default()
//! };
//! let table = Table::load("Alpha", &sheet, &options)?;
//!
//! let pending = FilterSpec::new().with("Status", vec![Value::text("Pending")]);
//! assert_eq!(filter::apply(&table, &pending)?.row_count(), 1);
//!
//! let mut edits = EditSet::new();
//! edits.set(&table, RowId::new(1), "Status", Value::text("Completed"))?;
//! let updated = reconcile::apply(&table, &edits);
//! assert!(filter::apply(&updated, &pending)?.is_empty());
//! # Ok::<(), sheetboard::SheetboardError>(())
//! ```

pub mod codec;
pub mod edit;
pub mod error;
pub mod filter;
pub mod summary;
pub mod workbook;

pub use crate::codec::RawCell;
pub use crate::codec::RawCellKind;
pub use crate::codec::RawSheet;
pub use crate::edit::reconcile;
pub use crate::edit::EditError;
pub use crate::edit::EditSet;
pub use crate::error::SheetboardError;
pub use crate::filter::FilterSpec;
pub use crate::filter::FilteredView;
pub use crate::workbook::Column;
pub use crate::workbook::ColumnKind;
pub use crate::workbook::DuplicateNameError;
pub use crate::workbook::LoadOptions;
pub use crate::workbook::NotFoundError;
pub use crate::workbook::Row;
pub use crate::workbook::RowId;
pub use crate::workbook::SchemaError;
pub use crate::workbook::Table;
pub use crate::workbook::Value;
pub use crate::workbook::Workbook;
