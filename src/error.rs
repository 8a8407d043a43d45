use thiserror::Error;

/// Crate-level error type.
/// Aggregates the per-module error enums so callers driving the whole
/// load-filter-edit-reconcile pipeline can hold a single error type.
#[derive(Error, Debug)]
pub enum SheetboardError {
    #[error("{0}")]
    Schema(#[from] crate::workbook::SchemaError),

    #[error("{0}")]
    NotFound(#[from] crate::workbook::NotFoundError),

    #[error("{0}")]
    DuplicateName(#[from] crate::workbook::DuplicateNameError),

    #[error("{0}")]
    Edit(#[from] crate::edit::EditError),

    #[error("{0}")]
    Codec(#[from] crate::codec::CodecError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
