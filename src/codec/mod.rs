//! # Workbook Package Codec
//!
//! The boundary between the typed table model and the serialized document:
//! `decode` turns workbook bytes into raw sheet data, `encode` turns raw
//! sheet data back into bytes. Raw sheet data is an ordered header of
//! column names plus rows of scalar cells; everything richer (styles,
//! formulas, merged cells) is outside the boundary.
//!
//! The on-disk shape is a zip package holding SpreadsheetML parts. The
//! reader accepts the common subset real producers emit (shared strings,
//! inline strings, typed cells); the writer always emits the same
//! deterministic subset (fixed part order, inline strings only), so
//! decoding an encoded package yields exactly the data that was encoded.

mod reader;
mod reference;
mod writer;
mod xml;

pub use reader::decode;
pub use writer::encode;

use thiserror::Error;

/// Errors raised while reading or writing workbook packages.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("Workbook package is missing part '{0}'")]
    MissingPart(String),

    #[error("Parse entity '{0}' failed")]
    UnknownEntity(String),
}

/// Kind tag of a raw cell payload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RawCellKind {
    #[default]
    Empty,
    /// Textual content, shared and inline strings alike.
    Text,
    /// Numeric content, kept as its textual representation.
    Number,
    /// ISO date content (`t="d"` cells).
    Date,
}

/// One cell crossing the codec boundary: a kind tag plus the textual
/// payload, mirroring how cells are stored in the package itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawCell {
    pub kind: RawCellKind,
    pub value: String,
}

impl RawCell {
    pub fn empty() -> RawCell {
        RawCell::default()
    }

    pub fn text(value: &str) -> RawCell {
        RawCell {
            kind: RawCellKind::Text,
            value: value.to_owned(),
        }
    }

    pub fn number(value: f64) -> RawCell {
        RawCell {
            kind: RawCellKind::Number,
            value: value.to_string(),
        }
    }

    /// An ISO `YYYY-MM-DD` date cell.
    pub fn date(value: &str) -> RawCell {
        RawCell {
            kind: RawCellKind::Date,
            value: value.to_owned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == RawCellKind::Empty
    }
}

/// One sheet's raw data: the header of column names and the data rows,
/// each row aligned to the header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}
