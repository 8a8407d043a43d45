//! Scalar cell values.

use chrono::NaiveDate;
use std::fmt::Display;

/// Textual date layouts accepted when parsing cell text, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// A single cell value: the closed scalar union shared by tables, filters
/// and edits.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    /// Convenience constructor for text values.
    pub fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(date) => Some(*date),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(text) => write!(f, "{}", text),
            Value::Number(number) => write!(f, "{}", number),
            Value::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Parses a date from cell text; datetime strings keep only the date part.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let text = text.split(['T', ' ']).next().unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_iso() {
        assert_eq!(parse_date("2025-02-28"), NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(parse_date("2025/02/28"), NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(parse_date("02/28/2025"), NaiveDate::from_ymd_opt(2025, 2, 28));
    }

    #[test]
    fn parse_date_drops_time_component() {
        assert_eq!(
            parse_date("2025-02-28T14:30:00"),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
        assert_eq!(
            parse_date("2025-02-28 14:30:00"),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
    }

    #[test]
    fn parse_date_rejects_other_text() {
        assert_eq!(parse_date("Pending"), None);
        assert_eq!(parse_date("42"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::text("Pending").to_string(), "Pending");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(3.0).to_string(), "3");
        let date = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2025-02-28");
    }
}
