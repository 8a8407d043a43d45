//! Load-time options for building tables from raw sheet data.

/// Options applied while loading sheets into tables.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Enum column declarations: column name to its ordered allowed values.
    /// Enum-ness cannot be inferred from cell data, so columns like
    /// "Status" are declared here.
    pub enum_columns: Vec<(String, Vec<String>)>,

    /// Explicit natural key column. `None` auto-detects a column named
    /// `id` holding unique non-negative integers, falling back to
    /// synthetic sequential identities.
    pub key_column: Option<String>,
}

impl LoadOptions {
    /// Returns the declared allowed values for a column, if any.
    pub(crate) fn enum_values(&self, column: &str) -> Option<&[String]> {
        self.enum_columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, values)| values.as_slice())
    }
}
