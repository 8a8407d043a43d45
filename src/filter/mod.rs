//! # Filter Engine
//!
//! Declarative, composable row filtering: a `FilterSpec` is a conjunction
//! of per-column accepted-value sets, and `apply` evaluates it into a
//! read-only view over a table. Filtering never mutates the table and a
//! view never outlives it.

use crate::workbook::NotFoundError;
use crate::workbook::Row;
use crate::workbook::Table;
use crate::workbook::Value;

/// An immutable conjunction of (column, accepted values) constraints.
///
/// `with` returns an updated copy; passing an empty accepted set removes
/// the constraint, matching the "All" choice of a filter widget.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSpec {
    constraints: Vec<(String, Vec<Value>)>,
}

impl FilterSpec {
    pub fn new() -> FilterSpec {
        FilterSpec::default()
    }

    /// Returns a new spec with the constraint on `column` replaced by
    /// `accepted` (deduplicated), or removed when `accepted` is empty.
    pub fn with(&self, column: &str, accepted: Vec<Value>) -> FilterSpec {
        let mut constraints: Vec<(String, Vec<Value>)> = self
            .constraints
            .iter()
            .filter(|(name, _)| name != column)
            .cloned()
            .collect();
        if !accepted.is_empty() {
            let mut values = Vec::<Value>::new();
            for value in accepted {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            constraints.push((column.to_owned(), values));
        }
        FilterSpec { constraints }
    }

    /// The accepted values currently constraining `column`, if any.
    pub fn accepted(&self, column: &str) -> Option<&[Value]> {
        self.constraints
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, values)| values.as_slice())
    }

    /// True when no column is constrained.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// A read-only filtered view: the rows of a table satisfying a spec, in
/// original order.
pub struct FilteredView<'a> {
    table: &'a Table,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Matching rows in original order. Restartable.
    pub fn rows(&self) -> impl Iterator<Item = &'a Row> + '_ {
        let table = self.table;
        self.indices.iter().map(move |index| &table.rows[*index])
    }

    pub fn row_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Materializes the view as a standalone table with the same name and
    /// columns, holding copies of the matching rows.
    pub fn to_table(&self) -> Table {
        Table {
            name: self.table.name().to_owned(),
            columns: self.table.columns().to_vec(),
            rows: self.rows().cloned().collect(),
        }
    }
}

/// Evaluates `spec` against `table`.
///
/// A row is included iff, for every constrained column, its value is a
/// member of that column's accepted set. No constraints means the identity
/// view. Pure: the table is never modified, and applying the same spec to
/// its own output changes nothing.
pub fn apply<'a>(table: &'a Table, spec: &FilterSpec) -> Result<FilteredView<'a>, NotFoundError> {
    let constraints = spec
        .constraints
        .iter()
        .map(|(name, accepted)| {
            table
                .column_index(name)
                .map(|index| (index, accepted))
                .ok_or_else(|| NotFoundError::Column(name.to_owned()))
        })
        .collect::<Result<Vec<(usize, &Vec<Value>)>, NotFoundError>>()?;

    let indices = table
        .rows()
        .enumerate()
        .filter(|(_, row)| {
            constraints
                .iter()
                .all(|(index, accepted)| accepted.contains(&row.values()[*index]))
        })
        .map(|(index, _)| index)
        .collect();
    Ok(FilteredView { table, indices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RawCell;
    use crate::codec::RawSheet;
    use crate::workbook::LoadOptions;
    use crate::workbook::RowId;

    fn tasks_table() -> Table {
        let sheet = RawSheet {
            columns: vec!["Id".to_owned(), "Assignee".to_owned(), "Status".to_owned()],
            rows: vec![
                vec![RawCell::number(1.0), RawCell::text("Mira"), RawCell::text("Pending")],
                vec![RawCell::number(2.0), RawCell::text("Janek"), RawCell::text("Completed")],
                vec![RawCell::number(3.0), RawCell::text("Mira"), RawCell::text("Completed")],
                vec![RawCell::number(4.0), RawCell::text("Sol"), RawCell::text("In process")],
            ],
        };
        Table::load("Alpha", &sheet, &LoadOptions::default()).unwrap()
    }

    fn ids(view: &FilteredView<'_>) -> Vec<RowId> {
        view.rows().map(Row::id).collect()
    }

    #[test]
    fn empty_spec_is_identity() {
        let table = tasks_table();
        let view = apply(&table, &FilterSpec::new()).unwrap();
        assert_eq!(ids(&view), vec![RowId::new(1), RowId::new(2), RowId::new(3), RowId::new(4)]);
    }

    #[test]
    fn single_constraint_selects_members() {
        let table = tasks_table();
        let spec = FilterSpec::new().with("Status", vec![Value::text("Completed")]);
        let view = apply(&table, &spec).unwrap();
        assert_eq!(ids(&view), vec![RowId::new(2), RowId::new(3)]);
    }

    #[test]
    fn constraints_compose_with_and() {
        let table = tasks_table();
        let spec = FilterSpec::new()
            .with("Status", vec![Value::text("Completed")])
            .with("Assignee", vec![Value::text("Mira")]);
        let view = apply(&table, &spec).unwrap();
        assert_eq!(ids(&view), vec![RowId::new(3)]);
    }

    #[test]
    fn multiple_accepted_values_union_within_a_column() {
        let table = tasks_table();
        let spec = FilterSpec::new().with(
            "Status",
            vec![Value::text("Pending"), Value::text("In process")],
        );
        let view = apply(&table, &spec).unwrap();
        assert_eq!(ids(&view), vec![RowId::new(1), RowId::new(4)]);
    }

    #[test]
    fn empty_accepted_set_removes_constraint() {
        let table = tasks_table();
        let spec = FilterSpec::new()
            .with("Status", vec![Value::text("Completed")])
            .with("Status", Vec::new());
        assert!(spec.is_empty());
        let view = apply(&table, &spec).unwrap();
        assert_eq!(view.row_count(), 4);
    }

    #[test]
    fn with_replaces_existing_constraint() {
        let spec = FilterSpec::new()
            .with("Status", vec![Value::text("Pending")])
            .with("Status", vec![Value::text("Completed")]);
        assert_eq!(spec.accepted("Status"), Some(&[Value::text("Completed")][..]));
    }

    #[test]
    fn with_deduplicates_accepted_values() {
        let spec = FilterSpec::new().with(
            "Status",
            vec![Value::text("Pending"), Value::text("Pending")],
        );
        assert_eq!(spec.accepted("Status").map(<[Value]>::len), Some(1));
    }

    #[test]
    fn filtering_is_idempotent() {
        let table = tasks_table();
        let spec = FilterSpec::new().with("Assignee", vec![Value::text("Mira")]);
        let once = apply(&table, &spec).unwrap();
        let survivors = ids(&once);

        let materialized = once.to_table();
        let twice = apply(&materialized, &spec).unwrap();
        assert_eq!(ids(&twice), survivors);
        assert_eq!(twice.row_count(), materialized.row_count());
    }

    #[test]
    fn unknown_column_is_reported() {
        let table = tasks_table();
        let spec = FilterSpec::new().with("Priority", vec![Value::text("High")]);
        assert!(matches!(
            apply(&table, &spec),
            Err(NotFoundError::Column(_))
        ));
    }

    #[test]
    fn view_never_mutates_the_table() {
        let table = tasks_table();
        let before = table.clone();
        let spec = FilterSpec::new().with("Status", vec![Value::text("Completed")]);
        let _ = apply(&table, &spec).unwrap();
        assert_eq!(table, before);
    }
}
