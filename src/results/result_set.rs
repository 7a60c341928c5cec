use std::collections::HashMap;
use std::sync::Arc;

use super::row::Row;
use crate::types::DbValue;

/// The ordered result of a fetch, or the affected-row count of a mutation.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query, in driver-native order
    pub rows: Vec<Row>,
    /// The number of rows returned or affected
    pub rows_affected: u64,
    // Shared by all rows; set once before rows are added
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
            column_index: None,
        }
    }

    /// Set the column names shared by every row of this result set, and
    /// build the one name→index map they all borrow.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        let index = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        self.column_names = Some(column_names);
        self.column_index = Some(index);
    }

    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row sharing this result set's column metadata. A no-op if
    /// `set_column_names` has not been called.
    pub fn add_row_values(&mut self, values: Vec<DbValue>) {
        if let (Some(column_names), Some(column_index)) =
            (&self.column_names, &self.column_index)
        {
            self.rows.push(Row {
                column_names: column_names.clone(),
                values,
                column_index: column_index.clone(),
            });
            self.rows_affected += 1;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// First row, if any.
    #[must_use]
    pub fn first_row(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Values of the first column across all rows, in row order.
    #[must_use]
    pub fn first_column(&self) -> Vec<DbValue> {
        self.rows
            .iter()
            .filter_map(|row| row.get_by_index(0).cloned())
            .collect()
    }
}
