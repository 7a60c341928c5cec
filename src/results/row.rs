use std::collections::HashMap;
use std::sync::Arc;

use crate::types::DbValue;

/// A single row from a query result.
///
/// Column names and the name→index map are shared across every row of a
/// result set, so a row adds only its values.
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row, in driver-native order
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<DbValue>,
    // Shared lookup map to avoid repeated string comparisons
    pub(crate) column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Create a standalone row. Result sets built by the adapters share the
    /// lookup map instead of rebuilding it per row.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<DbValue>) -> Self {
        let column_index = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// Index of a column by name, or None if the row has no such column.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index.get(column_name) {
            return Some(idx);
        }
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Value of a column by name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&DbValue> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Value of a column by position.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&DbValue> {
        self.values.get(index)
    }
}
