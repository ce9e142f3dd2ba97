//! Result rows and scoped result-set access.

use crate::error::{Error, Result, TypeError};
use crate::types::SqlType;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column metadata shared across all rows in a result set.
///
/// Wrapped in `Arc` so every row from the same query shares one instance.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Column names in select-list order
    names: Vec<String>,
    /// SQL types in select-list order
    sql_types: Vec<SqlType>,
    /// Name -> index mapping for O(1) lookup
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create column info from parallel name/type lists.
    pub fn new(names: Vec<String>, sql_types: Vec<SqlType>) -> Self {
        debug_assert_eq!(names.len(), sql_types.len());
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            sql_types,
            name_to_index,
        }
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the 0-based index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get the name of a column by 0-based index.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Get the SQL type of a column by 0-based index.
    pub fn sql_type_at(&self, index: usize) -> Option<&SqlType> {
        self.sql_types.get(index)
    }
}

/// A single row returned from a query.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values in order
    values: Vec<Value>,
    /// Shared column metadata
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a new row with shared column metadata.
    pub fn new(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get the shared column metadata.
    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    /// Get a value by 0-based index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Number of values in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Scoped access to one statement execution's result set.
///
/// This is the narrow capability the result assembler reads through: column
/// metadata by 1-based position (matching driver-level result indexing) plus
/// an explicit `release`. Implementations must make `release` safe to call
/// from cleanup paths even if the backing resources are already gone, and
/// safe to call more than once.
pub trait ResultSetAccess {
    /// Number of columns in the result set.
    fn column_count(&self) -> usize;

    /// Resolve a 1-based position to a column name.
    fn column_name(&self, position: usize) -> Result<&str>;

    /// Resolve a column name to its 1-based position.
    fn position_of(&self, name: &str) -> Result<usize>;

    /// Resolve a 1-based position to the column's SQL type.
    fn sql_type(&self, position: usize) -> Result<SqlType>;

    /// Release the underlying resources. Idempotent.
    fn release(&mut self);
}

/// An in-memory result set over rows already fetched from a `Connection`.
///
/// One instance per logical query execution; nothing is cached across
/// `release` calls.
#[derive(Debug)]
pub struct BufferedResultSet {
    columns: Arc<ColumnInfo>,
    rows: Vec<Row>,
    cursor: usize,
    released: bool,
}

impl BufferedResultSet {
    /// Wrap a fetched row list.
    ///
    /// An empty result set still needs column metadata, so the column info
    /// is passed explicitly rather than taken from the first row.
    pub fn new(columns: Arc<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            cursor: 0,
            released: false,
        }
    }

    /// Advance to the next row, returning it, or `None` when exhausted
    /// or released.
    pub fn next_row(&mut self) -> Option<&Row> {
        if self.released || self.cursor >= self.rows.len() {
            return None;
        }
        let row = &self.rows[self.cursor];
        self.cursor += 1;
        Some(row)
    }

    /// Number of rows remaining before the cursor is exhausted.
    pub fn remaining(&self) -> usize {
        if self.released {
            0
        } else {
            self.rows.len() - self.cursor
        }
    }
}

impl ResultSetAccess for BufferedResultSet {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, position: usize) -> Result<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.columns.name_at(i))
            .ok_or_else(|| Error::query(format!("no column at position {position}")))
    }

    fn position_of(&self, name: &str) -> Result<usize> {
        self.columns
            .index_of(name)
            .map(|i| i + 1)
            .ok_or_else(|| Error::query(format!("no column named {name}")))
    }

    fn sql_type(&self, position: usize) -> Result<SqlType> {
        position
            .checked_sub(1)
            .and_then(|i| self.columns.sql_type_at(i))
            .cloned()
            .ok_or_else(|| Error::query(format!("no column at position {position}")))
    }

    fn release(&mut self) {
        if !self.released {
            tracing::trace!(rows = self.rows.len(), "releasing result set");
        }
        self.rows.clear();
        self.cursor = 0;
        self.released = true;
    }
}

/// Read a value out of a row at a 1-based result-set position, failing with
/// a `Type` error when the position is out of range.
pub fn value_at(row: &Row, position: usize) -> Result<Value> {
    position
        .checked_sub(1)
        .and_then(|i| row.get(i))
        .cloned()
        .ok_or_else(|| {
            Error::Type(TypeError {
                expected: "a value at the resolved position",
                actual: format!("row of {} values, position {position}", row.len()),
                column: None,
            })
        })
}
