use indexmap::IndexMap;
use serde_json::Value;

use super::consistency::{ConsistencyStates, Signal, Signals};
use crate::error::{ChartError, ChartResult};
use super::invalidation::{Invalidatable, InvalidationState};

/// One data row, fields in insertion order.
pub type Row = IndexMap<String, Value>;

/// Cursor over tabular data consumed by grids and charts.
///
/// `get`, `meta` and `set_meta` are optional capabilities. A source that
/// lacks them answers with [`ChartError::UnsupportedOperation`].
pub trait DataSource {
    /// Type name carried by [`ChartError::UnsupportedOperation`].
    fn kind(&self) -> &'static str;

    /// Moves the cursor before the first row.
    fn reset(&mut self);

    /// Moves to the next row; `false` once past the end.
    fn advance(&mut self) -> bool;

    /// Jumps to `index`; `false` (cursor unchanged) when out of range.
    fn select(&mut self, index: usize) -> bool;

    fn index(&self) -> Option<usize>;

    fn rows_count(&self) -> usize;

    /// Field of the current row; `Ok(None)` off the rows or for a missing field.
    fn get(&self, field: &str) -> ChartResult<Option<Value>> {
        let _ = field;
        Err(self.unsupported("get"))
    }

    fn meta(&self, key: &str) -> ChartResult<Option<Value>> {
        let _ = key;
        Err(self.unsupported("meta"))
    }

    fn set_meta(&mut self, key: &str, value: Value) -> ChartResult<()> {
        let _ = (key, value);
        Err(self.unsupported("set_meta"))
    }

    fn unsupported(&self, operation: &'static str) -> ChartError {
        ChartError::UnsupportedOperation {
            kind: self.kind(),
            operation,
        }
    }
}

const TABLE_SIGNALS: Signals =
    Signals::from_signal(Signal::DataChanged).with_signal(Signal::MetaChanged);

/// In-memory rows with per-row metadata (`selected`, `collapsed`, ...).
#[derive(Debug)]
pub struct TableDataSource {
    rows: Vec<Row>,
    meta: Vec<IndexMap<String, Value>>,
    cursor: Option<usize>,
    invalidation: InvalidationState,
}

impl Default for TableDataSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TableDataSource {
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        let meta = vec![IndexMap::new(); rows.len()];
        Self {
            rows,
            meta,
            cursor: None,
            invalidation: InvalidationState::new(
                "table_data",
                ConsistencyStates::none(),
                TABLE_SIGNALS,
            ),
        }
    }

    /// Builds rows from `(field, value)` pairs.
    #[must_use]
    pub fn from_fields<I, R, K>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|(key, value)| (key.into(), value)).collect())
                .collect(),
        )
    }

    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.meta = vec![IndexMap::new(); rows.len()];
        self.rows = rows;
        self.cursor = None;
        self.invalidation
            .invalidate(ConsistencyStates::none(), Signal::DataChanged);
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
        self.meta.push(IndexMap::new());
        self.invalidation
            .invalidate(ConsistencyStates::none(), Signal::DataChanged);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn field(&self, index: usize, field: &str) -> Option<&Value> {
        self.rows.get(index)?.get(field)
    }

    /// Numeric field, accepting numbers and numeric strings.
    #[must_use]
    pub fn field_f64(&self, index: usize, field: &str) -> Option<f64> {
        match self.field(index, field)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn row_meta(&self, index: usize, key: &str) -> Option<&Value> {
        self.meta.get(index)?.get(key)
    }

    #[must_use]
    pub fn row_flag(&self, index: usize, key: &str) -> bool {
        matches!(self.row_meta(index, key), Some(Value::Bool(true)))
    }

    /// Stores metadata for a row. Returns `false` for stale indices.
    pub fn set_row_meta(&mut self, index: usize, key: &str, value: Value) -> bool {
        let Some(meta) = self.meta.get_mut(index) else {
            return false;
        };
        if meta.get(key) == Some(&value) {
            return true;
        }
        meta.insert(key.to_owned(), value);
        self.invalidation
            .invalidate(ConsistencyStates::none(), Signal::MetaChanged);
        true
    }
}

impl DataSource for TableDataSource {
    fn kind(&self) -> &'static str {
        "TableDataSource"
    }

    fn reset(&mut self) {
        self.cursor = None;
    }

    fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |index| index + 1);
        if next < self.rows.len() {
            self.cursor = Some(next);
            true
        } else {
            self.cursor = Some(self.rows.len());
            false
        }
    }

    fn select(&mut self, index: usize) -> bool {
        if index < self.rows.len() {
            self.cursor = Some(index);
            true
        } else {
            false
        }
    }

    fn index(&self) -> Option<usize> {
        self.cursor.filter(|index| *index < self.rows.len())
    }

    fn rows_count(&self) -> usize {
        self.rows.len()
    }

    fn get(&self, field: &str) -> ChartResult<Option<Value>> {
        Ok(self
            .index()
            .and_then(|index| self.field(index, field))
            .cloned())
    }

    fn meta(&self, key: &str) -> ChartResult<Option<Value>> {
        Ok(self
            .index()
            .and_then(|index| self.row_meta(index, key))
            .cloned())
    }

    fn set_meta(&mut self, key: &str, value: Value) -> ChartResult<()> {
        if let Some(index) = self.index() {
            self.set_row_meta(index, key, value);
        }
        Ok(())
    }
}

impl Invalidatable for TableDataSource {
    fn invalidation(&self) -> &InvalidationState {
        &self.invalidation
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        &mut self.invalidation
    }
}
