pub mod colors;
pub mod filter;
pub mod loader;
pub mod pitch;
pub mod scene;
pub mod session;
pub mod stats;

use std::cmp::Ordering;
use std::fmt;

/// Start/end coordinate columns. Never offered as filter or color dimensions.
pub const COL_X: &str = "X";
pub const COL_Y: &str = "Y";
pub const COL_X2: &str = "X2";
pub const COL_Y2: &str = "Y2";
pub const COL_TIME: &str = "Time";

pub const COORDINATE_COLUMNS: [&str; 4] = [COL_X, COL_Y, COL_X2, COL_Y2];

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// One cell of the event table.
///
/// Ordering is total: `Missing < Number < Text`, numbers by IEEE total order,
/// text lexicographically. This keeps distinct-value sorting panic-free even
/// for columns that mix blanks, numbers and labels.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(n) => n.is_nan(),
            Value::Text(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            _ if self.is_missing() => 0,
            Value::Number(_) => 1,
            _ => 2,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if !a.is_nan() && !b.is_nan() => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NaN"),
            Value::Number(n) if n.is_nan() => write!(f, "NaN"),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

// ---------------------------------------------------------------------------
// Event table
// ---------------------------------------------------------------------------

/// Column-named event rows in file order. Every row has exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl EventTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, column: usize) -> &Value {
        static MISSING: Value = Value::Missing;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&MISSING)
    }

    /// Numeric cell by column name; `None` for absent columns, blanks and text.
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.value(row, idx).as_number()
    }

    /// Text cell by column name; `None` for absent columns and non-text cells.
    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.value(row, idx).as_text()
    }

    /// Sorted distinct non-missing values of a column.
    pub fn distinct(&self, column: usize) -> Vec<Value> {
        let mut values: Vec<Value> = self
            .rows
            .iter()
            .filter_map(|r| r.get(column))
            .filter(|v| !v.is_missing())
            .cloned()
            .collect();
        values.sort();
        values.dedup();
        values
    }

    pub fn column_has_missing(&self, column: usize) -> bool {
        self.rows
            .iter()
            .any(|r| r.get(column).is_none_or(Value::is_missing))
    }

    pub fn head(&self, n: usize) -> &[Vec<Value>] {
        &self.rows[..n.min(self.rows.len())]
    }
}
