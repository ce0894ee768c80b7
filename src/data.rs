use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// A single typed cell.
///
/// Predicates on this type are the only way rules inspect values, so every
/// rule agrees on what "numeric" and "present" mean.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    pub fn is_finite_number(&self) -> bool {
        matches!(self, Cell::Number(n) if n.is_finite())
    }

    pub fn is_non_null(&self) -> bool {
        !matches!(self, Cell::Null)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Cell::Text(_))
    }

    /// The value as a finite `f64`, if it is one.
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Numeric view used for ordering mixed columns: nulls and text count as 0.
    pub fn numeric_or_zero(&self) -> f64 {
        match self {
            Cell::Number(n) if !n.is_nan() => *n,
            _ => 0.0,
        }
    }

    /// Type name as reported in dataset summaries.
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Number(_) => "number",
            Cell::Text(_) => "string",
            Cell::Null => "null",
        }
    }

    /// Key used for cardinality checks. Two cells share a key only if they
    /// are the same variant with the same value.
    pub fn distinct_key(&self) -> CellKey<'_> {
        match self {
            // Fold -0.0 into 0.0 so they compare equal
            Cell::Number(n) => CellKey::Number((n + 0.0).to_bits()),
            Cell::Text(s) => CellKey::Text(s),
            Cell::Null => CellKey::Null,
        }
    }

    /// Build a cell from a raw CSV field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::String(s) => Cell::Text(s.clone()),
            Value::Bool(b) => Cell::Text(b.to_string()),
            // Nested values are passed through for display only
            other => Cell::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKey<'a> {
    Number(u64),
    Text(&'a str),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Text(s) => f.write_str(s),
            Cell::Null => f.write_str("null"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Cell::Number(_) | Cell::Null => serializer.serialize_unit(),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// Integral values print without a fractional part ("3", not "3.0").
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Order cells for display sorting: numbers numerically, text lexically,
/// numbers before text. Nulls are handled by the caller.
pub fn compare_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        (Cell::Number(_), Cell::Text(_)) => Ordering::Less,
        (Cell::Text(_), Cell::Number(_)) => Ordering::Greater,
        (Cell::Null, Cell::Null) => Ordering::Equal,
        (Cell::Null, _) => Ordering::Greater,
        (_, Cell::Null) => Ordering::Less,
    }
}

/// One record: column name to cell, in column order.
pub type Row = IndexMap<String, Cell>;

/// Look up a column, treating a missing key as null.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a Cell {
    row.get(column).unwrap_or(&Cell::Null)
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<Row>,
    pub source: Option<String>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, source: None }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Column names in the order of the first row's keys.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a dataset from headers and raw string rows (CSV shape).
    pub fn from_records(headers: &[String], records: Vec<Vec<String>>) -> Self {
        let rows = records
            .into_iter()
            .map(|record| {
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| {
                        let cell = record.get(i).map(|s| Cell::parse(s)).unwrap_or(Cell::Null);
                        (h.clone(), cell)
                    })
                    .collect()
            })
            .collect();
        Self::new(rows)
    }

    /// Create a dataset from a JSON array of objects.
    ///
    /// An empty array is a valid, empty dataset.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| Error::InvalidInput("input data must be a JSON array of objects".into()))?;

        let mut rows = Vec::with_capacity(array.len());
        for (idx, item) in array.iter().enumerate() {
            let obj = item.as_object().ok_or_else(|| {
                Error::InvalidInput(format!("item {} in array is not an object", idx))
            })?;
            let row: Row = obj
                .iter()
                .map(|(k, v)| (k.clone(), Cell::from_json(v)))
                .collect();
            rows.push(row);
        }

        Ok(Self::new(rows))
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(&value)
    }

    /// Drop rows in which every cell is null. Returns how many were removed.
    pub fn drop_empty_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| row.values().any(Cell::is_non_null));
        before - self.rows.len()
    }
}
