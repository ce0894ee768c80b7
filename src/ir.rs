use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::data::Row;

// =============================================================================
// Classification
// =============================================================================

/// Semantic role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Identifier,
    Temporal,
    Categorical,
    Numeric,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Identifier => "identifier",
            Role::Temporal => "temporal",
            Role::Categorical => "categorical",
            Role::Numeric => "numeric",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column name -> role, in dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RoleMap(IndexMap<String, Role>);

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, role: Role) {
        self.0.insert(column.into(), role);
    }

    pub fn get(&self, column: &str) -> Option<Role> {
        self.0.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Role)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Columns holding `role`, in column order.
    pub fn columns_with(&self, role: Role) -> Vec<&str> {
        self.iter()
            .filter(|(_, r)| *r == role)
            .map(|(c, _)| c)
            .collect()
    }

    pub fn first(&self, role: Role) -> Option<&str> {
        self.iter().find(|(_, r)| *r == role).map(|(c, _)| c)
    }

    pub fn count(&self, role: Role) -> usize {
        self.iter().filter(|(_, r)| *r == role).count()
    }
}

impl FromIterator<(String, Role)> for RoleMap {
    fn from_iter<I: IntoIterator<Item = (String, Role)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Visualization descriptors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Scatter,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
        }
    }
}

/// A plain record in reshaped chart data. Keys are either original column
/// names or synthetic ones (`bin`, `count`, `x`, `y`).
pub type Record = Row;

/// Output unit of the engine: what to draw and with which data.
///
/// `data` is never empty; rules that would produce nothing yield no
/// descriptor at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationDescriptor {
    pub chart_type: ChartType,
    pub data: Vec<Record>,
    pub x_axis_key: String,
    pub y_axis_key: String,
    pub caption: String,
}
