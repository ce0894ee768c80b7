use indexmap::IndexMap;
use serde::Serialize;

use crate::data::{cell, Dataset, Row};
use crate::ir::RoleMap;

/// Rows included in a summary as a preview
pub const SAMPLE_ROWS: usize = 10;

/// Overview of a dataset: size, columns, observed cell types and roles
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub columns: Vec<String>,
    pub column_types: IndexMap<String, String>,
    pub column_roles: RoleMap,
    pub sample_data: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
}

/// Observed type of a column: the single non-null cell type, `mixed` when
/// several occur, `null` when every cell is null.
pub fn column_type(rows: &[Row], column: &str) -> &'static str {
    let mut seen: Option<&'static str> = None;
    for row in rows {
        let c = cell(row, column);
        if !c.is_non_null() {
            continue;
        }
        match seen {
            None => seen = Some(c.type_name()),
            Some(t) if t != c.type_name() => return "mixed",
            Some(_) => {}
        }
    }
    seen.unwrap_or("null")
}

pub fn summarize(dataset: &Dataset, roles: RoleMap) -> DatasetSummary {
    let columns = dataset.columns();
    let column_types = columns
        .iter()
        .map(|c| (c.clone(), column_type(&dataset.rows, c).to_string()))
        .collect();

    DatasetSummary {
        total_rows: dataset.len(),
        column_types,
        columns,
        column_roles: roles,
        sample_data: dataset.rows.iter().take(SAMPLE_ROWS).cloned().collect(),
        source_filename: dataset.source.clone(),
    }
}
