//! Column role inference.
//!
//! A column's role is decided from its name and its values alone; nothing is
//! configured per dataset. The first matching check wins:
//!
//! 1. identifier: named `id`/`name`, or a name containing `id` whose values are all distinct
//! 2. temporal: a time-ish name, or a first sampled value shaped like a date
//! 3. numeric: every sampled value is a finite number
//! 4. categorical: textual samples with few distinct values
//! 5. otherwise numeric if most samples are numbers, else categorical

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::data::{cell, Cell, Row};
use crate::error::{Error, Result};
use crate::ir::{Role, RoleMap};
use crate::parser::looks_like_date;

const IDENTIFIER_NAMES: &[&str] = &["id", "name"];

const TEMPORAL_KEYWORDS: &[&str] = &[
    "date", "time", "year", "month", "day", "joined", "created", "updated",
];

/// Classifies single columns against a fixed set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct ColumnClassifier {
    config: EngineConfig,
}

impl ColumnClassifier {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Classify one column.
    ///
    /// `samples` are the column's non-null values from the sampling window;
    /// `all_values` is the full column (nulls included) and is only used for
    /// the identifier uniqueness check.
    pub fn classify(&self, name: &str, samples: &[&Cell], all_values: &[&Cell]) -> Role {
        let lower = name.to_lowercase();

        if IDENTIFIER_NAMES.contains(&lower.as_str()) {
            return Role::Identifier;
        }
        // Scans the whole column, not just the sample window.
        if lower.contains("id") && all_distinct(all_values) {
            return Role::Identifier;
        }

        if TEMPORAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Role::Temporal;
        }
        if let Some(first) = samples.first() {
            if looks_like_date(&first.to_string()) {
                return Role::Temporal;
            }
        }

        if !samples.is_empty() && samples.iter().all(|c| c.is_finite_number()) {
            return Role::Numeric;
        }

        if samples.iter().any(|c| c.is_text()) {
            let distinct: HashSet<String> = samples.iter().map(|c| c.to_string()).collect();
            if (distinct.len() as f64) < self.config.categorical_limit(all_values.len()) {
                return Role::Categorical;
            }
        }

        let numeric = samples.iter().filter(|c| c.is_finite_number()).count();
        if numeric * 2 > samples.len() {
            Role::Numeric
        } else {
            Role::Categorical
        }
    }
}

fn all_distinct(values: &[&Cell]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|c| seen.insert(c.distinct_key()))
}

/// Runs the column classifier over every column of a row batch.
#[derive(Debug, Clone, Default)]
pub struct DatasetClassifier {
    columns: ColumnClassifier,
    config: EngineConfig,
}

impl DatasetClassifier {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            columns: ColumnClassifier::new(config.clone()),
            config,
        }
    }

    /// Assign a role to every column of `rows`.
    ///
    /// The column set comes from the first row. A row inside the sampling
    /// window that carries a key the first row lacks is reported as
    /// [`Error::InconsistentColumns`]. Missing keys read as null. Rows past
    /// the window are not checked.
    pub fn classify_all(&self, rows: &[Row]) -> Result<RoleMap> {
        let Some(first) = rows.first() else {
            return Ok(RoleMap::new());
        };
        let columns: Vec<&str> = first.keys().map(String::as_str).collect();
        check_key_sets(&columns, rows, self.config.sample_size)?;

        let window = &rows[..rows.len().min(self.config.sample_size)];

        let mut roles = RoleMap::new();
        for column in columns {
            let all_values: Vec<&Cell> = rows.iter().map(|r| cell(r, column)).collect();
            let samples: Vec<&Cell> = window
                .iter()
                .map(|r| cell(r, column))
                .filter(|c| c.is_non_null())
                .collect();

            let role = self.columns.classify(column, &samples, &all_values);
            debug!(column, %role, samples = samples.len(), "classified column");
            roles.insert(column, role);
        }

        Ok(roles)
    }
}

fn check_key_sets(columns: &[&str], rows: &[Row], window: usize) -> Result<()> {
    for (idx, row) in rows.iter().enumerate().take(window).skip(1) {
        if row.keys().any(|k| !columns.contains(&k.as_str())) {
            let found: Vec<&str> = row.keys().map(String::as_str).collect();
            warn!(row = idx, "row key set differs from first row");
            return Err(Error::InconsistentColumns {
                row: idx,
                expected: columns.join(", "),
                found: found.join(", "),
            });
        }
    }
    Ok(())
}

/// Classify with default thresholds.
pub fn classify_all(rows: &[Row]) -> Result<RoleMap> {
    DatasetClassifier::default().classify_all(rows)
}
