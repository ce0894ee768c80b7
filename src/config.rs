use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Thresholds used by the classifier and the rule catalog.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows sampled for type and cardinality checks
    pub sample_size: usize,
    /// Minimum distinct-value ceiling for categorical columns
    pub categorical_floor: usize,
    /// Ceiling as a fraction of the total row count, when that is larger
    pub categorical_ratio: f64,
    pub line_limit: usize,
    pub aggregate_limit: usize,
    pub histogram_bins: usize,
    pub histogram_min_rows: usize,
    pub ranking_limit: usize,
    pub frequency_limit: usize,
    pub scatter_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            categorical_floor: 50,
            categorical_ratio: 0.1,
            line_limit: 1000,
            aggregate_limit: 20,
            histogram_bins: 20,
            histogram_min_rows: 10,
            ranking_limit: 20,
            frequency_limit: 30,
            scatter_limit: 500,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Distinct-value ceiling for a dataset of `total_rows` rows.
    pub fn categorical_limit(&self, total_rows: usize) -> f64 {
        (self.categorical_floor as f64).max(self.categorical_ratio * total_rows as f64)
    }
}
