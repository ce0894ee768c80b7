// Library exports for autoviz

pub mod classify;
pub mod config;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod ir;
pub mod page;
pub mod parser;
pub mod rules;
pub mod runtime;
pub mod summary;
pub mod transform;

pub use classify::{classify_all, ColumnClassifier, DatasetClassifier};
pub use config::EngineConfig;
pub use data::{Cell, Dataset, Row};
pub use error::{Error, Result};
pub use ir::{ChartType, Role, RoleMap, VisualizationDescriptor};
pub use rules::{select_visualizations, Rule, RuleCatalog};
pub use runtime::{BatchGate, Engine, Recommendation};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}
