// Runtime: classify a row batch and run the rule catalog over it

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::info;

use crate::classify::DatasetClassifier;
use crate::config::EngineConfig;
use crate::data::Row;
use crate::error::Result;
use crate::ir::{RoleMap, VisualizationDescriptor};
use crate::rules::RuleCatalog;

/// Roles and chart suggestions for one row batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub roles: RoleMap,
    pub visualizations: Vec<VisualizationDescriptor>,
}

impl Recommendation {
    /// True when no rule matched; callers show a "no data" state.
    pub fn is_empty(&self) -> bool {
        self.visualizations.is_empty()
    }
}

pub struct Engine {
    classifier: DatasetClassifier,
    catalog: RuleCatalog,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            catalog: RuleCatalog::standard(&config),
            classifier: DatasetClassifier::new(config),
        }
    }

    pub fn with_catalog(config: EngineConfig, catalog: RuleCatalog) -> Self {
        Self {
            classifier: DatasetClassifier::new(config),
            catalog,
        }
    }

    pub fn classify(&self, rows: &[Row]) -> Result<RoleMap> {
        self.classifier.classify_all(rows)
    }

    pub fn select(&self, roles: &RoleMap, rows: &[Row]) -> Vec<VisualizationDescriptor> {
        self.catalog.select(roles, rows)
    }

    /// Classify `rows` from scratch and select charts for them
    pub fn recommend(&self, rows: &[Row]) -> Result<Recommendation> {
        let roles = self.classify(rows)?;
        let visualizations = self.select(&roles, rows);
        info!(
            rows = rows.len(),
            columns = roles.len(),
            charts = visualizations.len(),
            "recommendation complete"
        );
        Ok(Recommendation {
            roles,
            visualizations,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Classify with default thresholds and return the descriptors only
pub fn recommend(rows: &[Row]) -> Result<Vec<VisualizationDescriptor>> {
    Ok(Engine::default().recommend(rows)?.visualizations)
}

// =============================================================================
// Stale batch handling
// =============================================================================

/// Ticket issued when a new batch starts processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BatchTicket(u64);

/// Last-write-wins gate for callers that classify batches concurrently.
///
/// Every new batch takes a ticket; results are only accepted for the most
/// recently issued ticket. The engine itself keeps no state between runs.
#[derive(Debug, Default)]
pub struct BatchGate {
    latest: AtomicU64,
}

impl BatchGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> BatchTicket {
        BatchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: BatchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Hand back `value` if `ticket` is still the latest batch, else drop it.
    pub fn accept<T>(&self, ticket: BatchTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(ticket = ticket.0, "discarding stale batch result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use crate::ir::{ChartType, Role};
    use std::sync::Arc;
    use std::thread;

    fn sales_rows() -> Vec<Row> {
        (0..12)
            .map(|i| {
                let mut row = Row::new();
                row.insert("id".to_string(), Cell::Number(i as f64));
                row.insert("region".to_string(), Cell::from(if i % 2 == 0 { "north" } else { "south" }));
                row.insert("revenue".to_string(), Cell::Number(100.0 + i as f64));
                row.insert("units".to_string(), Cell::Number((i * 3) as f64));
                row
            })
            .collect()
    }

    #[test]
    fn test_recommend_full_catalog() {
        let rec = Engine::default().recommend(&sales_rows()).unwrap();
        assert_eq!(rec.roles.get("id"), Some(Role::Identifier));
        assert_eq!(rec.roles.get("region"), Some(Role::Categorical));
        assert_eq!(rec.roles.get("revenue"), Some(Role::Numeric));

        let kinds: Vec<(ChartType, &str)> = rec
            .visualizations
            .iter()
            .map(|d| (d.chart_type, d.x_axis_key.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ChartType::Bar, "region"),
                (ChartType::Bar, "bin"),
                (ChartType::Bar, "id"),
                (ChartType::Scatter, "x"),
            ]
        );
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let rows = sales_rows();
        let engine = Engine::default();
        let first = engine.recommend(&rows).unwrap();
        let second = engine.recommend(&rows).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_recommend_empty() {
        let rec = Engine::default().recommend(&[]).unwrap();
        assert!(rec.roles.is_empty());
        assert!(rec.is_empty());
    }

    #[test]
    fn test_batch_gate_last_write_wins() {
        let gate = BatchGate::new();
        let old = gate.begin();
        let new = gate.begin();
        assert!(new > old);
        assert_eq!(gate.accept(old, "stale"), None);
        assert_eq!(gate.accept(new, "fresh"), Some("fresh"));
    }

    #[test]
    fn test_concurrent_batches_are_independent() {
        let engine = Arc::new(Engine::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || engine.recommend(&sales_rows()).unwrap())
            })
            .collect();
        let results: Vec<Recommendation> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
