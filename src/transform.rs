//! Reshapers: turn a raw row batch into the minimal shape one chart needs.
//!
//! All functions are pure. Sorts are stable, so rows with equal keys keep
//! their input order and fixtures reshape the same way every run.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::data::{cell, Cell, Row};
use crate::ir::Record;

/// Label used for null category values
pub const UNKNOWN_CATEGORY: &str = "Unknown";

pub const COUNT_KEY: &str = "count";
pub const BIN_KEY: &str = "bin";
pub const X_KEY: &str = "x";
pub const Y_KEY: &str = "y";

fn record<const N: usize>(fields: [(&str, Cell); N]) -> Record {
    fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn category_label(value: &Cell) -> String {
    match value {
        Cell::Null => UNKNOWN_CATEGORY.to_string(),
        other => other.to_string(),
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

// =============================================================================
// Sorter
// =============================================================================

/// Ordering used for time axes. Strings compare lexically and come before
/// every number or null; numbers and nulls compare numerically with null as 0.
pub fn compare_time_values(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        (Cell::Text(_), _) => Ordering::Less,
        (_, Cell::Text(_)) => Ordering::Greater,
        _ => a
            .numeric_or_zero()
            .partial_cmp(&b.numeric_or_zero())
            .unwrap_or(Ordering::Equal),
    }
}

/// All rows sorted ascending by `column`, truncated to `limit`.
pub fn sort_by_column(rows: &[Row], column: &str, limit: usize) -> Vec<Record> {
    let mut sorted: Vec<&Row> = rows.iter().collect();
    sorted.sort_by(|a, b| compare_time_values(cell(a, column), cell(b, column)));
    sorted.into_iter().take(limit).cloned().collect()
}

// =============================================================================
// Aggregator
// =============================================================================

#[derive(Debug, Default)]
struct GroupStats {
    rows: usize,
    sum: f64,
    contributing: usize,
}

impl GroupStats {
    fn mean(&self) -> Option<f64> {
        (self.contributing > 0).then(|| self.sum / self.contributing as f64)
    }
}

/// Group by `category`, compute the mean of `metric` per group and keep the
/// `limit` groups with the highest mean.
///
/// Only finite metric values feed the mean. A group without any is left out
/// rather than reported with an undefined mean. Each output record holds the
/// category label, the mean under the metric's column name and the group's
/// row count under `count`.
pub fn aggregate_mean(rows: &[Row], category: &str, metric: &str, limit: usize) -> Vec<Record> {
    let mut groups: IndexMap<String, GroupStats> = IndexMap::new();
    for row in rows {
        let stats = groups.entry(category_label(cell(row, category))).or_default();
        stats.rows += 1;
        if let Some(v) = cell(row, metric).as_finite() {
            stats.sum += v;
            stats.contributing += 1;
        }
    }

    let mut means: Vec<(String, f64, usize)> = groups
        .into_iter()
        .filter_map(|(key, stats)| stats.mean().map(|m| (key, m, stats.rows)))
        .collect();
    means.sort_by(|a, b| descending(a.1, b.1));

    means
        .into_iter()
        .take(limit)
        .map(|(key, mean, count)| {
            record([
                (category, Cell::Text(key)),
                (metric, Cell::Number(mean)),
                (COUNT_KEY, Cell::Number(count as f64)),
            ])
        })
        .collect()
}

// =============================================================================
// Histogram Builder
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

impl Bin {
    pub fn label(&self) -> String {
        format!("{:.1}-{:.1}", self.lo, self.hi)
    }
}

/// Index of the bin holding `value`. Ranges are `[lo, hi)` except the last,
/// which also takes the maximum. A zero width sends everything to bin 0.
pub fn bin_index(value: f64, min: f64, width: f64, bins: usize) -> usize {
    if width <= 0.0 || bins == 0 {
        return 0;
    }
    let idx = ((value - min) / width).floor();
    if idx < 0.0 {
        0
    } else {
        (idx as usize).min(bins - 1)
    }
}

/// Equal-width histogram over the finite entries of `values`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = finite.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let width = (max - min) / bins as f64;

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| {
            let lo = min + i as f64 * width;
            Bin { lo, hi: lo + width, count: 0 }
        })
        .collect();

    for v in finite {
        out[bin_index(v, min, width, bins)].count += 1;
    }

    out
}

/// Histogram of `column` as `{bin, count}` records. Empty unless at least
/// `min_values` finite values are present.
pub fn histogram_records(rows: &[Row], column: &str, bins: usize, min_values: usize) -> Vec<Record> {
    let values: Vec<f64> = rows.iter().filter_map(|r| cell(r, column).as_finite()).collect();
    if values.len() < min_values {
        return Vec::new();
    }

    histogram(&values, bins)
        .into_iter()
        .map(|b| {
            record([
                (BIN_KEY, Cell::Text(b.label())),
                (COUNT_KEY, Cell::Number(b.count as f64)),
            ])
        })
        .collect()
}

// =============================================================================
// Ranker
// =============================================================================

/// Rows with a finite `metric` and a present `identifier`, highest metric
/// first, truncated to `limit`. The identifier is stringified.
pub fn rank_top(rows: &[Row], identifier: &str, metric: &str, limit: usize) -> Vec<Record> {
    let mut ranked: Vec<(String, f64)> = rows
        .iter()
        .filter_map(|r| {
            let id = cell(r, identifier);
            let value = cell(r, metric).as_finite()?;
            id.is_non_null().then(|| (id.to_string(), value))
        })
        .collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));

    ranked
        .into_iter()
        .take(limit)
        .map(|(id, value)| record([(identifier, Cell::Text(id)), (metric, Cell::Number(value))]))
        .collect()
}

// =============================================================================
// Frequency Counter
// =============================================================================

/// Occurrences per value of `category`, most frequent first.
pub fn count_frequency(rows: &[Row], category: &str, limit: usize) -> Vec<Record> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for row in rows {
        *counts.entry(category_label(cell(row, category))).or_default() += 1;
    }

    let mut ordered: Vec<(String, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    ordered
        .into_iter()
        .take(limit)
        .map(|(key, n)| record([(category, Cell::Text(key)), (COUNT_KEY, Cell::Number(n as f64))]))
        .collect()
}

// =============================================================================
// Pair Sampler
// =============================================================================

/// The first `limit` rows where both columns are finite, as `{x, y}` points.
pub fn sample_pairs(rows: &[Row], x_col: &str, y_col: &str, limit: usize) -> Vec<Record> {
    rows.iter()
        .filter_map(|r| Some((cell(r, x_col).as_finite()?, cell(r, y_col).as_finite()?)))
        .take(limit)
        .map(|(x, y)| record([(X_KEY, Cell::Number(x)), (Y_KEY, Cell::Number(y))]))
        .collect()
}
