//! The visualization rule catalog.
//!
//! Each rule checks the role composition of a dataset and, when it fits,
//! reshapes the rows into one [`VisualizationDescriptor`]. Rules never see
//! each other's output; the catalog order only fixes the display order.

use tracing::debug;

use crate::config::EngineConfig;
use crate::data::Row;
use crate::ir::{ChartType, Record, Role, RoleMap, VisualizationDescriptor};
use crate::transform::{self, BIN_KEY, COUNT_KEY, X_KEY, Y_KEY};

/// A guarded reshape producing at most one descriptor.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the dataset's role composition suits this chart.
    fn guard(&self, roles: &RoleMap, rows: &[Row]) -> bool;

    /// Reshape `rows`. Only called when [`Rule::guard`] holds. Returns
    /// `None` when the reshaped data would be empty.
    fn apply(&self, roles: &RoleMap, rows: &[Row]) -> Option<VisualizationDescriptor>;
}

fn descriptor(
    chart_type: ChartType,
    data: Vec<Record>,
    x_axis_key: &str,
    y_axis_key: &str,
    caption: String,
) -> Option<VisualizationDescriptor> {
    if data.is_empty() {
        return None;
    }
    Some(VisualizationDescriptor {
        chart_type,
        data,
        x_axis_key: x_axis_key.to_string(),
        y_axis_key: y_axis_key.to_string(),
        caption,
    })
}

fn limited(caption: String, shown: usize, total: usize, noun: &str) -> String {
    if total > shown {
        format!("{} (top {} of {} {})", caption, shown, total, noun)
    } else {
        caption
    }
}

/// Metric over time, ordered along the first temporal column.
#[derive(Debug, Clone)]
pub struct TimeSeriesRule {
    pub limit: usize,
}

impl Rule for TimeSeriesRule {
    fn name(&self) -> &'static str {
        "time_series"
    }

    fn guard(&self, roles: &RoleMap, _rows: &[Row]) -> bool {
        roles.count(Role::Temporal) >= 1 && roles.count(Role::Numeric) >= 1
    }

    fn apply(&self, roles: &RoleMap, rows: &[Row]) -> Option<VisualizationDescriptor> {
        let time = roles.first(Role::Temporal)?;
        let metric = roles.first(Role::Numeric)?;
        let data = transform::sort_by_column(rows, time, self.limit);

        let mut caption = format!("{} over {}", metric, time);
        if rows.len() > data.len() {
            caption = format!("{} (first {} of {} rows)", caption, data.len(), rows.len());
        }
        descriptor(ChartType::Line, data, time, metric, caption)
    }
}

/// Mean of the first metric per category.
#[derive(Debug, Clone)]
pub struct CategoryMeanRule {
    pub limit: usize,
}

impl Rule for CategoryMeanRule {
    fn name(&self) -> &'static str {
        "category_mean"
    }

    fn guard(&self, roles: &RoleMap, _rows: &[Row]) -> bool {
        roles.count(Role::Categorical) >= 1 && roles.count(Role::Numeric) >= 1
    }

    fn apply(&self, roles: &RoleMap, rows: &[Row]) -> Option<VisualizationDescriptor> {
        let category = roles.first(Role::Categorical)?;
        let metric = roles.first(Role::Numeric)?;
        let all = transform::aggregate_mean(rows, category, metric, usize::MAX);
        let total = all.len();
        let data: Vec<Record> = all.into_iter().take(self.limit).collect();

        let caption = limited(
            format!("Average {} by {}", metric, category),
            data.len(),
            total,
            "groups",
        );
        descriptor(ChartType::Bar, data, category, metric, caption)
    }
}

/// Distribution of the first metric as an equal-width histogram.
#[derive(Debug, Clone)]
pub struct HistogramRule {
    pub bins: usize,
    pub min_rows: usize,
}

impl Rule for HistogramRule {
    fn name(&self) -> &'static str {
        "histogram"
    }

    fn guard(&self, roles: &RoleMap, rows: &[Row]) -> bool {
        roles.count(Role::Numeric) >= 1 && rows.len() >= self.min_rows
    }

    fn apply(&self, roles: &RoleMap, rows: &[Row]) -> Option<VisualizationDescriptor> {
        let metric = roles.first(Role::Numeric)?;
        let data = transform::histogram_records(rows, metric, self.bins, self.min_rows);
        let caption = format!("Distribution of {} ({} bins)", metric, self.bins);
        descriptor(ChartType::Bar, data, BIN_KEY, COUNT_KEY, caption)
    }
}

/// Identifiers with the highest values of the first metric.
#[derive(Debug, Clone)]
pub struct TopEntitiesRule {
    pub limit: usize,
}

impl Rule for TopEntitiesRule {
    fn name(&self) -> &'static str {
        "top_entities"
    }

    fn guard(&self, roles: &RoleMap, _rows: &[Row]) -> bool {
        roles.count(Role::Numeric) >= 1 && roles.count(Role::Identifier) >= 1
    }

    fn apply(&self, roles: &RoleMap, rows: &[Row]) -> Option<VisualizationDescriptor> {
        let identifier = roles.first(Role::Identifier)?;
        let metric = roles.first(Role::Numeric)?;
        let data = transform::rank_top(rows, identifier, metric, self.limit);
        let caption = format!("Top {} {} by {}", data.len(), identifier, metric);
        descriptor(ChartType::Bar, data, identifier, metric, caption)
    }
}

/// Record counts per category, for datasets without any metric.
#[derive(Debug, Clone)]
pub struct CategoryCountRule {
    pub limit: usize,
}

impl Rule for CategoryCountRule {
    fn name(&self) -> &'static str {
        "category_count"
    }

    fn guard(&self, roles: &RoleMap, _rows: &[Row]) -> bool {
        roles.count(Role::Categorical) >= 1 && roles.count(Role::Numeric) == 0
    }

    fn apply(&self, roles: &RoleMap, rows: &[Row]) -> Option<VisualizationDescriptor> {
        let category = roles.first(Role::Categorical)?;
        let all = transform::count_frequency(rows, category, usize::MAX);
        let total = all.len();
        let data: Vec<Record> = all.into_iter().take(self.limit).collect();

        let caption = limited(format!("Records by {}", category), data.len(), total, "values");
        descriptor(ChartType::Bar, data, category, COUNT_KEY, caption)
    }
}

/// First two metrics against each other.
#[derive(Debug, Clone)]
pub struct CorrelationRule {
    pub limit: usize,
}

impl Rule for CorrelationRule {
    fn name(&self) -> &'static str {
        "correlation"
    }

    fn guard(&self, roles: &RoleMap, _rows: &[Row]) -> bool {
        roles.count(Role::Numeric) >= 2
    }

    fn apply(&self, roles: &RoleMap, rows: &[Row]) -> Option<VisualizationDescriptor> {
        let metrics = roles.columns_with(Role::Numeric);
        let (x, y) = match metrics.as_slice() {
            [x, y, ..] => (*x, *y),
            _ => return None,
        };
        let data = transform::sample_pairs(rows, x, y, self.limit);
        let caption = format!("{} vs {} ({} points)", x, y, data.len());
        descriptor(ChartType::Scatter, data, X_KEY, Y_KEY, caption)
    }
}

/// An ordered list of rules. Order determines the order of the output.
pub struct RuleCatalog {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleCatalog {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The six built-in rules in display order.
    pub fn standard(config: &EngineConfig) -> Self {
        Self::empty()
            .with_rule(TimeSeriesRule { limit: config.line_limit })
            .with_rule(CategoryMeanRule { limit: config.aggregate_limit })
            .with_rule(HistogramRule {
                bins: config.histogram_bins,
                min_rows: config.histogram_min_rows,
            })
            .with_rule(TopEntitiesRule { limit: config.ranking_limit })
            .with_rule(CategoryCountRule { limit: config.frequency_limit })
            .with_rule(CorrelationRule { limit: config.scatter_limit })
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate every rule in order. An empty result means no chart fits.
    pub fn select(&self, roles: &RoleMap, rows: &[Row]) -> Vec<VisualizationDescriptor> {
        let mut out = Vec::new();
        for rule in &self.rules {
            if !rule.guard(roles, rows) {
                continue;
            }
            match rule.apply(roles, rows) {
                Some(desc) if !desc.data.is_empty() => {
                    debug!(rule = rule.name(), chart = desc.chart_type.as_str(), points = desc.data.len(), "rule matched");
                    out.push(desc);
                }
                _ => debug!(rule = rule.name(), "rule produced no data"),
            }
        }
        out
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard(&EngineConfig::default())
    }
}

/// Run the standard catalog with default thresholds.
pub fn select_visualizations(roles: &RoleMap, rows: &[Row]) -> Vec<VisualizationDescriptor> {
    RuleCatalog::default().select(roles, rows)
}
