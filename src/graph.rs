use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

use crate::data::cell;
use crate::ir::{ChartType, VisualizationDescriptor};
use crate::{OutputFormat, RenderOptions};

const LINE_COLOR: RGBColor = BLUE;
const LINE_WIDTH: u32 = 2;

const BAR_COLOR: RGBColor = GREEN;
const BAR_ALPHA: f64 = 0.8;
const BAR_WIDTH: f64 = 0.8;

const POINT_COLOR: RGBColor = MAGENTA;
const POINT_SIZE: i32 = 3;
const POINT_ALPHA: f64 = 0.6;

/// Plot-ready values pulled out of a descriptor via its axis keys
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSeries {
    /// Points in data order; x is the position, labels name each position
    Line { labels: Vec<String>, values: Vec<f64> },
    Bar { categories: Vec<String>, values: Vec<f64> },
    Scatter { points: Vec<(f64, f64)> },
}

impl ChartSeries {
    /// Read the descriptor's `x_axis_key`/`y_axis_key` columns. Records
    /// without a finite y (or x, for scatter) are skipped.
    pub fn from_descriptor(desc: &VisualizationDescriptor) -> Result<Self> {
        let x_key = desc.x_axis_key.as_str();
        let y_key = desc.y_axis_key.as_str();

        let labelled: Vec<(String, f64)> = desc
            .data
            .iter()
            .filter_map(|r| Some((cell(r, x_key).to_string(), cell(r, y_key).as_finite()?)))
            .collect();

        let series = match desc.chart_type {
            ChartType::Line => {
                let (labels, values) = labelled.into_iter().unzip();
                ChartSeries::Line { labels, values }
            }
            ChartType::Bar => {
                let (categories, values) = labelled.into_iter().unzip();
                ChartSeries::Bar { categories, values }
            }
            ChartType::Scatter => ChartSeries::Scatter {
                points: desc
                    .data
                    .iter()
                    .filter_map(|r| Some((cell(r, x_key).as_finite()?, cell(r, y_key).as_finite()?)))
                    .collect(),
            },
        };

        if series.is_empty() {
            anyhow::bail!("Cannot render '{}' with no plottable points", desc.caption);
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        match self {
            ChartSeries::Line { values, .. } | ChartSeries::Bar { values, .. } => values.len(),
            ChartSeries::Scatter { points } => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Data range with 5% padding; a single value gets +/- 1
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !min.is_finite() || !max.is_finite() {
        0.0..1.0
    } else if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Bars grow from zero, so the y range always includes it
fn bar_range(values: &[f64]) -> Range<f64> {
    let r = padded_range(values.iter().copied().chain(std::iter::once(0.0)));
    if values.iter().all(|v| *v >= 0.0) {
        0.0..r.end
    } else {
        r
    }
}

fn label_at(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (idx - x).abs() > 1e-6 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn draw_chart<DB>(root: DrawingArea<DB, Shift>, series: &ChartSeries, caption: &str) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    match series {
        ChartSeries::Line { labels, values } => {
            let x_range = padded_range((0..values.len()).map(|i| i as f64));
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .caption(caption, ("sans-serif", 20))
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(x_range, padded_range(values.iter().copied()))
                .context("Failed to build chart")?;

            chart
                .configure_mesh()
                .x_labels(labels.len().min(10))
                .x_label_formatter(&|x| label_at(labels, *x))
                .draw()
                .context("Failed to draw mesh")?;

            let points = values.iter().enumerate().map(|(i, &v)| (i as f64, v));
            chart
                .draw_series(LineSeries::new(points, LINE_COLOR.stroke_width(LINE_WIDTH)))
                .context("Failed to draw line series")?;
        }
        ChartSeries::Bar { categories, values } => {
            let num_categories = categories.len();
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .caption(caption, ("sans-serif", 20))
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(0.0..(num_categories as f64), bar_range(values))
                .context("Failed to build chart")?;

            chart
                .configure_mesh()
                .x_labels(num_categories)
                .x_label_formatter(&|x| {
                    let idx = *x as usize;
                    if *x >= 0.0 && idx < categories.len() {
                        categories[idx].clone()
                    } else {
                        String::new()
                    }
                })
                .draw()
                .context("Failed to draw mesh")?;

            let color = BAR_COLOR.mix(BAR_ALPHA);
            chart
                .draw_series(values.iter().enumerate().map(|(idx, &y)| {
                    let x_center = idx as f64 + 0.5;
                    Rectangle::new(
                        [(x_center - BAR_WIDTH / 2.0, 0.0), (x_center + BAR_WIDTH / 2.0, y)],
                        color.filled(),
                    )
                }))
                .context("Failed to draw bars")?;
        }
        ChartSeries::Scatter { points } => {
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .caption(caption, ("sans-serif", 20))
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(
                    padded_range(points.iter().map(|p| p.0)),
                    padded_range(points.iter().map(|p| p.1)),
                )
                .context("Failed to build chart")?;

            chart.configure_mesh().draw().context("Failed to draw mesh")?;

            let color = POINT_COLOR.mix(POINT_ALPHA);
            chart
                .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), POINT_SIZE, color.filled())))
                .context("Failed to draw point series")?;
        }
    }

    root.present().context("Failed to present drawing")?;
    Ok(())
}

/// Render one descriptor to PNG or SVG bytes
pub fn render_descriptor(desc: &VisualizationDescriptor, options: &RenderOptions) -> Result<Vec<u8>> {
    let series = ChartSeries::from_descriptor(desc)?;
    let (width, height) = (options.width, options.height);

    match options.format {
        OutputFormat::Png => {
            let len = (width as usize)
                .checked_mul(height as usize)
                .and_then(|n| n.checked_mul(3))
                .with_context(|| format!("Image size {}x{} is too large", width, height))?;
            let mut buffer = vec![0u8; len];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
                draw_chart(root, &series, &desc.caption)?;
            }

            let mut png_bytes = Vec::new();
            image::codecs::png::PngEncoder::new(&mut png_bytes)
                .write_image(&buffer, width, height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
            Ok(png_bytes)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                draw_chart(root, &series, &desc.caption)?;
            }
            Ok(svg.into_bytes())
        }
    }
}

/// File name for the `index`-th descriptor, e.g. `01-line.png`
pub fn output_file_name(index: usize, desc: &VisualizationDescriptor, format: &OutputFormat) -> String {
    let ext = match format {
        OutputFormat::Png => "png",
        OutputFormat::Svg => "svg",
    };
    format!("{:02}-{}.{}", index + 1, desc.chart_type.as_str(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use crate::ir::Record;

    fn rec(pairs: &[(&str, Cell)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn desc(chart_type: ChartType, data: Vec<Record>, x: &str, y: &str) -> VisualizationDescriptor {
        VisualizationDescriptor {
            chart_type,
            data,
            x_axis_key: x.to_string(),
            y_axis_key: y.to_string(),
            caption: "test".to_string(),
        }
    }

    #[test]
    fn test_series_reads_axis_keys() {
        let d = desc(
            ChartType::Bar,
            vec![
                rec(&[("bin", "0.0-1.0".into()), ("count", 4.0.into())]),
                rec(&[("bin", "1.0-2.0".into()), ("count", 1.0.into())]),
            ],
            "bin",
            "count",
        );
        let series = ChartSeries::from_descriptor(&d).unwrap();
        assert_eq!(
            series,
            ChartSeries::Bar {
                categories: vec!["0.0-1.0".into(), "1.0-2.0".into()],
                values: vec![4.0, 1.0],
            }
        );
    }

    #[test]
    fn test_line_series_skips_missing_values() {
        let d = desc(
            ChartType::Line,
            vec![
                rec(&[("day", "2024-01-01".into()), ("v", 1.0.into())]),
                rec(&[("day", "2024-01-02".into()), ("v", Cell::Null)]),
                rec(&[("day", "2024-01-03".into()), ("v", 3.0.into())]),
            ],
            "day",
            "v",
        );
        match ChartSeries::from_descriptor(&d).unwrap() {
            ChartSeries::Line { labels, values } => {
                assert_eq!(labels, vec!["2024-01-01", "2024-01-03"]);
                assert_eq!(values, vec![1.0, 3.0]);
            }
            other => panic!("expected line series, got {:?}", other),
        }
    }

    #[test]
    fn test_series_without_points_is_error() {
        let d = desc(ChartType::Scatter, vec![rec(&[("x", Cell::Null), ("y", 1.0.into())])], "x", "y");
        assert!(ChartSeries::from_descriptor(&d).is_err());
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(vec![5.0]), 4.0..6.0);
        assert_eq!(padded_range(vec![0.0, 100.0]), -5.0..105.0);
        assert_eq!(padded_range(Vec::new()), 0.0..1.0);
        let bars = bar_range(&[2.0, 4.0]);
        assert_eq!(bars.start, 0.0);
        assert!(bars.end > 4.0);
        assert!(bar_range(&[-2.0, 4.0]).start < -2.0);
    }

    #[test]
    fn test_label_at() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(label_at(&labels, 1.0), "b");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, 5.0), "");
    }

    #[test]
    fn test_oversized_png_is_error() {
        let d = desc(ChartType::Scatter, vec![rec(&[("x", 1.0.into()), ("y", 2.0.into())])], "x", "y");
        let options = RenderOptions { width: u32::MAX, height: u32::MAX, format: OutputFormat::Png };
        let err = render_descriptor(&d, &options).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_output_file_name() {
        let d = desc(ChartType::Scatter, vec![], "x", "y");
        assert_eq!(output_file_name(0, &d, &OutputFormat::Png), "01-scatter.png");
        assert_eq!(output_file_name(11, &d, &OutputFormat::Svg), "12-scatter.svg");
    }
}
