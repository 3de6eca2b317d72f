//! Static Chart Renderer
//! Renders the current chart or map as a standalone SVG document for export.
//!
//! Layout:
//! 1. Chart: title caption, value axis, one bar per category colored by region
//! 2. Map: the map scene on the left, layer legend swatches on the right

use crate::charts::choropleth::{Legend, MapPresenter, MapScene};
use crate::charts::format::format_thousands;
use crate::charts::palette::region_color;
use crate::charts::plotter::ChartSpec;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Width reserved for the legend beside an exported map.
const LEGEND_WIDTH: u32 = 200;
const SWATCH: i32 = 18;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Nothing to draw: {0}")]
    Empty(&'static str),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RenderError {
    pub fn draw(err: impl std::fmt::Display) -> Self {
        RenderError::Draw(err.to_string())
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// SVG of a ranked bar chart.
    pub fn chart_svg(spec: &ChartSpec, size: (u32, u32)) -> Result<String, RenderError> {
        if spec.bars.is_empty() {
            return Err(RenderError::Empty("chart has no bars"));
        }

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            root.fill(&WHITE).map_err(RenderError::draw)?;
            Self::draw_bars(&root, spec).map_err(RenderError::draw)?;
            root.present().map_err(RenderError::draw)?;
        }
        Ok(svg)
    }

    fn draw_bars<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let n = spec.bars.len() as u32;
        let max = spec.max_value().max(1.0) * 1.05;
        let label_of = |pos: u32| -> String {
            if pos >= n {
                return String::new();
            }
            let idx = if spec.horizontal { n - 1 - pos } else { pos };
            spec.bars
                .get(idx as usize)
                .map(|b| b.label.clone())
                .unwrap_or_default()
        };
        let category_label = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(pos) => label_of(*pos),
            _ => String::new(),
        };

        let mut builder = ChartBuilder::on(root);
        builder
            .caption(spec.title, ("sans-serif", 22))
            .margin(16)
            .x_label_area_size(48);

        if spec.horizontal {
            builder.y_label_area_size(150);
            let mut chart = builder.build_cartesian_2d(0.0..max, (0u32..n).into_segmented())?;
            chart
                .configure_mesh()
                .disable_y_mesh()
                .y_labels(n as usize)
                .y_label_formatter(&category_label)
                .x_label_formatter(&|v| format_thousands(*v))
                .x_desc(spec.value_label)
                .draw()?;

            chart.draw_series(spec.bars.iter().enumerate().map(|(i, bar)| {
                let pos = n - 1 - i as u32;
                let mut rect = Rectangle::new(
                    [
                        (0.0, SegmentValue::Exact(pos)),
                        (bar.value, SegmentValue::Exact(pos + 1)),
                    ],
                    region_color(&bar.region).to_plotters().filled(),
                );
                rect.set_margin(3, 3, 0, 0);
                rect
            }))?;
        } else {
            builder.y_label_area_size(80);
            let mut chart = builder.build_cartesian_2d((0u32..n).into_segmented(), 0.0..max)?;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(n as usize)
                .x_label_formatter(&category_label)
                .y_label_formatter(&|v| format_thousands(*v))
                .y_desc(spec.value_label)
                .draw()?;

            chart.draw_series(spec.bars.iter().enumerate().map(|(i, bar)| {
                let pos = i as u32;
                let mut rect = Rectangle::new(
                    [
                        (SegmentValue::Exact(pos), 0.0),
                        (SegmentValue::Exact(pos + 1), bar.value),
                    ],
                    region_color(&bar.region).to_plotters().filled(),
                );
                rect.set_margin(0, 0, 8, 8);
                rect
            }))?;
        }

        Ok(())
    }

    /// SVG of the map scene with labels (when enabled) and the legend.
    pub fn map_svg(scene: &MapScene) -> Result<String, RenderError> {
        if scene.shapes.is_empty() {
            return Err(RenderError::Empty("map has no shapes"));
        }

        let (w, h) = scene.size;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (w + LEGEND_WIDTH, h)).into_drawing_area();
            root.fill(&WHITE).map_err(RenderError::draw)?;
            let (map_area, legend_area) = root.split_horizontally(w);
            MapPresenter::draw(&map_area, scene, true).map_err(RenderError::draw)?;
            Self::draw_legend(&legend_area, &scene.legend).map_err(RenderError::draw)?;
            root.present().map_err(RenderError::draw)?;
        }
        Ok(svg)
    }

    fn draw_legend<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        legend: &Legend,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let title = ("sans-serif", 14).into_font().color(&BLACK);
        let text = ("sans-serif", 12).into_font().color(&BLACK);

        area.draw(&Text::new(legend.title, (10, 20), title))?;
        for (i, (color, label)) in legend.steps.iter().enumerate() {
            let top = 40 + i as i32 * (SWATCH + 6);
            area.draw(&Rectangle::new(
                [(10, top), (10 + SWATCH, top + SWATCH)],
                color.to_plotters().filled(),
            ))?;
            area.draw(&Text::new(label.clone(), (10 + SWATCH + 8, top + 3), text.clone()))?;
        }
        Ok(())
    }

    /// Write `svg` to `path`, creating or truncating the file.
    pub fn save_svg(path: &Path, svg: &str) -> Result<(), RenderError> {
        std::fs::write(path, svg).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartLimits;
    use crate::state::{ChartMetric, MapLayer};

    #[test]
    fn empty_chart_is_rejected() {
        let spec = ChartSpec::build(ChartMetric::Income, &[], &ChartLimits::default());
        let err = StaticChartRenderer::chart_svg(&spec, (800, 600)).unwrap_err();
        assert!(matches!(err, RenderError::Empty(_)));
    }

    #[test]
    fn empty_map_is_rejected() {
        let scene = MapScene {
            size: (400, 300),
            shapes: Vec::new(),
            legend: Legend::for_layer(MapLayer::Units),
            show_labels: false,
        };
        assert!(matches!(
            StaticChartRenderer::map_svg(&scene),
            Err(RenderError::Empty(_))
        ));
    }

    #[test]
    fn save_svg_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        StaticChartRenderer::save_svg(&path, "<svg/>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg/>");

        let missing = dir.path().join("no/such/dir/chart.svg");
        let err = StaticChartRenderer::save_svg(&missing, "<svg/>").unwrap_err();
        assert!(err.to_string().starts_with("Failed to write"));
    }
}
