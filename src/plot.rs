//! Optional visual comparison of data and fitted curves.
//!
//! Plotting is an external concern: results are complete and correct without
//! it, and nothing in the fit path depends on this module. The [`Plotter`]
//! trait is the integration point; an SVG renderer backed by `plotters` is
//! available behind the `plot` cargo feature.

use crate::error::Result;
use crate::fit::CurveSet;
use crate::table::Table;

/// Axis-scale flags for a comparison plot.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotOptions {
    /// Log-scale the x axis
    pub log_x: bool,
    /// Log-scale the y axis
    pub log_y: bool,
}

/// Renders a visual comparison of observed data and fitted curves.
pub trait Plotter {
    /// Render `data` (as points) against `fits` (as lines).
    fn plot(&self, data: &Table, fits: &CurveSet, options: &PlotOptions) -> Result<()>;
}

#[cfg(feature = "plot")]
pub use svg::SvgPlotter;

#[cfg(feature = "plot")]
mod svg {
    use super::{PlotOptions, Plotter};
    use crate::error::{Result, TabFitError};
    use crate::fit::CurveSet;
    use crate::table::Table;
    use plotters::prelude::*;
    use std::path::PathBuf;

    /// A [`Plotter`] that renders to an SVG file.
    pub struct SvgPlotter {
        path: PathBuf,
        size: (u32, u32),
    }

    impl SvgPlotter {
        pub fn new<P: Into<PathBuf>>(path: P) -> Self {
            Self {
                path: path.into(),
                size: (800, 600),
            }
        }

        pub fn with_size(mut self, width: u32, height: u32) -> Self {
            self.size = (width, height);
            self
        }
    }

    /// Log-transform a coordinate when the axis flag is set; non-positive
    /// values have no place on a log axis and are skipped by the caller.
    fn scaled(value: f64, log: bool) -> Option<f64> {
        if log {
            (value > 0.0).then(|| value.ln())
        } else {
            Some(value)
        }
    }

    impl Plotter for SvgPlotter {
        fn plot(&self, data: &Table, fits: &CurveSet, options: &PlotOptions) -> Result<()> {
            let mut points: Vec<Vec<(f64, f64)>> = Vec::new();
            for col in 0..data.ncols() {
                let column = data.column_data(col, &Default::default());
                points.push(
                    column
                        .x
                        .iter()
                        .zip(column.y.iter())
                        .filter_map(|(&x, &y)| {
                            Some((scaled(x, options.log_x)?, scaled(y, options.log_y)?))
                        })
                        .collect(),
                );
            }

            let lines: Vec<Vec<(f64, f64)>> = fits
                .iter()
                .map(|curve| {
                    curve
                        .index
                        .iter()
                        .zip(curve.values.iter())
                        .filter_map(|(&x, &y)| {
                            Some((scaled(x, options.log_x)?, scaled(y, options.log_y)?))
                        })
                        .collect()
                })
                .collect();

            let all = points.iter().chain(lines.iter()).flatten();
            let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
            let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
            for &(x, y) in all {
                x_min = x_min.min(x);
                x_max = x_max.max(x);
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
            if !x_min.is_finite() || !y_min.is_finite() {
                return Err(TabFitError::InvalidInput(
                    "nothing to plot: no finite points in range".to_string(),
                ));
            }
            let pad_x = 0.05 * (x_max - x_min).max(f64::MIN_POSITIVE);
            let pad_y = 0.05 * (y_max - y_min).max(f64::MIN_POSITIVE);

            let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| TabFitError::ComputationError(format!("plot rendering failed: {}", e)))?;

            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(
                    (x_min - pad_x)..(x_max + pad_x),
                    (y_min - pad_y)..(y_max + pad_y),
                )
                .map_err(|e| TabFitError::ComputationError(format!("plot rendering failed: {}", e)))?;

            chart
                .configure_mesh()
                .draw()
                .map_err(|e| TabFitError::ComputationError(format!("plot rendering failed: {}", e)))?;

            for (i, series) in points.iter().enumerate() {
                let color = Palette99::pick(i);
                chart
                    .draw_series(
                        series
                            .iter()
                            .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
                    )
                    .map_err(|e| {
                        TabFitError::ComputationError(format!("plot rendering failed: {}", e))
                    })?;
            }

            for (i, series) in lines.iter().enumerate() {
                let color = Palette99::pick(i);
                chart
                    .draw_series(LineSeries::new(series.iter().copied(), &color))
                    .map_err(|e| {
                        TabFitError::ComputationError(format!("plot rendering failed: {}", e))
                    })?;
            }

            root.present()
                .map_err(|e| TabFitError::ComputationError(format!("plot rendering failed: {}", e)))?;

            Ok(())
        }
    }
}
