//! Chart rendering.
//!
//! Each chart is a plain struct holding the data it plots, prepared from the
//! dataset by its constructor. Drawing is generic over the plotters backend
//! so the same code produces PNG or SVG files.

mod boxplot;
mod countplot;
mod heatmap;
mod histogram;
mod scatter;
mod violin;

pub use boxplot::PriceByCutBoxPlot;
pub use countplot::CutCountPlot;
pub use heatmap::CorrelationHeatmap;
pub use histogram::PriceHistogram;
pub use scatter::CaratPriceScatter;
pub use violin::PriceByClarityViolin;

use crate::models::{Cut, ImageFormat};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while preparing chart data.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart '{0}' has no data to plot")]
    NoData(&'static str),
}

/// A chart that can be drawn onto any plotters backend.
pub trait Chart {
    /// File name of the rendered image, without extension.
    const FILE_STEM: &'static str;

    /// Base image size in pixels.
    const SIZE: (u32, u32);

    /// Caption drawn above the plot; also used as image alt text.
    fn title(&self) -> &str;

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

/// Render `chart` into `dir` and return the written file path.
pub fn render<C: Chart>(chart: &C, dir: &Path, format: ImageFormat, scale: f64) -> Result<PathBuf> {
    let path = dir.join(file_name::<C>(format));
    let size = scaled(C::SIZE, scale);
    debug!("Rendering {} at {}x{}", path.display(), size.0, size.1);

    match format {
        ImageFormat::Png => {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            chart.draw(&root)?;
            root.present()
                .with_context(|| format!("Failed to write chart {}", path.display()))?;
        }
        ImageFormat::Svg => {
            let root = SVGBackend::new(&path, size).into_drawing_area();
            chart.draw(&root)?;
            root.present()
                .with_context(|| format!("Failed to write chart {}", path.display()))?;
        }
    }

    Ok(path)
}

/// File name a chart is written under.
pub fn file_name<C: Chart>(format: ImageFormat) -> String {
    format!("{}.{}", C::FILE_STEM, format.extension())
}

fn scaled((w, h): (u32, u32), scale: f64) -> (u32, u32) {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    (
        ((w as f64 * scale).round() as u32).max(1),
        ((h as f64 * scale).round() as u32).max(1),
    )
}

/// Fill color per cut, keyed by declared category order.
pub(crate) fn cut_color(cut: Cut) -> RGBColor {
    match cut {
        Cut::Ideal => RGBColor(31, 119, 180),
        Cut::Premium => RGBColor(255, 127, 14),
        Cut::VeryGood => RGBColor(44, 160, 44),
        Cut::Good => RGBColor(214, 39, 40),
        Cut::Fair => RGBColor(148, 103, 189),
    }
}

/// Qualitative palette for categories without a fixed color.
pub(crate) const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Label for a category axis positioned at integer offsets.
///
/// Returns an empty string away from category centers.
pub(crate) fn category_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

/// Lower and upper bounds for a logarithmic value axis.
pub(crate) fn log_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| *v > 0.0 && v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (1.0, 10.0);
    }
    (lo / 1.2, hi * 1.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_size() {
        assert_eq!(scaled((800, 500), 1.0), (800, 500));
        assert_eq!(scaled((800, 500), 1.5), (1200, 750));
        assert_eq!(scaled((800, 500), -2.0), (800, 500));
    }

    #[test]
    fn test_category_label() {
        let labels = vec!["Fair".to_string(), "Good".to_string()];
        assert_eq!(category_label(&labels, 0.0), "Fair");
        assert_eq!(category_label(&labels, 1.0), "Good");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }

    #[test]
    fn test_log_bounds() {
        let (lo, hi) = log_bounds([326.0, 18823.0, 0.0].into_iter());
        assert!(lo > 0.0 && lo < 326.0);
        assert!(hi > 18823.0);
        assert_eq!(log_bounds(std::iter::empty()), (1.0, 10.0));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name::<PriceHistogram>(ImageFormat::Png), "hist_price.png");
        assert_eq!(file_name::<CaratPriceScatter>(ImageFormat::Svg), "scatter_carat_price.svg");
        assert_eq!(file_name::<PriceByCutBoxPlot>(ImageFormat::Png), "box_price_cut.png");
        assert_eq!(file_name::<CutCountPlot>(ImageFormat::Png), "count_cut.png");
        assert_eq!(file_name::<CorrelationHeatmap>(ImageFormat::Png), "corr_heatmap.png");
        assert_eq!(
            file_name::<PriceByClarityViolin>(ImageFormat::Png),
            "violin_price_clarity.png"
        );
    }
}
