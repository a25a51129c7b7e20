use super::{Chart, ChartError};
use crate::analysis::{correlation_matrix, CorrelationMatrix};
use crate::dataset::Dataset;
use crate::models::NumericColumn;
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Anchors of the diverging cool-to-warm scale at -1, 0 and 1.
const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

/// Annotated correlation matrix of the numeric columns.
#[derive(Debug, Clone)]
pub struct CorrelationHeatmap {
    pub matrix: CorrelationMatrix,
}

/// Map a correlation in `[-1, 1]` onto the diverging color scale.
///
/// Undefined values are drawn in neutral grey.
pub fn diverging_color(value: f64) -> RGBColor {
    if !value.is_finite() {
        return RGBColor(NEUTRAL.0 as u8, NEUTRAL.1 as u8, NEUTRAL.2 as u8);
    }
    let t = value.clamp(-1.0, 1.0);
    let (from, to, f) = if t < 0.0 {
        (NEUTRAL, COOL, -t)
    } else {
        (NEUTRAL, WARM, t)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

impl CorrelationHeatmap {
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        if dataset.records().is_empty() {
            return Err(ChartError::NoData("correlation heatmap").into());
        }
        Ok(Self {
            matrix: correlation_matrix(dataset, &NumericColumn::ALL),
        })
    }
}

impl Chart for CorrelationHeatmap {
    const FILE_STEM: &'static str = "corr_heatmap";
    const SIZE: (u32, u32) = (800, 600);

    fn title(&self) -> &str {
        "Correlation of numeric columns"
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let n = self.matrix.columns.len();
        let names: Vec<&str> = self.matrix.columns.iter().map(|c| c.name()).collect();
        // Row 0 is drawn at the top.
        let row_label = |y: &f64| {
            let pos = y - 0.5;
            let i = pos.round();
            if (pos - i).abs() > 1e-6 || i < 0.0 || i as usize >= n {
                return String::new();
            }
            names[n - 1 - i as usize].to_string()
        };
        let col_label = |x: &f64| {
            let pos = x - 0.5;
            let i = pos.round();
            if (pos - i).abs() > 1e-6 || i < 0.0 || i as usize >= n {
                return String::new();
            }
            names[i as usize].to_string()
        };

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(), ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(2 * n + 1)
            .y_labels(2 * n + 1)
            .x_label_formatter(&col_label)
            .y_label_formatter(&row_label)
            .draw()?;

        let cells = (0..n).flat_map(|i| (0..n).map(move |j| (i, j)));
        chart.draw_series(cells.clone().map(|(i, j)| {
            let y = (n - 1 - i) as f64;
            let x = j as f64;
            Rectangle::new(
                [(x, y), (x + 1.0, y + 1.0)],
                diverging_color(self.matrix.get(i, j)).filled(),
            )
        }))?;

        let font = ("sans-serif", 14)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells.map(|(i, j)| {
            let y = (n - 1 - i) as f64 + 0.5;
            let x = j as f64 + 0.5;
            let v = self.matrix.get(i, j);
            let label = if v.is_nan() { "NaN".to_string() } else { format!("{:.2}", v) };
            Text::new(label, (x, y), font.clone())
        }))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diverging_color_endpoints() {
        assert_eq!(diverging_color(-1.0), RGBColor(59, 76, 192));
        assert_eq!(diverging_color(0.0), RGBColor(221, 221, 221));
        assert_eq!(diverging_color(1.0), RGBColor(180, 4, 38));
        assert_eq!(diverging_color(f64::NAN), RGBColor(221, 221, 221));
        assert_eq!(diverging_color(5.0), diverging_color(1.0));
    }

    #[test]
    fn test_heatmap_uses_all_numeric_columns() {
        let ds = crate::dataset::tests::sample_dataset();
        let heat = CorrelationHeatmap::from_dataset(&ds).unwrap();
        assert_eq!(heat.matrix.columns.len(), NumericColumn::ALL.len());
    }
}
