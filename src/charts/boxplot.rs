use super::{category_label, cut_color, log_bounds, Chart, ChartError};
use crate::analysis::{group_values, ColumnSummary};
use crate::dataset::Dataset;
use crate::models::{Cut, NumericColumn};
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Whisker reach as a multiple of the interquartile range.
const WHISKER_IQR: f64 = 1.5;
const HALF_WIDTH: f64 = 0.3;

/// Five-number summary of one box, plus the points drawn as outliers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Highest value within `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let summary = ColumnSummary::of(values);
        let low_fence = summary.q25 - WHISKER_IQR * summary.iqr();
        let high_fence = summary.q75 + WHISKER_IQR * summary.iqr();

        let inside = values.iter().copied().filter(|v| *v >= low_fence && *v <= high_fence);
        let whisker_low = inside.clone().fold(f64::INFINITY, f64::min);
        let whisker_high = inside.fold(f64::NEG_INFINITY, f64::max);
        let outliers = values
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(Self {
            q1: summary.q25,
            median: summary.median,
            q3: summary.q75,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// Price distribution per cut on a logarithmic axis.
#[derive(Debug, Clone)]
pub struct PriceByCutBoxPlot {
    /// One entry per cut, worst to best; `None` for cuts with no records.
    pub boxes: Vec<(Cut, Option<BoxStats>)>,
}

impl PriceByCutBoxPlot {
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let groups = group_values::<Cut>(dataset, NumericColumn::Price);
        if groups.is_empty() {
            return Err(ChartError::NoData("price by cut box plot").into());
        }

        let boxes = Cut::QUALITY_ASCENDING
            .iter()
            .map(|cut| (*cut, groups.get(cut).and_then(|v| BoxStats::of(v))))
            .collect();

        Ok(Self { boxes })
    }
}

impl Chart for PriceByCutBoxPlot {
    const FILE_STEM: &'static str = "box_price_cut";
    const SIZE: (u32, u32) = (800, 600);

    fn title(&self) -> &str {
        "Price by cut (log scale)"
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let (y_lo, y_hi) = log_bounds(self.boxes.iter().filter_map(|(_, b)| b.as_ref()).flat_map(|b| {
            b.outliers
                .iter()
                .copied()
                .chain([b.whisker_low, b.whisker_high])
        }));
        let labels: Vec<String> = self.boxes.iter().map(|(c, _)| c.to_string()).collect();
        let n = self.boxes.len() as f64;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(), ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(n - 0.5), (y_lo..y_hi).log_scale())?;

        let x_fmt = |x: &f64| category_label(&labels, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(self.boxes.len())
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("cut")
            .y_desc("price")
            .draw()?;

        for (i, (cut, stats)) in self.boxes.iter().enumerate() {
            let Some(b) = stats else { continue };
            let x = i as f64;
            let color = cut_color(*cut);

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - HALF_WIDTH, b.q1), (x + HALF_WIDTH, b.q3)],
                color.mix(0.7).filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - HALF_WIDTH, b.q1), (x + HALF_WIDTH, b.q3)],
                BLACK.stroke_width(1),
            )))?;

            let whisker_lines = [
                vec![(x - HALF_WIDTH, b.median), (x + HALF_WIDTH, b.median)],
                vec![(x, b.q3), (x, b.whisker_high)],
                vec![(x, b.q1), (x, b.whisker_low)],
                vec![(x - HALF_WIDTH / 2.0, b.whisker_high), (x + HALF_WIDTH / 2.0, b.whisker_high)],
                vec![(x - HALF_WIDTH / 2.0, b.whisker_low), (x + HALF_WIDTH / 2.0, b.whisker_low)],
            ];
            chart.draw_series(
                whisker_lines
                    .into_iter()
                    .map(|line| PathElement::new(line, BLACK.stroke_width(1))),
            )?;

            chart.draw_series(
                b.outliers
                    .iter()
                    .filter(|v| **v > 0.0)
                    .map(|v| Circle::new((x, *v), 2, BLACK.mix(0.5).stroke_width(1))),
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_dataset;

    #[test]
    fn test_box_stats_with_outlier() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let b = BoxStats::of(&values).unwrap();
        assert_eq!(b.median, 3.5);
        assert_eq!(b.q1, 2.25);
        assert_eq!(b.q3, 4.75);
        assert_eq!(b.whisker_low, 1.0);
        assert_eq!(b.whisker_high, 5.0);
        assert_eq!(b.outliers, vec![100.0]);
    }

    #[test]
    fn test_box_stats_single_value() {
        let b = BoxStats::of(&[7.0]).unwrap();
        assert_eq!(b.whisker_low, 7.0);
        assert_eq!(b.whisker_high, 7.0);
        assert!(b.outliers.is_empty());
        assert!(BoxStats::of(&[]).is_none());
    }

    #[test]
    fn test_boxes_in_quality_order() {
        let plot = PriceByCutBoxPlot::from_dataset(&sample_dataset()).unwrap();
        let order: Vec<Cut> = plot.boxes.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, Cut::QUALITY_ASCENDING.to_vec());
        assert!(plot.boxes.iter().all(|(_, b)| b.is_some()));
    }
}
