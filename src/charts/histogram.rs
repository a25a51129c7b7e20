use super::{Chart, ChartError};
use crate::analysis::stats::{self, Kde};
use crate::analysis::AnalysisError;
use crate::dataset::Dataset;
use crate::models::NumericColumn;
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

const BAR_COLOR: RGBColor = RGBColor(76, 114, 176);
const KDE_POINTS: usize = 200;

/// Price histogram with an overlaid kernel density curve.
#[derive(Debug, Clone)]
pub struct PriceHistogram {
    /// `(lower, upper, count)` per bin.
    pub bars: Vec<(f64, f64, usize)>,
    /// Density scaled to bar heights (count units).
    pub density: Vec<(f64, f64)>,
}

/// Equal-width histogram over exactly `[min, max]`.
///
/// Bins are left-closed `[a, b)` except the last, which also holds the
/// maximum. A constant sample is spread over `value ± 0.5`.
pub fn histogram_bars(values: &[f64], count: usize) -> Result<Vec<(f64, f64, usize)>, AnalysisError> {
    if count == 0 {
        return Err(AnalysisError::ZeroBins);
    }
    let (mut lo, mut hi) = (stats::min(values), stats::max(values));
    if values.is_empty() || !lo.is_finite() || !hi.is_finite() {
        return Err(AnalysisError::EmptyColumn("price"));
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / count as f64;
    let mut edges: Vec<f64> = (0..=count).map(|i| lo + width * i as f64).collect();
    edges[count] = hi;

    let mut counts = vec![0usize; count];
    for v in values {
        // first edge strictly above v, minus one; the maximum goes to the last bin
        let i = edges.partition_point(|e| *e <= *v).saturating_sub(1).min(count - 1);
        counts[i] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (edges[i], edges[i + 1], c))
        .collect())
}

impl PriceHistogram {
    pub fn from_dataset(dataset: &Dataset, bin_count: usize) -> Result<Self> {
        let prices = dataset.column(NumericColumn::Price);
        if prices.is_empty() {
            return Err(ChartError::NoData("price histogram").into());
        }

        let bars = histogram_bars(&prices, bin_count)?;

        let (lo, hi) = (stats::min(&prices), stats::max(&prices));
        let width = bars[0].1 - bars[0].0;
        let n = prices.len() as f64;
        let density = Kde::new(&prices)
            .map(|kde| {
                kde.curve(lo, hi, KDE_POINTS)
                    .into_iter()
                    .map(|(x, d)| (x, d * n * width))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { bars, density })
    }

    pub fn total(&self) -> usize {
        self.bars.iter().map(|(_, _, c)| c).sum()
    }
}

impl Chart for PriceHistogram {
    const FILE_STEM: &'static str = "hist_price";
    const SIZE: (u32, u32) = (800, 500);

    fn title(&self) -> &str {
        "Price histogram"
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let x_min = self.bars.first().map(|b| b.0).unwrap_or(0.0);
        let x_max = self.bars.last().map(|b| b.1).unwrap_or(1.0);
        let y_bar = self.bars.iter().map(|b| b.2).max().unwrap_or(1) as f64;
        let y_kde = self.density.iter().map(|p| p.1).fold(0.0, f64::max);
        let y_max = y_bar.max(y_kde).max(1.0) * 1.05;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(), ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("price")
            .y_desc("Count")
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()?;

        chart.draw_series(self.bars.iter().map(|(lo, hi, c)| {
            Rectangle::new([(*lo, 0.0), (*hi, *c as f64)], BAR_COLOR.mix(0.6).filled())
        }))?;

        if !self.density.is_empty() {
            chart.draw_series(LineSeries::new(
                self.density.iter().copied(),
                BAR_COLOR.stroke_width(2),
            ))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_dataset;

    #[test]
    fn test_histogram_counts_every_record() {
        let ds = sample_dataset();
        let hist = PriceHistogram::from_dataset(&ds, 50).unwrap();
        assert_eq!(hist.bars.len(), 50);
        assert_eq!(hist.total(), ds.len());
    }

    #[test]
    fn test_histogram_bins_are_left_closed() {
        let bars = histogram_bars(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        let counts: Vec<usize> = bars.iter().map(|b| b.2).collect();
        assert_eq!(counts, vec![1, 1, 1, 2]);
        assert_eq!(bars[0].0, 0.0);
        assert_eq!(bars[3].1, 4.0);
    }

    #[test]
    fn test_histogram_constant_sample() {
        let bars = histogram_bars(&[5.0, 5.0], 2).unwrap();
        assert_eq!(bars[0], (4.5, 5.0, 0));
        assert_eq!(bars[1], (5.0, 5.5, 2));
        assert!(histogram_bars(&[1.0], 0).is_err());
    }

    #[test]
    fn test_histogram_bars_are_contiguous() {
        let hist = PriceHistogram::from_dataset(&sample_dataset(), 10).unwrap();
        for pair in hist.bars.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_density_overlay_spans_price_range() {
        let hist = PriceHistogram::from_dataset(&sample_dataset(), 50).unwrap();
        assert_eq!(hist.density.len(), KDE_POINTS);
        assert_eq!(hist.density.first().unwrap().0, 326.0);
        assert!((hist.density.last().unwrap().0 - 351.0).abs() < 1e-9);
        assert!(hist.density.iter().all(|(_, d)| *d >= 0.0));
    }
}
