use super::{cut_color, Chart, ChartError};
use crate::dataset::Dataset;
use crate::models::{Categorical, Cut};
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Carat against price for a seeded random sample, colored by cut.
#[derive(Debug, Clone)]
pub struct CaratPriceScatter {
    /// `(carat, price, cut)` of each sampled record, in dataset order.
    pub points: Vec<(f64, f64, Cut)>,
}

/// Indices of a seeded random sample of `amount` out of `len` records.
///
/// The sample is clamped to `len` and returned in ascending order, so the
/// same seed always yields the same points in the same draw order.
pub fn sample_indices(len: usize, amount: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, len, amount.min(len)).into_vec();
    indices.sort_unstable();
    indices
}

impl CaratPriceScatter {
    pub fn from_dataset(dataset: &Dataset, sample_size: usize, seed: u64) -> Result<Self> {
        if dataset.records().is_empty() {
            return Err(ChartError::NoData("carat/price scatter").into());
        }

        let records = dataset.records();
        let points = sample_indices(records.len(), sample_size, seed)
            .into_iter()
            .map(|i| {
                let d = &records[i];
                (d.carat, d.price, d.cut)
            })
            .collect();

        Ok(Self { points })
    }
}

impl Chart for CaratPriceScatter {
    const FILE_STEM: &'static str = "scatter_carat_price";
    const SIZE: (u32, u32) = (800, 600);

    fn title(&self) -> &str {
        "Carat vs price (sample)"
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let x_max = self.points.iter().map(|p| p.0).fold(0.0, f64::max) * 1.05;
        let y_max = self.points.iter().map(|p| p.1).fold(0.0, f64::max) * 1.05;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(), ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max.max(1.0), 0.0..y_max.max(1.0))?;

        chart
            .configure_mesh()
            .x_desc("carat")
            .y_desc("price")
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()?;

        for cut in Cut::ALL.iter().copied() {
            let color = cut_color(cut);
            let series: Vec<(f64, f64)> = self
                .points
                .iter()
                .filter(|p| p.2 == cut)
                .map(|p| (p.0, p.1))
                .collect();
            if series.is_empty() {
                continue;
            }

            chart
                .draw_series(
                    series
                        .into_iter()
                        .map(move |p| Circle::new(p, 3, color.mix(0.6).filled())),
                )?
                .label(cut.to_string())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .draw()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_dataset;

    #[test]
    fn test_sample_is_deterministic() {
        let a = sample_indices(53940, 3000, 1);
        let b = sample_indices(53940, 3000, 1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3000);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_different_seed_different_sample() {
        assert_ne!(sample_indices(53940, 3000, 1), sample_indices(53940, 3000, 2));
    }

    #[test]
    fn test_sample_clamped_to_dataset() {
        let ds = sample_dataset();
        let scatter = CaratPriceScatter::from_dataset(&ds, 3000, 1).unwrap();
        assert_eq!(scatter.points.len(), ds.len());
    }

    #[test]
    fn test_sample_subset() {
        let ds = sample_dataset();
        let scatter = CaratPriceScatter::from_dataset(&ds, 7, 1).unwrap();
        assert_eq!(scatter.points.len(), 7);
        for (carat, price, cut) in &scatter.points {
            assert!(ds
                .records()
                .iter()
                .any(|d| d.carat == *carat && d.price == *price && d.cut == *cut));
        }
    }
}
