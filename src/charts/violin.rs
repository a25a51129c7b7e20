use super::{category_label, log_bounds, Chart, ChartError, PALETTE};
use crate::analysis::group_values;
use crate::analysis::stats::{self, Kde};
use crate::dataset::Dataset;
use crate::models::{Categorical, Clarity, NumericColumn};
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

const HALF_WIDTH: f64 = 0.4;
const PROFILE_POINTS: usize = 100;

/// Outline of one violin.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolinShape {
    /// `(price, half_width)` pairs from the lowest to the highest price.
    Profile(Vec<(f64, f64)>),
    /// Group too small or constant for a density estimate.
    Flat(f64),
}

/// Price distribution per clarity on a logarithmic axis.
///
/// Densities are estimated on log10(price) so each violin keeps its shape
/// on the log axis.
#[derive(Debug, Clone)]
pub struct PriceByClarityViolin {
    pub violins: Vec<(Clarity, ViolinShape, f64)>,
}

/// Violin outline for one group: KDE of log10 values, widest point scaled
/// to `HALF_WIDTH`.
pub fn violin_shape(values: &[f64]) -> Option<ViolinShape> {
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    if positive.is_empty() {
        return None;
    }
    let logs: Vec<f64> = positive.iter().map(|v| v.log10()).collect();

    let Some(kde) = Kde::new(&logs) else {
        return Some(ViolinShape::Flat(positive[0]));
    };

    let curve = kde.curve(stats::min(&logs), stats::max(&logs), PROFILE_POINTS);
    let peak = curve.iter().map(|(_, d)| *d).fold(0.0, f64::max);
    if peak <= 0.0 {
        return Some(ViolinShape::Flat(stats::median(&positive)));
    }

    Some(ViolinShape::Profile(
        curve
            .into_iter()
            .map(|(y, d)| (10f64.powf(y), HALF_WIDTH * d / peak))
            .collect(),
    ))
}

impl PriceByClarityViolin {
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let groups = group_values::<Clarity>(dataset, NumericColumn::Price);
        let violins: Vec<(Clarity, ViolinShape, f64)> = groups
            .into_iter()
            .filter_map(|(clarity, values)| {
                let median = stats::median(&values);
                violin_shape(&values).map(|shape| (clarity, shape, median))
            })
            .collect();

        if violins.is_empty() {
            return Err(ChartError::NoData("price by clarity violin").into());
        }
        Ok(Self { violins })
    }
}

impl Chart for PriceByClarityViolin {
    const FILE_STEM: &'static str = "violin_price_clarity";
    const SIZE: (u32, u32) = (1000, 600);

    fn title(&self) -> &str {
        "Price by clarity (violin, log scale)"
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let (y_lo, y_hi) = log_bounds(self.violins.iter().flat_map(|(_, shape, _)| match shape {
            ViolinShape::Profile(points) => points.iter().map(|p| p.0).collect::<Vec<_>>(),
            ViolinShape::Flat(v) => vec![*v],
        }));
        let labels: Vec<String> = self.violins.iter().map(|(c, _, _)| c.to_string()).collect();
        let n = self.violins.len() as f64;

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
            .x_labels(self.violins.len())
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("clarity")
            .y_desc("price")
            .draw()?;

        for (i, (clarity, shape, median)) in self.violins.iter().enumerate() {
            let x = i as f64;
            let color = PALETTE[clarity.index() % PALETTE.len()];

            match shape {
                ViolinShape::Profile(points) => {
                    let outline: Vec<(f64, f64)> = points
                        .iter()
                        .map(|(y, w)| (x - w, *y))
                        .chain(points.iter().rev().map(|(y, w)| (x + w, *y)))
                        .collect();
                    chart.draw_series(std::iter::once(Polygon::new(
                        outline.clone(),
                        color.mix(0.7).filled(),
                    )))?;
                    chart.draw_series(std::iter::once(PathElement::new(
                        outline,
                        BLACK.stroke_width(1),
                    )))?;
                }
                ViolinShape::Flat(v) => {
                    chart.draw_series(std::iter::once(PathElement::new(
                        vec![(x - HALF_WIDTH, *v), (x + HALF_WIDTH, *v)],
                        color.stroke_width(2),
                    )))?;
                }
            }

            chart.draw_series(std::iter::once(Circle::new(
                (x, *median),
                3,
                WHITE.filled(),
            )))?;
        }

        Ok(())
    }
}
