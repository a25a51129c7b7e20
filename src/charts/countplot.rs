use super::{category_label, cut_color, Chart, ChartError};
use crate::analysis::value_counts;
use crate::dataset::Dataset;
use crate::models::Cut;
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

const HALF_WIDTH: f64 = 0.4;

/// Number of records per cut, most frequent first.
#[derive(Debug, Clone)]
pub struct CutCountPlot {
    pub bars: Vec<(Cut, usize)>,
}

impl CutCountPlot {
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let bars = value_counts::<Cut>(dataset);
        if bars.is_empty() {
            return Err(ChartError::NoData("cut count plot").into());
        }
        Ok(Self { bars })
    }
}

impl Chart for CutCountPlot {
    const FILE_STEM: &'static str = "count_cut";
    const SIZE: (u32, u32) = (600, 400);

    fn title(&self) -> &str {
        "Count by cut"
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let labels: Vec<String> = self.bars.iter().map(|(c, _)| c.to_string()).collect();
        let n = self.bars.len() as f64;
        let y_max = self.bars.iter().map(|(_, c)| *c).max().unwrap_or(1) as f64 * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(), ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(-0.5..(n - 0.5), 0.0..y_max.max(1.0))?;

        let x_fmt = |x: &f64| category_label(&labels, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(self.bars.len())
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("cut")
            .y_desc("count")
            .draw()?;

        chart.draw_series(self.bars.iter().enumerate().map(|(i, (cut, count))| {
            let x = i as f64;
            Rectangle::new(
                [(x - HALF_WIDTH, 0.0), (x + HALF_WIDTH, *count as f64)],
                cut_color(*cut).filled(),
            )
        }))?;

        Ok(())
    }
}
