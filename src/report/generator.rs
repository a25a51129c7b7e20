//! Markdown report generation.
//!
//! This module writes the analysis report section by section into a single
//! markdown file. Every chart is rendered before its image reference is
//! appended, and the writer refuses to reference an image that is not on
//! disk.

use crate::analysis::{
    binned_pivot_mean, correlation_matrix, crosstab, describe_numeric, group_describe,
    group_describe_table, group_summary, group_summary_table, stats, value_counts,
    value_counts_table,
};
use crate::charts::{
    self, CaratPriceScatter, Chart, CorrelationHeatmap, CutCountPlot, PriceByClarityViolin,
    PriceByCutBoxPlot, PriceHistogram,
};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::models::{Clarity, Color, Cut, Diamond, ImageFormat, NumericColumn};
use crate::table::{format_number, Table};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Number of chart steps, used to size the progress bar.
const CHART_STEPS: u64 = 6;

/// Errors raised by the report writer.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("image {} must be written before it is referenced", .0.display())]
    MissingImage(PathBuf),

    #[error("image path {} has no file name", .0.display())]
    InvalidImagePath(PathBuf),
}

/// Where and how the report is produced.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Directory holding the report file and the image directory.
    pub output_dir: PathBuf,
    /// Image directory name, relative to `output_dir`.
    pub images_dir: String,
    /// Report file name, relative to `output_dir`.
    pub report_file: String,
    pub format: ImageFormat,
    pub scale: f64,
    pub head_rows: usize,
    pub histogram_bins: usize,
    pub carat_bins: usize,
    pub scatter_sample: usize,
    pub sample_seed: u64,
    pub show_progress: bool,
}

impl ReportOptions {
    pub fn images_path(&self) -> PathBuf {
        self.output_dir.join(&self.images_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }
}

impl From<&Config> for ReportOptions {
    fn from(config: &Config) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output.dir),
            images_dir: config.output.images_dir.clone(),
            report_file: config.output.report_file.clone(),
            format: config.charts.format,
            scale: config.charts.scale,
            head_rows: config.analysis.head_rows,
            histogram_bins: config.analysis.histogram_bins,
            carat_bins: config.analysis.carat_bins,
            scatter_sample: config.analysis.scatter_sample,
            sample_seed: config.analysis.sample_seed,
            show_progress: !config.general.quiet,
        }
    }
}

/// Turns a chart into an image file inside a directory.
pub trait ImageRenderer {
    fn render<C: Chart>(&mut self, chart: &C, dir: &Path) -> Result<PathBuf>;
}

/// Renders charts with plotters.
#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    pub format: ImageFormat,
    pub scale: f64,
}

impl ImageRenderer for PlottersRenderer {
    fn render<C: Chart>(&mut self, chart: &C, dir: &Path) -> Result<PathBuf> {
        charts::render(chart, dir, self.format, self.scale)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub report_path: PathBuf,
    pub images_dir: PathBuf,
    /// Image files, in the order they are referenced.
    pub images: Vec<PathBuf>,
    pub tables: usize,
    pub fallback_tables: usize,
}

/// Append-only markdown writer.
pub struct ReportWriter<W: Write> {
    out: W,
    link_dir: String,
    images: Vec<PathBuf>,
    tables: usize,
    fallback_tables: usize,
}

impl<W: Write> ReportWriter<W> {
    /// `link_dir` is the prefix image links are written with.
    pub fn new(out: W, link_dir: impl Into<String>) -> Self {
        Self {
            out,
            link_dir: link_dir.into(),
            images: Vec::new(),
            tables: 0,
            fallback_tables: 0,
        }
    }

    pub fn heading(&mut self, level: usize, text: &str) -> Result<()> {
        writeln!(self.out, "{} {}\n", "#".repeat(level.clamp(1, 6)), text)?;
        Ok(())
    }

    pub fn paragraph(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}\n", text)?;
        Ok(())
    }

    pub fn code_block(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "```\n{}\n```\n", text.trim_end())?;
        Ok(())
    }

    pub fn bullets(&mut self, items: &[String]) -> Result<()> {
        for item in items {
            writeln!(self.out, "- {}", item)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    pub fn rule(&mut self) -> Result<()> {
        writeln!(self.out, "---")?;
        Ok(())
    }

    /// Render a table, falling back to the delimited form when needed.
    pub fn table(&mut self, table: &Table) -> Result<()> {
        let rendered = table.render()?;
        if rendered.is_fallback() {
            self.fallback_tables += 1;
        }
        self.tables += 1;
        writeln!(self.out, "{}\n", rendered.as_str().trim_end())?;
        Ok(())
    }

    /// Reference an image that already exists on disk.
    pub fn image(&mut self, alt: &str, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(ReportError::MissingImage(path.to_path_buf()).into());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ReportError::InvalidImagePath(path.to_path_buf()))?;

        writeln!(self.out, "![{}]({}/{})\n", alt, self.link_dir, name)?;
        self.images.push(path.to_path_buf());
        Ok(())
    }

    /// Flush the output and return the writer with its bookkeeping.
    pub fn finish(mut self) -> Result<(W, Vec<PathBuf>, usize, usize)> {
        self.out.flush()?;
        Ok((self.out, self.images, self.tables, self.fallback_tables))
    }
}

/// Generate the full report: charts into the image directory, markdown
/// into the report file.
pub fn generate_report<R: ImageRenderer>(
    dataset: &Dataset,
    options: &ReportOptions,
    renderer: &mut R,
) -> Result<ReportSummary> {
    let images_dir = options.images_path();
    std::fs::create_dir_all(&images_dir)
        .with_context(|| format!("Failed to create image directory {}", images_dir.display()))?;

    let report_path = options.report_path();
    let file = File::create(&report_path)
        .with_context(|| format!("Failed to create report {}", report_path.display()))?;
    info!("Writing report to {}", report_path.display());

    let mut md = ReportWriter::new(BufWriter::new(file), options.images_dir.as_str());
    let progress = step_progress(options.show_progress);

    write_report(&mut md, dataset, options, renderer, &images_dir, &progress)?;

    progress.finish_and_clear();
    let (_, images, tables, fallback_tables) = md.finish()?;

    Ok(ReportSummary {
        report_path,
        images_dir,
        images,
        tables,
        fallback_tables,
    })
}

/// Write every section in its fixed order.
fn write_report<W: Write, R: ImageRenderer>(
    md: &mut ReportWriter<W>,
    dataset: &Dataset,
    options: &ReportOptions,
    renderer: &mut R,
    images_dir: &Path,
    progress: &ProgressBar,
) -> Result<()> {
    md.heading(1, "Exploratory analysis of the `diamonds` dataset")?;
    md.paragraph(&format!(
        "{} records with {} numeric and 3 categorical columns.",
        dataset.len(),
        NumericColumn::ALL.len()
    ))?;

    write_summary_section(md, dataset, options)?;

    // Price histogram
    progress.set_message("price histogram");
    let hist = PriceHistogram::from_dataset(dataset, options.histogram_bins)?;
    let path = renderer.render(&hist, images_dir)?;
    debug!("Histogram: {} bins over {} records", hist.bars.len(), hist.total());
    progress.inc(1);
    md.heading(2, "2. Price distribution (histogram)")?;
    md.image(hist.title(), &path)?;
    md.heading(4, "Price by cut (count / mean / median / std)")?;
    md.table(&group_summary_table(
        &group_summary::<Cut>(dataset, NumericColumn::Price),
        NumericColumn::Price,
    ))?;

    // Carat vs price scatter
    progress.set_message("carat/price scatter");
    let scatter = CaratPriceScatter::from_dataset(dataset, options.scatter_sample, options.sample_seed)?;
    let path = renderer.render(&scatter, images_dir)?;
    progress.inc(1);
    md.heading(2, "3. Carat vs price (scatter)")?;
    md.image(scatter.title(), &path)?;
    md.heading(4, "Mean price by carat range and cut")?;
    let pivot = binned_pivot_mean::<Cut>(
        dataset,
        NumericColumn::Carat,
        options.carat_bins,
        NumericColumn::Price,
    )?;
    debug!("Carat pivot covers {} of {} records", pivot.covered(), dataset.len());
    md.table(&pivot.to_table())?;

    // Box plot
    progress.set_message("price by cut box plot");
    let boxes = PriceByCutBoxPlot::from_dataset(dataset)?;
    let path = renderer.render(&boxes, images_dir)?;
    progress.inc(1);
    md.heading(2, "4. Price by cut (box plot)")?;
    md.image(boxes.title(), &path)?;
    md.heading(4, "Price statistics by cut")?;
    md.table(&group_describe_table(&group_describe::<Cut>(
        dataset,
        NumericColumn::Price,
    )))?;

    // Count plot
    progress.set_message("cut count plot");
    let counts = CutCountPlot::from_dataset(dataset)?;
    let path = renderer.render(&counts, images_dir)?;
    progress.inc(1);
    md.heading(2, "5. Cut distribution (count plot)")?;
    md.image(counts.title(), &path)?;
    md.heading(4, "Cut vs color (count)")?;
    let cut_color = crosstab::<Cut, Color>(dataset);
    debug!("Cut/color crosstab: {} records", cut_color.total());
    md.table(&cut_color.to_table())?;

    // Correlation heatmap
    progress.set_message("correlation heatmap");
    let heat = CorrelationHeatmap::from_dataset(dataset)?;
    let path = renderer.render(&heat, images_dir)?;
    progress.inc(1);
    md.heading(2, "6. Correlation of numeric columns (heatmap)")?;
    md.image(heat.title(), &path)?;
    md.heading(4, "Correlation matrix")?;
    md.table(&heat.matrix.to_table())?;

    // Violin plot
    progress.set_message("price by clarity violin");
    let violin = PriceByClarityViolin::from_dataset(dataset)?;
    let path = renderer.render(&violin, images_dir)?;
    progress.inc(1);
    md.heading(2, "7. Price by clarity (violin plot)")?;
    md.image(violin.title(), &path)?;
    md.heading(4, "Price by clarity (count / mean / median / std)")?;
    md.table(&group_summary_table(
        &group_summary::<Clarity>(dataset, NumericColumn::Price),
        NumericColumn::Price,
    ))?;

    md.rule()?;
    md.heading(3, "Conclusion")?;
    md.bullets(&conclusions(dataset))?;

    Ok(())
}

fn write_summary_section<W: Write>(
    md: &mut ReportWriter<W>,
    dataset: &Dataset,
    options: &ReportOptions,
) -> Result<()> {
    md.heading(2, "1. Overview and descriptive statistics")?;

    md.heading(3, "Data sample")?;
    md.table(&records_table(dataset.head(options.head_rows)))?;

    md.heading(3, "Data summary")?;
    md.code_block(&dataset.info())?;

    md.heading(3, "Numeric statistics (describe)")?;
    md.table(&describe_numeric(dataset))?;

    md.heading(3, "Categorical value counts")?;
    md.heading(4, "`cut` distribution")?;
    md.table(&value_counts_table(&value_counts::<Cut>(dataset)))?;
    md.heading(4, "`color` distribution")?;
    md.table(&value_counts_table(&value_counts::<Color>(dataset)))?;
    md.heading(4, "`clarity` distribution")?;
    md.table(&value_counts_table(&value_counts::<Clarity>(dataset)))?;

    debug!("Summary section written");
    Ok(())
}

/// Records laid out as a table with a positional index.
pub fn records_table(records: &[Diamond]) -> Table {
    let mut table = Table::new([
        "", "carat", "cut", "color", "clarity", "depth", "table", "price", "x", "y", "z",
    ]);
    for (i, d) in records.iter().enumerate() {
        table.push_row(
            i.to_string(),
            [
                format_number(d.carat),
                d.cut.to_string(),
                d.color.to_string(),
                d.clarity.to_string(),
                format_number(d.depth),
                format_number(d.table),
                format_number(d.price),
                format_number(d.x),
                format_number(d.y),
                format_number(d.z),
            ],
        );
    }
    table
}

/// Closing observations, backed by the numbers in the report.
fn conclusions(dataset: &Dataset) -> Vec<String> {
    let prices = dataset.column(NumericColumn::Price);
    let mean = stats::mean(&prices);
    let median = stats::median(&prices);
    let skew = if mean > median {
        "right-skewed"
    } else {
        "not right-skewed"
    };
    let corr = correlation_matrix(dataset, &[NumericColumn::Carat, NumericColumn::Price]).get(0, 1);

    vec![
        format!(
            "`price` is {} (mean {} vs median {}), and `carat` and `price` have a Pearson correlation of {:.2}.",
            skew,
            format_number(mean),
            format_number(median),
            corr
        ),
        "Mean price differs across `cut`, `clarity` and `color`; `clarity` and `cut` show the largest price differences."
            .to_string(),
    ]
}

fn step_progress(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(CHART_STEPS);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_dataset;

    /// Writes a placeholder file per chart instead of drawing it.
    struct StubRenderer {
        format: ImageFormat,
        rendered: Vec<PathBuf>,
    }

    impl StubRenderer {
        fn new() -> Self {
            Self {
                format: ImageFormat::Png,
                rendered: Vec::new(),
            }
        }
    }

    impl ImageRenderer for StubRenderer {
        fn render<C: Chart>(&mut self, chart: &C, dir: &Path) -> Result<PathBuf> {
            let path = dir.join(charts::file_name::<C>(self.format));
            std::fs::write(&path, chart.title())?;
            self.rendered.push(path.clone());
            Ok(path)
        }
    }

    fn options(dir: &Path) -> ReportOptions {
        let mut opts = ReportOptions::from(&Config::default());
        opts.output_dir = dir.to_path_buf();
        opts.show_progress = false;
        opts
    }

    fn image_refs(markdown: &str) -> Vec<String> {
        markdown
            .lines()
            .filter(|l| l.starts_with("!["))
            .filter_map(|l| {
                let start = l.find("](")? + 2;
                let end = l.rfind(')')?;
                Some(l[start..end].to_string())
            })
            .collect()
    }

    fn tabular_lines(markdown: &str) -> Vec<&str> {
        markdown.lines().filter(|l| l.starts_with('|')).collect()
    }

    #[test]
    fn test_writer_rejects_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut md = ReportWriter::new(Vec::new(), "images");

        let err = md.image("missing", &dir.path().join("nope.png")).unwrap_err();
        assert!(err.downcast_ref::<ReportError>().is_some());

        let (out, images, _, _) = md.finish().unwrap();
        assert!(out.is_empty());
        assert!(images.is_empty());
    }

    #[test]
    fn test_writer_links_relative_to_image_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist_price.png");
        std::fs::write(&path, b"png").unwrap();

        let mut md = ReportWriter::new(Vec::new(), "images");
        md.image("Price histogram", &path).unwrap();

        let (out, images, _, _) = md.finish().unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "![Price histogram](images/hist_price.png)\n\n");
        assert_eq!(images, vec![path]);
    }

    #[test]
    fn test_writer_counts_fallback_tables() {
        let mut ragged = Table::new(["a", "b"]);
        ragged.push_row("1", ["2", "3"]);
        let mut ok = Table::new(["a", "b"]);
        ok.push_row("1", ["2"]);

        let mut md = ReportWriter::new(Vec::new(), "images");
        md.table(&ok).unwrap();
        md.table(&ragged).unwrap();

        let (out, _, tables, fallbacks) = md.finish().unwrap();
        assert_eq!(tables, 2);
        assert_eq!(fallbacks, 1);
        assert!(String::from_utf8(out).unwrap().contains("1|2|3"));
    }

    #[test]
    fn test_report_embeds_each_image_once() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let mut renderer = StubRenderer::new();

        let summary = generate_report(&sample_dataset(), &opts, &mut renderer).unwrap();
        let markdown = std::fs::read_to_string(&summary.report_path).unwrap();

        let refs = image_refs(&markdown);
        assert_eq!(refs.len(), 6);
        assert_eq!(summary.images, renderer.rendered);

        let mut unique = refs.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), refs.len());

        for r in &refs {
            assert!(dir.path().join(r).is_file(), "dangling reference {}", r);
        }
    }

    #[test]
    fn test_report_section_order() {
        let dir = tempfile::tempdir().unwrap();
        let summary =
            generate_report(&sample_dataset(), &options(dir.path()), &mut StubRenderer::new())
                .unwrap();
        let markdown = std::fs::read_to_string(&summary.report_path).unwrap();

        let markers = [
            "## 1. Overview",
            "images/hist_price.png",
            "images/scatter_carat_price.png",
            "images/box_price_cut.png",
            "images/count_cut.png",
            "images/corr_heatmap.png",
            "images/violin_price_clarity.png",
            "### Conclusion",
        ];
        let positions: Vec<usize> = markers
            .iter()
            .map(|m| markdown.find(m).unwrap_or_else(|| panic!("missing {}", m)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(summary.tables, 11);
        assert_eq!(summary.fallback_tables, 0);
    }

    #[test]
    fn test_plotters_renders_every_chart() {
        let ds = sample_dataset();
        for format in [ImageFormat::Svg, ImageFormat::Png] {
            let dir = tempfile::tempdir().unwrap();
            let mut opts = options(dir.path());
            opts.format = format;
            let mut renderer = PlottersRenderer { format, scale: 0.5 };

            let summary = generate_report(&ds, &opts, &mut renderer).unwrap();
            assert_eq!(summary.images.len(), 6);
            for image in &summary.images {
                assert_eq!(
                    image.extension().and_then(|e| e.to_str()),
                    Some(format.extension())
                );
                let size = std::fs::metadata(image).unwrap().len();
                assert!(size > 0, "{} is empty", image.display());
            }
        }
    }

    #[test]
    fn test_tabular_sections_are_reproducible() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let ds = sample_dataset();

        let a = generate_report(&ds, &options(first.path()), &mut StubRenderer::new()).unwrap();
        let b = generate_report(&ds, &options(second.path()), &mut StubRenderer::new()).unwrap();

        let a = std::fs::read_to_string(a.report_path).unwrap();
        let b = std::fs::read_to_string(b.report_path).unwrap();
        assert!(!tabular_lines(&a).is_empty());
        assert_eq!(tabular_lines(&a), tabular_lines(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_records_table() {
        let ds = sample_dataset();
        let table = records_table(ds.head(5));
        assert_eq!(table.rows.len(), 5);
        assert_eq!(
            table.rows[0],
            vec!["0", "0.23", "Ideal", "E", "SI2", "61.5", "55", "326", "3.95", "3.98", "2.43"]
        );
    }

    #[test]
    fn test_conclusions_report_correlation() {
        let lines = conclusions(&sample_dataset());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("`price` is right-skewed"));
        assert!(lines[0].contains("Pearson correlation of 0."));
    }
}
