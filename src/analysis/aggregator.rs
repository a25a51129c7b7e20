//! Grouped and pivoted aggregates over the dataset.
//!
//! Each aggregate is computed fresh from the dataset and converted into a
//! [`Table`] for the report. Categorical groups are listed in the dataset's
//! declared category order and only categories that occur are included.

use super::stats;
use crate::dataset::Dataset;
use crate::models::{Categorical, NumericColumn};
use crate::table::{format_number, Table};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while building an aggregate.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot bin column '{0}': no values")]
    EmptyColumn(&'static str),

    #[error("bin count must be at least 1")]
    ZeroBins,
}

/// Count, mean, spread and quartiles of one numeric sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// Row labels used when a summary is laid out as a table.
    pub const STAT_NAMES: [&'static str; 8] =
        ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    pub fn of(values: &[f64]) -> Self {
        let sorted = stats::sorted(values);
        Self {
            count: values.len(),
            mean: stats::mean(values),
            std: stats::std_dev(values),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: stats::quantile_sorted(&sorted, 0.25),
            median: stats::quantile_sorted(&sorted, 0.5),
            q75: stats::quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }

    /// Values in the order of [`Self::STAT_NAMES`].
    pub fn values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }

    pub fn iqr(&self) -> f64 {
        self.q75 - self.q25
    }
}

/// Values of `column` partitioned by the categorical dimension `C`.
pub fn group_values<C: Categorical>(dataset: &Dataset, column: NumericColumn) -> BTreeMap<C, Vec<f64>> {
    let mut grouped: BTreeMap<C, Vec<f64>> = BTreeMap::new();
    for d in dataset.records() {
        grouped.entry(C::of(d)).or_default().push(column.value(d));
    }
    grouped
}

/// Describe every numeric column: one column per variable, one row per statistic.
pub fn describe_numeric(dataset: &Dataset) -> Table {
    let summaries: Vec<ColumnSummary> = NumericColumn::ALL
        .iter()
        .map(|c| ColumnSummary::of(&dataset.column(*c)))
        .collect();

    let mut table = Table::new(std::iter::once("").chain(NumericColumn::ALL.iter().map(|c| c.name())));
    for (i, stat) in ColumnSummary::STAT_NAMES.iter().enumerate() {
        table.push_row(*stat, summaries.iter().map(|s| format_number(s.values()[i])));
    }
    table
}

/// Occurrences of each category, most frequent first.
///
/// Ties keep the declared category order.
pub fn value_counts<C: Categorical>(dataset: &Dataset) -> Vec<(C, usize)> {
    let mut counts: BTreeMap<C, usize> = BTreeMap::new();
    for d in dataset.records() {
        *counts.entry(C::of(d)).or_default() += 1;
    }

    let mut counts: Vec<(C, usize)> = counts.into_iter().collect();
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    counts
}

pub fn value_counts_table<C: Categorical>(counts: &[(C, usize)]) -> Table {
    let mut table = Table::new([C::COLUMN, "count"]);
    for (category, count) in counts {
        table.push_row(category.to_string(), [count.to_string()]);
    }
    table
}

/// Count, mean, median and standard deviation of one column within a group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats<C> {
    pub category: C,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

/// Per-category count / mean / median / std of `column`.
pub fn group_summary<C: Categorical>(dataset: &Dataset, column: NumericColumn) -> Vec<GroupStats<C>> {
    group_values::<C>(dataset, column)
        .into_iter()
        .map(|(category, values)| GroupStats {
            category,
            count: values.len(),
            mean: stats::mean(&values),
            median: stats::median(&values),
            std: stats::std_dev(&values),
        })
        .collect()
}

pub fn group_summary_table<C: Categorical>(groups: &[GroupStats<C>], column: NumericColumn) -> Table {
    let name = column.name();
    let mut table = Table::new([
        C::COLUMN.to_string(),
        format!("count_{}", name),
        format!("mean_{}", name),
        format!("median_{}", name),
        format!("std_{}", name),
    ]);
    for g in groups {
        table.push_row(
            g.category.to_string(),
            [
                g.count.to_string(),
                format_number(g.mean),
                format_number(g.median),
                format_number(g.std),
            ],
        );
    }
    table
}

/// Full per-category summary of `column` (count, mean, std, quartiles).
pub fn group_describe<C: Categorical>(dataset: &Dataset, column: NumericColumn) -> Vec<(C, ColumnSummary)> {
    group_values::<C>(dataset, column)
        .into_iter()
        .map(|(category, values)| (category, ColumnSummary::of(&values)))
        .collect()
}

pub fn group_describe_table<C: Categorical>(groups: &[(C, ColumnSummary)]) -> Table {
    let mut table = Table::new(std::iter::once(C::COLUMN).chain(ColumnSummary::STAT_NAMES));
    for (category, summary) in groups {
        table.push_row(
            category.to_string(),
            summary.values().iter().map(|v| format_number(*v)),
        );
    }
    table
}

/// Counts over two categorical dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab<R, C> {
    pub rows: Vec<R>,
    pub columns: Vec<C>,
    pub counts: Vec<Vec<usize>>,
}

impl<R: Categorical, C: Categorical> CrossTab<R, C> {
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn to_table(&self) -> Table {
        let header = std::iter::once(format!("{} \\ {}", R::COLUMN, C::COLUMN))
            .chain(self.columns.iter().map(|c| c.to_string()));
        let mut table = Table::new(header);
        for (row, counts) in self.rows.iter().zip(&self.counts) {
            table.push_row(row.to_string(), counts.iter().map(|c| c.to_string()));
        }
        table
    }
}

/// Cross-tabulate two categorical dimensions.
pub fn crosstab<R: Categorical, C: Categorical>(dataset: &Dataset) -> CrossTab<R, C> {
    let mut cells: BTreeMap<(R, C), usize> = BTreeMap::new();
    for d in dataset.records() {
        *cells.entry((R::of(d), C::of(d))).or_default() += 1;
    }

    let rows: Vec<R> = R::ALL
        .iter()
        .copied()
        .filter(|r| cells.keys().any(|(kr, _)| kr == r))
        .collect();
    let columns: Vec<C> = C::ALL
        .iter()
        .copied()
        .filter(|c| cells.keys().any(|(_, kc)| kc == c))
        .collect();

    let counts = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| cells.get(&(*r, *c)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    CrossTab {
        rows,
        columns,
        counts,
    }
}

/// Equal-width, right-closed intervals covering a value range.
///
/// `edges` has one more entry than there are bins. Bin `i` is
/// `(edges[i], edges[i + 1]]`; the first edge sits slightly below the
/// minimum so the minimum itself falls into bin 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    edges: Vec<f64>,
}

impl Bins {
    /// Split the observed range of `values` into `count` bins.
    pub fn equal_width(values: &[f64], count: usize, column: &'static str) -> Result<Self, AnalysisError> {
        if count == 0 {
            return Err(AnalysisError::ZeroBins);
        }
        let (mut lo, mut hi) = (stats::min(values), stats::max(values));
        if values.is_empty() || !lo.is_finite() || !hi.is_finite() {
            return Err(AnalysisError::EmptyColumn(column));
        }

        let constant = lo == hi;
        if constant {
            let pad = if lo != 0.0 { 0.001 * lo.abs() } else { 0.001 };
            lo -= pad;
            hi += pad;
        }

        let width = (hi - lo) / count as f64;
        let mut edges: Vec<f64> = (0..=count).map(|i| lo + width * i as f64).collect();
        edges[count] = hi;
        if !constant {
            edges[0] -= (hi - lo) * 0.001;
        }

        Ok(Self { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    /// `(lower, upper]` bounds of bin `i`.
    pub fn interval(&self, i: usize) -> (f64, f64) {
        (self.edges[i], self.edges[i + 1])
    }

    /// Bin containing `value`, if it lies inside the covered range.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        let last = *self.edges.last()?;
        if !(value > self.edges[0] && value <= last) {
            return None;
        }
        let idx = self.edges.partition_point(|e| *e < value);
        Some(idx.saturating_sub(1).min(self.len() - 1))
    }

    pub fn label(&self, i: usize) -> String {
        let (lo, hi) = self.interval(i);
        format!("({:.3}, {:.3}]", lo, hi)
    }
}

/// Mean of one column per (bin of another column, category).
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedPivot<C> {
    pub binned: NumericColumn,
    pub bins: Bins,
    pub columns: Vec<C>,
    /// `means[bin][column]`, NaN where the cell is empty.
    pub means: Vec<Vec<f64>>,
    /// Number of records per cell.
    pub counts: Vec<Vec<usize>>,
}

impl<C: Categorical> BinnedPivot<C> {
    /// Records that fell into some cell.
    pub fn covered(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn to_table(&self) -> Table {
        let header = std::iter::once(format!("{}_bin \\ {}", self.binned.name(), C::COLUMN))
            .chain(self.columns.iter().map(|c| c.to_string()));
        let mut table = Table::new(header);
        for (i, row) in self.means.iter().enumerate() {
            table.push_row(self.bins.label(i), row.iter().map(|v| format_number(*v)));
        }
        table
    }
}

/// Bin `binned` into `bin_count` equal-width intervals and average `value`
/// per (interval, category).
pub fn binned_pivot_mean<C: Categorical>(
    dataset: &Dataset,
    binned: NumericColumn,
    bin_count: usize,
    value: NumericColumn,
) -> Result<BinnedPivot<C>, AnalysisError> {
    let bins = Bins::equal_width(&dataset.column(binned), bin_count, binned.name())?;

    let columns: Vec<C> = C::ALL
        .iter()
        .copied()
        .filter(|c| dataset.records().iter().any(|d| C::of(d) == *c))
        .collect();

    let mut sums = vec![vec![0.0; columns.len()]; bins.len()];
    let mut counts = vec![vec![0usize; columns.len()]; bins.len()];
    for d in dataset.records() {
        let (Some(b), Some(c)) = (
            bins.index_of(binned.value(d)),
            columns.iter().position(|c| *c == C::of(d)),
        ) else {
            continue;
        };
        sums[b][c] += value.value(d);
        counts[b][c] += 1;
    }

    let means = sums
        .iter()
        .zip(&counts)
        .map(|(s, n)| {
            s.iter()
                .zip(n)
                .map(|(sum, count)| if *count == 0 { f64::NAN } else { sum / *count as f64 })
                .collect()
        })
        .collect();

    Ok(BinnedPivot {
        binned,
        bins,
        columns,
        means,
        counts,
    })
}

/// Pairwise Pearson correlation of numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn to_table(&self) -> Table {
        let header = std::iter::once("").chain(self.columns.iter().map(|c| c.name()));
        let mut table = Table::new(header);
        for (col, row) in self.columns.iter().zip(&self.values) {
            table.push_row(col.name(), row.iter().map(|v| format_number(*v)));
        }
        table
    }
}

pub fn correlation_matrix(dataset: &Dataset, columns: &[NumericColumn]) -> CorrelationMatrix {
    let data: Vec<Vec<f64>> = columns.iter().map(|c| dataset.column(*c)).collect();
    let n = columns.len();

    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = stats::pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_dataset;
    use crate::models::{Clarity, Color, Cut};

    #[test]
    fn test_group_summary_counts_sum_to_total() {
        let ds = sample_dataset();

        let by_cut = group_summary::<Cut>(&ds, NumericColumn::Price);
        assert_eq!(by_cut.iter().map(|g| g.count).sum::<usize>(), ds.len());

        let by_clarity = group_summary::<Clarity>(&ds, NumericColumn::Price);
        assert_eq!(by_clarity.iter().map(|g| g.count).sum::<usize>(), ds.len());
    }

    #[test]
    fn test_group_summary_values() {
        let ds = sample_dataset();
        let by_cut = group_summary::<Cut>(&ds, NumericColumn::Price);

        assert_eq!(by_cut[0].category, Cut::Ideal);
        let ideal = &by_cut[0];
        assert_eq!(ideal.count, 4);
        // 326, 340, 344, 348
        assert!((ideal.mean - 339.5).abs() < 1e-9);
        assert!((ideal.median - 342.0).abs() < 1e-9);

        let fair = by_cut.iter().find(|g| g.category == Cut::Fair).unwrap();
        assert_eq!(fair.count, 1);
        assert!(fair.std.is_nan());
    }

    #[test]
    fn test_groups_follow_declared_order() {
        let ds = sample_dataset();
        let cuts: Vec<Cut> = group_summary::<Cut>(&ds, NumericColumn::Price)
            .into_iter()
            .map(|g| g.category)
            .collect();
        assert_eq!(
            cuts,
            vec![Cut::Ideal, Cut::Premium, Cut::VeryGood, Cut::Good, Cut::Fair]
        );
    }

    #[test]
    fn test_group_summary_table_header() {
        let ds = sample_dataset();
        let table = group_summary_table(&group_summary::<Cut>(&ds, NumericColumn::Price), NumericColumn::Price);
        assert_eq!(
            table.header,
            vec!["cut", "count_price", "mean_price", "median_price", "std_price"]
        );
        assert_eq!(table.rows.len(), 5);
    }

    #[test]
    fn test_value_counts_sorted_desc_with_stable_ties() {
        let ds = sample_dataset();
        let counts = value_counts::<Cut>(&ds);
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), 20);
        // Premium, Very Good and Good all have 5; declared order breaks the tie
        assert_eq!(
            counts,
            vec![
                (Cut::Premium, 5),
                (Cut::VeryGood, 5),
                (Cut::Good, 5),
                (Cut::Ideal, 4),
                (Cut::Fair, 1),
            ]
        );
    }

    #[test]
    fn test_describe_numeric_shape() {
        let ds = sample_dataset();
        let table = describe_numeric(&ds);
        assert_eq!(table.header.len(), 1 + NumericColumn::ALL.len());
        assert_eq!(table.rows.len(), 8);
        assert_eq!(table.rows[0][0], "count");
        assert!(table.rows[0][1..].iter().all(|c| c == "20"));
        // min carat in the sample is 0.2
        assert_eq!(table.rows[3][1], "0.2");
    }

    #[test]
    fn test_group_describe_matches_column_summary() {
        let ds = sample_dataset();
        let groups = group_describe::<Cut>(&ds, NumericColumn::Price);
        let good = groups.iter().find(|(c, _)| *c == Cut::Good).unwrap().1;
        // 327, 335, 339, 351, 351
        assert_eq!(good.count, 5);
        assert_eq!(good.min, 327.0);
        assert_eq!(good.median, 339.0);
        assert_eq!(good.max, 351.0);
        assert_eq!(good.q25, 335.0);
        assert_eq!(good.q75, 351.0);
    }

    #[test]
    fn test_crosstab_totals() {
        let ds = sample_dataset();
        let ct = crosstab::<Cut, Color>(&ds);
        assert_eq!(ct.total(), ds.len());
        // Colors D and G never occur in the sample
        assert!(!ct.columns.contains(&Color::D));
        assert!(!ct.columns.contains(&Color::G));

        let good = ct.rows.iter().position(|c| *c == Cut::Good).unwrap();
        let j = ct.columns.iter().position(|c| *c == Color::J).unwrap();
        assert_eq!(ct.counts[good][j], 4);
    }

    #[test]
    fn test_bins_partition_the_range() {
        let values = [0.2, 0.23, 0.3, 0.32, 0.25];
        let bins = Bins::equal_width(&values, 6, "carat").unwrap();
        assert_eq!(bins.len(), 6);

        assert!(bins.interval(0).0 < 0.2);
        assert_eq!(bins.interval(5).1, 0.32);
        for i in 0..bins.len() - 1 {
            // contiguous: each upper bound is the next lower bound
            assert_eq!(bins.interval(i).1, bins.interval(i + 1).0);
            assert!(bins.interval(i).0 < bins.interval(i).1);
        }

        for v in values {
            assert!(bins.index_of(v).is_some(), "{} not covered", v);
        }
        assert_eq!(bins.index_of(0.2), Some(0));
        assert_eq!(bins.index_of(0.32), Some(5));
        assert_eq!(bins.index_of(0.33), None);
    }

    #[test]
    fn test_bins_right_closed() {
        let bins = Bins::equal_width(&[0.0, 6.0], 6, "x").unwrap();
        assert_eq!(bins.index_of(1.0), Some(0));
        assert_eq!(bins.index_of(1.0001), Some(1));
    }

    #[test]
    fn test_bins_constant_column() {
        let bins = Bins::equal_width(&[2.0, 2.0], 3, "x").unwrap();
        assert_eq!(bins.len(), 3);
        assert!(bins.index_of(2.0).is_some());
    }

    #[test]
    fn test_bins_errors() {
        assert!(matches!(Bins::equal_width(&[], 6, "x"), Err(AnalysisError::EmptyColumn("x"))));
        assert!(matches!(Bins::equal_width(&[1.0], 0, "x"), Err(AnalysisError::ZeroBins)));
    }

    #[test]
    fn test_binned_pivot_covers_every_record() {
        let ds = sample_dataset();
        let pivot =
            binned_pivot_mean::<Cut>(&ds, NumericColumn::Carat, 6, NumericColumn::Price).unwrap();
        assert_eq!(pivot.means.len(), 6);
        assert_eq!(pivot.covered(), ds.len());

        let table = pivot.to_table();
        assert_eq!(table.rows.len(), 6);
        assert!(table.rows[0][0].starts_with('('));
    }

    #[test]
    fn test_correlation_matrix_symmetric_unit_diagonal() {
        let ds = sample_dataset();
        let corr = correlation_matrix(&ds, &NumericColumn::ALL);
        let n = corr.columns.len();
        for i in 0..n {
            assert_eq!(corr.get(i, i), 1.0);
            for j in 0..n {
                let a = corr.get(i, j);
                let b = corr.get(j, i);
                assert!(a == b || (a.is_nan() && b.is_nan()));
                assert!(a.is_nan() || (-1.0..=1.0).contains(&a));
            }
        }
    }

    #[test]
    fn test_carat_price_positively_correlated() {
        let ds = sample_dataset();
        let corr = correlation_matrix(&ds, &[NumericColumn::Carat, NumericColumn::Price]);
        assert!(corr.get(0, 1) > 0.0);
    }
}
