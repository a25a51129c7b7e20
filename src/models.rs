//! Data models for the diamonds dataset.
//!
//! This module contains the record type loaded from the dataset, the three
//! categorical dimensions and the numeric column selector used by the
//! aggregation code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single diamond record.
///
/// Field order matches the column order of the dataset CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diamond {
    /// Weight in carats.
    pub carat: f64,
    /// Quality of the cut.
    pub cut: Cut,
    /// Color grade, D (best) to J (worst).
    pub color: Color,
    /// Clarity grade.
    pub clarity: Clarity,
    /// Total depth percentage.
    pub depth: f64,
    /// Width of the top relative to the widest point.
    pub table: f64,
    /// Price in US dollars.
    pub price: f64,
    /// Length in mm.
    pub x: f64,
    /// Width in mm.
    pub y: f64,
    /// Depth in mm.
    pub z: f64,
}

/// A categorical column of the dataset.
///
/// `ALL` lists the categories in the dataset's declared order; grouped
/// tables follow that order.
pub trait Categorical: Copy + Ord + fmt::Display + 'static {
    /// Every category, in declared order.
    const ALL: &'static [Self];

    /// Column name in the dataset.
    const COLUMN: &'static str;

    /// Extract this dimension from a record.
    fn of(diamond: &Diamond) -> Self;

    /// Position of this category in `ALL`.
    fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }
}

/// Cut quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Cut {
    Ideal,
    Premium,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
}

impl Cut {
    /// Worst to best, the order used on box plot axes.
    pub const QUALITY_ASCENDING: [Cut; 5] =
        [Cut::Fair, Cut::Good, Cut::VeryGood, Cut::Premium, Cut::Ideal];
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cut::Ideal => write!(f, "Ideal"),
            Cut::Premium => write!(f, "Premium"),
            Cut::VeryGood => write!(f, "Very Good"),
            Cut::Good => write!(f, "Good"),
            Cut::Fair => write!(f, "Fair"),
        }
    }
}

impl Categorical for Cut {
    const ALL: &'static [Self] = &[Cut::Ideal, Cut::Premium, Cut::VeryGood, Cut::Good, Cut::Fair];
    const COLUMN: &'static str = "cut";

    fn of(diamond: &Diamond) -> Self {
        diamond.cut
    }
}

/// Color grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    D,
    E,
    F,
    G,
    H,
    I,
    J,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Categorical for Color {
    const ALL: &'static [Self] = &[
        Color::D,
        Color::E,
        Color::F,
        Color::G,
        Color::H,
        Color::I,
        Color::J,
    ];
    const COLUMN: &'static str = "color";

    fn of(diamond: &Diamond) -> Self {
        diamond.color
    }
}

/// Clarity grade, from internally flawless down to included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Clarity {
    IF,
    VVS1,
    VVS2,
    VS1,
    VS2,
    SI1,
    SI2,
    I1,
}

impl fmt::Display for Clarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Categorical for Clarity {
    const ALL: &'static [Self] = &[
        Clarity::IF,
        Clarity::VVS1,
        Clarity::VVS2,
        Clarity::VS1,
        Clarity::VS2,
        Clarity::SI1,
        Clarity::SI2,
        Clarity::I1,
    ];
    const COLUMN: &'static str = "clarity";

    fn of(diamond: &Diamond) -> Self {
        diamond.clarity
    }
}

/// Numeric columns of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    Carat,
    Depth,
    Table,
    Price,
    X,
    Y,
    Z,
}

impl NumericColumn {
    /// All numeric columns in dataset order.
    pub const ALL: [NumericColumn; 7] = [
        NumericColumn::Carat,
        NumericColumn::Depth,
        NumericColumn::Table,
        NumericColumn::Price,
        NumericColumn::X,
        NumericColumn::Y,
        NumericColumn::Z,
    ];

    /// Column name in the dataset.
    pub fn name(&self) -> &'static str {
        match self {
            NumericColumn::Carat => "carat",
            NumericColumn::Depth => "depth",
            NumericColumn::Table => "table",
            NumericColumn::Price => "price",
            NumericColumn::X => "x",
            NumericColumn::Y => "y",
            NumericColumn::Z => "z",
        }
    }

    /// Read this column from a record.
    pub fn value(&self, diamond: &Diamond) -> f64 {
        match self {
            NumericColumn::Carat => diamond.carat,
            NumericColumn::Depth => diamond.depth,
            NumericColumn::Table => diamond.table,
            NumericColumn::Price => diamond.price,
            NumericColumn::X => diamond.x,
            NumericColumn::Y => diamond.y,
            NumericColumn::Z => diamond.z,
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image format for rendered charts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Raster PNG (default)
    #[default]
    Png,
    /// Vector SVG
    Svg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}
