//! Dataset loading.
//!
//! The analysis runs against one statically-named dataset, `diamonds`. Its
//! CSV is compiled into the binary; a data directory holding
//! `diamonds.csv` can replace it. The loaded table is read-only for the rest
//! of the run.

use crate::models::{Diamond, NumericColumn};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the built-in dataset.
pub const DATASET_NAME: &str = "diamonds";

/// The embedded copy of `data/diamonds.csv`.
const BUILTIN_CSV: &str = include_str!("../data/diamonds.csv");

/// Column names and their storage type, in file order.
const SCHEMA: [(&str, &str); 10] = [
    ("carat", "f64"),
    ("cut", "category"),
    ("color", "category"),
    ("clarity", "category"),
    ("depth", "f64"),
    ("table", "f64"),
    ("price", "f64"),
    ("x", "f64"),
    ("y", "f64"),
    ("z", "f64"),
];

/// Errors raised while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset '{name}' not found at {}", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed dataset row: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset '{0}' contains no records")]
    Empty(String),
}

/// The immutable in-memory diamonds table.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    records: Vec<Diamond>,
}

impl Dataset {
    /// The dataset shipped inside the binary.
    pub fn builtin() -> Result<Self, DatasetError> {
        debug!("Loading built-in dataset '{}'", DATASET_NAME);
        Self::from_reader(BUILTIN_CSV.as_bytes())
    }

    /// Load the named dataset from `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self, DatasetError> {
        let path = Self::path_in(data_dir);
        if !path.exists() {
            return Err(DatasetError::NotFound {
                name: DATASET_NAME.to_string(),
                path,
            });
        }

        info!("Loading dataset from {}", path.display());
        let file = std::fs::File::open(&path)?;
        Self::from_reader(file)
    }

    /// Location of the dataset file inside a data directory.
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.csv", DATASET_NAME))
    }

    /// Parse the dataset from any CSV source with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = csv_reader
            .deserialize::<Diamond>()
            .collect::<Result<Vec<_>, _>>()?;

        if records.is_empty() {
            return Err(DatasetError::Empty(DATASET_NAME.to_string()));
        }

        debug!("Parsed {} records", records.len());
        Ok(Self::from_records(records))
    }

    /// Wrap already-parsed records.
    pub fn from_records(records: Vec<Diamond>) -> Self {
        Self {
            name: DATASET_NAME.to_string(),
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[Diamond] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first `n` records.
    pub fn head(&self, n: usize) -> &[Diamond] {
        &self.records[..n.min(self.records.len())]
    }

    /// All values of one numeric column, in record order.
    pub fn column(&self, column: NumericColumn) -> Vec<f64> {
        self.records.iter().map(|d| column.value(d)).collect()
    }

    /// Human-readable schema summary: row count, columns, types, memory.
    pub fn info(&self) -> String {
        let rows = self.records.len();
        let bytes = rows * std::mem::size_of::<Diamond>();

        let mut out = String::new();
        out.push_str(&format!("Dataset: {}\n", self.name));
        out.push_str(&format!("Rows: {} (index 0 to {})\n", rows, rows.saturating_sub(1)));
        out.push_str(&format!("Columns: {}\n\n", SCHEMA.len()));
        out.push_str(&format!(" #  {:<8}  {:>9}  {}\n", "column", "non-null", "type"));
        out.push_str(&format!("--  {:<8}  {:>9}  {}\n", "------", "--------", "----"));
        for (i, (name, kind)) in SCHEMA.iter().enumerate() {
            out.push_str(&format!("{:>2}  {:<8}  {:>9}  {}\n", i, name, rows, kind));
        }
        out.push_str(&format!("\nmemory usage: {:.1} KiB", bytes as f64 / 1024.0));
        out
    }
}
