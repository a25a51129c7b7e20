//! Statistical analysis of the dataset.
//!
//! `stats` holds the scalar reducers; `aggregator` builds the grouped,
//! pivoted and correlation aggregates that end up in the report.

pub mod aggregator;
pub mod stats;

pub use aggregator::*;
