//! Report generation module.
//!
//! Writes the markdown analysis report and the chart images it embeds.

pub mod generator;

pub use generator::*;
