//! Exploratory analysis of retail transaction data.
//!
//! The pipeline loads a transaction CSV, cleans it, runs the statistical,
//! time-series and customer/product analyzers over the cleaned table, and
//! turns their reports into a dashboard configuration and a ranked list of
//! business recommendations.

pub mod config;
pub mod customer_product;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod models;
pub mod numeric;
pub mod output;
pub mod pipeline;
pub mod recommend;
pub mod statistics;
pub mod time_series;

#[cfg(test)]
mod test_support;

pub use config::{PipelineConfig, TimelineBucketing};
pub use error::{EdaError, Result};
pub use pipeline::{Pipeline, PipelineResults};
