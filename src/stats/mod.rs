//! Stats module - Correlation analysis

mod calculator;

pub use calculator::{FeatureCorrelation, StatsCalculator};
