//! Demotrend - Demographic CSV analysis & static chart reports
//!
//! Two batch pipelines over tabular CSV data: each loads its inputs into
//! memory, derives summary tables (join, coercion, correlation, pivots),
//! prints them, and renders one chart image to disk.

pub mod analysis;
pub mod charts;
pub mod data;
pub mod stats;
