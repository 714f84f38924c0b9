//! Analysis module - End-to-end report pipelines
//! Each pipeline loads its CSV inputs, derives the summary tables, prints
//! them, and renders one chart image.

pub mod census;
pub mod passengers;

use crate::charts::ChartError;
use crate::data::{LoaderError, ProcessorError};
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("{0}")]
    EmptyData(String),
}
