//! Data module - CSV loading and table transformations

mod loader;
mod processor;

pub use loader::{DataLoader, LoaderError};
pub use processor::{BucketCount, DataProcessor, ProcessorError, MISSING_AGE_BUCKET};
