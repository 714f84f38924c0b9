//! CSV Data Loader Module
//! Handles CSV file loading and schema preconditions using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Missing columns {missing:?} in {} (available: {available:?})", .path.display())]
    MissingColumns {
        path: PathBuf,
        missing: Vec<String>,
        available: Vec<String>,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file into memory with inferred column types.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }

        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        Ok(df)
    }

    /// Load a CSV file and require a fixed set of columns to be present.
    ///
    /// The check is a loader precondition: pipelines with an expected schema
    /// fail here, before any transformation runs. Extra columns are allowed.
    pub fn load_csv_checked(path: &Path, required: &[&str]) -> Result<DataFrame, LoaderError> {
        let df = Self::load_csv(path)?;

        let available: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !available.iter().any(|a| a == *c))
            .map(|c| (*c).to_string())
            .collect();

        if !missing.is_empty() {
            return Err(LoaderError::MissingColumns {
                path: path.to_path_buf(),
                missing,
                available,
            });
        }

        Ok(df)
    }
}
