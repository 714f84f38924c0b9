//! Data Processor Module
//! Handles table transformations: join/concat, flag coercion, age bucketing,
//! filtering, and pivot (long-to-wide) reshaping.

use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Bucket label assigned when the age value is missing.
pub const MISSING_AGE_BUCKET: &str = "missing";

/// Row counts for one age bucket, split by a binary outcome.
#[derive(Debug, Clone, Serialize)]
pub struct BucketCount {
    pub bucket: String,
    pub negatives: u64,
    pub positives: u64,
}

/// Handles table transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Attach predicted outcomes to a table via an inner join on `key`.
    ///
    /// Rows without a matching prediction are dropped.
    pub fn merge_predictions(
        table: &DataFrame,
        predictions: &DataFrame,
        key: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let merged = table
            .clone()
            .lazy()
            .join(
                predictions.clone().lazy(),
                [col(key)],
                [col(key)],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?;
        Ok(merged)
    }

    /// Stack `other` under `base`, preserving row order.
    ///
    /// `other` is first aligned to the base column order, so it may carry its
    /// columns in any arrangement as long as the names match.
    pub fn concat_rows(base: &DataFrame, other: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let order: Vec<Expr> = base
            .get_column_names()
            .iter()
            .map(|name| col(name.as_str()))
            .collect();

        let combined = concat(
            [base.clone().lazy(), other.clone().lazy().select(order)],
            UnionArgs {
                to_supertypes: true,
                ..Default::default()
            },
        )?
        .collect()?;
        Ok(combined)
    }

    /// Coerce flag columns to `Float64` (true -> 1.0, false -> 0.0, missing
    /// stays missing) so they participate in numeric analysis.
    ///
    /// Boolean columns are cast directly; columns the CSV reader left as text
    /// are matched case-insensitively against "true"/"false". Columns absent
    /// from the frame are skipped.
    pub fn to_numeric(mut df: DataFrame, columns: &[&str]) -> Result<DataFrame, ProcessorError> {
        for &name in columns {
            let Ok(column) = df.column(name) else {
                continue;
            };

            let replacement = match column.dtype() {
                DataType::String => {
                    let values: Vec<Option<f64>> = column
                        .str()?
                        .into_iter()
                        .map(|v| v.and_then(Self::parse_flag))
                        .collect();
                    Column::new(name.into(), values)
                }
                _ => column.cast(&DataType::Float64)?,
            };

            df.with_column(replacement)?;
        }
        Ok(df)
    }

    fn parse_flag(raw: &str) -> Option<f64> {
        if raw.eq_ignore_ascii_case("true") {
            Some(1.0)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(0.0)
        } else {
            None
        }
    }

    /// Maps an age to its bucket label; bucket boundaries are left-inclusive,
    /// right-exclusive decades with an overflow bucket. NaN maps to the
    /// missing label, so the mapping is total.
    ///
    /// | Age          | Bucket |
    /// |--------------|--------|
    /// | [0, 10)      | 0-9    |
    /// | [10, 20)     | 10s    |
    /// | ...          | ...    |
    /// | [70, 80)     | 70s    |
    /// | >= 80        | 80+    |
    pub fn age_bucket(age: f64) -> &'static str {
        match age {
            a if a.is_nan() => MISSING_AGE_BUCKET,
            a if a < 10.0 => "0-9",
            a if a < 20.0 => "10s",
            a if a < 30.0 => "20s",
            a if a < 40.0 => "30s",
            a if a < 50.0 => "40s",
            a if a < 60.0 => "50s",
            a if a < 70.0 => "60s",
            a if a < 80.0 => "70s",
            _ => "80+",
        }
    }

    /// Derive a bucket-label column from an age column.
    pub fn add_age_buckets(
        mut df: DataFrame,
        age_col: &str,
        bucket_col: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let ages = df.column(age_col)?.cast(&DataType::Float64)?;
        let labels: Vec<String> = ages
            .f64()?
            .into_iter()
            .map(|age| match age {
                Some(a) => Self::age_bucket(a).to_string(),
                None => MISSING_AGE_BUCKET.to_string(),
            })
            .collect();

        df.with_column(Column::new(bucket_col.into(), labels))?;
        Ok(df)
    }

    /// Count rows per bucket, split by a 0/1 outcome column.
    ///
    /// Output order follows `buckets`; buckets not listed are ignored, as are
    /// rows with a missing outcome.
    pub fn count_by_bucket(
        df: &DataFrame,
        bucket_col: &str,
        outcome_col: &str,
        buckets: &[&str],
    ) -> Result<Vec<BucketCount>, ProcessorError> {
        let bucket_ca = df.column(bucket_col)?.str()?;
        let outcome_f64 = df.column(outcome_col)?.cast(&DataType::Float64)?;
        let outcome_ca = outcome_f64.f64()?;

        let mut counts: Vec<BucketCount> = buckets
            .iter()
            .map(|b| BucketCount {
                bucket: (*b).to_string(),
                negatives: 0,
                positives: 0,
            })
            .collect();

        for i in 0..df.height() {
            let (Some(bucket), Some(outcome)) = (bucket_ca.get(i), outcome_ca.get(i)) else {
                continue;
            };
            let Some(slot) = counts.iter_mut().find(|c| c.bucket == bucket) else {
                continue;
            };
            if outcome == 1.0 {
                slot.positives += 1;
            } else {
                slot.negatives += 1;
            }
        }

        Ok(counts)
    }

    /// Keep exactly the named columns, in the given order.
    pub fn project_columns(
        df: &DataFrame,
        columns: &[&str],
    ) -> Result<DataFrame, ProcessorError> {
        Ok(df.select(columns.iter().copied())?)
    }

    /// Keep rows where the year column is at least `min_year`.
    pub fn filter_min_year(
        df: &DataFrame,
        column: &str,
        min_year: i64,
    ) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(column).gt_eq(lit(min_year)))
            .collect()?;
        Ok(filtered)
    }

    /// Keep rows where the year column equals `year`.
    pub fn filter_year(
        df: &DataFrame,
        column: &str,
        year: i64,
    ) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(column).eq(lit(year)))
            .collect()?;
        Ok(filtered)
    }

    /// Keep rows whose `column` text equals `value`.
    pub fn filter_eq(
        df: &DataFrame,
        column: &str,
        value: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(column).eq(lit(value)))
            .collect()?;
        Ok(filtered)
    }

    /// Keep rows whose `column` text is one of `allowed`.
    pub fn filter_in(
        df: &DataFrame,
        column: &str,
        allowed: &[&str],
    ) -> Result<DataFrame, ProcessorError> {
        let ca = df.column(column)?.str()?;
        let flags: Vec<bool> = ca
            .into_iter()
            .map(|v| v.is_some_and(|s| allowed.contains(&s)))
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &flags);
        Ok(df.filter(&mask)?)
    }

    /// Largest value in an integer year column, if any row is present.
    pub fn max_year(df: &DataFrame, column: &str) -> Result<Option<i64>, ProcessorError> {
        let years = df.column(column)?.cast(&DataType::Int64)?;
        Ok(years.i64()?.max())
    }

    /// Pivot to one row per year with one summed value column per category.
    ///
    /// Categories become columns sorted lexically, or in `column_order` when
    /// given; a listed category that never occurs in the data surfaces as a
    /// column-not-found error. Combinations without observations are null.
    pub fn pivot_year_sum(
        df: &DataFrame,
        index_col: &str,
        on_col: &str,
        value_col: &str,
        column_order: Option<&[&str]>,
    ) -> Result<DataFrame, ProcessorError> {
        let years_i64 = df.column(index_col)?.cast(&DataType::Int64)?;
        let years = years_i64.i64()?;
        let cats = df.column(on_col)?.str()?;
        let values_f64 = df.column(value_col)?.cast(&DataType::Float64)?;
        let values = values_f64.f64()?;

        let mut sums: BTreeMap<i64, BTreeMap<String, f64>> = BTreeMap::new();
        let mut categories: BTreeSet<String> = BTreeSet::new();

        for i in 0..df.height() {
            let (Some(year), Some(cat), Some(value)) = (years.get(i), cats.get(i), values.get(i))
            else {
                continue;
            };
            *sums
                .entry(year)
                .or_default()
                .entry(cat.to_string())
                .or_insert(0.0) += value;
            categories.insert(cat.to_string());
        }

        let year_keys: Vec<i64> = sums.keys().copied().collect();
        let mut columns = vec![Column::new(index_col.into(), year_keys.clone())];
        for cat in &categories {
            let vals: Vec<Option<f64>> = year_keys
                .iter()
                .map(|y| sums.get(y).and_then(|m| m.get(cat)).copied())
                .collect();
            columns.push(Column::new(cat.as_str().into(), vals));
        }
        let pivot = DataFrame::new(columns)?;

        match column_order {
            Some(order) => {
                let mut selection: Vec<&str> = Vec::with_capacity(order.len() + 1);
                selection.push(index_col);
                selection.extend_from_slice(order);
                Ok(pivot.select(selection)?)
            }
            None => Ok(pivot),
        }
    }

    /// Pivot to one row per `index_order` label with one summed value column
    /// per category (reindex semantics: labels with no observations are null).
    pub fn pivot_band_sum(
        df: &DataFrame,
        index_col: &str,
        on_col: &str,
        value_col: &str,
        index_order: &[&str],
    ) -> Result<DataFrame, ProcessorError> {
        let bands = df.column(index_col)?.str()?;
        let cats = df.column(on_col)?.str()?;
        let values_f64 = df.column(value_col)?.cast(&DataType::Float64)?;
        let values = values_f64.f64()?;

        let mut sums: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut categories: BTreeSet<String> = BTreeSet::new();

        for i in 0..df.height() {
            let (Some(band), Some(cat), Some(value)) = (bands.get(i), cats.get(i), values.get(i))
            else {
                continue;
            };
            *sums
                .entry(band.to_string())
                .or_default()
                .entry(cat.to_string())
                .or_insert(0.0) += value;
            categories.insert(cat.to_string());
        }

        let index_vals: Vec<String> = index_order.iter().map(|b| (*b).to_string()).collect();
        let mut columns = vec![Column::new(index_col.into(), index_vals)];
        for cat in &categories {
            let vals: Vec<Option<f64>> = index_order
                .iter()
                .map(|b| sums.get(*b).and_then(|m| m.get(cat)).copied())
                .collect();
            columns.push(Column::new(cat.as_str().into(), vals));
        }
        Ok(DataFrame::new(columns)?)
    }
}
