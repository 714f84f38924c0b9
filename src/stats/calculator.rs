//! Statistics Calculator Module
//! Handles correlation analysis between numeric features and a target column.

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for the correlation t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Pearson correlation of one feature against the target column.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCorrelation {
    pub feature: String,
    pub coefficient: f64,
    pub samples: usize,
    pub p_value: Option<f64>,
    pub is_significant: bool,
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Names of all numeric columns, in frame order.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|column| {
                matches!(
                    column.dtype(),
                    DataType::Float64
                        | DataType::Float32
                        | DataType::Int64
                        | DataType::Int32
                        | DataType::Int16
                        | DataType::Int8
                        | DataType::UInt64
                        | DataType::UInt32
                        | DataType::UInt16
                        | DataType::UInt8
                )
            })
            .map(|column| column.name().to_string())
            .collect()
    }

    /// Extract a column as `f64` values, keeping nulls in place.
    pub fn column_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .ok()
            .and_then(|column| column.cast(&DataType::Float64).ok())
            .and_then(|column| {
                column
                    .f64()
                    .ok()
                    .map(|ca| ca.into_iter().collect::<Vec<Option<f64>>>())
            })
            .unwrap_or_default()
    }

    /// Pearson correlation coefficient over pairwise-complete observations.
    ///
    /// Returns the coefficient and the number of complete pairs, or `None`
    /// when fewer than two pairs remain or either side has zero variance.
    pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<(f64, usize)> {
        let pairs: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys.iter())
            .filter_map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((*x, *y)),
                _ => None,
            })
            .collect();

        let n = pairs.len();
        if n < 2 {
            return None;
        }

        let nf = n as f64;
        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / nf;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / nf;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in &pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x == 0.0 || var_y == 0.0 {
            return None;
        }

        Some((cov / (var_x.sqrt() * var_y.sqrt()), n))
    }

    /// Two-tailed p-value for a correlation coefficient via the t-distribution.
    pub fn correlation_p_value(r: f64, n: usize) -> Option<f64> {
        if n < 3 {
            return None;
        }

        let df = (n - 2) as f64;
        let denom = 1.0 - r * r;
        if denom <= f64::EPSILON {
            return Some(0.0);
        }

        let t = r * (df / denom).sqrt();
        if let Ok(dist) = StudentsT::new(0.0, 1.0, df) {
            Some(2.0 * (1.0 - dist.cdf(t.abs())))
        } else {
            None
        }
    }

    /// Correlate every numeric column against `target`, in parallel.
    ///
    /// Results keep the frame's column order; the target itself and columns
    /// with no usable correlation are skipped.
    pub fn correlation_with(df: &DataFrame, target: &str) -> Vec<FeatureCorrelation> {
        let target_values = Self::column_values(df, target);
        if target_values.is_empty() {
            return Vec::new();
        }

        let features: Vec<String> = Self::numeric_columns(df)
            .into_iter()
            .filter(|name| name != target)
            .collect();

        features
            .par_iter()
            .filter_map(|feature| {
                let values = Self::column_values(df, feature);
                let (coefficient, samples) = Self::pearson(&values, &target_values)?;
                let p_value = Self::correlation_p_value(coefficient, samples);
                let is_significant = p_value.is_some_and(|p| p <= SIGNIFICANCE_THRESHOLD);
                Some(FeatureCorrelation {
                    feature: feature.clone(),
                    coefficient,
                    samples,
                    p_value,
                    is_significant,
                })
            })
            .collect()
    }

    /// Feature with the largest absolute coefficient; the first one wins on
    /// ties. The signed coefficient is preserved for reporting.
    pub fn most_correlated(correlations: &[FeatureCorrelation]) -> Option<&FeatureCorrelation> {
        let mut best: Option<&FeatureCorrelation> = None;
        for candidate in correlations {
            if candidate.coefficient.is_nan() {
                continue;
            }
            let replace = match best {
                Some(current) => candidate.coefficient.abs() > current.coefficient.abs(),
                None => true,
            };
            if replace {
                best = Some(candidate);
            }
        }
        best
    }
}
