//! Passenger transport pipeline.
//!
//! Merges the competition's train/test/submission tables into one labeled
//! set, reports the feature most correlated with the transport outcome, and
//! charts transported counts by age group.

use crate::analysis::PipelineError;
use crate::charts::{CategoryChart, ChartRenderer, SeriesData};
use crate::data::{DataLoader, DataProcessor};
use crate::stats::{FeatureCorrelation, StatsCalculator};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DATA_DIR: &str = "spaceship-titanic";
pub const TRAIN_FILE: &str = "train.csv";
pub const TEST_FILE: &str = "test.csv";
pub const SUBMISSION_FILE: &str = "sample_submission.csv";
pub const CHART_FILE: &str = "age_transported_graph.png";

pub const ID_COLUMN: &str = "PassengerId";
pub const OUTCOME_COLUMN: &str = "Transported";
pub const AGE_COLUMN: &str = "Age";
pub const AGE_GROUP_COLUMN: &str = "AgeGroup";

/// Boolean columns coerced to 0.0/1.0 ahead of the correlation pass.
pub const FLAG_COLUMNS: [&str; 2] = ["CryoSleep", "VIP"];

/// Buckets shown in the chart, in axis order.
pub const PLOT_BUCKETS: [&str; 7] = ["10s", "20s", "30s", "40s", "50s", "60s", "70s"];

pub const CHART_SIZE: (u32, u32) = (1000, 600);

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PassengerReport {
    pub total_rows: usize,
    pub best_feature: Option<FeatureCorrelation>,
    pub bucket_counts: Vec<crate::data::BucketCount>,
    pub chart_path: PathBuf,
}

/// Run the full pipeline against `data_dir`, writing the chart to
/// `chart_path`.
pub fn run(data_dir: &Path, chart_path: &Path) -> Result<PassengerReport, PipelineError> {
    info!("Loading data from {}", data_dir.display());
    let train = DataLoader::load_csv(&data_dir.join(TRAIN_FILE))?;
    let test = DataLoader::load_csv(&data_dir.join(TEST_FILE))?;
    let submission = DataLoader::load_csv(&data_dir.join(SUBMISSION_FILE))?;

    // Test rows get their outcome from the submission file, then both sets
    // are stacked into one labeled table.
    let test_labeled = DataProcessor::merge_predictions(&test, &submission, ID_COLUMN)?;
    debug!(
        "matched {} of {} test rows against the submission",
        test_labeled.height(),
        test.height()
    );
    let all_data = DataProcessor::concat_rows(&train, &test_labeled)?;
    println!("Total data quantity: {}", all_data.height());

    let mut coerced: Vec<&str> = vec![OUTCOME_COLUMN];
    coerced.extend_from_slice(&FLAG_COLUMNS);
    let all_data = DataProcessor::to_numeric(all_data, &coerced)?;

    let correlations = StatsCalculator::correlation_with(&all_data, OUTCOME_COLUMN);
    for c in &correlations {
        debug!(
            "correlation {}: {:.4} (n={})",
            c.feature, c.coefficient, c.samples
        );
    }
    let outcome_is_numeric = StatsCalculator::numeric_columns(&all_data)
        .iter()
        .any(|name| name == OUTCOME_COLUMN);
    let best_feature = StatsCalculator::most_correlated(&correlations).cloned();
    println!("{}", correlation_line(best_feature.as_ref(), outcome_is_numeric));
    match &best_feature {
        Some(best) => {
            if let Some(p) = best.p_value {
                debug!(
                    "{} correlation p-value: {:.6} (significant: {})",
                    best.feature, p, best.is_significant
                );
            }
        }
        None => warn!("no usable correlations against {}", OUTCOME_COLUMN),
    }

    let all_data = DataProcessor::add_age_buckets(all_data, AGE_COLUMN, AGE_GROUP_COLUMN)?;
    let plot_rows = DataProcessor::filter_in(&all_data, AGE_GROUP_COLUMN, &PLOT_BUCKETS)?;
    debug!("{} rows fall in the plotted age buckets", plot_rows.height());
    let bucket_counts =
        DataProcessor::count_by_bucket(&plot_rows, AGE_GROUP_COLUMN, OUTCOME_COLUMN, &PLOT_BUCKETS)?;

    let chart = CategoryChart {
        title: "Transported Status by Age Group".to_string(),
        x_label: "Age Group".to_string(),
        y_label: "Count".to_string(),
        categories: PLOT_BUCKETS.iter().map(|b| b.to_string()).collect(),
        series: vec![
            SeriesData {
                name: "False".to_string(),
                values: bucket_counts
                    .iter()
                    .map(|c| Some(c.negatives as f64))
                    .collect(),
            },
            SeriesData {
                name: "True".to_string(),
                values: bucket_counts
                    .iter()
                    .map(|c| Some(c.positives as f64))
                    .collect(),
            },
        ],
    };
    ChartRenderer::render_grouped_bars(&chart, chart_path, CHART_SIZE)?;
    println!("Graph saved to {}", chart_path.display());

    Ok(PassengerReport {
        total_rows: all_data.height(),
        best_feature,
        bucket_counts,
        chart_path: chart_path.to_path_buf(),
    })
}

/// Console line for the correlation stage.
///
/// The column-not-found wording only fires when the outcome column is absent
/// or non-numeric; a present target whose ranking came back empty reports
/// that no usable correlation exists.
fn correlation_line(best: Option<&FeatureCorrelation>, outcome_is_numeric: bool) -> String {
    match best {
        Some(best) => format!(
            "Most correlated feature with Transported: {} (Correlation: {:.4})",
            best.feature, best.coefficient
        ),
        None if outcome_is_numeric => {
            "No usable correlation with Transported was found.".to_string()
        }
        None => "Transported column not found for correlation analysis.".to_string(),
    }
}
