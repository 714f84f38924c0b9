//! Census household pipeline.
//!
//! Projects the population census down to five columns, prints household
//! member totals by gender/year and by age band/year, and charts the latest
//! year's gender split across age bands.

use crate::analysis::PipelineError;
use crate::charts::{CategoryChart, ChartRenderer, SeriesData};
use crate::data::{DataLoader, DataProcessor};
use polars::prelude::PolarsError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const POPULATION_CSV: &str = "population.csv";
pub const CHART_FILE: &str = "gender_age_graph.png";

pub const REGION_COLUMN: &str = "region";
pub const GENDER_COLUMN: &str = "gender";
pub const AGE_BAND_COLUMN: &str = "age_band";
pub const YEAR_COLUMN: &str = "year";
pub const VALUE_COLUMN: &str = "household_members";

pub const REQUIRED_COLUMNS: [&str; 5] = [
    REGION_COLUMN,
    GENDER_COLUMN,
    AGE_BAND_COLUMN,
    YEAR_COLUMN,
    VALUE_COLUMN,
];

pub const MIN_YEAR: i64 = 2015;

/// Gender values carrying per-gender rows; the census also ships "total"
/// summary rows in both the gender and age band columns.
pub const GENDERS: [&str; 2] = ["male", "female"];
pub const SUMMARY_LABEL: &str = "total";

/// Canonical age bands, in axis order. Aggregate bands ("total", "15-64",
/// "65+") are excluded by construction.
pub const ORDERED_AGE_BANDS: [&str; 16] = [
    "under 15", "15-19", "20-24", "25-29", "30-34", "35-39", "40-44", "45-49", "50-54", "55-59",
    "60-64", "65-69", "70-74", "75-79", "80-84", "85+",
];

pub const CHART_SIZE: (u32, u32) = (1200, 600);

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct CensusReport {
    pub total_rows: usize,
    pub analysis_rows: usize,
    pub latest_year: i64,
    pub chart_path: PathBuf,
}

/// Run the full pipeline against `csv_path`, writing the chart to
/// `chart_path`.
pub fn run(csv_path: &Path, chart_path: &Path) -> Result<CensusReport, PipelineError> {
    info!("Loading census data from {}", csv_path.display());
    let raw = DataLoader::load_csv_checked(csv_path, &REQUIRED_COLUMNS)?;
    let total_rows = raw.height();

    let df = DataProcessor::project_columns(&raw, &REQUIRED_COLUMNS)?;
    let df = DataProcessor::filter_min_year(&df, YEAR_COLUMN, MIN_YEAR)?;
    debug!(
        "{} of {} rows fall at or after {}",
        df.height(),
        total_rows,
        MIN_YEAR
    );

    // An empty filter result ends the run before any table prints.
    let latest_year = DataProcessor::max_year(&df, YEAR_COLUMN)?.ok_or_else(|| {
        PipelineError::EmptyData(format!("No census rows at or after {}", MIN_YEAR))
    })?;

    println!(
        "=== Household members by gender and year ({} onward) ===",
        MIN_YEAR
    );
    let gender_rows = DataProcessor::filter_in(&df, GENDER_COLUMN, &GENDERS)?;
    let gender_rows = DataProcessor::filter_eq(&gender_rows, AGE_BAND_COLUMN, SUMMARY_LABEL)?;
    let gender_year =
        DataProcessor::pivot_year_sum(&gender_rows, YEAR_COLUMN, GENDER_COLUMN, VALUE_COLUMN, None)?;
    println!("{}", gender_year);
    println!();

    println!(
        "=== Household members by age band and year ({} onward) ===",
        MIN_YEAR
    );
    let age_rows = DataProcessor::filter_eq(&df, GENDER_COLUMN, SUMMARY_LABEL)?;
    let age_rows = DataProcessor::filter_in(&age_rows, AGE_BAND_COLUMN, &ORDERED_AGE_BANDS)?;
    let age_year = DataProcessor::pivot_year_sum(
        &age_rows,
        YEAR_COLUMN,
        AGE_BAND_COLUMN,
        VALUE_COLUMN,
        Some(&ORDERED_AGE_BANDS),
    )?;
    println!("{}", age_year);
    println!();

    println!(
        "=== Generating gender/age household members graph for {} ===",
        latest_year
    );

    let graph_rows = DataProcessor::filter_year(&df, YEAR_COLUMN, latest_year)?;
    let graph_rows = DataProcessor::filter_in(&graph_rows, GENDER_COLUMN, &GENDERS)?;
    let graph_rows = DataProcessor::filter_in(&graph_rows, AGE_BAND_COLUMN, &ORDERED_AGE_BANDS)?;
    debug!("{} rows feed the {} chart", graph_rows.height(), latest_year);
    let by_band = DataProcessor::pivot_band_sum(
        &graph_rows,
        AGE_BAND_COLUMN,
        GENDER_COLUMN,
        VALUE_COLUMN,
        &ORDERED_AGE_BANDS,
    )?;

    // A gender with no rows in the latest year is fatal here.
    let series = GENDERS
        .iter()
        .map(|gender| {
            let values = by_band.column(gender)?.f64()?.into_iter().collect();
            Ok(SeriesData {
                name: (*gender).to_string(),
                values,
            })
        })
        .collect::<Result<Vec<_>, PolarsError>>()?;

    let chart = CategoryChart {
        title: format!("{} Household Members by Age (Male/Female)", latest_year),
        x_label: "Age Band".to_string(),
        y_label: "Household Members".to_string(),
        categories: ORDERED_AGE_BANDS.iter().map(|b| b.to_string()).collect(),
        series,
    };
    ChartRenderer::render_category_lines(&chart, chart_path, CHART_SIZE)?;
    println!("Graph saved to {}", chart_path.display());

    Ok(CensusReport {
        total_rows,
        analysis_rows: df.height(),
        latest_year,
        chart_path: chart_path.to_path_buf(),
    })
}
