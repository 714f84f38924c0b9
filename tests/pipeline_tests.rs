use demotrend::analysis::{census, passengers};
use demotrend::data::{DataLoader, DataProcessor};
use demotrend::stats::StatsCalculator;
use std::path::Path;
use tempfile::TempDir;

const TRAIN_CSV: &str = "\
PassengerId,CryoSleep,Age,RoomService,Transported
0001_01,True,14.0,0.0,True
0002_01,False,35.0,900.0,False
0003_01,True,42.0,0.0,True
0004_01,False,,450.0,False
";

const TEST_CSV: &str = "\
PassengerId,CryoSleep,Age,RoomService
9001_01,True,23.0,0.0
9002_01,False,67.0,1200.0
9003_01,True,55.0,10.0
";

// Only two of the three test passengers carry a prediction.
const SUBMISSION_CSV: &str = "\
PassengerId,Transported
9001_01,True
9002_01,False
";

fn write_passenger_fixtures(dir: &Path) {
    std::fs::write(dir.join(passengers::TRAIN_FILE), TRAIN_CSV).unwrap();
    std::fs::write(dir.join(passengers::TEST_FILE), TEST_CSV).unwrap();
    std::fs::write(dir.join(passengers::SUBMISSION_FILE), SUBMISSION_CSV).unwrap();
}

#[test]
fn test_passenger_merge_and_correlation_pipeline() {
    let dir = TempDir::new().unwrap();
    write_passenger_fixtures(dir.path());

    let train = DataLoader::load_csv(&dir.path().join(passengers::TRAIN_FILE)).unwrap();
    let test = DataLoader::load_csv(&dir.path().join(passengers::TEST_FILE)).unwrap();
    let submission = DataLoader::load_csv(&dir.path().join(passengers::SUBMISSION_FILE)).unwrap();

    let labeled =
        DataProcessor::merge_predictions(&test, &submission, passengers::ID_COLUMN).unwrap();
    assert_eq!(labeled.height(), 2, "inner join drops unmatched test rows");

    let all_data = DataProcessor::concat_rows(&train, &labeled).unwrap();
    assert_eq!(all_data.height(), train.height() + labeled.height());

    let all_data =
        DataProcessor::to_numeric(all_data, &["Transported", "CryoSleep", "VIP"]).unwrap();

    // CryoSleep mirrors the outcome exactly in the fixtures, so it must beat
    // the (strongly negative) RoomService correlation.
    let correlations =
        StatsCalculator::correlation_with(&all_data, passengers::OUTCOME_COLUMN);
    let best = StatsCalculator::most_correlated(&correlations).unwrap();
    assert_eq!(best.feature, "CryoSleep");
    assert!((best.coefficient - 1.0).abs() < 1e-9);
    assert_eq!(best.samples, 6);

    let all_data = DataProcessor::add_age_buckets(
        all_data,
        passengers::AGE_COLUMN,
        passengers::AGE_GROUP_COLUMN,
    )
    .unwrap();
    let plot_rows = DataProcessor::filter_in(
        &all_data,
        passengers::AGE_GROUP_COLUMN,
        &passengers::PLOT_BUCKETS,
    )
    .unwrap();
    // The row with a missing age is excluded from the plot set.
    assert_eq!(plot_rows.height(), 5);

    let counts = DataProcessor::count_by_bucket(
        &plot_rows,
        passengers::AGE_GROUP_COLUMN,
        passengers::OUTCOME_COLUMN,
        &passengers::PLOT_BUCKETS,
    )
    .unwrap();

    let by_bucket: Vec<(&str, u64, u64)> = counts
        .iter()
        .map(|c| (c.bucket.as_str(), c.negatives, c.positives))
        .collect();
    assert_eq!(
        by_bucket,
        vec![
            ("10s", 0, 1),
            ("20s", 0, 1),
            ("30s", 1, 0),
            ("40s", 0, 1),
            ("50s", 0, 0),
            ("60s", 1, 0),
            ("70s", 0, 0),
        ]
    );
}

#[test]
fn test_passenger_run_missing_file_creates_no_chart() {
    let dir = TempDir::new().unwrap();
    let chart_path = dir.path().join(passengers::CHART_FILE);

    let err = passengers::run(dir.path(), &chart_path).unwrap_err();
    assert!(err.to_string().contains("File not found"));
    assert!(!chart_path.exists());
}

fn census_fixture_csv() -> String {
    let mut lines = vec!["region,gender,age_band,year,household_members".to_string()];
    // Pre-2015 rows are filtered out of every table.
    lines.push("all,male,total,2014,2400".to_string());
    lines.push("all,female,total,2014,2450".to_string());
    lines.push("all,male,total,2015,2500".to_string());
    lines.push("all,female,total,2015,2600".to_string());
    lines.push("all,male,total,2016,2550".to_string());
    lines.push("all,female,total,2016,2650".to_string());
    // Aggregate band rows must never reach the age pivots.
    lines.push("all,total,15-64,2016,3500".to_string());

    for (i, band) in census::ORDERED_AGE_BANDS.iter().enumerate() {
        lines.push(format!("all,total,{},2016,{}", band, 100 + i));
        lines.push(format!("all,male,{},2016,{}", band, 50 + i));
        lines.push(format!("all,female,{},2016,50", band));
    }
    lines.join("\n")
}

#[test]
fn test_census_tables_from_csv() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join(census::POPULATION_CSV);
    std::fs::write(&csv_path, census_fixture_csv()).unwrap();

    let raw = DataLoader::load_csv_checked(&csv_path, &census::REQUIRED_COLUMNS).unwrap();
    let df = DataProcessor::project_columns(&raw, &census::REQUIRED_COLUMNS).unwrap();
    let df = DataProcessor::filter_min_year(&df, census::YEAR_COLUMN, census::MIN_YEAR).unwrap();
    assert_eq!(df.height(), raw.height() - 2);

    // Gender x year over the "total" age band.
    let gender_rows = DataProcessor::filter_in(&df, census::GENDER_COLUMN, &census::GENDERS)
        .and_then(|rows| {
            DataProcessor::filter_eq(&rows, census::AGE_BAND_COLUMN, census::SUMMARY_LABEL)
        })
        .unwrap();
    let gender_year = DataProcessor::pivot_year_sum(
        &gender_rows,
        census::YEAR_COLUMN,
        census::GENDER_COLUMN,
        census::VALUE_COLUMN,
        None,
    )
    .unwrap();

    let names: Vec<String> = gender_year
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names, vec!["year", "female", "male"]);
    assert_eq!(gender_year.height(), 2);
    let male = gender_year.column("male").unwrap().f64().unwrap().clone();
    assert_eq!(male.get(1), Some(2550.0));

    // Age band x year over the "total" gender, in canonical band order.
    let age_rows = DataProcessor::filter_eq(&df, census::GENDER_COLUMN, census::SUMMARY_LABEL)
        .and_then(|rows| {
            DataProcessor::filter_in(&rows, census::AGE_BAND_COLUMN, &census::ORDERED_AGE_BANDS)
        })
        .unwrap();
    assert_eq!(age_rows.height(), census::ORDERED_AGE_BANDS.len());

    let age_year = DataProcessor::pivot_year_sum(
        &age_rows,
        census::YEAR_COLUMN,
        census::AGE_BAND_COLUMN,
        census::VALUE_COLUMN,
        Some(&census::ORDERED_AGE_BANDS),
    )
    .unwrap();
    let names: Vec<String> = age_year
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names[0], "year");
    assert_eq!(names[1..], census::ORDERED_AGE_BANDS);
    let under_15 = age_year.column("under 15").unwrap().f64().unwrap().clone();
    assert_eq!(under_15.get(0), Some(100.0));
    let over_85 = age_year.column("85+").unwrap().f64().unwrap().clone();
    assert_eq!(over_85.get(0), Some(115.0));

    // Latest-year chart table, reindexed to the canonical bands.
    assert_eq!(
        DataProcessor::max_year(&df, census::YEAR_COLUMN).unwrap(),
        Some(2016)
    );
    let graph_rows = DataProcessor::filter_year(&df, census::YEAR_COLUMN, 2016)
        .and_then(|rows| DataProcessor::filter_in(&rows, census::GENDER_COLUMN, &census::GENDERS))
        .and_then(|rows| {
            DataProcessor::filter_in(&rows, census::AGE_BAND_COLUMN, &census::ORDERED_AGE_BANDS)
        })
        .unwrap();
    let by_band = DataProcessor::pivot_band_sum(
        &graph_rows,
        census::AGE_BAND_COLUMN,
        census::GENDER_COLUMN,
        census::VALUE_COLUMN,
        &census::ORDERED_AGE_BANDS,
    )
    .unwrap();
    assert_eq!(by_band.height(), census::ORDERED_AGE_BANDS.len());
    let male = by_band.column("male").unwrap().f64().unwrap().clone();
    assert_eq!(male.get(0), Some(50.0));
    assert_eq!(male.get(15), Some(65.0));
    let female = by_band.column("female").unwrap().f64().unwrap().clone();
    assert!(female.into_iter().flatten().all(|v| v == 50.0));
}

#[test]
fn test_census_run_missing_column_creates_no_chart() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join(census::POPULATION_CSV);
    std::fs::write(
        &csv_path,
        "region,age_band,year,household_members\nall,total,2015,100\n",
    )
    .unwrap();
    let chart_path = dir.path().join(census::CHART_FILE);

    let err = census::run(&csv_path, &chart_path).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Missing columns"));
    assert!(message.contains("gender"));
    assert!(!chart_path.exists());
}

#[test]
fn test_census_run_without_recent_years_creates_no_chart() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join(census::POPULATION_CSV);
    std::fs::write(
        &csv_path,
        "region,gender,age_band,year,household_members\nall,male,total,2014,2400\nall,female,total,2014,2450\n",
    )
    .unwrap();
    let chart_path = dir.path().join(census::CHART_FILE);

    let err = census::run(&csv_path, &chart_path).unwrap_err();
    assert!(err.to_string().contains("No census rows at or after 2015"));
    assert!(!chart_path.exists());
}

#[test]
fn test_census_run_missing_file_creates_no_chart() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join(census::POPULATION_CSV);
    let chart_path = dir.path().join(census::CHART_FILE);

    let err = census::run(&csv_path, &chart_path).unwrap_err();
    assert!(err.to_string().contains("File not found"));
    assert!(!chart_path.exists());
}
