use retail_eda::customer_product::CustomerProductReport;
use retail_eda::loader;
use retail_eda::output;
use retail_eda::pipeline::{self, CompleteResults, Pipeline};
use retail_eda::recommend::{AnalysisContext, RecommendationBundle, RecommendationEngine};
use retail_eda::statistics::StatisticsReport;
use retail_eda::time_series::TimeSeriesReport;
use retail_eda::{EdaError, PipelineConfig};
use std::fs;
use std::path::Path;

const DATASET: &str = "\
Transaction ID,Date,Customer ID,Gender,Age,Product Category,Quantity,Price per Unit,Total Amount
1,2023-11-24,CUST001,Male,34,Beauty,3,50,150
2,2023-02-27,CUST002,Female,26,Clothing,2,500,1000
3,2023-01-13,CUST003,Male,50,Electronics,1,30,30
4,2023-05-21,CUST004,Male,37,Clothing,1,500,500
5,2023-05-06,CUST005,Male,30,Beauty,2,50,100
6,2023-04-25,CUST001,Male,34,Electronics,4,300,1200
7,2023-03-13,CUST006,Female,63,Electronics,2,25,50
8,2023-02-22,CUST007,Male,22,Electronics,1,500,500
9,2023-12-13,CUST008,Female,48,Clothing,3,30,90
10,2023-10-07,CUST002,Female,26,Beauty,1,50,50
11,2023-02-14,CUST009,Female,46,Clothing,4,30,120
12,2023-10-30,CUST010,Male,19,Electronics,3,25,75
12,2023-10-30,CUST010,Male,19,Electronics,3,25,75
13,2023-08-05,CUST011,Female,,Beauty,2,25,50
14,2023-01-17,CUST012,Male,42,Clothing,,500,1000
15,2023-07-14,CUST013,,55,Beauty,1,300,300
16,bad-date,CUST014,Female,38,Clothing,1,50,50
";

fn config_in(dir: &Path) -> PipelineConfig {
    let input = dir.join("data/retail_sales_dataset.csv");
    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(&input, DATASET).unwrap();
    PipelineConfig {
        input_path: input,
        cleaned_output: dir.join("data/cleaned_retail_data.csv"),
        visuals_dir: dir.join("visuals"),
        recommendations_dir: dir.join("recommendations"),
        ..Default::default()
    }
}

#[test]
fn test_full_run_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let pipeline = Pipeline::new(config.clone());
    let run = pipeline.run().unwrap();
    pipeline::save_all(&config, &run).unwrap();

    for path in [
        config.cleaned_output.clone(),
        config.quality_report_path(),
        config.statistics_path(),
        config.time_series_path(),
        config.customer_product_path(),
        config.dashboard_path(),
        config.complete_results_path(),
        config.recommendations_json_path(),
        config.recommendations_report_path(),
    ] {
        assert!(path.exists(), "missing {}", path.display());
    }

    let results = &run.complete.results;
    assert_eq!(results.data_quality.total_records, 17);
    assert_eq!(results.data_quality.duplicate_records, 1);
    assert_eq!(results.data_quality.date_format_errors, 1);
    assert_eq!(results.cleaning.removed_duplicates, 1);
    assert_eq!(results.cleaning.invalid_dates, 1);
    assert_eq!(run.table.len(), 15);
    assert_eq!(run.complete.summary_metrics.total_customers, 13);
    assert_eq!(run.complete.analysis_metadata.version, env!("CARGO_PKG_VERSION"));

    let report = fs::read_to_string(config.recommendations_report_path()).unwrap();
    assert!(report.starts_with("# Retail Sales Analysis - Business Recommendations"));
}

#[test]
fn test_complete_results_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let pipeline = Pipeline::new(config.clone());
    let run = pipeline.run().unwrap();
    pipeline::save_all(&config, &run).unwrap();

    let back: CompleteResults = output::read_json(&config.complete_results_path())
        .unwrap()
        .unwrap();
    assert_eq!(back, run.complete);
}

#[test]
fn test_recommendations_rerun_from_saved_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let pipeline = Pipeline::new(config.clone());
    let run = pipeline.run().unwrap();
    pipeline::save_all(&config, &run).unwrap();

    // Drop the time-series results; rules that need them are skipped.
    fs::remove_file(config.time_series_path()).unwrap();

    let statistics: Option<StatisticsReport> =
        output::read_json(&config.statistics_path()).unwrap();
    let time_series: Option<TimeSeriesReport> =
        output::read_json(&config.time_series_path()).unwrap();
    let relationships: Option<CustomerProductReport> =
        output::read_json(&config.customer_product_path()).unwrap();
    assert!(time_series.is_none());

    let bundle = RecommendationEngine::default().run(&AnalysisContext {
        statistics: statistics.as_ref(),
        time_series: time_series.as_ref(),
        relationships: relationships.as_ref(),
    });
    let full: RecommendationBundle = output::read_json(&config.recommendations_json_path())
        .unwrap()
        .unwrap();

    let from_full_context = RecommendationEngine::default().run(&run.complete.results.context());
    assert_eq!(from_full_context, full);
    assert!(bundle.recommendations.len() <= full.recommendations.len());
    for rec in &bundle.recommendations {
        assert!(full.recommendations.contains(rec));
    }
}

#[test]
fn test_missing_core_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_amount.csv");
    fs::write(&path, "Customer_ID,Date,Gender\nCUST001,2023-01-01,Male\n").unwrap();
    match loader::load(&path) {
        Err(EdaError::MissingColumns(missing)) => assert_eq!(missing, vec!["Total_Amount"]),
        other => panic!("expected missing columns, got {:?}", other.map(|t| t.records.len())),
    }
}

#[test]
fn test_unreadable_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        input_path: dir.path().join("absent.csv"),
        ..Default::default()
    };
    assert!(matches!(Pipeline::new(config).run(), Err(EdaError::Io { .. })));
}
