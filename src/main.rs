//! Full retail EDA pipeline.
//!
//! Run: ./target/release/retail_eda [--input data/retail_sales_dataset.csv]

use anyhow::{Context, Result};
use clap::Parser;
use retail_eda::dashboard::{format_count, format_currency};
use retail_eda::pipeline::{self, Pipeline};
use retail_eda::{PipelineConfig, TimelineBucketing};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Clean a retail transaction CSV and write every analysis artifact
#[derive(Parser, Debug)]
#[command(name = "retail_eda")]
#[command(about = "Run the complete retail EDA pipeline")]
struct Args {
    /// Input transaction CSV
    #[arg(long, env = "RETAIL_EDA_INPUT", default_value = "data/retail_sales_dataset.csv")]
    input: PathBuf,

    /// Cleaned CSV output path
    #[arg(long, env = "RETAIL_EDA_CLEANED_OUTPUT", default_value = "data/cleaned_retail_data.csv")]
    cleaned_output: PathBuf,

    /// Directory for JSON analysis results and the dashboard config
    #[arg(long, env = "RETAIL_EDA_VISUALS_DIR", default_value = "visuals")]
    visuals_dir: PathBuf,

    /// Directory for the recommendation JSON and Markdown report
    #[arg(long, env = "RETAIL_EDA_RECOMMENDATIONS_DIR", default_value = "recommendations")]
    recommendations_dir: PathBuf,

    /// Prioritized recommendations included in the action plan
    #[arg(long, env = "RETAIL_EDA_ACTION_PLAN_SIZE", default_value = "15")]
    action_plan_size: usize,

    /// Insights shown in the dashboard digest
    #[arg(long, env = "RETAIL_EDA_INSIGHT_DIGEST_SIZE", default_value = "8")]
    insight_digest_size: usize,

    /// Customers listed in the top-customer table
    #[arg(long, env = "RETAIL_EDA_TOP_CUSTOMERS", default_value = "10")]
    top_customers: usize,

    /// Cross-sell pairs kept after ranking
    #[arg(long, env = "RETAIL_EDA_TOP_CROSS_SELL", default_value = "5")]
    top_cross_sell_pairs: usize,

    /// How recommendation timelines map to action-plan tiers
    #[arg(long, env = "RETAIL_EDA_TIMELINE_BUCKETING", value_enum, default_value = "structured")]
    timeline_bucketing: TimelineBucketing,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        PipelineConfig {
            input_path: args.input,
            cleaned_output: args.cleaned_output,
            visuals_dir: args.visuals_dir,
            recommendations_dir: args.recommendations_dir,
            action_plan_size: args.action_plan_size,
            insight_digest_size: args.insight_digest_size,
            top_customers: args.top_customers,
            top_cross_sell_pairs: args.top_cross_sell_pairs,
            timeline_bucketing: args.timeline_bucketing,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from(Args::parse());
    info!("Starting retail EDA pipeline on {:?}", config.input_path);

    let pipeline = Pipeline::new(config);
    let run = pipeline
        .run()
        .with_context(|| format!("pipeline failed on {}", pipeline.config().input_path.display()))?;
    pipeline::save_all(pipeline.config(), &run).context("failed to write outputs")?;

    let metrics = &run.complete.summary_metrics;
    println!("\n{}", "═".repeat(60));
    println!("  ANALYSIS SUMMARY");
    println!("{}", "═".repeat(60));
    println!(
        "  Duration:              {:>10.1} s",
        run.complete.analysis_metadata.duration_seconds
    );
    println!("  Records analyzed:      {:>12}", format_count(metrics.total_records));
    println!("  Customers analyzed:    {:>12}", format_count(metrics.total_customers));
    println!("  Total revenue:         {:>12}", format_currency(metrics.total_revenue));
    println!("  Product categories:    {:>12}", metrics.product_categories);
    println!("  Recommendations:       {:>12}", metrics.total_recommendations);
    println!("  High-impact:           {:>12}", metrics.high_impact_recommendations);
    println!("  Critical issues:       {:>12}", metrics.critical_issues);

    let config = pipeline.config();
    println!("\n  Output files:");
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
        println!("    - {}", path.display());
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_bucketing_flag_reaches_config() {
        let args = Args::try_parse_from(["retail_eda", "--timeline-bucketing", "legacy"]).unwrap();
        let config = PipelineConfig::from(args);
        assert_eq!(config.timeline_bucketing, TimelineBucketing::Legacy);
    }

    #[test]
    fn test_unknown_bucketing_is_rejected() {
        assert!(Args::try_parse_from(["retail_eda", "--timeline-bucketing", "digits"]).is_err());
    }
}
