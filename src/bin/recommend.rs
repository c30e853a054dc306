//! Regenerate business recommendations from saved analysis results.
//!
//! Reads the statistics, time-series and customer/product JSON files from a
//! previous run. Any file that is missing skips the rules that need it.
//!
//! Run: ./target/release/recommend [--visuals-dir visuals] [--timeline-bucketing legacy]

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use retail_eda::customer_product::CustomerProductReport;
use retail_eda::output;
use retail_eda::recommend::{self, AnalysisContext, RecommendationEngine};
use retail_eda::statistics::StatisticsReport;
use retail_eda::time_series::TimeSeriesReport;
use retail_eda::{PipelineConfig, TimelineBucketing};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "recommend")]
#[command(about = "Generate business recommendations from saved analysis JSON")]
struct Args {
    /// Directory holding the analysis JSON files
    #[arg(long, env = "RETAIL_EDA_VISUALS_DIR", default_value = "visuals")]
    visuals_dir: PathBuf,

    /// Directory for the recommendation JSON and Markdown report
    #[arg(long, env = "RETAIL_EDA_RECOMMENDATIONS_DIR", default_value = "recommendations")]
    recommendations_dir: PathBuf,

    /// Prioritized recommendations included in the action plan
    #[arg(long, env = "RETAIL_EDA_ACTION_PLAN_SIZE", default_value = "15")]
    action_plan_size: usize,

    /// How recommendation timelines map to action-plan tiers
    #[arg(long, env = "RETAIL_EDA_TIMELINE_BUCKETING", value_enum, default_value = "structured")]
    timeline_bucketing: TimelineBucketing,
}

fn read_section<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let section =
        output::read_json(path).with_context(|| format!("failed to read {}", path.display()))?;
    if section.is_none() {
        warn!("{} not found; dependent rules skipped", path.display());
    }
    Ok(section)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = PipelineConfig {
        visuals_dir: args.visuals_dir,
        recommendations_dir: args.recommendations_dir,
        action_plan_size: args.action_plan_size,
        timeline_bucketing: args.timeline_bucketing,
        ..Default::default()
    };

    let statistics: Option<StatisticsReport> = read_section(&config.statistics_path())?;
    let time_series: Option<TimeSeriesReport> = read_section(&config.time_series_path())?;
    let relationships: Option<CustomerProductReport> =
        read_section(&config.customer_product_path())?;

    let engine = RecommendationEngine {
        bucketing: config.timeline_bucketing,
        action_plan_size: config.action_plan_size,
    };
    let bundle = engine.run(&AnalysisContext {
        statistics: statistics.as_ref(),
        time_series: time_series.as_ref(),
        relationships: relationships.as_ref(),
    });

    output::write_json(&config.recommendations_json_path(), &bundle)?;
    output::write_text(
        &config.recommendations_report_path(),
        &recommend::render_report(&bundle, Local::now().naive_local()),
    )?;

    info!(
        "{} recommendations, {} high impact, {} critical",
        bundle.summary.total_recommendations,
        bundle.summary.high_impact_count,
        bundle.summary.critical_count
    );
    for rec in bundle.recommendations.iter().take(5) {
        println!("  [{:>3}] {} ({} impact, {})", rec.priority, rec.title, rec.impact, rec.timeline);
    }
    Ok(())
}
