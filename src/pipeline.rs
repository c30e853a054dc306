//! One complete analysis run.
//!
//! Stages hand typed results to each other in memory: the cleaned table
//! feeds the three analyzers, whose reports feed the dashboard and the
//! recommendation engine. Files are only written at the end by
//! [`save_all`].

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::config::PipelineConfig;
use crate::customer_product::{CustomerProductAnalyzer, CustomerProductReport};
use crate::dashboard::{self, DashboardConfig};
use crate::error::{EdaError, Result};
use crate::loader::{self, CleanedTable, CleaningReport, DataQualityReport, DataSummary, RawTable};
use crate::output;
use crate::recommend::{self, AnalysisContext, RecommendationBundle, RecommendationEngine};
use crate::statistics::{StatisticalAnalyzer, StatisticsReport};
use crate::time_series::{TimeSeriesAnalyzer, TimeSeriesReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResults {
    pub data_quality: DataQualityReport,
    pub cleaning: CleaningReport,
    pub data_summary: DataSummary,
    pub statistics: StatisticsReport,
    pub time_series: TimeSeriesReport,
    pub customer_product: CustomerProductReport,
    pub dashboard: DashboardConfig,
    pub recommendations: RecommendationBundle,
}

impl PipelineResults {
    pub fn context(&self) -> AnalysisContext<'_> {
        AnalysisContext {
            statistics: Some(&self.statistics),
            time_series: Some(&self.time_series),
            relationships: Some(&self.customer_product),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_seconds: f64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_records: usize,
    pub total_customers: usize,
    pub total_revenue: f64,
    pub product_categories: usize,
    pub total_recommendations: usize,
    pub high_impact_recommendations: usize,
    pub critical_issues: usize,
}

impl SummaryMetrics {
    pub fn of(results: &PipelineResults) -> Self {
        let basic = &results.data_summary.basic_info;
        let recs = &results.recommendations.summary;
        Self {
            total_records: basic.total_records,
            total_customers: basic.total_customers,
            total_revenue: basic.total_revenue,
            product_categories: basic.product_categories,
            total_recommendations: recs.total_recommendations,
            high_impact_recommendations: recs.high_impact_count,
            critical_issues: recs.critical_count,
        }
    }
}

/// The `complete_eda_results.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteResults {
    pub analysis_metadata: AnalysisMetadata,
    pub summary_metrics: SummaryMetrics,
    pub results: PipelineResults,
}

/// Everything a run produced, including the cleaned table for export.
pub struct RunOutput {
    pub table: CleanedTable,
    pub complete: CompleteResults,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage on an already loaded table.
    pub fn analyze(&self, raw: &RawTable) -> Result<(CleanedTable, PipelineResults)> {
        let data_quality = loader::validate(raw);
        info!(
            "Data quality: {} records, {} duplicates, {} date errors",
            data_quality.total_records,
            data_quality.duplicate_records,
            data_quality.date_format_errors
        );

        let (table, cleaning) = loader::clean(raw);
        if table.is_empty() {
            return Err(EdaError::EmptyDataset);
        }
        let data_summary = loader::summarize(&table);

        let statistics = StatisticalAnalyzer::new(&table).run();
        let time_series = TimeSeriesAnalyzer::new(&table).run();
        let customer_product = CustomerProductAnalyzer::new(&table)
            .with_limits(self.config.top_customers, self.config.top_cross_sell_pairs)
            .run();

        let dashboard = dashboard::build(
            Some(&statistics),
            Some(&time_series),
            Some(&customer_product),
            self.config.insight_digest_size,
        );
        let engine = RecommendationEngine {
            bucketing: self.config.timeline_bucketing,
            action_plan_size: self.config.action_plan_size,
        };
        let recommendations = engine.run(&AnalysisContext {
            statistics: Some(&statistics),
            time_series: Some(&time_series),
            relationships: Some(&customer_product),
        });

        Ok((
            table,
            PipelineResults {
                data_quality,
                cleaning,
                data_summary,
                statistics,
                time_series,
                customer_product,
                dashboard,
                recommendations,
            },
        ))
    }

    /// Loads the configured input and runs every stage.
    pub fn run(&self) -> Result<RunOutput> {
        let start_time = Local::now().naive_local();
        let started = Instant::now();

        let raw = loader::load(&self.config.input_path)?;
        let (table, results) = self.analyze(&raw)?;

        let complete = CompleteResults {
            analysis_metadata: AnalysisMetadata {
                start_time,
                end_time: Local::now().naive_local(),
                duration_seconds: started.elapsed().as_secs_f64(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            summary_metrics: SummaryMetrics::of(&results),
            results,
        };
        info!(
            "Analysis completed in {:.1} seconds",
            complete.analysis_metadata.duration_seconds
        );
        Ok(RunOutput { table, complete })
    }
}

/// Writes every artifact of a run under the configured directories.
pub fn save_all(config: &PipelineConfig, run: &RunOutput) -> Result<()> {
    let results = &run.complete.results;
    output::write_cleaned_csv(&config.cleaned_output, &run.table.records)?;
    output::write_json(&config.quality_report_path(), &results.data_quality)?;
    output::write_json(&config.statistics_path(), &results.statistics)?;
    output::write_json(&config.time_series_path(), &results.time_series)?;
    output::write_json(&config.customer_product_path(), &results.customer_product)?;
    output::write_json(&config.dashboard_path(), &results.dashboard)?;
    output::write_json(&config.recommendations_json_path(), &results.recommendations)?;
    output::write_text(
        &config.recommendations_report_path(),
        &recommend::render_report(
            &results.recommendations,
            run.complete.analysis_metadata.end_time,
        ),
    )?;
    output::write_json(&config.complete_results_path(), &run.complete)?;
    Ok(())
}
