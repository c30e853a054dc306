//! Pipeline configuration.
//!
//! Defaults mirror the directory layout the pipeline writes to; the binaries
//! override individual fields from command-line flags or `RETAIL_EDA_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How recommendation timelines are mapped to action-plan tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimelineBucketing {
    /// Bucket on the structured month range of the timeline.
    #[default]
    Structured,
    /// Substring matching on the rendered label ("month" + "1", ...).
    /// Kept for output parity with older reports; "6-12 months" lands in
    /// the immediate tier under this mode.
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub cleaned_output: PathBuf,
    pub visuals_dir: PathBuf,
    pub recommendations_dir: PathBuf,
    /// Number of prioritized recommendations that feed the action plan.
    pub action_plan_size: usize,
    /// Cap on insights shown in the dashboard digest.
    pub insight_digest_size: usize,
    pub top_customers: usize,
    pub top_cross_sell_pairs: usize,
    pub timeline_bucketing: TimelineBucketing,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/retail_sales_dataset.csv"),
            cleaned_output: PathBuf::from("data/cleaned_retail_data.csv"),
            visuals_dir: PathBuf::from("visuals"),
            recommendations_dir: PathBuf::from("recommendations"),
            action_plan_size: 15,
            insight_digest_size: 8,
            top_customers: 10,
            top_cross_sell_pairs: 5,
            timeline_bucketing: TimelineBucketing::Structured,
        }
    }
}

impl PipelineConfig {
    pub fn quality_report_path(&self) -> PathBuf {
        self.visuals_dir.join("data_quality_report.json")
    }

    pub fn statistics_path(&self) -> PathBuf {
        self.visuals_dir.join("statistical_analysis.json")
    }

    pub fn time_series_path(&self) -> PathBuf {
        self.visuals_dir.join("time_series_analysis.json")
    }

    pub fn customer_product_path(&self) -> PathBuf {
        self.visuals_dir.join("customer_product_analysis.json")
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.visuals_dir.join("dashboard_config.json")
    }

    pub fn complete_results_path(&self) -> PathBuf {
        self.visuals_dir.join("complete_eda_results.json")
    }

    pub fn recommendations_json_path(&self) -> PathBuf {
        self.recommendations_dir.join("recommendations.json")
    }

    pub fn recommendations_report_path(&self) -> PathBuf {
        self.recommendations_dir.join("recommendations.md")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = PipelineConfig::default();
        assert_eq!(config.action_plan_size, 15);
        assert_eq!(config.insight_digest_size, 8);
        assert_eq!(config.top_cross_sell_pairs, 5);
        assert_eq!(config.timeline_bucketing, TimelineBucketing::Structured);
    }

    #[test]
    fn test_output_paths_follow_directories() {
        let config = PipelineConfig {
            visuals_dir: PathBuf::from("/tmp/out"),
            ..Default::default()
        };
        assert_eq!(
            config.statistics_path(),
            PathBuf::from("/tmp/out/statistical_analysis.json")
        );
        assert_eq!(
            config.recommendations_report_path(),
            PathBuf::from("recommendations/recommendations.md")
        );
    }

    #[test]
    fn test_timeline_bucketing_names() {
        use clap::ValueEnum;
        assert_eq!(
            <TimelineBucketing as ValueEnum>::from_str("legacy", false).unwrap(),
            TimelineBucketing::Legacy
        );
        assert_eq!(
            serde_json::from_str::<TimelineBucketing>("\"legacy\"").unwrap(),
            TimelineBucketing::Legacy
        );
        assert_eq!(
            serde_json::to_string(&TimelineBucketing::Structured).unwrap(),
            "\"structured\""
        );
    }
}
