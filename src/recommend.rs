//! Business recommendations.
//!
//! A fixed registry of detectors reads the three analysis reports. Each
//! detector emits at most one scored [`Recommendation`]. The engine sorts
//! the results by priority, splits the head of the list into an action plan
//! by timeline, and renders a Markdown report.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use tracing::{debug, info};

use crate::config::TimelineBucketing;
use crate::customer_product::CustomerProductReport;
use crate::models::ValueTier;
use crate::numeric;
use crate::statistics::StatisticsReport;
use crate::time_series::{TimeSeriesReport, TrendDirection};

const REVENUE_CV_THRESHOLD: f64 = 30.0;
const SEASONAL_GAP_THRESHOLD: f64 = 25.0;
const WEEKLY_GAP_THRESHOLD: f64 = 50.0;
const STRONG_TREND_THRESHOLD: f64 = 0.7;
const GENDER_GAP_THRESHOLD: f64 = 20.0;
const CONCENTRATION_THRESHOLD: f64 = 40.0;
const RETENTION_THRESHOLD: f64 = 60.0;
const HIGH_VALUE_SHARE_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Strategic,
    Operational,
    Marketing,
    Inventory,
    CustomerExperience,
}

impl CategoryType {
    pub const ALL: [CategoryType; 5] = [
        CategoryType::Strategic,
        CategoryType::Operational,
        CategoryType::Marketing,
        CategoryType::Inventory,
        CategoryType::CustomerExperience,
    ];

    pub fn title(self) -> &'static str {
        match self {
            CategoryType::Strategic => "Strategic",
            CategoryType::Operational => "Operational",
            CategoryType::Marketing => "Marketing",
            CategoryType::Inventory => "Inventory",
            CategoryType::CustomerExperience => "Customer Experience",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Impact {
    Medium,
    High,
    Critical,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Impact::Medium => "Medium",
            Impact::High => "High",
            Impact::Critical => "Critical",
        })
    }
}

/// Implementation window in whole months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub min_months: u32,
    pub max_months: u32,
}

impl Timeline {
    pub const fn months(min_months: u32, max_months: u32) -> Self {
        Self {
            min_months,
            max_months,
        }
    }

    pub fn horizon(self, mode: TimelineBucketing) -> Horizon {
        match mode {
            TimelineBucketing::Structured => {
                if self.min_months <= 1 {
                    Horizon::Immediate
                } else if self.max_months <= 6 {
                    Horizon::ShortTerm
                } else {
                    Horizon::LongTerm
                }
            }
            TimelineBucketing::Legacy => {
                let label = self.to_string();
                if label.contains("month") && label.contains('1') {
                    Horizon::Immediate
                } else if label.contains("months")
                    && ['2', '3', '4', '5', '6'].iter().any(|d| label.contains(*d))
                {
                    Horizon::ShortTerm
                } else {
                    Horizon::LongTerm
                }
            }
        }
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min_months, self.max_months) {
            (1, 1) => f.write_str("1 month"),
            (min, max) if min == max => write!(f, "{min} months"),
            (min, max) => write!(f, "{min}-{max} months"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Immediate,
    ShortTerm,
    LongTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category_type: CategoryType,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub impact: Impact,
    pub timeline: Timeline,
    pub priority: u8,
}

/// What a detector found, before it is filed under its bucket.
pub struct Finding {
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub impact: Impact,
    pub timeline: Timeline,
    pub priority: u8,
}

/// Read-only view of whichever analysis reports are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisContext<'a> {
    pub statistics: Option<&'a StatisticsReport>,
    pub time_series: Option<&'a TimeSeriesReport>,
    pub relationships: Option<&'a CustomerProductReport>,
}

pub struct Detector {
    pub name: &'static str,
    pub bucket: CategoryType,
    pub detect: fn(&AnalysisContext<'_>) -> Option<Finding>,
}

impl Detector {
    pub fn run(&self, ctx: &AnalysisContext<'_>) -> Option<Recommendation> {
        let finding = (self.detect)(ctx)?;
        debug!(detector = self.name, priority = finding.priority, "Detector fired");
        Some(Recommendation {
            category_type: self.bucket,
            title: finding.title,
            description: finding.description,
            recommendation: finding.recommendation,
            impact: finding.impact,
            timeline: finding.timeline,
            priority: finding.priority,
        })
    }
}

/// Detectors in emission order, grouped by bucket.
pub const DETECTORS: &[Detector] = &[
    Detector {
        name: "revenue_stabilization",
        bucket: CategoryType::Strategic,
        detect: revenue_stabilization,
    },
    Detector {
        name: "seasonal_campaign",
        bucket: CategoryType::Strategic,
        detect: seasonal_campaign,
    },
    Detector {
        name: "weekly_staffing",
        bucket: CategoryType::Operational,
        detect: weekly_staffing,
    },
    Detector {
        name: "trend_response",
        bucket: CategoryType::Operational,
        detect: trend_response,
    },
    Detector {
        name: "gender_expansion",
        bucket: CategoryType::Marketing,
        detect: gender_expansion,
    },
    Detector {
        name: "age_segment_focus",
        bucket: CategoryType::Marketing,
        detect: age_segment_focus,
    },
    Detector {
        name: "portfolio_diversification",
        bucket: CategoryType::Inventory,
        detect: portfolio_diversification,
    },
    Detector {
        name: "category_optimization",
        bucket: CategoryType::Inventory,
        detect: category_optimization,
    },
    Detector {
        name: "customer_retention",
        bucket: CategoryType::CustomerExperience,
        detect: customer_retention,
    },
    Detector {
        name: "high_value_expansion",
        bucket: CategoryType::CustomerExperience,
        detect: high_value_expansion,
    },
    Detector {
        name: "cross_selling",
        bucket: CategoryType::CustomerExperience,
        detect: cross_selling,
    },
];

/// Percentage drop from the largest to the smallest value.
fn spread_pct(values: &[f64]) -> f64 {
    let max = numeric::max(values);
    numeric::percentage(max - numeric::min(values), max)
}

fn revenue_stabilization(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    ctx.statistics?;
    let daily = &ctx.time_series?.daily_analysis.as_ref()?.statistics;
    if daily.avg_daily_revenue <= 0.0 {
        return None;
    }
    let cv = daily.revenue_cv();
    (cv > REVENUE_CV_THRESHOLD).then(|| Finding {
        title: "Revenue Stabilization Program".into(),
        description: format!("Daily revenue shows high volatility (CV: {cv:.1}%)"),
        recommendation: "Implement demand forecasting and dynamic pricing strategies".into(),
        impact: Impact::High,
        timeline: Timeline::months(3, 6),
        priority: 90,
    })
}

fn seasonal_campaign(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    ctx.statistics?;
    let seasons = &ctx.time_series?.seasonal_analysis.as_ref()?.chart_data;
    let revenues: Vec<f64> = seasons.iter().map(|s| s.revenue).collect();
    let best = seasons.get(numeric::argmax(&revenues)?)?.season;
    let worst = seasons.get(numeric::argmin(&revenues)?)?.season;
    let gap = spread_pct(&revenues);
    (gap > SEASONAL_GAP_THRESHOLD).then(|| Finding {
        title: "Seasonal Campaign Optimization".into(),
        description: format!(
            "Large seasonal revenue gap: {gap:.1}% between {best} and {worst}"
        ),
        recommendation: format!(
            "Develop targeted promotions for {worst} and maximize {best} performance"
        ),
        impact: Impact::Medium,
        timeline: Timeline::months(1, 2),
        priority: 75,
    })
}

fn weekly_staffing(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let days = &ctx.time_series?.weekly_patterns.as_ref()?.day_of_week_data;
    let revenues: Vec<f64> = days.iter().map(|d| d.revenue).collect();
    let best = &days.get(numeric::argmax(&revenues)?)?.day;
    let worst = &days.get(numeric::argmin(&revenues)?)?.day;
    let gap = spread_pct(&revenues);
    (gap > WEEKLY_GAP_THRESHOLD).then(|| Finding {
        title: "Staffing and Inventory Optimization".into(),
        description: format!("Large weekly variance: {best} vs {worst} ({gap:.1}% difference)"),
        recommendation: "Adjust staffing levels and inventory distribution based on weekly patterns"
            .into(),
        impact: Impact::Medium,
        timeline: Timeline::months(1, 1),
        priority: 55,
    })
}

fn trend_response(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let trend = &ctx.time_series?.trend_analysis.as_ref()?.statistics;
    if trend.r_squared <= STRONG_TREND_THRESHOLD {
        return None;
    }
    let r2 = trend.r_squared;
    Some(match trend.trend_direction {
        TrendDirection::Increasing => Finding {
            title: "Growth Acceleration Program".into(),
            description: format!("Strong positive trend identified (R²: {r2:.2})"),
            recommendation: "Invest in capacity expansion and market penetration strategies".into(),
            impact: Impact::High,
            timeline: Timeline::months(6, 12),
            priority: 80,
        },
        TrendDirection::Decreasing => Finding {
            title: "Revenue Decline Mitigation".into(),
            description: format!("Strong negative trend identified (R²: {r2:.2})"),
            recommendation: "Implement immediate corrective measures and market analysis".into(),
            impact: Impact::Critical,
            timeline: Timeline::months(1, 1),
            priority: 100,
        },
    })
}

fn gender_expansion(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let genders = ctx.relationships?.demographics.gender.as_ref()?;
    if genders.len() != 2 {
        return None;
    }
    let spent: Vec<f64> = genders.iter().map(|g| g.total_spent).collect();
    let low = &genders.get(numeric::argmin(&spent)?)?.gender;
    let gap = spread_pct(&spent);
    (gap > GENDER_GAP_THRESHOLD).then(|| Finding {
        title: format!("{low} Market Expansion"),
        description: format!("{gap:.1}% revenue gap between genders"),
        recommendation: format!(
            "Develop targeted marketing campaigns and product lines for {low} customers"
        ),
        impact: Impact::Medium,
        timeline: Timeline::months(3, 4),
        priority: 65,
    })
}

fn age_segment_focus(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let groups = ctx.relationships?.demographics.age_groups.as_ref()?;
    if groups.len() < 2 {
        return None;
    }
    let spent: Vec<f64> = groups.iter().map(|g| g.total_spent).collect();
    let top = groups.get(numeric::argmax(&spent)?)?.age_group;
    Some(Finding {
        title: format!("{top} Segment Focus"),
        description: format!("{top} age group shows highest spending"),
        recommendation: "Develop age-specific marketing strategies and product recommendations"
            .into(),
        impact: Impact::Medium,
        timeline: Timeline::months(2, 3),
        priority: 60,
    })
}

fn portfolio_diversification(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let stats = &ctx.relationships?.product_performance.as_ref()?.statistics;
    let concentration = stats.revenue_concentration;
    (concentration > CONCENTRATION_THRESHOLD).then(|| Finding {
        title: "Product Portfolio Diversification".into(),
        description: format!(
            "{} dominates with {concentration:.1}% market share",
            stats.best_performing_category
        ),
        recommendation:
            "Invest in expanding underperforming categories and reduce dependency risk".into(),
        impact: Impact::Medium,
        timeline: Timeline::months(6, 12),
        priority: 65,
    })
}

fn category_optimization(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let categories = &ctx.relationships?.product_performance.as_ref()?.chart_data;
    if categories.len() < 2 {
        return None;
    }
    let revenues: Vec<f64> = categories.iter().map(|c| c.revenue).collect();
    let worst = categories.get(numeric::argmin(&revenues)?)?;
    (worst.revenue < numeric::mean(&revenues) * 0.5).then(|| Finding {
        title: format!("{} Category Optimization", worst.category),
        description: format!(
            "{} significantly underperforms (50% below average)",
            worst.category
        ),
        recommendation:
            "Conduct market research and consider category refresh or discontinuation".into(),
        impact: Impact::Medium,
        timeline: Timeline::months(2, 3),
        priority: 60,
    })
}

fn customer_retention(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let retention = ctx
        .relationships?
        .customer_behavior
        .statistics
        .customer_retention_rate;
    (retention < RETENTION_THRESHOLD).then(|| Finding {
        title: "Customer Retention Enhancement".into(),
        description: format!(
            "Customer retention rate is {retention:.1}% (below industry standard)"
        ),
        recommendation:
            "Launch loyalty program with personalized rewards and targeted re-engagement campaigns"
                .into(),
        impact: Impact::High,
        timeline: Timeline::months(2, 4),
        priority: 95,
    })
}

fn high_value_expansion(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let share = ctx
        .relationships?
        .customer_behavior
        .segment(ValueTier::High)?
        .percentage;
    (share < HIGH_VALUE_SHARE_THRESHOLD).then(|| Finding {
        title: "High-Value Customer Expansion".into(),
        description: format!("High-value customers represent only {share:.1}% of customer base"),
        recommendation:
            "Develop VIP program and premium service tiers to convert medium-value customers"
                .into(),
        impact: Impact::High,
        timeline: Timeline::months(3, 6),
        priority: 85,
    })
}

fn cross_selling(ctx: &AnalysisContext<'_>) -> Option<Finding> {
    let best = ctx
        .relationships?
        .customer_product_matrix
        .as_ref()?
        .cross_selling_opportunities
        .first()?;
    Some(Finding {
        title: "Cross-Selling Campaign".into(),
        description: format!(
            "Best cross-selling opportunity: {} ({:.1}% success rate)",
            best.pair, best.cross_sell_rate
        ),
        recommendation: "Create bundled product offerings and targeted email campaigns".into(),
        impact: Impact::Medium,
        timeline: Timeline::months(1, 2),
        priority: 70,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub category: CategoryType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub immediate_actions: Vec<ActionItem>,
    pub short_term_goals: Vec<ActionItem>,
    pub long_term_strategy: Vec<ActionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub total_recommendations: usize,
    pub high_impact_count: usize,
    pub critical_count: usize,
    pub categories_covered: Vec<CategoryType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub recommendations: Vec<Recommendation>,
    pub action_plan: ActionPlan,
    pub summary: RecommendationSummary,
}

/// Stable sort, highest priority first; ties keep emission order.
pub fn prioritize(mut recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

pub fn action_plan(recommendations: &[Recommendation], mode: TimelineBucketing) -> ActionPlan {
    let mut plan = ActionPlan::default();
    for rec in recommendations {
        let item = ActionItem {
            title: rec.title.clone(),
            description: rec.recommendation.clone(),
            impact: rec.impact,
            category: rec.category_type,
        };
        match rec.timeline.horizon(mode) {
            Horizon::Immediate => plan.immediate_actions.push(item),
            Horizon::ShortTerm => plan.short_term_goals.push(item),
            Horizon::LongTerm => plan.long_term_strategy.push(item),
        }
    }
    plan
}

pub fn summarize(recommendations: &[Recommendation]) -> RecommendationSummary {
    RecommendationSummary {
        total_recommendations: recommendations.len(),
        high_impact_count: recommendations
            .iter()
            .filter(|r| r.impact == Impact::High)
            .count(),
        critical_count: recommendations
            .iter()
            .filter(|r| r.impact == Impact::Critical)
            .count(),
        categories_covered: CategoryType::ALL
            .into_iter()
            .filter(|c| recommendations.iter().any(|r| r.category_type == *c))
            .collect(),
    }
}

pub struct RecommendationEngine {
    pub bucketing: TimelineBucketing,
    pub action_plan_size: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            bucketing: TimelineBucketing::Structured,
            action_plan_size: 15,
        }
    }
}

impl RecommendationEngine {
    pub fn run(&self, ctx: &AnalysisContext<'_>) -> RecommendationBundle {
        info!("Generating business recommendations");
        let emitted: Vec<Recommendation> = DETECTORS.iter().filter_map(|d| d.run(ctx)).collect();
        let recommendations = prioritize(emitted);
        let head = &recommendations[..recommendations.len().min(self.action_plan_size)];
        let action_plan = action_plan(head, self.bucketing);
        let summary = summarize(&recommendations);
        info!(
            "Generated {} recommendations ({} high impact, {} critical)",
            summary.total_recommendations, summary.high_impact_count, summary.critical_count
        );
        RecommendationBundle {
            recommendations,
            action_plan,
            summary,
        }
    }
}

fn write_actions(out: &mut String, heading: &str, items: &[ActionItem]) -> fmt::Result {
    writeln!(out, "### {heading}\n")?;
    for (i, action) in items.iter().enumerate() {
        writeln!(out, "{}. **{}** ({} Impact)", i + 1, action.title, action.impact)?;
        writeln!(out, "   - {}", action.description)?;
        writeln!(out, "   - Category: {}\n", action.category.title())?;
    }
    Ok(())
}

fn write_report(
    out: &mut String,
    bundle: &RecommendationBundle,
    generated_at: NaiveDateTime,
) -> fmt::Result {
    let summary = &bundle.summary;
    writeln!(out, "# Retail Sales Analysis - Business Recommendations\n")?;
    writeln!(out, "**Generated on:** {}\n", generated_at.format("%Y-%m-%d %H:%M:%S"))?;

    writeln!(out, "## Executive Summary\n")?;
    writeln!(out, "- **Total Recommendations:** {}", summary.total_recommendations)?;
    writeln!(out, "- **High Impact Opportunities:** {}", summary.high_impact_count)?;
    writeln!(out, "- **Critical Issues:** {}", summary.critical_count)?;
    let covered: Vec<&str> = summary.categories_covered.iter().map(|c| c.title()).collect();
    writeln!(out, "- **Categories Covered:** {}\n", covered.join(", "))?;

    writeln!(out, "## Action Plan\n")?;
    let plan = &bundle.action_plan;
    write_actions(out, "Immediate Actions (1 Month)", &plan.immediate_actions)?;
    write_actions(out, "Short-term Goals (2-6 Months)", &plan.short_term_goals)?;
    write_actions(out, "Long-term Strategy (6+ Months)", &plan.long_term_strategy)?;

    writeln!(out, "## Detailed Recommendations\n")?;
    for category in CategoryType::ALL {
        let recs: Vec<&Recommendation> = bundle
            .recommendations
            .iter()
            .filter(|r| r.category_type == category)
            .collect();
        if recs.is_empty() {
            continue;
        }
        writeln!(out, "### {}\n", category.title())?;
        for rec in recs {
            writeln!(out, "#### {}\n", rec.title)?;
            writeln!(out, "**Priority Score:** {}/100\n", rec.priority)?;
            writeln!(out, "**Impact:** {}\n", rec.impact)?;
            writeln!(out, "**Timeline:** {}\n", rec.timeline)?;
            writeln!(out, "**Analysis:** {}\n", rec.description)?;
            writeln!(out, "**Recommended Action:** {}\n", rec.recommendation)?;
            writeln!(out, "---\n")?;
        }
    }
    Ok(())
}

/// Markdown rendering of a recommendation bundle.
pub fn render_report(bundle: &RecommendationBundle, generated_at: NaiveDateTime) -> String {
    let mut out = String::new();
    write_report(&mut out, bundle, generated_at).expect("writing to String");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer_product::CustomerProductAnalyzer;
    use crate::loader::CleanedTable;
    use crate::models::Season;
    use crate::statistics::StatisticalAnalyzer;
    use crate::test_support::{table, txn, txn_for};
    use crate::time_series::TimeSeriesAnalyzer;

    fn rec(title: &str, priority: u8, timeline: Timeline) -> Recommendation {
        Recommendation {
            category_type: CategoryType::Strategic,
            title: title.into(),
            description: String::new(),
            recommendation: String::new(),
            impact: Impact::Medium,
            timeline,
            priority,
        }
    }

    #[test]
    fn test_registry_is_grouped_by_bucket() {
        let buckets: Vec<CategoryType> = DETECTORS.iter().map(|d| d.bucket).collect();
        let mut sorted = buckets.clone();
        sorted.sort();
        assert_eq!(buckets, sorted);
        assert_eq!(DETECTORS.len(), 11);
    }

    #[test]
    fn test_no_reports_no_recommendations() {
        let bundle = RecommendationEngine::default().run(&AnalysisContext::default());
        assert!(bundle.recommendations.is_empty());
        assert!(bundle.summary.categories_covered.is_empty());
    }

    fn single_category_relationships() -> CustomerProductReport {
        let t = table(
            (1..=10)
                .map(|i| {
                    let customer = if i % 2 == 1 { "A" } else { "B" };
                    txn(customer, &format!("2023-01-{i:02}"), "Beauty", i as f64 * 10.0)
                })
                .collect(),
        );
        CustomerProductAnalyzer::new(&t).run()
    }

    #[test]
    fn test_single_category_triggers_diversification() {
        let relationships = single_category_relationships();
        let ctx = AnalysisContext {
            relationships: Some(&relationships),
            ..Default::default()
        };
        let bundle = RecommendationEngine::default().run(&ctx);
        assert_eq!(bundle.recommendations.len(), 1);
        let only = &bundle.recommendations[0];
        assert_eq!(only.title, "Product Portfolio Diversification");
        assert_eq!(only.priority, 65);
        assert_eq!(only.category_type, CategoryType::Inventory);
        assert_eq!(bundle.action_plan.long_term_strategy.len(), 1);
    }

    #[test]
    fn test_full_context_sorted_by_priority() {
        let t = table(vec![
            txn_for("A", "Male", 22.0, "2023-01-02", "Beauty", 900.0),
            txn_for("B", "Female", 40.0, "2023-04-03", "Clothing", 50.0),
            txn_for("C", "Male", 58.0, "2023-07-04", "Electronics", 400.0),
            txn_for("A", "Male", 22.0, "2023-10-05", "Electronics", 30.0),
            txn_for("D", "Female", 31.0, "2023-12-06", "Beauty", 20.0),
        ]);
        let statistics = StatisticalAnalyzer::new(&t).run();
        let time_series = TimeSeriesAnalyzer::new(&t).run();
        let relationships = CustomerProductAnalyzer::new(&t).run();
        let ctx = AnalysisContext {
            statistics: Some(&statistics),
            time_series: Some(&time_series),
            relationships: Some(&relationships),
        };
        let bundle = RecommendationEngine::default().run(&ctx);
        assert!(!bundle.recommendations.is_empty());
        assert!(bundle
            .recommendations
            .windows(2)
            .all(|w| w[0].priority >= w[1].priority));
        // Daily revenue swings well past a 30% CV and retention is 25%.
        assert_eq!(bundle.recommendations[0].title, "Customer Retention Enhancement");
        assert_eq!(bundle.recommendations[1].title, "Revenue Stabilization Program");
        let planned = bundle.action_plan.immediate_actions.len()
            + bundle.action_plan.short_term_goals.len()
            + bundle.action_plan.long_term_strategy.len();
        assert_eq!(planned, bundle.recommendations.len().min(15));
    }

    #[test]
    fn test_prioritize_is_stable() {
        let sorted = prioritize(vec![
            rec("a", 60, Timeline::months(1, 1)),
            rec("b", 90, Timeline::months(1, 1)),
            rec("c", 60, Timeline::months(1, 1)),
        ]);
        let titles: Vec<&str> = sorted.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_structured_and_legacy_bucketing() {
        let cases = [
            (Timeline::months(1, 1), Horizon::Immediate, Horizon::Immediate),
            (Timeline::months(1, 2), Horizon::Immediate, Horizon::Immediate),
            (Timeline::months(2, 4), Horizon::ShortTerm, Horizon::ShortTerm),
            (Timeline::months(3, 6), Horizon::ShortTerm, Horizon::ShortTerm),
            (Timeline::months(6, 12), Horizon::LongTerm, Horizon::Immediate),
        ];
        for (timeline, structured, legacy) in cases {
            assert_eq!(timeline.horizon(TimelineBucketing::Structured), structured);
            assert_eq!(timeline.horizon(TimelineBucketing::Legacy), legacy);
        }
        assert_eq!(Timeline::months(6, 12).to_string(), "6-12 months");
        assert_eq!(Timeline::months(1, 1).to_string(), "1 month");
    }

    #[test]
    fn test_action_plan_caps_at_configured_size() {
        let recs: Vec<Recommendation> = (0..20)
            .map(|i| rec(&format!("r{i}"), 50, Timeline::months(2, 3)))
            .collect();
        let engine = RecommendationEngine::default();
        let plan = action_plan(&recs[..engine.action_plan_size], engine.bucketing);
        assert_eq!(plan.short_term_goals.len(), 15);
    }

    #[test]
    fn test_summary_counts_and_buckets() {
        let mut critical = rec("x", 100, Timeline::months(1, 1));
        critical.impact = Impact::Critical;
        critical.category_type = CategoryType::Operational;
        let mut high = rec("y", 95, Timeline::months(2, 4));
        high.impact = Impact::High;
        high.category_type = CategoryType::CustomerExperience;
        let summary = summarize(&[high, critical, rec("z", 60, Timeline::months(2, 3))]);
        assert_eq!(summary.total_recommendations, 3);
        assert_eq!(summary.high_impact_count, 1);
        assert_eq!(summary.critical_count, 1);
        assert_eq!(
            summary.categories_covered,
            vec![
                CategoryType::Strategic,
                CategoryType::Operational,
                CategoryType::CustomerExperience
            ]
        );
    }

    #[test]
    fn test_report_renders_sections() {
        let recs = prioritize(vec![rec("Fix things", 90, Timeline::months(3, 6))]);
        let bundle = RecommendationBundle {
            action_plan: action_plan(&recs, TimelineBucketing::Structured),
            summary: summarize(&recs),
            recommendations: recs,
        };
        let at = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let report = render_report(&bundle, at);
        assert!(report.contains("**Generated on:** 2024-05-01 09:30:00"));
        assert!(report.contains("- **Categories Covered:** Strategic"));
        assert!(report
            .contains("### Short-term Goals (2-6 Months)\n\n1. **Fix things** (Medium Impact)"));
        assert!(report.contains("**Timeline:** 3-6 months"));
    }

    #[test]
    fn test_legacy_engine_files_long_range_timelines_as_immediate() {
        let relationships = single_category_relationships();
        let ctx = AnalysisContext {
            relationships: Some(&relationships),
            ..Default::default()
        };
        let structured = RecommendationEngine::default().run(&ctx);
        let legacy = RecommendationEngine {
            bucketing: TimelineBucketing::Legacy,
            ..Default::default()
        }
        .run(&ctx);

        // "6-12 months" carries the digit 1.
        assert_eq!(structured.recommendations, legacy.recommendations);
        assert_eq!(
            structured.action_plan.long_term_strategy[0].title,
            "Product Portfolio Diversification"
        );
        assert!(structured.action_plan.immediate_actions.is_empty());
        assert_eq!(
            legacy.action_plan.immediate_actions[0].title,
            "Product Portfolio Diversification"
        );
        assert!(legacy.action_plan.long_term_strategy.is_empty());
    }

    #[test]
    fn test_twelve_month_timeline_per_bucketing_mode() {
        let recs = vec![rec("Annual review", 50, Timeline::months(12, 12))];
        assert_eq!(recs[0].timeline.to_string(), "12 months");

        let structured = action_plan(&recs, TimelineBucketing::Structured);
        assert_eq!(structured.long_term_strategy.len(), 1);
        assert!(structured.immediate_actions.is_empty());

        let legacy = action_plan(&recs, TimelineBucketing::Legacy);
        assert_eq!(legacy.immediate_actions.len(), 1);
        assert!(legacy.long_term_strategy.is_empty());
    }

    fn daily_series(amounts: &[f64]) -> CleanedTable {
        table(
            amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| {
                    let day = format!("2023-03-{:02}", i + 1);
                    txn("A", &day, "Beauty", *amount)
                })
                .collect(),
        )
    }

    fn run_on_time_series(t: &CleanedTable) -> RecommendationBundle {
        let time_series = TimeSeriesAnalyzer::new(t).run();
        RecommendationEngine::default().run(&AnalysisContext {
            time_series: Some(&time_series),
            ..Default::default()
        })
    }

    #[test]
    fn test_falling_revenue_leads_with_decline_mitigation() {
        let amounts: Vec<f64> = (0..10).map(|i| 1000.0 - 100.0 * i as f64).collect();
        let bundle = run_on_time_series(&daily_series(&amounts));

        let first = &bundle.recommendations[0];
        assert_eq!(first.title, "Revenue Decline Mitigation");
        assert_eq!(first.impact, Impact::Critical);
        assert_eq!(first.priority, 100);
        assert_eq!(first.category_type, CategoryType::Operational);
        assert_eq!(first.timeline, Timeline::months(1, 1));
        assert_eq!(
            bundle.action_plan.immediate_actions[0].title,
            "Revenue Decline Mitigation"
        );
        assert_eq!(bundle.summary.critical_count, 1);
    }

    #[test]
    fn test_rising_revenue_plans_growth_long_term() {
        let amounts: Vec<f64> = (0..10).map(|i| 100.0 + 100.0 * i as f64).collect();
        let bundle = run_on_time_series(&daily_series(&amounts));

        let first = &bundle.recommendations[0];
        assert_eq!(first.title, "Growth Acceleration Program");
        assert_eq!(first.impact, Impact::High);
        assert_eq!(first.priority, 80);
        assert!(bundle
            .action_plan
            .long_term_strategy
            .iter()
            .any(|a| a.title == "Growth Acceleration Program"));
        assert!(bundle
            .action_plan
            .immediate_actions
            .iter()
            .all(|a| a.title != "Growth Acceleration Program"));
        assert_eq!(bundle.summary.critical_count, 0);
    }

    #[test]
    fn test_weak_trend_is_ignored() {
        let amounts: Vec<f64> = (0..10)
            .map(|i| if i % 2 == 0 { 100.0 } else { 900.0 })
            .collect();
        let time_series = TimeSeriesAnalyzer::new(&daily_series(&amounts)).run();
        let r2 = time_series.trend_analysis.as_ref().unwrap().statistics.r_squared;
        assert!(r2 < STRONG_TREND_THRESHOLD);
        let ctx = AnalysisContext {
            time_series: Some(&time_series),
            ..Default::default()
        };
        assert!(trend_response(&ctx).is_none());
    }

    /// One transaction per season; the seasonal revenues are then overridden.
    fn seasonal_finding(winter: f64, fall: f64) -> Option<Finding> {
        let t = table(vec![
            txn("A", "2023-01-10", "Beauty", 10.0),
            txn("B", "2023-04-10", "Beauty", 10.0),
            txn("C", "2023-07-10", "Beauty", 10.0),
            txn("D", "2023-10-10", "Beauty", 10.0),
        ]);
        let statistics = StatisticalAnalyzer::new(&t).run();
        let mut time_series = TimeSeriesAnalyzer::new(&t).run();
        let seasons = &mut time_series.seasonal_analysis.as_mut().unwrap().chart_data;
        assert_eq!(seasons.len(), 4);
        for s in seasons.iter_mut() {
            s.revenue = match s.season {
                Season::Winter => winter,
                Season::Fall => fall,
                _ => 90.0,
            };
        }
        seasonal_campaign(&AnalysisContext {
            statistics: Some(&statistics),
            time_series: Some(&time_series),
            relationships: None,
        })
    }

    #[test]
    fn test_seasonal_campaign_above_gap_threshold() {
        let finding = seasonal_finding(100.0, 74.0).unwrap();
        assert_eq!(finding.title, "Seasonal Campaign Optimization");
        assert_eq!(
            finding.description,
            "Large seasonal revenue gap: 26.0% between Winter and Fall"
        );
        assert_eq!(finding.priority, 75);
        assert_eq!(finding.impact, Impact::Medium);
        assert_eq!(finding.timeline, Timeline::months(1, 2));
    }

    #[test]
    fn test_seasonal_campaign_at_gap_threshold() {
        assert!(seasonal_finding(100.0, 75.0).is_none());
    }

    /// One transaction per weekday, Monday 2023-05-01 through Sunday.
    fn weekly_finding(sunday: f64) -> Option<Finding> {
        let t = table(
            (1..=7)
                .map(|d| txn("A", &format!("2023-05-0{d}"), "Beauty", 10.0))
                .collect(),
        );
        let mut time_series = TimeSeriesAnalyzer::new(&t).run();
        let days = &mut time_series.weekly_patterns.as_mut().unwrap().day_of_week_data;
        assert_eq!(days.len(), 7);
        for d in days.iter_mut() {
            d.revenue = if d.day == "Sunday" { sunday } else { 100.0 };
        }
        weekly_staffing(&AnalysisContext {
            time_series: Some(&time_series),
            ..Default::default()
        })
    }

    #[test]
    fn test_weekly_staffing_above_gap_threshold() {
        let finding = weekly_finding(49.0).unwrap();
        assert_eq!(finding.title, "Staffing and Inventory Optimization");
        assert_eq!(
            finding.description,
            "Large weekly variance: Monday vs Sunday (51.0% difference)"
        );
        assert_eq!(finding.priority, 55);
        assert_eq!(finding.timeline, Timeline::months(1, 1));
    }

    #[test]
    fn test_weekly_staffing_at_gap_threshold() {
        assert!(weekly_finding(50.0).is_none());
    }

    fn gender_finding(male: f64, female: f64) -> Option<Finding> {
        let t = table(vec![
            txn_for("A", "Male", 30.0, "2023-01-02", "Beauty", 10.0),
            txn_for("B", "Female", 30.0, "2023-01-03", "Beauty", 10.0),
        ]);
        let mut relationships = CustomerProductAnalyzer::new(&t).run();
        for g in relationships.demographics.gender.as_mut().unwrap() {
            g.total_spent = if g.gender == "Male" { male } else { female };
        }
        gender_expansion(&AnalysisContext {
            relationships: Some(&relationships),
            ..Default::default()
        })
    }

    #[test]
    fn test_gender_expansion_targets_lower_spending_gender() {
        let finding = gender_finding(1000.0, 790.0).unwrap();
        assert_eq!(finding.title, "Female Market Expansion");
        assert_eq!(finding.description, "21.0% revenue gap between genders");
        assert_eq!(finding.priority, 65);
        assert_eq!(finding.timeline, Timeline::months(3, 4));

        let finding = gender_finding(700.0, 1000.0).unwrap();
        assert_eq!(finding.title, "Male Market Expansion");
    }

    #[test]
    fn test_gender_expansion_below_gap_threshold() {
        assert!(gender_finding(1000.0, 810.0).is_none());
    }

    #[test]
    fn test_age_segment_focus_picks_top_spending_group() {
        let t = table(vec![
            txn_for("A", "Male", 22.0, "2023-01-02", "Beauty", 100.0),
            txn_for("B", "Female", 40.0, "2023-01-03", "Beauty", 500.0),
            txn_for("C", "Male", 60.0, "2023-01-04", "Beauty", 200.0),
        ]);
        let relationships = CustomerProductAnalyzer::new(&t).run();
        let finding = age_segment_focus(&AnalysisContext {
            relationships: Some(&relationships),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(finding.title, "36-45 Segment Focus");
        assert_eq!(finding.priority, 60);
        assert_eq!(finding.timeline, Timeline::months(2, 3));
    }

    #[test]
    fn test_age_segment_focus_needs_two_groups() {
        let t = table(vec![
            txn_for("A", "Male", 30.0, "2023-01-02", "Beauty", 100.0),
            txn_for("B", "Female", 32.0, "2023-01-03", "Beauty", 500.0),
        ]);
        let relationships = CustomerProductAnalyzer::new(&t).run();
        assert!(age_segment_focus(&AnalysisContext {
            relationships: Some(&relationships),
            ..Default::default()
        })
        .is_none());
    }

    fn category_finding(electronics: f64) -> Option<Finding> {
        let t = table(vec![
            txn("A", "2023-01-02", "Beauty", 10.0),
            txn("B", "2023-01-03", "Clothing", 10.0),
            txn("C", "2023-01-04", "Electronics", 10.0),
        ]);
        let mut relationships = CustomerProductAnalyzer::new(&t).run();
        let categories = &mut relationships.product_performance.as_mut().unwrap().chart_data;
        assert_eq!(categories.len(), 3);
        for c in categories.iter_mut() {
            c.revenue = if c.category == "Electronics" { electronics } else { 100.0 };
        }
        category_optimization(&AnalysisContext {
            relationships: Some(&relationships),
            ..Default::default()
        })
    }

    #[test]
    fn test_category_optimization_below_half_of_mean() {
        let finding = category_finding(39.0).unwrap();
        assert_eq!(finding.title, "Electronics Category Optimization");
        assert_eq!(finding.priority, 60);
        assert_eq!(finding.timeline, Timeline::months(2, 3));
    }

    #[test]
    fn test_category_optimization_at_half_of_mean() {
        // Mean of 100, 100, 40 is 80.
        assert!(category_finding(40.0).is_none());
    }
}
