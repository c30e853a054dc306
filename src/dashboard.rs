//! Dashboard configuration: chart-ready series, KPI cards and a short
//! insight digest for the presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::customer_product::CustomerProductReport;
use crate::models::Insight;
use crate::numeric;
use crate::statistics::StatisticsReport;
use crate::time_series::TimeSeriesReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
    Pie,
    Radar,
    PolarArea,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub label: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Chart {
    fn new(kind: ChartKind, title: &str, label: Option<&str>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            label: label.map(str::to_string),
            labels: Vec::new(),
            values: Vec::new(),
        }
    }

    fn with_points<I, L>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = (L, f64)>,
        L: Into<String>,
    {
        for (label, value) in points {
            self.labels.push(label.into());
            self.values.push(value);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCard {
    pub title: String,
    pub value: String,
    pub subtitle: String,
    pub icon: String,
    pub color: String,
}

impl KpiCard {
    fn new(title: &str, value: String, subtitle: String, icon: &str, color: &str) -> Self {
        Self {
            title: title.to_string(),
            value,
            subtitle,
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestEntry {
    pub category: String,
    pub insight: String,
    pub recommendation: String,
    pub priority: DigestPriority,
}

impl From<&Insight> for DigestEntry {
    fn from(insight: &Insight) -> Self {
        let priority = if insight.insight.to_lowercase().contains("significant") {
            DigestPriority::High
        } else {
            DigestPriority::Medium
        };
        Self {
            category: insight.category.clone(),
            insight: insight.insight.clone(),
            recommendation: insight.recommendation.clone(),
            priority,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub charts: BTreeMap<String, Chart>,
    pub kpis: Vec<KpiCard>,
    pub insights: Vec<DigestEntry>,
}

/// Groups the integer part in threes: `1234567` becomes `"1,234,567"`.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_count(n: usize) -> String {
    group_thousands(&n.to_string())
}

pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn time_series_charts(ts: &TimeSeriesReport, charts: &mut BTreeMap<String, Chart>) {
    if let Some(daily) = &ts.daily_analysis {
        let chart = Chart::new(ChartKind::Line, "Daily Revenue Trend", Some("Daily Revenue"))
            .with_points(
                daily
                    .chart_data
                    .iter()
                    .map(|d| (d.date.format("%Y-%m-%d").to_string(), d.revenue)),
            );
        charts.insert("daily_revenue".into(), chart);
    }
    if let Some(monthly) = &ts.monthly_trends {
        let chart = Chart::new(ChartKind::Bar, "Monthly Revenue Trend", Some("Monthly Revenue"))
            .with_points(
                monthly
                    .chart_data
                    .iter()
                    .map(|m| (m.month_name.clone(), m.revenue)),
            );
        charts.insert("monthly_revenue".into(), chart);
    }
    if let Some(weekly) = &ts.weekly_patterns {
        let chart = Chart::new(
            ChartKind::Radar,
            "Weekly Sales Pattern",
            Some("Average Daily Revenue"),
        )
        .with_points(weekly.day_of_week_data.iter().map(|d| {
            (d.day.clone(), numeric::ratio(d.revenue, d.transactions as f64))
        }));
        charts.insert("weekly_patterns".into(), chart);
    }
    if let Some(seasonal) = &ts.seasonal_analysis {
        let chart = Chart::new(ChartKind::PolarArea, "Seasonal Revenue Distribution", None)
            .with_points(
                seasonal
                    .chart_data
                    .iter()
                    .map(|s| (s.season.name(), s.revenue)),
            );
        charts.insert("seasonal_analysis".into(), chart);
    }
}

fn customer_product_charts(cp: &CustomerProductReport, charts: &mut BTreeMap<String, Chart>) {
    let segments = Chart::new(ChartKind::Doughnut, "Customer Value Segments", None).with_points(
        cp.customer_behavior
            .clv_segments
            .iter()
            .map(|s| (s.segment.label(), s.customer_count as f64)),
    );
    charts.insert("customer_segments".into(), segments);

    if let Some(genders) = &cp.demographics.gender {
        let chart = Chart::new(ChartKind::Bar, "Revenue by Gender", Some("Total Revenue"))
            .with_points(genders.iter().map(|g| (g.gender.clone(), g.total_spent)));
        charts.insert("gender_analysis".into(), chart);
    }

    if let Some(products) = &cp.product_performance {
        let performance = Chart::new(
            ChartKind::Bar,
            "Product Category Performance",
            Some("Revenue"),
        )
        .with_points(
            products
                .chart_data
                .iter()
                .map(|c| (c.category.clone(), c.revenue)),
        );
        let share = Chart::new(ChartKind::Pie, "Market Share by Category", None).with_points(
            products
                .chart_data
                .iter()
                .map(|c| (c.category.clone(), c.market_share)),
        );
        charts.insert("category_performance".into(), performance);
        charts.insert("market_share".into(), share);
    }
}

fn kpi_cards(
    statistics: Option<&StatisticsReport>,
    time_series: Option<&TimeSeriesReport>,
    relationships: Option<&CustomerProductReport>,
) -> Vec<KpiCard> {
    let mut kpis = Vec::new();

    if let Some(amount) = statistics.and_then(|s| s.descriptive.get("Total_Amount")) {
        kpis.push(KpiCard::new(
            "Total Revenue",
            format_currency(amount.mean * amount.count as f64),
            format!("From {} transactions", format_count(amount.count)),
            "dollar-sign",
            "success",
        ));
        kpis.push(KpiCard::new(
            "Average Transaction",
            format_currency(amount.mean),
            format!("Median: {}", format_currency(amount.median)),
            "trending-up",
            "primary",
        ));
    }

    if let Some(cp) = relationships {
        let stats = &cp.customer_behavior.statistics;
        kpis.push(KpiCard::new(
            "Total Customers",
            format_count(stats.total_customers),
            format!("{:.1}% retention rate", stats.customer_retention_rate),
            "users",
            "info",
        ));
        kpis.push(KpiCard::new(
            "Customer Lifetime Value",
            format_currency(stats.avg_customer_value),
            format!("Avg {:.1} transactions", stats.avg_transactions_per_customer),
            "heart",
            "warning",
        ));
    }

    if let Some(daily) = time_series.and_then(|ts| ts.daily_analysis.as_ref()) {
        kpis.push(KpiCard::new(
            "Daily Revenue",
            format_currency(daily.statistics.avg_daily_revenue),
            format!("Peak: {}", format_currency(daily.statistics.max_daily_revenue)),
            "calendar",
            "secondary",
        ));
    }

    kpis
}

/// Builds the dashboard from whichever reports are available.
pub fn build(
    statistics: Option<&StatisticsReport>,
    time_series: Option<&TimeSeriesReport>,
    relationships: Option<&CustomerProductReport>,
    digest_size: usize,
) -> DashboardConfig {
    let mut charts = BTreeMap::new();
    if let Some(ts) = time_series {
        time_series_charts(ts, &mut charts);
    }
    if let Some(cp) = relationships {
        customer_product_charts(cp, &mut charts);
    }

    let insights = statistics
        .map(|s| s.business_insights.as_slice())
        .unwrap_or_default()
        .iter()
        .chain(time_series.map(|t| t.time_insights.as_slice()).unwrap_or_default())
        .chain(relationships.map(|c| c.cp_insights.as_slice()).unwrap_or_default())
        .take(digest_size)
        .map(DigestEntry::from)
        .collect();

    DashboardConfig {
        charts,
        kpis: kpi_cards(statistics, time_series, relationships),
        insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer_product::CustomerProductAnalyzer;
    use crate::statistics::StatisticalAnalyzer;
    use crate::test_support::{table, txn_for};
    use crate::time_series::TimeSeriesAnalyzer;

    #[test]
    fn test_currency_formatting() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-42.5), "-$42.50");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(12), "12");
    }

    #[test]
    fn test_digest_priority_from_wording() {
        let significant = Insight::new("Gender", "Significant difference in spending", "Target");
        let plain = Insight::new("Product", "Beauty is most popular", "Stock up");
        assert_eq!(DigestEntry::from(&significant).priority, DigestPriority::High);
        assert_eq!(DigestEntry::from(&plain).priority, DigestPriority::Medium);
    }

    #[test]
    fn test_full_dashboard() {
        let t = table(vec![
            txn_for("A", "Male", 22.0, "2023-01-02", "Beauty", 900.0),
            txn_for("B", "Female", 40.0, "2023-04-03", "Clothing", 50.0),
            txn_for("C", "Male", 58.0, "2023-07-04", "Electronics", 400.0),
            txn_for("A", "Male", 22.0, "2023-10-05", "Electronics", 30.0),
        ]);
        let stats = StatisticalAnalyzer::new(&t).run();
        let ts = TimeSeriesAnalyzer::new(&t).run();
        let cp = CustomerProductAnalyzer::new(&t).run();
        let dashboard = build(Some(&stats), Some(&ts), Some(&cp), 8);

        let names: Vec<&str> = dashboard.charts.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "category_performance",
                "customer_segments",
                "daily_revenue",
                "gender_analysis",
                "market_share",
                "monthly_revenue",
                "seasonal_analysis",
                "weekly_patterns",
            ]
        );
        assert_eq!(dashboard.kpis.len(), 5);
        assert_eq!(dashboard.kpis[0].value, "$1,380.00");
        assert_eq!(dashboard.kpis[0].subtitle, "From 4 transactions");
        assert!(dashboard.insights.len() <= 8);

        let daily = &dashboard.charts["daily_revenue"];
        assert_eq!(daily.labels[0], "2023-01-02");
        assert_eq!(daily.values, vec![900.0, 50.0, 400.0, 30.0]);
    }

    #[test]
    fn test_missing_reports_give_empty_dashboard() {
        let dashboard = build(None, None, None, 8);
        assert!(dashboard.charts.is_empty());
        assert!(dashboard.kpis.is_empty());
        assert!(dashboard.insights.is_empty());
    }
}
