//! Temporal aggregation: daily, weekday, ISO-week, monthly and seasonal
//! rollups plus a linear trend over the daily revenue series.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{info, warn};

use crate::loader::CleanedTable;
use crate::models::{weekday_name, Insight, Season, Transaction};
use crate::numeric::{self, round2};

const SHORT_WINDOW: usize = 7;
const LONG_WINDOW: usize = 30;
const VOLATILITY_CV_THRESHOLD: f64 = 30.0;
const STRONG_TREND_THRESHOLD: f64 = 0.7;

const WEEKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];
const WEEKEND: [&str; 2] = ["Saturday", "Sunday"];

/// Revenue, average ticket and volume of one group of transactions.
struct GroupTotals {
    revenue: f64,
    avg_transaction: f64,
    transactions: usize,
    quantity: f64,
    customers: usize,
}

impl GroupTotals {
    fn of(txns: &[&Transaction]) -> Self {
        let amounts: Vec<f64> = txns.iter().map(|t| t.total_amount).collect();
        Self {
            revenue: round2(numeric::sum(&amounts)),
            avg_transaction: round2(numeric::mean(&amounts)),
            transactions: txns.len(),
            quantity: round2(txns.iter().filter_map(|t| t.quantity).sum()),
            customers: txns
                .iter()
                .map(|t| t.customer_id.as_str())
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub revenue: f64,
    pub avg_transaction: f64,
    pub transactions: usize,
    pub quantity: f64,
    pub customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHighlight {
    pub date: NaiveDate,
    pub revenue: f64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistics {
    pub total_days: usize,
    pub avg_daily_revenue: f64,
    pub max_daily_revenue: f64,
    pub min_daily_revenue: f64,
    pub avg_daily_transactions: f64,
    pub avg_daily_customers: f64,
    /// Sample standard deviation of daily revenue.
    pub revenue_volatility: f64,
    pub best_day: DayHighlight,
    pub worst_day: DayHighlight,
}

impl DailyStatistics {
    /// Coefficient of variation of daily revenue, in percent.
    pub fn revenue_cv(&self) -> f64 {
        numeric::percentage(self.revenue_volatility, self.avg_daily_revenue)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAnalysis {
    pub statistics: DailyStatistics,
    pub chart_data: Vec<DailyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayRecord {
    pub day: String,
    pub revenue: f64,
    pub transactions: usize,
    pub avg_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekRecord {
    pub week: u32,
    pub revenue: f64,
    pub transactions: usize,
    pub avg_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekendComparison {
    pub weekend_avg: f64,
    pub weekday_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStatistics {
    pub best_day_of_week: String,
    pub worst_day_of_week: String,
    pub weekend_vs_weekday: WeekendComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPatterns {
    pub day_of_week_data: Vec<WeekdayRecord>,
    pub weekly_data: Vec<WeekRecord>,
    pub statistics: WeeklyStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRecord {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub revenue: f64,
    pub transactions: usize,
    pub customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatistics {
    pub total_months: usize,
    pub avg_monthly_revenue: f64,
    /// Mean month-over-month growth, in percent.
    pub revenue_growth_rate: f64,
    pub best_month: MonthRecord,
    pub worst_month: MonthRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrends {
    pub chart_data: Vec<MonthRecord>,
    pub statistics: MonthlyStatistics,
    pub growth_rates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub season: Season,
    pub revenue: f64,
    pub transactions: usize,
    pub avg_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalStatistics {
    pub best_season: Season,
    pub worst_season: Season,
    /// Population variance of seasonal revenue.
    pub seasonal_variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalAnalysis {
    pub chart_data: Vec<SeasonRecord>,
    pub statistics: SeasonalStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => f.write_str("Increasing"),
            TrendDirection::Decreasing => f.write_str("Decreasing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub actual: f64,
    pub ma_7: f64,
    pub ma_30: f64,
    pub trend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendStatistics {
    pub trend_slope: f64,
    pub trend_direction: TrendDirection,
    pub trend_strength: f64,
    /// Squared correlation between the actual series and the fitted line.
    pub r_squared: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub chart_data: Vec<TrendPoint>,
    pub statistics: TrendStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesReport {
    pub daily_analysis: Option<DailyAnalysis>,
    pub weekly_patterns: Option<WeeklyPatterns>,
    pub monthly_trends: Option<MonthlyTrends>,
    pub seasonal_analysis: Option<SeasonalAnalysis>,
    pub trend_analysis: Option<TrendAnalysis>,
    pub time_insights: Vec<Insight>,
}

pub struct TimeSeriesAnalyzer<'a> {
    table: &'a CleanedTable,
}

impl<'a> TimeSeriesAnalyzer<'a> {
    pub fn new(table: &'a CleanedTable) -> Self {
        Self { table }
    }

    fn group_by<K: Ord>(
        &self,
        key: impl Fn(&Transaction) -> K,
    ) -> BTreeMap<K, Vec<&'a Transaction>> {
        let mut groups: BTreeMap<K, Vec<&'a Transaction>> = BTreeMap::new();
        let table: &'a CleanedTable = self.table;
        for t in &table.records {
            groups.entry(key(t)).or_default().push(t);
        }
        groups
    }

    pub fn daily(&self) -> Option<DailyAnalysis> {
        let chart_data: Vec<DailyRecord> = self
            .group_by(|t| t.date)
            .into_iter()
            .map(|(date, txns)| {
                let totals = GroupTotals::of(&txns);
                DailyRecord {
                    date,
                    revenue: totals.revenue,
                    avg_transaction: totals.avg_transaction,
                    transactions: totals.transactions,
                    quantity: totals.quantity,
                    customers: totals.customers,
                }
            })
            .collect();

        let revenues: Vec<f64> = chart_data.iter().map(|d| d.revenue).collect();
        let highlight = |i: usize| DayHighlight {
            date: chart_data[i].date,
            revenue: chart_data[i].revenue,
            transactions: chart_data[i].transactions,
        };
        let best_day = highlight(numeric::argmax(&revenues)?);
        let worst_day = highlight(numeric::argmin(&revenues)?);

        let transactions: Vec<f64> = chart_data.iter().map(|d| d.transactions as f64).collect();
        let customers: Vec<f64> = chart_data.iter().map(|d| d.customers as f64).collect();
        let statistics = DailyStatistics {
            total_days: chart_data.len(),
            avg_daily_revenue: numeric::mean(&revenues),
            max_daily_revenue: numeric::max(&revenues),
            min_daily_revenue: numeric::min(&revenues),
            avg_daily_transactions: numeric::mean(&transactions),
            avg_daily_customers: numeric::mean(&customers),
            revenue_volatility: numeric::sample_std(&revenues),
            best_day,
            worst_day,
        };
        Some(DailyAnalysis {
            statistics,
            chart_data,
        })
    }

    pub fn weekly(&self) -> Option<WeeklyPatterns> {
        // Monday = 0, so the map iterates in canonical week order.
        let day_of_week_data: Vec<WeekdayRecord> = self
            .group_by(|t| t.date.weekday().num_days_from_monday())
            .into_values()
            .filter_map(|txns| {
                let day = weekday_name(txns.first()?.date.weekday());
                let totals = GroupTotals::of(&txns);
                Some(WeekdayRecord {
                    day: day.to_string(),
                    revenue: totals.revenue,
                    transactions: totals.transactions,
                    avg_transaction: totals.avg_transaction,
                })
            })
            .collect();

        let weekly_data = self
            .group_by(|t| t.week_of_year)
            .into_iter()
            .map(|(week, txns)| {
                let totals = GroupTotals::of(&txns);
                WeekRecord {
                    week,
                    revenue: totals.revenue,
                    transactions: totals.transactions,
                    avg_transaction: totals.avg_transaction,
                }
            })
            .collect();

        let revenues: Vec<f64> = day_of_week_data.iter().map(|d| d.revenue).collect();
        let best_day_of_week = day_of_week_data[numeric::argmax(&revenues)?].day.clone();
        let worst_day_of_week = day_of_week_data[numeric::argmin(&revenues)?].day.clone();

        // Averaged only when every day of the group is present.
        let group_avg = |days: &[&str]| -> f64 {
            let avgs: Vec<f64> = day_of_week_data
                .iter()
                .filter(|d| days.contains(&d.day.as_str()))
                .map(|d| d.avg_transaction)
                .collect();
            if avgs.len() == days.len() {
                numeric::mean(&avgs)
            } else {
                0.0
            }
        };
        let weekend_vs_weekday = WeekendComparison {
            weekend_avg: group_avg(&WEEKEND),
            weekday_avg: group_avg(&WEEKDAYS),
        };

        Some(WeeklyPatterns {
            day_of_week_data,
            weekly_data,
            statistics: WeeklyStatistics {
                best_day_of_week,
                worst_day_of_week,
                weekend_vs_weekday,
            },
        })
    }

    pub fn monthly(&self) -> Option<MonthlyTrends> {
        let chart_data: Vec<MonthRecord> = self
            .group_by(|t| (t.year, t.month))
            .into_iter()
            .map(|((year, month), txns)| {
                let totals = GroupTotals::of(&txns);
                MonthRecord {
                    year,
                    month,
                    month_name: NaiveDate::from_ymd_opt(year, month, 1)
                        .map(|d| d.format("%B %Y").to_string())
                        .unwrap_or_default(),
                    revenue: totals.revenue,
                    transactions: totals.transactions,
                    customers: totals.customers,
                }
            })
            .collect();

        let revenues: Vec<f64> = chart_data.iter().map(|m| m.revenue).collect();
        let growth_rates: Vec<f64> = revenues
            .windows(2)
            .map(|w| numeric::percentage(w[1] - w[0], w[0]))
            .collect();
        let best_month = chart_data[numeric::argmax(&revenues)?].clone();
        let worst_month = chart_data[numeric::argmin(&revenues)?].clone();

        Some(MonthlyTrends {
            statistics: MonthlyStatistics {
                total_months: chart_data.len(),
                avg_monthly_revenue: numeric::mean(&revenues),
                revenue_growth_rate: numeric::mean(&growth_rates),
                best_month,
                worst_month,
            },
            chart_data,
            growth_rates,
        })
    }

    pub fn seasonal(&self) -> Option<SeasonalAnalysis> {
        let chart_data: Vec<SeasonRecord> = self
            .group_by(Transaction::season)
            .into_iter()
            .map(|(season, txns)| {
                let totals = GroupTotals::of(&txns);
                SeasonRecord {
                    season,
                    revenue: totals.revenue,
                    transactions: totals.transactions,
                    avg_transaction: totals.avg_transaction,
                }
            })
            .collect();

        let revenues: Vec<f64> = chart_data.iter().map(|s| s.revenue).collect();
        Some(SeasonalAnalysis {
            statistics: SeasonalStatistics {
                best_season: chart_data[numeric::argmax(&revenues)?].season,
                worst_season: chart_data[numeric::argmin(&revenues)?].season,
                seasonal_variance: numeric::population_variance(&revenues),
            },
            chart_data,
        })
    }

    pub fn trend(&self) -> Option<TrendAnalysis> {
        let series: Vec<(NaiveDate, f64)> = self
            .group_by(|t| t.date)
            .into_iter()
            .map(|(date, txns)| (date, txns.iter().map(|t| t.total_amount).sum()))
            .collect();
        if series.is_empty() {
            return None;
        }

        let actual: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        let index: Vec<f64> = (0..actual.len()).map(|i| i as f64).collect();
        let fit = numeric::linear_fit(&index, &actual);
        let fitted: Vec<f64> = index.iter().map(|x| fit.at(*x)).collect();
        let ma_7 = numeric::moving_average(&actual, SHORT_WINDOW);
        let ma_30 = numeric::moving_average(&actual, LONG_WINDOW);

        let chart_data = series
            .iter()
            .enumerate()
            .map(|(i, (date, value))| TrendPoint {
                date: *date,
                actual: *value,
                ma_7: ma_7[i],
                ma_30: ma_30[i],
                trend: fitted[i],
            })
            .collect();

        let statistics = TrendStatistics {
            trend_slope: fit.slope,
            trend_direction: if fit.slope > 0.0 {
                TrendDirection::Increasing
            } else {
                TrendDirection::Decreasing
            },
            trend_strength: fit.slope.abs(),
            r_squared: numeric::pearson(&actual, &fitted).powi(2),
        };
        Some(TrendAnalysis {
            chart_data,
            statistics,
        })
    }

    pub fn insights(
        daily: Option<&DailyAnalysis>,
        weekly: Option<&WeeklyPatterns>,
        seasonal: Option<&SeasonalAnalysis>,
        trend: Option<&TrendAnalysis>,
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        if let Some(stats) = daily.map(|d| &d.statistics) {
            let cv = stats.revenue_cv();
            if stats.avg_daily_revenue > 0.0 && cv > VOLATILITY_CV_THRESHOLD {
                insights.push(Insight::new(
                    "Revenue Stability",
                    format!("Daily revenue shows high volatility (CV: {cv:.1}%)"),
                    "Implement strategies to stabilize daily sales through promotions and inventory management",
                ));
            }
        }

        if let Some(weekly) = weekly {
            let best = &weekly.statistics.best_day_of_week;
            insights.push(Insight::new(
                "Weekly Patterns",
                format!("{best} is the best performing day of the week"),
                format!("Schedule major promotions and new product launches on {best}s"),
            ));
        }

        if let Some(seasonal) = seasonal {
            let best = seasonal.statistics.best_season;
            insights.push(Insight::new(
                "Seasonality",
                format!("{best} shows the highest sales performance"),
                format!("Increase inventory and marketing budget during {best} season"),
            ));
        }

        if let Some(stats) = trend.map(|t| &t.statistics) {
            if stats.r_squared > STRONG_TREND_THRESHOLD {
                insights.push(Insight::new(
                    "Business Trend",
                    format!(
                        "Sales show a strong {} trend (R²: {:.2})",
                        stats.trend_direction.to_string().to_lowercase(),
                        stats.r_squared
                    ),
                    "Leverage current trend momentum for strategic planning and investment decisions",
                ));
            }
        }

        insights
    }

    pub fn run(&self) -> TimeSeriesReport {
        info!("Running time series analysis");
        if self.table.is_empty() {
            warn!("No transactions; time series analysis skipped");
        }
        let daily_analysis = self.daily();
        let weekly_patterns = self.weekly();
        let monthly_trends = self.monthly();
        let seasonal_analysis = self.seasonal();
        let trend_analysis = self.trend();
        let time_insights = Self::insights(
            daily_analysis.as_ref(),
            weekly_patterns.as_ref(),
            seasonal_analysis.as_ref(),
            trend_analysis.as_ref(),
        );
        info!(
            "Time series analysis complete: {} days, {} insights",
            daily_analysis.as_ref().map_or(0, |d| d.statistics.total_days),
            time_insights.len()
        );
        TimeSeriesReport {
            daily_analysis,
            weekly_patterns,
            monthly_trends,
            seasonal_analysis,
            trend_analysis,
            time_insights,
        }
    }
}
