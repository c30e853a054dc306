//! Descriptive and inferential statistics over the cleaned table.
//!
//! Hypothesis tests draw their p-values from `statrs` distributions:
//! - gender spending gap: pooled-variance two-sample t-test, Male vs Female
//! - age vs spend: Pearson r with a t-distributed test statistic
//! - category spending: one-way ANOVA F-test

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::customer_product::customer_aggregates;
use crate::loader::CleanedTable;
use crate::models::{CategoricalColumn, Column, Insight, NumericColumn, ValueCount, ValueTier};
use crate::numeric;

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
const Z_SCORE_THRESHOLD: f64 = 3.0;
const IQR_FENCE: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: Option<f64>,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
}

impl DescriptiveStats {
    pub fn of(values: &[f64]) -> Self {
        let sorted = numeric::sorted(values);
        let q1 = numeric::quantile_sorted(&sorted, 0.25);
        let q3 = numeric::quantile_sorted(&sorted, 0.75);
        Self {
            count: values.len(),
            mean: numeric::mean(values),
            median: numeric::quantile_sorted(&sorted, 0.5),
            mode: numeric::mode(values),
            std: numeric::sample_std(values),
            variance: numeric::sample_variance(values),
            min: numeric::min(values),
            max: numeric::max(values),
            q1,
            q3,
            iqr: q3 - q1,
            skewness: numeric::skewness(values),
            kurtosis: numeric::excess_kurtosis(values),
        }
    }
}

/// Square Pearson matrix, rows and columns in `columns` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub test: String,
    pub null_hypothesis: String,
    pub t_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    pub male_mean: f64,
    pub female_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTestResult {
    pub test: String,
    pub null_hypothesis: String,
    pub correlation_coefficient: f64,
    pub p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub test: String,
    pub null_hypothesis: String,
    pub f_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    pub categories_tested: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HypothesisTests {
    pub gender_spending_difference: Option<TTestResult>,
    pub age_spending_correlation: Option<CorrelationTestResult>,
    pub category_spending_anova: Option<AnovaResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IqrOutliers {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub outlier_count: usize,
    pub outlier_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreOutliers {
    pub outlier_count: usize,
    pub outlier_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub iqr_method: IqrOutliers,
    pub zscore_method: ZScoreOutliers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueProportion {
    pub value: String,
    pub proportion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub unique_values: usize,
    pub value_counts: Vec<ValueCount>,
    pub proportions: Vec<ValueProportion>,
    pub mode: String,
    /// Shannon entropy in bits.
    pub entropy: f64,
}

/// Spend tier from the 33rd/67th percentile cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendSegmentSummary {
    pub segment: ValueTier,
    pub customer_count: usize,
    pub avg_total_spent: f64,
    pub avg_transaction_value: f64,
    pub avg_transaction_count: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub descriptive: BTreeMap<String, DescriptiveStats>,
    pub correlation: Option<CorrelationMatrix>,
    pub hypothesis_tests: HypothesisTests,
    pub outliers: BTreeMap<String, OutlierSummary>,
    pub categorical: BTreeMap<String, CategoricalSummary>,
    pub customer_segments: Vec<SpendSegmentSummary>,
    pub business_insights: Vec<Insight>,
}

fn two_sided_t_p_value(t: f64, df: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

fn f_p_value(f: f64, df_between: f64, df_within: f64) -> Option<f64> {
    let dist = FisherSnedecor::new(df_between, df_within).ok()?;
    Some((1.0 - dist.cdf(f)).clamp(0.0, 1.0))
}

/// Pooled-variance t statistic and two-sided p-value. A zero standard error
/// yields `t = 0, p = 1`.
pub fn pooled_t_test(a: &[f64], b: &[f64]) -> Option<(f64, f64)> {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    if a.is_empty() || b.is_empty() || n1 + n2 <= 2.0 {
        return None;
    }
    let df = n1 + n2 - 2.0;
    let pooled = ((n1 - 1.0) * numeric::sample_variance(a)
        + (n2 - 1.0) * numeric::sample_variance(b))
        / df;
    let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    if se == 0.0 {
        return Some((0.0, 1.0));
    }
    let t = (numeric::mean(a) - numeric::mean(b)) / se;
    Some((t, two_sided_t_p_value(t, df)?))
}

/// Pearson r with its two-sided p-value.
pub fn pearson_test(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    let r = numeric::pearson(x, y);
    if r.abs() >= 1.0 {
        return Some((r, 0.0));
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    Some((r, two_sided_t_p_value(t, df)?))
}

/// One-way ANOVA F statistic and p-value. Zero within-group variance
/// yields `F = 0, p = 1`.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Option<(f64, f64)> {
    let k = groups.len();
    let n: usize = groups.iter().map(Vec::len).sum();
    if k < 2 || n <= k || groups.iter().any(Vec::is_empty) {
        return None;
    }
    let all: Vec<f64> = groups.iter().flatten().copied().collect();
    let grand = numeric::mean(&all);
    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (numeric::mean(g) - grand).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .map(|g| {
            let m = numeric::mean(g);
            g.iter().map(|v| (v - m).powi(2)).sum::<f64>()
        })
        .sum();
    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let ms_within = ss_within / df_within;
    if ms_within == 0.0 {
        return Some((0.0, 1.0));
    }
    let f = (ss_between / df_between) / ms_within;
    Some((f, f_p_value(f, df_between, df_within)?))
}

pub struct StatisticalAnalyzer<'a> {
    table: &'a CleanedTable,
}

impl<'a> StatisticalAnalyzer<'a> {
    pub fn new(table: &'a CleanedTable) -> Self {
        Self { table }
    }

    /// Non-missing values of a numeric column; `None` when the column is
    /// absent or empty.
    fn column_values(&self, column: NumericColumn) -> Option<Vec<f64>> {
        if !self.table.has(column.column()) {
            return None;
        }
        let values: Vec<f64> = self
            .table
            .records
            .iter()
            .filter_map(|t| column.value(t))
            .collect();
        (!values.is_empty()).then_some(values)
    }

    pub fn descriptive(&self) -> BTreeMap<String, DescriptiveStats> {
        NumericColumn::ALL
            .into_iter()
            .filter_map(|c| {
                self.column_values(c)
                    .map(|v| (c.name().to_string(), DescriptiveStats::of(&v)))
            })
            .collect()
    }

    /// Pairwise-complete Pearson matrix over the numeric columns present.
    pub fn correlation(&self) -> Option<CorrelationMatrix> {
        let columns: Vec<NumericColumn> = NumericColumn::ALL
            .into_iter()
            .filter(|c| self.column_values(*c).is_some())
            .collect();
        if columns.len() < 2 {
            return None;
        }
        let values = columns
            .iter()
            .map(|a| {
                columns
                    .iter()
                    .map(|b| {
                        if a == b {
                            return 1.0;
                        }
                        let (x, y): (Vec<f64>, Vec<f64>) = self
                            .table
                            .records
                            .iter()
                            .filter_map(|t| a.value(t).zip(b.value(t)))
                            .unzip();
                        numeric::pearson(&x, &y)
                    })
                    .collect()
            })
            .collect();
        Some(CorrelationMatrix {
            columns: columns.iter().map(|c| c.name().to_string()).collect(),
            values,
        })
    }

    pub fn hypothesis_tests(&self) -> HypothesisTests {
        let records = &self.table.records;
        let mut tests = HypothesisTests::default();

        if self.table.has(Column::Gender) {
            let spending = |gender: &str| -> Vec<f64> {
                records
                    .iter()
                    .filter(|t| t.gender.as_deref() == Some(gender))
                    .map(|t| t.total_amount)
                    .collect()
            };
            let male = spending("Male");
            let female = spending("Female");
            match pooled_t_test(&male, &female) {
                Some((t_statistic, p_value)) => {
                    tests.gender_spending_difference = Some(TTestResult {
                        test: "Independent t-test".into(),
                        null_hypothesis: "No difference in spending between genders".into(),
                        t_statistic,
                        p_value,
                        significant: p_value < SIGNIFICANCE_LEVEL,
                        male_mean: numeric::mean(&male),
                        female_mean: numeric::mean(&female),
                    })
                }
                None => debug!("Not enough Male/Female transactions for a t-test"),
            }
        }

        if self.table.has(Column::Age) {
            let (ages, amounts): (Vec<f64>, Vec<f64>) = records
                .iter()
                .filter_map(|t| t.age.map(|a| (a, t.total_amount)))
                .unzip();
            if let Some((r, p_value)) = pearson_test(&ages, &amounts) {
                tests.age_spending_correlation = Some(CorrelationTestResult {
                    test: "Pearson correlation".into(),
                    null_hypothesis: "No correlation between age and spending".into(),
                    correlation_coefficient: r,
                    p_value,
                    significant: p_value < SIGNIFICANCE_LEVEL,
                });
            }
        }

        if self.table.has(Column::ProductCategory) {
            let mut categories: Vec<String> = Vec::new();
            let mut groups: Vec<Vec<f64>> = Vec::new();
            for t in records {
                let Some(category) = t.product_category.as_deref() else {
                    continue;
                };
                match categories.iter().position(|c| c == category) {
                    Some(i) => groups[i].push(t.total_amount),
                    None => {
                        categories.push(category.to_string());
                        groups.push(vec![t.total_amount]);
                    }
                }
            }
            if let Some((f_statistic, p_value)) = one_way_anova(&groups) {
                tests.category_spending_anova = Some(AnovaResult {
                    test: "One-way ANOVA".into(),
                    null_hypothesis: "No difference in spending across product categories".into(),
                    f_statistic,
                    p_value,
                    significant: p_value < SIGNIFICANCE_LEVEL,
                    categories_tested: categories,
                });
            }
        }

        tests
    }

    pub fn outliers(&self) -> BTreeMap<String, OutlierSummary> {
        NumericColumn::ALL
            .into_iter()
            .filter_map(|c| {
                self.column_values(c)
                    .map(|v| (c.name().to_string(), outlier_summary(&v)))
            })
            .collect()
    }

    pub fn categorical(&self) -> BTreeMap<String, CategoricalSummary> {
        CategoricalColumn::ALL
            .into_iter()
            .filter(|c| self.table.has(c.source()))
            .filter_map(|c| {
                let counts =
                    ValueCount::tally(self.table.records.iter().filter_map(|t| c.value(t)));
                categorical_summary(counts).map(|s| (c.name().to_string(), s))
            })
            .collect()
    }

    /// Percentile-cut spend tiers with edges `[0, p33, p67, max]`.
    pub fn customer_segments(&self) -> Vec<SpendSegmentSummary> {
        let aggregates = customer_aggregates(&self.table.records);
        let spent: Vec<f64> = aggregates.iter().map(|a| a.total_spent).collect();
        let edges = [
            0.0,
            numeric::quantile(&spent, 0.33),
            numeric::quantile(&spent, 0.67),
            numeric::max(&spent),
        ];
        let Some(bins) = numeric::cut(&spent, &edges) else {
            debug!(?edges, "Spend percentile edges are not increasing; no segments");
            return Vec::new();
        };

        ValueTier::RANKED
            .into_iter()
            .enumerate()
            .filter_map(|(idx, segment)| {
                let members: Vec<_> = aggregates
                    .iter()
                    .zip(&bins)
                    .filter(|(_, bin)| **bin == Some(idx))
                    .map(|(a, _)| a)
                    .collect();
                if members.is_empty() {
                    return None;
                }
                let spent: Vec<f64> = members.iter().map(|a| a.total_spent).collect();
                let avg_values: Vec<f64> = members.iter().map(|a| a.avg_transaction).collect();
                let counts: Vec<f64> = members
                    .iter()
                    .map(|a| a.transaction_count as f64)
                    .collect();
                Some(SpendSegmentSummary {
                    segment,
                    customer_count: members.len(),
                    avg_total_spent: numeric::mean(&spent),
                    avg_transaction_value: numeric::mean(&avg_values),
                    avg_transaction_count: numeric::mean(&counts),
                    total_revenue: numeric::sum(&spent),
                })
            })
            .collect()
    }

    pub fn insights(
        descriptive: &BTreeMap<String, DescriptiveStats>,
        tests: &HypothesisTests,
        categorical: &BTreeMap<String, CategoricalSummary>,
        segments: &[SpendSegmentSummary],
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        if let Some(amount) = descriptive.get(NumericColumn::TotalAmount.name()) {
            insights.push(Insight::new(
                "Revenue",
                format!(
                    "Average transaction value is ${:.2} with high variability (std: ${:.2})",
                    amount.mean, amount.std
                ),
                "Focus on increasing transaction consistency and targeting high-value customers",
            ));
        }

        if let Some(gender) = tests
            .gender_spending_difference
            .as_ref()
            .filter(|t| t.significant)
        {
            let higher = if gender.male_mean > gender.female_mean {
                "Male"
            } else {
                "Female"
            };
            insights.push(Insight::new(
                "Demographics",
                format!("{higher} customers spend significantly more on average"),
                format!("Develop targeted marketing strategies for {higher} customer segment"),
            ));
        }

        if let Some(top) = categorical
            .get(CategoricalColumn::ProductCategory.name())
            .and_then(|c| c.value_counts.first())
        {
            insights.push(Insight::new(
                "Products",
                format!("{} is the most popular product category", top.value),
                format!("Invest in expanding {} product lines and inventory", top.value),
            ));
        }

        if let Some(high) = segments.iter().find(|s| s.segment == ValueTier::High) {
            let total: usize = segments.iter().map(|s| s.customer_count).sum();
            let share = numeric::percentage(high.customer_count as f64, total as f64);
            insights.push(Insight::new(
                "Customer Loyalty",
                format!(
                    "High-value customers represent {share:.1}% of customer base but drive significant revenue"
                ),
                "Implement VIP loyalty programs to retain high-value customers",
            ));
        }

        insights
    }

    pub fn run(&self) -> StatisticsReport {
        info!("Running statistical analysis");
        let descriptive = self.descriptive();
        let correlation = self.correlation();
        let hypothesis_tests = self.hypothesis_tests();
        let outliers = self.outliers();
        let categorical = self.categorical();
        let customer_segments = self.customer_segments();
        let business_insights =
            Self::insights(&descriptive, &hypothesis_tests, &categorical, &customer_segments);
        info!(
            "Statistical analysis complete: {} numeric columns, {} insights",
            descriptive.len(),
            business_insights.len()
        );
        StatisticsReport {
            descriptive,
            correlation,
            hypothesis_tests,
            outliers,
            categorical,
            customer_segments,
            business_insights,
        }
    }
}

fn outlier_summary(values: &[f64]) -> OutlierSummary {
    let n = values.len() as f64;
    let q1 = numeric::quantile(values, 0.25);
    let q3 = numeric::quantile(values, 0.75);
    let iqr = q3 - q1;
    let lower_bound = q1 - IQR_FENCE * iqr;
    let upper_bound = q3 + IQR_FENCE * iqr;
    let iqr_count = values
        .iter()
        .filter(|v| **v < lower_bound || **v > upper_bound)
        .count();

    let mean = numeric::mean(values);
    let std = numeric::population_std(values);
    let z_count = if std == 0.0 {
        0
    } else {
        values
            .iter()
            .filter(|v| ((**v - mean) / std).abs() > Z_SCORE_THRESHOLD)
            .count()
    };

    OutlierSummary {
        iqr_method: IqrOutliers {
            lower_bound,
            upper_bound,
            outlier_count: iqr_count,
            outlier_percentage: numeric::percentage(iqr_count as f64, n),
        },
        zscore_method: ZScoreOutliers {
            outlier_count: z_count,
            outlier_percentage: numeric::percentage(z_count as f64, n),
        },
    }
}

fn categorical_summary(counts: Vec<ValueCount>) -> Option<CategoricalSummary> {
    let mode = counts.first()?.value.clone();
    let total: usize = counts.iter().map(|c| c.count).sum();
    let proportions: Vec<ValueProportion> = counts
        .iter()
        .map(|c| ValueProportion {
            value: c.value.clone(),
            proportion: numeric::ratio(c.count as f64, total as f64),
        })
        .collect();
    let shares: Vec<f64> = proportions.iter().map(|p| p.proportion).collect();
    Some(CategoricalSummary {
        unique_values: counts.len(),
        entropy: numeric::shannon_entropy(&shares),
        value_counts: counts,
        proportions,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{table, txn, txn_for};

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn mixed_table() -> CleanedTable {
        table(vec![
            txn_for("C1", "Male", 22.0, "2023-01-01", "Beauty", 100.0),
            txn_for("C2", "Female", 35.0, "2023-01-02", "Clothing", 300.0),
            txn_for("C3", "Male", 41.0, "2023-01-03", "Electronics", 500.0),
            txn_for("C4", "Female", 58.0, "2023-01-04", "Clothing", 50.0),
            txn_for("C5", "Male", 29.0, "2023-01-05", "Beauty", 1000.0),
            txn_for("C1", "Male", 22.0, "2023-01-06", "Electronics", 25.0),
        ])
    }

    #[test]
    fn test_descriptive_stats() {
        let stats = DescriptiveStats::of(&[1.0, 2.0, 3.0, 4.0, 10.0]);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.mode, Some(1.0));
        assert!(close(stats.variance, 12.5, 1e-9));
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.iqr, 2.0);
        assert!(close(stats.skewness, 1.697056, 1e-5));
    }

    #[test]
    fn test_correlation_matrix_symmetric_unit_diagonal() {
        let t = mixed_table();
        let matrix = StatisticalAnalyzer::new(&t).correlation().unwrap();
        assert_eq!(matrix.columns.len(), 4);
        for i in 0..4 {
            assert_eq!(matrix.values[i][i], 1.0);
            for j in 0..4 {
                assert!(close(matrix.values[i][j], matrix.values[j][i], 1e-12));
                assert!(matrix.values[i][j].abs() <= 1.0);
            }
        }
        // Price equals amount in these fixtures.
        assert!(close(
            matrix.get("Price_per_Unit", "Total_Amount").unwrap(),
            1.0,
            1e-9
        ));
    }

    #[test]
    fn test_pooled_t_test() {
        let (t, p) = pooled_t_test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!(close(t, -3.674235, 1e-5));
        assert!(p > 0.02 && p < 0.025);
        assert!(pooled_t_test(&[1.0], &[]).is_none());
        assert_eq!(pooled_t_test(&[2.0, 2.0], &[2.0, 2.0]), Some((0.0, 1.0)));
    }

    #[test]
    fn test_anova_matches_t_test_for_two_groups() {
        let (f, p) = one_way_anova(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let (t, p_t) = pooled_t_test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!(close(f, 13.5, 1e-9));
        assert!(close(f, t * t, 1e-9));
        assert!(close(p, p_t, 1e-6));
        assert!(one_way_anova(&[vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn test_pearson_test_perfect_line() {
        let (r, p) = pearson_test(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!(close(r, 1.0, 1e-12));
        assert_eq!(p, 0.0);
        assert!(pearson_test(&[1.0, 2.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_hypothesis_tests_cover_all_three() {
        let t = mixed_table();
        let tests = StatisticalAnalyzer::new(&t).hypothesis_tests();
        let gender = tests.gender_spending_difference.unwrap();
        assert!(close(gender.male_mean, 406.25, 1e-9));
        assert!(close(gender.female_mean, 175.0, 1e-9));
        assert_eq!(gender.significant, gender.p_value < 0.05);
        assert!(tests.age_spending_correlation.is_some());
        let anova = tests.category_spending_anova.unwrap();
        assert_eq!(anova.categories_tested, vec!["Beauty", "Clothing", "Electronics"]);
    }

    #[test]
    fn test_outliers_iqr_and_zscore() {
        let mut values = vec![10.0; 10];
        values.push(1000.0);
        let summary = outlier_summary(&values);
        assert_eq!(summary.iqr_method.lower_bound, 10.0);
        assert_eq!(summary.iqr_method.upper_bound, 10.0);
        assert_eq!(summary.iqr_method.outlier_count, 1);
        assert_eq!(summary.zscore_method.outlier_count, 1);
        assert!(close(summary.zscore_method.outlier_percentage, 100.0 / 11.0, 1e-9));

        let flat = outlier_summary(&[5.0, 5.0, 5.0]);
        assert_eq!(flat.zscore_method.outlier_count, 0);
    }

    #[test]
    fn test_categorical_entropy_and_mode() {
        let t = mixed_table();
        let categorical = StatisticalAnalyzer::new(&t).categorical();
        let gender = &categorical["Gender"];
        assert_eq!(gender.mode, "Male");
        assert_eq!(gender.unique_values, 2);
        // Male 4/6, Female 2/6.
        assert!(close(gender.entropy, 0.918296, 1e-5));
        let age = &categorical["Age_Group"];
        assert_eq!(age.value_counts[0].value, "18-25");
    }

    #[test]
    fn test_percentile_segments_split_two_customers() {
        let t = table(
            (1..=10)
                .map(|i| {
                    let customer = if i % 2 == 1 { "A" } else { "B" };
                    txn(customer, &format!("2023-01-{i:02}"), "Beauty", i as f64 * 10.0)
                })
                .collect(),
        );
        let segments = StatisticalAnalyzer::new(&t).customer_segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].segment, ValueTier::Low);
        assert_eq!(segments[0].total_revenue, 250.0);
        assert_eq!(segments[1].segment, ValueTier::High);
        assert_eq!(segments[1].total_revenue, 300.0);
    }

    #[test]
    fn test_insights_report_revenue_and_top_category() {
        let t = mixed_table();
        let report = StatisticalAnalyzer::new(&t).run();
        let first = &report.business_insights[0];
        assert_eq!(first.category, "Revenue");
        assert!(first.insight.starts_with("Average transaction value is $329.17"));
        assert!(report
            .business_insights
            .iter()
            .any(|i| i.insight == "Beauty is the most popular product category"));
    }
}
