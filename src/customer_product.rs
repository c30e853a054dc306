//! Customer and product relationship analysis: per-customer aggregates and
//! value/frequency segments, category performance, the cross-sell matrix,
//! demographic breakdowns and purchase patterns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

use crate::loader::CleanedTable;
use crate::models::{
    AgeGroup, Column, FrequencyTier, Insight, PriceCategory, Transaction, ValueCount, ValueTier,
};
use crate::numeric::{self, round2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub customer_id: String,
    pub total_spent: f64,
    pub avg_transaction: f64,
    pub transaction_count: usize,
    pub total_quantity: f64,
    pub first_purchase: NaiveDate,
    pub last_purchase: NaiveDate,
    pub lifetime_days: i64,
    pub categories_purchased: usize,
}

impl CustomerAggregate {
    fn from_group(customer_id: &str, txns: &[&Transaction]) -> Option<Self> {
        let first_purchase = txns.iter().map(|t| t.date).min()?;
        let last_purchase = txns.iter().map(|t| t.date).max()?;
        let amounts: Vec<f64> = txns.iter().map(|t| t.total_amount).collect();
        Some(Self {
            customer_id: customer_id.to_string(),
            total_spent: round2(numeric::sum(&amounts)),
            avg_transaction: round2(numeric::mean(&amounts)),
            transaction_count: txns.len(),
            total_quantity: round2(txns.iter().filter_map(|t| t.quantity).sum()),
            first_purchase,
            last_purchase,
            lifetime_days: (last_purchase - first_purchase).num_days(),
            categories_purchased: txns
                .iter()
                .filter_map(|t| t.product_category.as_deref())
                .collect::<HashSet<_>>()
                .len(),
        })
    }
}

/// One aggregate per customer, ordered by customer id.
pub fn customer_aggregates(records: &[Transaction]) -> Vec<CustomerAggregate> {
    let mut groups: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for t in records {
        groups.entry(t.customer_id.as_str()).or_default().push(t);
    }
    groups
        .into_iter()
        .filter_map(|(id, txns)| CustomerAggregate::from_group(id, &txns))
        .collect()
}

/// Equal-population spend tertiles; `Undefined` for everyone when the
/// tertile edges collapse.
pub fn clv_segments(aggregates: &[CustomerAggregate]) -> Vec<ValueTier> {
    let spent: Vec<f64> = aggregates.iter().map(|a| a.total_spent).collect();
    match numeric::qcut(&spent, 3) {
        Some(bins) => bins.into_iter().map(|i| ValueTier::RANKED[i]).collect(),
        None => {
            debug!("Spend tertile edges collapse; CLV segments undefined");
            vec![ValueTier::Undefined; aggregates.len()]
        }
    }
}

/// Transaction-count quartiles, defined only with at least four distinct
/// counts and non-collapsing edges.
pub fn frequency_segments(aggregates: &[CustomerAggregate]) -> Vec<FrequencyTier> {
    let counts: Vec<f64> = aggregates
        .iter()
        .map(|a| a.transaction_count as f64)
        .collect();
    let distinct = aggregates
        .iter()
        .map(|a| a.transaction_count)
        .collect::<HashSet<_>>()
        .len();
    let bins = if distinct >= FrequencyTier::RANKED.len() {
        numeric::qcut(&counts, FrequencyTier::RANKED.len())
    } else {
        None
    };
    match bins {
        Some(bins) => bins.into_iter().map(|i| FrequencyTier::RANKED[i]).collect(),
        None => vec![FrequencyTier::Undefined; aggregates.len()],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(flatten)]
    pub aggregate: CustomerAggregate,
    pub clv_segment: ValueTier,
    pub frequency_segment: FrequencyTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorStatistics {
    pub total_customers: usize,
    pub avg_customer_value: f64,
    pub avg_transactions_per_customer: f64,
    pub avg_customer_lifetime: f64,
    /// Percentage of customers with more than one transaction.
    pub customer_retention_rate: f64,
    pub avg_categories_per_customer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClvSegmentSummary {
    pub segment: ValueTier,
    pub customer_count: usize,
    pub percentage: f64,
    pub avg_total_spent: f64,
    pub avg_transaction_count: f64,
    pub total_revenue_contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCustomer {
    pub customer_id: String,
    pub total_spent: f64,
    pub transaction_count: usize,
    pub avg_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerBehavior {
    pub statistics: BehaviorStatistics,
    pub clv_segments: Vec<ClvSegmentSummary>,
    pub top_customers: Vec<TopCustomer>,
    pub customers: Vec<CustomerProfile>,
}

impl CustomerBehavior {
    pub fn segment(&self, tier: ValueTier) -> Option<&ClvSegmentSummary> {
        self.clv_segments.iter().find(|s| s.segment == tier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub revenue: f64,
    pub transactions: usize,
    pub total_quantity: f64,
    pub customers: usize,
    pub avg_price: f64,
    pub market_share: f64,
    pub avg_transaction: f64,
    pub revenue_rank: u32,
    pub quantity_rank: u32,
    pub customer_rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStatistics {
    pub total_categories: usize,
    pub best_performing_category: String,
    pub highest_avg_transaction: String,
    pub most_popular_category: String,
    pub premium_category: String,
    /// Largest single-category market share.
    pub revenue_concentration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub chart_data: Vec<CategoryPerformance>,
    pub statistics: ProductStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSellPair {
    pub pair: String,
    pub base_category: String,
    pub target_category: String,
    pub customers_bought_both: usize,
    /// Share of base-category buyers who also bought the target, 0..=100.
    pub cross_sell_rate: f64,
    pub base_category_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityStats {
    pub avg_categories_per_customer: f64,
    pub max_categories_per_customer: usize,
    pub customers_single_category: usize,
    pub customers_multi_category: usize,
    pub multi_category_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProductMatrix {
    pub cross_selling_opportunities: Vec<CrossSellPair>,
    pub customer_diversity: DiversityStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderProfile {
    pub gender: String,
    pub total_spent: f64,
    pub avg_transaction: f64,
    pub transaction_count: usize,
    pub customers: usize,
    pub top_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroupProfile {
    pub age_group: AgeGroup,
    pub total_spent: f64,
    pub avg_transaction: f64,
    pub transaction_count: usize,
    pub customers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub gender: Option<Vec<GenderProfile>>,
    pub age_groups: Option<Vec<AgeGroupProfile>>,
    /// Per gender, each category's share of that gender's revenue.
    pub product_preferences: Option<BTreeMap<String, BTreeMap<String, f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStats {
    pub avg_days_between_purchases: f64,
    pub median_days_between_purchases: f64,
    pub min_days_between_purchases: i64,
    pub max_days_between_purchases: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityShare {
    pub quantity: f64,
    pub transactions: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceShare {
    pub price_category: PriceCategory,
    pub transactions: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchasePatterns {
    pub purchase_intervals: Option<IntervalStats>,
    pub quantity_distribution: Option<Vec<QuantityShare>>,
    pub price_preferences: Option<Vec<PriceShare>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProductReport {
    pub customer_behavior: CustomerBehavior,
    pub product_performance: Option<ProductPerformance>,
    pub customer_product_matrix: Option<CustomerProductMatrix>,
    pub demographics: Demographics,
    pub purchase_patterns: PurchasePatterns,
    pub cp_insights: Vec<Insight>,
}

pub struct CustomerProductAnalyzer<'a> {
    table: &'a CleanedTable,
    top_customers: usize,
    top_pairs: usize,
}

impl<'a> CustomerProductAnalyzer<'a> {
    pub fn new(table: &'a CleanedTable) -> Self {
        Self {
            table,
            top_customers: 10,
            top_pairs: 5,
        }
    }

    pub fn with_limits(mut self, top_customers: usize, top_pairs: usize) -> Self {
        self.top_customers = top_customers;
        self.top_pairs = top_pairs;
        self
    }

    pub fn customer_behavior(&self) -> CustomerBehavior {
        let aggregates = customer_aggregates(&self.table.records);
        let clv = clv_segments(&aggregates);
        let frequency = frequency_segments(&aggregates);
        let total = aggregates.len() as f64;

        let spent: Vec<f64> = aggregates.iter().map(|a| a.total_spent).collect();
        let counts: Vec<f64> = aggregates
            .iter()
            .map(|a| a.transaction_count as f64)
            .collect();
        let lifetimes: Vec<f64> = aggregates.iter().map(|a| a.lifetime_days as f64).collect();
        let categories: Vec<f64> = aggregates
            .iter()
            .map(|a| a.categories_purchased as f64)
            .collect();
        let repeat = aggregates.iter().filter(|a| a.transaction_count > 1).count();

        let statistics = BehaviorStatistics {
            total_customers: aggregates.len(),
            avg_customer_value: numeric::mean(&spent),
            avg_transactions_per_customer: numeric::mean(&counts),
            avg_customer_lifetime: numeric::mean(&lifetimes),
            customer_retention_rate: numeric::percentage(repeat as f64, total),
            avg_categories_per_customer: numeric::mean(&categories),
        };

        let tiers = ValueTier::RANKED
            .into_iter()
            .chain(std::iter::once(ValueTier::Undefined));
        let clv_segments = tiers
            .filter_map(|tier| {
                let members: Vec<&CustomerAggregate> = aggregates
                    .iter()
                    .zip(&clv)
                    .filter(|(_, seg)| **seg == tier)
                    .map(|(a, _)| a)
                    .collect();
                if members.is_empty() {
                    return None;
                }
                let spent: Vec<f64> = members.iter().map(|a| a.total_spent).collect();
                let counts: Vec<f64> = members
                    .iter()
                    .map(|a| a.transaction_count as f64)
                    .collect();
                Some(ClvSegmentSummary {
                    segment: tier,
                    customer_count: members.len(),
                    percentage: numeric::percentage(members.len() as f64, total),
                    avg_total_spent: numeric::mean(&spent),
                    avg_transaction_count: numeric::mean(&counts),
                    total_revenue_contribution: numeric::sum(&spent),
                })
            })
            .collect();

        let mut ranked: Vec<&CustomerAggregate> = aggregates.iter().collect();
        ranked.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
        let top_customers = ranked
            .into_iter()
            .take(self.top_customers)
            .map(|a| TopCustomer {
                customer_id: a.customer_id.clone(),
                total_spent: a.total_spent,
                transaction_count: a.transaction_count,
                avg_transaction: a.avg_transaction,
            })
            .collect();

        let customers = aggregates
            .into_iter()
            .zip(clv)
            .zip(frequency)
            .map(|((aggregate, clv_segment), frequency_segment)| CustomerProfile {
                aggregate,
                clv_segment,
                frequency_segment,
            })
            .collect();

        CustomerBehavior {
            statistics,
            clv_segments,
            top_customers,
            customers,
        }
    }

    fn by_category(&self) -> BTreeMap<&'a str, Vec<&'a Transaction>> {
        let mut groups: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for t in &self.table.records {
            if let Some(category) = t.product_category.as_deref() {
                groups.entry(category).or_default().push(t);
            }
        }
        groups
    }

    pub fn product_performance(&self) -> Option<ProductPerformance> {
        if !self.table.has(Column::ProductCategory) {
            warn!("No product category column; skipping product performance");
            return None;
        }
        let groups = self.by_category();
        if groups.is_empty() {
            return None;
        }

        let mut rows: Vec<CategoryPerformance> = groups
            .iter()
            .map(|(category, txns)| {
                let amounts: Vec<f64> = txns.iter().map(|t| t.total_amount).collect();
                let prices: Vec<f64> = txns.iter().filter_map(|t| t.price_per_unit).collect();
                CategoryPerformance {
                    category: category.to_string(),
                    revenue: round2(numeric::sum(&amounts)),
                    transactions: txns.len(),
                    total_quantity: round2(txns.iter().filter_map(|t| t.quantity).sum()),
                    customers: txns
                        .iter()
                        .map(|t| t.customer_id.as_str())
                        .collect::<HashSet<_>>()
                        .len(),
                    avg_price: round2(numeric::mean(&prices)),
                    market_share: 0.0,
                    avg_transaction: round2(numeric::mean(&amounts)),
                    revenue_rank: 0,
                    quantity_rank: 0,
                    customer_rank: 0,
                }
            })
            .collect();

        let revenues: Vec<f64> = rows.iter().map(|r| r.revenue).collect();
        let quantities: Vec<f64> = rows.iter().map(|r| r.total_quantity).collect();
        let customers: Vec<f64> = rows.iter().map(|r| r.customers as f64).collect();
        let total_revenue = numeric::sum(&revenues);
        let revenue_ranks = numeric::dense_rank_desc(&revenues);
        let quantity_ranks = numeric::dense_rank_desc(&quantities);
        let customer_ranks = numeric::dense_rank_desc(&customers);
        for (i, row) in rows.iter_mut().enumerate() {
            row.market_share = round2(numeric::percentage(row.revenue, total_revenue));
            row.revenue_rank = revenue_ranks[i];
            row.quantity_rank = quantity_ranks[i];
            row.customer_rank = customer_ranks[i];
        }

        let name_of_max = |values: Vec<f64>| -> String {
            numeric::argmax(&values).map_or_else(String::new, |i| rows[i].category.clone())
        };
        let statistics = ProductStatistics {
            total_categories: rows.len(),
            best_performing_category: name_of_max(revenues),
            highest_avg_transaction: name_of_max(rows.iter().map(|r| r.avg_transaction).collect()),
            most_popular_category: name_of_max(
                rows.iter().map(|r| r.transactions as f64).collect(),
            ),
            premium_category: name_of_max(rows.iter().map(|r| r.avg_price).collect()),
            revenue_concentration: numeric::max(
                &rows.iter().map(|r| r.market_share).collect::<Vec<_>>(),
            ),
        };

        Some(ProductPerformance {
            chart_data: rows,
            statistics,
        })
    }

    /// Directional co-occurrence over the "ever purchased" customer x
    /// category matrix, plus per-customer category diversity.
    pub fn customer_product_matrix(&self) -> Option<CustomerProductMatrix> {
        if !self.table.has(Column::ProductCategory) {
            return None;
        }
        let mut purchased: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for t in &self.table.records {
            if let Some(category) = t.product_category.as_deref() {
                purchased
                    .entry(t.customer_id.as_str())
                    .or_default()
                    .insert(category);
            }
        }
        if purchased.is_empty() {
            return None;
        }
        let categories: Vec<&str> = purchased
            .values()
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut pairs = Vec::new();
        for (i, base) in categories.iter().enumerate() {
            let base_buyers: Vec<&BTreeSet<&str>> = purchased
                .values()
                .filter(|set| set.contains(*base))
                .collect();
            let base_count = base_buyers.len();
            if base_count == 0 {
                continue;
            }
            for target in &categories[i + 1..] {
                let both = base_buyers
                    .iter()
                    .filter(|set| set.contains(*target))
                    .count();
                pairs.push(CrossSellPair {
                    pair: format!("{base} → {target}"),
                    base_category: base.to_string(),
                    target_category: target.to_string(),
                    customers_bought_both: both,
                    cross_sell_rate: numeric::percentage(both as f64, base_count as f64),
                    base_category_customers: base_count,
                });
            }
        }
        pairs.sort_by(|a, b| b.cross_sell_rate.total_cmp(&a.cross_sell_rate));
        pairs.truncate(self.top_pairs);

        let diversity: Vec<usize> = purchased.values().map(BTreeSet::len).collect();
        let multi = diversity.iter().filter(|n| **n > 1).count();
        let customer_diversity = DiversityStats {
            avg_categories_per_customer: numeric::mean(
                &diversity.iter().map(|n| *n as f64).collect::<Vec<_>>(),
            ),
            max_categories_per_customer: diversity.iter().copied().max().unwrap_or(0),
            customers_single_category: diversity.iter().filter(|n| **n == 1).count(),
            customers_multi_category: multi,
            multi_category_rate: numeric::percentage(multi as f64, diversity.len() as f64),
        };

        Some(CustomerProductMatrix {
            cross_selling_opportunities: pairs,
            customer_diversity,
        })
    }

    pub fn demographics(&self) -> Demographics {
        let records = &self.table.records;
        let has_gender = self.table.has(Column::Gender);
        let has_category = self.table.has(Column::ProductCategory);

        let gender = has_gender.then(|| {
            let mut groups: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
            for t in records {
                if let Some(g) = t.gender.as_deref() {
                    groups.entry(g).or_default().push(t);
                }
            }
            groups
                .into_iter()
                .map(|(gender, txns)| {
                    let amounts: Vec<f64> = txns.iter().map(|t| t.total_amount).collect();
                    GenderProfile {
                        gender: gender.to_string(),
                        total_spent: round2(numeric::sum(&amounts)),
                        avg_transaction: round2(numeric::mean(&amounts)),
                        transaction_count: txns.len(),
                        customers: distinct_customers(&txns),
                        top_category: ValueCount::tally(
                            txns.iter().filter_map(|t| t.product_category.as_deref()),
                        )
                        .into_iter()
                        .next()
                        .map(|vc| vc.value),
                    }
                })
                .collect()
        });

        let age_groups = self.table.has(Column::Age).then(|| {
            let mut groups: BTreeMap<AgeGroup, Vec<&Transaction>> = BTreeMap::new();
            for t in records {
                if let Some(group) = t.age_group {
                    groups.entry(group).or_default().push(t);
                }
            }
            groups
                .into_iter()
                .map(|(age_group, txns)| {
                    let amounts: Vec<f64> = txns.iter().map(|t| t.total_amount).collect();
                    AgeGroupProfile {
                        age_group,
                        total_spent: round2(numeric::sum(&amounts)),
                        avg_transaction: round2(numeric::mean(&amounts)),
                        transaction_count: txns.len(),
                        customers: distinct_customers(&txns),
                    }
                })
                .collect()
        });

        let product_preferences = (has_gender && has_category).then(|| {
            let categories: BTreeSet<&str> = records
                .iter()
                .filter_map(|t| t.product_category.as_deref())
                .collect();
            let mut revenue: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
            for t in records {
                if let (Some(g), Some(c)) = (t.gender.as_deref(), t.product_category.as_deref()) {
                    *revenue.entry(g).or_default().entry(c).or_default() += t.total_amount;
                }
            }
            revenue
                .into_iter()
                .map(|(gender, by_category)| {
                    let total: f64 = by_category.values().sum();
                    let shares = categories
                        .iter()
                        .map(|c| {
                            let spent = by_category.get(c).copied().unwrap_or(0.0);
                            (c.to_string(), round2(numeric::percentage(spent, total)))
                        })
                        .collect();
                    (gender.to_string(), shares)
                })
                .collect()
        });

        Demographics {
            gender,
            age_groups,
            product_preferences,
        }
    }

    pub fn purchase_patterns(&self) -> PurchasePatterns {
        let records = &self.table.records;
        let total = records.len() as f64;

        // Customers in order of first appearance, purchases by date.
        let mut order: Vec<&str> = Vec::new();
        let mut dates: BTreeMap<&str, Vec<NaiveDate>> = BTreeMap::new();
        for t in records {
            let entry = dates.entry(t.customer_id.as_str()).or_insert_with(|| {
                order.push(t.customer_id.as_str());
                Vec::new()
            });
            entry.push(t.date);
        }
        let mut gaps: Vec<i64> = Vec::new();
        for customer in order {
            let mut days = dates.remove(customer).unwrap_or_default();
            days.sort();
            gaps.extend(days.windows(2).map(|w| (w[1] - w[0]).num_days()));
        }
        let purchase_intervals = (!gaps.is_empty()).then(|| {
            let as_f64: Vec<f64> = gaps.iter().map(|g| *g as f64).collect();
            IntervalStats {
                avg_days_between_purchases: numeric::mean(&as_f64),
                median_days_between_purchases: numeric::median(&as_f64),
                min_days_between_purchases: gaps.iter().copied().min().unwrap_or(0),
                max_days_between_purchases: gaps.iter().copied().max().unwrap_or(0),
            }
        });

        let quantity_distribution = self.table.has(Column::Quantity).then(|| {
            let quantities: Vec<f64> = records.iter().filter_map(|t| t.quantity).collect();
            let mut shares: Vec<QuantityShare> = Vec::new();
            for quantity in numeric::sorted(&quantities) {
                match shares.last_mut() {
                    Some(last) if last.quantity == quantity => last.transactions += 1,
                    _ => shares.push(QuantityShare {
                        quantity,
                        transactions: 1,
                        percentage: 0.0,
                    }),
                }
            }
            for share in &mut shares {
                share.percentage = numeric::percentage(share.transactions as f64, total);
            }
            shares
        });

        let price_preferences = self.table.has(Column::PricePerUnit).then(|| {
            let mut counts: BTreeMap<PriceCategory, usize> = BTreeMap::new();
            for category in records.iter().filter_map(|t| t.price_category) {
                *counts.entry(category).or_default() += 1;
            }
            let mut shares: Vec<PriceShare> = counts
                .into_iter()
                .map(|(price_category, n)| PriceShare {
                    price_category,
                    transactions: n,
                    percentage: numeric::percentage(n as f64, total),
                })
                .collect();
            shares.sort_by(|a, b| b.transactions.cmp(&a.transactions));
            shares
        });

        PurchasePatterns {
            purchase_intervals,
            quantity_distribution,
            price_preferences,
        }
    }

    pub fn insights(
        behavior: &CustomerBehavior,
        performance: Option<&ProductPerformance>,
        matrix: Option<&CustomerProductMatrix>,
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        let retention = behavior.statistics.customer_retention_rate;
        if retention < 50.0 {
            insights.push(Insight::new(
                "Customer Retention",
                format!("Customer retention rate is low at {retention:.1}%"),
                "Implement loyalty programs and personalized marketing to improve retention",
            ));
        }
        if let Some(high) = behavior.segment(ValueTier::High) {
            insights.push(Insight::new(
                "Customer Segmentation",
                format!(
                    "High-value customers represent {:.1}% of customer base",
                    high.percentage
                ),
                "Focus on retaining and expanding high-value customer relationships",
            ));
        }

        if let Some(perf) = performance {
            let concentration = perf.statistics.revenue_concentration;
            if concentration > 40.0 {
                insights.push(Insight::new(
                    "Product Portfolio",
                    format!(
                        "{} dominates with {:.1}% market share",
                        perf.statistics.best_performing_category, concentration
                    ),
                    "Diversify product portfolio to reduce dependency on single category",
                ));
            }
        }

        if let Some(best) = matrix.and_then(|m| m.cross_selling_opportunities.first()) {
            insights.push(Insight::new(
                "Cross-selling",
                format!(
                    "Best cross-selling opportunity: {} ({:.1}% rate)",
                    best.pair, best.cross_sell_rate
                ),
                "Develop targeted cross-selling campaigns for identified product pairs",
            ));
        }

        insights
    }

    pub fn run(&self) -> CustomerProductReport {
        info!("Running customer & product analysis");
        let customer_behavior = self.customer_behavior();
        let product_performance = self.product_performance();
        let customer_product_matrix = self.customer_product_matrix();
        let demographics = self.demographics();
        let purchase_patterns = self.purchase_patterns();
        let cp_insights = Self::insights(
            &customer_behavior,
            product_performance.as_ref(),
            customer_product_matrix.as_ref(),
        );
        info!(
            "Customer & product analysis complete: {} customers, {} insights",
            customer_behavior.statistics.total_customers,
            cp_insights.len()
        );
        CustomerProductReport {
            customer_behavior,
            product_performance,
            customer_product_matrix,
            demographics,
            purchase_patterns,
            cp_insights,
        }
    }
}

fn distinct_customers(txns: &[&Transaction]) -> usize {
    txns.iter()
        .map(|t| t.customer_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
