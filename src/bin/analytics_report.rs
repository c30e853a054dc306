//! Retail Analytics Report - What is happening in the store?
//! Console walk-through of every analysis section
//!
//! Run: ./target/release/analytics_report [section] [--input PATH]
//! Sections: all, quality, stats, time, customers, recommendations

use anyhow::{bail, Result};
use clap::Parser;
use retail_eda::dashboard::{format_count, format_currency};
use retail_eda::loader;
use retail_eda::models::FrequencyTier;
use retail_eda::pipeline::{Pipeline, PipelineResults};
use retail_eda::PipelineConfig;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "analytics_report")]
#[command(about = "Print a sectioned analysis report for a retail transaction CSV")]
struct Args {
    /// Section to print: all, quality, stats, time, customers, recommendations
    #[arg(default_value = "all")]
    section: String,

    /// Input transaction CSV
    #[arg(long, env = "RETAIL_EDA_INPUT", default_value = "data/retail_sales_dataset.csv")]
    input: PathBuf,
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(80));
    println!("  {}", title);
    println!("{}\n", "═".repeat(80));
}

fn verdict(significant: bool) -> &'static str {
    if significant {
        "significant"
    } else {
        "-"
    }
}

fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(70));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let sections = ["all", "quality", "stats", "time", "customers", "recommendations"];
    if !sections.contains(&args.section.as_str()) {
        bail!("Unknown section: {} (available: {})", args.section, sections.join(", "));
    }

    let raw = loader::load(&args.input)?;
    let pipeline = Pipeline::new(PipelineConfig {
        input_path: args.input.clone(),
        ..Default::default()
    });
    let (_, results) = pipeline.analyze(&raw)?;

    println!("\n{}", "█".repeat(80));
    println!("{}  RETAIL ANALYTICS - What is Happening?  {}", "█".repeat(18), "█".repeat(20));
    println!("{}\n", "█".repeat(80));

    match args.section.as_str() {
        "all" => {
            quality_section(&results);
            stats_section(&results);
            time_section(&results);
            customer_section(&results);
            recommendation_section(&results);
        }
        "quality" => quality_section(&results),
        "stats" => stats_section(&results),
        "time" => time_section(&results),
        "customers" => customer_section(&results),
        _ => recommendation_section(&results),
    }

    println!("\n{}", "█".repeat(80));
    Ok(())
}

fn quality_section(results: &PipelineResults) {
    print_section_header("1. DATA QUALITY");

    let quality = &results.data_quality;
    let cleaning = &results.cleaning;
    println!("  Raw Records:          {:>12}", format_count(quality.total_records));
    println!("  Duplicate Records:    {:>12}", quality.duplicate_records);
    println!("  Negative Values:      {:>12}", quality.negative_values);
    println!("  Date Format Errors:   {:>12}", quality.date_format_errors);
    println!("  Clean Records:        {:>12}", format_count(cleaning.final_records));

    print_subsection("Missing Values by Column");
    for (column, missing) in &quality.missing_values {
        println!("  {:20} {:>8}", column, missing);
    }

    let info = &results.data_summary.basic_info;
    print_subsection("Dataset Overview");
    println!("  Customers:            {:>12}", format_count(info.total_customers));
    println!("  Product Categories:   {:>12}", info.product_categories);
    println!("  Total Revenue:        {:>12}", format_currency(info.total_revenue));
    if let Some(range) = &info.date_range {
        println!("  Date Range:           {} to {}", range.start, range.end);
    }
}

fn stats_section(results: &PipelineResults) {
    print_section_header("2. STATISTICAL ANALYSIS");
    let stats = &results.statistics;

    print_subsection("Descriptive Statistics");
    println!("  {:16} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10}",
             "Column", "Count", "Mean", "Median", "Std", "Min", "Max");
    println!("  {}", "─".repeat(78));
    for (column, d) in &stats.descriptive {
        println!("  {:16} {:>8} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
                 column, d.count, d.mean, d.median, d.std, d.min, d.max);
    }

    print_subsection("Hypothesis Tests (α = 0.05)");
    let tests = &stats.hypothesis_tests;
    if let Some(t) = &tests.gender_spending_difference {
        println!(
            "  {:32} t = {:>8.3}  p = {:.4}  {}",
            t.test,
            t.t_statistic,
            t.p_value,
            verdict(t.significant)
        );
    }
    if let Some(c) = &tests.age_spending_correlation {
        println!(
            "  {:32} r = {:>8.3}  p = {:.4}  {}",
            c.test,
            c.correlation_coefficient,
            c.p_value,
            verdict(c.significant)
        );
    }
    if let Some(a) = &tests.category_spending_anova {
        println!(
            "  {:32} F = {:>8.3}  p = {:.4}  {}",
            a.test,
            a.f_statistic,
            a.p_value,
            verdict(a.significant)
        );
    }

    print_subsection("Outliers");
    println!(
        "  {:16} {:>12} {:>10} {:>12} {:>10}",
        "Column", "IQR Count", "IQR %", "Z Count", "Z %"
    );
    println!("  {}", "─".repeat(64));
    for (column, o) in &stats.outliers {
        println!("  {:16} {:>12} {:>9.1}% {:>12} {:>9.1}%",
                 column, o.iqr_method.outlier_count, o.iqr_method.outlier_percentage,
                 o.zscore_method.outlier_count, o.zscore_method.outlier_percentage);
    }

    print_subsection("Categorical Columns");
    for (column, c) in &stats.categorical {
        println!("  {:16} {:>3} values  mode {:12} entropy {:.3} bits",
                 column, c.unique_values, c.mode, c.entropy);
    }

    print_subsection("Spend Segments (percentile cut)");
    for s in &stats.customer_segments {
        println!("  {:14} {:>6} customers  avg {:>12}  revenue {:>14}",
                 s.segment.label(), s.customer_count, format_currency(s.avg_total_spent),
                 format_currency(s.total_revenue));
    }
}

fn time_section(results: &PipelineResults) {
    print_section_header("3. TIME SERIES");
    let ts = &results.time_series;

    if let Some(daily) = &ts.daily_analysis {
        let s = &daily.statistics;
        print_subsection("Daily Revenue");
        println!("  Days Observed:        {:>12}", s.total_days);
        println!("  Avg Daily Revenue:    {:>12}", format_currency(s.avg_daily_revenue));
        println!("  Volatility (CV):      {:>11.1}%", s.revenue_cv());
        println!(
            "  Best Day:             {} ({})",
            s.best_day.date,
            format_currency(s.best_day.revenue)
        );
        println!(
            "  Worst Day:            {} ({})",
            s.worst_day.date,
            format_currency(s.worst_day.revenue)
        );
    }

    if let Some(weekly) = &ts.weekly_patterns {
        print_subsection("Day of Week");
        println!("  {:12} {:>14} {:>10} {:>12}", "Day", "Revenue", "Txns", "Avg Ticket");
        println!("  {}", "─".repeat(52));
        for d in &weekly.day_of_week_data {
            println!("  {:12} {:>14} {:>10} {:>12.2}",
                     d.day, format_currency(d.revenue), d.transactions, d.avg_transaction);
        }
    }

    if let Some(monthly) = &ts.monthly_trends {
        print_subsection("Monthly Revenue");
        for m in &monthly.chart_data {
            println!(
                "  {:16} {:>14} {:>8} txns",
                m.month_name,
                format_currency(m.revenue),
                m.transactions
            );
        }
        println!("  Avg MoM Growth:       {:>+11.1}%", monthly.statistics.revenue_growth_rate);
    }

    if let Some(seasonal) = &ts.seasonal_analysis {
        print_subsection("Seasons");
        for s in &seasonal.chart_data {
            println!("  {:8} {:>14}", s.season.name(), format_currency(s.revenue));
        }
    }

    if let Some(trend) = &ts.trend_analysis {
        let s = &trend.statistics;
        print_subsection("Trend");
        println!("  Direction:            {:>12}", s.trend_direction.to_string());
        println!("  Slope (per day):      {:>+12.2}", s.trend_slope);
        println!("  Fit Quality (R²):     {:>12.3}", s.r_squared);
    }
}

fn customer_section(results: &PipelineResults) {
    print_section_header("4. CUSTOMERS & PRODUCTS");
    let cp = &results.customer_product;
    let s = &cp.customer_behavior.statistics;

    print_subsection("Customer Behavior");
    println!("  Customers:            {:>12}", format_count(s.total_customers));
    println!("  Avg Customer Value:   {:>12}", format_currency(s.avg_customer_value));
    println!("  Txns per Customer:    {:>12.2}", s.avg_transactions_per_customer);
    println!("  Retention Rate:       {:>11.1}%", s.customer_retention_rate);

    print_subsection("CLV Segments (equal-population tertiles)");
    for seg in &cp.customer_behavior.clv_segments {
        println!("  {:14} {:>6} customers ({:>5.1}%)  revenue {:>14}",
                 seg.segment.label(), seg.customer_count, seg.percentage,
                 format_currency(seg.total_revenue_contribution));
    }

    print_subsection("Purchase Frequency Tiers (quartiles)");
    let mut tiers: BTreeMap<FrequencyTier, usize> = BTreeMap::new();
    for profile in &cp.customer_behavior.customers {
        *tiers.entry(profile.frequency_segment).or_default() += 1;
    }
    for (tier, count) in &tiers {
        println!("  {:14} {:>6} customers", tier.label(), count);
    }

    if let Some(products) = &cp.product_performance {
        print_subsection("Category Performance");
        println!(
            "  {:16} {:>14} {:>8} {:>8} {:>6}",
            "Category", "Revenue", "Share", "Txns", "Rank"
        );
        println!("  {}", "─".repeat(56));
        for c in &products.chart_data {
            println!(
                "  {:16} {:>14} {:>7.1}% {:>8} {:>6}",
                c.category,
                format_currency(c.revenue),
                c.market_share,
                c.transactions,
                c.revenue_rank
            );
        }
    }

    if let Some(matrix) = &cp.customer_product_matrix {
        print_subsection("Cross-Selling Opportunities");
        for pair in &matrix.cross_selling_opportunities {
            println!(
                "  {:36} {:>6.1}%  ({} of {} customers)",
                pair.pair,
                pair.cross_sell_rate,
                pair.customers_bought_both,
                pair.base_category_customers
            );
        }
    }
}

fn recommendation_section(results: &PipelineResults) {
    print_section_header("5. RECOMMENDATIONS");
    let bundle = &results.recommendations;

    println!("  Total:                {:>12}", bundle.summary.total_recommendations);
    println!("  High Impact:          {:>12}", bundle.summary.high_impact_count);
    println!("  Critical:             {:>12}", bundle.summary.critical_count);

    print_subsection("Prioritized");
    for rec in &bundle.recommendations {
        println!(
            "  [{:>3}] {:40} {:9} {}",
            rec.priority,
            rec.title,
            rec.impact.to_string(),
            rec.timeline
        );
        println!("        {}", rec.description);
    }
}
