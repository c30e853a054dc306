//! Synthetic data generator for the retail transaction dataset
//!
//! Generates transactions for a fixed pool of customers, each with a stable
//! gender and age, spread over a date window. Optional duplicate rows and
//! blanked cells exercise the cleaner.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --records <N>          Transactions to generate (default: 1000)
//!   --customers <N>        Size of the customer pool (default: 400)
//!   --duplicate-rate <F>   Probability of repeating a row verbatim (default: 0.0)
//!   --missing-rate <F>     Probability of blanking one optional cell (default: 0.0)
//!   --seed <N>             Random seed for reproducibility (optional)
//!   --output <PATH>        Output CSV path (default: data/retail_sales_dataset.csv)

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use csv::WriterBuilder;
use rand::prelude::*;
use rand::rngs::StdRng;
use retail_eda::models::CsvRecord;
use std::path::PathBuf;

const CATEGORIES: [&str; 3] = ["Beauty", "Clothing", "Electronics"];
const PRICE_POINTS: [f64; 5] = [25.0, 30.0, 50.0, 300.0, 500.0];
const GENDERS: [&str; 2] = ["Male", "Female"];

/// Synthetic data generator for retail transactions
#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate a synthetic retail transaction CSV")]
struct Args {
    /// Number of transactions to generate
    #[arg(long, default_value = "1000")]
    records: usize,

    /// Number of distinct customers
    #[arg(long, default_value = "400")]
    customers: usize,

    /// First transaction date (YYYY-MM-DD)
    #[arg(long, default_value = "2023-01-01")]
    start_date: NaiveDate,

    /// Length of the date window in days
    #[arg(long, default_value = "365")]
    days: i64,

    /// Probability of writing a row twice (0.0 - 1.0)
    #[arg(long, default_value = "0.0")]
    duplicate_rate: f64,

    /// Probability of blanking one optional cell in a row (0.0 - 1.0)
    #[arg(long, default_value = "0.0")]
    missing_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = "data/retail_sales_dataset.csv")]
    output: PathBuf,
}

/// Stable attributes of one synthetic customer.
struct Customer {
    id: String,
    gender: &'static str,
    age: u32,
}

fn customer_pool(size: usize, rng: &mut impl Rng) -> Vec<Customer> {
    (1..=size)
        .map(|i| Customer {
            id: format!("CUST{:03}", i),
            gender: GENDERS[rng.gen_range(0..GENDERS.len())],
            age: rng.gen_range(18..=64),
        })
        .collect()
}

fn generate_record(
    index: usize,
    customer: &Customer,
    args: &Args,
    rng: &mut impl Rng,
) -> CsvRecord {
    let date = args.start_date + Duration::days(rng.gen_range(0..args.days));
    let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
    let quantity = rng.gen_range(1..=4) as f64;
    let price = *PRICE_POINTS.choose(rng).unwrap_or(&PRICE_POINTS[0]);

    CsvRecord {
        transaction_id: Some((index + 1).to_string()),
        date: Some(date.format("%Y-%m-%d").to_string()),
        customer_id: Some(customer.id.clone()),
        gender: Some(customer.gender.to_string()),
        age: Some(customer.age as f64),
        product_category: Some(category.to_string()),
        quantity: Some(quantity),
        price_per_unit: Some(price),
        total_amount: Some(quantity * price),
    }
}

/// Blank one optional cell. Core columns are left intact.
fn blank_optional_cell(record: &mut CsvRecord, rng: &mut impl Rng) {
    match rng.gen_range(0..5) {
        0 => record.gender = None,
        1 => record.age = None,
        2 => record.product_category = None,
        3 => record.quantity = None,
        _ => record.price_per_unit = None,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.customers == 0 || args.days <= 0 {
        bail!("--customers and --days must be positive");
    }

    println!("🔧 Synthetic Retail Data Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Output:           {}", args.output.display());
    println!("Records:          {}", args.records);
    println!("Customers:        {}", args.customers);
    println!("Date window:      {} + {} days", args.start_date, args.days);
    println!("Duplicate rate:   {:.1}%", args.duplicate_rate * 100.0);
    println!("Missing rate:     {:.1}%", args.missing_rate * 100.0);
    if let Some(seed) = args.seed {
        println!("Random seed:      {}", seed);
    }
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let customers = customer_pool(args.customers, &mut rng);
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(&args.output)
        .with_context(|| format!("failed to open {}", args.output.display()))?;

    let mut written = 0;
    let mut duplicates = 0;
    let mut blanked = 0;
    for i in 0..args.records {
        let customer = &customers[rng.gen_range(0..customers.len())];
        let mut record = generate_record(i, customer, &args, &mut rng);
        if rng.gen::<f64>() < args.missing_rate {
            blank_optional_cell(&mut record, &mut rng);
            blanked += 1;
        }
        writer.serialize(&record)?;
        written += 1;

        if rng.gen::<f64>() < args.duplicate_rate {
            writer.serialize(&record)?;
            written += 1;
            duplicates += 1;
        }
    }
    writer.flush()?;

    println!("✅ Generation complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Rows written:      {:>8}", written);
    println!("Duplicate rows:    {:>8}", duplicates);
    println!("Rows with blanks:  {:>8}", blanked);
    println!("Output file:       {}", args.output.display());

    Ok(())
}
