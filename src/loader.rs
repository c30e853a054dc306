//! Record store and cleaner.
//!
//! `load` reads the transaction CSV into a [`RawTable`], `validate` profiles
//! it, and `clean` produces the [`CleanedTable`] every analyzer reads from.

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{EdaError, Result};
use crate::models::{Column, CsvRecord, Transaction, ValueCount};
use crate::numeric;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const UNKNOWN: &str = "Unknown";

/// Columns present in the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet(BTreeSet<Column>);

impl ColumnSet {
    pub fn from_headers(headers: &StringRecord) -> Self {
        Self(headers.iter().filter_map(Column::from_header).collect())
    }

    pub fn all() -> Self {
        Self(Column::ALL.into_iter().collect())
    }

    pub fn has(&self, column: Column) -> bool {
        self.0.contains(&column)
    }

    pub fn iter(&self) -> impl Iterator<Item = Column> + '_ {
        self.0.iter().copied()
    }

    pub fn missing_required(&self) -> Vec<String> {
        Column::REQUIRED
            .into_iter()
            .filter(|c| !self.has(*c))
            .map(|c| c.header().to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub records: Vec<CsvRecord>,
    pub columns: ColumnSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub records: Vec<Transaction>,
    pub columns: ColumnSet,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.has(column)
    }

    pub fn total_revenue(&self) -> f64 {
        self.records.iter().map(|t| t.total_amount).sum()
    }

    pub fn unique_customers(&self) -> usize {
        self.records
            .iter()
            .map(|t| t.customer_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Back to the raw shape, keeping the column set.
    pub fn to_raw(&self) -> RawTable {
        RawTable {
            records: self.records.iter().map(Transaction::to_raw).collect(),
            columns: self.columns.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub total_records: usize,
    pub columns: Vec<String>,
    pub missing_values: BTreeMap<String, usize>,
    pub duplicate_records: usize,
    pub negative_values: usize,
    pub date_format_errors: usize,
}

/// Row accounting for one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub initial_records: usize,
    pub removed_duplicates: usize,
    pub invalid_dates: usize,
    pub missing_customer_ids: usize,
    pub missing_amounts: usize,
    pub final_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub total_records: usize,
    pub total_customers: usize,
    pub date_range: Option<DateRange>,
    pub product_categories: usize,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalDistributions {
    pub gender: Vec<ValueCount>,
    pub product_category: Vec<ValueCount>,
    pub age_group: Vec<ValueCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterSpread {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

impl CenterSpread {
    fn of(values: &[f64]) -> Self {
        Self {
            mean: numeric::mean(values),
            median: numeric::median(values),
            std: numeric::sample_std(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub basic_info: BasicInfo,
    pub categorical_distributions: CategoricalDistributions,
    pub numerical_statistics: BTreeMap<String, CenterSpread>,
}

pub fn load(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    info!("Reading transactions from {:?}", path);
    let file = File::open(path).map_err(|e| EdaError::io(path, e))?;
    let table = load_from_reader(file)?;
    info!("Data loaded: {} records", table.records.len());
    Ok(table)
}

/// Reads a transaction table from any CSV source. Missing core columns are
/// fatal; unknown columns are ignored.
pub fn load_from_reader<R: Read>(source: R) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source);

    let columns = ColumnSet::from_headers(reader.headers()?);
    let missing = columns.missing_required();
    if !missing.is_empty() {
        return Err(EdaError::MissingColumns(missing));
    }
    for column in Column::ALL.into_iter().filter(|c| !columns.has(*c)) {
        warn!("Optional column {} absent; dependent analyses will be skipped", column);
    }

    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<CsvRecord>, _>>()?;
    Ok(RawTable { records, columns })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

/// Identity of a raw row for exact-duplicate detection.
#[derive(PartialEq, Eq, Hash)]
struct RowKey<'a> {
    text: [Option<&'a str>; 5],
    numbers: [Option<u64>; 4],
}

impl<'a> RowKey<'a> {
    fn of(r: &'a CsvRecord) -> Self {
        Self {
            text: [
                r.transaction_id.as_deref(),
                r.date.as_deref(),
                r.customer_id.as_deref(),
                r.gender.as_deref(),
                r.product_category.as_deref(),
            ],
            numbers: [r.age, r.quantity, r.price_per_unit, r.total_amount]
                .map(|v| v.map(f64::to_bits)),
        }
    }
}

fn duplicate_flags(records: &[CsvRecord]) -> Vec<bool> {
    let mut seen = HashSet::new();
    records.iter().map(|r| !seen.insert(RowKey::of(r))).collect()
}

pub fn validate(raw: &RawTable) -> DataQualityReport {
    let records = &raw.records;
    let missing = |column: Column| -> usize {
        records
            .iter()
            .filter(|r| match column {
                Column::TransactionId => r.transaction_id.is_none(),
                Column::Date => r.date.is_none(),
                Column::CustomerId => r.customer_id.is_none(),
                Column::Gender => r.gender.is_none(),
                Column::Age => r.age.is_none(),
                Column::ProductCategory => r.product_category.is_none(),
                Column::Quantity => r.quantity.is_none(),
                Column::PricePerUnit => r.price_per_unit.is_none(),
                Column::TotalAmount => r.total_amount.is_none(),
            })
            .count()
    };

    let negative_values = records
        .iter()
        .flat_map(|r| [r.age, r.quantity, r.price_per_unit, r.total_amount])
        .flatten()
        .filter(|v| *v < 0.0)
        .count();

    let date_format_errors = records
        .iter()
        .filter(|r| r.date.as_deref().is_some_and(|d| parse_date(d).is_none()))
        .count();

    let report = DataQualityReport {
        total_records: records.len(),
        columns: raw.columns.iter().map(|c| c.header().to_string()).collect(),
        missing_values: raw
            .columns
            .iter()
            .map(|c| (c.header().to_string(), missing(c)))
            .collect(),
        duplicate_records: duplicate_flags(records).into_iter().filter(|d| *d).count(),
        negative_values,
        date_format_errors,
    };
    info!(
        "Validated {} records: {} duplicates, {} negative values, {} bad dates",
        report.total_records,
        report.duplicate_records,
        report.negative_values,
        report.date_format_errors
    );
    report
}

fn column_median(records: &[CsvRecord], pick: fn(&CsvRecord) -> Option<f64>) -> Option<f64> {
    let values: Vec<f64> = records.iter().filter_map(pick).collect();
    (!values.is_empty()).then(|| numeric::median(&values))
}

/// Most frequent label; ties go to the lexicographically smallest.
fn column_mode(records: &[CsvRecord], pick: fn(&CsvRecord) -> Option<&str>) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in records.iter().filter_map(pick) {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map_or_else(|| UNKNOWN.to_string(), |(value, _)| value.to_string())
}

/// Deduplicates, imputes and derives. Rows whose date cannot be parsed or
/// whose customer id or amount cannot be recovered are dropped and counted.
pub fn clean(raw: &RawTable) -> (CleanedTable, CleaningReport) {
    let columns = &raw.columns;
    let flags = duplicate_flags(&raw.records);
    let unique: Vec<CsvRecord> = raw
        .records
        .iter()
        .zip(flags)
        .filter(|(_, dup)| !dup)
        .map(|(r, _)| r.clone())
        .collect();

    let mut report = CleaningReport {
        initial_records: raw.records.len(),
        removed_duplicates: raw.records.len() - unique.len(),
        ..Default::default()
    };

    let median_of = |column: Column, pick: fn(&CsvRecord) -> Option<f64>| {
        if columns.has(column) {
            column_median(&unique, pick)
        } else {
            None
        }
    };
    let age_fill = median_of(Column::Age, |r| r.age);
    let quantity_fill = median_of(Column::Quantity, |r| r.quantity);
    let price_fill = median_of(Column::PricePerUnit, |r| r.price_per_unit);
    let amount_fill = median_of(Column::TotalAmount, |r| r.total_amount);

    let gender_fill = columns
        .has(Column::Gender)
        .then(|| column_mode(&unique, |r| r.gender.as_deref()));
    let category_fill = columns
        .has(Column::ProductCategory)
        .then(|| column_mode(&unique, |r| r.product_category.as_deref()));
    debug!(
        ?age_fill,
        ?quantity_fill,
        ?price_fill,
        ?amount_fill,
        ?gender_fill,
        ?category_fill,
        "Imputation values"
    );

    let mut records = Vec::with_capacity(unique.len());
    for row in unique {
        let Some(date) = row.date.as_deref().and_then(parse_date) else {
            report.invalid_dates += 1;
            continue;
        };
        let Some(customer_id) = row.customer_id else {
            report.missing_customer_ids += 1;
            continue;
        };
        let Some(total_amount) = row.total_amount.or(amount_fill) else {
            report.missing_amounts += 1;
            continue;
        };
        records.push(Transaction::new(
            row.transaction_id,
            date,
            customer_id,
            row.gender.or_else(|| gender_fill.clone()),
            row.age.or(age_fill),
            row.product_category.or_else(|| category_fill.clone()),
            row.quantity.or(quantity_fill),
            row.price_per_unit.or(price_fill),
            total_amount,
        ));
    }
    report.final_records = records.len();

    if report.invalid_dates > 0 {
        warn!("Dropped {} rows with missing or unparseable dates", report.invalid_dates);
    }
    if report.missing_customer_ids + report.missing_amounts > 0 {
        warn!(
            "Dropped {} rows without customer id and {} without amount",
            report.missing_customer_ids, report.missing_amounts
        );
    }
    info!(
        "Data cleaned: removed {} duplicates, {} records remain",
        report.removed_duplicates, report.final_records
    );

    (
        CleanedTable {
            records,
            columns: columns.clone(),
        },
        report,
    )
}

pub fn summarize(table: &CleanedTable) -> DataSummary {
    let records = &table.records;
    let date_range = records
        .iter()
        .map(|t| t.date)
        .min()
        .zip(records.iter().map(|t| t.date).max())
        .map(|(start, end)| DateRange { start, end });

    let product_categories = records
        .iter()
        .filter_map(|t| t.product_category.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let values = |pick: fn(&Transaction) -> Option<f64>| -> Vec<f64> {
        records.iter().filter_map(pick).collect()
    };
    let mut numerical_statistics = BTreeMap::new();
    if table.has(Column::Age) {
        numerical_statistics.insert("age".to_string(), CenterSpread::of(&values(|t| t.age)));
    }
    if table.has(Column::Quantity) {
        numerical_statistics.insert(
            "quantity".to_string(),
            CenterSpread::of(&values(|t| t.quantity)),
        );
    }
    numerical_statistics.insert(
        "total_amount".to_string(),
        CenterSpread::of(&values(|t| Some(t.total_amount))),
    );

    DataSummary {
        basic_info: BasicInfo {
            total_records: records.len(),
            total_customers: table.unique_customers(),
            date_range,
            product_categories,
            total_revenue: table.total_revenue(),
        },
        categorical_distributions: CategoricalDistributions {
            gender: ValueCount::tally(records.iter().filter_map(|t| t.gender.as_deref())),
            product_category: ValueCount::tally(
                records.iter().filter_map(|t| t.product_category.as_deref()),
            ),
            age_group: ValueCount::tally(
                records.iter().filter_map(|t| t.age_group.map(|g| g.label())),
            ),
        },
        numerical_statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Transaction ID,Date,Customer ID,Gender,Age,Product Category,Quantity,Price per Unit,Total Amount
1,2023-11-24,CUST001,Male,34,Beauty,3,50,150
2,2023-02-27,CUST002,Female,26,Clothing,2,500,1000
2,2023-02-27,CUST002,Female,26,Clothing,2,500,1000
3,2023-01-13,CUST003,,50,Electronics,1,30,30
4,05/21/2023,CUST004,Male,,Clothing,,500,500
5,not-a-date,CUST005,Male,30,Beauty,1,25,25
";

    #[test]
    fn test_load_accepts_spaced_headers() {
        let raw = load_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(raw.records.len(), 6);
        assert_eq!(raw.columns, ColumnSet::all());
        assert_eq!(raw.records[0].customer_id.as_deref(), Some("CUST001"));
        assert_eq!(raw.records[3].gender, None);
        assert_eq!(raw.records[4].age, None);
    }

    #[test]
    fn test_load_rejects_missing_core_columns() {
        let err = load_from_reader("Customer_ID,Gender\nC1,Male\n".as_bytes()).unwrap_err();
        match err {
            EdaError::MissingColumns(cols) => assert_eq!(cols, vec!["Date", "Total_Amount"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_tolerates_optional_columns_and_bad_numbers() {
        let csv = "Customer_ID,Date,Total_Amount,Age\nC1,2023-01-01,abc,30\nC2,2023-01-02,10,\n";
        let raw = load_from_reader(csv.as_bytes()).unwrap();
        assert!(!raw.columns.has(Column::Gender));
        assert_eq!(raw.records[0].total_amount, None);
        assert_eq!(raw.records[1].age, None);
    }

    #[test]
    fn test_validate_counts_quality_issues() {
        let raw = load_from_reader(SAMPLE.as_bytes()).unwrap();
        let report = validate(&raw);
        assert_eq!(report.total_records, 6);
        assert_eq!(report.duplicate_records, 1);
        assert_eq!(report.missing_values["Gender"], 1);
        assert_eq!(report.missing_values["Age"], 1);
        assert_eq!(report.missing_values["Quantity"], 1);
        assert_eq!(report.date_format_errors, 1);
        assert_eq!(report.negative_values, 0);
    }

    #[test]
    fn test_clean_dedups_imputes_and_drops_bad_dates() {
        let raw = load_from_reader(SAMPLE.as_bytes()).unwrap();
        let (table, report) = clean(&raw);
        assert_eq!(report.removed_duplicates, 1);
        assert_eq!(report.invalid_dates, 1);
        assert_eq!(table.len(), 4);

        // Medians over the five unique rows: age [34,26,50,30] -> 32,
        // quantity [3,2,1,1] -> 1.5.
        let cust4 = &table.records[3];
        assert_eq!(cust4.date, NaiveDate::from_ymd_opt(2023, 5, 21).unwrap());
        assert_eq!(cust4.age, Some(32.0));
        assert_eq!(cust4.quantity, Some(1.5));

        // Gender mode over Male x3, Female x1.
        assert_eq!(table.records[2].gender.as_deref(), Some("Male"));
    }

    #[test]
    fn test_clean_uses_unknown_for_empty_categorical() {
        let csv = "Customer_ID,Date,Total_Amount,Gender\nC1,2023-01-01,10,\nC2,2023-01-02,20,\n";
        let raw = load_from_reader(csv.as_bytes()).unwrap();
        let (table, _) = clean(&raw);
        assert!(table
            .records
            .iter()
            .all(|t| t.gender.as_deref() == Some("Unknown")));
        assert!(table.records.iter().all(|t| t.product_category.is_none()));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let raw = load_from_reader(SAMPLE.as_bytes()).unwrap();
        let (first, _) = clean(&raw);
        let (second, report) = clean(&first.to_raw());
        assert_eq!(report.removed_duplicates, 0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 9);
        assert_eq!(parse_date("2023-03-09"), expected);
        assert_eq!(parse_date("2023/03/09"), expected);
        assert_eq!(parse_date("03/09/2023"), expected);
        assert_eq!(parse_date("09-03-2023"), expected);
        assert_eq!(parse_date("2023-03-09 14:30:00"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_summary_reports_ranges_and_distributions() {
        let raw = load_from_reader(SAMPLE.as_bytes()).unwrap();
        let (table, _) = clean(&raw);
        let summary = summarize(&table);
        assert_eq!(summary.basic_info.total_customers, 4);
        assert_eq!(summary.basic_info.product_categories, 3);
        assert_eq!(summary.basic_info.total_revenue, 1680.0);
        let range = summary.basic_info.date_range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2023, 1, 13).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2023, 11, 24).unwrap());
        assert_eq!(summary.categorical_distributions.product_category[0].value, "Clothing");
        assert_eq!(summary.categorical_distributions.product_category[0].count, 2);
    }
}
