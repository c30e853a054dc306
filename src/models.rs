use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::numeric::bin_index;

/// Raw record from CSV ingestion.
///
/// Every field is optional: a column may be absent from the file or a cell
/// may be empty. Numeric cells that fail to parse are read as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvRecord {
    #[serde(rename = "Transaction_ID", alias = "Transaction ID", default)]
    pub transaction_id: Option<String>,
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "Customer_ID", alias = "Customer ID", default)]
    pub customer_id: Option<String>,
    #[serde(rename = "Gender", default)]
    pub gender: Option<String>,
    #[serde(rename = "Age", default, deserialize_with = "csv::invalid_option")]
    pub age: Option<f64>,
    #[serde(rename = "Product_Category", alias = "Product Category", default)]
    pub product_category: Option<String>,
    #[serde(rename = "Quantity", default, deserialize_with = "csv::invalid_option")]
    pub quantity: Option<f64>,
    #[serde(
        rename = "Price_per_Unit",
        alias = "Price per Unit",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub price_per_unit: Option<f64>,
    #[serde(
        rename = "Total_Amount",
        alias = "Total Amount",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub total_amount: Option<f64>,
}

/// Source columns of the transaction file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    TransactionId,
    Date,
    CustomerId,
    Gender,
    Age,
    ProductCategory,
    Quantity,
    PricePerUnit,
    TotalAmount,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::TransactionId,
        Column::Date,
        Column::CustomerId,
        Column::Gender,
        Column::Age,
        Column::ProductCategory,
        Column::Quantity,
        Column::PricePerUnit,
        Column::TotalAmount,
    ];

    /// Columns without which no analysis can run.
    pub const REQUIRED: [Column; 3] = [Column::CustomerId, Column::Date, Column::TotalAmount];

    pub fn header(self) -> &'static str {
        match self {
            Column::TransactionId => "Transaction_ID",
            Column::Date => "Date",
            Column::CustomerId => "Customer_ID",
            Column::Gender => "Gender",
            Column::Age => "Age",
            Column::ProductCategory => "Product_Category",
            Column::Quantity => "Quantity",
            Column::PricePerUnit => "Price_per_Unit",
            Column::TotalAmount => "Total_Amount",
        }
    }

    /// Accepts both the underscored headers and the spaced ones used by the
    /// public retail sales dataset.
    pub fn from_header(header: &str) -> Option<Column> {
        let normalized = header.trim().replace(' ', "_");
        Column::ALL
            .into_iter()
            .find(|c| c.header().eq_ignore_ascii_case(&normalized))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Age bins over `(0, 25], (25, 35], (35, 45], (45, 55], (55, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-25")]
    UpTo25,
    #[serde(rename = "26-35")]
    From26To35,
    #[serde(rename = "36-45")]
    From36To45,
    #[serde(rename = "46-55")]
    From46To55,
    #[serde(rename = "55+")]
    Over55,
}

impl AgeGroup {
    pub const EDGES: [f64; 6] = [0.0, 25.0, 35.0, 45.0, 55.0, 100.0];
    pub const ALL: [AgeGroup; 5] = [
        AgeGroup::UpTo25,
        AgeGroup::From26To35,
        AgeGroup::From36To45,
        AgeGroup::From46To55,
        AgeGroup::Over55,
    ];

    pub fn from_age(age: f64) -> Option<AgeGroup> {
        bin_index(&Self::EDGES, age, false).map(|idx| Self::ALL[idx])
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::UpTo25 => "18-25",
            AgeGroup::From26To35 => "26-35",
            AgeGroup::From36To45 => "36-45",
            AgeGroup::From46To55 => "46-55",
            AgeGroup::Over55 => "55+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit price bins over `(0, 50], (50, 100], (100, 300], (300, 1000], (1000, inf]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceCategory {
    Budget,
    Economy,
    #[serde(rename = "Mid-range")]
    MidRange,
    Premium,
    Luxury,
}

impl PriceCategory {
    pub const EDGES: [f64; 6] = [0.0, 50.0, 100.0, 300.0, 1000.0, f64::INFINITY];
    pub const ALL: [PriceCategory; 5] = [
        PriceCategory::Budget,
        PriceCategory::Economy,
        PriceCategory::MidRange,
        PriceCategory::Premium,
        PriceCategory::Luxury,
    ];

    pub fn from_price(price: f64) -> Option<PriceCategory> {
        bin_index(&Self::EDGES, price, false).map(|idx| Self::ALL[idx])
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceCategory::Budget => "Budget",
            PriceCategory::Economy => "Economy",
            PriceCategory::MidRange => "Mid-range",
            PriceCategory::Premium => "Premium",
            PriceCategory::Luxury => "Luxury",
        }
    }
}

impl fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Meteorological season, listed in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn from_month(month: u32) -> Season {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Cleaned transaction: base columns after imputation plus derived fields.
///
/// Serializes with the source headers so the cleaned table can be written
/// back out as CSV and re-read by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Transaction_ID")]
    pub transaction_id: Option<String>,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Customer_ID")]
    pub customer_id: String,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<f64>,
    #[serde(rename = "Product_Category")]
    pub product_category: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<f64>,
    #[serde(rename = "Price_per_Unit")]
    pub price_per_unit: Option<f64>,
    #[serde(rename = "Total_Amount")]
    pub total_amount: f64,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: u32,
    /// Monday = 0.
    #[serde(rename = "Day_of_Week")]
    pub day_of_week: u32,
    /// ISO 8601 week number.
    #[serde(rename = "Week_of_Year")]
    pub week_of_year: u32,
    #[serde(rename = "Age_Group")]
    pub age_group: Option<AgeGroup>,
    #[serde(rename = "Price_Category")]
    pub price_category: Option<PriceCategory>,
}

impl Transaction {
    /// Builds a transaction from imputed base values, deriving every
    /// calendar and bin field.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transaction_id: Option<String>,
        date: NaiveDate,
        customer_id: String,
        gender: Option<String>,
        age: Option<f64>,
        product_category: Option<String>,
        quantity: Option<f64>,
        price_per_unit: Option<f64>,
        total_amount: f64,
    ) -> Self {
        Self {
            transaction_id,
            date,
            customer_id,
            gender,
            age,
            product_category,
            quantity,
            price_per_unit,
            total_amount,
            year: date.year(),
            month: date.month(),
            day_of_week: date.weekday().num_days_from_monday(),
            week_of_year: date.iso_week().week(),
            age_group: age.and_then(AgeGroup::from_age),
            price_category: price_per_unit.and_then(PriceCategory::from_price),
        }
    }

    pub fn season(&self) -> Season {
        Season::from_month(self.month)
    }

    /// Base columns only, in the raw record shape.
    pub fn to_raw(&self) -> CsvRecord {
        CsvRecord {
            transaction_id: self.transaction_id.clone(),
            date: Some(self.date.format("%Y-%m-%d").to_string()),
            customer_id: Some(self.customer_id.clone()),
            gender: self.gender.clone(),
            age: self.age,
            product_category: self.product_category.clone(),
            quantity: self.quantity,
            price_per_unit: self.price_per_unit,
            total_amount: Some(self.total_amount),
        }
    }
}

/// Numeric columns profiled by the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericColumn {
    Age,
    Quantity,
    PricePerUnit,
    TotalAmount,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::Age,
        NumericColumn::Quantity,
        NumericColumn::PricePerUnit,
        NumericColumn::TotalAmount,
    ];

    pub fn column(self) -> Column {
        match self {
            NumericColumn::Age => Column::Age,
            NumericColumn::Quantity => Column::Quantity,
            NumericColumn::PricePerUnit => Column::PricePerUnit,
            NumericColumn::TotalAmount => Column::TotalAmount,
        }
    }

    pub fn name(self) -> &'static str {
        self.column().header()
    }

    pub fn value(self, t: &Transaction) -> Option<f64> {
        match self {
            NumericColumn::Age => t.age,
            NumericColumn::Quantity => t.quantity,
            NumericColumn::PricePerUnit => t.price_per_unit,
            NumericColumn::TotalAmount => Some(t.total_amount),
        }
    }
}

/// Categorical columns profiled by the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoricalColumn {
    Gender,
    ProductCategory,
    AgeGroup,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 3] = [
        CategoricalColumn::Gender,
        CategoricalColumn::ProductCategory,
        CategoricalColumn::AgeGroup,
    ];

    /// Source column the values come from (age group derives from age).
    pub fn source(self) -> Column {
        match self {
            CategoricalColumn::Gender => Column::Gender,
            CategoricalColumn::ProductCategory => Column::ProductCategory,
            CategoricalColumn::AgeGroup => Column::Age,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CategoricalColumn::Gender => "Gender",
            CategoricalColumn::ProductCategory => "Product_Category",
            CategoricalColumn::AgeGroup => "Age_Group",
        }
    }

    pub fn value(self, t: &Transaction) -> Option<&str> {
        match self {
            CategoricalColumn::Gender => t.gender.as_deref(),
            CategoricalColumn::ProductCategory => t.product_category.as_deref(),
            CategoricalColumn::AgeGroup => t.age_group.map(AgeGroup::label),
        }
    }
}

/// Occurrence count of one categorical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

impl ValueCount {
    /// Counts values, most frequent first; ties keep first-seen order.
    pub fn tally<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<ValueCount> {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in values {
            let entry = counts.entry(value).or_insert_with(|| {
                order.push(value);
                0
            });
            *entry += 1;
        }
        let mut tallies: Vec<ValueCount> = order
            .into_iter()
            .map(|value| ValueCount {
                value: value.to_string(),
                count: counts[value],
            })
            .collect();
        tallies.sort_by(|a, b| b.count.cmp(&a.count));
        tallies
    }
}

/// Rule-derived descriptive fact produced by an analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: String,
    pub insight: String,
    pub recommendation: String,
}

impl Insight {
    pub fn new(
        category: impl Into<String>,
        insight: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            insight: insight.into(),
            recommendation: recommendation.into(),
        }
    }
}

/// Customer value tier. `Undefined` marks a segmentation that could not be
/// computed for degenerate spend distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueTier {
    #[serde(rename = "Low Value")]
    Low,
    #[serde(rename = "Medium Value")]
    Medium,
    #[serde(rename = "High Value")]
    High,
    Undefined,
}

impl ValueTier {
    pub const RANKED: [ValueTier; 3] = [ValueTier::Low, ValueTier::Medium, ValueTier::High];

    pub fn label(self) -> &'static str {
        match self {
            ValueTier::Low => "Low Value",
            ValueTier::Medium => "Medium Value",
            ValueTier::High => "High Value",
            ValueTier::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for ValueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Purchase-frequency quartile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FrequencyTier {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Undefined,
}

impl FrequencyTier {
    pub const RANKED: [FrequencyTier; 4] = [
        FrequencyTier::Low,
        FrequencyTier::Medium,
        FrequencyTier::High,
        FrequencyTier::VeryHigh,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FrequencyTier::Low => "Low",
            FrequencyTier::Medium => "Medium",
            FrequencyTier::High => "High",
            FrequencyTier::VeryHigh => "Very High",
            FrequencyTier::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for FrequencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_edges() {
        assert_eq!(AgeGroup::from_age(18.0), Some(AgeGroup::UpTo25));
        assert_eq!(AgeGroup::from_age(25.0), Some(AgeGroup::UpTo25));
        assert_eq!(AgeGroup::from_age(25.5), Some(AgeGroup::From26To35));
        assert_eq!(AgeGroup::from_age(55.0), Some(AgeGroup::From46To55));
        assert_eq!(AgeGroup::from_age(64.0), Some(AgeGroup::Over55));
        assert_eq!(AgeGroup::from_age(0.0), None);
        assert_eq!(AgeGroup::from_age(101.0), None);
    }

    #[test]
    fn test_price_category_edges() {
        assert_eq!(PriceCategory::from_price(25.0), Some(PriceCategory::Budget));
        assert_eq!(PriceCategory::from_price(50.0), Some(PriceCategory::Budget));
        assert_eq!(PriceCategory::from_price(300.0), Some(PriceCategory::MidRange));
        assert_eq!(PriceCategory::from_price(500.0), Some(PriceCategory::Premium));
        assert_eq!(PriceCategory::from_price(5000.0), Some(PriceCategory::Luxury));
        assert_eq!(PriceCategory::from_price(0.0), None);
    }

    #[test]
    fn test_season_mapping() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(4), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(10), Season::Fall);
    }

    #[test]
    fn test_transaction_derives_calendar_fields() {
        // 2023-01-01 is a Sunday in ISO week 52 of 2022.
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let t = Transaction::new(
            None,
            date,
            "CUST001".into(),
            Some("Male".into()),
            Some(34.0),
            Some("Beauty".into()),
            Some(3.0),
            Some(50.0),
            150.0,
        );
        assert_eq!(t.year, 2023);
        assert_eq!(t.month, 1);
        assert_eq!(t.day_of_week, 6);
        assert_eq!(t.week_of_year, 52);
        assert_eq!(t.age_group, Some(AgeGroup::From26To35));
        assert_eq!(t.price_category, Some(PriceCategory::Budget));
        assert_eq!(t.season(), Season::Winter);
    }

    #[test]
    fn test_column_from_header_accepts_spaces() {
        assert_eq!(Column::from_header("Transaction ID"), Some(Column::TransactionId));
        assert_eq!(Column::from_header("Price per Unit"), Some(Column::PricePerUnit));
        assert_eq!(Column::from_header("Total_Amount"), Some(Column::TotalAmount));
        assert_eq!(Column::from_header("Store"), None);
    }

    #[test]
    fn test_tier_labels_match_serialized_names() {
        for tier in [ValueTier::Low, ValueTier::Medium, ValueTier::High, ValueTier::Undefined] {
            assert_eq!(serde_json::to_string(&tier).unwrap(), format!("\"{tier}\""));
        }
        for tier in [
            FrequencyTier::Low,
            FrequencyTier::Medium,
            FrequencyTier::High,
            FrequencyTier::VeryHigh,
            FrequencyTier::Undefined,
        ] {
            assert_eq!(serde_json::to_string(&tier).unwrap(), format!("\"{tier}\""));
        }
        assert_eq!(FrequencyTier::VeryHigh.label(), "Very High");
    }

    #[test]
    fn test_value_counts_order() {
        let counts = ValueCount::tally(["b", "a", "b", "c", "a", "b"]);
        assert_eq!(counts[0].value, "b");
        assert_eq!(counts[0].count, 3);
        assert_eq!(counts[1].value, "a");
        assert_eq!(counts[2].value, "c");
    }
}
