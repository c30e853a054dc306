//! Table builders for unit tests.

use chrono::NaiveDate;

use crate::loader::{CleanedTable, ColumnSet};
use crate::models::Transaction;

pub(crate) fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

/// Single-unit purchase by a 30-year-old male customer.
pub(crate) fn txn(customer: &str, day: &str, category: &str, amount: f64) -> Transaction {
    txn_for(customer, "Male", 30.0, day, category, amount)
}

pub(crate) fn txn_for(
    customer: &str,
    gender: &str,
    age: f64,
    day: &str,
    category: &str,
    amount: f64,
) -> Transaction {
    Transaction::new(
        None,
        date(day),
        customer.to_string(),
        Some(gender.to_string()),
        Some(age),
        Some(category.to_string()),
        Some(1.0),
        Some(amount),
        amount,
    )
}

pub(crate) fn table(records: Vec<Transaction>) -> CleanedTable {
    CleanedTable {
        records,
        columns: ColumnSet::all(),
    }
}
