//! Flat-file outputs: pretty JSON documents, the cleaned CSV and text
//! reports. Parent directories are created on write.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EdaError, Result};
use crate::models::Transaction;

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| EdaError::io(parent, e))
        }
        _ => Ok(()),
    }
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| EdaError::io(path, e))?;
    info!("Saved {}", path.display());
    Ok(())
}

/// Reads a JSON document written by an earlier run. A missing file is
/// `Ok(None)` so standalone stages can skip what they lack.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not found", path.display());
            return Ok(None);
        }
        Err(e) => return Err(EdaError::io(path, e)),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

pub fn write_cleaned_csv(path: &Path, records: &[Transaction]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| EdaError::io(path, e))?;
    info!("Saved {} cleaned records to {}", records.len(), path.display());
    Ok(())
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents).map_err(|e| EdaError::io(path, e))?;
    info!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use crate::test_support::txn;
    use std::collections::BTreeMap;

    #[test]
    fn test_json_round_trip_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/values.json");
        let mut values = BTreeMap::new();
        values.insert("mean".to_string(), 0.1 + 0.2);
        values.insert("share".to_string(), 33.33);
        write_json(&path, &values).unwrap();

        let back: BTreeMap<String, f64> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_read_missing_json_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let back: Option<BTreeMap<String, f64>> =
            read_json(&dir.path().join("absent.json")).unwrap();
        assert!(back.is_none());
    }

    #[test]
    fn test_cleaned_csv_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.csv");
        let records = vec![
            txn("CUST001", "2023-01-01", "Beauty", 150.0),
            txn("CUST002", "2023-02-14", "Clothing", 40.0),
        ];
        write_cleaned_csv(&path, &records).unwrap();

        let raw = loader::load(&path).unwrap();
        let (cleaned, report) = loader::clean(&raw);
        assert_eq!(report.final_records, 2);
        assert_eq!(cleaned.records, records);
    }
}
