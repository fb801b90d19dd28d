//! CSV export of the journal.
//!
//! One row per reading in journal order, with a header row. The file is
//! written to a temp file next to the target and renamed into place, so an
//! interrupted export never leaves a truncated CSV behind.

use crate::{Error, Journal, Reading, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    systolic: i32,
    diastolic: i32,
    heart_rate: i32,
    oxygen_saturation: i32,
    weight: f64,
    temperature: f64,
    blood_sugar: i32,
    blood_sugar_context: &'a str,
    notes: &'a str,
}

impl<'a> From<&'a Reading> for CsvRow<'a> {
    fn from(reading: &'a Reading) -> Self {
        CsvRow {
            timestamp: reading.timestamp.to_rfc3339(),
            systolic: reading.systolic,
            diastolic: reading.diastolic,
            heart_rate: reading.heart_rate,
            oxygen_saturation: reading.oxygen_saturation,
            weight: reading.weight,
            temperature: reading.temperature,
            blood_sugar: reading.blood_sugar,
            blood_sugar_context: reading.blood_sugar_context.as_str(),
            notes: &reading.notes,
        }
    }
}

/// Write the journal to `path` as CSV, returning the number of rows written
pub fn write_csv(journal: &Journal, path: &Path) -> Result<usize> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file());
        for reading in journal.all() {
            writer.serialize(CsvRow::from(reading))?;
        }
        writer.flush()?;
    }

    // Header row is only emitted with the first record
    if journal.is_empty() {
        let mut writer = csv::Writer::from_writer(temp.as_file());
        writer.write_record([
            "timestamp",
            "systolic",
            "diastolic",
            "heart_rate",
            "oxygen_saturation",
            "weight",
            "temperature",
            "blood_sugar",
            "blood_sugar_context",
            "notes",
        ])?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| Error::Other(format!("Failed to write export to {:?}: {}", path, e.error)))?;

    tracing::info!("Exported {} readings to {:?}", journal.len(), path);
    Ok(journal.len())
}
