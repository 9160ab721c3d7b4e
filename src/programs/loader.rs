//! Load programme summaries from CSV

use std::io::Read;
use std::path::Path;

use csv::Reader;
use log::info;

use super::ProgramRecord;
use crate::error::{ConfigurationError, Result};

/// Default location of the programme summary table
pub const DEFAULT_PROGRAMS_PATH: &str = "data/QALY_data.csv";

/// Headers that must be present before any row is read
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "ID",
    "Disease",
    "Intervention",
    "Population",
    "Non-treated Pop",
    "Treated Pop",
    "Avg QAlY Gain",
    "Tot QALY Gain",
    "Cost",
];

fn read_records<R: Read>(mut reader: Reader<R>) -> Result<Vec<ProgramRecord>> {
    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim() == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigurationError::MissingColumns(missing).into());
    }

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: ProgramRecord = result?;
        if !record.population.is_finite() || record.population <= 0.0 {
            return Err(ConfigurationError::InvalidRecord {
                id: record.id,
                reason: format!("population must be positive, got {}", record.population),
            }
            .into());
        }
        records.push(record);
    }

    Ok(records)
}

/// Load all programmes from a CSV file
pub fn load_programs<P: AsRef<Path>>(path: P) -> Result<Vec<ProgramRecord>> {
    let path = path.as_ref();
    let records = read_records(Reader::from_path(path)?)?;
    info!("loaded {} programmes from {}", records.len(), path.display());
    Ok(records)
}

/// Load programmes from any reader (e.g., an uploaded buffer)
pub fn load_programs_from_reader<R: Read>(reader: R) -> Result<Vec<ProgramRecord>> {
    read_records(Reader::from_reader(reader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QalyError;
    use crate::programs::default_programs;

    #[test]
    fn test_load_default_table() {
        let records = load_programs(DEFAULT_PROGRAMS_PATH).expect("Failed to load programmes");
        assert_eq!(records, default_programs());
    }

    #[test]
    fn test_missing_columns() {
        let csv = "ID,Disease,Intervention,Population,Cost\nX1,Flu,Vaccine,100,5\n";
        let err = load_programs_from_reader(csv.as_bytes()).unwrap_err();
        match err {
            QalyError::Configuration(ConfigurationError::MissingColumns(cols)) => {
                assert_eq!(
                    cols,
                    vec!["Non-treated Pop", "Treated Pop", "Avg QAlY Gain", "Tot QALY Gain"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_population() {
        let csv = "ID,Disease,Intervention,Population,Non-treated Pop,Treated Pop,Avg QAlY Gain,Tot QALY Gain,Cost\n\
                   X1,Flu,Vaccine,0,0,0,0.1,0,5\n";
        let err = load_programs_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            QalyError::Configuration(ConfigurationError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_bad_number_is_csv_error() {
        let csv = "ID,Disease,Intervention,Population,Non-treated Pop,Treated Pop,Avg QAlY Gain,Tot QALY Gain,Cost\n\
                   X1,Flu,Vaccine,lots,0,0,0.1,0,5\n";
        let err = load_programs_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, QalyError::Csv(_)));
    }
}
