//! Load discounted-model parameters from JSON
//!
//! Integer fields are read signed so that a negative horizon is reported as a
//! value error instead of an opaque parse failure.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;
use serde::Deserialize;

use super::DiscountParams;
use crate::error::{Result, ValueError};
use crate::projection::cycle_count;

/// Default path to the named parameter sets
pub const DEFAULT_PARAMETERS_PATH: &str = "data/parameters/BP_parameters.json";

/// Raw JSON record matching the parameter file layout
#[derive(Debug, Deserialize)]
struct RawParams {
    calculation_period: i64,
    treatment_duration: i64,
    illness_utility: f64,
    active_treatment_utility: f64,
    post_treatment_utility: f64,
    discount_rate_illness: f64,
    discount_rate_treatment: f64,
    discount_rate_post_treatment: f64,
    mortality_rate_no_treatment: f64,
    mortality_rate_during_treatment: f64,
    mortality_rate_post_treatment: f64,
    initial_population: f64,
}

impl RawParams {
    fn to_params(self) -> std::result::Result<DiscountParams, ValueError> {
        let params = DiscountParams {
            calculation_period: cycle_count("calculation_period", self.calculation_period)?,
            treatment_duration: cycle_count("treatment_duration", self.treatment_duration)?,
            illness_utility: self.illness_utility,
            active_treatment_utility: self.active_treatment_utility,
            post_treatment_utility: self.post_treatment_utility,
            discount_rate_illness: self.discount_rate_illness,
            discount_rate_treatment: self.discount_rate_treatment,
            discount_rate_post_treatment: self.discount_rate_post_treatment,
            mortality_rate_no_treatment: self.mortality_rate_no_treatment,
            mortality_rate_during_treatment: self.mortality_rate_during_treatment,
            mortality_rate_post_treatment: self.mortality_rate_post_treatment,
            initial_population: self.initial_population,
        };
        params.validate()?;
        Ok(params)
    }
}

/// Parse a single flat parameter record
pub fn load_parameters_from_reader<R: Read>(reader: R) -> Result<DiscountParams> {
    let raw: RawParams = serde_json::from_reader(reader)?;
    Ok(raw.to_params()?)
}

/// Parse a JSON object of named parameter sets
pub fn load_parameter_sets_from_reader<R: Read>(
    reader: R,
) -> Result<BTreeMap<String, DiscountParams>> {
    let raw: BTreeMap<String, RawParams> = serde_json::from_reader(reader)?;
    let mut sets = BTreeMap::new();
    for (name, params) in raw {
        sets.insert(name, params.to_params()?);
    }
    Ok(sets)
}

pub fn load_parameters<P: AsRef<Path>>(path: P) -> Result<DiscountParams> {
    let file = File::open(path)?;
    load_parameters_from_reader(BufReader::new(file))
}

pub fn load_parameter_sets<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, DiscountParams>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let sets = load_parameter_sets_from_reader(BufReader::new(file))?;
    info!("loaded {} parameter sets from {}", sets.len(), path.display());
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QalyError;

    #[test]
    fn test_load_default_parameter_sets() {
        let sets = load_parameter_sets(DEFAULT_PARAMETERS_PATH).expect("Failed to load parameters");
        assert_eq!(sets.len(), 2);
        assert_eq!(sets["Stunting"], DiscountParams::stunting());
        assert_eq!(sets["Hypertension"].treatment_duration, 30);
    }

    #[test]
    fn test_negative_horizon_is_value_error() {
        let json = r#"{
            "calculation_period": -5,
            "treatment_duration": 0,
            "illness_utility": 0.7,
            "active_treatment_utility": 0.8,
            "post_treatment_utility": 0.85,
            "discount_rate_illness": 0.03,
            "discount_rate_treatment": 0.03,
            "discount_rate_post_treatment": 0.03,
            "mortality_rate_no_treatment": 0.015,
            "mortality_rate_during_treatment": 0.008,
            "mortality_rate_post_treatment": 0.01,
            "initial_population": 1000
        }"#;
        let err = load_parameters_from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            QalyError::Value(ValueError::NegativeCycles { field: "calculation_period", value: -5 })
        ));
    }

    #[test]
    fn test_missing_field_is_json_error() {
        let err = load_parameters_from_reader(r#"{"calculation_period": 10}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, QalyError::Json(_)));
    }
}
