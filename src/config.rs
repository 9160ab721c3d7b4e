//! Application configuration
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields a usable configuration pointing at the bundled `data/` directory.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::discounting::loader::DEFAULT_PARAMETERS_PATH;
use crate::disease::loader::DEFAULT_DISEASES_PATH;
use crate::disease::{ValidationOptions, DEFAULT_ROW_SUM_TOLERANCE};
use crate::error::{Result, ValueError};
use crate::projection::{cycle_count, DEFAULT_COHORT_SIZE, DEFAULT_NUM_CYCLES};

fn default_diseases_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DISEASES_PATH)
}

fn default_parameters_file() -> PathBuf {
    PathBuf::from(DEFAULT_PARAMETERS_PATH)
}

fn default_cohort_size() -> f64 {
    DEFAULT_COHORT_SIZE
}

fn default_num_cycles() -> i64 {
    DEFAULT_NUM_CYCLES
}

fn default_row_sum_tolerance() -> f64 {
    DEFAULT_ROW_SUM_TOLERANCE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory of disease JSON files
    #[serde(default = "default_diseases_dir")]
    pub diseases_dir: PathBuf,

    /// Programme summary CSV; the embedded demo table is used when unset
    #[serde(default)]
    pub programs_csv: Option<PathBuf>,

    /// Discount calculator parameter sets
    #[serde(default = "default_parameters_file")]
    pub parameters_file: PathBuf,

    #[serde(default = "default_cohort_size")]
    pub default_cohort_size: f64,

    #[serde(default = "default_num_cycles")]
    pub default_num_cycles: i64,

    /// Allowed deviation of each transition row sum from 1.0
    #[serde(default = "default_row_sum_tolerance")]
    pub row_sum_tolerance: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            diseases_dir: default_diseases_dir(),
            programs_csv: None,
            parameters_file: default_parameters_file(),
            default_cohort_size: default_cohort_size(),
            default_num_cycles: default_num_cycles(),
            row_sum_tolerance: default_row_sum_tolerance(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ValueError> {
        if !self.default_cohort_size.is_finite() || self.default_cohort_size <= 0.0 {
            return Err(ValueError::NonPositiveCohort(self.default_cohort_size));
        }
        cycle_count("default_num_cycles", self.default_num_cycles)?;
        if !self.row_sum_tolerance.is_finite() || self.row_sum_tolerance < 0.0 {
            return Err(ValueError::OutOfRange {
                field: "row_sum_tolerance",
                value: self.row_sum_tolerance,
                expected: "a non-negative tolerance",
            });
        }
        Ok(())
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions::with_row_tolerance(self.row_sum_tolerance)
    }
}
