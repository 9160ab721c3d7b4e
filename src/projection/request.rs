//! Untyped projection inputs (CLI flags, JSON request bodies)

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Default cohort size for a programme projection
pub const DEFAULT_COHORT_SIZE: f64 = 10_000.0;

/// Default simulation length in annual cycles
pub const DEFAULT_NUM_CYCLES: i64 = 10;

fn default_cohort_size() -> f64 {
    DEFAULT_COHORT_SIZE
}

fn default_num_cycles() -> i64 {
    DEFAULT_NUM_CYCLES
}

/// A projection request before its numbers have been checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    pub disease: String,

    pub intervention: String,

    #[serde(default = "default_cohort_size")]
    pub cohort_size: f64,

    /// Signed so that a negative count is reported rather than failing to parse
    #[serde(default = "default_num_cycles")]
    pub num_cycles: i64,
}

impl ProjectionRequest {
    pub fn new(disease: impl Into<String>, intervention: impl Into<String>) -> Self {
        Self {
            disease: disease.into(),
            intervention: intervention.into(),
            cohort_size: DEFAULT_COHORT_SIZE,
            num_cycles: DEFAULT_NUM_CYCLES,
        }
    }

    /// Checked `(cohort_size, num_cycles)` ready for the engine
    pub fn validated(&self) -> Result<(f64, u32), ValueError> {
        if !self.cohort_size.is_finite() || self.cohort_size <= 0.0 {
            return Err(ValueError::NonPositiveCohort(self.cohort_size));
        }
        let cycles = cycle_count("num_cycles", self.num_cycles)?;
        Ok((self.cohort_size, cycles))
    }
}

/// Convert a signed cycle count, rejecting negatives
pub fn cycle_count(field: &'static str, value: i64) -> Result<u32, ValueError> {
    if value < 0 {
        return Err(ValueError::NegativeCycles { field, value });
    }
    u32::try_from(value).map_err(|_| ValueError::OutOfRange {
        field,
        value: value as f64,
        expected: "at most u32::MAX cycles",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let req: ProjectionRequest =
            serde_json::from_str(r#"{"disease": "Hypertension", "intervention": "ARBs"}"#).unwrap();
        assert_eq!(req.cohort_size, 10_000.0);
        assert_eq!(req.validated().unwrap(), (10_000.0, 10));
    }

    #[test]
    fn test_negative_cycles_rejected() {
        let mut req = ProjectionRequest::new("Hypertension", "ARBs");
        req.num_cycles = -3;
        assert_eq!(
            req.validated().unwrap_err(),
            ValueError::NegativeCycles { field: "num_cycles", value: -3 }
        );
    }

    #[test]
    fn test_non_positive_cohort_rejected() {
        let mut req = ProjectionRequest::new("Hypertension", "ARBs");
        req.cohort_size = 0.0;
        assert_eq!(req.validated().unwrap_err(), ValueError::NonPositiveCohort(0.0));
    }

    #[test]
    fn test_cycle_count_bounds() {
        assert_eq!(cycle_count("cycles", 0).unwrap(), 0);
        assert!(cycle_count("cycles", i64::MAX).is_err());
    }
}
