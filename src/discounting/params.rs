//! Parameter record for the two-phase discounted QALY model

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Inputs of the discounted individual/population QALY calculator
///
/// Field names follow the parameter files the dashboards were fed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountParams {
    /// Calculation horizon in annual cycles
    pub calculation_period: u32,

    /// Cycles of active treatment; must not exceed the horizon
    pub treatment_duration: u32,

    /// Utility while ill and untreated
    pub illness_utility: f64,

    /// Utility during active treatment
    pub active_treatment_utility: f64,

    /// Utility after treatment ends
    pub post_treatment_utility: f64,

    pub discount_rate_illness: f64,
    pub discount_rate_treatment: f64,
    pub discount_rate_post_treatment: f64,

    /// Annual mortality without treatment
    pub mortality_rate_no_treatment: f64,

    /// Annual mortality while treated (applies through the boundary cycle)
    pub mortality_rate_during_treatment: f64,

    /// Annual mortality after treatment
    pub mortality_rate_post_treatment: f64,

    pub initial_population: f64,
}

impl DiscountParams {
    /// Childhood stunting nutritional programme
    pub fn stunting() -> Self {
        Self {
            calculation_period: 50,
            treatment_duration: 5,
            illness_utility: 0.70,
            active_treatment_utility: 0.80,
            post_treatment_utility: 0.85,
            discount_rate_illness: 0.03,
            discount_rate_treatment: 0.03,
            discount_rate_post_treatment: 0.03,
            mortality_rate_no_treatment: 0.015,
            mortality_rate_during_treatment: 0.008,
            mortality_rate_post_treatment: 0.01,
            initial_population: 1000.0,
        }
    }

    /// Check every field against the domain the calculator accepts
    pub fn validate(&self) -> Result<(), ValueError> {
        if self.treatment_duration > self.calculation_period {
            return Err(ValueError::TreatmentExceedsHorizon {
                duration: self.treatment_duration,
                horizon: self.calculation_period,
            });
        }

        for (field, value) in [
            ("illness_utility", self.illness_utility),
            ("active_treatment_utility", self.active_treatment_utility),
            ("post_treatment_utility", self.post_treatment_utility),
        ] {
            check_unit_interval(field, value, "a utility in [0, 1]")?;
        }

        for (field, value) in [
            ("discount_rate_illness", self.discount_rate_illness),
            ("discount_rate_treatment", self.discount_rate_treatment),
            ("discount_rate_post_treatment", self.discount_rate_post_treatment),
        ] {
            if !value.is_finite() || value <= -1.0 {
                return Err(ValueError::OutOfRange {
                    field,
                    value,
                    expected: "a finite rate greater than -1",
                });
            }
        }

        for (field, value) in [
            ("mortality_rate_no_treatment", self.mortality_rate_no_treatment),
            ("mortality_rate_during_treatment", self.mortality_rate_during_treatment),
            ("mortality_rate_post_treatment", self.mortality_rate_post_treatment),
        ] {
            check_unit_interval(field, value, "a probability in [0, 1]")?;
        }

        if !self.initial_population.is_finite() || self.initial_population <= 0.0 {
            return Err(ValueError::NonPositiveCohort(self.initial_population));
        }

        Ok(())
    }
}

fn check_unit_interval(
    field: &'static str,
    value: f64,
    expected: &'static str,
) -> Result<(), ValueError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValueError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}
