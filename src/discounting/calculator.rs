//! Discounted QALY gain of a treatment versus remaining ill
//!
//! Individual level: utility × discount factor per cycle, no survival weighting.
//! Population level: the same stream weighted by the surviving head count.

use std::io::Write;

use log::debug;
use serde::{Deserialize, Serialize};

use super::schedule::{PhaseDiscount, SurvivalSchedule};
use super::DiscountParams;
use crate::error::{Result, ValueError};

/// Per-member QALY streams for both arms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualQaly {
    pub qaly_ill_vec: Vec<f64>,
    pub qaly_trt_vec: Vec<f64>,
    pub qaly_ill: f64,
    pub qaly_trt: f64,
    pub qaly_gain: f64,
}

/// Survival, head counts and QALY streams for the whole population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationQaly {
    pub surv_no_trt: Vec<f64>,
    pub surv_trt: Vec<f64>,
    pub pop_no_trt: Vec<f64>,
    pub pop_trt: Vec<f64>,
    pub pop_qaly_ill_vec: Vec<f64>,
    pub pop_qaly_trt_vec: Vec<f64>,
    pub pop_qaly_ill: f64,
    pub pop_qaly_trt: f64,
    pub pop_qaly_gain: f64,
}

/// Full output of [`calculate_qaly_gain`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QalyGainResult {
    /// Cycle indices `0..calculation_period`
    pub years: Vec<u32>,
    pub individual: IndividualQaly,
    pub population: PopulationQaly,
    pub params: DiscountParams,
}

impl QalyGainResult {
    /// Treated minus untreated survivors at the last cycle
    pub fn lives_saved(&self) -> f64 {
        match (self.population.pop_trt.last(), self.population.pop_no_trt.last()) {
            (Some(treated), Some(untreated)) => treated - untreated,
            _ => 0.0,
        }
    }

    /// Write all per-cycle vectors as one CSV table
    pub fn write_timeseries_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "Year",
            "Individual_QALY_Ill",
            "Individual_QALY_Treated",
            "Population_Survival_No_Treatment",
            "Population_Survival_Treatment",
            "Population_Count_No_Treatment",
            "Population_Count_Treatment",
            "Population_QALY_Ill",
            "Population_QALY_Treated",
        ])?;

        let ind = &self.individual;
        let pop = &self.population;
        for (i, year) in self.years.iter().enumerate() {
            wtr.write_record(&[
                year.to_string(),
                format!("{:.8}", ind.qaly_ill_vec[i]),
                format!("{:.8}", ind.qaly_trt_vec[i]),
                format!("{:.8}", pop.surv_no_trt[i]),
                format!("{:.8}", pop.surv_trt[i]),
                format!("{:.8}", pop.pop_no_trt[i]),
                format!("{:.8}", pop.pop_trt[i]),
                format!("{:.8}", pop.pop_qaly_ill_vec[i]),
                format!("{:.8}", pop.pop_qaly_trt_vec[i]),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Run the two-phase discounted QALY model
pub fn calculate_qaly_gain(params: &DiscountParams) -> std::result::Result<QalyGainResult, ValueError> {
    params.validate()?;

    let horizon = params.calculation_period;
    let treatment_end = params.treatment_duration;
    let years: Vec<u32> = (0..horizon).collect();

    let illness_util = vec![params.illness_utility; horizon as usize];
    let treatment_util: Vec<f64> = years
        .iter()
        .map(|&i| {
            if i < treatment_end {
                params.active_treatment_utility
            } else {
                params.post_treatment_utility
            }
        })
        .collect();

    let discount = PhaseDiscount::from_params(params);
    let disc_illness = discount.illness_factors(horizon);
    let disc_treatment = discount.treatment_factors(horizon);

    let survival = SurvivalSchedule::from_params(params);
    let surv_no_trt = survival.untreated(horizon);
    let surv_trt = survival.treated(horizon);
    let pop_no_trt: Vec<f64> = surv_no_trt
        .iter()
        .map(|s| params.initial_population * s)
        .collect();
    let pop_trt: Vec<f64> = surv_trt
        .iter()
        .map(|s| params.initial_population * s)
        .collect();

    let qaly_ill_vec = product(&illness_util, &disc_illness);
    let qaly_trt_vec = product(&treatment_util, &disc_treatment);
    let qaly_ill: f64 = qaly_ill_vec.iter().sum();
    let qaly_trt: f64 = qaly_trt_vec.iter().sum();

    let pop_qaly_ill_vec = product(&qaly_ill_vec, &pop_no_trt);
    let pop_qaly_trt_vec = product(&qaly_trt_vec, &pop_trt);
    let pop_qaly_ill: f64 = pop_qaly_ill_vec.iter().sum();
    let pop_qaly_trt: f64 = pop_qaly_trt_vec.iter().sum();

    debug!(
        "discounted QALY model: horizon {horizon}, treatment {treatment_end}, individual gain {:.4}, population gain {:.2}",
        qaly_trt - qaly_ill,
        pop_qaly_trt - pop_qaly_ill
    );

    Ok(QalyGainResult {
        years,
        individual: IndividualQaly {
            qaly_ill_vec,
            qaly_trt_vec,
            qaly_ill,
            qaly_trt,
            qaly_gain: qaly_trt - qaly_ill,
        },
        population: PopulationQaly {
            surv_no_trt,
            surv_trt,
            pop_no_trt,
            pop_trt,
            pop_qaly_ill_vec,
            pop_qaly_trt_vec,
            pop_qaly_ill,
            pop_qaly_trt,
            pop_qaly_gain: pop_qaly_trt - pop_qaly_ill,
        },
        params: params.clone(),
    })
}

fn product(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small() -> DiscountParams {
        DiscountParams {
            calculation_period: 3,
            treatment_duration: 1,
            illness_utility: 0.5,
            active_treatment_utility: 0.6,
            post_treatment_utility: 0.8,
            discount_rate_illness: 0.0,
            discount_rate_treatment: 0.1,
            discount_rate_post_treatment: 0.2,
            mortality_rate_no_treatment: 0.1,
            mortality_rate_during_treatment: 0.05,
            mortality_rate_post_treatment: 0.2,
            initial_population: 100.0,
        }
    }

    #[test]
    fn test_hand_computed_three_cycles() {
        let result = calculate_qaly_gain(&small()).unwrap();
        let ind = &result.individual;
        let pop = &result.population;

        assert_eq!(result.years, vec![0, 1, 2]);
        assert_eq!(ind.qaly_ill_vec, vec![0.5, 0.5, 0.5]);
        assert_relative_eq!(ind.qaly_trt_vec[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(ind.qaly_trt_vec[1], 0.8 / 1.1, epsilon = 1e-12);
        assert_relative_eq!(ind.qaly_trt_vec[2], 0.8 / (1.1 * 1.2), epsilon = 1e-12);
        assert_relative_eq!(ind.qaly_gain, ind.qaly_trt - 1.5, epsilon = 1e-12);

        assert_relative_eq!(pop.pop_no_trt[2], 81.0, epsilon = 1e-9);
        assert_relative_eq!(pop.pop_trt[1], 95.0, epsilon = 1e-9);
        assert_relative_eq!(pop.pop_trt[2], 76.0, epsilon = 1e-9);

        let expected_ill = 0.5 * 100.0 + 0.5 * 90.0 + 0.5 * 81.0;
        assert_relative_eq!(pop.pop_qaly_ill, expected_ill, epsilon = 1e-9);
        let expected_trt = 0.6 * 100.0 + 0.8 / 1.1 * 95.0 + 0.8 / 1.32 * 76.0;
        assert_relative_eq!(pop.pop_qaly_trt, expected_trt, epsilon = 1e-9);
        assert_relative_eq!(result.lives_saved(), -5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_post_treatment_params_ignored_when_treatment_spans_horizon() {
        let base = DiscountParams {
            treatment_duration: 3,
            ..small()
        };
        let altered = DiscountParams {
            post_treatment_utility: 0.1,
            discount_rate_post_treatment: 0.9,
            mortality_rate_post_treatment: 0.7,
            ..base.clone()
        };

        let a = calculate_qaly_gain(&base).unwrap();
        let b = calculate_qaly_gain(&altered).unwrap();
        assert_eq!(a.individual, b.individual);
        assert_eq!(a.population, b.population);
    }

    #[test]
    fn test_stunting_gains_positive() {
        let result = calculate_qaly_gain(&DiscountParams::stunting()).unwrap();
        assert_eq!(result.years.len(), 50);
        assert!(result.individual.qaly_gain > 0.0);
        assert!(result.population.pop_qaly_gain > 0.0);
        assert!(result.lives_saved() > 0.0);
        assert!(result.population.pop_trt.last().unwrap() < &1000.0);
    }

    #[test]
    fn test_zero_horizon() {
        let params = DiscountParams {
            calculation_period: 0,
            treatment_duration: 0,
            ..small()
        };
        let result = calculate_qaly_gain(&params).unwrap();
        assert!(result.years.is_empty());
        assert_eq!(result.individual.qaly_gain, 0.0);
        assert_eq!(result.lives_saved(), 0.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = DiscountParams {
            treatment_duration: 4,
            ..small()
        };
        assert!(matches!(
            calculate_qaly_gain(&params),
            Err(ValueError::TreatmentExceedsHorizon { .. })
        ));
    }

    #[test]
    fn test_timeseries_csv() {
        let result = calculate_qaly_gain(&small()).unwrap();
        let mut buf = Vec::new();
        result.write_timeseries_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Year,Individual_QALY_Ill,Individual_QALY_Treated"));
        assert!(lines[1].starts_with("0,0.50000000,0.60000000,1.00000000,1.00000000,100.00000000"));
    }
}
