//! Markov cohort projection engine

use log::debug;

use super::state::CohortState;
use super::trace::{InterventionComparison, SimulationResult};
use crate::disease::{DiseaseModel, InterventionModel};
use crate::error::{Result, ValueError};

/// Deterministic cohort projection over a validated disease model
///
/// The engine holds no state between runs; one instance can be shared
/// across threads and reused for any number of projections.
#[derive(Debug, Clone, Copy, Default)]
pub struct CohortEngine;

impl CohortEngine {
    pub fn new() -> Self {
        Self
    }

    /// Project `cohort_size` members, all starting in the first state, through
    /// `num_cycles` annual transitions of the named intervention arm
    pub fn project(
        &self,
        disease: &DiseaseModel,
        intervention_key: &str,
        cohort_size: f64,
        num_cycles: u32,
    ) -> Result<SimulationResult> {
        let arm = disease.arm(intervention_key)?;
        Ok(self.project_arm(arm, intervention_key, cohort_size, num_cycles)?)
    }

    /// Project a single arm that has already been looked up
    pub fn project_arm(
        &self,
        arm: &InterventionModel,
        intervention_key: &str,
        cohort_size: f64,
        num_cycles: u32,
    ) -> std::result::Result<SimulationResult, ValueError> {
        if !cohort_size.is_finite() || cohort_size <= 0.0 {
            return Err(ValueError::NonPositiveCohort(cohort_size));
        }

        let mut state = CohortState::initial(arm.num_states(), cohort_size);
        let mut total_qalys = state.qalys(arm);
        let mut total_life_years = state.alive(arm);
        let mut state_trace = Vec::with_capacity(num_cycles as usize + 1);

        for _cycle in 0..num_cycles {
            let next = state.advance(arm);
            state_trace.push(std::mem::replace(&mut state, next).occupancy);

            total_qalys += state.qalys(arm);
            total_life_years += state.alive(arm);
        }

        let final_state_distribution = state.occupancy.clone();
        state_trace.push(state.occupancy);

        debug!(
            "projected {intervention_key}: cohort {cohort_size}, {num_cycles} cycles, {total_qalys:.4} QALYs"
        );

        Ok(SimulationResult {
            intervention: intervention_key.to_string(),
            cohort_size,
            num_cycles,
            total_qalys,
            total_life_years,
            final_state_distribution,
            state_trace,
            states: arm.states().to_vec(),
            absorbing_state: arm.absorbing_state(),
            utilities: arm.utilities().to_vec(),
        })
    }

    /// Project an intervention and the disease's baseline arm with identical inputs
    pub fn compare(
        &self,
        disease: &DiseaseModel,
        intervention_key: &str,
        cohort_size: f64,
        num_cycles: u32,
    ) -> Result<InterventionComparison> {
        let baseline = disease.baseline()?;
        let treated = self.project(disease, intervention_key, cohort_size, num_cycles)?;
        let baseline = self.project_arm(
            baseline,
            crate::disease::BASELINE_KEY,
            cohort_size,
            num_cycles,
        )?;

        Ok(InterventionComparison {
            disease: disease.name().to_string(),
            intervention: intervention_key.to_string(),
            treated,
            baseline,
        })
    }
}
