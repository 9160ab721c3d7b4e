//! Cohort occupancy tracking for a single projection

use crate::disease::InterventionModel;

/// Number of cohort members in each state at one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CohortState {
    /// Cycle index (0 = initial allocation)
    pub cycle: u32,

    /// Occupancy per state, aligned with the model's states
    pub occupancy: Vec<f64>,
}

impl CohortState {
    /// Place the whole cohort in the first state
    pub fn initial(num_states: usize, cohort_size: f64) -> Self {
        let mut occupancy = vec![0.0; num_states];
        if let Some(first) = occupancy.first_mut() {
            *first = cohort_size;
        }
        Self { cycle: 0, occupancy }
    }

    /// Apply one cycle of the transition matrix: `v' = v · M`
    pub fn advance(&self, model: &InterventionModel) -> Self {
        let matrix = model.transition_matrix();
        let mut next = vec![0.0; self.occupancy.len()];

        for (from, &count) in self.occupancy.iter().enumerate() {
            if count == 0.0 {
                continue;
            }
            for (to, &p) in matrix[from].iter().enumerate() {
                next[to] += count * p;
            }
        }

        Self {
            cycle: self.cycle + 1,
            occupancy: next,
        }
    }

    /// Total members across all states, dead included
    pub fn total(&self) -> f64 {
        self.occupancy.iter().sum()
    }

    /// Members outside the absorbing state
    pub fn alive(&self, model: &InterventionModel) -> f64 {
        self.occupancy
            .iter()
            .enumerate()
            .filter(|(state, _)| !model.is_absorbing(*state))
            .map(|(_, count)| count)
            .sum()
    }

    /// Utility-weighted occupancy for this cycle (undiscounted)
    pub fn qalys(&self, model: &InterventionModel) -> f64 {
        self.occupancy
            .iter()
            .zip(model.utilities())
            .map(|(count, utility)| count * utility)
            .sum()
    }
}
