//! Markov cohort projection for disease/intervention models

mod state;
mod engine;
mod trace;
mod request;

pub use state::CohortState;
pub use engine::CohortEngine;
pub use trace::{round_to, InterventionComparison, SimulationReport, SimulationResult};
pub use request::{cycle_count, ProjectionRequest, DEFAULT_COHORT_SIZE, DEFAULT_NUM_CYCLES};
