//! Discounted individual/population QALY gain calculator
//!
//! A two-phase alternative to the Markov projection: one utility switch at the
//! end of treatment, exponential discounting and an exogenous mortality curve.
//! The two models are deliberately separate and do not reconcile.

mod params;
mod schedule;
mod calculator;
pub mod loader;

pub use params::DiscountParams;
pub use schedule::{PhaseDiscount, SurvivalSchedule};
pub use calculator::{calculate_qaly_gain, IndividualQaly, PopulationQaly, QalyGainResult};
pub use loader::{load_parameter_sets, load_parameters};
