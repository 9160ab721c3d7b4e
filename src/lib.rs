//! QALY System - cohort health-outcome projections for intervention programmes
//!
//! This library provides:
//! - Disease models (Markov states, transition matrices, utility weights) loaded from JSON
//! - Deterministic Markov cohort projection and intervention-vs-baseline comparison
//! - A two-phase discounted individual/population QALY gain calculator
//! - Programme summary tables with cost-effectiveness metrics
//! - An in-memory impact-token ledger for attributing QALYs to owners

pub mod error;
pub mod disease;
pub mod projection;
pub mod discounting;
pub mod programs;
pub mod ledger;
pub mod config;
pub mod context;
pub mod scenario;

// Re-export commonly used types
pub use error::{ConfigurationError, LedgerError, QalyError, Result, ValueError};
pub use disease::{DiseaseCatalogue, DiseaseModel, InterventionModel, ValidationOptions};
pub use projection::{CohortEngine, InterventionComparison, SimulationResult};
pub use discounting::{calculate_qaly_gain, DiscountParams, QalyGainResult};
pub use programs::{KeyMetrics, ProgramRecord};
pub use ledger::TokenLedger;
pub use config::AppConfig;
pub use context::{ComparisonReport, SessionContext};
pub use scenario::ScenarioRunner;
