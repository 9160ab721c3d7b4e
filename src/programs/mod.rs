//! Programme summary table and the metrics the dashboards derive from it

mod data;
pub mod loader;

pub use data::{
    default_programs, filter_by_diseases, summarize_by_disease, DiseaseSummary, KeyMetrics,
    ProgramMetrics, ProgramRecord,
};
pub use loader::{load_programs, load_programs_from_reader};
