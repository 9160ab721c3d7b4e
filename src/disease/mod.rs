//! Disease models: state spaces, transition matrices and utility weights

mod data;
pub mod loader;

pub use data::{
    DiseaseModel, InterventionModel, Reference, ValidationOptions, BASELINE_KEY,
    DEFAULT_ROW_SUM_TOLERANCE,
};
pub use loader::{builtin_disease, load_disease, load_disease_from_reader, DiseaseCatalogue};
