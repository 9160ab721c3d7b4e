//! Scenario runner for batch cohort projections
//!
//! Loads the disease catalogue once, then runs any number of projections
//! and comparisons against it without re-reading the JSON files.

use log::{info, warn};
use rayon::prelude::*;

use crate::disease::{DiseaseCatalogue, DiseaseModel, ValidationOptions};
use crate::error::Result;
use crate::projection::{CohortEngine, InterventionComparison, ProjectionRequest, SimulationResult};

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_dir("data/diseases", &ValidationOptions::default())?;
///
/// for cycles in [5, 10, 20] {
///     let comparison = runner.compare("Hypercholesterolemia", "Statins", 10_000.0, cycles)?;
///     println!("{cycles}: {:.2}", comparison.qaly_gain());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    catalogue: DiseaseCatalogue,
    engine: CohortEngine,
}

impl ScenarioRunner {
    /// Runner over the bundled demo disease only
    pub fn builtin() -> Result<Self> {
        Ok(Self::with_catalogue(DiseaseCatalogue::builtin(&ValidationOptions::default())?))
    }

    /// Runner over every disease file in `dir`
    pub fn from_dir<P: AsRef<std::path::Path>>(dir: P, options: &ValidationOptions) -> Result<Self> {
        Ok(Self::with_catalogue(DiseaseCatalogue::load_dir(dir, options)?))
    }

    pub fn with_catalogue(catalogue: DiseaseCatalogue) -> Self {
        Self {
            catalogue,
            engine: CohortEngine::new(),
        }
    }

    pub fn catalogue(&self) -> &DiseaseCatalogue {
        &self.catalogue
    }

    pub fn run(
        &self,
        disease: &str,
        intervention: &str,
        cohort_size: f64,
        num_cycles: u32,
    ) -> Result<SimulationResult> {
        let model = self.catalogue.get(disease)?;
        self.engine.project(model, intervention, cohort_size, num_cycles)
    }

    /// Validate an untyped request, then run it
    pub fn run_request(&self, request: &ProjectionRequest) -> Result<SimulationResult> {
        let (cohort_size, num_cycles) = request.validated()?;
        self.run(&request.disease, &request.intervention, cohort_size, num_cycles)
    }

    pub fn compare(
        &self,
        disease: &str,
        intervention: &str,
        cohort_size: f64,
        num_cycles: u32,
    ) -> Result<InterventionComparison> {
        let model = self.catalogue.get(disease)?;
        self.engine.compare(model, intervention, cohort_size, num_cycles)
    }

    /// Every (disease, intervention) pair that can be compared to a baseline
    fn comparable_pairs(&self) -> Vec<(&DiseaseModel, &str)> {
        let mut pairs = Vec::new();
        for disease in self.catalogue.iter() {
            if !disease.has_baseline() {
                warn!("skipping {}: no Baseline arm to compare against", disease.name());
                continue;
            }
            for key in disease.interventions() {
                pairs.push((disease, key));
            }
        }
        pairs
    }

    /// Compare every intervention in the catalogue against its baseline
    pub fn run_catalogue(&self, cohort_size: f64, num_cycles: u32) -> Result<Vec<InterventionComparison>> {
        self.comparable_pairs()
            .into_iter()
            .map(|(disease, key)| self.engine.compare(disease, key, cohort_size, num_cycles))
            .collect()
    }

    /// Same as [`run_catalogue`](Self::run_catalogue), fanned out with rayon
    pub fn run_catalogue_parallel(
        &self,
        cohort_size: f64,
        num_cycles: u32,
    ) -> Result<Vec<InterventionComparison>> {
        let pairs = self.comparable_pairs();
        info!("running {} comparisons in parallel", pairs.len());

        pairs
            .par_iter()
            .map(|&(disease, key)| self.engine.compare(disease, key, cohort_size, num_cycles))
            .collect()
    }
}
