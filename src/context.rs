//! Per-session state shared by every command
//!
//! Built once from an [`AppConfig`] and passed by reference; nothing here is
//! global.

use log::{info, warn};
use serde::Serialize;

use crate::config::AppConfig;
use crate::disease::{DiseaseCatalogue, ValidationOptions};
use crate::error::{Result, ValueError};
use crate::ledger::{ImpactToken, TokenLedger};
use crate::programs::{default_programs, load_programs, ProgramMetrics, ProgramRecord};
use crate::projection::{cycle_count, InterventionComparison, ProjectionRequest};
use crate::scenario::ScenarioRunner;

/// A comparison together with the programme row it was recorded as
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub comparison: InterventionComparison,
    pub program: ProgramRecord,
    pub metrics: ProgramMetrics,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    config: AppConfig,
    runner: ScenarioRunner,
    programs: Vec<ProgramRecord>,
    ledger: TokenLedger,
    tokens_issued: u64,
}

impl SessionContext {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let options = config.validation_options();

        let catalogue = if config.diseases_dir.is_dir() {
            DiseaseCatalogue::load_dir(&config.diseases_dir, &options)?
        } else {
            warn!(
                "disease directory {} not found, using the bundled catalogue",
                config.diseases_dir.display()
            );
            DiseaseCatalogue::builtin(&options)?
        };

        let programs = match &config.programs_csv {
            Some(path) => load_programs(path)?,
            None => default_programs(),
        };

        info!(
            "session ready: {} diseases, {} programmes",
            catalogue.len(),
            programs.len()
        );

        Ok(Self {
            config,
            runner: ScenarioRunner::with_catalogue(catalogue),
            programs,
            ledger: TokenLedger::new(),
            tokens_issued: 0,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn validation_options(&self) -> ValidationOptions {
        self.config.validation_options()
    }

    pub fn runner(&self) -> &ScenarioRunner {
        &self.runner
    }

    pub fn catalogue(&self) -> &DiseaseCatalogue {
        self.runner.catalogue()
    }

    pub fn programs(&self) -> &[ProgramRecord] {
        &self.programs
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut TokenLedger {
        &mut self.ledger
    }

    /// Configured default cycle count as an engine-ready value
    pub fn default_num_cycles(&self) -> std::result::Result<u32, ValueError> {
        cycle_count("default_num_cycles", self.config.default_num_cycles)
    }

    /// Add a comparison to the programme table and return the new record
    pub fn record_comparison(&mut self, comparison: &InterventionComparison, cost: f64) -> &ProgramRecord {
        let id = format!("RUN{}", self.programs.len() + 1);
        let index = self.programs.len();
        self.programs.push(ProgramRecord::from_comparison(id, comparison, cost));
        &self.programs[index]
    }

    /// Validate a request, compare it against the baseline and record the result
    pub fn evaluate(&mut self, request: &ProjectionRequest, cost: f64) -> Result<ComparisonReport> {
        let (cohort_size, num_cycles) = request.validated()?;
        let comparison = self.runner.compare(
            &request.disease,
            &request.intervention,
            cohort_size,
            num_cycles,
        )?;
        let program = self.record_comparison(&comparison, cost).clone();
        let metrics = program.metrics();
        Ok(ComparisonReport {
            comparison,
            program,
            metrics,
        })
    }

    /// Mint a token for the QALY gain of a comparison
    ///
    /// Negative gains cannot be tokenised and are rejected by the ledger.
    pub fn issue_token(&mut self, comparison: &InterventionComparison, owner: &str) -> Result<&ImpactToken> {
        let token_id = format!(
            "{}-{}-{}",
            comparison.disease,
            comparison.intervention,
            self.tokens_issued + 1
        );
        let program_id = format!("{}: {}", comparison.disease, comparison.intervention);
        let token = self
            .ledger
            .mint(token_id, owner, program_id, comparison.qaly_gain())?;
        self.tokens_issued += 1;
        Ok(token)
    }
}
