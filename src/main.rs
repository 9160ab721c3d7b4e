//! QALY System CLI
//!
//! Command-line interface for cohort projections, intervention comparisons,
//! the discounted gain calculator and the programme summary table

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use qaly_system::discounting::loader::{load_parameter_sets, load_parameters};
use qaly_system::programs::{filter_by_diseases, summarize_by_disease, KeyMetrics};
use qaly_system::projection::{round_to, ProjectionRequest};
use qaly_system::{calculate_qaly_gain, AppConfig, DiscountParams, SessionContext};

#[derive(Debug, Parser)]
#[command(name = "qaly", version, about = "Cohort QALY projections for health-intervention programmes")]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Project one intervention arm of a disease
    Project {
        disease: String,
        intervention: String,
        #[arg(long)]
        cohort: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        cycles: Option<i64>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Write the per-cycle state trace to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Compare an intervention against the disease's baseline arm
    Compare {
        disease: String,
        intervention: String,
        #[arg(long)]
        cohort: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        cycles: Option<i64>,
        /// Cost per treated member, used for cost per QALY
        #[arg(long, default_value_t = 0.0)]
        cost: f64,
        /// Mint an impact token for the gain to this owner
        #[arg(long)]
        token_owner: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Run the discounted individual/population gain calculator
    Gain {
        /// Flat parameter JSON file
        #[arg(long, conflicts_with = "set")]
        params: Option<PathBuf>,
        /// Named set from the configured parameter file
        #[arg(long)]
        set: Option<String>,
        #[arg(long)]
        json: bool,
        /// Write the per-cycle vectors to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Summarise the programme table
    Programs {
        /// Only include these diseases (repeatable)
        #[arg(long = "disease")]
        diseases: Vec<String>,
        #[arg(long)]
        json: bool,
    },

    /// Compare every intervention in the disease catalogue
    Catalogue {
        #[arg(long)]
        cohort: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        cycles: Option<i64>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    let mut session = SessionContext::from_config(config).context("Failed to initialise session")?;

    match cli.command {
        Command::Project { disease, intervention, cohort, cycles, json, csv } => {
            let request = build_request(&session, disease, intervention, cohort, cycles);
            let result = session.runner().run_request(&request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let report = result.report();
                println!("Projection: {} / {}", request.disease, report.intervention);
                println!("  Cohort: {}", report.cohort_size);
                println!("  Cycles: {}", report.num_cycles);
                println!("  Total QALYs: {:.2}", report.total_qalys);
                println!("  Total Life-Years: {:.2}", report.total_life_years);
                println!("  Final Alive: {:.2}", report.final_alive);
                println!();
                print!("{:>5}", "Cycle");
                for state in &result.states {
                    print!(" {:>12}", state);
                }
                println!();
                for (cycle, occupancy) in result.state_trace.iter().enumerate() {
                    print!("{:>5}", cycle);
                    for count in occupancy {
                        print!(" {:>12.2}", count);
                    }
                    println!();
                }
            }

            if let Some(path) = csv {
                result.write_trace_csv(create(&path)?)?;
                println!("\nState trace written to: {}", path.display());
            }
        }

        Command::Compare { disease, intervention, cohort, cycles, cost, token_owner, json } => {
            let request = build_request(&session, disease, intervention, cohort, cycles);
            let report = session.evaluate(&request, cost)?;
            let comparison = &report.comparison;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Comparison: {} / {} vs Baseline", comparison.disease, comparison.intervention);
                println!("  Treated QALYs:  {:.2}", round_to(comparison.treated.total_qalys, 2));
                println!("  Baseline QALYs: {:.2}", round_to(comparison.baseline.total_qalys, 2));
                println!("  QALY Gain:      {:.2}", round_to(comparison.qaly_gain(), 2));
                println!("  Life-Year Gain: {:.2}", round_to(comparison.life_year_gain(), 2));
                println!("  Avg QALY Gain:  {:.4}", comparison.avg_qaly_gain());
                println!("  Lives Saved:    {:.2}", round_to(comparison.lives_saved(), 2));
                println!("  QALY per 1000:  {:.2}", report.metrics.qaly_per_1000);
                match report.metrics.cost_per_qaly {
                    Some(value) => println!("  Cost per QALY:  {:.2}", value),
                    None => println!("  Cost per QALY:  n/a"),
                }
            }

            if let Some(owner) = token_owner {
                let token = session.issue_token(&report.comparison, &owner)?;
                println!("\nMinted token {} ({:.2} QALYs) to {}", token.token_id, token.qalys, token.owner);
            }
        }

        Command::Gain { params, set, json, csv } => {
            let params = gain_params(&session, params.as_deref(), set.as_deref())?;
            let result = calculate_qaly_gain(&params)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let ind = &result.individual;
                let pop = &result.population;
                println!(
                    "Discounted QALY gain ({} cycles, treatment {} cycles)",
                    params.calculation_period, params.treatment_duration
                );
                println!("  Individual QALY (ill):     {:.4}", ind.qaly_ill);
                println!("  Individual QALY (treated): {:.4}", ind.qaly_trt);
                println!("  Individual QALY gain:      {:.4}", ind.qaly_gain);
                println!("  Population QALY (ill):     {:.2}", pop.pop_qaly_ill);
                println!("  Population QALY (treated): {:.2}", pop.pop_qaly_trt);
                println!("  Population QALY gain:      {:.2}", pop.pop_qaly_gain);
                println!("  Lives saved:               {:.2}", result.lives_saved());
            }

            if let Some(path) = csv {
                result.write_timeseries_csv(create(&path)?)?;
                println!("\nTime series written to: {}", path.display());
            }
        }

        Command::Programs { diseases, json } => {
            let records: Vec<_> = filter_by_diseases(session.programs(), &diseases)
                .into_iter()
                .cloned()
                .collect();
            let key = KeyMetrics::from_records(&records)
                .ok_or_else(|| anyhow!("No programmes match the selected diseases"))?;

            if json {
                let output = serde_json::json!({
                    "keyMetrics": key,
                    "byDisease": summarize_by_disease(&records),
                    "programs": records,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("Programmes: {}", records.len());
                println!("  Total QALY Gain:   {:.0}", key.total_qaly_gain);
                match key.avg_cost_per_qaly {
                    Some(value) => println!("  Avg Cost per QALY: {:.2}", value),
                    None => println!("  Avg Cost per QALY: n/a"),
                }
                println!("  Highest Impact:    {}", key.highest_impact);
                println!("  Most Efficient:    {}", key.most_efficient);
                println!();
                println!(
                    "{:>5} {:<42} {:>10} {:>12} {:>10} {:>14}",
                    "ID", "Intervention", "Population", "QALY Gain", "QALY/1000", "Cost/QALY"
                );
                println!("{}", "-".repeat(98));
                for record in &records {
                    let m = record.metrics();
                    println!(
                        "{:>5} {:<42} {:>10.0} {:>12.0} {:>10.2} {:>14}",
                        record.id,
                        m.label,
                        record.population,
                        record.total_qaly_gain,
                        m.qaly_per_1000,
                        m.cost_per_qaly
                            .map(|v| format!("{:.2}", v))
                            .unwrap_or_else(|| "n/a".to_string()),
                    );
                }
            }
        }

        Command::Catalogue { cohort, cycles, json } => {
            let (cohort_size, num_cycles) =
                build_request(&session, String::new(), String::new(), cohort, cycles).validated()?;
            let comparisons = session
                .runner()
                .run_catalogue_parallel(cohort_size, num_cycles)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&comparisons)?);
            } else {
                println!(
                    "{:<24} {:<24} {:>14} {:>14} {:>12}",
                    "Disease", "Intervention", "Treated QALYs", "QALY Gain", "Lives Saved"
                );
                println!("{}", "-".repeat(92));
                for c in &comparisons {
                    println!(
                        "{:<24} {:<24} {:>14.2} {:>14.2} {:>12.2}",
                        c.disease,
                        c.intervention,
                        c.treated.total_qalys,
                        c.qaly_gain(),
                        c.lives_saved()
                    );
                }
            }
        }
    }

    Ok(())
}

fn build_request(
    session: &SessionContext,
    disease: String,
    intervention: String,
    cohort: Option<f64>,
    cycles: Option<i64>,
) -> ProjectionRequest {
    ProjectionRequest {
        disease,
        intervention,
        cohort_size: cohort.unwrap_or(session.config().default_cohort_size),
        num_cycles: cycles.unwrap_or(session.config().default_num_cycles),
    }
}

/// Parameters for the gain calculator: an explicit file, a named set, or the stunting preset
fn gain_params(session: &SessionContext, file: Option<&Path>, set: Option<&str>) -> Result<DiscountParams> {
    if let Some(path) = file {
        return load_parameters(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display()));
    }

    match set {
        Some(name) => {
            let path = &session.config().parameters_file;
            let mut sets = load_parameter_sets(path)
                .with_context(|| format!("Failed to load parameter sets from {}", path.display()))?;
            let available: Vec<String> = sets.keys().cloned().collect();
            sets.remove(name).ok_or_else(|| {
                anyhow!("Parameter set {:?} not found (available: {})", name, available.join(", "))
            })
        }
        None => {
            info!("no parameters given, using the stunting preset");
            Ok(DiscountParams::stunting())
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}
