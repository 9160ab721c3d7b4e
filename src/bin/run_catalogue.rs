//! Compare every intervention in the disease catalogue against its baseline
//!
//! Outputs per-cycle totals aggregated across all comparisons

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use qaly_system::{AppConfig, SessionContext};

/// Per-cycle totals across all comparisons
#[derive(Debug, Clone, Default)]
struct AggregatedRow {
    cycle: usize,
    treated_alive: f64,
    baseline_alive: f64,
    treated_qalys: f64,
    baseline_qalys: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let start = Instant::now();
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(&path).with_context(|| format!("Failed to load configuration from {path}"))?,
        None => AppConfig::default(),
    };
    println!("Loading disease catalogue from {}...", config.diseases_dir.display());

    let session = SessionContext::from_config(config).context("Failed to initialise session")?;
    let cohort_size = session.config().default_cohort_size;
    let num_cycles = session.default_num_cycles()?;
    println!(
        "Loaded {} diseases in {:?}",
        session.catalogue().len(),
        start.elapsed()
    );

    println!("Running comparisons (cohort {cohort_size}, {num_cycles} cycles)...");
    let proj_start = Instant::now();
    let comparisons = session
        .runner()
        .run_catalogue_parallel(cohort_size, num_cycles)?;
    println!(
        "{} comparisons complete in {:?}",
        comparisons.len(),
        proj_start.elapsed()
    );

    let mut aggregated: Vec<AggregatedRow> = (0..=num_cycles as usize)
        .map(|cycle| AggregatedRow { cycle, ..Default::default() })
        .collect();

    for comparison in &comparisons {
        let arms = [
            (comparison.treated.alive_trace(), comparison.treated.qalys_by_cycle()),
            (comparison.baseline.alive_trace(), comparison.baseline.qalys_by_cycle()),
        ];
        for (idx, agg) in aggregated.iter_mut().enumerate() {
            agg.treated_alive += arms[0].0[idx];
            agg.treated_qalys += arms[0].1[idx];
            agg.baseline_alive += arms[1].0[idx];
            agg.baseline_qalys += arms[1].1[idx];
        }
    }

    let output_path = "catalogue_projection_output.csv";
    let mut file = BufWriter::new(File::create(output_path).context("Failed to create output file")?);

    writeln!(file, "Cycle,TreatedAlive,BaselineAlive,TreatedQALYs,BaselineQALYs,QALYGain")?;
    for row in &aggregated {
        writeln!(
            file,
            "{},{:.4},{:.4},{:.4},{:.4},{:.4}",
            row.cycle,
            row.treated_alive,
            row.baseline_alive,
            row.treated_qalys,
            row.baseline_qalys,
            row.treated_qalys - row.baseline_qalys,
        )?;
    }
    file.flush()?;

    println!("Output written to {}", output_path);

    println!("\nCatalogue Summary:");
    for c in &comparisons {
        println!(
            "  {:<22} {:<22} gain={:>10.2} QALYs, lives saved={:>8.2}",
            c.disease,
            c.intervention,
            c.qaly_gain(),
            c.lives_saved()
        );
    }
    let total_gain: f64 = comparisons.iter().map(|c| c.qaly_gain()).sum();
    println!("  Total QALY gain: {:.2}", total_gain);

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
