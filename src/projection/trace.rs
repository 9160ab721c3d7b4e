//! Output structures for cohort projections

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Round a value for display; never applied before aggregation
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Complete result of one cohort projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Intervention key the projection ran for
    pub intervention: String,

    pub cohort_size: f64,

    pub num_cycles: u32,

    /// Undiscounted QALYs summed over every cycle, cycle 0 included
    #[serde(rename = "totalQALYs")]
    pub total_qalys: f64,

    /// Occupancy of non-absorbing states summed over every cycle
    pub total_life_years: f64,

    pub final_state_distribution: Vec<f64>,

    /// Occupancy vectors for cycles 0..=num_cycles
    pub state_trace: Vec<Vec<f64>>,

    pub states: Vec<String>,

    /// Index of the absorbing state within `states`
    pub absorbing_state: usize,

    /// Per-state utilities used for the QALY accrual
    pub utilities: Vec<f64>,
}

impl SimulationResult {
    /// Alive count per cycle
    pub fn alive_trace(&self) -> Vec<f64> {
        self.state_trace
            .iter()
            .map(|v| {
                v.iter()
                    .enumerate()
                    .filter(|(j, _)| *j != self.absorbing_state)
                    .map(|(_, x)| x)
                    .sum::<f64>()
            })
            .collect()
    }

    /// Alive fraction of the starting cohort per cycle
    pub fn survival_curve(&self) -> Vec<f64> {
        self.alive_trace()
            .into_iter()
            .map(|alive| alive / self.cohort_size)
            .collect()
    }

    /// QALY contribution of each cycle
    pub fn qalys_by_cycle(&self) -> Vec<f64> {
        self.state_trace
            .iter()
            .map(|v| v.iter().zip(&self.utilities).map(|(x, u)| x * u).sum::<f64>())
            .collect()
    }

    /// Members still alive after the last cycle
    pub fn final_alive(&self) -> f64 {
        self.final_state_distribution
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != self.absorbing_state)
            .map(|(_, x)| x)
            .sum()
    }

    /// Presentation view with totals rounded to 2 decimals
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            intervention: self.intervention.clone(),
            cohort_size: self.cohort_size,
            num_cycles: self.num_cycles,
            total_qalys: round_to(self.total_qalys, 2),
            total_life_years: round_to(self.total_life_years, 2),
            final_alive: round_to(self.final_alive(), 2),
        }
    }

    /// Write the state trace as CSV: cycle, one column per state, alive, QALYs
    pub fn write_trace_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec!["Cycle".to_string()];
        header.extend(self.states.iter().cloned());
        header.push("Alive".to_string());
        header.push("QALYs".to_string());
        wtr.write_record(&header)?;

        let alive = self.alive_trace();
        let qalys = self.qalys_by_cycle();
        for (cycle, occupancy) in self.state_trace.iter().enumerate() {
            let mut record = vec![cycle.to_string()];
            record.extend(occupancy.iter().map(|x| format!("{:.6}", x)));
            record.push(format!("{:.6}", alive[cycle]));
            record.push(format!("{:.6}", qalys[cycle]));
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Rounded summary of a projection for display collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub intervention: String,
    pub cohort_size: f64,
    pub num_cycles: u32,
    #[serde(rename = "totalQALYs")]
    pub total_qalys: f64,
    pub total_life_years: f64,
    pub final_alive: f64,
}

/// Intervention arm projected side by side with the baseline arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionComparison {
    pub disease: String,
    pub intervention: String,
    pub treated: SimulationResult,
    pub baseline: SimulationResult,
}

impl InterventionComparison {
    pub fn qaly_gain(&self) -> f64 {
        self.treated.total_qalys - self.baseline.total_qalys
    }

    pub fn life_year_gain(&self) -> f64 {
        self.treated.total_life_years - self.baseline.total_life_years
    }

    /// QALY gain per member of the starting cohort
    pub fn avg_qaly_gain(&self) -> f64 {
        self.qaly_gain() / self.treated.cohort_size
    }

    /// Survivors at the end of the projection with treatment
    pub fn treated_alive(&self) -> f64 {
        self.treated.final_alive()
    }

    /// Survivors at the end of the projection without treatment
    pub fn untreated_alive(&self) -> f64 {
        self.baseline.final_alive()
    }

    pub fn lives_saved(&self) -> f64 {
        self.treated_alive() - self.untreated_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimulationResult {
        SimulationResult {
            intervention: "Statins".into(),
            cohort_size: 100.0,
            num_cycles: 1,
            total_qalys: 160.333333,
            total_life_years: 190.0,
            final_state_distribution: vec![80.0, 10.0, 10.0],
            state_trace: vec![vec![100.0, 0.0, 0.0], vec![80.0, 10.0, 10.0]],
            states: vec!["Well".into(), "Sick".into(), "Dead".into()],
            absorbing_state: 2,
            utilities: vec![0.9, 0.5, 0.0],
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(15967.004, 2), 15967.0);
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_derived_curves() {
        let result = sample();
        assert_eq!(result.alive_trace(), vec![100.0, 90.0]);
        assert_eq!(result.survival_curve(), vec![1.0, 0.9]);
        assert_eq!(result.final_alive(), 90.0);

        let qalys = result.qalys_by_cycle();
        assert!((qalys[0] - 90.0).abs() < 1e-9);
        assert!((qalys[1] - 77.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_rounds_at_boundary() {
        let report = sample().report();
        assert_eq!(report.total_qalys, 160.33);
        assert_eq!(report.final_alive, 90.0);
    }

    #[test]
    fn test_json_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        for key in [
            "totalQALYs",
            "totalLifeYears",
            "finalStateDistribution",
            "stateTrace",
            "states",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["absorbingState"], 2);
    }

    #[test]
    fn test_trace_csv() {
        let mut buf = Vec::new();
        sample().write_trace_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Cycle,Well,Sick,Dead,Alive,QALYs");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("1,80.000000,10.000000,10.000000,90.000000,77.000000"));
    }
}
