//! Programme summary records and derived dashboard metrics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::projection::InterventionComparison;

/// One intervention programme as listed in the QALY summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Intervention")]
    pub intervention: String,
    #[serde(rename = "Population")]
    pub population: f64,
    #[serde(rename = "Non-treated Pop")]
    pub non_treated_pop: f64,
    #[serde(rename = "Treated Pop")]
    pub treated_pop: f64,
    #[serde(rename = "Avg QAlY Gain")]
    pub avg_qaly_gain: f64,
    #[serde(rename = "Tot QALY Gain")]
    pub total_qaly_gain: f64,
    /// Cost per treated member
    #[serde(rename = "Cost")]
    pub cost: f64,
}

/// Metrics derived from a single record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramMetrics {
    pub qaly_per_1000: f64,
    /// `None` when the programme shows no average gain
    pub cost_per_qaly: Option<f64>,
    pub treatment_rate_pct: f64,
    pub label: String,
    pub total_cost_thousands: f64,
}

impl ProgramRecord {
    /// Summarise a Markov comparison as a programme row
    ///
    /// Head counts are rounded to whole people; gains are kept unrounded.
    pub fn from_comparison(id: impl Into<String>, comparison: &InterventionComparison, cost: f64) -> Self {
        Self {
            id: id.into(),
            disease: comparison.disease.clone(),
            intervention: comparison.intervention.clone(),
            population: comparison.treated.cohort_size,
            non_treated_pop: comparison.untreated_alive().round(),
            treated_pop: comparison.treated_alive().round(),
            avg_qaly_gain: comparison.avg_qaly_gain(),
            total_qaly_gain: comparison.qaly_gain(),
            cost,
        }
    }

    pub fn metrics(&self) -> ProgramMetrics {
        ProgramMetrics {
            qaly_per_1000: self.total_qaly_gain * 1000.0 / self.population,
            cost_per_qaly: if self.avg_qaly_gain != 0.0 {
                Some(self.cost / self.avg_qaly_gain)
            } else {
                None
            },
            treatment_rate_pct: self.treated_pop / self.population * 100.0,
            label: format!("{}: {}", self.disease, self.intervention),
            total_cost_thousands: self.cost * self.treated_pop / 1000.0,
        }
    }
}

/// Headline figures across a set of programmes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub total_qaly_gain: f64,
    /// Total spend divided by total QALY gain
    pub avg_cost_per_qaly: Option<f64>,
    /// Programme with the largest total gain
    pub highest_impact: String,
    /// Programme with the largest gain per 1000 people
    pub most_efficient: String,
}

impl KeyMetrics {
    pub fn from_records(records: &[ProgramRecord]) -> Option<Self> {
        let highest = records
            .iter()
            .max_by(|a, b| a.total_qaly_gain.total_cmp(&b.total_qaly_gain))?;
        let efficient = records.iter().max_by(|a, b| {
            a.metrics()
                .qaly_per_1000
                .total_cmp(&b.metrics().qaly_per_1000)
        })?;

        let total_qaly_gain: f64 = records.iter().map(|r| r.total_qaly_gain).sum();
        let total_spend: f64 = records.iter().map(|r| r.cost * r.treated_pop).sum();

        Some(Self {
            total_qaly_gain,
            avg_cost_per_qaly: if total_qaly_gain != 0.0 {
                Some(total_spend / total_qaly_gain)
            } else {
                None
            },
            highest_impact: format!("{} ({})", highest.intervention, highest.disease),
            most_efficient: format!("{} ({})", efficient.intervention, efficient.disease),
        })
    }
}

/// Gain and population totals for one disease category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseSummary {
    pub disease: String,
    pub total_qaly_gain: f64,
    pub population: f64,
    pub programs: usize,
}

pub fn summarize_by_disease(records: &[ProgramRecord]) -> Vec<DiseaseSummary> {
    let mut groups: BTreeMap<&str, DiseaseSummary> = BTreeMap::new();
    for record in records {
        let entry = groups
            .entry(record.disease.as_str())
            .or_insert_with(|| DiseaseSummary {
                disease: record.disease.clone(),
                total_qaly_gain: 0.0,
                population: 0.0,
                programs: 0,
            });
        entry.total_qaly_gain += record.total_qaly_gain;
        entry.population += record.population;
        entry.programs += 1;
    }
    groups.into_values().collect()
}

/// Records whose disease is in `diseases`; an empty filter keeps everything
pub fn filter_by_diseases<'a>(records: &'a [ProgramRecord], diseases: &[String]) -> Vec<&'a ProgramRecord> {
    records
        .iter()
        .filter(|r| diseases.is_empty() || diseases.iter().any(|d| d == &r.disease))
        .collect()
}

/// Embedded demo table used when no summary file is configured
pub fn default_programs() -> Vec<ProgramRecord> {
    let rows: [(&str, &str, &str, f64, f64, f64, f64, f64, f64); 8] = [
        ("BP1", "Hypertension", "Thiazide diuretics", 5000.0, 3981.0, 4485.0, 1.31, 7699.0, 12.0),
        ("BP2", "Hypertension", "ACE Inhibitors", 4000.0, 3184.0, 3654.0, 1.49, 7059.0, 72.0),
        ("BP3", "Hypertension", "ARBs", 10000.0, 7962.0, 9135.0, 1.58, 18489.0, 72.0),
        ("BP4", "Hypertension", "Calcium Channel Blockers", 12000.0, 9554.0, 10862.0, 1.23, 17809.0, 60.0),
        ("BP5", "Hypertension", "Beta Blockers", 4000.0, 3184.0, 3555.0, 1.05, 5049.0, 60.0),
        ("LDL1", "Hypercholesterolemia", "Statins", 14000.0, 11672.0, 12789.0, 1.41, 22061.0, 54.0),
        ("LDL2", "Hypercholesterolemia", "Ezetimibe", 1000.0, 834.0, 905.0, 1.14, 1295.0, 120.0),
        ("LDL3", "Hypercholesterolemia", "PCSK9", 100.0, 83.0, 92.0, 1.67, 186.0, 7200.0),
    ];

    rows.iter()
        .map(|&(id, disease, intervention, population, non_treated, treated, avg, total, cost)| {
            ProgramRecord {
                id: id.to_string(),
                disease: disease.to_string(),
                intervention: intervention.to_string(),
                population,
                non_treated_pop: non_treated,
                treated_pop: treated,
                avg_qaly_gain: avg,
                total_qaly_gain: total,
                cost,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_record_metrics() {
        let records = default_programs();
        let statins = records.iter().find(|r| r.id == "LDL1").unwrap();
        let m = statins.metrics();

        assert_relative_eq!(m.qaly_per_1000, 22061.0 * 1000.0 / 14000.0, epsilon = 1e-9);
        assert_relative_eq!(m.cost_per_qaly.unwrap(), 54.0 / 1.41, epsilon = 1e-9);
        assert_relative_eq!(m.treatment_rate_pct, 12789.0 / 14000.0 * 100.0, epsilon = 1e-9);
        assert_eq!(m.label, "Hypercholesterolemia: Statins");
        assert_relative_eq!(m.total_cost_thousands, 54.0 * 12789.0 / 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_gain_has_no_cost_per_qaly() {
        let mut record = default_programs().remove(0);
        record.avg_qaly_gain = 0.0;
        assert_eq!(record.metrics().cost_per_qaly, None);
    }

    #[test]
    fn test_key_metrics() {
        let records = default_programs();
        let key = KeyMetrics::from_records(&records).unwrap();

        assert_relative_eq!(key.total_qaly_gain, 79_647.0, epsilon = 1e-9);
        assert_eq!(key.highest_impact, "Statins (Hypercholesterolemia)");
        // PCSK9: 186 QALYs over 100 people
        assert_eq!(key.most_efficient, "PCSK9 (Hypercholesterolemia)");
        assert!(KeyMetrics::from_records(&[]).is_none());
    }

    #[test]
    fn test_summary_and_filter() {
        let records = default_programs();
        let summary = summarize_by_disease(&records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].disease, "Hypercholesterolemia");
        assert_eq!(summary[0].programs, 3);
        assert_relative_eq!(summary[0].total_qaly_gain, 23_542.0);
        assert_relative_eq!(summary[1].population, 35_000.0);

        let filtered = filter_by_diseases(&records, &["Hypertension".to_string()]);
        assert_eq!(filtered.len(), 5);
        assert_eq!(filter_by_diseases(&records, &[]).len(), 8);
    }
}
