//! Disease model structures and their validation rules

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Key of the untreated comparator arm in every disease file
pub const BASELINE_KEY: &str = "Baseline";

/// Default tolerance for transition matrix row sums
pub const DEFAULT_ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Maximum deviation of the absorbing row from the identity row
const ABSORBING_ROW_TOLERANCE: f64 = 1e-12;

/// Knobs applied when a disease model is checked at the load boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationOptions {
    /// Maximum distance of any row sum from 1.0
    pub row_sum_tolerance: f64,
}

impl ValidationOptions {
    pub fn with_row_tolerance(row_sum_tolerance: f64) -> Self {
        Self { row_sum_tolerance }
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::with_row_tolerance(DEFAULT_ROW_SUM_TOLERANCE)
    }
}

/// Citation backing one of the model parameters (display only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub literature: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// One arm (intervention or baseline) of a disease model
///
/// Can only be built through [`InterventionModel::new`], so every instance
/// satisfies the matrix, utility and mortality invariants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionModel {
    states: Vec<String>,
    transition_matrix: Vec<Vec<f64>>,
    utilities: Vec<f64>,
    mortality_vector: Vec<u8>,
    absorbing_state: usize,
    #[serde(rename = "References", skip_serializing_if = "BTreeMap::is_empty")]
    references: BTreeMap<String, Reference>,
}

impl InterventionModel {
    /// Validate the raw parts and build an immutable model
    pub fn new(
        states: Vec<String>,
        transition_matrix: Vec<Vec<f64>>,
        utilities: Vec<f64>,
        mortality_vector: Vec<u8>,
        references: BTreeMap<String, Reference>,
        options: &ValidationOptions,
    ) -> Result<Self, ConfigurationError> {
        let n = states.len();
        if n == 0 {
            return Err(ConfigurationError::EmptyStates);
        }

        let mut seen = HashSet::with_capacity(n);
        for state in &states {
            if !seen.insert(state.as_str()) {
                return Err(ConfigurationError::DuplicateState(state.clone()));
            }
        }

        check_matrix(&transition_matrix, n, options.row_sum_tolerance)?;

        if utilities.len() != n {
            return Err(ConfigurationError::LengthMismatch {
                field: "utilities",
                len: utilities.len(),
                expected: n,
            });
        }
        for (state, &value) in states.iter().zip(&utilities) {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::UtilityOutOfRange {
                    state: state.clone(),
                    value,
                });
            }
        }

        if mortality_vector.len() != n {
            return Err(ConfigurationError::LengthMismatch {
                field: "mortality_vector",
                len: mortality_vector.len(),
                expected: n,
            });
        }
        for (state, &flag) in states.iter().zip(&mortality_vector) {
            if flag > 1 {
                return Err(ConfigurationError::InvalidMortalityFlag {
                    state: state.clone(),
                    value: flag,
                });
            }
        }

        let flagged: Vec<usize> = mortality_vector
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag == 1)
            .map(|(i, _)| i)
            .collect();
        if flagged.len() != 1 {
            return Err(ConfigurationError::AbsorbingStateCount(flagged.len()));
        }
        let absorbing_state = flagged[0];

        // Checked with its own bound; the row-sum tolerance may be loosened
        let death_row = &transition_matrix[absorbing_state];
        let leaves_absorbing = death_row.iter().enumerate().any(|(col, &p)| {
            if col == absorbing_state {
                (p - 1.0).abs() > ABSORBING_ROW_TOLERANCE
            } else {
                p > ABSORBING_ROW_TOLERANCE
            }
        });
        if leaves_absorbing {
            return Err(ConfigurationError::AbsorbingRow(
                states[absorbing_state].clone(),
            ));
        }
        if utilities[absorbing_state] != 0.0 {
            return Err(ConfigurationError::AbsorbingUtility {
                state: states[absorbing_state].clone(),
                value: utilities[absorbing_state],
            });
        }

        Ok(Self {
            states,
            transition_matrix,
            utilities,
            mortality_vector,
            absorbing_state,
            references,
        })
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn transition_matrix(&self) -> &[Vec<f64>] {
        &self.transition_matrix
    }

    pub fn utilities(&self) -> &[f64] {
        &self.utilities
    }

    pub fn mortality_vector(&self) -> &[u8] {
        &self.mortality_vector
    }

    /// Index of the death state
    pub fn absorbing_state(&self) -> usize {
        self.absorbing_state
    }

    pub fn is_absorbing(&self, state: usize) -> bool {
        self.mortality_vector.get(state) == Some(&1)
    }

    pub fn references(&self) -> &BTreeMap<String, Reference> {
        &self.references
    }
}

fn check_matrix(
    matrix: &[Vec<f64>],
    n: usize,
    tolerance: f64,
) -> Result<(), ConfigurationError> {
    if matrix.len() != n {
        return Err(ConfigurationError::MatrixRowCount {
            rows: matrix.len(),
            expected: n,
        });
    }

    for (row, entries) in matrix.iter().enumerate() {
        if entries.len() != n {
            return Err(ConfigurationError::MatrixRowLength {
                row,
                len: entries.len(),
                expected: n,
            });
        }
        for (col, &value) in entries.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::EntryOutOfRange { row, col, value });
            }
        }
        let sum: f64 = entries.iter().sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(ConfigurationError::RowSum { row, sum, tolerance });
        }
    }

    Ok(())
}

/// All arms defined for one disease, keyed by intervention name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseModel {
    /// Comes from the file name, not the file body
    #[serde(skip_serializing)]
    name: String,
    #[serde(flatten)]
    arms: BTreeMap<String, InterventionModel>,
}

impl DiseaseModel {
    pub fn new(
        name: impl Into<String>,
        arms: BTreeMap<String, InterventionModel>,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if arms.is_empty() {
            return Err(ConfigurationError::InvalidRecord {
                id: name,
                reason: "no interventions defined".to_string(),
            });
        }
        Ok(Self { name, arms })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an arm, failing with the list of keys that do exist
    pub fn arm(&self, key: &str) -> Result<&InterventionModel, ConfigurationError> {
        self.arms
            .get(key)
            .ok_or_else(|| ConfigurationError::UnknownIntervention {
                key: key.to_string(),
                available: self.arms.keys().cloned().collect(),
            })
    }

    pub fn baseline(&self) -> Result<&InterventionModel, ConfigurationError> {
        self.arm(BASELINE_KEY)
    }

    pub fn has_baseline(&self) -> bool {
        self.arms.contains_key(BASELINE_KEY)
    }

    /// Every defined key, including the baseline
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.arms.keys().map(String::as_str)
    }

    /// Selectable interventions (everything except the baseline)
    pub fn interventions(&self) -> Vec<&str> {
        self.keys().filter(|k| *k != BASELINE_KEY).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states() -> Vec<String> {
        ["Healthy", "CVD", "Post-CVD", "Dead"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn matrix() -> Vec<Vec<f64>> {
        vec![
            vec![0.97, 0.012, 0.00, 0.018],
            vec![0.00, 0.82, 0.10, 0.08],
            vec![0.00, 0.00, 0.91, 0.09],
            vec![0.00, 0.00, 0.00, 1.00],
        ]
    }

    fn build(
        matrix: Vec<Vec<f64>>,
        utilities: Vec<f64>,
        mortality: Vec<u8>,
    ) -> Result<InterventionModel, ConfigurationError> {
        InterventionModel::new(
            states(),
            matrix,
            utilities,
            mortality,
            BTreeMap::new(),
            &ValidationOptions::default(),
        )
    }

    #[test]
    fn test_valid_model() {
        let model = build(matrix(), vec![0.85, 0.60, 0.70, 0.0], vec![0, 0, 0, 1]).unwrap();
        assert_eq!(model.num_states(), 4);
        assert_eq!(model.absorbing_state(), 3);
        assert!(model.is_absorbing(3));
        assert!(!model.is_absorbing(0));
    }

    #[test]
    fn test_row_sum_rejected() {
        let mut m = matrix();
        m[0] = vec![0.87, 0.012, 0.00, 0.018];
        let err = build(m, vec![0.85, 0.60, 0.70, 0.0], vec![0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, ConfigurationError::RowSum { row: 0, .. }));
    }

    #[test]
    fn test_loose_tolerance_admits_leaky_row() {
        let mut m = matrix();
        m[0] = vec![0.87, 0.012, 0.00, 0.018];
        let model = InterventionModel::new(
            states(),
            m,
            vec![0.85, 0.60, 0.70, 0.0],
            vec![0, 0, 0, 1],
            BTreeMap::new(),
            &ValidationOptions::with_row_tolerance(0.15),
        );
        assert!(model.is_ok());
    }

    #[test]
    fn test_shape_errors() {
        let mut m = matrix();
        m.pop();
        let err = build(m, vec![0.85, 0.60, 0.70, 0.0], vec![0, 0, 0, 1]).unwrap_err();
        assert_eq!(err, ConfigurationError::MatrixRowCount { rows: 3, expected: 4 });

        let mut m = matrix();
        m[2].push(0.0);
        let err = build(m, vec![0.85, 0.60, 0.70, 0.0], vec![0, 0, 0, 1]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MatrixRowLength { row: 2, len: 5, expected: 4 }
        );
    }

    #[test]
    fn test_entry_out_of_range() {
        let mut m = matrix();
        m[1] = vec![-0.1, 0.92, 0.10, 0.08];
        let err = build(m, vec![0.85, 0.60, 0.70, 0.0], vec![0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, ConfigurationError::EntryOutOfRange { row: 1, col: 0, .. }));
    }

    #[test]
    fn test_utility_and_mortality_checks() {
        let err = build(matrix(), vec![0.85, 1.2, 0.70, 0.0], vec![0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, ConfigurationError::UtilityOutOfRange { .. }));

        let err = build(matrix(), vec![0.85, 0.6, 0.70], vec![0, 0, 0, 1]).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::LengthMismatch { field: "utilities", .. }
        ));

        let err = build(matrix(), vec![0.85, 0.6, 0.70, 0.0], vec![0, 0, 0, 0]).unwrap_err();
        assert_eq!(err, ConfigurationError::AbsorbingStateCount(0));

        let err = build(matrix(), vec![0.85, 0.6, 0.70, 0.0], vec![0, 0, 2, 1]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidMortalityFlag { value: 2, .. }));

        let err = build(matrix(), vec![0.85, 0.6, 0.70, 0.1], vec![0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, ConfigurationError::AbsorbingUtility { .. }));
    }

    #[test]
    fn test_absorbing_row_must_be_identity() {
        let err = build(matrix(), vec![0.85, 0.6, 0.0, 0.0], vec![0, 0, 1, 0]).unwrap_err();
        assert_eq!(err, ConfigurationError::AbsorbingRow("Post-CVD".to_string()));
    }

    #[test]
    fn test_loose_tolerance_keeps_absorbing_row_exact() {
        let err = InterventionModel::new(
            vec!["Healthy".to_string(), "Dead".to_string()],
            vec![vec![0.0, 1.0], vec![0.1, 0.9]],
            vec![0.8, 0.0],
            vec![0, 1],
            BTreeMap::new(),
            &ValidationOptions::with_row_tolerance(0.15),
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::AbsorbingRow("Dead".to_string()));
    }

    #[test]
    fn test_duplicate_and_empty_states() {
        let err = InterventionModel::new(
            vec![],
            vec![],
            vec![],
            vec![],
            BTreeMap::new(),
            &ValidationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyStates);

        let err = InterventionModel::new(
            vec!["Alive".into(), "Alive".into()],
            vec![vec![0.9, 0.1], vec![0.0, 1.0]],
            vec![1.0, 0.0],
            vec![0, 1],
            BTreeMap::new(),
            &ValidationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateState("Alive".into()));
    }

    #[test]
    fn test_disease_lookup() {
        let arm = build(matrix(), vec![0.85, 0.60, 0.70, 0.0], vec![0, 0, 0, 1]).unwrap();
        let mut arms = BTreeMap::new();
        arms.insert("Statins".to_string(), arm.clone());
        arms.insert(BASELINE_KEY.to_string(), arm);
        let disease = DiseaseModel::new("Hypercholesterolemia", arms).unwrap();

        assert_eq!(disease.interventions(), vec!["Statins"]);
        assert!(disease.has_baseline());
        match disease.arm("PCSK9").unwrap_err() {
            ConfigurationError::UnknownIntervention { key, available } => {
                assert_eq!(key, "PCSK9");
                assert_eq!(available, vec!["Baseline".to_string(), "Statins".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
