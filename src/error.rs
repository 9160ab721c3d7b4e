//! Error types shared by the projection, discounting and record-keeping modules

use thiserror::Error;

/// A disease model, programme table or parameter file that cannot be used as given
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("model has no states")]
    EmptyStates,

    #[error("state name {0:?} appears more than once")]
    DuplicateState(String),

    #[error("transition matrix has {rows} rows, expected {expected}")]
    MatrixRowCount { rows: usize, expected: usize },

    #[error("transition matrix row {row} has {len} entries, expected {expected}")]
    MatrixRowLength { row: usize, len: usize, expected: usize },

    #[error("transition matrix entry [{row}][{col}] = {value} is outside [0, 1]")]
    EntryOutOfRange { row: usize, col: usize, value: f64 },

    #[error("transition matrix row {row} sums to {sum}, expected 1.0 (tolerance {tolerance})")]
    RowSum { row: usize, sum: f64, tolerance: f64 },

    #[error("{field} has {len} entries, expected one per state ({expected})")]
    LengthMismatch { field: &'static str, len: usize, expected: usize },

    #[error("utility for state {state:?} is {value}, expected a value in [0, 1]")]
    UtilityOutOfRange { state: String, value: f64 },

    #[error("mortality flag for state {state:?} is {value}, expected 0 or 1")]
    InvalidMortalityFlag { state: String, value: u8 },

    #[error("expected exactly one absorbing death state, found {0}")]
    AbsorbingStateCount(usize),

    #[error("absorbing state {0:?} must transition only to itself")]
    AbsorbingRow(String),

    #[error("absorbing state {state:?} has utility {value}, expected 0")]
    AbsorbingUtility { state: String, value: f64 },

    #[error("intervention {key:?} not defined (available: {available:?})")]
    UnknownIntervention { key: String, available: Vec<String> },

    #[error("disease {0:?} not found in catalogue")]
    UnknownDisease(String),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("invalid record {id:?}: {reason}")]
    InvalidRecord { id: String, reason: String },
}

/// A numeric input outside the domain the calculators accept
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("cohort size must be positive, got {0}")]
    NonPositiveCohort(f64),

    #[error("{field} must not be negative, got {value}")]
    NegativeCycles { field: &'static str, value: i64 },

    #[error("{field} = {value} is out of range: {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("treatment duration {duration} exceeds calculation period {horizon}")]
    TreatmentExceedsHorizon { duration: u32, horizon: u32 },
}

/// Failures of the impact-token ownership log
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("token {0:?} already minted")]
    DuplicateToken(String),

    #[error("token {0:?} does not exist")]
    UnknownToken(String),

    #[error("token {token_id:?} is owned by {owner:?}, not {claimed:?}")]
    OwnerMismatch {
        token_id: String,
        owner: String,
        claimed: String,
    },

    #[error("token {0:?} cannot be transferred to its current owner")]
    SelfTransfer(String),

    #[error("token QALY amount must be finite and non-negative, got {0}")]
    InvalidQalys(f64),
}

/// Umbrella error returned by loaders and runners
#[derive(Debug, Error)]
pub enum QalyError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("invalid value: {0}")]
    Value(#[from] ValueError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = QalyError> = std::result::Result<T, E>;
