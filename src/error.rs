//! Error types for the points ledger.

use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Malformed input rejected at the request boundary or by the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent from the request
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// The request body is not a JSON object
    #[error("Request body must be a JSON object")]
    NotAnObject,

    /// Payer is not a string, or is empty after trimming whitespace
    #[error("Invalid 'payer': it must be a non-empty string")]
    InvalidPayer,

    /// Points is not an integer (e.g. a float or a numeric string)
    #[error("Invalid '{0}': it must be an integer")]
    NotAnInteger(&'static str),

    /// Points is below zero
    #[error("Invalid points {0}: must be 0 or greater")]
    NegativePoints(i64),

    /// Points would overflow the ledger's integer range
    #[error("Invalid points {0}: exceeds the ledger's range")]
    PointsOutOfRange(u64),

    /// Timestamp is missing, not a string, or not ISO-8601
    #[error("Invalid 'timestamp' {0:?}: must be an ISO 8601 date-time string")]
    InvalidTimestamp(String),
}

/// Errors that can occur during ledger operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Request or record rejected before touching the ledger
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A spend was requested but the ledger holds no transactions
    #[error("No transactions available to spend points")]
    InsufficientHistory,

    /// A spend exceeds the points available across all payers
    #[error("Not enough points to spend: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: i64 },

    /// A payer's aggregated balance was already negative before the spend
    #[error("Corrupt ledger: payer {payer} has negative balance {balance}")]
    CorruptLedger { payer: String, balance: i64 },

    /// The store could not apply a deduction set
    #[error("Commit failed: {0}")]
    Commit(String),

    /// The ledger changed between planning and committing a spend
    #[error("Race detected: {0}")]
    RaceDetected(String),

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: points-ledger <transactions.csv> [points_to_spend]")]
    MissingArgument,

    /// Command-line argument that could not be parsed
    #[error("Invalid argument {0:?}: points to spend must be a non-negative integer")]
    InvalidArgument(String),
}

impl LedgerError {
    /// Returns `true` if the caller is at fault (bad input or not enough points).
    ///
    /// Corruption, commit and race failures are server-side faults; a race may be
    /// retried by re-issuing the whole spend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_)
                | LedgerError::InsufficientHistory
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::MissingArgument
                | LedgerError::InvalidArgument(_)
        )
    }

    /// Returns `true` if re-issuing the same spend from scratch may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::RaceDetected(_))
    }
}
