//! Transaction models for CSV parsing and internal representation.

use crate::error::ValidationError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fmt;

/// Store-assigned transaction identifier.
///
/// Ids are handed out in insertion order, so comparing two ids tells which
/// record was stored first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a payer name into its balance key.
///
/// Payers are grouped case-insensitively; the uppercased form is the
/// canonical key.
pub fn payer_key(payer: &str) -> String {
    payer.trim().to_uppercase()
}

/// Parses an ISO-8601 date-time.
///
/// Accepts RFC 3339 (`Z` or a numeric offset). Date-times without an offset,
/// and bare dates, are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, ValidationError> {
    let trimmed = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))
}

/// A stored point grant.
///
/// # Invariants
///
/// - `points >= 0` for every record the store accepts
/// - `points` only ever decreases, through spend deductions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Assigned by the store on insert.
    pub id: TransactionId,

    /// Payer name as granted (trimmed, case preserved).
    pub payer: String,

    /// Points still unspent on this grant.
    pub points: i64,

    /// When the points were earned. Spends consume oldest first.
    pub timestamp: DateTime<FixedOffset>,
}

impl Transaction {
    /// Returns the normalized key this transaction's points are grouped under.
    pub fn payer_key(&self) -> String {
        payer_key(&self.payer)
    }
}

/// A validated grant that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub payer: String,
    pub points: i64,
    pub timestamp: DateTime<FixedOffset>,
}

impl NewTransaction {
    /// Builds a grant, trimming the payer and rejecting negative points.
    pub fn new(
        payer: &str,
        points: i64,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<Self, ValidationError> {
        let grant = NewTransaction {
            payer: payer.trim().to_string(),
            points,
            timestamp,
        };
        grant.validate()?;
        Ok(grant)
    }

    /// Checks the invariants every stored record must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.payer.trim().is_empty() {
            return Err(ValidationError::InvalidPayer);
        }
        if self.points < 0 {
            return Err(ValidationError::NegativePoints(self.points));
        }
        Ok(())
    }
}

/// Raw grant row as read from CSV.
#[derive(Debug, Deserialize)]
pub struct TransactionRecord {
    /// Payer name
    pub payer: String,

    /// Points granted (must be non-negative)
    pub points: i64,

    /// ISO-8601 date-time the points were earned
    pub timestamp: String,
}

impl TransactionRecord {
    /// Validates the raw CSV row into a grant ready for the store.
    pub fn parse(&self) -> Result<NewTransaction, ValidationError> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        NewTransaction::new(&self.payer, self.points, timestamp)
    }
}
