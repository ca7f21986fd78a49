//! JSON request handling for the add, spend and balance operations.
//!
//! Request bodies arrive as untyped JSON so that type errors (a numeric string
//! for `points`, a number for `payer`) are reported as validation failures
//! instead of generic decode errors. Transport and status codes belong to the
//! caller; [`LedgerError::is_client_error`] tells it which side is at fault.

use crate::engine::LedgerEngine;
use crate::error::{LedgerError, Result, ValidationError};
use crate::store::TransactionStore;
use crate::transaction::{parse_timestamp, NewTransaction, TransactionId};
use serde_json::{Map, Value};

fn as_object(body: &Value) -> std::result::Result<&Map<String, Value>, ValidationError> {
    body.as_object().ok_or(ValidationError::NotAnObject)
}

fn field<'a>(
    object: &'a Map<String, Value>,
    name: &'static str,
) -> std::result::Result<&'a Value, ValidationError> {
    object.get(name).ok_or(ValidationError::MissingField(name))
}

/// Reads a non-negative integer field.
fn points_field(
    object: &Map<String, Value>,
    name: &'static str,
) -> std::result::Result<u64, ValidationError> {
    let value = field(object, name)?;
    if let Some(points) = value.as_u64() {
        return Ok(points);
    }
    match value.as_i64() {
        Some(negative) => Err(ValidationError::NegativePoints(negative)),
        None => Err(ValidationError::NotAnInteger(name)),
    }
}

/// Validates an add request body (`{"payer", "points", "timestamp"}`).
pub fn parse_add_request(body: &Value) -> std::result::Result<NewTransaction, ValidationError> {
    let object = as_object(body)?;

    // Report every missing field the same way before looking at types.
    for name in ["payer", "points", "timestamp"] {
        field(object, name)?;
    }

    let payer = field(object, "payer")?
        .as_str()
        .ok_or(ValidationError::InvalidPayer)?;

    let points = points_field(object, "points")?;
    let points = i64::try_from(points).map_err(|_| ValidationError::PointsOutOfRange(points))?;

    let timestamp = match field(object, "timestamp")? {
        Value::String(raw) => parse_timestamp(raw)?,
        other => return Err(ValidationError::InvalidTimestamp(other.to_string())),
    };

    NewTransaction::new(payer, points, timestamp)
}

/// Validates a spend request body (`{"points"}`).
pub fn parse_spend_request(body: &Value) -> std::result::Result<u64, ValidationError> {
    points_field(as_object(body)?, "points")
}

/// Handles an add request.
pub fn add_transaction<S: TransactionStore>(
    engine: &LedgerEngine<S>,
    body: &Value,
) -> Result<TransactionId> {
    let grant = parse_add_request(body)?;
    engine.add_transaction(grant)
}

/// Handles a spend request, returning a map of payer to points deducted.
pub fn spend_points<S: TransactionStore>(engine: &LedgerEngine<S>, body: &Value) -> Result<Value> {
    let points = parse_spend_request(body)?;
    let summary = engine.spend(points)?;
    Ok(serde_json::to_value(&summary)?)
}

/// Handles a balance request, returning a map of payer key to points.
pub fn get_balances<S: TransactionStore>(engine: &LedgerEngine<S>) -> Result<Value> {
    serde_json::to_value(engine.balances()?).map_err(LedgerError::from)
}
