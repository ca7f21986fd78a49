//! Oldest-first spend planning.
//!
//! Planning is a pure function over an ordered snapshot of the store. It never
//! mutates anything; the engine commits the resulting deductions atomically.

use crate::error::{LedgerError, Result};
use crate::store::Deduction;
use crate::transaction::{payer_key, Transaction};
use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Points removed from one payer by a spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayerDeduction {
    /// Payer as stored on the grants drawn from.
    pub payer: String,

    /// Always `<= 0`.
    pub points: i64,
}

/// Per-payer result of a spend, in the order payers were first drawn from.
///
/// Serializes as a JSON-style map of payer to (negative) points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpendSummary {
    entries: Vec<PayerDeduction>,
}

impl SpendSummary {
    /// Returns `true` if no payer was touched (a zero-point spend).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of payers touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Deduction for a payer, matched exactly as stored.
    pub fn get(&self, payer: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|entry| entry.payer == payer)
            .map(|entry| entry.points)
    }

    /// Total deduction across every spelling of a payer, as balances group them.
    pub fn get_normalized(&self, payer: &str) -> Option<i64> {
        let key = payer_key(payer);
        self.entries
            .iter()
            .filter(|entry| payer_key(&entry.payer) == key)
            .map(|entry| entry.points)
            .reduce(|a, b| a + b)
    }

    /// Entries in the order payers were first drawn from.
    pub fn iter(&self) -> impl Iterator<Item = &PayerDeduction> {
        self.entries.iter()
    }

    /// Total points spent across all payers.
    pub fn total_spent(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| entry.points.unsigned_abs())
            .sum()
    }

    fn record(&mut self, payer: String, deducted: i64) {
        match self.entries.iter_mut().find(|entry| entry.payer == payer) {
            Some(entry) => entry.points -= deducted,
            None => self.entries.push(PayerDeduction {
                payer,
                points: -deducted,
            }),
        }
    }
}

impl Serialize for SpendSummary {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.payer, &entry.points)?;
        }
        map.end()
    }
}

/// The store mutations and payer summary for one spend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpendPlan {
    pub deductions: Vec<Deduction>,
    pub summary: SpendSummary,
}

/// Plans a spend of `amount` points against `records`, which must already be
/// ordered oldest first.
///
/// # Errors
///
/// - [`LedgerError::InsufficientHistory`] if `records` is empty
/// - [`LedgerError::InsufficientBalance`] if `amount` exceeds the total
/// - [`LedgerError::CorruptLedger`] if a payer's balance is already negative
/// - [`LedgerError::RaceDetected`] if the walk cannot cover `amount` even
///   though the total did
pub fn plan_spend(records: &[Transaction], amount: u64) -> Result<SpendPlan> {
    if amount == 0 {
        return Ok(SpendPlan::default());
    }

    if records.is_empty() {
        return Err(LedgerError::InsufficientHistory);
    }

    let total: i64 = records.iter().map(|record| record.points).sum();
    let requested = match i64::try_from(amount) {
        Ok(requested) if requested <= total => requested,
        _ => {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: total,
            })
        }
    };

    let mut payer_balances: BTreeMap<&str, i64> = BTreeMap::new();
    for record in records {
        *payer_balances.entry(record.payer.as_str()).or_insert(0) += record.points;
    }
    if let Some((payer, balance)) = payer_balances.into_iter().find(|(_, balance)| *balance < 0) {
        return Err(LedgerError::CorruptLedger {
            payer: payer.to_string(),
            balance,
        });
    }

    let mut plan = SpendPlan::default();
    let mut remaining = requested;

    for record in records {
        if remaining == 0 {
            break;
        }
        if record.points <= 0 {
            debug!("Skipping exhausted transaction {}", record.id);
            continue;
        }

        let deducted = record.points.min(remaining);
        remaining -= deducted;

        debug!(
            "Deducting {} of {} points from transaction {} ({})",
            deducted, record.points, record.id, record.payer
        );
        plan.deductions.push(Deduction {
            id: record.id,
            expected_points: record.points,
            new_points: record.points - deducted,
        });
        plan.summary.record(record.payer.clone(), deducted);
    }

    if remaining > 0 {
        return Err(LedgerError::RaceDetected(format!(
            "{} of {} points left uncovered after walking {} transactions",
            remaining,
            amount,
            records.len()
        )));
    }

    Ok(plan)
}
