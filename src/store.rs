//! Transaction storage.
//!
//! The store owns every transaction record. Records are only ever appended or
//! reduced in place by a committed deduction set; nothing is deleted.

use crate::balance::{aggregate, Balances};
use crate::error::{LedgerError, Result, ValidationError};
use crate::transaction::{NewTransaction, Transaction, TransactionId};
use log::debug;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;

/// A planned reduction of one record's points.
///
/// `expected_points` is the value the plan was computed against; the store
/// refuses the whole commit if the record no longer holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deduction {
    pub id: TransactionId,
    pub expected_points: i64,
    pub new_points: i64,
}

impl Deduction {
    /// Points removed from the record by this deduction.
    pub fn deducted(&self) -> i64 {
        self.expected_points - self.new_points
    }
}

/// Durable, queryable holder of transaction records.
pub trait TransactionStore: Send + Sync {
    /// Appends a grant and returns its assigned id.
    fn insert(&self, grant: NewTransaction) -> Result<TransactionId>;

    /// Returns a snapshot of all records by ascending timestamp.
    ///
    /// Records with equal timestamps keep insertion order.
    fn scan_ordered_by_time(&self) -> Result<Vec<Transaction>>;

    /// Applies every deduction or none of them.
    fn apply_deductions(&self, deductions: &[Deduction]) -> Result<()>;

    /// Current points per normalized payer key.
    fn sum_by_payer(&self) -> Result<Balances> {
        Ok(aggregate(&self.scan_ordered_by_time()?))
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Keyed by id, which is also insertion order.
    records: BTreeMap<TransactionId, Transaction>,
    next_id: u64,
    total: i64,
}

/// In-memory transaction store.
///
/// All mutation happens under a single write lock, so inserts are linearizable
/// and a deduction set is never partially visible to readers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, including exhausted ones.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns `true` if no grant has ever been stored.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Sum of all unspent points.
    pub fn total_points(&self) -> i64 {
        self.inner.read().total
    }

    /// Looks up a single record by id.
    pub fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.inner.read().records.get(&id).cloned()
    }

    /// Writes every record as CSV (`id,payer,points,timestamp`), oldest first.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "payer", "points", "timestamp"])?;
        for record in self.scan_ordered_by_time()? {
            csv_writer.write_record([
                record.id.to_string(),
                record.payer,
                record.points.to_string(),
                record.timestamp.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl TransactionStore for MemoryStore {
    fn insert(&self, grant: NewTransaction) -> Result<TransactionId> {
        grant.validate()?;

        let mut inner = self.inner.write();
        let total = inner
            .total
            .checked_add(grant.points)
            .ok_or(ValidationError::PointsOutOfRange(grant.points as u64))?;

        inner.next_id += 1;
        let id = TransactionId(inner.next_id);
        debug!(
            "Stored transaction {}: {} +{} @ {}",
            id, grant.payer, grant.points, grant.timestamp
        );
        inner.records.insert(
            id,
            Transaction {
                id,
                payer: grant.payer,
                points: grant.points,
                timestamp: grant.timestamp,
            },
        );
        inner.total = total;

        Ok(id)
    }

    fn scan_ordered_by_time(&self) -> Result<Vec<Transaction>> {
        let mut records: Vec<Transaction> = self.inner.read().records.values().cloned().collect();
        // Stable sort: equal timestamps stay in id (insertion) order.
        records.sort_by_key(|record| record.timestamp);
        Ok(records)
    }

    fn apply_deductions(&self, deductions: &[Deduction]) -> Result<()> {
        let mut inner = self.inner.write();

        // Check everything before touching anything.
        let mut seen = HashSet::with_capacity(deductions.len());
        for deduction in deductions {
            if !seen.insert(deduction.id) {
                return Err(LedgerError::Commit(format!(
                    "transaction {} appears twice in one commit",
                    deduction.id
                )));
            }

            let record = inner.records.get(&deduction.id).ok_or_else(|| {
                LedgerError::Commit(format!("unknown transaction {}", deduction.id))
            })?;

            if record.points != deduction.expected_points {
                return Err(LedgerError::RaceDetected(format!(
                    "transaction {} holds {} points, plan expected {}",
                    deduction.id, record.points, deduction.expected_points
                )));
            }

            if deduction.new_points < 0 || deduction.new_points > record.points {
                return Err(LedgerError::Commit(format!(
                    "transaction {} cannot move from {} to {} points",
                    deduction.id, record.points, deduction.new_points
                )));
            }
        }

        let mut removed = 0;
        for deduction in deductions {
            if let Some(record) = inner.records.get_mut(&deduction.id) {
                record.points = deduction.new_points;
                removed += deduction.deducted();
            }
        }
        inner.total -= removed;

        debug!(
            "Applied {} deductions removing {} points",
            deductions.len(),
            removed
        );
        Ok(())
    }

    fn sum_by_payer(&self) -> Result<Balances> {
        Ok(aggregate(self.inner.read().records.values()))
    }
}
