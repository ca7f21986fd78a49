//! Ledger engine: grants, spends and balances over a transaction store.
//!
//! Spends run their read-plan-commit sequence under a single lock so two
//! spends can never plan against the same unspent points. Grants and balance
//! reads go straight to the store.

use crate::balance::{self, Balances};
use crate::error::Result;
use crate::spend::{plan_spend, SpendSummary};
use crate::store::{MemoryStore, TransactionStore};
use crate::transaction::{NewTransaction, TransactionId, TransactionRecord};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::io::{Read, Write};

/// The points ledger engine.
///
/// Generic over its store; [`MemoryStore`] is the default.
pub struct LedgerEngine<S = MemoryStore> {
    store: S,

    /// Held for the whole scan-plan-commit sequence of a spend.
    spend_guard: Mutex<()>,
}

impl LedgerEngine<MemoryStore> {
    /// Creates an engine over an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for LedgerEngine<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TransactionStore> LedgerEngine<S> {
    /// Creates an engine over an existing store.
    pub fn with_store(store: S) -> Self {
        LedgerEngine {
            store,
            spend_guard: Mutex::new(()),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a point grant.
    pub fn add_transaction(&self, grant: NewTransaction) -> Result<TransactionId> {
        self.store.insert(grant)
    }

    /// Loads grants from CSV (`payer,points,timestamp`) in streaming fashion.
    ///
    /// Invalid rows are logged at warn level and skipped. Returns the number of
    /// grants stored.
    pub fn process_csv<R: Read>(&self, reader: R) -> Result<usize> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut stored = 0;
        for (row_idx, result) in csv_reader.deserialize::<TransactionRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                    continue;
                }
            };

            let grant = match record.parse() {
                Ok(grant) => grant,
                Err(e) => {
                    warn!("Row {}: {}", row_num, e);
                    continue;
                }
            };

            match self.store.insert(grant) {
                Ok(id) => {
                    debug!("Row {}: stored as transaction {}", row_num, id);
                    stored += 1;
                }
                Err(e) => warn!("Row {}: {}", row_num, e),
            }
        }

        Ok(stored)
    }

    /// Spends `points` across all payers, oldest grants first.
    ///
    /// Either every planned deduction is committed or none is. A zero-point
    /// spend is a no-op that never touches the store.
    pub fn spend(&self, points: u64) -> Result<SpendSummary> {
        if points == 0 {
            debug!("Zero-point spend, nothing to do");
            return Ok(SpendSummary::default());
        }

        let _guard = self.spend_guard.lock();

        let records = self.store.scan_ordered_by_time()?;
        let plan = match plan_spend(&records, points) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("Spend of {} points rejected: {}", points, e);
                return Err(e);
            }
        };

        if let Err(e) = self.store.apply_deductions(&plan.deductions) {
            warn!("Spend of {} points failed to commit: {}", points, e);
            return Err(e);
        }

        info!(
            "Spent {} points from {} transactions across {} payers",
            points,
            plan.deductions.len(),
            plan.summary.len()
        );
        Ok(plan.summary)
    }

    /// Current balance per normalized payer key.
    pub fn balances(&self) -> Result<Balances> {
        balance::current_balances(&self.store)
    }

    /// Writes current balances as CSV, sorted by payer.
    pub fn write_balances<W: Write>(&self, writer: W) -> Result<()> {
        balance::write_balances(&self.balances()?, writer)
    }
}
