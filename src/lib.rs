//! # Points Ledger
//!
//! Records point grants per payer and spends points across all payers,
//! oldest grants first, without ever letting a payer's balance go negative.
//!
//! ## Design Principles
//!
//! - **Oldest-first spending**: grants are consumed in timestamp order, ties in insertion order
//! - **All-or-nothing commits**: a spend's deductions are applied atomically or not at all
//! - **Serialized spends**: one lock covers each spend's read-plan-commit sequence
//! - **Derived balances**: balances are folded from the records on every read
//!
//! ## Example
//!
//! ```no_run
//! use points_ledger::LedgerEngine;
//! use std::io::Cursor;
//!
//! let csv = "payer,points,timestamp\nDANNON,300,2020-10-31T10:00:00Z\n";
//! let engine = LedgerEngine::new();
//! engine.process_csv(Cursor::new(csv)).unwrap();
//! engine.spend(100).unwrap();
//! engine.write_balances(std::io::stdout()).unwrap();
//! ```

pub mod api;
pub mod balance;
pub mod engine;
pub mod error;
pub mod spend;
pub mod store;
pub mod transaction;

pub use balance::Balances;
pub use engine::LedgerEngine;
pub use error::{LedgerError, Result, ValidationError};
pub use spend::{PayerDeduction, SpendPlan, SpendSummary};
pub use store::{Deduction, MemoryStore, TransactionStore};
pub use transaction::{NewTransaction, Transaction, TransactionId, TransactionRecord};
