//! Per-payer balance aggregation.
//!
//! Balances are never stored; they are folded from the transaction records on
//! every call, so they always equal the sum of each payer's surviving points.

use crate::error::Result;
use crate::store::TransactionStore;
use crate::transaction::Transaction;
use std::collections::BTreeMap;
use std::io::Write;

/// Current points per normalized payer key, ordered by key.
pub type Balances = BTreeMap<String, i64>;

/// Sums `points` per payer, grouping payers case-insensitively.
pub fn aggregate<'a, I>(records: I) -> Balances
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut balances = Balances::new();
    for record in records {
        *balances.entry(record.payer_key()).or_insert(0) += record.points;
    }
    balances
}

/// Reads the store's current balances.
pub fn current_balances<S>(store: &S) -> Result<Balances>
where
    S: TransactionStore + ?Sized,
{
    store.sum_by_payer()
}

/// Writes balances as CSV (`payer,points`), sorted by payer key.
pub fn write_balances<W: Write>(balances: &Balances, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["payer", "points"])?;
    for (payer, points) in balances {
        csv_writer.write_record([payer.as_str(), points.to_string().as_str()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{parse_timestamp, TransactionId};

    fn tx(id: u64, payer: &str, points: i64) -> Transaction {
        Transaction {
            id: TransactionId(id),
            payer: payer.to_string(),
            points,
            timestamp: parse_timestamp("2020-11-02T14:00:00Z").unwrap(),
        }
    }

    #[test]
    fn test_aggregate_groups_case_insensitively() {
        let records = vec![tx(1, "Dannon", 100), tx(2, "DANNON", 200), tx(3, "unilever", 5)];
        let balances = aggregate(&records);

        assert_eq!(balances.len(), 2);
        assert_eq!(balances["DANNON"], 300);
        assert_eq!(balances["UNILEVER"], 5);
    }

    #[test]
    fn test_aggregate_keeps_exhausted_payers() {
        let records = vec![tx(1, "DANNON", 0)];
        assert_eq!(aggregate(&records)["DANNON"], 0);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&Vec::<Transaction>::new()).is_empty());
    }

    #[test]
    fn test_write_balances_csv() {
        let records = vec![tx(1, "unilever", 200), tx(2, "DANNON", 1100)];
        let mut output = Vec::new();
        write_balances(&aggregate(&records), &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(output_str, "payer,points\nDANNON,1100\nUNILEVER,200\n");
    }
}
