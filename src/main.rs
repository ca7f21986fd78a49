//! Points Ledger CLI
//!
//! Loads point grants from CSV, optionally spends points oldest-first, and
//! prints the resulting per-payer balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- transactions.csv 5000 > balances.csv
//! ```
//!
//! The deductions of the spend are written to stderr as `payer: points` lines.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug`, `info` or `warn` to control logging verbosity

use points_ledger::{LedgerEngine, LedgerError, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(LedgerError::MissingArgument);
    }

    let spend = args
        .get(2)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| LedgerError::InvalidArgument(raw.clone()))
        })
        .transpose()?;

    let file = File::open(&args[1])?;
    let reader = BufReader::new(file);

    let engine = LedgerEngine::new();
    engine.process_csv(reader)?;

    if let Some(points) = spend {
        let summary = engine.spend(points)?;

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for deduction in summary.iter() {
            writeln!(handle, "{}: {}", deduction.payer, deduction.points)?;
        }
    }

    let stdout = io::stdout();
    let handle = stdout.lock();
    engine.write_balances(handle)?;

    Ok(())
}
