use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::LedgerArgs;

#[derive(Parser, Clone, Debug)]
pub struct QuarantineArgs {
    #[command(subcommand)]
    pub cmd: QuarantineSub,
}

#[derive(Subcommand, Clone, Debug)]
pub enum QuarantineSub {
    /// Select flaky tests from a results export and write the quarantine file
    Generate {
        #[command(flatten)]
        ledger: LedgerArgs,
        #[arg(long)]
        results: PathBuf,
        /// Minimum flakiness score (default: config or 0.3)
        #[arg(long)]
        threshold: Option<f64>,
        /// Maximum number of quarantined tests (default: config or 50)
        #[arg(long)]
        max: Option<usize>,
        /// Output path (default: config or .smart-quarantine.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the title filter built from a quarantine file (nothing if none)
    Pattern {
        #[arg(long, default_value = ".smart-quarantine.json")]
        file: PathBuf,
    },
    /// List quarantined tests
    List {
        #[arg(long, default_value = ".smart-quarantine.json")]
        file: PathBuf,
    },
}
