use clap::{Parser, Subcommand};

use super::{LedgerArgs, OutputFormat};

#[derive(Parser, Clone, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub cmd: HistorySub,
}

#[derive(Subcommand, Clone, Debug)]
pub enum HistorySub {
    /// Entries recorded for one test, oldest first
    Show { test_id: String },
    /// Retained run summaries, oldest first
    Runs,
    /// The summary the next run would be compared against
    Baseline,
}
