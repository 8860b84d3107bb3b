use clap::{Parser, Subcommand};

pub mod common;
pub mod gate;
pub mod history;
pub mod quarantine;
pub mod record;
pub use common::*;
pub use gate::*;
pub use history::*;
pub use quarantine::*;
pub use record::*;

#[derive(Parser)]
#[command(
    name = "flakeledger",
    version,
    about = "Bounded test-run history, quality gates and flaky-test quarantine for CI"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Append a completed run to the history ledger
    Record(RecordArgs),
    /// Evaluate quality gates against a results export
    Gate(GateArgs),
    /// Generate or read the flaky-test quarantine list
    Quarantine(QuarantineArgs),
    /// Inspect the history ledger
    History(HistoryArgs),
    Version,
}
