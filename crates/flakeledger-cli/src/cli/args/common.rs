//! Shared argument types used across multiple commands.

use clap::ValueEnum;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Clone, Debug)]
pub struct LedgerArgs {
    /// Ledger config (YAML or JSON, camelCase keys)
    #[arg(long, env = "FLAKELEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// History file; overrides `historyFile` from the config
    #[arg(long)]
    pub history_file: Option<PathBuf>,
}
