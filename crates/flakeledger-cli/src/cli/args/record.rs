use std::path::PathBuf;

use clap::Parser;

use super::{LedgerArgs, OutputFormat};

#[derive(Parser, Clone, Debug)]
pub struct RecordArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Results export of the completed run (array or `{results, comparison?}`)
    #[arg(long)]
    pub results: PathBuf,

    /// Run id (default: `run-<unix millis>`)
    #[arg(long)]
    pub run_id: Option<String>,

    /// Run start time, RFC 3339 (default: now)
    #[arg(long)]
    pub timestamp: Option<String>,

    /// Keep a full per-run snapshot (overrides `enableHistoryDrilldown`)
    #[arg(long)]
    pub drilldown: bool,

    /// Write the comparison against the baseline run to this path
    #[arg(long)]
    pub comparison_out: Option<PathBuf>,

    /// Also write the quarantine file (overrides `quarantine.enabled`)
    #[arg(long)]
    pub quarantine: bool,

    /// Evaluate the configured quality gates after recording
    #[arg(long)]
    pub gate: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
