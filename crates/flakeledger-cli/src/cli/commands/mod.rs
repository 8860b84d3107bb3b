use super::args::*;

pub(crate) mod gate;
pub(crate) mod history;
pub(crate) mod quarantine;
pub(crate) mod record;

use crate::exit_codes;
use anyhow::Context;
use flakeledger_core::LedgerOptions;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Record(args) => record::run(args),
        Command::Gate(args) => gate::run(args),
        Command::Quarantine(args) => quarantine::run(args),
        Command::History(args) => history::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
pub(crate) fn resolve_options(args: &LedgerArgs) -> anyhow::Result<LedgerOptions> {
    let mut opts = match &args.config {
        Some(path) => LedgerOptions::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LedgerOptions::default(),
    };
    if let Some(history_file) = &args.history_file {
        opts.history_file = history_file.clone();
    }
    Ok(opts)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn gate_exit(verdict: &flakeledger_core::QualityGateResult) -> i32 {
    if verdict.passed {
        exit_codes::OK
    } else {
        exit_codes::GATE_FAILED
    }
}
