use super::super::args::{HistoryArgs, HistorySub, OutputFormat};
use super::{print_json, resolve_options};
use crate::exit_codes;
use flakeledger_core::{HistoryStore, RunSummary};

pub(crate) fn run(args: HistoryArgs) -> anyhow::Result<i32> {
    let store = HistoryStore::open(resolve_options(&args.ledger)?);

    match args.cmd {
        HistorySub::Show { test_id } => {
            let entries = store.test_history(&test_id);
            if args.format == OutputFormat::Json {
                return print_json(&entries).map(|_| exit_codes::OK);
            }
            if entries.is_empty() {
                eprintln!("no history for {}", test_id);
            }
            for e in &entries {
                let state = if e.skipped {
                    "skipped"
                } else if e.passed {
                    "passed"
                } else {
                    "failed"
                };
                println!(
                    "{}  {:<7}  {} ms  retry={}{}",
                    e.timestamp,
                    state,
                    e.duration,
                    e.retry,
                    e.run_id
                        .as_deref()
                        .map(|id| format!("  run={}", id))
                        .unwrap_or_default()
                );
            }
        }
        HistorySub::Runs => {
            let summaries = store.history().summaries.to_vec();
            if args.format == OutputFormat::Json {
                return print_json(&summaries).map(|_| exit_codes::OK);
            }
            for s in &summaries {
                println!("{}", run_line(s));
            }
        }
        HistorySub::Baseline => match store.baseline_run() {
            Some(s) if args.format == OutputFormat::Json => print_json(s)?,
            Some(s) => println!("{}", run_line(s)),
            None => eprintln!("no baseline run"),
        },
    }
    Ok(exit_codes::OK)
}

fn run_line(s: &RunSummary) -> String {
    format!(
        "{}  {}  {}/{} passed ({}%)  failed={} skipped={} flaky={}",
        s.run_id, s.timestamp, s.passed, s.total, s.pass_rate, s.failed, s.skipped, s.flaky
    )
}
