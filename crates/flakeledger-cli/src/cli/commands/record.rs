use super::super::args::{OutputFormat, RecordArgs};
use super::{gate_exit, print_json, resolve_options};
use crate::exit_codes;
use anyhow::Context;
use flakeledger_core::gate::format_gate_report;
use flakeledger_core::input::load_results;
use flakeledger_core::{evaluate, quarantine, HistoryStore, RunMetadata, RunSummary};
use serde_json::json;

pub(crate) fn run(args: RecordArgs) -> anyhow::Result<i32> {
    let mut opts = resolve_options(&args.ledger)?;
    if args.drilldown {
        opts.enable_history_drilldown = true;
    }
    if args.quarantine {
        opts.quarantine.enabled = true;
    }

    let input = load_results(&args.results)?;
    let run = RunMetadata::new(
        args.run_id.clone().unwrap_or_else(default_run_id),
        resolve_timestamp(args.timestamp.as_deref())?,
    );

    let mut store = HistoryStore::new(opts.clone());
    let summary = store
        .update(&input.results, &run)
        .with_context(|| format!("recording run {}", run.run_id))?;

    let comparison = store.comparison(&summary, &input.results);
    if let (Some(cmp), Some(out)) = (&comparison, &args.comparison_out) {
        cmp.save(out)
            .with_context(|| format!("writing comparison {}", out.display()))?;
    }

    let quarantined = if opts.quarantine.enabled {
        quarantine::generate(
            &input.results,
            opts.quarantine.threshold,
            opts.quarantine.max_quarantined,
            &opts.quarantine.output_file,
        )?
        .map(|q| q.entries.len())
        .unwrap_or(0)
    } else {
        0
    };

    match args.format {
        OutputFormat::Json => print_json(&json!({
            "summary": summary,
            "comparison": comparison,
            "quarantined": quarantined,
        }))?,
        OutputFormat::Text => {
            println!("{}", summary_line(&summary));
            if let Some(cmp) = &comparison {
                println!(
                    "Compared with {}: {} new failure(s), {} fixed, {} new test(s)",
                    cmp.baseline_run.run_id,
                    cmp.changes.new_failures.len(),
                    cmp.changes.fixed_tests.len(),
                    cmp.changes.new_tests.len()
                );
            }
            if quarantined > 0 {
                println!(
                    "Quarantined {} test(s) -> {}",
                    quarantined,
                    opts.quarantine.output_file.display()
                );
            }
        }
    }

    if !args.gate {
        return Ok(exit_codes::OK);
    }
    let Some(gates) = &opts.quality_gates else {
        tracing::warn!("--gate given but no qualityGates configured");
        return Ok(exit_codes::OK);
    };
    let verdict = evaluate(gates, &input.results, comparison.as_ref());
    if args.format == OutputFormat::Text {
        println!();
        println!("{}", format_gate_report(&verdict));
    }
    Ok(gate_exit(&verdict))
}

fn summary_line(s: &RunSummary) -> String {
    format!(
        "Recorded {}: {} tests, {} passed, {} failed, {} skipped, {} flaky, {} slow ({}% pass rate)",
        s.run_id, s.total, s.passed, s.failed, s.skipped, s.flaky, s.slow, s.pass_rate
    )
}

fn default_run_id() -> String {
    format!("run-{}", chrono::Utc::now().timestamp_millis())
}

fn resolve_timestamp(raw: Option<&str>) -> anyhow::Result<String> {
    match raw {
        None => Ok(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        Some(raw) => {
            let parsed = chrono::DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("--timestamp '{}' is not RFC 3339", raw))?;
            Ok(parsed
                .with_timezone(&chrono::Utc)
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        }
    }
}
