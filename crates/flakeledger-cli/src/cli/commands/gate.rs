use super::super::args::{GateArgs, GateRuleArgs, OutputFormat};
use super::{gate_exit, print_json, resolve_options};
use anyhow::Context;
use flakeledger_core::gate::format_gate_report;
use flakeledger_core::input::{load_comparison, load_results};
use flakeledger_core::{evaluate, QualityGateConfig};

pub(crate) fn run(args: GateArgs) -> anyhow::Result<i32> {
    let opts = resolve_options(&args.ledger)?;
    let mut gates = opts.quality_gates.clone().unwrap_or_default();
    gates.merge(&overrides(&args.rules));
    gates
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid quality gate thresholds")?;
    if gates.is_empty() {
        tracing::warn!("no quality gate rules configured; nothing to evaluate");
    }

    let input = load_results(&args.results)?;
    let comparison = match &args.comparison {
        Some(path) => Some(load_comparison(path)?),
        None => input.comparison,
    };

    let verdict = evaluate(&gates, &input.results, comparison.as_ref());
    match args.format {
        OutputFormat::Text => println!("{}", format_gate_report(&verdict)),
        OutputFormat::Json => print_json(&verdict)?,
    }
    Ok(gate_exit(&verdict))
}

fn overrides(rules: &GateRuleArgs) -> QualityGateConfig {
    QualityGateConfig {
        max_failures: rules.max_failures,
        min_pass_rate: rules.min_pass_rate,
        max_flaky_rate: rules.max_flaky_rate,
        min_stability_grade: rules.min_stability_grade,
        no_new_failures: rules.no_new_failures.then_some(true),
    }
}
