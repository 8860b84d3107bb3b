use std::path::PathBuf;

use clap::Parser;
use flakeledger_core::StabilityGrade;

use super::{LedgerArgs, OutputFormat};

#[derive(Parser, Clone, Debug)]
pub struct GateArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Results export (array or `{results, comparison?}`)
    #[arg(long)]
    pub results: PathBuf,

    /// Comparison JSON; takes precedence over one embedded in the results
    #[arg(long)]
    pub comparison: Option<PathBuf>,

    #[command(flatten)]
    pub rules: GateRuleArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Rule thresholds; each one set here replaces the config value.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct GateRuleArgs {
    #[arg(long)]
    pub max_failures: Option<u32>,

    /// Percent
    #[arg(long)]
    pub min_pass_rate: Option<f64>,

    /// Percent
    #[arg(long)]
    pub max_flaky_rate: Option<f64>,

    #[arg(long, value_parser = parse_grade)]
    pub min_stability_grade: Option<StabilityGrade>,

    #[arg(long)]
    pub no_new_failures: bool,
}

fn parse_grade(s: &str) -> Result<StabilityGrade, String> {
    match s.trim().to_ascii_uppercase().as_str() {
        "A" => Ok(StabilityGrade::A),
        "B" => Ok(StabilityGrade::B),
        "C" => Ok(StabilityGrade::C),
        "D" => Ok(StabilityGrade::D),
        other => Err(format!("expected one of A, B, C, D (got '{}')", other)),
    }
}
