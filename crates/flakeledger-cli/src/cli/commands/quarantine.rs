use super::super::args::{QuarantineArgs, QuarantineSub};
use super::resolve_options;
use crate::exit_codes;
use flakeledger_core::input::load_results;
use flakeledger_core::quarantine::{generate, pattern_from_file};
use flakeledger_core::QuarantineFile;

pub(crate) fn run(args: QuarantineArgs) -> anyhow::Result<i32> {
    match args.cmd {
        QuarantineSub::Generate {
            ledger,
            results,
            threshold,
            max,
            out,
        } => {
            let opts = resolve_options(&ledger)?.quarantine;
            let threshold = threshold.unwrap_or(opts.threshold);
            anyhow::ensure!(
                (0.0..=1.0).contains(&threshold),
                "--threshold must be within 0..=1 (got {})",
                threshold
            );
            let out = out.unwrap_or(opts.output_file);
            let input = load_results(&results)?;
            match generate(
                &input.results,
                threshold,
                max.unwrap_or(opts.max_quarantined),
                &out,
            )? {
                Some(file) => eprintln!(
                    "quarantine written: {} test(s) -> {}",
                    file.entries.len(),
                    out.display()
                ),
                None => eprintln!("quarantine: no test at or above {}", threshold),
            }
        }
        QuarantineSub::Pattern { file } => {
            if let Some(re) = pattern_from_file(&file) {
                println!("{}", re.as_str());
            }
        }
        QuarantineSub::List { file } => {
            let Some(q) = QuarantineFile::load(&file) else {
                eprintln!("quarantine list: empty");
                return Ok(exit_codes::OK);
            };
            for e in &q.entries {
                println!("{:.2}  {}  {} ({})", e.flakiness_score, e.test_id, e.title, e.file);
            }
        }
    }
    Ok(exit_codes::OK)
}
