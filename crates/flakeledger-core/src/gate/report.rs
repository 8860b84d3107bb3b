//! Fixed-format text rendering of a gate verdict.
//!
//! ```text
//! Quality Gates
//!   ✓ Max failures         0 (threshold: ≤ 0)
//!   ✗ Min pass rate        80% (threshold: ≥ 95%)
//!   ○ Min stability grade  N/A (skipped)
//!
//! Result: FAILED (1 of 2 rules failed)
//! ```

use super::QualityGateResult;
use std::fmt::Write;

const GLYPH_PASS: char = '✓';
const GLYPH_FAIL: char = '✗';
const GLYPH_SKIP: char = '○';

pub fn format_gate_report(result: &QualityGateResult) -> String {
    let mut out = String::from("Quality Gates\n");

    let width = result
        .rules
        .iter()
        .map(|r| r.rule.label().chars().count())
        .max()
        .unwrap_or(0);

    for r in &result.rules {
        let glyph = if r.skipped {
            GLYPH_SKIP
        } else if r.passed {
            GLYPH_PASS
        } else {
            GLYPH_FAIL
        };
        let detail = if r.skipped {
            "skipped".to_string()
        } else {
            format!("threshold: {}", r.threshold)
        };
        let _ = writeln!(
            out,
            "  {} {:<width$}  {} ({})",
            glyph,
            r.rule.label(),
            r.actual,
            detail,
            width = width
        );
    }
    if result.rules.is_empty() {
        out.push_str("  (no rules configured)\n");
    }

    let evaluated = result.evaluated().count();
    let failed = result.failed().count();
    out.push('\n');
    if failed == 0 {
        let _ = write!(
            out,
            "Result: PASSED ({} of {} rules passed)",
            evaluated, evaluated
        );
    } else {
        let _ = write!(
            out,
            "Result: FAILED ({} of {} rules failed)",
            failed, evaluated
        );
    }
    out
}
