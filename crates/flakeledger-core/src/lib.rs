//! Bounded test-run history, quality gates and flaky-test quarantine.
//!
//! The history store keeps a capped ledger of per-test outcomes and per-run
//! summaries on disk. Gates and quarantine selection read the current run's
//! results (and optionally a baseline comparison) and never touch the ledger.

pub mod bounded;
pub mod comparison;
pub mod config;
pub mod errors;
pub mod gate;
pub mod history;
pub mod input;
pub mod model;
pub mod quarantine;
pub mod summary;

pub use bounded::BoundedSeq;
pub use comparison::{compare, RunChanges, RunComparison};
pub use config::{LedgerOptions, QuarantineOptions};
pub use errors::{LedgerError, LedgerResult};
pub use gate::{evaluate, QualityGateConfig, QualityGateResult, QualityGateRuleResult};
pub use history::{HistoryStore, TestHistory};
pub use model::{
    RunMetadata, RunSummary, StabilityGrade, TestHistoryEntry, TestOutcome, TestResultRecord,
    TestStatus,
};
pub use quarantine::{QuarantineEntry, QuarantineFile};
pub use summary::summarize;

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
