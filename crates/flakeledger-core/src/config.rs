//! Ledger configuration.
//!
//! Every recognized option lives in [`LedgerOptions`]; nothing else in the
//! crate reads feature toggles from anywhere else. Keys are camelCase so the
//! same file can be shared with the reporter side. YAML and JSON are both
//! accepted (JSON is valid YAML).

use crate::errors::{LedgerError, LedgerResult};
use crate::gate::QualityGateConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_HISTORY_FILE: &str = "test-history.json";
pub const DEFAULT_MAX_HISTORY_RUNS: usize = 10;
pub const DEFAULT_QUARANTINE_FILE: &str = ".smart-quarantine.json";
pub const DEFAULT_QUARANTINE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_MAX_QUARANTINED: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LedgerOptions {
    /// History JSON location; run snapshots live next to it.
    pub history_file: PathBuf,
    /// Capacity of every retained sequence (per-test entries, summaries, runs).
    pub max_history_runs: usize,
    /// Writes one snapshot file per retained run and tags entries with the run id.
    pub enable_history_drilldown: bool,
    /// When false there is never a baseline run, so `noNewFailures` is skipped.
    pub enable_comparison: bool,
    /// Pins the baseline to this run id. A missing id yields no baseline.
    pub baseline_run_id: Option<String>,
    /// When false, network-log attachment references are left out of snapshots.
    pub enable_network_logs: bool,
    /// When true, `pw:api` steps are left out of snapshots.
    pub filter_pw_api_steps: bool,
    /// When true, inline `data:` attachments are left out of snapshots.
    pub csp_safe: bool,
    pub quality_gates: Option<QualityGateConfig>,
    pub quarantine: QuarantineOptions,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            max_history_runs: DEFAULT_MAX_HISTORY_RUNS,
            enable_history_drilldown: false,
            enable_comparison: true,
            baseline_run_id: None,
            enable_network_logs: true,
            filter_pw_api_steps: false,
            csp_safe: false,
            quality_gates: None,
            quarantine: QuarantineOptions::default(),
        }
    }
}

impl LedgerOptions {
    pub fn load(path: &Path) -> LedgerResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::config(path, format!("failed to read: {}", e)))?;
        let opts: Self = serde_yaml::from_str(&raw)
            .map_err(|e| LedgerError::config(path, format!("failed to parse: {}", e)))?;
        opts.validate().map_err(|detail| LedgerError::config(path, detail))?;
        Ok(opts)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_history_runs == 0 {
            return Err("maxHistoryRuns must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.quarantine.threshold) {
            return Err(format!(
                "quarantine.threshold must be within 0..=1 (got {})",
                self.quarantine.threshold
            ));
        }
        if let Some(gates) = &self.quality_gates {
            gates.validate()?;
        }
        Ok(())
    }

    /// Directory holding the history file.
    pub fn history_dir(&self) -> PathBuf {
        match self.history_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct QuarantineOptions {
    pub enabled: bool,
    pub threshold: f64,
    pub max_quarantined: usize,
    pub output_file: PathBuf,
}

impl Default for QuarantineOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: DEFAULT_QUARANTINE_THRESHOLD,
            max_quarantined: DEFAULT_MAX_QUARANTINED,
            output_file: PathBuf::from(DEFAULT_QUARANTINE_FILE),
        }
    }
}
