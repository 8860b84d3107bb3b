//! Result exports handed in from outside (CI steps, the reporter).
//!
//! Unlike the ledger's own files, these are validated strictly: a malformed
//! export is a hard error naming the file and the cause.

use crate::comparison::RunComparison;
use crate::errors::{LedgerError, LedgerResult};
use crate::model::TestResultRecord;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsInput {
    pub results: Vec<TestResultRecord>,
    pub comparison: Option<RunComparison>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopedResults {
    results: Vec<TestResultRecord>,
    #[serde(default)]
    comparison: Option<RunComparison>,
}

/// Accepts either a bare array of results or `{results, comparison?}`.
pub fn load_results(path: &Path) -> LedgerResult<ResultsInput> {
    let value = read_json(path)?;
    if value.is_array() {
        let results = serde_json::from_value(value)
            .map_err(|e| LedgerError::invalid_input(path, e.to_string()))?;
        return Ok(ResultsInput {
            results,
            comparison: None,
        });
    }
    if value.get("results").is_some() {
        let env: EnvelopedResults = serde_json::from_value(value)
            .map_err(|e| LedgerError::invalid_input(path, e.to_string()))?;
        return Ok(ResultsInput {
            results: env.results,
            comparison: env.comparison,
        });
    }
    Err(LedgerError::invalid_input(
        path,
        "expected an array of results or an object with a `results` key",
    ))
}

/// Standalone comparison JSON, as written by `record --comparison-out`.
pub fn load_comparison(path: &Path) -> LedgerResult<RunComparison> {
    let value = read_json(path)?;
    serde_json::from_value(value).map_err(|e| LedgerError::invalid_input(path, e.to_string()))
}

fn read_json(path: &Path) -> LedgerResult<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| LedgerError::invalid_input(path, format!("cannot read: {}", e)))?;
    serde_json::from_str(&raw).map_err(|e| LedgerError::invalid_input(path, e.to_string()))
}
