//! On-disk shapes of the history file.
//!
//! Two layouts exist. The current one is an object with `tests`, `runs`,
//! `summaries` and optionally `runFiles`. The legacy one is a bare
//! `testId -> entries` mapping. The layout is decided once, here, from the
//! presence of a top-level `tests` key.

use super::TestHistory;
use crate::bounded::BoundedSeq;
use crate::model::TestHistoryEntry;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryDocument {
    Legacy(BTreeMap<String, Vec<TestHistoryEntry>>),
    Current(TestHistory),
}

impl HistoryDocument {
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let has_tests_key = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("tests"));
        if has_tests_key {
            serde_json::from_value(value).map(Self::Current)
        } else {
            serde_json::from_value(value).map(Self::Legacy)
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    pub fn into_history(self) -> TestHistory {
        match self {
            Self::Current(history) => history,
            Self::Legacy(tests) => TestHistory {
                tests: tests
                    .into_iter()
                    .map(|(id, entries)| (id, entries.into_iter().collect::<BoundedSeq<_>>()))
                    .collect(),
                ..TestHistory::default()
            },
        }
    }
}

/// Treats an explicit `null` like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
