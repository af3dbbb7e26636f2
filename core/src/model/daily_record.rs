use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const HOURS_PER_DAY: usize = 24;
pub const UNKNOWN: &str = "unknown";

/// Seconds of active editing recorded for one calendar day.
///
/// `date` is the identity of the record; the counters are the only thing
/// that changes after creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub total_seconds: u64,
    #[serde(rename = "languages")]
    pub language_seconds: HashMap<String, u64>,
    #[serde(rename = "files")]
    pub file_seconds: HashMap<String, u64>,
    #[serde(deserialize_with = "deserialize_hourly")]
    pub hourly_breakdown: [u64; HOURS_PER_DAY],
    pub last_updated: DateTime<Utc>,
}

impl Default for DailyRecord {
    fn default() -> Self {
        Self {
            date: NaiveDate::default(),
            total_seconds: 0,
            language_seconds: HashMap::new(),
            file_seconds: HashMap::new(),
            hourly_breakdown: [0; HOURS_PER_DAY],
            last_updated: DateTime::<Utc>::default(),
        }
    }
}

impl DailyRecord {
    pub fn new(date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            date,
            last_updated: now,
            ..Self::default()
        }
    }

    /// Folds one delta into the counters. `hour` is clamped into 0..24.
    pub fn add(&mut self, delta: &Delta, hour: usize) {
        if delta.seconds == 0 {
            return;
        }
        self.total_seconds += delta.seconds;
        *self
            .language_seconds
            .entry(delta.language.clone())
            .or_insert(0) += delta.seconds;
        *self
            .file_seconds
            .entry(file_key(&delta.file_name))
            .or_insert(0) += delta.seconds;
        self.hourly_breakdown[hour.min(HOURS_PER_DAY - 1)] += delta.seconds;
    }

    /// True when languages, files and hours each sum to `total_seconds`.
    pub fn check_invariants(&self) -> bool {
        self.language_seconds.values().sum::<u64>() == self.total_seconds
            && self.file_seconds.values().sum::<u64>() == self.total_seconds
            && self.hourly_breakdown.iter().sum::<u64>() == self.total_seconds
    }
}

/// One unit of attributed time handed from the tracker to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub seconds: u64,
    pub language: String,
    pub extension: String,
    pub file_name: String,
}

impl Delta {
    pub fn new(
        seconds: u64,
        language: impl Into<String>,
        extension: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            seconds,
            language: language.into(),
            extension: extension.into(),
            file_name: file_name.into(),
        }
    }
}

/// Final path component of `file_name`, accepting both `/` and `\` separators.
pub fn file_key(file_name: &str) -> String {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .to_string()
}

// Older or hand-edited records may carry fewer or more than 24 slots.
fn deserialize_hourly<'de, D>(deserializer: D) -> Result<[u64; HOURS_PER_DAY], D::Error>
where
    D: Deserializer<'de>,
{
    let slots: Option<Vec<u64>> = Option::deserialize(deserializer)?;
    let mut hourly = [0; HOURS_PER_DAY];
    for (slot, value) in hourly.iter_mut().zip(slots.unwrap_or_default()) {
        *slot = value;
    }
    Ok(hourly)
}
