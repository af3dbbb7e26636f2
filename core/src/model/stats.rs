use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::daily_record::{DailyRecord, HOURS_PER_DAY};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProductiveDay {
    pub date: Option<NaiveDate>,
    pub seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProductiveHour {
    pub hour: Option<usize>,
    pub seconds: u64,
}

/// Rollup over today plus the most recent prior days. Never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub daily_data: Vec<DailyRecord>,
    pub total_seconds: u64,
    pub languages: HashMap<String, u64>,
    pub files: HashMap<String, u64>,
    pub hourly_breakdown: [u64; HOURS_PER_DAY],
    pub average_per_day: f64,
    pub most_productive_day: ProductiveDay,
    pub most_productive_hour: ProductiveHour,
}

impl AggregateStats {
    /// Builds the rollup from records in scan order. The first record with
    /// the strictly highest total (or hour sum) wins ties.
    pub fn from_records(daily_data: Vec<DailyRecord>) -> Self {
        let mut total_seconds = 0;
        let mut languages: HashMap<String, u64> = HashMap::new();
        let mut files: HashMap<String, u64> = HashMap::new();
        let mut hourly_breakdown = [0; HOURS_PER_DAY];
        let mut most_productive_day = ProductiveDay::default();

        for day in &daily_data {
            total_seconds += day.total_seconds;

            if day.total_seconds > most_productive_day.seconds {
                most_productive_day = ProductiveDay {
                    date: Some(day.date),
                    seconds: day.total_seconds,
                };
            }

            for (lang, seconds) in &day.language_seconds {
                *languages.entry(lang.clone()).or_insert(0) += seconds;
            }
            for (file, seconds) in &day.file_seconds {
                *files.entry(file.clone()).or_insert(0) += seconds;
            }
            for (slot, seconds) in hourly_breakdown.iter_mut().zip(day.hourly_breakdown) {
                *slot += seconds;
            }
        }

        let mut most_productive_hour = ProductiveHour::default();
        for (hour, &seconds) in hourly_breakdown.iter().enumerate() {
            if seconds > most_productive_hour.seconds {
                most_productive_hour = ProductiveHour {
                    hour: Some(hour),
                    seconds,
                };
            }
        }

        let average_per_day = if daily_data.is_empty() {
            0.0
        } else {
            total_seconds as f64 / daily_data.len() as f64
        };

        Self {
            daily_data,
            total_seconds,
            languages,
            files,
            hourly_breakdown,
            average_per_day,
            most_productive_day,
            most_productive_hour,
        }
    }

    /// Languages sorted by descending seconds, then by name.
    pub fn top_languages(&self) -> Vec<(&str, u64)> {
        sorted_desc(&self.languages)
    }

    pub fn top_files(&self) -> Vec<(&str, u64)> {
        sorted_desc(&self.files)
    }
}

fn sorted_desc(map: &HashMap<String, u64>) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}
