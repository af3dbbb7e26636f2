use serde::{Deserialize, Serialize};

use crate::model::daily_record::{file_key, Delta, UNKNOWN};

/// What the host reports about the active editor's document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FileDescriptor {
    /// Full path of the document.
    pub name: String,
    #[serde(alias = "languageId")]
    pub language: String,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// The tracker's view of the current file. Missing parts become `"unknown"`
/// only when a delta is produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileContext {
    pub name: Option<String>,
    pub language: Option<String>,
    pub extension: Option<String>,
}

impl FileContext {
    pub fn from_descriptor(file: &FileDescriptor) -> Self {
        Self {
            name: non_empty(&file.name),
            language: non_empty(&file.language),
            extension: extension_of(&file.name),
        }
    }

    pub fn delta(&self, seconds: u64) -> Delta {
        Delta::new(
            seconds,
            self.language.as_deref().unwrap_or(UNKNOWN),
            self.extension.as_deref().unwrap_or(UNKNOWN),
            self.name.as_deref().unwrap_or(UNKNOWN),
        )
    }
}

/// Text after the last `.` of the basename, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let base = file_key(name);
    base.rsplit_once('.')
        .map(|(_, ext)| ext)
        .and_then(non_empty)
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
