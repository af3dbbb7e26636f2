use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::file_context::FileDescriptor;
use crate::repository::DailyRecordRepository;
use crate::service::tracker::Tracker;

/// An editor notification, one JSON object per line:
///
/// ```text
/// {"type":"activity"}
/// {"type":"activeFileChanged","file":{"name":"/src/main.rs","languageId":"rust"}}
/// {"type":"activeFileChanged","file":null}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    Activity,
    ActiveFileChanged {
        #[serde(default)]
        file: Option<FileDescriptor>,
    },
}

impl HostEvent {
    pub fn dispatch<R: DailyRecordRepository + 'static>(self, tracker: &Tracker<R>) {
        match self {
            HostEvent::Activity => tracker.activity(),
            HostEvent::ActiveFileChanged { file } => tracker.active_file_changed(file),
        }
    }
}

/// Decodes one line. Blank lines and `#` comments yield `None`.
pub fn parse_event_line(line: &str) -> Result<Option<HostEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let event = serde_json::from_str(line).with_context(|| format!("Invalid event: {}", line))?;
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_line() {
        assert_eq!(
            parse_event_line(r#"{"type":"activity"}"#).unwrap(),
            Some(HostEvent::Activity)
        );
        assert_eq!(
            parse_event_line(r#" {"type":"activeFileChanged","file":{"name":"/a/b.go","languageId":"go"}} "#)
                .unwrap(),
            Some(HostEvent::ActiveFileChanged {
                file: Some(FileDescriptor::new("/a/b.go", "go"))
            })
        );
        assert_eq!(
            parse_event_line(r#"{"type":"activeFileChanged","file":null}"#).unwrap(),
            Some(HostEvent::ActiveFileChanged { file: None })
        );
        assert_eq!(
            parse_event_line(r#"{"type":"activeFileChanged"}"#).unwrap(),
            Some(HostEvent::ActiveFileChanged { file: None })
        );
        assert_eq!(parse_event_line("   ").unwrap(), None);
        assert_eq!(parse_event_line("# comment").unwrap(), None);
    }

    #[test]
    fn test_parse_event_line_rejects_garbage() {
        assert!(parse_event_line("activity").is_err());
        assert!(parse_event_line(r#"{"type":"save"}"#).is_err());
    }
}
