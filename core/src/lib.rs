pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod time;

pub use app::CodeTime;
pub use config::Config;
pub use error::StoreError;
pub use event::{parse_event_line, HostEvent};
pub use model::daily_record::{DailyRecord, Delta};
pub use model::file_context::{FileContext, FileDescriptor};
pub use model::stats::{AggregateStats, ProductiveDay, ProductiveHour};
pub use repository::{DailyRecordRepository, FileDailyRecordRepository};
pub use service::ledger::Ledger;
pub use service::status::{format_duration, StatusText, StatusTicker};
pub use service::tracker::Tracker;
pub use time::{parse_duration, Clock, ManualClock, SystemClock};
