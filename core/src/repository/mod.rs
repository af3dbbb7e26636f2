pub mod daily_record;

pub use daily_record::{date_key, DailyRecordRepository, FileDailyRecordRepository};
