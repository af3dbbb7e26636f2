pub mod daily_record;
pub mod file_context;
pub mod stats;
