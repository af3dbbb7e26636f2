use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{Result, StoreError};
use crate::model::daily_record::DailyRecord;

const DATA_DIR_NAME: &str = "codetime-data";
const RECORD_EXTENSION: &str = "json";
const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Durable store holding at most one record per calendar date.
pub trait DailyRecordRepository: Send + Sync {
    fn load(&self, date: NaiveDate) -> Result<Option<DailyRecord>>;
    fn save(&self, record: &DailyRecord) -> Result<()>;
    /// Dates that currently have a persisted record, in no particular order.
    fn list_dates(&self) -> Result<Vec<NaiveDate>>;
    fn delete_all(&self) -> Result<()>;
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// One pretty-printed JSON document per day: `<root>/codetime-data/YYYY-MM-DD.json`.
#[derive(Debug, Clone)]
pub struct FileDailyRecordRepository {
    data_dir: PathBuf,
}

impl FileDailyRecordRepository {
    pub fn new(storage_root: &Path) -> Result<Self> {
        let data_dir = storage_root.join(DATA_DIR_NAME);
        fs::create_dir_all(&data_dir).map_err(|e| StoreError::io(&data_dir, e))?;
        Ok(FileDailyRecordRepository { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn record_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", date_key(date), RECORD_EXTENSION))
    }

    fn record_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.data_dir).map_err(|e| StoreError::io(&self.data_dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.data_dir, e))?.path();
            if path.extension().and_then(|s| s.to_str()) == Some(RECORD_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl DailyRecordRepository for FileDailyRecordRepository {
    fn load(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
        let path = self.record_path(date);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let reader = BufReader::new(file);
        let mut record: DailyRecord =
            serde_json::from_reader(reader).map_err(|e| StoreError::json(&path, e))?;
        // The file name is the record's identity.
        record.date = date;
        Ok(Some(record))
    }

    fn save(&self, record: &DailyRecord) -> Result<()> {
        let path = self.record_path(record.date);
        let file = File::create(&path).map_err(|e| StoreError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record).map_err(|e| StoreError::json(&path, e))?;
        writer.flush().map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }

    fn list_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for path in self.record_files()? {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            match NaiveDate::parse_from_str(stem, DATE_KEY_FORMAT) {
                Ok(date) => dates.push(date),
                Err(_) => tracing::debug!(path = %path.display(), "Ignoring non-date file in data directory"),
            }
        }
        Ok(dates)
    }

    fn delete_all(&self) -> Result<()> {
        for path in self.record_files()? {
            fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        }
        Ok(())
    }
}
