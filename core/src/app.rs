//! The process-wide context: one ledger, one tracker, one status ticker.
//!
//! Built once at startup and handed by reference to whatever needs it
//! (query handlers, the status sink, the event bridge).

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::model::daily_record::DailyRecord;
use crate::model::file_context::FileDescriptor;
use crate::model::stats::AggregateStats;
use crate::repository::FileDailyRecordRepository;
use crate::service::ledger::Ledger;
use crate::service::status::{StatusText, StatusTicker};
use crate::service::tracker::Tracker;
use crate::time::{Clock, SystemClock};

pub struct CodeTime {
    config: Config,
    ledger: Arc<Ledger<FileDailyRecordRepository>>,
    tracker: Tracker<FileDailyRecordRepository>,
    status: Option<StatusTicker>,
}

impl CodeTime {
    /// Opens the store under `config.storage_root`. Fails only when the
    /// storage directories cannot be created.
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let repo = FileDailyRecordRepository::new(&config.storage_root)?;
        let ledger = Arc::new(Ledger::new(repo, clock.clone()));
        let tracker = Tracker::new(ledger.clone(), clock, &config);
        Ok(Self {
            config,
            ledger,
            tracker,
            status: None,
        })
    }

    /// Starts tracking and the status refresh. Must be called from within a
    /// tokio runtime.
    pub fn activate<F>(&mut self, active_file: Option<FileDescriptor>, status_sink: F)
    where
        F: Fn(StatusText) + Send + Sync + 'static,
    {
        if self.status.is_some() {
            return;
        }
        info!(root = %self.config.storage_root.display(), "Activating");
        self.tracker.start(active_file);
        self.status = Some(StatusTicker::start(
            self.ledger.clone(),
            self.config.status_refresh_interval,
            status_sink,
        ));
    }

    /// Stops both periodic tasks and the tracker. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        if let Some(status) = self.status.take() {
            status.stop();
        }
        self.tracker.stop();
    }

    pub fn is_active(&self) -> bool {
        self.status.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tracker(&self) -> &Tracker<FileDailyRecordRepository> {
        &self.tracker
    }

    pub fn ledger(&self) -> &Ledger<FileDailyRecordRepository> {
        &self.ledger
    }

    pub fn refresh_status(&self) {
        if let Some(status) = &self.status {
            status.refresh_now();
        }
    }

    pub fn today_stats(&self) -> DailyRecord {
        self.ledger.today_stats()
    }

    pub fn stats(&self, days: usize) -> AggregateStats {
        self.ledger.stats(days)
    }

    pub fn reset_stats(&self) -> bool {
        let ok = self.ledger.reset_stats();
        self.refresh_status();
        ok
    }
}

impl Drop for CodeTime {
    fn drop(&mut self) {
        self.deactivate();
    }
}
