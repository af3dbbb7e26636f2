use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::model::daily_record::DailyRecord;
use crate::repository::DailyRecordRepository;
use crate::scheduler::PeriodicTask;
use crate::service::ledger::Ledger;

pub const STATUS_TOOLTIP: &str = "Time coded today - Click to view stats";

/// Formats seconds as `Xh Ym`, dropping leftover seconds.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText {
    pub text: String,
    pub tooltip: String,
}

impl StatusText {
    pub fn from_record(record: &DailyRecord) -> Self {
        Self {
            text: format_duration(record.total_seconds),
            tooltip: STATUS_TOOLTIP.to_string(),
        }
    }
}

type Refresh = Arc<dyn Fn() + Send + Sync>;

/// Pushes today's status text to a sink right away, then every period.
///
/// The sink runs under the ticker's lock, so after `stop` returns it is
/// never invoked again.
pub struct StatusTicker {
    active: Arc<Mutex<bool>>,
    refresh: Refresh,
    task: Mutex<Option<PeriodicTask>>,
}

impl StatusTicker {
    /// Must be called from within a tokio runtime.
    pub fn start<R, F>(ledger: Arc<Ledger<R>>, period: Duration, sink: F) -> Self
    where
        R: DailyRecordRepository + 'static,
        F: Fn(StatusText) + Send + Sync + 'static,
    {
        let active = Arc::new(Mutex::new(true));
        let guard = active.clone();
        let refresh: Refresh = Arc::new(move || {
            let active = guard.lock().unwrap_or_else(|e| e.into_inner());
            if *active {
                sink(StatusText::from_record(&ledger.today_stats()));
            }
        });

        refresh();
        let tick = refresh.clone();
        let task = PeriodicTask::spawn("status-refresh", period, move || tick());

        Self {
            active,
            refresh,
            task: Mutex::new(Some(task)),
        }
    }

    /// On-demand refresh; ignored once stopped.
    pub fn refresh_now(&self) {
        (self.refresh)();
    }

    pub fn stop(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        *active = false;
        self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    pub fn is_running(&self) -> bool {
        *self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
