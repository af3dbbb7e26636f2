use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::config::Config;
use crate::model::file_context::{FileContext, FileDescriptor};
use crate::repository::DailyRecordRepository;
use crate::scheduler::PeriodicTask;
use crate::service::ledger::Ledger;
use crate::time::Clock;

/// In-memory session, alive only while tracking.
#[derive(Debug, Clone, Default)]
struct SessionState {
    last_activity_at: Option<DateTime<Local>>,
    current_file: Option<FileContext>,
}

#[derive(Default)]
struct TrackerInner {
    session: Option<SessionState>,
    idle_sweep: Option<PeriodicTask>,
}

/// Turns host activity into elapsed-seconds deltas for the ledger.
///
/// A gap of `idle_threshold` or more between two activities is never
/// counted. The idle sweep also resets the activity clock once that gap
/// is reached, so resuming after a break starts from zero.
pub struct Tracker<R: DailyRecordRepository> {
    ledger: Arc<Ledger<R>>,
    clock: Arc<dyn Clock>,
    idle_threshold: Duration,
    idle_check_interval: Duration,
    inner: Arc<Mutex<TrackerInner>>,
}

impl<R: DailyRecordRepository> Clone for Tracker<R> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            clock: self.clock.clone(),
            idle_threshold: self.idle_threshold,
            idle_check_interval: self.idle_check_interval,
            inner: self.inner.clone(),
        }
    }
}

impl<R: DailyRecordRepository + 'static> Tracker<R> {
    pub fn new(ledger: Arc<Ledger<R>>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            ledger,
            clock,
            idle_threshold: config.idle_threshold,
            idle_check_interval: config.idle_check_interval,
            inner: Arc::new(Mutex::new(TrackerInner::default())),
        }
    }

    /// Starts tracking and the idle sweep. `active_file` is whatever the host
    /// already has open. No-op when already tracking.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, active_file: Option<FileDescriptor>) {
        {
            let mut inner = self.lock();
            if inner.session.is_some() {
                return;
            }
            inner.session = Some(SessionState {
                last_activity_at: Some(self.clock.now()),
                current_file: None,
            });

            let tracker = self.clone();
            inner.idle_sweep = Some(PeriodicTask::spawn(
                "idle-sweep",
                self.idle_check_interval,
                move || tracker.check_idle(),
            ));
        }
        info!(idle_threshold_secs = self.idle_threshold.as_secs(), "Tracking started");

        if active_file.is_some() {
            self.active_file_changed(active_file);
        }
    }

    /// Drops the session and cancels the idle sweep. Once this returns no
    /// sweep or event has any further effect. Idempotent.
    pub fn stop(&self) {
        let mut inner = self.lock();
        if inner.session.take().is_none() {
            return;
        }
        inner.idle_sweep = None;
        info!("Tracking stopped");
    }

    pub fn is_tracking(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Switches the current file, then flushes exactly like `activity`.
    ///
    /// The file is replaced before the flush, so the interval that ended
    /// with the switch is credited to the file being opened.
    pub fn active_file_changed(&self, file: Option<FileDescriptor>) {
        let mut inner = self.lock();
        let Some(session) = inner.session.as_mut() else {
            return;
        };
        session.current_file = file.as_ref().map(FileContext::from_descriptor);
        debug!(file = ?file.as_ref().map(|f| f.name.as_str()), "Active file changed");
        self.flush(session);
    }

    /// Records the time since the previous activity if it is under the idle
    /// threshold and a file is active, then restarts the activity clock.
    pub fn activity(&self) {
        let mut inner = self.lock();
        if let Some(session) = inner.session.as_mut() {
            self.flush(session);
        }
    }

    /// Resets the activity clock once the idle threshold has been reached,
    /// without recording anything.
    pub fn check_idle(&self) {
        let mut inner = self.lock();
        let Some(session) = inner.session.as_mut() else {
            return;
        };
        let Some(last) = session.last_activity_at else {
            return;
        };
        let now = self.clock.now();
        if elapsed_millis(last, now) >= self.idle_threshold.as_millis() {
            debug!(idle_since = %last, "Idle, resetting activity clock");
            session.last_activity_at = Some(now);
        }
    }

    pub fn last_activity_at(&self) -> Option<DateTime<Local>> {
        self.lock().session.as_ref().and_then(|s| s.last_activity_at)
    }

    pub fn current_file(&self) -> Option<FileContext> {
        self.lock()
            .session
            .as_ref()
            .and_then(|s| s.current_file.clone())
    }

    fn flush(&self, session: &mut SessionState) {
        let now = self.clock.now();
        if let (Some(last), Some(file)) = (session.last_activity_at, &session.current_file) {
            let elapsed = elapsed_millis(last, now);
            if elapsed < self.idle_threshold.as_millis() {
                let seconds = (elapsed / 1000) as u64;
                if seconds > 0 {
                    self.ledger.record_activity(&file.delta(seconds));
                }
            }
        }
        session.last_activity_at = Some(now);
    }

    fn lock(&self) -> MutexGuard<'_, TrackerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// A clock that stepped backwards counts as no time at all.
fn elapsed_millis(from: DateTime<Local>, to: DateTime<Local>) -> u128 {
    (to - from).num_milliseconds().max(0) as u128
}
