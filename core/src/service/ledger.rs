use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, Timelike, Utc};
use tracing::{debug, warn};

use crate::model::daily_record::{DailyRecord, Delta};
use crate::model::stats::AggregateStats;
use crate::repository::DailyRecordRepository;
use crate::time::Clock;

/// Owns today's record and is the only writer of durable state.
///
/// Every entry point first checks whether the wall-clock date moved past
/// the loaded record, and if so switches to (loading or creating) today's
/// record under the same lock. No timer is involved, so a process that
/// slept across midnight still rolls over on its next call.
pub struct Ledger<R: DailyRecordRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
    today: Mutex<DailyRecord>,
}

impl<R: DailyRecordRepository> Ledger<R> {
    pub fn new(repo: R, clock: Arc<dyn Clock>) -> Self {
        let today = load_or_init(&repo, clock.as_ref(), clock.today());
        Self {
            repo,
            clock,
            today: Mutex::new(today),
        }
    }

    /// Adds `delta.seconds` to today's totals and persists immediately.
    /// The hour bucket is the hour at the time of this call.
    pub fn record_activity(&self, delta: &Delta) {
        if delta.seconds == 0 {
            return;
        }
        let now = self.clock.now();
        let mut today = self.current_on(now.date_naive());
        today.add(delta, now.hour() as usize);
        self.persist(&mut today);
    }

    pub fn today_stats(&self) -> DailyRecord {
        self.current().clone()
    }

    /// Rollup over today plus up to `days - 1` of the most recent other records.
    pub fn stats(&self, days: usize) -> AggregateStats {
        let today = self.today_stats();
        let history = days.max(1) - 1;

        let mut dates = match self.repo.list_dates() {
            Ok(dates) => dates,
            Err(e) => {
                warn!(error = %e, "Failed to list persisted records");
                Vec::new()
            }
        };
        dates.retain(|date| *date != today.date);
        dates.sort_by(|a, b| b.cmp(a));

        let mut daily_data = Vec::with_capacity(history + 1);
        daily_data.push(today);
        for date in dates.into_iter().take(history) {
            match self.repo.load(date) {
                Ok(Some(record)) => daily_data.push(record),
                Ok(None) => debug!(%date, "Record vanished before it could be read"),
                Err(e) => warn!(%date, error = %e, "Skipping unreadable record"),
            }
        }

        AggregateStats::from_records(daily_data)
    }

    /// Deletes every persisted record and starts a fresh one for today.
    pub fn reset_stats(&self) -> bool {
        let mut today = self.lock();
        if let Err(e) = self.repo.delete_all() {
            warn!(error = %e, "Failed to reset stats");
            return false;
        }
        *today = DailyRecord::new(self.clock.today(), self.clock.now().with_timezone(&Utc));
        match self.repo.save(&today) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to write fresh record after reset");
                false
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, DailyRecord> {
        self.today.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn current(&self) -> MutexGuard<'_, DailyRecord> {
        self.current_on(self.clock.today())
    }

    fn current_on(&self, date: NaiveDate) -> MutexGuard<'_, DailyRecord> {
        let mut today = self.lock();
        if today.date != date {
            debug!(from = %today.date, to = %date, "Day rolled over");
            *today = load_or_init(&self.repo, self.clock.as_ref(), date);
        }
        today
    }

    // A failed write leaves the in-memory record authoritative until the next one succeeds.
    fn persist(&self, record: &mut DailyRecord) {
        record.last_updated = self.clock.now().with_timezone(&Utc);
        if let Err(e) = self.repo.save(record) {
            warn!(date = %record.date, error = %e, "Failed to save record");
        }
    }
}

fn load_or_init<R: DailyRecordRepository>(repo: &R, clock: &dyn Clock, date: NaiveDate) -> DailyRecord {
    match repo.load(date) {
        Ok(Some(record)) => record,
        Ok(None) => init_record(repo, clock, date),
        Err(e) => {
            warn!(%date, error = %e, "Failed to load record, starting fresh");
            init_record(repo, clock, date)
        }
    }
}

fn init_record<R: DailyRecordRepository>(repo: &R, clock: &dyn Clock, date: NaiveDate) -> DailyRecord {
    let record = DailyRecord::new(date, clock.now().with_timezone(&Utc));
    if let Err(e) = repo.save(&record) {
        warn!(%date, error = %e, "Failed to save new record");
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, StoreError};
    use crate::repository::FileDailyRecordRepository;
    use crate::time::ManualClock;
    use chrono::{Duration, Local, TimeZone};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn clock_at(day: u32, hour: u32) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap(),
        ))
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    /// In-memory repository whose writes can be made to fail.
    #[derive(Default)]
    struct MemoryRepo {
        records: Mutex<HashMap<NaiveDate, DailyRecord>>,
        fail_writes: Mutex<bool>,
        fail_deletes: Mutex<bool>,
    }

    impl DailyRecordRepository for MemoryRepo {
        fn load(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
            Ok(self.records.lock().unwrap().get(&date).cloned())
        }
        fn save(&self, record: &DailyRecord) -> Result<()> {
            if *self.fail_writes.lock().unwrap() {
                return Err(StoreError::io(
                    "memory",
                    std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                ));
            }
            self.records.lock().unwrap().insert(record.date, record.clone());
            Ok(())
        }
        fn list_dates(&self) -> Result<Vec<NaiveDate>> {
            Ok(self.records.lock().unwrap().keys().cloned().collect())
        }
        fn delete_all(&self) -> Result<()> {
            if *self.fail_deletes.lock().unwrap() {
                return Err(StoreError::io(
                    "memory",
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                ));
            }
            self.records.lock().unwrap().clear();
            Ok(())
        }
    }

    /// Moves forward one second every time it is read.
    struct SteppingClock {
        next: Mutex<chrono::DateTime<Local>>,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> chrono::DateTime<Local> {
            let mut next = self.next.lock().unwrap();
            let now = *next;
            *next += Duration::seconds(1);
            now
        }
    }

    #[test]
    fn test_new_ledger_persists_empty_today() {
        let dir = tempdir().unwrap();
        let repo = FileDailyRecordRepository::new(dir.path()).unwrap();
        let ledger = Ledger::new(repo.clone(), clock_at(10, 9));

        let today = ledger.today_stats();
        assert_eq!(today.date, date(10));
        assert_eq!(today.total_seconds, 0);
        assert_eq!(today.hourly_breakdown, [0; 24]);
        assert!(repo.load(date(10)).unwrap().is_some());
    }

    #[test]
    fn test_record_ninety_seconds_at_fourteen() {
        let dir = tempdir().unwrap();
        let repo = FileDailyRecordRepository::new(dir.path()).unwrap();
        let ledger = Ledger::new(repo.clone(), clock_at(10, 14));

        ledger.record_activity(&Delta::new(90, "python", "py", "/work/a.py"));

        let today = ledger.today_stats();
        assert_eq!(today.total_seconds, 90);
        assert_eq!(today.language_seconds, HashMap::from([("python".to_string(), 90)]));
        assert_eq!(today.file_seconds, HashMap::from([("a.py".to_string(), 90)]));
        assert_eq!(today.hourly_breakdown[14], 90);
        assert!(today.check_invariants());

        let on_disk = repo.load(date(10)).unwrap().unwrap();
        assert_eq!(on_disk.total_seconds, 90);
    }

    #[test]
    fn test_zero_seconds_is_noop() {
        let repo = MemoryRepo::default();
        let ledger = Ledger::new(repo, clock_at(10, 14));
        let before = ledger.today_stats();
        ledger.record_activity(&Delta::new(0, "rust", "rs", "main.rs"));
        assert_eq!(ledger.today_stats(), before);
    }

    #[test]
    fn test_today_stats_is_stable_without_activity() {
        let ledger = Ledger::new(MemoryRepo::default(), clock_at(10, 14));
        assert_eq!(ledger.today_stats(), ledger.today_stats());
    }

    #[test]
    fn test_day_rollover_leaves_previous_day_untouched() {
        let dir = tempdir().unwrap();
        let repo = FileDailyRecordRepository::new(dir.path()).unwrap();
        let clock = clock_at(10, 23);
        let ledger = Ledger::new(repo.clone(), clock.clone());

        ledger.record_activity(&Delta::new(60, "rust", "rs", "main.rs"));
        let yesterday = repo.load(date(10)).unwrap().unwrap();

        clock.advance(Duration::hours(2));
        ledger.record_activity(&Delta::new(30, "rust", "rs", "main.rs"));

        assert_eq!(repo.load(date(10)).unwrap().unwrap(), yesterday);
        let today = ledger.today_stats();
        assert_eq!(today.date, date(11));
        assert_eq!(today.total_seconds, 30);
        assert_eq!(today.hourly_breakdown[1], 30);
    }

    #[test]
    fn test_today_stats_rolls_over_without_activity() {
        let clock = clock_at(10, 12);
        let ledger = Ledger::new(MemoryRepo::default(), clock.clone());
        ledger.record_activity(&Delta::new(10, "rust", "rs", "main.rs"));

        clock.advance(Duration::days(1));
        let today = ledger.today_stats();
        assert_eq!(today.date, date(11));
        assert_eq!(today.total_seconds, 0);
    }

    #[test]
    fn test_rollover_resumes_existing_record() {
        let repo = MemoryRepo::default();
        let mut existing = DailyRecord::new(date(11), chrono::Utc::now());
        existing.add(&Delta::new(500, "go", "go", "x.go"), 8);
        repo.save(&existing).unwrap();

        let clock = clock_at(10, 12);
        let ledger = Ledger::new(repo, clock.clone());
        clock.advance(Duration::days(1));
        ledger.record_activity(&Delta::new(5, "go", "go", "x.go"));

        assert_eq!(ledger.today_stats().total_seconds, 505);
    }

    #[test]
    fn test_corrupt_today_falls_back_to_fresh_record() {
        let dir = tempdir().unwrap();
        let repo = FileDailyRecordRepository::new(dir.path()).unwrap();
        std::fs::write(repo.data_dir().join("2025-03-10.json"), "garbage").unwrap();

        let ledger = Ledger::new(repo.clone(), clock_at(10, 9));
        assert_eq!(ledger.today_stats().total_seconds, 0);
        assert!(repo.load(date(10)).unwrap().is_some());
    }

    #[test]
    fn test_write_failure_keeps_in_memory_totals() {
        let repo = MemoryRepo::default();
        let ledger = Ledger::new(repo, clock_at(10, 9));
        *ledger.repo.fail_writes.lock().unwrap() = true;

        ledger.record_activity(&Delta::new(20, "rust", "rs", "main.rs"));
        ledger.record_activity(&Delta::new(22, "rust", "rs", "main.rs"));
        assert_eq!(ledger.today_stats().total_seconds, 42);

        *ledger.repo.fail_writes.lock().unwrap() = false;
        ledger.record_activity(&Delta::new(1, "rust", "rs", "main.rs"));
        assert_eq!(ledger.repo.load(date(10)).unwrap().unwrap().total_seconds, 43);
    }

    #[test]
    fn test_stats_window_and_ordering() {
        let dir = tempdir().unwrap();
        let repo = FileDailyRecordRepository::new(dir.path()).unwrap();
        for day in [1, 3, 5, 7, 8] {
            let mut r = DailyRecord::new(date(day), chrono::Utc::now());
            r.add(&Delta::new(day as u64 * 10, "rust", "rs", "lib.rs"), 10);
            repo.save(&r).unwrap();
        }
        // A record dated after "today" still sorts first among historical ones.
        let ledger = Ledger::new(repo.clone(), clock_at(6, 10));
        ledger.record_activity(&Delta::new(15, "rust", "rs", "lib.rs"));

        let stats = ledger.stats(4);
        let dates: Vec<NaiveDate> = stats.daily_data.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(6), date(8), date(7), date(5)]);
        assert_eq!(stats.total_seconds, 15 + 80 + 70 + 50);
        assert_eq!(stats.most_productive_day.date, Some(date(8)));

        let all = ledger.stats(30);
        assert_eq!(all.daily_data.len(), 6);
        assert_eq!(
            all.total_seconds,
            all.daily_data.iter().map(|d| d.total_seconds).sum::<u64>()
        );
    }

    #[test]
    fn test_stats_today_wins_ties() {
        let repo = MemoryRepo::default();
        let mut old = DailyRecord::new(date(9), chrono::Utc::now());
        old.add(&Delta::new(100, "rust", "rs", "lib.rs"), 10);
        repo.save(&old).unwrap();

        let ledger = Ledger::new(repo, clock_at(10, 10));
        ledger.record_activity(&Delta::new(100, "rust", "rs", "lib.rs"));

        let stats = ledger.stats(7);
        assert_eq!(stats.daily_data.len(), 2);
        assert_eq!(stats.most_productive_day.date, Some(date(10)));
    }

    #[test]
    fn test_stats_zero_days_is_today_only() {
        let repo = MemoryRepo::default();
        repo.save(&DailyRecord::new(date(9), chrono::Utc::now())).unwrap();
        let ledger = Ledger::new(repo, clock_at(10, 10));
        assert_eq!(ledger.stats(0).daily_data.len(), 1);
        assert_eq!(ledger.stats(1).daily_data.len(), 1);
    }

    #[test]
    fn test_stats_skips_corrupt_history() {
        let dir = tempdir().unwrap();
        let repo = FileDailyRecordRepository::new(dir.path()).unwrap();
        repo.save(&DailyRecord::new(date(8), chrono::Utc::now())).unwrap();
        std::fs::write(repo.data_dir().join("2025-03-09.json"), "[1,2").unwrap();

        let ledger = Ledger::new(repo, clock_at(10, 10));
        let stats = ledger.stats(7);
        let dates: Vec<NaiveDate> = stats.daily_data.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(10), date(8)]);
    }

    #[test]
    fn test_reset_then_today_is_all_zero() {
        let dir = tempdir().unwrap();
        let repo = FileDailyRecordRepository::new(dir.path()).unwrap();
        repo.save(&DailyRecord::new(date(2), chrono::Utc::now())).unwrap();
        let ledger = Ledger::new(repo.clone(), clock_at(10, 10));
        ledger.record_activity(&Delta::new(77, "rust", "rs", "lib.rs"));

        assert!(ledger.reset_stats());

        let today = ledger.today_stats();
        assert_eq!(today.date, date(10));
        assert_eq!(today.total_seconds, 0);
        assert!(today.language_seconds.is_empty());
        assert_eq!(today.hourly_breakdown, [0; 24]);
        assert_eq!(repo.list_dates().unwrap(), vec![date(10)]);
    }

    #[test]
    fn test_reset_fails_when_delete_fails() {
        let ledger = Ledger::new(MemoryRepo::default(), clock_at(10, 10));
        ledger.record_activity(&Delta::new(50, "rust", "rs", "lib.rs"));
        *ledger.repo.fail_deletes.lock().unwrap() = true;

        assert!(!ledger.reset_stats());
        assert_eq!(ledger.today_stats().total_seconds, 50);
        assert_eq!(ledger.repo.load(date(10)).unwrap().unwrap().total_seconds, 50);
    }

    #[test]
    fn test_reset_fails_when_fresh_record_cannot_be_written() {
        let repo = MemoryRepo::default();
        repo.save(&DailyRecord::new(date(9), chrono::Utc::now())).unwrap();
        let ledger = Ledger::new(repo, clock_at(10, 10));
        ledger.record_activity(&Delta::new(50, "rust", "rs", "lib.rs"));
        *ledger.repo.fail_writes.lock().unwrap() = true;

        assert!(!ledger.reset_stats());
        assert!(ledger.repo.list_dates().unwrap().is_empty());
        assert_eq!(ledger.today_stats().total_seconds, 0);
    }

    #[test]
    fn test_delta_hour_and_date_come_from_one_reading() {
        // new() reads twice, so the delta is stamped at 23:59:59 and the
        // next reading would already be the following day.
        let clock = Arc::new(SteppingClock {
            next: Mutex::new(Local.with_ymd_and_hms(2025, 3, 10, 23, 59, 57).unwrap()),
        });
        let repo = MemoryRepo::default();
        let ledger = Ledger::new(repo, clock);
        ledger.record_activity(&Delta::new(5, "rust", "rs", "lib.rs"));

        let record = ledger.repo.load(date(10)).unwrap().unwrap();
        assert_eq!(record.hourly_breakdown[23], 5);
        assert_eq!(record.hourly_breakdown[0], 0);
        assert!(record.check_invariants());
    }
}
