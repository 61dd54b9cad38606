//! Clock-synchronized job scheduler.
//!
//! Jobs fire at fixed minutes of the UTC hour: indicator refresh right after
//! each candle closes, signal detection two minutes later and verification
//! four times an hour. The loop wakes every `tick` and runs every job whose
//! slot matches the current minute and has not yet fired in it, so a slot
//! runs at most once however often the loop ticks.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::application::market::MarketService;
use crate::application::signal::detector::Detections;
use crate::application::signal::{SignalBoard, SignalDetector};
use crate::application::verification::{VerificationReport, VerificationService};
use crate::domain::{ClockSchedule, Signal, SignalSummary, Symbol, Timeframe};
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::SchedulerConfig;

/// Errors kept for the status view.
pub const MAX_RECENT_ERRORS: usize = 5;

/// Name recorded for failures of the tick task itself.
pub const TICK_JOB: &str = "scheduler_tick";

/// How long `stop` waits for the loop before aborting it.
pub const STOP_TIMEOUT: StdDuration = StdDuration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {
    Refresh(Timeframe),
    SignalCheck,
    Verification,
}

impl Job {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Refresh(Timeframe::M5) => "refresh_5m",
            Self::Refresh(Timeframe::M15) => "refresh_15m",
            Self::Refresh(Timeframe::H1) => "refresh_1h",
            Self::Refresh(Timeframe::H4) => "refresh_4h",
            Self::SignalCheck => "signal_check",
            Self::Verification => "verification",
        }
    }
}

/// Minute slots for every job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSet {
    pub refresh: Vec<(Timeframe, ClockSchedule)>,
    pub signal_check: ClockSchedule,
    pub verification: ClockSchedule,
}

impl Default for ScheduleSet {
    fn default() -> Self {
        Self {
            refresh: vec![
                (Timeframe::M5, ClockSchedule::refresh_5m()),
                (Timeframe::M15, ClockSchedule::refresh_15m()),
                (Timeframe::H1, ClockSchedule::refresh_1h()),
            ],
            signal_check: ClockSchedule::signal_check(),
            verification: ClockSchedule::verification(),
        }
    }
}

impl ScheduleSet {
    /// Jobs in execution order within a minute.
    #[must_use]
    pub fn jobs(&self) -> Vec<(Job, &ClockSchedule)> {
        let mut jobs: Vec<(Job, &ClockSchedule)> = self
            .refresh
            .iter()
            .map(|(tf, schedule)| (Job::Refresh(*tf), schedule))
            .collect();
        jobs.push((Job::SignalCheck, &self.signal_check));
        jobs.push((Job::Verification, &self.verification));
        jobs
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub tick: StdDuration,
    pub signal_timeframe: Timeframe,
    pub schedules: ScheduleSet,
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            tick: StdDuration::from_secs(config.tick_seconds),
            signal_timeframe: config.signal_timeframe,
            schedules: ScheduleSet::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub data_refreshes: u64,
    pub signal_checks: u64,
    pub signals_detected: u64,
    pub verification_runs: u64,
    pub analyses_verified: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobError {
    pub job: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalRound {
    pub signals: BTreeMap<Symbol, Vec<Signal>>,
    pub summary: SignalSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    pub data_collection: BTreeMap<Timeframe, Vec<u32>>,
    pub signal_check: Vec<u32>,
    pub verification: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextRuns {
    pub data_collection: BTreeMap<Timeframe, DateTime<Utc>>,
    pub signal_check: DateTime<Utc>,
    pub verification: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub signal_timeframe: Timeframe,
    pub schedules: ScheduleView,
    pub counters: Counters,
    pub last_runs: BTreeMap<&'static str, DateTime<Utc>>,
    /// Only present while running.
    pub next_runs: Option<NextRuns>,
    pub recent_errors: Vec<JobError>,
    pub current_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncInfo {
    pub current_time: DateTime<Utc>,
    pub schedule_config: ScheduleView,
    pub next_execution_times: NextRuns,
    pub scheduler_running: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeStatus {
    pub system_time: DateTime<Utc>,
    pub current_minute: u32,
    pub current_second: u32,
    pub active_schedules: BTreeMap<&'static str, bool>,
    pub next_5min_mark: DateTime<Utc>,
    pub seconds_to_next_5min: i64,
    pub scheduler_running: bool,
}

#[derive(Default)]
struct State {
    running: bool,
    /// Bumped on every start so a stale loop cannot clear a newer run.
    generation: u64,
    started_at: Option<DateTime<Utc>>,
    counters: Counters,
    last_runs: BTreeMap<&'static str, DateTime<Utc>>,
    fired: HashMap<Job, DateTime<Utc>>,
    errors: VecDeque<JobError>,
}

struct Worker {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Clears the running flag when the loop task ends, including on panic or
/// abort.
struct RunningGuard {
    scheduler: Arc<Scheduler>,
    generation: u64,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let mut state = self.scheduler.state.lock();
        if state.generation == self.generation {
            state.running = false;
            state.started_at = None;
        }
    }
}

/// Runs refresh, signal and verification jobs on the wall clock.
pub struct Scheduler {
    market: Arc<MarketService>,
    detector: Arc<SignalDetector>,
    board: Arc<SignalBoard>,
    verifier: Arc<VerificationService>,
    settings: SchedulerSettings,
    state: Mutex<State>,
    worker: Mutex<Option<Worker>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        market: Arc<MarketService>,
        detector: Arc<SignalDetector>,
        board: Arc<SignalBoard>,
        verifier: Arc<VerificationService>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            market,
            detector,
            board,
            verifier,
            settings,
            state: Mutex::new(State::default()),
            worker: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Spawn the scheduler loop. Returns `false` if it is already running.
    ///
    /// A loop that died on its own is replaced.
    /// Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            return false;
        }

        let (stop, shutdown) = watch::channel(false);
        let generation = {
            let mut state = self.state.lock();
            state.running = true;
            state.started_at = Some(Utc::now());
            state.generation += 1;
            state.generation
        };
        let guard = RunningGuard {
            scheduler: Arc::clone(self),
            generation,
        };
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            this.run_loop(shutdown).await;
        });
        *worker = Some(Worker { stop, handle });

        info!(
            tick_secs = self.settings.tick.as_secs(),
            signal_timeframe = %self.settings.signal_timeframe,
            "Scheduler started"
        );
        true
    }

    /// Stop the loop and wait up to [`STOP_TIMEOUT`] for it to finish.
    /// Returns `false` if it was not running.
    pub async fn stop(&self) -> bool {
        let worker = self.worker.lock().take();
        let Some(worker) = worker else {
            return false;
        };

        let _ = worker.stop.send(true);
        let mut handle = worker.handle;
        if tokio::time::timeout(STOP_TIMEOUT, &mut handle).await.is_err() {
            warn!("Scheduler did not stop in time, aborting");
            handle.abort();
        }

        let mut state = self.state.lock();
        state.running = false;
        state.started_at = None;
        info!("Scheduler stopped");
        true
    }

    async fn run_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.settings.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                debug!("Scheduler shutdown requested");
                                break;
                            }
                        }
                        Err(_) => {
                            debug!("Scheduler shutdown channel closed");
                            break;
                        }
                    }
                }
                _ = interval.tick() => {
                    let this = Arc::clone(&self);
                    let now = Utc::now();
                    if let Err(e) = tokio::task::spawn_blocking(move || this.run_due(now)).await {
                        self.record_error(TICK_JOB, &e.to_string(), now);
                    }
                }
            }
        }
    }

    /// Claim every job whose slot matches `now` and has not fired in this
    /// minute yet.
    pub fn due_jobs(&self, now: DateTime<Utc>) -> Vec<Job> {
        let slot = minute_start(now);
        let minute = now.minute();
        let mut state = self.state.lock();

        let mut due = Vec::new();
        for (job, schedule) in self.settings.schedules.jobs() {
            if schedule.contains(minute) && state.fired.get(&job) != Some(&slot) {
                state.fired.insert(job, slot);
                due.push(job);
            }
        }
        due
    }

    /// Run whatever is due at `now` and return the jobs that ran.
    pub fn run_due(&self, now: DateTime<Utc>) -> Vec<Job> {
        let due = self.due_jobs(now);
        for &job in &due {
            debug!(job = job.name(), "Running scheduled job");
            match job {
                Job::Refresh(timeframe) => self.run_refresh(timeframe, now),
                Job::SignalCheck => {
                    self.run_signal_check(now);
                }
                Job::Verification => {
                    let _ = self.run_verification(now);
                }
            }
        }
        due
    }

    fn run_refresh(&self, timeframe: Timeframe, now: DateTime<Utc>) {
        let job = Job::Refresh(timeframe);
        let symbols = self.market.active_symbols();
        let report = self.market.refresh(&symbols, &[timeframe], now);
        for message in &report.errors {
            self.record_error(job.name(), message, now);
        }

        let mut state = self.state.lock();
        state.counters.data_refreshes += 1;
        state.last_runs.insert(job.name(), now);
        debug!(
            timeframe = %timeframe,
            refreshed = report.refreshed,
            failed = report.failed,
            "Refresh job finished"
        );
    }

    /// Detect signals for every active symbol and publish them on the board.
    pub fn run_signal_check(&self, now: DateTime<Utc>) -> SignalRound {
        let symbols = self.market.active_symbols();
        let Detections { signals, failures } =
            self.detector.detect_all(&symbols, self.settings.signal_timeframe, now);
        for (symbol, e) in failures {
            if !matches!(e, Error::NotFound(_)) {
                self.record_error(Job::SignalCheck.name(), &format!("{symbol}: {e}"), now);
            }
        }
        self.board.record(&signals, now);
        let summary = SignalSummary::from_signals(&signals, now);

        {
            let mut state = self.state.lock();
            state.counters.signal_checks += 1;
            state.counters.signals_detected += summary.total_signals as u64;
            state.last_runs.insert(Job::SignalCheck.name(), now);
        }

        if summary.total_signals > 0 {
            info!(
                symbols = summary.symbols_with_signals,
                signals = summary.total_signals,
                high_priority = summary.high_priority_signals,
                "Signal check found signals"
            );
        } else {
            debug!(symbols = symbols.len(), "Signal check found nothing");
        }
        SignalRound { signals, summary }
    }

    /// Grade pending analyses.
    ///
    /// # Errors
    /// Returns the storage error after recording it in the status view.
    pub fn run_verification(&self, now: DateTime<Utc>) -> Result<VerificationReport> {
        match self.verifier.run(now) {
            Ok(report) => {
                let mut state = self.state.lock();
                state.counters.verification_runs += 1;
                state.counters.analyses_verified += report.verified as u64;
                state.last_runs.insert(Job::Verification.name(), now);
                Ok(report)
            }
            Err(e) => {
                self.record_error(Job::Verification.name(), &e.to_string(), now);
                Err(e)
            }
        }
    }

    fn record_error(&self, job: &str, message: &str, at: DateTime<Utc>) {
        error!(job, error = %message, "Scheduled job failed");
        let mut state = self.state.lock();
        state.errors.push_back(JobError {
            job: job.to_string(),
            message: message.to_string(),
            at,
        });
        while state.errors.len() > MAX_RECENT_ERRORS {
            state.errors.pop_front();
        }
    }

    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> SchedulerStatus {
        let state = self.state.lock();
        SchedulerStatus {
            running: state.running,
            started_at: state.started_at,
            signal_timeframe: self.settings.signal_timeframe,
            schedules: self.schedule_view(),
            counters: state.counters.clone(),
            last_runs: state.last_runs.clone(),
            next_runs: state.running.then(|| self.next_runs(now)),
            recent_errors: state.errors.iter().cloned().collect(),
            current_time: now,
        }
    }

    #[must_use]
    pub fn sync_info(&self, now: DateTime<Utc>) -> SyncInfo {
        SyncInfo {
            current_time: now,
            schedule_config: self.schedule_view(),
            next_execution_times: self.next_runs(now),
            scheduler_running: self.is_running(),
        }
    }

    #[must_use]
    pub fn time_status(&self, now: DateTime<Utc>) -> TimeStatus {
        let minute = now.minute();
        let mut active_schedules = BTreeMap::new();
        for (job, schedule) in self.settings.schedules.jobs() {
            active_schedules.insert(job.name(), schedule.contains(minute));
        }

        let next_5min_mark = ClockSchedule::every(5, 0)
            .map(|s| s.next_after(now))
            .unwrap_or(now);

        TimeStatus {
            system_time: now,
            current_minute: minute,
            current_second: now.second(),
            active_schedules,
            next_5min_mark,
            seconds_to_next_5min: (next_5min_mark - now).num_seconds(),
            scheduler_running: self.is_running(),
        }
    }

    fn schedule_view(&self) -> ScheduleView {
        let schedules = &self.settings.schedules;
        ScheduleView {
            data_collection: schedules
                .refresh
                .iter()
                .map(|(tf, s)| (*tf, s.minutes().to_vec()))
                .collect(),
            signal_check: schedules.signal_check.minutes().to_vec(),
            verification: schedules.verification.minutes().to_vec(),
        }
    }

    fn next_runs(&self, now: DateTime<Utc>) -> NextRuns {
        let schedules = &self.settings.schedules;
        NextRuns {
            data_collection: schedules
                .refresh
                .iter()
                .map(|(tf, s)| (*tf, s.next_after(now)))
                .collect(),
            signal_check: schedules.signal_check.next_after(now),
            verification: schedules.verification.next_after(now),
        }
    }
}

fn minute_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(Duration::minutes(1)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::domain::{Candle, NewAnalysis, PriceTick, Recommendation};
    use crate::port::{MarketStore, StoredSnapshot};
    use crate::testkit::domain::surge_candles;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, h, m, s).unwrap()
    }

    /// Market store whose every call fails with a database error.
    struct BrokenStore;

    fn broken<T>() -> Result<T> {
        Err(Error::Database("disk I/O error".to_string()))
    }

    impl MarketStore for BrokenStore {
        fn insert_candles(&self, _: &Symbol, _: Timeframe, _: &[Candle]) -> Result<usize> {
            broken()
        }
        fn latest_candles(&self, _: &Symbol, _: Timeframe, _: usize) -> Result<Vec<Candle>> {
            broken()
        }
        fn last_candle_time(&self, _: &Symbol, _: Timeframe) -> Result<Option<DateTime<Utc>>> {
            broken()
        }
        fn insert_price(&self, _: &PriceTick) -> Result<()> {
            broken()
        }
        fn latest_price(&self, _: &Symbol) -> Result<Option<PriceTick>> {
            broken()
        }
        fn save_snapshot(&self, _: &StoredSnapshot) -> Result<()> {
            broken()
        }
        fn latest_snapshot(&self, _: &Symbol, _: Timeframe) -> Result<Option<StoredSnapshot>> {
            broken()
        }
        fn symbols(&self) -> Result<Vec<Symbol>> {
            broken()
        }
        fn ping(&self) -> Result<()> {
            broken()
        }
    }

    fn scheduler() -> (Arc<MemoryStore>, Arc<Scheduler>) {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler_over(store.clone());
        (store, scheduler)
    }

    fn scheduler_over(store: Arc<dyn MarketStore>) -> Arc<Scheduler> {
        let analyses = Arc::new(MemoryStore::new());
        let market = Arc::new(MarketService::new(
            store.clone(),
            vec![Symbol::default_symbol()],
            Timeframe::COLLECTED.to_vec(),
            50,
        ));
        let detector = Arc::new(SignalDetector::new(store.clone(), Duration::minutes(60)));
        let verifier = Arc::new(VerificationService::new(
            analyses,
            store,
            Duration::minutes(15),
            2.0,
        ));
        let settings = SchedulerSettings {
            tick: StdDuration::from_millis(20),
            signal_timeframe: Timeframe::M5,
            schedules: ScheduleSet::default(),
        };
        let scheduler = Scheduler::new(
            market,
            detector,
            Arc::new(SignalBoard::new()),
            verifier,
            settings,
        );
        Arc::new(scheduler)
    }

    #[test]
    fn minute_one_refreshes_all_timeframes() {
        let (_, scheduler) = scheduler();
        let due = scheduler.due_jobs(at(10, 1, 5));
        assert_eq!(
            due,
            vec![
                Job::Refresh(Timeframe::M5),
                Job::Refresh(Timeframe::M15),
                Job::Refresh(Timeframe::H1),
            ]
        );
    }

    #[test]
    fn slot_fires_once_per_minute() {
        let (_, scheduler) = scheduler();
        assert_eq!(
            scheduler.due_jobs(at(10, 3, 0)),
            vec![Job::SignalCheck, Job::Verification]
        );
        assert!(scheduler.due_jobs(at(10, 3, 40)).is_empty());
        assert_eq!(scheduler.due_jobs(at(10, 8, 0)), vec![Job::SignalCheck]);
        assert_eq!(
            scheduler.due_jobs(at(11, 3, 0)),
            vec![Job::SignalCheck, Job::Verification]
        );
    }

    #[test]
    fn off_slot_minute_runs_nothing() {
        let (_, scheduler) = scheduler();
        assert!(scheduler.run_due(at(10, 2, 0)).is_empty());
        assert_eq!(scheduler.status(at(10, 2, 0)).counters, Counters::default());
    }

    #[test]
    fn signal_check_publishes_to_board() {
        let (store, scheduler) = scheduler();
        store
            .insert_candles(
                &Symbol::default_symbol(),
                Timeframe::M5,
                &surge_candles(150, 100.0, 6.0),
            )
            .unwrap();

        let round = scheduler.run_signal_check(at(10, 3, 0));
        assert!(round.summary.total_signals > 0);
        assert!(scheduler.board.get(&Symbol::default_symbol()).is_some());

        let status = scheduler.status(at(10, 4, 0));
        assert_eq!(status.counters.signal_checks, 1);
        assert_eq!(
            status.counters.signals_detected,
            round.summary.total_signals as u64
        );
        assert_eq!(status.last_runs["signal_check"], at(10, 3, 0));
    }

    #[test]
    fn verification_job_updates_counters() {
        let (store, scheduler) = scheduler();
        let sol = Symbol::default_symbol();
        let analysis = NewAnalysis {
            symbol: sol.clone(),
            agent_name: None,
            recommendation: Recommendation::Hold,
            confidence: 0.5,
            analysis: String::new(),
            entry_price: 100.0,
            target_price: None,
            stop_loss: None,
        };
        scheduler
            .verifier
            .record(&analysis, at(9, 0, 0))
            .unwrap();
        store
            .insert_price(&PriceTick::try_new(sol, 101.0, 0.0, 0.0, at(9, 30, 0)).unwrap())
            .unwrap();

        assert_eq!(
            scheduler.run_due(at(10, 18, 0)),
            vec![Job::SignalCheck, Job::Verification]
        );
        let counters = scheduler.status(at(10, 19, 0)).counters;
        assert_eq!(counters.verification_runs, 1);
        assert_eq!(counters.analyses_verified, 1);
    }

    #[test]
    fn errors_keep_last_five() {
        let (_, scheduler) = scheduler();
        for i in 0..7 {
            scheduler.record_error(Job::Verification.name(), &format!("boom {i}"), at(10, i, 0));
        }
        let errors = scheduler.status(at(10, 30, 0)).recent_errors;
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].message, "boom 2");
    }

    #[test]
    fn refresh_failures_are_recorded() {
        let scheduler = scheduler_over(Arc::new(BrokenStore));
        assert_eq!(scheduler.run_due(at(10, 6, 0)), vec![Job::Refresh(Timeframe::M5)]);

        let status = scheduler.status(at(10, 7, 0));
        assert_eq!(status.counters.data_refreshes, 1);
        assert_eq!(status.recent_errors.len(), 1);
        assert_eq!(status.recent_errors[0].job, "refresh_5m");
        assert!(status.recent_errors[0].message.contains("disk I/O error"));
        assert_eq!(status.recent_errors[0].at, at(10, 6, 0));
    }

    #[test]
    fn signal_check_failures_are_recorded() {
        let scheduler = scheduler_over(Arc::new(BrokenStore));
        let round = scheduler.run_signal_check(at(10, 8, 0));
        assert_eq!(round.summary.total_signals, 0);

        let errors = scheduler.status(at(10, 9, 0)).recent_errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].job, "signal_check");
        assert!(errors[0].message.starts_with("SOL/USDT"));
    }

    #[test]
    fn missing_data_is_not_an_error() {
        let (_, scheduler) = scheduler();
        scheduler.run_due(at(10, 1, 0));
        scheduler.run_signal_check(at(10, 3, 0));
        assert!(scheduler.status(at(10, 4, 0)).recent_errors.is_empty());
    }

    #[test]
    fn sync_info_rolls_into_next_hour() {
        let (_, scheduler) = scheduler();
        let info = scheduler.sync_info(at(10, 58, 30));
        assert_eq!(info.next_execution_times.signal_check, at(11, 3, 0));
        assert_eq!(info.next_execution_times.data_collection[&Timeframe::H1], at(11, 1, 0));
        assert!(!info.scheduler_running);
    }

    #[test]
    fn time_status_reports_active_slots() {
        let (_, scheduler) = scheduler();
        let status = scheduler.time_status(at(10, 33, 20));
        assert!(status.active_schedules["signal_check"]);
        assert!(status.active_schedules["verification"]);
        assert!(!status.active_schedules["refresh_5m"]);
        assert_eq!(status.next_5min_mark, at(10, 35, 0));
        assert_eq!(status.seconds_to_next_5min, 100);
    }

    #[tokio::test]
    async fn start_and_stop_lifecycle() {
        let (_, scheduler) = scheduler();
        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());
        assert!(scheduler.status(Utc::now()).next_runs.is_some());

        tokio::time::sleep(StdDuration::from_millis(60)).await;

        assert!(scheduler.stop().await);
        assert!(!scheduler.is_running());
        assert!(!scheduler.stop().await);
    }

    #[tokio::test]
    async fn dead_loop_clears_running_and_can_restart() {
        let (_, scheduler) = scheduler();
        assert!(scheduler.start());
        if let Some(worker) = scheduler.worker.lock().as_ref() {
            worker.handle.abort();
        }
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        assert!(!scheduler.is_running());
        assert!(scheduler.start());
        assert!(scheduler.is_running());
        assert!(scheduler.stop().await);
    }
}
