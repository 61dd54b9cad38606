//! Scheduler rounds over SQLite-backed services.

mod support;

use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use solbot::domain::{Recommendation, Symbol, Timeframe};
use solbot::infrastructure::orchestration::scheduler::Job;
use solbot::port::MarketStore;
use solbot::testkit::domain::{analysis, price_tick, surge_candles};

fn sol() -> Symbol {
    Symbol::normalize("SOL/USDT").unwrap()
}

#[test]
fn due_round_refreshes_and_detects() {
    let (_dir, services) = support::sqlite_services();
    services
        .market
        .ingest_candles(&sol(), Timeframe::M5, surge_candles(150, 100.0, 6.0))
        .unwrap();

    // :01 refreshes every collected timeframe
    let ran = services.scheduler.run_due(Utc.with_ymd_and_hms(2026, 3, 1, 12, 1, 0).unwrap());
    assert!(ran.contains(&Job::Refresh(Timeframe::M5)));
    assert!(services.store.latest_snapshot(&sol(), Timeframe::M5).unwrap().is_some());

    // :03 runs signal detection and verification
    let ran = services.scheduler.run_due(Utc.with_ymd_and_hms(2026, 3, 1, 12, 3, 0).unwrap());
    assert_eq!(ran, vec![Job::SignalCheck, Job::Verification]);

    let status = services.scheduler.status(Utc::now());
    assert_eq!(status.counters.data_refreshes, 3);
    assert_eq!(status.counters.signal_checks, 1);
    assert!(status.counters.signals_detected > 0);
    assert!(services.board.get(&sol()).is_some());
}

#[test]
fn verification_grades_aged_analyses() {
    let (_dir, services) = support::sqlite_services();
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    services
        .verifier
        .record(&analysis(&sol(), Recommendation::Buy, 100.0), t0)
        .unwrap();
    services
        .verifier
        .record(&analysis(&sol(), Recommendation::Sell, 100.0), t0 + Duration::minutes(10))
        .unwrap();
    services.market.ingest_price(&price_tick(&sol(), 104.0)).unwrap();

    let report = services
        .scheduler
        .run_verification(t0 + Duration::minutes(16))
        .unwrap();
    assert_eq!(report.verified, 1);
    assert_eq!(report.success, 1);

    let report = services
        .scheduler
        .run_verification(t0 + Duration::minutes(30))
        .unwrap();
    assert_eq!(report.verified, 1);
    assert_eq!(report.failure, 1);
    assert_eq!(services.scheduler.status(Utc::now()).counters.analyses_verified, 2);
}

#[tokio::test]
async fn start_and_stop_are_idempotent() {
    let (_dir, services) = support::sqlite_services();
    let scheduler = &services.scheduler;

    assert!(scheduler.start());
    assert!(!scheduler.start());
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert!(scheduler.is_running());
    assert!(scheduler.status(Utc::now()).next_runs.is_some());

    assert!(scheduler.stop().await);
    assert!(!scheduler.stop().await);
    assert!(!scheduler.is_running());
    assert!(scheduler.status(Utc::now()).next_runs.is_none());
}
