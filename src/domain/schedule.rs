//! Minute-of-hour schedules.
//!
//! Collection and analysis jobs are aligned to the wall clock (UTC) so that
//! they run right after a candle closes. A [`ClockSchedule`] is the set of
//! minutes within each hour at which a job fires.

use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Sorted, de-duplicated minutes in `0..60`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct ClockSchedule {
    minutes: Vec<u32>,
}

impl ClockSchedule {
    /// Build a schedule from explicit minutes.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidSchedule`] when the list is empty or a
    /// minute is 60 or more.
    pub fn new(minutes: impl IntoIterator<Item = u32>) -> Result<Self, DomainError> {
        let mut minutes: Vec<u32> = minutes.into_iter().collect();
        if let Some(bad) = minutes.iter().find(|m| **m >= 60) {
            return Err(DomainError::InvalidSchedule {
                reason: format!("minute {bad} is outside 0..60"),
            });
        }
        minutes.sort_unstable();
        minutes.dedup();
        if minutes.is_empty() {
            return Err(DomainError::InvalidSchedule {
                reason: "no minutes given".to_string(),
            });
        }
        Ok(Self { minutes })
    }

    /// `offset, offset + step, ...` up to the end of the hour.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidSchedule`] for a zero step or an offset
    /// past the hour.
    pub fn every(step: u32, offset: u32) -> Result<Self, DomainError> {
        if step == 0 {
            return Err(DomainError::InvalidSchedule {
                reason: "step must be positive".to_string(),
            });
        }
        Self::new((offset..60).step_by(step as usize))
    }

    /// 5m candle refresh: one minute after each close.
    #[must_use]
    pub fn refresh_5m() -> Self {
        Self::fixed((1..60).step_by(5))
    }

    #[must_use]
    pub fn refresh_15m() -> Self {
        Self::fixed([1, 16, 31, 46])
    }

    #[must_use]
    pub fn refresh_1h() -> Self {
        Self::fixed([1])
    }

    /// Signal detection, two minutes after the 5m refresh.
    #[must_use]
    pub fn signal_check() -> Self {
        Self::fixed((3..60).step_by(5))
    }

    #[must_use]
    pub fn verification() -> Self {
        Self::fixed([3, 18, 33, 48])
    }

    fn fixed(minutes: impl IntoIterator<Item = u32>) -> Self {
        let mut minutes: Vec<u32> = minutes.into_iter().collect();
        minutes.sort_unstable();
        minutes.dedup();
        Self { minutes }
    }

    #[must_use]
    pub fn minutes(&self) -> &[u32] {
        &self.minutes
    }

    /// Whether the job fires during `minute`.
    #[must_use]
    pub fn contains(&self, minute: u32) -> bool {
        self.minutes.binary_search(&minute).is_ok()
    }

    /// Start of the next slot strictly after the minute containing `now`.
    #[must_use]
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let hour_start = now
            .duration_trunc(Duration::hours(1))
            .unwrap_or(now);
        let current = now.minute();

        match self.minutes.iter().find(|m| **m > current) {
            Some(&minute) => hour_start + Duration::minutes(i64::from(minute)),
            None => {
                let first = self.minutes.first().copied().unwrap_or(0);
                hour_start + Duration::hours(1) + Duration::minutes(i64::from(first))
            }
        }
    }
}

impl TryFrom<Vec<u32>> for ClockSchedule {
    type Error = DomainError;

    fn try_from(minutes: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<ClockSchedule> for Vec<u32> {
    fn from(schedule: ClockSchedule) -> Self {
        schedule.minutes
    }
}
