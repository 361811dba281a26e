//! Rate Limiting
//!
//! Pure throttling decisions for "send something to the user" actions:
//! a minimum gap between sends plus a cap per UTC calendar day.
//! Callers own the counters; nothing here performs I/O.

use chrono::{DateTime, Duration, Utc};

/// Cooldown + daily cap policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    /// Minimum time between two sends
    pub cooldown: Duration,
    /// Maximum sends within one UTC calendar day
    pub daily_limit: u32,
}

/// Outcome of [`ThrottlePolicy::decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Send is allowed; `daily_count` is the counter value to persist
    Allowed { daily_count: u32 },
    /// Too soon after the previous send
    Cooldown { retry_after: Duration },
    /// Today's quota is used up
    DailyLimitReached,
}

impl ThrottleDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ThrottleDecision::Allowed { .. })
    }
}

impl ThrottlePolicy {
    pub fn new(cooldown: Duration, daily_limit: u32) -> Self {
        Self {
            cooldown,
            daily_limit,
        }
    }

    /// Decide whether a new send may happen at `now`.
    ///
    /// The counter restarts at zero when `last_sent_at` falls on an earlier
    /// calendar day than `now`.
    pub fn decide(
        &self,
        last_sent_at: Option<DateTime<Utc>>,
        daily_count: u32,
        now: DateTime<Utc>,
    ) -> ThrottleDecision {
        let Some(last) = last_sent_at else {
            return ThrottleDecision::Allowed { daily_count: 1 };
        };

        let elapsed = now - last;
        if elapsed < self.cooldown {
            return ThrottleDecision::Cooldown {
                retry_after: self.cooldown - elapsed,
            };
        }

        let count_today = if last.date_naive() == now.date_naive() {
            daily_count
        } else {
            0
        };

        if count_today >= self.daily_limit {
            return ThrottleDecision::DailyLimitReached;
        }

        ThrottleDecision::Allowed {
            daily_count: count_today + 1,
        }
    }
}
