//! Session clock: maps the reconciler's wall-clock deadlines onto tokio time.

use chrono::{DateTime, Utc};
use tokio::time::Instant;

pub trait SessionClock {
    fn now(&self) -> DateTime<Utc>;

    /// The tokio instant at which `at` is reached.
    fn instant_for(&self, at: DateTime<Utc>) -> Instant;
}

/// Anchored on tokio's clock, so paused-time tests advance it virtually.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base_instant: Instant,
    base_utc: DateTime<Utc>,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::anchored(Utc::now())
    }

    pub fn anchored(base_utc: DateTime<Utc>) -> Self {
        Self {
            base_instant: Instant::now(),
            base_utc,
        }
    }
}

impl SessionClock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().saturating_duration_since(self.base_instant);
        self.base_utc + chrono::TimeDelta::from_std(elapsed).unwrap_or_default()
    }

    fn instant_for(&self, at: DateTime<Utc>) -> Instant {
        let offset = at
            .signed_duration_since(self.base_utc)
            .to_std()
            .unwrap_or_default();
        self.base_instant + offset
    }
}
