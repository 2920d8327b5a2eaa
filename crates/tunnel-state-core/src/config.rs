//! Reconciler timing configuration.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Quiet period a notification must follow before it is acted on (ms).
pub const DEFAULT_DEBOUNCE_MS: i64 = 150;

/// How long an optimistic state is shown without confirmation (ms).
pub const DEFAULT_FALLBACK_TIMEOUT_MS: i64 = 3000;

/// Largest timing value (ms) that is representable as a [`TimeDelta`].
pub const MAX_TIMING_MS: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    #[serde(rename = "debounce_ms", with = "millis")]
    pub debounce: TimeDelta,
    #[serde(rename = "fallback_timeout_ms", with = "millis")]
    pub fallback_timeout: TimeDelta,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            debounce: TimeDelta::milliseconds(DEFAULT_DEBOUNCE_MS),
            fallback_timeout: TimeDelta::milliseconds(DEFAULT_FALLBACK_TIMEOUT_MS),
        }
    }
}

impl ReconcilerConfig {
    /// Values above [`MAX_TIMING_MS`] saturate to the longest delay.
    #[must_use]
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce = millis_to_delta(ms).unwrap_or(TimeDelta::MAX);
        self
    }

    /// Values above [`MAX_TIMING_MS`] saturate to the longest delay.
    #[must_use]
    pub fn with_fallback_timeout_ms(mut self, ms: u64) -> Self {
        self.fallback_timeout = millis_to_delta(ms).unwrap_or(TimeDelta::MAX);
        self
    }
}

/// `None` when `ms` does not fit a [`TimeDelta`].
pub fn millis_to_delta(ms: u64) -> Option<TimeDelta> {
    i64::try_from(ms).ok().and_then(TimeDelta::try_milliseconds)
}

mod millis {
    use chrono::TimeDelta;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let ms = u64::deserialize(deserializer)?;
        super::millis_to_delta(ms)
            .ok_or_else(|| D::Error::custom(format!("{ms} ms is out of range")))
    }
}
