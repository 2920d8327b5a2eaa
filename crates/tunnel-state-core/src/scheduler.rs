//! Single-slot cancellable deferred call.
//!
//! A [`DeferredCall`] holds at most one pending call together with its
//! deadline. Scheduling replaces whatever was pending; nothing runs on its
//! own. The owner drains due calls with [`DeferredCall::take_due`] and
//! executes them, which vacates the slot first so the executed call may
//! schedule again on the same instance.

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending<C> {
    call: C,
    due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredCall<C> {
    pending: Option<Pending<C>>,
}

impl<C> Default for DeferredCall<C> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<C> DeferredCall<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `call` to become due `delay` after `now`.
    ///
    /// Returns the call that was pending before, which will never run. A
    /// deadline past the representable range saturates to the latest instant.
    pub fn schedule(&mut self, call: C, now: DateTime<Utc>, delay: TimeDelta) -> Option<C> {
        let replaced = self.cancel();
        let due_at = now
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.pending = Some(Pending { call, due_at });
        replaced
    }

    /// Disarm the pending call, if any. The call is handed back, not run.
    pub fn cancel(&mut self) -> Option<C> {
        self.pending.take().map(|p| p.call)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|p| p.due_at)
    }

    /// Take the pending call if its deadline is at or before `now`.
    ///
    /// Returns the deadline it was due at together with the call.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, C)> {
        match &self.pending {
            Some(p) if p.due_at <= now => self.pending.take().map(|p| (p.due_at, p.call)),
            _ => None,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
