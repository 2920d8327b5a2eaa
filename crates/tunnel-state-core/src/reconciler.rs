//! Tunnel state reconciliation.
//!
//! Turns the raw stream of service notifications and user intent into the one
//! state the UI shows:
//!
//! - **Debounce**: a notification arriving within `debounce` of the last
//!   processed one (or while a deferred one is pending) is deferred by
//!   `debounce`, replacing any earlier deferred notification. Only the last
//!   notification of a burst is acted on.
//! - **Optimistic transitions**: `expect_next_status` commits the assumed
//!   state at once and keeps the previous state as fallback for
//!   `fallback_timeout`. A notification of the same kind (or an error)
//!   confirms it; any other notification replaces the fallback without being
//!   shown. When the timer expires the fallback is committed.
//! - **Reconnect collapsing**: `disconnecting(reconnect)` is shown as
//!   `connecting`, falling back to the disconnecting state if the reconnect
//!   is not confirmed in time.
//!
//! The reconciler does no IO and never reads a clock. Every entry point takes
//! `now`, and pending timers are exposed through [`TunnelStateReconciler::next_deadline`]
//! for the owner to drive with [`TunnelStateReconciler::fire_due`].

use chrono::{DateTime, Utc};

use crate::config::ReconcilerConfig;
use crate::eligibility::{ActionEligibility, DefaultEligibility};
use crate::scheduler::DeferredCall;
use crate::types::{ExpectedTransition, TunnelState};

/// Receives every committed tunnel state, synchronously.
pub trait StatusSink {
    fn on_status_changed(&mut self, state: &TunnelState);
}

impl<F: FnMut(&TunnelState)> StatusSink for F {
    fn on_status_changed(&mut self, state: &TunnelState) {
        self(state)
    }
}

/// Marker call held by the fallback timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RevertToFallback;

pub struct TunnelStateReconciler<S, E = DefaultEligibility> {
    config: ReconcilerConfig,
    sink: S,
    eligibility: E,
    committed: TunnelState,
    /// State to revert to while an optimistic state is shown.
    fallback: Option<TunnelState>,
    last_processed_at: DateTime<Utc>,
    debounce: DeferredCall<TunnelState>,
    fallback_timer: DeferredCall<RevertToFallback>,
}

impl<S: StatusSink> TunnelStateReconciler<S> {
    pub fn new(sink: S, config: ReconcilerConfig, now: DateTime<Utc>) -> Self {
        Self::with_eligibility(sink, DefaultEligibility, config, now)
    }
}

impl<S: StatusSink, E: ActionEligibility> TunnelStateReconciler<S, E> {
    /// The debounce window starts armed at `now`, so a burst delivered right
    /// after construction collapses to its last notification.
    pub fn with_eligibility(
        sink: S,
        eligibility: E,
        config: ReconcilerConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            sink,
            eligibility,
            committed: TunnelState::Disconnected,
            fallback: None,
            last_processed_at: now,
            debounce: DeferredCall::new(),
            fallback_timer: DeferredCall::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────

    /// The committed state, i.e. the last one handed to the sink.
    pub fn tunnel_state(&self) -> &TunnelState {
        &self.committed
    }

    pub fn fallback(&self) -> Option<&TunnelState> {
        self.fallback.as_ref()
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn is_debounce_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn is_fallback_armed(&self) -> bool {
        self.fallback_timer.is_pending()
    }

    /// Earliest instant at which [`Self::fire_due`] has work to do.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.debounce.due_at(), self.fallback_timer.due_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── Entry points ──────────────────────────────────────────────

    /// Drop any pending optimistic assumption.
    pub fn reset_fallback(&mut self) {
        self.fallback_timer.cancel();
        self.fallback = None;
    }

    /// Show `next` immediately and keep the current state as fallback.
    pub fn expect_next_status(&mut self, next: ExpectedTransition, now: DateTime<Utc>) {
        tracing::debug!(
            expected = %next,
            fallback = %self.committed,
            "showing optimistic tunnel state"
        );
        self.arm_fallback(self.committed.clone(), now);
        self.commit(next.assumed_state());
    }

    /// Entry point for every notification from the service.
    pub fn handle_new_status(&mut self, new_state: TunnelState, now: DateTime<Utc>) {
        let elapsed = now.signed_duration_since(self.last_processed_at);
        if elapsed < self.config.debounce || self.debounce.is_pending() {
            tracing::debug!(state = %new_state, "deferring tunnel state notification");
            if let Some(superseded) = self.debounce.schedule(new_state, now, self.config.debounce)
            {
                tracing::debug!(state = %superseded, "superseded deferred notification");
            }
            return;
        }

        self.last_processed_at = now;

        if self.fallback.is_some() {
            if new_state.kind() == self.committed.kind() || new_state.is_error() {
                tracing::debug!(state = %new_state, "optimistic tunnel state reconciled");
                self.reset_fallback();
            } else {
                tracing::debug!(
                    state = %new_state,
                    shown = %self.committed,
                    "notification held back as fallback"
                );
                self.fallback = Some(new_state);
                return;
            }
        }

        if new_state.is_reconnecting() {
            // The disconnecting leg of a reconnect is never shown.
            tracing::debug!(fallback = %new_state, "showing reconnect as connecting");
            self.arm_fallback(new_state, now);
            self.commit(ExpectedTransition::Connecting.assumed_state());
        } else {
            self.commit(new_state);
        }
    }

    /// Run every timer due at or before `now`, earliest first.
    ///
    /// Each call executes as of its own deadline. Returns how many fired.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> usize {
        let mut fired = 0;
        loop {
            let debounce_due = self.debounce.due_at().filter(|at| *at <= now);
            let fallback_due = self.fallback_timer.due_at().filter(|at| *at <= now);

            let debounce_first = match (debounce_due, fallback_due) {
                (None, None) => break,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(d), Some(f)) => d <= f,
            };

            if debounce_first {
                if let Some((due_at, state)) = self.debounce.take_due(now) {
                    self.handle_new_status(state, due_at);
                }
            } else if let Some((_, RevertToFallback)) = self.fallback_timer.take_due(now) {
                self.revert_to_fallback();
            }
            fired += 1;
        }
        fired
    }

    /// Cancel both timers. Called when the owning session ends so nothing
    /// fires against a sink that is going away.
    pub fn shutdown(&mut self) {
        self.debounce.cancel();
        self.reset_fallback();
    }

    // ── Eligibility ───────────────────────────────────────────────

    pub fn allow_connect(&self, service_reachable: bool, logged_in: bool) -> bool {
        self.eligibility
            .can_connect(service_reachable, logged_in, self.committed.kind())
    }

    pub fn allow_reconnect(&self, service_reachable: bool, logged_in: bool) -> bool {
        self.eligibility
            .can_reconnect(service_reachable, logged_in, self.committed.kind())
    }

    pub fn allow_disconnect(&self, service_reachable: bool) -> bool {
        self.eligibility
            .can_disconnect(service_reachable, self.committed.kind())
    }

    // ── Internals ─────────────────────────────────────────────────

    fn revert_to_fallback(&mut self) {
        match self.fallback.take() {
            Some(saved) => {
                tracing::debug!(state = %saved, "optimistic tunnel state expired, reverting");
                self.commit(saved);
            }
            None => tracing::trace!("fallback timer fired with empty fallback"),
        }
    }

    fn arm_fallback(&mut self, saved: TunnelState, now: DateTime<Utc>) {
        self.fallback = Some(saved);
        self.fallback_timer
            .schedule(RevertToFallback, now, self.config.fallback_timeout);
    }

    /// Bookkeeping is complete before the sink runs, so a sink that panics
    /// leaves a consistent reconciler behind.
    fn commit(&mut self, state: TunnelState) {
        tracing::trace!(state = %state, "committing tunnel state");
        self.committed = state;
        self.sink.on_status_changed(&self.committed);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
