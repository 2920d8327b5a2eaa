//! JSON-lines session inputs and how they are applied to a reconciler.
//!
//! One line per input, tagged by `type`:
//!
//! ```text
//! {"type":"notification","state":{"state":"connected"}}
//! {"type":"expect","next":"disconnecting"}
//! {"type":"reset_fallback"}
//! {"type":"query","service_reachable":true,"logged_in":true}
//! ```
//!
//! Replayed inputs additionally carry `at_ms`, the offset from session start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::eligibility::ActionEligibility;
use crate::error::TunnelStateError;
use crate::reconciler::{StatusSink, TunnelStateReconciler};
use crate::types::{ExpectedTransition, TunnelState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionInput {
    /// Raw notification from the service.
    Notification { state: TunnelState },
    /// The user asked for a transition.
    Expect { next: ExpectedTransition },
    ResetFallback,
    /// Ask which actions are currently allowed.
    Query {
        service_reachable: bool,
        #[serde(default)]
        logged_in: bool,
    },
}

impl SessionInput {
    pub fn from_json(line: &str) -> Result<Self, TunnelStateError> {
        Ok(serde_json::from_str(line)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedInput {
    pub at_ms: u64,
    #[serde(flatten)]
    pub input: SessionInput,
}

impl TimedInput {
    pub fn from_json(line: &str) -> Result<Self, TunnelStateError> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Answer to a [`SessionInput::Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub connect: bool,
    pub reconnect: bool,
    pub disconnect: bool,
}

impl<S: StatusSink, E: ActionEligibility> TunnelStateReconciler<S, E> {
    /// Apply one session input as of `now`. Only queries produce a report.
    pub fn apply(&mut self, input: SessionInput, now: DateTime<Utc>) -> Option<EligibilityReport> {
        match input {
            SessionInput::Notification { state } => {
                self.handle_new_status(state, now);
                None
            }
            SessionInput::Expect { next } => {
                self.expect_next_status(next, now);
                None
            }
            SessionInput::ResetFallback => {
                self.reset_fallback();
                None
            }
            SessionInput::Query {
                service_reachable,
                logged_in,
            } => Some(EligibilityReport {
                connect: self.allow_connect(service_reachable, logged_in),
                reconnect: self.allow_reconnect(service_reachable, logged_in),
                disconnect: self.allow_disconnect(service_reachable),
            }),
        }
    }
}
