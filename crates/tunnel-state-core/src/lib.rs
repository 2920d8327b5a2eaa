//! tunnel-state-core: client-side tunnel state reconciliation.
//! Debounces service notifications, shows user-requested transitions
//! optimistically with a bounded fallback, and collapses reconnects.
//! Pure library: no IO, no async, time is passed in by the caller.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod reconciler;
pub mod scheduler;
pub mod session;
pub mod types;

pub use config::ReconcilerConfig;
pub use eligibility::{ActionEligibility, DefaultEligibility};
pub use error::TunnelStateError;
pub use reconciler::{StatusSink, TunnelStateReconciler};
pub use scheduler::DeferredCall;
pub use session::{EligibilityReport, SessionInput, TimedInput};
pub use types::{
    DisconnectReason, ErrorState, ExpectedTransition, GeoLocation, TunnelEndpoint, TunnelState,
    TunnelStateKind,
};
