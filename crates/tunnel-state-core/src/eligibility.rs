//! Whether connect / reconnect / disconnect actions are currently allowed.
//!
//! The reconciler never decides this itself; it forwards the committed state
//! kind to an [`ActionEligibility`] implementation.

use crate::types::TunnelStateKind;

pub trait ActionEligibility {
    fn can_connect(&self, service_reachable: bool, logged_in: bool, kind: TunnelStateKind) -> bool;

    fn can_reconnect(&self, service_reachable: bool, logged_in: bool, kind: TunnelStateKind)
    -> bool;

    fn can_disconnect(&self, service_reachable: bool, kind: TunnelStateKind) -> bool;
}

impl<T: ActionEligibility + ?Sized> ActionEligibility for &T {
    fn can_connect(&self, service_reachable: bool, logged_in: bool, kind: TunnelStateKind) -> bool {
        (**self).can_connect(service_reachable, logged_in, kind)
    }

    fn can_reconnect(
        &self,
        service_reachable: bool,
        logged_in: bool,
        kind: TunnelStateKind,
    ) -> bool {
        (**self).can_reconnect(service_reachable, logged_in, kind)
    }

    fn can_disconnect(&self, service_reachable: bool, kind: TunnelStateKind) -> bool {
        (**self).can_disconnect(service_reachable, kind)
    }
}

/// Stock rules used by the desktop client.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultEligibility;

impl ActionEligibility for DefaultEligibility {
    fn can_connect(&self, service_reachable: bool, logged_in: bool, kind: TunnelStateKind) -> bool {
        service_reachable
            && logged_in
            && matches!(
                kind,
                TunnelStateKind::Disconnected
                    | TunnelStateKind::Disconnecting
                    | TunnelStateKind::Error
            )
    }

    fn can_reconnect(
        &self,
        service_reachable: bool,
        logged_in: bool,
        kind: TunnelStateKind,
    ) -> bool {
        service_reachable
            && logged_in
            && matches!(kind, TunnelStateKind::Connecting | TunnelStateKind::Connected)
    }

    fn can_disconnect(&self, service_reachable: bool, kind: TunnelStateKind) -> bool {
        service_reachable && kind != TunnelStateKind::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_allowed_only_from_idle_states() {
        let e = DefaultEligibility;
        for kind in TunnelStateKind::ALL {
            let expected = matches!(
                kind,
                TunnelStateKind::Disconnected
                    | TunnelStateKind::Disconnecting
                    | TunnelStateKind::Error
            );
            assert_eq!(e.can_connect(true, true, kind), expected, "{kind}");
        }
    }

    #[test]
    fn reconnect_allowed_only_while_up() {
        let e = DefaultEligibility;
        assert!(e.can_reconnect(true, true, TunnelStateKind::Connected));
        assert!(e.can_reconnect(true, true, TunnelStateKind::Connecting));
        assert!(!e.can_reconnect(true, true, TunnelStateKind::Disconnected));
        assert!(!e.can_reconnect(true, true, TunnelStateKind::Error));
    }

    #[test]
    fn disconnect_allowed_unless_disconnected() {
        let e = DefaultEligibility;
        for kind in TunnelStateKind::ALL {
            assert_eq!(
                e.can_disconnect(true, kind),
                kind != TunnelStateKind::Disconnected,
                "{kind}"
            );
        }
    }

    #[test]
    fn nothing_allowed_without_service() {
        let e = DefaultEligibility;
        for kind in TunnelStateKind::ALL {
            assert!(!e.can_connect(false, true, kind));
            assert!(!e.can_reconnect(false, true, kind));
            assert!(!e.can_disconnect(false, kind));
        }
    }

    #[test]
    fn login_required_for_connect_and_reconnect() {
        let e = DefaultEligibility;
        assert!(!e.can_connect(true, false, TunnelStateKind::Disconnected));
        assert!(!e.can_reconnect(true, false, TunnelStateKind::Connected));
        // Disconnect does not care about the account.
        assert!(e.can_disconnect(true, TunnelStateKind::Connected));
    }
}
