use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TunnelStateError;

// ─── Kind ─────────────────────────────────────────────────────────

/// Tag of a [`TunnelState`], without any attached details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelStateKind {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Error,
}

impl TunnelStateKind {
    pub const ALL: [Self; 5] = [
        Self::Disconnected,
        Self::Connecting,
        Self::Connected,
        Self::Disconnecting,
        Self::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TunnelStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TunnelStateKind {
    type Err = TunnelStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disconnected" => Ok(Self::Disconnected),
            "connecting" => Ok(Self::Connecting),
            "connected" => Ok(Self::Connected),
            "disconnecting" => Ok(Self::Disconnecting),
            "error" => Ok(Self::Error),
            _ => Err(TunnelStateError::UnknownState(s.to_string())),
        }
    }
}

// ─── Disconnect reason ────────────────────────────────────────────

/// What the service will do once the tunnel is down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectReason {
    #[default]
    Nothing,
    Block,
    Reconnect,
}

impl DisconnectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Block => "block",
            Self::Reconnect => "reconnect",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisconnectReason {
    type Err = TunnelStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nothing" | "none" => Ok(Self::Nothing),
            "block" => Ok(Self::Block),
            "reconnect" | "reconnecting" => Ok(Self::Reconnect),
            _ => Err(TunnelStateError::UnknownDisconnectReason(s.to_string())),
        }
    }
}

// ─── Expected transition ──────────────────────────────────────────

/// Transition the user just asked for, shown optimistically until confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedTransition {
    Connecting,
    Disconnecting,
}

impl ExpectedTransition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Disconnecting => "disconnecting",
        }
    }

    /// The state committed while the transition is unconfirmed.
    pub fn assumed_state(self) -> TunnelState {
        match self {
            Self::Connecting => TunnelState::connecting(),
            Self::Disconnecting => TunnelState::disconnecting(DisconnectReason::Nothing),
        }
    }
}

impl fmt::Display for ExpectedTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpectedTransition {
    type Err = TunnelStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "connecting" | "connect" => Ok(Self::Connecting),
            "disconnecting" | "disconnect" => Ok(Self::Disconnecting),
            _ => Err(TunnelStateError::UnknownTransition(s.to_string())),
        }
    }
}

// ─── Details ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Relay endpoint reported alongside `connecting` / `connected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelEndpoint {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorState {
    pub cause: String,
    /// Whether the service is blocking traffic while in the error state.
    #[serde(default)]
    pub blocking: bool,
}

// ─── Tunnel state ─────────────────────────────────────────────────

/// Connection state as reported by the service or assumed by the client.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TunnelState {
    #[default]
    Disconnected,
    Connecting {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<TunnelEndpoint>,
    },
    Connected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<TunnelEndpoint>,
    },
    Disconnecting {
        #[serde(default)]
        reason: DisconnectReason,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<ErrorState>,
    },
}

impl TunnelState {
    pub fn connecting() -> Self {
        Self::Connecting { endpoint: None }
    }

    pub fn connected() -> Self {
        Self::Connected { endpoint: None }
    }

    pub fn disconnecting(reason: DisconnectReason) -> Self {
        Self::Disconnecting { reason }
    }

    pub fn error() -> Self {
        Self::Error { details: None }
    }

    pub fn kind(&self) -> TunnelStateKind {
        match self {
            Self::Disconnected => TunnelStateKind::Disconnected,
            Self::Connecting { .. } => TunnelStateKind::Connecting,
            Self::Connected { .. } => TunnelStateKind::Connected,
            Self::Disconnecting { .. } => TunnelStateKind::Disconnecting,
            Self::Error { .. } => TunnelStateKind::Error,
        }
    }

    /// `disconnecting` on the way to an automatic reconnect.
    pub fn is_reconnecting(&self) -> bool {
        matches!(
            self,
            Self::Disconnecting {
                reason: DisconnectReason::Reconnect
            }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Decode a single JSON notification, e.g. `{"state":"connected"}`.
    pub fn from_json(line: &str) -> Result<Self, TunnelStateError> {
        Ok(serde_json::from_str(line)?)
    }
}

impl fmt::Display for TunnelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnecting { reason } => write!(f, "disconnecting({reason})"),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────
