use serde::{Deserialize, Serialize};

/// Connection state of a synchronization client.
///
/// ```text
/// connecting ──> connected ──> connection-error
///      ^             │    └──> sync-error
///      └─────────────┘ (reconnect attempt)
/// ```
///
/// The two error states are terminal for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    ConnectionError { message: String },
    SyncError { message: String },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::ConnectionError { .. } | ConnectionStatus::SyncError { .. }
        )
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: &ConnectionStatus) -> bool {
        use ConnectionStatus::*;
        match (self, next) {
            (ConnectionError { .. } | SyncError { .. }, _) => false,
            (Connecting, Connected) | (Connected, Connecting) => true,
            (_, ConnectionError { .. } | SyncError { .. }) => true,
            _ => false,
        }
    }
}
