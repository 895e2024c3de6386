use serde::Serialize;
use std::fmt;

/// What the status label shows. Nothing else reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn style_class(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "status-disconnected",
            ConnectionState::Connecting => "status-connecting",
            ConnectionState::Connected => "status-connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// New text and style for the status label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub text: String,
    pub state: ConnectionState,
}

impl StatusUpdate {
    pub fn connecting() -> Self {
        Self {
            text: "Connecting to Backend...".to_string(),
            state: ConnectionState::Connecting,
        }
    }

    pub fn connected() -> Self {
        Self {
            text: "Connected to Backend".to_string(),
            state: ConnectionState::Connected,
        }
    }

    pub fn construction_failed() -> Self {
        Self {
            text: "Error creating WebSocket. Check console.".to_string(),
            state: ConnectionState::Disconnected,
        }
    }

    pub fn transport_error() -> Self {
        Self {
            text: "Connection Error. Check console for details.".to_string(),
            state: ConnectionState::Disconnected,
        }
    }

    pub fn closed(reason: &str, clean: bool) -> Self {
        let reason = if reason.is_empty() {
            "No reason specified"
        } else {
            reason
        };
        let tail = if clean {
            " Connection closed cleanly."
        } else {
            " Reconnecting..."
        };
        Self {
            text: format!("Disconnected: {}.{}", reason, tail),
            state: ConnectionState::Disconnected,
        }
    }

    pub fn idle() -> Self {
        Self {
            text: "Not connected".to_string(),
            state: ConnectionState::Disconnected,
        }
    }
}
