use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failures on the client side of the backend socket.
///
/// None of these are fatal: the connection manager turns them into status
/// text and log lines.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid backend url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme {scheme:?} (expected ws or wss)")]
    UnsupportedScheme { scheme: String },
    #[error("socket task has already stopped")]
    SocketClosed,
    #[error("unknown fee tier '{selector}', type 'tiers' for a list")]
    UnknownFeeTier { selector: String },
    #[error("malformed metrics payload: {0}")]
    Decode(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
