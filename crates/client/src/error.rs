use serde::Deserialize;

/// Errors surfaced by [`RegistrationClient`](crate::client::RegistrationClient)
/// and [`SelectionSession`](crate::session::SelectionSession).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing or malformed input. Re-prompt the participant; never retry.
    #[error("{0}")]
    Validation(String),

    /// A requested slot has no seats left. Reload availability and ask the
    /// participant to re-select.
    #[error("{0}")]
    SlotFull(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Server-side failure that may succeed later.
    #[error("Service unavailable ({status}): {message}")]
    Transient { status: u16, message: String },

    /// A submission is already in flight for this session.
    #[error("A submission is already in progress")]
    Busy,

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a body this client does not understand.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether repeating the same request unchanged may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transient { .. } | ClientError::Request(_))
    }
}

/// `{ "success": false, "message" | "error", "code"?, "full"? }`
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default, alias = "error")]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    full: bool,
}

/// Map a non-success response to a [`ClientError`].
///
/// `full: true` wins over the status code, so a capacity conflict is never
/// mistaken for another kind of 409.
pub fn decode_error(status: u16, body: &str) -> ClientError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let message = envelope
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    if envelope.full || envelope.code.as_deref() == Some("SLOT_FULL") {
        return ClientError::SlotFull(message);
    }

    match status {
        400 | 422 => ClientError::Validation(message),
        404 => ClientError::NotFound(message),
        409 => ClientError::Conflict(message),
        _ => ClientError::Transient { status, message },
    }
}
