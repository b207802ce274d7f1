use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bearer token obtained from a successful credential exchange.
///
/// Only the token is persisted; `obtained_at` lives as long as the value.
/// Expiry is never checked client-side, the next protected request decides.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub obtained_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            obtained_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}
