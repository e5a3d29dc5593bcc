//! Identifier types shared across the storage, service and HTTP layers.

use serde::{Deserialize, Serialize};

/// History record identifier, assigned by the storage backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(pub i64);

impl HistoryId {
    pub fn new(value: i64) -> Self {
        HistoryId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for HistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<HistoryId> for i64 {
    fn from(id: HistoryId) -> Self {
        id.0
    }
}

/// Opaque session identity used to partition history.
///
/// Values are 32 lowercase hex digits (a UUIDv4 in simple form). Anything else
/// presented by a client is treated as "no session".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    const LEN: usize = 32;

    /// Generate a fresh, collision-resistant session id.
    pub fn generate() -> Self {
        SessionId(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Accept a client-presented value only if it is well formed.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let well_formed = raw.len() == Self::LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b.to_ascii_lowercase()));
        well_formed.then(|| SessionId(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines; never log the full id.
    pub fn log_prefix(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        SessionId::parse(&raw).ok_or_else(|| format!("malformed session id '{}'", raw))
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
