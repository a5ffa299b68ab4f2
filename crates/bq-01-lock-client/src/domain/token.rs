//! Lock tokens and acquisition outcomes.

use std::fmt;
use uuid::Uuid;

use crate::DEFAULT_KEY_PREFIX;

/// Opaque proof of holding a lock. Only the holder knows its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    Acquired(LockToken),
    /// Another caller currently holds the key.
    Held,
}

impl Acquisition {
    pub fn token(self) -> Option<LockToken> {
        match self {
            Acquisition::Acquired(token) => Some(token),
            Acquisition::Held => None,
        }
    }
}

/// Result of a lease extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Extended,
    /// The token no longer owns the key (expired or superseded).
    Expired,
}

/// Lock client configuration.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Namespace prepended to every contract key.
    pub key_prefix: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}
