//! User identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner recorded for data produced while nobody is signed in.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Identity of the signed-in account, as issued by the auth provider.
///
/// Opaque to this layer; only compared for equality. Surrounding whitespace
/// is dropped, and a blank string yields the anonymous sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Creates a user ID, trimming the input. Blank input maps to the
    /// anonymous user.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            Self::anonymous()
        } else {
            Self(trimmed.to_string())
        }
    }

    /// The anonymous sentinel.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_USER.to_string())
    }

    /// Returns true for the anonymous sentinel.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_USER
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Option<&str>> for UserId {
    fn from(s: Option<&str>) -> Self {
        s.map(Self::new).unwrap_or_default()
    }
}
