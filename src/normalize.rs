//! Canonical cache keys for user-supplied names

use std::fmt;

/// Canonical lookup key: trimmed and lowercased.
/// The empty key is valid and means "no query".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a raw name into a lookup key
pub fn normalize(raw: &str) -> LookupKey {
    LookupKey(raw.trim().to_lowercase())
}
