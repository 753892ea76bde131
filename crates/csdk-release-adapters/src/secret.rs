//! Credential wrapper that never prints its value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A credential (token or password).
///
/// `Debug` and `Display` are redacted; only [`Secret::expose`] yields the
/// value, and only adapters building requests call it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_redacted() {
        let s = Secret::new("ghp_abc");
        assert!(!format!("{s:?}").contains("ghp_abc"));
        assert!(!s.to_string().contains("ghp_abc"));
        assert_eq!(s.expose(), "ghp_abc");
    }

    #[test]
    fn test_deserializes_from_plain_string() {
        let s: Secret = serde_json::from_str("\"hunter2\"").expect("deserialize");
        assert_eq!(s.expose(), "hunter2");
    }
}
