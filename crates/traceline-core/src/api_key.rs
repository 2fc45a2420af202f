//! API key validation
//!
//! Keys are UUID-formatted and validated at construction so a malformed key
//! fails fast instead of surfacing as a rejected request later. The full key
//! never appears in `Debug` or `Display` output.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A validated, UUID-formatted API key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKey(String);

impl ApiKey {
    /// Parse and validate an API key
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if Uuid::parse_str(&key).is_err() {
            return Err(Error::InvalidApiKey(format!(
                "expected UUID format, got {}",
                redact(&key)
            )));
        }
        Ok(Self(key))
    }

    /// The full key, for request headers only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// Keep the first 4 characters, mask the rest
fn redact(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}…", visible)
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey({})", redact(&self.0))
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&redact(&self.0))
    }
}

impl TryFrom<String> for ApiKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ApiKey> for String {
    fn from(key: ApiKey) -> Self {
        key.0
    }
}

impl std::str::FromStr for ApiKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "11111111-1111-4111-8111-111111111111";

    #[test]
    fn test_valid_key() {
        let key = ApiKey::new(TEST_KEY).unwrap();
        assert_eq!(key.expose(), TEST_KEY);
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(ApiKey::new("not-a-uuid").is_err());
        assert!(ApiKey::new("").is_err());
        assert!(ApiKey::new("11111111-1111-4111-8111").is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let key = ApiKey::new(TEST_KEY).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("1111…"));
        assert!(!debug.contains(TEST_KEY));
    }

    #[test]
    fn test_display_redacts() {
        let key = ApiKey::new(TEST_KEY).unwrap();
        let display = key.to_string();
        assert!(!display.contains(TEST_KEY));
    }

    #[test]
    fn test_serde_roundtrip() {
        let key = ApiKey::new(TEST_KEY).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        let parsed: ApiKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_serde_rejects_malformed() {
        let result: std::result::Result<ApiKey, _> = serde_json::from_str("\"garbage\"");
        assert!(result.is_err());
    }
}
