//! Request DTOs for the store API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::Expiration;
use crate::error::{Error, Result};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The key to store the value under
/// - `value`: Any JSON value
/// - `tag`: Optional namespace (empty by default)
/// - `expire`: Optional expiration: `never`, a duration like `30s`, or a timestamp
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Namespace tag
    #[serde(default)]
    pub tag: String,
    /// Expiration specification
    #[serde(default)]
    pub expire: Option<String>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }

    /// Parses the expiration field; absent means never.
    pub fn expiration(&self) -> Result<Expiration> {
        match self.expire.as_deref() {
            Some(spec) => spec.parse(),
            None => Ok(Expiration::Never),
        }
    }

    /// Validates and parses in one go.
    pub fn check(&self) -> Result<Expiration> {
        if let Some(error_msg) = self.validate() {
            return Err(Error::InvalidRequest(error_msg));
        }
        self.expiration()
    }
}

/// Query string selecting a tag (`?tag=...`), empty when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagQuery {
    #[serde(default)]
    pub tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": {"n": 1}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value["n"], 1);
        assert_eq!(req.tag, "");
        assert!(req.expire.is_none());
    }

    #[test]
    fn test_set_request_with_expire() {
        let json = r#"{"key": "test", "value": "hello", "tag": "t", "expire": "60s"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.tag, "t");
        assert_eq!(
            req.check().unwrap(),
            Expiration::After(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: Value::Null,
            tag: String::new(),
            expire: None,
        };
        assert!(req.validate().is_some());
        assert!(matches!(req.check(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_invalid_expire() {
        let req = SetRequest {
            key: "k".to_string(),
            value: Value::Null,
            tag: String::new(),
            expire: Some("whenever".to_string()),
        };
        assert!(matches!(req.check(), Err(Error::InvalidExpirationKind(_))));
    }
}
