//! Response DTOs for the store API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::cache::EntryKey;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub tag: String,
    pub value: Value,
    /// Expiration instant (naive UTC), null when the entry never expires
    pub expire: Option<NaiveDateTime>,
}

impl GetResponse {
    pub fn new(
        key: impl Into<String>,
        tag: impl Into<String>,
        value: Value,
        expire: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            value,
            expire,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    pub tag: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, tag: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            tag: tag.into(),
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
    pub tag: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, tag: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
            tag: tag.into(),
        }
    }
}

/// Response body for the POP operation (POST /pop/:key)
#[derive(Debug, Clone, Serialize)]
pub struct PopResponse {
    pub key: String,
    pub tag: String,
    pub value: Value,
}

impl PopResponse {
    pub fn new(key: impl Into<String>, tag: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            value,
        }
    }
}

/// Response body for the CLEAR operation (DELETE /clear)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Store cleared".to_string(),
        }
    }
}

/// Response body for the keys listing (GET /keys)
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub count: usize,
    pub keys: Vec<EntryKey>,
}

impl KeysResponse {
    pub fn new(keys: Vec<EntryKey>) -> Self {
        Self {
            count: keys.len(),
            keys,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of live entries
    pub entries: usize,
}

impl StatsResponse {
    pub fn new(entries: usize) -> Self {
        Self { entries }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let resp = GetResponse::new("k", "t", json!([1, 2]), Some(at));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["key"], "k");
        assert_eq!(json["tag"], "t");
        assert_eq!(json["value"], json!([1, 2]));
        assert_eq!(json["expire"], "2024-05-01T12:00:00");
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key", "");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key", "");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_keys_response_counts() {
        let resp = KeysResponse::new(vec![EntryKey::new("a", ""), EntryKey::new("b", "t")]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["keys"][1]["tag"], "t");
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
