//! HTTP-shaped request/response descriptors and the error envelope
//!
//! Ephemeral per-call values; the emulation layer consumes a
//! `RequestDescriptor` and produces a `ResponseDescriptor` without any
//! real network I/O.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// HTTP methods the emulated surface understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound request: method, path, headers, parsed JSON body.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An outbound response: status, headers, optional JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl ResponseDescriptor {
    /// A JSON response with Content-Type set.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body: Some(body),
        }
    }

    /// 204 No Content, empty body.
    #[must_use]
    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// A non-2xx response carrying a populated error envelope.
    #[must_use]
    pub fn error(status: u16, envelope: &ErrorEnvelope) -> Self {
        Self::json(
            status,
            serde_json::to_value(envelope).unwrap_or(Value::Null),
        )
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Standard JSON shape for every non-success response.
///
/// Invariant: `timestamp` is always present and non-null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// ISO-8601 instant the error was produced
    pub timestamp: String,
    /// Human-readable message containing a domain-relevant keyword
    pub message: String,
    /// Short machine-oriented reason code
    pub details: String,
}

impl ErrorEnvelope {
    /// Build an envelope stamped with the current UTC time.
    #[must_use]
    pub fn new(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            message: message.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = RequestDescriptor::new(Method::Delete, "/api/customers/x1")
            .with_header("Authorization", "Bearer valid-admin");
        assert_eq!(req.header("authorization"), Some("Bearer valid-admin"));
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer valid-admin"));
        assert_eq!(req.header("X-Other"), None);
    }

    #[test]
    fn json_response_sets_content_type() {
        let resp = ResponseDescriptor::json(200, json!({"ok": true}));
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert!(resp.is_success());
    }

    #[test]
    fn no_content_has_empty_body() {
        let resp = ResponseDescriptor::no_content();
        assert_eq!(resp.status, 204);
        assert!(resp.body.is_none());
        assert!(resp.is_success());
    }

    #[test]
    fn error_response_carries_populated_envelope() {
        let env = ErrorEnvelope::new("Customer not found", "not-found");
        let resp = ResponseDescriptor::error(404, &env);
        assert!(!resp.is_success());
        let body = resp.body.unwrap();
        assert!(!body["timestamp"].as_str().unwrap().is_empty());
        assert_eq!(body["message"], "Customer not found");
        assert_eq!(body["details"], "not-found");
    }

    #[test]
    fn envelope_timestamp_is_rfc3339() {
        let env = ErrorEnvelope::new("m", "d");
        assert!(chrono::DateTime::parse_from_rfc3339(&env.timestamp).is_ok());
    }
}
