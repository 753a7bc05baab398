//! Target abstraction: one trait, two transports
//!
//! Scenarios are written once against `ApiTarget`. The emulated target
//! dispatches in process with no network I/O; the live target sends the
//! same descriptors over HTTP with reqwest. Which one runs is decided
//! by base-URL resolution, never by the scenarios.

use std::collections::HashMap;
use std::time::Duration;

use crudcheck_emu::{EmulatedBackend, Method, RequestDescriptor, ResponseDescriptor};

/// A target exchange failed before producing a response.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The emulated backend had no rule for the request. A harness
    /// defect: the run halts instead of recording a bogus outcome.
    #[error("unroutable request: {0}")]
    Unroutable(#[from] crudcheck_emu::RoutingError),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("response body is not valid JSON: {0}")]
    Body(String),
}

/// Anything that can answer a request descriptor.
pub trait ApiTarget {
    /// Perform one request/response exchange.
    ///
    /// # Errors
    ///
    /// Fails when the exchange itself breaks down (transport error,
    /// unroutable request). HTTP error statuses are responses, not
    /// errors.
    fn send(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, TargetError>;

    /// Short label for report headers ("emulated" or the base URL).
    fn describe(&self) -> String;
}

/// In-process target backed by the emulated backend.
pub struct EmulatedTarget {
    backend: EmulatedBackend,
}

impl Default for EmulatedTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedTarget {
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: EmulatedBackend::new(),
        }
    }

    #[must_use]
    pub fn with_backend(backend: EmulatedBackend) -> Self {
        Self { backend }
    }
}

impl ApiTarget for EmulatedTarget {
    fn send(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, TargetError> {
        Ok(self.backend.handle(req)?)
    }

    fn describe(&self) -> String {
        "emulated".to_string()
    }
}

/// Live HTTP target: blocking reqwest client, 10s timeout per exchange.
pub struct LiveTarget {
    client: reqwest::blocking::Client,
    base_url: String,
    headers: HashMap<String, String>,
}

impl LiveTarget {
    /// Build a client for the given base URL. Extra headers (from
    /// config) are attached to every request.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: &str, headers: HashMap<String, String>) -> Result<Self, TargetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TargetError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }
}

impl ApiTarget for LiveTarget {
    fn send(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, TargetError> {
        let url = format!("{}{}", self.base_url, req.path);
        let method = match req.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        for (k, v) in self.headers.iter().chain(req.headers.iter()) {
            if reqwest::header::HeaderValue::from_str(v).is_ok() {
                builder = builder.header(k, v);
            }
        }
        if let Some(ref body) = req.body {
            builder = builder.header("Content-Type", "application/json");
            builder = builder.json(body);
        }

        let resp = builder.send().map_err(|e| TargetError::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        let text = resp.text().map_err(|e| TargetError::Http(e.to_string()))?;
        let body = if text.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(&text).map_err(|e| {
                    TargetError::Body(format!("{e}: {}", truncate_utf8(&text, 200)))
                })?,
            )
        };

        Ok(ResponseDescriptor {
            status,
            headers,
            body,
        })
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Truncate to at most `max` bytes, walking back to a char boundary so
/// multibyte responses never split mid-character.
fn truncate_utf8(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emulated_target_answers_health() {
        let target = EmulatedTarget::new();
        let resp = target
            .send(&RequestDescriptor::new(Method::Get, "/actuator/health"))
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body.unwrap()["status"], "UP");
    }

    #[test]
    fn emulated_target_surfaces_unroutable_requests() {
        let target = EmulatedTarget::new();
        let err = target
            .send(&RequestDescriptor::new(Method::Post, "/api/nothing"))
            .unwrap_err();
        assert!(matches!(err, TargetError::Unroutable(_)));
    }

    #[test]
    fn emulated_target_keeps_state_across_sends() {
        let target = EmulatedTarget::new();
        let created = target
            .send(
                &RequestDescriptor::new(Method::Post, "/api/customers").with_body(json!({
                    "name": "N", "email": "a@b.c", "phone": "+10000000000"
                })),
            )
            .unwrap();
        assert_eq!(created.status, 201);
        let id = created.body.unwrap()["id"].as_str().unwrap().to_string();

        let read = target
            .send(&RequestDescriptor::new(
                Method::Get,
                format!("/api/customers/{id}"),
            ))
            .unwrap();
        assert_eq!(read.status, 200);
    }

    #[test]
    fn live_target_normalizes_trailing_slash() {
        let target = LiveTarget::new("http://localhost:8080/", HashMap::new()).unwrap();
        assert_eq!(target.describe(), "http://localhost:8080");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // A two-byte char straddling the cutoff must not split
        let mut text = "x".repeat(199);
        text.push('é');
        text.push_str("tail");
        let cut = truncate_utf8(&text, 200);
        assert_eq!(cut.len(), 199);
        assert!(cut.chars().all(|c| c == 'x'));
    }

    #[test]
    fn truncation_leaves_short_text_alone() {
        assert_eq!(truncate_utf8("short", 200), "short");
        assert_eq!(truncate_utf8("", 200), "");
    }
}
