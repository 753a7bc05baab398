//! Contract validation against an OpenAPI document
//!
//! Parses the document (JSON or YAML), extracts the declared operations
//! with their per-status response schemas, and checks each observed
//! exchange against them: undeclared status codes, schema-violating
//! bodies, Content-Type mismatches, and the error-envelope invariant on
//! every non-2xx response.

use std::collections::HashMap;
use std::path::Path;

use crudcheck_emu::{RequestDescriptor, ResponseDescriptor};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No operations found in OpenAPI document")]
    Empty,
}

/// One way an exchange deviated from the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// Response status not declared for the operation
    UndeclaredStatus { operation: String, status: u16 },
    /// Response body fails the declared schema
    SchemaViolation { operation: String, detail: String },
    /// Content-Type differs from what the contract declares
    ContentTypeMismatch {
        operation: String,
        expected: Vec<String>,
        actual: Option<String>,
    },
    /// Non-2xx body missing the timestamp/message/details envelope
    EnvelopeViolation { operation: String, detail: String },
    /// The request matched no declared operation
    UnknownOperation { method: String, path: String },
}

impl ContractViolation {
    /// One-line rendering for report details.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::UndeclaredStatus { operation, status } => {
                format!("{operation}: status {status} not declared")
            }
            Self::SchemaViolation { operation, detail } => {
                format!("{operation}: body does not match schema: {detail}")
            }
            Self::ContentTypeMismatch {
                operation,
                expected,
                actual,
            } => format!(
                "{operation}: Content-Type {:?}, expected one of {expected:?}",
                actual.as_deref().unwrap_or("<missing>")
            ),
            Self::EnvelopeViolation { operation, detail } => {
                format!("{operation}: error envelope incomplete: {detail}")
            }
            Self::UnknownOperation { method, path } => {
                format!("{method} {path}: no matching operation in contract")
            }
        }
    }
}

/// A declared operation: statuses, schemas, and content types per status.
#[derive(Debug)]
struct Operation {
    method: String,
    /// Path template with `{param}` segments
    path: String,
    expected_statuses: Vec<u16>,
    response_schemas: HashMap<u16, Value>,
    response_content_types: HashMap<u16, Vec<String>>,
}

impl Operation {
    fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Template match: segment-for-segment, `{param}` binds anything.
    fn matches(&self, method: &str, path: &str) -> bool {
        if self.method != method {
            return false;
        }
        let tmpl: Vec<&str> = self.path.split('/').collect();
        let actual: Vec<&str> = path.split('/').collect();
        tmpl.len() == actual.len()
            && tmpl
                .iter()
                .zip(&actual)
                .all(|(t, a)| (t.starts_with('{') && t.ends_with('}')) || t == a)
    }
}

/// The parsed contract.
#[derive(Debug)]
pub struct Contract {
    operations: Vec<Operation>,
}

impl Contract {
    /// Parse an OpenAPI document from file content.
    ///
    /// Format detection: extension first (`.yaml`/`.yml`/`.json`), then
    /// content sniffing (leading `{` means JSON, otherwise YAML).
    ///
    /// # Errors
    ///
    /// Fails on malformed documents or documents declaring no paths.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let doc: Value = match ext.as_str() {
            "yaml" | "yml" => serde_yml::from_str(content)
                .map_err(|e| ContractError::Parse(format!("Invalid YAML: {e}")))?,
            "json" => serde_json::from_str(content)
                .map_err(|e| ContractError::Parse(format!("Invalid JSON: {e}")))?,
            _ => {
                if content.trim_start().starts_with('{') {
                    serde_json::from_str(content)
                        .map_err(|e| ContractError::Parse(format!("Invalid JSON: {e}")))?
                } else {
                    serde_yml::from_str(content)
                        .map_err(|e| ContractError::Parse(format!("Invalid YAML: {e}")))?
                }
            }
        };
        Self::from_document(&doc)
    }

    /// Read and parse an OpenAPI document from disk.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files or malformed documents.
    pub fn load(path: &Path) -> Result<Self, ContractError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ContractError::Io(format!("{}: {e}", path.display())))?;
        Self::parse(path, &content)
    }

    /// Build from an already-parsed OpenAPI document (e.g. one fetched
    /// from the target's own /v3/api-docs).
    ///
    /// # Errors
    ///
    /// Fails when the document declares no operations.
    pub fn from_document(doc: &Value) -> Result<Self, ContractError> {
        let operations = extract_operations(doc);
        if operations.is_empty() {
            return Err(ContractError::Empty);
        }
        Ok(Self { operations })
    }

    /// The contract the emulated backend itself serves.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded document is malformed.
    pub fn embedded() -> Result<Self, ContractError> {
        let doc: Value = serde_json::from_str(crudcheck_emu::OPENAPI_JSON)
            .map_err(|e| ContractError::Parse(format!("Invalid JSON: {e}")))?;
        Self::from_document(&doc)
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Check one observed exchange. Empty vec means conformant.
    #[must_use]
    pub fn check(&self, req: &RequestDescriptor, resp: &ResponseDescriptor) -> Vec<ContractViolation> {
        let method = req.method.as_str();
        let Some(op) = self
            .operations
            .iter()
            .find(|op| op.matches(method, &req.path))
        else {
            return vec![ContractViolation::UnknownOperation {
                method: method.to_string(),
                path: req.path.clone(),
            }];
        };

        let mut violations = Vec::new();
        let status = resp.status;

        if !op.expected_statuses.is_empty() && !op.expected_statuses.contains(&status) {
            violations.push(ContractViolation::UndeclaredStatus {
                operation: op.label(),
                status,
            });
        }

        check_schema(op, status, resp.body.as_ref(), &mut violations);
        check_content_type(op, status, resp, &mut violations);
        check_envelope(op, status, resp.body.as_ref(), &mut violations);

        violations
    }
}

/// Response body vs the schema declared for its status.
fn check_schema(op: &Operation, status: u16, body: Option<&Value>, out: &mut Vec<ContractViolation>) {
    let Some(schema) = op.response_schemas.get(&status) else {
        return;
    };
    if schema.as_object().is_some_and(serde_json::Map::is_empty) {
        return;
    }
    let Some(body) = body else {
        out.push(ContractViolation::SchemaViolation {
            operation: op.label(),
            detail: format!("status {status} declares a schema but the body is empty"),
        });
        return;
    };
    if let Ok(validator) = jsonschema::validator_for(schema) {
        let errors: Vec<String> = validator
            .iter_errors(body)
            .take(5)
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            out.push(ContractViolation::SchemaViolation {
                operation: op.label(),
                detail: errors.join("; "),
            });
        }
    }
}

/// Content-Type vs what the contract declares for the status.
fn check_content_type(
    op: &Operation,
    status: u16,
    resp: &ResponseDescriptor,
    out: &mut Vec<ContractViolation>,
) {
    let Some(expected) = op.response_content_types.get(&status) else {
        return;
    };
    if expected.is_empty() {
        return;
    }
    let actual = resp.header("Content-Type").map(ToString::to_string);
    let media = actual
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_string());
    let ok = media
        .as_deref()
        .is_some_and(|m| expected.iter().any(|t| t == m));
    if !ok {
        out.push(ContractViolation::ContentTypeMismatch {
            operation: op.label(),
            expected: expected.clone(),
            actual,
        });
    }
}

/// Every non-2xx response must carry the full error envelope.
fn check_envelope(op: &Operation, status: u16, body: Option<&Value>, out: &mut Vec<ContractViolation>) {
    if (200..300).contains(&status) {
        return;
    }
    let Some(body) = body else {
        out.push(ContractViolation::EnvelopeViolation {
            operation: op.label(),
            detail: format!("status {status} has no body"),
        });
        return;
    };
    for field in ["timestamp", "message", "details"] {
        let populated = body
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        if !populated {
            out.push(ContractViolation::EnvelopeViolation {
                operation: op.label(),
                detail: format!("'{field}' missing or empty"),
            });
        }
    }
}

/// Walk `paths`, collecting operations with resolved response schemas.
fn extract_operations(doc: &Value) -> Vec<Operation> {
    let mut ops = Vec::new();
    let components = doc.get("components").cloned().unwrap_or(Value::Null);

    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return ops;
    };

    for (path, path_item) in paths {
        for method in &["get", "post", "put", "delete"] {
            let Some(operation) = path_item.get(*method) else {
                continue;
            };
            let responses = operation.get("responses").and_then(Value::as_object);

            let expected_statuses: Vec<u16> = responses
                .map(|r| r.keys().filter_map(|k| k.parse().ok()).collect())
                .unwrap_or_default();

            let mut response_schemas = HashMap::new();
            let mut response_content_types = HashMap::new();
            if let Some(responses) = responses {
                for (status_str, resp_obj) in responses {
                    let Ok(status) = status_str.parse::<u16>() else {
                        continue;
                    };
                    if let Some(content) = resp_obj.get("content").and_then(Value::as_object) {
                        let types: Vec<String> = content.keys().cloned().collect();
                        if !types.is_empty() {
                            response_content_types.insert(status, types);
                        }
                        if let Some(schema) = content
                            .get("application/json")
                            .and_then(|ct| ct.get("schema"))
                        {
                            response_schemas.insert(status, resolve_refs(schema, &components));
                        }
                    }
                }
            }

            ops.push(Operation {
                method: method.to_uppercase(),
                path: path.clone(),
                expected_statuses,
                response_schemas,
                response_content_types,
            });
        }
    }

    ops
}

/// Recursively inline `$ref` against `#/components/...`, producing a
/// self-contained schema for `jsonschema`. Depth-limited against
/// circular references.
fn resolve_refs(schema: &Value, components: &Value) -> Value {
    resolve_refs_inner(schema, components, 0)
}

fn resolve_refs_inner(schema: &Value, components: &Value, depth: u32) -> Value {
    if depth > 20 {
        return schema.clone();
    }
    match schema {
        Value::Object(obj) => {
            if let Some(ref_str) = obj.get("$ref").and_then(Value::as_str) {
                if let Some(resolved) = lookup_ref(ref_str, components) {
                    return resolve_refs_inner(&resolved, components, depth + 1);
                }
                return schema.clone();
            }
            Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), resolve_refs_inner(v, components, depth + 1)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(
            arr.iter()
                .map(|v| resolve_refs_inner(v, components, depth + 1))
                .collect(),
        ),
        _ => schema.clone(),
    }
}

/// Resolve a `#/components/<section>/<name>` pointer.
fn lookup_ref(ref_str: &str, components: &Value) -> Option<Value> {
    let rest = ref_str.strip_prefix("#/components/")?;
    let mut node = components;
    for segment in rest.split('/') {
        node = node.get(segment)?;
    }
    Some(node.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crudcheck_emu::Method;
    use serde_json::json;

    fn contract() -> Contract {
        Contract::embedded().unwrap()
    }

    fn get(path: &str) -> RequestDescriptor {
        RequestDescriptor::new(Method::Get, path)
    }

    #[test]
    fn embedded_document_declares_the_full_surface() {
        let c = contract();
        // health, list, create, read, update, delete
        assert_eq!(c.operation_count(), 6);
    }

    #[test]
    fn parse_json_by_extension() {
        let json = r#"{"openapi": "3.0.1", "paths": {"/x": {"get": {"responses": {"200": {"description": "ok"}}}}}}"#;
        let c = Contract::parse(Path::new("spec.json"), json).unwrap();
        assert_eq!(c.operation_count(), 1);
    }

    #[test]
    fn parse_yaml_by_extension() {
        let yaml = "openapi: '3.0.1'\npaths:\n  /x:\n    get:\n      responses:\n        '200':\n          description: ok\n";
        let c = Contract::parse(Path::new("spec.yml"), yaml).unwrap();
        assert_eq!(c.operation_count(), 1);
    }

    #[test]
    fn parse_sniffs_json_without_extension() {
        let json = r#"{"openapi": "3.0.1", "paths": {"/x": {"get": {"responses": {"200": {"description": "ok"}}}}}}"#;
        let c = Contract::parse(Path::new("spec"), json).unwrap();
        assert_eq!(c.operation_count(), 1);
    }

    #[test]
    fn empty_document_is_an_error() {
        let err = Contract::parse(Path::new("spec.json"), r#"{"openapi": "3.0.1"}"#).unwrap_err();
        assert!(matches!(err, ContractError::Empty));
    }

    #[test]
    fn template_binds_path_parameter() {
        let c = contract();
        let resp = ResponseDescriptor::json(
            200,
            json!({"id": "x1", "name": "N", "email": "a@b.c", "phone": "+10000000000"}),
        );
        assert!(c.check(&get("/api/customers/x1"), &resp).is_empty());
    }

    #[test]
    fn undeclared_status_is_flagged() {
        let c = contract();
        let resp = ResponseDescriptor::json(200, json!({"status": "UP"}));
        assert!(c.check(&get("/actuator/health"), &resp).is_empty());

        let teapot = ResponseDescriptor::json(418, json!({"status": "UP"}));
        let violations = c.check(&get("/actuator/health"), &teapot);
        assert!(violations
            .iter()
            .any(|v| matches!(v, ContractViolation::UndeclaredStatus { status: 418, .. })));
    }

    #[test]
    fn schema_violation_on_missing_required_field() {
        let c = contract();
        // Customer without "email"
        let resp = ResponseDescriptor::json(
            200,
            json!({"id": "x1", "name": "N", "phone": "+10000000000"}),
        );
        let violations = c.check(&get("/api/customers/x1"), &resp);
        assert!(violations
            .iter()
            .any(|v| matches!(v, ContractViolation::SchemaViolation { .. })));
    }

    #[test]
    fn unknown_path_is_flagged() {
        let c = contract();
        let resp = ResponseDescriptor::json(200, json!({}));
        let violations = c.check(&get("/api/orders"), &resp);
        assert_eq!(
            violations,
            vec![ContractViolation::UnknownOperation {
                method: "GET".to_string(),
                path: "/api/orders".to_string(),
            }]
        );
    }

    #[test]
    fn error_without_envelope_is_flagged() {
        let c = contract();
        let resp = ResponseDescriptor::json(404, json!({"message": "Customer 'x' not found"}));
        let violations = c.check(&get("/api/customers/x"), &resp);
        assert!(violations
            .iter()
            .any(|v| matches!(v, ContractViolation::EnvelopeViolation { .. })));
    }

    #[test]
    fn full_envelope_passes_the_invariant() {
        let c = contract();
        let resp = ResponseDescriptor::json(
            404,
            json!({
                "timestamp": "2026-01-01T00:00:00Z",
                "message": "Customer 'x' not found",
                "details": "not-found"
            }),
        );
        assert!(c.check(&get("/api/customers/x"), &resp).is_empty());
    }

    #[test]
    fn content_type_mismatch_is_flagged() {
        let c = contract();
        let mut resp = ResponseDescriptor::json(200, json!({"status": "UP"}));
        resp.headers
            .insert("Content-Type".to_string(), "text/plain".to_string());
        let violations = c.check(&get("/actuator/health"), &resp);
        assert!(violations
            .iter()
            .any(|v| matches!(v, ContractViolation::ContentTypeMismatch { .. })));
    }

    #[test]
    fn no_content_204_needs_no_body() {
        let c = contract();
        let req = RequestDescriptor::new(Method::Delete, "/api/customers/x1");
        let resp = ResponseDescriptor::no_content();
        assert!(c.check(&req, &resp).is_empty());
    }

    proptest::proptest! {
        #[test]
        fn template_binds_any_single_segment_id(id in "[A-Za-z0-9]{1,16}") {
            let c = contract();
            let req = RequestDescriptor::new(Method::Get, format!("/api/customers/{id}"));
            let resp = ResponseDescriptor::json(
                200,
                json!({"id": id, "name": "N", "email": "a@b.c", "phone": "+10000000000"}),
            );
            proptest::prop_assert!(c.check(&req, &resp).is_empty());
        }
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        let c = contract();
        let mut resp = ResponseDescriptor::json(200, json!({"status": "UP"}));
        resp.headers.insert(
            "Content-Type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        assert!(c.check(&get("/actuator/health"), &resp).is_empty());
    }
}
