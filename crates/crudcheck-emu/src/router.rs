//! Request matcher/router: priority-ordered rule table and handlers
//!
//! Rules are evaluated top-to-bottom, first predicate match wins.
//! Exact-path + body-predicate rules (missing name, malformed email or
//! phone on create) sit above the generic collection and id-pattern
//! rules. Predicates are pure functions of the request descriptor;
//! state only enters in the handlers. A request no rule matches is a
//! harness defect and surfaces as `RoutingError`, never a silent 200.

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_json::json;

use crate::auth::Principal;
use crate::descriptor::{Method, RequestDescriptor, ResponseDescriptor};
use crate::model::CustomerFields;
use crate::store::{CustomerStore, StoreError};
use crate::synth::{self, IdSource, RandomIds};
use crate::validate;

const COLLECTION_PATH: &str = "/api/customers";
const HEALTH_PATH: &str = "/actuator/health";
const API_DOCS_PATH: &str = "/v3/api-docs";

/// No rule matched the request. This aborts the run: defaulting to a
/// synthetic 200 would hand the assertion layer a misleading outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no rule matches {method} {path}")]
pub struct RoutingError {
    pub method: &'static str,
    pub path: String,
}

type Predicate = fn(&RequestDescriptor) -> bool;
type Handler = fn(&EmulatedBackend, &RequestDescriptor) -> ResponseDescriptor;

/// One (predicate, handler) pair in the rule table.
struct Rule {
    name: &'static str,
    applies: Predicate,
    handle: Handler,
}

/// Most-specific-first. Body-predicate create rules precede the generic
/// create rule; exact paths precede the id-pattern rules.
const RULES: &[Rule] = &[
    Rule {
        name: "create: name absent",
        applies: create_missing_name,
        handle: handle_create_invalid,
    },
    Rule {
        name: "create: email malformed",
        applies: create_bad_email,
        handle: handle_create_invalid,
    },
    Rule {
        name: "create: phone malformed",
        applies: create_bad_phone,
        handle: handle_create_invalid,
    },
    Rule {
        name: "create",
        applies: is_create,
        handle: handle_create,
    },
    Rule {
        name: "health",
        applies: is_health,
        handle: handle_health,
    },
    Rule {
        name: "api-docs",
        applies: is_api_docs,
        handle: handle_api_docs,
    },
    Rule {
        name: "list",
        applies: is_list,
        handle: handle_list,
    },
    Rule {
        name: "read by id",
        applies: is_read_by_id,
        handle: handle_read,
    },
    Rule {
        name: "update by id",
        applies: is_update_by_id,
        handle: handle_update,
    },
    Rule {
        name: "delete by id",
        applies: is_delete_by_id,
        handle: handle_delete,
    },
];

/// The emulated resource backend: rule table + owned customer set.
pub struct EmulatedBackend {
    store: CustomerStore,
    ids: Mutex<Box<dyn IdSource + Send>>,
}

impl Default for EmulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: CustomerStore::new(),
            ids: Mutex::new(Box::new(RandomIds(SmallRng::from_entropy()))),
        }
    }

    /// Replace the id source (deterministic ids for tests).
    #[must_use]
    pub fn with_id_source(mut self, ids: impl IdSource + Send + 'static) -> Self {
        self.ids = Mutex::new(Box::new(ids));
        self
    }

    /// Dispatch one request through the rule table.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError` when no rule applies: a harness bug, not
    /// a valid test outcome.
    pub fn handle(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, RoutingError> {
        for rule in RULES {
            if (rule.applies)(req) {
                return Ok((rule.handle)(self, req));
            }
        }
        Err(RoutingError {
            method: req.method.as_str(),
            path: req.path.clone(),
        })
    }

    /// Name of the first rule matching the request, if any.
    #[must_use]
    pub fn matched_rule(&self, req: &RequestDescriptor) -> Option<&'static str> {
        RULES.iter().find(|r| (r.applies)(req)).map(|r| r.name)
    }

    fn fresh_id(&self) -> String {
        self.ids.lock().next_id()
    }
}

// ── Predicates (pure functions of the descriptor) ──

/// Bind the path segment following the collection path as the customer id.
fn customer_id(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(COLLECTION_PATH)?.strip_prefix('/')?;
    (!rest.is_empty() && !rest.contains('/')).then_some(rest)
}

fn is_create(req: &RequestDescriptor) -> bool {
    req.method == Method::Post && req.path == COLLECTION_PATH
}

fn create_missing_name(req: &RequestDescriptor) -> bool {
    is_create(req) && req.body.as_ref().map_or(true, validate::name_missing)
}

fn create_bad_email(req: &RequestDescriptor) -> bool {
    is_create(req) && req.body.as_ref().map_or(true, validate::email_malformed)
}

fn create_bad_phone(req: &RequestDescriptor) -> bool {
    is_create(req) && req.body.as_ref().map_or(true, validate::phone_malformed)
}

fn is_health(req: &RequestDescriptor) -> bool {
    req.method == Method::Get && req.path == HEALTH_PATH
}

fn is_api_docs(req: &RequestDescriptor) -> bool {
    req.method == Method::Get && req.path == API_DOCS_PATH
}

fn is_list(req: &RequestDescriptor) -> bool {
    req.method == Method::Get && req.path == COLLECTION_PATH
}

fn is_read_by_id(req: &RequestDescriptor) -> bool {
    req.method == Method::Get && customer_id(&req.path).is_some()
}

fn is_update_by_id(req: &RequestDescriptor) -> bool {
    req.method == Method::Put && customer_id(&req.path).is_some()
}

fn is_delete_by_id(req: &RequestDescriptor) -> bool {
    req.method == Method::Delete && customer_id(&req.path).is_some()
}

// ── Handlers ──

fn handle_health(_: &EmulatedBackend, _: &RequestDescriptor) -> ResponseDescriptor {
    ResponseDescriptor::json(200, json!({"status": "UP"}))
}

fn handle_api_docs(_: &EmulatedBackend, _: &RequestDescriptor) -> ResponseDescriptor {
    let doc = serde_json::from_str(crate::OPENAPI_JSON)
        .unwrap_or_else(|_| json!({"openapi": "3.0.1"}));
    ResponseDescriptor::json(200, doc)
}

/// The body-predicate rules above guarantee a violation exists; report
/// the first one in name → email → phone order.
fn handle_create_invalid(_: &EmulatedBackend, req: &RequestDescriptor) -> ResponseDescriptor {
    let body = req.body.clone().unwrap_or(json!({}));
    let violation = validate::first_violation(&body)
        .map(|v| v.message)
        .unwrap_or_else(|| "Invalid request body".to_string());
    ResponseDescriptor::error(400, &synth::validation_envelope(&violation))
}

fn handle_create(backend: &EmulatedBackend, req: &RequestDescriptor) -> ResponseDescriptor {
    let body = req.body.clone().unwrap_or(json!({}));
    if let Some(v) = validate::first_violation(&body) {
        return ResponseDescriptor::error(400, &synth::validation_envelope(&v.message));
    }
    let fields = validate::validated_fields(&body);
    match backend.store.create(backend.fresh_id(), &fields) {
        Ok(customer) => ResponseDescriptor::json(201, synth::stored_customer_body(&customer)),
        Err(StoreError::Conflict(email)) => {
            ResponseDescriptor::error(409, &synth::conflict_envelope(&email))
        }
        Err(StoreError::NotFound(id)) => {
            ResponseDescriptor::error(404, &synth::not_found_envelope(&id))
        }
    }
}

fn handle_list(backend: &EmulatedBackend, _: &RequestDescriptor) -> ResponseDescriptor {
    let customers: Vec<_> = backend
        .store
        .list()
        .iter()
        .map(synth::stored_customer_body)
        .collect();
    ResponseDescriptor::json(200, json!(customers))
}

fn handle_read(backend: &EmulatedBackend, req: &RequestDescriptor) -> ResponseDescriptor {
    let id = customer_id(&req.path).unwrap_or_default();
    match backend.store.get(id) {
        Some(customer) => ResponseDescriptor::json(200, synth::stored_customer_body(&customer)),
        None => ResponseDescriptor::error(404, &synth::not_found_envelope(id)),
    }
}

fn handle_update(backend: &EmulatedBackend, req: &RequestDescriptor) -> ResponseDescriptor {
    let id = customer_id(&req.path).unwrap_or_default();
    if backend.store.get(id).is_none() {
        return ResponseDescriptor::error(404, &synth::not_found_envelope(id));
    }
    let body = req.body.clone().unwrap_or(json!({}));
    if let Some(v) = validate::first_violation(&body) {
        return ResponseDescriptor::error(400, &synth::validation_envelope(&v.message));
    }
    let fields = CustomerFields::from_body(Some(&body));
    match backend.store.update(id, &fields) {
        Ok(customer) => ResponseDescriptor::json(200, synth::stored_customer_body(&customer)),
        Err(StoreError::Conflict(email)) => {
            ResponseDescriptor::error(409, &synth::conflict_envelope(&email))
        }
        Err(StoreError::NotFound(id)) => {
            ResponseDescriptor::error(404, &synth::not_found_envelope(&id))
        }
    }
}

/// Authorization is evaluated strictly before any lookup or mutation:
/// a delete against an unknown id with a bad token reports the auth
/// error, not a not-found. With an admin token, delete of an unknown
/// id is idempotent success.
fn handle_delete(backend: &EmulatedBackend, req: &RequestDescriptor) -> ResponseDescriptor {
    let principal = Principal::from_header(req.header("Authorization"));
    if let Some((status, envelope)) = principal.deny_delete() {
        return ResponseDescriptor::error(status, &envelope);
    }
    let id = customer_id(&req.path).unwrap_or_default();
    backend.store.delete(id);
    ResponseDescriptor::no_content()
}
