//! crudcheck-emu: in-memory emulated backend for the customer API
//!
//! A self-contained fake of the service under test: given an HTTP-shaped
//! request descriptor it synthesizes the response a conforming live
//! deployment would return, covering the CRUD lifecycle, field
//! validation, duplicate-email conflicts, not-found handling, and
//! role-gated delete.
//! Routing is a priority-ordered rule table; state lives in a mutex-held
//! customer set that persists for the duration of one suite run.

pub mod auth;
pub mod descriptor;
pub mod model;
pub mod router;
pub mod store;
pub mod synth;
pub mod validate;

pub use auth::Principal;
pub use descriptor::{ErrorEnvelope, Method, RequestDescriptor, ResponseDescriptor};
pub use model::{Customer, CustomerFields};
pub use router::{EmulatedBackend, RoutingError};
pub use store::{CustomerStore, StoreError};

/// OpenAPI document the emulated backend serves at /v3/api-docs.
pub const OPENAPI_JSON: &str = include_str!("../openapi.json");
