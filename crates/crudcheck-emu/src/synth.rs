//! Response-body synthesis: id generation, field echoing, envelopes
//!
//! Pure substitution per call: caller-supplied name/email/phone are
//! echoed verbatim into the declared representation shape, the id slot
//! is filled from a generator callback (fresh random token on create,
//! path-extracted id on read/update).

use rand::Rng;
use serde_json::Value;

use crate::descriptor::ErrorEnvelope;
use crate::model::Customer;

const ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ID_LEN: usize = 8;

/// Supplies fresh ids on create. Abstracted so tests can pin values.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Default id source: 8 random alphanumeric characters per id.
pub struct RandomIds<R: Rng>(pub R);

impl<R: Rng> IdSource for RandomIds<R> {
    fn next_id(&mut self) -> String {
        (0..ID_LEN)
            .map(|_| ID_CHARS[self.0.gen_range(0..ID_CHARS.len())] as char)
            .collect()
    }
}

/// Fixed id sequence for deterministic tests.
pub struct FixedIds(pub Vec<String>);

impl IdSource for FixedIds {
    fn next_id(&mut self) -> String {
        if self.0.is_empty() {
            String::from("exhausted")
        } else {
            self.0.remove(0)
        }
    }
}

/// Render a stored customer: the server-held id plus the caller-supplied
/// mutable fields, echoed verbatim as persisted.
#[must_use]
pub fn stored_customer_body(customer: &Customer) -> Value {
    serde_json::to_value(customer).unwrap_or(Value::Null)
}

/// Envelope for a field-validation failure.
#[must_use]
pub fn validation_envelope(message: &str) -> ErrorEnvelope {
    ErrorEnvelope::new(message, "validation")
}

/// Envelope for a missing/deleted customer id.
#[must_use]
pub fn not_found_envelope(id: &str) -> ErrorEnvelope {
    ErrorEnvelope::new(format!("Customer '{id}' not found"), "not-found")
}

/// Envelope for an email-uniqueness conflict.
#[must_use]
pub fn conflict_envelope(email: &str) -> ErrorEnvelope {
    ErrorEnvelope::new(
        format!("Customer with email '{email}' already exists"),
        "conflict",
    )
}
