//! Randomized fixture data for request payloads
//!
//! Produces valid field values only; invalid-input cases in the suite
//! use hand-written literals so the expected error is unambiguous.

use rand::Rng;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const ALPHANUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric string of the given length.
pub fn random_string(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| ALPHANUM[rng.gen_range(0..ALPHANUM.len())] as char)
        .collect()
}

/// Random email, unique per call: a random local part plus an
/// epoch-millis discriminator under a reserved test domain.
pub fn random_email(rng: &mut impl Rng) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}+{millis}@example.test", random_string(rng, 10))
}

/// Random E.164-style US phone number: `+1` followed by 10 digits.
pub fn random_phone(rng: &mut impl Rng) -> String {
    let mut s = String::with_capacity(12);
    s.push_str("+1");
    for _ in 0..10 {
        s.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    s
}

/// A complete valid create/update payload with fresh field values.
pub fn customer_payload(rng: &mut impl Rng) -> Value {
    json!({
        "name": format!("Customer {}", random_string(rng, 6)),
        "email": random_email(rng),
        "phone": random_phone(rng),
    })
}
