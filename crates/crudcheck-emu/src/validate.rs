//! Field validation rules for create/update bodies
//!
//! Checks run in a fixed order (name presence, then email format, then
//! phone format) and the first failure wins. A request missing `name`
//! reports the name error even when email and phone are also malformed.

use serde_json::Value;

use crate::model::CustomerFields;

/// A field-attributable validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Offending field name
    pub field: &'static str,
    /// Message containing the field name ("name") or "invalid" + field
    pub message: String,
}

impl Violation {
    fn missing_name() -> Self {
        Self {
            field: "name",
            message: "Field 'name' is required".to_string(),
        }
    }

    fn invalid_email() -> Self {
        Self {
            field: "email",
            message: "Invalid email format".to_string(),
        }
    }

    fn invalid_phone() -> Self {
        Self {
            field: "phone",
            message: "Invalid phone format".to_string(),
        }
    }
}

/// `name` missing, non-string, or empty/blank.
#[must_use]
pub fn name_missing(body: &Value) -> bool {
    !body
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.trim().is_empty())
}

/// `email` missing or structurally not an address: needs exactly one
/// `@`, a non-empty local part, and a domain containing a dot.
#[must_use]
pub fn email_malformed(body: &Value) -> bool {
    let Some(email) = body.get("email").and_then(Value::as_str) else {
        return true;
    };
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let Some(domain) = parts.next() else {
        return true;
    };
    local.is_empty() || domain.contains('@') || !domain.contains('.') || domain.ends_with('.')
}

/// `phone` missing or not matching the accepted pattern: optional
/// leading `+`, digits only, at least 10 of them.
#[must_use]
pub fn phone_malformed(body: &Value) -> bool {
    let Some(phone) = body.get("phone").and_then(Value::as_str) else {
        return true;
    };
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    digits.len() < 10 || !digits.chars().all(|c| c.is_ascii_digit())
}

/// Classify a body, returning the first violation in deterministic
/// order (name → email → phone), or `None` for a valid body.
#[must_use]
pub fn first_violation(body: &Value) -> Option<Violation> {
    if name_missing(body) {
        return Some(Violation::missing_name());
    }
    if email_malformed(body) {
        return Some(Violation::invalid_email());
    }
    if phone_malformed(body) {
        return Some(Violation::invalid_phone());
    }
    None
}

/// Extract validated fields from a body known to pass `first_violation`.
#[must_use]
pub fn validated_fields(body: &Value) -> CustomerFields {
    CustomerFields::from_body(Some(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_body_has_no_violation() {
        let body = json!({"name": "N", "email": "a@b.c", "phone": "+10000000000"});
        assert_eq!(first_violation(&body), None);
    }

    #[test]
    fn missing_name_reported() {
        let body = json!({"email": "a@b.c", "phone": "+10000000000"});
        let v = first_violation(&body).unwrap();
        assert_eq!(v.field, "name");
        assert!(v.message.to_lowercase().contains("name"));
    }

    #[test]
    fn empty_name_reported() {
        let body = json!({"name": "  ", "email": "a@b.c", "phone": "+10000000000"});
        assert_eq!(first_violation(&body).unwrap().field, "name");
    }

    #[test]
    fn name_wins_over_malformed_email() {
        // Precedence: missing name must mask the bad email
        let body = json!({"email": "not-an-email", "phone": "123"});
        let v = first_violation(&body).unwrap();
        assert_eq!(v.field, "name");
        assert!(v.message.to_lowercase().contains("name"));
        assert!(!v.message.to_lowercase().contains("email"));
    }

    #[test]
    fn email_without_at_rejected() {
        let body = json!({"name": "N", "email": "not-an-email", "phone": "+10000000000"});
        let v = first_violation(&body).unwrap();
        assert_eq!(v.field, "email");
        assert!(v.message.to_lowercase().contains("invalid"));
    }

    #[test]
    fn email_without_domain_dot_rejected() {
        let body = json!({"name": "N", "email": "user@localhost", "phone": "+10000000000"});
        assert_eq!(first_violation(&body).unwrap().field, "email");
    }

    #[test]
    fn email_empty_local_part_rejected() {
        let body = json!({"name": "N", "email": "@example.test", "phone": "+10000000000"});
        assert_eq!(first_violation(&body).unwrap().field, "email");
    }

    #[test]
    fn email_wins_over_malformed_phone() {
        let body = json!({"name": "N", "email": "bad", "phone": "123"});
        assert_eq!(first_violation(&body).unwrap().field, "email");
    }

    #[test]
    fn short_phone_rejected() {
        let body = json!({"name": "N", "email": "a@b.c", "phone": "12345"});
        let v = first_violation(&body).unwrap();
        assert_eq!(v.field, "phone");
        assert!(v.message.to_lowercase().contains("invalid"));
    }

    #[test]
    fn phone_with_letters_rejected() {
        let body = json!({"name": "N", "email": "a@b.c", "phone": "+1800CALLNOW"});
        assert_eq!(first_violation(&body).unwrap().field, "phone");
    }

    #[test]
    fn phone_without_plus_accepted() {
        let body = json!({"name": "N", "email": "a@b.c", "phone": "0123456789"});
        assert_eq!(first_violation(&body), None);
    }

    #[test]
    fn missing_phone_rejected() {
        let body = json!({"name": "N", "email": "a@b.c"});
        assert_eq!(first_violation(&body).unwrap().field, "phone");
    }
}
