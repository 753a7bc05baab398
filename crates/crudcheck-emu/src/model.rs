//! Customer entity and request-body field extraction

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The stored customer representation.
///
/// `id` is server-generated, unique, and immutable after creation;
/// the remaining fields are replaceable by update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Mutable fields as submitted by a create/update body.
///
/// Missing or non-string fields extract as `None` so the validation
/// rule set can attribute the failure, rather than surfacing a
/// deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CustomerFields {
    /// Extract fields from a parsed JSON body (or absent body).
    #[must_use]
    pub fn from_body(body: Option<&Value>) -> Self {
        let get = |key: &str| {
            body.and_then(|b| b.get(key))
                .and_then(Value::as_str)
                .map(String::from)
        };
        Self {
            name: get("name"),
            email: get("email"),
            phone: get("phone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_all_fields() {
        let body = json!({"name": "N", "email": "a@b.c", "phone": "+10000000000"});
        let fields = CustomerFields::from_body(Some(&body));
        assert_eq!(fields.name.as_deref(), Some("N"));
        assert_eq!(fields.email.as_deref(), Some("a@b.c"));
        assert_eq!(fields.phone.as_deref(), Some("+10000000000"));
    }

    #[test]
    fn missing_fields_extract_as_none() {
        let body = json!({"email": "a@b.c"});
        let fields = CustomerFields::from_body(Some(&body));
        assert!(fields.name.is_none());
        assert!(fields.phone.is_none());
    }

    #[test]
    fn absent_body_extracts_all_none() {
        let fields = CustomerFields::from_body(None);
        assert_eq!(fields, CustomerFields::default());
    }

    #[test]
    fn non_string_field_extracts_as_none() {
        let body = json!({"name": 42, "email": null});
        let fields = CustomerFields::from_body(Some(&body));
        assert!(fields.name.is_none());
        assert!(fields.email.is_none());
    }

    #[test]
    fn customer_serializes_with_id_first_class() {
        let c = Customer {
            id: "abc12345".into(),
            name: "N".into(),
            email: "a@b.c".into(),
            phone: "+10000000000".into(),
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["id"], "abc12345");
        assert_eq!(v["name"], "N");
    }
}
