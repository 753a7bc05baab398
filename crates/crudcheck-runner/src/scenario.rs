//! The ordered assertion suite
//!
//! Scenarios run in a fixed order against whichever target was
//! selected, sharing one `CrudContext` so later scenarios can build on
//! records earlier ones created. Each exchange is optionally validated
//! against the OpenAPI contract; violations surface as failed checks
//! alongside the behavioral assertions.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use crudcheck_core::fixture;
use crudcheck_core::Report;
use crudcheck_emu::{Method, RequestDescriptor, ResponseDescriptor};

use crate::contract::Contract;
use crate::target::{ApiTarget, TargetError};

const CUSTOMERS: &str = "/api/customers";

/// The suite could not complete. Distinct from check failures: a
/// broken exchange is a tool error, not a verdict about the target.
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error("exchange failed: {0}")]
    Exchange(#[from] TargetError),
}

/// Mutable state threaded through one suite run.
struct CrudContext<'a> {
    target: &'a dyn ApiTarget,
    contract: Option<&'a Contract>,
    report: Report,
    rng: SmallRng,
}

impl<'a> CrudContext<'a> {
    fn new(target: &'a dyn ApiTarget, contract: Option<&'a Contract>) -> Self {
        Self {
            target,
            contract,
            report: Report::default(),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Send one request; contract violations become failed checks.
    fn exchange(&mut self, req: &RequestDescriptor) -> Result<ResponseDescriptor, SuiteError> {
        let resp = self.target.send(req)?;
        if let Some(contract) = self.contract {
            let name = format!("contract: {} {}", req.method, req.path);
            let violations = contract.check(req, &resp);
            if violations.is_empty() {
                self.report.check(&name, true, format!("status {}", resp.status));
            } else {
                for v in violations {
                    self.report.check(&name, false, v.describe());
                }
            }
        }
        Ok(resp)
    }

    fn check(&mut self, name: &str, passed: bool, detail: impl Into<String>) {
        self.report.check(name, passed, detail);
    }

    /// Assert an exact status, with an expected-vs-observed detail line.
    fn check_status(&mut self, name: &str, resp: &ResponseDescriptor, expected: u16) {
        self.check(
            name,
            resp.status == expected,
            format!("expected {expected}, got {}", resp.status),
        );
    }

    fn create_valid(&mut self) -> Result<(ResponseDescriptor, Value), SuiteError> {
        let payload = fixture::customer_payload(&mut self.rng);
        let resp = self.exchange(
            &RequestDescriptor::new(Method::Post, CUSTOMERS).with_body(payload.clone()),
        )?;
        Ok((resp, payload))
    }
}

/// Run the full suite against a target.
///
/// # Errors
///
/// Fails when an exchange itself breaks down; assertion failures are
/// recorded in the returned report instead.
pub fn run_suite(target: &dyn ApiTarget, contract: Option<&Contract>) -> Result<Report, SuiteError> {
    let mut ctx = CrudContext::new(target, contract);
    health(&mut ctx)?;
    crud_lifecycle(&mut ctx)?;
    validation(&mut ctx)?;
    conflicts(&mut ctx)?;
    auth(&mut ctx)?;
    not_found(&mut ctx)?;
    Ok(ctx.report)
}

fn health(ctx: &mut CrudContext) -> Result<(), SuiteError> {
    let resp = ctx.exchange(&RequestDescriptor::new(Method::Get, "/actuator/health"))?;
    ctx.check_status("health: probe returns 200", &resp, 200);
    let up = resp
        .body
        .as_ref()
        .and_then(|b| b["status"].as_str())
        .map(str::to_string);
    ctx.check(
        "health: status reports UP",
        up.as_deref() == Some("UP"),
        format!("status field: {up:?}"),
    );
    Ok(())
}

fn crud_lifecycle(ctx: &mut CrudContext) -> Result<(), SuiteError> {
    let (created, payload) = ctx.create_valid()?;
    ctx.check_status("crud: create returns 201", &created, 201);

    let body = created.body.clone().unwrap_or(Value::Null);
    let id = body["id"].as_str().unwrap_or_default().to_string();
    ctx.check(
        "crud: created id is non-empty",
        !id.is_empty(),
        format!("id: {id:?}"),
    );
    for field in ["name", "email", "phone"] {
        ctx.check(
            &format!("crud: create echoes {field} verbatim"),
            body[field] == payload[field],
            format!("sent {:?}, got {:?}", payload[field], body[field]),
        );
    }

    // Round-trip fidelity: read returns exactly the created representation
    let read = ctx.exchange(&RequestDescriptor::new(
        Method::Get,
        format!("{CUSTOMERS}/{id}"),
    ))?;
    ctx.check_status("crud: read-after-create returns 200", &read, 200);
    ctx.check(
        "crud: read matches created representation",
        read.body.as_ref() == Some(&body),
        format!("read {:?}", read.body),
    );

    let listed = ctx.exchange(&RequestDescriptor::new(Method::Get, CUSTOMERS))?;
    ctx.check_status("crud: list returns 200", &listed, 200);
    let contains = listed
        .body
        .as_ref()
        .and_then(Value::as_array)
        .is_some_and(|arr| arr.iter().any(|c| c["id"] == id.as_str()));
    ctx.check(
        "crud: list contains the created customer",
        contains,
        format!("looking for id {id:?}"),
    );

    // Update: same id, "Updated" suffix on the name
    let new_name = format!("{} Updated", payload["name"].as_str().unwrap_or("Customer"));
    let update_body = json!({
        "name": new_name,
        "email": payload["email"],
        "phone": fixture::random_phone(&mut ctx.rng),
    });
    let updated = ctx.exchange(
        &RequestDescriptor::new(Method::Put, format!("{CUSTOMERS}/{id}"))
            .with_body(update_body.clone()),
    )?;
    ctx.check_status("crud: update returns 200", &updated, 200);
    let updated_body = updated.body.clone().unwrap_or(Value::Null);
    ctx.check(
        "crud: update keeps the id",
        updated_body["id"] == id.as_str(),
        format!("id after update: {:?}", updated_body["id"]),
    );
    ctx.check(
        "crud: update applies the new name",
        updated_body["name"] == update_body["name"],
        format!("name after update: {:?}", updated_body["name"]),
    );

    // Delete with admin credentials, then the id is gone for good
    let deleted = ctx.exchange(
        &RequestDescriptor::new(Method::Delete, format!("{CUSTOMERS}/{id}"))
            .with_header("Authorization", "Bearer valid-admin"),
    )?;
    ctx.check_status("crud: admin delete returns 204", &deleted, 204);
    ctx.check(
        "crud: delete response has no body",
        deleted.body.is_none(),
        format!("body: {:?}", deleted.body),
    );

    let reread = ctx.exchange(&RequestDescriptor::new(
        Method::Get,
        format!("{CUSTOMERS}/{id}"),
    ))?;
    ctx.check_status("crud: read-after-delete returns 404", &reread, 404);
    check_envelope(ctx, "crud: not-found envelope populated", &reread, "not found");
    Ok(())
}

fn validation(ctx: &mut CrudContext) -> Result<(), SuiteError> {
    let email = fixture::random_email(&mut ctx.rng);
    let phone = fixture::random_phone(&mut ctx.rng);

    // Missing name: error message must name the field
    let resp = ctx.exchange(
        &RequestDescriptor::new(Method::Post, CUSTOMERS)
            .with_body(json!({"email": email, "phone": phone})),
    )?;
    ctx.check_status("validation: missing name returns 400", &resp, 400);
    check_envelope(ctx, "validation: missing-name message names the field", &resp, "name");

    // Malformed email: message says invalid
    let resp = ctx.exchange(&RequestDescriptor::new(Method::Post, CUSTOMERS).with_body(json!({
        "name": "Valid Name", "email": "not-an-email", "phone": phone
    })))?;
    ctx.check_status("validation: malformed email returns 400", &resp, 400);
    check_envelope(ctx, "validation: email message says invalid", &resp, "invalid");

    // Malformed phone
    let fresh_email = fixture::random_email(&mut ctx.rng);
    let resp = ctx.exchange(&RequestDescriptor::new(Method::Post, CUSTOMERS).with_body(json!({
        "name": "Valid Name", "email": fresh_email, "phone": "12345"
    })))?;
    ctx.check_status("validation: malformed phone returns 400", &resp, 400);
    check_envelope(ctx, "validation: phone message says invalid", &resp, "invalid");

    // Rejected payloads must not have been persisted
    let listed = ctx.exchange(&RequestDescriptor::new(Method::Get, CUSTOMERS))?;
    let leaked = listed
        .body
        .as_ref()
        .and_then(Value::as_array)
        .is_some_and(|arr| arr.iter().any(|c| c["email"] == email.as_str()));
    ctx.check(
        "validation: rejected payloads are not persisted",
        !leaked,
        format!("rejected email {email:?} showed up in the collection"),
    );
    Ok(())
}

fn conflicts(ctx: &mut CrudContext) -> Result<(), SuiteError> {
    let (first, payload) = ctx.create_valid()?;
    ctx.check_status("conflict: first create returns 201", &first, 201);
    let id = first
        .body
        .as_ref()
        .and_then(|b| b["id"].as_str())
        .unwrap_or_default()
        .to_string();

    // Same email, everything else fresh
    let dup_body = json!({
        "name": "Someone Else",
        "email": payload["email"],
        "phone": fixture::random_phone(&mut ctx.rng),
    });
    let dup =
        ctx.exchange(&RequestDescriptor::new(Method::Post, CUSTOMERS).with_body(dup_body))?;
    ctx.check_status("conflict: duplicate email returns 409", &dup, 409);
    check_envelope(ctx, "conflict: message says the email exists", &dup, "exists");

    // Deleting the original frees the email immediately
    let deleted = ctx.exchange(
        &RequestDescriptor::new(Method::Delete, format!("{CUSTOMERS}/{id}"))
            .with_header("Authorization", "Bearer valid-admin"),
    )?;
    ctx.check_status("conflict: cleanup delete returns 204", &deleted, 204);

    let reuse_body = json!({
        "name": "Returning Customer",
        "email": payload["email"],
        "phone": fixture::random_phone(&mut ctx.rng),
    });
    let reuse =
        ctx.exchange(&RequestDescriptor::new(Method::Post, CUSTOMERS).with_body(reuse_body))?;
    ctx.check_status("conflict: deleted email is reusable", &reuse, 201);

    if let Some(id) = reuse.body.as_ref().and_then(|b| b["id"].as_str()) {
        let cleanup = ctx.exchange(
            &RequestDescriptor::new(Method::Delete, format!("{CUSTOMERS}/{id}"))
                .with_header("Authorization", "Bearer valid-admin"),
        )?;
        ctx.check_status("conflict: final cleanup returns 204", &cleanup, 204);
    }
    Ok(())
}

fn auth(ctx: &mut CrudContext) -> Result<(), SuiteError> {
    let (created, _) = ctx.create_valid()?;
    let id = created
        .body
        .as_ref()
        .and_then(|b| b["id"].as_str())
        .unwrap_or_default()
        .to_string();
    let path = format!("{CUSTOMERS}/{id}");

    let denied = [
        ("auth: delete without token returns 401", None, 401),
        (
            "auth: delete with user role returns 403",
            Some("Bearer valid-user"),
            403,
        ),
        (
            "auth: delete with expired token returns 401",
            Some("Bearer expired"),
            401,
        ),
        (
            "auth: delete with unknown token returns 401",
            Some("Bearer garbage"),
            401,
        ),
        (
            "auth: delete with non-bearer scheme returns 401",
            Some("Basic dXNlcjpwYXNz"),
            401,
        ),
    ];
    for (name, token, expected) in denied {
        let mut req = RequestDescriptor::new(Method::Delete, path.clone());
        if let Some(token) = token {
            req = req.with_header("Authorization", token);
        }
        let resp = ctx.exchange(&req)?;
        ctx.check_status(name, &resp, expected);
    }

    // Denied deletes must not have touched the record
    let read = ctx.exchange(&RequestDescriptor::new(Method::Get, path.clone()))?;
    ctx.check_status("auth: record survives denied deletes", &read, 200);

    // Authorization is decided before resource lookup
    let ghost = ctx.exchange(&RequestDescriptor::new(
        Method::Delete,
        format!("{CUSTOMERS}/never-created"),
    ))?;
    ctx.check_status("auth: missing token beats missing resource", &ghost, 401);

    // Admin may delete, including ids that never existed
    let deleted = ctx.exchange(
        &RequestDescriptor::new(Method::Delete, path)
            .with_header("Authorization", "Bearer valid-admin"),
    )?;
    ctx.check_status("auth: admin delete returns 204", &deleted, 204);

    let ghost_admin = ctx.exchange(
        &RequestDescriptor::new(Method::Delete, format!("{CUSTOMERS}/never-created"))
            .with_header("Authorization", "Bearer valid-admin"),
    )?;
    ctx.check_status("auth: admin delete of unknown id returns 204", &ghost_admin, 204);
    Ok(())
}

fn not_found(ctx: &mut CrudContext) -> Result<(), SuiteError> {
    let resp = ctx.exchange(&RequestDescriptor::new(
        Method::Get,
        format!("{CUSTOMERS}/no-such-id"),
    ))?;
    ctx.check_status("not-found: read of unknown id returns 404", &resp, 404);
    check_envelope(ctx, "not-found: envelope populated", &resp, "not found");

    let payload = fixture::customer_payload(&mut ctx.rng);
    let resp = ctx.exchange(
        &RequestDescriptor::new(Method::Put, format!("{CUSTOMERS}/no-such-id")).with_body(payload),
    )?;
    ctx.check_status("not-found: update of unknown id returns 404", &resp, 404);
    Ok(())
}

/// Assert the full error envelope: timestamp, message containing the
/// expected keyword (case-insensitive), and non-empty details.
fn check_envelope(ctx: &mut CrudContext, name: &str, resp: &ResponseDescriptor, keyword: &str) {
    let Some(body) = resp.body.as_ref() else {
        ctx.check(name, false, "error response has no body");
        return;
    };
    let timestamp_ok = body["timestamp"].as_str().is_some_and(|t| !t.is_empty());
    let details_ok = body["details"].as_str().is_some_and(|d| !d.is_empty());
    let message = body["message"].as_str().unwrap_or_default();
    let message_ok = message.to_lowercase().contains(&keyword.to_lowercase());
    ctx.check(
        name,
        timestamp_ok && details_ok && message_ok,
        format!("message {message:?}, keyword {keyword:?}, timestamp present: {timestamp_ok}, details present: {details_ok}"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::EmulatedTarget;

    #[test]
    fn suite_passes_against_the_emulated_backend() {
        let target = EmulatedTarget::new();
        let report = run_suite(&target, None).unwrap();
        let failures: Vec<String> = report
            .failures()
            .iter()
            .map(|f| format!("{}: {}", f.name, f.detail))
            .collect();
        assert!(report.all_passed(), "unexpected failures: {failures:?}");
        assert!(report.outcomes.len() >= 30);
    }

    #[test]
    fn suite_with_contract_validates_every_exchange() {
        let target = EmulatedTarget::new();
        let contract = Contract::embedded().unwrap();
        let report = run_suite(&target, Some(&contract)).unwrap();
        let failures: Vec<String> = report
            .failures()
            .iter()
            .map(|f| format!("{}: {}", f.name, f.detail))
            .collect();
        assert!(report.all_passed(), "unexpected failures: {failures:?}");
        assert!(report
            .outcomes
            .iter()
            .any(|o| o.name.starts_with("contract: ")));
    }

    #[test]
    fn suite_leaves_the_collection_clean() {
        // Every record the suite creates is deleted again, so reruns
        // against the same target start from the same state.
        let target = EmulatedTarget::new();
        run_suite(&target, None).unwrap();
        let listed = target
            .send(&RequestDescriptor::new(Method::Get, CUSTOMERS))
            .unwrap();
        assert_eq!(listed.body.unwrap(), json!([]));
    }
}
