//! In-memory customer set: CRUD state machine and conflict detection
//!
//! The store exclusively owns the customer set for a suite run.
//! Mutations take the single mutex, so concurrent callers see
//! at-most-one-writer semantics and readers get consistent snapshots.
//! Deletion is terminal: the record is removed outright, its email
//! becomes immediately reusable, and lookups by that id report
//! not-found forever (ids are random and never reissued).

use parking_lot::Mutex;

use crate::model::{Customer, CustomerFields};

/// Stateful outcome of a store mutation that can be refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Email uniqueness violated (case-sensitive exact match)
    #[error("customer with email '{0}' already exists")]
    Conflict(String),
    /// Unknown or deleted id
    #[error("customer '{0}' not found")]
    NotFound(String),
}

/// The in-memory customer set, insertion-ordered.
#[derive(Debug, Default)]
pub struct CustomerStore {
    customers: Mutex<Vec<Customer>>,
}

impl CustomerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new customer under the supplied fresh id.
    ///
    /// The caller validates fields first; this only enforces email
    /// uniqueness, atomically with the insert.
    pub fn create(&self, id: String, fields: &CustomerFields) -> Result<Customer, StoreError> {
        let email = fields.email.clone().unwrap_or_default();
        let mut customers = self.customers.lock();
        if customers.iter().any(|c| c.email == email) {
            return Err(StoreError::Conflict(email));
        }
        let customer = Customer {
            id,
            name: fields.name.clone().unwrap_or_default(),
            email,
            phone: fields.phone.clone().unwrap_or_default(),
        };
        customers.push(customer.clone());
        Ok(customer)
    }

    /// Look up an active customer by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Customer> {
        self.customers.lock().iter().find(|c| c.id == id).cloned()
    }

    /// Snapshot of all active customers in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<Customer> {
        self.customers.lock().clone()
    }

    /// Replace the mutable fields of an active customer, id unchanged.
    ///
    /// The uniqueness check excludes the record being updated: a
    /// customer may keep its own email.
    pub fn update(&self, id: &str, fields: &CustomerFields) -> Result<Customer, StoreError> {
        let email = fields.email.clone().unwrap_or_default();
        let mut customers = self.customers.lock();
        if customers.iter().any(|c| c.email == email && c.id != id) {
            return Err(StoreError::Conflict(email));
        }
        let Some(customer) = customers.iter_mut().find(|c| c.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        customer.name = fields.name.clone().unwrap_or_default();
        customer.email = email;
        customer.phone = fields.phone.clone().unwrap_or_default();
        Ok(customer.clone())
    }

    /// Remove a customer. Returns whether a record existed; delete of
    /// an unknown id is an idempotent no-op (policy: the not-found path
    /// is exercised by re-reading after delete, not by delete itself).
    pub fn delete(&self, id: &str) -> bool {
        let mut customers = self.customers.lock();
        let before = customers.len();
        customers.retain(|c| c.id != id);
        customers.len() != before
    }
}
