//! crudcheck-runner: assertion suite, targets, and contract validation
//!
//! The runner drives the same ordered scenario suite against either
//! target: the in-process emulated backend or a live deployment over
//! HTTP. Target selection is the caller's concern; every scenario sees
//! only the `ApiTarget` trait.

pub mod contract;
pub mod scenario;
pub mod target;

pub use contract::{Contract, ContractError, ContractViolation};
pub use scenario::{run_suite, SuiteError};
pub use target::{ApiTarget, EmulatedTarget, LiveTarget, TargetError};
