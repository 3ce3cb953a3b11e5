//! Authentication and authorization flow.
//!
//! ## Module Organization
//!
//! - `casbin`: Casbin enforcer initialization from the embedded model and policy
//! - `delivery`: Login code delivery port and the development logger adapter
//! - `depot`: Helpers for extracting the authenticated caller from Salvo requests
//! - `login`: One-time login codes, sessions and sign-out
//! - `secret`: Random code/token generation and hashing
//! - `service`: Centralized authorization service (`Authorizer`)
//! - `subject`: Relations a caller holds to a resource

pub mod casbin;
pub mod delivery;
pub mod depot;
pub mod login;
pub mod secret;
pub mod service;
pub mod subject;

pub use service::{Action, Authorizer, AuthzResult, Resource};
pub use subject::{Relation, Subjects};
