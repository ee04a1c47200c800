//! tokengate core - credentials and access policies
//!
//! Foundational types for capability-token access control over world objects:
//!
//! - [`credential`]: random 16-byte secrets held by identity tokens, and their
//!   SHA3-256 digests
//! - [`policy`]: structured per-access-type policies (`perm(...)` base clause
//!   OR-ed with `holds(<digest>)` grants), the lock-string boundary format and
//!   an evaluator
//! - [`attributes`]: field-level locks around sensitive attributes
//! - [`config`]: TOML configuration for guarded resources
//!
//! The orchestration that ties these together lives in `tokengate-guards`.

#![forbid(unsafe_code)]

/// Field-level restricted attributes
pub mod attributes;

/// Guarded resource configuration
pub mod config;

/// Credentials and identity tokens
pub mod credential;

/// Unified error handling
pub mod errors;

/// Credential hashing
pub mod hash;

/// Object identifiers
pub mod identifiers;

/// Objects presented to guarded resources
pub mod object;

/// Permission hierarchy and actors
pub mod permission;

/// Access policies and evaluation
pub mod policy;

pub use attributes::{FieldLock, Principal, RestrictedField};
pub use config::{GateConfig, MessageConfig};
pub use credential::{Credential, CredentialHash, CredentialSecret, IdentityToken};
pub use errors::{GateError, GateResult};
pub use identifiers::ObjectId;
pub use object::{Thing, WorldObject};
pub use permission::{Actor, PermissionLevel};
pub use policy::{
    evaluate_expr, evaluate_policy, AccessContext, AccessPolicy, AccessType, Clause,
    PolicyEvaluation, PolicyExpr, Predicate,
};
