//! # tokengate-guards
//!
//! Guarded world objects: credential verification against a use mode,
//! temporary policy elevation around the protected action, and the
//! `on_use` orchestration the world engine calls for "use X with Y".
//!
//! The engine is reached only through [`WorldEffects`].

#![forbid(unsafe_code)]

/// World engine effects
pub mod effects;

/// Final feedback outcomes
pub mod feedback;

/// Use modes
pub mod mode;

/// Guarded resources and use orchestration
pub mod resource;

/// Policy elevation and reset
pub mod rewriter;

/// Lock-protected shared resources
pub mod shared;

/// Credential verification
pub mod verifier;

pub use effects::WorldEffects;
pub use feedback::FeedbackMessage;
pub use mode::UseMode;
pub use resource::{GuardedResource, TraverseOutcome, GRANTED_KEYS};
pub use rewriter::{Elevation, PolicyRewriter, PolicyState};
pub use shared::SharedResource;
pub use verifier::{CredentialVerifier, GrantedHashes, SideEffect, Verification};
