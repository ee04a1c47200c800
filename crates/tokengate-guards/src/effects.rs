//! World engine effects consumed by guarded resources
//!
//! The guard logic never talks to the world engine directly. Everything it
//! needs (telling an actor something, checking what the actor carries, moving
//! the actor) goes through [`WorldEffects`], so the same orchestration runs
//! against the real engine or the in-memory world in `tokengate-testkit`.

use tokengate_core::{AccessContext, Actor, GateResult, ObjectId};

/// Engine primitives used by the use orchestration
///
/// Possession checks come from the [`AccessContext`] supertrait, which is
/// what the policy evaluator consults for `holds(...)` clauses.
pub trait WorldEffects: AccessContext {
    /// Send a line of text to an actor
    fn notify(&mut self, actor: &Actor, text: &str);

    /// Move an actor to a destination object
    ///
    /// Called only after the live policy has admitted the actor.
    fn move_to(&mut self, actor: &Actor, destination: ObjectId) -> GateResult<()>;
}
