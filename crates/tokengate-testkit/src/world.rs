//! In-memory world engine
//!
//! [`MockWorld`] records what every actor was told, tracks which credential
//! digests each actor carries and where each actor stands. Guarded resources
//! run against it exactly as they would against the real engine.

use std::collections::{HashMap, HashSet};
use tokengate_core::{
    AccessContext, Actor, CredentialHash, GateError, GateResult, IdentityToken, ObjectId,
};
use tokengate_guards::WorldEffects;

/// Recording implementation of [`WorldEffects`]
#[derive(Debug, Clone, Default)]
pub struct MockWorld {
    inventories: HashMap<ObjectId, HashSet<CredentialHash>>,
    messages: HashMap<ObjectId, Vec<String>>,
    locations: HashMap<ObjectId, ObjectId>,
    unreachable: HashSet<ObjectId>,
}

impl MockWorld {
    /// Empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a token in an actor's inventory
    ///
    /// Tokens without a credential carry nothing the policy can see.
    pub fn give(&mut self, actor: &Actor, token: &IdentityToken) {
        if let Some(credential) = token.credential() {
            self.inventories
                .entry(actor.id)
                .or_default()
                .insert(credential.hash());
        }
    }

    /// Remove a token from an actor's inventory
    pub fn take(&mut self, actor: &Actor, token: &IdentityToken) {
        if let (Some(credential), Some(carried)) =
            (token.credential(), self.inventories.get_mut(&actor.id))
        {
            carried.remove(&credential.hash());
        }
    }

    /// Place an actor in a room
    pub fn place(&mut self, actor: &Actor, room: ObjectId) {
        self.locations.insert(actor.id, room);
    }

    /// Where an actor stands
    pub fn location(&self, actor: &Actor) -> Option<ObjectId> {
        self.locations.get(&actor.id).copied()
    }

    /// Make moves into `room` fail
    pub fn block(&mut self, room: ObjectId) {
        self.unreachable.insert(room);
    }

    /// Everything an actor has been told, oldest first
    pub fn messages(&self, actor: &Actor) -> &[String] {
        self.messages
            .get(&actor.id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The most recent line sent to an actor
    pub fn last_message(&self, actor: &Actor) -> Option<&str> {
        self.messages(actor).last().map(String::as_str)
    }

    /// Forget every message
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }
}

impl AccessContext for MockWorld {
    fn holds_credential(&self, actor: &Actor, hash: &CredentialHash) -> bool {
        self.inventories
            .get(&actor.id)
            .is_some_and(|carried| carried.contains(hash))
    }
}

impl WorldEffects for MockWorld {
    fn notify(&mut self, actor: &Actor, text: &str) {
        tracing::trace!(actor = %actor, text, "notify");
        self.messages
            .entry(actor.id)
            .or_default()
            .push(text.to_string());
    }

    fn move_to(&mut self, actor: &Actor, destination: ObjectId) -> GateResult<()> {
        if self.unreachable.contains(&destination) {
            return Err(GateError::not_found(format!(
                "Destination {destination} is unreachable"
            )));
        }
        self.locations.insert(actor.id, destination);
        Ok(())
    }
}
