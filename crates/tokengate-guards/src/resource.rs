//! Guarded resources
//!
//! A [`GuardedResource`] is a world object (typically an exit) whose protected
//! action is gated by an access policy and a use mode. Presenting an identity
//! token runs the use orchestration:
//!
//! 1. restore any stale elevation left behind by an interrupted interaction
//! 2. verify the credential against the use mode and granted digests
//! 3. on success, elevate `traverse` with the verifying credential's digest
//! 4. run the traversal, which re-checks the live policy
//! 5. reset `traverse` to the default, whatever the traversal did
//!
//! `on_use` never returns an error; every failure resolves to feedback.

use serde::{Deserialize, Serialize};
use tokengate_core::{
    evaluate_policy, AccessContext, AccessPolicy, AccessType, Actor, Credential, CredentialHash,
    FieldLock, GateConfig, GateError, GateResult, MessageConfig, ObjectId, PermissionLevel,
    Principal, RestrictedField, WorldObject,
};
use tracing::{debug, info, warn};

use crate::effects::WorldEffects;
use crate::feedback::FeedbackMessage;
use crate::mode::UseMode;
use crate::rewriter::{Elevation, PolicyRewriter, PolicyState};
use crate::verifier::{CredentialVerifier, GrantedHashes, Verification};

/// Attribute name of the granted digest set
pub const GRANTED_KEYS: &str = "granted_keys";

/// Outcome of a traversal attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraverseOutcome {
    /// The actor was moved to the destination
    Moved,
    /// The live policy refused the actor
    Refused,
    /// The policy admitted the actor but the move itself failed
    Failed(GateError),
}

impl TraverseOutcome {
    /// Returns `true` if the actor arrived at the destination
    pub fn is_moved(&self) -> bool {
        matches!(self, TraverseOutcome::Moved)
    }
}

/// A world object whose action is gated by identity tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardedResource {
    id: ObjectId,
    name: String,
    destination: ObjectId,
    use_mode: String,
    granted_keys: RestrictedField<GrantedHashes>,
    policy: PolicyState,
    messages: MessageConfig,
}

impl GuardedResource {
    /// Create a resource with the default configuration
    pub fn new(id: ObjectId, name: impl Into<String>, destination: ObjectId) -> GateResult<Self> {
        Self::from_config(id, name, destination, &GateConfig::default())
    }

    /// Create a resource from configuration
    pub fn from_config(
        id: ObjectId,
        name: impl Into<String>,
        destination: ObjectId,
        config: &GateConfig,
    ) -> GateResult<Self> {
        let name = name.into();
        let policy = PolicyState::new(config.default_policy()?)
            .map_err(|e| e.with_context(&format!("creating {name}")))?;
        let lock = config.granted_keys_lock()?;

        debug!(
            resource = %id,
            name = %name,
            policy = %policy.default_policy(),
            use_mode = %config.use_mode,
            "Created guarded resource"
        );

        Ok(Self {
            id,
            name,
            destination,
            use_mode: config.use_mode.clone(),
            granted_keys: RestrictedField::new(GRANTED_KEYS, GrantedHashes::new(), lock),
            policy,
            messages: config.messages.clone(),
        })
    }

    /// Database reference
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where a successful traversal leads
    pub fn destination(&self) -> ObjectId {
        self.destination
    }

    /// Feedback texts
    pub fn messages(&self) -> &MessageConfig {
        &self.messages
    }

    /// Parsed use mode, `None` if unset or unrecognized
    pub fn use_mode(&self) -> Option<UseMode> {
        self.use_mode.parse().ok()
    }

    /// The use mode exactly as stored
    pub fn raw_use_mode(&self) -> &str {
        &self.use_mode
    }

    /// Switch the use mode; the granted digests are untouched
    pub fn set_use_mode(&mut self, mode: UseMode) {
        self.set_use_mode_raw(mode.as_str());
    }

    /// Store an arbitrary use mode value, as an engine attribute edit would
    pub fn set_use_mode_raw(&mut self, mode: impl Into<String>) {
        self.use_mode = mode.into();
        debug!(resource = %self.id, use_mode = %self.use_mode, "Use mode changed");
    }

    /// The canonical policy
    pub fn default_policy(&self) -> &AccessPolicy {
        self.policy.default_policy()
    }

    /// The live policy
    pub fn current_policy(&self) -> &AccessPolicy {
        self.policy.current_policy()
    }

    /// Replace the canonical policy; requires builder permission
    pub fn set_default_policy(
        &mut self,
        principal: Principal<'_>,
        policy: AccessPolicy,
    ) -> GateResult<()> {
        if let Principal::Actor(actor) = principal {
            if !actor.has_permission(PermissionLevel::Builders) {
                return Err(GateError::permission_denied(format!(
                    "{actor} may not change the lock of {}",
                    self.name
                )));
            }
        }
        self.policy.replace_default(policy)?;
        info!(
            resource = %self.id,
            policy = %self.policy.default_policy(),
            "Default policy replaced"
        );
        Ok(())
    }

    /// Granted digests, subject to the attribute lock
    pub fn granted_hashes(&self, principal: Principal<'_>) -> GateResult<&GrantedHashes> {
        self.granted_keys.read(principal)
    }

    /// Add a digest directly, subject to the attribute lock
    ///
    /// Returns `false` if the digest was already granted.
    pub fn grant_hash(
        &mut self,
        principal: Principal<'_>,
        hash: CredentialHash,
    ) -> GateResult<bool> {
        let short = hash.short().to_string();
        let inserted = self.granted_keys.edit(principal)?.insert(hash);
        if inserted {
            info!(resource = %self.id, hash = %short, "Digest granted directly");
        }
        Ok(inserted)
    }

    /// Replace the lock on the granted digests, subject to the current lock
    pub fn relock_granted_hashes(
        &mut self,
        principal: Principal<'_>,
        lock: FieldLock,
    ) -> GateResult<()> {
        self.granted_keys.relock(principal, lock)
    }

    /// Verify a credential under the current mode
    ///
    /// Every elevation still in place is restored first, whatever the outcome.
    /// Verification starts an interaction, so no earlier one can still be in
    /// flight on this resource.
    pub fn verify(&mut self, credential: &Credential) -> Verification {
        let restored = PolicyRewriter.restore_all(&mut self.policy);
        if !restored.is_empty() {
            warn!(
                resource = %self.id,
                restored = restored.len(),
                "Restored stale elevations before verification"
            );
        }
        let mode = self.use_mode();
        CredentialVerifier.verify(
            mode,
            &self.use_mode,
            self.granted_keys.system_edit(),
            credential,
        )
    }

    /// Admit the holder of `hash` through `access_type` until the next reset
    pub fn elevate(&mut self, access_type: &AccessType, hash: CredentialHash) -> Elevation {
        PolicyRewriter.elevate(&mut self.policy, access_type, hash)
    }

    /// Put the default expression for `access_type` back
    pub fn reset(&mut self, access_type: &AccessType) {
        PolicyRewriter.reset(&mut self.policy, access_type);
    }

    /// Returns `true` if the live policy for `access_type` is elevated
    pub fn is_elevated(&self, access_type: &AccessType) -> bool {
        self.policy.is_elevated(access_type)
    }

    /// Evaluate the live policy for any access type
    pub fn check_access<C: AccessContext + ?Sized>(
        &self,
        actor: &Actor,
        access_type: &AccessType,
        context: &C,
    ) -> bool {
        let evaluation = evaluate_policy(self.current_policy(), access_type, actor, context);
        debug!(
            resource = %self.id,
            actor = %actor,
            access_type = %access_type,
            allowed = evaluation.is_allowed(),
            "Checked access"
        );
        evaluation.is_allowed()
    }

    /// Attempt to move an actor through the resource
    ///
    /// The live policy is reset afterwards, whatever happened.
    pub fn traverse<W: WorldEffects + ?Sized>(
        &mut self,
        actor: &Actor,
        world: &mut W,
    ) -> TraverseOutcome {
        let traverse = AccessType::traverse();
        let outcome = if self.check_access(actor, &traverse, &*world) {
            match world.move_to(actor, self.destination) {
                Ok(()) => {
                    info!(
                        resource = %self.id,
                        actor = %actor,
                        destination = %self.destination,
                        "Actor traversed"
                    );
                    TraverseOutcome::Moved
                }
                Err(err) => {
                    warn!(resource = %self.id, actor = %actor, error = %err, "Traversal failed");
                    TraverseOutcome::Failed(err)
                }
            }
        } else {
            world.notify(actor, &self.messages.err_traverse);
            TraverseOutcome::Refused
        };
        self.reset(&traverse);
        outcome
    }

    /// Handle "use <resource> with <object>"
    pub fn on_use<W: WorldEffects + ?Sized>(
        &mut self,
        actor: &Actor,
        supplied: Option<&WorldObject>,
        world: &mut W,
    ) -> FeedbackMessage {
        let Some(credential) = supplied.and_then(WorldObject::credential) else {
            debug!(
                resource = %self.id,
                actor = %actor,
                supplied = supplied.map(WorldObject::typename),
                "Nothing usable presented"
            );
            let feedback = FeedbackMessage::NothingHappens;
            world.notify(actor, feedback.text(&self.messages));
            return feedback;
        };

        world.notify(actor, &self.messages.token_presented);
        let verification = self.verify(&credential);
        if verification.recorded_hash().is_some() {
            world.notify(actor, &self.messages.key_recorded);
        }

        let feedback = match verification {
            Verification::Granted { .. } => FeedbackMessage::AccessGranted,
            Verification::Denied => FeedbackMessage::AccessDenied,
            Verification::Misconfigured { .. } => FeedbackMessage::Misconfigured,
        };
        world.notify(actor, feedback.text(&self.messages));

        if feedback.is_granted() {
            let traverse = AccessType::traverse();
            self.elevate(&traverse, credential.hash());
            let guard = ElevationGuard {
                resource: self,
                access_type: traverse,
            };
            let outcome = guard.resource.traverse(actor, world);
            debug!(
                resource = %guard.resource.id,
                actor = %actor,
                outcome = ?outcome,
                "Use completed"
            );
        }
        feedback
    }
}

/// Resets an elevated access type when dropped, including while unwinding
struct ElevationGuard<'a> {
    resource: &'a mut GuardedResource,
    access_type: AccessType,
}

impl Drop for ElevationGuard<'_> {
    fn drop(&mut self) {
        self.resource.reset(&self.access_type);
    }
}
