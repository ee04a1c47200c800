//! Temporary policy elevation
//!
//! A guarded resource keeps two policies: the canonical default and the live
//! one the engine evaluates. Elevation appends a `holds(<digest>)` clause to
//! the live expression for one access type so that the protected action's own
//! access check admits the verified holder; reset copies the default back.
//!
//! Elevate and reset are not atomic with respect to process crashes. A crash
//! between them leaves the bypass clause in the persisted live policy, so the
//! in-flight marker is not persisted and [`PolicyRewriter::restore_all`] runs
//! before every verification.

use serde::{Deserialize, Serialize};
use tokengate_core::{AccessPolicy, AccessType, CredentialHash, GateError, GateResult, PolicyExpr};
use tracing::{debug, warn};

/// Default and live policies of one resource
///
/// Deserialization applies the same `traverse` base check as [`PolicyState::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedPolicyState")]
pub struct PolicyState {
    default: AccessPolicy,
    current: AccessPolicy,
    #[serde(skip)]
    in_flight: Option<AccessType>,
}

impl PolicyState {
    /// Start from a default policy, which must give `traverse` a base clause
    pub fn new(default: AccessPolicy) -> GateResult<Self> {
        Self::check_traverse_base(&default)?;
        Ok(Self {
            current: default.clone(),
            default,
            in_flight: None,
        })
    }

    /// The canonical policy
    pub fn default_policy(&self) -> &AccessPolicy {
        &self.default
    }

    /// The live policy
    pub fn current_policy(&self) -> &AccessPolicy {
        &self.current
    }

    /// Access type currently elevated for an ongoing interaction
    pub fn in_flight(&self) -> Option<&AccessType> {
        self.in_flight.as_ref()
    }

    /// Returns `true` if the live expression differs from the default one
    pub fn is_elevated(&self, access_type: &AccessType) -> bool {
        self.current.get(access_type) != self.default.get(access_type)
    }

    /// Replace the default policy and reset the live one to it
    pub fn replace_default(&mut self, default: AccessPolicy) -> GateResult<()> {
        Self::check_traverse_base(&default)?;
        self.current = default.clone();
        self.default = default;
        self.in_flight = None;
        Ok(())
    }

    fn check_traverse_base(policy: &AccessPolicy) -> GateResult<()> {
        let traverse = AccessType::traverse();
        match policy.get(&traverse).and_then(PolicyExpr::base_predicate) {
            Some(_) => Ok(()),
            None => Err(GateError::invalid(format!(
                "Default policy '{policy}' must give '{traverse}' a base predicate"
            ))),
        }
    }
}

/// Wire form of [`PolicyState`], checked before use
#[derive(Deserialize)]
struct PersistedPolicyState {
    default: AccessPolicy,
    current: AccessPolicy,
}

impl TryFrom<PersistedPolicyState> for PolicyState {
    type Error = GateError;

    fn try_from(persisted: PersistedPolicyState) -> Result<Self, Self::Error> {
        Self::check_traverse_base(&persisted.default)?;
        Ok(Self {
            default: persisted.default,
            current: persisted.current,
            in_flight: None,
        })
    }
}

/// How an elevation was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// A holds clause was appended to an existing expression
    Appended,
    /// No expression existed; a holds-only expression was created
    Synthesized,
}

/// Appends and removes holds clauses on a [`PolicyState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyRewriter;

impl PolicyRewriter {
    /// Admit the holder of `hash` through `access_type` until the next reset
    pub fn elevate(
        &self,
        state: &mut PolicyState,
        access_type: &AccessType,
        hash: CredentialHash,
    ) -> Elevation {
        let short = hash.short().to_string();
        let elevation = match state.current.get_mut(access_type) {
            Some(expr) => {
                expr.push_holds(hash);
                Elevation::Appended
            }
            None => {
                warn!(
                    access_type = %access_type,
                    hash = %short,
                    "No expression to elevate, synthesizing holds-only clause"
                );
                state
                    .current
                    .set(access_type.clone(), PolicyExpr::holds_only(hash));
                Elevation::Synthesized
            }
        };
        state.in_flight = Some(access_type.clone());
        debug!(
            access_type = %access_type,
            hash = %short,
            clauses = state.current.get(access_type).map_or(0, PolicyExpr::len),
            "Elevated policy"
        );
        elevation
    }

    /// Put the default expression for `access_type` back
    ///
    /// Idempotent. If the default has no expression for the access type the
    /// live one is removed.
    pub fn reset(&self, state: &mut PolicyState, access_type: &AccessType) {
        match state.default.get(access_type) {
            Some(expr) => state.current.set(access_type.clone(), expr.clone()),
            None => {
                state.current.remove(access_type);
            }
        }
        if state.in_flight.as_ref() == Some(access_type) {
            state.in_flight = None;
        }
        debug!(access_type = %access_type, "Reset policy to default");
    }

    /// Reset every elevated access type that is not in flight
    ///
    /// Returns the access types that were reset.
    pub fn restore_stale(&self, state: &mut PolicyState) -> Vec<AccessType> {
        let stale: Vec<AccessType> = state
            .current
            .access_types()
            .chain(state.default.access_types())
            .filter(|access_type| state.in_flight.as_ref() != Some(*access_type))
            .filter(|access_type| state.is_elevated(access_type))
            .cloned()
            .collect::<indexmap::IndexSet<_>>()
            .into_iter()
            .collect();

        for access_type in &stale {
            warn!(access_type = %access_type, "Restoring stale elevated policy");
            self.reset(state, access_type);
        }
        stale
    }

    /// Reset every elevated access type, in flight or not
    ///
    /// For the start of a new interaction, when nothing on the resource can
    /// still be in flight. A marker left by an interaction that never reached
    /// its reset is dropped first.
    pub fn restore_all(&self, state: &mut PolicyState) -> Vec<AccessType> {
        if let Some(abandoned) = state.in_flight.take() {
            warn!(access_type = %abandoned, "Dropping abandoned in-flight elevation");
        }
        self.restore_stale(state)
    }
}
