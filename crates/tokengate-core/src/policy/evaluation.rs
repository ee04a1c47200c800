//! Policy evaluation logic

use super::expression::{AccessPolicy, AccessType, Clause, PolicyExpr, Predicate};
use crate::credential::CredentialHash;
use crate::permission::Actor;

/// What the evaluator needs to know about the world
pub trait AccessContext {
    /// Returns `true` if `actor` carries a credential whose digest is `hash`
    fn holds_credential(&self, actor: &Actor, hash: &CredentialHash) -> bool;
}

/// Result of policy evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyEvaluation {
    /// A clause passed
    Allow {
        /// The first clause that passed
        matched: Clause,
    },
    /// No clause passed
    Deny,
    /// No expression is defined for the access type
    Undefined,
}

impl PolicyEvaluation {
    /// Returns `true` if access is allowed
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyEvaluation::Allow { .. })
    }
}

/// Evaluate a single expression for an actor
pub fn evaluate_expr<C: AccessContext + ?Sized>(
    expr: &PolicyExpr,
    actor: &Actor,
    context: &C,
) -> PolicyEvaluation {
    expr.clauses()
        .iter()
        .find(|clause| clause_passes(clause, actor, context))
        .map(|clause| PolicyEvaluation::Allow {
            matched: clause.clone(),
        })
        .unwrap_or(PolicyEvaluation::Deny)
}

/// Evaluate the expression for `access_type` in `policy`
///
/// An access type with no expression is `Undefined`, which callers treat as
/// a denial.
pub fn evaluate_policy<C: AccessContext + ?Sized>(
    policy: &AccessPolicy,
    access_type: &AccessType,
    actor: &Actor,
    context: &C,
) -> PolicyEvaluation {
    match policy.get(access_type) {
        Some(expr) => evaluate_expr(expr, actor, context),
        None => PolicyEvaluation::Undefined,
    }
}

fn clause_passes<C: AccessContext + ?Sized>(clause: &Clause, actor: &Actor, context: &C) -> bool {
    match clause {
        Clause::Base(Predicate::All) => true,
        Clause::Base(Predicate::None) => false,
        Clause::Base(Predicate::Perm(level)) => actor.has_permission(*level),
        Clause::Holds(hash) => context.holds_credential(actor, hash),
    }
}
