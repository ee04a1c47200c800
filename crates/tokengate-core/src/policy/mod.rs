//! Access policies and evaluation

pub mod evaluation;
pub mod expression;

pub use evaluation::{evaluate_expr, evaluate_policy, AccessContext, PolicyEvaluation};
pub use expression::{AccessPolicy, AccessType, Clause, PolicyExpr, Predicate};
