//! Structured access policies
//!
//! An [`AccessPolicy`] maps an access type (`traverse`, `receive`, `get`, ...)
//! to a [`PolicyExpr`]: an ordered OR-list of clauses. The first clause is the
//! base predicate fixed at creation; any further clauses are `holds(<hash>)`
//! grants appended by elevation.
//!
//! The engine stores policies as lock strings:
//!
//! ```text
//! traverse:perm(Builders) or holds(3a98...1532);get:perm(Builders)
//! ```
//!
//! Conversion to and from that format only happens through `Display` and
//! `FromStr` here.

use crate::credential::CredentialHash;
use crate::errors::{GateError, GateResult};
use crate::permission::PermissionLevel;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const OR_SEPARATOR: &str = " or ";

/// Normalized access-type name
///
/// Names are trimmed and lowercased on construction so that `Traverse`,
/// ` traverse` and `traverse` address the same expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessType(String);

impl AccessType {
    /// Moving through an exit
    pub const TRAVERSE: &'static str = "traverse";
    /// Being handed an item
    pub const RECEIVE: &'static str = "receive";
    /// Being picked up
    pub const GET: &'static str = "get";

    /// Create a normalized access type
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// The `traverse` access type
    pub fn traverse() -> Self {
        Self::new(Self::TRAVERSE)
    }

    /// The `receive` access type
    pub fn receive() -> Self {
        Self::new(Self::RECEIVE)
    }

    /// The `get` access type
    pub fn get() -> Self {
        Self::new(Self::GET)
    }

    /// Normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccessType {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let access_type = Self::new(s);
        if access_type.0.is_empty() || access_type.0.contains([':', ';']) {
            return Err(GateError::invalid(format!("Invalid access type '{s}'")));
        }
        Ok(access_type)
    }
}

impl TryFrom<String> for AccessType {
    type Error = GateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccessType> for String {
    fn from(access_type: AccessType) -> Self {
        access_type.0
    }
}

/// Named predicate usable as a base clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// Always passes
    All,
    /// Never passes
    None,
    /// Passes for actors at or above the given level
    Perm(PermissionLevel),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All => f.write_str("all()"),
            Predicate::None => f.write_str("none()"),
            Predicate::Perm(level) => write!(f, "perm({level})"),
        }
    }
}

impl FromStr for Predicate {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = split_call(s)?;
        match name.as_str() {
            "all" | "true" => Ok(Predicate::All),
            "none" | "false" => Ok(Predicate::None),
            "perm" => Ok(Predicate::Perm(arg.parse()?)),
            _ => Err(GateError::invalid(format!("Unknown lock function '{name}'"))),
        }
    }
}

/// One OR-ed clause of a policy expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Clause {
    /// Permission/role predicate set at creation
    Base(Predicate),
    /// Passes for an actor carrying a credential with this digest
    Holds(CredentialHash),
}

impl Clause {
    /// Returns `true` for a base clause
    pub fn is_base(&self) -> bool {
        matches!(self, Clause::Base(_))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Base(predicate) => write!(f, "{predicate}"),
            Clause::Holds(hash) => write!(f, "holds({hash})"),
        }
    }
}

impl FromStr for Clause {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = split_call(s)?;
        if name == "holds" {
            Ok(Clause::Holds(arg.parse()?))
        } else {
            Ok(Clause::Base(s.parse()?))
        }
    }
}

/// Ordered OR-list of clauses for one access type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PolicyExpr {
    clauses: Vec<Clause>,
}

impl PolicyExpr {
    /// Expression consisting of a single base clause
    pub fn base(predicate: Predicate) -> Self {
        Self {
            clauses: vec![Clause::Base(predicate)],
        }
    }

    /// Expression consisting of a single holds clause, with no base
    pub fn holds_only(hash: CredentialHash) -> Self {
        Self {
            clauses: vec![Clause::Holds(hash)],
        }
    }

    /// The base predicate, if the expression has one
    pub fn base_predicate(&self) -> Option<Predicate> {
        match self.clauses.first() {
            Some(Clause::Base(predicate)) => Some(*predicate),
            _ => None,
        }
    }

    /// Append a holds clause
    pub fn push_holds(&mut self, hash: CredentialHash) {
        self.clauses.push(Clause::Holds(hash));
    }

    /// Digests referenced by holds clauses, in order
    pub fn holds_hashes(&self) -> impl Iterator<Item = &CredentialHash> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Holds(hash) => Some(hash),
            Clause::Base(_) => None,
        })
    }

    /// All clauses, base first
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Number of clauses
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Always `false` for parsed or constructed expressions
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for PolicyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(OR_SEPARATOR)?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

impl FromStr for PolicyExpr {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut clauses = Vec::new();
        for (i, part) in s.split(OR_SEPARATOR).enumerate() {
            let clause: Clause = part.parse()?;
            if clause.is_base() && i > 0 {
                return Err(GateError::invalid(format!(
                    "Base predicate must come first in '{s}'"
                )));
            }
            clauses.push(clause);
        }
        Ok(Self { clauses })
    }
}

impl TryFrom<String> for PolicyExpr {
    type Error = GateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PolicyExpr> for String {
    fn from(expr: PolicyExpr) -> Self {
        expr.to_string()
    }
}

/// Mapping from access type to policy expression
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessPolicy {
    entries: IndexMap<AccessType, PolicyExpr>,
}

impl AccessPolicy {
    /// Empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, access_type: AccessType, expr: PolicyExpr) -> Self {
        self.set(access_type, expr);
        self
    }

    /// Expression for an access type
    pub fn get(&self, access_type: &AccessType) -> Option<&PolicyExpr> {
        self.entries.get(access_type)
    }

    /// Mutable expression for an access type
    pub fn get_mut(&mut self, access_type: &AccessType) -> Option<&mut PolicyExpr> {
        self.entries.get_mut(access_type)
    }

    /// Replace the expression for an access type
    pub fn set(&mut self, access_type: AccessType, expr: PolicyExpr) {
        self.entries.insert(access_type, expr);
    }

    /// Drop the expression for an access type
    pub fn remove(&mut self, access_type: &AccessType) -> Option<PolicyExpr> {
        self.entries.shift_remove(access_type)
    }

    /// Returns `true` if an expression exists for the access type
    pub fn contains(&self, access_type: &AccessType) -> bool {
        self.entries.contains_key(access_type)
    }

    /// Access types in definition order
    pub fn access_types(&self) -> impl Iterator<Item = &AccessType> {
        self.entries.keys()
    }

    /// Entries in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&AccessType, &PolicyExpr)> {
        self.entries.iter()
    }

    /// Parse a lock string, requiring `required` to carry a base clause
    pub fn parse_with_base(s: &str, required: &AccessType) -> GateResult<Self> {
        let policy: Self = s.parse()?;
        match policy.get(required).and_then(PolicyExpr::base_predicate) {
            Some(_) => Ok(policy),
            None => Err(GateError::invalid(format!(
                "Policy '{s}' must define '{required}' with a base predicate"
            ))),
        }
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (access_type, expr)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{access_type}:{expr}")?;
        }
        Ok(())
    }
}

impl FromStr for AccessPolicy {
    type Err = GateError;

    /// Later definitions of the same access type replace earlier ones, as
    /// the engine does when a lock is re-added.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut policy = Self::new();
        for lock in s.split(';').map(str::trim).filter(|lock| !lock.is_empty()) {
            let (access_type, expr) = lock
                .split_once(':')
                .ok_or_else(|| GateError::invalid(format!("Lock '{lock}' has no access type")))?;
            policy.set(access_type.parse()?, expr.trim().parse()?);
        }
        Ok(policy)
    }
}

impl TryFrom<String> for AccessPolicy {
    type Error = GateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccessPolicy> for String {
    fn from(policy: AccessPolicy) -> Self {
        policy.to_string()
    }
}

/// Split `name(arg)` into a lowercased name and a trimmed argument
fn split_call(s: &str) -> GateResult<(String, &str)> {
    let s = s.trim();
    let (name, rest) = s
        .split_once('(')
        .ok_or_else(|| GateError::invalid(format!("Expected lock function, got '{s}'")))?;
    let arg = rest
        .strip_suffix(')')
        .ok_or_else(|| GateError::invalid(format!("Unclosed lock function '{s}'")))?;
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(GateError::invalid(format!("Missing lock function name in '{s}'")));
    }
    Ok((name, arg.trim()))
}
