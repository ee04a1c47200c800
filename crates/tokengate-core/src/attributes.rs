//! Field-level restricted attributes
//!
//! Some persistent attributes must not be visible to, or editable by, ordinary
//! builders. [`RestrictedField`] wraps such a value together with a
//! [`FieldLock`], and every accessor takes the [`Principal`] asking for it.
//! The system itself always passes; actors are checked against the lock.

use crate::errors::{GateError, GateResult};
use crate::permission::{Actor, PermissionLevel};
use crate::policy::{AccessPolicy, AccessType, Clause, Predicate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ATTR_READ: &str = "attrread";
const ATTR_EDIT: &str = "attredit";

/// Who is reading or editing a restricted field
#[derive(Debug, Clone, Copy)]
pub enum Principal<'a> {
    /// Internal resource logic
    System,
    /// A specific actor
    Actor(&'a Actor),
}

impl<'a> From<&'a Actor> for Principal<'a> {
    fn from(actor: &'a Actor) -> Self {
        Principal::Actor(actor)
    }
}

/// Read and edit predicates protecting one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldLock {
    /// Predicate required to read
    pub read: Predicate,
    /// Predicate required to edit
    pub edit: Predicate,
}

impl FieldLock {
    /// Lock both read and edit behind a permission level
    pub fn perm(level: PermissionLevel) -> Self {
        Self {
            read: Predicate::Perm(level),
            edit: Predicate::Perm(level),
        }
    }

    /// Administrator-only read and edit
    pub fn admins_only() -> Self {
        Self::perm(PermissionLevel::Admins)
    }

    fn permits(predicate: Predicate, principal: Principal<'_>) -> bool {
        match (principal, predicate) {
            (Principal::System, _) => true,
            (Principal::Actor(_), Predicate::All) => true,
            (Principal::Actor(_), Predicate::None) => false,
            (Principal::Actor(actor), Predicate::Perm(level)) => actor.has_permission(level),
        }
    }

    /// Check read access
    pub fn check_read(&self, principal: Principal<'_>, field: &str) -> GateResult<()> {
        if Self::permits(self.read, principal) {
            Ok(())
        } else {
            Err(denied(principal, "read", field))
        }
    }

    /// Check edit access
    pub fn check_edit(&self, principal: Principal<'_>, field: &str) -> GateResult<()> {
        if Self::permits(self.edit, principal) {
            Ok(())
        } else {
            Err(denied(principal, "edit", field))
        }
    }
}

impl Default for FieldLock {
    fn default() -> Self {
        Self::admins_only()
    }
}

impl fmt::Display for FieldLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ATTR_READ}:{};{ATTR_EDIT}:{}", self.read, self.edit)
    }
}

impl FromStr for FieldLock {
    type Err = GateError;

    /// Parses `attrread:<pred>;attredit:<pred>`. A missing half is open to all.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let policy: AccessPolicy = s.parse()?;
        let predicate_for = |name: &str| -> GateResult<Predicate> {
            match policy.get(&AccessType::new(name)).map(|expr| expr.clauses()) {
                None => Ok(Predicate::All),
                Some([Clause::Base(predicate)]) => Ok(*predicate),
                Some(_) => Err(GateError::invalid(format!(
                    "Attribute lock '{name}' must be a single predicate"
                ))),
            }
        };
        if let Some(other) = policy
            .access_types()
            .find(|t| t.as_str() != ATTR_READ && t.as_str() != ATTR_EDIT)
        {
            return Err(GateError::invalid(format!(
                "Unsupported attribute lock type '{other}'"
            )));
        }
        Ok(Self {
            read: predicate_for(ATTR_READ)?,
            edit: predicate_for(ATTR_EDIT)?,
        })
    }
}

impl TryFrom<String> for FieldLock {
    type Error = GateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldLock> for String {
    fn from(lock: FieldLock) -> Self {
        lock.to_string()
    }
}

/// A persistent attribute guarded by a [`FieldLock`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedField<T> {
    name: String,
    value: T,
    lock: FieldLock,
}

impl<T> RestrictedField<T> {
    /// Wrap a value under a lock
    pub fn new(name: impl Into<String>, value: T, lock: FieldLock) -> Self {
        Self {
            name: name.into(),
            value,
            lock,
        }
    }

    /// Attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lock protecting this attribute
    pub fn lock(&self) -> &FieldLock {
        &self.lock
    }

    /// The value as seen by the owning resource's own logic
    pub fn system_view(&self) -> &T {
        &self.value
    }

    /// Mutable access for the owning resource's own logic
    pub fn system_edit(&mut self) -> &mut T {
        &mut self.value
    }

    /// Read the value
    pub fn read(&self, principal: Principal<'_>) -> GateResult<&T> {
        self.lock.check_read(principal, &self.name)?;
        Ok(&self.value)
    }

    /// Borrow the value mutably for editing
    pub fn edit(&mut self, principal: Principal<'_>) -> GateResult<&mut T> {
        self.lock.check_edit(principal, &self.name)?;
        Ok(&mut self.value)
    }

    /// Replace the value
    pub fn write(&mut self, principal: Principal<'_>, value: T) -> GateResult<()> {
        *self.edit(principal)? = value;
        Ok(())
    }

    /// Replace the lock; editing the lock requires edit access
    pub fn relock(&mut self, principal: Principal<'_>, lock: FieldLock) -> GateResult<()> {
        self.lock.check_edit(principal, &self.name)?;
        self.lock = lock;
        Ok(())
    }
}

fn denied(principal: Principal<'_>, verb: &str, field: &str) -> GateError {
    let who = match principal {
        Principal::System => "system".to_string(),
        Principal::Actor(actor) => format!("{} ({})", actor.name, actor.id),
    };
    tracing::debug!(who = %who, verb, field, "Attribute access refused");
    GateError::permission_denied(format!("{who} may not {verb} attribute '{field}'"))
}
