//! Permission hierarchy and actors
//!
//! Permission levels are strictly ordered; `perm(Builders)` is satisfied by
//! any actor at Builders or above.

use crate::errors::GateError;
use crate::identifiers::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered permission levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// Unauthenticated visitor
    Guests,
    /// Regular player
    Players,
    /// Trusted helper
    Helpers,
    /// World builder
    Builders,
    /// Administrator
    Admins,
    /// Developer, highest level
    Developers,
}

impl PermissionLevel {
    /// All levels in ascending order
    pub const ALL: [PermissionLevel; 6] = [
        PermissionLevel::Guests,
        PermissionLevel::Players,
        PermissionLevel::Helpers,
        PermissionLevel::Builders,
        PermissionLevel::Admins,
        PermissionLevel::Developers,
    ];

    /// Canonical name used in lock strings
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Guests => "Guests",
            PermissionLevel::Players => "Players",
            PermissionLevel::Helpers => "Helpers",
            PermissionLevel::Builders => "Builders",
            PermissionLevel::Admins => "Admins",
            PermissionLevel::Developers => "Developers",
        }
    }

    /// Returns `true` if this level satisfies a requirement of `required`
    pub fn satisfies(&self, required: PermissionLevel) -> bool {
        *self >= required
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = GateError;

    /// Case-insensitive; accepts singular forms (`Builder`, `admin`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.trim_end_matches('s');
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().to_ascii_lowercase().trim_end_matches('s') == wanted)
            .ok_or_else(|| GateError::invalid(format!("Unknown permission level '{s}'")))
    }
}

/// An actor (player character or puppeted object) acting in the world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Database reference of the actor
    pub id: ObjectId,
    /// Display name
    pub name: String,
    /// Highest permission level held
    pub permission: PermissionLevel,
}

impl Actor {
    /// Create a new actor
    pub fn new(id: ObjectId, name: impl Into<String>, permission: PermissionLevel) -> Self {
        Self {
            id,
            name: name.into(),
            permission,
        }
    }

    /// Returns `true` if the actor holds at least `required`
    pub fn has_permission(&self, required: PermissionLevel) -> bool {
        self.permission.satisfies(required)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
