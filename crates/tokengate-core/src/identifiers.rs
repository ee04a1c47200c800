//! Object identifiers
//!
//! The world engine addresses every persistent object by a database reference
//! rendered as `#<n>`.

use crate::errors::GateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database reference of a persistent world object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Create from a raw database number
    pub fn new(dbref: u64) -> Self {
        Self(dbref)
    }

    /// Get the raw database number
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('#').unwrap_or(s.trim());
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|e| GateError::invalid(format!("Invalid object reference '{s}': {e}")))
    }
}

impl From<u64> for ObjectId {
    fn from(dbref: u64) -> Self {
        Self(dbref)
    }
}
