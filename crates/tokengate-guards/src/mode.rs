//! Use modes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokengate_core::GateError;

/// How a guarded resource treats presented credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseMode {
    /// Every credential is accepted, nothing is recorded
    Allowing,
    /// Only credentials whose digest was granted earlier are accepted
    Checking,
    /// Every credential is accepted and its digest is recorded
    Granting,
    /// Every credential is refused
    Denying,
}

impl UseMode {
    /// Lowercase name stored in the `use_mode` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            UseMode::Allowing => "allowing",
            UseMode::Checking => "checking",
            UseMode::Granting => "granting",
            UseMode::Denying => "denying",
        }
    }
}

impl fmt::Display for UseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseMode {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allowing" => Ok(UseMode::Allowing),
            "checking" => Ok(UseMode::Checking),
            "granting" => Ok(UseMode::Granting),
            "denying" => Ok(UseMode::Denying),
            _ => Err(GateError::invalid(format!("Unknown use mode '{s}'"))),
        }
    }
}
