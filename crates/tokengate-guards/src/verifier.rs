//! Credential verification
//!
//! Decides whether a presented credential is accepted, based on the resource's
//! use mode and its set of granted digests:
//!
//! | mode     | accepted                     | mutation                      |
//! |----------|------------------------------|-------------------------------|
//! | allowing | always                       | none                          |
//! | checking | iff digest already granted   | none                          |
//! | granting | always                       | digest appended if absent     |
//! | denying  | never                        | none                          |
//! | other    | reported as misconfiguration | none                          |

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tokengate_core::{Credential, CredentialHash};
use tracing::{debug, info, warn};

use crate::mode::UseMode;

/// Append-only set of granted credential digests
///
/// Has no removal operation; revocation is not supported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantedHashes(IndexSet<CredentialHash>);

impl GrantedHashes {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the digest has been granted
    pub fn contains(&self, hash: &CredentialHash) -> bool {
        self.0.contains(hash)
    }

    /// Append a digest; returns `false` if it was already present
    pub fn insert(&mut self, hash: CredentialHash) -> bool {
        self.0.insert(hash)
    }

    /// Digests in grant order
    pub fn iter(&self) -> impl Iterator<Item = &CredentialHash> {
        self.0.iter()
    }

    /// Number of granted digests
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing has been granted
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<CredentialHash> for GrantedHashes {
    fn from_iter<I: IntoIterator<Item = CredentialHash>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Mutation performed by a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Nothing changed
    None,
    /// The digest was newly appended to the granted set
    Grant(CredentialHash),
}

/// Result of verifying one credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Credential accepted
    Granted {
        /// Mutation performed while accepting
        side_effect: SideEffect,
    },
    /// Credential refused
    Denied,
    /// The use mode is unset or not recognized
    Misconfigured {
        /// The raw mode value found on the resource
        mode: String,
    },
}

impl Verification {
    /// Returns `true` if the credential was accepted
    pub fn is_granted(&self) -> bool {
        matches!(self, Verification::Granted { .. })
    }

    /// The digest recorded by this verification, if any
    pub fn recorded_hash(&self) -> Option<&CredentialHash> {
        match self {
            Verification::Granted {
                side_effect: SideEffect::Grant(hash),
            } => Some(hash),
            _ => None,
        }
    }
}

/// Stateless credential verifier
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialVerifier;

impl CredentialVerifier {
    /// Verify `credential` against a mode and granted set
    ///
    /// `raw_mode` is the stored attribute value; it is only used to report
    /// misconfiguration when `mode` is `None`.
    pub fn verify(
        &self,
        mode: Option<UseMode>,
        raw_mode: &str,
        granted: &mut GrantedHashes,
        credential: &Credential,
    ) -> Verification {
        let hash = credential.hash();

        let verification = match mode {
            Some(UseMode::Allowing) => Verification::Granted {
                side_effect: SideEffect::None,
            },
            Some(UseMode::Denying) => Verification::Denied,
            Some(UseMode::Checking) => {
                if granted.contains(&hash) {
                    Verification::Granted {
                        side_effect: SideEffect::None,
                    }
                } else {
                    Verification::Denied
                }
            }
            Some(UseMode::Granting) => {
                if granted.insert(hash.clone()) {
                    info!(
                        holder = %credential.holder(),
                        hash = hash.short(),
                        granted = granted.len(),
                        "Recorded credential digest"
                    );
                    Verification::Granted {
                        side_effect: SideEffect::Grant(hash.clone()),
                    }
                } else {
                    Verification::Granted {
                        side_effect: SideEffect::None,
                    }
                }
            }
            None => {
                warn!(mode = raw_mode, "Guarded resource has no usable use mode");
                Verification::Misconfigured {
                    mode: raw_mode.to_string(),
                }
            }
        };

        debug!(
            mode = raw_mode,
            holder = %credential.holder(),
            hash = hash.short(),
            granted = verification.is_granted(),
            "Verified credential"
        );
        verification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokengate_core::{CredentialSecret, ObjectId};

    fn credential(byte: u8) -> Credential {
        Credential::new(CredentialSecret::from_bytes([byte; 16]), ObjectId::new(100))
    }

    #[test]
    fn test_allowing_accepts_without_recording() {
        let mut granted = GrantedHashes::new();
        let result = CredentialVerifier.verify(
            Some(UseMode::Allowing),
            "allowing",
            &mut granted,
            &credential(1),
        );
        assert!(result.is_granted());
        assert!(granted.is_empty());
    }

    #[test]
    fn test_checking_consults_granted_set() {
        let mut granted: GrantedHashes = [credential(1).hash()].into_iter().collect();
        let verifier = CredentialVerifier;

        assert!(verifier
            .verify(Some(UseMode::Checking), "checking", &mut granted, &credential(1))
            .is_granted());
        assert_eq!(
            verifier.verify(Some(UseMode::Checking), "checking", &mut granted, &credential(2)),
            Verification::Denied
        );
        assert_eq!(granted.len(), 1);
    }

    #[test]
    fn test_granting_is_idempotent() {
        let mut granted = GrantedHashes::new();
        let verifier = CredentialVerifier;
        let token = credential(3);

        let first = verifier.verify(Some(UseMode::Granting), "granting", &mut granted, &token);
        let second = verifier.verify(Some(UseMode::Granting), "granting", &mut granted, &token);

        assert_eq!(first.recorded_hash(), Some(&token.hash()));
        assert_eq!(
            second,
            Verification::Granted {
                side_effect: SideEffect::None
            }
        );
        assert_eq!(granted.len(), 1);
    }

    #[test]
    fn test_denying_refuses_granted_credential() {
        let mut granted: GrantedHashes = [credential(4).hash()].into_iter().collect();
        let result = CredentialVerifier.verify(
            Some(UseMode::Denying),
            "denying",
            &mut granted,
            &credential(4),
        );
        assert_eq!(result, Verification::Denied);
        assert!(granted.contains(&credential(4).hash()));
    }

    #[test]
    fn test_unknown_mode_is_misconfiguration() {
        let mut granted = GrantedHashes::new();
        let result = CredentialVerifier.verify(None, "sideways", &mut granted, &credential(5));
        assert_eq!(
            result,
            Verification::Misconfigured {
                mode: "sideways".to_string()
            }
        );
        assert!(granted.is_empty());
    }
}
