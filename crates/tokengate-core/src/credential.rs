//! Credentials and identity tokens
//!
//! A credential is a 16-byte random secret held by exactly one identity token.
//! The secret is generated once, when the token is created, and never changes.
//! Only its digest ([`CredentialHash`]) is ever stored on other objects or
//! compared; the digest is recomputed from the secret on every check.

use crate::errors::{GateError, GateResult};
use crate::hash;
use crate::identifiers::ObjectId;
use crate::permission::Actor;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a raw credential secret in bytes
pub const SECRET_LEN: usize = 16;

/// Raw credential secret
///
/// Cloning is allowed: copying a secret onto another token yields a credential
/// that verifies identically.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialSecret([u8; SECRET_LEN]);

impl CredentialSecret {
    /// Wrap existing secret bytes
    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    /// Draw a fresh secret from a cryptographically secure RNG
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Digest of this secret
    pub fn hash(&self) -> CredentialHash {
        CredentialHash::of(&self.0)
    }
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialSecret(<redacted>)")
    }
}

/// Lowercase hex SHA3-256 digest of a credential secret
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Hash arbitrary secret bytes
    pub fn of(secret: &[u8]) -> Self {
        Self(hash::hash_hex(secret))
    }

    /// Hex form of the digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CredentialHash {
    type Err = GateError;

    /// Accepts 64 hex digits in either case; stores lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bytes = hex::decode(s)
            .map_err(|e| GateError::invalid(format!("Invalid credential hash '{s}': {e}")))?;
        if bytes.len() != 32 {
            return Err(GateError::invalid(format!(
                "Credential hash must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(hex::encode(bytes)))
    }
}

impl TryFrom<String> for CredentialHash {
    type Error = GateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CredentialHash> for String {
    fn from(hash: CredentialHash) -> Self {
        hash.0
    }
}

/// A credential presented by an actor: the secret plus the token holding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    secret: CredentialSecret,
    holder: ObjectId,
}

impl Credential {
    /// Bind a secret to its holder object
    pub fn new(secret: CredentialSecret, holder: ObjectId) -> Self {
        Self { secret, holder }
    }

    /// The token object holding this credential
    pub fn holder(&self) -> ObjectId {
        self.holder
    }

    /// Digest of the secret, recomputed on every call
    pub fn hash(&self) -> CredentialHash {
        self.secret.hash()
    }

    /// Borrow the raw secret
    pub fn secret(&self) -> &CredentialSecret {
        &self.secret
    }
}

/// Object that carries a credential secret (an "identity token")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityToken {
    /// Database reference of the token
    pub id: ObjectId,
    /// Display name
    pub name: String,
    secret: Option<CredentialSecret>,
}

impl IdentityToken {
    /// Type name the world engine uses for identity tokens
    pub const TYPENAME: &'static str = "IdentityToken";

    /// Create a token and issue its credential in one step
    pub fn create<R: RngCore + CryptoRng>(
        id: ObjectId,
        name: impl Into<String>,
        rng: &mut R,
    ) -> Self {
        let mut token = Self::blank(id, name);
        token.issue(rng);
        token
    }

    /// Create a token with no credential yet
    pub fn blank(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            secret: None,
        }
    }

    /// Create a token carrying a copy of an existing secret
    pub fn with_secret(id: ObjectId, name: impl Into<String>, secret: CredentialSecret) -> Self {
        Self {
            id,
            name: name.into(),
            secret: Some(secret),
        }
    }

    /// Issue this token's credential
    ///
    /// Generates a secret only if none exists yet; a token that already holds
    /// a secret keeps it and the existing credential is returned.
    pub fn issue<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Credential {
        let id = self.id;
        let secret = self.secret.get_or_insert_with(|| {
            let secret = CredentialSecret::generate(rng);
            tracing::debug!(token = %id, hash = secret.hash().short(), "Issued credential");
            secret
        });
        Credential::new(secret.clone(), id)
    }

    /// The token's credential, if one has been issued
    pub fn credential(&self) -> Option<Credential> {
        self.secret
            .as_ref()
            .map(|secret| Credential::new(secret.clone(), self.id))
    }

    /// The token's credential, or `NotFound` if it was never issued
    pub fn require_credential(&self) -> GateResult<Credential> {
        self.credential()
            .ok_or_else(|| GateError::not_found(format!("Token {} has no credential", self.id)))
    }

    /// Feedback for using the token on its own: it reports the user's name
    pub fn use_alone(&self, user: &Actor) -> String {
        format!("Your name is {user}")
    }
}
