//! Pure synchronous credential hashing
//!
//! Hashing is a pure, deterministic operation: the same secret always produces
//! the same digest. The algorithm is declared once through the [`ALGORITHM`]
//! constant and every caller goes through [`hash`], so swapping algorithms
//! never touches call sites.
//!
//! Current algorithm: **SHA3-256** (256-bit / 32-byte output)
//!
//! Digests are unsalted and unkeyed. Anyone holding a raw secret can compute
//! its digest, and two objects carrying a copied secret hash identically. This
//! is what allows a credential to be copied onto another token.
//!
//! ```ignore
//! use tokengate_core::hash::hash;
//!
//! let digest = hash(b"abc");
//! assert_eq!(digest.len(), 32);
//! ```

use sha3::{Digest, Sha3_256};
use std::fmt;

/// Synchronous trait for one-way hashing of credential material
pub trait HashAlgorithm: Send + Sync + fmt::Debug {
    /// Hash arbitrary bytes to a 32-byte digest
    fn hash(&self, data: &[u8]) -> [u8; 32];
}

/// SHA3-256 hash implementation (NIST FIPS 202)
#[derive(Debug, Clone, Copy)]
pub struct Sha3_256Algorithm;

impl HashAlgorithm for Sha3_256Algorithm {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update(data);
        hasher.finalize().into()
    }
}

/// The hash algorithm used for every credential digest in the system.
pub const ALGORITHM: Sha3_256Algorithm = Sha3_256Algorithm;

/// Hash bytes with the global algorithm
#[inline]
pub fn hash(data: &[u8]) -> [u8; 32] {
    ALGORITHM.hash(data)
}

/// Hash bytes and render the digest as lowercase hex
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash(data))
}
