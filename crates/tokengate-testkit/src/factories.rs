//! Test data factories
//!
//! Deterministic tokens, actors and guarded resources so scenarios are
//! reproducible from a seed.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tokengate_core::{Actor, IdentityToken, ObjectId, PermissionLevel};
use tokengate_guards::{GuardedResource, UseMode};

/// First object id handed out by a [`TokenFactory`]
const FIRST_TOKEN_ID: u64 = 1000;

/// Seeded source of identity tokens
#[derive(Debug, Clone)]
pub struct TokenFactory {
    rng: ChaCha20Rng,
    next_id: u64,
}

impl TokenFactory {
    /// Factory whose tokens depend only on `seed`
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            next_id: FIRST_TOKEN_ID,
        }
    }

    /// Create and issue a new token
    pub fn token(&mut self, name: &str) -> IdentityToken {
        let id = ObjectId::new(self.next_id);
        self.next_id += 1;
        IdentityToken::create(id, name, &mut self.rng)
    }

    /// Create `count` tokens named `token-<n>`
    pub fn tokens(&mut self, count: usize) -> Vec<IdentityToken> {
        (0..count).map(|n| self.token(&format!("token-{n}"))).collect()
    }
}

/// Actor with the given permission level
pub fn actor(id: u64, name: &str, permission: PermissionLevel) -> Actor {
    Actor::new(ObjectId::new(id), name, permission)
}

/// Ordinary player
pub fn player(id: u64) -> Actor {
    actor(id, &format!("player-{id}"), PermissionLevel::Players)
}

/// Builder, admitted by the default traverse lock
pub fn builder(id: u64) -> Actor {
    actor(id, &format!("builder-{id}"), PermissionLevel::Builders)
}

/// Administrator, allowed to read and edit granted keys
pub fn admin(id: u64) -> Actor {
    actor(id, &format!("admin-{id}"), PermissionLevel::Admins)
}

/// Room a test door leads to
pub const DOOR_DESTINATION: ObjectId = ObjectId(2);

/// Door with the default lock, set to `mode`
pub fn door(mode: UseMode) -> GuardedResource {
    let mut door = GuardedResource::new(ObjectId::new(1), "security door", DOOR_DESTINATION)
        .unwrap_or_else(|err| panic!("default door config is invalid: {err}"));
    door.set_use_mode(mode);
    door
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_secrets() {
        let a = TokenFactory::seeded(7).token("a");
        let b = TokenFactory::seeded(7).token("b");
        assert_eq!(a.credential().unwrap().hash(), b.credential().unwrap().hash());
    }

    #[test]
    fn test_distinct_tokens_distinct_ids_and_hashes() {
        let tokens = TokenFactory::seeded(1).tokens(2);
        assert_ne!(tokens[0].id, tokens[1].id);
        assert_ne!(
            tokens[0].credential().unwrap().hash(),
            tokens[1].credential().unwrap().hash()
        );
    }
}
