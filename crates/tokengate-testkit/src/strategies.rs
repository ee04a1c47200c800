//! Property test strategies for tokengate types

use proptest::prelude::*;

pub use proptest;

use tokengate_core::credential::SECRET_LEN;
use tokengate_core::{Actor, Credential, CredentialSecret, ObjectId, PermissionLevel};
use tokengate_guards::UseMode;

/// Strategy for raw credential secrets
pub fn arb_secret() -> impl Strategy<Value = CredentialSecret> {
    any::<[u8; SECRET_LEN]>().prop_map(CredentialSecret::from_bytes)
}

/// Strategy for credentials held by tokens in the `#1000..#2000` range
pub fn arb_credential() -> impl Strategy<Value = Credential> {
    (arb_secret(), 1000u64..2000)
        .prop_map(|(secret, holder)| Credential::new(secret, ObjectId::new(holder)))
}

/// Strategy for a handful of credentials, possibly with repeats
pub fn arb_credentials(max: usize) -> impl Strategy<Value = Vec<Credential>> {
    prop::collection::vec(arb_credential(), 0..=max)
}

/// Strategy for use modes
pub fn arb_use_mode() -> impl Strategy<Value = UseMode> {
    prop_oneof![
        Just(UseMode::Allowing),
        Just(UseMode::Checking),
        Just(UseMode::Granting),
        Just(UseMode::Denying),
    ]
}

/// Strategy for permission levels
pub fn arb_permission_level() -> impl Strategy<Value = PermissionLevel> {
    prop::sample::select(PermissionLevel::ALL.to_vec())
}

/// Strategy for actors with ids in `#1..#1000`
pub fn arb_actor() -> impl Strategy<Value = Actor> {
    (1u64..1000, arb_permission_level())
        .prop_map(|(id, level)| Actor::new(ObjectId::new(id), format!("actor-{id}"), level))
}
