//! Property tests for verification and policy elevation

use proptest::prelude::*;
use tokengate_core::{AccessType, Principal, WorldObject};
use tokengate_guards::{UseMode, Verification};
use tokengate_testkit::strategies::{arb_actor, arb_credential, arb_credentials, arb_use_mode};
use tokengate_testkit::{door, MockWorld, TokenFactory};

proptest! {
    #[test]
    fn checking_never_mutates_granted(
        granted in arb_credentials(4),
        candidate in arb_credential(),
    ) {
        let mut door = door(UseMode::Granting);
        for credential in &granted {
            door.verify(credential);
        }
        door.set_use_mode(UseMode::Checking);
        let before = door.granted_hashes(Principal::System).unwrap().clone();

        let result = door.verify(&candidate);

        prop_assert_eq!(result.is_granted(), before.contains(&candidate.hash()));
        prop_assert_eq!(door.granted_hashes(Principal::System).unwrap(), &before);
    }

    #[test]
    fn granting_twice_records_once(credential in arb_credential()) {
        let mut door = door(UseMode::Granting);
        let first = door.verify(&credential);
        let second = door.verify(&credential);

        prop_assert!(first.recorded_hash().is_some());
        prop_assert!(second.recorded_hash().is_none());
        let granted = door.granted_hashes(Principal::System).unwrap();
        prop_assert_eq!(granted.iter().filter(|h| **h == credential.hash()).count(), 1);
    }

    #[test]
    fn denying_refuses_everything(granted in arb_credentials(4)) {
        let mut door = door(UseMode::Granting);
        for credential in &granted {
            door.verify(credential);
        }
        door.set_use_mode(UseMode::Denying);
        for credential in &granted {
            prop_assert_eq!(door.verify(credential), Verification::Denied);
        }
    }

    #[test]
    fn use_always_ends_at_default_policy(
        mode in arb_use_mode(),
        actor in arb_actor(),
        seed in any::<u64>(),
        carried in any::<bool>(),
        uses in 1usize..4,
    ) {
        let mut door = door(mode);
        let mut world = MockWorld::new();
        let token = TokenFactory::seeded(seed).token("token");
        if carried {
            world.give(&actor, &token);
        }
        let supplied = WorldObject::from(token);

        for _ in 0..uses {
            door.on_use(&actor, Some(&supplied), &mut world);
            prop_assert_eq!(door.current_policy(), door.default_policy());
            prop_assert!(!door.is_elevated(&AccessType::traverse()));
        }
    }

    #[test]
    fn repeated_elevation_resets_to_single_clause(credentials in arb_credentials(6)) {
        let mut door = door(UseMode::Allowing);
        let traverse = AccessType::traverse();
        for credential in &credentials {
            door.elevate(&traverse, credential.hash());
        }
        prop_assert_eq!(
            door.current_policy().get(&traverse).map(|expr| expr.len()),
            Some(1 + credentials.len())
        );

        door.reset(&traverse);
        prop_assert_eq!(door.current_policy(), door.default_policy());
    }
}
