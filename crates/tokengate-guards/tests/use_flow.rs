//! End-to-end use interactions against the in-memory world

use assert_matches::assert_matches;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokengate_core::{
    AccessContext, AccessType, Actor, CredentialHash, GateConfig, GateResult, ObjectId, Principal,
    WorldObject,
};
use tokengate_guards::{
    FeedbackMessage, GuardedResource, SharedResource, SideEffect, TraverseOutcome, UseMode,
    Verification, WorldEffects,
};
use tokengate_testkit::{
    admin, builder, door, init_test_tracing, player, MockWorld, TokenFactory, DOOR_DESTINATION,
};

/// World whose engine dies in the middle of a move
struct CrashingWorld(MockWorld);

impl AccessContext for CrashingWorld {
    fn holds_credential(&self, actor: &Actor, hash: &CredentialHash) -> bool {
        self.0.holds_credential(actor, hash)
    }
}

impl WorldEffects for CrashingWorld {
    fn notify(&mut self, actor: &Actor, text: &str) {
        self.0.notify(actor, text);
    }

    fn move_to(&mut self, _actor: &Actor, destination: ObjectId) -> GateResult<()> {
        panic!("engine crashed while moving to {destination}");
    }
}

fn traverse_clauses(door: &GuardedResource) -> usize {
    door.current_policy()
        .get(&AccessType::traverse())
        .map_or(0, |expr| expr.len())
}

#[test]
fn checking_granting_checking_persists_grant() {
    init_test_tracing();
    let mut door = door(UseMode::Checking);
    let token_a = TokenFactory::seeded(1).token("token A");
    let credential = token_a.credential().unwrap();

    assert_eq!(door.verify(&credential), Verification::Denied);

    door.set_use_mode(UseMode::Granting);
    assert_eq!(
        door.verify(&credential),
        Verification::Granted {
            side_effect: SideEffect::Grant(credential.hash())
        }
    );
    assert!(door
        .granted_hashes(Principal::System)
        .unwrap()
        .contains(&credential.hash()));

    door.set_use_mode(UseMode::Checking);
    assert!(door.verify(&credential).is_granted());
}

#[test]
fn checking_feedback_sequence() {
    init_test_tracing();
    let mut door = door(UseMode::Checking);
    let mut world = MockWorld::new();
    let ada = player(10);
    let token = TokenFactory::seeded(2).token("token");
    world.give(&ada, &token);
    let supplied = WorldObject::from(token);

    assert_eq!(
        door.on_use(&ada, Some(&supplied), &mut world),
        FeedbackMessage::AccessDenied
    );
    assert_eq!(
        world.messages(&ada),
        ["You place your token against the door.", "Access Denied!"]
    );
    assert_eq!(world.location(&ada), None);
}

#[test]
fn granted_token_moves_holder_through_door() {
    init_test_tracing();
    let mut door = door(UseMode::Granting);
    let mut world = MockWorld::new();
    let ada = player(10);
    let token = TokenFactory::seeded(3).token("token");
    world.give(&ada, &token);
    let supplied = WorldObject::from(token);

    assert!(door.on_use(&ada, Some(&supplied), &mut world).is_granted());
    assert_eq!(world.location(&ada), Some(DOOR_DESTINATION));
    assert_eq!(
        world.messages(&ada),
        [
            "You place your token against the door.",
            "This token's key has been added to the list of granted keys.",
            "Access Granted!",
        ]
    );
    assert_eq!(door.current_policy(), door.default_policy());
}

#[test]
fn elevation_adds_exactly_one_clause_until_traversal() {
    let mut door = door(UseMode::Allowing);
    let mut world = MockWorld::new();
    let ada = player(10);
    let token = TokenFactory::seeded(4).token("token");
    world.give(&ada, &token);
    let credential = token.credential().unwrap();

    assert_eq!(traverse_clauses(&door), 1);
    assert!(door.verify(&credential).is_granted());
    door.elevate(&AccessType::traverse(), credential.hash());
    assert_eq!(traverse_clauses(&door), 2);

    assert_eq!(door.traverse(&ada, &mut world), TraverseOutcome::Moved);
    assert_eq!(traverse_clauses(&door), 1);
    assert_eq!(door.current_policy(), door.default_policy());
}

#[test]
fn denying_refuses_previously_granted_token() {
    let mut door = door(UseMode::Granting);
    let mut world = MockWorld::new();
    let ada = player(10);
    let token = TokenFactory::seeded(5).token("token");
    world.give(&ada, &token);
    let supplied = WorldObject::from(token);

    door.on_use(&ada, Some(&supplied), &mut world);
    door.set_use_mode(UseMode::Denying);
    world.place(&ada, ObjectId::new(99));

    assert_eq!(
        door.on_use(&ada, Some(&supplied), &mut world),
        FeedbackMessage::AccessDenied
    );
    assert_eq!(world.location(&ada), Some(ObjectId::new(99)));
    assert_eq!(door.granted_hashes(Principal::System).unwrap().len(), 1);
}

#[test]
fn unset_mode_reports_misconfiguration() {
    let mut door = door(UseMode::Allowing);
    door.set_use_mode_raw("maybe");
    let mut world = MockWorld::new();
    let ada = player(10);
    let token = TokenFactory::seeded(6).token("token");
    world.give(&ada, &token);

    let feedback = door.on_use(&ada, Some(&WorldObject::from(token)), &mut world);

    assert_eq!(feedback, FeedbackMessage::Misconfigured);
    assert_eq!(
        world.last_message(&ada),
        Some("The token reader releases a puff of bluish-gray smoke.")
    );
    assert!(!door.is_elevated(&AccessType::traverse()));
}

#[test]
fn cloned_secret_is_indistinguishable() {
    let mut door = door(UseMode::Granting);
    let original = TokenFactory::seeded(7).token("original");
    let copy = TokenFactory::seeded(7).token("copy");

    door.verify(&original.credential().unwrap());
    door.set_use_mode(UseMode::Checking);
    assert!(door.verify(&copy.credential().unwrap()).is_granted());
}

#[test]
fn builders_walk_through_and_players_are_told_why_not() {
    let mut door = door(UseMode::Checking);
    let mut world = MockWorld::new();
    let bo = builder(20);
    let ada = player(10);

    assert_eq!(door.traverse(&bo, &mut world), TraverseOutcome::Moved);
    assert_eq!(door.traverse(&ada, &mut world), TraverseOutcome::Refused);
    assert_eq!(
        world.last_message(&ada),
        Some("It's locked, but it looks like you can use the door with an identity token.")
    );
}

#[test]
fn blocked_destination_still_resets_policy() {
    let mut door = door(UseMode::Allowing);
    let mut world = MockWorld::new();
    world.block(DOOR_DESTINATION);
    let ada = player(10);
    let token = TokenFactory::seeded(8).token("token");
    world.give(&ada, &token);
    let credential = token.credential().unwrap();

    door.elevate(&AccessType::traverse(), credential.hash());
    assert_matches!(door.traverse(&ada, &mut world), TraverseOutcome::Failed(_));
    assert_eq!(door.current_policy(), door.default_policy());
}

#[test]
fn only_admins_see_granted_keys() {
    let mut door = door(UseMode::Checking);
    let hash = CredentialHash::of(b"some secret");

    let err = door
        .grant_hash(Principal::from(&builder(20)), hash.clone())
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert!(door.granted_hashes(Principal::from(&player(10))).is_err());

    let root = admin(30);
    assert!(door.grant_hash(Principal::from(&root), hash.clone()).unwrap());
    assert!(!door.grant_hash(Principal::from(&root), hash.clone()).unwrap());
    assert!(door
        .granted_hashes(Principal::from(&root))
        .unwrap()
        .contains(&hash));
}

#[test]
fn stale_elevation_is_restored_after_reload() {
    init_test_tracing();
    let mut door = door(UseMode::Checking);
    let token = TokenFactory::seeded(9).token("token");
    let credential = token.credential().unwrap();

    // Process dies between elevation and reset
    door.elevate(&AccessType::traverse(), credential.hash());
    let persisted = serde_json::to_string(&door).unwrap();
    let mut reloaded: GuardedResource = serde_json::from_str(&persisted).unwrap();
    assert!(reloaded.is_elevated(&AccessType::traverse()));

    // The holder could walk straight through the leftover clause
    let mut world = MockWorld::new();
    let ada = player(10);
    world.give(&ada, &token);
    assert!(reloaded.check_access(&ada, &AccessType::traverse(), &world));

    // Any verification closes the window, even a denied one
    assert_eq!(reloaded.verify(&credential), Verification::Denied);
    assert!(!reloaded.is_elevated(&AccessType::traverse()));
    assert!(!reloaded.check_access(&ada, &AccessType::traverse(), &world));
}

#[test]
fn configured_resource_uses_custom_texts_and_locks() {
    let config = GateConfig::from_toml_str(
        r#"
        default_policy = "traverse:perm(Admins);get:all()"
        use_mode = "allowing"

        [messages]
        access_granted = "Welcome."
        "#,
    )
    .unwrap();
    let mut door =
        GuardedResource::from_config(ObjectId::new(5), "vault", ObjectId::new(6), &config).unwrap();
    let mut world = MockWorld::new();
    let bo = builder(20);
    let token = TokenFactory::seeded(10).token("token");
    world.give(&bo, &token);

    assert_eq!(door.traverse(&bo, &mut world), TraverseOutcome::Refused);
    assert!(door.check_access(&bo, &AccessType::get(), &world));

    assert!(door
        .on_use(&bo, Some(&WorldObject::from(token)), &mut world)
        .is_granted());
    assert_eq!(world.messages(&bo).iter().filter(|m| *m == "Welcome.").count(), 1);
    assert_eq!(world.location(&bo), Some(ObjectId::new(6)));
}

#[test]
fn panicking_move_does_not_leave_door_open() {
    init_test_tracing();
    let shared = SharedResource::new(door(UseMode::Allowing));
    let ada = player(10);
    let token = TokenFactory::seeded(12).token("token");
    let supplied = WorldObject::from(token.clone());

    let mut crashing = CrashingWorld(MockWorld::new());
    crashing.0.give(&ada, &token);
    let result = catch_unwind(AssertUnwindSafe(|| {
        shared.on_use(&ada, Some(&supplied), &mut crashing)
    }));
    assert!(result.is_err());

    let snapshot = shared.snapshot();
    assert!(!snapshot.is_elevated(&AccessType::traverse()));
    assert_eq!(snapshot.current_policy(), snapshot.default_policy());

    // Revoking access afterwards must hold for the same token
    shared.with_lock(|door| door.set_use_mode(UseMode::Denying));
    let mut world = MockWorld::new();
    world.give(&ada, &token);
    assert_eq!(
        shared.on_use(&ada, Some(&supplied), &mut world),
        FeedbackMessage::AccessDenied
    );
    assert_eq!(
        shared.with_lock(|door| door.traverse(&ada, &mut world)),
        TraverseOutcome::Refused
    );
    assert_eq!(world.location(&ada), None);
}

#[test]
fn abandoned_elevation_is_dropped_by_next_verification() {
    let mut door = door(UseMode::Denying);
    let ada = player(10);
    let token = TokenFactory::seeded(13).token("token");
    let credential = token.credential().unwrap();
    let mut world = MockWorld::new();
    world.give(&ada, &token);

    // Elevated without the traversal that would reset it
    door.elevate(&AccessType::traverse(), credential.hash());
    assert!(door.check_access(&ada, &AccessType::traverse(), &world));

    assert_eq!(
        door.on_use(&ada, Some(&WorldObject::from(token)), &mut world),
        FeedbackMessage::AccessDenied
    );
    assert!(!door.is_elevated(&AccessType::traverse()));
    assert_eq!(door.traverse(&ada, &mut world), TraverseOutcome::Refused);
}

#[test]
fn persisted_door_without_traverse_base_is_rejected() {
    let mut blob = serde_json::to_value(door(UseMode::Allowing)).unwrap();
    blob["policy"]["default"] = serde_json::json!("get:all()");
    blob["policy"]["current"] = serde_json::json!("get:all()");

    let err = serde_json::from_value::<GuardedResource>(blob.clone()).unwrap_err();
    assert!(err.to_string().contains("traverse"));

    blob["policy"]["default"] = serde_json::json!("traverse:perm(Builders)");
    assert!(serde_json::from_value::<GuardedResource>(blob).is_ok());
}
