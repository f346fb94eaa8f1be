//! End-to-end tests for the sign-up engine command surface.
//!
//! Exercises lifecycle transitions, surface registration rules, broadcast
//! partial failures and tenant isolation through the public API, with a
//! recording mock transport standing in for the messaging system.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use muster_engine::EngineError;
use muster_test_utils::fixtures::engine_with_mock;

const TENANT: &str = "guild-1";
const SIGNUP: &str = "raid-night";

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn create_rejects_duplicate_ids() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();

    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    let err = engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists(_)));
}

#[tokio::test]
async fn delete_unknown_signup_is_not_found() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();

    let err = engine.delete(TENANT, SIGNUP).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn open_twice_is_invalid_state() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();

    engine.open(TENANT, SIGNUP).await.unwrap();
    let err = engine.open(TENANT, SIGNUP).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn close_requires_open() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();

    let err = engine.close(TENANT, SIGNUP).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn delete_is_legal_while_open() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    engine.delete(TENANT, SIGNUP).await.unwrap();

    // The id is free again.
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
}

// ============================================================================
// Surface registration
// ============================================================================

#[tokio::test]
async fn surface_edits_are_rejected_while_open() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    let err = engine.add_surface(TENANT, SIGNUP, "events").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = engine
        .remove_surface(TENANT, SIGNUP, "general")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn removing_unregistered_surface_fails() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();

    let err = engine
        .remove_surface(TENANT, SIGNUP, "general")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotRegistered(_)));
}

#[tokio::test]
async fn surface_added_while_closed_is_mirrored_on_next_open() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();

    engine.open(TENANT, SIGNUP).await.unwrap();
    engine.close(TENANT, SIGNUP).await.unwrap();

    engine.add_surface(TENANT, SIGNUP, "events").await.unwrap();
    let outcome = engine.open(TENANT, SIGNUP).await.unwrap();
    assert_eq!(outcome.mirrored, 2);

    assert_eq!(transport.handles_for("events").len(), 1);
}

// ============================================================================
// Broadcast and partial failure
// ============================================================================

#[tokio::test]
async fn open_posts_empty_rendering_to_every_surface() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "events").await.unwrap();

    let outcome = engine.open(TENANT, SIGNUP).await.unwrap();
    assert_eq!(outcome.mirrored, 2);
    assert_eq!(outcome.failed, 0);
    assert!(outcome.is_full_success());

    let posts = transport.posts();
    assert_eq!(posts.len(), 2);
    for post in posts {
        assert_eq!(post.text, "Friday raid\nBe the first to sign up!");
    }
}

#[tokio::test]
async fn failed_surface_is_omitted_from_mirrors() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "flaky").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "stable").await.unwrap();
    transport.fail_surface("flaky");

    let outcome = engine.open(TENANT, SIGNUP).await.unwrap();
    assert_eq!(outcome.mirrored, 1);
    assert_eq!(outcome.failed, 1);

    // A subsequent join updates only the surviving mirror, even though
    // the flaky surface has recovered.
    transport.restore_surface("flaky");
    let refresh = engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    assert_eq!(refresh.updated, 1);
    assert_eq!(refresh.failed, 0);

    let stable_handles = transport.handles_for("stable");
    assert_eq!(stable_handles.len(), 1);
    let updates = transport.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates.first().unwrap().handle, *stable_handles.first().unwrap());
}

#[tokio::test]
async fn join_renders_membership_in_first_join_order() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Game Night").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    let refresh = engine.join(TENANT, SIGNUP, "bob").await.unwrap();
    assert_eq!(refresh.members, vec!["alice".to_string(), "bob".to_string()]);

    let last = transport.updates().pop().unwrap();
    assert_eq!(last.text, "Game Night\nSigned up:\n* @alice\n* @bob");
}

#[tokio::test]
async fn unresolvable_mention_falls_back_to_raw_reference() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Game Night").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();
    transport.fail_mention("ghost");

    engine.join(TENANT, SIGNUP, "ghost").await.unwrap();

    let last = transport.updates().pop().unwrap();
    assert_eq!(last.text, "Game Night\nSigned up:\n* ghost");
}

// Paused clock: the runtime auto-advances past the delivery timeout as
// soon as the hung delivery is the only thing left to wait for.
#[tokio::test(start_paused = true)]
async fn hung_post_times_out_as_surface_failure() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "tarpit").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "stable").await.unwrap();
    transport.hang_surface("tarpit");

    let outcome = engine.open(TENANT, SIGNUP).await.unwrap();
    assert_eq!(outcome.mirrored, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(transport.handles_for("tarpit").len(), 0);
}

#[tokio::test(start_paused = true)]
async fn hung_update_does_not_roll_back_membership() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    let handle = transport.handles_for("general").pop().unwrap();
    transport.hang_handle(&handle);

    let refresh = engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    assert_eq!(refresh.members, vec!["alice".to_string()]);
    assert_eq!(refresh.updated, 0);
    assert_eq!(refresh.failed, 1);
}

#[tokio::test]
async fn failed_update_is_counted_not_fatal() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "events").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    let general_handle = transport.handles_for("general").pop().unwrap();
    transport.fail_handle(&general_handle);

    let refresh = engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    assert_eq!(refresh.members, vec!["alice".to_string()]);
    assert_eq!(refresh.updated, 1);
    assert_eq!(refresh.failed, 1);
}

// ============================================================================
// Membership semantics
// ============================================================================

#[tokio::test]
async fn join_is_idempotent() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    let refresh = engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    assert_eq!(refresh.members, vec!["alice".to_string()]);
}

#[tokio::test]
async fn leave_is_safe_on_absent_participant() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    let refresh = engine.leave(TENANT, SIGNUP, "bob").await.unwrap();
    assert_eq!(refresh.members, vec!["alice".to_string()]);
}

#[tokio::test]
async fn join_on_closed_signup_is_not_found() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();

    let err = engine.join(TENANT, SIGNUP, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn reopen_resets_members_and_mints_fresh_mirrors() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();

    engine.open(TENANT, SIGNUP).await.unwrap();
    engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    engine.close(TENANT, SIGNUP).await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    let refresh = engine.resync(TENANT, SIGNUP).await.unwrap();
    assert!(refresh.members.is_empty());

    // Two distinct posts on the surface: the old message is abandoned,
    // never edited again.
    let handles = transport.handles_for("general");
    assert_eq!(handles.len(), 2);
    assert_ne!(handles.first(), handles.last());

    engine.join(TENANT, SIGNUP, "bob").await.unwrap();
    let old_handle = handles.first().unwrap();
    let new_handle = handles.last().unwrap();
    // The old mirror saw only the pre-close join; the resync and the new
    // join both edit the fresh mirror.
    assert_eq!(transport.updates_for(old_handle).len(), 1);
    assert_eq!(transport.updates_for(new_handle).len(), 2);
}

// ============================================================================
// Resync
// ============================================================================

#[tokio::test]
async fn resync_repushes_current_snapshot_to_all_mirrors() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "events").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();
    engine.join(TENANT, SIGNUP, "alice").await.unwrap();

    let before = transport.update_count();
    let refresh = engine.resync(TENANT, SIGNUP).await.unwrap();
    assert_eq!(refresh.members, vec!["alice".to_string()]);
    assert_eq!(refresh.updated, 2);
    assert_eq!(transport.update_count(), before + 2);
}

#[tokio::test]
async fn resync_requires_open() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();

    let err = engine.resync(TENANT, SIGNUP).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

// ============================================================================
// Tenants and listing
// ============================================================================

#[tokio::test]
async fn list_signups_reports_surface_count_and_state() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();

    engine.create(TENANT, "game-night", "Board games").await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "general").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "events").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    let summaries = engine.list_signups(TENANT).await.unwrap();
    assert_eq!(summaries.len(), 2);

    let game = summaries.iter().find(|s| s.id == "game-night").unwrap();
    assert_eq!(game.surface_count, 0);
    assert!(!game.is_open);

    let raid = summaries.iter().find(|s| s.id == SIGNUP).unwrap();
    assert_eq!(raid.surface_count, 2);
    assert!(raid.is_open);
}

#[tokio::test]
async fn tenants_are_isolated() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant("guild-1").await.unwrap();
    engine.create_tenant("guild-2").await.unwrap();

    engine.create("guild-1", SIGNUP, "Friday raid").await.unwrap();

    // Same id is free in the other tenant.
    engine.create("guild-2", SIGNUP, "Other raid").await.unwrap();

    assert_eq!(engine.list_signups("guild-1").await.unwrap().len(), 1);
    assert_eq!(engine.list_signups("guild-2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_tenant_removes_every_signup() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.open(TENANT, SIGNUP).await.unwrap();

    assert!(engine.delete_tenant(TENANT).await.unwrap());

    let err = engine.join(TENANT, SIGNUP, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = engine.open(TENANT, SIGNUP).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = engine.list_signups(TENANT).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn reset_tenant_clears_signups_but_keeps_tenant() {
    let (engine, _transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();

    engine.reset_tenant(TENANT).await.unwrap();

    assert!(engine.list_signups(TENANT).await.unwrap().is_empty());
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn metrics_track_open_signups_and_members() {
    let (engine, transport) = engine_with_mock();
    engine.create_tenant(TENANT).await.unwrap();
    engine.create(TENANT, SIGNUP, "Friday raid").await.unwrap();
    engine.add_surface(TENANT, SIGNUP, "flaky").await.unwrap();
    transport.fail_surface("flaky");

    engine.open(TENANT, SIGNUP).await.unwrap();
    engine.join(TENANT, SIGNUP, "alice").await.unwrap();
    engine.join(TENANT, SIGNUP, "bob").await.unwrap();
    engine.leave(TENANT, SIGNUP, "alice").await.unwrap();

    let snapshot = engine.metrics();
    assert_eq!(snapshot.open_signups, 1);
    assert_eq!(snapshot.members, 1);
    assert_eq!(snapshot.mirror_failures, 1);

    engine.close(TENANT, SIGNUP).await.unwrap();
    let snapshot = engine.metrics();
    assert_eq!(snapshot.open_signups, 0);
    assert_eq!(snapshot.members, 0);
}
