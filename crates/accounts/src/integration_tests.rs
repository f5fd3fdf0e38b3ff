//! Full-flow tests wiring the account manager, store, bus, and directory
//! together over the in-memory service.

use std::sync::{Arc, Mutex};

use carecircle_auth::{Action, Capabilities, Role, RouteDecision, UserRecord, routes};
use carecircle_core::UserId;
use carecircle_events::{CrossContextChannel, SessionBus, Topic};
use carecircle_session::{KeyValueStore, MemoryStore, SessionStore};

use crate::api::{ApiClient, ApiError, InMemoryApi};
use crate::directory::UserDirectory;
use crate::manager::{AccountError, SessionManager};

fn record(email: &str, role: Role, contributor: bool, view_only: bool) -> UserRecord {
    let mut record = UserRecord::new(UserId::new(), "Test User", email, role);
    record.is_contributor = contributor;
    record.is_view_only = view_only;
    record
}

fn harness() -> (Arc<InMemoryApi>, SessionManager) {
    let api = Arc::new(InMemoryApi::new());
    let store = SessionStore::new(Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);
    let manager = SessionManager::new(
        Arc::clone(&api) as Arc<dyn ApiClient>,
        store,
        SessionBus::new(),
    );
    (api, manager)
}

#[tokio::test]
async fn login_commits_the_full_session_before_notifying() {
    let (api, manager) = harness();
    api.seed_user(record("root@example.com", Role::admin(), false, false), "secret1");

    let observed = Arc::new(Mutex::new(Vec::<Capabilities>::new()));
    let observed_clone = Arc::clone(&observed);
    let store = manager.store().clone();
    let _sub = manager.bus().subscribe(Topic::UserLoggedIn, move |_| {
        let session = store.read();
        assert!(session.is_authenticated());
        observed_clone
            .lock()
            .expect("lock")
            .push(carecircle_auth::resolve(&session));
    });

    manager.login("root@example.com", "secret1").await.expect("login");

    let observed = observed.lock().expect("lock");
    assert_eq!(observed.as_slice(), &[Capabilities::full()]);
}

#[tokio::test]
async fn failed_login_leaves_the_store_untouched() {
    let (api, manager) = harness();
    api.seed_user(record("ana@example.com", Role::family(), true, false), "secret1");

    let err = manager.login("ana@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AccountError::Api(ApiError::InvalidCredentials)));
    assert!(!manager.session().is_authenticated());
    assert_eq!(manager.capabilities(), Capabilities::read_only());
}

#[tokio::test]
async fn invite_acceptance_then_password_establishes_a_working_login() {
    let (api, manager) = harness();
    api.seed_invite(
        "inv-7",
        record("invited@example.com", Role::caregiver(), true, false),
    );

    let session = manager.accept_invite("inv-7").await.expect("accept invite");
    assert!(session.is_authenticated());

    let err = manager.set_password("short").await.unwrap_err();
    assert!(matches!(
        err,
        AccountError::Domain(carecircle_core::DomainError::Validation(_))
    ));

    let session = manager.set_password("longenough").await.expect("set password");
    assert!(session.is_authenticated());
    assert_eq!(manager.capabilities(), Capabilities::full());

    // The new credentials authenticate on their own.
    api.authenticate("invited@example.com", "longenough")
        .await
        .expect("re-login with the new password");
}

#[tokio::test]
async fn rejected_invite_surfaces_without_touching_the_store() {
    let (_api, manager) = harness();
    let err = manager.accept_invite("no-such-invite").await.unwrap_err();
    assert!(matches!(err, AccountError::Api(ApiError::InvalidInvite)));
    assert!(!manager.session().is_authenticated());
}

#[tokio::test]
async fn set_password_requires_a_session() {
    let (_api, manager) = harness();
    let err = manager.set_password("longenough").await.unwrap_err();
    assert!(matches!(err, AccountError::NotLoggedIn));
}

#[tokio::test]
async fn logout_clears_the_store_and_downgrades_every_view() {
    let (api, manager) = harness();
    api.seed_user(record("root@example.com", Role::admin(), false, false), "secret1");
    manager.login("root@example.com", "secret1").await.expect("login");

    let view = manager.bind_view("users-page");
    assert_eq!(view.capabilities(), Capabilities::full());

    manager.logout().expect("logout");

    assert!(!manager.session().is_authenticated());
    assert_eq!(view.capabilities(), Capabilities::read_only());
    assert!(view.authorize(Action::Delete).is_err());
    assert_eq!(manager.decide_route(routes::HOME), RouteDecision::RenderAuth);
}

#[tokio::test]
async fn view_binding_follows_permission_changes_and_drop_unsubscribes() {
    let (api, manager) = harness();
    let caregiver = record("care@example.com", Role::caregiver(), true, false);
    api.seed_user(caregiver.clone(), "secret1");
    manager.login("care@example.com", "secret1").await.expect("login");

    let view = manager.bind_view("notes-feed");
    assert_eq!(view.capabilities(), Capabilities::full());

    let mut restricted = caregiver.clone();
    restricted.is_view_only = true;
    manager
        .apply_permission_flags(&restricted)
        .expect("apply flags");
    assert_eq!(view.capabilities(), Capabilities::read_only());

    drop(view);
    assert_eq!(manager.bus().subscriber_count(Topic::PermissionsChanged), 0);
    assert_eq!(manager.bus().subscriber_count(Topic::UserLoggedIn), 0);
    assert_eq!(manager.bus().subscriber_count(Topic::StorageChanged), 0);
}

#[tokio::test]
async fn optimistic_toggle_reverts_on_a_network_failure() {
    let (api, manager) = harness();
    api.seed_user(record("root@example.com", Role::admin(), false, false), "secret1");
    let target = record("fam@example.com", Role::family(), false, false);
    let target_id = target.id;
    api.seed_user(target, "secret2");

    manager.login("root@example.com", "secret1").await.expect("login");
    let directory = UserDirectory::new(manager.clone());
    directory.refresh().await.expect("refresh");

    api.fail_next_update();
    let err = directory.set_contributor(target_id, true).await.unwrap_err();
    assert!(matches!(err, AccountError::Api(ApiError::Network(_))));

    let row = directory
        .users()
        .into_iter()
        .find(|u| u.id == target_id)
        .expect("target row");
    assert!(!row.is_contributor, "failed toggle must flip back");
}

#[tokio::test]
async fn failed_toggle_reverts_only_the_toggled_flag() {
    let (api, manager) = harness();
    api.seed_user(record("root@example.com", Role::admin(), false, false), "secret1");
    let target = record("fam@example.com", Role::family(), true, true);
    let target_id = target.id;
    api.seed_user(target, "secret2");

    manager.login("root@example.com", "secret1").await.expect("login");
    let directory = UserDirectory::new(manager.clone());
    directory.refresh().await.expect("refresh");

    api.fail_next_update();
    directory
        .set_view_only(target_id, false)
        .await
        .expect_err("simulated failure");

    let row = directory
        .users()
        .into_iter()
        .find(|u| u.id == target_id)
        .expect("target row");
    assert!(row.is_view_only, "toggled flag reverted");
    assert!(row.is_contributor, "untouched flag preserved");
}

#[tokio::test]
async fn toggling_yourself_updates_your_own_capabilities() {
    let (api, manager) = harness();
    let me = record("care@example.com", Role::caregiver(), true, false);
    let my_id = me.id;
    api.seed_user(me, "secret1");

    manager.login("care@example.com", "secret1").await.expect("login");
    assert_eq!(manager.capabilities(), Capabilities::full());

    let directory = UserDirectory::new(manager.clone());
    directory.refresh().await.expect("refresh");
    directory.set_view_only(my_id, true).await.expect("toggle self");

    assert_eq!(manager.capabilities(), Capabilities::read_only());
}

#[tokio::test]
async fn failed_self_toggle_restores_the_prior_capabilities() {
    let (api, manager) = harness();
    let me = record("care@example.com", Role::caregiver(), true, false);
    let my_id = me.id;
    api.seed_user(me, "secret1");

    manager.login("care@example.com", "secret1").await.expect("login");
    let directory = UserDirectory::new(manager.clone());
    directory.refresh().await.expect("refresh");

    let view = manager.bind_view("notes-feed");
    assert_eq!(view.capabilities(), Capabilities::full());

    api.fail_next_update();
    directory
        .set_view_only(my_id, true)
        .await
        .expect_err("simulated failure");

    assert_eq!(manager.capabilities(), Capabilities::full());
    assert_eq!(view.capabilities(), Capabilities::full());
}

#[tokio::test]
async fn refresh_applies_restrictions_made_elsewhere() {
    let (api, manager) = harness();
    let me = record("care@example.com", Role::caregiver(), true, false);
    let my_id = me.id;
    api.seed_user(me, "secret1");

    let session = manager.login("care@example.com", "secret1").await.expect("login");
    assert_eq!(manager.capabilities(), Capabilities::full());

    // An admin in another context restricts this account.
    let token = session.token.expect("token");
    api.update_user(&token, my_id, &crate::api::UserUpdate::view_only(true))
        .await
        .expect("remote restriction");

    let directory = UserDirectory::new(manager.clone());
    directory.refresh().await.expect("refresh");

    assert_eq!(manager.capabilities(), Capabilities::read_only());
}

#[tokio::test]
async fn remove_deletes_from_the_service_and_the_cache() {
    let (api, manager) = harness();
    api.seed_user(record("root@example.com", Role::admin(), false, false), "secret1");
    let target = record("old@example.com", Role::family(), false, false);
    let target_id = target.id;
    api.seed_user(target, "secret2");

    manager.login("root@example.com", "secret1").await.expect("login");
    let directory = UserDirectory::new(manager.clone());
    directory.refresh().await.expect("refresh");

    directory.remove(target_id).await.expect("remove");
    assert!(directory.users().iter().all(|u| u.id != target_id));
    let listed = directory.refresh().await.expect("refetch");
    assert!(listed.iter().all(|u| u.id != target_id));
}

#[tokio::test]
async fn route_decisions_follow_the_session() {
    let (api, manager) = harness();
    api.seed_user(record("care@example.com", Role::caregiver(), false, false), "secret1");

    assert_eq!(manager.decide_route(routes::HOME), RouteDecision::RenderAuth);
    assert_eq!(
        manager.decide_route(routes::ACCEPT_INVITE),
        RouteDecision::Allow
    );

    manager.login("care@example.com", "secret1").await.expect("login");
    assert_eq!(manager.decide_route(routes::HOME), RouteDecision::Allow);
    assert_eq!(
        manager.decide_route(routes::USERS_ACCOUNT),
        RouteDecision::RedirectHome
    );
}

#[tokio::test]
async fn cross_context_changes_arrive_on_the_next_pump() {
    let api = Arc::new(InMemoryApi::new());
    api.seed_user(record("root@example.com", Role::admin(), false, false), "secret1");

    let shared_kv = Arc::new(MemoryStore::new());
    let channel = Arc::new(CrossContextChannel::new());

    let store_a = SessionStore::new(Arc::clone(&shared_kv) as Arc<dyn KeyValueStore>)
        .with_external(Arc::clone(&channel));
    let store_b = SessionStore::new(Arc::clone(&shared_kv) as Arc<dyn KeyValueStore>)
        .with_external(Arc::clone(&channel));
    let _watcher_a = channel.attach(store_a.context());
    let watcher_b = channel.attach(store_b.context());

    let manager_a = SessionManager::new(
        Arc::clone(&api) as Arc<dyn ApiClient>,
        store_a,
        SessionBus::new(),
    );
    let manager_b = SessionManager::new(
        Arc::clone(&api) as Arc<dyn ApiClient>,
        store_b,
        SessionBus::new(),
    );

    let view_b = manager_b.bind_view("home");
    assert_eq!(view_b.capabilities(), Capabilities::read_only());

    manager_a.login("root@example.com", "secret1").await.expect("login");

    // Context B has not pumped yet; its view still shows the old state.
    assert_eq!(view_b.capabilities(), Capabilities::read_only());

    let pumped = manager_b.pump_external(&watcher_b).expect("pump");
    assert_eq!(pumped, 1);
    assert_eq!(view_b.capabilities(), Capabilities::full());
}
