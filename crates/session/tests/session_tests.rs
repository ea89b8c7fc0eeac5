//! Integration tests for the session controller and refresh engine against
//! a mocked backend.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use incentive_core::store::keys;
use incentive_core::{CredentialStore, MemoryCredentialStore, User};
use incentive_session::{
    LogoutReason, Navigation, SessionConfig, SessionController, SessionEvent,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Unsigned JWT whose `exp` lies `offset_secs` from now. The inspector never
/// verifies signatures, so the fixed signature part is irrelevant.
fn jwt(offset_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({
            "exp": chrono::Utc::now().timestamp() + offset_secs,
            "sub": "u-42",
        }))
        .unwrap(),
    );
    format!("{header}.{payload}.c2ln")
}

fn sample_user() -> User {
    User {
        user_id: "u-42".to_string(),
        email: "msmith@example.com".to_string(),
        roles: vec!["User".to_string()],
    }
}

fn controller(
    server: &MockServer,
    store: Arc<MemoryCredentialStore>,
    refresh_interval_ms: u64,
) -> SessionController {
    let mut config = SessionConfig::new(server.uri());
    config.refresh_interval_ms = refresh_interval_ms;
    SessionController::new(config, store).unwrap()
}

async fn seed_store(store: &MemoryCredentialStore, token: &str, refresh: &str) {
    store.set_auth_token(token).await.unwrap();
    store.set_refresh_token(refresh).await.unwrap();
    store.set_user_data(&sample_user()).await.unwrap();
    store.set_last_login().await.unwrap();
}

async fn mount_login(server: &MockServer, response: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(server)
        .await;
}

async fn refresh_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/Auth/refresh-token")
        .count()
}

async fn wait_for_event(
    rx: &mut tokio::sync::watch::Receiver<SessionEvent>,
    wanted: SessionEvent,
) {
    tokio::time::timeout(Duration::from_secs(3), async {
        while *rx.borrow_and_update() != wanted {
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("event not observed in time");
}

#[tokio::test]
async fn fresh_store_stays_logged_out() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store.clone(), 60_000);

    let navigation = controller.bootstrap().await.unwrap();

    assert_eq!(navigation, Navigation::ToLogin);
    assert!(!controller.is_authenticated());
}

#[tokio::test]
async fn valid_stored_session_is_adopted() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::new());
    seed_store(&store, &jwt(3600), "refresh-1").await;

    let controller = controller(&server, store.clone(), 60_000);
    let mut events = controller.subscribe();

    let navigation = controller.bootstrap().await.unwrap();

    assert_eq!(navigation, Navigation::ToDashboard);
    assert!(controller.is_authenticated());
    assert_eq!(controller.user(), Some(sample_user()));
    wait_for_event(&mut events, SessionEvent::LoggedIn).await;

    // No network traffic for a token outside the expiry buffer.
    assert_eq!(refresh_request_count(&server).await, 0);
}

#[tokio::test]
async fn stale_token_is_refreshed_before_adoption() {
    let server = MockServer::start().await;
    let stale = jwt(-120);
    let fresh = jwt(3600);

    Mock::given(method("POST"))
        .and(path("/Auth/refresh-token"))
        .and(body_json(json!({
            "token": stale,
            "refreshToken": "refresh-old"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": fresh,
            "refreshToken": "refresh-new"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    seed_store(&store, &stale, "refresh-old").await;

    let controller = controller(&server, store.clone(), 60_000);
    let navigation = controller.bootstrap().await.unwrap();

    assert_eq!(navigation, Navigation::ToDashboard);
    assert_eq!(controller.token(), Some(fresh.clone()));

    // The persisted pair was replaced together.
    assert_eq!(store.auth_token().await.unwrap(), Some(fresh));
    assert_eq!(
        store.refresh_token().await.unwrap().as_deref(),
        Some("refresh-new")
    );
    assert_eq!(store.user_data().await.unwrap(), Some(sample_user()));
}

#[tokio::test]
async fn failed_bootstrap_refresh_clears_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("refresh token revoked"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    seed_store(&store, &jwt(-120), "refresh-old").await;

    let controller = controller(&server, store.clone(), 60_000);
    let navigation = controller.bootstrap().await.unwrap();

    assert_eq!(navigation, Navigation::ToLogin);
    assert!(!controller.is_authenticated());
    assert_eq!(store.auth_token().await.unwrap(), None);
    assert_eq!(store.refresh_token().await.unwrap(), None);
    assert_eq!(store.user_data().await.unwrap(), None);
}

#[tokio::test]
async fn corrupt_stored_user_is_treated_as_logged_out() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::new());
    store.set_auth_token(&jwt(3600)).await.unwrap();
    store.set_item(keys::USER, "{definitely not json").await;

    let controller = controller(&server, store.clone(), 60_000);
    let navigation = controller.bootstrap().await.unwrap();

    assert_eq!(navigation, Navigation::ToLogin);
    assert!(!controller.is_authenticated());
    assert_eq!(store.auth_token().await.unwrap(), None);
    assert_eq!(store.item(keys::USER).await, None);
}

#[tokio::test]
async fn login_establishes_and_persists_session() {
    let server = MockServer::start().await;
    let token = jwt(3600);
    mount_login(
        &server,
        json!({
            "token": token,
            "refreshToken": "refresh-1",
            "userId": "u-42",
            "email": "msmith@example.com",
            "roles": ["User", "Approver"]
        }),
    )
    .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store.clone(), 60_000);
    let mut events = controller.subscribe();

    assert!(controller.login("msmith", "hunter2").await.unwrap());

    assert!(controller.is_authenticated());
    let user = controller.user().unwrap();
    assert_eq!(user.user_id, "u-42");
    assert!(user.has_role("Approver"));
    wait_for_event(&mut events, SessionEvent::LoggedIn).await;

    assert_eq!(store.auth_token().await.unwrap(), Some(token));
    assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-1"));
    assert!(store.user_data().await.unwrap().is_some());
    assert!(store.last_login().await.unwrap().is_some());
}

#[tokio::test]
async fn login_fills_in_omitted_response_fields() {
    let server = MockServer::start().await;
    mount_login(&server, json!({ "token": jwt(3600), "refreshToken": "r" })).await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store, 60_000);

    assert!(controller.login("msmith", "hunter2").await.unwrap());

    let user = controller.user().unwrap();
    assert_eq!(user.user_id, "msmith");
    assert_eq!(user.email, "msmith");
    assert_eq!(user.roles, vec!["User"]);
}

#[tokio::test]
async fn rejected_credentials_leave_no_trace() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store.clone(), 60_000);

    assert!(!controller.login("msmith", "wrong").await.unwrap());

    assert!(!controller.is_authenticated());
    assert_eq!(store.auth_token().await.unwrap(), None);
    assert_eq!(store.user_data().await.unwrap(), None);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let server = MockServer::start().await;
    mount_login(&server, json!({ "token": jwt(3600), "refreshToken": "r" })).await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store.clone(), 60_000);
    let mut events = controller.subscribe();

    assert!(controller.login("msmith", "hunter2").await.unwrap());

    controller.logout().await;
    controller.logout().await;

    assert!(!controller.is_authenticated());
    assert_eq!(controller.user(), None);
    assert_eq!(controller.token(), None);
    assert_eq!(store.auth_token().await.unwrap(), None);
    assert_eq!(store.refresh_token().await.unwrap(), None);
    assert_eq!(store.user_data().await.unwrap(), None);
    assert_eq!(store.last_login().await.unwrap(), None);
    wait_for_event(
        &mut events,
        SessionEvent::LoggedOut {
            reason: LogoutReason::UserRequested,
        },
    )
    .await;
}

#[tokio::test]
async fn overlapping_ticks_produce_one_refresh_call() {
    init_tracing();
    let server = MockServer::start().await;
    let stale = jwt(-120);
    let fresh = jwt(3600);

    mount_login(&server, json!({ "token": stale, "refreshToken": "refresh-old" })).await;
    Mock::given(method("POST"))
        .and(path("/Auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "token": fresh,
                    "refreshToken": "refresh-new"
                }))
                // Several 50 ms ticks elapse while this response is pending.
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store.clone(), 50);

    assert!(controller.login("msmith", "hunter2").await.unwrap());
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(refresh_request_count(&server).await, 1);
    assert!(controller.is_authenticated());
    assert_eq!(controller.token(), Some(fresh.clone()));
    assert_eq!(store.auth_token().await.unwrap(), Some(fresh));
    assert_eq!(
        store.refresh_token().await.unwrap().as_deref(),
        Some("refresh-new")
    );
}

#[tokio::test]
async fn failed_background_refresh_forces_logout() {
    init_tracing();
    let server = MockServer::start().await;
    mount_login(&server, json!({ "token": jwt(-120), "refreshToken": "r" })).await;
    Mock::given(method("POST"))
        .and(path("/Auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("refresh token revoked"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store.clone(), 50);
    let mut events = controller.subscribe();

    assert!(controller.login("msmith", "hunter2").await.unwrap());

    wait_for_event(
        &mut events,
        SessionEvent::LoggedOut {
            reason: LogoutReason::SessionExpired,
        },
    )
    .await;

    assert!(!controller.is_authenticated());
    assert_eq!(store.auth_token().await.unwrap(), None);
    assert_eq!(store.user_data().await.unwrap(), None);
}

#[tokio::test]
async fn refresh_completing_after_logout_is_discarded() {
    init_tracing();
    let server = MockServer::start().await;
    mount_login(&server, json!({ "token": jwt(-120), "refreshToken": "r" })).await;
    Mock::given(method("POST"))
        .and(path("/Auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "token": jwt(3600),
                    "refreshToken": "refresh-new"
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store.clone(), 50);

    assert!(controller.login("msmith", "hunter2").await.unwrap());

    // Let a tick start the refresh, then log out while it is in flight.
    tokio::time::sleep(Duration::from_millis(150)).await;
    controller.logout().await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    // The late refresh result must not resurrect the session or the store.
    assert!(!controller.is_authenticated());
    assert_eq!(store.auth_token().await.unwrap(), None);
    assert_eq!(store.refresh_token().await.unwrap(), None);
}

#[tokio::test]
async fn repeated_logins_do_not_stack_timers() {
    init_tracing();
    let server = MockServer::start().await;
    let stale = jwt(-120);

    mount_login(&server, json!({ "token": stale, "refreshToken": "r" })).await;
    // Every refresh hands back another stale token, so each tick refreshes
    // again; a stacked timer would double the call rate.
    Mock::given(method("POST"))
        .and(path("/Auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": jwt(-120),
            "refreshToken": "r"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller(&server, store, 100);

    assert!(controller.login("msmith", "hunter2").await.unwrap());
    assert!(controller.login("msmith", "hunter2").await.unwrap());

    tokio::time::sleep(Duration::from_millis(350)).await;

    // A single 100 ms timer fires ~3 times in 350 ms.
    let calls = refresh_request_count(&server).await;
    assert!((1..=4).contains(&calls), "expected one timer's worth of refreshes, saw {calls}");
}
