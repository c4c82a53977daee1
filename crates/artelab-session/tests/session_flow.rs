//! End-to-end session lifecycle against a mock server: fresh install,
//! login, profile fetch with and without a cached avatar, logout.

use std::sync::Arc;

use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use artelab_client::{ApiClient, ApiError};
use artelab_db::Database;
use artelab_prefs::Preferences;
use artelab_session::{SessionError, SessionManager, SessionState};

struct Harness {
    _dir: TempDir,
    prefs: Arc<Preferences>,
    db: Arc<Database>,
    manager: SessionManager,
}

fn harness(server: &MockServer) -> Harness {
    let dir = TempDir::new().unwrap();
    let prefs = Arc::new(Preferences::open(dir.path().join("prefs.json")));
    let db = Arc::new(Database::open_in_memory().unwrap());

    let token_prefs = prefs.clone();
    let api = ApiClient::new(server.uri(), Arc::new(move || token_prefs.token())).unwrap();

    let manager = SessionManager::new(api, prefs.clone(), db.clone());
    Harness {
        _dir: dir,
        prefs,
        db,
        manager,
    }
}

fn login_body() -> serde_json::Value {
    serde_json::json!({
        "authToken": "T1",
        "user": {"id": 7, "email": "a@b.com", "name": "Ana"}
    })
}

fn me_body() -> serde_json::Value {
    serde_json::json!({"id": 7, "email": "a@b.com", "name": "Ana"})
}

#[tokio::test]
async fn full_session_lifecycle() {
    let server = MockServer::start().await;
    let h = harness(&server);

    // Fresh install: nothing stored.
    assert_eq!(h.manager.check_session(), SessionState::Unauthenticated);

    // Login stores the token and identity.
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(1)
        .mount(&server)
        .await;

    let identity = h.manager.login("a@b.com", "secret1").await.unwrap();
    assert_eq!(identity.id, 7);
    assert_eq!(h.manager.current_state(), SessionState::Authenticated);
    assert_eq!(h.prefs.token().as_deref(), Some("T1"));
    assert_eq!(h.prefs.user_id(), Some(7));

    // Profile fetch carries the bearer token; no cached avatar yet.
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .expect(2)
        .mount(&server)
        .await;

    let profile = h.manager.fetch_profile().await.unwrap();
    assert_eq!(profile.id, 7);
    assert_eq!(profile.avatar_locator, None);

    // The UI stores a new avatar locally; the next merge picks it up.
    h.db.update_avatar_locator(7, Some("file://x.jpg")).unwrap();
    let with_avatar = h.manager.fetch_profile().await.unwrap();
    assert_eq!(with_avatar.avatar_locator.as_deref(), Some("file://x.jpg"));

    // Logout clears everything; the next profile fetch is rejected before
    // any network call (the /auth/me mock has already seen its 2 calls).
    h.manager.logout();
    assert_eq!(h.manager.check_session(), SessionState::Unauthenticated);

    let err = h.manager.fetch_profile().await.unwrap_err();
    assert!(matches!(err, SessionError::NotAuthenticated));
}

#[tokio::test]
async fn login_failure_stays_unauthenticated_with_message() {
    let server = MockServer::start().await;
    let h = harness(&server);
    h.manager.check_session();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = h.manager.login("a@b.com", "wrong").await.unwrap_err();
    assert_eq!(err.user_message(), "Incorrect email or password.");
    assert!(matches!(err.api_error(), Some(ApiError::Unauthorized)));
    assert_eq!(h.manager.current_state(), SessionState::Unauthenticated);
    assert_eq!(h.prefs.token(), None);
}

#[tokio::test]
async fn signup_success_mirrors_identity_into_cache() {
    let server = MockServer::start().await;
    let h = harness(&server);

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(&server)
        .await;

    h.manager.signup("a@b.com", "secret1", "Ana").await.unwrap();

    assert_eq!(h.manager.current_state(), SessionState::Authenticated);
    let cached = h.db.get_user_by_id(7).unwrap().unwrap();
    assert_eq!(cached.name, "Ana");
    assert_eq!(cached.email, "a@b.com");
    assert_eq!(cached.avatar_locator, None);
}

#[tokio::test]
async fn signup_conflict_surfaces_duplicate_email() {
    let server = MockServer::start().await;
    let h = harness(&server);
    h.manager.check_session();

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = h.manager.signup("a@b.com", "secret1", "Ana").await.unwrap_err();
    assert_eq!(err.user_message(), "That email is already registered.");
    assert_eq!(h.manager.current_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn stale_token_surfaces_expired_session_without_transition() {
    let server = MockServer::start().await;
    let h = harness(&server);

    h.prefs.save_session(7, "a@b.com", "Ana", "stale").unwrap();
    assert_eq!(h.manager.check_session(), SessionState::Authenticated);

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = h.manager.fetch_profile().await.unwrap_err();
    assert_eq!(err.user_message(), "Session expired. Sign in again.");

    // Lazy invalidation: the machine stays Authenticated until the
    // observer acts on the signal.
    assert_eq!(h.manager.current_state(), SessionState::Authenticated);
}

#[tokio::test]
async fn profile_refresh_preserves_device_avatar() {
    let server = MockServer::start().await;
    let h = harness(&server);

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 7, "email": "a@b.com", "name": "Ana Maria"
        })))
        .mount(&server)
        .await;

    h.manager.login("a@b.com", "secret1").await.unwrap();
    h.db.update_avatar_locator(7, Some("file://x.jpg")).unwrap();

    // Server renamed the user; avatar stays device-owned.
    let profile = h.manager.fetch_profile().await.unwrap();
    assert_eq!(profile.name, "Ana Maria");
    assert_eq!(profile.avatar_locator.as_deref(), Some("file://x.jpg"));

    let cached = h.db.get_user_by_id(7).unwrap().unwrap();
    assert_eq!(cached.name, "Ana Maria");
    assert_eq!(cached.avatar_locator.as_deref(), Some("file://x.jpg"));
}
