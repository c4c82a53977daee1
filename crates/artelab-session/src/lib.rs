//! Client-side session lifecycle: token acquisition, persistence,
//! propagation, and invalidation.
//!
//! The manager is the only component that talks to both the API client and
//! the credential store. Its contact with the local cache is limited to
//! mirroring server identity and attaching the cached avatar locator to a
//! fetched profile. Whether a session exists is decided locally from the
//! stored token; server-side revocation is only discovered lazily, the
//! next time a `/auth/me` call comes back unauthorized.

pub mod error;

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use artelab_client::ApiClient;
use artelab_db::Database;
use artelab_prefs::Preferences;
use artelab_types::api::UserIdentity;

pub use error::SessionError;

/// Where the session state machine currently sits.
///
/// `Unknown` is the process-start state before the first check. `Checking`
/// is transient while the stored token is read. Login/signup land in
/// `Authenticated`; logout and a token-less check land in
/// `Unauthenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Checking,
    Authenticated,
    Unauthenticated,
}

/// Server identity merged with the device-owned avatar locator. The server
/// is authoritative for id/name/email; the device for the avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar_locator: Option<String>,
}

pub struct SessionManager {
    api: ApiClient,
    prefs: Arc<Preferences>,
    db: Arc<Database>,
    state: watch::Sender<SessionState>,
    // Serializes login/signup/fetch: at most one in-flight remote
    // operation per manager.
    op_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(api: ApiClient, prefs: Arc<Preferences>, db: Arc<Database>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            api,
            prefs,
            db,
            state,
            op_lock: Mutex::new(()),
        }
    }

    /// Receiver over the session state, for observers.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Local-only session check: a stored non-empty token counts as an
    /// active session. Never validates the token against the server.
    pub fn check_session(&self) -> SessionState {
        self.state.send_replace(SessionState::Checking);
        let next = if self.prefs.token().is_some_and(|t| !t.is_empty()) {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        };
        self.state.send_replace(next);
        next
    }

    /// Exchange credentials for a session. On success the token and
    /// identity are persisted, the identity is mirrored into the local
    /// cache, and the machine lands in `Authenticated`. On an API failure
    /// it lands in `Unauthenticated` and the error carries a user-facing
    /// message.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, SessionError> {
        let _guard = self.op_lock.lock().await;
        let resp = match self.api.login(email, password).await {
            Ok(resp) => resp,
            Err(e) => {
                self.state.send_replace(SessionState::Unauthenticated);
                return Err(SessionError::login(e));
            }
        };

        self.db
            .sync_identity(resp.user.id, &resp.user.name, &resp.user.email)?;
        self.prefs.save_session(
            resp.user.id,
            &resp.user.email,
            &resp.user.name,
            &resp.auth_token,
        )?;
        self.state.send_replace(SessionState::Authenticated);
        info!(user_id = resp.user.id, "login succeeded");
        Ok(resp.user)
    }

    /// Register a new account; otherwise symmetric to [`login`].
    ///
    /// [`login`]: SessionManager::login
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserIdentity, SessionError> {
        let _guard = self.op_lock.lock().await;
        let resp = match self.api.signup(email, password, name).await {
            Ok(resp) => resp,
            Err(e) => {
                self.state.send_replace(SessionState::Unauthenticated);
                return Err(SessionError::signup(e));
            }
        };

        self.db
            .sync_identity(resp.user.id, &resp.user.name, &resp.user.email)?;
        self.prefs.save_session(
            resp.user.id,
            &resp.user.email,
            &resp.user.name,
            &resp.auth_token,
        )?;
        self.state.send_replace(SessionState::Authenticated);
        info!(user_id = resp.user.id, "signup succeeded");
        Ok(resp.user)
    }

    /// Drop the session. No network call; cannot fail. A failed preference
    /// write is logged and the transition happens regardless.
    pub fn logout(&self) {
        if let Err(e) = self.prefs.clear_session() {
            warn!("failed to persist logout: {e}");
        }
        self.state.send_replace(SessionState::Unauthenticated);
        info!("logged out");
    }

    /// Fetch `/auth/me` and merge in the locally cached avatar locator.
    ///
    /// Requires `Authenticated`; rejected before any network I/O
    /// otherwise. An `Unauthorized` result means the session is stale, but
    /// the state machine does not auto-transition — surfacing that signal
    /// is the observer's job.
    pub async fn fetch_profile(&self) -> Result<Profile, SessionError> {
        if self.current_state() != SessionState::Authenticated {
            return Err(SessionError::NotAuthenticated);
        }

        let _guard = self.op_lock.lock().await;
        let me = self
            .api
            .fetch_current_user()
            .await
            .map_err(SessionError::profile)?;

        self.db.sync_identity(me.id, &me.name, &me.email)?;
        let avatar_locator = self
            .db
            .get_user_by_id(me.id)?
            .and_then(|user| user.avatar_locator);

        Ok(Profile {
            id: me.id,
            email: me.email,
            name: me.name,
            avatar_locator,
        })
    }
}
