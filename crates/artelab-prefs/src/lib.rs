//! Durable application preferences: the auth token, the signed-in user's
//! identity, and a couple of unrelated settings (theme, last sync).
//!
//! Everything lives in one version-tagged JSON document on disk, mirrored
//! through a `watch` channel so each key can also be consumed as a stream
//! that re-emits on every change. A file that cannot be read or parsed is
//! treated as empty state rather than an error, so a storage hiccup never
//! takes the session layer down with it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use futures_util::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

const PREFS_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("preferences I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preferences lock poisoned")]
    Lock,
}

/// The full persisted preference block. All session fields move together:
/// observers see either the pre-write or post-write state, never a mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefsData {
    pub version: u32,
    pub auth_token: Option<String>,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub is_logged_in: bool,
    pub theme_mode: Option<String>,
    pub last_sync: Option<i64>,
}

impl Default for PrefsData {
    fn default() -> Self {
        Self {
            version: PREFS_VERSION,
            auth_token: None,
            user_id: None,
            user_email: None,
            user_name: None,
            is_logged_in: false,
            theme_mode: None,
            last_sync: None,
        }
    }
}

pub struct Preferences {
    path: PathBuf,
    state: watch::Sender<PrefsData>,
    write_lock: Mutex<()>,
}

impl Preferences {
    /// Open the preference store backed by `path`. Missing, unreadable, or
    /// unparsable files all start from empty state.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = load(&path);
        let (state, _) = watch::channel(data);
        Self {
            path,
            state,
            write_lock: Mutex::new(()),
        }
    }

    // -- Session --

    /// Persist the full session block after a successful login or signup.
    pub fn save_session(
        &self,
        user_id: i64,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), PrefsError> {
        self.edit(|data| {
            data.user_id = Some(user_id);
            data.user_email = Some(email.to_string());
            data.user_name = Some(name.to_string());
            data.auth_token = Some(token.to_string());
            data.is_logged_in = true;
        })?;
        info!(user_id, "session saved");
        Ok(())
    }

    /// Remove the session fields and mark logged-out. Unrelated settings
    /// (theme, last sync) are untouched. The in-memory block clears even
    /// when the disk write fails, so a logout always takes effect for the
    /// running process.
    pub fn clear_session(&self) -> Result<(), PrefsError> {
        let _guard = self.write_lock.lock().map_err(|_| PrefsError::Lock)?;
        let mut next = self.state.borrow().clone();
        next.auth_token = None;
        next.user_id = None;
        next.user_email = None;
        next.user_name = None;
        next.is_logged_in = false;

        let persisted = persist(&self.path, &next);
        self.state.send_replace(next);
        persisted?;
        info!("session cleared");
        Ok(())
    }

    /// Wipe every stored key and delete the backing file. Full-reset path
    /// for diagnostics and tests.
    pub fn clear_all(&self) -> Result<(), PrefsError> {
        let _guard = self.write_lock.lock().map_err(|_| PrefsError::Lock)?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.state.send_replace(PrefsData::default());
        Ok(())
    }

    // -- Settings --

    pub fn set_theme_mode(&self, mode: &str) -> Result<(), PrefsError> {
        self.edit(|data| data.theme_mode = Some(mode.to_string()))
    }

    pub fn set_last_sync(&self, timestamp: i64) -> Result<(), PrefsError> {
        self.edit(|data| data.last_sync = Some(timestamp))
    }

    // -- Point reads --

    pub fn token(&self) -> Option<String> {
        self.state.borrow().auth_token.clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.state.borrow().user_id
    }

    pub fn user_email(&self) -> Option<String> {
        self.state.borrow().user_email.clone()
    }

    pub fn user_name(&self) -> Option<String> {
        self.state.borrow().user_name.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in
    }

    pub fn theme_mode(&self) -> String {
        self.state
            .borrow()
            .theme_mode
            .clone()
            .unwrap_or_else(|| "system".to_string())
    }

    pub fn last_sync(&self) -> Option<i64> {
        self.state.borrow().last_sync
    }

    // -- Streams --

    /// Receiver over the whole preference block.
    pub fn subscribe(&self) -> watch::Receiver<PrefsData> {
        self.state.subscribe()
    }

    pub fn token_stream(&self) -> impl Stream<Item = Option<String>> + Send + 'static {
        self.field_stream(|data| data.auth_token.clone())
    }

    pub fn user_id_stream(&self) -> impl Stream<Item = Option<i64>> + Send + 'static {
        self.field_stream(|data| data.user_id)
    }

    pub fn user_email_stream(&self) -> impl Stream<Item = Option<String>> + Send + 'static {
        self.field_stream(|data| data.user_email.clone())
    }

    pub fn user_name_stream(&self) -> impl Stream<Item = Option<String>> + Send + 'static {
        self.field_stream(|data| data.user_name.clone())
    }

    pub fn is_logged_in_stream(&self) -> impl Stream<Item = bool> + Send + 'static {
        self.field_stream(|data| data.is_logged_in)
    }

    /// Emits the current value of one field, then re-emits on every write
    /// until the store is dropped.
    fn field_stream<T, F>(&self, project: F) -> impl Stream<Item = T> + Send + 'static
    where
        T: Send + 'static,
        F: Fn(&PrefsData) -> T + Send + 'static,
    {
        let mut rx = self.state.subscribe();
        async_stream::stream! {
            loop {
                let value = project(&rx.borrow_and_update());
                yield value;
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    /// Read-modify-write against the current block. The mutated block is
    /// persisted before observers see it; a failed write leaves the old
    /// state visible.
    fn edit<F>(&self, mutate: F) -> Result<(), PrefsError>
    where
        F: FnOnce(&mut PrefsData),
    {
        let _guard = self.write_lock.lock().map_err(|_| PrefsError::Lock)?;
        let mut next = self.state.borrow().clone();
        mutate(&mut next);
        persist(&self.path, &next)?;
        self.state.send_replace(next);
        Ok(())
    }
}

fn load(path: &Path) -> PrefsData {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return PrefsData::default(),
        Err(e) => {
            warn!("failed to read preferences file: {e}");
            return PrefsData::default();
        }
    };

    match serde_json::from_str::<PrefsData>(&raw) {
        Ok(data) if data.version == PREFS_VERSION => data,
        Ok(data) => {
            warn!("unsupported preferences version: {}", data.version);
            PrefsData::default()
        }
        Err(e) => {
            warn!("failed to parse preferences file: {e}");
            PrefsData::default()
        }
    }
}

/// Write the block to a sibling temp file and rename it into place, so a
/// crash mid-write leaves the previous document intact.
fn persist(path: &Path, data: &PrefsData) -> Result<(), PrefsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(data)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        let _ = std::fs::set_permissions(&tmp, perms);
    }

    std::fs::rename(&tmp, path)?;
    Ok(())
}
