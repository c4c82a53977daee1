//! Composition root: builds the dependency graph at startup and hands it
//! to the UI layer. No global mutable singletons; everything is owned here
//! and shared by `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use artelab_client::ApiClient;
use artelab_db::Database;
use artelab_prefs::Preferences;
use artelab_session::SessionManager;

/// Process configuration, read from the environment with development
/// defaults. An `.env` file is honored if present.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub db_path: PathBuf,
    pub prefs_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://x8ki-letl-twmt.n7.xano.io/api:Rfm_61dW".to_string(),
            db_path: PathBuf::from("artelab.db"),
            prefs_path: PathBuf::from("artelab_prefs.json"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env if present
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("ARTELAB_API_URL").unwrap_or(defaults.api_base_url),
            db_path: std::env::var("ARTELAB_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            prefs_path: std::env::var("ARTELAB_PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.prefs_path),
        }
    }
}

/// The wired-up application core. The session manager holds the API
/// client; the preference store and cache are shared with the UI layer
/// directly (theme setting, avatar updates, home feed queries).
pub struct AppContext {
    pub prefs: Arc<Preferences>,
    pub db: Arc<Database>,
    pub session: Arc<SessionManager>,
}

impl AppContext {
    pub fn init(config: &Config) -> Result<Self> {
        let prefs = Arc::new(Preferences::open(&config.prefs_path));
        let db = Arc::new(Database::open(&config.db_path)?);

        let token_prefs = prefs.clone();
        let api = ApiClient::new(
            config.api_base_url.clone(),
            Arc::new(move || token_prefs.token()),
        )?;

        let session = Arc::new(SessionManager::new(api, prefs.clone(), db.clone()));

        info!(api = %config.api_base_url, "application context initialized");
        Ok(Self { prefs, db, session })
    }
}

/// Install the tracing pipeline. Call once, before `AppContext::init`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artelab=debug".into()),
        )
        .init();
}
