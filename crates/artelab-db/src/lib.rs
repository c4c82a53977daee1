pub mod migrations;
pub mod observe;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::info;

/// Local cache of user and artwork rows. Single-process, single-writer:
/// the connection sits behind a mutex and every write bumps a change
/// generation that observable queries listen on.
pub struct Database {
    conn: Mutex<Connection>,
    changed: watch::Sender<u64>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self::wrap(conn))
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            conn: Mutex::new(conn),
            changed,
        }
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Receiver over the change generation; bumps once per committed write.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    pub(crate) fn notify_changed(&self) {
        self.changed.send_modify(|generation| *generation += 1);
    }
}
