use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL,
            avatar_locator  TEXT,
            created_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_users_email
            ON users(email);

        CREATE TABLE IF NOT EXISTS artworks (
            id              INTEGER PRIMARY KEY,
            title           TEXT NOT NULL,
            author          TEXT NOT NULL,
            image_locator   TEXT NOT NULL,
            description     TEXT,
            owner_user_id   INTEGER NOT NULL,
            created_at      INTEGER NOT NULL,
            like_count      INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_artworks_owner
            ON artworks(owner_user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
