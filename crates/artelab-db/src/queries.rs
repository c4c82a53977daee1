use crate::Database;
use anyhow::Result;
use artelab_types::models::{ArtworkRecord, UserRecord};
use artelab_types::now_millis;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a user row. An existing row with the same id is replaced
    /// wholesale.
    pub fn insert_user(&self, user: &UserRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO users (id, name, email, avatar_locator, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.email,
                    user.avatar_locator,
                    user.created_at
                ],
            )?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT id, name, email, avatar_locator, created_at FROM users WHERE id = ?1",
            )?
            .query_row([id], user_from_row)
            .optional()
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT id, name, email, avatar_locator, created_at FROM users
                 WHERE email = ?1 LIMIT 1",
            )?
            .query_row([email], user_from_row)
            .optional()
        })
    }

    pub fn all_users(&self) -> Result<Vec<UserRecord>> {
        self.with_conn(|conn| query_users(conn))
    }

    /// Replace every column of an existing user row.
    pub fn update_user(&self, user: &UserRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET name = ?2, email = ?3, avatar_locator = ?4, created_at = ?5
                 WHERE id = ?1",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.email,
                    user.avatar_locator,
                    user.created_at
                ],
            )?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    /// Point the user's avatar at a new device-local locator. Touches only
    /// that column; repeating the call with the same locator is a no-op
    /// effect-wise.
    pub fn update_avatar_locator(&self, user_id: i64, locator: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET avatar_locator = ?2 WHERE id = ?1",
                rusqlite::params![user_id, locator],
            )?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    /// Mirror server-authoritative identity fields into the cache. Creates
    /// the row when absent; otherwise refreshes name and email without
    /// touching the device-owned avatar locator.
    pub fn sync_identity(&self, id: i64, name: &str, email: &str) -> Result<()> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET name = ?2, email = ?3 WHERE id = ?1",
                rusqlite::params![id, name, email],
            )?;
            if updated == 0 {
                conn.execute(
                    "INSERT INTO users (id, name, email, avatar_locator, created_at)
                     VALUES (?1, ?2, ?3, NULL, ?4)",
                    rusqlite::params![id, name, email, now_millis()],
                )?;
            }
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    pub fn delete_user_by_id(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    pub fn delete_all_users(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users", [])?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    // -- Artworks --

    /// Insert an artwork row. An existing row with the same id is replaced
    /// wholesale.
    pub fn insert_artwork(&self, artwork: &ArtworkRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO artworks
                 (id, title, author, image_locator, description, owner_user_id, created_at, like_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    artwork.id,
                    artwork.title,
                    artwork.author,
                    artwork.image_locator,
                    artwork.description,
                    artwork.owner_user_id,
                    artwork.created_at,
                    artwork.like_count
                ],
            )?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    pub fn get_artwork_by_id(&self, id: i64) -> Result<Option<ArtworkRecord>> {
        self.with_conn(|conn| {
            conn.prepare(&format!("{ARTWORK_SELECT} WHERE id = ?1"))?
                .query_row([id], artwork_from_row)
                .optional()
        })
    }

    pub fn all_artworks(&self) -> Result<Vec<ArtworkRecord>> {
        self.with_conn(|conn| {
            query_artworks(conn, &format!("{ARTWORK_SELECT} ORDER BY created_at DESC"), [])
        })
    }

    pub fn artworks_by_owner(&self, owner_user_id: i64) -> Result<Vec<ArtworkRecord>> {
        self.with_conn(|conn| {
            query_artworks(
                conn,
                &format!("{ARTWORK_SELECT} WHERE owner_user_id = ?1 ORDER BY created_at DESC"),
                [owner_user_id],
            )
        })
    }

    /// Substring match on title, newest first.
    pub fn search_artworks_by_title(&self, query: &str) -> Result<Vec<ArtworkRecord>> {
        self.with_conn(|conn| {
            query_artworks(
                conn,
                &format!(
                    "{ARTWORK_SELECT} WHERE title LIKE '%' || ?1 || '%' ORDER BY created_at DESC"
                ),
                [query],
            )
        })
    }

    pub fn update_artwork(&self, artwork: &ArtworkRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE artworks SET title = ?2, author = ?3, image_locator = ?4,
                 description = ?5, owner_user_id = ?6, created_at = ?7, like_count = ?8
                 WHERE id = ?1",
                rusqlite::params![
                    artwork.id,
                    artwork.title,
                    artwork.author,
                    artwork.image_locator,
                    artwork.description,
                    artwork.owner_user_id,
                    artwork.created_at,
                    artwork.like_count
                ],
            )?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    /// Relative increment in SQL, so concurrent callers never lose updates.
    pub fn increment_like_count(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE artworks SET like_count = like_count + 1 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    pub fn count_artworks_by_owner(&self, owner_user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM artworks WHERE owner_user_id = ?1",
                [owner_user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn delete_artwork_by_id(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM artworks WHERE id = ?1", [id])?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    /// Bulk removal of everything a user owns.
    pub fn delete_artworks_by_owner(&self, owner_user_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM artworks WHERE owner_user_id = ?1",
                [owner_user_id],
            )?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }

    pub fn delete_all_artworks(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM artworks", [])?;
            Ok(())
        })?;
        self.notify_changed();
        Ok(())
    }
}

const ARTWORK_SELECT: &str = "SELECT id, title, author, image_locator, description, \
     owner_user_id, created_at, like_count FROM artworks";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        avatar_locator: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn artwork_from_row(row: &rusqlite::Row) -> rusqlite::Result<ArtworkRecord> {
    Ok(ArtworkRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        image_locator: row.get(3)?,
        description: row.get(4)?,
        owner_user_id: row.get(5)?,
        created_at: row.get(6)?,
        like_count: row.get(7)?,
    })
}

fn query_users(conn: &Connection) -> Result<Vec<UserRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, avatar_locator, created_at FROM users
         ORDER BY created_at DESC",
    )?;
    let rows = stmt
        .query_map([], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_artworks<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<ArtworkRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, artwork_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn user(id: i64, name: &str, email: &str, created_at: i64) -> UserRecord {
        UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
            avatar_locator: None,
            created_at,
        }
    }

    fn artwork(id: i64, title: &str, owner: i64, created_at: i64) -> ArtworkRecord {
        ArtworkRecord {
            id,
            title: title.to_string(),
            author: "Ana".to_string(),
            image_locator: format!("file://art-{id}.jpg"),
            description: None,
            owner_user_id: owner,
            created_at,
            like_count: 0,
        }
    }

    #[test]
    fn insert_replaces_existing_row_wholesale() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&user(1, "Ana", "a@b.com", 100)).unwrap();
        db.insert_user(&user(1, "Bea", "b@c.com", 200)).unwrap();

        let row = db.get_user_by_id(1).unwrap().unwrap();
        assert_eq!(row.name, "Bea");
        assert_eq!(row.email, "b@c.com");
        assert_eq!(db.all_users().unwrap().len(), 1);
    }

    #[test]
    fn avatar_update_is_partial_and_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&user(7, "Ana", "a@b.com", 100)).unwrap();

        db.update_avatar_locator(7, Some("file://x.jpg")).unwrap();
        let row = db.get_user_by_id(7).unwrap().unwrap();
        assert_eq!(row.avatar_locator.as_deref(), Some("file://x.jpg"));
        assert_eq!(row.name, "Ana");

        // Same locator again changes nothing observable.
        db.update_avatar_locator(7, Some("file://x.jpg")).unwrap();
        let again = db.get_user_by_id(7).unwrap().unwrap();
        assert_eq!(again, row);
    }

    #[test]
    fn avatar_update_without_row_is_ok() {
        let db = Database::open_in_memory().unwrap();
        db.update_avatar_locator(99, Some("file://x.jpg")).unwrap();
        assert!(db.get_user_by_id(99).unwrap().is_none());
    }

    #[test]
    fn sync_identity_creates_then_preserves_avatar() {
        let db = Database::open_in_memory().unwrap();

        db.sync_identity(7, "Ana", "a@b.com").unwrap();
        let created = db.get_user_by_id(7).unwrap().unwrap();
        assert_eq!(created.name, "Ana");
        assert_eq!(created.avatar_locator, None);

        db.update_avatar_locator(7, Some("file://x.jpg")).unwrap();
        db.sync_identity(7, "Ana Maria", "a@b.com").unwrap();

        let synced = db.get_user_by_id(7).unwrap().unwrap();
        assert_eq!(synced.name, "Ana Maria");
        assert_eq!(synced.avatar_locator.as_deref(), Some("file://x.jpg"));
    }

    #[test]
    fn lookup_by_email() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&user(1, "Ana", "a@b.com", 100)).unwrap();
        assert_eq!(db.get_user_by_email("a@b.com").unwrap().unwrap().id, 1);
        assert!(db.get_user_by_email("nobody@b.com").unwrap().is_none());
    }

    #[test]
    fn feeds_are_newest_first() {
        let db = Database::open_in_memory().unwrap();
        db.insert_artwork(&artwork(1, "Dawn", 7, 100)).unwrap();
        db.insert_artwork(&artwork(2, "Dusk", 7, 300)).unwrap();
        db.insert_artwork(&artwork(3, "Noon", 8, 200)).unwrap();

        let all: Vec<i64> = db.all_artworks().unwrap().iter().map(|a| a.id).collect();
        assert_eq!(all, vec![2, 3, 1]);

        let owned: Vec<i64> = db
            .artworks_by_owner(7)
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(owned, vec![2, 1]);
    }

    #[test]
    fn title_search_is_substring_match() {
        let db = Database::open_in_memory().unwrap();
        db.insert_artwork(&artwork(1, "Blue Dawn", 7, 100)).unwrap();
        db.insert_artwork(&artwork(2, "Red Dusk", 7, 200)).unwrap();

        let hits = db.search_artworks_by_title("Daw").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
        assert!(db.search_artworks_by_title("Green").unwrap().is_empty());
    }

    #[test]
    fn concurrent_like_increments_are_not_lost() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.insert_artwork(&artwork(1, "Dawn", 7, 100)).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..25 {
                    db.increment_like_count(1).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let row = db.get_artwork_by_id(1).unwrap().unwrap();
        assert_eq!(row.like_count, 200);
    }

    #[test]
    fn delete_by_owner_removes_only_theirs() {
        let db = Database::open_in_memory().unwrap();
        db.insert_artwork(&artwork(1, "Dawn", 7, 100)).unwrap();
        db.insert_artwork(&artwork(2, "Dusk", 7, 200)).unwrap();
        db.insert_artwork(&artwork(3, "Noon", 8, 300)).unwrap();

        db.delete_artworks_by_owner(7).unwrap();

        assert_eq!(db.count_artworks_by_owner(7).unwrap(), 0);
        assert_eq!(db.count_artworks_by_owner(8).unwrap(), 1);
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("artelab.db");

        {
            let db = Database::open(&path).unwrap();
            db.insert_user(&user(7, "Ana", "a@b.com", 100)).unwrap();
            db.update_avatar_locator(7, Some("file://x.jpg")).unwrap();
        }

        let reopened = Database::open(&path).unwrap();
        let row = reopened.get_user_by_id(7).unwrap().unwrap();
        assert_eq!(row.avatar_locator.as_deref(), Some("file://x.jpg"));
    }

    #[test]
    fn clear_tables() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&user(1, "Ana", "a@b.com", 100)).unwrap();
        db.insert_artwork(&artwork(1, "Dawn", 1, 100)).unwrap();

        db.delete_all_artworks().unwrap();
        db.delete_all_users().unwrap();

        assert!(db.all_users().unwrap().is_empty());
        assert!(db.all_artworks().unwrap().is_empty());
    }
}
