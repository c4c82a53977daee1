use serde::{Deserialize, Serialize};

/// A user row in the local cache. `id` is server-assigned and mirrored
/// locally; `avatar_locator` is a device-local reference to the profile
/// image and is never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar_locator: Option<String>,
    pub created_at: i64,
}

/// An artwork row in the local cache, shown on the home feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub image_locator: String,
    pub description: Option<String>,
    pub owner_user_id: i64,
    pub created_at: i64,
    pub like_count: i64,
}
