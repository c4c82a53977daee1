//! Wire types for the ArteLab REST API. Field names follow the server's
//! JSON, which mixes camelCase (`authToken`, `avatarUrl`) and snake_case
//! (`created_at`); serde renames pin the exact shapes.

use serde::{Deserialize, Serialize};

// -- Auth --

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response body shared by `POST /auth/signup` and `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "authToken")]
    pub auth_token: String,
    pub user: UserIdentity,
}

/// Identity block embedded in auth responses.
#[derive(Debug, Clone, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: Option<i64>,
}

// -- Current user --

/// Response body of `GET /auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: Option<i64>,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
}
