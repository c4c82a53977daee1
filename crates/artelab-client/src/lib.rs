//! REST client for the ArteLab API: signup, login, and fetch-current-user.
//!
//! The stored bearer token is injected into every call except signup and
//! login, pulled at request time from a token provider closure so the
//! client never holds stale credentials. Failures surface immediately;
//! there is no retry logic anywhere here.

pub mod error;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use artelab_types::api::{AuthResponse, LoginRequest, MeResponse, SignupRequest};

pub use error::ApiError;

/// Yields the currently stored auth token, or `None` when logged out.
/// Shared with the credential store; evaluated once per outgoing request.
pub type TokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ApiClient {
    http: Client,
    base_url: String,
    token_provider: TokenProvider,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token_provider: TokenProvider) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Unknown(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            token_provider,
        })
    }

    /// Register a new account. No token is attached; the server returns one.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthResponse, ApiError> {
        debug!(email, "POST /auth/signup");
        let req = self.http.post(format!("{}/auth/signup", self.base_url)).json(
            &SignupRequest {
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
            },
        );
        execute(req, |status| match status {
            StatusCode::CONFLICT => ApiError::Conflict,
            StatusCode::BAD_REQUEST => ApiError::InvalidInput,
            other => ApiError::Server(other.as_u16()),
        })
        .await
    }

    /// Exchange credentials for a token. No token is attached.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        debug!(email, "POST /auth/login");
        let req = self.http.post(format!("{}/auth/login", self.base_url)).json(
            &LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        );
        execute(req, |status| match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            other => ApiError::Server(other.as_u16()),
        })
        .await
    }

    /// Fetch the authenticated user's identity. A missing or empty stored
    /// token is rejected before any network I/O; a server-side rejection of
    /// the token lands in the same `Unauthorized` case.
    pub async fn fetch_current_user(&self) -> Result<MeResponse, ApiError> {
        let token = (self.token_provider)().filter(|t| !t.is_empty());
        let Some(token) = token else {
            return Err(ApiError::Unauthorized);
        };

        debug!("GET /auth/me");
        let req = self
            .http
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(token);
        execute(req, |status| match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            other => ApiError::Server(other.as_u16()),
        })
        .await
    }
}

async fn execute<T, F>(req: RequestBuilder, map_status: F) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    F: FnOnce(StatusCode) -> ApiError,
{
    let resp = req.send().await.map_err(transport_error)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(map_status(status));
    }
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Unknown(e.to_string()))
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_builder() {
        ApiError::Unknown(e.to_string())
    } else {
        ApiError::Connection(e)
    }
}
