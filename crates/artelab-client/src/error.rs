use thiserror::Error;

/// Failure taxonomy for remote calls. Transport problems are kept separate
/// from server-reported errors so callers can give different guidance
/// ("check your connection" vs "wrong password"). No variant triggers a
/// retry anywhere in this client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No connectivity, DNS failure, or timeout.
    #[error("connection failed: {0}")]
    Connection(#[source] reqwest::Error),

    /// Bad credentials, or a missing/empty/rejected token. Expired,
    /// invalid, and absent all collapse to this one case.
    #[error("unauthorized")]
    Unauthorized,

    /// Email already registered (signup only).
    #[error("email already registered")]
    Conflict,

    /// No such account (login only).
    #[error("account not found")]
    NotFound,

    /// Server rejected the request payload shape.
    #[error("invalid request payload")]
    InvalidInput,

    /// Any other non-2xx status.
    #[error("server error (status {0})")]
    Server(u16),

    /// Anything else, including malformed response bodies.
    #[error("unexpected error: {0}")]
    Unknown(String),
}
