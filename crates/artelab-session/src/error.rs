use artelab_client::ApiError;
use artelab_prefs::PrefsError;
use thiserror::Error;

/// Session operation failure, carrying a short user-facing message.
///
/// The same API taxonomy variant reads differently per operation (a login
/// 401 is a wrong password, a profile 401 is an expired session), so the
/// message is chosen at the call site that knows which operation failed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{message}")]
    Api {
        #[source]
        source: ApiError,
        message: String,
    },

    #[error("no active session")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] PrefsError),

    #[error(transparent)]
    Cache(#[from] anyhow::Error),
}

impl SessionError {
    pub(crate) fn login(source: ApiError) -> Self {
        let message = match &source {
            ApiError::Connection(_) => "Connection error. Check your internet connection.",
            ApiError::Unauthorized => "Incorrect email or password.",
            ApiError::NotFound => "No account exists for that email.",
            ApiError::Unknown(_) => "Unexpected error. Try again.",
            _ => "Server error. Try again later.",
        };
        Self::Api {
            source,
            message: message.to_string(),
        }
    }

    pub(crate) fn signup(source: ApiError) -> Self {
        let message = match &source {
            ApiError::Connection(_) => "Connection error. Check your internet connection.",
            ApiError::Conflict => "That email is already registered.",
            ApiError::InvalidInput => "Invalid data. Check the form fields.",
            ApiError::Unknown(_) => "Unexpected error. Try again.",
            _ => "Server error. Try again later.",
        };
        Self::Api {
            source,
            message: message.to_string(),
        }
    }

    pub(crate) fn profile(source: ApiError) -> Self {
        let message = match &source {
            ApiError::Connection(_) => "Connection error. Check your internet connection.",
            ApiError::Unauthorized => "Session expired. Sign in again.",
            ApiError::Unknown(_) => "Unexpected error. Try again.",
            _ => "Server error. Try again later.",
        };
        Self::Api {
            source,
            message: message.to_string(),
        }
    }

    /// Short text suitable for direct display.
    pub fn user_message(&self) -> &str {
        match self {
            SessionError::Api { message, .. } => message,
            SessionError::NotAuthenticated => "No active session. Sign in first.",
            SessionError::Store(_) | SessionError::Cache(_) => {
                "Local storage error. Try again."
            }
        }
    }

    /// The underlying API failure, when the operation got that far.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}
