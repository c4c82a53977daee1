/// Lifecycle of an asynchronous operation as observed by a UI layer.
///
/// `Empty` marks an operation that succeeded but produced no data, so list
/// screens can distinguish "nothing yet" from "nothing at all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
    Empty,
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoadState::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadState::Error(_))
    }

    /// The payload, if the operation succeeded.
    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Success(data) => Some(data),
            _ => None,
        }
    }

    /// The user-facing message, if the operation failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadState::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> From<Result<T, String>> for LoadState<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(data) => LoadState::Success(data),
            Err(message) => LoadState::Error(message),
        }
    }
}
