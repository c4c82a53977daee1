pub mod api;
pub mod models;
pub mod state;

/// Current wall-clock time as epoch milliseconds, the timestamp unit used
/// by both the local cache and the remote API.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
