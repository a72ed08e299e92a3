//! Storage key layout. Every key shares the application prefix.

pub const APP_PREFIX: &str = "he4g";

pub const PROGRESS_PREFIX: &str = "he4g_progress_";
pub const GUEST_PROGRESS_KEY: &str = "he4g_progress_guest";
pub const ALL_SCORES_KEY: &str = "he4g_all_scores";
pub const CURRENT_USER_KEY: &str = "he4g_current_user";

/// Lives in the session store, not the durable one.
pub const ADMIN_SESSION_KEY: &str = "he4g_admin_session";

/// Key of the progress record for `username`, or the guest record when nobody
/// is logged in.
pub fn progress_key(username: Option<&str>) -> String {
    match username {
        Some(username) => format!("{PROGRESS_PREFIX}{username}"),
        None => GUEST_PROGRESS_KEY.to_string(),
    }
}

/// Inverse of `progress_key`: the username part of a progress key.
pub fn username_from_progress_key(key: &str) -> Option<&str> {
    key.strip_prefix(PROGRESS_PREFIX)
}
