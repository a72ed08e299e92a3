use chrono::Utc;

use crate::db::{DBResult, Database, keys};
use crate::models::User;

/// Tracks who is playing. At most one user is logged in at a time, and the
/// login survives restarts until `logout`.
#[derive(Debug, Default)]
pub struct IdentityManager {
    current: Option<User>,
}

impl IdentityManager {
    /// Restores whoever was logged in when the store was last written.
    pub fn load(db: &Database) -> DBResult<Self> {
        let current = db
            .get_value::<User>(keys::CURRENT_USER_KEY)?
            .into_loaded(keys::CURRENT_USER_KEY)
            .filter(|user| !user.username.trim().is_empty());

        if let Some(user) = &current {
            log::info!("Restored login for {}", user.username);
        }

        Ok(Self { current })
    }

    /// Logs in as `username` (trimmed). Blank names are ignored.
    ///
    /// Returns whether a login happened.
    pub fn login(&mut self, db: &Database, username: &str) -> DBResult<bool> {
        let username = username.trim();
        if username.is_empty() {
            log::debug!("[login] Ignoring blank username");
            return Ok(false);
        }

        let user = User {
            username: username.to_string(),
            login_time: Utc::now().timestamp_millis(),
        };
        db.put_value(keys::CURRENT_USER_KEY, &user)?;

        log::info!("{username} logged in.");
        self.current = Some(user);
        Ok(true)
    }

    pub fn logout(&mut self, db: &Database) -> DBResult<()> {
        db.remove(keys::CURRENT_USER_KEY)?;
        if let Some(user) = self.current.take() {
            log::info!("{} logged out.", user.username);
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.current.as_ref().map(|user| user.username.as_str())
    }
}
