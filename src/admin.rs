use crate::db::{DBResult, Database, codec, keys};
use crate::ledger;
use crate::models::{SubjectProgress, UserProgressEntry};

// A casual gate for the management commands, not a security boundary.
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "fosteradmin";

const ADMIN_FLAG: &str = "true";

/// Session-scoped admin flag. It lives in the session store, so it ends with
/// the process and is independent of which player is logged in.
#[derive(Debug, Default)]
pub struct AdminGate {
    is_admin: bool,
}

impl AdminGate {
    pub fn load(session: &Database) -> DBResult<Self> {
        let is_admin = session.get(keys::ADMIN_SESSION_KEY)?.as_deref() == Some(ADMIN_FLAG);
        Ok(Self { is_admin })
    }

    /// Exact, case-sensitive comparison. No lockout after failures.
    pub fn login(&mut self, session: &Database, username: &str, password: &str) -> DBResult<bool> {
        if username != ADMIN_USERNAME || password != ADMIN_PASSWORD {
            log::info!("Rejected admin login for '{username}'");
            return Ok(false);
        }

        session.put(keys::ADMIN_SESSION_KEY, ADMIN_FLAG)?;
        self.is_admin = true;
        log::info!("Admin session started.");
        Ok(true)
    }

    pub fn logout(&mut self, session: &Database) -> DBResult<()> {
        session.remove(keys::ADMIN_SESSION_KEY)?;
        if std::mem::take(&mut self.is_admin) {
            log::info!("Admin session ended.");
        }
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

/////*============== ADMINISTRATIVE QUERIES ==============*/
/// Every stored progress record, found by scanning for the progress prefix.
/// Records that cannot be decoded are skipped.
pub fn query_all_user_progress(db: &Database) -> DBResult<Vec<UserProgressEntry>> {
    log::trace!("[query_all_user_progress] Scanning progress records.");

    let entries = db
        .scan_prefix(keys::PROGRESS_PREFIX)?
        .into_iter()
        .filter_map(|(key, raw)| {
            let username = keys::username_from_progress_key(&key)?.to_string();
            let Some(mut progress) = codec::decode::<SubjectProgress>(Some(&raw)).into_loaded(&key)
            else {
                log::error!("[query_all_user_progress] Skipping unreadable progress for '{username}'");
                return None;
            };
            progress.fill_missing();
            Some(UserProgressEntry { username, progress })
        })
        .collect();

    Ok(entries)
}

/// Removes `username`'s progress and every score they hold.
///
/// Returns how many score records were removed.
pub fn delete_user(db: &Database, username: &str) -> DBResult<usize> {
    let had_progress = db.remove(&keys::progress_key(Some(username)))?;
    let removed_scores = ledger::remove_user_scores(db, username)?;

    log::info!("Deleted user {username} (progress: {had_progress}, scores: {removed_scores})");
    Ok(removed_scores)
}

/// Removes every progress record and the whole score ledger.
///
/// Returns how many progress records were removed.
pub fn clear_all_data(db: &Database) -> DBResult<usize> {
    let progress_keys = db.scan_prefix(keys::PROGRESS_PREFIX)?;
    for (key, _) in &progress_keys {
        db.remove(key)?;
    }
    ledger::clear(db)?;

    log::info!("Cleared all data ({} progress records).", progress_keys.len());
    Ok(progress_keys.len())
}
