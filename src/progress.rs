use crate::db::codec::Decoded;
use crate::db::{DBResult, Database, keys};
use crate::models::{Subject, SubjectProgress, UserProgress};

/// In-memory copy of one player's per-subject progress, written through to
/// the durable store on every change.
///
/// Which record is loaded follows the logged-in user; with nobody logged in
/// the shared guest record is used.
#[derive(Debug)]
pub struct ProgressStore {
    key: String,
    progress: SubjectProgress,
}

impl ProgressStore {
    /// Loads the record for `username` (or the guest), creating it with
    /// defaults when nothing usable is stored.
    pub fn load(db: &Database, username: Option<&str>) -> DBResult<Self> {
        let key = keys::progress_key(username);
        let progress = Self::read(db, &key)?;
        Ok(Self { key, progress })
    }

    fn read(db: &Database, key: &str) -> DBResult<SubjectProgress> {
        log::trace!("[ProgressStore::read] Loading progress from {key}");

        match db.get_value::<SubjectProgress>(key)? {
            Decoded::Loaded(mut progress) => {
                progress.fill_missing();
                Ok(progress)
            }
            // Written by a newer build. Left in place until the player changes something.
            Decoded::Outdated(version) => {
                log::warn!("[ProgressStore::read] {key} has schema version {version}, \
                            playing with defaults without overwriting it");
                Ok(SubjectProgress::default())
            }
            Decoded::Corrupt => {
                log::error!("[ProgressStore::read] Replacing malformed progress under {key}");
                Self::initialize(db, key)
            }
            Decoded::Absent => Self::initialize(db, key),
        }
    }

    fn initialize(db: &Database, key: &str) -> DBResult<SubjectProgress> {
        log::debug!("[ProgressStore::initialize] Initializing default progress under {key}");
        let progress = SubjectProgress::default();
        db.put_value(key, &progress)?;
        Ok(progress)
    }

    /// Points the store at another user's record. The current in-memory copy
    /// is dropped without saving; every change was already written through.
    pub fn switch_user(&mut self, db: &Database, username: Option<&str>) -> DBResult<()> {
        let key = keys::progress_key(username);
        if key == self.key {
            return Ok(());
        }

        log::debug!("[switch_user] Switching progress from {} to {key}", self.key);
        self.progress = Self::read(db, &key)?;
        self.key = key;
        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn progress(&self) -> &SubjectProgress {
        &self.progress
    }

    pub fn subject_progress(&self, subject: Subject) -> UserProgress {
        self.progress.get(subject)
    }

    /// Records a correct answer. Returns `true` if it caused a level-up.
    pub fn add_correct_answer(&mut self, db: &Database, subject: Subject) -> DBResult<bool> {
        let mut updated = self.progress.clone();
        let subject_progress = updated.get_mut(subject);
        let levelled_up = subject_progress.record_correct();

        if levelled_up {
            log::info!("[{}] {subject} level up! Now level {}", self.key, subject_progress.level);
        }

        self.commit(db, updated)?;
        Ok(levelled_up)
    }

    pub fn add_incorrect_answer(&mut self, db: &Database, subject: Subject) -> DBResult<()> {
        let mut updated = self.progress.clone();
        updated.get_mut(subject).record_incorrect();
        self.commit(db, updated)
    }

    /// Puts every subject back to level 1 for the current record.
    pub fn reset_progress(&mut self, db: &Database) -> DBResult<()> {
        log::info!("Resetting progress under {}", self.key);
        self.commit(db, SubjectProgress::default())
    }

    /// Saves the whole mapping, then adopts it. A failed write leaves the
    /// in-memory copy matching what is stored.
    fn commit(&mut self, db: &Database, updated: SubjectProgress) -> DBResult<()> {
        db.put_value(&self.key, &updated)?;
        self.progress = updated;
        Ok(())
    }
}
