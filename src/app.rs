use anyhow::{Context, Result, ensure};

use crate::admin::{self, AdminGate};
use crate::config::Config;
use crate::db::{DBResult, Database};
use crate::identity::IdentityManager;
use crate::ledger::{self, LeaderboardView};
use crate::models::{ScoreRecord, Subject, SubjectProgress, User, UserProgress, UserProgressEntry};
use crate::progress::ProgressStore;

/// Application state owned by the front end and passed to whatever needs it.
///
/// Holds both stores and keeps the progress store pointed at the logged-in
/// user: logging in or out reloads progress for the new identity.
pub struct App {
    db: Database,
    session: Database,
    identity: IdentityManager,
    progress: ProgressStore,
    admin: AdminGate,
}

impl App {
    pub fn open(config: &Config) -> Result<Self> {
        let db = Database::open(&config.db_path)
            .with_context(|| format!("Could not open store at {}", config.db_path.display()))?;
        let session = Database::open_session().context("Could not open session store")?;

        Ok(Self::new(db, session)?)
    }

    pub fn new(db: Database, session: Database) -> DBResult<Self> {
        let identity = IdentityManager::load(&db)?;
        let progress = ProgressStore::load(&db, identity.username())?;
        let admin = AdminGate::load(&session)?;

        Ok(Self { db, session, identity, progress, admin })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /////*============== IDENTITY ==============*/
    pub fn login(&mut self, username: &str) -> DBResult<bool> {
        if !self.identity.login(&self.db, username)? {
            return Ok(false);
        }
        self.progress.switch_user(&self.db, self.identity.username())?;
        Ok(true)
    }

    pub fn logout(&mut self) -> DBResult<()> {
        self.identity.logout(&self.db)?;
        self.progress.switch_user(&self.db, None)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.identity.current_user()
    }

    /////*============== PROGRESS ==============*/
    pub fn progress(&self) -> &SubjectProgress {
        self.progress.progress()
    }

    pub fn subject_progress(&self, subject: Subject) -> UserProgress {
        self.progress.subject_progress(subject)
    }

    pub fn add_correct_answer(&mut self, subject: Subject) -> DBResult<bool> {
        self.progress.add_correct_answer(&self.db, subject)
    }

    pub fn add_incorrect_answer(&mut self, subject: Subject) -> DBResult<()> {
        self.progress.add_incorrect_answer(&self.db, subject)
    }

    pub fn reset_progress(&mut self) -> DBResult<()> {
        self.progress.reset_progress(&self.db)
    }

    /////*============== SCORES ==============*/
    pub fn save_score(
        &self,
        subject: Subject,
        score: u64,
        level: u32,
        total_correct: u32,
        total_attempts: u32,
    ) -> DBResult<bool>
    {
        ledger::save_score(&self.db, self.current_user(), subject, score, level,
                           total_correct, total_attempts)
    }

    pub fn all_scores(&self) -> DBResult<Vec<ScoreRecord>> {
        ledger::query_all_scores(&self.db)
    }

    pub fn top_scores(&self, limit: usize) -> DBResult<Vec<ScoreRecord>> {
        ledger::query_top_scores(&self.db, limit)
    }

    pub fn top_scores_by_subject(&self, subject: Subject, limit: usize) -> DBResult<Vec<ScoreRecord>> {
        ledger::query_top_scores_by_subject(&self.db, subject, limit)
    }

    pub fn recent_achievements(&self, limit: usize) -> DBResult<Vec<ScoreRecord>> {
        ledger::query_recent_achievements(&self.db, limit)
    }

    pub fn leaderboard(&self, view: LeaderboardView) -> DBResult<Vec<ScoreRecord>> {
        ledger::query_leaderboard(&self.db, view)
    }

    /////*============== ADMIN ==============*/
    pub fn admin_login(&mut self, username: &str, password: &str) -> DBResult<bool> {
        self.admin.login(&self.session, username, password)
    }

    pub fn admin_logout(&mut self) -> DBResult<()> {
        self.admin.logout(&self.session)
    }

    pub fn is_admin(&self) -> bool {
        self.admin.is_admin()
    }

    pub fn list_users(&self) -> Result<Vec<UserProgressEntry>> {
        ensure!(self.is_admin(), "Admin login required.");
        Ok(admin::query_all_user_progress(&self.db)?)
    }

    pub fn user_scores(&self, username: &str) -> Result<Vec<ScoreRecord>> {
        ensure!(self.is_admin(), "Admin login required.");
        Ok(ledger::query_user_scores(&self.db, username)?)
    }

    /// Deletes `username`'s progress and scores. Returns how many scores went.
    pub fn delete_user(&mut self, username: &str) -> Result<usize> {
        ensure!(self.is_admin(), "Admin login required.");
        let removed = admin::delete_user(&self.db, username)?;
        self.reload_progress()?;
        Ok(removed)
    }

    /// Wipes every progress record and the ledger. Returns how many progress
    /// records were removed.
    pub fn clear_all_data(&mut self) -> Result<usize> {
        ensure!(self.is_admin(), "Admin login required.");
        let removed = admin::clear_all_data(&self.db)?;
        self.reload_progress()?;
        Ok(removed)
    }

    // The active record may just have been deleted underneath us.
    fn reload_progress(&mut self) -> DBResult<()> {
        self.progress = ProgressStore::load(&self.db, self.identity.username())?;
        Ok(())
    }
}
