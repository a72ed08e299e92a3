use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Experience granted by a single correct answer.
pub const EXP_PER_CORRECT: u32 = 1;

/// Experience needed to leave level 1. Every level after that needs 20% more.
pub const BASE_EXP_TO_NEXT_LEVEL: u32 = 10;
pub const LEVEL_GROWTH: f64 = 1.2;

/// Experience a player at `level` needs before their next level-up:
/// `floor(10 * 1.2^(level - 1))`.
pub fn exp_to_next_level(level: u32) -> u32 {
    let exponent = level.saturating_sub(1) as i32;
    (BASE_EXP_TO_NEXT_LEVEL as f64 * LEVEL_GROWTH.powi(exponent)).floor() as u32
}

/// Rounded percentage of correct answers, 0 when nothing was attempted.
pub fn accuracy(total_correct: u32, total_attempts: u32) -> u32 {
    if total_attempts == 0 {
        return 0;
    }
    (total_correct as f64 / total_attempts as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Math,
    Reading,
    Science,
    Logic,
    Grammar,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Math,
        Subject::Reading,
        Subject::Science,
        Subject::Logic,
        Subject::Grammar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Math => "math",
            Subject::Reading => "reading",
            Subject::Science => "science",
            Subject::Logic => "logic",
            Subject::Grammar => "grammar",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Unknown subject: {s} (expected one of: {})",
                Subject::ALL.map(|s| s.as_str()).join(", ")))
    }
}

/// The logged-in player. There is no password; the name is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    /// Milliseconds since the unix epoch.
    pub login_time: i64,
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (logged in {})",
            self.username,
            DateTime::from_timestamp_millis(self.login_time).unwrap_or_default()
        )
    }
}

/// Leveling and accuracy state for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub level: u32,
    pub exp: u32,
    pub exp_to_next_level: u32,
    pub total_correct: u32,
    pub total_attempts: u32,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            level: 1,
            exp: 0,
            exp_to_next_level: BASE_EXP_TO_NEXT_LEVEL,
            total_correct: 0,
            total_attempts: 0,
        }
    }
}

impl UserProgress {
    /// Applies a correct answer. Returns `true` if the player levelled up.
    ///
    /// Experience past the threshold carries into the next level, so the
    /// loop only runs more than once if `EXP_PER_CORRECT` outgrows a level.
    pub fn record_correct(&mut self) -> bool {
        self.exp += EXP_PER_CORRECT;
        self.total_correct += 1;
        self.total_attempts += 1;

        let mut levelled_up = false;
        while self.exp >= self.exp_to_next_level {
            self.exp -= self.exp_to_next_level;
            self.level += 1;
            self.exp_to_next_level = exp_to_next_level(self.level);
            levelled_up = true;
        }

        levelled_up
    }

    pub fn record_incorrect(&mut self) {
        self.total_attempts += 1;
    }

    pub fn accuracy(&self) -> u32 {
        accuracy(self.total_correct, self.total_attempts)
    }
}

impl std::fmt::Display for UserProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Level {} | XP {}/{} | {}/{} correct ({}% accuracy)",
            self.level, self.exp, self.exp_to_next_level,
            self.total_correct, self.total_attempts, self.accuracy()
        )
    }
}

/// Per-subject progress for one player.
///
/// Always holds an entry for every `Subject`; a stored mapping missing a
/// subject (written before that subject existed) gets defaults on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectProgress(BTreeMap<Subject, UserProgress>);

impl Default for SubjectProgress {
    fn default() -> Self {
        Self(Subject::ALL.into_iter().map(|s| (s, UserProgress::default())).collect())
    }
}

impl SubjectProgress {
    pub fn get(&self, subject: Subject) -> UserProgress {
        self.0.get(&subject).copied().unwrap_or_default()
    }

    pub fn get_mut(&mut self, subject: Subject) -> &mut UserProgress {
        self.0.entry(subject).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subject, &UserProgress)> {
        self.0.iter().map(|(subject, progress)| (*subject, progress))
    }

    /// Adds default entries for any subject the mapping is missing.
    pub fn fill_missing(&mut self) {
        for subject in Subject::ALL {
            self.0.entry(subject).or_default();
        }
    }
}

impl std::fmt::Display for SubjectProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (subject, progress) in self.iter() {
            writeln!(f, "\t{:<8} {}", subject.as_str(), progress)?;
        }
        Ok(())
    }
}

/// One entry of the score ledger. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub username: String,
    pub subject: Subject,
    pub score: u64,
    pub level: u32,
    pub total_correct: u32,
    pub total_attempts: u32,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
}

impl ScoreRecord {
    pub fn accuracy(&self) -> u32 {
        accuracy(self.total_correct, self.total_attempts)
    }
}

impl std::fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | Level {} | {} pts | {}% accuracy | {}",
            self.username,
            self.subject,
            self.level,
            self.score,
            self.accuracy(),
            DateTime::from_timestamp_millis(self.timestamp)
                .unwrap_or_default()
                .format("%b %-d %H:%M")
        )
    }
}

/// Admin listing entry: whose progress key was found and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgressEntry {
    pub username: String,
    pub progress: SubjectProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_curve() {
        assert_eq!(exp_to_next_level(1), 10);
        assert_eq!(exp_to_next_level(2), 12);
        assert_eq!(exp_to_next_level(3), 14);
        assert_eq!(exp_to_next_level(4), 17);
        assert_eq!(exp_to_next_level(6), 24);
    }

    #[test]
    fn test_ten_correct_answers_level_up_once() {
        let mut progress = UserProgress::default();
        let level_ups = (0..10).filter(|_| progress.record_correct()).count();

        assert_eq!(level_ups, 1);
        assert_eq!(progress, UserProgress {
            level: 2,
            exp: 0,
            exp_to_next_level: 12,
            total_correct: 10,
            total_attempts: 10,
        });
    }

    #[test]
    fn test_incorrect_only_counts_attempt() {
        let mut progress = UserProgress::default();
        progress.record_correct();
        progress.record_incorrect();
        progress.record_incorrect();

        assert_eq!(progress.level, 1);
        assert_eq!(progress.exp, 1);
        assert_eq!(progress.total_correct, 1);
        assert_eq!(progress.total_attempts, 3);
    }

    #[test]
    fn test_exp_stays_below_threshold() {
        let mut progress = UserProgress::default();
        for n in 0..200 {
            if n % 3 == 0 { progress.record_incorrect(); } else { progress.record_correct(); }
            assert!(progress.exp < progress.exp_to_next_level);
            assert!(progress.total_correct <= progress.total_attempts);
        }
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(0, 0), 0);
        assert_eq!(accuracy(2, 3), 67);
        assert_eq!(accuracy(5, 5), 100);
    }

    #[test]
    fn test_subject_parsing() {
        assert_eq!("Math".parse::<Subject>().unwrap(), Subject::Math);
        assert_eq!(" grammar ".parse::<Subject>().unwrap(), Subject::Grammar);
        assert!("history".parse::<Subject>().is_err());
    }

    #[test]
    fn test_subject_progress_serializes_as_lowercase_map() {
        let json = serde_json::to_value(SubjectProgress::default()).unwrap();
        assert_eq!(json["math"]["expToNextLevel"], 10);
        assert_eq!(json["grammar"]["totalAttempts"], 0);
    }

    #[test]
    fn test_fill_missing_subjects() {
        let mut progress: SubjectProgress = serde_json::from_str(
            r#"{"math":{"level":3,"exp":2,"expToNextLevel":14,"totalCorrect":30,"totalAttempts":40}}"#
        ).unwrap();
        progress.fill_missing();

        assert_eq!(progress.get(Subject::Math).level, 3);
        assert_eq!(progress.iter().count(), Subject::ALL.len());
        assert_eq!(progress.get(Subject::Logic), UserProgress::default());
    }
}
