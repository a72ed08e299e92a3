use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use chrono::Utc;
use itertools::Itertools;

use crate::db::{DBResult, Database, keys};
use crate::models::{ScoreRecord, Subject, User};

/// Rows shown per leaderboard.
pub const DEFAULT_LIMIT: usize = 10;

/////*============== SCORE LEDGER QUERIES ==============*/
/// Every score ever saved, oldest first. Unreadable ledgers count as empty.
pub fn query_all_scores(db: &Database) -> DBResult<Vec<ScoreRecord>> {
    log::trace!("[query_all_scores] Reading the score ledger.");
    Ok(db
        .get_value::<Vec<ScoreRecord>>(keys::ALL_SCORES_KEY)?
        .into_loaded(keys::ALL_SCORES_KEY)
        .unwrap_or_default())
}

/// Appends `record` to the ledger (read, push, write back).
pub fn append(db: &Database, record: ScoreRecord) -> DBResult<()> {
    log::trace!("[append] Appending {} score for {}", record.subject, record.username);
    let mut scores = query_all_scores(db)?;
    scores.push(record);
    db.put_value(keys::ALL_SCORES_KEY, &scores)
}

/// Saves a score for `user`. Does nothing when nobody is logged in.
///
/// Returns whether a record was written.
pub fn save_score(
    db: &Database,
    user: Option<&User>,
    subject: Subject,
    score: u64,
    level: u32,
    total_correct: u32,
    total_attempts: u32,
) -> DBResult<bool>
{
    let Some(user) = user else {
        log::debug!("[save_score] No user logged in, dropping {subject} score of {score}");
        return Ok(false);
    };

    append(db, ScoreRecord {
        username: user.username.clone(),
        subject,
        score,
        level,
        total_correct,
        total_attempts,
        timestamp: Utc::now().timestamp_millis(),
    })?;

    Ok(true)
}

/// Best score per (player, subject), highest first.
pub fn query_top_scores(db: &Database, limit: usize) -> DBResult<Vec<ScoreRecord>> {
    Ok(top_scores(&query_all_scores(db)?, limit))
}

/// Best score per player in `subject`, highest first.
pub fn query_top_scores_by_subject(
    db: &Database,
    subject: Subject,
    limit: usize
) -> DBResult<Vec<ScoreRecord>>
{
    Ok(top_scores_by_subject(&query_all_scores(db)?, subject, limit))
}

/// Newest records first; a player may appear more than once.
pub fn query_recent_achievements(db: &Database, limit: usize) -> DBResult<Vec<ScoreRecord>> {
    Ok(recent_achievements(&query_all_scores(db)?, limit))
}

/// All of `username`'s records, oldest first.
pub fn query_user_scores(db: &Database, username: &str) -> DBResult<Vec<ScoreRecord>> {
    Ok(query_all_scores(db)?
        .into_iter()
        .filter(|record| record.username == username)
        .collect())
}

/// Drops every record belonging to `username`. Returns how many were removed.
pub fn remove_user_scores(db: &Database, username: &str) -> DBResult<usize> {
    let scores = query_all_scores(db)?;
    let before = scores.len();
    let remaining = scores
        .into_iter()
        .filter(|record| record.username != username)
        .collect::<Vec<_>>();

    db.put_value(keys::ALL_SCORES_KEY, &remaining)?;
    Ok(before - remaining.len())
}

/// Deletes the whole ledger.
pub fn clear(db: &Database) -> DBResult<()> {
    db.remove(keys::ALL_SCORES_KEY)?;
    Ok(())
}

/////*============== AGGREGATION ==============*/
/// Keeps the best record per group and returns the `limit` highest.
///
/// Within a group the earliest of several equal best scores is kept. Groups
/// whose best scores tie are ordered by where the group first shows up in
/// the ledger.
fn best_per_group<K, F>(records: &[&ScoreRecord], limit: usize, group: F) -> Vec<ScoreRecord>
where
    K: Eq + Hash,
    F: Fn(&ScoreRecord) -> K,
{
    // group -> (first seen, best so far)
    let mut best: HashMap<K, (usize, usize)> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        match best.entry(group(*record)) {
            Entry::Vacant(entry) => { entry.insert((idx, idx)); }
            Entry::Occupied(mut entry) => {
                let (_, best_idx) = entry.get_mut();
                if record.score > records[*best_idx].score {
                    *best_idx = idx;
                }
            }
        }
    }

    best.into_values()
        .sorted_unstable()
        .map(|(_, best_idx)| records[best_idx])
        .sorted_by(|a, b| b.score.cmp(&a.score))
        .take(limit)
        .cloned()
        .collect()
}

pub fn top_scores(records: &[ScoreRecord], limit: usize) -> Vec<ScoreRecord> {
    let all = records.iter().collect::<Vec<_>>();
    best_per_group(&all, limit, |record| (record.username.clone(), record.subject))
}

pub fn top_scores_by_subject(records: &[ScoreRecord], subject: Subject, limit: usize) -> Vec<ScoreRecord> {
    let in_subject = records
        .iter()
        .filter(|record| record.subject == subject)
        .collect::<Vec<_>>();
    best_per_group(&in_subject, limit, |record| record.username.clone())
}

/// Records with equal timestamps list the later-appended one first.
pub fn recent_achievements(records: &[ScoreRecord], limit: usize) -> Vec<ScoreRecord> {
    records
        .iter()
        .rev()
        .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp))
        .take(limit)
        .cloned()
        .collect()
}

/// Which leaderboard to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardView {
    Overall,
    Subject(Subject),
    Recent,
}

impl std::str::FromStr for LeaderboardView {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "overall" => Ok(LeaderboardView::Overall),
            "recent" => Ok(LeaderboardView::Recent),
            subject => Ok(LeaderboardView::Subject(subject.parse()?)),
        }
    }
}

pub fn query_leaderboard(db: &Database, view: LeaderboardView) -> DBResult<Vec<ScoreRecord>> {
    match view {
        LeaderboardView::Overall => query_top_scores(db, DEFAULT_LIMIT),
        LeaderboardView::Subject(subject) => query_top_scores_by_subject(db, subject, DEFAULT_LIMIT),
        LeaderboardView::Recent => query_recent_achievements(db, DEFAULT_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, subject: Subject, score: u64, timestamp: i64) -> ScoreRecord {
        ScoreRecord {
            username: username.to_string(),
            subject,
            score,
            level: 1,
            total_correct: 1,
            total_attempts: 1,
            timestamp,
        }
    }

    fn user(username: &str) -> User {
        User { username: username.to_string(), login_time: 0 }
    }

    #[test]
    fn test_save_score_logged_out_is_noop() {
        let db = Database::open_session().unwrap();
        assert!(!save_score(&db, None, Subject::Math, 100, 2, 10, 10).unwrap());
        assert!(query_all_scores(&db).unwrap().is_empty());
        assert_eq!(db.get(keys::ALL_SCORES_KEY).unwrap(), None);
    }

    #[test]
    fn test_save_score_appends_in_order() {
        let db = Database::open_session().unwrap();
        let alice = user("Alice");
        save_score(&db, Some(&alice), Subject::Math, 10, 1, 1, 1).unwrap();
        save_score(&db, Some(&alice), Subject::Math, 30, 1, 2, 2).unwrap();
        save_score(&db, Some(&user("Bob")), Subject::Logic, 20, 1, 1, 3).unwrap();

        let scores = query_all_scores(&db).unwrap();
        assert_eq!(scores.iter().map(|s| s.score).collect::<Vec<_>>(), vec![10, 30, 20]);
        assert_eq!(scores[2].username, "Bob");
        assert_eq!(scores[2].total_attempts, 3);
    }

    #[test]
    fn test_top_scores_one_row_per_user_subject() {
        let records = vec![
            record("alice", Subject::Math, 50, 1),
            record("alice", Subject::Math, 80, 2),
            record("alice", Subject::Logic, 60, 3),
            record("bob", Subject::Math, 70, 4),
            record("bob", Subject::Math, 20, 5),
        ];

        let top = top_scores(&records, DEFAULT_LIMIT);
        let rows = top.iter().map(|r| (r.username.as_str(), r.subject, r.score)).collect::<Vec<_>>();
        assert_eq!(rows, vec![
            ("alice", Subject::Math, 80),
            ("bob", Subject::Math, 70),
            ("alice", Subject::Logic, 60),
        ]);
    }

    #[test]
    fn test_top_scores_respects_limit() {
        let records = (0..25)
            .map(|n| record(&format!("player{n}"), Subject::Reading, n, n as i64))
            .collect::<Vec<_>>();

        let top = top_scores(&records, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].score, 24);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_top_scores_by_subject() {
        let records = vec![
            record("alice", Subject::Math, 40, 1),
            record("alice", Subject::Logic, 99, 2),
            record("bob", Subject::Math, 60, 3),
            record("alice", Subject::Math, 45, 4),
            record("carol", Subject::Math, 10, 5),
        ];

        let top = top_scores_by_subject(&records, Subject::Math, 5);
        assert!(top.iter().all(|r| r.subject == Subject::Math));
        assert_eq!(top.iter().map(|r| (r.username.as_str(), r.score)).collect::<Vec<_>>(),
                   vec![("bob", 60), ("alice", 45), ("carol", 10)]);

        assert_eq!(top_scores_by_subject(&records, Subject::Math, 2).len(), 2);
    }

    #[test]
    fn test_ties_keep_ledger_order() {
        let records = vec![
            record("bob", Subject::Math, 50, 1),
            record("alice", Subject::Math, 50, 2),
            record("bob", Subject::Math, 50, 3),
        ];

        let top = top_scores_by_subject(&records, Subject::Math, DEFAULT_LIMIT);
        assert_eq!(top.iter().map(|r| (r.username.as_str(), r.timestamp)).collect::<Vec<_>>(),
                   vec![("bob", 1), ("alice", 2)]);
    }

    #[test]
    fn test_ties_ordered_by_first_appearance() {
        let records = vec![
            record("alice", Subject::Math, 10, 1),
            record("bob", Subject::Math, 50, 2),
            record("alice", Subject::Math, 50, 3),
        ];

        let top = top_scores_by_subject(&records, Subject::Math, DEFAULT_LIMIT);
        assert_eq!(top.iter().map(|r| (r.username.as_str(), r.timestamp)).collect::<Vec<_>>(),
                   vec![("alice", 3), ("bob", 2)]);

        let overall = top_scores(&records, DEFAULT_LIMIT);
        assert_eq!(overall[0].username, "alice");
    }

    #[test]
    fn test_recent_achievements() {
        let records = vec![
            record("alice", Subject::Math, 1, 100),
            record("bob", Subject::Math, 2, 300),
            record("alice", Subject::Math, 3, 200),
            record("alice", Subject::Logic, 4, 300),
        ];

        let recent = recent_achievements(&records, 3);
        assert_eq!(recent.iter().map(|r| r.score).collect::<Vec<_>>(), vec![4, 2, 3]);
    }

    #[test]
    fn test_remove_user_scores() {
        let db = Database::open_session().unwrap();
        append(&db, record("alice", Subject::Math, 1, 1)).unwrap();
        append(&db, record("bob", Subject::Math, 2, 2)).unwrap();
        append(&db, record("alice", Subject::Logic, 3, 3)).unwrap();

        assert_eq!(remove_user_scores(&db, "alice").unwrap(), 2);
        assert!(query_user_scores(&db, "alice").unwrap().is_empty());
        assert_eq!(query_all_scores(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_ledger_reads_empty() {
        let db = Database::open_session().unwrap();
        db.put(keys::ALL_SCORES_KEY, "[{\"username\":").unwrap();
        assert!(query_all_scores(&db).unwrap().is_empty());
    }

    #[test]
    fn test_leaderboard_view_parsing() {
        assert_eq!("".parse::<LeaderboardView>().unwrap(), LeaderboardView::Overall);
        assert_eq!("Recent".parse::<LeaderboardView>().unwrap(), LeaderboardView::Recent);
        assert_eq!("science".parse::<LeaderboardView>().unwrap(),
                   LeaderboardView::Subject(Subject::Science));
        assert!("art".parse::<LeaderboardView>().is_err());
    }
}
