use quizkeep::admin::{ADMIN_PASSWORD, ADMIN_USERNAME};
use quizkeep::app::App;
use quizkeep::config::Config;
use quizkeep::db::{Database, keys};
use quizkeep::models::{Subject, UserProgress};

fn config(dir: &tempfile::TempDir) -> Config {
    Config {
        db_path: dir.path().join("quizkeep.db"),
        ..Config::default()
    }
}

#[test]
fn login_and_progress_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    {
        let mut app = App::open(&config).unwrap();
        app.login("Alice").unwrap();
        for _ in 0..10 {
            app.add_correct_answer(Subject::Math).unwrap();
        }
        app.add_incorrect_answer(Subject::Reading).unwrap();
        app.save_score(Subject::Math, 100, 2, 10, 10).unwrap();
    }

    let app = App::open(&config).unwrap();
    assert_eq!(app.current_user().map(|u| u.username.as_str()), Some("Alice"));
    assert_eq!(app.subject_progress(Subject::Math), UserProgress {
        level: 2,
        exp: 0,
        exp_to_next_level: 12,
        total_correct: 10,
        total_attempts: 10,
    });
    assert_eq!(app.subject_progress(Subject::Reading).total_attempts, 1);
    assert_eq!(app.all_scores().unwrap().len(), 1);
}

#[test]
fn logout_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    {
        let mut app = App::open(&config).unwrap();
        app.login("Bob").unwrap();
        app.logout().unwrap();
    }

    let app = App::open(&config).unwrap();
    assert!(app.current_user().is_none());
    assert!(!app.save_score(Subject::Logic, 5, 1, 1, 1).unwrap());
}

#[test]
fn admin_session_ends_with_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    {
        let mut app = App::open(&config).unwrap();
        assert!(app.admin_login(ADMIN_USERNAME, ADMIN_PASSWORD).unwrap());
        assert!(app.is_admin());
    }

    let app = App::open(&config).unwrap();
    assert!(!app.is_admin());
    assert!(app.list_users().is_err());
}

#[test]
fn legacy_browser_records_are_readable() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    {
        let db = Database::open(&config.db_path).unwrap();
        db.put(keys::CURRENT_USER_KEY, r#"{"username":"Leif","loginTime":1700000000000}"#).unwrap();
        db.put("he4g_progress_Leif", r#"{
            "math":    {"level":3,"exp":4,"expToNextLevel":14,"totalCorrect":26,"totalAttempts":30},
            "reading": {"level":1,"exp":0,"expToNextLevel":10,"totalCorrect":0,"totalAttempts":0},
            "science": {"level":1,"exp":0,"expToNextLevel":10,"totalCorrect":0,"totalAttempts":0},
            "logic":   {"level":1,"exp":0,"expToNextLevel":10,"totalCorrect":0,"totalAttempts":0}
        }"#).unwrap();
        db.put(keys::ALL_SCORES_KEY, r#"[{"username":"Leif","subject":"logic","score":75,
            "level":1,"totalCorrect":3,"totalAttempts":4,"timestamp":1700000001000}]"#).unwrap();
    }

    let mut app = App::open(&config).unwrap();
    assert_eq!(app.current_user().map(|u| u.username.as_str()), Some("Leif"));
    assert_eq!(app.subject_progress(Subject::Math).level, 3);
    assert_eq!(app.subject_progress(Subject::Grammar), UserProgress::default());
    assert_eq!(app.top_scores_by_subject(Subject::Logic, 10).unwrap()[0].score, 75);

    // The next write upgrades the record to the versioned format.
    app.add_correct_answer(Subject::Math).unwrap();
    let raw = app.db().get("he4g_progress_Leif").unwrap().unwrap();
    assert!(raw.starts_with(r#"{"version":1,"data":"#));
}
