use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "quizkeep.db";
pub const DEFAULT_CALL_TOKEN: char = '$';

/// Settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the durable store lives. `$QUIZKEEP_DB`
    pub db_path: PathBuf,
    /// Prefix that marks a line as a command. `$QUIZKEEP_CALL_TOKEN`
    pub call_token: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            call_token: DEFAULT_CALL_TOKEN,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_vars(
            std::env::var("QUIZKEEP_DB").ok(),
            std::env::var("QUIZKEEP_CALL_TOKEN").ok(),
        )
    }

    fn from_vars(db_path: Option<String>, call_token: Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            db_path: db_path
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            call_token: call_token
                .as_deref()
                .and_then(parse_call_token)
                .unwrap_or(defaults.call_token),
        }
    }
}

/// The first character of `raw`. Longer values are truncated with a warning.
fn parse_call_token(raw: &str) -> Option<char> {
    let token = raw.chars().next()?;
    if raw.chars().count() > 1 {
        log::warn!("$QUIZKEEP_CALL_TOKEN not a single character. Truncating to {token}");
    }
    Some(token)
}
