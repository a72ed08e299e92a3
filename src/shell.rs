use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::app::App;
use crate::config::Config;
use crate::game::GameSession;
use crate::game::math::MathQuestion;

pub mod commands;

use commands::Commands;

/// The game being played in this shell, if any.
pub struct ActiveGame {
    pub session: GameSession,
    /// Only math has a question generator; other subjects are self-graded.
    pub question: Option<MathQuestion>,
    pub asked_at: Instant,
}

pub struct ShellState {
    pub app: App,
    pub game: Option<ActiveGame>,
    pub call_token: char,
}

pub fn run_shell(config: &Config) -> Result<()> {
    let app = App::open(config)?;
    let mut state = ShellState { app, game: None, call_token: config.call_token };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    writeln!(stdout, "Welcome! Type {}help for a list of commands.", config.call_token)?;
    if let Some(user) = state.app.current_user() {
        writeln!(stdout, "Welcome back, {}!", user.username)?;
    }

    for line in stdin.lock().lines() {
        let line = line.context("Could not read from stdin.")?;
        let content = line.trim();

        if !content.starts_with(config.call_token) || content.chars().count() < 2 {
            continue;
        }

        let response = match Commands::run_command(&mut state, content) {
            Ok(message) => message,
            Err(err) => format!("Error: {err}"),
        };

        if response.is_empty() { continue; }

        if let Err(why) = writeln!(stdout, "{response}") {
            log::error!("Error writing response: {why:?}");
            return Err(why.into());
        }
    }

    log::info!("Input closed, shutting down.");
    Ok(())
}
