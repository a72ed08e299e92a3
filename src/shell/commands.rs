use std::fmt::Write;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use itertools::Itertools;

use crate::game::math::{self, MathQuestion};
use crate::game::power_up::PowerUp;
use crate::game::{DRILL_QUEST_BONUS, GameSession, QUESTION_TIME_SECS, QUEST_INTERVAL, Rules};
use crate::ledger::LeaderboardView;
use crate::models::{ScoreRecord, Subject};
use crate::shell::{ActiveGame, ShellState};

const MAX_CMD_LENGTH: usize = 12;

struct CommandInstance<'a> {
    state: &'a mut ShellState,
    parameters: &'a [&'a str],
}

pub struct Commands;
impl Commands {
    pub fn run_command(state: &mut ShellState, content: &str) -> Result<String> {
        // Split the line (on whitespace) into:
        // - The command (first token)
        // - Its parameters (all tokens afterwards)

        // Skip the call token
        let input = &content[state.call_token.len_utf8()..];
        let split_tokens = input.split_whitespace().collect::<Vec<_>>();
        let Some((&command, parameters)) = split_tokens.split_first() else {
            return Err(anyhow!("Expected a command after '{}'.", state.call_token));
        };

        let mut cmd = CommandInstance { state, parameters };

        let result: String = match command {
               "login" => cmd.login()?,
              "logout" => cmd.logout()?,
              "whoami" => cmd.whoami(),
            "progress" => cmd.progress()?,
                "play" => cmd.play()?,
              "answer" => cmd.answer()?,
             "powerup" => cmd.power_up()?,
                "stop" => cmd.stop(),
                 "top" => cmd.top()?,
               "reset" => cmd.reset()?,
               "admin" => cmd.admin()?,
            "adminout" => cmd.admin_logout()?,
               "users" => cmd.users()?,
              "scores" => cmd.scores()?,
             "deluser" => cmd.delete_user()?,
            "clearall" => cmd.clear_all()?,
                "help" => Self::get_help(cmd.state.call_token),
            _ => {
                if Commands::is_valid_cmd(command) {
                    log::info!("User submitted unknown command: {}", command);
                    return Err(anyhow!(
                        "No such command found: {}, see {}help for commands.",
                        command, cmd.state.call_token
                    ));
                } else {
                    log::info!("User submitted invalid command: {}", command);
                    return Err(anyhow!("Invalid command syntax."));
                }
            }
        };

        Ok(result)
    }
}

impl CommandInstance<'_> {
    fn login(&mut self) -> Result<String> {
        let username = self.parameters.join(" ");
        if !self.state.app.login(&username)? {
            return Err(anyhow!("Please enter a name to log in."));
        }

        // A session belongs to whoever started it.
        self.state.game = None;
        Ok(format!("Welcome, {}!", username.trim()))
    }

    fn logout(&mut self) -> Result<String> {
        let Some(username) = self.state.app.current_user().map(|u| u.username.clone()) else {
            return Ok(String::from("Nobody is logged in."));
        };

        self.state.app.logout()?;
        self.state.game = None;
        Ok(format!("Goodbye, {username}!"))
    }

    fn whoami(&self) -> String {
        match self.state.app.current_user() {
            Some(user) => format!("Logged in as {user}."),
            None => String::from("Playing as guest."),
        }
    }

    fn progress(&self) -> Result<String> {
        let app = &self.state.app;
        let who = app.current_user().map_or("guest", |u| u.username.as_str());

        match self.parameters.first() {
            Some(subject) => {
                let subject: Subject = subject.parse()?;
                Ok(format!("**{who}** {subject}: {}", app.subject_progress(subject)))
            }
            None => Ok(format!("**Progress for {who}:**\n{}", app.progress())),
        }
    }

    fn play(&mut self) -> Result<String> {
        let subject: Subject = self.parameters
            .first()
            .context("Expected a subject to play, got none.")?
            .parse()?;

        let mut game = ActiveGame {
            session: GameSession::new(subject),
            question: None,
            asked_at: Instant::now(),
        };

        let prompt = self.next_prompt(&mut game);
        self.state.game = Some(game);
        Ok(format!("Starting {subject}!\n{prompt}"))
    }

    /// Poses the next question and restarts the clock.
    fn next_prompt(&self, game: &mut ActiveGame) -> String {
        let token = self.state.call_token;
        game.asked_at = Instant::now();

        if game.session.subject == Subject::Math {
            let level = self.state.app.subject_progress(Subject::Math).level;
            let question = math::generate_question(level, &mut rand::rng());
            let prompt = format!("Question {}: {question} = ?  ({token}answer <number>)",
                                 game.session.questions_answered + 1);
            game.question = Some(question);
            prompt
        } else {
            game.question = None;
            let clock = match game.session.rules {
                Rules::Timed => format!("  {QUESTION_TIME_SECS}s on the clock."),
                Rules::Drill => String::new(),
            };
            format!("Question {}: ({token}answer right | {token}answer wrong){clock}",
                    game.session.questions_answered + 1)
        }
    }

    fn answer(&mut self) -> Result<String> {
        let token = self.state.call_token;
        let no_game = || format!("No game in progress. Start one with {token}play <subject>.");

        let given = self.parameters.join(" ");
        let correct = {
            let game = self.state.game.as_ref().with_context(no_game)?;
            match (&game.question, given.trim()) {
                (_, "") => bail!("Expected an answer, got none."),
                (Some(question), given) => question.check(given),
                (None, "right") => true,
                (None, "wrong") => false,
                (None, given) => bail!("Expected `right` or `wrong`, got `{given}`."),
            }
        };

        let mut game = self.state.game.take().with_context(no_game)?;
        let elapsed = game.asked_at.elapsed().as_secs();
        let outcome = game.session.answer(&mut self.state.app, correct, elapsed)?;

        let mut output = String::new();
        if outcome.timed_out {
            writeln!(output, "Time's up! That one counts as a miss.")?;
        } else if outcome.correct && game.session.rules == Rules::Drill {
            writeln!(output, "Correct! +{} coins (streak {}, coins {})",
                     outcome.coins, game.session.streak, game.session.coins)?;
        } else if outcome.correct {
            writeln!(output, "Correct! +{} points (score {}, streak {}, coins {})",
                     outcome.points, game.session.score, game.session.streak, game.session.coins)?;
        } else {
            let reveal = game.question
                .as_ref()
                .map(|q: &MathQuestion| format!(" The answer was {}.", q.answer))
                .unwrap_or_default();
            writeln!(output, "Not quite!{reveal} Try the next one!")?;
        }
        if outcome.quest_completed && game.session.rules == Rules::Drill {
            writeln!(output, "Quest complete! {QUEST_INTERVAL} in a row! +{DRILL_QUEST_BONUS} bonus coins!")?;
        } else if outcome.quest_completed {
            writeln!(output, "Quest complete! {} {} answers correct!",
                     self.state.app.subject_progress(game.session.subject).total_correct,
                     game.session.subject)?;
        }
        if outcome.levelled_up {
            writeln!(output, "LEVEL UP! {}",
                     self.state.app.subject_progress(game.session.subject))?;
        }

        output += &self.next_prompt(&mut game);
        self.state.game = Some(game);
        Ok(output)
    }

    fn power_up(&mut self) -> Result<String> {
        let token = self.state.call_token;
        let game = self.state.game
            .as_mut()
            .with_context(|| format!("No game in progress. Start one with {token}play <subject>."))?;

        let Some(kind) = self.parameters.first() else {
            return Ok(format!("**Power-ups ({} coins):**\n{}", game.session.coins, game.session.power_ups));
        };
        let power_up: PowerUp = kind.parse()?;
        game.session.use_power_up(power_up)?;

        let effect = match power_up {
            PowerUp::Hint => String::from("Hint unlocked! Read the question once more and rule out the odd one."),
            PowerUp::TimeFreeze => String::from("The clock is frozen for 10 seconds."),
            PowerUp::Multiplier => String::from("2x points for the next 3 questions!"),
        };
        Ok(format!("{effect} ({} coins left)", game.session.coins))
    }

    fn stop(&mut self) -> String {
        match self.state.game.take() {
            Some(game) => format!(
                "Game over! {} answered, final score {}, {} coins, {} quests.",
                game.session.questions_answered, game.session.score,
                game.session.coins, game.session.quests_completed
            ),
            None => String::from("No game in progress."),
        }
    }

    fn top(&self) -> Result<String> {
        let view: LeaderboardView = self.parameters.first().copied().unwrap_or("overall").parse()?;
        let title = match view {
            LeaderboardView::Overall => String::from("Top scores"),
            LeaderboardView::Subject(subject) => format!("Top {subject} scores"),
            LeaderboardView::Recent => String::from("Recent achievements"),
        };

        let scores = self.state.app.leaderboard(view)?;
        if scores.is_empty() {
            return Ok(String::from("No scores yet! Be the first to play and earn a spot on the leaderboard!"));
        }

        Ok(format!("**{title}:**\n{}", format_scores(&scores)))
    }

    fn reset(&mut self) -> Result<String> {
        self.state.app.reset_progress()?;
        self.state.game = None;
        Ok(String::from("Progress reset for every subject."))
    }

    fn admin(&mut self) -> Result<String> {
        let (username, password) = self.parameters
            .iter()
            .copied()
            .collect_tuple()
            .with_context(|| format!("Expected usage: `{}admin <username> <password>`",
                                     self.state.call_token))?;

        if self.state.app.admin_login(username, password)? {
            Ok(String::from("Admin access granted."))
        } else {
            Err(anyhow!("Invalid admin credentials."))
        }
    }

    fn admin_logout(&mut self) -> Result<String> {
        self.state.app.admin_logout()?;
        Ok(String::from("Admin access revoked."))
    }

    fn users(&self) -> Result<String> {
        let users = self.state.app.list_users()?;
        if users.is_empty() {
            return Ok(String::from("No players found."));
        }

        let mut output = format!("**Players ({}):**", users.len());
        for entry in users {
            write!(output, "\n{}\n{}", entry.username, entry.progress)?;
        }
        Ok(output)
    }

    fn scores(&self) -> Result<String> {
        let username = self.parameters.join(" ");
        let scores = self.state.app.user_scores(username.trim())?;
        if scores.is_empty() {
            return Ok(format!("No scores for {}.", username.trim()));
        }
        Ok(format!("**Scores for {}:**\n{}", username.trim(), format_scores(&scores)))
    }

    fn delete_user(&mut self) -> Result<String> {
        let username = self.parameters.join(" ");
        let username = username.trim();
        if username.is_empty() {
            bail!("Expected usage: `{}deluser <username>`", self.state.call_token);
        }

        let removed = self.state.app.delete_user(username)?;
        Ok(format!("Deleted {username} and {removed} score(s)."))
    }

    fn clear_all(&mut self) -> Result<String> {
        if self.parameters.first() != Some(&"confirm") {
            bail!("This deletes ALL progress and scores. Run `{}clearall confirm` to proceed.",
                  self.state.call_token);
        }

        let removed = self.state.app.clear_all_data()?;
        self.state.game = None;
        Ok(format!("All data has been cleared ({removed} progress records)."))
    }
}

fn format_scores(scores: &[ScoreRecord]) -> String {
    scores
        .iter()
        .enumerate()
        .map(|(rank, score)| format!("\t{}. {score}", rank + 1))
        .join("\n")
}

/// Non-input helpers
impl Commands {
    /// Ensures that the string slice conforms to C-like identifier regex
    fn is_valid_cmd(s: &str) -> bool {
        s.len() <= MAX_CMD_LENGTH
            && regex::Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$")
                .is_ok_and(|re| re.is_match(s))
    }

    /// Gets a help string. Should be updated after a new command is added
    pub fn get_help(t: char) -> String {
        format!(
            r#"
**Command List:**
`{t}login <name>`:  Log in as a player. Progress is kept per player.
`{t}logout`:  Log out and continue as guest.
`{t}whoami`:  Show who is playing.
`{t}progress [subject]`:  Show level, XP and accuracy.
`{t}play <subject>`:  Start a game (math, reading, science, logic, grammar).
`{t}answer <answer>`:  Answer the current question.
`{t}powerup [hint|freeze|multiplier]`:  List or buy power-ups with game coins (timed games).
`{t}stop`:  End the current game.
`{t}top [overall|recent|subject]`:  Show a leaderboard.
`{t}reset`:  Reset your progress in every subject.
`{t}admin <username> <password>`:  Unlock admin commands for this session.
`{t}adminout`:  Lock admin commands again.
`{t}users`:  [admin] List every player's progress.
`{t}scores <name>`:  [admin] List a player's scores.
`{t}deluser <name>`:  [admin] Delete a player and their scores.
`{t}clearall confirm`:  [admin] Delete all progress and scores.
`{t}help`:  Get information on supported commands
"#,
        )
    }
}
