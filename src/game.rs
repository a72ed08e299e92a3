use crate::app::App;
use crate::db::DBResult;
use crate::models::Subject;

pub mod math;
pub mod power_up;

use power_up::{Inventory, MULTIPLIER_FACTOR, MULTIPLIER_QUESTIONS, PowerUp, PowerUpError, TIME_FREEZE_SECS};

/// Seconds on the clock for each question.
pub const QUESTION_TIME_SECS: u32 = 30;
/// A quest completes every time this many answers have gone right.
pub const QUEST_INTERVAL: u32 = 5;
/// Coins for every correct drill answer.
pub const DRILL_COINS: u64 = 10;
/// Extra coins for a drill quest.
pub const DRILL_QUEST_BONUS: u64 = 50;

/// Points for a correct answer: `(10 * level + 5 * streak + time_left / 3) * multiplier`.
///
/// `level` and `streak` are the values before the answer is counted.
pub fn points_for(level: u32, streak: u32, time_left_secs: u32, multiplier: u32) -> u64 {
    let base = 10 * level as u64;
    let streak_bonus = 5 * streak as u64;
    let time_bonus = (time_left_secs.min(QUESTION_TIME_SECS) / 3) as u64;
    (base + streak_bonus + time_bonus) * multiplier as u64
}

/// How a subject's game is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rules {
    /// Against the clock. Correct answers score points and coins, the running
    /// score goes on the leaderboard, and coins buy power-ups. A quest
    /// completes whenever the subject's correct total reaches a multiple of
    /// [`QUEST_INTERVAL`].
    Timed,
    /// Untimed practice. A flat [`DRILL_COINS`] per correct answer and a
    /// [`DRILL_QUEST_BONUS`] for every [`QUEST_INTERVAL`] in a row. Nothing
    /// is saved to the leaderboard.
    Drill,
}

impl Rules {
    pub fn for_subject(subject: Subject) -> Self {
        match subject {
            Subject::Math | Subject::Grammar => Rules::Drill,
            Subject::Reading | Subject::Science | Subject::Logic => Rules::Timed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub timed_out: bool,
    pub points: u64,
    pub coins: u64,
    pub levelled_up: bool,
    pub quest_completed: bool,
    /// Whether the running score was written to the ledger.
    pub score_saved: bool,
}

impl AnswerOutcome {
    fn missed(timed_out: bool) -> Self {
        Self {
            correct: false,
            timed_out,
            points: 0,
            coins: 0,
            levelled_up: false,
            quest_completed: false,
            score_saved: false,
        }
    }
}

/// One sitting of one subject.
///
/// The session keeps its own score, streak and coins; every answer is also
/// counted in the player's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub subject: Subject,
    pub rules: Rules,
    pub score: u64,
    pub streak: u32,
    pub coins: u64,
    pub questions_answered: u32,
    pub quests_completed: u32,
    pub power_ups: Inventory,
    // Current question only.
    hint_shown: bool,
    frozen_secs: u32,
    multiplier_questions_left: u32,
}

impl GameSession {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            rules: Rules::for_subject(subject),
            score: 0,
            streak: 0,
            coins: 0,
            questions_answered: 0,
            quests_completed: 0,
            power_ups: Inventory::default(),
            hint_shown: false,
            frozen_secs: 0,
            multiplier_questions_left: 0,
        }
    }

    pub fn multiplier(&self) -> u32 {
        if self.multiplier_questions_left > 0 { MULTIPLIER_FACTOR } else { 1 }
    }

    pub fn hint_shown(&self) -> bool {
        self.hint_shown
    }

    /// Seconds left on the clock `elapsed_secs` after the question was asked,
    /// not counting frozen time.
    pub fn time_left(&self, elapsed_secs: u64) -> u32 {
        let counted = elapsed_secs
            .saturating_sub(self.frozen_secs as u64)
            .min(QUESTION_TIME_SECS as u64) as u32;
        QUESTION_TIME_SECS - counted
    }

    /// Spends coins on a power-up and applies it.
    pub fn use_power_up(&mut self, power_up: PowerUp) -> Result<(), PowerUpError> {
        if self.rules != Rules::Timed {
            return Err(PowerUpError::NotAvailable(self.subject));
        }
        if self.power_ups.uses_left(power_up) == 0 {
            return Err(PowerUpError::Exhausted(power_up));
        }
        let cost = power_up.cost();
        if self.coins < cost {
            return Err(PowerUpError::InsufficientCoins { power_up, cost, coins: self.coins });
        }

        self.coins -= cost;
        self.power_ups.take(power_up);
        match power_up {
            PowerUp::Hint => self.hint_shown = true,
            PowerUp::TimeFreeze => self.frozen_secs += TIME_FREEZE_SECS,
            PowerUp::Multiplier => self.multiplier_questions_left = MULTIPLIER_QUESTIONS,
        }

        log::debug!("[use_power_up] {} used {power_up}, {} coins left", self.subject, self.coins);
        Ok(())
    }

    /// Grades an answer given `elapsed_secs` after the question was asked.
    /// A timed question answered after the clock ran out is a miss.
    pub fn answer(&mut self, app: &mut App, correct: bool, elapsed_secs: u64) -> DBResult<AnswerOutcome> {
        match self.rules {
            Rules::Timed => {
                let time_left = self.time_left(elapsed_secs);
                if time_left == 0 {
                    self.time_up(app)
                } else if correct {
                    self.answer_correct(app, time_left)
                } else {
                    self.answer_incorrect(app)
                }
            }
            Rules::Drill if correct => self.answer_correct(app, 0),
            Rules::Drill => self.answer_incorrect(app),
        }
    }

    /// Records a correct answer. `time_left_secs` only counts in timed games.
    pub fn answer_correct(&mut self, app: &mut App, time_left_secs: u32) -> DBResult<AnswerOutcome> {
        let outcome = match self.rules {
            Rules::Timed => self.timed_correct(app, time_left_secs)?,
            Rules::Drill => self.drill_correct(app)?,
        };
        self.next_question();
        Ok(outcome)
    }

    pub fn answer_incorrect(&mut self, app: &mut App) -> DBResult<AnswerOutcome> {
        self.miss(app, false)
    }

    /// The clock ran out before an answer came in.
    pub fn time_up(&mut self, app: &mut App) -> DBResult<AnswerOutcome> {
        log::debug!("[time_up] {} question timed out", self.subject);
        self.miss(app, true)
    }

    fn timed_correct(&mut self, app: &mut App, time_left_secs: u32) -> DBResult<AnswerOutcome> {
        let before = app.subject_progress(self.subject);
        let points = points_for(before.level, self.streak, time_left_secs, self.multiplier());

        let levelled_up = app.add_correct_answer(self.subject)?;
        let after = app.subject_progress(self.subject);

        let coins = points / 10;
        self.score += points;
        self.coins += coins;
        self.streak += 1;
        self.questions_answered += 1;

        let quest_completed = after.total_correct % QUEST_INTERVAL == 0;
        if quest_completed {
            self.quests_completed += 1;
        }

        let score_saved = app.save_score(self.subject, self.score, after.level,
                                         after.total_correct, after.total_attempts)?;

        log::debug!("[answer_correct] {} +{points} (score {}, streak {})",
                    self.subject, self.score, self.streak);

        Ok(AnswerOutcome {
            correct: true,
            timed_out: false,
            points,
            coins,
            levelled_up,
            quest_completed,
            score_saved,
        })
    }

    fn drill_correct(&mut self, app: &mut App) -> DBResult<AnswerOutcome> {
        let levelled_up = app.add_correct_answer(self.subject)?;
        self.streak += 1;
        self.questions_answered += 1;

        let quest_completed = self.streak % QUEST_INTERVAL == 0;
        let mut coins = DRILL_COINS;
        if quest_completed {
            self.quests_completed += 1;
            coins += DRILL_QUEST_BONUS;
        }
        self.coins += coins;

        log::debug!("[answer_correct] {} +{coins} coins (streak {})", self.subject, self.streak);

        Ok(AnswerOutcome {
            correct: true,
            timed_out: false,
            points: 0,
            coins,
            levelled_up,
            quest_completed,
            score_saved: false,
        })
    }

    fn miss(&mut self, app: &mut App, timed_out: bool) -> DBResult<AnswerOutcome> {
        app.add_incorrect_answer(self.subject)?;
        self.streak = 0;
        self.questions_answered += 1;
        self.next_question();
        Ok(AnswerOutcome::missed(timed_out))
    }

    fn next_question(&mut self) {
        self.hint_shown = false;
        self.frozen_secs = 0;
        self.multiplier_questions_left = self.multiplier_questions_left.saturating_sub(1);
    }
}
