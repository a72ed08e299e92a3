use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::anyhow;
use thiserror::Error;

use crate::models::Subject;

/// Seconds the clock stands still after a time freeze.
pub const TIME_FREEZE_SECS: u32 = 10;
/// Questions a multiplier lasts for, answered or missed.
pub const MULTIPLIER_QUESTIONS: u32 = 3;
pub const MULTIPLIER_FACTOR: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUp {
    Hint,
    TimeFreeze,
    Multiplier,
}

impl PowerUp {
    pub const ALL: [PowerUp; 3] = [PowerUp::Hint, PowerUp::TimeFreeze, PowerUp::Multiplier];

    /// Price in session coins.
    pub fn cost(self) -> u64 {
        match self {
            PowerUp::Hint => 5,
            PowerUp::TimeFreeze => 8,
            PowerUp::Multiplier => 10,
        }
    }

    /// How many of each a session starts with.
    pub fn starting_uses(self) -> u32 {
        match self {
            PowerUp::Hint => 3,
            PowerUp::TimeFreeze => 2,
            PowerUp::Multiplier => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PowerUp::Hint => "hint",
            PowerUp::TimeFreeze => "freeze",
            PowerUp::Multiplier => "multiplier",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PowerUp::Hint => "Reveal a hint",
            PowerUp::TimeFreeze => "Freeze the timer for 10s",
            PowerUp::Multiplier => "2x points for 3 questions",
        }
    }

    fn index(self) -> usize {
        match self {
            PowerUp::Hint => 0,
            PowerUp::TimeFreeze => 1,
            PowerUp::Multiplier => 2,
        }
    }
}

impl Display for PowerUp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PowerUp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hint" => Ok(PowerUp::Hint),
            "freeze" | "timefreeze" => Ok(PowerUp::TimeFreeze),
            "multiplier" | "2x" => Ok(PowerUp::Multiplier),
            other => Err(anyhow!("Unknown power-up `{other}`, expected hint, freeze or multiplier.")),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowerUpError {
    #[error("Power-ups are not available in {0}.")]
    NotAvailable(Subject),

    #[error("A {power_up} costs {cost} coins, you have {coins}.")]
    InsufficientCoins { power_up: PowerUp, cost: u64, coins: u64 },

    #[error("No {0} power-ups left this game.")]
    Exhausted(PowerUp),
}

/// Uses left of each power-up in one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    uses: [u32; 3],
}

impl Default for Inventory {
    fn default() -> Self {
        Self { uses: PowerUp::ALL.map(PowerUp::starting_uses) }
    }
}

impl Inventory {
    pub fn uses_left(&self, power_up: PowerUp) -> u32 {
        self.uses[power_up.index()]
    }

    /// Takes one use. Returns `false` when none are left.
    pub(crate) fn take(&mut self, power_up: PowerUp) -> bool {
        let uses = &mut self.uses[power_up.index()];
        if *uses == 0 {
            return false;
        }
        *uses -= 1;
        true
    }
}

impl Display for Inventory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, power_up) in PowerUp::ALL.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "\t{power_up} ({} coins, {} left): {}",
                   power_up.cost(), self.uses_left(*power_up), power_up.description())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_inventory() {
        let inventory = Inventory::default();
        assert_eq!(inventory.uses_left(PowerUp::Hint), 3);
        assert_eq!(inventory.uses_left(PowerUp::TimeFreeze), 2);
        assert_eq!(inventory.uses_left(PowerUp::Multiplier), 1);
    }

    #[test]
    fn test_take_stops_at_zero() {
        let mut inventory = Inventory::default();
        assert!(inventory.take(PowerUp::Multiplier));
        assert!(!inventory.take(PowerUp::Multiplier));
        assert_eq!(inventory.uses_left(PowerUp::Multiplier), 0);
        assert_eq!(inventory.uses_left(PowerUp::Hint), 3);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Freeze".parse::<PowerUp>().unwrap(), PowerUp::TimeFreeze);
        assert_eq!("2x".parse::<PowerUp>().unwrap(), PowerUp::Multiplier);
        assert!("shield".parse::<PowerUp>().is_err());
    }
}
