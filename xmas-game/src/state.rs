//! Persistent records: users, games, and calendar days.
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::FIRST_DAY;
use crate::rules::RulesConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
}

/// One play-through of the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: u32,
    pub user_id: u64,
    /// Position among this user's games, starting at 1
    pub number: u32,
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub player_name: Option<String>,
    /// Day number currently open for progression
    pub current_day: u8,
    pub current_reroll_tokens: u32,
    /// Wallet at creation, pinned so later rules changes cannot rewrite it
    #[serde(default)]
    pub starting_reroll_tokens: u32,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub title_id: Option<u32>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub repository_link: Option<String>,
    /// Bumped by storage on every commit; a stale value means a lost race
    #[serde(default)]
    pub revision: u64,
}

impl Game {
    /// Build a fresh game positioned on day 1.
    #[must_use]
    pub fn from_new(id: u32, number: u32, new_game: NewGame, rules: &RulesConfig) -> Self {
        Self {
            id,
            user_id: new_game.user_id,
            number,
            name: new_game.name.trim().to_string(),
            year: new_game.year,
            player_name: new_game.player_name,
            current_day: FIRST_DAY,
            current_reroll_tokens: rules.starting_reroll_tokens,
            starting_reroll_tokens: rules.starting_reroll_tokens,
            score: 0,
            title_id: None,
            is_public: new_game.is_public,
            repository_link: new_game.repository_link,
            revision: 0,
        }
    }

    /// Whether the last calendar day is open.
    #[must_use]
    pub fn on_final_day(&self, rules: &RulesConfig) -> bool {
        self.current_day >= rules.calendar_days
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameSetupError {
    #[error("game name must not be empty")]
    EmptyName,
    #[error("game name exceeds {max} characters (got {len})")]
    NameTooLong { len: usize, max: usize },
    #[error("year {year} predates the first playable year {min}")]
    YearTooEarly { year: i32, min: i32 },
    #[error("year {year} has not started yet (latest playable year is {latest})")]
    YearInFuture { year: i32, latest: i32 },
}

/// Request payload for starting a new game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGame {
    pub user_id: u64,
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub repository_link: Option<String>,
}

impl NewGame {
    /// Check the request against the rules, with `today` bounding the year.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or too long, or the year is
    /// before `min_year` or after the current one.
    pub fn validate(&self, rules: &RulesConfig, today: NaiveDate) -> Result<(), GameSetupError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(GameSetupError::EmptyName);
        }
        let len = name.chars().count();
        if len > rules.max_name_len {
            return Err(GameSetupError::NameTooLong {
                len,
                max: rules.max_name_len,
            });
        }
        if self.year < rules.min_year {
            return Err(GameSetupError::YearTooEarly {
                year: self.year,
                min: rules.min_year,
            });
        }
        if self.year > today.year() {
            return Err(GameSetupError::YearInFuture {
                year: self.year,
                latest: today.year(),
            });
        }
        Ok(())
    }
}

/// One calendar entry of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    #[serde(default)]
    pub id: u32,
    pub game_id: u32,
    pub number: u8,
    #[serde(default)]
    pub challenge_modifier_id: Option<u32>,
    #[serde(default)]
    pub modifier_option_id: Option<u32>,
    #[serde(default)]
    pub challenge_modifier_rerolls_used: u32,
    #[serde(default)]
    pub modifier_option_rerolls_used: u32,
    /// Option rerolls that rode along with a modifier reroll at no charge
    #[serde(default)]
    pub gratis_option_rerolls: u32,
    #[serde(default)]
    pub part1_completed: bool,
    #[serde(default)]
    pub part2_completed: bool,
    /// Tokens actually debited for this day, at the prices charged
    #[serde(default)]
    pub tokens_charged: u32,
    /// Tokens actually credited for this day's completions
    #[serde(default)]
    pub tokens_awarded: u32,
}

impl Day {
    /// An untouched day, as created when a game reaches `number`.
    #[must_use]
    pub fn new(game_id: u32, number: u8) -> Self {
        Self {
            game_id,
            number,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_rolled(&self) -> bool {
        self.challenge_modifier_id.is_some()
    }

    /// The assigned option, treating a zero id as unset.
    #[must_use]
    pub fn active_option(&self) -> Option<u32> {
        self.modifier_option_id.filter(|id| *id != 0)
    }

    /// Record a committed token movement against this day.
    pub fn record_tokens(&mut self, charged: u32, awarded: u32) {
        self.tokens_charged = self.tokens_charged.saturating_add(charged);
        self.tokens_awarded = self.tokens_awarded.saturating_add(awarded);
    }

    /// Signed token balance contributed by this day.
    #[must_use]
    pub fn net_tokens(&self) -> i64 {
        i64::from(self.tokens_awarded) - i64::from(self.tokens_charged)
    }
}

/// Token flow of a whole game, rebuilt from its day records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLedger {
    pub starting: u32,
    pub earned: u32,
    pub spent: u32,
}

impl TokenLedger {
    /// Sum the recorded movements of `days` on top of the game's pinned
    /// starting wallet.
    #[must_use]
    pub fn for_game<'a, I>(game: &Game, days: I) -> Self
    where
        I: IntoIterator<Item = &'a Day>,
    {
        days.into_iter().fold(
            Self {
                starting: game.starting_reroll_tokens,
                ..Self::default()
            },
            |mut ledger, day| {
                ledger.earned += day.tokens_awarded;
                ledger.spent += day.tokens_charged;
                ledger
            },
        )
    }

    /// The balance a game should hold if every debit and award was applied.
    #[must_use]
    pub fn expected_balance(&self) -> i64 {
        i64::from(self.starting) + i64::from(self.earned) - i64::from(self.spent)
    }
}
