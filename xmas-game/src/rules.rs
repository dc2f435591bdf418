//! Tunable game rules loaded from JSON.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CALENDAR_DAYS, CHALLENGE_MODIFIER_REROLL_COST, MAX_CALENDAR_DAYS, MAX_GAME_NAME_LEN,
    MIN_GAME_YEAR, MODIFIER_OPTION_REROLL_COST, STARTING_REROLL_TOKENS, TOKENS_PER_COMPLETED_PART,
};

/// Errors raised when rules invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesConfigError {
    #[error("{field} must be at least 1 (got 0)")]
    ZeroCost { field: &'static str },
    #[error("calendar must span 1..={max} days (got {value})")]
    CalendarLength { value: u8, max: u8 },
    #[error("maxNameLen must be at least 1")]
    NameLength,
}

/// Token prices for the two reroll kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerollCosts {
    pub challenge_modifier: u32,
    pub modifier_option: u32,
}

impl Default for RerollCosts {
    fn default() -> Self {
        Self {
            challenge_modifier: CHALLENGE_MODIFIER_REROLL_COST,
            modifier_option: MODIFIER_OPTION_REROLL_COST,
        }
    }
}

/// Economy and calendar settings shared by the engine and the day controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_challenge_modifier_reroll_cost")]
    pub challenge_modifier_reroll_cost: u32,
    #[serde(default = "RulesConfig::default_modifier_option_reroll_cost")]
    pub modifier_option_reroll_cost: u32,
    #[serde(default = "RulesConfig::default_tokens_per_completed_part")]
    pub tokens_per_completed_part: u32,
    #[serde(default = "RulesConfig::default_starting_reroll_tokens")]
    pub starting_reroll_tokens: u32,
    #[serde(default = "RulesConfig::default_calendar_days")]
    pub calendar_days: u8,
    #[serde(default = "RulesConfig::default_min_year")]
    pub min_year: i32,
    #[serde(default = "RulesConfig::default_max_name_len")]
    pub max_name_len: usize,
}

impl RulesConfig {
    const fn default_challenge_modifier_reroll_cost() -> u32 {
        CHALLENGE_MODIFIER_REROLL_COST
    }

    const fn default_modifier_option_reroll_cost() -> u32 {
        MODIFIER_OPTION_REROLL_COST
    }

    const fn default_tokens_per_completed_part() -> u32 {
        TOKENS_PER_COMPLETED_PART
    }

    const fn default_starting_reroll_tokens() -> u32 {
        STARTING_REROLL_TOKENS
    }

    const fn default_calendar_days() -> u8 {
        CALENDAR_DAYS
    }

    const fn default_min_year() -> i32 {
        MIN_GAME_YEAR
    }

    const fn default_max_name_len() -> usize {
        MAX_GAME_NAME_LEN
    }

    /// Parse rules from JSON, filling in defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reroll prices as consumed by the day controller.
    #[must_use]
    pub const fn reroll_costs(&self) -> RerollCosts {
        RerollCosts {
            challenge_modifier: self.challenge_modifier_reroll_cost,
            modifier_option: self.modifier_option_reroll_cost,
        }
    }

    /// Check the rules for values the game cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        if self.challenge_modifier_reroll_cost == 0 {
            return Err(RulesConfigError::ZeroCost {
                field: "challengeModifierRerollCost",
            });
        }
        if self.modifier_option_reroll_cost == 0 {
            return Err(RulesConfigError::ZeroCost {
                field: "modifierOptionRerollCost",
            });
        }
        if self.calendar_days == 0 || self.calendar_days > MAX_CALENDAR_DAYS {
            return Err(RulesConfigError::CalendarLength {
                value: self.calendar_days,
                max: MAX_CALENDAR_DAYS,
            });
        }
        if self.max_name_len == 0 {
            return Err(RulesConfigError::NameLength);
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            challenge_modifier_reroll_cost: Self::default_challenge_modifier_reroll_cost(),
            modifier_option_reroll_cost: Self::default_modifier_option_reroll_cost(),
            tokens_per_completed_part: Self::default_tokens_per_completed_part(),
            starting_reroll_tokens: Self::default_starting_reroll_tokens(),
            calendar_days: Self::default_calendar_days(),
            min_year: Self::default_min_year(),
            max_name_len: Self::default_max_name_len(),
        }
    }
}
