//! Centralized balance constants for Xtreme Xmas game logic.
//!
//! `RulesConfig` falls back to these values for any field missing from a
//! rules asset.

// Token economy ------------------------------------------------------------
pub const CHALLENGE_MODIFIER_REROLL_COST: u32 = 2;
pub const MODIFIER_OPTION_REROLL_COST: u32 = 1;
pub const TOKENS_PER_COMPLETED_PART: u32 = 1;
pub const STARTING_REROLL_TOKENS: u32 = 0;

// Calendar -----------------------------------------------------------------
pub const CALENDAR_DAYS: u8 = 25;
pub const MAX_CALENDAR_DAYS: u8 = 31;
pub const CALENDAR_MONTH: u32 = 12;
pub const FIRST_DAY: u8 = 1;

// Game setup ---------------------------------------------------------------
pub const MIN_GAME_YEAR: i32 = 2014;
pub const MAX_GAME_NAME_LEN: usize = 256;

// Leaderboard --------------------------------------------------------------
pub const INCOMPLETE_TITLE: &str = "Incomplete";

// Config asset names -------------------------------------------------------
pub const RULES_CONFIG_NAME: &str = "rules";
