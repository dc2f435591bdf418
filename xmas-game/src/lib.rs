//! Xtreme Xmas Game Engine
//!
//! Platform-agnostic core logic for the Xtreme Xmas advent-calendar game.
//! This crate owns the day progression rules (challenge modifier rolls,
//! token-gated rerolls, ordered completion milestones), the token economy,
//! calendar unlocking, titles and the leaderboard, without any HTTP, database
//! or UI dependencies.

pub mod assets;
pub mod catalog;
pub mod constants;
pub mod day;
pub mod error;
pub mod leaderboard;
pub mod progress;
pub mod roll;
pub mod rules;
pub mod state;
pub mod storage;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

// Re-export commonly used types
pub use assets::{AssetError, EmbeddedData};
pub use catalog::{Catalog, CatalogError, ChallengeModifier, ModifierOption, Title};
pub use day::{DayController, RerollPayment, verify_day_is_current};
pub use error::{DayError, Part};
pub use leaderboard::{LeaderboardEntry, build_leaderboard};
pub use progress::{ProgressError, advance_day, unlock_date, unlocked_days};
pub use roll::{pick_uniform, pick_uniform_where, roll_challenge_modifier, roll_modifier_option};
pub use rules::{RerollCosts, RulesConfig, RulesConfigError};
pub use state::{Day, Game, GameSetupError, NewGame, TokenLedger, User};
pub use storage::{MemoryStorage, StorageError};

use constants::{FIRST_DAY, RULES_CONFIG_NAME};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the challenge modifier, option and title catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Trait for abstracting persistence of users, games and days.
///
/// `commit` and `save_game` must reject a game whose `revision` differs from
/// the stored one, and must bump the revision of what they write.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the user cannot be written.
    fn upsert_user(&self, user: User) -> Result<User, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load_user(&self, id: u64) -> Result<Option<User>, Self::Error>;

    /// Store a new game, assigning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the game cannot be written.
    fn insert_game(&self, game: Game) -> Result<Game, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load_game(&self, id: u32) -> Result<Option<Game>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn games_for_user(&self, user_id: u64) -> Result<Vec<Game>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn all_games(&self) -> Result<Vec<Game>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load_day(&self, game_id: u32, number: u8) -> Result<Option<Day>, Self::Error>;

    /// Days of one game, ordered by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn days_for_game(&self, game_id: u32) -> Result<Vec<Day>, Self::Error>;

    /// Update a game record on its own.
    ///
    /// # Errors
    ///
    /// Returns an error on a revision conflict or write failure.
    fn save_game(&self, game: &Game) -> Result<Game, Self::Error>;

    /// Write a game and one of its days as a single unit.
    ///
    /// # Errors
    ///
    /// Returns an error on a revision conflict or write failure; nothing is
    /// written in that case.
    fn commit(&self, game: &Game, day: &Day) -> Result<(Game, Day), Self::Error>;
}

/// Failures surfaced by [`GameEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Day(#[from] DayError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Setup(#[from] GameSetupError),
    #[error(transparent)]
    Rules(#[from] RulesConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("game {0} not found")]
    GameNotFound(u32),
    #[error("day {number} of game {game_id} not found")]
    DayNotFound { game_id: u32, number: u8 },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl EngineError {
    /// The day-level rejection behind this error, if any.
    #[must_use]
    pub const fn as_day_error(&self) -> Option<&DayError> {
        match self {
            Self::Day(err) => Some(err),
            _ => None,
        }
    }
}

fn backend<T, E>(result: Result<T, E>) -> Result<T, EngineError>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result.map_err(|err| EngineError::Backend(anyhow::Error::new(err)))
}

/// Result of one committed day action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayActionOutcome {
    pub game: Game,
    pub day: Day,
    pub tokens_charged: u32,
    pub tokens_awarded: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct TokenDelta {
    charged: u32,
    awarded: u32,
}

/// Main game engine: the request-handling layer around [`DayController`].
///
/// Each day action loads the game and day, runs the controller, applies the
/// token delta to the game and commits both records in one storage call.
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
    catalog: Catalog,
    rules: RulesConfig,
    rng: ChaCha20Rng,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create an engine, loading and validating catalog and rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be loaded or fails validation.
    pub fn new(data_loader: L, storage: S, seed: u64) -> Result<Self, EngineError> {
        let (catalog, rules) = Self::load_data(&data_loader)?;
        Ok(Self {
            data_loader,
            storage,
            catalog,
            rules,
            rng: ChaCha20Rng::seed_from_u64(seed),
        })
    }

    fn load_data(data_loader: &L) -> Result<(Catalog, RulesConfig), EngineError> {
        let catalog = backend(data_loader.load_catalog())?;
        catalog.validate()?;
        let rules: RulesConfig = backend(data_loader.load_config(RULES_CONFIG_NAME))?;
        rules.validate()?;
        Ok((catalog, rules))
    }

    /// Re-read catalog and rules from the loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be loaded; the current data stays
    /// in place.
    pub fn reload_data(&mut self) -> Result<(), EngineError> {
        let (catalog, rules) = Self::load_data(&self.data_loader)?;
        self.catalog = catalog;
        self.rules = rules;
        Ok(())
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Register or rename a player.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn register_user(&self, user: User) -> Result<User, EngineError> {
        backend(self.storage.upsert_user(user))
    }

    /// Start a new game on day 1 for the requesting user. `today` bounds the
    /// playable years.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or storage fails.
    pub fn create_game(
        &mut self,
        new_game: NewGame,
        today: NaiveDate,
    ) -> Result<(Game, Day), EngineError> {
        new_game.validate(&self.rules, today)?;
        let existing = backend(self.storage.games_for_user(new_game.user_id))?;
        let number = u32::try_from(existing.len()).unwrap_or(u32::MAX - 1) + 1;
        let game = backend(self.storage.insert_game(Game::from_new(
            0,
            number,
            new_game,
            &self.rules,
        )))?;
        let (game, day) = backend(self.storage.commit(&game, &Day::new(game.id, FIRST_DAY)))?;
        log::info!(
            "created game {} (#{number} for user {})",
            game.id,
            game.user_id
        );
        Ok((game, day))
    }

    /// Assign the day's first challenge modifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the game or day is missing, the controller
    /// rejects the roll, or storage fails.
    pub fn roll_day(&mut self, game_id: u32, day_number: u8) -> Result<DayActionOutcome, EngineError> {
        self.run_day_action(game_id, day_number, "roll", |controller, game, catalog, rng| {
            controller.roll_initial_challenge_modifier(
                game,
                &catalog.challenge_modifiers,
                &catalog.modifier_options,
                rng,
            )?;
            Ok(TokenDelta::default())
        })
    }

    /// Reroll the challenge modifier, debiting the game.
    ///
    /// # Errors
    ///
    /// Returns an error if the game or day is missing, the controller
    /// rejects the reroll, or storage fails.
    pub fn reroll_challenge_modifier(
        &mut self,
        game_id: u32,
        day_number: u8,
    ) -> Result<DayActionOutcome, EngineError> {
        self.run_day_action(
            game_id,
            day_number,
            "reroll modifier",
            |controller, game, catalog, rng| {
                controller.reroll_challenge_modifier(
                    game,
                    &catalog.challenge_modifiers,
                    &catalog.modifier_options,
                    rng,
                )?;
                Ok(TokenDelta {
                    charged: controller.costs().challenge_modifier,
                    awarded: 0,
                })
            },
        )
    }

    /// Reroll the modifier option, debiting the game.
    ///
    /// # Errors
    ///
    /// Returns an error if the game or day is missing, the controller
    /// rejects the reroll, or storage fails.
    pub fn reroll_modifier_option(
        &mut self,
        game_id: u32,
        day_number: u8,
    ) -> Result<DayActionOutcome, EngineError> {
        self.run_day_action(
            game_id,
            day_number,
            "reroll option",
            |controller, game, catalog, rng| {
                let options = controller
                    .day()
                    .challenge_modifier_id
                    .map(|id| catalog.options_for(id))
                    .unwrap_or_default();
                controller.reroll_modifier_option(
                    game.current_day,
                    &options,
                    RerollPayment::Tokens(game),
                    rng,
                )?;
                Ok(TokenDelta {
                    charged: controller.costs().modifier_option,
                    awarded: 0,
                })
            },
        )
    }

    /// Mark part 1 done and award its tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the game or day is missing, the controller
    /// rejects the completion, or storage fails.
    pub fn complete_part1(
        &mut self,
        game_id: u32,
        day_number: u8,
    ) -> Result<DayActionOutcome, EngineError> {
        let award = self.rules.tokens_per_completed_part;
        self.run_day_action(game_id, day_number, "complete part 1", |controller, game, _, _| {
            controller.complete_part1(game.current_day)?;
            Ok(TokenDelta {
                charged: 0,
                awarded: award,
            })
        })
    }

    /// Mark part 2 done and award its tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the game or day is missing, the controller
    /// rejects the completion, or storage fails.
    pub fn complete_part2(
        &mut self,
        game_id: u32,
        day_number: u8,
    ) -> Result<DayActionOutcome, EngineError> {
        let award = self.rules.tokens_per_completed_part;
        self.run_day_action(game_id, day_number, "complete part 2", |controller, game, _, _| {
            controller.complete_part2(game.current_day)?;
            Ok(TokenDelta {
                charged: 0,
                awarded: award,
            })
        })
    }

    /// Open the next calendar day of a game.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is missing, the calendar refuses to
    /// advance, or storage fails.
    pub fn advance_day(&mut self, game_id: u32, today: NaiveDate) -> Result<(Game, Day), EngineError> {
        let mut game = self.load_game(game_id)?;
        let day = advance_day(&mut game, today, &self.rules)?;
        backend(self.storage.commit(&game, &day))
    }

    /// Record a final score and award the matching title.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is missing or storage fails.
    pub fn record_score(&mut self, game_id: u32, score: i32) -> Result<Game, EngineError> {
        let mut game = self.load_game(game_id)?;
        game.score = score;
        game.title_id = self.catalog.title_for_score(score).map(|title| title.id);
        let game = backend(self.storage.save_game(&game))?;
        log::info!(
            "game {} scored {score} (title {:?})",
            game.id,
            game.title_id
        );
        Ok(game)
    }

    /// # Errors
    ///
    /// Returns an error if the game is missing or storage fails.
    pub fn load_game(&self, game_id: u32) -> Result<Game, EngineError> {
        backend(self.storage.load_game(game_id))?.ok_or(EngineError::GameNotFound(game_id))
    }

    /// All days opened so far for a game.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn game_days(&self, game_id: u32) -> Result<Vec<Day>, EngineError> {
        backend(self.storage.days_for_game(game_id))
    }

    /// Token flow rebuilt from the movements recorded on each day, so a
    /// rules reload never rewrites past charges.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is missing or storage fails.
    pub fn token_ledger(&self, game_id: u32) -> Result<TokenLedger, EngineError> {
        let game = self.load_game(game_id)?;
        let days = self.game_days(game_id)?;
        Ok(TokenLedger::for_game(&game, &days))
    }

    /// Public games ranked by score.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let games = backend(self.storage.all_games())?;
        let user_ids: BTreeSet<u64> = games.iter().map(|game| game.user_id).collect();
        let mut users = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            if let Some(user) = backend(self.storage.load_user(id))? {
                users.push(user);
            }
        }
        Ok(build_leaderboard(&games, &users, &self.catalog))
    }

    fn run_day_action<F>(
        &mut self,
        game_id: u32,
        day_number: u8,
        label: &str,
        action: F,
    ) -> Result<DayActionOutcome, EngineError>
    where
        F: FnOnce(
            &mut DayController,
            &Game,
            &Catalog,
            &mut ChaCha20Rng,
        ) -> Result<TokenDelta, DayError>,
    {
        let mut game = self.load_game(game_id)?;
        let day = backend(self.storage.load_day(game_id, day_number))?.ok_or(
            EngineError::DayNotFound {
                game_id,
                number: day_number,
            },
        )?;

        let mut controller = DayController::with_costs(day, self.rules.reroll_costs());
        let delta = match action(&mut controller, &game, &self.catalog, &mut self.rng) {
            Ok(delta) => delta,
            Err(err) => {
                log::warn!("game {game_id} day {day_number}: {label} rejected: {err}");
                return Err(err.into());
            }
        };

        game.current_reroll_tokens = game
            .current_reroll_tokens
            .saturating_sub(delta.charged)
            .saturating_add(delta.awarded);
        let mut day = controller.into_day();
        day.record_tokens(delta.charged, delta.awarded);
        let (game, day) = backend(self.storage.commit(&game, &day))?;
        log::info!(
            "game {game_id} day {day_number}: {label} committed (charged {}, awarded {}, balance {})",
            delta.charged,
            delta.awarded,
            game.current_reroll_tokens
        );
        Ok(DayActionOutcome {
            game,
            day,
            tokens_charged: delta.charged,
            tokens_awarded: delta.awarded,
        })
    }
}
