use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::fmt;
use xmas_game::{
    Catalog, Day, DayActionOutcome, DayError, EngineError, Game, GameEngine, GameStorage,
    MemoryStorage, NewGame, RulesConfig, TokenLedger, User, constants::FIRST_DAY, unlock_date,
};

use super::data::TesterData;
use super::invariants::{check_counter_step, check_day, check_ledger};

/// Calendar year every simulated game is played in.
pub const SIM_YEAR: i32 = 2022;
const SIM_USER_ID: u64 = 1;
// Keeps the decision stream apart from the engine's roll stream.
const DECISION_STREAM: u64 = 0x5EED_DEC1_5105;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Roll,
    RerollModifier,
    RerollOption,
    CompletePart1,
    CompletePart2,
}

impl Action {
    pub const ALL: [Self; 5] = [
        Self::Roll,
        Self::RerollModifier,
        Self::RerollOption,
        Self::CompletePart1,
        Self::CompletePart2,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Roll => "roll",
            Self::RerollModifier => "reroll-modifier",
            Self::RerollOption => "reroll-option",
            Self::CompletePart1 => "complete-part1",
            Self::CompletePart2 => "complete-part2",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One simulated game driven through the engine, with invariants checked
/// after every step.
pub struct SimulationSession {
    engine: GameEngine<TesterData, MemoryStorage>,
    game_id: u32,
    rng: ChaCha20Rng,
    history: Vec<String>,
}

impl SimulationSession {
    pub fn start(data: TesterData, seed: u64) -> Result<Self> {
        let mut engine =
            GameEngine::new(data, MemoryStorage::new(), seed).context("engine setup failed")?;
        engine.register_user(User {
            id: SIM_USER_ID,
            username: format!("sim-{seed}"),
        })?;
        let opening = unlock_date(SIM_YEAR, FIRST_DAY)?;
        let (game, _) = engine.create_game(
            NewGame {
                user_id: SIM_USER_ID,
                name: format!("Simulation {seed}"),
                year: SIM_YEAR,
                player_name: None,
                is_public: true,
                repository_link: None,
            },
            opening,
        )?;
        Ok(Self {
            engine,
            game_id: game.id,
            rng: ChaCha20Rng::seed_from_u64(seed ^ DECISION_STREAM),
            history: Vec::new(),
        })
    }

    pub fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        self.engine.rules()
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        self.engine.catalog()
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        self.history.len()
    }

    pub fn game(&self) -> Result<Game> {
        Ok(self.engine.load_game(self.game_id)?)
    }

    pub fn day(&self, number: u8) -> Result<Day> {
        self.engine
            .storage()
            .load_day(self.game_id, number)?
            .with_context(|| format!("day {number} of game {} is missing", self.game_id))
    }

    pub fn current_day(&self) -> Result<Day> {
        let game = self.game()?;
        self.day(game.current_day)
    }

    pub fn days(&self) -> Result<Vec<Day>> {
        Ok(self.engine.game_days(self.game_id)?)
    }

    pub fn ledger(&self) -> Result<TokenLedger> {
        Ok(self.engine.token_ledger(self.game_id)?)
    }

    /// Run `action` on the game's current day.
    pub fn act(&mut self, action: Action) -> Result<Result<DayActionOutcome, DayError>> {
        let number = self.game()?.current_day;
        self.act_on(action, number)
    }

    /// Run `action` on day `number`; rejections must leave both records
    /// untouched.
    pub fn act_on(
        &mut self,
        action: Action,
        number: u8,
    ) -> Result<Result<DayActionOutcome, DayError>> {
        let game_before = self.game()?;
        let day_before = self.day(number)?;

        let result = match action {
            Action::Roll => self.engine.roll_day(self.game_id, number),
            Action::RerollModifier => self.engine.reroll_challenge_modifier(self.game_id, number),
            Action::RerollOption => self.engine.reroll_modifier_option(self.game_id, number),
            Action::CompletePart1 => self.engine.complete_part1(self.game_id, number),
            Action::CompletePart2 => self.engine.complete_part2(self.game_id, number),
        };

        match result {
            Ok(outcome) => {
                let (modifier_step, option_step) = match action {
                    Action::RerollModifier => (1, u32::from(outcome.day.active_option().is_some())),
                    Action::RerollOption => (0, 1),
                    _ => (0, 0),
                };
                check_counter_step(&day_before, &outcome.day, modifier_step, option_step)?;
                self.record(format!(
                    "day {number} {action}: ok (-{} +{} = {})",
                    outcome.tokens_charged,
                    outcome.tokens_awarded,
                    outcome.game.current_reroll_tokens
                ));
                self.check_invariants()?;
                Ok(Ok(outcome))
            }
            Err(EngineError::Day(err)) => {
                if self.game()? != game_before || self.day(number)? != day_before {
                    bail!("day {number} {action} was rejected ({err}) but still wrote state");
                }
                self.record(format!("day {number} {action}: rejected ({err})"));
                Ok(Err(err))
            }
            Err(err) => {
                Err(anyhow::Error::new(err).context(format!("day {number} {action} failed")))
            }
        }
    }

    /// Run `action` on the current day and require it to succeed.
    pub fn expect_ok(&mut self, action: Action) -> Result<DayActionOutcome> {
        match self.act(action)? {
            Ok(outcome) => Ok(outcome),
            Err(err) => bail!("{action} was rejected: {err}"),
        }
    }

    /// Run `action` on day `number` and require it to be rejected.
    pub fn expect_rejection_on(&mut self, action: Action, number: u8) -> Result<DayError> {
        match self.act_on(action, number)? {
            Ok(_) => bail!("{action} on day {number} was accepted"),
            Err(err) => Ok(err),
        }
    }

    pub fn expect_rejection(&mut self, action: Action) -> Result<DayError> {
        let number = self.game()?.current_day;
        self.expect_rejection_on(action, number)
    }

    /// Open the next calendar day on its unlock date; `false` once the
    /// calendar is finished.
    pub fn advance(&mut self) -> Result<bool> {
        let game = self.game()?;
        if game.on_final_day(self.rules()) {
            return Ok(false);
        }
        let today = unlock_date(SIM_YEAR, game.current_day + 1)?;
        let (game, _) = self.engine.advance_day(self.game_id, today)?;
        log::debug!("simulation advanced game {} to day {}", game.id, game.current_day);
        self.record(format!("advanced to day {}", game.current_day));
        self.check_invariants()?;
        Ok(true)
    }

    pub fn check_invariants(&self) -> Result<()> {
        let game = self.game()?;
        let days = self.days()?;
        for day in &days {
            check_day(day, self.catalog())?;
        }
        check_ledger(&game, &days)?;
        Ok(())
    }

    /// The last few steps, newest last.
    #[must_use]
    pub fn recent_history(&self, count: usize) -> String {
        if self.history.is_empty() {
            return "no steps recorded".to_string();
        }
        let skip = self.history.len().saturating_sub(count);
        self.history[skip..].join(" | ")
    }

    fn record(&mut self, entry: String) {
        log::trace!("{entry}");
        self.history.push(entry);
    }
}
