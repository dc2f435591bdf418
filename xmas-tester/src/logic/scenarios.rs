use anyhow::{Result, ensure};
use rand::Rng;
use xmas_game::constants::FIRST_DAY;
use xmas_game::{DayError, Part};

use super::session::{Action, SimulationSession};

const REROLL_ECONOMY_DAYS: usize = 5;
const MAX_RANDOM_MOVES: usize = 6;

pub type ScenarioFn = fn(&mut SimulationSession) -> Result<()>;

/// A named script run against a fresh simulated game.
#[derive(Debug, Clone, Copy)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    run: ScenarioFn,
}

impl TestScenario {
    pub fn run(&self, session: &mut SimulationSession) -> Result<()> {
        (self.run)(session)
    }
}

pub const SCENARIOS: &[TestScenario] = &[
    TestScenario {
        key: "smoke",
        name: "Smoke",
        description: "Roll day 1 and complete both parts",
        run: smoke,
    },
    TestScenario {
        key: "reroll-economy",
        name: "Reroll Economy",
        description: "Earn tokens by completing days and spend them all on rerolls",
        run: reroll_economy,
    },
    TestScenario {
        key: "full-calendar",
        name: "Full Calendar",
        description: "Random walk of actions across every calendar day",
        run: full_calendar,
    },
    TestScenario {
        key: "stale-day",
        name: "Stale Day",
        description: "Actions on a day that is no longer current are rejected",
        run: stale_day,
    },
    TestScenario {
        key: "token-guard",
        name: "Token Guard",
        description: "Rerolls with an empty wallet are rejected without side effects",
        run: token_guard,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<&'static TestScenario> {
    SCENARIOS.iter().find(|scenario| scenario.key == key)
}

fn smoke(session: &mut SimulationSession) -> Result<()> {
    let starting = session.game()?.current_reroll_tokens;
    let rolled = session.expect_ok(Action::Roll)?;
    ensure!(rolled.day.is_rolled(), "roll left day 1 without a modifier");

    session.expect_ok(Action::CompletePart1)?;
    let done = session.expect_ok(Action::CompletePart2)?;
    ensure!(
        done.day.part1_completed && done.day.part2_completed,
        "day 1 is not fully completed"
    );

    let award = session.rules().tokens_per_completed_part;
    ensure!(
        done.game.current_reroll_tokens == starting + 2 * award,
        "expected {} tokens after two completions, found {}",
        starting + 2 * award,
        done.game.current_reroll_tokens
    );

    let err = session.expect_rejection(Action::CompletePart2)?;
    ensure!(
        err == DayError::AlreadyCompleted { part: Part::Two },
        "unexpected rejection: {err}"
    );
    Ok(())
}

fn reroll_economy(session: &mut SimulationSession) -> Result<()> {
    for _ in 0..REROLL_ECONOMY_DAYS {
        session.expect_ok(Action::Roll)?;
        session.expect_ok(Action::CompletePart1)?;
        session.expect_ok(Action::CompletePart2)?;
        spend_tokens(session)?;
        if !session.advance()? {
            break;
        }
    }
    let ledger = session.ledger()?;
    let funded = ledger.starting + ledger.earned >= session.rules().challenge_modifier_reroll_cost;
    ensure!(
        !funded || ledger.spent > 0,
        "{} tokens were available but none were spent",
        ledger.starting + ledger.earned
    );
    Ok(())
}

/// Reroll at random until nothing on the current day is affordable.
fn spend_tokens(session: &mut SimulationSession) -> Result<()> {
    let costs = session.rules().reroll_costs();
    loop {
        let tokens = session.game()?.current_reroll_tokens;
        let has_option = session.current_day()?.active_option().is_some();

        let mut affordable = Vec::with_capacity(2);
        if tokens >= costs.challenge_modifier {
            affordable.push(Action::RerollModifier);
        }
        if has_option && tokens >= costs.modifier_option {
            affordable.push(Action::RerollOption);
        }
        if affordable.is_empty() {
            return Ok(());
        }
        let pick = session.rng().gen_range(0..affordable.len());
        session.expect_ok(affordable[pick])?;
    }
}

fn full_calendar(session: &mut SimulationSession) -> Result<()> {
    loop {
        let moves = session.rng().gen_range(0..=MAX_RANDOM_MOVES);
        for _ in 0..moves {
            let action = Action::ALL[session.rng().gen_range(0..Action::ALL.len())];
            session.act(action)?;
        }
        if !session.advance()? {
            break;
        }
    }

    let calendar_days = session.rules().calendar_days;
    let game = session.game()?;
    ensure!(
        game.current_day == calendar_days,
        "calendar stopped on day {} of {calendar_days}",
        game.current_day
    );
    ensure!(
        session.days()?.len() == usize::from(calendar_days),
        "expected one record per calendar day"
    );
    Ok(())
}

fn stale_day(session: &mut SimulationSession) -> Result<()> {
    session.expect_ok(Action::Roll)?;
    ensure!(session.advance()?, "calendar has no second day");
    let current = session.game()?.current_day;

    for action in Action::ALL {
        let err = session.expect_rejection_on(action, FIRST_DAY)?;
        ensure!(
            err == DayError::DayNotCurrent {
                day: FIRST_DAY,
                current
            },
            "{action} on a stale day failed with {err}"
        );
    }
    Ok(())
}

fn token_guard(session: &mut SimulationSession) -> Result<()> {
    session.expect_ok(Action::Roll)?;
    spend_tokens(session)?;

    let costs = session.rules().reroll_costs();
    let available = session.game()?.current_reroll_tokens;
    let err = session.expect_rejection(Action::RerollModifier)?;
    ensure!(
        err == DayError::InsufficientTokens {
            required: costs.challenge_modifier,
            available
        },
        "modifier reroll with {available} tokens failed with {err}"
    );

    if session.current_day()?.active_option().is_some() {
        let err = session.expect_rejection(Action::RerollOption)?;
        ensure!(
            err == DayError::InsufficientTokens {
                required: costs.modifier_option,
                available
            },
            "option reroll with {available} tokens failed with {err}"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::data::TesterData;

    #[test]
    fn every_scenario_passes_on_bundled_data() {
        for scenario in SCENARIOS {
            for seed in [1, 42, 1337] {
                let mut session = SimulationSession::start(TesterData::default(), seed).unwrap();
                if let Err(err) = scenario.run(&mut session) {
                    panic!("{} failed for seed {seed}: {err:#}", scenario.key);
                }
            }
        }
    }

    #[test]
    fn scenario_lookup_by_key() {
        assert_eq!(get_scenario("stale-day").unwrap().name, "Stale Day");
        assert!(get_scenario("weather").is_none());
        assert_eq!(list_scenarios().count(), SCENARIOS.len());
    }
}
