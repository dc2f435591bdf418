//! Checks applied to persisted records after every simulated step.
use anyhow::{Result, bail, ensure};
use xmas_game::{Catalog, Day, Game, TokenLedger};

/// Option presence must track the assigned modifier, and part 2 needs part 1.
pub fn check_day(day: &Day, catalog: &Catalog) -> Result<()> {
    match day.challenge_modifier_id {
        None => ensure!(
            day.active_option().is_none(),
            "day {} has option {:?} without a modifier",
            day.number,
            day.modifier_option_id
        ),
        Some(modifier_id) => {
            let Some(modifier) = catalog.modifier(modifier_id) else {
                bail!("day {} references unknown modifier {modifier_id}", day.number);
            };
            match (modifier.has_options, day.active_option()) {
                (true, None) => bail!(
                    "day {} modifier {} needs an option but has none",
                    day.number,
                    modifier.name
                ),
                (false, Some(option_id)) => bail!(
                    "day {} modifier {} takes no option but carries {option_id}",
                    day.number,
                    modifier.name
                ),
                (true, Some(option_id)) => {
                    let parent = catalog
                        .option(option_id)
                        .map(|option| option.challenge_modifier_id);
                    ensure!(
                        parent == Some(modifier_id),
                        "day {} option {option_id} does not belong to modifier {}",
                        day.number,
                        modifier.name
                    );
                }
                (false, None) => {}
            }
        }
    }
    ensure!(
        !day.part2_completed || day.part1_completed,
        "day {} completed part 2 before part 1",
        day.number
    );
    Ok(())
}

/// Counters move only forward, and by exactly one per successful reroll.
pub fn check_counter_step(
    before: &Day,
    after: &Day,
    modifier_step: u32,
    option_step: u32,
) -> Result<()> {
    ensure!(
        after.challenge_modifier_rerolls_used == before.challenge_modifier_rerolls_used + modifier_step,
        "day {}: modifier rerolls went {} -> {} (expected +{modifier_step})",
        after.number,
        before.challenge_modifier_rerolls_used,
        after.challenge_modifier_rerolls_used
    );
    ensure!(
        after.modifier_option_rerolls_used == before.modifier_option_rerolls_used + option_step,
        "day {}: option rerolls went {} -> {} (expected +{option_step})",
        after.number,
        before.modifier_option_rerolls_used,
        after.modifier_option_rerolls_used
    );
    Ok(())
}

/// The wallet must equal the pinned start plus what each day recorded.
pub fn check_ledger(game: &Game, days: &[Day]) -> Result<TokenLedger> {
    let ledger = TokenLedger::for_game(game, days);
    ensure!(
        ledger.expected_balance() == i64::from(game.current_reroll_tokens),
        "game {} holds {} tokens but its days account for {} (starting {}, earned {}, spent {})",
        game.id,
        game.current_reroll_tokens,
        ledger.expected_balance(),
        ledger.starting,
        ledger.earned,
        ledger.spent
    );
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed_modifier(catalog: &Catalog) -> (u32, u32) {
        let modifier = catalog
            .challenge_modifiers
            .iter()
            .find(|m| m.has_options)
            .unwrap();
        (modifier.id, catalog.options_for(modifier.id)[0].id)
    }

    #[test]
    fn day_checks_option_presence() {
        let catalog = Catalog::embedded();
        let (modifier_id, option_id) = boxed_modifier(catalog);

        let good = Day {
            challenge_modifier_id: Some(modifier_id),
            modifier_option_id: Some(option_id),
            ..Day::new(1, 1)
        };
        assert!(check_day(&good, catalog).is_ok());

        let missing = Day {
            modifier_option_id: None,
            ..good.clone()
        };
        assert!(check_day(&missing, catalog).is_err());

        let out_of_order = Day {
            part2_completed: true,
            ..good
        };
        assert!(check_day(&out_of_order, catalog).is_err());
    }

    #[test]
    fn counter_step_must_match() {
        let before = Day::new(1, 1);
        let after = Day {
            challenge_modifier_rerolls_used: 1,
            ..before.clone()
        };
        assert!(check_counter_step(&before, &after, 1, 0).is_ok());
        assert!(check_counter_step(&before, &after, 0, 0).is_err());
    }

    #[test]
    fn ledger_mismatch_is_reported() {
        let rules = xmas_game::RulesConfig::default();
        let mut game = xmas_game::Game::from_new(
            1,
            1,
            xmas_game::NewGame {
                user_id: 1,
                name: "Ledger".to_string(),
                year: 2022,
                player_name: None,
                is_public: false,
                repository_link: None,
            },
            &rules,
        );
        let days = vec![Day {
            part1_completed: true,
            tokens_awarded: 1,
            ..Day::new(1, 1)
        }];
        assert!(check_ledger(&game, &days).is_err());
        game.current_reroll_tokens = 1;
        assert_eq!(check_ledger(&game, &days).unwrap().earned, 1);

        // Movements are read from the day, not recomputed from today's rules.
        let days = vec![Day {
            challenge_modifier_rerolls_used: 1,
            tokens_charged: 5,
            tokens_awarded: 6,
            ..days[0].clone()
        }];
        let ledger = check_ledger(&game, &days).unwrap();
        assert_eq!((ledger.earned, ledger.spent), (6, 5));
    }
}
