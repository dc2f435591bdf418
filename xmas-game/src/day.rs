//! Day progression state machine.
//!
//! A [`DayController`] owns one [`Day`] for the span of a single request and
//! applies the guarded transitions: the initial modifier roll, token-gated
//! rerolls, and the two ordered completion milestones. Every guard and every
//! random selection runs before the first field is written, so a rejected call
//! leaves the day untouched.
//!
//! Token balances are only checked here. Debiting the game is the caller's job
//! and must happen in the same write that persists the day; see
//! [`crate::GameEngine`] for the combined path.
use rand::Rng;

use crate::catalog::{ChallengeModifier, ModifierOption};
use crate::error::{DayError, Part};
use crate::roll::{roll_challenge_modifier, roll_modifier_option, roll_option_for_modifier};
use crate::rules::RerollCosts;
use crate::state::{Day, Game};

/// How an option reroll is paid for.
#[derive(Debug, Clone, Copy)]
pub enum RerollPayment<'a> {
    /// Already covered by a challenge modifier reroll.
    Gratis,
    /// Charged against the game's token balance.
    Tokens(&'a Game),
}

/// Reject operations aimed at any day other than the open one.
///
/// # Errors
///
/// Returns [`DayError::DayNotCurrent`] when the numbers differ.
pub const fn verify_day_is_current(day_number: u8, current_day: u8) -> Result<(), DayError> {
    if day_number == current_day {
        Ok(())
    } else {
        Err(DayError::DayNotCurrent {
            day: day_number,
            current: current_day,
        })
    }
}

const fn ensure_tokens(available: u32, required: u32) -> Result<(), DayError> {
    if available < required {
        Err(DayError::InsufficientTokens {
            required,
            available,
        })
    } else {
        Ok(())
    }
}

/// Roll a modifier and, when it needs one, an option from its own box.
fn select_modifier<R>(
    modifiers: &[ChallengeModifier],
    options: &[ModifierOption],
    rng: &mut R,
) -> Result<(u32, Option<u32>), DayError>
where
    R: Rng + ?Sized,
{
    let modifier = roll_challenge_modifier(modifiers, rng)?;
    let option = if modifier.has_options {
        Some(roll_option_for_modifier(options, modifier.id, rng)?.id)
    } else {
        None
    };
    Ok((modifier.id, option))
}

#[derive(Debug, Clone)]
pub struct DayController {
    day: Day,
    costs: RerollCosts,
}

impl DayController {
    #[must_use]
    pub fn new(day: Day) -> Self {
        Self::with_costs(day, RerollCosts::default())
    }

    #[must_use]
    pub const fn with_costs(day: Day, costs: RerollCosts) -> Self {
        Self { day, costs }
    }

    #[must_use]
    pub const fn day(&self) -> &Day {
        &self.day
    }

    #[must_use]
    pub const fn costs(&self) -> RerollCosts {
        self.costs
    }

    #[must_use]
    pub fn into_day(self) -> Day {
        self.day
    }

    /// Assign the day's first challenge modifier (and option, if it has a box).
    ///
    /// # Errors
    ///
    /// `DayNotCurrent`, `AlreadyRolled`, or `EmptyCatalog` when the modifier
    /// list, or the chosen modifier's options, are empty.
    pub fn roll_initial_challenge_modifier<R>(
        &mut self,
        game: &Game,
        modifiers: &[ChallengeModifier],
        options: &[ModifierOption],
        rng: &mut R,
    ) -> Result<&Day, DayError>
    where
        R: Rng + ?Sized,
    {
        verify_day_is_current(self.day.number, game.current_day)?;
        if self.day.is_rolled() {
            return Err(DayError::AlreadyRolled);
        }
        let (modifier_id, option_id) = select_modifier(modifiers, options, rng)?;

        self.day.challenge_modifier_id = Some(modifier_id);
        self.day.modifier_option_id = option_id;
        log::debug!(
            "day {} rolled modifier {modifier_id} option {option_id:?}",
            self.day.number
        );
        Ok(&self.day)
    }

    /// Replace the modifier at the challenge reroll price.
    ///
    /// When the new modifier has options, an option is rolled along with it at
    /// no extra charge; otherwise any previous option is cleared.
    ///
    /// # Errors
    ///
    /// `DayNotCurrent`, `NotRolledYet`, `InsufficientTokens`, or `EmptyCatalog`.
    pub fn reroll_challenge_modifier<R>(
        &mut self,
        game: &Game,
        modifiers: &[ChallengeModifier],
        options: &[ModifierOption],
        rng: &mut R,
    ) -> Result<&Day, DayError>
    where
        R: Rng + ?Sized,
    {
        verify_day_is_current(self.day.number, game.current_day)?;
        if !self.day.is_rolled() {
            return Err(DayError::NotRolledYet);
        }
        ensure_tokens(game.current_reroll_tokens, self.costs.challenge_modifier)?;
        let (modifier_id, option_id) = select_modifier(modifiers, options, rng)?;

        self.day.challenge_modifier_rerolls_used += 1;
        self.day.challenge_modifier_id = Some(modifier_id);
        match option_id {
            Some(option_id) => self.apply_option_reroll(option_id, true),
            None => self.day.modifier_option_id = None,
        }
        log::debug!(
            "day {} rerolled modifier to {modifier_id} option {option_id:?} (reroll #{})",
            self.day.number,
            self.day.challenge_modifier_rerolls_used
        );
        Ok(&self.day)
    }

    /// Replace the modifier option; `options` must already be filtered to the
    /// day's modifier.
    ///
    /// # Errors
    ///
    /// `DayNotCurrent`, `NotRolledYet`, `NoOptionToReroll`,
    /// `InsufficientTokens` (paid path only), or `EmptyCatalog`.
    pub fn reroll_modifier_option<R>(
        &mut self,
        current_day: u8,
        options: &[ModifierOption],
        payment: RerollPayment<'_>,
        rng: &mut R,
    ) -> Result<&Day, DayError>
    where
        R: Rng + ?Sized,
    {
        verify_day_is_current(self.day.number, current_day)?;
        if !self.day.is_rolled() {
            return Err(DayError::NotRolledYet);
        }
        if self.day.active_option().is_none() {
            return Err(DayError::NoOptionToReroll);
        }
        let gratis = match payment {
            RerollPayment::Gratis => true,
            RerollPayment::Tokens(game) => {
                ensure_tokens(game.current_reroll_tokens, self.costs.modifier_option)?;
                false
            }
        };
        let option_id = roll_modifier_option(options, rng)?.id;

        self.apply_option_reroll(option_id, gratis);
        log::debug!(
            "day {} rerolled option to {option_id} (gratis: {gratis})",
            self.day.number
        );
        Ok(&self.day)
    }

    /// # Errors
    ///
    /// `DayNotCurrent` or `AlreadyCompleted`.
    pub fn complete_part1(&mut self, current_day: u8) -> Result<&Day, DayError> {
        verify_day_is_current(self.day.number, current_day)?;
        if self.day.part1_completed {
            return Err(DayError::AlreadyCompleted { part: Part::One });
        }
        self.day.part1_completed = true;
        log::debug!("day {} part 1 completed", self.day.number);
        Ok(&self.day)
    }

    /// # Errors
    ///
    /// `DayNotCurrent`, `Part1NotDone`, or `AlreadyCompleted`.
    pub fn complete_part2(&mut self, current_day: u8) -> Result<&Day, DayError> {
        verify_day_is_current(self.day.number, current_day)?;
        if !self.day.part1_completed {
            return Err(DayError::Part1NotDone);
        }
        if self.day.part2_completed {
            return Err(DayError::AlreadyCompleted { part: Part::Two });
        }
        self.day.part2_completed = true;
        log::debug!("day {} part 2 completed", self.day.number);
        Ok(&self.day)
    }

    fn apply_option_reroll(&mut self, option_id: u32, gratis: bool) {
        self.day.modifier_option_rerolls_used += 1;
        if gratis {
            self.day.gratis_option_rerolls += 1;
        }
        self.day.modifier_option_id = Some(option_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const PLAIN: u32 = 1;
    const BOXED: u32 = 2;

    fn modifier(id: u32, has_options: bool) -> ChallengeModifier {
        ChallengeModifier {
            id,
            name: format!("modifier-{id}"),
            text: format!("Modifier {id}"),
            has_options,
            standard: true,
            is_public: true,
        }
    }

    fn option(id: u32, modifier_id: u32) -> ModifierOption {
        ModifierOption {
            id,
            challenge_modifier_id: modifier_id,
            name: format!("option-{id}"),
            text: format!("Option {id}"),
            standard: true,
            is_public: true,
        }
    }

    fn modifiers() -> Vec<ChallengeModifier> {
        vec![modifier(PLAIN, false), modifier(BOXED, true)]
    }

    fn options() -> Vec<ModifierOption> {
        vec![option(10, BOXED), option(11, BOXED), option(20, 3)]
    }

    fn game(current_day: u8, tokens: u32) -> Game {
        Game {
            id: 1,
            user_id: 1,
            number: 1,
            name: "Test Game".to_string(),
            year: 2022,
            player_name: None,
            current_day,
            current_reroll_tokens: tokens,
            starting_reroll_tokens: tokens,
            score: 0,
            title_id: None,
            is_public: false,
            repository_link: None,
            revision: 0,
        }
    }

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(0x0000_5EED)
    }

    fn rolled_day(modifier_id: u32, option_id: Option<u32>) -> Day {
        Day {
            challenge_modifier_id: Some(modifier_id),
            modifier_option_id: option_id,
            ..Day::new(1, 3)
        }
    }

    #[test]
    fn verify_day_is_current_compares_numbers() {
        assert!(verify_day_is_current(4, 4).is_ok());
        assert_eq!(
            verify_day_is_current(3, 4),
            Err(DayError::DayNotCurrent { day: 3, current: 4 })
        );
    }

    #[test]
    fn initial_roll_assigns_modifier_and_matching_option() {
        let mut rng = rng();
        for _ in 0..32 {
            let mut controller = DayController::new(Day::new(1, 3));
            let day = controller
                .roll_initial_challenge_modifier(&game(3, 5), &modifiers(), &options(), &mut rng)
                .unwrap();
            match day.challenge_modifier_id {
                Some(PLAIN) => assert_eq!(day.modifier_option_id, None),
                Some(BOXED) => assert!(matches!(day.modifier_option_id, Some(10 | 11))),
                other => panic!("unexpected modifier {other:?}"),
            }
        }
    }

    #[test]
    fn initial_roll_twice_is_rejected_without_change() {
        let mut rng = rng();
        let mut controller = DayController::new(Day::new(1, 3));
        let first = controller
            .roll_initial_challenge_modifier(&game(3, 5), &modifiers(), &options(), &mut rng)
            .unwrap()
            .clone();
        let err = controller
            .roll_initial_challenge_modifier(&game(3, 5), &modifiers(), &options(), &mut rng)
            .unwrap_err();
        assert_eq!(err, DayError::AlreadyRolled);
        assert_eq!(controller.day(), &first);
    }

    #[test]
    fn initial_roll_on_empty_catalogs_fails_cleanly() {
        let mut rng = rng();
        let mut controller = DayController::new(Day::new(1, 3));
        assert_eq!(
            controller.roll_initial_challenge_modifier(&game(3, 5), &[], &options(), &mut rng),
            Err(DayError::EmptyCatalog)
        );
        let boxed_only = vec![modifier(BOXED, true)];
        assert_eq!(
            controller.roll_initial_challenge_modifier(&game(3, 5), &boxed_only, &[], &mut rng),
            Err(DayError::EmptyCatalog)
        );
        assert_eq!(controller.day(), &Day::new(1, 3));
    }

    #[test]
    fn every_operation_rejects_a_stale_day() {
        let mut rng = rng();
        let stale = game(4, 10);
        let original = Day {
            part1_completed: true,
            ..rolled_day(BOXED, Some(10))
        };
        let mut controller = DayController::new(original.clone());
        let expected = Err(DayError::DayNotCurrent { day: 3, current: 4 });

        assert_eq!(
            controller
                .roll_initial_challenge_modifier(&stale, &modifiers(), &options(), &mut rng)
                .map(Clone::clone),
            expected
        );
        assert_eq!(
            controller
                .reroll_challenge_modifier(&stale, &modifiers(), &options(), &mut rng)
                .map(Clone::clone),
            expected
        );
        assert_eq!(
            controller
                .reroll_modifier_option(4, &options(), RerollPayment::Tokens(&stale), &mut rng)
                .map(Clone::clone),
            expected
        );
        assert_eq!(controller.complete_part1(4).map(Clone::clone), expected);
        assert_eq!(controller.complete_part2(4).map(Clone::clone), expected);
        assert_eq!(controller.day(), &original);
    }

    #[test]
    fn modifier_reroll_needs_prior_roll_and_two_tokens() {
        let mut rng = rng();
        let mut controller = DayController::new(Day::new(1, 3));
        assert_eq!(
            controller.reroll_challenge_modifier(&game(3, 5), &modifiers(), &options(), &mut rng),
            Err(DayError::NotRolledYet)
        );

        let mut controller = DayController::new(rolled_day(PLAIN, None));
        assert_eq!(
            controller.reroll_challenge_modifier(&game(3, 1), &modifiers(), &options(), &mut rng),
            Err(DayError::InsufficientTokens {
                required: 2,
                available: 1
            })
        );
        assert_eq!(controller.day().challenge_modifier_rerolls_used, 0);
        assert_eq!(controller.day().challenge_modifier_id, Some(PLAIN));
    }

    #[test]
    fn modifier_reroll_into_boxed_modifier_rolls_gratis_option() {
        let mut rng = rng();
        let boxed_only = vec![modifier(BOXED, true)];
        let mut controller = DayController::new(rolled_day(PLAIN, None));
        // Exactly the modifier price; the ride-along option must not need more.
        let day = controller
            .reroll_challenge_modifier(&game(3, 2), &boxed_only, &options(), &mut rng)
            .unwrap();
        assert_eq!(day.challenge_modifier_id, Some(BOXED));
        assert!(matches!(day.modifier_option_id, Some(10 | 11)));
        assert_eq!(day.challenge_modifier_rerolls_used, 1);
        assert_eq!(day.modifier_option_rerolls_used, 1);
        assert_eq!(day.gratis_option_rerolls, 1);
    }

    #[test]
    fn modifier_reroll_into_plain_modifier_clears_option() {
        let mut rng = rng();
        let plain_only = vec![modifier(PLAIN, false)];
        let mut controller = DayController::new(rolled_day(BOXED, Some(11)));
        let day = controller
            .reroll_challenge_modifier(&game(3, 2), &plain_only, &options(), &mut rng)
            .unwrap();
        assert_eq!(day.challenge_modifier_id, Some(PLAIN));
        assert_eq!(day.modifier_option_id, None);
        assert_eq!(day.challenge_modifier_rerolls_used, 1);
        assert_eq!(day.modifier_option_rerolls_used, 0);
    }

    #[test]
    fn option_reroll_guards() {
        let mut rng = rng();
        let boxed_options: Vec<ModifierOption> = vec![option(10, BOXED), option(11, BOXED)];

        let mut controller = DayController::new(Day::new(1, 3));
        assert_eq!(
            controller.reroll_modifier_option(3, &boxed_options, RerollPayment::Gratis, &mut rng),
            Err(DayError::NotRolledYet)
        );

        for missing in [None, Some(0)] {
            let mut controller = DayController::new(rolled_day(BOXED, missing));
            assert_eq!(
                controller.reroll_modifier_option(
                    3,
                    &boxed_options,
                    RerollPayment::Tokens(&game(3, 5)),
                    &mut rng
                ),
                Err(DayError::NoOptionToReroll)
            );
        }

        let mut controller = DayController::new(rolled_day(BOXED, Some(10)));
        assert_eq!(
            controller.reroll_modifier_option(
                3,
                &boxed_options,
                RerollPayment::Tokens(&game(3, 0)),
                &mut rng
            ),
            Err(DayError::InsufficientTokens {
                required: 1,
                available: 0
            })
        );
        assert_eq!(controller.day().modifier_option_rerolls_used, 0);
    }

    #[test]
    fn paid_and_gratis_option_rerolls_count_separately() {
        let mut rng = rng();
        let boxed_options: Vec<ModifierOption> = vec![option(10, BOXED), option(11, BOXED)];
        let mut controller = DayController::new(rolled_day(BOXED, Some(10)));

        controller
            .reroll_modifier_option(3, &boxed_options, RerollPayment::Tokens(&game(3, 1)), &mut rng)
            .unwrap();
        let day = controller
            .reroll_modifier_option(3, &boxed_options, RerollPayment::Gratis, &mut rng)
            .unwrap();
        assert_eq!(day.modifier_option_rerolls_used, 2);
        assert_eq!(day.gratis_option_rerolls, 1);
        assert!(matches!(day.modifier_option_id, Some(10 | 11)));
    }

    #[test]
    fn completion_milestones_are_ordered_and_single_shot() {
        let mut controller = DayController::new(rolled_day(PLAIN, None));
        assert_eq!(controller.complete_part2(3), Err(DayError::Part1NotDone));
        assert!(!controller.day().part2_completed);

        assert!(controller.complete_part1(3).unwrap().part1_completed);
        assert_eq!(
            controller.complete_part1(3),
            Err(DayError::AlreadyCompleted { part: Part::One })
        );
        assert!(controller.complete_part2(3).unwrap().part2_completed);
        assert_eq!(
            controller.complete_part2(3),
            Err(DayError::AlreadyCompleted { part: Part::Two })
        );
    }

    #[test]
    fn custom_costs_drive_token_guards() {
        let mut rng = rng();
        let costs = RerollCosts {
            challenge_modifier: 5,
            modifier_option: 3,
        };
        let mut controller = DayController::with_costs(rolled_day(PLAIN, None), costs);
        assert_eq!(
            controller.reroll_challenge_modifier(&game(3, 4), &modifiers(), &options(), &mut rng),
            Err(DayError::InsufficientTokens {
                required: 5,
                available: 4
            })
        );
        assert!(
            controller
                .reroll_challenge_modifier(&game(3, 5), &modifiers(), &options(), &mut rng)
                .is_ok()
        );
        assert_eq!(controller.costs(), costs);
    }
}
