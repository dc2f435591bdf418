//! Uniform random selection over catalog slices.
use rand::Rng;

use crate::catalog::{ChallengeModifier, ModifierOption};
use crate::error::DayError;

/// Pick one element uniformly at random.
///
/// # Errors
///
/// Returns [`DayError::EmptyCatalog`] when `items` is empty.
pub fn pick_uniform<'a, T, R>(items: &'a [T], rng: &mut R) -> Result<&'a T, DayError>
where
    R: Rng + ?Sized,
{
    if items.is_empty() {
        return Err(DayError::EmptyCatalog);
    }
    let roll = rng.gen_range(0..items.len());
    Ok(&items[roll])
}

/// Pick uniformly among the elements accepted by `predicate`.
///
/// # Errors
///
/// Returns [`DayError::EmptyCatalog`] when no element passes the filter.
pub fn pick_uniform_where<'a, T, R, P>(
    items: &'a [T],
    mut predicate: P,
    rng: &mut R,
) -> Result<&'a T, DayError>
where
    R: Rng + ?Sized,
    P: FnMut(&T) -> bool,
{
    let candidates: Vec<&T> = items.iter().filter(|item| predicate(*item)).collect();
    if candidates.is_empty() {
        return Err(DayError::EmptyCatalog);
    }
    let roll = rng.gen_range(0..candidates.len());
    Ok(candidates[roll])
}

/// Select a challenge modifier from the full modifier catalog.
///
/// # Errors
///
/// Returns [`DayError::EmptyCatalog`] when the catalog is empty.
pub fn roll_challenge_modifier<'a, R>(
    modifiers: &'a [ChallengeModifier],
    rng: &mut R,
) -> Result<&'a ChallengeModifier, DayError>
where
    R: Rng + ?Sized,
{
    pick_uniform(modifiers, rng)
}

/// Select a modifier option from an already filtered option list.
///
/// # Errors
///
/// Returns [`DayError::EmptyCatalog`] when the list is empty.
pub fn roll_modifier_option<'a, R>(
    options: &'a [ModifierOption],
    rng: &mut R,
) -> Result<&'a ModifierOption, DayError>
where
    R: Rng + ?Sized,
{
    pick_uniform(options, rng)
}

/// Select an option belonging to `modifier_id` out of a mixed option list.
///
/// # Errors
///
/// Returns [`DayError::EmptyCatalog`] when the modifier has no options.
pub fn roll_option_for_modifier<'a, R>(
    options: &'a [ModifierOption],
    modifier_id: u32,
    rng: &mut R,
) -> Result<&'a ModifierOption, DayError>
where
    R: Rng + ?Sized,
{
    pick_uniform_where(
        options,
        |option| option.challenge_modifier_id == modifier_id,
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashMap;

    fn option(id: u32, modifier: u32) -> ModifierOption {
        ModifierOption {
            id,
            challenge_modifier_id: modifier,
            name: format!("opt-{id}"),
            text: format!("Option {id}"),
            standard: true,
            is_public: true,
        }
    }

    #[test]
    fn single_element_is_always_selected() {
        let mut rng = SmallRng::seed_from_u64(11);
        let items = [42_u32];
        for _ in 0..20 {
            assert_eq!(*pick_uniform(&items, &mut rng).unwrap(), 42);
        }
    }

    #[test]
    fn empty_input_fails_explicitly() {
        let mut rng = SmallRng::seed_from_u64(11);
        let items: [u32; 0] = [];
        assert_eq!(pick_uniform(&items, &mut rng), Err(DayError::EmptyCatalog));
        assert_eq!(
            roll_modifier_option(&[], &mut rng),
            Err(DayError::EmptyCatalog)
        );
        assert_eq!(
            roll_challenge_modifier(&[], &mut rng),
            Err(DayError::EmptyCatalog)
        );
    }

    #[test]
    fn selection_covers_every_element() {
        let mut rng = SmallRng::seed_from_u64(0xC0FFEE);
        let items = [1_u32, 2, 3, 4];
        let mut seen: HashMap<u32, usize> = HashMap::new();
        for _ in 0..4_000 {
            *seen.entry(*pick_uniform(&items, &mut rng).unwrap()).or_default() += 1;
        }
        assert_eq!(seen.len(), 4);
        for count in seen.values() {
            assert!((800..=1_200).contains(count), "skewed draw: {seen:?}");
        }
    }

    #[test]
    fn filtered_selection_respects_predicate() {
        let mut rng = SmallRng::seed_from_u64(5);
        let options = vec![option(1, 10), option(2, 20), option(3, 20), option(4, 30)];
        for _ in 0..50 {
            let picked = roll_option_for_modifier(&options, 20, &mut rng).unwrap();
            assert_eq!(picked.challenge_modifier_id, 20);
        }
        assert_eq!(
            roll_option_for_modifier(&options, 99, &mut rng),
            Err(DayError::EmptyCatalog)
        );
    }
}
