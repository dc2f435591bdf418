//! Advent calendar unlocking and game-level day advancement.
use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::constants::CALENDAR_MONTH;
use crate::rules::RulesConfig;
use crate::state::{Day, Game};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("calendar complete: day {last} is the final day")]
    CalendarComplete { last: u8 },
    #[error("day {day} unlocks on {unlocks_on}")]
    DayLocked { day: u8, unlocks_on: NaiveDate },
    #[error("year {year} has no valid calendar date for day {day}")]
    InvalidDate { year: i32, day: u8 },
}

/// The date day `day` of a `year` calendar opens.
///
/// # Errors
///
/// Returns [`ProgressError::InvalidDate`] when the date does not exist.
pub fn unlock_date(year: i32, day: u8) -> Result<NaiveDate, ProgressError> {
    NaiveDate::from_ymd_opt(year, CALENDAR_MONTH, u32::from(day))
        .ok_or(ProgressError::InvalidDate { year, day })
}

/// How many days of the `year` calendar are open on `today`.
///
/// Nothing is open before December of that year; everything is open once
/// the year is over.
#[must_use]
pub fn unlocked_days(year: i32, today: NaiveDate, calendar_days: u8) -> u8 {
    if today.year() < year || (today.year() == year && today.month() < CALENDAR_MONTH) {
        return 0;
    }
    if today.year() > year {
        return calendar_days;
    }
    let day = u8::try_from(today.day()).unwrap_or(u8::MAX);
    day.min(calendar_days)
}

/// Move `game` onto its next day and return the fresh day record.
///
/// # Errors
///
/// Fails when the calendar is already on its final day or the next day has
/// not unlocked yet.
pub fn advance_day(
    game: &mut Game,
    today: NaiveDate,
    rules: &RulesConfig,
) -> Result<Day, ProgressError> {
    if game.on_final_day(rules) {
        return Err(ProgressError::CalendarComplete {
            last: rules.calendar_days,
        });
    }
    let next = game.current_day + 1;
    if next > unlocked_days(game.year, today, rules.calendar_days) {
        return Err(ProgressError::DayLocked {
            day: next,
            unlocks_on: unlock_date(game.year, next)?,
        });
    }
    game.current_day = next;
    log::info!("game {} advanced to day {next}", game.id);
    Ok(Day::new(game.id, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NewGame;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn game(year: i32) -> Game {
        Game::from_new(
            1,
            1,
            NewGame {
                user_id: 1,
                name: "Test".to_string(),
                year,
                player_name: None,
                is_public: false,
                repository_link: None,
            },
            &RulesConfig::default(),
        )
    }

    #[test]
    fn unlocked_days_follows_december() {
        assert_eq!(unlocked_days(2022, date(2022, 11, 30), 25), 0);
        assert_eq!(unlocked_days(2022, date(2021, 12, 24), 25), 0);
        assert_eq!(unlocked_days(2022, date(2022, 12, 1), 25), 1);
        assert_eq!(unlocked_days(2022, date(2022, 12, 17), 25), 17);
        assert_eq!(unlocked_days(2022, date(2022, 12, 31), 25), 25);
        assert_eq!(unlocked_days(2022, date(2023, 3, 1), 25), 25);
    }

    #[test]
    fn advance_creates_the_next_empty_day() {
        let rules = RulesConfig::default();
        let mut game = game(2022);
        let day = advance_day(&mut game, date(2023, 1, 1), &rules).unwrap();
        assert_eq!(game.current_day, 2);
        assert_eq!(day, Day::new(game.id, 2));
    }

    #[test]
    fn advance_waits_for_unlock() {
        let rules = RulesConfig::default();
        let mut game = game(2022);
        game.current_day = 5;
        let err = advance_day(&mut game, date(2022, 12, 5), &rules).unwrap_err();
        assert_eq!(
            err,
            ProgressError::DayLocked {
                day: 6,
                unlocks_on: date(2022, 12, 6)
            }
        );
        assert_eq!(game.current_day, 5);
    }

    #[test]
    fn advance_stops_at_final_day() {
        let rules = RulesConfig::default();
        let mut game = game(2022);
        game.current_day = 25;
        assert_eq!(
            advance_day(&mut game, date(2024, 1, 1), &rules),
            Err(ProgressError::CalendarComplete { last: 25 })
        );
    }
}
