//! Typed failures for day progression.
use thiserror::Error;

/// Which completion milestone an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    One,
    Two,
}

impl std::fmt::Display for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => write!(f, "1"),
            Self::Two => write!(f, "2"),
        }
    }
}

/// Rejections raised by the day state machine and the selection helpers.
///
/// None of these are fatal; each maps to an ordinary rejected request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DayError {
    #[error("day {day} is not the current day (current is {current})")]
    DayNotCurrent { day: u8, current: u8 },
    #[error("challenge modifier already rolled")]
    AlreadyRolled,
    #[error("roll initial challenge modifier first")]
    NotRolledYet,
    #[error("not enough reroll tokens (need {required}, have {available})")]
    InsufficientTokens { required: u32, available: u32 },
    #[error("no modifier option to reroll")]
    NoOptionToReroll,
    #[error("part {part} already completed")]
    AlreadyCompleted { part: Part },
    #[error("part 1 not yet completed")]
    Part1NotDone,
    #[error("cannot select from an empty catalog")]
    EmptyCatalog,
}
