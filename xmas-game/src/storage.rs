//! In-process storage backend.
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::GameStorage;
use crate::state::{Day, Game, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("game {game_id} was modified concurrently (expected revision {expected}, found {found})")]
    Conflict {
        game_id: u32,
        expected: u64,
        found: u64,
    },
    #[error("game {0} does not exist")]
    MissingGame(u32),
    #[error("day {number} belongs to game {day_game}, not game {game_id}")]
    DayGameMismatch {
        game_id: u32,
        day_game: u32,
        number: u8,
    },
    #[error("storage lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    games: BTreeMap<u32, Game>,
    days: BTreeMap<(u32, u8), Day>,
    next_game_id: u32,
    next_day_id: u32,
}

impl Tables {
    fn check_revision(&self, game: &Game) -> Result<(), StorageError> {
        let stored = self
            .games
            .get(&game.id)
            .ok_or(StorageError::MissingGame(game.id))?;
        if stored.revision != game.revision {
            return Err(StorageError::Conflict {
                game_id: game.id,
                expected: game.revision,
                found: stored.revision,
            });
        }
        Ok(())
    }

    fn store_game(&mut self, game: &Game) -> Game {
        let mut saved = game.clone();
        saved.revision += 1;
        self.games.insert(saved.id, saved.clone());
        saved
    }
}

/// Thread-safe in-memory tables with optimistic revision checks.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl GameStorage for MemoryStorage {
    type Error = StorageError;

    fn upsert_user(&self, user: User) -> Result<User, Self::Error> {
        let mut tables = self.lock()?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn load_user(&self, id: u64) -> Result<Option<User>, Self::Error> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn insert_game(&self, game: Game) -> Result<Game, Self::Error> {
        let mut tables = self.lock()?;
        tables.next_game_id += 1;
        let mut game = game;
        game.id = tables.next_game_id;
        game.revision = 0;
        tables.games.insert(game.id, game.clone());
        Ok(game)
    }

    fn load_game(&self, id: u32) -> Result<Option<Game>, Self::Error> {
        Ok(self.lock()?.games.get(&id).cloned())
    }

    fn games_for_user(&self, user_id: u64) -> Result<Vec<Game>, Self::Error> {
        Ok(self
            .lock()?
            .games
            .values()
            .filter(|game| game.user_id == user_id)
            .cloned()
            .collect())
    }

    fn all_games(&self) -> Result<Vec<Game>, Self::Error> {
        Ok(self.lock()?.games.values().cloned().collect())
    }

    fn load_day(&self, game_id: u32, number: u8) -> Result<Option<Day>, Self::Error> {
        Ok(self.lock()?.days.get(&(game_id, number)).cloned())
    }

    fn days_for_game(&self, game_id: u32) -> Result<Vec<Day>, Self::Error> {
        Ok(self
            .lock()?
            .days
            .range((game_id, u8::MIN)..=(game_id, u8::MAX))
            .map(|(_, day)| day.clone())
            .collect())
    }

    fn save_game(&self, game: &Game) -> Result<Game, Self::Error> {
        let mut tables = self.lock()?;
        tables.check_revision(game)?;
        Ok(tables.store_game(game))
    }

    fn commit(&self, game: &Game, day: &Day) -> Result<(Game, Day), Self::Error> {
        if day.game_id != game.id {
            return Err(StorageError::DayGameMismatch {
                game_id: game.id,
                day_game: day.game_id,
                number: day.number,
            });
        }
        let mut tables = self.lock()?;
        tables.check_revision(game)?;

        let mut day = day.clone();
        if day.id == 0 {
            tables.next_day_id += 1;
            day.id = tables.next_day_id;
        }
        tables.days.insert((day.game_id, day.number), day.clone());
        let game = tables.store_game(game);
        Ok((game, day))
    }
}
