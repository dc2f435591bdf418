//! Public leaderboard ranking.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::constants::INCOMPLETE_TITLE;
use crate::state::{Game, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub game_id: u32,
    pub year: i32,
    pub name: String,
    pub score: i32,
    pub username: Option<String>,
    pub player_name: Option<String>,
    pub title: String,
    pub repository_link: Option<String>,
}

/// Rank public games by score, highest first.
///
/// Ties fall back to the older calendar year, then to the lower game id.
#[must_use]
pub fn build_leaderboard(
    games: &[Game],
    users: &[User],
    catalog: &Catalog,
) -> Vec<LeaderboardEntry> {
    let usernames: HashMap<u64, &str> = users
        .iter()
        .map(|user| (user.id, user.username.as_str()))
        .collect();

    let mut public: Vec<&Game> = games.iter().filter(|game| game.is_public).collect();
    public.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.year.cmp(&b.year))
            .then_with(|| a.id.cmp(&b.id))
    });

    public
        .into_iter()
        .enumerate()
        .map(|(index, game)| LeaderboardEntry {
            rank: index + 1,
            game_id: game.id,
            year: game.year,
            name: game.name.clone(),
            score: game.score,
            username: usernames.get(&game.user_id).map(|name| (*name).to_string()),
            player_name: game.player_name.clone(),
            title: game
                .title_id
                .and_then(|id| catalog.title(id))
                .map_or_else(|| INCOMPLETE_TITLE.to_string(), |title| title.name.clone()),
            repository_link: game.repository_link.clone(),
        })
        .collect()
}
