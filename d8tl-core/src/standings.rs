//! Division standings computed from game results.
//!
//! Only games with a recorded final score (`played`) count. Ties are
//! worth half a win in the percentage. Postponed and cancelled games
//! are ignored entirely.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Game, GameStatus, Team};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_id: Uuid,
    pub team: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub runs_scored: i64,
    pub runs_allowed: i64,
    pub win_pct: f64,
}

impl StandingsRow {
    fn new(team: &Team) -> Self {
        Self {
            team_id: team.id,
            team: team.name.clone(),
            wins: 0,
            losses: 0,
            ties: 0,
            runs_scored: 0,
            runs_allowed: 0,
            win_pct: 0.0,
        }
    }

    fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

/// Standings for one division. Teams without a played game appear with
/// a zero record so the table is complete.
pub fn compute(teams: &[Team], games: &[Game]) -> Vec<StandingsRow> {
    let mut rows: HashMap<Uuid, StandingsRow> = teams
        .iter()
        .map(|team| (team.id, StandingsRow::new(team)))
        .collect();

    for game in games {
        if game.status != GameStatus::Played {
            continue;
        }
        let (Some(home_score), Some(away_score)) = (game.home_score, game.away_score) else {
            continue;
        };

        if let Some(row) = rows.get_mut(&game.home_team_id) {
            row.runs_scored += home_score;
            row.runs_allowed += away_score;
            match home_score.cmp(&away_score) {
                Ordering::Greater => row.wins += 1,
                Ordering::Less => row.losses += 1,
                Ordering::Equal => row.ties += 1,
            }
        }
        if let Some(row) = rows.get_mut(&game.away_team_id) {
            row.runs_scored += away_score;
            row.runs_allowed += home_score;
            match away_score.cmp(&home_score) {
                Ordering::Greater => row.wins += 1,
                Ordering::Less => row.losses += 1,
                Ordering::Equal => row.ties += 1,
            }
        }
    }

    let mut rows: Vec<StandingsRow> = rows
        .into_values()
        .map(|mut row| {
            let played = row.games_played();
            if played > 0 {
                row.win_pct = (f64::from(row.wins) + 0.5 * f64::from(row.ties)) / f64::from(played);
            }
            row
        })
        .collect();

    rows.sort_by(|a, b| {
        b.win_pct
            .partial_cmp(&a.win_pct)
            .unwrap_or(Ordering::Equal)
            .then(b.wins.cmp(&a.wins))
            .then(a.runs_allowed.cmp(&b.runs_allowed))
            .then(a.team.cmp(&b.team))
    });
    rows
}
