//! Draft helpers: pick order, season end date and the season file produced by
//! a completed draft.

use chrono::{DateTime, Duration, DurationRound, Utc};
use regex::Regex;
use serde::Serialize;

use crate::points::PointValues;
use crate::season::{SeasonDefinition, SeasonEntry};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("A draft needs at least one player")]
    NoPlayers,

    #[error("{player} is in the draft more than once")]
    DuplicatePlayer { player: String },

    #[error("A {days}-day season ends past the latest representable date")]
    SeasonLength { days: u32 },

    #[error("Expected {expected} picks ({rounds} rounds), got {actual}")]
    PickCount {
        expected: usize,
        actual: usize,
        rounds: usize,
    },

    #[error("{package} is not in the draft pool")]
    NotInPool { package: String },

    #[error("{package} was already drafted")]
    AlreadyPicked { package: String },
}

/// One slot of the pick order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pick {
    pub player: String,
    /// Index of the player in draft order
    pub seat: usize,
    /// 1-based
    pub round: usize,
}

/// Snake order: even rounds run forward, odd rounds run in reverse
pub fn pick_order(players: &[String], rounds: usize) -> Vec<Pick> {
    (0..rounds)
        .flat_map(|round_index| {
            let seats: Box<dyn Iterator<Item = usize>> = if round_index % 2 == 1 {
                Box::new((0..players.len()).rev())
            } else {
                Box::new(0..players.len())
            };

            seats.map(move |seat| Pick {
                player: players[seat].clone(),
                seat,
                round: round_index + 1,
            })
        })
        .collect()
}

/// Season end: `days` after `start`, rounded down to the hour
pub fn season_end(start: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, DraftError> {
    let end = Duration::try_days(i64::from(days))
        .and_then(|length| start.checked_add_signed(length))
        .ok_or(DraftError::SeasonLength { days })?;

    Ok(end.duration_trunc(Duration::hours(1)).unwrap_or(end))
}

/// Default file stem for a season: lower-cased, non-alphanumerics as `-`
pub fn season_file_stem(name: &str) -> String {
    let re = Regex::new(r"[^a-z0-9]").expect("static regex");
    re.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// Everything a draft needs besides the picks
#[derive(Debug, Clone)]
pub struct DraftSetup {
    pub name: String,
    pub start: DateTime<Utc>,
    pub days: u32,
    /// Players in draft order
    pub players: Vec<String>,
    pub draft_pool: Vec<String>,
    pub point_values: PointValues,
    pub rounds: usize,
}

/// Apply `picks` in snake order and produce the season file
///
/// Every pick must come from the pool and can only be taken once. Player
/// names must be distinct ignoring case.
pub fn run_draft(setup: &DraftSetup, picks: &[String]) -> Result<SeasonDefinition, DraftError> {
    if setup.players.is_empty() {
        return Err(DraftError::NoPlayers);
    }
    for (index, player) in setup.players.iter().enumerate() {
        let id = player.to_lowercase();
        if setup.players[..index].iter().any(|p| p.to_lowercase() == id) {
            return Err(DraftError::DuplicatePlayer {
                player: player.clone(),
            });
        }
    }
    let end = season_end(setup.start, setup.days)?;

    let order = pick_order(&setup.players, setup.rounds);
    if picks.len() != order.len() {
        return Err(DraftError::PickCount {
            expected: order.len(),
            actual: picks.len(),
            rounds: setup.rounds,
        });
    }

    let mut entries: Vec<SeasonEntry> = setup
        .players
        .iter()
        .map(|name| SeasonEntry {
            name: name.clone(),
            draftees: Vec::with_capacity(setup.rounds),
        })
        .collect();
    let mut taken: Vec<&String> = Vec::with_capacity(picks.len());

    for (slot, package) in order.iter().zip(picks) {
        if !setup.draft_pool.contains(package) {
            return Err(DraftError::NotInPool {
                package: package.clone(),
            });
        }
        if taken.contains(&package) {
            return Err(DraftError::AlreadyPicked {
                package: package.clone(),
            });
        }
        taken.push(package);

        entries[slot.seat].draftees.push(package.clone());
    }

    Ok(SeasonDefinition {
        name: setup.name.clone(),
        point_values: setup.point_values,
        start: setup.start,
        end,
        players: entries,
        draft_pool: setup.draft_pool.clone(),
    })
}
