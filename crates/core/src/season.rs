//! Season assembly
//!
//! A season is rebuilt from its immutable definition and the current release
//! snapshot on every read. Everything that depends on "now" takes an explicit
//! `as_of` instant so two snapshots of the same season can be compared.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::points::PointValues;
use crate::releases::{Release, ReleaseMap};
use crate::standings::{rank, tiebreaker_value};
use crate::window::{score_packages, PackageRecord, Window};

/// Data-integrity failures in a season definition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeasonError {
    #[error("Could not find player data for {0}")]
    UnknownPlayer(String),

    #[error("No release data for package {0}")]
    MissingReleases(String),

    #[error("{package} is drafted by both {first} and {second}")]
    DuplicateDraftee {
        package: String,
        first: String,
        second: String,
    },

    #[error("{player} drafted {package}, which is not in the draft pool")]
    NotInPool { player: String, package: String },

    #[error("Season ends ({end}) before it starts ({start})")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Season file as written by the draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonDefinition {
    pub name: String,
    #[serde(default)]
    pub point_values: PointValues,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Players in draft order
    pub players: Vec<SeasonEntry>,
    pub draft_pool: Vec<String>,
}

impl SeasonDefinition {
    pub fn window(&self) -> Window {
        Window::new(self.start, self.end)
    }

    /// Number of draft rounds, taken from the first player's picks
    pub fn rounds(&self) -> usize {
        self.players.first().map(|p| p.draftees.len()).unwrap_or(0)
    }
}

/// One player's picks in a season file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonEntry {
    pub name: String,
    #[serde(default)]
    pub draftees: Vec<String>,
}

/// Entry of `players.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPlayer {
    pub name: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Player identity. The id is the lower-cased name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub photo: String,
    pub active: bool,
}

impl From<&RosterPlayer> for Player {
    fn from(roster: &RosterPlayer) -> Self {
        Self {
            id: roster.name.to_lowercase(),
            name: roster.name.clone(),
            photo: roster.photo.clone(),
            active: roster.active,
        }
    }
}

/// One participant of a season, scored
///
/// Packages are referenced by name; resolve them through
/// [`SeasonRecord::packages_of`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    #[serde(flatten)]
    pub player: Player,
    /// 1-based position in the draft
    pub draft_order: usize,
    /// Drafted package names, by round
    pub draftees: Vec<String>,
    /// Points of each drafted package, by round
    pub points_by_round: Vec<u32>,
    pub total_points: u32,
    pub tiebreaker_value: u64,
    /// 1-based standings position
    pub place: usize,
}

/// Who drafted a package, and in which round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftSlot {
    pub owner: String,
    /// 1-based
    pub round: usize,
}

/// Package name to draft slot, built once per season
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DraftBoard {
    slots: BTreeMap<String, DraftSlot>,
}

impl DraftBoard {
    pub fn from_definition(definition: &SeasonDefinition) -> Result<Self, SeasonError> {
        let mut slots: BTreeMap<String, DraftSlot> = BTreeMap::new();

        for entry in &definition.players {
            for (index, package) in entry.draftees.iter().enumerate() {
                if !definition.draft_pool.contains(package) {
                    return Err(SeasonError::NotInPool {
                        player: entry.name.clone(),
                        package: package.clone(),
                    });
                }

                if let Some(existing) = slots.get(package) {
                    return Err(SeasonError::DuplicateDraftee {
                        package: package.clone(),
                        first: existing.owner.clone(),
                        second: entry.name.clone(),
                    });
                }

                slots.insert(
                    package.clone(),
                    DraftSlot {
                        owner: entry.name.clone(),
                        round: index + 1,
                    },
                );
            }
        }

        Ok(Self { slots })
    }

    pub fn slot(&self, package: &str) -> Option<&DraftSlot> {
        self.slots.get(package)
    }

    pub fn owner_of(&self, package: &str) -> Option<&str> {
        self.slots.get(package).map(|slot| slot.owner.as_str())
    }

}

/// Where a season stands relative to `as_of`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonStatus {
    Upcoming,
    InProgress,
    Ended,
}

/// Whole days and leftover hours until an instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
}

impl TimeRemaining {
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        let left = (to - from).max(Duration::zero());
        Self {
            days: left.num_days(),
            hours: left.num_hours() % 24,
        }
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = |n: i64, one: &'static str, many: &'static str| if n == 1 { one } else { many };

        match (self.days, self.hours) {
            (0, 0) => write!(f, "less than an hour"),
            (0, h) => write!(f, "{h} {}", unit(h, "hour", "hours")),
            (d, 0) => write!(f, "{d} {}", unit(d, "day", "days")),
            (d, h) => write!(
                f,
                "{d} {} & {h} {}",
                unit(d, "day", "days"),
                unit(h, "hour", "hours")
            ),
        }
    }
}

/// A season scored as of one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    pub id: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub as_of: DateTime<Utc>,
    pub is_started: bool,
    pub is_ended: bool,
    pub point_values: PointValues,
    pub rounds: usize,
    /// Every draft-pool package, scored over the season window
    pub packages: BTreeMap<String, PackageRecord>,
    /// Ranked players
    pub players: Vec<PlayerRecord>,
    pub draft_board: DraftBoard,
}

impl SeasonRecord {
    pub fn status(&self) -> SeasonStatus {
        match (self.is_started, self.is_ended) {
            (false, _) => SeasonStatus::Upcoming,
            (true, false) => SeasonStatus::InProgress,
            (true, true) => SeasonStatus::Ended,
        }
    }

    /// Fraction of the season elapsed, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        let total = (self.end - self.start).num_milliseconds();
        if total <= 0 {
            return 1.0;
        }

        let elapsed = (self.as_of - self.start).num_milliseconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn time_remaining(&self) -> TimeRemaining {
        TimeRemaining::between(self.as_of, self.end)
    }

    /// Length of the season in whole days, rounded
    pub fn day_count(&self) -> i64 {
        let hours = (self.end - self.start).num_hours();
        (hours + 12).div_euclid(24)
    }

    pub fn leader(&self) -> Option<&PlayerRecord> {
        self.players.first()
    }

    pub fn winners(&self) -> Vec<&PlayerRecord> {
        self.players.iter().filter(|p| p.place == 1).collect()
    }

    pub fn player(&self, id: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.player.id == id)
    }

    /// A player's drafted packages, by round
    pub fn packages_of<'a>(
        &'a self,
        player: &'a PlayerRecord,
    ) -> impl Iterator<Item = &'a PackageRecord> + 'a {
        player
            .draftees
            .iter()
            .filter_map(move |name| self.packages.get(name))
    }

    /// Every in-window release of a player's packages, oldest first
    pub fn player_releases<'a>(&'a self, player: &'a PlayerRecord) -> Vec<&'a Release> {
        let mut releases: Vec<&'a Release> = self
            .packages_of(player)
            .flat_map(|package| package.releases.iter())
            .collect();
        releases.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.package_name.cmp(&b.package_name))
        });
        releases
    }
}

/// Sum of point totals, saturating at `u32::MAX`
pub fn sum_points(points: impl IntoIterator<Item = u32>) -> u32 {
    points.into_iter().fold(0, u32::saturating_add)
}

/// Score a season as of `as_of`
///
/// Releases are counted inside `[start, min(end, as_of)]`. Fails when the
/// definition references players or packages the inputs do not know about.
pub fn build_season(
    id: &str,
    definition: &SeasonDefinition,
    roster: &[RosterPlayer],
    releases: &ReleaseMap,
    as_of: DateTime<Utc>,
) -> Result<SeasonRecord, SeasonError> {
    if definition.end < definition.start {
        return Err(SeasonError::InvalidWindow {
            start: definition.start,
            end: definition.end,
        });
    }

    let draft_board = DraftBoard::from_definition(definition)?;
    let window = definition.window().clipped_to(as_of);
    let packages = score_packages(
        &definition.draft_pool,
        releases,
        &window,
        &definition.point_values,
    )?;

    let players = definition
        .players
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let roster_entry = roster
                .iter()
                .find(|p| p.name == entry.name)
                .ok_or_else(|| SeasonError::UnknownPlayer(entry.name.clone()))?;

            let points_by_round: Vec<u32> = entry
                .draftees
                .iter()
                .map(|name| {
                    packages
                        .get(name)
                        .map(|package| package.total_points)
                        .ok_or_else(|| SeasonError::MissingReleases(name.clone()))
                })
                .collect::<Result<_, _>>()?;

            Ok(PlayerRecord {
                player: Player::from(roster_entry),
                draft_order: index + 1,
                draftees: entry.draftees.clone(),
                total_points: sum_points(points_by_round.iter().copied()),
                tiebreaker_value: tiebreaker_value(&points_by_round),
                points_by_round,
                place: 0,
            })
        })
        .collect::<Result<Vec<_>, SeasonError>>()?;

    Ok(SeasonRecord {
        id: id.to_string(),
        name: definition.name.clone(),
        start: definition.start,
        end: definition.end,
        as_of,
        is_started: as_of >= definition.start,
        is_ended: as_of >= definition.end,
        point_values: definition.point_values,
        rounds: definition.rounds(),
        packages,
        players: rank(players),
        draft_board,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::points::Bump;
    use chrono::TimeZone;

    pub fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    pub fn release(package: &str, version: &str, seconds: i64, bump: Bump) -> Release {
        Release {
            package_name: package.to_string(),
            version: version.to_string(),
            timestamp: at(seconds),
            bump,
        }
    }

    pub fn roster() -> Vec<RosterPlayer> {
        ["Alice", "Bob", "Carol"]
            .iter()
            .map(|name| RosterPlayer {
                name: name.to_string(),
                photo: format!("/photos/{}.jpg", name.to_lowercase()),
                active: true,
            })
            .collect()
    }

    /// Season over `[0, 100]`. Alice: react, lodash. Bob: vite, zod. `left-pad` undrafted.
    pub fn definition() -> SeasonDefinition {
        SeasonDefinition {
            name: "Season 1".to_string(),
            point_values: PointValues::default(),
            start: at(0),
            end: at(100),
            players: vec![
                SeasonEntry {
                    name: "Alice".to_string(),
                    draftees: vec!["react".to_string(), "lodash".to_string()],
                },
                SeasonEntry {
                    name: "Bob".to_string(),
                    draftees: vec!["vite".to_string(), "zod".to_string()],
                },
            ],
            draft_pool: ["react", "lodash", "vite", "zod", "left-pad"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn releases() -> ReleaseMap {
        let mut map = ReleaseMap::new();
        map.insert(
            "react".to_string(),
            vec![
                release("react", "18.0.0", -50, Bump::Initial),
                release("react", "18.1.0", 10, Bump::Minor),
            ],
        );
        map.insert(
            "lodash".to_string(),
            vec![
                release("lodash", "4.0.0", -50, Bump::Initial),
                release("lodash", "4.0.1", 20, Bump::Patch),
            ],
        );
        map.insert(
            "vite".to_string(),
            vec![
                release("vite", "4.0.0", -50, Bump::Initial),
                release("vite", "5.0.0", 30, Bump::Major),
                release("vite", "5.0.1", 150, Bump::Patch),
            ],
        );
        map.insert(
            "zod".to_string(),
            vec![
                release("zod", "3.0.0", -50, Bump::Initial),
                release("zod", "3.0.1", 40, Bump::Patch),
            ],
        );
        map.insert(
            "left-pad".to_string(),
            vec![
                release("left-pad", "1.0.0", 5, Bump::Initial),
                release("left-pad", "2.0.0", 60, Bump::Major),
            ],
        );
        map
    }
}
