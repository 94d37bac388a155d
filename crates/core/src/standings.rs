//! Standings: tiebreaker encoding, ranking, and rank movement between two
//! snapshots of the same season.

use serde::Serialize;
use std::cmp::Ordering;

use crate::season::PlayerRecord;

/// Numeric width of one tiebreaker tier
///
/// Each drafted package occupies two decimal digits of the tiebreaker value,
/// so a single package scoring 100 points or more spills into the next tier
/// and distorts the comparison. Seasons are not expected to get there.
pub const TIEBREAKER_TIER: u64 = 100;

/// Encode a player's package totals into a single comparable integer
///
/// Totals are sorted descending and folded as `points * 100^index`.
/// Saturates instead of overflowing on unusually long drafts.
pub fn tiebreaker_value(package_points: &[u32]) -> u64 {
    let mut sorted = package_points.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    sorted
        .iter()
        .enumerate()
        .fold(0u64, |value, (index, &points)| {
            let scale = u32::try_from(index)
                .ok()
                .and_then(|exp| TIEBREAKER_TIER.checked_pow(exp))
                .unwrap_or(u64::MAX);
            value.saturating_add(u64::from(points).saturating_mul(scale))
        })
}

/// Standings order: points desc, tiebreaker desc, draft order asc
pub fn standings_order(a: &PlayerRecord, b: &PlayerRecord) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| b.tiebreaker_value.cmp(&a.tiebreaker_value))
        .then_with(|| a.draft_order.cmp(&b.draft_order))
}

/// Order players and assign 1-based places
///
/// With unique draft orders every player receives a distinct place.
pub fn rank(mut players: Vec<PlayerRecord>) -> Vec<PlayerRecord> {
    players.sort_by(standings_order);

    players
        .into_iter()
        .enumerate()
        .map(|(index, player)| PlayerRecord {
            place: index + 1,
            ..player
        })
        .collect()
}

/// A player's place now and at an earlier cutoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankChange {
    pub player_id: String,
    pub name: String,
    pub total_points: u32,
    pub place: usize,
    pub previous_place: usize,
}

impl RankChange {
    /// Places gained (positive) or lost (negative)
    pub fn movement(&self) -> i64 {
        self.previous_place as i64 - self.place as i64
    }

    /// One arrow per place moved
    pub fn arrows(&self) -> String {
        match self.movement() {
            0 => String::new(),
            m if m > 0 => "↑".repeat(m as usize),
            m => "↓".repeat(m.unsigned_abs() as usize),
        }
    }
}

/// Pair current standings with the places from an earlier snapshot
///
/// Both inputs must be ranked. A player missing from `previous` keeps their
/// current place as the previous one.
pub fn rank_changes(current: &[PlayerRecord], previous: &[PlayerRecord]) -> Vec<RankChange> {
    let mut changes: Vec<RankChange> = current
        .iter()
        .map(|player| {
            let previous_place = previous
                .iter()
                .find(|p| p.player.id == player.player.id)
                .map(|p| p.place)
                .unwrap_or(player.place);

            RankChange {
                player_id: player.player.id.clone(),
                name: player.player.name.clone(),
                total_points: player.total_points,
                place: player.place,
                previous_place,
            }
        })
        .collect();

    changes.sort_by_key(|change| change.place);
    changes
}
