//! Periodic season announcements
//!
//! An announcement covers the releases published since the previous run and
//! how the standings moved because of them. The previous standings come from
//! the same season pipeline evaluated at the `since` cutoff.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::points::Bump;
use crate::releases::ReleaseMap;
use crate::season::{build_season, RosterPlayer, SeasonDefinition, SeasonError, TimeRemaining};
use crate::standings::{rank_changes, RankChange};

/// A release published inside the announcement window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRelease {
    pub package_name: String,
    pub version: String,
    pub bump: Bump,
    pub timestamp: DateTime<Utc>,
    /// Drafting player, if anyone drafted the package
    pub owner: Option<String>,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub season_id: String,
    pub season_name: String,
    pub ended: bool,
    /// Fraction of the season elapsed at `now`
    pub progress: f64,
    pub time_remaining: TimeRemaining,
    pub new_releases: Vec<NewRelease>,
    pub standings: Vec<RankChange>,
    pub winners: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum AnnouncementOutcome {
    /// `now` is before the season start
    NotStarted,
    /// The season ended before `since`
    AlreadyEnded,
    /// Nothing new and the season is still running
    Quiet,
    Announce(Announcement),
}

/// Decide whether a season has anything to announce between `since` and `now`
pub fn compose_announcement(
    id: &str,
    definition: &SeasonDefinition,
    roster: &[RosterPlayer],
    releases: &ReleaseMap,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<AnnouncementOutcome, SeasonError> {
    if now < definition.start {
        return Ok(AnnouncementOutcome::NotStarted);
    }
    if since > definition.end {
        return Ok(AnnouncementOutcome::AlreadyEnded);
    }

    let current = build_season(id, definition, roster, releases, now)?;
    // Everything published strictly before `since`.
    let previous = build_season(
        id,
        definition,
        roster,
        releases,
        since - Duration::milliseconds(1),
    )?;

    let mut new_releases: Vec<NewRelease> = current
        .packages
        .values()
        .flat_map(|package| package.releases.iter())
        .filter(|release| release.timestamp >= since)
        .map(|release| NewRelease {
            package_name: release.package_name.clone(),
            version: release.version.clone(),
            bump: release.bump,
            timestamp: release.timestamp,
            owner: current
                .draft_board
                .owner_of(&release.package_name)
                .map(str::to_string),
            points: current.point_values.points_for(release.bump),
        })
        .collect();
    new_releases.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.package_name.cmp(&b.package_name))
    });

    if new_releases.is_empty() && !current.is_ended {
        return Ok(AnnouncementOutcome::Quiet);
    }

    Ok(AnnouncementOutcome::Announce(Announcement {
        season_id: current.id.clone(),
        season_name: current.name.clone(),
        ended: current.is_ended,
        progress: current.progress(),
        time_remaining: current.time_remaining(),
        new_releases,
        standings: rank_changes(&current.players, &previous.players),
        winners: current
            .winners()
            .into_iter()
            .map(|p| p.player.name.clone())
            .collect(),
    }))
}

/// "A", "A and B", "A, B, and C"
pub fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::fixtures::*;

    fn announce(since: i64, now: i64) -> AnnouncementOutcome {
        compose_announcement(
            "s1",
            &definition(),
            &roster(),
            &releases(),
            at(since),
            at(now),
        )
        .unwrap()
    }

    fn expect_announcement(outcome: AnnouncementOutcome) -> Announcement {
        match outcome {
            AnnouncementOutcome::Announce(announcement) => announcement,
            other => panic!("expected an announcement, got {other:?}"),
        }
    }

    #[test]
    fn test_not_started() {
        assert_eq!(announce(-20, -10), AnnouncementOutcome::NotStarted);
    }

    #[test]
    fn test_already_ended() {
        assert_eq!(announce(150, 200), AnnouncementOutcome::AlreadyEnded);
    }

    #[test]
    fn test_quiet_when_nothing_new() {
        // Nothing is published between t=41 and t=55.
        assert_eq!(announce(41, 55), AnnouncementOutcome::Quiet);
    }

    #[test]
    fn test_new_releases_and_rank_movement() {
        // Alice leads at t=25 (4 points); Bob overtakes with vite 5.0.0 and zod 3.0.1.
        let announcement = expect_announcement(announce(25, 50));

        assert!(!announcement.ended);
        let new: Vec<(&str, Option<&str>, u32)> = announcement
            .new_releases
            .iter()
            .map(|r| (r.version.as_str(), r.owner.as_deref(), r.points))
            .collect();
        assert_eq!(
            new,
            vec![("5.0.0", Some("Bob"), 5), ("3.0.1", Some("Bob"), 1)]
        );

        assert_eq!(announcement.standings[0].name, "Bob");
        assert_eq!(announcement.standings[0].arrows(), "↑");
        assert_eq!(announcement.standings[1].name, "Alice");
        assert_eq!(announcement.standings[1].arrows(), "↓");
        assert!((announcement.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_undrafted_release_has_no_owner() {
        let announcement = expect_announcement(announce(55, 65));

        assert_eq!(announcement.new_releases.len(), 1);
        assert_eq!(announcement.new_releases[0].package_name, "left-pad");
        assert_eq!(announcement.new_releases[0].owner, None);
    }

    #[test]
    fn test_release_at_since_counts_as_new() {
        let announcement = expect_announcement(announce(30, 35));

        assert_eq!(announcement.new_releases.len(), 1);
        assert_eq!(announcement.new_releases[0].version, "5.0.0");
    }

    #[test]
    fn test_season_end_announces_winner() {
        let announcement = expect_announcement(announce(90, 120));

        assert!(announcement.ended);
        assert!(announcement.new_releases.is_empty());
        assert_eq!(announcement.winners, vec!["Bob".to_string()]);
        // vite 5.0.1 at t=150 is after both the season end and `now`.
        assert_eq!(announcement.standings[0].total_points, 6);
    }

    #[test]
    fn test_join_names() {
        let names = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(join_names(&names(&[])), "");
        assert_eq!(join_names(&names(&["A"])), "A");
        assert_eq!(join_names(&names(&["A", "B"])), "A and B");
        assert_eq!(join_names(&names(&["A", "B", "C"])), "A, B, and C");
    }
}
