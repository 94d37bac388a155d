//! Season-wide statistics shown alongside the standings

use serde::Serialize;

use crate::points::Bump;
use crate::season::{sum_points, SeasonRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonStats {
    pub total_points: u32,
    pub drafted_points: u32,
    pub undrafted_points: u32,
    pub total_releases: usize,
    pub major_releases: usize,
    pub minor_releases: usize,
    pub patch_releases: usize,
    /// Share of all points that went to drafted packages
    pub draft_efficiency: Option<f64>,
    /// Draft efficiency divided across players
    pub average_player_efficiency: Option<f64>,
    pub average_points_per_player: Option<f64>,
    pub average_points_per_draftee: Option<f64>,
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

impl SeasonStats {
    pub fn from_season(season: &SeasonRecord) -> Self {
        let total_points = sum_points(season.packages.values().map(|p| p.total_points));
        let drafted_points = sum_points(season.players.iter().map(|p| p.total_points));

        let count = |bump: Bump| -> usize {
            season.packages.values().map(|p| p.count_of(bump)).sum()
        };

        let player_count = season.players.len() as f64;
        let draft_efficiency = ratio(drafted_points as f64, total_points as f64);

        Self {
            total_points,
            drafted_points,
            undrafted_points: total_points.saturating_sub(drafted_points),
            total_releases: season.packages.values().map(|p| p.releases.len()).sum(),
            major_releases: count(Bump::Major),
            minor_releases: count(Bump::Minor),
            patch_releases: count(Bump::Patch),
            draft_efficiency,
            average_player_efficiency: draft_efficiency.and_then(|e| ratio(e, player_count)),
            average_points_per_player: ratio(drafted_points as f64, player_count),
            average_points_per_draftee: ratio(total_points as f64, season.packages.len() as f64),
        }
    }
}

/// `Some(0.4567)` as `45.7%`, `None` as `n/a`
pub fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

/// `Some(2.25)` as `2.3`, `None` as `n/a`
pub fn format_average(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::build_season;
    use crate::points::PointValues;
    use crate::season::fixtures::*;

    #[test]
    fn test_season_stats() {
        let season = build_season("s1", &definition(), &roster(), &releases(), at(200)).unwrap();

        let stats = SeasonStats::from_season(&season);

        // react 3, lodash 1, vite 5, zod 1, left-pad 5
        assert_eq!(stats.total_points, 15);
        assert_eq!(stats.drafted_points, 10);
        assert_eq!(stats.undrafted_points, 5);
        // left-pad's initial release counts as a release but not a bump.
        assert_eq!(stats.total_releases, 6);
        assert_eq!(stats.major_releases, 2);
        assert_eq!(stats.minor_releases, 1);
        assert_eq!(stats.patch_releases, 2);
        assert_eq!(format_percent(stats.draft_efficiency), "66.7%");
        assert_eq!(format_percent(stats.average_player_efficiency), "33.3%");
        assert_eq!(format_average(stats.average_points_per_player), "5.0");
        assert_eq!(format_average(stats.average_points_per_draftee), "3.0");
    }

    #[test]
    fn test_season_stats_totals_saturate() {
        let mut definition = definition();
        definition.point_values = PointValues {
            major: u32::MAX,
            minor: u32::MAX,
            patch: u32::MAX,
        };
        let season = build_season("s1", &definition, &roster(), &releases(), at(200)).unwrap();

        let stats = SeasonStats::from_season(&season);

        assert_eq!(stats.total_points, u32::MAX);
        assert_eq!(stats.drafted_points, u32::MAX);
        assert_eq!(stats.undrafted_points, 0);
    }

    #[test]
    fn test_season_stats_before_any_points() {
        let season = build_season("s1", &definition(), &roster(), &releases(), at(-10)).unwrap();

        let stats = SeasonStats::from_season(&season);

        assert_eq!(stats.total_points, 0);
        assert_eq!(stats.draft_efficiency, None);
        assert_eq!(stats.average_player_efficiency, None);
        assert_eq!(format_percent(stats.draft_efficiency), "n/a");
        assert_eq!(stats.average_points_per_player, Some(0.0));
    }
}
