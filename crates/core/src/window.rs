//! Scoring a package's classified releases over a time window

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::points::{Bump, PointValues};
use crate::releases::{Release, ReleaseMap};
use crate::season::SeasonError;

/// Inclusive `[start, end]` range of instants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days`-long window that ends at `end`
    ///
    /// `None` when the start would fall outside the representable range.
    pub fn trailing_days(end: DateTime<Utc>, days: i64) -> Option<Self> {
        let start = end.checked_sub_signed(Duration::try_days(days)?)?;
        Some(Self { start, end })
    }

    /// This window with its end pulled back to `as_of` when `as_of` is earlier
    pub fn clipped_to(&self, as_of: DateTime<Utc>) -> Self {
        Self {
            start: self.start,
            end: self.end.min(as_of),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// One package scored over one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub name: String,
    /// Version current at window start. Empty if the package did not exist yet.
    pub initial_version: String,
    /// Version current at window end
    pub final_version: String,
    /// Releases inside the window, oldest first
    pub releases: Vec<Release>,
    /// Saturates at `u32::MAX`
    pub total_points: u32,
}

impl PackageRecord {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            initial_version: String::new(),
            final_version: String::new(),
            releases: Vec::new(),
            total_points: 0,
        }
    }

    fn step(self, release: &Release, window: &Window, point_values: &PointValues) -> Self {
        if release.timestamp < window.start {
            return Self {
                initial_version: release.version.clone(),
                final_version: release.version.clone(),
                ..self
            };
        }

        if !window.contains(release.timestamp) {
            return self;
        }

        let mut releases = self.releases;
        releases.push(release.clone());

        Self {
            final_version: release.version.clone(),
            releases,
            total_points: self
                .total_points
                .saturating_add(point_values.points_for(release.bump)),
            ..self
        }
    }

    /// Releases of the given bump kind inside the window
    pub fn count_of(&self, bump: Bump) -> usize {
        self.releases.iter().filter(|r| r.bump == bump).count()
    }
}

/// Score one package's ordered releases over `window`
///
/// Releases before the window only move the baseline version. Releases after
/// it are ignored entirely.
pub fn window_filter(
    name: &str,
    releases: &[Release],
    window: &Window,
    point_values: &PointValues,
) -> PackageRecord {
    releases
        .iter()
        .fold(PackageRecord::empty(name), |record, release| {
            record.step(release, window, point_values)
        })
}

/// Score every named package, failing on names absent from `releases`
pub fn score_packages<'a, I>(
    names: I,
    releases: &ReleaseMap,
    window: &Window,
    point_values: &PointValues,
) -> Result<BTreeMap<String, PackageRecord>, SeasonError>
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .map(|name| {
            let history = releases
                .get(name)
                .ok_or_else(|| SeasonError::MissingReleases(name.clone()))?;
            Ok((
                name.clone(),
                window_filter(name, history, window, point_values),
            ))
        })
        .collect()
}

/// Packages ordered by total points descending, then name ascending
pub fn by_points<'a>(packages: impl IntoIterator<Item = &'a PackageRecord>) -> Vec<&'a PackageRecord> {
    let mut sorted: Vec<&PackageRecord> = packages.into_iter().collect();
    sorted.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn release(version: &str, seconds: i64, bump: Bump) -> Release {
        Release {
            package_name: "pkg".to_string(),
            version: version.to_string(),
            timestamp: at(seconds),
            bump,
        }
    }

    #[test]
    fn test_window_filter_scenario() {
        let releases = vec![
            release("1.0.0", -5, Bump::Initial),
            release("1.1.0", 2, Bump::Minor),
            release("2.0.0", 8, Bump::Major),
        ];
        let window = Window::new(at(0), at(10));

        let record = window_filter("pkg", &releases, &window, &PointValues::default());

        assert_eq!(record.initial_version, "1.0.0");
        assert_eq!(record.final_version, "2.0.0");
        assert_eq!(record.total_points, 8);
        let versions: Vec<&str> = record.releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["1.1.0", "2.0.0"]);
    }

    #[test]
    fn test_window_filter_total_saturates() {
        let releases = vec![
            release("1.0.0", 1, Bump::Initial),
            release("2.0.0", 2, Bump::Major),
            release("3.0.0", 3, Bump::Major),
        ];
        let window = Window::new(at(0), at(10));
        let point_values = PointValues {
            major: u32::MAX,
            minor: 3,
            patch: 1,
        };

        let record = window_filter("pkg", &releases, &window, &point_values);

        assert_eq!(record.total_points, u32::MAX);
        assert_eq!(record.releases.len(), 3);
    }

    #[test]
    fn test_window_filter_baseline_is_last_release_before_start() {
        let releases = vec![
            release("1.0.0", -20, Bump::Initial),
            release("1.0.1", -10, Bump::Patch),
            release("1.0.2", -1, Bump::Patch),
        ];
        let window = Window::new(at(0), at(10));

        let record = window_filter("pkg", &releases, &window, &PointValues::default());

        assert_eq!(record.initial_version, "1.0.2");
        assert_eq!(record.final_version, "1.0.2");
        assert!(record.releases.is_empty());
        assert_eq!(record.total_points, 0);
    }

    #[test]
    fn test_window_filter_ignores_releases_after_end() {
        let releases = vec![
            release("1.0.0", -5, Bump::Initial),
            release("1.0.1", 3, Bump::Patch),
            release("2.0.0", 11, Bump::Major),
        ];
        let window = Window::new(at(0), at(10));

        let record = window_filter("pkg", &releases, &window, &PointValues::default());

        assert_eq!(record.final_version, "1.0.1");
        assert_eq!(record.total_points, 1);
    }

    #[test]
    fn test_window_filter_bounds_are_inclusive() {
        let releases = vec![
            release("1.0.0", 0, Bump::Initial),
            release("1.0.1", 10, Bump::Patch),
        ];
        let window = Window::new(at(0), at(10));

        let record = window_filter("pkg", &releases, &window, &PointValues::default());

        assert_eq!(record.releases.len(), 2);
        assert_eq!(record.total_points, 1);
    }

    #[test]
    fn test_window_filter_package_created_inside_window() {
        let releases = vec![
            release("0.1.0", 1, Bump::Initial),
            release("0.2.0", 2, Bump::Minor),
        ];
        let window = Window::new(at(0), at(10));

        let record = window_filter("pkg", &releases, &window, &PointValues::default());

        assert_eq!(record.initial_version, "");
        assert_eq!(record.final_version, "0.2.0");
        // The initial release is listed but scores nothing.
        assert_eq!(record.releases.len(), 2);
        assert_eq!(record.total_points, 3);
    }

    #[test]
    fn test_window_filter_no_releases() {
        let record = window_filter(
            "pkg",
            &[],
            &Window::new(at(0), at(10)),
            &PointValues::default(),
        );

        assert_eq!(record.initial_version, "");
        assert_eq!(record.final_version, "");
        assert!(record.releases.is_empty());
        assert_eq!(record.total_points, 0);
    }

    #[test]
    fn test_window_filter_point_total_consistency() {
        let values = PointValues {
            major: 7,
            minor: 2,
            patch: 1,
        };
        let releases = vec![
            release("1.0.0", -3, Bump::Initial),
            release("1.0.1", 1, Bump::Patch),
            release("1.1.0", 2, Bump::Minor),
            release("1.1.1", 3, Bump::Patch),
            release("2.0.0", 4, Bump::Major),
            release("2.1.0", 5, Bump::Minor),
        ];

        let record = window_filter("pkg", &releases, &Window::new(at(0), at(10)), &values);

        let expected: u32 = record
            .releases
            .iter()
            .filter(|r| r.bump != Bump::Initial)
            .map(|r| values.points_for(r.bump))
            .sum();
        assert_eq!(record.total_points, expected);
        assert_eq!(record.total_points, 13);
        assert_eq!(record.count_of(Bump::Patch), 2);
    }

    #[test]
    fn test_score_packages_missing_package_fails() {
        let mut releases = ReleaseMap::new();
        releases.insert("present".to_string(), vec![]);
        let names = vec!["present".to_string(), "absent".to_string()];

        let result = score_packages(
            &names,
            &releases,
            &Window::new(at(0), at(10)),
            &PointValues::default(),
        );

        assert!(matches!(result, Err(SeasonError::MissingReleases(name)) if name == "absent"));
    }

    #[test]
    fn test_by_points_orders_by_points_then_name() {
        let mut a = PackageRecord::empty("beta");
        a.total_points = 3;
        let mut b = PackageRecord::empty("alpha");
        b.total_points = 3;
        let mut c = PackageRecord::empty("gamma");
        c.total_points = 9;

        let sorted: Vec<&str> = by_points([&a, &b, &c])
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();

        assert_eq!(sorted, vec!["gamma", "alpha", "beta"]);
    }

    #[test]
    fn test_window_clipped_and_trailing() {
        let window = Window::new(at(0), at(100));
        assert_eq!(window.clipped_to(at(50)).end, at(50));
        assert_eq!(window.clipped_to(at(500)).end, at(100));

        let trailing = Window::trailing_days(at(0), 7).unwrap();
        assert_eq!(trailing.end - trailing.start, Duration::days(7));
        assert!(trailing.contains(at(0)));
        assert!(!trailing.contains(at(1)));
    }

    #[test]
    fn test_trailing_days_out_of_range() {
        assert_eq!(Window::trailing_days(at(0), 1_000_000_000_000), None);
        assert_eq!(Window::trailing_days(at(0), i64::MAX), None);
    }
}
