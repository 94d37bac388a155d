//! Release classification
//!
//! Turns the raw publish history of a package into the monotonic sequence of
//! releases the game scores. Entries that are not plain semantic versions, and
//! entries that do not move the version forward, are dropped as noise.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::points::Bump;

/// Classified releases keyed by package name
pub type ReleaseMap = BTreeMap<String, Vec<Release>>;

/// One `(version, published at)` entry as reported by a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelease {
    pub version: String,
    pub published_at: DateTime<Utc>,
}

impl RawRelease {
    pub fn new(version: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            published_at,
        }
    }
}

/// One accepted release of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub package_name: String,
    pub version: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub bump: Bump,
}

/// Parse a version string the way registries publish them
///
/// Accepts an optional leading `v` and surrounding whitespace. Returns `None`
/// for anything that is not a valid semantic version or that carries a
/// prerelease tag.
pub fn parse_release_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let parsed = Version::parse(trimmed).ok()?;

    if parsed.pre.is_empty() {
        Some(parsed)
    } else {
        None
    }
}

/// Semantic-version precedence. Build metadata never participates.
fn precedence(version: &Version) -> (u64, u64, u64) {
    (version.major, version.minor, version.patch)
}

/// Bump kind of `next` relative to `previous`, by component comparison
pub fn bump_between(previous: &Version, next: &Version) -> Bump {
    if next.major > previous.major {
        Bump::Major
    } else if next.minor > previous.minor {
        Bump::Minor
    } else {
        Bump::Patch
    }
}

struct Candidate<'a> {
    raw: &'a str,
    version: Version,
    published_at: DateTime<Utc>,
}

impl Candidate<'_> {
    fn chronological(&self, other: &Self) -> Ordering {
        self.published_at
            .cmp(&other.published_at)
            .then_with(|| precedence(&self.version).cmp(&precedence(&other.version)))
            .then_with(|| self.raw.cmp(other.raw))
    }
}

/// Classify the full publish history of one package
///
/// The result is ordered by publish time with strictly increasing versions.
/// The first accepted entry is always [`Bump::Initial`]. Publishes sharing a
/// timestamp are ordered by version, so the output does not depend on the
/// order of `history`.
pub fn classify(package_name: &str, history: &[RawRelease]) -> Vec<Release> {
    let mut candidates: Vec<Candidate> = history
        .iter()
        .filter_map(|entry| {
            parse_release_version(&entry.version).map(|version| Candidate {
                raw: entry.version.trim(),
                version,
                published_at: entry.published_at,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.chronological(b));

    let (_, releases) = candidates.into_iter().fold(
        (None::<Version>, Vec::new()),
        |(previous, mut releases), candidate| {
            let bump = match &previous {
                None => Some(Bump::Initial),
                Some(prev) if precedence(&candidate.version) > precedence(prev) => {
                    Some(bump_between(prev, &candidate.version))
                }
                // Republish or backport; the previous release stays current.
                Some(_) => None,
            };

            let Some(bump) = bump else {
                return (previous, releases);
            };

            releases.push(Release {
                package_name: package_name.to_string(),
                version: candidate.raw.to_string(),
                timestamp: candidate.published_at,
                bump,
            });

            (Some(candidate.version), releases)
        },
    );

    releases
}
