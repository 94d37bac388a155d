//! Bump kinds and the point values a season awards for them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one release relative to the release before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    /// First accepted release of a package. Never scores.
    Initial,
    Major,
    Minor,
    Patch,
}

impl Bump {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bump::Initial => "initial",
            Bump::Major => "major",
            Bump::Minor => "minor",
            Bump::Patch => "patch",
        }
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points awarded per bump kind
///
/// Seasons carry their own values; anything without an override (the draft
/// pool report, seasons missing the field) uses [`PointValues::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointValues {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Default for PointValues {
    fn default() -> Self {
        Self {
            major: 5,
            minor: 3,
            patch: 1,
        }
    }
}

impl PointValues {
    /// Points for a single bump. `Initial` is always worth nothing.
    pub fn points_for(&self, bump: Bump) -> u32 {
        match bump {
            Bump::Initial => 0,
            Bump::Major => self.major,
            Bump::Minor => self.minor,
            Bump::Patch => self.patch,
        }
    }
}

/// "point" or "points", for user-facing copy
pub fn points_noun(points: u32) -> &'static str {
    if points == 1 {
        "point"
    } else {
        "points"
    }
}
