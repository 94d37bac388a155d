//! Core library for dependaball
//!
//! This crate implements the **Functional Core** of dependaball, a fantasy
//! sports game played with package releases: players draft packages, and
//! version bumps published during a season earn them points.
//!
//! # Architecture Overview
//!
//! The project uses a two-crate architecture:
//!
//! - **`dependaball_core`** (this crate): Pure transformation functions with zero I/O
//! - **`dependaball`**: File I/O, registry and Slack clients, and the CLI (the Imperative Shell)
//!
//! All functions in this crate are deterministic. Anything that depends on the
//! current time takes the instant as a parameter, so a season can be scored at
//! two different cutoffs over the same release history.
//!
//! # Module Organization
//!
//! - [`releases`]: Classifying a package's publish history into scored bumps
//! - [`registry`]: Reading npm registry documents into raw publish history
//! - [`window`]: Scoring classified releases over a time window
//! - [`standings`]: Tiebreaker encoding and ranking
//! - [`season`]: Assembling a scored season from its definition
//! - [`stats`]: Season-wide statistics
//! - [`draft`]: Pick order and season files produced by a draft
//! - [`announce`]: Composing periodic season announcements
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use dependaball_core::releases::{classify, RawRelease};
//! use dependaball_core::window::{window_filter, Window};
//! use dependaball_core::PointValues;
//!
//! let releases = classify("left-pad", &history);
//! let record = window_filter("left-pad", &releases, &Window::new(start, end), &PointValues::default());
//!
//! assert_eq!(record.total_points, 8);
//! ```

pub mod announce;
pub mod draft;
pub mod points;
pub mod registry;
pub mod releases;
pub mod season;
pub mod standings;
pub mod stats;
pub mod window;

pub use points::{Bump, PointValues};
pub use releases::{Release, ReleaseMap};
pub use season::{build_season, SeasonDefinition, SeasonError, SeasonRecord};
