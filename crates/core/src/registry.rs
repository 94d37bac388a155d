//! npm registry documents
//!
//! The registry returns one JSON document per package. Its `time` object maps
//! every published version to an RFC 3339 timestamp, alongside bookkeeping
//! keys such as `created` and `modified`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::releases::{classify, RawRelease, Release};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Malformed registry response: {0}")]
    Malformed(String),

    #[error("Registry error: {0}")]
    Registry(String),
}

/// The parts of a registry package document we read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub time: BTreeMap<String, String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parse a registry response body, surfacing an embedded `error` field
pub fn parse_registry_document(body: &str) -> Result<RegistryDocument, RegistryError> {
    let document: RegistryDocument =
        serde_json::from_str(body).map_err(|e| RegistryError::Malformed(e.to_string()))?;

    match &document.error {
        Some(message) => Err(RegistryError::Registry(message.clone())),
        None => Ok(document),
    }
}

/// Raw `(version, timestamp)` entries from the `time` map
///
/// Keys with unparsable timestamps are skipped. Keys that are not versions
/// pass through and are dropped by classification.
pub fn raw_releases(document: &RegistryDocument) -> Vec<RawRelease> {
    document
        .time
        .iter()
        .filter_map(|(version, published)| {
            DateTime::parse_from_rfc3339(published)
                .ok()
                .map(|dt| RawRelease::new(version.clone(), dt.with_timezone(&Utc)))
        })
        .collect()
}

/// Parse and classify a registry response in one step
pub fn releases_from_body(package_name: &str, body: &str) -> Result<Vec<Release>, RegistryError> {
    let document = parse_registry_document(body)?;
    Ok(classify(package_name, &raw_releases(&document)))
}
