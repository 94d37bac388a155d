//! The on-disk data directory
//!
//! ```text
//! data/
//!   players.json
//!   seasons/<id>.json
//!   .tmp/all-releases.json
//!   .tmp/remote-dependencies.json
//! ```

use crate::prelude::*;
use chrono::{DateTime, Utc};
use dependaball_core::season::RosterPlayer;
use dependaball_core::{build_season, ReleaseMap, SeasonDefinition, SeasonRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const PLAYERS_FILE: &str = "players.json";
const SEASONS_DIR: &str = "seasons";
const TMP_DIR: &str = ".tmp";
const RELEASES_FILE: &str = "all-releases.json";
const REMOTE_DEPENDENCIES_FILE: &str = "remote-dependencies.json";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn seasons_dir(&self) -> PathBuf {
        self.root.join(SEASONS_DIR)
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join(TMP_DIR)
    }

    pub fn season_path(&self, id: &str) -> PathBuf {
        self.seasons_dir().join(f!("{id}.json"))
    }

    pub fn load_players(&self) -> Result<Vec<RosterPlayer>> {
        read_json(&self.root.join(PLAYERS_FILE)).context("Could not load players file")
    }

    /// Season ids (file stems), sorted
    pub fn season_ids(&self) -> Result<Vec<String>> {
        let dir = self.seasons_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| f!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    pub fn load_season(&self, id: &str) -> Result<SeasonDefinition> {
        let path = self.season_path(id);
        if !path.exists() {
            return Err(Error::Generic(f!("Season not found: {id}")).into());
        }

        read_json(&path).with_context(|| f!("Could not load season file {}", path.display()))
    }

    pub fn load_seasons(&self) -> Result<Vec<(String, SeasonDefinition)>> {
        self.season_ids()?
            .into_iter()
            .map(|id| {
                let definition = self.load_season(&id)?;
                Ok((id, definition))
            })
            .collect()
    }

    /// Write a season file, refusing to replace an existing one unless asked
    pub fn write_season(
        &self,
        id: &str,
        definition: &SeasonDefinition,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let path = self.season_path(id);
        if path.exists() && !overwrite {
            return Err(eyre!(
                "Season file already exists: {}. Use --overwrite to replace it.",
                path.display()
            ));
        }

        write_json(&path, definition)?;
        Ok(path)
    }

    pub fn load_releases(&self) -> Result<ReleaseMap> {
        read_json(&self.tmp_dir().join(RELEASES_FILE))
            .context("Could not load release data. Run `dependaball fetch` first")
    }

    pub fn write_releases(&self, releases: &ReleaseMap) -> Result<PathBuf> {
        let path = self.tmp_dir().join(RELEASES_FILE);
        write_json(&path, releases)?;
        Ok(path)
    }

    pub fn load_remote_dependencies(&self) -> Result<Vec<String>> {
        read_json(&self.tmp_dir().join(REMOTE_DEPENDENCIES_FILE))
            .context("Could not load the dependency list. Run `dependaball fetch` first")
    }

    /// The cached dependency list, or `None` when no fetch has written one yet
    pub fn cached_remote_dependencies(&self) -> Result<Option<Vec<String>>> {
        read_json_if_exists(&self.tmp_dir().join(REMOTE_DEPENDENCIES_FILE))
    }

    /// The cached release data, or `None` when no fetch has written it yet
    pub fn cached_releases(&self) -> Result<Option<ReleaseMap>> {
        read_json_if_exists(&self.tmp_dir().join(RELEASES_FILE))
    }

    pub fn write_remote_dependencies(&self, dependencies: &[String]) -> Result<PathBuf> {
        let path = self.tmp_dir().join(REMOTE_DEPENDENCIES_FILE);
        write_json(&path, &dependencies)?;
        Ok(path)
    }

    /// Load and score one season as of `as_of`
    pub fn load_season_record(&self, id: &str, as_of: DateTime<Utc>) -> Result<SeasonRecord> {
        let definition = self.load_season(id)?;
        let roster = self.load_players()?;
        let releases = self.load_releases()?;

        build_season(id, &definition, &roster, &releases, as_of)
            .with_context(|| f!("Season {id} is inconsistent"))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| f!("Failed to read {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| f!("Failed to parse {}", path.display()))
}

fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    read_json(path).map(Some)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| f!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    fs::write(path, json).with_context(|| f!("Failed to write {}", path.display()))?;

    log::debug!("wrote {}", path.display());
    Ok(())
}
