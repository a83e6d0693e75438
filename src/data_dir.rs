use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::fixtures::{Fixture, FixtureSource, GameweekInfo};
use crate::ratings::{RatingSet, RatingStore, TeamRating};

const RATINGS_DIR: &str = "ratings";
const FIXTURES_DIR: &str = "fixtures";

#[derive(Debug, Deserialize)]
struct FixtureFile {
    season: String,
    fixtures: Vec<Fixture>,
}

/// Rating snapshots and fixture lists laid out as
/// `ratings/gw{N}.json` and `fixtures/gw{N}.json`.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&self, kind: &str, gameweek: u32) -> PathBuf {
        self.root.join(kind).join(format!("gw{gameweek}.json"))
    }

    fn load_fixture_file(&self, gameweek: u32) -> Result<FixtureFile> {
        let path = self.file(FIXTURES_DIR, gameweek);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("no fixtures for GW{gameweek} at {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }

    fn available(&self, kind: &str) -> Result<Vec<u32>> {
        let dir = self.root.join(kind);
        let entries =
            fs::read_dir(&dir).with_context(|| format!("list {}", dir.display()))?;
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("list {}", dir.display()))?;
            let name = entry.file_name();
            if let Some(n) = parse_gameweek_file_name(&name.to_string_lossy()) {
                out.push(n);
            }
        }
        out.sort_unstable();
        Ok(out)
    }
}

impl RatingStore for DataDir {
    fn ratings(&self, gameweek: u32) -> Result<RatingSet> {
        let path = self.file(RATINGS_DIR, gameweek);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("no ratings for GW{gameweek} at {}", path.display()))?;
        let records: Vec<TeamRating> =
            serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
        debug!(gameweek, teams = records.len(), "loaded rating snapshot");
        Ok(RatingSet::from_records(records))
    }

    fn previous(&self, gameweek: u32) -> Result<Option<RatingSet>> {
        let Some(prev) = self
            .available(RATINGS_DIR)?
            .into_iter()
            .filter(|n| *n < gameweek)
            .max()
        else {
            return Ok(None);
        };
        self.ratings(prev).map(Some)
    }
}

impl FixtureSource for DataDir {
    fn fixtures(&self, gameweek: u32) -> Result<Vec<Fixture>> {
        Ok(self.load_fixture_file(gameweek)?.fixtures)
    }

    fn season(&self, gameweek: u32) -> Result<String> {
        Ok(self.load_fixture_file(gameweek)?.season)
    }

    fn gameweeks(&self) -> Result<Vec<GameweekInfo>> {
        let rated = self.available(RATINGS_DIR)?;
        let mut out = Vec::new();
        for gameweek in self.available(FIXTURES_DIR)? {
            // A fixture list without a rating snapshot cannot be predicted.
            if !rated.contains(&gameweek) {
                continue;
            }
            let file = self.load_fixture_file(gameweek)?;
            out.push(GameweekInfo {
                gameweek,
                season: file.season,
                matches: file.fixtures.len(),
            });
        }
        Ok(out)
    }
}

fn parse_gameweek_file_name(name: &str) -> Option<u32> {
    name.strip_prefix("gw")?
        .strip_suffix(".json")?
        .parse::<u32>()
        .ok()
}
