use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub team: String,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One gameweek's ratings. Never mutated once built; a new gameweek gets a new
/// set.
#[derive(Debug, Clone, Default)]
pub struct RatingSet {
    by_team: HashMap<String, TeamRating>,
}

impl RatingSet {
    /// Later duplicates replace earlier ones.
    pub fn from_records(records: Vec<TeamRating>) -> Self {
        let by_team = records
            .into_iter()
            .map(|r| (r.team.trim().to_string(), r))
            .collect();
        Self { by_team }
    }

    pub fn rating(&self, team: &str) -> Result<f64, PredictError> {
        self.by_team
            .get(team.trim())
            .map(|r| r.rating)
            .ok_or_else(|| PredictError::UnknownTeam(team.to_string()))
    }

    pub fn get(&self, team: &str) -> Option<&TeamRating> {
        self.by_team.get(team.trim())
    }

    pub fn len(&self) -> usize {
        self.by_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamRating> {
        self.by_team.values()
    }
}

pub trait RatingStore {
    fn ratings(&self, gameweek: u32) -> Result<RatingSet>;

    /// Closest snapshot strictly before `gameweek`, if any.
    fn previous(&self, gameweek: u32) -> Result<Option<RatingSet>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRow {
    pub team: String,
    pub rating: f64,
    pub change_from_previous: Option<f64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingTable {
    pub season: String,
    pub gameweek: u32,
    pub ratings: Vec<RatingRow>,
    pub last_updated: String,
}

/// Strongest first; equal ratings fall back to team name.
pub fn rating_rows(current: &RatingSet, previous: Option<&RatingSet>) -> Vec<RatingRow> {
    let mut rows: Vec<RatingRow> = current
        .teams()
        .map(|r| RatingRow {
            team: r.team.clone(),
            rating: r.rating,
            change_from_previous: previous
                .and_then(|prev| prev.get(&r.team))
                .map(|prev| round2(r.rating - prev.rating)),
            reason: r.reason.clone(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then_with(|| a.team.cmp(&b.team))
    });
    rows
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
