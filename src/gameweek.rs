use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::{self, Prediction};
use crate::error::PredictError;
use crate::fixtures::{self, Fixture, FixtureSource};
use crate::params::ModelParams;
use crate::ratings::{RatingSet, RatingStore, RatingTable, rating_rows};

pub const UNKNOWN_SEASON: &str = "unknown";

/// Display row for one fixture, rounded the way the tables show it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPrediction {
    #[serde(rename = "match")]
    pub match_label: String,
    pub home_team: String,
    pub away_team: String,
    pub home_percentage: f64,
    pub draw_percentage: f64,
    pub away_percentage: f64,
    pub fair_home_odds: f64,
    pub fair_draw_odds: f64,
    pub fair_away_odds: f64,
    pub exp_goals_home: f64,
    pub exp_goals_away: f64,
    pub most_likely_score: String,
    pub rating_diff: f64,
}

impl MatchPrediction {
    pub fn from_prediction(fixture: &Fixture, p: &Prediction) -> Self {
        Self {
            match_label: fixture.label(),
            home_team: fixture.home.clone(),
            away_team: fixture.away.clone(),
            home_percentage: round_to(100.0 * p.p_home, 1),
            draw_percentage: round_to(100.0 * p.p_draw, 1),
            away_percentage: round_to(100.0 * p.p_away, 1),
            fair_home_odds: round_to(p.fair_odds_home, 2),
            fair_draw_odds: round_to(p.fair_odds_draw, 2),
            fair_away_odds: round_to(p.fair_odds_away, 2),
            exp_goals_home: round_to(p.exp_goals_home, 2),
            exp_goals_away: round_to(p.exp_goals_away, 2),
            most_likely_score: format!("{}-{}", p.score_home, p.score_away),
            rating_diff: round_to(p.rating_diff, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureFailure {
    #[serde(rename = "match")]
    pub match_label: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameweekPredictions {
    pub gameweek: u32,
    pub season: String,
    pub predictions: Vec<MatchPrediction>,
    pub last_updated: String,
    pub total_matches: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FixtureFailure>,
}

pub fn predict_fixture(
    fixture: &Fixture,
    ratings: &RatingSet,
    params: &ModelParams,
) -> Result<Prediction, PredictError> {
    let resolved = fixtures::resolve(fixture, ratings, &params.elite)?;
    engine::predict_adjusted(
        resolved.home_rating,
        resolved.away_rating,
        params,
        resolved.adjustment,
    )
}

/// Runs every fixture independently. A fixture that fails is reported in
/// `failures` and the rest of the batch still completes.
pub fn run_gameweek(
    gameweek: u32,
    season: &str,
    ratings: &RatingSet,
    fixture_list: &[Fixture],
    params: &ModelParams,
) -> GameweekPredictions {
    let results: Vec<Result<Prediction, PredictError>> = fixture_list
        .par_iter()
        .map(|fixture| predict_fixture(fixture, ratings, params))
        .collect();

    let mut predictions = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (fixture, result) in fixture_list.iter().zip(results) {
        match result {
            Ok(p) => predictions.push(MatchPrediction::from_prediction(fixture, &p)),
            Err(err) => {
                warn!(gameweek, fixture = %fixture.label(), error = %err, "fixture skipped");
                failures.push(FixtureFailure {
                    match_label: fixture.label(),
                    error: err.to_string(),
                });
            }
        }
    }

    GameweekPredictions {
        gameweek,
        season: season.to_string(),
        total_matches: predictions.len(),
        predictions,
        last_updated: chrono::Local::now().to_rfc3339(),
        failures,
    }
}

pub fn predict_gameweek<S>(source: &S, gameweek: u32, params: &ModelParams) -> Result<GameweekPredictions>
where
    S: RatingStore + FixtureSource,
{
    params.validate()?;
    let ratings = source.ratings(gameweek)?;
    let fixture_list = source.fixtures(gameweek)?;
    let season = source.season(gameweek)?;
    info!(
        gameweek,
        fixtures = fixture_list.len(),
        teams = ratings.len(),
        "predicting gameweek"
    );
    Ok(run_gameweek(gameweek, &season, &ratings, &fixture_list, params))
}

/// Rating listing for a gameweek. The season label comes from the fixture
/// list; a snapshot without one is still listed.
pub fn rating_table<S>(source: &S, gameweek: u32) -> Result<RatingTable>
where
    S: RatingStore + FixtureSource,
{
    let current = source.ratings(gameweek)?;
    let previous = source.previous(gameweek)?;
    let season = source.season(gameweek).unwrap_or_else(|err| {
        debug!(gameweek, error = %err, "no fixture list, season unknown");
        UNKNOWN_SEASON.to_string()
    });
    Ok(RatingTable {
        season,
        gameweek,
        ratings: rating_rows(&current, previous.as_ref()),
        last_updated: chrono::Local::now().to_rfc3339(),
    })
}

fn round_to(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (v * scale).round() / scale
}
