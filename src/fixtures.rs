use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::TierAdjustment;
use crate::error::PredictError;
use crate::params::EliteTier;
use crate::ratings::RatingSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub home: String,
    pub away: String,
}

impl Fixture {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            away: away.into(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} vs {}", self.home, self.away)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameweekInfo {
    pub gameweek: u32,
    pub season: String,
    pub matches: usize,
}

pub trait FixtureSource {
    /// Fixtures in kickoff order.
    fn fixtures(&self, gameweek: u32) -> Result<Vec<Fixture>>;

    fn season(&self, gameweek: u32) -> Result<String>;

    fn gameweeks(&self) -> Result<Vec<GameweekInfo>>;
}

/// A fixture whose teams were found in the rating set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFixture {
    pub home_rating: f64,
    pub away_rating: f64,
    pub adjustment: TierAdjustment,
}

pub fn resolve(
    fixture: &Fixture,
    ratings: &RatingSet,
    elite: &EliteTier,
) -> Result<ResolvedFixture, PredictError> {
    let home_rating = ratings.rating(&fixture.home)?;
    let away_rating = ratings.rating(&fixture.away)?;
    Ok(ResolvedFixture {
        home_rating,
        away_rating,
        adjustment: tier_adjustment(&fixture.home, &fixture.away, elite),
    })
}

pub fn tier_adjustment(home: &str, away: &str, elite: &EliteTier) -> TierAdjustment {
    if !elite.is_enabled() {
        return TierAdjustment::NEUTRAL;
    }
    let home_elite = elite.contains(home.trim());
    let away_elite = elite.contains(away.trim());

    let diff_shift = match (home_elite, away_elite) {
        (true, false) => elite.diff_bonus,
        (false, true) => -elite.diff_bonus,
        _ => 0.0,
    };
    if home_elite || away_elite {
        TierAdjustment {
            diff_shift,
            draw_factor: elite.draw_factor,
            sharpness_factor: elite.sharpness_factor,
        }
    } else {
        TierAdjustment::NEUTRAL
    }
}
