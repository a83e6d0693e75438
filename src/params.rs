use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

pub const MAX_GOALS_LIMIT: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    // Rating units added to the home side before taking the difference.
    pub home_adv: f64,
    pub base_draw: f64,
    pub draw_decay: f64,
    pub sigmoid_k: f64,
    // League-average goals per team per game.
    pub base_mu: f64,
    pub beta: f64,
    pub max_goals: u32,
    pub elite: EliteTier,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            home_adv: 0.25,
            base_draw: 0.24,
            draw_decay: 0.85,
            sigmoid_k: 1.5,
            base_mu: 1.40,
            beta: 0.60,
            max_goals: 10,
            elite: EliteTier::default(),
        }
    }
}

/// Optional adjustment for a configured set of dominant clubs. Disabled while
/// `teams` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EliteTier {
    pub teams: BTreeSet<String>,
    pub diff_bonus: f64,
    pub draw_factor: f64,
    pub sharpness_factor: f64,
}

impl Default for EliteTier {
    fn default() -> Self {
        Self {
            teams: BTreeSet::new(),
            diff_bonus: 0.15,
            draw_factor: 0.85,
            sharpness_factor: 1.2,
        }
    }
}

impl EliteTier {
    pub fn is_enabled(&self) -> bool {
        !self.teams.is_empty()
    }

    pub fn contains(&self, team: &str) -> bool {
        self.teams.contains(team)
    }
}

impl ModelParams {
    pub fn validate(&self) -> Result<(), PredictError> {
        finite("home_adv", self.home_adv)?;
        finite("base_draw", self.base_draw)?;
        finite("draw_decay", self.draw_decay)?;
        finite("sigmoid_k", self.sigmoid_k)?;
        finite("base_mu", self.base_mu)?;
        finite("beta", self.beta)?;

        if !(0.0..1.0).contains(&self.base_draw) {
            return Err(PredictError::invalid(
                "base_draw",
                format!("{} must lie in [0, 1)", self.base_draw),
            ));
        }
        if self.draw_decay < 0.0 {
            return Err(PredictError::invalid(
                "draw_decay",
                format!("{} would make draws grow with the rating gap", self.draw_decay),
            ));
        }
        if self.sigmoid_k <= 0.0 {
            return Err(PredictError::invalid(
                "sigmoid_k",
                format!("{} must be positive", self.sigmoid_k),
            ));
        }
        if self.base_mu <= 0.0 {
            return Err(PredictError::invalid(
                "base_mu",
                format!("{} must be positive", self.base_mu),
            ));
        }
        if self.beta < 0.0 {
            return Err(PredictError::invalid(
                "beta",
                format!("{} must not be negative", self.beta),
            ));
        }
        if self.max_goals == 0 || self.max_goals > MAX_GOALS_LIMIT {
            return Err(PredictError::invalid(
                "max_goals",
                format!("{} must lie in [1, {MAX_GOALS_LIMIT}]", self.max_goals),
            ));
        }

        let elite = &self.elite;
        finite("elite.diff_bonus", elite.diff_bonus)?;
        finite("elite.draw_factor", elite.draw_factor)?;
        finite("elite.sharpness_factor", elite.sharpness_factor)?;
        if elite.draw_factor <= 0.0 || self.base_draw * elite.draw_factor >= 1.0 {
            return Err(PredictError::invalid(
                "elite.draw_factor",
                format!(
                    "{} must keep base_draw * draw_factor inside (0, 1)",
                    elite.draw_factor
                ),
            ));
        }
        if elite.sharpness_factor <= 0.0 {
            return Err(PredictError::invalid(
                "elite.sharpness_factor",
                format!("{} must be positive", elite.sharpness_factor),
            ));
        }
        Ok(())
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), PredictError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PredictError::invalid(name, format!("{value} is not finite")))
    }
}

pub fn load_params_file(path: &Path) -> Result<ModelParams> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read params file {}", path.display()))?;
    serde_json::from_str::<ModelParams>(&raw)
        .with_context(|| format!("parse params file {}", path.display()))
}

/// Applies `GWP_*` overrides. `lookup` is `std::env::var` in production; tests
/// pass a map so they never touch the process environment.
pub fn apply_env_overrides(
    params: &mut ModelParams,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    override_f64(&mut params.home_adv, "GWP_HOME_ADV", &lookup)?;
    override_f64(&mut params.base_draw, "GWP_BASE_DRAW", &lookup)?;
    override_f64(&mut params.draw_decay, "GWP_DRAW_DECAY", &lookup)?;
    override_f64(&mut params.sigmoid_k, "GWP_SIGMOID_K", &lookup)?;
    override_f64(&mut params.base_mu, "GWP_BASE_MU", &lookup)?;
    override_f64(&mut params.beta, "GWP_BETA", &lookup)?;
    if let Some(raw) = lookup("GWP_MAX_GOALS")
        && !raw.trim().is_empty()
    {
        params.max_goals = raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("GWP_MAX_GOALS={raw:?} is not an integer"))?;
    }
    Ok(())
}

fn override_f64(
    slot: &mut f64,
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let Some(raw) = lookup(key) else {
        return Ok(());
    };
    if raw.trim().is_empty() {
        return Ok(());
    }
    *slot = raw
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{key}={raw:?} is not a number"))?;
    Ok(())
}

/// Defaults, then the optional params file, then the environment. The result
/// is validated before it is handed out.
pub fn effective_params(path: Option<&Path>) -> Result<ModelParams> {
    let mut params = match path {
        Some(path) => load_params_file(path)?,
        None => ModelParams::default(),
    };
    apply_env_overrides(&mut params, |key| std::env::var(key).ok())?;
    params.validate()?;
    Ok(params)
}
