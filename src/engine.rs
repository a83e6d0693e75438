use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{PredictError, Result};
use crate::params::ModelParams;

const TIE_REL_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Prob3 {
    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpectedGoals {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Scoreline {
    pub home: u32,
    pub away: u32,
}

impl Scoreline {
    pub fn total(&self) -> u32 {
        self.home + self.away
    }

    pub fn margin(&self) -> u32 {
        self.home.abs_diff(self.away)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FairOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

/// Everything the engine knows about one fixture. Field names are the ones the
/// renderers expose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub p_home: f64,
    pub p_draw: f64,
    pub p_away: f64,
    pub fair_odds_home: f64,
    pub fair_odds_draw: f64,
    pub fair_odds_away: f64,
    pub exp_goals_home: f64,
    pub exp_goals_away: f64,
    pub score_home: u32,
    pub score_away: u32,
    pub rating_diff: f64,
}

impl Prediction {
    pub fn probs(&self) -> Prob3 {
        Prob3 {
            home: self.p_home,
            draw: self.p_draw,
            away: self.p_away,
        }
    }

    pub fn score(&self) -> Scoreline {
        Scoreline {
            home: self.score_home,
            away: self.score_away,
        }
    }
}

/// Per-fixture tweak applied on top of the base parameters (elite tier).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierAdjustment {
    pub diff_shift: f64,
    pub draw_factor: f64,
    pub sharpness_factor: f64,
}

impl TierAdjustment {
    pub const NEUTRAL: Self = Self {
        diff_shift: 0.0,
        draw_factor: 1.0,
        sharpness_factor: 1.0,
    };
}

impl Default for TierAdjustment {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

pub fn predict(home_rating: f64, away_rating: f64, params: &ModelParams) -> Result<Prediction> {
    predict_adjusted(home_rating, away_rating, params, TierAdjustment::NEUTRAL)
}

/// Rejects parameters that fail [`ModelParams::validate`] before computing
/// anything.
pub fn predict_adjusted(
    home_rating: f64,
    away_rating: f64,
    params: &ModelParams,
    adj: TierAdjustment,
) -> Result<Prediction> {
    params.validate()?;
    if !home_rating.is_finite() {
        return Err(PredictError::NonFiniteRating {
            side: "home",
            value: home_rating,
        });
    }
    if !away_rating.is_finite() {
        return Err(PredictError::NonFiniteRating {
            side: "away",
            value: away_rating,
        });
    }

    let d = rating_diff(home_rating, away_rating, params.home_adv) + adj.diff_shift;
    let p_draw = draw_probability(d, params.base_draw * adj.draw_factor, params.draw_decay);
    let probs = split_outcomes(d, p_draw, params.sigmoid_k * adj.sharpness_factor);
    let goals = expected_goals(d, params.base_mu, params.beta)?;
    let score = most_likely_score(goals, params.max_goals);
    let odds = fair_odds(probs)?;

    Ok(Prediction {
        p_home: probs.home,
        p_draw: probs.draw,
        p_away: probs.away,
        fair_odds_home: odds.home,
        fair_odds_draw: odds.draw,
        fair_odds_away: odds.away,
        exp_goals_home: goals.home,
        exp_goals_away: goals.away,
        score_home: score.home,
        score_away: score.away,
        rating_diff: d,
    })
}

pub fn rating_diff(home_rating: f64, away_rating: f64, home_adv: f64) -> f64 {
    (home_rating + home_adv) - away_rating
}

pub fn draw_probability(d: f64, base_draw: f64, draw_decay: f64) -> f64 {
    (base_draw * (-draw_decay * d.abs()).exp()).clamp(0.0, 1.0 - f64::EPSILON)
}

pub fn sigmoid(x: f64) -> f64 {
    // Branch on sign so exp never overflows.
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

pub fn split_outcomes(d: f64, p_draw: f64, sigmoid_k: f64) -> Prob3 {
    let rest = 1.0 - p_draw;
    let home = rest * sigmoid(sigmoid_k * d);
    Prob3 {
        home,
        draw: p_draw,
        away: (rest - home).max(0.0),
    }
}

pub fn expected_goals(d: f64, base_mu: f64, beta: f64) -> Result<ExpectedGoals> {
    let tilt = beta * d / 2.0;
    let home = base_mu * tilt.exp();
    let away = base_mu * (-tilt).exp();
    for (name, mu) in [("expected home goals", home), ("expected away goals", away)] {
        if !(mu.is_finite() && mu > 0.0) {
            return Err(PredictError::invalid(
                "base_mu",
                format!("{name} {mu} out of range at rating diff {d}"),
            ));
        }
    }
    Ok(ExpectedGoals { home, away })
}

/// Poisson pmf for 0..=max_k, built by recurrence. Unlike a full outcome
/// model, the tail mass is left out so the grid argmax is not distorted.
pub fn poisson_pmf(lambda: f64, max_k: u32) -> Vec<f64> {
    let max_k = max_k as usize;
    let lambda = lambda.max(0.0);
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

/// `k ln(lambda) - ln(k!)` for 0..=max_k. The shared `-lambda` term is left
/// out: it does not move the argmax and would swamp the differences for
/// large rates.
fn log_pmf_terms(lambda: f64, max_k: u32) -> Vec<f64> {
    let ln_lambda = lambda.max(f64::MIN_POSITIVE).ln();
    let mut out = Vec::with_capacity(max_k as usize + 1);
    let mut ln_fact = 0.0_f64;
    for k in 0..=max_k {
        if k > 0 {
            ln_fact += (k as f64).ln();
        }
        out.push(k as f64 * ln_lambda - ln_fact);
    }
    out
}

/// Argmax of the joint Poisson grid, compared in log space so that it stays
/// exact where the linear pmf underflows.
pub fn most_likely_score(goals: ExpectedGoals, max_goals: u32) -> Scoreline {
    let log_h = log_pmf_terms(goals.home, max_goals);
    let log_a = log_pmf_terms(goals.away, max_goals);

    let mut best = Scoreline { home: 0, away: 0 };
    let mut best_lp = f64::NEG_INFINITY;

    for (i, l_i) in log_h.iter().enumerate() {
        for (j, l_j) in log_a.iter().enumerate() {
            let lp = l_i + l_j;
            let cand = Scoreline {
                home: i as u32,
                away: j as u32,
            };
            let scale = lp.abs().max(best_lp.abs()).max(1.0);
            let tied = best_lp.is_finite() && (lp - best_lp).abs() <= TIE_REL_TOL * scale;
            if tied {
                if tie_break(cand, best) == Ordering::Less {
                    best = cand;
                    best_lp = best_lp.max(lp);
                }
            } else if lp > best_lp {
                best = cand;
                best_lp = lp;
            }
        }
    }
    best
}

/// Lower total goals first, then the narrower margin, then (home, away).
pub fn tie_break(a: Scoreline, b: Scoreline) -> Ordering {
    a.total()
        .cmp(&b.total())
        .then(a.margin().cmp(&b.margin()))
        .then((a.home, a.away).cmp(&(b.home, b.away)))
}

pub fn fair_odds(probs: Prob3) -> Result<FairOdds> {
    for outcome in [Outcome::Home, Outcome::Draw, Outcome::Away] {
        if probs.get(outcome) <= 0.0 {
            return Err(PredictError::DegenerateOdds { outcome });
        }
    }
    Ok(FairOdds {
        home: 1.0 / probs.home,
        draw: 1.0 / probs.draw,
        away: 1.0 / probs.away,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn strong_home_side_against_weak_visitor() {
        let p = predict(1.25, -0.20, &ModelParams::default()).unwrap();
        assert!(close(p.rating_diff, 1.70, 1e-12));
        assert!(close(p.p_home, 0.8751, 0.005), "p_home {}", p.p_home);
        assert!(close(p.p_draw, 0.0566, 0.005), "p_draw {}", p.p_draw);
        assert!(close(p.p_away, 0.0683, 0.005), "p_away {}", p.p_away);
        assert!(close(p.exp_goals_home, 2.331, 0.005));
        assert!(close(p.exp_goals_away, 0.841, 0.005));
        assert_eq!(p.score(), Scoreline { home: 2, away: 0 });
    }

    #[test]
    fn close_fixture_predicts_a_draw_score() {
        let p = predict(0.50, 0.35, &ModelParams::default()).unwrap();
        assert!(close(p.rating_diff, 0.40, 1e-12));
        assert!(close(p.p_home, 0.5354, 0.005), "p_home {}", p.p_home);
        assert!(close(p.p_draw, 0.1708, 0.005), "p_draw {}", p.p_draw);
        assert!(close(p.p_away, 0.2938, 0.005), "p_away {}", p.p_away);
        assert_eq!(p.score(), Scoreline { home: 1, away: 1 });
    }

    #[test]
    fn level_teams_without_home_edge_split_evenly() {
        let params = ModelParams {
            home_adv: 0.0,
            ..ModelParams::default()
        };
        let p = predict(0.3, 0.3, &params).unwrap();
        assert_eq!(p.rating_diff, 0.0);
        assert_eq!(p.p_home, p.p_away);
        assert_eq!(p.p_draw, params.base_draw);
        assert_eq!(p.exp_goals_home, p.exp_goals_away);
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(!sigmoid(-800.0).is_nan());
        assert!(close(sigmoid(2.0) + sigmoid(-2.0), 1.0, 1e-15));
    }

    #[test]
    fn pmf_matches_closed_form() {
        let pmf = poisson_pmf(1.7, 6);
        let direct = |k: i32| {
            let fact = (1..=k).fold(1.0_f64, |acc, n| acc * n as f64);
            1.7_f64.powi(k) * (-1.7_f64).exp() / fact
        };
        for (k, p) in pmf.iter().enumerate() {
            assert!(close(*p, direct(k as i32), 1e-12));
        }
    }

    #[test]
    fn tied_modes_prefer_fewer_goals() {
        // Poisson(1) has equal mass at 0 and 1.
        let score = most_likely_score(ExpectedGoals { home: 1.0, away: 1.0 }, 10);
        assert_eq!(score, Scoreline { home: 0, away: 0 });

        // Poisson(2) ties 1 and 2, Poisson(1) ties 0 and 1.
        let score = most_likely_score(ExpectedGoals { home: 2.0, away: 1.0 }, 10);
        assert_eq!(score, Scoreline { home: 1, away: 0 });
    }

    #[test]
    fn tie_break_orders_by_total_margin_then_lexicographic() {
        let s = |home, away| Scoreline { home, away };
        assert_eq!(tie_break(s(1, 0), s(1, 1)), Ordering::Less);
        assert_eq!(tie_break(s(1, 1), s(2, 0)), Ordering::Less);
        assert_eq!(tie_break(s(0, 2), s(2, 0)), Ordering::Less);
        assert_eq!(tie_break(s(2, 1), s(2, 1)), Ordering::Equal);
    }

    #[test]
    fn score_respects_grid_bound() {
        let score = most_likely_score(ExpectedGoals { home: 9.5, away: 0.2 }, 4);
        assert_eq!(score, Scoreline { home: 4, away: 0 });
    }

    #[test]
    fn zero_probability_is_reported_not_inverted() {
        let probs = Prob3 {
            home: 1.0,
            draw: 0.0,
            away: 0.0,
        };
        assert_eq!(
            fair_odds(probs),
            Err(PredictError::DegenerateOdds {
                outcome: Outcome::Draw
            })
        );
    }

    #[test]
    fn absurd_rating_gap_surfaces_degenerate_odds() {
        let err = predict(900.0, 0.0, &ModelParams::default()).unwrap_err();
        assert!(matches!(err, PredictError::DegenerateOdds { .. }));
    }

    #[test]
    fn huge_home_rate_still_finds_the_grid_maximum() {
        let score = most_likely_score(ExpectedGoals { home: 800.0, away: 0.5 }, 10);
        assert_eq!(score, Scoreline { home: 10, away: 0 });
    }

    #[test]
    fn extreme_rating_gap_keeps_the_lopsided_score() {
        let p = predict(22.0, 0.0, &ModelParams::default()).unwrap();
        assert!(p.exp_goals_home > 745.0);
        assert_eq!(p.score(), Scoreline { home: 10, away: 0 });
    }

    #[test]
    fn saturated_sigmoid_reports_zero_away_probability() {
        let err = predict(30.0, 0.0, &ModelParams::default()).unwrap_err();
        assert_eq!(
            err,
            PredictError::DegenerateOdds {
                outcome: Outcome::Away
            }
        );
    }

    #[test]
    fn invalid_params_are_rejected_not_clamped() {
        let params = ModelParams {
            base_draw: 1.5,
            home_adv: 0.0,
            ..ModelParams::default()
        };
        let err = predict(0.3, 0.3, &params).unwrap_err();
        assert!(matches!(err, PredictError::InvalidParam { name: "base_draw", .. }));

        let params = ModelParams {
            draw_decay: -2.0,
            ..ModelParams::default()
        };
        let err = predict(1.0, 0.0, &params).unwrap_err();
        assert!(matches!(err, PredictError::InvalidParam { name: "draw_decay", .. }));
    }

    #[test]
    fn nan_rating_is_rejected() {
        let err = predict(f64::NAN, 0.0, &ModelParams::default()).unwrap_err();
        assert!(matches!(err, PredictError::NonFiniteRating { side: "home", .. }));
    }

    #[test]
    fn elite_adjustment_shifts_toward_elite_side() {
        let params = ModelParams::default();
        let base = predict(0.4, 0.4, &params).unwrap();
        let boosted = predict_adjusted(
            0.4,
            0.4,
            &params,
            TierAdjustment {
                diff_shift: 0.15,
                draw_factor: 0.85,
                sharpness_factor: 1.2,
            },
        )
        .unwrap();
        assert!(boosted.p_home > base.p_home);
        assert!(boosted.p_draw < base.p_draw);
        assert!(close(boosted.rating_diff, base.rating_diff + 0.15, 1e-12));
        assert!(close(boosted.probs().sum(), 1.0, 1e-9));
    }
}
