use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use gw_predictor::params;

/// Quick manual tuning aid: one rating pair in, the raw engine output out.
#[derive(Parser, Debug)]
#[command(name = "matchup", allow_negative_numbers = true)]
struct Args {
    /// Home side rating
    home: f64,
    /// Away side rating
    away: f64,
    /// JSON params file layered over the defaults
    #[arg(long)]
    params: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let args = Args::parse();

    let params = params::effective_params(args.params.as_deref())?;
    let p = gw_predictor::predict(args.home, args.away, &params)?;
    println!("Rating diff: {:.2}", p.rating_diff);
    println!("Home: {:.1}%  (fair {:.2})", 100.0 * p.p_home, p.fair_odds_home);
    println!("Draw: {:.1}%  (fair {:.2})", 100.0 * p.p_draw, p.fair_odds_draw);
    println!("Away: {:.1}%  (fair {:.2})", 100.0 * p.p_away, p.fair_odds_away);
    println!("xG: {:.2} - {:.2}", p.exp_goals_home, p.exp_goals_away);
    println!("Most likely: {}-{}", p.score_home, p.score_away);
    Ok(())
}
