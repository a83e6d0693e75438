use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use gw_predictor::fixtures::Fixture;
use gw_predictor::gameweek::run_gameweek;
use gw_predictor::ratings::{RatingSet, TeamRating};
use gw_predictor::{ModelParams, predict};

fn random_league(rng: &mut StdRng, teams: usize) -> (RatingSet, Vec<Fixture>) {
    let names: Vec<String> = (0..teams).map(|i| format!("Team {i}")).collect();
    let ratings = RatingSet::from_records(
        names
            .iter()
            .map(|team| TeamRating {
                team: team.clone(),
                rating: rng.gen_range(-0.6..1.4),
                reason: None,
            })
            .collect(),
    );
    let fixtures = names
        .chunks(2)
        .map(|pair| Fixture::new(pair[0].clone(), pair[1].clone()))
        .collect();
    (ratings, fixtures)
}

fn bench_predict(c: &mut Criterion) {
    let params = ModelParams::default();
    let mut rng = StdRng::seed_from_u64(7);
    let pairs: Vec<(f64, f64)> = (0..64)
        .map(|_| (rng.gen_range(-0.6..1.4), rng.gen_range(-0.6..1.4)))
        .collect();

    c.bench_function("predict_single", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let (rh, ra) = pairs[idx % pairs.len()];
            idx += 1;
            black_box(predict(black_box(rh), black_box(ra), &params).unwrap());
        })
    });
}

fn bench_gameweek(c: &mut Criterion) {
    let params = ModelParams::default();
    let mut rng = StdRng::seed_from_u64(11);
    let (ratings, fixtures) = random_league(&mut rng, 20);

    c.bench_function("gameweek_20_teams", |b| {
        b.iter(|| {
            let out = run_gameweek(1, "bench", &ratings, black_box(&fixtures), &params);
            black_box(out.total_matches);
        })
    });
}

criterion_group!(benches, bench_predict, bench_gameweek);
criterion_main!(benches);
