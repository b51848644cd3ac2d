#[macro_use]
extern crate criterion;

use criterion::Criterion;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use hdptrans::{
    BetaPrior, CoupledTransitionModel, GammaPrior, Structure, TransitionModel,
    TransitionOptions,
};

fn random_sequences(n_states: usize, n_seqs: usize, len: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n_seqs)
        .map(|_| (0..len).map(|_| rng.gen_range(0..n_states)).collect())
        .collect()
}

fn bench_resample(c: &mut Criterion) {
    let n_states = 20;
    let sequences = random_sequences(n_states, 10, 500, 24);

    let mut rng = SmallRng::seed_from_u64(42);
    let mut ergodic =
        TransitionModel::from_options(TransitionOptions::new(n_states), &mut rng).unwrap();
    c.bench_function("resample_ergodic", |bh| {
        bh.iter(|| ergodic.resample(&sequences, &mut rng).unwrap())
    });

    let options = TransitionOptions::new(n_states)
        .structure(Structure::SemiMarkov)
        .sticky(10.0);
    let mut rng = SmallRng::seed_from_u64(42);
    let mut sticky_hsmm = TransitionModel::from_options(options, &mut rng).unwrap();
    // no-repeat input for the semi-Markov variant
    let collapsed: Vec<Vec<usize>> = sequences
        .iter()
        .map(|seq| {
            let mut out: Vec<usize> = Vec::with_capacity(seq.len());
            for &s in seq {
                if out.last() != Some(&s) {
                    out.push(s);
                }
            }
            out
        })
        .collect();
    c.bench_function("resample_sticky_hsmm", |bh| {
        bh.iter(|| sticky_hsmm.resample(&collapsed, &mut rng).unwrap())
    });

    let mut rng = SmallRng::seed_from_u64(42);
    let prior = GammaPrior::new(1.0, 1.0).unwrap();
    let rho_prior = BetaPrior::new(500.0, 5.0).unwrap();
    let mut coupled = CoupledTransitionModel::new_sticky(
        n_states, Structure::Ergodic, rho_prior, prior, prior, &mut rng,
    ).unwrap();
    c.bench_function("resample_sticky_coupled", |bh| {
        bh.iter(|| coupled.resample(&sequences, &mut rng).unwrap())
    });
}

criterion_group!(resample, bench_resample);
criterion_main!(resample);
