use criterion::{black_box, Criterion};
use neurochain::random::Random;

/// Draws made once per element by the parameter mutations.
fn bench_parameter_draws(bench: &mut Criterion) {
    let mut rng = Random::seeded(0x5eed);

    bench.bench_function("random-happens", |b| {
        b.iter(|| rng.happens(black_box(0.3)));
    });
    bench.bench_function("random-gaussian", |b| {
        b.iter(|| rng.gaussian(black_box(0.2)));
    });
    bench.bench_function("random-uniform", |b| {
        b.iter(|| rng.uniform(black_box(1.)));
    });
    bench.bench_function("random-sign", |b| {
        b.iter(|| rng.next_sign());
    });
}

/// Candidate picks made by the structural mutations.
fn bench_picks(bench: &mut Criterion) {
    let mut rng = Random::seeded(0x91c4);
    let candidates: Vec<u64> = (0..256).collect();

    bench.bench_function("random-pick", |b| {
        b.iter(|| candidates[rng.next_int(candidates.len())]);
    });
    bench.bench_function("random-shuffle-pick", |b| {
        b.iter(|| {
            let mut pool = candidates.clone();
            let mut taken = 0;
            while !pool.is_empty() && rng.happens(0.5) {
                taken += pool.swap_remove(rng.next_int(pool.len()));
            }
            taken
        });
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(1000)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use core::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench_parameter_draws(&mut criterion);
    bench_picks(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
