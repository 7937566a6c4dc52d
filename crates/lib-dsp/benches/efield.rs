//! E-field derivation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lib_dsp::efield::{FieldConvolver, ZeroPadding, DEFAULT_DT};
use lib_dsp::fft::rfft_frequencies;
use lib_dsp::impedance::compute_impedance;
use lib_types::earth::EarthModel;

fn bench_impedance(c: &mut Criterion) {
    let mut group = c.benchmark_group("impedance");

    let resistivities = [500.0, 50.0, 1000.0, 100.0, 10.0, 5000.0];
    let thicknesses = [2_000.0, 15_000.0, 20_000.0, 60_000.0, 150_000.0];

    for n in [1440usize, 10_080, 86_400].iter() {
        let freqs: Vec<f64> = rfft_frequencies(*n, DEFAULT_DT).iter().map(|f| f.0).collect();
        group.bench_with_input(BenchmarkId::new("six_layer", n), &freqs, |b, f| {
            b.iter(|| compute_impedance(black_box(&resistivities), black_box(&thicknesses), f));
        });
    }

    group.finish();
}

fn bench_derive(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_e_field");
    let model = EarthModel::new(vec![100.0, 1000.0], vec![10_000.0]).unwrap();

    // One day, one week and one day at 1 s cadence
    for n in [1440usize, 10_080, 86_400].iter() {
        let bx: Vec<f64> = (0..*n).map(|i| 50.0 * (i as f64 * 0.01).sin()).collect();
        let by: Vec<f64> = (0..*n).map(|i| 20.0 * (i as f64 * 0.003).cos()).collect();

        let policies = [("unpadded", ZeroPadding::None), ("pow2", ZeroPadding::PowerOfTwo)];
        for (label, padding) in policies {
            let mut conv = FieldConvolver::new(padding);
            group.bench_with_input(BenchmarkId::new(label, n), &(&bx, &by), |b, (x, y)| {
                b.iter(|| conv.derive(black_box(x), black_box(y), &model, DEFAULT_DT));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_impedance, bench_derive);
criterion_main!(benches);
