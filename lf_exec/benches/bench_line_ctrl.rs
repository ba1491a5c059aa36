//! # Line Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lf_lib::{
    line_ctrl::{LineCtrl, Params},
    telem::SensorSnapshot
};
use util::module::State;

fn line_ctrl_benchmark(c: &mut Criterion) {
    let mut line_ctrl = LineCtrl::new(Params::default()).unwrap();

    // A line drifting across a five sensor array, with some lost frames
    let frames: Vec<SensorSnapshot> = (0..64)
        .map(|i| {
            let centre = 2.0 + 2.5 * (i as f64 * 0.1).sin();
            let values: Vec<f64> = (0..5)
                .map(|s| ((s as f64 - centre).abs() * 0.6).min(1.0))
                .collect();
            SensorSnapshot::from_slice(&values)
        })
        .collect();

    let mut i = 0;

    c.bench_function("line_ctrl_proc", |b| b.iter(|| {
        i = (i + 1) % frames.len();
        line_ctrl.proc(black_box(&frames[i])).unwrap()
    }));
}

criterion_group!(benches, line_ctrl_benchmark);
criterion_main!(benches);
