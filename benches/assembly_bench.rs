//! Performance benchmarks for profiling and assembly

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stratum_splice::assembly::{assemble, Candidate, CandidateOption, SearchConfig, UsedSet};
use stratum_splice::features::{profile, ProfileConfig};
use stratum_splice::SampleBuffer;

fn tone(freq: f32, amplitude: f32, frames: usize) -> SampleBuffer {
    let samples: Vec<f32> = (0..frames)
        .map(|i| (i as f32 * freq * 2.0 * std::f32::consts::PI / 44100.0).sin() * amplitude)
        .collect();
    SampleBuffer::mono(samples, 44100).unwrap()
}

/// `slots` slots of `pool` options each, profiled up front
fn phrase(slots: usize, pool: usize) -> Vec<Candidate> {
    let config = ProfileConfig::default();
    (0..slots)
        .map(|s| {
            let options = (0..pool)
                .map(|o| {
                    let buffer = tone(200.0 + 37.0 * (s * pool + o) as f32, 0.1 + 0.02 * o as f32, 4410);
                    let features = profile(&buffer, &config);
                    CandidateOption::new(format!("s{}o{}", s, o), buffer, features)
                })
                .collect();
            Candidate::new(format!("slot{}", s), options)
        })
        .collect()
}

fn bench_profile(c: &mut Criterion) {
    // One second at 44.1kHz
    let buffer = tone(440.0, 0.5, 44100);
    let config = ProfileConfig::default();

    c.bench_function("profile_1s", |b| {
        b.iter(|| profile(black_box(&buffer), black_box(&config)));
    });
}

fn bench_assemble(c: &mut Criterion) {
    // 8^5 = 32768 combinations, below the exhaustive ceiling
    let slots = phrase(5, 8);
    let exhaustive = SearchConfig::default();
    let greedy = SearchConfig {
        exhaustive_ceiling: 0,
        ..SearchConfig::default()
    };

    c.bench_function("assemble_exhaustive_5x8", |b| {
        b.iter(|| {
            let mut used = UsedSet::new();
            assemble(black_box(&slots), 5, true, &mut used, &exhaustive)
        });
    });

    c.bench_function("assemble_greedy_5x8", |b| {
        b.iter(|| {
            let mut used = UsedSet::new();
            assemble(black_box(&slots), 5, true, &mut used, &greedy)
        });
    });
}

criterion_group!(benches, bench_profile, bench_assemble);
criterion_main!(benches);
