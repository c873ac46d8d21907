use criterion::{criterion_group, criterion_main, Criterion};
use patchflow::{
    Analogy, BoxPyramidExtractor, FeatureArray, FlowConfig, Level, LevelParams, PatchBank,
    PatchMatchEngine,
};
use std::hint::black_box;

fn make_features(channels: usize, height: usize, width: usize, salt: usize) -> FeatureArray {
    FeatureArray::from_fn(channels, height, width, |c, y, x| {
        let value = ((x * 13) ^ (y * 7) ^ (x * y) ^ (c * 31 + salt)) & 0xFF;
        value as f32 / 255.0
    })
    .unwrap()
}

fn level(features: FeatureArray, radius: i32, padding: usize) -> Level {
    Level::new(
        0,
        features,
        LevelParams {
            weight: 0.8,
            radius,
            padding,
        },
    )
    .unwrap()
}

fn bench_patch_bank(c: &mut Criterion) {
    let features = make_features(64, 64, 64, 0);
    c.bench_function("patch_bank_64ch_64x64_pad2", |b| {
        b.iter(|| black_box(PatchBank::extract(&features, 2).unwrap()));
    });
}

fn bench_engine(c: &mut Criterion) {
    let first = level(make_features(32, 48, 48, 0), 6, 1);
    let second = level(make_features(32, 48, 48, 5), 6, 1);

    c.bench_function("propagate_48x48", |b| {
        let engine = PatchMatchEngine::new(0);
        let mut work = first.clone();
        engine.initialize(&mut work, &second).unwrap();
        let mut iteration = 0;
        b.iter(|| {
            engine.propagate(&mut work, &second, iteration).unwrap();
            iteration += 1;
        });
    });

    c.bench_function("random_search_48x48_r6", |b| {
        let mut engine = PatchMatchEngine::new(0);
        let mut work = first.clone();
        engine.initialize(&mut work, &second).unwrap();
        b.iter(|| engine.random_search(&mut work, &second, 6, 6).unwrap());
    });

    #[cfg(feature = "rayon")]
    c.bench_function("random_search_48x48_r6_parallel", |b| {
        let mut engine = PatchMatchEngine::new(0).with_parallel(true);
        let mut work = first.clone();
        engine.initialize(&mut work, &second).unwrap();
        b.iter(|| engine.random_search(&mut work, &second, 6, 6).unwrap());
    });
}

fn bench_full_run(c: &mut Criterion) {
    let first = make_features(3, 64, 64, 0);
    let second = make_features(3, 64, 64, 9);
    let extractor = BoxPyramidExtractor { levels: 3 };
    let config = FlowConfig {
        iterations: 8,
        ..FlowConfig::default()
    };

    c.bench_function("analogy_3_levels_64x64", |b| {
        b.iter(|| {
            let mut analogy = Analogy::new(config.clone()).unwrap();
            black_box(analogy.run_images(&extractor, &first, &second).unwrap())
        });
    });
}

criterion_group!(benches, bench_patch_bank, bench_engine, bench_full_run);
criterion_main!(benches);
