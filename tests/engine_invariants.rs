use patchflow::{score, Coord, FeatureArray, Level, LevelParams, PatchMatchEngine, RadiusSchedule};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_features(rng: &mut StdRng, channels: usize, height: usize, width: usize) -> FeatureArray {
    let data = (0..channels * height * width)
        .map(|_| rng.random_range(-1.0f32..1.0))
        .collect();
    FeatureArray::new(data, channels, height, width).unwrap()
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

fn assert_scores_consistent(level: &Level, opposing: &Level) {
    let field = level.field();
    for y in 0..field.height() {
        for x in 0..field.width() {
            let c = field.index(y, x).unwrap();
            let stored = field.score(y, x).unwrap();
            let fresh = score(level.patches(), y, x, opposing.patches(), c.row, c.col).unwrap();
            assert!(
                (stored - fresh).abs() <= 1e-6,
                "cell ({y}, {x}) stored {stored} recomputed {fresh}"
            );
        }
    }
}

fn assert_in_bounds(level: &Level, opposing: &Level) {
    for c in level.field().indices() {
        assert!(c.row < opposing.height(), "row {} out of bounds", c.row);
        assert!(c.col < opposing.width(), "col {} out of bounds", c.col);
    }
}

#[test]
fn stored_scores_match_recomputation_after_every_step() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut a = level(random_features(&mut rng, 4, 9, 7), 3, 1);
    let b = level(random_features(&mut rng, 4, 9, 7), 3, 1);
    let mut engine = PatchMatchEngine::new(5);

    engine.initialize(&mut a, &b).unwrap();
    assert_scores_consistent(&a, &b);
    for i in 0..6 {
        if i % 2 == 0 {
            engine.propagate(&mut a, &b, i / 2).unwrap();
        } else {
            engine.random_search(&mut a, &b, 6, 3).unwrap();
        }
        assert_scores_consistent(&a, &b);
        assert_in_bounds(&a, &b);
    }
}

#[test]
fn scores_never_decrease_between_steps() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut a = level(random_features(&mut rng, 3, 8, 8), -1, 1);
    let b = level(random_features(&mut rng, 3, 8, 8), -1, 1);
    let mut engine = PatchMatchEngine::new(1).with_radius_schedule(RadiusSchedule::Decayed);

    engine.initialize(&mut a, &b).unwrap();
    let mut previous = a.field().scores().to_vec();
    for i in 0..8 {
        if i % 2 == 0 {
            engine.propagate(&mut a, &b, i / 2).unwrap();
        } else {
            engine.random_search(&mut a, &b, 4, 0).unwrap();
        }
        let current = a.field().scores();
        for (idx, (&before, &after)) in previous.iter().zip(current.iter()).enumerate() {
            assert!(after >= before, "cell {idx} dropped from {before} to {after}");
        }
        previous = current.to_vec();
    }
}

#[test]
fn self_match_scores_one_at_identity() {
    let mut rng = StdRng::seed_from_u64(3);
    let features = random_features(&mut rng, 5, 6, 6);
    let mut a = level(features.clone(), 2, 1);
    let b = level(features, 2, 1);
    let engine = PatchMatchEngine::new(0);
    engine.initialize(&mut a, &b).unwrap();
    for &s in a.field().scores() {
        assert!((s - 1.0).abs() <= 1e-5, "self score {s}");
    }
}

#[test]
fn descriptors_are_unit_length() {
    let mut rng = StdRng::seed_from_u64(8);
    let lvl = level(random_features(&mut rng, 3, 5, 6), 2, 2);
    let bank = lvl.patches().orign();
    assert_eq!(bank.dim(), 3 * 25);
    for y in 0..bank.height() {
        for x in 0..bank.width() {
            let d = bank.descriptor(y, x).unwrap();
            let norm: f32 = d.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() <= 1e-4, "norm {norm} at ({y}, {x})");
        }
    }
}

#[test]
fn corner_candidates_are_clamped_in_both_scan_directions() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut a = level(random_features(&mut rng, 2, 5, 4), 2, 1);
    let b = level(random_features(&mut rng, 2, 3, 3), 2, 1);
    a.bind_opposing(&b).unwrap();
    let engine = PatchMatchEngine::new(0);
    engine.initialize(&mut a, &b).unwrap();

    // binding clamps the identity into the 3x3 target
    assert_eq!(a.field().index(4, 3), Some(Coord::new(2, 2)));
    assert_eq!(a.field().index(0, 3), Some(Coord::new(0, 2)));

    for iteration in 0..4 {
        engine.propagate(&mut a, &b, iteration).unwrap();
        assert_in_bounds(&a, &b);
        assert_scores_consistent(&a, &b);
    }
}

#[test]
fn random_search_stays_inside_small_targets() {
    let mut rng = StdRng::seed_from_u64(77);
    let mut a = level(random_features(&mut rng, 2, 4, 4), 6, 0);
    let b = level(random_features(&mut rng, 2, 1, 2), 6, 0);
    a.bind_opposing(&b).unwrap();
    let mut engine = PatchMatchEngine::new(9);
    engine.initialize(&mut a, &b).unwrap();
    for _ in 0..5 {
        engine.random_search(&mut a, &b, 8, 6).unwrap();
        engine.random_search(&mut a, &b, 8, -1).unwrap();
        assert_in_bounds(&a, &b);
    }
    assert_scores_consistent(&a, &b);
}

#[test]
fn unbound_field_of_different_size_is_rejected() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut a = level(random_features(&mut rng, 2, 4, 4), 2, 1);
    let b = level(random_features(&mut rng, 2, 3, 3), 2, 1);
    let engine = PatchMatchEngine::new(0);
    assert!(engine.initialize(&mut a, &b).is_err());
}

#[test]
fn same_seed_gives_same_fields() {
    let mut rng = StdRng::seed_from_u64(5);
    let fa = random_features(&mut rng, 3, 7, 7);
    let fb = random_features(&mut rng, 3, 7, 7);
    let b = level(fb, -1, 1);

    let run = |seed: u64| {
        let mut a = level(fa.clone(), -1, 1);
        let mut engine = PatchMatchEngine::new(seed);
        engine.initialize(&mut a, &b).unwrap();
        for i in 0..4 {
            engine.propagate(&mut a, &b, i).unwrap();
            engine.random_search(&mut a, &b, 6, -1).unwrap();
        }
        a.into_field()
    };

    assert_eq!(run(13), run(13));
}

/// Final column reached from column 0 by one search call with `times = 4`
/// and radius 16, against a 1x64 target whose score rises with the column.
fn furthest_column(schedule: RadiusSchedule, seed: u64) -> usize {
    let source = FeatureArray::new(vec![1.0, 0.0], 2, 1, 1).unwrap();
    let target = FeatureArray::from_fn(2, 1, 64, |c, _, u| {
        let angle = (63 - u) as f32 * 0.02;
        if c == 0 {
            angle.cos()
        } else {
            angle.sin()
        }
    })
    .unwrap();
    let mut a = level(source, 16, 0);
    let b = level(target, 16, 0);
    a.bind_opposing(&b).unwrap();
    assert_eq!(a.field().index(0, 0), Some(Coord::new(0, 0)));

    let mut engine = PatchMatchEngine::new(seed).with_radius_schedule(schedule);
    engine.initialize(&mut a, &b).unwrap();
    engine.random_search(&mut a, &b, 4, 16).unwrap();
    a.field().index(0, 0).unwrap().col
}

#[test]
fn decayed_radius_limits_how_far_one_call_can_move() {
    // radii 16, 8, 4, 2 allow offsets of at most 15 + 7 + 3 + 1
    let decayed_reach = 26;
    let decayed: Vec<usize> = (0..200)
        .map(|seed| furthest_column(RadiusSchedule::Decayed, seed))
        .collect();
    let fixed: Vec<usize> = (0..200)
        .map(|seed| furthest_column(RadiusSchedule::Fixed, seed))
        .collect();

    let decayed_max = decayed.iter().copied().max().unwrap();
    assert!(decayed_max <= decayed_reach, "decayed search reached column {decayed_max}");
    assert!(decayed_max > 0, "decayed search never moved");

    let fixed_max = fixed.iter().copied().max().unwrap();
    assert!(fixed_max <= 60, "fixed search reached column {fixed_max}");
    assert!(
        fixed_max > decayed_reach,
        "fixed search never went past column {fixed_max}"
    );
}
