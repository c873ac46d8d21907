#![cfg(feature = "rayon")]

use patchflow::{Analogy, BoxPyramidExtractor, FeatureArray, FlowConfig, RadiusSchedule};

fn make_image(channels: usize, height: usize, width: usize) -> FeatureArray {
    FeatureArray::from_fn(channels, height, width, |c, y, x| {
        let value = ((x * 13) ^ (y * 7) ^ (x * y) ^ (c * 31)) & 0xFF;
        value as f32 / 255.0
    })
    .unwrap()
}

fn run(config: FlowConfig, first: &FeatureArray, second: &FeatureArray) -> patchflow::AnalogyOutput {
    let mut analogy = Analogy::new(config).unwrap();
    analogy
        .run_images(&BoxPyramidExtractor { levels: 3 }, first, second)
        .unwrap()
}

#[test]
fn parallel_search_matches_sequential() {
    let first = make_image(3, 32, 24);
    let second = FeatureArray::from_fn(3, 32, 24, |c, y, x| {
        first.get(c, (y + 3) % 32, (x + 5) % 24).unwrap()
    })
    .unwrap();

    for schedule in [RadiusSchedule::Fixed, RadiusSchedule::Decayed] {
        let base = FlowConfig {
            iterations: 10,
            radius_schedule: schedule,
            seed: 17,
            ..FlowConfig::default()
        };
        let seq = run(
            FlowConfig {
                parallel: false,
                ..base.clone()
            },
            &first,
            &second,
        );
        let par = run(
            FlowConfig {
                parallel: true,
                ..base
            },
            &first,
            &second,
        );

        assert_eq!(seq.first_field(), par.first_field());
        assert_eq!(seq.second_field(), par.second_field());
        for (s, p) in seq.reports.iter().zip(par.reports.iter()) {
            assert_eq!(s.mean_score, p.mean_score);
        }
    }
}
