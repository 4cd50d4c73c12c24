use proptest::prelude::*;
use std::time::Duration;

use presence_tracker::{
    ClassifierConfig, GazePoint, HeadPose, PresenceClassifier, Sample, TrackerMode,
};

#[derive(Clone, Debug)]
enum Op {
    Tick,
    Advance(u64),
    Sample { x: f64, y: f64, hx: f64, hy: f64 },
    Focus(Option<bool>),
    ResetAlert,
    Stop,
    Start,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Tick),
        3 => (0u64..20_000).prop_map(Op::Advance),
        3 => (-500.0..2000.0f64, -500.0..1200.0f64, -30.0..30.0f64, -30.0..30.0f64)
            .prop_map(|(x, y, hx, hy)| Op::Sample { x, y, hx, hy }),
        1 => prop::option::of(any::<bool>()).prop_map(Op::Focus),
        1 => Just(Op::ResetAlert),
        1 => Just(Op::Stop),
        1 => Just(Op::Start),
    ]
}

proptest! {
    #[test]
    fn attention_score_stays_within_bounds(
        seed in any::<u64>(),
        ops in prop::collection::vec(op(), 1..200),
    ) {
        let mut classifier =
            PresenceClassifier::with_seed(ClassifierConfig::default(), seed).unwrap();
        classifier.start();
        classifier.advance(Duration::from_secs(3));

        for op in ops {
            match op {
                Op::Tick => classifier.tick(),
                Op::Advance(ms) => classifier.advance(Duration::from_millis(ms)),
                Op::Sample { x, y, hx, hy } => {
                    let sample = Sample {
                        gaze: GazePoint { x, y },
                        head: HeadPose { x: hx, y: hy, z: 50.0 },
                        occurred_at: classifier.now(),
                    };
                    classifier.on_sample(sample);
                }
                Op::Focus(focus) => classifier.set_focus_override(focus),
                Op::ResetAlert => {
                    let _ = classifier.reset_alert();
                }
                Op::Stop => classifier.stop(),
                Op::Start => classifier.start(),
            }

            let snapshot = classifier.get_state();
            if let Some(attention) = &snapshot.attention {
                prop_assert!((0.0..=100.0).contains(&attention.attention_score));
                prop_assert!((0.0..=100.0).contains(&attention.screen_focus_ratio));
                prop_assert!(attention.pattern_score >= 0.0);
            } else {
                prop_assert_eq!(snapshot.mode, TrackerMode::Inactive);
                prop_assert_eq!(classifier.pending_timers(), 0);
            }
        }
    }
}
