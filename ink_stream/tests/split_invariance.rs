//! Delivering the same samples in differently sized batches must leave every
//! stage of the pipeline in the same state.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use ink_stream::filters::douglas_peucker::{douglas_peucker_iterative, douglas_peucker_recursive};
use ink_stream::{
    to_touch_events, Curve, Delta, DrawEvent, NaiveSavitzkyGolay, Output, Phase, Pipeline,
    PipelineConfig, Polyline, SimpleEvent, SimplifyMethod, SmootherKind, Stream, TouchEvent,
    TouchProperties,
};
use kurbo::Point;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Sample(f64, f64),
    Predict(f64, f64),
    Correct(f64, f64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0.0f64..400.0, 0.0f64..400.0).prop_map(|(x, y)| Op::Sample(x, y)),
        2 => (0.0f64..400.0, 0.0f64..400.0).prop_map(|(x, y)| Op::Predict(x, y)),
        1 => (-5.0f64..5.0, -5.0f64..5.0).prop_map(|(dx, dy)| Op::Correct(dx, dy)),
    ]
}

/// Turn random operations into a script a digitizer could have produced:
/// every touch starts with a real sample, corrections refine the latest
/// sample of their touch, and nothing is predicted past a touch's last
/// real sample.
fn build_script(ops: &[(usize, Op)]) -> Vec<SimpleEvent> {
    let mut script: Vec<SimpleEvent> = Vec::new();
    let mut latest: HashMap<usize, usize> = HashMap::new();
    let mut next_update = 0;

    for (touch, op) in ops {
        let id = format!("touch-{touch}");
        match *op {
            Op::Sample(x, y) => {
                latest.insert(*touch, script.len());
                script.push(SimpleEvent::new(id, x, y));
            }
            Op::Predict(x, y) => {
                if latest.contains_key(touch) {
                    script.push(SimpleEvent::new(id, x, y).predicted());
                }
            }
            Op::Correct(dx, dy) => {
                if let Some(&index) = latest.get(touch) {
                    let update = *script[index].update.get_or_insert_with(|| {
                        next_update += 1;
                        next_update
                    });
                    let base = script[index].location();
                    script.push(SimpleEvent::new(id, base.x + dx, base.y + dy).update(update));
                }
            }
        }
    }

    let mut confirmed: HashSet<String> = HashSet::new();
    let mut kept: Vec<SimpleEvent> = script
        .into_iter()
        .rev()
        .filter(|event| {
            if event.pred {
                confirmed.contains(&event.id)
            } else {
                confirmed.insert(event.id.clone());
                true
            }
        })
        .collect();
    kept.reverse();
    kept
}

prop_compose! {
    fn arb_script()(ops in prop::collection::vec((0usize..3, arb_op()), 1..40)) -> Vec<SimpleEvent> {
        build_script(&ops)
    }
}

prop_compose! {
    fn arb_config()(
        simplify in any::<bool>(),
        recursive in any::<bool>(),
        epsilon in 0.0f64..6.0,
        smoothing in any::<bool>(),
        window in 2usize..=12,
        strength in 0.0f64..=1.0,
        line in any::<bool>(),
    ) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.simplify.enabled = simplify;
        config.simplify.epsilon = epsilon;
        config.simplify.method = if recursive {
            SimplifyMethod::Recursive
        } else {
            SimplifyMethod::Iterative
        };
        config.smoothing.enabled = smoothing;
        config.smoothing.window = window;
        config.smoothing.strength = strength;
        if line {
            config.smoother = SmootherKind::Line;
        }
        config
    }
}

fn draw_events(script: &[SimpleEvent]) -> Vec<DrawEvent> {
    to_touch_events(script)
        .into_iter()
        .map(DrawEvent::from)
        .collect()
}

fn run_split(config: &PipelineConfig, events: &[DrawEvent], splits: &[usize]) -> Pipeline {
    let mut pipeline = Pipeline::new(config.clone());
    let mut start = 0;
    for &end in splits.iter().chain(std::iter::once(&events.len())) {
        pipeline.process(&events[start..end]);
        start = end;
    }
    pipeline
}

fn curve_snapshot(pipeline: &Pipeline) -> Vec<Curve> {
    pipeline.curves().iter().map(|curve| (**curve).clone()).collect()
}

/// Check every filter stage against a from-scratch run over its input.
fn assert_matches_rebuild(pipeline: &Pipeline, config: &PipelineConfig) -> Result<(), TestCaseError> {
    if config.simplify.enabled {
        let reference: Vec<Rc<Polyline>> = pipeline
            .lines()
            .iter()
            .map(|line| {
                let points = match config.simplify.method {
                    SimplifyMethod::Recursive => douglas_peucker_recursive(&line.points, config.simplify.epsilon),
                    SimplifyMethod::Iterative => douglas_peucker_iterative(&line.points, config.simplify.epsilon),
                };
                Rc::new(Polyline {
                    touch_identifier: line.touch_identifier.clone(),
                    is_complete: line.is_complete,
                    points,
                })
            })
            .collect();
        prop_assert_eq!(reference, pipeline.simplified().to_vec());
    }

    if config.smoothing.enabled {
        let mut naive = NaiveSavitzkyGolay::new(config.smoothing.window, config.smoothing.strength);
        let reference = naive.produce(&Output::new(pipeline.simplified().to_vec(), Vec::new()));
        prop_assert_eq!(reference.items, pipeline.smoothed().to_vec());
    }

    let smoother = config.smoother.build();
    let rebuilt: Vec<Curve> = pipeline
        .smoothed()
        .iter()
        .map(|line| Curve::from_polyline(smoother.as_ref(), line))
        .collect();
    prop_assert_eq!(rebuilt, curve_snapshot(pipeline));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn split_delivery_matches_single_batch(
        script in arb_script(),
        config in arb_config(),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let events = draw_events(&script);
        let mut splits: Vec<usize> = cuts.iter().map(|cut| cut.index(events.len() + 1)).collect();
        splits.sort_unstable();
        splits.dedup();

        let whole = run_split(&config, &events, &[]);
        let split = run_split(&config, &events, &splits);

        prop_assert_eq!(whole.paths().to_vec(), split.paths().to_vec());
        prop_assert_eq!(whole.lines().to_vec(), split.lines().to_vec());
        prop_assert_eq!(whole.simplified().to_vec(), split.simplified().to_vec());
        prop_assert_eq!(whole.smoothed().to_vec(), split.smoothed().to_vec());
        prop_assert_eq!(curve_snapshot(&whole), curve_snapshot(&split));
    }

    #[test]
    fn incremental_stages_match_full_rebuild(
        script in arb_script(),
        config in arb_config(),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 1..6),
    ) {
        let events = draw_events(&script);
        let mut splits: Vec<usize> = cuts.iter().map(|cut| cut.index(events.len() + 1)).collect();
        splits.sort_unstable();
        splits.dedup();
        let pipeline = run_split(&config, &events, &splits);
        assert_matches_rebuild(&pipeline, &config)?;
    }

    #[test]
    fn toggled_filters_match_full_rebuild(
        script in arb_script(),
        config in arb_config(),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 1..6),
        toggles in prop::collection::vec((any::<bool>(), any::<bool>()), 6),
    ) {
        let events = draw_events(&script);
        let mut splits: Vec<usize> = cuts.iter().map(|cut| cut.index(events.len() + 1)).collect();
        splits.sort_unstable();
        splits.dedup();

        let mut pipeline = Pipeline::new(config.clone());
        let mut start = 0;
        for (&end, &(simplify, smoothing)) in splits
            .iter()
            .chain(std::iter::once(&events.len()))
            .zip(toggles.iter().cycle())
        {
            pipeline.set_simplify_enabled(simplify);
            pipeline.set_smoothing_enabled(smoothing);
            pipeline.process(&events[start..end]);
            start = end;
        }

        pipeline.set_simplify_enabled(true);
        pipeline.set_smoothing_enabled(true);
        pipeline.process(&[]);
        assert_matches_rebuild(&pipeline, pipeline.config())?;
    }
}

#[test]
fn empty_batch_changes_nothing() {
    let events = draw_events(&SimpleEvent::line(Point::new(0.0, 0.0), Point::new(60.0, 30.0), 4.0));
    let mut pipeline = Pipeline::default();
    pipeline.process(&events[..events.len() - 1]);
    let before = curve_snapshot(&pipeline);
    let lines = pipeline.smoothed().to_vec();

    assert!(pipeline.process(&[]).is_empty());
    assert_eq!(curve_snapshot(&pipeline), before);
    assert_eq!(*pipeline.smoothed(), lines[..]);
}

fn zigzag(id: &str, y: f64, count: usize) -> Vec<SimpleEvent> {
    (0..count)
        .map(|i| SimpleEvent::new(id, i as f64 * 10.0, if i % 2 == 0 { y } else { y + 20.0 }))
        .collect()
}

#[test]
fn untouched_stroke_stays_smoothed_across_toggle() {
    let a = zigzag("a", 0.0, 7);
    let b = zigzag("b", 100.0, 7);
    let mut script: Vec<SimpleEvent> = a[..6].to_vec();
    script.extend_from_slice(&b[..3]);
    script.extend_from_slice(&b[3..6]);
    script.push(a[6].clone());
    script.push(b[6].clone());
    let events = draw_events(&script);

    let mut config = PipelineConfig::default();
    config.simplify.enabled = false;
    let mut pipeline = Pipeline::new(config.clone());
    pipeline.process(&events[..9]);
    pipeline.set_smoothing_enabled(false);
    pipeline.process(&events[9..12]);
    pipeline.set_smoothing_enabled(true);
    pipeline.process(&events[12..]);

    let mut naive = NaiveSavitzkyGolay::new(config.smoothing.window, config.smoothing.strength);
    let reference = naive.produce(&Output::new(pipeline.simplified().to_vec(), Vec::new()));
    assert_eq!(reference.items, pipeline.smoothed().to_vec());

    let smoother = config.smoother.build();
    assert_eq!(
        *pipeline.curves()[0],
        Curve::from_polyline(smoother.as_ref(), &reference.items[0])
    );
}

#[test]
fn reset_replays_identically() {
    let script = [
        SimpleEvent::new("a", 10.0, 10.0).update(1),
        SimpleEvent::new("b", 200.0, 10.0),
        SimpleEvent::new("a", 30.0, 15.0).predicted(),
        SimpleEvent::new("a", 12.0, 11.0).update(1),
        SimpleEvent::new("b", 220.0, 40.0),
        SimpleEvent::new("a", 35.0, 20.0),
        SimpleEvent::new("b", 240.0, 80.0),
    ];
    let events = draw_events(&script);
    let mut pipeline = Pipeline::default();
    let mut first = Vec::new();
    for event in &events {
        first.extend(pipeline.process(std::slice::from_ref(event)));
    }
    let curves = curve_snapshot(&pipeline);

    pipeline.reset();
    let mut again = Vec::new();
    for event in &events {
        again.extend(pipeline.process(std::slice::from_ref(event)));
    }
    assert_eq!(again, first);
    assert_eq!(curve_snapshot(&pipeline), curves);
}

#[test]
fn correction_keeps_prediction_through_pipeline() {
    let first = TouchEvent::new("t", Phase::Began, Point::new(0.0, 0.0))
        .estimated(1, TouchProperties::LOCATION);
    let prediction = TouchEvent::new("t", Phase::Moved, Point::new(10.0, 0.0)).predicted();
    let mut correction = TouchEvent::new("t", Phase::Moved, Point::new(1.0, 1.0))
        .estimated(1, TouchProperties::empty());
    correction.is_update = true;

    let mut pipeline = Pipeline::default();
    pipeline.process(&[first.into(), prediction.into()]);
    let deltas = pipeline.process(&[correction.into()]);

    assert!(deltas.iter().all(|delta| !matches!(delta, Delta::Completed(_))));
    let lines = pipeline.lines();
    assert_eq!(lines[0].len(), 2);
    assert!(!lines[0].is_complete);
    assert!(lines[0].points[1].is_prediction);
    assert_eq!(lines[0].points[0].location, Point::new(1.0, 1.0));
}

#[test]
fn new_sample_replaces_predictions_through_pipeline() {
    let mut pipeline = Pipeline::default();
    pipeline.process(&[
        TouchEvent::new("t", Phase::Began, Point::new(0.0, 0.0)).into(),
        TouchEvent::new("t", Phase::Moved, Point::new(10.0, 0.0)).into(),
        TouchEvent::new("t", Phase::Moved, Point::new(20.0, 0.0)).predicted().into(),
        TouchEvent::new("t", Phase::Moved, Point::new(30.0, 0.0)).predicted().into(),
    ]);
    assert_eq!(pipeline.lines()[0].len(), 4);

    pipeline.process(&[TouchEvent::new("t", Phase::Moved, Point::new(15.0, 1.0)).into()]);
    let path = Rc::clone(&pipeline.paths()[0]);
    assert_eq!(path.confirmed_len(), 3);
    assert_eq!(path.predicted_len(), 0);
    assert_eq!(pipeline.lines()[0].len(), 3);
    assert!(pipeline.lines()[0].points.iter().all(|point| !point.is_prediction));
}
