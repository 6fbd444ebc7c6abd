use proptest::prelude::*;
use seg_annotate::dispatch::{Dispatcher, DrawState, Transition};
use seg_annotate::export::{parse_record, record_to_string};
use seg_annotate::model::{Point, PolygonSet, MIN_POLYGON_POINTS};
use seg_annotate::session::replay;

mod helpers;
use helpers::{annotator, arb_drawing_events, arb_shapes, clicks, key, ScriptedPrompt};

proptest! {
    #![proptest_config(helpers::proptest_config())]

    #[test]
    fn undo_on_empty_buffer_stays_empty(undos in 0usize..50) {
        let mut d = Dispatcher::new();
        for _ in 0..undos {
            prop_assert_eq!(d.handle(key('u')), Transition::Unchanged);
        }
        prop_assert!(d.buffer().is_empty());
        prop_assert_eq!(d.state(), DrawState::IdleEmpty);
    }

    #[test]
    fn committed_polygons_never_have_fewer_than_three_points(events in arb_drawing_events(80)) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut a = annotator(dir.path());
        let mut prompt = ScriptedPrompt::numbered(80);
        replay(&mut a, events, &mut prompt).expect("replay");
        for polygon in a.session().polygons() {
            prop_assert!(polygon.points().len() >= MIN_POLYGON_POINTS);
        }
    }

    #[test]
    fn failed_commit_leaves_state_untouched(events in arb_drawing_events(40)) {
        let mut d = Dispatcher::new();
        let mut set = PolygonSet::new();
        for event in events {
            if d.handle(event) == Transition::LabelRequested {
                d.accept_label("x".to_string(), &mut set);
            }
        }
        while d.buffer().len() >= MIN_POLYGON_POINTS {
            d.handle(key('u'));
        }

        let buffer_before = d.buffer().clone();
        let set_before = set.clone();
        prop_assert_eq!(d.handle(key('s')), Transition::Unchanged);
        prop_assert_eq!(d.buffer(), &buffer_before);
        prop_assert_eq!(&set, &set_before);
    }

    #[test]
    fn export_round_trip_preserves_labels_and_points(shapes in arb_shapes(12)) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut a = annotator(dir.path());
        let mut prompt = ScriptedPrompt::new(shapes.iter().map(|(label, _)| label.clone()));

        let mut events = Vec::new();
        for (_, points) in &shapes {
            events.extend(clicks(points));
            events.push(key('s'));
        }
        events.extend([key('q'), key('q')]);
        let report = replay(&mut a, events, &mut prompt)
            .expect("replay")
            .expect("session finished");
        prop_assert_eq!(report.polygon_count, shapes.len());

        let reloaded = seg_annotate::export::load_record(&report.record_path).expect("reload");
        prop_assert_eq!(reloaded.len(), shapes.len());
        for (polygon, (label, points)) in reloaded.iter().zip(&shapes) {
            prop_assert_eq!(polygon.label(), label.as_str());
            let expected: Vec<Point> = points.iter().copied().map(Point::from).collect();
            prop_assert_eq!(polygon.points(), expected.as_slice());
        }
    }

    #[test]
    fn record_keys_are_contiguous_indices(shapes in arb_shapes(15)) {
        let polygons: Vec<_> = shapes
            .iter()
            .filter_map(|(label, points)| {
                seg_annotate::model::Polygon::new(
                    label.clone(),
                    points.iter().copied().map(Point::from).collect(),
                )
            })
            .collect();
        let json = record_to_string(&polygons).expect("serialize");

        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let mut keys: Vec<String> = value
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect();
        let mut expected: Vec<String> = (0..polygons.len()).map(|i| i.to_string()).collect();
        keys.sort();
        expected.sort();
        prop_assert_eq!(keys, expected);
        prop_assert_eq!(parse_record(&json).expect("parse"), polygons);
    }
}
