//! The recorded tap-and-drag gesture, read through every supported source.
//!
//! Each check runs once against the Perfetto binary trace and once against
//! the trace-processor dataset; both must expose identical entries.

mod common;

use std::sync::Arc;

use common::{
    motion_scenario, perfetto_trace, scenario_processor, EXPECTED_REAL_TIMESTAMPS,
};
use winscope_trace::{
    open_parser, ClockKind, CoarseVersion, Parser, ParserConfig, PropertyValue, Timestamp,
    TraceSource, TraceType,
};

fn motion_parsers() -> Vec<(&'static str, Arc<dyn Parser>)> {
    let config = ParserConfig::default();
    vec![
        (
            "perfetto",
            open_parser(
                TraceSource::PerfettoProto(perfetto_trace()),
                TraceType::InputMotionEvent,
                &config,
            )
            .unwrap(),
        ),
        (
            "trace processor",
            open_parser(
                TraceSource::TraceProcessor(scenario_processor()),
                TraceType::InputMotionEvent,
                &config,
            )
            .unwrap(),
        ),
    ]
}

fn formatted(parser: &dyn Parser, index: usize, path: &str) -> String {
    let entry = parser.entry(index).unwrap();
    entry
        .path(path)
        .unwrap_or_else(|| panic!("missing property {path}"))
        .formatted_value()
}

#[test]
fn test_scenario_timestamps() {
    for (source, parser) in motion_parsers() {
        let expected: Vec<Timestamp> = EXPECTED_REAL_TIMESTAMPS
            .iter()
            .map(|&ns| Timestamp::real(ns))
            .collect();
        assert_eq!(parser.timestamps(), expected.as_slice(), "{source}");
        assert_eq!(parser.len(), 4, "{source}");
        assert_eq!(parser.trace_type(), TraceType::InputMotionEvent);
        assert_eq!(parser.coarse_version(), CoarseVersion::Latest);
        assert_eq!(parser.skipped_records(), 0, "{source}");
        assert!(parser.timestamps().iter().all(|t| t.kind() == ClockKind::Real));
    }
}

#[test]
fn test_scenario_first_motion_event() {
    for (source, parser) in motion_parsers() {
        let parser = parser.as_ref();
        assert_eq!(parser.entry(1).unwrap().id, "AndroidMotionEvent entry", "{source}");

        let entry = parser.entry(0).unwrap();
        let motion = entry.child_by_name("motionEvent").unwrap();
        assert_eq!(
            motion.path("eventId").unwrap().value().unwrap().as_u64(),
            Some(856_299_947),
            "{source}"
        );
        assert_eq!(formatted(parser, 0, "motionEvent.action"), "ACTION_DOWN");
        assert_eq!(formatted(parser, 0, "motionEvent.source"), "SOURCE_TOUCHSCREEN");
        assert_eq!(formatted(parser, 0, "motionEvent.flags"), "128");
        assert_eq!(
            motion.path("deviceId").unwrap().value().unwrap().as_i64(),
            Some(4)
        );
        assert_eq!(
            motion.path("displayId").unwrap().value().unwrap().as_i64(),
            Some(0)
        );
        assert_eq!(
            formatted(parser, 0, "motionEvent.classification"),
            "CLASSIFICATION_NONE"
        );
        assert!(motion.path("cursorPositionX").unwrap().value().unwrap().is_null());
        assert!(motion.path("cursorPositionY").unwrap().value().unwrap().is_null());
        assert_eq!(formatted(parser, 0, "motionEvent.metaState"), "0");
    }
}

#[test]
fn test_scenario_pointer_axes() {
    for (source, parser) in motion_parsers() {
        let entry = parser.entry(0).unwrap();
        let pointer = entry.path("motionEvent.pointer.0").unwrap();
        assert_eq!(
            pointer.path("pointerId").unwrap().value().unwrap(),
            &PropertyValue::Int(0),
            "{source}"
        );
        assert_eq!(pointer.path("toolType").unwrap().formatted_value(), "TOOL_TYPE_FINGER");

        let axes = pointer.child_by_name("axisValue").unwrap();
        assert_eq!(axes.all_children().len(), 2);
        assert_eq!(axes.path("0.axis").unwrap().formatted_value(), "AXIS_X");
        assert_eq!(
            axes.path("0.value").unwrap().value().unwrap().as_f64(),
            Some(350.0)
        );
        assert_eq!(axes.path("0.value").unwrap().formatted_value(), "350");
        assert_eq!(axes.path("1.axis").unwrap().formatted_value(), "AXIS_Y");
        assert_eq!(
            axes.path("1.value").unwrap().value().unwrap().as_f64(),
            Some(370.0)
        );
    }
}

#[test]
fn test_scenario_window_dispatch_events() {
    for (source, parser) in motion_parsers() {
        let entry = parser.entry(0).unwrap();
        let events = entry.child_by_name("windowDispatchEvents").unwrap();
        let window_ids: Vec<i64> = events
            .all_children()
            .iter()
            .map(|e| e.path("windowId").unwrap().value().unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(window_ids, vec![292, 247, 240, 370, 229, 0], "{source}");
    }
}

#[test]
fn test_merge_completeness() {
    let scenario = motion_scenario();
    for (source, parser) in motion_parsers() {
        for index in 0..parser.len() {
            let entry = parser.entry(index).unwrap();
            let event_id = entry
                .path("motionEvent.eventId")
                .unwrap()
                .value()
                .unwrap()
                .as_u64()
                .unwrap();
            let fixture = scenario
                .iter()
                .find(|m| u64::from(m.event_id) == event_id)
                .unwrap();
            let events = entry.child_by_name("windowDispatchEvents").unwrap();
            assert!(events.is_container());
            assert_eq!(
                events.all_children().len(),
                fixture.dispatches.len(),
                "{source} entry {index}"
            );
            for dispatch in events.all_children() {
                assert_eq!(
                    dispatch.path("eventId").unwrap().value().unwrap().as_u64(),
                    Some(event_id)
                );
            }
        }
    }
}

#[test]
fn test_formats_produce_identical_entries() {
    let parsers = motion_parsers();
    let (_, perfetto) = &parsers[0];
    let (_, processor) = &parsers[1];
    assert_eq!(perfetto.timestamps(), processor.timestamps());
    for index in 0..perfetto.len() {
        assert_eq!(
            perfetto.entry(index).unwrap(),
            processor.entry(index).unwrap(),
            "entry {index}"
        );
    }
}

#[test]
fn test_key_events() {
    let config = ParserConfig::default();
    let sources = [
        TraceSource::PerfettoProto(perfetto_trace()),
        TraceSource::TraceProcessor(scenario_processor()),
    ];
    for source in sources {
        let parser = open_parser(source, TraceType::InputKeyEvent, &config).unwrap();
        assert_eq!(parser.len(), 2);
        let release = parser.entry(1).unwrap();
        assert_eq!(release.id, "AndroidKeyEvent entry");
        assert_eq!(
            release.path("keyEvent.action").unwrap().formatted_value(),
            "ACTION_UP"
        );
        assert_eq!(
            release.path("keyEvent.keyCode").unwrap().formatted_value(),
            "KEYCODE_A"
        );
        assert_eq!(
            release.path("keyEvent.source").unwrap().formatted_value(),
            "SOURCE_KEYBOARD"
        );
        let windows = release.child_by_name("windowDispatchEvents").unwrap();
        assert_eq!(windows.all_children().len(), 2);
    }
}
