//! Property tests for cursor handling
//!
//! Year interpolation, clamping and seek idempotence must hold for any
//! sequence and any cursor, not just the hand-picked values in unit tests.

use history_playback::engine::PlaybackEngine;
use history_playback::types::{
    AnimatedCity, AnimationSequence, CameraKeyframe, CityEvent, CityStatus, NarrationSegment,
    TimeRange, ViewState,
};
use proptest::prelude::*;

fn sequence(start: i32, span: i32, mut stamps: Vec<f64>) -> AnimationSequence {
    stamps.sort_by(|a, b| a.total_cmp(b));
    let statuses = [
        CityStatus::UnderSiege,
        CityStatus::Conquered,
        CityStatus::Allied,
        CityStatus::MongolCapital,
    ];

    AnimationSequence {
        time_range: TimeRange {
            start,
            end: start + span,
            duration_months: None,
        },
        armies: Vec::new(),
        cities: vec![AnimatedCity {
            id: "city".into(),
            name: "City".into(),
            location: [0.0, 0.0],
            events: stamps
                .iter()
                .enumerate()
                .map(|(i, &timestamp)| CityEvent {
                    timestamp,
                    status: statuses[i % statuses.len()],
                    icon_size: None,
                    label: None,
                })
                .collect(),
        }],
        territories: Vec::new(),
        camera_keyframes: stamps
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| CameraKeyframe {
                timestamp,
                view_state: ViewState {
                    longitude: i as f64 * 7.0,
                    latitude: -(i as f64),
                    zoom: 2.0 + i as f64,
                    ..Default::default()
                },
                transition_duration: 0,
                label: None,
            })
            .collect(),
        narration: stamps
            .iter()
            .map(|&timestamp| NarrationSegment {
                timestamp,
                speaker: "narrator".into(),
                text: format!("at {timestamp}"),
                citation_urls: Vec::new(),
            })
            .collect(),
    }
}

fn arb_sequence() -> impl Strategy<Value = AnimationSequence> {
    (
        -3000i32..3000,
        0i32..500,
        prop::collection::vec(0.0f64..=100.0, 0..8),
    )
        .prop_map(|(start, span, stamps)| sequence(start, span, stamps))
}

proptest! {
    #[test]
    fn year_follows_linear_mapping(seq in arb_sequence(), t in 0.0f64..=100.0) {
        let range = seq.time_range;
        let mut engine = PlaybackEngine::new();
        engine.load(seq);
        engine.seek_to(t);

        let exact = f64::from(range.start) + f64::from(range.end - range.start) * (t / 100.0);
        prop_assert_eq!(engine.current_year(), (exact + 0.5).floor() as i32);
    }

    #[test]
    fn out_of_range_cursors_clamp(seq in arb_sequence(), over in 0.0f64..1.0e6) {
        let mut engine = PlaybackEngine::new();
        engine.load(seq);

        engine.seek_to(0.0);
        let low = engine.derived().clone();
        engine.seek_to(-over);
        prop_assert_eq!(engine.cursor(), 0.0);
        prop_assert_eq!(engine.derived(), &low);

        engine.seek_to(100.0);
        let high = engine.derived().clone();
        engine.seek_to(100.0 + over);
        prop_assert_eq!(engine.cursor(), 100.0);
        prop_assert_eq!(engine.derived(), &high);
    }

    #[test]
    fn seeking_twice_is_idempotent(seq in arb_sequence(), t in -50.0f64..150.0) {
        let mut engine = PlaybackEngine::new();
        engine.load(seq);
        engine.seek_to(t);
        let first = engine.derived().clone();
        engine.seek_to(t);
        prop_assert_eq!(engine.derived(), &first);
    }

    #[test]
    fn city_status_is_last_event_at_or_before(seq in arb_sequence(), t in 0.0f64..=100.0) {
        let expected = seq.cities[0]
            .events
            .iter()
            .filter(|e| e.timestamp <= t)
            .last()
            .map(|e| e.status)
            .unwrap_or(CityStatus::Neutral);

        let mut engine = PlaybackEngine::new();
        engine.load(seq);
        engine.seek_to(t);
        prop_assert_eq!(engine.derived().city_states["city"], expected);
    }

    #[test]
    fn skip_to_year_lands_on_that_year(seq in arb_sequence(), frac in 0.0f64..=1.0) {
        let range = seq.time_range;
        prop_assume!(range.end > range.start);
        let year = range.start + ((range.end - range.start) as f64 * frac).round() as i32;

        let mut engine = PlaybackEngine::new();
        engine.load(seq);
        engine.skip_to_year(f64::from(year));
        prop_assert_eq!(engine.current_year(), year);
    }
}
