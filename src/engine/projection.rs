//! Pure projections from `(sequence, cursor)` to derived values.
//!
//! All scans are linear and assume timestamps sorted ascending: the last
//! entry at or before the cursor wins and the scan stops at the first entry
//! past it. Unsorted input is not detected here.

use std::collections::BTreeMap;

use crate::types::{
    AnimationSequence, ArmyPath, CityEvent, CityStatus, LngLat, NarrationSegment, TerritoryFrame,
    ViewState,
};

/// Cursor bounds.
pub const CURSOR_MIN: f64 = 0.0;
pub const CURSOR_MAX: f64 = 100.0;

/// Icon size used when a city event does not specify one.
pub const DEFAULT_ICON_SIZE: f64 = 20.0;

/// Clamp a requested cursor into `[0, 100]`. NaN and -0.0 map to 0.
pub fn clamp_cursor(t: f64) -> f64 {
    if t.is_nan() {
        return CURSOR_MIN;
    }
    t.clamp(CURSOR_MIN, CURSOR_MAX) + 0.0
}

/// Unrounded calendar year at cursor `t`.
pub fn timestamp_to_year(t: f64, start: i32, end: i32) -> f64 {
    let (start, end) = (f64::from(start), f64::from(end));
    start + (end - start) * (t / CURSOR_MAX)
}

/// Inverse of `timestamp_to_year`. Returns `None` for a zero-length range.
pub fn year_to_timestamp(year: f64, start: i32, end: i32) -> Option<f64> {
    if start == end {
        return None;
    }
    let (start, end) = (f64::from(start), f64::from(end));
    Some((year - start) / (end - start) * CURSOR_MAX)
}

/// Year displayed at cursor `t`. Halves round up.
pub fn interpolate_year(t: f64, start: i32, end: i32) -> i32 {
    (timestamp_to_year(t, start, end) + 0.5).floor() as i32
}

/// Last item whose timestamp is at or before `t`.
fn last_at_or_before<T>(items: &[T], t: f64, timestamp: impl Fn(&T) -> f64) -> Option<&T> {
    let mut current = None;
    for item in items {
        if timestamp(item) <= t {
            current = Some(item);
        } else {
            break;
        }
    }
    current
}

pub fn city_states(sequence: &AnimationSequence, t: f64) -> BTreeMap<String, CityStatus> {
    sequence
        .cities
        .iter()
        .map(|city| {
            let status = last_at_or_before(&city.events, t, |e| e.timestamp)
                .map(|e| e.status)
                .unwrap_or_default();
            (city.id.clone(), status)
        })
        .collect()
}

/// Active frame of the first territory. Only one territory region is
/// projected at a time; later entries in `territories` are ignored.
pub fn territory_frame(sequence: &AnimationSequence, t: f64) -> Option<TerritoryFrame> {
    let territory = sequence.territories.first()?;
    last_at_or_before(&territory.frames, t, |f| f.timestamp).cloned()
}

pub fn narration_at(sequence: &AnimationSequence, t: f64) -> Option<NarrationSegment> {
    last_at_or_before(&sequence.narration, t, |n| n.timestamp).cloned()
}

/// Camera pose at `t`.
///
/// Before the first keyframe the first pose is held; after the last keyframe
/// the last pose is held. In between, every field is lerped.
pub fn target_view_state(sequence: &AnimationSequence, t: f64) -> Option<ViewState> {
    let keyframes = &sequence.camera_keyframes;
    let last = keyframes.last()?;

    match keyframes.iter().position(|k| t < k.timestamp) {
        None => Some(last.view_state),
        Some(0) => Some(keyframes[0].view_state),
        Some(i) => {
            let prev = &keyframes[i - 1];
            let next = &keyframes[i];
            let progress = (t - prev.timestamp) / (next.timestamp - prev.timestamp);
            Some(lerp_view_state(&prev.view_state, &next.view_state, progress))
        }
    }
}

fn lerp(a: f64, b: f64, progress: f64) -> f64 {
    a + (b - a) * progress
}

pub fn lerp_view_state(from: &ViewState, to: &ViewState, progress: f64) -> ViewState {
    ViewState {
        longitude: lerp(from.longitude, to.longitude, progress),
        latitude: lerp(from.latitude, to.latitude, progress),
        zoom: lerp(from.zoom, to.zoom, progress),
        pitch: lerp(from.pitch, to.pitch, progress),
        bearing: lerp(from.bearing, to.bearing, progress),
    }
}

// ---------------------------------------------------------------------------
// Armies
// ---------------------------------------------------------------------------

/// Index of the path segment `[i, i + 1]` whose time span contains `t`.
fn active_segment(army: &ArmyPath, t: f64) -> Option<usize> {
    let pairs = army.timestamps.len().min(army.path.len()).saturating_sub(1);
    (0..pairs).find(|&i| t >= army.timestamps[i] && t <= army.timestamps[i + 1])
}

/// Head position of an army at `t`.
///
/// `None` before the army's first timestamp; the final point once its last
/// timestamp has passed.
pub fn army_position(army: &ArmyPath, t: f64) -> Option<LngLat> {
    if let Some(i) = active_segment(army, t) {
        let (t1, t2) = (army.timestamps[i], army.timestamps[i + 1]);
        let [lng1, lat1] = army.path[i];
        let [lng2, lat2] = army.path[i + 1];
        // Zero-length segments sit on their start point.
        let progress = if t2 > t1 { (t - t1) / (t2 - t1) } else { 0.0 };
        return Some([lerp(lng1, lng2, progress), lerp(lat1, lat2, progress)]);
    }

    let first = *army.timestamps.first()?;
    if t < first {
        return None;
    }
    let last = *army.timestamps.last()?;
    if t >= last {
        return army.path.last().copied();
    }
    None
}

/// Heading of the active path segment in degrees clockwise from north;
/// 0 when the army is not moving along a segment.
pub fn army_heading(army: &ArmyPath, t: f64) -> f64 {
    match active_segment(army, t) {
        Some(i) => {
            let [lng1, lat1] = army.path[i];
            let [lng2, lat2] = army.path[i + 1];
            (lng2 - lng1).atan2(lat2 - lat1).to_degrees()
        }
        None => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Cavalry,
    Infantry,
    Siege,
}

/// Dominant unit kind of an army's composition. Ties fall back to cavalry.
pub fn dominant_unit(army: &ArmyPath) -> UnitKind {
    let c = &army.composition;
    if c.cavalry > c.infantry && c.cavalry > c.siege {
        UnitKind::Cavalry
    } else if c.infantry > c.cavalry && c.infantry > c.siege {
        UnitKind::Infantry
    } else if c.siege > 0 && f64::from(c.siege) > f64::from(c.cavalry) * 0.5 {
        UnitKind::Siege
    } else {
        UnitKind::Cavalry
    }
}

/// Marker scale for an army: 1x up to 50k troops, capped at 4x.
pub fn army_scale(troops: u32) -> f64 {
    (f64::from(troops) / 50_000.0).clamp(1.0, 4.0)
}

/// Parse `#rrggbb` (leading `#` optional). Anything else renders white.
pub fn parse_hex_color(hex: &str) -> [u8; 3] {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return [255, 255, 255];
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
    match (channel(0), channel(2), channel(4)) {
        (Ok(r), Ok(g), Ok(b)) => [r, g, b],
        _ => [255, 255, 255],
    }
}

/// Icon size for a city at `t`: the first event at or before `t` whose status
/// matches the city's current status, else the default.
pub fn city_icon_size(events: &[CityEvent], status: CityStatus, t: f64) -> f64 {
    events
        .iter()
        .find(|e| e.timestamp <= t && e.status == status)
        .and_then(|e| e.icon_size)
        .unwrap_or(DEFAULT_ICON_SIZE)
}
