//! Shared boundary types for the history playback system.
//!
//! This module defines the two key data contracts:
//! - Loader → Engine (file): `AnimationSequence`, the authored timeline
//! - Engine → Renderer (in-memory): `Snapshot`, the derived state for one cursor
//!
//! Every timestamp in a sequence is a normalized cursor value in `[0, 100]`.
//! Per-entity timestamp arrays must be sorted ascending. The engine relies on
//! that ordering and never re-sorts; see `AnimationSequence::ordering_violations`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Geographic point as `[longitude, latitude]`.
pub type LngLat = [f64; 2];

/// RGBA colour as authored in territory frames.
pub type Rgba = [u8; 4];

// ---------------------------------------------------------------------------
// Authored sequence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSequence {
    pub time_range: TimeRange,
    #[serde(default)]
    pub armies: Vec<ArmyPath>,
    #[serde(default)]
    pub cities: Vec<AnimatedCity>,
    #[serde(default)]
    pub territories: Vec<AnimatedTerritory>,
    #[serde(default)]
    pub camera_keyframes: Vec<CameraKeyframe>,
    #[serde(default)]
    pub narration: Vec<NarrationSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: i32,
    pub end: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmyPath {
    pub id: String,
    pub name: String,
    pub path: Vec<LngLat>,
    /// One entry per point in `path`, non-decreasing.
    pub timestamps: Vec<f64>,
    #[serde(default)]
    pub composition: TroopComposition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub troop_count: Option<u32>,
    pub style: PathStyle,
}

impl ArmyPath {
    /// Declared troop count, or the sum of the composition when absent.
    pub fn total_troops(&self) -> u32 {
        self.troop_count.unwrap_or_else(|| {
            self.composition
                .cavalry
                .saturating_add(self.composition.infantry)
                .saturating_add(self.composition.siege)
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TroopComposition {
    #[serde(default)]
    pub cavalry: u32,
    #[serde(default)]
    pub infantry: u32,
    #[serde(default)]
    pub siege: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    /// `#rrggbb`
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedCity {
    pub id: String,
    pub name: String,
    pub location: LngLat,
    #[serde(default)]
    pub events: Vec<CityEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityEvent {
    pub timestamp: f64,
    #[serde(alias = "state")]
    pub status: CityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityStatus {
    #[default]
    Neutral,
    UnderSiege,
    Conquered,
    Allied,
    MongolCapital,
}

impl CityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CityStatus::Neutral => "neutral",
            CityStatus::UnderSiege => "under_siege",
            CityStatus::Conquered => "conquered",
            CityStatus::Allied => "allied",
            CityStatus::MongolCapital => "mongol_capital",
        }
    }

    /// Marker colour used by map renderers.
    pub fn color(self) -> Rgba {
        match self {
            CityStatus::Neutral => [200, 200, 200, 255],
            CityStatus::UnderSiege => [255, 68, 68, 255],
            CityStatus::Conquered => [210, 105, 30, 255],
            CityStatus::Allied => [65, 105, 225, 255],
            CityStatus::MongolCapital => [255, 215, 0, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedTerritory {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frames: Vec<TerritoryFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryFrame {
    pub timestamp: f64,
    pub geometry: Geometry,
    pub fill_color: Rgba,
    pub line_color: Rgba,
}

/// GeoJSON-style polygon geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<LngLat>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<LngLat>>> },
}

impl Geometry {
    /// Number of outer rings (1 for a polygon).
    pub fn ring_count(&self) -> usize {
        match self {
            Geometry::Polygon { coordinates } => usize::from(!coordinates.is_empty()),
            Geometry::MultiPolygon { coordinates } => coordinates.len(),
        }
    }

    /// Total number of vertices across every ring.
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Polygon { coordinates } => coordinates.iter().map(Vec::len).sum(),
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flat_map(|poly| poly.iter())
                .map(Vec::len)
                .sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraKeyframe {
    pub timestamp: f64,
    pub view_state: ViewState,
    /// Transition length in milliseconds.
    #[serde(default)]
    pub transition_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Camera pose over the globe. Pitch and bearing default to 0 when omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationSegment {
    pub timestamp: f64,
    pub speaker: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citation_urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// Engine → Renderer boundary (in-memory, serialized only for inspection)
// ---------------------------------------------------------------------------

/// Everything computed from `(sequence, cursor)`. Replaced as a whole on
/// every seek so readers never see a mix of two cursors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedState {
    pub current_year: i32,
    pub city_states: BTreeMap<String, CityStatus>,
    pub territory: Option<TerritoryFrame>,
    pub narration: Option<NarrationSegment>,
    pub target_view: Option<ViewState>,
}

/// Read-only view of the engine handed to rendering consumers.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<'a> {
    pub cursor: f64,
    pub playing: bool,
    pub speed: f64,
    #[serde(skip)]
    pub sequence: Option<&'a AnimationSequence>,
    pub visible_armies: &'a [ArmyPath],
    #[serde(flatten)]
    pub derived: &'a DerivedState,
}

// ---------------------------------------------------------------------------
// Authoring checks
// ---------------------------------------------------------------------------

/// A place where authored data breaks the sorted-timestamps precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingViolation {
    Unsorted { what: String, index: usize },
    LengthMismatch { army: String, points: usize, timestamps: usize },
}

impl std::fmt::Display for OrderingViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderingViolation::Unsorted { what, index } => {
                write!(f, "{what}: timestamp at index {index} is earlier than its predecessor")
            }
            OrderingViolation::LengthMismatch {
                army,
                points,
                timestamps,
            } => write!(
                f,
                "army '{army}': {points} path points but {timestamps} timestamps"
            ),
        }
    }
}

fn first_unsorted(timestamps: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut prev = f64::NEG_INFINITY;
    for (i, ts) in timestamps.into_iter().enumerate() {
        if ts < prev {
            return Some(i);
        }
        prev = ts;
    }
    None
}

impl AnimationSequence {
    /// Report every array that violates the ordering contract.
    ///
    /// Only the first out-of-order index per array is reported.
    pub fn ordering_violations(&self) -> Vec<OrderingViolation> {
        let mut out = Vec::new();
        let mut check = |what: String, ts: Vec<f64>| {
            if let Some(index) = first_unsorted(ts) {
                out.push(OrderingViolation::Unsorted { what, index });
            }
        };

        for army in &self.armies {
            check(format!("army '{}'", army.id), army.timestamps.clone());
        }
        for city in &self.cities {
            check(
                format!("city '{}' events", city.id),
                city.events.iter().map(|e| e.timestamp).collect(),
            );
        }
        for territory in &self.territories {
            check(
                format!("territory '{}' frames", territory.id),
                territory.frames.iter().map(|f| f.timestamp).collect(),
            );
        }
        check(
            "camera keyframes".to_string(),
            self.camera_keyframes.iter().map(|k| k.timestamp).collect(),
        );
        check(
            "narration".to_string(),
            self.narration.iter().map(|n| n.timestamp).collect(),
        );

        for army in &self.armies {
            if army.path.len() != army.timestamps.len() {
                out.push(OrderingViolation::LengthMismatch {
                    army: army.id.clone(),
                    points: army.path.len(),
                    timestamps: army.timestamps.len(),
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "timeRange": { "start": 1219, "end": 1221, "durationMonths": 24 },
        "armies": [{
            "id": "jebe", "name": "Jebe",
            "path": [[60.0, 40.0], [62.0, 41.0]],
            "timestamps": [0, 50],
            "composition": { "cavalry": 20000, "infantry": 0, "siege": 0 },
            "style": { "color": "#d2691e", "width": 4 }
        }],
        "cities": [{
            "id": "otrar", "name": "Otrar", "location": [68.3, 42.8],
            "events": [{ "timestamp": 10, "state": "under_siege", "iconSize": 30 }]
        }],
        "territories": [{
            "id": "khwarazm",
            "frames": [{
                "timestamp": 0,
                "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] },
                "fillColor": [210, 105, 30, 80],
                "lineColor": [210, 105, 30, 255]
            }]
        }],
        "cameraKeyframes": [{
            "timestamp": 0,
            "viewState": { "longitude": 65, "latitude": 40, "zoom": 3 },
            "transitionDuration": 2000
        }],
        "narration": [{ "timestamp": 0, "speaker": "narrator", "text": "1219." }]
    }"##;

    #[test]
    fn parses_camel_case_sequence() {
        let seq: AnimationSequence = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(seq.time_range.duration_months, Some(24));
        assert_eq!(seq.armies[0].total_troops(), 20000);
        assert_eq!(seq.cities[0].events[0].status, CityStatus::UnderSiege);
        assert_eq!(seq.cities[0].events[0].icon_size, Some(30.0));
        assert_eq!(seq.territories[0].frames[0].geometry.vertex_count(), 4);
        assert_eq!(seq.camera_keyframes[0].view_state.pitch, 0.0);
        assert!(seq.narration[0].citation_urls.is_empty());
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let seq: AnimationSequence =
            serde_json::from_str(r#"{ "timeRange": { "start": 1, "end": 2 } }"#).unwrap();
        assert!(seq.armies.is_empty());
        assert!(seq.camera_keyframes.is_empty());
        assert!(seq.ordering_violations().is_empty());
    }

    #[test]
    fn explicit_troop_count_wins_over_composition() {
        let mut seq: AnimationSequence = serde_json::from_str(SAMPLE).unwrap();
        seq.armies[0].troop_count = Some(5);
        assert_eq!(seq.armies[0].total_troops(), 5);
    }

    #[test]
    fn ordering_violations_report_unsorted_and_mismatched_arrays() {
        let mut seq: AnimationSequence = serde_json::from_str(SAMPLE).unwrap();
        seq.armies[0].timestamps = vec![50.0, 10.0, 60.0];
        seq.narration.push(NarrationSegment {
            timestamp: -1.0,
            speaker: "narrator".into(),
            text: "late".into(),
            citation_urls: Vec::new(),
        });

        let violations = seq.ordering_violations();
        assert_eq!(
            violations,
            vec![
                OrderingViolation::Unsorted {
                    what: "army 'jebe'".into(),
                    index: 1
                },
                OrderingViolation::Unsorted {
                    what: "narration".into(),
                    index: 1
                },
                OrderingViolation::LengthMismatch {
                    army: "jebe".into(),
                    points: 2,
                    timestamps: 3
                },
            ]
        );
    }

    #[test]
    fn city_status_round_trips_as_snake_case() {
        let json = serde_json::to_string(&CityStatus::MongolCapital).unwrap();
        assert_eq!(json, "\"mongol_capital\"");
        assert_eq!(CityStatus::MongolCapital.as_str(), "mongol_capital");
    }
}
