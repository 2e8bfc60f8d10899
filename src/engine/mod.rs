//! Engine — the playback state machine.
//!
//! Owns a normalized cursor in `[0, 100]` and the loaded sequence, and turns
//! every cursor change into a fresh `DerivedState` (year, city statuses,
//! territory frame, narration, camera pose).
//!
//! The engine never blocks and never talks to a terminal. Time advances only
//! through `tick`, which a `scheduler::PlaybackLoop` or an interactive player
//! calls once per frame.

pub mod projection;
pub mod scheduler;

use tracing::{debug, info, warn};

use crate::types::{AnimationSequence, DerivedState, NarrationSegment, Snapshot};

/// Cursor advance per tick at speed 1.
pub const DEFAULT_STEP_PER_TICK: f64 = 0.5;

/// Result of advancing playback by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The cursor moved; schedule another tick.
    Advanced,
    /// The cursor reached the end and playback stopped.
    Finished,
    /// Nothing to do: paused, or no sequence loaded. Stop scheduling.
    Idle,
}

impl Tick {
    pub fn should_continue(self) -> bool {
        matches!(self, Tick::Advanced)
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    cursor: f64,
    playing: bool,
    speed: f64,
    step_per_tick: f64,
    sequence: Option<AnimationSequence>,
    derived: DerivedState,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine {
    pub fn new() -> Self {
        Self::with_step(DEFAULT_STEP_PER_TICK)
    }

    /// Create an engine whose cursor moves `step_per_tick` per tick at speed 1.
    pub fn with_step(step_per_tick: f64) -> Self {
        Self {
            cursor: 0.0,
            playing: false,
            speed: 1.0,
            step_per_tick,
            sequence: None,
            derived: DerivedState::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Sequence lifecycle
    // -----------------------------------------------------------------------

    /// Replace the loaded sequence and reset to cursor 0, paused.
    ///
    /// Loading while playing is an implicit stop. Timestamp arrays must be
    /// sorted ascending; this is not enforced, but debug builds log every
    /// violation.
    pub fn load(&mut self, sequence: AnimationSequence) {
        if cfg!(debug_assertions) {
            for violation in sequence.ordering_violations() {
                warn!("sequence ordering: {violation}");
            }
        }
        info!(
            start = sequence.time_range.start,
            end = sequence.time_range.end,
            armies = sequence.armies.len(),
            cities = sequence.cities.len(),
            keyframes = sequence.camera_keyframes.len(),
            "loaded sequence"
        );

        self.sequence = Some(sequence);
        self.playing = false;
        self.seek_to(0.0);
    }

    /// Drop the sequence and reset every derived field. Idempotent.
    pub fn unload(&mut self) {
        if self.sequence.take().is_some() {
            info!("unloaded sequence");
        }
        self.cursor = 0.0;
        self.playing = false;
        self.derived = DerivedState::default();
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// Start playback. The caller's frame loop drives it through `tick`.
    pub fn play(&mut self) {
        debug!(cursor = self.cursor, "play");
        self.playing = true;
    }

    /// Stop advancing. Takes effect on the next `tick`.
    pub fn pause(&mut self) {
        debug!(cursor = self.cursor, "pause");
        self.playing = false;
    }

    /// Pause and rewind to the start.
    pub fn stop(&mut self) {
        debug!("stop");
        self.playing = false;
        self.cursor = 0.0;
        self.seek_to(0.0);
    }

    /// Set the speed multiplier applied to each tick's step. Not validated.
    pub fn set_speed(&mut self, speed: f64) {
        debug!(speed, "set speed");
        self.speed = speed;
    }

    /// Move the cursor to `t`, clamped into `[0, 100]`.
    ///
    /// With a sequence loaded, all derived state is recomputed and replaced
    /// in one assignment. Without one, only the cursor is stored. Seeking does
    /// not change the playing flag.
    pub fn seek_to(&mut self, t: f64) {
        let t = projection::clamp_cursor(t);
        self.cursor = t;

        let Some(sequence) = &self.sequence else {
            return;
        };

        let range = sequence.time_range;
        self.derived = DerivedState {
            current_year: projection::interpolate_year(t, range.start, range.end),
            city_states: projection::city_states(sequence, t),
            territory: projection::territory_frame(sequence, t),
            narration: projection::narration_at(sequence, t),
            target_view: projection::target_view_state(sequence, t),
        };
    }

    /// Seek relative to the current cursor.
    pub fn skip_by(&mut self, delta: f64) {
        self.seek_to(self.cursor + delta);
    }

    /// Seek to the cursor corresponding to a calendar year. No-op without a
    /// sequence; a zero-length time range seeks to 0.
    pub fn skip_to_year(&mut self, year: f64) {
        let Some(sequence) = &self.sequence else {
            return;
        };
        let range = sequence.time_range;
        let t = projection::year_to_timestamp(year, range.start, range.end).unwrap_or(0.0);
        self.seek_to(t);
    }

    /// Advance playback by one frame.
    ///
    /// Reaching or passing 100 pins the cursor at exactly 100 and stops.
    /// A tick with no sequence loaded clears the playing flag.
    pub fn tick(&mut self) -> Tick {
        if !self.playing {
            return Tick::Idle;
        }
        if self.sequence.is_none() {
            self.playing = false;
            return Tick::Idle;
        }

        let next = self.cursor + self.speed * self.step_per_tick;
        if next >= projection::CURSOR_MAX {
            self.playing = false;
            self.seek_to(projection::CURSOR_MAX);
            debug!("playback finished");
            return Tick::Finished;
        }

        self.seek_to(next);
        Tick::Advanced
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            cursor: self.cursor,
            playing: self.playing,
            speed: self.speed,
            sequence: self.sequence.as_ref(),
            visible_armies: self
                .sequence
                .as_ref()
                .map(|s| s.armies.as_slice())
                .unwrap_or_default(),
            derived: &self.derived,
        }
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn current_year(&self) -> i32 {
        self.derived.current_year
    }

    pub fn sequence(&self) -> Option<&AnimationSequence> {
        self.sequence.as_ref()
    }

    pub fn derived(&self) -> &DerivedState {
        &self.derived
    }

    /// Narration active at an arbitrary cursor, without moving the engine.
    pub fn narration_at(&self, t: f64) -> Option<NarrationSegment> {
        let sequence = self.sequence.as_ref()?;
        projection::narration_at(sequence, t)
    }
}
