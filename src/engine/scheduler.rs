//! Frame scheduling for playback.
//!
//! `PlaybackLoop` repeatedly waits for the next frame and ticks the engine,
//! stopping as soon as a tick reports anything other than `Tick::Advanced`.
//! The frame source is a `FrameClock` so tests can run the loop without
//! sleeping.

use std::thread;
use std::time::{Duration, Instant};

use super::{PlaybackEngine, Tick};

/// Source of frame boundaries.
pub trait FrameClock {
    /// Block until the next frame is due.
    fn wait_for_frame(&mut self);
}

/// Wall-clock frames at a fixed interval. Frames that overrun are not
/// made up; the next wait simply returns immediately.
pub struct IntervalClock {
    interval: Duration,
    next_due: Option<Instant>,
}

impl IntervalClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameClock for IntervalClock {
    fn wait_for_frame(&mut self) {
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now + self.interval);
        if due > now {
            thread::sleep(due - now);
        }
        self.next_due = Some(due.max(now) + self.interval);
    }
}

/// Clock that never sleeps and counts the frames it handed out.
#[derive(Debug, Default)]
pub struct ManualClock {
    frames: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameClock for ManualClock {
    fn wait_for_frame(&mut self) {
        self.frames += 1;
    }
}

/// Repeating tick task with an explicit stop condition.
pub struct PlaybackLoop<C: FrameClock> {
    clock: C,
}

impl<C: FrameClock> PlaybackLoop<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one scheduling step: wait for a frame, then tick.
    pub fn step(&mut self, engine: &mut PlaybackEngine) -> Tick {
        self.clock.wait_for_frame();
        engine.tick()
    }

    /// Tick until the engine pauses, finishes, or `max_frames` is reached.
    ///
    /// `observe` sees every tick result together with the engine, after the
    /// tick has been applied. Returns the last tick.
    pub fn run(
        &mut self,
        engine: &mut PlaybackEngine,
        max_frames: Option<u64>,
        mut observe: impl FnMut(&mut PlaybackEngine, Tick),
    ) -> Tick {
        let mut frames = 0u64;
        loop {
            if max_frames.is_some_and(|max| frames >= max) {
                return Tick::Advanced;
            }
            let tick = self.step(engine);
            frames += 1;
            observe(engine, tick);
            if !tick.should_continue() {
                return tick;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnimationSequence, TimeRange};

    fn engine() -> PlaybackEngine {
        let mut engine = PlaybackEngine::with_step(10.0);
        engine.load(AnimationSequence {
            time_range: TimeRange {
                start: 0,
                end: 100,
                duration_months: None,
            },
            armies: Vec::new(),
            cities: Vec::new(),
            territories: Vec::new(),
            camera_keyframes: Vec::new(),
            narration: Vec::new(),
        });
        engine
    }

    #[test]
    fn runs_to_completion() {
        let mut engine = engine();
        engine.play();
        let mut pl = PlaybackLoop::new(ManualClock::new());
        let last = pl.run(&mut engine, None, |_, _| {});
        assert_eq!(last, Tick::Finished);
        // 9 advances to 90, then the 10th tick lands on 100.
        assert_eq!(pl.clock().frames(), 10);
        assert_eq!(engine.cursor(), 100.0);
        assert!(!engine.is_playing());
    }

    #[test]
    fn pause_is_observed_on_next_tick() {
        let mut engine = engine();
        engine.play();
        let mut pl = PlaybackLoop::new(ManualClock::new());
        let last = pl.run(&mut engine, None, |engine, _| {
            if engine.cursor() >= 30.0 {
                engine.pause();
            }
        });
        assert_eq!(last, Tick::Idle);
        assert_eq!(engine.cursor(), 30.0);
        assert_eq!(pl.clock().frames(), 4);
    }

    #[test]
    fn unload_stops_the_loop() {
        let mut engine = engine();
        engine.play();
        let mut pl = PlaybackLoop::new(ManualClock::new());
        let last = pl.run(&mut engine, None, |engine, _| engine.unload());
        assert_eq!(last, Tick::Idle);
        assert_eq!(pl.clock().frames(), 2);
    }

    #[test]
    fn frame_limit_bounds_the_run() {
        let mut engine = engine();
        engine.play();
        let mut pl = PlaybackLoop::new(ManualClock::new());
        let last = pl.run(&mut engine, Some(3), |_, _| {});
        assert_eq!(last, Tick::Advanced);
        assert_eq!(engine.cursor(), 30.0);
        assert!(engine.is_playing());
    }

    #[test]
    fn paused_engine_does_not_advance() {
        let mut engine = engine();
        let mut pl = PlaybackLoop::new(ManualClock::new());
        assert_eq!(pl.step(&mut engine), Tick::Idle);
        assert_eq!(engine.cursor(), 0.0);
    }

    #[test]
    fn interval_clock_waits_at_least_one_interval() {
        let mut clock = IntervalClock::new(Duration::from_millis(5));
        let start = Instant::now();
        clock.wait_for_frame();
        clock.wait_for_frame();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
