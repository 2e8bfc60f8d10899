//! Playback engine for curated historical animation sequences.
//!
//! A sequence (armies, cities, territories, camera keyframes, narration) is
//! loaded from JSON, and a `PlaybackEngine` turns a cursor in `[0, 100]` into
//! a consistent snapshot for renderers to draw.

pub mod config;
pub mod engine;
pub mod loader;
pub mod logging;
pub mod player;
pub mod renderer;
pub mod types;
