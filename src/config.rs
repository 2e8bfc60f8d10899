use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::DEFAULT_STEP_PER_TICK;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Milliseconds between playback ticks.
    pub tick_interval_ms: u64,
    /// Cursor advance per tick at speed 1.
    pub step_per_tick: f64,
    /// Speeds cycled by the speed keys, ascending.
    pub speed_presets: Vec<f64>,
    /// Cursor distance for the skip keys.
    pub skip_step: f64,
    pub key_bindings: KeyBindings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub play_pause: String,
    pub stop: String,
    pub skip_back: String,
    pub skip_forward: String,
    pub speed_down: String,
    pub speed_up: String,
    pub quit: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            play_pause: "Space".into(),
            stop: "Home".into(),
            skip_back: "Left".into(),
            skip_forward: "Right".into(),
            speed_down: "-".into(),
            speed_up: "+".into(),
            quit: "q".into(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            tick_interval_ms: 16,
            step_per_tick: DEFAULT_STEP_PER_TICK,
            speed_presets: vec![0.5, 1.0, 2.0],
            skip_step: 10.0,
            key_bindings: KeyBindings::default(),
        }
    }
}

impl PlayerConfig {
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(json) => Self::from_json(&json),
            Err(_) => Self::default(),
        }
    }

    /// Parse a config, falling back to defaults on invalid JSON.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                warn!("invalid player config ({e}), using defaults");
                Self::default()
            }
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Next preset above `current`, or the fastest preset.
    pub fn faster(&self, current: f64) -> f64 {
        self.speed_presets
            .iter()
            .copied()
            .find(|&s| s > current)
            .or_else(|| self.speed_presets.last().copied())
            .unwrap_or(current)
    }

    /// Next preset below `current`, or the slowest preset.
    pub fn slower(&self, current: f64) -> f64 {
        self.speed_presets
            .iter()
            .rev()
            .copied()
            .find(|&s| s < current)
            .or_else(|| self.speed_presets.first().copied())
            .unwrap_or(current)
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("history-playback");
        path.push("player.json");
        path
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(ch) = binding.strip_prefix("Ctrl-") {
        if !event.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        return match ch.chars().next() {
            Some(c) => event.code == KeyCode::Char(c),
            None => false,
        };
    }

    // Plain bindings never fire with Ctrl or Alt held.
    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }

    match binding {
        "Right" => event.code == KeyCode::Right,
        "Left" => event.code == KeyCode::Left,
        "Up" => event.code == KeyCode::Up,
        "Down" => event.code == KeyCode::Down,
        "Enter" => event.code == KeyCode::Enter,
        "Esc" => event.code == KeyCode::Esc,
        "Space" => event.code == KeyCode::Char(' '),
        "Home" => event.code == KeyCode::Home,
        "End" => event.code == KeyCode::End,
        s => {
            if let Some(rest) = s.strip_prefix('F') {
                if let Ok(n) = rest.parse::<u8>() {
                    return event.code == KeyCode::F(n);
                }
            }
            match s.chars().next() {
                Some(c) => event.code == KeyCode::Char(c),
                None => false,
            }
        }
    }
}
