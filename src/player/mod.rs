//! Player — the interactive terminal front end.
//!
//! Owns a `PlaybackEngine`, ticks it at the configured frame interval while
//! playing, and redraws the renderer's lines after every change. Keyboard
//! input maps onto the engine's transport operations only; the player never
//! touches derived state.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{cursor, event, execute, queue, style, terminal};
use tracing::debug;

use crate::config::{matches_binding, PlayerConfig};
use crate::engine::{PlaybackEngine, Tick};
use crate::renderer::{Line, Renderer, Span, Style};
use crate::types::AnimationSequence;

/// Rows reserved above the snapshot for the menu bar.
const CANVAS_OFFSET: u16 = 2;

/// What a key press asks the player to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    TogglePlay,
    Stop,
    Skip(f64),
    SetSpeed(f64),
    Quit,
}

pub struct Player {
    engine: PlaybackEngine,
    config: PlayerConfig,
}

impl Player {
    pub fn new(sequence: AnimationSequence, config: PlayerConfig) -> Self {
        let mut engine = PlaybackEngine::with_step(config.step_per_tick);
        engine.load(sequence);
        Self { engine, config }
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    /// Play the sequence in the terminal.
    ///
    /// Sets up the terminal, enters the event loop, and restores the terminal
    /// on exit (even on error).
    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout);

        // Always restore terminal state.
        let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();

        result
    }

    /// Translate a key into a command using the configured bindings.
    pub fn command_for(&self, key: &event::KeyEvent) -> Option<Command> {
        let keys = &self.config.key_bindings;
        let speed = self.engine.speed();

        if matches_binding(&keys.quit, key) || key.code == event::KeyCode::Esc {
            Some(Command::Quit)
        } else if matches_binding(&keys.play_pause, key) {
            Some(Command::TogglePlay)
        } else if matches_binding(&keys.stop, key) {
            Some(Command::Stop)
        } else if matches_binding(&keys.skip_back, key) {
            Some(Command::Skip(-self.config.skip_step))
        } else if matches_binding(&keys.skip_forward, key) {
            Some(Command::Skip(self.config.skip_step))
        } else if matches_binding(&keys.speed_up, key) {
            Some(Command::SetSpeed(self.config.faster(speed)))
        } else if matches_binding(&keys.speed_down, key) {
            Some(Command::SetSpeed(self.config.slower(speed)))
        } else {
            None
        }
    }

    /// Apply a command to the engine. Returns `false` when the player should exit.
    ///
    /// Scrubbing with the skip keys pauses playback first.
    pub fn apply(&mut self, command: Command) -> bool {
        debug!(?command, "player command");
        match command {
            Command::TogglePlay => {
                if self.engine.is_playing() {
                    self.engine.pause();
                } else {
                    self.engine.play();
                }
            }
            Command::Stop => self.engine.stop(),
            Command::Skip(delta) => {
                self.engine.pause();
                self.engine.skip_by(delta);
            }
            Command::SetSpeed(speed) => self.engine.set_speed(speed),
            Command::Quit => return false,
        }
        true
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        let interval = self.config.tick_interval();
        let mut next_tick = Instant::now() + interval;
        self.redraw(stdout)?;

        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                match event::read()? {
                    event::Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                        if let Some(command) = self.command_for(&key) {
                            if !self.apply(command) {
                                break;
                            }
                            self.redraw(stdout)?;
                        }
                    }
                    event::Event::Resize(_, _) => self.redraw(stdout)?,
                    _ => {}
                }
            }

            // Input never postpones a due frame.
            if let Some(Tick::Advanced | Tick::Finished) =
                self.tick_if_due(Instant::now(), &mut next_tick, interval)
            {
                self.redraw(stdout)?;
            }
        }

        Ok(())
    }

    /// Tick the engine once `now` reaches `next_tick`, then schedule the next frame.
    fn tick_if_due(
        &mut self,
        now: Instant,
        next_tick: &mut Instant,
        interval: Duration,
    ) -> Option<Tick> {
        if now < *next_tick {
            return None;
        }
        *next_tick = now + interval;
        let tick = self.engine.tick();
        if tick == Tick::Idle {
            // Nothing moves while paused; poll less eagerly.
            *next_tick += Duration::from_millis(50);
        }
        Some(tick)
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn menu_items(&self) -> Vec<String> {
        let keys = &self.config.key_bindings;
        vec![
            format!("[{}] play/pause", keys.play_pause),
            format!("[{}] stop", keys.stop),
            format!("[{}][{}] skip", keys.skip_back, keys.skip_forward),
            format!("[{}][{}] speed", keys.speed_down, keys.speed_up),
            format!("[{}] quit", keys.quit),
        ]
    }

    fn redraw(&self, stdout: &mut io::Stdout) -> Result<()> {
        let (term_w, term_h) = terminal::size()?;

        queue!(stdout, terminal::Clear(terminal::ClearType::All))?;

        let mut menu: Line = vec![Span {
            text: " ".into(),
            style: Style::default(),
        }];
        for (i, item) in self.menu_items().iter().enumerate() {
            if i > 0 {
                menu.push(Span {
                    text: "  ".into(),
                    style: Style::default(),
                });
            }
            menu.extend(menu_item_spans(item));
        }
        print_line(stdout, 0, &menu)?;

        let lines = Renderer::render(&self.engine.snapshot(), term_w);
        for (i, line) in lines.iter().enumerate() {
            let y = i as u16 + CANVAS_OFFSET;
            if y >= term_h {
                break;
            }
            print_line(stdout, y, line)?;
        }

        stdout.flush()?;
        Ok(())
    }
}

/// Split a menu item so text inside `[...]` is bold and the rest dim.
pub fn menu_item_spans(item: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = item;
    let dim = Style {
        dim: true,
        ..Default::default()
    };
    let bold = Style {
        bold: true,
        ..Default::default()
    };

    while !rest.is_empty() {
        let Some(open) = rest.find('[') else {
            spans.push(Span {
                text: rest.to_string(),
                style: dim,
            });
            break;
        };
        if open > 0 {
            spans.push(Span {
                text: rest[..open].to_string(),
                style: dim,
            });
        }
        rest = &rest[open..];
        match rest.find(']') {
            Some(close) => {
                spans.push(Span {
                    text: rest[..=close].to_string(),
                    style: bold,
                });
                rest = &rest[close + 1..];
            }
            None => {
                spans.push(Span {
                    text: rest.to_string(),
                    style: Style::default(),
                });
                break;
            }
        }
    }
    spans
}

fn print_line(stdout: &mut io::Stdout, y: u16, line: &Line) -> Result<()> {
    queue!(stdout, cursor::MoveTo(0, y))?;
    for span in line {
        queue!(
            stdout,
            style::PrintStyledContent(style::StyledContent::new(
                to_content_style(&span.style),
                span.text.as_str(),
            ))
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some([r, g, b]) = s.fg {
        cs.foreground_color = Some(style::Color::Rgb { r, g, b });
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}
