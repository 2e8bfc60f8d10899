//! Renderer — the snapshot formatter.
//!
//! Takes a `Snapshot` (in-memory, from the engine) and produces styled text
//! lines for the player. Its only input is the snapshot, so it has no
//! playback logic of its own.
//!
//! The renderer is pure and stateless. Given the same snapshot and width, it
//! always produces the same lines.

use crate::engine::projection::{
    army_heading, army_position, army_scale, city_icon_size, dominant_unit, parse_hex_color,
    UnitKind,
};
use crate::types::{Rgba, Snapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<[u8; 3]>,
    pub bold: bool,
    pub dim: bool,
}

impl Style {
    fn fg(rgb: [u8; 3]) -> Self {
        Style {
            fg: Some(rgb),
            ..Default::default()
        }
    }

    fn bold() -> Self {
        Style {
            bold: true,
            ..Default::default()
        }
    }

    fn dim() -> Self {
        Style {
            dim: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Span {
            text: text.into(),
            style,
        }
    }

    fn plain(text: impl Into<String>) -> Self {
        Span::new(text, Style::default())
    }
}

pub type Line = Vec<Span>;

/// Plain text of a line, for tests and non-terminal output.
pub fn line_text(line: &Line) -> String {
    line.iter().map(|s| s.text.as_str()).collect()
}

fn rgb(c: Rgba) -> [u8; 3] {
    [c[0], c[1], c[2]]
}

pub struct Renderer;

impl Renderer {
    /// Format a snapshot into lines no wider than `width` columns
    /// (the scrubber and narration adapt; labels may be truncated by the
    /// terminal).
    pub fn render(snapshot: &Snapshot<'_>, width: u16) -> Vec<Line> {
        let Some(sequence) = snapshot.sequence else {
            return vec![vec![Span::new(
                "No animation sequence loaded",
                Style::dim(),
            )]];
        };

        let width = usize::from(width.max(20));
        let derived = snapshot.derived;
        let range = sequence.time_range;
        let mut lines: Vec<Line> = Vec::new();

        // Header
        let mut header = vec![
            Span::plain(format!(" {} ", range.start)),
            Span::new(format!("Year: {}", derived.current_year), Style::bold()),
            Span::plain(format!(" {}", range.end)),
        ];
        if let Some(months) = range.duration_months {
            header.push(Span::new(
                format!("   {months} months compressed"),
                Style::dim(),
            ));
        }
        lines.push(header);

        // Scrubber
        lines.push(Self::scrubber(snapshot.cursor, width));
        let transport = if snapshot.playing { "playing" } else { "paused" };
        lines.push(vec![Span::new(
            format!(" {:.1}%  {transport}  {}x", snapshot.cursor, snapshot.speed),
            Style::dim(),
        )]);
        lines.push(Vec::new());

        // Camera
        let camera = match &derived.target_view {
            Some(v) => format!(
                "lng {:.2}  lat {:.2}  zoom {:.1}  pitch {:.0}  bearing {:.0}",
                v.longitude, v.latitude, v.zoom, v.pitch, v.bearing
            ),
            None => "-".to_string(),
        };
        lines.push(vec![Span::new(" Camera     ", Style::bold()), Span::plain(camera)]);

        // Territory
        let mut territory = vec![Span::new(" Territory  ", Style::bold())];
        match (&derived.territory, sequence.territories.first()) {
            (Some(frame), Some(region)) => {
                territory.push(Span::new("■ ", Style::fg(rgb(frame.fill_color))));
                territory.push(Span::new(
                    if region.name.is_empty() {
                        region.id.clone()
                    } else {
                        region.name.clone()
                    },
                    Style::fg(rgb(frame.line_color)),
                ));
                territory.push(Span::new(
                    format!(
                        "  {} ring(s), {} vertices",
                        frame.geometry.ring_count(),
                        frame.geometry.vertex_count()
                    ),
                    Style::dim(),
                ));
            }
            _ => territory.push(Span::plain("-")),
        }
        lines.push(territory);

        // Cities
        if !sequence.cities.is_empty() {
            lines.push(Vec::new());
            lines.push(vec![Span::new(" Cities", Style::bold())]);
        }
        for city in &sequence.cities {
            let status = derived
                .city_states
                .get(&city.id)
                .copied()
                .unwrap_or_default();
            let size = city_icon_size(&city.events, status, snapshot.cursor);
            lines.push(vec![
                Span::new("   ● ", Style::fg(rgb(status.color()))),
                Span::plain(format!("{:<16}", city.name)),
                Span::new(format!("{:<15}", status.as_str()), Style::fg(rgb(status.color()))),
                Span::new(format!("size {size:.0}"), Style::dim()),
            ]);
        }

        // Armies
        if !snapshot.visible_armies.is_empty() {
            lines.push(Vec::new());
            lines.push(vec![Span::new(" Armies", Style::bold())]);
        }
        for army in snapshot.visible_armies {
            let color = parse_hex_color(&army.style.color);
            let unit = match dominant_unit(army) {
                UnitKind::Cavalry => "cavalry",
                UnitKind::Infantry => "infantry",
                UnitKind::Siege => "siege",
            };
            let whereabouts = match army_position(army, snapshot.cursor) {
                Some([lng, lat]) => format!(
                    "at {lng:.2},{lat:.2}  heading {:.0}°",
                    army_heading(army, snapshot.cursor)
                ),
                None => "not yet on the march".to_string(),
            };
            lines.push(vec![
                Span::new("   ▲ ", Style::fg(color)),
                Span::plain(format!("{:<16}", army.name)),
                Span::plain(format!("{unit:<9}x{:.1}  ", army_scale(army.total_troops()))),
                Span::new(whereabouts, Style::dim()),
            ]);
        }

        // Narration
        if let Some(narration) = &derived.narration {
            lines.push(Vec::new());
            let prefix = format!(" {}: ", narration.speaker);
            let body_width = width.saturating_sub(prefix.chars().count()).max(10);
            for (i, row) in wrap(&narration.text, body_width).into_iter().enumerate() {
                let lead = if i == 0 {
                    Span::new(prefix.clone(), Style::bold())
                } else {
                    Span::plain(" ".repeat(prefix.chars().count()))
                };
                lines.push(vec![lead, Span::plain(row)]);
            }
            for (i, url) in narration.citation_urls.iter().enumerate() {
                lines.push(vec![Span::new(
                    format!("   [Source {}] {url}", i + 1),
                    Style::dim(),
                )]);
            }
        }

        lines
    }

    fn scrubber(cursor: f64, width: usize) -> Line {
        let inner = width.saturating_sub(4);
        let filled = ((cursor / 100.0) * inner as f64).round() as usize;
        let filled = filled.min(inner);
        vec![
            Span::plain(" ["),
            Span::new("=".repeat(filled), Style::fg([210, 105, 30])),
            Span::new("-".repeat(inner - filled), Style::dim()),
            Span::plain("]"),
        ]
    }
}

/// Word-wrap `text` at spaces; words longer than `width` are hard-broken.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut row = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
            rows.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }
        let needed = if row.is_empty() { word.len() } else { row.chars().count() + 1 + word.len() };
        if needed > width {
            rows.push(std::mem::take(&mut row));
        }
        if !row.is_empty() {
            row.push(' ');
        }
        row.extend(word);
    }
    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }
    rows
}
