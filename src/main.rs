use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};

use history_playback::{
    config::PlayerConfig,
    engine::{
        scheduler::{IntervalClock, PlaybackLoop},
        PlaybackEngine, Tick,
    },
    loader,
    logging::{init_logging, LogSink},
    player::Player,
    types::AnimationSequence,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str = "history-playback play <sequence.json|URL> [--log-dir DIR]";
const INSPECT_USAGE: &str = "history-playback inspect <sequence.json|URL> <cursor | --year YEAR>";
const NARRATE_USAGE: &str = "history-playback narrate <sequence.json|URL> [speed]";
const CHECK_USAGE: &str = "history-playback check <sequence.json|URL>";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("play") => {
            let location = args.next().context(PLAY_USAGE)?;
            let log_dir = match args.next().as_deref() {
                Some("--log-dir") => Some(PathBuf::from(args.next().context(PLAY_USAGE)?)),
                Some(other) => bail!("Unexpected argument '{other}'\n\nUsage: {PLAY_USAGE}"),
                None => None,
            };
            match &log_dir {
                Some(dir) => init_logging(LogSink::File(dir))?,
                None => init_logging(LogSink::Off)?,
            }
            play(&location)
        }
        Some("inspect") => {
            init_logging(LogSink::Stderr)?;
            let location = args.next().context(INSPECT_USAGE)?;
            let target = args.next().context(INSPECT_USAGE)?;
            let target = if target == "--year" {
                let year = args.next().context(INSPECT_USAGE)?;
                Seek::Year(year.parse().with_context(|| format!("Invalid year '{year}'"))?)
            } else {
                Seek::Cursor(
                    target
                        .parse()
                        .with_context(|| format!("Invalid cursor '{target}'"))?,
                )
            };
            inspect(&location, target)
        }
        Some("narrate") => {
            init_logging(LogSink::Stderr)?;
            let location = args.next().context(NARRATE_USAGE)?;
            let speed = match args.next() {
                Some(s) => parse_speed(&s)?,
                None => 1.0,
            };
            narrate(&location, speed)
        }
        Some("check") => {
            init_logging(LogSink::Stderr)?;
            let location = args.next().context(CHECK_USAGE)?;
            check(&location)
        }
        _ => bail!(
            "History Playback — timeline player for historical sequences\n\nUsage:\n  {PLAY_USAGE}\n  {INSPECT_USAGE}\n  {NARRATE_USAGE}\n  {CHECK_USAGE}"
        ),
    }
}

/// Parse a playback speed. Only finite positive speeds reach the end.
fn parse_speed(s: &str) -> Result<f64> {
    let speed: f64 = s.parse().with_context(|| format!("Invalid speed '{s}'"))?;
    if !(speed.is_finite() && speed > 0.0) {
        bail!("Invalid speed '{s}'\n\nUsage: {NARRATE_USAGE}");
    }
    Ok(speed)
}

enum Seek {
    Cursor(f64),
    Year(f64),
}

fn load(location: &str) -> Result<AnimationSequence> {
    loader::load(location).with_context(|| format!("Failed to load {location}"))
}

fn play(location: &str) -> Result<()> {
    let sequence = load(location)?;
    let mut player = Player::new(sequence, PlayerConfig::load());
    player.run()
}

fn inspect(location: &str, target: Seek) -> Result<()> {
    let mut engine = PlaybackEngine::new();
    engine.load(load(location)?);
    match target {
        Seek::Cursor(t) => engine.seek_to(t),
        Seek::Year(year) => engine.skip_to_year(year),
    }

    let json = serde_json::to_string_pretty(&engine.snapshot())?;
    println!("{json}");
    Ok(())
}

/// Play headless in real time, printing each year change and narration line.
fn narrate(location: &str, speed: f64) -> Result<()> {
    let config = PlayerConfig::load();
    let mut engine = PlaybackEngine::with_step(config.step_per_tick);
    engine.load(load(location)?);
    engine.set_speed(speed);

    let mut last_year = engine.current_year();
    let mut last_line = engine.derived().narration.clone();
    println!("{last_year}");
    if let Some(line) = &last_line {
        println!("  {}: {}", line.speaker, line.text);
    }

    engine.play();
    let mut playback = PlaybackLoop::new(IntervalClock::new(config.tick_interval()));
    let last = playback.run(&mut engine, None, |engine, _| {
        let derived = engine.derived();
        if derived.current_year != last_year {
            last_year = derived.current_year;
            println!("{last_year}");
        }
        if derived.narration != last_line {
            last_line = derived.narration.clone();
            if let Some(line) = &last_line {
                println!("  {}: {}", line.speaker, line.text);
                for url in &line.citation_urls {
                    println!("    {url}");
                }
            }
        }
    });

    if last != Tick::Finished {
        bail!("Playback stopped before the end of the sequence");
    }
    Ok(())
}

fn check(location: &str) -> Result<()> {
    let sequence = load(location)?;
    let violations = sequence.ordering_violations();
    if violations.is_empty() {
        println!("{location}: ok");
        return Ok(());
    }
    for violation in &violations {
        println!("{location}: {violation}");
    }
    bail!("{} ordering violation(s)", violations.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrate_speed_accepts_positive_values() {
        assert_eq!(parse_speed("2").unwrap(), 2.0);
        assert_eq!(parse_speed("0.25").unwrap(), 0.25);
    }

    #[test]
    fn narrate_speed_rejects_values_that_never_finish() {
        for bad in ["0", "-1", "NaN", "inf", "-0", "fast"] {
            let err = parse_speed(bad).unwrap_err();
            assert!(
                err.to_string().contains("Invalid speed"),
                "{bad} should be rejected"
            );
        }
    }
}
