//! Load animation sequences from JSON files or HTTP(S) URLs.
//!
//! Loading is separate from the engine: a sequence is fully parsed before
//! anything is handed to `PlaybackEngine::load`, so a failed load leaves the
//! engine exactly as it was.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::types::AnimationSequence;

const USER_AGENT: &str = concat!("history-playback/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when loading a sequence
#[derive(Debug, Error)]
pub enum LoadError {
    /// File I/O error
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON did not match the sequence schema
    #[error("failed to parse sequence: {0}")]
    Parse(#[from] serde_json::Error),
    /// Transport-level HTTP failure
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Server answered with a non-success status
    #[error("failed to load sequence from {url}: HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Whether `location` should be fetched over HTTP rather than read from disk.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Parse a sequence from a JSON string.
pub fn from_json(json: &str) -> Result<AnimationSequence, LoadError> {
    let sequence: AnimationSequence = serde_json::from_str(json)?;
    debug!(
        cities = sequence.cities.len(),
        narration = sequence.narration.len(),
        "parsed sequence"
    );
    Ok(sequence)
}

/// Load a sequence from a JSON file on disk.
pub fn from_file(path: &Path) -> Result<AnimationSequence, LoadError> {
    let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let sequence = from_json(&json)?;
    info!(path = %path.display(), "read sequence file");
    Ok(sequence)
}

/// Fetch a sequence from a URL. Any non-2xx status is a `LoadError::Status`.
pub fn from_url(url: &str) -> Result<AnimationSequence, LoadError> {
    let http = |source: reqwest::Error| LoadError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(http)?;
    let response = client.get(url).send().map_err(http)?;

    if !response.status().is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let body = response.text().map_err(http)?;
    let sequence = from_json(&body)?;
    info!(url, "fetched sequence");
    Ok(sequence)
}

/// Load from either a file path or an `http(s)://` URL.
pub fn load(location: &str) -> Result<AnimationSequence, LoadError> {
    if is_remote(location) {
        from_url(location)
    } else {
        from_file(Path::new(location))
    }
}
