//! Tracks and per-track gain maps
//!
//! A song is split into a fixed set of stems. `TrackGains` keeps one linear
//! gain per active stem, iterated in canonical track order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StemmixError};

/// One independently mixable stem of the song
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Vocal,
    Guitar,
    Piano,
    Other,
    Bass,
    Drum,
}

impl Track {
    /// Every track, in canonical order
    pub const ALL: [Track; 6] = [
        Track::Vocal,
        Track::Guitar,
        Track::Piano,
        Track::Other,
        Track::Bass,
        Track::Drum,
    ];

    /// Lowercase name, also used as the stem file stem (`vocal.wav`)
    pub fn name(self) -> &'static str {
        match self {
            Track::Vocal => "vocal",
            Track::Guitar => "guitar",
            Track::Piano => "piano",
            Track::Other => "other",
            Track::Bass => "bass",
            Track::Drum => "drum",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Track {
    type Err = StemmixError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        Track::ALL
            .into_iter()
            .find(|track| track.name() == lowered)
            .ok_or(StemmixError::UnknownTrack {
                name: s.to_string(),
            })
    }
}

/// Linear gain per track
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackGains {
    gains: BTreeMap<Track, f64>,
}

impl TrackGains {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map holding `gain` for every listed track
    pub fn uniform(tracks: &[Track], gain: f64) -> Self {
        Self {
            gains: tracks.iter().map(|&track| (track, gain)).collect(),
        }
    }

    /// Gain for `track`, if the track is part of this map
    pub fn get(&self, track: Track) -> Option<f64> {
        self.gains.get(&track).copied()
    }

    /// Insert or replace the gain for `track`
    pub fn insert(&mut self, track: Track, gain: f64) {
        self.gains.insert(track, gain);
    }

    pub fn contains(&self, track: Track) -> bool {
        self.gains.contains_key(&track)
    }

    pub fn len(&self) -> usize {
        self.gains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gains.is_empty()
    }

    /// Tracks held by this map, in canonical order
    pub fn tracks(&self) -> impl Iterator<Item = Track> + '_ {
        self.gains.keys().copied()
    }

    /// `(track, gain)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Track, f64)> + '_ {
        self.gains.iter().map(|(&track, &gain)| (track, gain))
    }
}

impl FromIterator<(Track, f64)> for TrackGains {
    fn from_iter<I: IntoIterator<Item = (Track, f64)>>(iter: I) -> Self {
        Self {
            gains: iter.into_iter().collect(),
        }
    }
}

/// Parse a `track=gain` assignment as typed on the command line
pub fn parse_track_gain(s: &str) -> Result<(Track, f64)> {
    let (name, value) = s.split_once('=').ok_or_else(|| StemmixError::InvalidInput {
        input: s.to_string(),
        reason: "expected <track>=<gain>".to_string(),
    })?;
    let track: Track = name.parse()?;
    let gain: f64 = value
        .trim()
        .parse()
        .map_err(|_| StemmixError::InvalidInput {
            input: s.to_string(),
            reason: format!("'{}' is not a gain for {}", value.trim(), track),
        })?;
    Ok((track, gain))
}
