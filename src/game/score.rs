//! Scorer
//!
//! Distance between the player's gain and the answer (`1 / hidden`) is taken
//! in octaves (`log2`), averaged over the tracks and turned into a 0..=100
//! score: `round(max(0, 100 - distance * multiplier))`.

use log::error;

use crate::config::ScoringConfig;
use crate::error::{Result, StemmixError};
use crate::game::track::{Track, TrackGains};

/// Best possible score
pub const MAX_SCORE: u8 = 100;

/// Gain that cancels a hidden gain and restores the original mix
#[inline]
pub fn answer_gain(hidden: f64) -> f64 {
    1.0 / hidden
}

/// Octave distance between a player gain and the answer for `hidden`
#[inline]
pub fn log_distance(player: f64, hidden: f64) -> f64 {
    (player.log2() - answer_gain(hidden).log2()).abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score player gains against the hidden gains of a round
    ///
    /// Every hidden track must have a player gain. An empty hidden map means
    /// no targets were sampled and yields `NotReady`.
    pub fn score(&self, player: &TrackGains, hidden: &TrackGains) -> Result<u8> {
        if hidden.is_empty() {
            return Err(StemmixError::NotReady { action: "score" });
        }

        let mut total = 0.0;
        for (track, hidden_gain) in hidden.iter() {
            let player_gain = player.get(track).ok_or_else(|| StemmixError::UnknownTrack {
                name: track.to_string(),
            })?;
            check_gain(track, hidden_gain)?;
            check_gain(track, player_gain)?;
            total += log_distance(player_gain, hidden_gain);
        }

        Ok(self.score_distance(total, hidden.len()))
    }

    /// Turn a summed octave distance over `track_count` tracks into a score
    pub fn score_distance(&self, total_distance: f64, track_count: usize) -> u8 {
        let distance = if self.config.normalize_by_track_count && track_count > 0 {
            total_distance / track_count as f64
        } else {
            total_distance
        };
        let raw = (f64::from(MAX_SCORE) - distance * self.config.multiplier).max(0.0);
        raw.round().min(f64::from(MAX_SCORE)) as u8
    }
}

fn check_gain(track: Track, gain: f64) -> Result<()> {
    if gain.is_finite() && gain > 0.0 {
        Ok(())
    } else {
        error!("gain invariant violated for {}: {}", track, gain);
        Err(StemmixError::InvalidGain { track, gain })
    }
}
