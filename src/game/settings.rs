//! Player Settings Store
//!
//! Holds the gain the player picked on each fader. Every track starts at
//! unity gain (1.0) regardless of the fader curve in use.
//!
//! The store does not know about modes. Callers must only `set` while the
//! session is in player-setting mode; `Session::on_fader_changed` is the
//! guarded entry point and writing through any other path during comparison
//! mode is a contract violation.

use crate::error::{Result, StemmixError};
use crate::game::track::{Track, TrackGains};

/// Gain every fader starts at
pub const DEFAULT_PLAYER_GAIN: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    gains: TrackGains,
}

impl PlayerSettings {
    /// Unity gain for every track
    pub fn new(tracks: &[Track]) -> Self {
        Self {
            gains: TrackGains::uniform(tracks, DEFAULT_PLAYER_GAIN),
        }
    }

    /// Player gain for `track`, `None` if the track is not in this round
    pub fn get(&self, track: Track) -> Option<f64> {
        self.gains.get(track)
    }

    /// Record a new gain for `track`
    ///
    /// The gain must already be clamped to the fader window by the caller.
    pub fn set(&mut self, track: Track, gain: f64) -> Result<()> {
        if !self.gains.contains(track) {
            return Err(StemmixError::UnknownTrack {
                name: track.to_string(),
            });
        }
        if !(gain.is_finite() && gain > 0.0) {
            return Err(StemmixError::InvalidGain { track, gain });
        }
        self.gains.insert(track, gain);
        Ok(())
    }

    /// Put every track back to unity gain
    pub fn reset(&mut self) {
        let tracks: Vec<Track> = self.gains.tracks().collect();
        self.gains = TrackGains::uniform(&tracks, DEFAULT_PLAYER_GAIN);
    }

    pub fn gains(&self) -> &TrackGains {
        &self.gains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_unity_gain() {
        let settings = PlayerSettings::new(&Track::ALL);
        for track in Track::ALL {
            assert_eq!(settings.get(track), Some(1.0));
        }
    }

    #[test]
    fn test_set_and_reset() {
        let mut settings = PlayerSettings::new(&Track::ALL);
        settings.set(Track::Guitar, 0.5).unwrap();
        assert_eq!(settings.get(Track::Guitar), Some(0.5));

        settings.reset();
        assert_eq!(settings.get(Track::Guitar), Some(1.0));
        assert_eq!(settings.gains().len(), 6);
    }

    #[test]
    fn test_rejects_inactive_track() {
        let mut settings = PlayerSettings::new(&[Track::Vocal]);
        assert!(settings.set(Track::Bass, 1.0).is_err());
        assert_eq!(settings.get(Track::Bass), None);
    }

    #[test]
    fn test_rejects_invalid_gain() {
        let mut settings = PlayerSettings::new(&[Track::Vocal]);
        for gain in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(settings.set(Track::Vocal, gain).is_err());
        }
        assert_eq!(settings.get(Track::Vocal), Some(1.0));
    }
}
