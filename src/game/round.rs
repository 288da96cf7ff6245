//! Round
//!
//! One round binds a fresh set of hidden gains to a fresh set of player
//! settings. Rounds are replaced wholesale on restart.

use chrono::{DateTime, Utc};
use log::error;
use rand::Rng;
use uuid::Uuid;

use crate::error::{Result, StemmixError};
use crate::game::score::answer_gain;
use crate::game::settings::PlayerSettings;
use crate::game::target::TargetGainGenerator;
use crate::game::track::{Track, TrackGains};

#[derive(Debug, Clone)]
pub struct Round {
    id: Uuid,
    started_at: DateTime<Utc>,
    hidden: TrackGains,
    player: PlayerSettings,
}

impl Round {
    /// Sample hidden gains for `tracks` and start every fader at unity
    pub fn new<R: Rng + ?Sized>(
        tracks: &[Track],
        generator: &TargetGainGenerator,
        rng: &mut R,
    ) -> Result<Self> {
        let hidden = generator.sample_tracks(tracks, rng);
        Self::with_hidden_gains(hidden)
    }

    /// Start a round over known hidden gains
    pub fn with_hidden_gains(hidden: TrackGains) -> Result<Self> {
        for (track, gain) in hidden.iter() {
            if !(gain.is_finite() && gain > 0.0) {
                error!("hidden gain for {} violates the target invariant: {}", track, gain);
                return Err(StemmixError::InvalidGain { track, gain });
            }
        }
        let tracks: Vec<Track> = hidden.tracks().collect();
        Ok(Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            player: PlayerSettings::new(&tracks),
            hidden,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Tracks in play, in canonical order
    pub fn tracks(&self) -> Vec<Track> {
        self.hidden.tracks().collect()
    }

    pub fn hidden_gains(&self) -> &TrackGains {
        &self.hidden
    }

    /// Hidden gain applied to `track` this round
    pub fn hidden_gain(&self, track: Track) -> Option<f64> {
        self.hidden.get(track)
    }

    /// Fader gain that cancels the hidden gain of `track`
    pub fn answer_gain(&self, track: Track) -> Option<f64> {
        self.hidden.get(track).map(answer_gain)
    }

    pub fn player(&self) -> &PlayerSettings {
        &self.player
    }

    pub(crate) fn player_mut(&mut self) -> &mut PlayerSettings {
        &mut self.player
    }
}
