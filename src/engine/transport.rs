//! Transport clock
//!
//! Play/pause/seek bookkeeping for looping stem playback. The transport owns
//! no audio; it derives the playhead from an external clock reading (for
//! example [`AudioSink::current_time`](crate::engine::AudioSink::current_time))
//! passed into every call. Restarting a round never touches the transport.

use std::fmt;

use log::debug;

/// Transport states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Paused,
    Playing,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Paused => write!(f, "Paused"),
            TransportState::Playing => write!(f, "Playing"),
        }
    }
}

/// Playhead over a song of fixed duration that loops at the end
#[derive(Debug, Clone)]
pub struct Transport {
    state: TransportState,

    /// Song length in seconds
    duration_secs: f64,

    /// Clock time that corresponds to playhead 0 while playing
    start_time: f64,

    /// Playhead while paused
    paused_position: f64,
}

impl Transport {
    /// Create a paused transport at the start of a song
    ///
    /// # Example
    /// ```
    /// use stemmix::engine::Transport;
    /// let transport = Transport::new(180.0);
    /// assert!(transport.is_paused());
    /// assert_eq!(transport.position(0.0), 0.0);
    /// ```
    pub fn new(duration_secs: f64) -> Self {
        Self {
            state: TransportState::Paused,
            duration_secs: duration_secs.max(0.0),
            start_time: 0.0,
            paused_position: 0.0,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == TransportState::Paused
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Start playback from the current playhead
    ///
    /// # Example
    /// ```
    /// use stemmix::engine::Transport;
    /// let mut transport = Transport::new(10.0);
    /// transport.play(100.0);
    /// assert_eq!(transport.position(103.0), 3.0);
    /// ```
    pub fn play(&mut self, now: f64) {
        if self.is_playing() {
            debug!("[TRANSPORT] Already playing");
            return;
        }
        self.start_time = now - self.paused_position;
        self.state = TransportState::Playing;
        debug!("[TRANSPORT] Play from {:.3}s", self.paused_position);
    }

    /// Freeze the playhead
    pub fn pause(&mut self, now: f64) {
        if self.is_paused() {
            debug!("[TRANSPORT] Already paused");
            return;
        }
        self.paused_position = self.position(now);
        self.state = TransportState::Paused;
        debug!("[TRANSPORT] Paused at {:.3}s", self.paused_position);
    }

    /// Play if paused, pause if playing; returns the new state
    pub fn toggle(&mut self, now: f64) -> TransportState {
        match self.state {
            TransportState::Paused => self.play(now),
            TransportState::Playing => self.pause(now),
        }
        self.state
    }

    /// Move the playhead to `percent` (0-100) of the song, keeping play state
    pub fn seek_percent(&mut self, percent: f64, now: f64) {
        let position = (percent.clamp(0.0, 100.0) / 100.0) * self.duration_secs;
        match self.state {
            TransportState::Playing => self.start_time = now - position,
            TransportState::Paused => self.paused_position = position,
        }
        debug!("[TRANSPORT] Seek to {:.3}s", position);
    }

    /// Playhead in seconds at clock time `now`, wrapped to the song length
    pub fn position(&self, now: f64) -> f64 {
        let raw = match self.state {
            TransportState::Playing => now - self.start_time,
            TransportState::Paused => self.paused_position,
        };
        if self.duration_secs > 0.0 {
            raw.rem_euclid(self.duration_secs)
        } else {
            0.0
        }
    }

    /// Playhead as a percentage of the song, for a time slider
    pub fn progress_percent(&self, now: f64) -> f64 {
        if self.duration_secs > 0.0 {
            self.position(now) / self.duration_secs * 100.0
        } else {
            0.0
        }
    }
}
