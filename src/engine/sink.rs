//! Collaborator seams
//!
//! The game core never touches audio or widgets directly. It drives an
//! [`AudioSink`] (per-track and master gain, readiness, playback time) and one
//! [`FaderControl`] per track. Hosts implement both for their audio backend
//! and UI toolkit; [`GainBus`] and [`VirtualFader`] are in-memory versions.

use crate::game::{FaderCurve, Track, TrackGains};

/// Audio output the session pushes gains into
pub trait AudioSink {
    /// Whether every stem has loaded and decoded
    fn is_ready(&self) -> bool;

    /// Set the audible gain of one track; any gain in `[0, inf)` is accepted
    fn apply_gain(&mut self, track: Track, gain: f64);

    /// Set the master bus gain
    fn apply_master_gain(&mut self, gain: f64);

    /// Current playback time in seconds
    fn current_time(&self) -> f64 {
        0.0
    }
}

/// One fader as seen by the session
///
/// The "changed by user" notification is the host calling
/// `Session::on_fader_changed(track, gain)` with the gain the user picked;
/// [`VirtualFader::drag_to`] returns exactly that gain. `set_value` is the
/// session's programmatic update and must not be reported back as a user
/// change.
pub trait FaderControl {
    /// Displayed linear gain
    fn value(&self) -> f64;

    fn set_value(&mut self, gain: f64);

    fn set_disabled(&mut self, disabled: bool);

    fn is_disabled(&self) -> bool;
}

// ============================================================================
// GainBus
// ============================================================================

/// Sink that only records the gains it is given
#[derive(Debug, Clone)]
pub struct GainBus {
    ready: bool,
    gains: TrackGains,
    master_gain: f64,
    time_secs: f64,
}

impl GainBus {
    /// A bus that is not ready yet; call [`GainBus::set_ready`] once audio loads
    pub fn new() -> Self {
        Self {
            ready: false,
            gains: TrackGains::new(),
            master_gain: 1.0,
            time_secs: 0.0,
        }
    }

    /// A bus that reports ready immediately
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::new()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Record the playback clock reported by the audio backend
    pub fn set_time(&mut self, time_secs: f64) {
        self.time_secs = time_secs;
    }

    /// Last gain applied to `track`
    pub fn gain(&self, track: Track) -> Option<f64> {
        self.gains.get(track)
    }

    pub fn gains(&self) -> &TrackGains {
        &self.gains
    }

    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }
}

impl Default for GainBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for GainBus {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn apply_gain(&mut self, track: Track, gain: f64) {
        self.gains.insert(track, gain.max(0.0));
    }

    fn apply_master_gain(&mut self, gain: f64) {
        self.master_gain = gain.max(0.0);
    }

    fn current_time(&self) -> f64 {
        self.time_secs
    }
}

// ============================================================================
// VirtualFader
// ============================================================================

/// Fader that stores a position on a [`FaderCurve`]
#[derive(Debug, Clone)]
pub struct VirtualFader {
    curve: FaderCurve,
    position: f64,
    disabled: bool,
}

impl VirtualFader {
    /// A fader resting at unity gain
    pub fn new(curve: FaderCurve) -> Self {
        Self {
            position: curve.to_position(1.0),
            curve,
            disabled: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Move the fader as a user would
    ///
    /// Returns the new gain to forward to `Session::on_fader_changed`, or
    /// `None` when the fader is disabled and ignored the input.
    pub fn drag_to(&mut self, position: f64) -> Option<f64> {
        if self.disabled {
            return None;
        }
        self.position = self.curve.to_position(self.curve.to_gain(position));
        Some(self.value())
    }

    /// Label shown next to the fader
    pub fn label(&self) -> String {
        self.curve.format_db(self.value())
    }
}

impl FaderControl for VirtualFader {
    fn value(&self) -> f64 {
        self.curve.to_gain(self.position)
    }

    fn set_value(&mut self, gain: f64) {
        self.position = self.curve.to_position(gain);
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gain_bus_records() {
        let mut bus = GainBus::new();
        assert!(!bus.is_ready());
        bus.apply_gain(Track::Bass, 0.5);
        bus.apply_gain(Track::Bass, -2.0);
        bus.apply_master_gain(0.8);
        bus.set_ready(true);

        assert!(bus.is_ready());
        assert_eq!(bus.gain(Track::Bass), Some(0.0));
        assert_eq!(bus.master_gain(), 0.8);
    }

    #[test]
    fn test_virtual_fader_starts_at_unity() {
        let fader = VirtualFader::new(FaderCurve::default());
        assert_abs_diff_eq!(fader.value(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fader.position(), 0.5, epsilon = 1e-12);
        assert_eq!(fader.label(), "+0.0 dB");
    }

    #[test]
    fn test_disabled_fader_ignores_drag() {
        let mut fader = VirtualFader::new(FaderCurve::default());
        fader.set_disabled(true);
        assert_eq!(fader.drag_to(1.0), None);
        assert_abs_diff_eq!(fader.position(), 0.5, epsilon = 1e-12);

        fader.set_disabled(false);
        let gain = fader.drag_to(1.0).unwrap();
        assert_abs_diff_eq!(gain, FaderCurve::default().max_gain(), epsilon = 1e-9);
    }

    #[test]
    fn test_set_value_moves_position() {
        let mut fader = VirtualFader::new(FaderCurve::default());
        fader.set_value(2.0);
        assert_abs_diff_eq!(fader.value(), 2.0, epsilon = 1e-9);
        fader.set_value(0.0);
        assert_eq!(fader.position(), 0.0);
    }
}
