//! Fader Curve
//!
//! Maps a normalized fader position onto a decibel window and from there onto
//! linear gain. Fader travel is linear in dB so equal movements give equal
//! loudness steps. The same curve drives player input, the answer reveal and
//! the display, so there is exactly one place that converts between units.

use std::fmt;

use crate::config::FaderCurveConfig;
use crate::error::{Result, StemmixError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns `f64::NEG_INFINITY` for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Display
// ============================================================================

/// What a fader label shows for a gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DbDisplay {
    /// Gain is zero or below the silence epsilon
    Silence,
    Db(f64),
}

impl fmt::Display for DbDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbDisplay::Silence => write!(f, "-inf dB"),
            DbDisplay::Db(db) => write!(f, "{:+.1} dB", db),
        }
    }
}

// ============================================================================
// FaderCurve
// ============================================================================

/// Position <-> gain mapping over a `[min_db, max_db]` window
///
/// Position 0 is `min_db`, position 1 is `max_db`. Gains outside the window
/// clamp to the nearest end; a gain of zero (or anything at or below the
/// silence epsilon) maps to position 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaderCurve {
    min_db: f64,
    max_db: f64,
    silence_epsilon: f64,
}

impl FaderCurve {
    /// Create a curve, rejecting windows that are empty, inverted or infinite
    pub fn new(config: FaderCurveConfig) -> Result<Self> {
        if !config.min_db.is_finite() || !config.max_db.is_finite() || config.min_db >= config.max_db
        {
            return Err(StemmixError::InvalidConfig {
                reason: format!(
                    "fader window [{}, {}] dB is not a valid range",
                    config.min_db, config.max_db
                ),
            });
        }
        Ok(Self {
            min_db: config.min_db,
            max_db: config.max_db,
            silence_epsilon: config.silence_epsilon.max(0.0),
        })
    }

    pub fn min_db(&self) -> f64 {
        self.min_db
    }

    pub fn max_db(&self) -> f64 {
        self.max_db
    }

    /// Smallest gain the fader can produce
    pub fn min_gain(&self) -> f64 {
        db_to_linear(self.min_db)
    }

    /// Largest gain the fader can produce
    pub fn max_gain(&self) -> f64 {
        db_to_linear(self.max_db)
    }

    /// Decibel value at `position` (clamped to [0, 1])
    pub fn position_to_db(&self, position: f64) -> f64 {
        let p = if position.is_nan() { 0.0 } else { position.clamp(0.0, 1.0) };
        self.min_db + p * (self.max_db - self.min_db)
    }

    /// Position for a decibel value (clamped to the window)
    pub fn db_to_position(&self, db: f64) -> f64 {
        if db.is_nan() {
            return 0.0;
        }
        ((db - self.min_db) / (self.max_db - self.min_db)).clamp(0.0, 1.0)
    }

    /// Linear gain at `position`
    pub fn to_gain(&self, position: f64) -> f64 {
        db_to_linear(self.position_to_db(position))
    }

    /// Fader position for `gain`
    pub fn to_position(&self, gain: f64) -> f64 {
        if self.is_silence(gain) {
            return 0.0;
        }
        self.db_to_position(linear_to_db(gain))
    }

    /// Clamp a gain into the window the fader can represent
    pub fn clamp_gain(&self, gain: f64) -> f64 {
        if self.is_silence(gain) {
            return self.min_gain();
        }
        gain.clamp(self.min_gain(), self.max_gain())
    }

    /// Whether `gain` is treated as silence by the display
    pub fn is_silence(&self, gain: f64) -> bool {
        gain.is_nan() || gain <= self.silence_epsilon
    }

    /// Display value for a gain
    pub fn display(&self, gain: f64) -> DbDisplay {
        if self.is_silence(gain) {
            DbDisplay::Silence
        } else {
            DbDisplay::Db(linear_to_db(gain))
        }
    }

    /// Human-readable label for a gain, e.g. `+3.5 dB` or `-inf dB`
    pub fn format_db(&self, gain: f64) -> String {
        self.display(gain).to_string()
    }
}

impl Default for FaderCurve {
    fn default() -> Self {
        let config = FaderCurveConfig::default();
        Self {
            min_db: config.min_db,
            max_db: config.max_db,
            silence_epsilon: config.silence_epsilon,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn test_db_helpers() {
        assert_abs_diff_eq!(db_to_linear(0.0), 1.0, epsilon = 1e-12);
        // -6 dB ~= 0.501187
        assert_abs_diff_eq!(db_to_linear(-6.0), 0.501187, epsilon = 1e-6);
        assert_abs_diff_eq!(linear_to_db(2.0), 6.0206, epsilon = 1e-4);
        assert_eq!(linear_to_db(0.0), f64::NEG_INFINITY);
        assert_eq!(linear_to_db(-1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_endpoints_map_to_window() {
        let curve = FaderCurve::default();
        assert_abs_diff_eq!(curve.position_to_db(0.0), -14.0);
        assert_abs_diff_eq!(curve.position_to_db(1.0), 14.0);
        assert_abs_diff_eq!(curve.to_gain(0.5), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_position_roundtrip() {
        let curve = FaderCurve::default();
        for i in 0..=1000 {
            let p = i as f64 / 1000.0;
            assert_abs_diff_eq!(curve.to_position(curve.to_gain(p)), p, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_gain_roundtrip_inside_window() {
        let curve = FaderCurve::default();
        for gain in [0.2, 0.25, 0.5, 1.0, 1.5, 2.0, 4.0, 5.0] {
            assert_abs_diff_eq!(curve.to_gain(curve.to_position(gain)), gain, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_strictly_increasing() {
        let curve = FaderCurve::default();
        let mut previous = curve.to_gain(0.0);
        for i in 1..=200 {
            let gain = curve.to_gain(i as f64 / 200.0);
            assert!(gain > previous, "gain not increasing at step {}", i);
            previous = gain;
        }
    }

    #[test]
    fn test_zero_gain_is_silence() {
        let curve = FaderCurve::default();
        assert_eq!(curve.to_position(0.0), 0.0);
        assert_eq!(curve.to_position(-3.0), 0.0);
        assert_eq!(curve.to_position(f64::NAN), 0.0);
        assert_eq!(curve.display(0.0), DbDisplay::Silence);
        assert_eq!(curve.format_db(0.0), "-inf dB");
    }

    #[test]
    fn test_out_of_window_gains_clamp() {
        let curve = FaderCurve::default();
        assert_eq!(curve.to_position(100.0), 1.0);
        assert_eq!(curve.to_position(0.01), 0.0);
        assert_abs_diff_eq!(curve.clamp_gain(100.0), curve.max_gain(), epsilon = 1e-12);
    }

    #[test_case(1.0, "+0.0 dB" ; "unity")]
    #[test_case(2.0, "+6.0 dB" ; "double")]
    #[test_case(0.5, "-6.0 dB" ; "half")]
    #[test_case(1e-7, "-inf dB" ; "below epsilon")]
    fn test_format_db(gain: f64, expected: &str) {
        assert_eq!(FaderCurve::default().format_db(gain), expected);
    }

    #[test]
    fn test_custom_window() {
        let curve = FaderCurve::new(FaderCurveConfig {
            min_db: -20.0,
            max_db: 20.0,
            silence_epsilon: 0.0,
        })
        .unwrap();
        assert_abs_diff_eq!(curve.min_gain(), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.max_gain(), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(curve.to_gain(0.75), 10.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_window() {
        let config = FaderCurveConfig {
            min_db: 3.0,
            max_db: 3.0,
            ..FaderCurveConfig::default()
        };
        assert!(FaderCurve::new(config).is_err());
    }
}
