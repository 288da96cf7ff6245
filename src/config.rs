//! Game configuration
//!
//! Everything the engine treats as calibration lives here: the fader dB
//! window, the hidden gain distribution, the scoring constants and the
//! answer reveal policy. Configs load from JSON and are validated before a
//! session is built from them.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StemmixError};
use crate::game::{db_to_linear, linear_to_db, Track};

// ============================================================================
// Defaults
// ============================================================================

/// Default bottom of the fader window in dB
pub const DEFAULT_MIN_DB: f64 = -14.0;

/// Default top of the fader window in dB
pub const DEFAULT_MAX_DB: f64 = 14.0;

/// Gains at or below this are displayed as silence
pub const DEFAULT_SILENCE_EPSILON: f64 = 1e-6;

/// Default score penalty per octave of average error
pub const DEFAULT_SCORE_MULTIPLIER: f64 = 25.0;

/// Headroom for float error when checking that the answer range fits the window
const RANGE_TOLERANCE_DB: f64 = 1e-9;

// ============================================================================
// Sections
// ============================================================================

/// Decibel window the fader travels across
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaderCurveConfig {
    pub min_db: f64,
    pub max_db: f64,
    pub silence_epsilon: f64,
}

impl Default for FaderCurveConfig {
    fn default() -> Self {
        Self {
            min_db: DEFAULT_MIN_DB,
            max_db: DEFAULT_MAX_DB,
            silence_epsilon: DEFAULT_SILENCE_EPSILON,
        }
    }
}

/// How far hidden gains may stray from unity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Hidden gains in [0.5, 2]
    Easy,
    /// Hidden gains in [0.25, 4]
    #[default]
    Hard,
}

impl FromStr for Difficulty {
    type Err = StemmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "hard" => Ok(Difficulty::Hard),
            _ => invalid(format!("unknown difficulty '{}' (expected easy or hard)", s)),
        }
    }
}

impl Difficulty {
    pub fn target_config(self) -> TargetConfig {
        match self {
            Difficulty::Easy => TargetConfig {
                ratio_range: 4.0,
                centering_divisor: 2.0,
            },
            Difficulty::Hard => TargetConfig {
                ratio_range: 16.0,
                centering_divisor: 4.0,
            },
        }
    }
}

/// Log-uniform hidden gain distribution: `exp(u * ln(ratio_range)) / centering_divisor`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub ratio_range: f64,
    pub centering_divisor: f64,
}

impl TargetConfig {
    /// Smallest gain the distribution can produce
    pub fn min_gain(&self) -> f64 {
        1.0 / self.centering_divisor
    }

    /// Largest gain the distribution can produce
    pub fn max_gain(&self) -> f64 {
        self.ratio_range / self.centering_divisor
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Difficulty::default().target_config()
    }
}

/// Scoring calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points lost per octave of (averaged) error
    pub multiplier: f64,
    /// Average the per-track distance over the track count instead of summing
    pub normalize_by_track_count: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_SCORE_MULTIPLIER,
            normalize_by_track_count: true,
        }
    }
}

/// When comparison mode may move the faders to the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPolicy {
    /// Faders show the answer only once the round is submitted
    #[default]
    AfterSubmit,
    /// Faders show the answer whenever comparison mode is on
    Always,
}

// ============================================================================
// GameConfig
// ============================================================================

/// Full game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub curve: FaderCurveConfig,
    pub targets: TargetConfig,
    pub scoring: ScoringConfig,
    pub reveal: RevealPolicy,
    /// Keep faders locked in player-setting mode once the round is submitted
    pub lock_after_submit: bool,
    pub tracks: Vec<Track>,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            curve: FaderCurveConfig::default(),
            targets: TargetConfig::default(),
            scoring: ScoringConfig::default(),
            reveal: RevealPolicy::default(),
            lock_after_submit: false,
            tracks: Track::ALL.to_vec(),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Default config with the hidden gain range of `difficulty`
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            targets: difficulty.target_config(),
            ..Self::default()
        }
    }

    /// Load and validate a config from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the engine relies on
    pub fn validate(&self) -> Result<()> {
        let curve = &self.curve;
        if !curve.min_db.is_finite() || !curve.max_db.is_finite() {
            return invalid("fader dB bounds must be finite");
        }
        if curve.min_db >= curve.max_db {
            return invalid(format!(
                "fader min_db ({}) must be below max_db ({})",
                curve.min_db, curve.max_db
            ));
        }
        if curve.min_db > 0.0 || curve.max_db < 0.0 {
            return invalid("fader window must contain unity gain (0 dB)");
        }
        if !(curve.silence_epsilon >= 0.0 && curve.silence_epsilon < db_to_linear(curve.min_db)) {
            return invalid("silence_epsilon must be non-negative and below the fader floor");
        }

        let targets = &self.targets;
        if !(targets.ratio_range.is_finite() && targets.ratio_range > 1.0) {
            return invalid("target ratio_range must be finite and greater than 1");
        }
        if !(targets.centering_divisor.is_finite() && targets.centering_divisor > 0.0) {
            return invalid("target centering_divisor must be finite and positive");
        }
        // The answer is the reciprocal of the hidden gain and must be displayable.
        let answer_min_db = linear_to_db(1.0 / targets.max_gain());
        let answer_max_db = linear_to_db(1.0 / targets.min_gain());
        if answer_min_db < curve.min_db - RANGE_TOLERANCE_DB
            || answer_max_db > curve.max_db + RANGE_TOLERANCE_DB
        {
            return invalid(format!(
                "answer range [{:.1}, {:.1}] dB does not fit the fader window [{:.1}, {:.1}] dB",
                answer_min_db, answer_max_db, curve.min_db, curve.max_db
            ));
        }

        let scoring = &self.scoring;
        if !(scoring.multiplier.is_finite() && scoring.multiplier >= 0.0) {
            return invalid("score multiplier must be finite and non-negative");
        }

        if self.tracks.is_empty() {
            return invalid("at least one track must be active");
        }
        for (i, track) in self.tracks.iter().enumerate() {
            if self.tracks[..i].contains(track) {
                return invalid(format!("track {} listed twice", track));
            }
        }

        Ok(())
    }
}

fn invalid<T>(reason: impl Into<String>) -> Result<T> {
    Err(StemmixError::InvalidConfig {
        reason: reason.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tracks.len(), 6);
        assert_eq!(config.reveal, RevealPolicy::AfterSubmit);
        assert!(!config.lock_after_submit);
    }

    #[test]
    fn test_difficulty_ranges() {
        let hard = Difficulty::Hard.target_config();
        assert!((hard.min_gain() - 0.25).abs() < 1e-12);
        assert!((hard.max_gain() - 4.0).abs() < 1e-12);

        let easy = Difficulty::Easy.target_config();
        assert!((easy.min_gain() - 0.5).abs() < 1e-12);
        assert!((easy.max_gain() - 2.0).abs() < 1e-12);

        GameConfig::with_difficulty(Difficulty::Easy).validate().unwrap();
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!("Easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("nightmare".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut config = GameConfig::default();
        config.curve.min_db = 6.0;
        config.curve.max_db = -6.0;
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_rejects_window_without_unity() {
        let mut config = GameConfig::default();
        config.curve.min_db = 1.0;
        config.curve.max_db = 20.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_answer_outside_window() {
        let mut config = GameConfig::default();
        config.curve.min_db = -7.0;
        config.curve.max_db = 7.0;
        // Hard targets need +/-12 dB of travel
        assert!(config.validate().is_err());

        config.targets = Difficulty::Easy.target_config();
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_duplicate_and_empty_tracks() {
        let mut config = GameConfig::default();
        config.tracks = vec![Track::Bass, Track::Bass];
        assert!(config.validate().is_err());

        config.tracks.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "reveal": "always", "tracks": ["vocal", "drum"] }"#).unwrap();
        assert_eq!(config.reveal, RevealPolicy::Always);
        assert_eq!(config.tracks, vec![Track::Vocal, Track::Drum]);
        assert_eq!(config.curve, FaderCurveConfig::default());
        assert_eq!(config.scoring.multiplier, DEFAULT_SCORE_MULTIPLIER);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, r#"{ "seed": 7, "scoring": { "multiplier": 10.0 } }"#).unwrap();

        let config = GameConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.scoring.multiplier, 10.0);
        assert!(config.scoring.normalize_by_track_count);
    }
}
