//! Game Core
//!
//! Gain model and scoring engine:
//! - Fader curve: position <-> dB <-> linear gain
//! - Target generator: hidden per-track gains, log-uniform
//! - Player settings: the gains the player chose
//! - Mode controller: player-setting / comparison state machine
//! - Scorer: octave-distance score in 0..=100
//! - Round and session: lifecycle and UI-facing handlers

mod curve;
mod mode;
mod round;
mod score;
mod session;
mod settings;
mod target;
mod track;

pub use curve::{db_to_linear, linear_to_db, DbDisplay, FaderCurve};
pub use mode::{audible_gain, FaderBank, Mode, ModeController};
pub use round::Round;
pub use score::{answer_gain, log_distance, Scorer, MAX_SCORE};
pub use session::{Session, TrackReveal};
pub use settings::{PlayerSettings, DEFAULT_PLAYER_GAIN};
pub use target::TargetGainGenerator;
pub use track::{parse_track_gain, Track, TrackGains};
