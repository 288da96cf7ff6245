//! Error handling for Stemmix
//!
//! Every error carries a stable code and, where it makes sense, recovery
//! suggestions the CLI can print.

use std::path::PathBuf;

use thiserror::Error;

use crate::game::Track;

/// Result type alias for Stemmix operations
pub type Result<T> = std::result::Result<T, StemmixError>;

/// Main error type for Stemmix operations
#[derive(Error, Debug)]
pub enum StemmixError {
    // Game Errors
    #[error("Not ready: cannot {action} before audio is loaded")]
    NotReady { action: &'static str },

    #[error("Invalid gain for {track}: {gain} (gains must be positive and finite)")]
    InvalidGain { track: Track, gain: f64 },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Unknown track: {name}")]
    UnknownTrack { name: String },

    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    // Stem Errors
    #[error("Stem for {track} not found: {path}")]
    StemNotFound { track: Track, path: PathBuf },

    #[error("Invalid stem for {track}: {reason}")]
    InvalidStem { track: Track, reason: String },

    #[error("Stems do not match: {reason}")]
    StemMismatch { reason: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StemmixError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StemmixError::NotReady { .. } => "NOT_READY",
            StemmixError::InvalidGain { .. } => "INVALID_GAIN",
            StemmixError::InvalidConfig { .. } => "INVALID_CONFIG",
            StemmixError::UnknownTrack { .. } => "UNKNOWN_TRACK",
            StemmixError::InvalidInput { .. } => "INVALID_INPUT",
            StemmixError::StemNotFound { .. } => "STEM_NOT_FOUND",
            StemmixError::InvalidStem { .. } => "INVALID_STEM",
            StemmixError::StemMismatch { .. } => "STEM_MISMATCH",
            StemmixError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            StemmixError::Io(_) => "IO_ERROR",
            StemmixError::Wav(_) => "WAV_ERROR",
            StemmixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// `InvalidGain` means a core invariant broke and is never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StemmixError::NotReady { .. }
                | StemmixError::InvalidConfig { .. }
                | StemmixError::UnknownTrack { .. }
                | StemmixError::InvalidInput { .. }
                | StemmixError::StemNotFound { .. }
                | StemmixError::UnsupportedFormat { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StemmixError::NotReady { .. } => vec![
                "Wait for the stems to finish loading",
                "Check that every stem file decoded without errors",
            ],
            StemmixError::InvalidConfig { .. } => vec![
                "Check the dB window contains 0 dB",
                "Make sure the target gain range fits inside the fader window",
            ],
            StemmixError::UnknownTrack { .. } => {
                vec!["Known tracks: vocal, guitar, piano, other, bass, drum"]
            }
            StemmixError::InvalidInput { .. } => vec![
                "Gains are written as <track>=<gain>, e.g. vocal=1.5",
                "Type 'help' in play mode for the command list",
            ],
            StemmixError::StemNotFound { .. } => vec![
                "Stems are looked up as <dir>/<track>.wav",
                "Export the missing stem or drop the track from the config",
            ],
            StemmixError::StemMismatch { .. } => vec![
                "All stems must share one sample rate and channel count",
                "Re-export the stems from the same session",
            ],
            StemmixError::UnsupportedFormat { .. } => vec![
                "Convert the stems to 16, 24 or 32-bit WAV",
                "Only mono and stereo stems are supported",
            ],
            _ => vec![],
        }
    }
}
