//! CLI Module
//!
//! Command-line interface for the Stemmix ear-training game.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Difficulty;
use crate::game::{parse_track_gain, Track};

/// Stemmix - find the original balance of a song's stems by ear
#[derive(Parser, Debug)]
#[command(name = "stemmix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Game configuration (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed for the hidden gains, for reproducible rounds
    #[arg(short, long, global = true)]
    pub seed: Option<u64>,

    /// Hidden gain range: easy (+/-6 dB) or hard (+/-12 dB)
    #[arg(short, long, global = true)]
    pub difficulty: Option<Difficulty>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the fader curve (position, dB, gain)
    #[command(name = "curve")]
    Curve {
        /// Number of intervals between position 0 and 1
        #[arg(long, default_value_t = 8)]
        steps: usize,
    },

    /// Play one round with the given fader gains and print the score
    #[command(name = "score")]
    Score {
        /// Fader gain for a track, e.g. --gain vocal=1.5 (repeatable)
        #[arg(short, long = "gain", value_parser = parse_track_gain)]
        gains: Vec<(Track, f64)>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the round's mix of a stem directory to WAV
    #[command(name = "mixdown")]
    Mixdown {
        /// Directory holding <track>.wav stems
        #[arg(long)]
        stems: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        out: PathBuf,

        /// Fader gain for a track, e.g. --gain bass=0.5 (repeatable)
        #[arg(short, long = "gain", value_parser = parse_track_gain)]
        gains: Vec<(Track, f64)>,

        /// Render the original mix (comparison mode) instead of the player's
        #[arg(long)]
        answer: bool,

        /// Output bit depth: 16, 24 or 32
        #[arg(long, default_value_t = 24)]
        bits: u16,
    },

    /// Play rounds interactively on stdin
    #[command(name = "play")]
    Play {
        /// Directory holding <track>.wav stems to play the song from
        #[arg(long)]
        stems: Option<PathBuf>,
    },
}
