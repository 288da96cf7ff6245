//! Stemmix - Ear-Training Mix Game Engine
//!
//! A song is split into stems (vocal, guitar, piano, other, bass, drum). Each
//! stem gets a hidden random gain; the player moves one fader per stem to
//! undo it and is scored on how close they get.
//!
//! # Architecture
//!
//! - `game`: the gain model and scoring engine (fader curve, hidden targets,
//!   player settings, mode state machine, scorer, round lifecycle)
//! - `engine`: audio-facing collaborators (sink/fader seams, stem loading,
//!   mixdown, transport clock)
//! - `config`: calibration and policy, loadable from JSON
//! - `cli`: the `stemmix-cli` command set

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;

pub use config::{Difficulty, GameConfig, RevealPolicy};
pub use error::{Result, StemmixError};
pub use game::{FaderCurve, Mode, Session, Track};
