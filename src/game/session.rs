//! Game Session
//!
//! A session owns the current round, the mode controller, the audio sink and
//! the faders, and exposes the handlers a UI wires its events to:
//!
//! - [`Session::on_fader_changed`]
//! - [`Session::on_toggle_comparison`]
//! - [`Session::on_submit`]
//! - [`Session::on_restart`]
//! - [`Session::on_master_volume`]
//!
//! Handlers never fail on bad timing: acting before the sink is ready, or
//! moving a fader while it is locked, is a logged no-op.
//!
//! Faders report user moves by calling [`Session::on_fader_changed`] (see
//! [`VirtualFader::drag_to`]). The session writes back through
//! `FaderControl::set_value`, which never counts as a user move.
//!
//! Restarting only replaces round state. Loaded audio lives in the sink and
//! is left untouched.

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::GameConfig;
use crate::engine::{AudioSink, FaderControl, VirtualFader};
use crate::error::{Result, StemmixError};
use crate::game::curve::{linear_to_db, FaderCurve};
use crate::game::mode::{audible_gain, FaderBank, Mode, ModeController};
use crate::game::round::Round;
use crate::game::score::{answer_gain, log_distance, Scorer};
use crate::game::target::TargetGainGenerator;
use crate::game::track::{Track, TrackGains};

/// Per-track comparison shown after submit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackReveal {
    pub track: Track,
    pub player_gain: f64,
    pub player_db: f64,
    pub answer_gain: f64,
    pub answer_db: f64,
    /// Distance between player and answer in octaves
    pub error_octaves: f64,
}

pub struct Session<S, F> {
    config: GameConfig,
    curve: FaderCurve,
    generator: TargetGainGenerator,
    scorer: Scorer,
    rng: StdRng,
    round: Round,
    modes: ModeController,
    last_score: Option<u8>,
    /// Player gains as they were when the round was scored
    submitted_gains: Option<TrackGains>,
    sink: S,
    faders: FaderBank<F>,
}

impl<S: AudioSink> Session<S, VirtualFader> {
    /// Session with in-memory faders on the configured curve
    pub fn with_virtual_faders(config: GameConfig, sink: S) -> Result<Self> {
        let curve = FaderCurve::new(config.curve)?;
        let faders = config
            .tracks
            .iter()
            .map(|&track| (track, VirtualFader::new(curve)))
            .collect();
        Self::new(config, sink, faders)
    }
}

impl<S: AudioSink, F: FaderControl> Session<S, F> {
    /// Validate `config`, sample the first round and sync sink and faders
    ///
    /// `faders` must hold one control for every configured track.
    pub fn new(config: GameConfig, sink: S, faders: FaderBank<F>) -> Result<Self> {
        config.validate()?;
        if let Some(track) = config.tracks.iter().find(|t| !faders.contains_key(t)) {
            return Err(StemmixError::InvalidConfig {
                reason: format!("no fader provided for {}", track),
            });
        }

        let curve = FaderCurve::new(config.curve)?;
        let generator = TargetGainGenerator::new(config.targets)?;
        let scorer = Scorer::new(config.scoring);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let round = Round::new(&config.tracks, &generator, &mut rng)?;

        let mut session = Self {
            modes: ModeController::new(config.reveal)
                .with_lock_after_submit(config.lock_after_submit),
            config,
            curve,
            generator,
            scorer,
            rng,
            round,
            last_score: None,
            submitted_gains: None,
            sink,
            faders,
        };
        session.sync_player_setting();
        info!("new session, round {}", session.round.id());
        Ok(session)
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    /// A user moved the fader of `track` to `gain`
    ///
    /// Returns whether the change was accepted. Changes are ignored while in
    /// comparison mode (and after submit when the config locks the round).
    /// Gains outside the fader window are clamped to it, and the fader is
    /// moved to the stored value.
    pub fn on_fader_changed(&mut self, track: Track, gain: f64) -> bool {
        if !self.modes.accepts_fader_input() {
            debug!("ignoring fader change on {} in {} mode", track, self.modes.mode());
            return false;
        }
        let Some(hidden) = self.round.hidden_gain(track) else {
            warn!("fader change for inactive track {}", track);
            return false;
        };

        let clamped = self.curve.clamp_gain(gain);
        if let Err(e) = self.round.player_mut().set(track, clamped) {
            error!("rejected fader change on {}: {}", track, e);
            return false;
        }
        self.sink.apply_gain(track, audible_gain(hidden, clamped));
        if let Some(fader) = self.faders.get_mut(&track) {
            fader.set_value(clamped);
        }
        true
    }

    /// Switch comparison mode on or off
    ///
    /// Returns whether the request took effect. Before the sink is ready this
    /// is a no-op.
    pub fn on_toggle_comparison(&mut self, on: bool) -> bool {
        if !self.sink.is_ready() {
            warn!("comparison toggle ignored: audio not ready");
            return false;
        }
        match (on, self.modes.mode()) {
            (true, Mode::PlayerSetting) => {
                self.modes
                    .enter_comparison(&self.round, &mut self.sink, &mut self.faders);
            }
            (false, Mode::Comparison) => self.sync_player_setting(),
            _ => debug!("already in {} mode", self.modes.mode()),
        }
        true
    }

    /// Score the round, lock it and reveal the answer
    ///
    /// Returns `None` (and changes nothing) before the sink is ready. A second
    /// submit in the same round returns the stored score.
    pub fn on_submit(&mut self) -> Option<u8> {
        if self.modes.is_submitted() {
            return self.last_score;
        }
        let score = match self.score() {
            Ok(score) => score,
            Err(StemmixError::NotReady { action }) => {
                warn!("submit ignored: cannot {} before audio is ready", action);
                return None;
            }
            Err(e) => {
                error!("scoring failed: {}", e);
                return None;
            }
        };

        self.modes.mark_submitted();
        self.last_score = Some(score);
        self.submitted_gains = Some(self.round.player().gains().clone());
        self.modes
            .enter_comparison(&self.round, &mut self.sink, &mut self.faders);
        info!("round {} submitted, score {}", self.round.id(), score);
        Some(score)
    }

    /// Start a new round: fresh hidden gains, unity faders, no score
    pub fn on_restart(&mut self) -> Result<()> {
        self.round = Round::new(&self.config.tracks, &self.generator, &mut self.rng)?;
        self.modes.reset();
        self.last_score = None;
        self.submitted_gains = None;
        self.sync_player_setting();
        info!("restarted, round {}", self.round.id());
        Ok(())
    }

    /// Set the master bus gain; negative or non-finite values mute
    pub fn on_master_volume(&mut self, gain: f64) {
        let gain = if gain.is_finite() { gain.max(0.0) } else { 0.0 };
        self.sink.apply_master_gain(gain);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Score the current player settings without submitting
    ///
    /// Fails with `NotReady` before the sink is ready.
    pub fn score(&self) -> Result<u8> {
        if !self.sink.is_ready() {
            return Err(StemmixError::NotReady { action: "score" });
        }
        self.scorer
            .score(self.round.player().gains(), self.round.hidden_gains())
    }

    /// Player vs answer per track, available once the round is submitted
    ///
    /// Player gains are the ones that were scored, even if faders moved since.
    pub fn reveal(&self) -> Option<Vec<TrackReveal>> {
        let submitted = self.submitted_gains.as_ref()?;
        let reveal = self
            .round
            .hidden_gains()
            .iter()
            .map(|(track, hidden)| {
                let player = submitted.get(track).unwrap_or(1.0);
                let answer = answer_gain(hidden);
                TrackReveal {
                    track,
                    player_gain: player,
                    player_db: linear_to_db(player),
                    answer_gain: answer,
                    answer_db: linear_to_db(answer),
                    error_octaves: log_distance(player, hidden),
                }
            })
            .collect();
        Some(reveal)
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn is_submitted(&self) -> bool {
        self.modes.is_submitted()
    }

    /// Score shown to the player, cleared on restart
    pub fn last_score(&self) -> Option<u8> {
        self.last_score
    }

    /// Gain the player has chosen for `track`
    pub fn player_gain(&self, track: Track) -> Option<f64> {
        self.round.player().get(track)
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn curve(&self) -> &FaderCurve {
        &self.curve
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn fader(&self, track: Track) -> Option<&F> {
        self.faders.get(&track)
    }

    pub fn fader_mut(&mut self, track: Track) -> Option<&mut F> {
        self.faders.get_mut(&track)
    }

    /// Give the sink back, e.g. to render the final mix
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn sync_player_setting(&mut self) {
        self.modes
            .enter_player_setting(&self.round, &mut self.sink, &mut self.faders);
    }
}
