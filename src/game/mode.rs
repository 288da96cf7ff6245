//! Mode Controller
//!
//! Two modes decide what the player hears and what the faders show:
//!
//! - `PlayerSetting`: each track plays at `hidden * player_gain`, faders are
//!   live and show the player's gains.
//! - `Comparison`: each track plays at `hidden * (1 / hidden)`, i.e. the
//!   original mix. Faders are locked. They move to the answer only when the
//!   reveal policy allows it (after submit by default); otherwise they keep
//!   showing the player's gains.
//!
//! Submitting is one-way for the round: once submitted, every later entry
//! into comparison reveals the answer. Back in player-setting mode the faders
//! are live again unless the controller locks them after submit.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::config::RevealPolicy;
use crate::engine::{AudioSink, FaderControl};
use crate::game::round::Round;
use crate::game::score::answer_gain;
use crate::game::track::Track;

/// One fader per track
pub type FaderBank<F> = BTreeMap<Track, F>;

/// Gain the sink should play a track at, given the fader gain on top of the
/// hidden gain
#[inline]
pub fn audible_gain(hidden: f64, fader_gain: f64) -> f64 {
    hidden * fader_gain
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    PlayerSetting,
    Comparison,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::PlayerSetting => write!(f, "player setting"),
            Mode::Comparison => write!(f, "comparison"),
        }
    }
}

/// Owns the mode and the submitted flag; reads gains from the round
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: Mode,
    submitted: bool,
    policy: RevealPolicy,
    lock_after_submit: bool,
}

impl ModeController {
    pub fn new(policy: RevealPolicy) -> Self {
        Self {
            mode: Mode::PlayerSetting,
            submitted: false,
            policy,
            lock_after_submit: false,
        }
    }

    /// Keep faders locked in player-setting mode after submit
    pub fn with_lock_after_submit(mut self, lock: bool) -> Self {
        self.lock_after_submit = lock;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn policy(&self) -> RevealPolicy {
        self.policy
    }

    /// Whether comparison mode moves faders to the answer
    pub fn reveals_answer(&self) -> bool {
        self.submitted || self.policy == RevealPolicy::Always
    }

    /// Whether a user fader change may update the player settings
    pub fn accepts_fader_input(&self) -> bool {
        self.mode == Mode::PlayerSetting && !self.locked()
    }

    fn locked(&self) -> bool {
        self.submitted && self.lock_after_submit
    }

    /// Play the original mix and lock the faders
    pub fn enter_comparison<S, F>(&mut self, round: &Round, sink: &mut S, faders: &mut FaderBank<F>)
    where
        S: AudioSink + ?Sized,
        F: FaderControl,
    {
        self.mode = Mode::Comparison;
        let reveal = self.reveals_answer();

        for (track, hidden) in round.hidden_gains().iter() {
            let answer = answer_gain(hidden);
            sink.apply_gain(track, audible_gain(hidden, answer));
            if let Some(fader) = faders.get_mut(&track) {
                fader.set_disabled(true);
                if reveal {
                    fader.set_value(answer);
                }
            }
        }
        debug!("entered comparison mode (answer revealed: {})", reveal);
    }

    /// Play the player's mix and show the player's gains
    pub fn enter_player_setting<S, F>(
        &mut self,
        round: &Round,
        sink: &mut S,
        faders: &mut FaderBank<F>,
    ) where
        S: AudioSink + ?Sized,
        F: FaderControl,
    {
        self.mode = Mode::PlayerSetting;

        for (track, hidden) in round.hidden_gains().iter() {
            let player = round.player().get(track).unwrap_or(1.0);
            sink.apply_gain(track, audible_gain(hidden, player));
            if let Some(fader) = faders.get_mut(&track) {
                fader.set_disabled(self.locked());
                fader.set_value(player);
            }
        }
        debug!("entered player setting mode");
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    /// Back to the initial state for a new round
    pub(crate) fn reset(&mut self) {
        self.mode = Mode::PlayerSetting;
        self.submitted = false;
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(RevealPolicy::default())
    }
}
