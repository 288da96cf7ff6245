//! Audio Engine Module
//!
//! Everything around the game core that touches audio:
//! - Sink and fader seams the session drives
//! - WAV stem loading
//! - Offline mixdown
//! - Transport clock

pub mod mixdown;
pub mod sink;
pub mod stems;
pub mod transport;

pub use mixdown::{export_wav, MixBuffer, MixdownSink};
pub use sink::{AudioSink, FaderControl, GainBus, VirtualFader};
pub use stems::{Stem, StemSet};
pub use transport::{Transport, TransportState};
