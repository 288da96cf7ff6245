//! Offline mixdown
//!
//! `MixdownSink` is an [`AudioSink`] backed by a [`StemSet`]: it remembers the
//! gains the session applies and can render the resulting mix, which the CLI
//! writes to a WAV file. It only reports ready once stems have loaded, so a
//! failed load leaves submit and comparison inert.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{info, warn};

use crate::engine::sink::{AudioSink, GainBus};
use crate::engine::stems::StemSet;
use crate::error::{Result, StemmixError};
use crate::game::Track;

/// Rendered audio, one `Vec` per channel
pub type MixBuffer = Vec<Vec<f32>>;

#[derive(Debug, Clone, Default)]
pub struct MixdownSink {
    bus: GainBus,
    stems: Option<StemSet>,
}

impl MixdownSink {
    /// A sink with no stems; not ready until [`MixdownSink::load_stems`] succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink over stems that are already decoded
    pub fn with_stems(stems: StemSet) -> Self {
        Self {
            bus: GainBus::ready(),
            stems: Some(stems),
        }
    }

    /// Load `<dir>/<track>.wav` for every track
    ///
    /// On failure the sink keeps its previous stems (if any) and readiness.
    pub fn load_stems(&mut self, dir: &Path, tracks: &[Track]) -> Result<()> {
        match StemSet::load_dir(dir, tracks) {
            Ok(stems) => {
                self.stems = Some(stems);
                self.bus.set_ready(true);
                Ok(())
            }
            Err(e) => {
                warn!("stem loading failed: {}", e);
                Err(e)
            }
        }
    }

    /// Mix every stem at its applied gain, times the master gain
    ///
    /// Tracks that never had a gain applied play at unity. Shorter stems are
    /// padded with silence to the longest one.
    pub fn render(&self) -> Result<MixBuffer> {
        let stems = self
            .stems
            .as_ref()
            .ok_or(StemmixError::NotReady { action: "render" })?;

        let frames = stems.num_frames();
        let master = self.bus.master_gain() as f32;
        let mut mix = vec![vec![0.0_f32; frames]; stems.num_channels()];

        for (track, stem) in stems.iter() {
            let gain = self.bus.gain(track).unwrap_or(1.0) as f32 * master;
            if gain == 0.0 {
                continue;
            }
            for (ch, out) in mix.iter_mut().enumerate() {
                for (sample, input) in out.iter_mut().zip(stem.channel(ch)) {
                    *sample += input * gain;
                }
            }
        }

        Ok(mix)
    }

    /// Render the mix and write it as WAV with the given bit depth (16, 24 or 32)
    pub fn write_wav(&self, path: &Path, bit_depth: u16) -> Result<()> {
        let mix = self.render()?;
        let sample_rate = self.stems.as_ref().map(StemSet::sample_rate).unwrap_or_default();
        export_wav(&mix, sample_rate, path, bit_depth)?;
        info!("wrote mixdown to {}", path.display());
        Ok(())
    }
}

impl AudioSink for MixdownSink {
    fn is_ready(&self) -> bool {
        self.stems.is_some() && self.bus.is_ready()
    }

    fn apply_gain(&mut self, track: Track, gain: f64) {
        self.bus.apply_gain(track, gain);
    }

    fn apply_master_gain(&mut self, gain: f64) {
        self.bus.apply_master_gain(gain);
    }

    fn current_time(&self) -> f64 {
        self.bus.current_time()
    }
}

/// Write de-interleaved channels to a WAV file
pub fn export_wav(channels: &[Vec<f32>], sample_rate: u32, path: &Path, bit_depth: u16) -> Result<()> {
    let sample_format = match bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        _ => {
            return Err(StemmixError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
            })
        }
    };
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: bit_depth,
        sample_format,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in interleave(channels) {
        match bit_depth {
            16 => writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?,
            // 24-bit stored as i32 in hound
            24 => writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32)?,
            _ => writer.write_sample(sample)?,
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Interleave channels from [[L,L,...], [R,R,...]] to [L,R,L,R,...]
fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = channels.first() else {
        return Vec::new();
    };
    let mut result = Vec::with_capacity(first.len() * channels.len());
    for frame in 0..first.len() {
        for channel in channels {
            result.push(channel[frame]);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stems::Stem;
    use approx::assert_abs_diff_eq;
    use std::collections::BTreeMap;

    fn stems() -> StemSet {
        let mut stems = BTreeMap::new();
        stems.insert(Track::Vocal, Stem::from_channels(vec![vec![0.5; 8]]).unwrap());
        stems.insert(Track::Bass, Stem::from_channels(vec![vec![0.25; 4]]).unwrap());
        StemSet::new(8000, stems).unwrap()
    }

    #[test]
    fn test_not_ready_without_stems() {
        let sink = MixdownSink::new();
        assert!(!sink.is_ready());
        assert_eq!(sink.render().unwrap_err().error_code(), "NOT_READY");
    }

    #[test]
    fn test_failed_load_stays_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MixdownSink::new();
        assert!(sink.load_stems(dir.path(), &[Track::Vocal]).is_err());
        assert!(!sink.is_ready());
    }

    #[test]
    fn test_render_applies_gains() {
        let mut sink = MixdownSink::with_stems(stems());
        sink.apply_gain(Track::Vocal, 0.5);
        sink.apply_gain(Track::Bass, 2.0);
        sink.apply_master_gain(0.5);

        let mix = sink.render().unwrap();
        assert_eq!(mix.len(), 1);
        assert_eq!(mix[0].len(), 8);
        // (0.5 * 0.5 + 0.25 * 2.0) * 0.5
        assert_abs_diff_eq!(mix[0][0], 0.375, epsilon = 1e-6);
        // bass stem has ended
        assert_abs_diff_eq!(mix[0][6], 0.125, epsilon = 1e-6);
    }

    #[test]
    fn test_write_wav_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mix.wav");
        let sink = MixdownSink::with_stems(stems());
        sink.write_wav(&path, 32).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.len(), 8);
    }

    #[test]
    fn test_rejects_odd_bit_depth() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_wav(&[vec![0.0; 4]], 8000, &dir.path().join("x.wav"), 12).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_interleave() {
        assert_eq!(interleave(&[vec![1.0, 3.0], vec![2.0, 4.0]]), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(interleave(&[]).is_empty());
    }
}
