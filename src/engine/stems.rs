//! Stem loading
//!
//! A song ships as one WAV file per track, named after the track
//! (`vocal.wav`, `guitar.wav`, ...). Every stem is converted to 32-bit float
//! and kept de-interleaved. All stems of a song must share sample rate and
//! channel count.

use std::collections::BTreeMap;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::{debug, info};

use crate::error::{Result, StemmixError};
use crate::game::Track;

/// Decoded audio for one track, one `Vec` per channel
#[derive(Debug, Clone, PartialEq)]
pub struct Stem {
    channels: Vec<Vec<f32>>,
}

impl Stem {
    /// Build a stem from de-interleaved channel data
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Result<Self> {
        let frames = match channels.first() {
            Some(first) => first.len(),
            None => {
                return Err(StemmixError::StemMismatch {
                    reason: "stem has no channels".to_string(),
                })
            }
        };
        if channels.iter().any(|c| c.len() != frames) {
            return Err(StemmixError::StemMismatch {
                reason: "stem channels differ in length".to_string(),
            });
        }
        Ok(Self { channels })
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }
}

/// All stems of one song
#[derive(Debug, Clone)]
pub struct StemSet {
    sample_rate: u32,
    num_channels: usize,
    stems: BTreeMap<Track, Stem>,
}

impl StemSet {
    /// Assemble a set from already decoded stems
    pub fn new(sample_rate: u32, stems: BTreeMap<Track, Stem>) -> Result<Self> {
        let num_channels = stems
            .values()
            .next()
            .map(Stem::num_channels)
            .ok_or_else(|| StemmixError::StemMismatch {
                reason: "no stems given".to_string(),
            })?;
        if let Some((track, stem)) = stems.iter().find(|(_, s)| s.num_channels() != num_channels) {
            return Err(StemmixError::StemMismatch {
                reason: format!(
                    "{} has {} channels, expected {}",
                    track,
                    stem.num_channels(),
                    num_channels
                ),
            });
        }
        Ok(Self {
            sample_rate,
            num_channels,
            stems,
        })
    }

    /// Load `<dir>/<track>.wav` for every track
    pub fn load_dir(dir: &Path, tracks: &[Track]) -> Result<Self> {
        let mut stems = BTreeMap::new();
        let mut sample_rate = None;

        for &track in tracks {
            let path = dir.join(format!("{}.wav", track.name()));
            if !path.exists() {
                return Err(StemmixError::StemNotFound { track, path });
            }
            let (rate, stem) = load_stem(track, &path)?;
            match sample_rate {
                None => sample_rate = Some(rate),
                Some(expected) if expected != rate => {
                    return Err(StemmixError::StemMismatch {
                        reason: format!("{} is {} Hz, expected {} Hz", track, rate, expected),
                    });
                }
                Some(_) => {}
            }
            debug!("loaded {} ({} frames)", path.display(), stem.num_frames());
            stems.insert(track, stem);
        }

        let set = Self::new(sample_rate.unwrap_or_default(), stems)?;
        info!(
            "loaded {} stems from {} ({} Hz, {} ch)",
            set.stems.len(),
            dir.display(),
            set.sample_rate,
            set.num_channels
        );
        Ok(set)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Length of the longest stem in frames
    pub fn num_frames(&self) -> usize {
        self.stems.values().map(Stem::num_frames).max().unwrap_or(0)
    }

    /// Duration of the longest stem in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / f64::from(self.sample_rate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Track, &Stem)> {
        self.stems.iter().map(|(&track, stem)| (track, stem))
    }
}

fn load_stem(track: Track, path: &Path) -> Result<(u32, Stem)> {
    let reader = WavReader::open(path).map_err(|e| StemmixError::InvalidStem {
        track,
        reason: format!("failed to open WAV file: {}", e),
    })?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || channels > 2 {
        return Err(StemmixError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if samples.is_empty() {
        return Err(StemmixError::InvalidStem {
            track,
            reason: "stem contains no samples".to_string(),
        });
    }

    let stem = Stem::from_channels(deinterleave(&samples, channels))?;
    Ok((spec.sample_rate, stem))
}

type HoundSamples = std::result::Result<Vec<f32>, hound::Error>;

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let samples = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader.samples::<f32>().collect::<HoundSamples>()?,
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| f32::from(v) / 128.0))
            .collect::<HoundSamples>()?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / 32768.0))
            .collect::<HoundSamples>()?,
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<HoundSamples>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<HoundSamples>()?,
        (SampleFormat::Int, bits) => {
            return Err(StemmixError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits),
            })
        }
    };
    Ok(samples)
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (channel, sample) in result.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_stem(dir: &Path, track: Track, channels: u16, rate: u32, frames: usize) {
        let spec = WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let path = dir.join(format!("{}.wav", track.name()));
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..frames * channels as usize {
            writer.write_sample((i % 100) as i16 * 100).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_deinterleave() {
        let split = deinterleave(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(split, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_stem(dir.path(), Track::Vocal, 2, 44100, 1000);
        write_stem(dir.path(), Track::Bass, 2, 44100, 1500);

        let set = StemSet::load_dir(dir.path(), &[Track::Vocal, Track::Bass]).unwrap();
        assert_eq!(set.sample_rate(), 44100);
        assert_eq!(set.num_channels(), 2);
        assert_eq!(set.num_frames(), 1500);
        let frames: Vec<(Track, usize)> = set.iter().map(|(t, s)| (t, s.num_frames())).collect();
        assert_eq!(frames, vec![(Track::Vocal, 1000), (Track::Bass, 1500)]);
    }

    #[test]
    fn test_missing_stem() {
        let dir = tempfile::tempdir().unwrap();
        write_stem(dir.path(), Track::Vocal, 1, 44100, 100);

        let err = StemSet::load_dir(dir.path(), &[Track::Vocal, Track::Drum]).unwrap_err();
        assert_eq!(err.error_code(), "STEM_NOT_FOUND");
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_stem(dir.path(), Track::Vocal, 1, 44100, 100);
        write_stem(dir.path(), Track::Piano, 1, 48000, 100);

        let err = StemSet::load_dir(dir.path(), &[Track::Vocal, Track::Piano]).unwrap_err();
        assert_eq!(err.error_code(), "STEM_MISMATCH");
    }

    #[test]
    fn test_channel_mismatch() {
        let mut stems = BTreeMap::new();
        stems.insert(Track::Vocal, Stem::from_channels(vec![vec![0.0; 4]]).unwrap());
        stems.insert(
            Track::Bass,
            Stem::from_channels(vec![vec![0.0; 4], vec![0.0; 4]]).unwrap(),
        );
        assert!(StemSet::new(44100, stems).is_err());
    }
}
