//! WAV replay support: read a file as mono f32 at the pipeline sample rate.

use std::path::Path;

use crate::{AudioError, SAMPLE_RATE};

/// Read a WAV file and return mono f32 samples resampled to 16kHz.
///
/// Multi-channel input is mixed down by averaging. Intended for feeding
/// recorded audio through the pipeline (tests, replay), not for production
/// capture.
pub fn read_wav_mono_f32(path: impl AsRef<Path>) -> crate::Result<Vec<f32>> {
    let mut reader =
        hound::WavReader::open(path.as_ref()).map_err(|e| AudioError::WavOpen(e.to_string()))?;
    let spec = reader.spec();

    let channels = spec.channels.max(1) as usize;
    let sample_rate = spec.sample_rate;

    let raw: Vec<i16> = reader
        .samples::<i16>()
        .map(|s| s.map_err(|e| AudioError::WavDecode(e.to_string())))
        .collect::<Result<_, _>>()?;

    let mut mono = Vec::with_capacity(raw.len() / channels);
    for frame in raw.chunks(channels) {
        let sum: i32 = frame.iter().map(|s| *s as i32).sum();
        let avg = sum as f32 / channels as f32;
        mono.push(avg / i16::MAX as f32);
    }

    Ok(resample_linear(&mono, sample_rate, SAMPLE_RATE))
}

/// Resample audio using linear interpolation.
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }
    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(new_len);
    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx.fract() as f32;
        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };
        output.push(sample);
    }
    output
}
