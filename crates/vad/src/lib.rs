//! Energy-based voice activity detection.
//!
//! A single-pole high-pass filter strips DC offset and low-frequency rumble,
//! then the RMS energy of the trailing sub-window is compared against the
//! scaled RMS of the whole window. Deterministic and stateless: the decision
//! depends only on the samples passed in.

/// Energy-based voice activity detector.
///
/// `threshold` scales the whole-window RMS that the trailing sub-window must
/// exceed to count as speech. `freq_cutoff` is the high-pass cutoff in Hz
/// (non-positive disables filtering).
#[derive(Debug, Clone, Copy)]
pub struct EnergyVad {
    pub threshold: f32,
    pub freq_cutoff: f32,
}

impl Default for EnergyVad {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            freq_cutoff: 100.0,
        }
    }
}

impl EnergyVad {
    pub fn new(threshold: f32, freq_cutoff: f32) -> Self {
        Self {
            threshold,
            freq_cutoff,
        }
    }

    /// Decide whether speech is present in the trailing `last_ms` of `samples`.
    ///
    /// Returns false when the sub-window does not fit inside the probe, and
    /// for all-silent input (zero energy never exceeds the scaled threshold).
    pub fn detect(&self, samples: &[f32], sample_rate: u32, last_ms: u32) -> bool {
        let n_samples = samples.len();
        let n_samples_last = (sample_rate as usize * last_ms as usize) / 1000;

        if n_samples_last >= n_samples {
            // not enough audio to compare the sub-window against its context
            return false;
        }

        let mut filtered = samples.to_vec();
        if self.freq_cutoff > 0.0 {
            high_pass_filter(&mut filtered, self.freq_cutoff, sample_rate);
        }

        let energy_all = rms(&filtered);
        let energy_last = rms(&filtered[n_samples - n_samples_last..]);

        let speech = energy_last > self.threshold * energy_all;
        tracing::debug!(
            energy_all,
            energy_last,
            threshold = self.threshold,
            speech,
            "vad decision"
        );
        speech
    }
}

/// In-place single-pole high-pass filter.
pub fn high_pass_filter(samples: &mut [f32], cutoff_hz: f32, sample_rate: u32) {
    if samples.is_empty() {
        return;
    }

    let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz);
    let dt = 1.0 / sample_rate as f32;
    let alpha = rc / (rc + dt);

    let mut y = samples[0];
    let mut x_prev = samples[0];
    samples[0] = 0.0;
    for sample in samples.iter_mut().skip(1) {
        let x = *sample;
        y = alpha * (y + x - x_prev);
        x_prev = x;
        *sample = y;
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 16000;

    /// 2 seconds of probe audio: quiet first half, tone in the second half.
    fn probe_with_trailing_speech() -> Vec<f32> {
        let mut samples = vec![0.0f32; SAMPLE_RATE as usize];
        for i in 0..SAMPLE_RATE as usize {
            let t = i as f32 / SAMPLE_RATE as f32;
            samples.push(0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin());
        }
        samples
    }

    #[test]
    fn test_silence_is_not_speech() {
        let vad = EnergyVad::default();
        let silence = vec![0.0f32; 2 * SAMPLE_RATE as usize];
        assert!(!vad.detect(&silence, SAMPLE_RATE, 1000));
    }

    #[test]
    fn test_trailing_tone_is_speech() {
        let vad = EnergyVad::default();
        let samples = probe_with_trailing_speech();
        assert!(vad.detect(&samples, SAMPLE_RATE, 1000));
    }

    #[test]
    fn test_detection_is_idempotent() {
        let vad = EnergyVad::new(0.6, 100.0);
        let samples = probe_with_trailing_speech();
        let first = vad.detect(&samples, SAMPLE_RATE, 1000);
        for _ in 0..5 {
            assert_eq!(vad.detect(&samples, SAMPLE_RATE, 1000), first);
        }
    }

    #[test]
    fn test_subwindow_must_fit() {
        let vad = EnergyVad::default();
        // 500ms of audio cannot host a 1000ms sub-window
        let samples = vec![0.3f32; SAMPLE_RATE as usize / 2];
        assert!(!vad.detect(&samples, SAMPLE_RATE, 1000));
    }

    #[test]
    fn test_high_pass_removes_dc_offset() {
        let mut samples = vec![0.8f32; SAMPLE_RATE as usize];
        high_pass_filter(&mut samples, 100.0, SAMPLE_RATE);
        // constant input decays towards zero after the filter settles
        let tail = &samples[samples.len() - 1600..];
        assert!(rms(tail) < 0.05, "DC offset should be filtered out");
    }

    #[test]
    fn test_high_pass_keeps_audio_band() {
        let mut samples: Vec<f32> = (0..SAMPLE_RATE as usize)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                0.5 * (2.0 * std::f32::consts::PI * 1000.0 * t).sin()
            })
            .collect();
        let before = rms(&samples);
        high_pass_filter(&mut samples, 100.0, SAMPLE_RATE);
        let after = rms(&samples);
        assert!(after > 0.8 * before, "1kHz content should pass the filter");
    }
}
