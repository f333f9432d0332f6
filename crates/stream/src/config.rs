//! Per-run configuration for a streaming session.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use murmur_stt::STT_SAMPLE_RATE;

/// Language codes the engine family understands, used to reject typos at
/// startup instead of mid-run.
pub const LANGUAGES: &[&str] = &[
    "en", "zh", "de", "es", "ru", "ko", "fr", "ja", "pt", "tr", "pl", "ca", "nl", "ar", "sv", "it",
    "id", "hi", "fi", "vi", "he", "uk", "el", "ms", "cs", "ro", "da", "hu", "ta", "no", "th", "ur",
    "hr", "bg", "lt", "la", "mi", "ml", "cy", "sk", "te", "fa", "lv", "bn", "sr", "az", "sl", "kn",
    "et", "mk", "br", "eu", "is", "hy", "ne", "mn", "bs", "kk", "sq", "sw", "gl", "mr", "pa", "si",
    "km", "sn", "yo", "so", "af", "oc", "ka", "be", "tg", "sd", "gu", "am", "yi", "lo", "uz", "fo",
    "ht", "ps", "tk", "nn", "mt", "sa", "lb", "my", "bo", "tl", "mg", "as", "tt", "haw", "ln",
    "ha", "ba", "jw", "su",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown language code '{0}'")]
    UnknownLanguage(String),
    #[error("failed to open output file '{path}': {source}")]
    OutputFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Immutable per-run configuration.
///
/// A non-positive `step_ms` selects VAD-gated mode; otherwise the controller
/// runs a fixed-step sliding window. Durations convert to sample counts at a
/// fixed 16kHz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub n_threads: usize,
    /// New audio consumed per chunk in fixed-step mode, in milliseconds.
    pub step_ms: i32,
    /// Full window length in milliseconds.
    pub window_ms: i32,
    /// Trailing audio carried across a boundary reset, in milliseconds.
    pub keep_ms: i32,
    /// Capture device identifier (-1 = default device).
    pub capture_id: i32,
    /// Maximum tokens per chunk (0 = unlimited).
    pub max_tokens: u32,
    /// Encoder context size hint (0 = full).
    pub audio_ctx: u32,
    /// VAD energy threshold.
    pub vad_threshold: f32,
    /// VAD high-pass cutoff frequency in Hz.
    pub freq_cutoff: f32,
    pub translate: bool,
    /// Disable temperature fallback while decoding.
    pub no_fallback: bool,
    pub print_special: bool,
    /// Ask the engine for its 2x speed-up decoding path.
    pub speed_up: bool,
    /// Carry decoding context (prompt tokens) across boundary resets.
    pub keep_context: bool,
    /// Suppress per-segment timestamps in the output.
    pub no_timestamps: bool,
    /// Language code, or "auto" to let the engine detect.
    pub language: String,
    /// Model identifier handed to the engine loader.
    pub model: String,
    /// Optional transcript output file.
    pub output_path: Option<PathBuf>,
    /// Enable speaker-turn diarization.
    pub diarize: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            n_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .min(4),
            step_ms: 3000,
            window_ms: 10000,
            keep_ms: 200,
            capture_id: -1,
            max_tokens: 32,
            audio_ctx: 0,
            vad_threshold: 0.6,
            freq_cutoff: 100.0,
            translate: false,
            no_fallback: false,
            print_special: false,
            speed_up: false,
            keep_context: false,
            no_timestamps: false,
            language: "en".to_string(),
            model: String::new(),
            output_path: None,
            diarize: false,
        }
    }
}

impl StreamConfig {
    /// VAD-gated mode is selected by disabling the sliding-window step.
    pub fn use_vad(&self) -> bool {
        self.step_ms <= 0
    }

    /// Check startup-fatal conditions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language != "auto" && !LANGUAGES.contains(&self.language.as_str()) {
            return Err(ConfigError::UnknownLanguage(self.language.clone()));
        }
        Ok(())
    }

    /// Apply the invariants the controller relies on.
    ///
    /// The keep window can never exceed a step, the full window can never be
    /// shorter than a step, and VAD mode always suppresses fine-grained
    /// timestamps and decoding context since each chunk is an independent
    /// utterance.
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        config.keep_ms = config.keep_ms.min(config.step_ms);
        config.window_ms = config.window_ms.max(config.step_ms);
        if config.use_vad() {
            config.no_timestamps = true;
            config.keep_context = false;
        }
        config
    }

    /// Iterations between boundary resets: the number of steps needed to fill
    /// one full window.
    pub fn n_new_line(&self) -> usize {
        if self.use_vad() {
            1
        } else {
            ((self.window_ms / self.step_ms - 1).max(1)) as usize
        }
    }

    pub fn step_samples(&self) -> usize {
        samples_for_ms(self.step_ms)
    }

    pub fn window_samples(&self) -> usize {
        samples_for_ms(self.window_ms)
    }

    pub fn keep_samples(&self) -> usize {
        samples_for_ms(self.keep_ms)
    }
}

fn samples_for_ms(ms: i32) -> usize {
    (ms.max(0) as usize * STT_SAMPLE_RATE as usize) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_expected_cadence() {
        let config = StreamConfig::default();
        assert_eq!(config.step_ms, 3000);
        assert_eq!(config.window_ms, 10000);
        assert_eq!(config.keep_ms, 200);
        assert!(!config.use_vad());
        // step=3000, window=10000 => max(1, 3 - 1) = 2
        assert_eq!(config.n_new_line(), 2);
    }

    #[test]
    fn test_keep_clamped_to_step() {
        let config = StreamConfig {
            step_ms: 1000,
            keep_ms: 5000,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.keep_ms, 1000);
    }

    #[test]
    fn test_window_stretched_to_step() {
        let config = StreamConfig {
            step_ms: 20000,
            window_ms: 10000,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.window_ms, 20000);
        assert_eq!(config.n_new_line(), 1);
    }

    #[test]
    fn test_vad_mode_disables_timestamps_and_context() {
        let config = StreamConfig {
            step_ms: 0,
            keep_context: true,
            no_timestamps: false,
            ..Default::default()
        }
        .normalized();
        assert!(config.use_vad());
        assert!(config.no_timestamps);
        assert!(!config.keep_context);
        assert_eq!(config.n_new_line(), 1);
    }

    #[test]
    fn test_sample_conversion() {
        let config = StreamConfig::default();
        assert_eq!(config.step_samples(), 48000);
        assert_eq!(config.window_samples(), 160000);
        assert_eq!(config.keep_samples(), 3200);
    }

    #[test]
    fn test_unknown_language_rejected() {
        let config = StreamConfig {
            language: "klingon".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_auto_language_accepted() {
        let config = StreamConfig {
            language: "auto".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
