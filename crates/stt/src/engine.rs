use serde::{Deserialize, Serialize};

/// Standard sample rate for STT processing.
pub const STT_SAMPLE_RATE: u32 = 16000;

/// Token identifier in the engine's vocabulary.
pub type TokenId = i32;

/// One timed unit of transcribed text returned by the engine for a window.
///
/// Timestamps are centisecond offsets from the start of the window, matching
/// the resolution the output sink formats at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start_cs: i64,
    pub end_cs: i64,
    /// Token ids of this segment, fed back as decoding context across chunks.
    pub tokens: Vec<TokenId>,
    /// True when the diarizer signals a speaker change after this segment.
    pub speaker_turn_next: bool,
}

/// Per-call decoding configuration handed to the engine with each window.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Spoken language code, or `None` for auto-detection.
    pub language: Option<String>,
    /// Translate from the source language to English.
    pub translate: bool,
    /// Force the whole window to decode as one continuous utterance.
    pub single_segment: bool,
    /// Maximum tokens to emit per chunk (0 = unlimited).
    pub max_tokens: u32,
    /// Prior-segment tokens used as the decoding prompt. Empty = no context.
    pub prompt_tokens: Vec<TokenId>,
    pub n_threads: usize,
    /// Encoder context size hint (0 = full).
    pub audio_ctx: u32,
    /// Enable speaker-turn diarization.
    pub diarize: bool,
    /// Allow temperature fallback when decoding stalls.
    pub temperature_fallback: bool,
    /// Emit special tokens in segment text.
    pub print_special: bool,
    /// Trade accuracy for the engine's 2x speed-up decoding path.
    pub speed_up: bool,
}

/// Black-box transcription capability.
///
/// Implementations must be safe to call from the controller thread; the
/// pipeline never issues concurrent calls on one engine. A returned error is
/// fatal to the run: the window's audio has already been consumed, so there
/// is nothing to retry.
pub trait SttEngine: Send + Sync {
    /// Transcribe a window of mono f32 samples (expected at 16kHz).
    fn transcribe(&self, samples: &[f32], options: &DecodeOptions) -> crate::Result<Vec<Segment>>;
}
