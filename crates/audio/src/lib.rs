mod capture;
mod wav;

pub use capture::{CaptureBuffer, ChannelSource, SampleSource};
pub use wav::read_wav_mono_f32;

pub const SAMPLE_RATE: u32 = 16000;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to open wav file: {0}")]
    WavOpen(String),
    #[error("failed to decode wav file: {0}")]
    WavDecode(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;
