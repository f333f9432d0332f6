//! Streaming segmentation and windowing controller.
//!
//! Pulls short audio segments from a capture source, assembles overlapping
//! windows, feeds them to a transcription engine and emits timestamped
//! transcript segments as speech arrives. Two operating modes: fixed-step
//! sliding window and VAD-gated chunking.

mod config;
mod controller;
mod queue;
mod signal;
mod sink;

pub use config::{ConfigError, StreamConfig, LANGUAGES};
pub use controller::StreamController;
pub use queue::SentenceQueue;
pub use signal::StopSignal;
pub use sink::{format_timestamp, TranscriptSink};

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("transcription engine failed: {0}")]
    Engine(#[from] murmur_stt::SttError),
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StreamError>;
