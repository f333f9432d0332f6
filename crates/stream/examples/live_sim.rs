//! End-to-end simulation of the streaming pipeline without a real microphone
//! or model: a producer thread feeds synthetic audio into a capture buffer
//! while a stub engine "transcribes" each window.
//!
//! Run with: `cargo run --example live_sim`

use std::sync::Arc;
use std::time::Duration;

use murmur_audio::{CaptureBuffer, SampleSource};
use murmur_stream::{SentenceQueue, StopSignal, StreamConfig, StreamController};
use murmur_stt::{DecodeOptions, Segment, SttEngine, STT_SAMPLE_RATE};

/// Pretends to transcribe by describing the window it was handed.
struct StubEngine;

impl SttEngine for StubEngine {
    fn transcribe(
        &self,
        samples: &[f32],
        options: &DecodeOptions,
    ) -> murmur_stt::Result<Vec<Segment>> {
        let duration_cs = (samples.len() as i64 * 100) / STT_SAMPLE_RATE as i64;
        let text = format!(
            "({} samples, context {} tokens)",
            samples.len(),
            options.prompt_tokens.len()
        );
        Ok(vec![Segment {
            text,
            start_cs: 0,
            end_cs: duration_cs,
            tokens: vec![1, 2, 3],
            speaker_turn_next: false,
        }])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = StreamConfig {
        step_ms: 1000,
        window_ms: 4000,
        keep_ms: 200,
        keep_context: true,
        ..Default::default()
    };

    let buffer = Arc::new(CaptureBuffer::new(30_000));
    let queue = Arc::new(SentenceQueue::new());
    let stop = StopSignal::new();

    // Producer: 100ms chunks of a wandering tone at real-time rate.
    let producer_buffer = buffer.clone();
    let producer_stop = stop.clone();
    let producer = std::thread::spawn(move || {
        let chunk = STT_SAMPLE_RATE as usize / 10;
        let mut phase = 0f32;
        while !producer_stop.wait_for(Duration::from_millis(100)) {
            let samples: Vec<f32> = (0..chunk)
                .map(|_| {
                    phase += 2.0 * std::f32::consts::PI * 330.0 / STT_SAMPLE_RATE as f32;
                    0.3 * phase.sin()
                })
                .collect();
            producer_buffer.push(&samples);
        }
    });

    // Consumer: prints each finalized sentence popped from the queue.
    let consumer_queue = queue.clone();
    let consumer = std::thread::spawn(move || {
        while let Some(sentence) = consumer_queue.pop() {
            println!(">>> finalized: {sentence}");
        }
    });

    let source: Arc<dyn SampleSource> = buffer.clone();
    let controller = StreamController::new(
        config,
        Arc::new(StubEngine),
        source,
        queue,
        stop.clone(),
    )?;

    // Let the session run for a few seconds, then shut down.
    let runner_stop = stop.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(8));
        runner_stop.request_stop();
    });

    controller.run()?;

    producer.join().expect("producer thread panicked");
    consumer.join().expect("consumer thread panicked");
    Ok(())
}
