//! Capture-side sample buffering.
//!
//! The controller never talks to a platform capture API directly; it pulls
//! from a [`SampleSource`], which any capture thread (microphone callback,
//! file replay, test fixture) can stand behind.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::SAMPLE_RATE;

/// Provider of buffered capture audio.
///
/// `acquire` returns up to the requested duration's worth of samples, possibly
/// fewer (including none) when the buffer is running dry. `clear` discards
/// everything currently buffered. Both must be callable from the controller
/// thread while a producer keeps pushing.
pub trait SampleSource: Send + Sync {
    fn acquire(&self, duration: Duration) -> Vec<f32>;
    fn clear(&self);
}

fn samples_for(duration: Duration) -> usize {
    (duration.as_millis() as usize * SAMPLE_RATE as usize) / 1000
}

/// Bounded circular sample buffer shared between a capture thread and the
/// controller.
///
/// Producers call [`CaptureBuffer::push`]; the controller consumes through the
/// [`SampleSource`] trait. When the buffer is full the oldest samples are
/// dropped so the retained audio always ends at "now".
pub struct CaptureBuffer {
    samples: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl CaptureBuffer {
    /// Create a buffer holding at most `capacity_ms` of audio.
    pub fn new(capacity_ms: u32) -> Self {
        let capacity = (capacity_ms as usize * SAMPLE_RATE as usize) / 1000;
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, new_samples: &[f32]) {
        let mut samples = self.samples.lock().expect("capture buffer mutex poisoned");
        samples.extend(new_samples.iter().copied());

        let excess = samples.len().saturating_sub(self.capacity);
        if excess > 0 {
            samples.drain(..excess);
            tracing::warn!(excess, "capture buffer overflow, dropped oldest samples");
        }
    }

    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .expect("capture buffer mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis((self.len() as u64 * 1000) / SAMPLE_RATE as u64)
    }
}

impl SampleSource for CaptureBuffer {
    fn acquire(&self, duration: Duration) -> Vec<f32> {
        let want = samples_for(duration);
        let mut samples = self.samples.lock().expect("capture buffer mutex poisoned");
        let take = want.min(samples.len());
        samples.drain(..take).collect()
    }

    fn clear(&self) {
        self.samples
            .lock()
            .expect("capture buffer mutex poisoned")
            .clear();
    }
}

impl Clone for CaptureBuffer {
    fn clone(&self) -> Self {
        Self {
            samples: Arc::clone(&self.samples),
            capacity: self.capacity,
        }
    }
}

/// Adapter from a channel-fed capture stream to a [`SampleSource`].
///
/// Capture backends that deliver chunks over a `crossbeam_channel` (the usual
/// shape of a device-callback hand-off) plug in here: each `acquire`/`clear`
/// first drains whatever the producer has sent, then operates on the backing
/// buffer.
pub struct ChannelSource {
    rx: Receiver<Vec<f32>>,
    buffer: CaptureBuffer,
}

impl ChannelSource {
    pub fn new(rx: Receiver<Vec<f32>>, capacity_ms: u32) -> Self {
        Self {
            rx,
            buffer: CaptureBuffer::new(capacity_ms),
        }
    }

    fn drain_channel(&self) {
        for chunk in self.rx.try_iter() {
            self.buffer.push(&chunk);
        }
    }
}

impl SampleSource for ChannelSource {
    fn acquire(&self, duration: Duration) -> Vec<f32> {
        self.drain_channel();
        self.buffer.acquire(duration)
    }

    fn clear(&self) {
        self.drain_channel();
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_acquire() {
        let buffer = CaptureBuffer::new(30_000);
        buffer.push(&[0.1; 16000]); // 1 second

        let got = buffer.acquire(Duration::from_millis(500));
        assert_eq!(got.len(), 8000);
        assert_eq!(buffer.len(), 8000);
        assert_eq!(buffer.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_acquire_returns_fewer_when_dry() {
        let buffer = CaptureBuffer::new(30_000);
        buffer.push(&[0.1; 1000]);

        let got = buffer.acquire(Duration::from_millis(1000));
        assert_eq!(got.len(), 1000);
        assert!(buffer.is_empty());

        let got = buffer.acquire(Duration::from_millis(1000));
        assert!(got.is_empty());
    }

    #[test]
    fn test_clear_discards_everything() {
        let buffer = CaptureBuffer::new(30_000);
        buffer.push(&[0.1; 16000]);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let buffer = CaptureBuffer::new(1000); // 16000 samples max
        buffer.push(&[1.0; 16000]);
        buffer.push(&[2.0; 8000]);

        assert_eq!(buffer.len(), 16000);
        let got = buffer.acquire(Duration::from_millis(1000));
        // the newest 8000 samples must have survived at the tail
        assert_eq!(got[got.len() - 1], 2.0);
        assert_eq!(got[0], 1.0);
    }

    #[test]
    fn test_shared_clone_sees_pushes() {
        let buffer = CaptureBuffer::new(30_000);
        let producer = buffer.clone();

        let handle = std::thread::spawn(move || {
            producer.push(&[0.5; 4000]);
        });
        handle.join().unwrap();

        assert_eq!(buffer.len(), 4000);
    }

    #[test]
    fn test_channel_source_drains_producer() {
        let (tx, rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        let source = ChannelSource::new(rx, 30_000);

        tx.send(vec![0.1; 8000]).unwrap();
        tx.send(vec![0.2; 8000]).unwrap();

        let got = source.acquire(Duration::from_millis(1000));
        assert_eq!(got.len(), 16000);

        tx.send(vec![0.3; 8000]).unwrap();
        source.clear();
        let got = source.acquire(Duration::from_millis(1000));
        assert!(got.is_empty());
    }
}
