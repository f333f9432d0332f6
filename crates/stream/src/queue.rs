//! Cross-thread hand-off of finalized sentences.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// FIFO queue of finalized sentence strings, shared between the controller
/// and a consumer thread.
///
/// The producer pushes under the mutex and signals one waiting consumer; the
/// consumer re-checks non-emptiness on every wake, so spurious wakes are
/// harmless. Closing the queue unblocks all waiters once drained.
pub struct SentenceQueue {
    inner: Mutex<QueueInner>,
    cv: Condvar,
}

struct QueueInner {
    items: VecDeque<String>,
    closed: bool,
}

impl SentenceQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                closed: false,
            }),
            cv: Condvar::new(),
        }
    }

    /// Append a sentence and wake one waiting consumer.
    pub fn push(&self, sentence: String) {
        let mut inner = self.inner.lock().expect("sentence queue mutex poisoned");
        if inner.closed {
            tracing::debug!("sentence queue closed, dropping sentence");
            return;
        }
        inner.items.push_back(sentence);
        self.cv.notify_one();
    }

    /// Block until a sentence is available or the queue is closed and empty.
    pub fn pop(&self) -> Option<String> {
        let mut inner = self.inner.lock().expect("sentence queue mutex poisoned");
        loop {
            if let Some(sentence) = inner.items.pop_front() {
                return Some(sentence);
            }
            if inner.closed {
                return None;
            }
            inner = self
                .cv
                .wait(inner)
                .expect("sentence queue mutex poisoned");
        }
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("sentence queue mutex poisoned")
            .items
            .pop_front()
    }

    /// Close the queue: pending sentences stay poppable, then `pop` returns
    /// `None`. Further pushes are dropped.
    pub fn close(&self) {
        let mut inner = self.inner.lock().expect("sentence queue mutex poisoned");
        inner.closed = true;
        self.cv.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("sentence queue mutex poisoned")
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SentenceQueue {
    fn default() -> Self {
        Self::new()
    }
}
