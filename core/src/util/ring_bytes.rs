use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Fixed-capacity byte buffer that keeps only the most recent bytes.
///
/// Child output is pushed chunk by chunk while the process runs, so memory
/// stays bounded no matter how chatty a check is.
#[derive(Debug)]
pub struct RingBytes {
    inner: Mutex<Inner>,
    cap: usize,
}

#[derive(Debug)]
struct Inner {
    buf: VecDeque<u8>,
    total: u64,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                buf: VecDeque::with_capacity(cap.min(64 * 1024)),
                total: 0,
            }),
            cap,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking pump must not take the captured output down with it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, data: &[u8]) {
        let mut g = self.lock();
        g.total = g.total.saturating_add(data.len() as u64);
        if self.cap == 0 {
            return;
        }
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.buf.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.buf.drain(..overflow);
        }
        g.buf.extend(data);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let g = self.lock();
        let mut vec = Vec::with_capacity(g.buf.len());
        vec.extend(g.buf.iter().copied());
        vec
    }

    /// Retained bytes decoded lossily; a split multi-byte char at the head
    /// becomes a replacement character.
    pub fn tail_string(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }

    /// Bytes seen since creation, including those already evicted.
    pub fn total_pushed(&self) -> u64 {
        self.lock().total
    }
}
