//! # Bounded log retention for supervised processes.
//!
//! [`LogRingBuffer`] keeps at most `capacity` bytes of the most recent output.
//! Appends beyond capacity discard the oldest bytes first, then advance to the
//! next UTF-8 character boundary so the retained window is always valid text.
//!
//! ```text
//! capacity = 8
//! append "hello "   → [hello ]
//! append "world!"   → [o world!]     (oldest 4 bytes dropped)
//! ```
//!
//! [`Utf8Chunker`] sits in front of it: raw pipe reads can split a multi-byte
//! character, so the incomplete tail of one read is carried into the next.

use std::collections::VecDeque;

/// Fixed-capacity text ring. Capacity never grows.
#[derive(Debug, Clone)]
pub struct LogRingBuffer {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl LogRingBuffer {
    /// Creates an empty buffer holding at most `capacity` bytes (min 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity.min(64 * 1024)),
            capacity,
        }
    }

    /// Appends text, evicting the oldest content if needed.
    pub fn push_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        // Only the tail of an oversized chunk can survive.
        let bytes = if bytes.len() > self.capacity {
            &bytes[bytes.len() - self.capacity..]
        } else {
            bytes
        };
        self.buf.extend(bytes);

        if self.buf.len() > self.capacity {
            let excess = self.buf.len() - self.capacity;
            self.buf.drain(..excess);
        }
        // Never start the window in the middle of a character.
        while self.buf.front().is_some_and(|b| is_continuation(*b)) {
            self.buf.pop_front();
        }
    }

    /// Returns the retained window in original order.
    pub fn snapshot(&self) -> String {
        let (a, b) = self.buf.as_slices();
        let mut out = Vec::with_capacity(a.len() + b.len());
        out.extend_from_slice(a);
        out.extend_from_slice(b);
        match String::from_utf8(out) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    /// Retained bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum retained bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[inline]
fn is_continuation(b: u8) -> bool {
    b & 0b1100_0000 == 0b1000_0000
}

/// Turns raw byte reads into complete UTF-8 text chunks.
#[derive(Debug, Default)]
pub struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `bytes` (prefixed with any carried tail).
    ///
    /// Invalid sequences become U+FFFD; an incomplete sequence at the very end
    /// is held back for the next call. Returns `None` if nothing is decodable yet.
    pub fn push(&mut self, bytes: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(n) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[n..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        if out.is_empty() { None } else { Some(out) }
    }

    /// Flushes a dangling incomplete sequence at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(tail)
    }
}
