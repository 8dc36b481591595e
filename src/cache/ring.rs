//! Circular Log Module
//!
//! Fixed-capacity byte store addressed by monotonically increasing logical
//! offsets. Appends wrap physically; once the window `[begin, end)` slides
//! past an offset, its bytes are gone for good and the offset is never
//! handed out again.

use std::fmt;

use crate::error::{CacheError, Result};

// == Circular Log ==
/// Append-only byte log over a fixed circular buffer.
pub struct CircularLog {
    /// Oldest logical offset still addressable
    begin: u64,
    /// Logical offset one past the newest byte
    end: u64,
    /// Physical write position within `data`
    cursor: usize,
    /// Backing storage, allocated once
    data: Box<[u8]>,
}

impl CircularLog {
    // == Constructor ==
    /// Creates an empty log backed by `capacity` bytes of storage.
    pub fn new(capacity: usize) -> Self {
        Self {
            begin: 0,
            end: 0,
            cursor: 0,
            data: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    /// Total byte capacity of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Oldest addressable logical offset.
    pub fn begin(&self) -> u64 {
        self.begin
    }

    /// Logical offset the next append will start at.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of addressable bytes, at most `capacity`.
    pub fn len(&self) -> usize {
        (self.end - self.begin) as usize
    }

    /// True when nothing has been written since construction or reset.
    pub fn is_empty(&self) -> bool {
        self.end == self.begin
    }

    // == Physical Mapping ==
    /// Maps a logical offset inside `[begin, end)` to its slot in `data`.
    ///
    /// Until the first wraparound `begin` sits at physical zero; afterwards
    /// it sits at the write cursor, which is about to overwrite it.
    fn position(&self, offset: u64) -> usize {
        let mut pos = if self.len() < self.data.len() {
            (offset - self.begin) as usize
        } else {
            self.cursor + (offset - self.begin) as usize
        };
        if pos >= self.data.len() {
            pos -= self.data.len();
        }
        pos
    }

    // == Write ==
    /// Appends `bytes` at the cursor and returns the logical offset of the
    /// first byte written.
    ///
    /// Advances `end` past the appended bytes and, once the window would
    /// exceed capacity, drags `begin` along with it, silently discarding
    /// the oldest bytes.
    ///
    /// # Errors
    /// `OutOfRange` when `bytes` is longer than the whole log.
    pub fn write(&mut self, bytes: &[u8]) -> Result<u64> {
        if bytes.len() > self.data.len() {
            return Err(self.out_of_range(self.end, bytes.len()));
        }
        let offset = self.end;
        let mut written = 0;
        while written < bytes.len() {
            let chunk = (bytes.len() - written).min(self.data.len() - self.cursor);
            self.data[self.cursor..self.cursor + chunk]
                .copy_from_slice(&bytes[written..written + chunk]);
            self.cursor += chunk;
            written += chunk;
            if self.cursor == self.data.len() {
                self.cursor = 0;
            }
        }
        self.end += bytes.len() as u64;
        if self.end - self.begin > self.data.len() as u64 {
            self.begin = self.end - self.data.len() as u64;
        }
        Ok(offset)
    }

    // == Write At ==
    /// Overwrites bytes in place at a logical offset inside the window.
    ///
    /// Never moves `begin`, `end`, or the cursor.
    ///
    /// # Errors
    /// `OutOfRange` when any part of the span falls outside `[begin, end)`.
    pub fn write_at(&mut self, bytes: &[u8], offset: u64) -> Result<()> {
        if offset < self.begin || offset + bytes.len() as u64 > self.end {
            return Err(self.out_of_range(offset, bytes.len()));
        }
        let pos = self.position(offset);
        let head = bytes.len().min(self.data.len() - pos);
        self.data[pos..pos + head].copy_from_slice(&bytes[..head]);
        self.data[..bytes.len() - head].copy_from_slice(&bytes[head..]);
        Ok(())
    }

    // == Read At ==
    /// Fills `buf` with the bytes starting at a logical offset.
    ///
    /// # Errors
    /// `OutOfRange` when any part of the span falls outside `[begin, end)`.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        if offset < self.begin || offset + buf.len() as u64 > self.end {
            return Err(self.out_of_range(offset, buf.len()));
        }
        let pos = self.position(offset);
        let head = buf.len().min(self.data.len() - pos);
        buf[..head].copy_from_slice(&self.data[pos..pos + head]);
        let tail = buf.len() - head;
        buf[head..].copy_from_slice(&self.data[..tail]);
        Ok(())
    }

    // == Equal At ==
    /// Compares `candidate` against the bytes at `offset` without copying.
    ///
    /// Spans outside the window compare unequal, which is what lets stale
    /// pointers fail key comparison instead of matching recycled bytes.
    pub fn equal_at(&self, candidate: &[u8], offset: u64) -> bool {
        if offset < self.begin || offset + candidate.len() as u64 > self.end {
            return false;
        }
        let pos = self.position(offset);
        let head = candidate.len().min(self.data.len() - pos);
        candidate[..head] == self.data[pos..pos + head]
            && candidate[head..] == self.data[..candidate.len() - head]
    }

    // == Skip ==
    /// Advances the cursor `len` bytes without storing anything, claiming
    /// window space for the current record's slack.
    pub fn skip(&mut self, len: usize) {
        self.end += len as u64;
        self.cursor += len;
        while self.cursor >= self.data.len() {
            self.cursor -= self.data.len();
        }
        if self.end - self.begin > self.data.len() as u64 {
            self.begin = self.end - self.data.len() as u64;
        }
    }

    // == Reset ==
    /// Returns the log to its freshly constructed state.
    ///
    /// Every previously issued offset becomes unaddressable, so callers
    /// must drop their pointers in the same breath.
    pub fn reset(&mut self) {
        self.begin = 0;
        self.end = 0;
        self.cursor = 0;
    }

    fn out_of_range(&self, offset: u64, len: usize) -> CacheError {
        CacheError::OutOfRange {
            offset,
            len,
            begin: self.begin,
            end: self.end,
        }
    }
}

impl fmt::Debug for CircularLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularLog")
            .field("capacity", &self.data.len())
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("cursor", &self.cursor)
            .finish()
    }
}
