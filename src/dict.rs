//! LZ77 history dictionary backed directly by the output buffer.
//!
//! Rust port of `minilzlib/dictbuf.c` (`DtInitialize`, `DtSetLimit`,
//! `DtPutSymbol`, `DtGetSymbol`, `DtRepeatSymbol`, `DtCanWrite`,
//! `DtIsComplete`). The output write region doubles as the LZMA back-reference
//! window: there is no separate ring buffer.

use crate::error::{BootCodecError, Result};

pub struct HistoryDict<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    start: usize,
    limit: usize,
}

impl<'a> HistoryDict<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        HistoryDict {
            buffer,
            offset: 0,
            start: 0,
            limit: 0,
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bounds the next chunk to `n` bytes starting at the current offset.
    pub fn set_limit(&mut self, n: usize) -> Result<()> {
        let limit = self
            .offset
            .checked_add(n)
            .ok_or(BootCodecError::OutputOverflow("dictionary limit overflow"))?;
        if limit > self.buffer.len() {
            return Err(BootCodecError::OutputOverflow(
                "dictionary limit exceeds output buffer",
            ));
        }
        self.start = self.offset;
        self.limit = limit;
        Ok(())
    }

    /// Writes one byte and advances the offset. Caller must have reserved space via `set_limit`.
    pub fn put(&mut self, symbol: u8) -> Result<()> {
        if self.offset >= self.limit {
            return Err(BootCodecError::OutputOverflow("write past dictionary limit"));
        }
        self.buffer[self.offset] = symbol;
        self.offset += 1;
        Ok(())
    }

    /// Returns the byte at `distance` bytes behind the current offset, or `0`
    /// if `distance` exceeds the offset (the dictionary is conceptually
    /// zero-filled before any writes).
    pub fn get(&self, distance: usize) -> u8 {
        if distance <= self.offset {
            self.buffer[self.offset - distance]
        } else {
            0
        }
    }

    /// Appends `length` bytes by repeatedly copying the byte at `distance`.
    /// Fails if it would cross the limit, or if `distance` exceeds the offset
    /// at entry (an implicit-zero read is never valid for a back-reference).
    pub fn repeat(&mut self, length: usize, distance: usize) -> Result<()> {
        if distance > self.offset {
            return Err(BootCodecError::InconsistentSize(
                "back-reference distance exceeds offset",
            ));
        }
        for _ in 0..length {
            let b = self.get(distance);
            self.put(b)?;
        }
        Ok(())
    }

    /// Returns `true` if more bytes may still be written within the current chunk.
    pub fn can_write(&self) -> bool {
        self.offset < self.limit
    }

    /// Returns `true` if the current chunk has been fully written, and how many
    /// bytes were produced since `set_limit` was called.
    pub fn is_complete(&self) -> (bool, usize) {
        (self.offset == self.limit, self.offset - self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get_roundtrip() {
        let mut buf = [0u8; 8];
        let mut dict = HistoryDict::new(&mut buf);
        dict.set_limit(4).unwrap();
        dict.put(b'a').unwrap();
        dict.put(b'b').unwrap();
        assert_eq!(dict.get(1), b'b');
        assert_eq!(dict.get(2), b'a');
        assert_eq!(dict.get(3), 0);
    }

    #[test]
    fn repeat_rejects_distance_past_offset() {
        let mut buf = [0u8; 8];
        let mut dict = HistoryDict::new(&mut buf);
        dict.set_limit(4).unwrap();
        assert!(dict.repeat(2, 1).is_err());
    }

    #[test]
    fn repeat_overlapping_copy() {
        let mut buf = [0u8; 8];
        let mut dict = HistoryDict::new(&mut buf);
        dict.set_limit(8).unwrap();
        dict.put(b'x').unwrap();
        dict.repeat(4, 1).unwrap();
        assert_eq!(&buf[..5], b"xxxxx");
    }

    #[test]
    fn is_complete_reports_produced_bytes() {
        let mut buf = [0u8; 4];
        let mut dict = HistoryDict::new(&mut buf);
        dict.set_limit(3).unwrap();
        dict.put(1).unwrap();
        dict.put(2).unwrap();
        assert_eq!(dict.is_complete(), (false, 2));
        dict.put(3).unwrap();
        assert_eq!(dict.is_complete(), (true, 3));
    }
}
