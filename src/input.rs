//! Windowed read cursor over a caller-owned byte slice.
//!
//! Rust port of `minilzlib/inputbuf.c` (`BfInitialize`, `BfSeek`, `BfRead`,
//! `BfTell`, `BfAlign`, `BfSetSoftLimit`, `BfResetSoftLimit`). The cursor never
//! reads past its current soft limit, which callers narrow to scope a single
//! compressed chunk and restore afterward.

use crate::error::{BootCodecError, Result};

pub struct InputCursor<'a> {
    buffer: &'a [u8],
    offset: usize,
    soft_limit: usize,
}

impl<'a> InputCursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        let size = buffer.len();
        InputCursor {
            buffer,
            offset: 0,
            soft_limit: size,
        }
    }

    #[inline]
    pub fn tell(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.soft_limit - self.offset
    }

    /// Returns a previously-read span for re-verification (e.g. a CRC32 over
    /// header bytes already walked past).
    pub fn span(&self, start: usize, len: usize) -> &'a [u8] {
        &self.buffer[start..start + len]
    }

    /// Returns the next byte without advancing the cursor.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.offset >= self.soft_limit {
            return Err(BootCodecError::Truncated("peek past soft limit"));
        }
        Ok(self.buffer[self.offset])
    }

    /// Advances the cursor by `len` bytes and returns a slice of the bytes skipped.
    /// Fails if the advance would cross the soft limit.
    pub fn seek(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(BootCodecError::Truncated("seek overflow"))?;
        if end > self.soft_limit {
            return Err(BootCodecError::Truncated("seek past soft limit"));
        }
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.seek(1)?[0])
    }

    /// Reads zero-padding bytes until the offset is a multiple of four.
    /// Fails if any pad byte is non-zero.
    pub fn align_to_four(&mut self) -> Result<()> {
        while self.offset % 4 != 0 {
            if self.read_byte()? != 0 {
                return Err(BootCodecError::MalformedHeader("non-zero alignment pad"));
            }
        }
        Ok(())
    }

    /// Narrows the soft limit to `offset + n`. Asserts `n <= size - offset`.
    pub fn set_soft_limit(&mut self, n: usize) -> Result<()> {
        if n > self.buffer.len() - self.offset {
            return Err(BootCodecError::Truncated("soft limit exceeds buffer"));
        }
        self.soft_limit = self.offset + n;
        Ok(())
    }

    pub fn reset_soft_limit(&mut self) {
        self.soft_limit = self.buffer.len();
    }

    /// Scopes the soft limit to `n` bytes ahead for the duration of the closure,
    /// restoring the previous limit afterward regardless of outcome.
    pub fn with_soft_limit<T>(
        &mut self,
        n: usize,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = self.soft_limit;
        self.set_soft_limit(n)?;
        let result = f(self);
        self.soft_limit = previous;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_respects_soft_limit() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cur = InputCursor::new(&data);
        cur.set_soft_limit(3).unwrap();
        assert!(cur.seek(3).is_ok());
        assert!(cur.seek(1).is_err());
        cur.reset_soft_limit();
        assert_eq!(cur.seek(1).unwrap(), &[4]);
    }

    #[test]
    fn align_rejects_nonzero_pad() {
        let data = [0u8, 0, 1, 0];
        let mut cur = InputCursor::new(&data);
        cur.seek(1).unwrap();
        assert!(cur.align_to_four().is_ok());
        cur.seek(1).unwrap();
        assert!(cur.align_to_four().is_err());
    }

    #[test]
    fn with_soft_limit_restores_previous() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut cur = InputCursor::new(&data);
        cur.with_soft_limit(2, |c| c.seek(2)).unwrap();
        assert_eq!(cur.remaining(), 4);
    }
}
