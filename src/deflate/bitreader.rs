//! LSB-first bit reader over an input cursor.
//!
//! Rust port of the `tinf_data` bit-buffer fields and `tinf_getbit`/
//! `tinf_read_bits` from `tinf/tinflate.c`.

use crate::error::{BootCodecError, Result};
use crate::input::InputCursor;

pub struct BitReader<'a, 'b> {
    input: &'a mut InputCursor<'b>,
    tag: u32,
    bit_count: u32,
}

impl<'a, 'b> BitReader<'a, 'b> {
    pub fn new(input: &'a mut InputCursor<'b>) -> Self {
        BitReader {
            input,
            tag: 0,
            bit_count: 0,
        }
    }

    pub fn input_mut(&mut self) -> &mut InputCursor<'b> {
        self.input
    }

    fn refill(&mut self) -> Result<()> {
        if self.bit_count == 0 {
            self.tag = self.input.read_byte()? as u32;
            self.bit_count = 8;
        }
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<u32> {
        self.refill()?;
        let bit = self.tag & 1;
        self.tag >>= 1;
        self.bit_count -= 1;
        Ok(bit)
    }

    pub fn read_bits(&mut self, num: u32) -> Result<u32> {
        let mut value = 0u32;
        for i in 0..num {
            value |= self.read_bit()? << i;
        }
        Ok(value)
    }

    /// Discards any partial byte in the bit buffer, returning the cursor to a
    /// byte boundary (used before a stored/uncompressed DEFLATE block).
    pub fn align_to_byte(&mut self) {
        self.tag = 0;
        self.bit_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bits_lsb_first() {
        let data = [0b1011_0100u8];
        let mut input = InputCursor::new(&data);
        let mut br = BitReader::new(&mut input);
        assert_eq!(br.read_bits(4).unwrap(), 0b0100);
        assert_eq!(br.read_bits(4).unwrap(), 0b1011);
    }

    #[test]
    fn align_discards_partial_byte() {
        let data = [0xFFu8, 0x00];
        let mut input = InputCursor::new(&data);
        let mut br = BitReader::new(&mut input);
        br.read_bits(3).unwrap();
        br.align_to_byte();
        assert_eq!(br.read_bits(8).unwrap(), 0);
    }
}
