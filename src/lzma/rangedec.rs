//! Adaptive binary range (arithmetic) decoder.
//!
//! Rust port of `minilzlib/rangedec.c`. Operates directly against an
//! [`InputCursor`](crate::input::InputCursor) scoped to the current LZMA2
//! chunk's compressed-size soft limit.

use crate::error::{BootCodecError, Result};
use crate::input::InputCursor;

pub const PROB_BITS: u32 = 11;
pub const MAX_PROB: u16 = 1 << PROB_BITS;
pub const HALF_PROB: u16 = MAX_PROB / 2;
const MIN_RANGE: u32 = 1 << 24;
const INIT_BYTES: usize = 5;
const ADAPT_SHIFT: u32 = 5;

/// An 11-bit adaptive probability, stored in a 16-bit cell initialised to the midpoint.
pub type Prob = u16;

pub struct RangeDecoder {
    range: u32,
    code: u32,
}

impl RangeDecoder {
    /// Reads the five-byte range-coder prefix from `input` and primes the
    /// decoder. `chunk_size` is the number of compressed bytes remaining in
    /// this chunk; it is decremented by the five priming bytes so callers can
    /// compare consumed bytes against the declared size at completion.
    pub fn init(input: &mut InputCursor<'_>, chunk_size: &mut usize) -> Result<Self> {
        if *chunk_size < INIT_BYTES {
            return Err(BootCodecError::Truncated("range coder prefix truncated"));
        }
        let mut code: u32 = 0;
        for _ in 0..INIT_BYTES {
            code = (code << 8) | input.read_byte()? as u32;
        }
        *chunk_size -= INIT_BYTES;
        Ok(RangeDecoder {
            range: 0xFFFF_FFFF,
            code,
        })
    }

    fn normalize(&mut self, input: &mut InputCursor<'_>) -> Result<()> {
        if self.range < MIN_RANGE {
            self.range <<= 8;
            self.code = (self.code << 8) | input.read_byte()? as u32;
        }
        Ok(())
    }

    pub fn decode_bit(&mut self, input: &mut InputCursor<'_>, prob: &mut Prob) -> Result<u32> {
        self.normalize(input)?;
        let bound = (self.range >> PROB_BITS) * (*prob as u32);
        let bit;
        if self.code < bound {
            self.range = bound;
            *prob += (MAX_PROB - *prob) >> ADAPT_SHIFT;
            bit = 0;
        } else {
            self.range -= bound;
            self.code -= bound;
            *prob -= *prob >> ADAPT_SHIFT;
            bit = 1;
        }
        Ok(bit)
    }

    pub fn decode_fixed_bit(&mut self, input: &mut InputCursor<'_>) -> Result<u32> {
        self.normalize(input)?;
        self.range >>= 1;
        let bit;
        if self.code < self.range {
            bit = 0;
        } else {
            self.code -= self.range;
            bit = 1;
        }
        Ok(bit)
    }

    pub fn decode_bittree(
        &mut self,
        input: &mut InputCursor<'_>,
        model: &mut [Prob],
        num_bits: u32,
    ) -> Result<u32> {
        let limit = 1u32 << num_bits;
        let mut symbol: u32 = 1;
        while symbol < limit {
            let bit = self.decode_bit(input, &mut model[symbol as usize])?;
            symbol = (symbol << 1) | bit;
        }
        Ok(symbol - limit)
    }

    pub fn decode_reverse_bittree(
        &mut self,
        input: &mut InputCursor<'_>,
        model: &mut [Prob],
        num_bits: u32,
    ) -> Result<u32> {
        let mut symbol: u32 = 1;
        let mut result: u32 = 0;
        for i in 0..num_bits {
            let bit = self.decode_bit(input, &mut model[symbol as usize])?;
            symbol = (symbol << 1) | bit;
            result |= bit << i;
        }
        Ok(result)
    }

    pub fn decode_matched_literal(
        &mut self,
        input: &mut InputCursor<'_>,
        model: &mut [Prob],
        match_byte: u8,
    ) -> Result<u8> {
        let mut symbol: u32 = 1;
        let mut match_byte = match_byte as u32;
        for _ in 0..8 {
            match_byte <<= 1;
            let match_bit = (match_byte >> 8) & 1;
            let index = (((1 + match_bit) << 8) + symbol) as usize;
            let bit = self.decode_bit(input, &mut model[index])?;
            symbol = (symbol << 1) | bit;
            if match_bit != bit {
                // Match exhausted: finish with the plain bittree over the remaining bits.
                while symbol < 0x100 {
                    let bit = self.decode_bit(input, &mut model[symbol as usize])?;
                    symbol = (symbol << 1) | bit;
                }
                break;
            }
        }
        Ok((symbol & 0xFF) as u8)
    }

    pub fn decode_direct(&mut self, input: &mut InputCursor<'_>, num_bits: u32) -> Result<u32> {
        let mut result: u32 = 0;
        for _ in 0..num_bits {
            let bit = self.decode_fixed_bit(input)?;
            result = (result << 1) | bit;
        }
        Ok(result)
    }

    pub fn is_complete(&self) -> bool {
        self.code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_never_drops_below_min_range() {
        // A freshly-initialised decoder already satisfies the invariant.
        let data = [0u8; 16];
        let mut cur = InputCursor::new(&data);
        let mut chunk = 16usize;
        let dec = RangeDecoder::init(&mut cur, &mut chunk).unwrap();
        assert!(dec.range >= MIN_RANGE);
    }

    #[test]
    fn fixed_bits_do_not_adapt_probability() {
        let data = [0xFFu8; 16];
        let mut cur = InputCursor::new(&data);
        let mut chunk = 16usize;
        let mut dec = RangeDecoder::init(&mut cur, &mut chunk).unwrap();
        let _ = dec.decode_fixed_bit(&mut cur).unwrap();
    }
}
