//! LZMA2 chunk framing: control bytes, reset semantics, and the
//! uncompressed/compressed chunk dispatch.
//!
//! Rust port of `minilzlib/lzma2dec.c`.

use crate::dict::HistoryDict;
use crate::error::{BootCodecError, Result};
use crate::input::InputCursor;
use crate::lzma::{LzmaDecoder, RangeDecoder};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ResetMode {
    None,
    Simple,
    Property,
    Full,
}

impl ResetMode {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => ResetMode::None,
            1 => ResetMode::Simple,
            2 => ResetMode::Property,
            _ => ResetMode::Full,
        }
    }
}

/// Decodes a full LZMA2 stream, writing through `dict` until a terminating
/// zero control byte is read. Returns the total number of bytes produced.
pub fn decode_stream(
    input: &mut InputCursor<'_>,
    dict: &mut HistoryDict<'_>,
    lzma: &mut LzmaDecoder,
) -> Result<usize> {
    let start = dict.offset();
    loop {
        let control = input.read_byte()?;
        if control == 0 {
            break;
        }
        if control & 0x80 != 0 {
            decode_lzma_chunk(input, dict, lzma, control)?;
        } else {
            decode_uncompressed_chunk(input, dict, control)?;
        }
    }
    Ok(dict.offset() - start)
}

fn decode_uncompressed_chunk(
    input: &mut InputCursor<'_>,
    dict: &mut HistoryDict<'_>,
    control: u8,
) -> Result<()> {
    // control in {1, 2}: 1 resets the dictionary, 2 does not. Both are
    // "uncompressed" forms; dictionary reset is irrelevant here since the
    // history buffer is the output buffer and is never actually reset.
    if control != 1 && control != 2 {
        return Err(BootCodecError::MalformedHeader("invalid LZMA2 control byte"));
    }
    let b0 = input.read_byte()? as usize;
    let b1 = input.read_byte()? as usize;
    let raw_size = ((b0 << 8) | b1) + 1;
    dict.set_limit(raw_size)?;
    let bytes = input.seek(raw_size)?;
    for &b in bytes {
        dict.put(b)?;
    }
    let (complete, produced) = dict.is_complete();
    if !complete || produced != raw_size {
        return Err(BootCodecError::InconsistentSize(
            "uncompressed chunk did not fill its declared size",
        ));
    }
    Ok(())
}

fn decode_lzma_chunk(
    input: &mut InputCursor<'_>,
    dict: &mut HistoryDict<'_>,
    lzma: &mut LzmaDecoder,
    control: u8,
) -> Result<()> {
    let reset = ResetMode::from_bits(control & 0x03);
    let b0 = input.read_byte()? as usize;
    let b1 = input.read_byte()? as usize;
    let b2 = input.read_byte()? as usize;
    let b3 = input.read_byte()? as usize;
    let raw_size = (((control as usize & 0x1F) << 16) | (b0 << 8) | b1) + 1;
    let declared_compressed_size = ((b2 << 8) | b3) + 1;

    match reset {
        ResetMode::None => {}
        ResetMode::Simple => lzma.reset_state(),
        ResetMode::Property | ResetMode::Full => {
            if reset == ResetMode::Full {
                lzma.reset_state();
            }
            let property_byte = input.read_byte()?;
            lzma.set_properties(property_byte)?;
        }
    }

    dict.set_limit(raw_size)?;
    input.with_soft_limit(declared_compressed_size, |input| {
        let chunk_start = input.tell();
        let mut remaining = declared_compressed_size;
        let mut rc = RangeDecoder::init(input, &mut remaining)?;
        lzma.decode(&mut rc, input, dict)?;
        let consumed = input.tell() - chunk_start;
        if !rc.is_complete() || consumed != declared_compressed_size {
            return Err(BootCodecError::InconsistentSize(
                "range decoder did not consume exactly the declared compressed size",
            ));
        }
        Ok(())
    })?;

    let (complete, produced) = dict.is_complete();
    if !complete || produced != raw_size {
        return Err(BootCodecError::InconsistentSize(
            "LZMA chunk did not fill its declared raw size",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_is_a_single_zero_byte() {
        let data = [0u8];
        let mut input = InputCursor::new(&data);
        let mut out = [0u8; 16];
        let mut dict = HistoryDict::new(&mut out);
        let mut lzma = LzmaDecoder::new();
        let produced = decode_stream(&mut input, &mut dict, &mut lzma).unwrap();
        assert_eq!(produced, 0);
    }

    #[test]
    fn uncompressed_chunk_copies_bytes_through() {
        // control=1 (dict reset), raw_size-1 = 0x0003 -> raw_size=4, then 4 bytes, then terminator.
        let data = [1u8, 0x00, 0x03, b'a', b'b', b'c', b'd', 0u8];
        let mut input = InputCursor::new(&data);
        let mut out = [0u8; 16];
        let mut dict = HistoryDict::new(&mut out);
        let mut lzma = LzmaDecoder::new();
        let produced = decode_stream(&mut input, &mut dict, &mut lzma).unwrap();
        assert_eq!(produced, 4);
        assert_eq!(&out[..4], b"abcd");
    }

    #[test]
    fn rejects_invalid_control_byte() {
        let data = [3u8, 0u8];
        let mut input = InputCursor::new(&data);
        let mut out = [0u8; 4];
        let mut dict = HistoryDict::new(&mut out);
        let mut lzma = LzmaDecoder::new();
        assert!(decode_stream(&mut input, &mut dict, &mut lzma).is_err());
    }
}
