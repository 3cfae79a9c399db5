//! XZ container: stream header/footer, a single block, and its index.
//!
//! Rust port of `minilzlib/xzstream.c`. Supports exactly one block per
//! stream, the LZMA2 filter only, and the four standard check types (None,
//! CRC32, CRC64, SHA-256) — only CRC32 is actually verified; CRC64/SHA-256
//! checksums are skipped over but not validated, matching the core's
//! declared non-goal of implementing those digests.

use crate::crc32::crc32;
use crate::dict::HistoryDict;
use crate::error::{BootCodecError, Result};
use crate::input::InputCursor;
use crate::lzma::LzmaDecoder;
use crate::lzma2;

const STREAM_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];
const FOOTER_MAGIC: [u8; 2] = [b'Y', b'Z'];
const FILTER_ID_LZMA2: u64 = 0x21;
const VLI_MAX_BYTES: usize = 9;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CheckType {
    None,
    Crc32,
    Crc64,
    Sha256,
}

impl CheckType {
    fn from_nibble(n: u8) -> Result<Self> {
        match n {
            0x00 => Ok(CheckType::None),
            0x01 => Ok(CheckType::Crc32),
            0x04 => Ok(CheckType::Crc64),
            0x0A => Ok(CheckType::Sha256),
            _ => Err(BootCodecError::UnsupportedConfiguration(
                "unsupported XZ check type",
            )),
        }
    }

    fn size(self) -> usize {
        match self {
            CheckType::None => 0,
            CheckType::Crc32 => 4,
            CheckType::Crc64 => 8,
            CheckType::Sha256 => 32,
        }
    }
}

/// Result of a successful `xz_decode` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XzOutcome {
    pub input_consumed: usize,
    pub output_produced: usize,
}

fn read_vli(input: &mut InputCursor<'_>) -> Result<u64> {
    let mut result: u64 = 0;
    for i in 0..VLI_MAX_BYTES {
        let byte = input.read_byte()?;
        result |= ((byte & 0x7F) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(BootCodecError::MalformedHeader("VLI has a trailing zero byte"));
            }
            return Ok(result);
        }
    }
    Err(BootCodecError::MalformedHeader("VLI too long"))
}

fn decode_stream_header(input: &mut InputCursor<'_>) -> Result<CheckType> {
    let magic = input.seek(6)?;
    if magic != STREAM_MAGIC {
        return Err(BootCodecError::MalformedHeader("bad XZ stream magic"));
    }
    let flags = input.seek(2)?;
    if flags[0] != 0 {
        return Err(BootCodecError::MalformedHeader("reserved stream flags set"));
    }
    let check = CheckType::from_nibble(flags[1] & 0x0F)?;
    let crc_bytes = input.seek(4)?;
    let expected = u32::from_le_bytes(crc_bytes.try_into().unwrap());
    if crc32(flags, 0) != expected {
        return Err(BootCodecError::IntegrityFailure("stream header CRC32 mismatch"));
    }
    Ok(check)
}

struct BlockHeader {
    header_size: usize,
}

/// Parses the block header. Returns `None` when the next byte is zero,
/// which means there is no block and this is actually the index's leading
/// indicator byte — left unconsumed so `decode_index` can read it normally.
fn decode_block_header(input: &mut InputCursor<'_>) -> Result<Option<BlockHeader>> {
    if input.peek_byte()? == 0 {
        return Ok(None);
    }
    let size_byte = input.read_byte()?;
    let header_size = (size_byte as usize + 1) * 4;
    let header_start = input.tell() - 1;
    let flags = input.read_byte()?;
    if flags & 0xFC != 0 {
        return Err(BootCodecError::UnsupportedConfiguration(
            "XZ block reserved bits and optional size fields are not supported",
        ));
    }
    let num_filters = (flags & 0x03) + 1;
    if num_filters != 1 {
        return Err(BootCodecError::UnsupportedConfiguration(
            "only a single XZ filter is supported",
        ));
    }
    let filter_id = read_vli(input)?;
    if filter_id != FILTER_ID_LZMA2 {
        return Err(BootCodecError::MalformedHeader("XZ filter is not LZMA2"));
    }
    let filter_props_size = read_vli(input)?;
    if filter_props_size != 1 {
        return Err(BootCodecError::MalformedHeader(
            "LZMA2 filter property size must be 1",
        ));
    }
    let dict_size_prop = input.read_byte()?;
    if dict_size_prop > 39 {
        return Err(BootCodecError::MalformedHeader("invalid LZMA2 dictionary size byte"));
    }
    // Pad to header_size, then skip the trailing CRC32.
    while input.tell() < header_start + header_size - 4 {
        input.read_byte()?;
    }
    let crc_bytes = input.seek(4)?;
    let expected = u32::from_le_bytes(crc_bytes.try_into().unwrap());
    let body = input.span(header_start, header_size - 4);
    if crc32(body, 0) != expected {
        return Err(BootCodecError::IntegrityFailure("block header CRC32 mismatch"));
    }
    Ok(Some(BlockHeader { header_size }))
}

/// Decodes a single-block XZ stream. `output` is `None` for size-only mode.
pub fn xz_decode(input_bytes: &[u8], output: Option<&mut [u8]>) -> Result<XzOutcome> {
    let mut input = InputCursor::new(input_bytes);
    let check = decode_stream_header(&mut input)?;

    let header = match decode_block_header(&mut input)? {
        None => {
            // Empty stream: no block, but the index and stream footer still
            // have to be parsed and validated like any other stream.
            let index_size = decode_index(&mut input, None)?;
            decode_stream_footer(&mut input, check, index_size)?;
            return Ok(XzOutcome {
                input_consumed: input.tell(),
                output_produced: 0,
            });
        }
        Some(h) => h,
    };

    let compressed_start = input.tell();
    let mut lzma = LzmaDecoder::new();

    let (output_produced, output_crc) = match output {
        Some(out) => {
            let mut dict = HistoryDict::new(out);
            dict.set_limit(out.len())?;
            let produced = lzma2::decode_stream(&mut input, &mut dict, &mut lzma)?;
            (produced, Some(crc32(&out[..produced], 0)))
        }
        None => {
            // Size-only mode: decode into a throwaway buffer sized to the
            // remaining input; a real boot-time caller always has a real
            // output buffer, this path exists for diagnostic tooling only.
            let mut scratch = vec![0u8; input.remaining().saturating_mul(64).max(4096)];
            let mut dict = HistoryDict::new(&mut scratch);
            dict.set_limit(scratch.len())?;
            let produced = lzma2::decode_stream(&mut input, &mut dict, &mut lzma)?;
            (produced, None)
        }
    };

    input.align_to_four()?;
    let checksum = input.seek(check.size())?;
    if check == CheckType::Crc32 {
        let expected = u32::from_le_bytes(checksum.try_into().unwrap());
        if let Some(actual) = output_crc {
            if actual != expected {
                return Err(BootCodecError::IntegrityFailure(
                    "block CRC32 does not match decompressed output",
                ));
            }
        }
    }

    let unpadded_block_size = input.tell() - compressed_start + header.header_size;

    let index_size = decode_index(&mut input, Some(unpadded_block_size))?;
    decode_stream_footer(&mut input, check, index_size)?;

    Ok(XzOutcome {
        input_consumed: input.tell(),
        output_produced,
    })
}

/// Decodes the index. `unpadded_block_size` is `Some` when a block was
/// decoded (expecting exactly one record matching that size) and `None`
/// when the stream had no block (expecting zero records).
fn decode_index(input: &mut InputCursor<'_>, unpadded_block_size: Option<usize>) -> Result<usize> {
    let index_start = input.tell();
    let zero = input.read_byte()?;
    if zero != 0 {
        return Err(BootCodecError::MalformedHeader("index must start with a zero byte"));
    }
    let count = read_vli(input)?;
    match unpadded_block_size {
        Some(declared_size) => {
            if count != 1 {
                return Err(BootCodecError::UnsupportedConfiguration(
                    "only single-block XZ streams are supported",
                ));
            }
            let declared_unpadded = read_vli(input)?;
            if declared_unpadded as usize != declared_size {
                return Err(BootCodecError::InconsistentSize(
                    "index unpadded block size does not match the decoded block",
                ));
            }
            let _declared_uncompressed = read_vli(input)?;
        }
        None => {
            if count != 0 {
                return Err(BootCodecError::InconsistentSize(
                    "index declares block records but the stream had no block",
                ));
            }
        }
    }
    input.align_to_four()?;
    let crc_bytes = input.seek(4)?;
    let expected = u32::from_le_bytes(crc_bytes.try_into().unwrap());
    let body = input.span(index_start, input.tell() - index_start - 4);
    if crc32(body, 0) != expected {
        return Err(BootCodecError::IntegrityFailure("index CRC32 mismatch"));
    }
    Ok(input.tell() - index_start)
}

fn decode_stream_footer(input: &mut InputCursor<'_>, check: CheckType, index_size: usize) -> Result<()> {
    let footer_start = input.tell();
    let crc_bytes = input.seek(4)?;
    let expected = u32::from_le_bytes(crc_bytes.try_into().unwrap());
    let backward_bytes = input.seek(4)?;
    let flags_bytes = input.seek(2)?;
    let computed = crc32(input.span(footer_start + 4, 6), 0);
    if computed != expected {
        return Err(BootCodecError::IntegrityFailure("stream footer CRC32 mismatch"));
    }
    let backward_size = u32::from_le_bytes(backward_bytes.try_into().unwrap()) as usize;
    if (backward_size + 1) * 4 != index_size {
        return Err(BootCodecError::InconsistentSize(
            "stream footer backward_size does not match the index",
        ));
    }
    if flags_bytes[0] != 0 || CheckType::from_nibble(flags_bytes[1] & 0x0F)? != check {
        return Err(BootCodecError::InconsistentSize(
            "stream footer check type does not match stream header",
        ));
    }
    let magic = input.seek(2)?;
    if magic != FOOTER_MAGIC {
        return Err(BootCodecError::MalformedHeader("bad XZ stream footer magic"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vli_roundtrip_small_values() {
        let data = [0x00u8];
        let mut input = InputCursor::new(&data);
        assert_eq!(read_vli(&mut input).unwrap(), 0);

        let data = [0x80u8, 0x01];
        let mut input = InputCursor::new(&data);
        assert_eq!(read_vli(&mut input).unwrap(), 128);
    }

    #[test]
    fn vli_rejects_trailing_zero_continuation() {
        let data = [0x80u8, 0x00];
        let mut input = InputCursor::new(&data);
        assert!(read_vli(&mut input).is_err());
    }

    #[test]
    fn rejects_bad_stream_magic() {
        let data = [0u8; 12];
        assert!(matches!(
            xz_decode(&data, None),
            Err(BootCodecError::MalformedHeader(_))
        ));
    }

    fn build_empty_stream() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&STREAM_MAGIC);
        let flags = [0x00u8, 0x00u8]; // check = None
        out.extend_from_slice(&flags);
        out.extend_from_slice(&crc32(&flags, 0).to_le_bytes());

        let index_start = out.len();
        out.push(0x00); // index indicator
        out.push(0x00); // count = 0
        while out.len() % 4 != 0 {
            out.push(0);
        }
        let index_body = out[index_start..].to_vec();
        out.extend_from_slice(&crc32(&index_body, 0).to_le_bytes());
        let index_size = out.len() - index_start;

        let backward_size = (index_size / 4 - 1) as u32;
        let mut footer_tail = Vec::new();
        footer_tail.extend_from_slice(&backward_size.to_le_bytes());
        footer_tail.extend_from_slice(&flags);
        out.extend_from_slice(&crc32(&footer_tail, 0).to_le_bytes());
        out.extend_from_slice(&footer_tail);
        out.extend_from_slice(&FOOTER_MAGIC);
        out
    }

    #[test]
    fn decodes_an_empty_stream_with_a_valid_index_and_footer() {
        let stream = build_empty_stream();
        let outcome = xz_decode(&stream, None).unwrap();
        assert_eq!(outcome.output_produced, 0);
        assert_eq!(outcome.input_consumed, stream.len());
    }

    #[test]
    fn rejects_an_empty_stream_with_a_corrupted_footer_magic() {
        let mut stream = build_empty_stream();
        let last = stream.len() - 1;
        stream[last] ^= 0xFF;
        assert!(xz_decode(&stream, None).is_err());
    }
}
