//! Gzip container: header/trailer parsing around the DEFLATE body.
//!
//! Rust port of `tinf/tinfgzip.c` (`tinf_gzip_uncompress`).

use crate::crc32::crc32;
use crate::deflate;
use crate::error::{BootCodecError, Result};
use crate::input::InputCursor;

const FLAG_FTEXT: u8 = 1 << 0;
const FLAG_FHCRC: u8 = 1 << 1;
const FLAG_FEXTRA: u8 = 1 << 2;
const FLAG_FNAME: u8 = 1 << 3;
const FLAG_FCOMMENT: u8 = 1 << 4;
const RESERVED_FLAGS: u8 = 0xE0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GzipError {
    DataError,
    BufError,
}

impl std::fmt::Display for GzipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GzipError::DataError => write!(f, "gzip data error"),
            GzipError::BufError => write!(f, "gzip output buffer too small"),
        }
    }
}

impl std::error::Error for GzipError {}

impl From<BootCodecError> for GzipError {
    fn from(e: BootCodecError) -> Self {
        match e {
            BootCodecError::OutputOverflow(_) => GzipError::BufError,
            _ => GzipError::DataError,
        }
    }
}

/// Decompresses a gzip member from `source` into `dest`, returning the number
/// of bytes produced. Validates the header flags, the optional FHCRC, and the
/// trailing CRC32 + size fields.
pub fn gzip_uncompress(dest: &mut [u8], source: &[u8]) -> std::result::Result<usize, GzipError> {
    // Room for at least a 10 byte header and an 8 byte trailer.
    if source.len() < 18 {
        return Err(GzipError::DataError);
    }
    let mut input = InputCursor::new(source);
    let header_start = input.tell();

    let id = input.seek(2).map_err(|_| GzipError::DataError)?;
    if id != [0x1F, 0x8B] {
        return Err(GzipError::DataError);
    }
    let method = input.read_byte().map_err(|_| GzipError::DataError)?;
    if method != 8 {
        return Err(GzipError::DataError);
    }
    let flags = input.read_byte().map_err(|_| GzipError::DataError)?;
    if flags & RESERVED_FLAGS != 0 {
        return Err(GzipError::DataError);
    }
    // MTIME (4) + XFL (1) + OS (1).
    input.seek(6).map_err(|_| GzipError::DataError)?;

    if flags & FLAG_FEXTRA != 0 {
        let xlen_bytes = input.seek(2).map_err(|_| GzipError::DataError)?;
        let xlen = u16::from_le_bytes(xlen_bytes.try_into().unwrap()) as usize;
        input.seek(xlen).map_err(|_| GzipError::DataError)?;
    }
    if flags & FLAG_FNAME != 0 {
        skip_cstring(&mut input)?;
    }
    if flags & FLAG_FCOMMENT != 0 {
        skip_cstring(&mut input)?;
    }
    if flags & FLAG_FHCRC != 0 {
        let header_len = input.tell() - header_start;
        let header_bytes = input.span(header_start, header_len);
        let expected = crc32(header_bytes, 0) & 0xFFFF;
        let hcrc_bytes = input.seek(2).map_err(|_| GzipError::DataError)?;
        let actual = u16::from_le_bytes(hcrc_bytes.try_into().unwrap()) as u32;
        if actual != expected {
            return Err(GzipError::DataError);
        }
    }

    // The trailer's declared uncompressed size and CRC32 sit in the last 8
    // bytes of the member; read them before decompressing so an undersized
    // destination buffer is caught as a buffer error, not a data error.
    let expected_size =
        u32::from_le_bytes(source[source.len() - 4..].try_into().unwrap()) as usize;
    if expected_size > dest.len() {
        return Err(GzipError::BufError);
    }
    let expected_crc = u32::from_le_bytes(source[source.len() - 8..source.len() - 4].try_into().unwrap());

    let body_start = input.tell();
    if body_start + 8 > source.len() {
        return Err(GzipError::DataError);
    }
    input.set_soft_limit(source.len() - body_start - 8).map_err(|_| GzipError::DataError)?;
    let produced = deflate::inflate(&mut input, dest)?;
    input.reset_soft_limit();

    if produced != expected_size {
        return Err(GzipError::DataError);
    }
    if crc32(&dest[..produced], 0) != expected_crc {
        return Err(GzipError::DataError);
    }
    Ok(produced)
}

fn skip_cstring(input: &mut InputCursor<'_>) -> std::result::Result<(), GzipError> {
    loop {
        let b = input.read_byte().map_err(|_| GzipError::DataError)?;
        if b == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_gzip_stored(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x1F, 0x8B, 8, 0, 0, 0, 0, 0, 0, 0xFF];
        // One DEFLATE stored block: bfinal=1, btype=00.
        out.push(0b0000_0001);
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(&(!(payload.len() as u16)).to_le_bytes());
        out.extend_from_slice(payload);
        out.extend_from_slice(&crc32(payload, 0).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out
    }

    #[test]
    fn decodes_minimal_stored_member() {
        let payload = b"Hello, world!\n";
        let data = build_gzip_stored(payload);
        let mut dest = [0u8; 32];
        let n = gzip_uncompress(&mut dest, &data).unwrap();
        assert_eq!(&dest[..n], payload);
    }

    #[test]
    fn rejects_bad_trailer_crc() {
        let payload = b"Hello, world!\n";
        let mut data = build_gzip_stored(payload);
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        let mut dest = [0u8; 32];
        assert!(gzip_uncompress(&mut dest, &data).is_err());
    }

    #[test]
    fn rejects_bad_magic() {
        let data = [0u8; 20];
        let mut dest = [0u8; 8];
        assert_eq!(gzip_uncompress(&mut dest, &data), Err(GzipError::DataError));
    }

    #[test]
    fn rejects_short_input_as_data_error() {
        let data = [0u8; 10];
        let mut dest = [0u8; 8];
        assert_eq!(gzip_uncompress(&mut dest, &data), Err(GzipError::DataError));
    }

    #[test]
    fn undersized_destination_is_a_buf_error() {
        let payload = b"Hello, world!\n";
        let data = build_gzip_stored(payload);
        let mut dest = [0u8; 4];
        assert_eq!(gzip_uncompress(&mut dest, &data), Err(GzipError::BufError));
    }
}
