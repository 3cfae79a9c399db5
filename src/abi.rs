//! C-ABI shims for embedding this crate's decoders in the boot shim's C code.
//!
//! Enabled with:
//!   cargo build --release --features c-abi
//!
//! Mirrors `minilzlib`'s and `tinf`'s plain `(src, src_len, dst, dst_len) -> int`
//! calling convention: a non-negative return is the number of bytes produced,
//! a negative return is an error.

use std::os::raw::c_int;
use std::slice;

fn produced_or_error(result: crate::error::Result<usize>) -> c_int {
    match result {
        Ok(n) => n as c_int,
        Err(_) => -1,
    }
}

/// Decodes a single-block XZ stream.
///
/// # Safety
/// `src` must point to `src_len` readable bytes and `dst` to `dst_len`
/// writable bytes; both must be valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn bootcodec_xz_decode(
    src: *const u8,
    src_len: usize,
    dst: *mut u8,
    dst_len: usize,
) -> c_int {
    if src.is_null() || dst.is_null() {
        return -1;
    }
    let source = slice::from_raw_parts(src, src_len);
    let dest = slice::from_raw_parts_mut(dst, dst_len);
    produced_or_error(
        crate::xz::xz_decode(source, Some(dest)).map(|o| o.output_produced),
    )
}

/// Decodes a gzip member.
///
/// # Safety
/// Same pointer/length contract as [`bootcodec_xz_decode`].
#[no_mangle]
pub unsafe extern "C" fn bootcodec_gzip_uncompress(
    src: *const u8,
    src_len: usize,
    dst: *mut u8,
    dst_len: usize,
) -> c_int {
    if src.is_null() || dst.is_null() {
        return -1;
    }
    let source = slice::from_raw_parts(src, src_len);
    let dest = slice::from_raw_parts_mut(dst, dst_len);
    match crate::gzip::gzip_uncompress(dest, source) {
        Ok(n) => n as c_int,
        Err(_) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_null_pointers() {
        unsafe {
            assert_eq!(bootcodec_xz_decode(std::ptr::null(), 0, std::ptr::null_mut(), 0), -1);
            assert_eq!(
                bootcodec_gzip_uncompress(std::ptr::null(), 0, std::ptr::null_mut(), 0),
                -1
            );
        }
    }

    #[test]
    fn gzip_roundtrip_through_c_abi() {
        // Minimal stored-block gzip member for "hi", built the same way
        // gzip.rs's own unit tests build one.
        let payload = b"hi";
        let mut member = vec![0x1F, 0x8B, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0xFF];
        member.push(0x01); // BFINAL=1, BTYPE=00 (stored)
        member.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        member.extend_from_slice(&(!(payload.len() as u16)).to_le_bytes());
        member.extend_from_slice(payload);
        member.extend_from_slice(&crate::crc32::crc32(payload, 0).to_le_bytes());
        member.extend_from_slice(&(payload.len() as u32).to_le_bytes());

        let mut dest = [0u8; 16];
        let produced = unsafe {
            bootcodec_gzip_uncompress(member.as_ptr(), member.len(), dest.as_mut_ptr(), dest.len())
        };
        assert_eq!(produced, 2);
        assert_eq!(&dest[..2], payload);
    }
}
