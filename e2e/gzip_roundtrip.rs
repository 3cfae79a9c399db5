//! End-to-end gzip decode test: hand-assembles a minimal gzip member
//! around a DEFLATE stored block (the DEFLATE Huffman paths are covered by
//! `src/deflate/*`'s own unit tests) and checks it round-trips through
//! `bootcodec::gzip_uncompress`.

use bootcodec::{gzip_uncompress, GzipError};

fn crc32(data: &[u8]) -> u32 {
    bootcodec::crc32::crc32(data, 0)
}

fn build_gzip_member(payload: &[u8], name: Option<&str>) -> Vec<u8> {
    let mut flags = 0u8;
    if name.is_some() {
        flags |= 1 << 3; // FNAME
    }
    let mut out = vec![0x1F, 0x8B, 0x08, flags, 0, 0, 0, 0, 0x00, 0xFF];
    if let Some(name) = name {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
    }

    // One DEFLATE stored block holding the whole payload.
    out.push(0b0000_0001); // BFINAL=1, BTYPE=00
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(&(!(payload.len() as u16)).to_le_bytes());
    out.extend_from_slice(payload);

    out.extend_from_slice(&crc32(payload).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out
}

#[test]
fn decodes_a_member_with_a_filename_field() {
    let payload = b"the quick brown fox jumps over the lazy dog";
    let member = build_gzip_member(payload, Some("fox.txt"));

    let mut dest = vec![0u8; payload.len()];
    let produced = gzip_uncompress(&mut dest, &member).expect("decode should succeed");
    assert_eq!(produced, payload.len());
    assert_eq!(&dest[..], payload);
}

#[test]
fn output_buffer_too_small_is_rejected() {
    let payload = b"the quick brown fox jumps over the lazy dog";
    let member = build_gzip_member(payload, None);

    let mut dest = vec![0u8; payload.len() - 1];
    assert_eq!(gzip_uncompress(&mut dest, &member), Err(GzipError::BufError));
}

#[test]
fn corrupted_trailer_size_is_rejected() {
    let payload = b"short";
    let mut member = build_gzip_member(payload, None);
    let len = member.len();
    member[len - 4] ^= 0xFF; // corrupt the declared ISIZE

    let mut dest = vec![0u8; payload.len()];
    assert!(gzip_uncompress(&mut dest, &member).is_err());
}
