//! End-to-end XZ decode test: hand-assembles a minimal single-block XZ
//! stream (LZMA2 filter, uncompressed chunks only — the LZMA bitstream
//! itself is covered by `src/lzma/*`'s unit tests) and checks the full
//! container round-trips through `bootcodec::xz_decode`.

use bootcodec::{xz_decode, BootCodecError};

fn write_vli(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn crc32(data: &[u8]) -> u32 {
    bootcodec::crc32::crc32(data, 0)
}

/// Builds a one-block XZ stream around `payload`, carried as a single
/// uncompressed LZMA2 chunk, with a CRC32 integrity check.
fn build_xz_stream(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();

    // --- stream header ---
    out.extend_from_slice(&[0xFD, b'7', b'z', b'X', b'Z', 0x00]);
    let flags = [0x00u8, 0x01u8]; // check = CRC32
    out.extend_from_slice(&flags);
    out.extend_from_slice(&crc32(&flags).to_le_bytes());

    // --- block header ---
    let header_start = out.len();
    let header_size = 12usize; // size_byte=2 -> (2+1)*4
    let size_byte = (header_size / 4 - 1) as u8;
    let mut header_body = vec![size_byte];
    header_body.push(0x00); // block flags: one filter, no optional sizes
    write_vli(&mut header_body, 0x21); // filter id: LZMA2
    write_vli(&mut header_body, 1); // filter props size
    header_body.push(0x00); // dict size property
    while header_body.len() < header_size - 4 {
        header_body.push(0);
    }
    assert_eq!(header_body.len(), header_size - 4);
    out.extend_from_slice(&header_body);
    out.extend_from_slice(&crc32(&header_body).to_le_bytes());
    assert_eq!(out.len() - header_start, header_size);

    // --- compressed body: one uncompressed LZMA2 chunk ---
    let compressed_start = out.len();
    assert!(!payload.is_empty() && payload.len() <= 0x10000);
    out.push(0x01); // control: uncompressed, dict reset
    let raw_minus_one = (payload.len() - 1) as u16;
    out.extend_from_slice(&raw_minus_one.to_be_bytes());
    out.extend_from_slice(payload);
    out.push(0x00); // LZMA2 terminator

    // --- block integrity check (CRC32 of the decompressed payload) ---
    out.extend_from_slice(&crc32(payload).to_le_bytes());
    while out.len() % 4 != 0 {
        out.push(0);
    }

    let unpadded_block_size = out.len() - compressed_start + header_size;

    // --- index ---
    let index_start = out.len();
    out.push(0x00);
    write_vli(&mut out, 1); // one record
    write_vli(&mut out, unpadded_block_size as u64);
    write_vli(&mut out, payload.len() as u64);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    let index_body = out[index_start..].to_vec();
    out.extend_from_slice(&crc32(&index_body).to_le_bytes());
    let index_size = out.len() - index_start;

    // --- stream footer ---
    let backward_size = (index_size / 4 - 1) as u32;
    let mut footer_tail = Vec::new();
    footer_tail.extend_from_slice(&backward_size.to_le_bytes());
    footer_tail.extend_from_slice(&flags);
    out.extend_from_slice(&crc32(&footer_tail).to_le_bytes());
    out.extend_from_slice(&footer_tail);
    out.extend_from_slice(&[b'Y', b'Z']);

    out
}

#[test]
fn decodes_a_hand_built_single_block_stream() {
    let payload = b"hello, xz world!";
    let stream = build_xz_stream(payload);

    let sized = xz_decode(&stream, None).expect("size-only pass should succeed");
    assert_eq!(sized.output_produced, payload.len());

    let mut dest = vec![0u8; payload.len()];
    let outcome = xz_decode(&stream, Some(&mut dest)).expect("decode should succeed");
    assert_eq!(outcome.output_produced, payload.len());
    assert_eq!(outcome.input_consumed, stream.len());
    assert_eq!(&dest[..], payload);
}

#[test]
fn flipping_a_payload_byte_trips_the_block_crc() {
    let payload = b"hello, xz world!";
    let mut stream = build_xz_stream(payload);
    // The payload lives right after the 3-byte uncompressed-chunk header,
    // which itself sits right after the 24-byte stream+block header.
    let payload_offset = 24 + 3;
    stream[payload_offset] ^= 0xFF;

    let mut dest = vec![0u8; payload.len()];
    let err = xz_decode(&stream, Some(&mut dest)).unwrap_err();
    assert!(matches!(err, BootCodecError::IntegrityFailure(_)));
}

#[test]
fn truncated_stream_is_rejected() {
    let payload = b"hello, xz world!";
    let stream = build_xz_stream(payload);
    let truncated = &stream[..stream.len() - 10];

    let mut dest = vec![0u8; payload.len()];
    assert!(xz_decode(truncated, Some(&mut dest)).is_err());
}
