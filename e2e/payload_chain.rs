//! End-to-end payload demultiplexer test: builds a raw FDT blob followed by
//! a raw kernel blob followed by a terminator, and checks
//! `bootcodec::load_payload_chain` finds both at the right heap offsets.

use bootcodec::heap::Heap;
use bootcodec::{load_payload_chain, BlobKind};

const KERNEL_MAGIC_OFFSET: usize = 0x38;
const KERNEL_MAGIC_BYTES: [u8; 4] = [0x41, 0x52, 0x4D, 0x64];
const KERNEL_ALIGN: usize = bootcodec::payload::KERNEL_ALIGN;

fn build_fdt_blob(body_len: usize) -> Vec<u8> {
    let total = 8 + body_len;
    let mut fdt = vec![0xD0, 0x0D, 0xFE, 0xED];
    fdt.extend_from_slice(&(total as u32).to_be_bytes());
    fdt.extend_from_slice(&vec![0u8; body_len]);
    fdt
}

fn build_kernel_blob(image_size: usize) -> Vec<u8> {
    let mut kernel = vec![0u8; image_size];
    kernel[16..24].copy_from_slice(&(image_size as u64).to_le_bytes());
    kernel[KERNEL_MAGIC_OFFSET..KERNEL_MAGIC_OFFSET + 4].copy_from_slice(&KERNEL_MAGIC_BYTES);
    kernel
}

#[test]
fn finds_fdt_then_kernel_in_order() {
    let fdt = build_fdt_blob(16);
    let kernel = build_kernel_blob(KERNEL_MAGIC_OFFSET + 4);

    let mut stream = fdt.clone();
    stream.extend_from_slice(&kernel);
    stream.extend_from_slice(&[0, 0, 0, 0]);

    let mut backing = vec![0u8; 4 * KERNEL_ALIGN];
    let mut heap = Heap::new(&mut backing);
    let outcome = load_payload_chain(&stream, &mut heap).unwrap();

    assert_eq!(outcome.fdt_size, Some(fdt.len()));
    assert_eq!(outcome.kernel_size, Some(kernel.len()));
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[0].kind, BlobKind::Fdt);
    assert_eq!(outcome.records[1].kind, BlobKind::Kernel);
}

#[test]
fn an_unrecognised_blob_is_rejected() {
    let stream = vec![0xAAu8; 32];
    let mut backing = vec![0u8; 4096];
    let mut heap = Heap::new(&mut backing);
    assert!(load_payload_chain(&stream, &mut heap).is_err());
}

#[test]
fn fdt_totalsize_past_the_stream_end_is_rejected() {
    let mut fdt = vec![0xD0, 0x0D, 0xFE, 0xED];
    fdt.extend_from_slice(&1_000_000u32.to_be_bytes());
    let mut backing = vec![0u8; 4096];
    let mut heap = Heap::new(&mut backing);
    assert!(load_payload_chain(&fdt, &mut heap).is_err());
}
