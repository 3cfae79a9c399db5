//! Payload demultiplexer: walks a concatenated blob stream, identifies each
//! blob by magic, decompresses it into bump-allocated space, and publishes
//! kernel/device-tree/initramfs handles.
//!
//! Rust port of `payload.c`'s `load_one_payload`/`payload_run`.

use crate::error::{BootCodecError, Result};
use crate::gzip;
use crate::heap::Heap;
use crate::xz;

const KERNEL_MAGIC_OFFSET: usize = 0x38;
const KERNEL_MAGIC_BYTES: [u8; 4] = [0x41, 0x52, 0x4D, 0x64];
const FDT_MAGIC: [u8; 4] = [0xD0, 0x0D, 0xFE, 0xED];
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const XZ_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];
const CPIO_MAGIC_NEWC: [u8; 6] = *b"070701";
const CPIO_MAGIC_CRC: [u8; 6] = *b"070702";

/// The platform's required kernel-image alignment (2 MiB).
pub const KERNEL_ALIGN: usize = 2 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Gzip,
    Xz,
    Fdt,
    Cpio,
    Kernel,
    Terminator,
    Unrecognised,
}

/// One entry discovered while walking a payload stream (used by `inspect`).
#[derive(Debug, Clone, Copy)]
pub struct BlobRecord {
    pub kind: BlobKind,
    pub offset: usize,
    pub size: usize,
}

fn identify(data: &[u8]) -> BlobKind {
    if data.len() >= 4 && data[..4] == [0, 0, 0, 0] {
        return BlobKind::Terminator;
    }
    if data.len() >= 2 && data[..2] == GZIP_MAGIC {
        return BlobKind::Gzip;
    }
    if data.len() >= 6 && data[..6] == XZ_MAGIC {
        return BlobKind::Xz;
    }
    if data.len() >= 4 && data[..4] == FDT_MAGIC {
        return BlobKind::Fdt;
    }
    if data.len() >= 6 && (data[..6] == CPIO_MAGIC_NEWC || data[..6] == CPIO_MAGIC_CRC) {
        return BlobKind::Cpio;
    }
    if data.len() >= KERNEL_MAGIC_OFFSET + 4
        && data[KERNEL_MAGIC_OFFSET..KERNEL_MAGIC_OFFSET + 4] == KERNEL_MAGIC_BYTES
    {
        return BlobKind::Kernel;
    }
    BlobKind::Unrecognised
}

/// Published handles once the payload stream has been fully walked.
#[derive(Default)]
pub struct PayloadOutcome {
    pub kernel_offset: Option<usize>,
    pub kernel_size: Option<usize>,
    pub fdt_offset: Option<usize>,
    pub fdt_size: Option<usize>,
    pub initramfs_offset: Option<usize>,
    pub initramfs_size: Option<usize>,
    /// Every blob discovered while walking the stream, in order. Populated
    /// regardless of caller needs; the `inspect` CLI subcommand is the only
    /// consumer, but the bookkeeping is cheap enough to always perform.
    pub records: Vec<BlobRecord>,
}

/// Walks `stream`, decompressing each recognised blob into `heap`, and
/// publishing the resulting kernel/FDT/initramfs regions. Compressed blobs
/// are re-identified by content after decompression, mirroring the original
/// loader's recursive dispatch over whatever came out of the decompressor.
pub fn load_payload_chain(stream: &[u8], heap: &mut Heap<'_>) -> Result<PayloadOutcome> {
    let mut outcome = PayloadOutcome::default();
    let mut cursor = 0usize;

    while cursor < stream.len() {
        let blob = &stream[cursor..];
        let record_start = cursor;
        let kind = identify(blob);
        match kind {
            BlobKind::Terminator => break,
            BlobKind::Gzip => {
                let (offset, size) = decompress_gzip(heap, blob)?;
                publish(heap, offset, size, &mut outcome)?;
                cursor = stream.len(); // a single gzip member is assumed to run to end of stream
            }
            BlobKind::Xz => {
                let (offset, size, consumed) = decompress_xz(heap, blob)?;
                publish(heap, offset, size, &mut outcome)?;
                cursor += consumed;
            }
            BlobKind::Fdt => {
                let size = fdt_total_size(blob)?;
                let offset = copy_aligned(heap, &blob[..size], 8)?;
                outcome.fdt_offset = Some(offset);
                outcome.fdt_size = Some(size);
                cursor += size;
            }
            BlobKind::Kernel => {
                let image_size = kernel_image_size(blob)?;
                let n = image_size.min(blob.len());
                let offset = copy_aligned(heap, &blob[..n], KERNEL_ALIGN)?;
                outcome.kernel_offset = Some(offset);
                outcome.kernel_size = Some(image_size);
                cursor += image_size;
            }
            BlobKind::Cpio => {
                return Err(BootCodecError::UnsupportedConfiguration(
                    "cpio blobs require a known compressed framing to size; none was given",
                ));
            }
            BlobKind::Unrecognised => {
                return Err(BootCodecError::MalformedHeader(
                    "payload stream contains an unrecognised blob",
                ));
            }
        }
        outcome.records.push(BlobRecord {
            kind,
            offset: record_start,
            size: cursor - record_start,
        });
    }
    Ok(outcome)
}

fn decompress_gzip(heap: &mut Heap<'_>, blob: &[u8]) -> Result<(usize, usize)> {
    let mut scratch = heap.reserve_scratch(8)?;
    let produced = gzip::gzip_uncompress(scratch.as_mut_slice(), blob)
        .map_err(|_| BootCodecError::IntegrityFailure("gzip blob failed to decompress"))?;
    let reservation = scratch.commit(produced)?;
    Ok((heap.high_water() - produced, reservation.as_slice().len()))
}

fn decompress_xz(heap: &mut Heap<'_>, blob: &[u8]) -> Result<(usize, usize, usize)> {
    let mut scratch = heap.reserve_scratch(8)?;
    let outcome = xz::xz_decode(blob, Some(scratch.as_mut_slice()))?;
    let reservation = scratch.commit(outcome.output_produced)?;
    Ok((
        heap.high_water() - outcome.output_produced,
        reservation.as_slice().len(),
        outcome.input_consumed,
    ))
}

fn copy_aligned(heap: &mut Heap<'_>, bytes: &[u8], align: usize) -> Result<usize> {
    let mut reservation = heap.alloc_aligned(bytes.len(), align)?;
    reservation.as_mut_slice()[..bytes.len()].copy_from_slice(bytes);
    Ok(heap.high_water() - bytes.len())
}

fn publish(
    heap: &Heap<'_>,
    offset: usize,
    size: usize,
    outcome: &mut PayloadOutcome,
) -> Result<()> {
    // Re-identify the bytes the decompressor just produced; a compressed
    // blob's content decides whether it was really the FDT, a kernel image,
    // or the initramfs.
    let produced = &heap.committed()[offset..offset + size];
    match identify(produced) {
        BlobKind::Fdt => {
            outcome.fdt_offset = Some(offset);
            outcome.fdt_size = Some(size);
        }
        BlobKind::Kernel => {
            outcome.kernel_offset = Some(offset);
            outcome.kernel_size = Some(size);
        }
        _ => {
            outcome.initramfs_offset.get_or_insert(offset);
            outcome.initramfs_size.get_or_insert(size);
        }
    }
    Ok(())
}

fn fdt_total_size(blob: &[u8]) -> Result<usize> {
    if blob.len() < 8 {
        return Err(BootCodecError::Truncated("FDT header truncated"));
    }
    // The `totalsize` field is the second big-endian u32 in the FDT header.
    let size = u32::from_be_bytes(blob[4..8].try_into().unwrap()) as usize;
    if size > blob.len() {
        return Err(BootCodecError::InconsistentSize(
            "FDT totalsize exceeds the remaining stream",
        ));
    }
    Ok(size)
}

fn kernel_image_size(blob: &[u8]) -> Result<usize> {
    const IMAGE_SIZE_OFFSET: usize = 16;
    if blob.len() < IMAGE_SIZE_OFFSET + 8 {
        return Err(BootCodecError::Truncated("kernel image header truncated"));
    }
    let size =
        u64::from_le_bytes(blob[IMAGE_SIZE_OFFSET..IMAGE_SIZE_OFFSET + 8].try_into().unwrap());
    Ok(size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_terminator() {
        assert_eq!(identify(&[0, 0, 0, 0, 9]), BlobKind::Terminator);
    }

    #[test]
    fn identifies_fdt_magic() {
        let mut blob = vec![0xD0, 0x0D, 0xFE, 0xED];
        blob.extend_from_slice(&[0u8; 4]);
        assert_eq!(identify(&blob), BlobKind::Fdt);
    }

    #[test]
    fn identifies_gzip_magic() {
        assert_eq!(identify(&[0x1F, 0x8B, 0, 0]), BlobKind::Gzip);
    }

    #[test]
    fn empty_stream_terminates_immediately() {
        let mut backing = [0u8; 64];
        let mut heap = Heap::new(&mut backing);
        let outcome = load_payload_chain(&[0, 0, 0, 0], &mut heap).unwrap();
        assert!(outcome.kernel_offset.is_none());
    }

    #[test]
    fn loads_fdt_then_kernel() {
        let mut fdt = vec![0xD0, 0x0D, 0xFE, 0xED];
        fdt.extend_from_slice(&12u32.to_be_bytes());
        fdt.extend_from_slice(&[0u8; 4]);
        assert_eq!(fdt.len(), 12);

        // image_size (u64 LE) at offset 16, kernel magic at offset 0x38.
        let image_size: usize = KERNEL_MAGIC_OFFSET + 4;
        let mut kernel = vec![0u8; image_size];
        kernel[16..24].copy_from_slice(&(image_size as u64).to_le_bytes());
        kernel[KERNEL_MAGIC_OFFSET..KERNEL_MAGIC_OFFSET + 4].copy_from_slice(&KERNEL_MAGIC_BYTES);

        let mut stream = fdt.clone();
        stream.extend_from_slice(&kernel);
        stream.extend_from_slice(&[0, 0, 0, 0]);

        let mut backing = vec![0u8; 4 * KERNEL_ALIGN];
        let mut heap = Heap::new(&mut backing);
        let outcome = load_payload_chain(&stream, &mut heap).unwrap();
        assert_eq!(outcome.fdt_size, Some(12));
        assert_eq!(outcome.kernel_size, Some(image_size));
    }
}
