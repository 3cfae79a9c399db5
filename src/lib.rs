//! XZ/LZMA2/LZMA and DEFLATE/gzip decoders plus a payload demultiplexer,
//! originally written to run in an early-boot environment with no heap and
//! no operating system. This crate keeps that discipline: every decoder
//! reads from a caller-owned input slice and writes into a caller-owned
//! output slice, with no internal dynamic allocation beyond one boxed
//! probability table per [`lzma::LzmaDecoder`].

#[cfg(feature = "cli")]
pub mod cli;
pub mod crc32;
pub mod deflate;
pub mod dict;
pub mod error;
pub mod gzip;
pub mod heap;
pub mod input;
pub mod lzma;
pub mod lzma2;
pub mod payload;
pub mod xz;

#[cfg(feature = "c-abi")]
pub mod abi;

/// One-shot XZ stream decode. Equivalent to `XzDecode`.
pub use xz::{xz_decode, XzOutcome};
/// One-shot gzip member decode. Equivalent to `tinf_gzip_uncompress`.
pub use gzip::{gzip_uncompress, GzipError};
/// Payload-chain walker used by the boot loader to find kernel/FDT/initramfs.
pub use payload::{load_payload_chain, BlobKind, BlobRecord, PayloadOutcome};

pub use error::BootCodecError;
