//! Crate-wide error taxonomy.
//!
//! Each sub-decoder defines its own narrow error enum (see `lzma::LzmaError`,
//! `xz::XzError`, `deflate::DeflateError`, `gzip::GzipError`) and converts into
//! [`BootCodecError`] at module boundaries. The CLI's `main` collapses all of
//! these into `anyhow::Error` at the process boundary.

use std::fmt;

/// The umbrella error returned by the crate's public entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootCodecError {
    /// Bad magic, bad flags, bad filter id, or an unsupported LZMA property byte.
    MalformedHeader(&'static str),
    /// A read ran past the input buffer or the range decoder's reserved chunk.
    Truncated(&'static str),
    /// Declared sizes (index, footer, dictionary limit) disagree with what was produced.
    InconsistentSize(&'static str),
    /// A CRC32 (or other integrity) check did not match.
    IntegrityFailure(&'static str),
    /// The output buffer is too small for the declared or produced size.
    OutputOverflow(&'static str),
    /// A structurally valid but unsupported configuration (wrong LZMA properties,
    /// unsupported XZ check type, more than one filter, reserved DEFLATE block type).
    UnsupportedConfiguration(&'static str),
}

impl fmt::Display for BootCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHeader(msg) => write!(f, "malformed header: {msg}"),
            Self::Truncated(msg) => write!(f, "truncated input: {msg}"),
            Self::InconsistentSize(msg) => write!(f, "inconsistent size: {msg}"),
            Self::IntegrityFailure(msg) => write!(f, "integrity check failed: {msg}"),
            Self::OutputOverflow(msg) => write!(f, "output buffer overflow: {msg}"),
            Self::UnsupportedConfiguration(msg) => write!(f, "unsupported configuration: {msg}"),
        }
    }
}

impl std::error::Error for BootCodecError {}

pub type Result<T> = std::result::Result<T, BootCodecError>;
