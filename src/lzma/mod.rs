//! The LZMA codec: range decoder, probability model, and the sequence decoder
//! that drives them over a history dictionary.

pub mod decoder;
pub mod probabilities;
pub mod rangedec;

pub use decoder::{LzmaDecoder, SUPPORTED_PROPERTY_BYTE};
pub use rangedec::RangeDecoder;
