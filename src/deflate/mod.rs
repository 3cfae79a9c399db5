//! DEFLATE (RFC 1951) bit reader, Huffman tree construction, and block decoding.

pub mod bitreader;
pub mod decoder;
pub mod tree;

pub use decoder::inflate;
