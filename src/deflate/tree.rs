//! Canonical Huffman tree construction and decoding.
//!
//! Rust port of `tinf_tree`, `tinf_build_tree`, `tinf_build_fixed_trees`, and
//! `tinf_decode_symbol` from `tinf/tinflate.c`.

use crate::deflate::bitreader::BitReader;
use crate::error::{BootCodecError, Result};

const MAX_BITS: usize = 15;

pub struct HuffmanTree {
    counts: [u16; MAX_BITS + 1],
    symbols: [u16; 288],
    max_sym: i32,
}

impl HuffmanTree {
    fn empty() -> Self {
        HuffmanTree {
            counts: [0; MAX_BITS + 1],
            symbols: [0; 288],
            max_sym: -1,
        }
    }

    /// Builds a canonical tree from an array of code lengths (one per symbol,
    /// `0` meaning the symbol is unused).
    pub fn build(lengths: &[u8]) -> Result<Self> {
        let mut tree = HuffmanTree::empty();
        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                tree.max_sym = sym as i32;
                tree.counts[len as usize] += 1;
            }
        }

        // Compute the offset table for the distribution sort below, checking
        // along the way that each length's code count fits in the codespace
        // left over after shorter codes (an overfull set is rejected here).
        let mut offsets = [0u16; MAX_BITS + 1];
        let mut available: i32 = 1;
        let mut num_codes: u32 = 0;
        for i in 0..=MAX_BITS {
            let used = tree.counts[i] as i32;
            if used > available {
                return Err(BootCodecError::MalformedHeader(
                    "Huffman code lengths overfull their codespace",
                ));
            }
            available = 2 * (available - used);
            offsets[i] = num_codes as u16;
            num_codes += used as u32;
        }

        // Check all codes were used, or for the special case of only one code
        // that it has length 1.
        if (num_codes > 1 && available > 0) || (num_codes == 1 && tree.counts[1] != 1) {
            return Err(BootCodecError::MalformedHeader(
                "Huffman code lengths leave their codespace incomplete",
            ));
        }

        if tree.max_sym < 0 {
            return Err(BootCodecError::MalformedHeader("Huffman tree has no symbols"));
        }

        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let idx = offsets[len as usize] as usize;
                tree.symbols[idx] = sym as u16;
                offsets[len as usize] += 1;
            }
        }

        // For the special case of only one code (which will be at index 0)
        // add a synthetic code 1 that decodes to a symbol too large for the
        // decoder's upper-bound check to accept.
        if num_codes == 1 {
            tree.counts[1] = 2;
            tree.symbols[1] = (tree.max_sym + 1) as u16;
        }

        Ok(tree)
    }

    pub fn build_fixed_literal() -> Self {
        let mut lengths = [0u8; 288];
        for i in 0..144 {
            lengths[i] = 8;
        }
        for i in 144..256 {
            lengths[i] = 9;
        }
        for i in 256..280 {
            lengths[i] = 7;
        }
        for i in 280..288 {
            lengths[i] = 8;
        }
        HuffmanTree::build(&lengths).expect("fixed literal tree is always valid")
    }

    /// Built directly rather than through `build()`: DEFLATE's fixed distance
    /// alphabet only defines 30 symbols, but the canonical code assigns all
    /// 32 five-bit patterns, leaving codes 30 and 31 unused. Constructing it
    /// from a 30-entry length array would make the code incomplete and trip
    /// the overfull/underfull check above, so the tree is assembled with all
    /// 32 codes and `max_sym` capped at 29 to reject the two spares.
    pub fn build_fixed_distance() -> Self {
        let mut tree = HuffmanTree::empty();
        tree.counts[5] = 32;
        for i in 0..32 {
            tree.symbols[i] = i as u16;
        }
        tree.max_sym = 29;
        tree
    }

    pub fn decode_symbol(&self, br: &mut BitReader<'_, '_>) -> Result<u16> {
        let mut sum: i32 = 0;
        let mut cur: i32 = 0;
        let mut len: usize = 1;
        loop {
            cur = 2 * cur + br.read_bit()? as i32;
            sum += self.counts[len] as i32;
            cur -= self.counts[len] as i32;
            if cur < 0 {
                break;
            }
            len += 1;
            if len > MAX_BITS {
                return Err(BootCodecError::MalformedHeader(
                    "Huffman code exceeds maximum length",
                ));
            }
        }
        let index = (sum + cur) as usize;
        let symbol = *self
            .symbols
            .get(index)
            .ok_or(BootCodecError::MalformedHeader("Huffman symbol index out of range"))?;
        if symbol as i32 > self.max_sym {
            return Err(BootCodecError::MalformedHeader(
                "decoded symbol exceeds the tree's declared range (sentinel hit)",
            ));
        }
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_trees_decode_without_panicking() {
        let _ = HuffmanTree::build_fixed_literal();
        let _ = HuffmanTree::build_fixed_distance();
    }

    #[test]
    fn single_code_tree_installs_sentinel() {
        let mut lengths = [0u8; 4];
        lengths[0] = 1;
        let tree = HuffmanTree::build(&lengths).unwrap();
        assert_eq!(tree.max_sym, 0);
    }

    #[test]
    fn rejects_empty_tree() {
        let lengths = [0u8; 4];
        assert!(HuffmanTree::build(&lengths).is_err());
    }

    #[test]
    fn rejects_overfull_code_lengths() {
        // Two length-1 codes already exhaust the codespace, leaving none for
        // the length-2 code.
        let lengths = [1u8, 1, 2, 0];
        assert!(HuffmanTree::build(&lengths).is_err());
    }

    #[test]
    fn rejects_underfull_code_lengths() {
        // A single code declared at length 2 instead of the canonical length 1.
        let lengths = [2u8, 0, 0, 0];
        assert!(HuffmanTree::build(&lengths).is_err());
    }
}
