//! DEFLATE block decoding (RFC 1951): stored, fixed-Huffman, and
//! dynamic-Huffman blocks.
//!
//! Rust port of `tinf_uncompress`, `tinf_inflate_uncompressed_block`,
//! `tinf_inflate_fixed_block`, `tinf_inflate_dynamic_block`, and
//! `tinf_inflate_block_data` from `tinf/tinflate.c`.

use crate::deflate::bitreader::BitReader;
use crate::deflate::tree::HuffmanTree;
use crate::error::{BootCodecError, Result};
use crate::input::InputCursor;

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DIST_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Decompresses a DEFLATE stream (as used by gzip/zlib bodies) into `dest`,
/// returning the number of bytes written.
pub fn inflate(input: &mut InputCursor<'_>, dest: &mut [u8]) -> Result<usize> {
    let mut br = BitReader::new(input);
    let mut dest_len = 0usize;
    loop {
        let is_final = br.read_bit()? != 0;
        let block_type = br.read_bits(2)?;
        match block_type {
            0 => inflate_stored_block(&mut br, dest, &mut dest_len)?,
            1 => {
                let lit_tree = HuffmanTree::build_fixed_literal();
                let dist_tree = HuffmanTree::build_fixed_distance();
                inflate_block_data(&mut br, &lit_tree, &dist_tree, dest, &mut dest_len)?;
            }
            2 => {
                let (lit_tree, dist_tree) = decode_trees(&mut br)?;
                inflate_block_data(&mut br, &lit_tree, &dist_tree, dest, &mut dest_len)?;
            }
            _ => {
                return Err(BootCodecError::UnsupportedConfiguration(
                    "DEFLATE block type 3 is reserved",
                ))
            }
        }
        if is_final {
            break;
        }
    }
    Ok(dest_len)
}

fn inflate_stored_block(
    br: &mut BitReader<'_, '_>,
    dest: &mut [u8],
    dest_len: &mut usize,
) -> Result<()> {
    br.align_to_byte();
    let input = br.input_mut();
    let len_bytes = input.seek(2)?;
    let nlen_bytes = input.seek(2)?;
    let len = u16::from_le_bytes(len_bytes.try_into().unwrap());
    let nlen = u16::from_le_bytes(nlen_bytes.try_into().unwrap());
    if len != !nlen {
        return Err(BootCodecError::MalformedHeader(
            "stored block length does not match its one's complement",
        ));
    }
    let bytes = input.seek(len as usize)?;
    let end = *dest_len + bytes.len();
    if end > dest.len() {
        return Err(BootCodecError::OutputOverflow("stored block overflows destination"));
    }
    dest[*dest_len..end].copy_from_slice(bytes);
    *dest_len = end;
    Ok(())
}

fn decode_trees(br: &mut BitReader<'_, '_>) -> Result<(HuffmanTree, HuffmanTree)> {
    let hlit = br.read_bits(5)? as usize + 257;
    let hdist = br.read_bits(5)? as usize + 1;
    let hclen = br.read_bits(4)? as usize + 4;
    if hlit > 286 || hdist > 30 {
        return Err(BootCodecError::MalformedHeader("HLIT/HDIST out of range"));
    }

    let mut cl_lengths = [0u8; 19];
    for i in 0..hclen {
        cl_lengths[CODE_LENGTH_ORDER[i]] = br.read_bits(3)? as u8;
    }
    let cl_tree = HuffmanTree::build(&cl_lengths)?;

    let mut lengths = [0u8; 288 + 30];
    let mut num = 0;
    while num < hlit + hdist {
        let sym = cl_tree.decode_symbol(br)?;
        match sym {
            0..=15 => {
                lengths[num] = sym as u8;
                num += 1;
            }
            16 => {
                if num == 0 {
                    return Err(BootCodecError::MalformedHeader("repeat code with no previous length"));
                }
                let prev = lengths[num - 1];
                let repeat = br.read_bits(2)? as usize + 3;
                for _ in 0..repeat {
                    if num >= lengths.len() {
                        return Err(BootCodecError::MalformedHeader("code length overflow"));
                    }
                    lengths[num] = prev;
                    num += 1;
                }
            }
            17 => {
                let repeat = br.read_bits(3)? as usize + 3;
                num += repeat;
            }
            18 => {
                let repeat = br.read_bits(7)? as usize + 11;
                num += repeat;
            }
            _ => return Err(BootCodecError::MalformedHeader("invalid code-length symbol")),
        }
    }
    if num != hlit + hdist {
        return Err(BootCodecError::MalformedHeader("code-length run overshoots HLIT+HDIST"));
    }
    if lengths[256] == 0 {
        return Err(BootCodecError::MalformedHeader("end-of-block symbol must be coded"));
    }

    let lit_tree = HuffmanTree::build(&lengths[..hlit])?;
    let dist_tree = HuffmanTree::build(&lengths[hlit..hlit + hdist])?;
    Ok((lit_tree, dist_tree))
}

fn inflate_block_data(
    br: &mut BitReader<'_, '_>,
    lit_tree: &HuffmanTree,
    dist_tree: &HuffmanTree,
    dest: &mut [u8],
    dest_len: &mut usize,
) -> Result<()> {
    loop {
        let symbol = lit_tree.decode_symbol(br)?;
        if symbol == 256 {
            return Ok(());
        }
        if symbol < 256 {
            if *dest_len >= dest.len() {
                return Err(BootCodecError::OutputOverflow("literal overflows destination"));
            }
            dest[*dest_len] = symbol as u8;
            *dest_len += 1;
            continue;
        }
        let idx = (symbol - 257) as usize;
        if idx >= LENGTH_BASE.len() {
            return Err(BootCodecError::MalformedHeader("invalid length symbol"));
        }
        let length =
            LENGTH_BASE[idx] as usize + br.read_bits(LENGTH_EXTRA_BITS[idx] as u32)? as usize;

        let dist_symbol = dist_tree.decode_symbol(br)? as usize;
        if dist_symbol >= DIST_BASE.len() {
            return Err(BootCodecError::MalformedHeader("invalid distance symbol"));
        }
        let distance = DIST_BASE[dist_symbol] as usize
            + br.read_bits(DIST_EXTRA_BITS[dist_symbol] as u32)? as usize;

        if distance > *dest_len {
            return Err(BootCodecError::InconsistentSize(
                "back-reference distance exceeds bytes produced so far",
            ));
        }
        if *dest_len + length > dest.len() {
            return Err(BootCodecError::OutputOverflow("match overflows destination"));
        }
        for _ in 0..length {
            let b = dest[*dest_len - distance];
            dest[*dest_len] = b;
            *dest_len += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflate_stored_block_round_trips() {
        // bfinal=1, btype=00, then stored block "hi" (len=2, nlen=!2).
        let mut data = vec![0b0000_0001u8];
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&(!2u16).to_le_bytes());
        data.extend_from_slice(b"hi");
        let mut input = InputCursor::new(&data);
        let mut dest = [0u8; 8];
        let n = inflate(&mut input, &mut dest).unwrap();
        assert_eq!(&dest[..n], b"hi");
    }
}
