//! CRC32 (gzip, optional XZ integrity) and Adler-32 (zlib wrapper, referenced
//! for completeness only).
//!
//! Rust port of `tinf/crc32.c`: a nibble-at-a-time table-driven CRC32 using
//! the reversed polynomial `0xEDB88320`.

const POLY: u32 = 0xEDB8_8320;

fn table_entry(nibble: u32) -> u32 {
    let mut c = nibble;
    let mut k = 0;
    while k < 4 {
        c = if c & 1 != 0 { POLY ^ (c >> 1) } else { c >> 1 };
        k += 1;
    }
    c
}

/// Computes the CRC32 of `data`, seeded from `prev` (pass `0` for a fresh checksum).
/// `prev` is the running CRC, not yet complemented, matching `tinf_crc32`'s signature.
pub fn crc32(data: &[u8], prev: u32) -> u32 {
    let mut crc = prev ^ 0xFFFF_FFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0x0F) as u32;
        crc = table_entry(index) ^ (crc >> 4);
        let index = ((crc ^ (byte as u32 >> 4)) & 0x0F) as u32;
        crc = table_entry(index) ^ (crc >> 4);
    }
    crc ^ 0xFFFF_FFFF
}

/// Adler-32 checksum, as used by the zlib wrapper. Not exercised by the
/// payload loader, kept for parity with the upstream checksum family.
pub fn adler32(data: &[u8], prev: u32) -> u32 {
    const MOD_ADLER: u32 = 65521;
    let mut a = prev & 0xFFFF;
    let mut b = (prev >> 16) & 0xFFFF;
    if a == 0 && b == 0 {
        a = 1;
    }
    for &byte in data {
        a = (a + byte as u32) % MOD_ADLER;
        b = (b + a) % MOD_ADLER;
    }
    (b << 16) | a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_of_known_string() {
        assert_eq!(crc32(b"123456789", 0), 0xCBF4_3926);
    }

    #[test]
    fn crc32_empty_is_zero() {
        assert_eq!(crc32(b"", 0), 0);
    }

    #[test]
    fn adler32_of_known_string() {
        assert_eq!(adler32(b"Wikipedia", 0), 0x11E6_0398);
    }
}
