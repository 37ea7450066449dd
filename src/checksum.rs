//! The two hash functions of the format.
//!
//! `block_hash` is CRC-8 with polynomial 0x07, MSB first, zero initial
//! state and no final XOR (CRC-8/SMBUS). `stream_checksum` is the common
//! CRC-32 (ISO-HDLC, as used by zlib and gzip).

const CRC8_POLY: u8 = 0x07;

/// 8-bit fingerprint of one block.
pub fn block_hash(block: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in block {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// 32-bit checksum of the full byte stream.
pub fn stream_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
