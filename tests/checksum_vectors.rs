use enpakk::{block_hash, stream_checksum};

/// Table-driven CRC-8/SMBUS used as an independent reference.
fn reference_crc8(data: &[u8]) -> u8 {
    let mut table = [0u8; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let mut c = i as u8;
        for _ in 0..8 {
            c = if c & 0x80 != 0 { (c << 1) ^ 0x07 } else { c << 1 };
        }
        *slot = c;
    }
    data.iter().fold(0u8, |crc, &b| table[(crc ^ b) as usize])
}

#[test]
fn published_check_values() {
    assert_eq!(block_hash(b"123456789"), 0xF4);
    assert_eq!(stream_checksum(b"123456789"), 0xCBF4_3926);
    assert_eq!(stream_checksum(b""), 0);
}

#[test]
fn block_hash_matches_reference_for_every_block() {
    for b1 in 0..=u8::MAX {
        for b2 in 0..=u8::MAX {
            let block = [b1, b2];
            let first = block_hash(&block);
            assert_eq!(first, block_hash(&block));
            assert_eq!(first, reference_crc8(&block));
        }
    }
}

#[test]
fn example_blocks() {
    assert_eq!(block_hash(&[0x41, 0x42]), 0x87);
    assert_eq!(block_hash(&[0x43, 0x44]), 0xBF);
    assert_eq!(stream_checksum(&[0x41, 0x42, 0x43, 0x44]), 0xDB17_20A5);
}
