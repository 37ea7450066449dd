//! The `.enpakk` container.
//!
//! Layout:
//! - bytes `[0, 4)` : CRC-32 of the original stream, little endian
//! - bytes `[4, end)`: one CRC-8 per 2-byte block, in block order

use crate::checksum::{block_hash, stream_checksum};
use crate::{EnpakkError, BLOCK_SIZE, CHECKSUM_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStream {
    pub expected_checksum: u32,
    pub hashes: Vec<u8>,
}

impl EncodedStream {
    /// Parse an encoded stream. Inputs of [`CHECKSUM_SIZE`] bytes or fewer
    /// carry no blocks and are rejected.
    pub fn decode(data: &[u8]) -> Result<Self, EnpakkError> {
        if data.len() <= CHECKSUM_SIZE {
            return Err(EnpakkError::Format(format!(
                "input is {} bytes, need more than {}",
                data.len(),
                CHECKSUM_SIZE
            )));
        }
        let (header, hashes) = data.split_at(CHECKSUM_SIZE);
        let mut raw = [0u8; CHECKSUM_SIZE];
        raw.copy_from_slice(header);
        Ok(Self {
            expected_checksum: u32::from_le_bytes(raw),
            hashes: hashes.to_vec(),
        })
    }

    /// Fingerprint `data`. A trailing odd byte is zero padded to a full
    /// block and the checksum covers the padded stream.
    pub fn encode(data: &[u8]) -> Self {
        let mut padded = data.to_vec();
        if padded.len() % BLOCK_SIZE != 0 {
            padded.resize(padded.len() + BLOCK_SIZE - padded.len() % BLOCK_SIZE, 0);
        }
        Self {
            expected_checksum: stream_checksum(&padded),
            hashes: padded.chunks(BLOCK_SIZE).map(block_hash).collect(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CHECKSUM_SIZE + self.hashes.len());
        out.extend_from_slice(&self.expected_checksum.to_le_bytes());
        out.extend_from_slice(&self.hashes);
        out
    }

    /// Number of blocks to reconstruct.
    pub fn block_count(&self) -> usize {
        self.hashes.len()
    }

    /// Length in bytes of the reconstructed stream.
    pub fn output_len(&self) -> usize {
        self.hashes.len() * BLOCK_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn checksum_is_little_endian() {
        let s = EncodedStream::decode(&[0x78, 0x56, 0x34, 0x12, 0xAA]).unwrap();
        assert_eq!(s.expected_checksum, 0x1234_5678);
        assert_eq!(s.hashes, vec![0xAA]);
        assert_eq!(s.output_len(), 2);
    }

    #[test]
    fn header_only_is_rejected() {
        assert!(matches!(
            EncodedStream::decode(&[1, 2, 3, 4]),
            Err(EnpakkError::Format(_))
        ));
    }

    #[test]
    fn odd_input_is_padded() {
        let s = EncodedStream::encode(&[0x41, 0x42, 0x43]);
        assert_eq!(s.block_count(), 2);
        assert_eq!(s.hashes[1], block_hash(&[0x43, 0x00]));
        assert_eq!(s.expected_checksum, stream_checksum(&[0x41, 0x42, 0x43, 0x00]));
    }

    quickcheck! {
        fn prop_one_hash_per_block(data: Vec<u8>) -> bool {
            let s = EncodedStream::encode(&data);
            s.block_count() == (data.len() + 1) / 2
                && data
                    .chunks(BLOCK_SIZE)
                    .zip(&s.hashes)
                    .all(|(chunk, &h)| chunk.len() < BLOCK_SIZE || block_hash(chunk) == h)
        }
    }
}
