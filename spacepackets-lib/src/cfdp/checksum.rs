use super::wire_enum;
use crate::{Error, Result};

/// File checksum algorithm, as named in Metadata PDUs and used for the EOF PDU checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChecksumType {
    /// Sum of big-endian 32-bit words
    #[default]
    Modular = 0,
    Crc32Proximity1 = 1,
    Crc32c = 2,
    /// IEEE 802.3 CRC-32
    Crc32 = 3,
    /// Always 0
    Null = 15,
}
wire_enum!(ChecksumType {
    Modular,
    Crc32Proximity1,
    Crc32c,
    Crc32,
    Null
});

const CRC32: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);
const CRC32C: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISCSI);

fn modular(dat: &[u8]) -> u32 {
    dat.chunks(4).fold(0u32, |acc, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        acc.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Checksum of a complete file's contents.
///
/// # Errors
/// [Error::UnsupportedChecksum] for [ChecksumType::Crc32Proximity1].
pub fn calculate_checksum(checksum_type: ChecksumType, dat: &[u8]) -> Result<u32> {
    match checksum_type {
        ChecksumType::Modular => Ok(modular(dat)),
        ChecksumType::Crc32 => Ok(CRC32.checksum(dat)),
        ChecksumType::Crc32c => Ok(CRC32C.checksum(dat)),
        ChecksumType::Null => Ok(0),
        ChecksumType::Crc32Proximity1 => Err(Error::UnsupportedChecksum(checksum_type)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modular_pads_last_word() {
        let dat = [0x01, 0x02, 0x03, 0x04, 0x10, 0x20];
        assert_eq!(
            calculate_checksum(ChecksumType::Modular, &dat).unwrap(),
            0x0102_0304 + 0x1020_0000
        );
    }

    #[test]
    fn modular_wraps() {
        let dat = [0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x02];
        assert_eq!(calculate_checksum(ChecksumType::Modular, &dat).unwrap(), 1);
    }

    #[test]
    fn crcs() {
        assert_eq!(
            calculate_checksum(ChecksumType::Crc32, b"123456789").unwrap(),
            0xcbf4_3926
        );
        assert_eq!(
            calculate_checksum(ChecksumType::Crc32c, b"123456789").unwrap(),
            0xe306_9283
        );
        assert_eq!(calculate_checksum(ChecksumType::Null, b"anything").unwrap(), 0);
        assert_eq!(calculate_checksum(ChecksumType::Modular, &[]).unwrap(), 0);
    }

    #[test]
    fn proximity1_unsupported() {
        assert_eq!(
            calculate_checksum(ChecksumType::Crc32Proximity1, b"x").unwrap_err(),
            Error::UnsupportedChecksum(ChecksumType::Crc32Proximity1)
        );
    }
}
