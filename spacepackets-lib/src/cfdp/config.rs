use typed_builder::TypedBuilder;

use super::{ByteField, Direction, SegmentationControl, TransactionId, TransmissionMode};
use crate::{Error, Result};

/// CRC used for the PDU CRC field when a header's CRC flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrcAlgorithm {
    /// CRC-16/CCITT-FALSE, the CFDP default.
    #[default]
    Crc16CcittFalse,
    Crc32,
    Crc32c,
}

const CRC16: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_IBM_3740);
const CRC32: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);
const CRC32C: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISCSI);

impl CrcAlgorithm {
    /// Bytes occupied by the CRC field.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            CrcAlgorithm::Crc16CcittFalse => 2,
            CrcAlgorithm::Crc32 | CrcAlgorithm::Crc32c => 4,
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        false
    }

    #[must_use]
    pub fn checksum(self, dat: &[u8]) -> u32 {
        match self {
            CrcAlgorithm::Crc16CcittFalse => u32::from(CRC16.checksum(dat)),
            CrcAlgorithm::Crc32 => CRC32.checksum(dat),
            CrcAlgorithm::Crc32c => CRC32C.checksum(dat),
        }
    }
}

/// Codec settings that are not carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CfdpConfig {
    #[builder(default)]
    pub crc: CrcAlgorithm,
}

/// PDU header values shared by all PDUs of a transaction.
///
/// # Example
/// ```
/// use spacepackets::cfdp::{ByteField, PduConfig, TransmissionMode};
///
/// let conf = PduConfig::builder()
///     .source_entity_id(ByteField::u16(1))
///     .dest_entity_id(ByteField::u16(2))
///     .transaction_seq_num(ByteField::u8(7))
///     .transmission_mode(TransmissionMode::Unacknowledged)
///     .build();
/// assert_eq!(conf.header_len().unwrap(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PduConfig {
    pub source_entity_id: ByteField,
    pub dest_entity_id: ByteField,
    pub transaction_seq_num: ByteField,
    #[builder(default)]
    pub transmission_mode: TransmissionMode,
    #[builder(default)]
    pub direction: Direction,
    #[builder(default)]
    pub crc_flag: bool,
    #[builder(default)]
    pub large_file: bool,
    #[builder(default)]
    pub segmentation_control: SegmentationControl,
}

impl Default for PduConfig {
    fn default() -> Self {
        Self::builder()
            .source_entity_id(ByteField::u8(0))
            .dest_entity_id(ByteField::u8(0))
            .transaction_seq_num(ByteField::u8(0))
            .build()
    }
}

impl PduConfig {
    /// Check that source and destination entity ids have the same width.
    ///
    /// # Errors
    /// [Error::Config] if they do not.
    pub fn validate(&self) -> Result<()> {
        if self.source_entity_id.width() != self.dest_entity_id.width() {
            return Err(Error::Config(format!(
                "source and destination entity ids must have the same width; got {} and {}",
                self.source_entity_id.len(),
                self.dest_entity_id.len()
            )));
        }
        Ok(())
    }

    /// Encoded PDU header length for this configuration.
    ///
    /// # Errors
    /// See [PduConfig::validate].
    pub fn header_len(&self) -> Result<usize> {
        self.validate()?;
        Ok(4 + 2 * self.source_entity_id.len() + self.transaction_seq_num.len())
    }

    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        TransactionId {
            source_entity_id: self.source_entity_id,
            seq_num: self.transaction_seq_num,
        }
    }
}
