use tracing::trace;

use super::{
    ByteField, Direction, FieldWidth, PduConfig, PduType, SegmentationControl, TransactionId,
    TransmissionMode, CFDP_VERSION,
};
use crate::bytes::Bytes;
use crate::{Error, Result};

/// CFDP PDU header.
///
/// ```text
/// | version:3 | type:1 | direction:1 | mode:1 | crc:1 | large file:1 |
/// | data field length:16 |
/// | seg ctrl:1 | entity id len-1:3 | seg metadata:1 | seq num len-1:3 |
/// | source entity id | transaction seq num | dest entity id |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PduHeader {
    pub config: PduConfig,
    pub pdu_type: PduType,
    /// Set if file data PDUs carry segment metadata.
    pub segment_metadata: bool,
    /// Length of everything after the header, including a trailing CRC.
    pub pdu_data_field_len: u16,
}

impl PduHeader {
    /// Bytes preceding the variable width id fields.
    pub const FIXED_LEN: usize = 4;

    #[must_use]
    pub fn new(config: PduConfig, pdu_type: PduType, pdu_data_field_len: u16) -> Self {
        Self {
            config,
            pdu_type,
            segment_metadata: false,
            pdu_data_field_len,
        }
    }

    /// Encoded header length.
    #[must_use]
    pub fn header_len(&self) -> usize {
        Self::FIXED_LEN
            + 2 * self.config.source_entity_id.len()
            + self.config.transaction_seq_num.len()
    }

    /// Header length plus data field length.
    #[must_use]
    pub fn packet_len(&self) -> usize {
        self.header_len() + usize::from(self.pdu_data_field_len)
    }

    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        self.config.transaction_id()
    }

    /// # Errors
    /// [Error::Config] if the entity ids differ in width.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let conf = &self.config;
        conf.validate()?;
        buf.push(
            CFDP_VERSION << 5
                | (self.pdu_type as u8) << 4
                | (conf.direction as u8) << 3
                | (conf.transmission_mode as u8) << 2
                | u8::from(conf.crc_flag) << 1
                | u8::from(conf.large_file),
        );
        buf.extend_from_slice(&self.pdu_data_field_len.to_be_bytes());
        buf.push(
            (conf.segmentation_control as u8) << 7
                | conf.source_entity_id.width().raw() << 4
                | u8::from(self.segment_metadata) << 3
                | conf.transaction_seq_num.width().raw(),
        );
        conf.source_entity_id.encode_into(buf);
        conf.transaction_seq_num.encode_into(buf);
        conf.dest_entity_id.encode_into(buf);
        Ok(())
    }

    /// # Errors
    /// See [PduHeader::encode_into].
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.header_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Decode the header at the start of `buf` without checking the data field length against
    /// the bytes that follow. Returns the header and its encoded length.
    ///
    /// # Errors
    /// [Error::TruncatedHeader] if `buf` is shorter than the header, [Error::UnsupportedVersion]
    /// for anything but CFDP version 2, [Error::InvalidLengthField] for an unsupported id width.
    pub fn decode_prefix(buf: &[u8]) -> Result<(Self, usize)> {
        let header_len = Self::header_len_from_raw(buf)?;
        if buf.len() < header_len {
            return Err(Error::TruncatedHeader {
                actual: buf.len(),
                minimum: header_len,
            });
        }
        let version = buf[0] >> 5;
        if version != CFDP_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let mut bytes = Bytes::new(buf);
        let flags = bytes.next()?;
        let pdu_data_field_len = bytes.u16()?;
        let lens = bytes.next()?;
        let entity_width = FieldWidth::from_raw((lens >> 4) & 0x7)?;
        let seq_width = FieldWidth::from_raw(lens & 0x7)?;

        let source_entity_id = ByteField::new(entity_width, bytes.uint(entity_width.len())?)?;
        let transaction_seq_num = ByteField::new(seq_width, bytes.uint(seq_width.len())?)?;
        let dest_entity_id = ByteField::new(entity_width, bytes.uint(entity_width.len())?)?;

        let config = PduConfig {
            source_entity_id,
            dest_entity_id,
            transaction_seq_num,
            transmission_mode: if flags & 0x04 == 0 {
                TransmissionMode::Acknowledged
            } else {
                TransmissionMode::Unacknowledged
            },
            direction: if flags & 0x08 == 0 {
                Direction::TowardsReceiver
            } else {
                Direction::TowardsSender
            },
            crc_flag: flags & 0x02 != 0,
            large_file: flags & 0x01 != 0,
            segmentation_control: if lens & 0x80 == 0 {
                SegmentationControl::NoRecordBoundaryPreservation
            } else {
                SegmentationControl::RecordBoundaryPreservation
            },
        };
        let header = PduHeader {
            config,
            pdu_type: if flags & 0x10 == 0 {
                PduType::FileDirective
            } else {
                PduType::FileData
            },
            segment_metadata: lens & 0x08 != 0,
            pdu_data_field_len,
        };
        trace!(?header, "decoded pdu header");
        Ok((header, bytes.offset()))
    }

    /// Decode a header from a buffer holding exactly one PDU.
    ///
    /// # Errors
    /// [Error::HeaderLengthMismatch] if the data field length does not match the bytes following
    /// the header, otherwise see [PduHeader::decode_prefix].
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let (header, header_len) = Self::decode_prefix(buf)?;
        let actual = buf.len() - header_len;
        let declared = usize::from(header.pdu_data_field_len);
        if actual != declared {
            return Err(Error::HeaderLengthMismatch { declared, actual });
        }
        Ok(header)
    }

    /// Header length from the fixed part of a raw header.
    ///
    /// # Errors
    /// [Error::TruncatedHeader] if there are fewer than [PduHeader::FIXED_LEN] bytes,
    /// [Error::InvalidLengthField] for an unsupported id width.
    pub fn header_len_from_raw(buf: &[u8]) -> Result<usize> {
        if buf.len() < Self::FIXED_LEN {
            return Err(Error::TruncatedHeader {
                actual: buf.len(),
                minimum: Self::FIXED_LEN,
            });
        }
        let entity_width = FieldWidth::from_raw((buf[3] >> 4) & 0x7)?;
        let seq_width = FieldWidth::from_raw(buf[3] & 0x7)?;
        Ok(Self::FIXED_LEN + 2 * entity_width.len() + seq_width.len())
    }

    /// Total PDU length from the fixed part of a raw header.
    ///
    /// # Errors
    /// See [PduHeader::header_len_from_raw].
    pub fn packet_len_from_raw(buf: &[u8]) -> Result<usize> {
        let header_len = Self::header_len_from_raw(buf)?;
        Ok(header_len + usize::from(u16::from_be_bytes([buf[1], buf[2]])))
    }
}
