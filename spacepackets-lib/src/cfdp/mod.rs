//! CCSDS File Delivery Protocol PDUs.
//!
//! Reference: [CFDP](https://public.ccsds.org/Pubs/727x0b5.pdf)
mod checksum;
mod config;
mod header;
pub mod lv;
pub mod pdu;
pub mod reserved;
pub mod tlv;

use std::fmt::Display;

use crate::bits::min_bytes;
use crate::bytes::be_bytes;
use crate::{Error, Result};

pub use checksum::{calculate_checksum, ChecksumType};
pub use config::{CfdpConfig, CrcAlgorithm, PduConfig};
pub use header::PduHeader;
pub use pdu::{Pdu, PduBody};

/// CFDP protocol version 2, as found in the PDU header.
pub const CFDP_VERSION: u8 = 0b001;

/// Implements `TryFrom<u8>` for a fieldless enum with explicit discriminants, failing with
/// [Error::InvalidEnum].
macro_rules! wire_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl TryFrom<u8> for $name {
            type Error = Error;

            fn try_from(value: u8) -> Result<Self> {
                $(
                    if value == $name::$variant as u8 {
                        return Ok($name::$variant);
                    }
                )+
                Err(Error::InvalidEnum {
                    name: stringify!($name),
                    value,
                })
            }
        }
    };
}
pub(crate) use wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PduType {
    #[default]
    FileDirective = 0,
    FileData = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    TowardsReceiver = 0,
    TowardsSender = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransmissionMode {
    #[default]
    Acknowledged = 0,
    Unacknowledged = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentationControl {
    #[default]
    NoRecordBoundaryPreservation = 0,
    RecordBoundaryPreservation = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectiveCode {
    Eof = 0x04,
    Finished = 0x05,
    Ack = 0x06,
    Metadata = 0x07,
    Nak = 0x08,
    Prompt = 0x09,
    KeepAlive = 0x0c,
}
wire_enum!(DirectiveCode {
    Eof,
    Finished,
    Ack,
    Metadata,
    Nak,
    Prompt,
    KeepAlive
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionCode {
    #[default]
    NoError = 0b0000,
    PositiveAckLimitReached = 0b0001,
    KeepAliveLimitReached = 0b0010,
    InvalidTransmissionMode = 0b0011,
    FilestoreRejection = 0b0100,
    FileChecksumFailure = 0b0101,
    FileSizeError = 0b0110,
    NakLimitReached = 0b0111,
    InactivityDetected = 0b1000,
    CheckLimitReached = 0b1010,
    UnsupportedChecksumType = 0b1011,
    SuspendRequestReceived = 0b1110,
    CancelRequestReceived = 0b1111,
}
wire_enum!(ConditionCode {
    NoError,
    PositiveAckLimitReached,
    KeepAliveLimitReached,
    InvalidTransmissionMode,
    FilestoreRejection,
    FileChecksumFailure,
    FileSizeError,
    NakLimitReached,
    InactivityDetected,
    CheckLimitReached,
    UnsupportedChecksumType,
    SuspendRequestReceived,
    CancelRequestReceived,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeliveryCode {
    #[default]
    Complete = 0,
    Incomplete = 1,
}
wire_enum!(DeliveryCode {
    Complete,
    Incomplete
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileStatus {
    DiscardedDeliberately = 0b00,
    DiscardedFilestoreRejection = 0b01,
    Retained = 0b10,
    #[default]
    Unreported = 0b11,
}
wire_enum!(FileStatus {
    DiscardedDeliberately,
    DiscardedFilestoreRejection,
    Retained,
    Unreported
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransactionStatus {
    /// Transaction is not currently active and the CFDP implementation does not retain a
    /// record of it
    #[default]
    Undefined = 0b00,
    Active = 0b01,
    Terminated = 0b10,
    /// CFDP implementation does not retain a record of the transaction
    Unrecognized = 0b11,
}
wire_enum!(TransactionStatus {
    Undefined,
    Active,
    Terminated,
    Unrecognized
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FaultHandlerCode {
    NoticeOfCancellation = 0b0001,
    NoticeOfSuspension = 0b0010,
    IgnoreError = 0b0011,
    AbandonTransaction = 0b0100,
}
wire_enum!(FaultHandlerCode {
    NoticeOfCancellation,
    NoticeOfSuspension,
    IgnoreError,
    AbandonTransaction
});

/// Byte width of entity ids and transaction sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldWidth {
    #[default]
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl FieldWidth {
    #[must_use]
    pub fn len(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        false
    }

    /// The 3-bit header representation, width minus 1.
    #[must_use]
    pub fn raw(self) -> u8 {
        self as u8 - 1
    }

    /// # Errors
    /// [Error::InvalidLengthField] for anything other than 0, 1, 3 or 7.
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(FieldWidth::One),
            1 => Ok(FieldWidth::Two),
            3 => Ok(FieldWidth::Four),
            7 => Ok(FieldWidth::Eight),
            _ => Err(Error::InvalidLengthField(raw)),
        }
    }

    /// # Errors
    /// [Error::InvalidLengthField] for anything other than 1, 2, 4 or 8.
    pub fn from_len(len: usize) -> Result<Self> {
        match len {
            1 => Ok(FieldWidth::One),
            2 => Ok(FieldWidth::Two),
            4 => Ok(FieldWidth::Four),
            8 => Ok(FieldWidth::Eight),
            _ => Err(Error::InvalidLengthField(len.min(usize::from(u8::MAX)) as u8)),
        }
    }

    /// Smallest width that holds `value`.
    #[must_use]
    pub fn fitting(value: u64) -> Self {
        match min_bytes(value) {
            1 => FieldWidth::One,
            2 => FieldWidth::Two,
            3 | 4 => FieldWidth::Four,
            _ => FieldWidth::Eight,
        }
    }

    #[must_use]
    pub fn max_value(self) -> u64 {
        match self {
            FieldWidth::Eight => u64::MAX,
            w => (1u64 << (8 * w.len())) - 1,
        }
    }
}

/// Unsigned value with an explicit byte width, used for entity ids and transaction sequence
/// numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteField {
    width: FieldWidth,
    value: u64,
}

impl ByteField {
    /// # Errors
    /// [Error::ValueTooLarge] if `value` does not fit `width`.
    pub fn new(width: FieldWidth, value: u64) -> Result<Self> {
        if value > width.max_value() {
            return Err(Error::ValueTooLarge {
                value,
                bits: 8 * width.len() as u32,
            });
        }
        Ok(Self { width, value })
    }

    #[must_use]
    pub fn u8(value: u8) -> Self {
        Self {
            width: FieldWidth::One,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn u16(value: u16) -> Self {
        Self {
            width: FieldWidth::Two,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn u32(value: u32) -> Self {
        Self {
            width: FieldWidth::Four,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn u64(value: u64) -> Self {
        Self {
            width: FieldWidth::Eight,
            value,
        }
    }

    #[must_use]
    pub fn width(&self) -> FieldWidth {
        self.width
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.width.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend(be_bytes(self.value, self.width.len()));
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        self.encode_into(&mut buf);
        buf
    }

    /// Decode from the raw bytes of the field, which must be 1, 2, 4 or 8 bytes long.
    ///
    /// # Errors
    /// [Error::InvalidLengthField] for other lengths.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let width = FieldWidth::from_len(buf.len())?;
        Ok(Self {
            width,
            value: crate::bytes::be_uint(buf),
        })
    }
}

impl Display for ByteField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Uniquely identifies a transaction: the source entity plus its sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransactionId {
    pub source_entity_id: ByteField,
    pub seq_num: ByteField,
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.source_entity_id, self.seq_num)
    }
}
