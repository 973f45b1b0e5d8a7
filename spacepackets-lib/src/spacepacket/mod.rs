//! CCSDS space packets.
//!
//! Reference: [Space Packet Protocol](https://public.ccsds.org/Pubs/133x0b2e1.pdf)
use std::fmt::Display;

use tracing::{debug, trace};
use typed_builder::TypedBuilder;

use crate::seqcount::{SequenceCounter, SEQ_COUNT_MAX};
use crate::{Error, Result};

pub use crate::seqcount::missing_packets;

pub type Apid = u16;

/// Largest 11-bit APID.
pub const APID_MAX: Apid = 0x7ff;
/// APID reserved for idle packets.
pub const APID_IDLE: Apid = 0x7ff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PacketType {
    #[default]
    Tm = 0,
    Tc = 1,
}

impl From<bool> for PacketType {
    fn from(value: bool) -> Self {
        if value {
            PacketType::Tc
        } else {
            PacketType::Tm
        }
    }
}

/// Packet grouping, per the sequence flags of the primary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceFlags {
    /// Part of a packet group, but not first and not last
    Continuation = 0,
    /// First packet in a packet group
    First = 1,
    /// Last packet in a packet group
    Last = 2,
    /// Not part of a packet group, i.e., standalone.
    #[default]
    Unsegmented = 3,
}

impl From<u8> for SequenceFlags {
    fn from(value: u8) -> Self {
        match value & 0x3 {
            0 => SequenceFlags::Continuation,
            1 => SequenceFlags::First,
            2 => SequenceFlags::Last,
            _ => SequenceFlags::Unsegmented,
        }
    }
}

/// CCSDS Primary Header
///
/// The primary header format is common to all CCSDS space packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimaryHeader {
    /// Always 0 for packets this crate produces or accepts.
    pub version: u8,
    pub packet_type: PacketType,
    pub has_secondary_header: bool,
    pub apid: Apid,
    pub sequence_flags: SequenceFlags,
    pub sequence_count: u16,
    /// Packet data length minus 1, as read from the wire. Ignored by [PrimaryHeader::encode],
    /// which derives it from the payload length.
    pub len_minus1: u16,
}

impl PrimaryHeader {
    /// Size of a ``PrimaryHeader``
    pub const LEN: usize = 6;
    pub const SEQ_MAX: u16 = SEQ_COUNT_MAX;
    /// Largest payload a single packet can carry.
    pub const MAX_DATA_LEN: usize = 65536;

    /// Packet identification: type, secondary header flag and APID.
    #[must_use]
    pub fn packet_id(&self) -> u16 {
        packet_id(self.packet_type, self.has_secondary_header, self.apid)
    }

    /// Packet sequence control: sequence flags and count.
    #[must_use]
    pub fn packet_seq_ctrl(&self) -> u16 {
        (self.sequence_flags as u16) << 14 | (self.sequence_count & SEQ_COUNT_MAX)
    }

    /// Number of data bytes following the header, per the length field.
    #[must_use]
    pub fn data_len(&self) -> usize {
        usize::from(self.len_minus1) + 1
    }

    /// Total packet length, per the length field.
    #[must_use]
    pub fn packet_len(&self) -> usize {
        Self::LEN + self.data_len()
    }

    /// Encode for a packet carrying `data_len` bytes after the header.
    ///
    /// # Errors
    /// [Error::ValueOutOfRange] if `data_len` is 0 or more than 65536, [Error::ValueTooLarge] if
    /// the APID or sequence count do not fit their fields, and [Error::ReservedVersion] if the
    /// version is not 0.
    pub fn encode(&self, data_len: usize) -> Result<[u8; Self::LEN]> {
        if self.version != 0 {
            return Err(Error::ReservedVersion(self.version));
        }
        if self.apid > APID_MAX {
            return Err(Error::ValueTooLarge {
                value: u64::from(self.apid),
                bits: 11,
            });
        }
        if self.sequence_count > SEQ_COUNT_MAX {
            return Err(Error::ValueTooLarge {
                value: u64::from(self.sequence_count),
                bits: 14,
            });
        }
        if !(1..=Self::MAX_DATA_LEN).contains(&data_len) {
            return Err(Error::ValueOutOfRange(format!(
                "packet data length must be 1 to {}; got {data_len}",
                Self::MAX_DATA_LEN
            )));
        }
        let mut buf = [0u8; Self::LEN];
        buf[..2].copy_from_slice(&self.packet_id().to_be_bytes());
        buf[2..4].copy_from_slice(&self.packet_seq_ctrl().to_be_bytes());
        buf[4..].copy_from_slice(&((data_len - 1) as u16).to_be_bytes());
        Ok(buf)
    }

    /// Decode from bytes.
    ///
    /// # Errors
    /// [Error::TruncatedHeader] if there are fewer than [PrimaryHeader::LEN] bytes,
    /// [Error::ReservedVersion] if the version is not 0.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::LEN {
            return Err(Error::TruncatedHeader {
                actual: buf.len(),
                minimum: Self::LEN,
            });
        }
        let d1 = u16::from_be_bytes([buf[0], buf[1]]);
        let d2 = u16::from_be_bytes([buf[2], buf[3]]);
        let d3 = u16::from_be_bytes([buf[4], buf[5]]);

        let version = (d1 >> 13 & 0x7) as u8;
        if version != 0 {
            return Err(Error::ReservedVersion(version));
        }
        Ok(PrimaryHeader {
            version,
            packet_type: PacketType::from(d1 >> 12 & 0x1 == 1),
            has_secondary_header: (d1 >> 11 & 0x1) == 1,
            apid: (d1 & APID_MAX),
            sequence_flags: SequenceFlags::from((d2 >> 14 & 0x3) as u8),
            sequence_count: (d2 & SEQ_COUNT_MAX),
            len_minus1: d3,
        })
    }
}

/// Compose a 13-bit packet id.
#[must_use]
pub fn packet_id(packet_type: PacketType, has_secondary_header: bool, apid: Apid) -> u16 {
    (packet_type as u16) << 12 | u16::from(has_secondary_header) << 11 | (apid & APID_MAX)
}

/// A space packet: primary header plus packet data, which includes any secondary header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpacePacket {
    pub header: PrimaryHeader,
    pub data: Vec<u8>,
}

impl Display for SpacePacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SpacePacket{{header: {:?}, data:[len={}]}}",
            self.header,
            self.data.len()
        )
    }
}

impl SpacePacket {
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.header.sequence_flags == SequenceFlags::First
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.header.sequence_flags == SequenceFlags::Last
    }

    #[must_use]
    pub fn is_cont(&self) -> bool {
        self.header.sequence_flags == SequenceFlags::Continuation
    }

    #[must_use]
    pub fn is_standalone(&self) -> bool {
        self.header.sequence_flags == SequenceFlags::Unsegmented
    }

    /// Encode header and data. The header length field is computed from the data.
    ///
    /// # Errors
    /// See [PrimaryHeader::encode].
    pub fn encode(&self) -> Result<Vec<u8>> {
        let header = self.header.encode(self.data.len())?;
        let mut buf = Vec::with_capacity(PrimaryHeader::LEN + self.data.len());
        buf.extend_from_slice(&header);
        buf.extend_from_slice(&self.data);
        Ok(buf)
    }

    /// Decode a single packet from the start of `buf`, returning it and its total length. Bytes
    /// beyond the packet length are ignored.
    ///
    /// # Errors
    /// [Error::BufferUnderflow] if `buf` is shorter than the header length field says, or any
    /// error from [PrimaryHeader::decode].
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let header = PrimaryHeader::decode(buf)?;
        let total = header.packet_len();
        if buf.len() < total {
            return Err(Error::BufferUnderflow {
                actual: buf.len(),
                minimum: total,
            });
        }
        Ok((
            SpacePacket {
                header,
                data: buf[PrimaryHeader::LEN..total].to_vec(),
            },
            total,
        ))
    }
}

/// Fixed header values for packets produced by a [PacketAssembler].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpacePacketConfig {
    pub apid: Apid,
    #[builder(default)]
    pub packet_type: PacketType,
    #[builder(default)]
    pub has_secondary_header: bool,
    #[builder(default = SequenceFlags::Unsegmented)]
    pub sequence_flags: SequenceFlags,
}

/// Builds space packets from payloads, numbering them with a [SequenceCounter].
#[derive(Debug, Clone)]
pub struct PacketAssembler {
    config: SpacePacketConfig,
    counter: SequenceCounter,
}

impl PacketAssembler {
    /// # Errors
    /// [Error::Config] if the APID is larger than [APID_MAX].
    pub fn new(config: SpacePacketConfig) -> Result<Self> {
        Self::with_counter(config, SequenceCounter::new())
    }

    /// # Errors
    /// [Error::Config] if the APID is larger than [APID_MAX] or the counter is wider than 14
    /// bits.
    pub fn with_counter(config: SpacePacketConfig, counter: SequenceCounter) -> Result<Self> {
        if config.apid > APID_MAX {
            return Err(Error::Config(format!(
                "APID must be at most {APID_MAX:#x}; got {:#x}",
                config.apid
            )));
        }
        if counter.bits() > 14 {
            return Err(Error::Config(format!(
                "sequence counter must be at most 14 bits wide; got {}",
                counter.bits()
            )));
        }
        Ok(Self { config, counter })
    }

    #[must_use]
    pub fn counter(&self) -> &SequenceCounter {
        &self.counter
    }

    #[must_use]
    pub fn header(&self) -> PrimaryHeader {
        PrimaryHeader {
            version: 0,
            packet_type: self.config.packet_type,
            has_secondary_header: self.config.has_secondary_header,
            apid: self.config.apid,
            sequence_flags: self.config.sequence_flags,
            sequence_count: self.counter.peek(),
            len_minus1: 0,
        }
    }

    /// Encode `payload` as a packet with the next sequence count. The counter only advances if
    /// encoding succeeds.
    ///
    /// # Errors
    /// See [PrimaryHeader::encode].
    pub fn assemble(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let header = self.header().encode(payload.len())?;
        let count = self.counter.next();
        trace!(apid = self.config.apid, count, len = payload.len(), "assembled packet");
        let mut buf = Vec::with_capacity(PrimaryHeader::LEN + payload.len());
        buf.extend_from_slice(&header);
        buf.extend_from_slice(payload);
        Ok(buf)
    }
}

/// Result of [split_packets].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<'a> {
    /// Complete packets, in stream order.
    pub packets: Vec<&'a [u8]>,
    /// Number of leading bytes of the input that were processed. Anything after this is the
    /// start of a packet that is not yet complete, or too short to tell.
    pub consumed: usize,
}

/// Scan `buf` for packets whose packet id (see [packet_id]) is in `ids`.
///
/// Bytes that do not start a packet with a wanted id are skipped one at a time. Scanning stops
/// at the first wanted packet that is not complete, so the remainder can be retried once more
/// data has arrived.
#[must_use]
pub fn split_packets<'a>(buf: &'a [u8], ids: &[u16]) -> Split<'a> {
    let mut packets = Vec::default();
    let mut offset = 0;
    let mut skipped = 0;
    while buf.len() - offset >= 2 {
        let rest = &buf[offset..];
        let word = u16::from_be_bytes([rest[0], rest[1]]);
        if word >> 13 != 0 || !ids.contains(&(word & 0x1fff)) {
            offset += 1;
            skipped += 1;
            continue;
        }
        let Ok(header) = PrimaryHeader::decode(rest) else {
            break;
        };
        if rest.len() < header.packet_len() {
            break;
        }
        packets.push(&rest[..header.packet_len()]);
        offset += header.packet_len();
    }
    if skipped > 0 {
        debug!(skipped, "skipped bytes not starting a wanted packet");
    }
    Split {
        packets,
        consumed: offset,
    }
}
