use typed_builder::TypedBuilder;

use super::{check_crc, check_version, encode_packet, split_packet, CRC_LEN, PUS_VERSION};
use crate::bytes::Bytes;
use crate::spacepacket::{Apid, PacketType, PrimaryHeader, SequenceFlags};
use crate::{Error, Result, Validated};

pub const ACK_ACCEPTANCE: u8 = 0b1000;
pub const ACK_START: u8 = 0b0100;
pub const ACK_PROGRESS: u8 = 0b0010;
pub const ACK_COMPLETION: u8 = 0b0001;
pub const ACK_ALL: u8 = ACK_ACCEPTANCE | ACK_START | ACK_PROGRESS | ACK_COMPLETION;

/// Telecommand secondary header.
///
/// ```text
/// | version:4 | ack flags:4 | service:8 | subservice:8 | source id:16 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TcSecondaryHeader {
    pub service: u8,
    pub subservice: u8,
    /// Which verification reports the sender wants; only the low 4 bits are used.
    #[builder(default = ACK_ALL)]
    pub ack_flags: u8,
    #[builder(default)]
    pub source_id: u16,
}

impl TcSecondaryHeader {
    pub const LEN: usize = 5;

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(PUS_VERSION << 4 | (self.ack_flags & 0xf));
        buf.push(self.service);
        buf.push(self.subservice);
        buf.extend_from_slice(&self.source_id.to_be_bytes());
    }

    fn read(bytes: &mut Bytes) -> Result<Self> {
        let first = bytes.next()?;
        check_version(first)?;
        Ok(Self {
            ack_flags: first & 0xf,
            service: bytes.next()?,
            subservice: bytes.next()?,
            source_id: bytes.u16()?,
        })
    }
}

/// PUS-C telecommand packet.
///
/// # Example
/// ```
/// use spacepackets::pus::{PusTc, TcSecondaryHeader};
///
/// let sec = TcSecondaryHeader::builder().service(17).subservice(1).build();
/// let ping = PusTc::new(0x02, 34, sec, &[]);
/// let raw = ping.encode().unwrap();
/// assert_eq!(raw.len(), 13);
///
/// let (decoded, len) = PusTc::decode(&raw).unwrap();
/// assert_eq!(len, 13);
/// assert_eq!(decoded.into_result().unwrap(), ping);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PusTc {
    pub apid: Apid,
    pub sequence_flags: SequenceFlags,
    pub sequence_count: u16,
    pub sec_header: TcSecondaryHeader,
    pub app_data: Vec<u8>,
}

impl PusTc {
    /// Unsegmented telecommand.
    #[must_use]
    pub fn new(
        apid: Apid,
        sequence_count: u16,
        sec_header: TcSecondaryHeader,
        app_data: &[u8],
    ) -> Self {
        Self {
            apid,
            sequence_flags: SequenceFlags::Unsegmented,
            sequence_count,
            sec_header,
            app_data: app_data.to_vec(),
        }
    }

    /// Primary header for this packet. The length field saturates at `u16::MAX` for data
    /// too long to encode; [Self::encode] rejects such packets.
    #[must_use]
    pub fn primary_header(&self) -> PrimaryHeader {
        let data_len = TcSecondaryHeader::LEN + self.app_data.len() + CRC_LEN;
        PrimaryHeader {
            packet_type: PacketType::Tc,
            has_secondary_header: true,
            apid: self.apid,
            sequence_flags: self.sequence_flags,
            sequence_count: self.sequence_count,
            len_minus1: u16::try_from(data_len - 1).unwrap_or(u16::MAX),
            ..Default::default()
        }
    }

    /// Encoded packet length.
    #[must_use]
    pub fn len(&self) -> usize {
        PrimaryHeader::LEN + TcSecondaryHeader::LEN + self.app_data.len() + CRC_LEN
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// # Errors
    /// See [PrimaryHeader::encode].
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(TcSecondaryHeader::LEN + self.app_data.len());
        self.sec_header.encode_into(&mut body);
        body.extend_from_slice(&self.app_data);
        encode_packet(&self.primary_header(), &body)
    }

    /// Decode the telecommand at the start of `buf`, returning it and the number of bytes
    /// consumed. A CRC mismatch is reported in [Validated::error], or returned as the error if
    /// the secondary header does not decode either.
    ///
    /// # Errors
    /// [Error::PacketTypeMismatch] for telemetry, [Error::MissingSecondaryHeader],
    /// [Error::UnsupportedVersion] for anything but PUS-C, and [Error::BufferUnderflow] if the
    /// packet is shorter than its length field or too short for a secondary header and CRC.
    pub fn decode(buf: &[u8]) -> Result<(Validated<Self>, usize)> {
        let (header, packet) = split_packet(buf, PacketType::Tc)?;
        let minimum = PrimaryHeader::LEN + TcSecondaryHeader::LEN + CRC_LEN;
        if packet.len() < minimum {
            return Err(Error::BufferUnderflow {
                actual: packet.len(),
                minimum,
            });
        }
        let crc_error = check_crc(packet);
        let mut bytes = Bytes::new(&packet[PrimaryHeader::LEN..packet.len() - CRC_LEN]);
        let sec_header = match TcSecondaryHeader::read(&mut bytes) {
            Ok(sec_header) => sec_header,
            Err(err) => {
                return Err(crc_error.unwrap_or_else(|| err.offset_by(PrimaryHeader::LEN)));
            }
        };
        let tc = Self {
            apid: header.apid,
            sequence_flags: header.sequence_flags,
            sequence_count: header.sequence_count,
            sec_header,
            app_data: bytes.rest().to_vec(),
        };
        Ok((
            Validated {
                value: tc,
                error: crc_error,
            },
            packet.len(),
        ))
    }
}
