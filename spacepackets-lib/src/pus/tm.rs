use typed_builder::TypedBuilder;

use super::{check_crc, check_version, encode_packet, split_packet, CRC_LEN, PUS_VERSION};
use crate::bytes::Bytes;
use crate::spacepacket::{Apid, PacketType, PrimaryHeader, SequenceFlags};
use crate::timecode::Cds;
use crate::{Error, Result, Validated};

/// Telemetry secondary header, time stamped with a CDS time code carrying its P-field.
///
/// ```text
/// | version:4 | time ref status:4 | service:8 | subservice:8 | message counter:16 |
/// | destination id:16 | time code |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TmSecondaryHeader {
    pub service: u8,
    pub subservice: u8,
    #[builder(default)]
    pub time_ref_status: u8,
    #[builder(default)]
    pub msg_counter: u16,
    #[builder(default)]
    pub dest_id: u16,
    #[builder(default)]
    pub timestamp: Cds,
}

impl TmSecondaryHeader {
    /// Length without the time code.
    pub const FIXED_LEN: usize = 7;

    #[must_use]
    pub fn len(&self) -> usize {
        Self::FIXED_LEN + 1 + self.timestamp.format.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(PUS_VERSION << 4 | (self.time_ref_status & 0xf));
        buf.push(self.service);
        buf.push(self.subservice);
        buf.extend_from_slice(&self.msg_counter.to_be_bytes());
        buf.extend_from_slice(&self.dest_id.to_be_bytes());
        buf.extend(self.timestamp.encode());
    }

    fn read(bytes: &mut Bytes) -> Result<Self> {
        let first = bytes.next()?;
        check_version(first)?;
        let service = bytes.next()?;
        let subservice = bytes.next()?;
        let msg_counter = bytes.u16()?;
        let dest_id = bytes.u16()?;
        let start = bytes.offset();
        let rest = bytes.rest();
        let (timestamp, n) = Cds::decode(rest).map_err(|err| err.offset_by(start))?;
        // hand back whatever follows the time code
        *bytes = Bytes::new(&rest[n..]);
        Ok(Self {
            service,
            subservice,
            time_ref_status: first & 0xf,
            msg_counter,
            dest_id,
            timestamp,
        })
    }
}

/// PUS-C telemetry packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PusTm {
    pub apid: Apid,
    pub sequence_flags: SequenceFlags,
    pub sequence_count: u16,
    pub sec_header: TmSecondaryHeader,
    pub source_data: Vec<u8>,
}

impl PusTm {
    /// Unsegmented telemetry packet.
    #[must_use]
    pub fn new(
        apid: Apid,
        sequence_count: u16,
        sec_header: TmSecondaryHeader,
        source_data: &[u8],
    ) -> Self {
        Self {
            apid,
            sequence_flags: SequenceFlags::Unsegmented,
            sequence_count,
            sec_header,
            source_data: source_data.to_vec(),
        }
    }

    /// Primary header for this packet. The length field saturates at `u16::MAX` for data
    /// too long to encode; [Self::encode] rejects such packets.
    #[must_use]
    pub fn primary_header(&self) -> PrimaryHeader {
        let data_len = self.sec_header.len() + self.source_data.len() + CRC_LEN;
        PrimaryHeader {
            packet_type: PacketType::Tm,
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
        PrimaryHeader::LEN + self.sec_header.len() + self.source_data.len() + CRC_LEN
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// # Errors
    /// See [PrimaryHeader::encode].
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(self.sec_header.len() + self.source_data.len());
        self.sec_header.encode_into(&mut body);
        body.extend_from_slice(&self.source_data);
        encode_packet(&self.primary_header(), &body)
    }

    /// Decode the telemetry packet at the start of `buf`, returning it and the number of bytes
    /// consumed. A CRC mismatch is reported in [Validated::error], or returned as the error if
    /// the secondary header does not decode either.
    ///
    /// # Errors
    /// [Error::PacketTypeMismatch] for telecommands, [Error::MissingSecondaryHeader],
    /// [Error::UnsupportedVersion] for anything but PUS-C, [Error::InvalidPField] for a time
    /// code that is not CDS, and [Error::BufferUnderflow] for short packets.
    pub fn decode(buf: &[u8]) -> Result<(Validated<Self>, usize)> {
        let (header, packet) = split_packet(buf, PacketType::Tm)?;
        let minimum = PrimaryHeader::LEN + CRC_LEN;
        if packet.len() < minimum {
            return Err(Error::BufferUnderflow {
                actual: packet.len(),
                minimum,
            });
        }
        let crc_error = check_crc(packet);
        let mut bytes = Bytes::new(&packet[PrimaryHeader::LEN..packet.len() - CRC_LEN]);
        let sec_header = match TmSecondaryHeader::read(&mut bytes) {
            Ok(sec_header) => sec_header,
            Err(err) => {
                return Err(crc_error.unwrap_or_else(|| err.offset_by(PrimaryHeader::LEN)));
            }
        };
        let tm = Self {
            apid: header.apid,
            sequence_flags: header.sequence_flags,
            sequence_count: header.sequence_count,
            sec_header,
            source_data: bytes.rest().to_vec(),
        };
        Ok((
            Validated {
                value: tm,
                error: crc_error,
            },
            packet.len(),
        ))
    }
}
