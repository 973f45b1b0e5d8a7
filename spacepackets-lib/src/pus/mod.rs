//! ECSS PUS-C telecommand and telemetry packets.
//!
//! Reference: [ECSS-E-ST-70-41C](https://ecss.nl/standard/ecss-e-st-70-41c-space-engineering-telemetry-and-telecommand-packet-utilization-15-april-2016/)
mod tc;
mod tm;
pub mod verification;

use tracing::warn;

pub use tc::{
    PusTc, TcSecondaryHeader, ACK_ACCEPTANCE, ACK_ALL, ACK_COMPLETION, ACK_PROGRESS, ACK_START,
};
pub use tm::{PusTm, TmSecondaryHeader};
pub use verification::{
    FailureNotice, RequestId, Subservice, Verification, VerificationConfig, VerificationReport,
};

use crate::bytes::ensure_len;
use crate::spacepacket::{PacketType, PrimaryHeader};
use crate::{Error, Result};

/// PUS-C version number, found in the upper nibble of both secondary headers.
pub const PUS_VERSION: u8 = 2;
/// Trailing packet error control field.
pub const CRC_LEN: usize = 2;

const CRC16: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_IBM_3740);

#[must_use]
pub fn crc16(dat: &[u8]) -> u16 {
    CRC16.checksum(dat)
}

/// Primary header and the complete packet bytes of a PUS packet, checked for type, secondary
/// header flag and length.
fn split_packet(buf: &[u8], packet_type: PacketType) -> Result<(PrimaryHeader, &[u8])> {
    let header = PrimaryHeader::decode(buf)?;
    if header.packet_type != packet_type {
        return Err(Error::PacketTypeMismatch {
            expected: packet_type,
            actual: header.packet_type,
        });
    }
    if !header.has_secondary_header {
        return Err(Error::MissingSecondaryHeader);
    }
    ensure_len(buf, header.packet_len())?;
    Ok((header, &buf[..header.packet_len()]))
}

/// Compare the trailing CRC of `packet` with one computed over the rest.
fn check_crc(packet: &[u8]) -> Option<Error> {
    let (dat, crc) = packet.split_at(packet.len() - CRC_LEN);
    let expected = u16::from_be_bytes([crc[0], crc[1]]);
    let actual = crc16(dat);
    if expected == actual {
        return None;
    }
    warn!(expected, actual, "PUS packet CRC mismatch");
    Some(Error::CrcMismatch {
        expected: expected.into(),
        actual: actual.into(),
    })
}

fn check_version(b: u8) -> Result<()> {
    let version = b >> 4;
    if version != PUS_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    Ok(())
}

/// Encode header, `body` and a CRC over both.
fn encode_packet(header: &PrimaryHeader, body: &[u8]) -> Result<Vec<u8>> {
    let hdr = header.encode(body.len() + CRC_LEN)?;
    let mut buf = Vec::with_capacity(PrimaryHeader::LEN + body.len() + CRC_LEN);
    buf.extend_from_slice(&hdr);
    buf.extend_from_slice(body);
    let crc = crc16(&buf);
    buf.extend_from_slice(&crc.to_be_bytes());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_check_value() {
        assert_eq!(crc16(b"123456789"), 0x29b1);
    }

    #[test]
    fn packet_type_checked() {
        let header = PrimaryHeader {
            packet_type: PacketType::Tm,
            has_secondary_header: true,
            ..Default::default()
        };
        let raw = encode_packet(&header, &[0x20, 1, 2]).unwrap();
        assert_eq!(
            split_packet(&raw, PacketType::Tc).unwrap_err(),
            Error::PacketTypeMismatch {
                expected: PacketType::Tc,
                actual: PacketType::Tm
            }
        );
        let (_, packet) = split_packet(&raw, PacketType::Tm).unwrap();
        assert!(check_crc(packet).is_none());
    }

    #[test]
    fn secondary_header_required() {
        let header = PrimaryHeader {
            packet_type: PacketType::Tc,
            ..Default::default()
        };
        let raw = encode_packet(&header, &[0x20]).unwrap();
        assert_eq!(
            split_packet(&raw, PacketType::Tc).unwrap_err(),
            Error::MissingSecondaryHeader
        );
    }
}
