use crate::bytes::{put_fss, Bytes};
use crate::cfdp::tlv::{RawTlv, Tlv};
use crate::cfdp::{ByteField, ConditionCode};
use crate::{Error, Result};

/// End of file. Carries the checksum and size of the file as sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eof {
    pub condition: ConditionCode,
    pub checksum: u32,
    pub file_size: u64,
    /// Entity that detected the fault; only allowed with an error condition.
    pub fault_location: Option<ByteField>,
}

impl Eof {
    #[must_use]
    pub fn new(checksum: u32, file_size: u64) -> Self {
        Self {
            checksum,
            file_size,
            ..Default::default()
        }
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>, large_file: bool) -> Result<()> {
        check_fault_location(self.condition, self.fault_location.as_ref())?;
        buf.push((self.condition as u8) << 4);
        buf.extend_from_slice(&self.checksum.to_be_bytes());
        put_fss(buf, large_file, self.file_size)?;
        if let Some(id) = self.fault_location {
            Tlv::EntityId(id).encode_into(buf)?;
        }
        Ok(())
    }

    pub(crate) fn decode(buf: &[u8], large_file: bool) -> Result<Self> {
        let mut bytes = Bytes::new(buf);
        let condition = ConditionCode::try_from(bytes.next()? >> 4)?;
        let checksum = bytes.u32()?;
        let file_size = bytes.fss(large_file)?;
        let fault_location = read_fault_location(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(Error::TrailingData(bytes.remaining()));
        }
        check_fault_location(condition, fault_location.as_ref())?;
        Ok(Self {
            condition,
            checksum,
            file_size,
            fault_location,
        })
    }
}

pub(super) fn check_fault_location(
    condition: ConditionCode,
    fault_location: Option<&ByteField>,
) -> Result<()> {
    if condition == ConditionCode::NoError && fault_location.is_some() {
        return Err(Error::InvalidTlv(
            "fault location given with NoError condition".to_string(),
        ));
    }
    Ok(())
}

fn read_fault_location(bytes: &mut Bytes) -> Result<Option<ByteField>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let tlv = Tlv::try_from(RawTlv::read(bytes)?)?;
    Ok(Some(tlv.into_entity_id()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_error() {
        let eof = Eof::new(0x0102_0304, 12);
        let mut buf = Vec::default();
        eof.encode_into(&mut buf, false).unwrap();
        assert_eq!(buf, vec![0x00, 1, 2, 3, 4, 0, 0, 0, 12]);
        assert_eq!(Eof::decode(&buf, false).unwrap(), eof);
    }

    #[test]
    fn with_fault_location() {
        let eof = Eof {
            condition: ConditionCode::FileChecksumFailure,
            checksum: 0,
            file_size: 1 << 40,
            fault_location: Some(ByteField::u16(2)),
        };
        let mut buf = Vec::default();
        eof.encode_into(&mut buf, true).unwrap();
        assert_eq!(buf.len(), 1 + 4 + 8 + 4);
        assert_eq!(buf[0], 0x50);
        assert_eq!(&buf[13..], &[0x06, 0x02, 0x00, 0x02]);
        assert_eq!(Eof::decode(&buf, true).unwrap(), eof);
    }

    #[test]
    fn fault_location_requires_error() {
        let eof = Eof {
            fault_location: Some(ByteField::u8(1)),
            ..Default::default()
        };
        let mut buf = Vec::default();
        assert!(matches!(
            eof.encode_into(&mut buf, false),
            Err(Error::InvalidTlv(_))
        ));
        let raw = [0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0x06, 0x01, 0x01];
        assert!(matches!(Eof::decode(&raw, false), Err(Error::InvalidTlv(_))));
    }

    #[test]
    fn fault_location_wrong_tlv() {
        let raw = [0x10, 0, 0, 0, 0, 0, 0, 0, 0, 0x05, 0x01, 0x01];
        assert_eq!(
            Eof::decode(&raw, false).unwrap_err(),
            Error::TlvTypeMismatch {
                expected: 0x06,
                actual: 0x05
            }
        );
    }

    #[test]
    fn truncated() {
        assert!(matches!(
            Eof::decode(&[0x00, 0, 0, 0, 0, 0, 0], false),
            Err(Error::BufferUnderflow { .. })
        ));
    }
}
