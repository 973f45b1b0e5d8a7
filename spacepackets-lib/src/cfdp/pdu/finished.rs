use super::eof::check_fault_location;
use crate::bytes::Bytes;
use crate::cfdp::tlv::{read_raw_list, FilestoreResponse, Tlv, TlvType};
use crate::cfdp::{ByteField, ConditionCode, DeliveryCode, FileStatus};
use crate::{Error, Result};

/// Sent by the receiver once it is done with a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Finished {
    pub condition: ConditionCode,
    pub delivery_code: DeliveryCode,
    pub file_status: FileStatus,
    pub filestore_responses: Vec<FilestoreResponse>,
    /// Entity that detected the fault; only allowed with an error condition.
    pub fault_location: Option<ByteField>,
}

impl Finished {
    /// Successful completion with the file retained.
    #[must_use]
    pub fn success() -> Self {
        Self {
            file_status: FileStatus::Retained,
            ..Default::default()
        }
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        check_fault_location(self.condition, self.fault_location.as_ref())?;
        buf.push(
            (self.condition as u8) << 4 | (self.delivery_code as u8) << 2 | self.file_status as u8,
        );
        for resp in &self.filestore_responses {
            Tlv::FilestoreResponse(resp.clone()).encode_into(buf)?;
        }
        if let Some(id) = self.fault_location {
            Tlv::EntityId(id).encode_into(buf)?;
        }
        Ok(())
    }

    pub(crate) fn decode(buf: &[u8]) -> Result<Self> {
        let mut bytes = Bytes::new(buf);
        let b = bytes.next()?;
        let condition = ConditionCode::try_from(b >> 4)?;
        let mut finished = Self {
            condition,
            delivery_code: DeliveryCode::try_from((b >> 2) & 0x1)?,
            file_status: FileStatus::try_from(b & 0x3)?,
            ..Default::default()
        };
        for raw in read_raw_list(&mut bytes)? {
            match Tlv::try_from(raw)? {
                Tlv::FilestoreResponse(resp) if finished.fault_location.is_none() => {
                    finished.filestore_responses.push(resp);
                }
                Tlv::EntityId(id) if finished.fault_location.is_none() => {
                    finished.fault_location = Some(id);
                }
                Tlv::FilestoreResponse(_) | Tlv::EntityId(_) => {
                    return Err(Error::InvalidTlv(
                        "fault location must be the last TLV".to_string(),
                    ));
                }
                other => {
                    return Err(Error::TlvTypeMismatch {
                        expected: TlvType::FilestoreResponse as u8,
                        actual: other.tlv_type(),
                    });
                }
            }
        }
        check_fault_location(condition, finished.fault_location.as_ref())?;
        Ok(finished)
    }
}
