use crate::bytes::Bytes;
use crate::cfdp::{ConditionCode, DirectiveCode, TransactionStatus};
use crate::{Error, Result};

/// Acknowledges an EOF or Finished PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ack {
    acked_directive: DirectiveCode,
    condition: ConditionCode,
    transaction_status: TransactionStatus,
}

impl Ack {
    /// # Errors
    /// [Error::ValueOutOfRange] unless `acked_directive` is EOF or Finished.
    pub fn new(
        acked_directive: DirectiveCode,
        condition: ConditionCode,
        transaction_status: TransactionStatus,
    ) -> Result<Self> {
        if !matches!(acked_directive, DirectiveCode::Eof | DirectiveCode::Finished) {
            return Err(Error::ValueOutOfRange(format!(
                "only EOF and Finished PDUs can be acknowledged; got {acked_directive:?}"
            )));
        }
        Ok(Self {
            acked_directive,
            condition,
            transaction_status,
        })
    }

    #[must_use]
    pub fn acked_directive(&self) -> DirectiveCode {
        self.acked_directive
    }

    #[must_use]
    pub fn condition(&self) -> ConditionCode {
        self.condition
    }

    #[must_use]
    pub fn transaction_status(&self) -> TransactionStatus {
        self.transaction_status
    }

    /// Directive subtype code, set only for acknowledging a Finished PDU.
    #[must_use]
    pub fn subtype(&self) -> u8 {
        u8::from(self.acked_directive == DirectiveCode::Finished)
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push((self.acked_directive as u8) << 4 | self.subtype());
        buf.push((self.condition as u8) << 4 | self.transaction_status as u8);
    }

    pub(crate) fn decode(buf: &[u8]) -> Result<Self> {
        let mut bytes = Bytes::new(buf);
        let acked = DirectiveCode::try_from(bytes.next()? >> 4)?;
        let b = bytes.next()?;
        if !bytes.is_empty() {
            return Err(Error::TrailingData(bytes.remaining()));
        }
        Self::new(
            acked,
            ConditionCode::try_from(b >> 4)?,
            TransactionStatus::try_from(b & 0x3)?,
        )
    }
}
