use crate::bytes::Bytes;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResponseRequired {
    #[default]
    Nak = 0,
    KeepAlive = 1,
}

/// Asks the receiver for a NAK or Keep Alive PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prompt {
    pub response_required: ResponseRequired,
}

impl Prompt {
    #[must_use]
    pub fn new(response_required: ResponseRequired) -> Self {
        Self { response_required }
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push((self.response_required as u8) << 7);
    }

    pub(crate) fn decode(buf: &[u8]) -> Result<Self> {
        let mut bytes = Bytes::new(buf);
        let b = bytes.next()?;
        if !bytes.is_empty() {
            return Err(Error::TrailingData(bytes.remaining()));
        }
        Ok(Self {
            response_required: if b & 0x80 == 0 {
                ResponseRequired::Nak
            } else {
                ResponseRequired::KeepAlive
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test() {
        let mut buf = Vec::default();
        Prompt::new(ResponseRequired::KeepAlive).encode_into(&mut buf);
        assert_eq!(buf, vec![0x80]);
        assert_eq!(
            Prompt::decode(&[0x80]).unwrap().response_required,
            ResponseRequired::KeepAlive
        );
        assert_eq!(
            Prompt::decode(&[0x00]).unwrap().response_required,
            ResponseRequired::Nak
        );
        assert!(Prompt::decode(&[]).is_err());
    }
}
