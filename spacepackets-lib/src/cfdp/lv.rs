//! Length-value fields.
use crate::bytes::Bytes;
use crate::{Error, Result};

/// Length-value field: one length byte followed by up to 255 value bytes. Used for file names
/// and filestore messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lv {
    value: Vec<u8>,
}

impl Lv {
    pub const MAX_VALUE_LEN: usize = u8::MAX as usize;

    /// # Errors
    /// [Error::ValueTooLarge] if `value` is longer than 255 bytes.
    pub fn new(value: &[u8]) -> Result<Self> {
        if value.len() > Self::MAX_VALUE_LEN {
            return Err(Error::ValueTooLarge {
                value: value.len() as u64,
                bits: 8,
            });
        }
        Ok(Self {
            value: value.to_vec(),
        })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Value as UTF-8, if it is.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Encoded length, including the length byte.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.value.len()
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.value.len() as u8);
        buf.extend_from_slice(&self.value);
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        self.encode_into(&mut buf);
        buf
    }

    pub(crate) fn read(bytes: &mut Bytes) -> Result<Self> {
        let len = bytes.next()?;
        Ok(Self {
            value: bytes.take(len.into())?.to_vec(),
        })
    }

    /// Decode from the start of `buf`, returning the field and the number of bytes consumed.
    ///
    /// # Errors
    /// [Error::BufferUnderflow] if `buf` is shorter than the length byte says.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let mut bytes = Bytes::new(buf);
        let lv = Self::read(&mut bytes)?;
        Ok((lv, bytes.offset()))
    }
}

impl TryFrom<&str> for Lv {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value.as_bytes())
    }
}
