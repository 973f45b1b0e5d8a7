use crate::bytes::{put_fss, Bytes};
use crate::{Error, Result};

/// Reports receiver progress: the number of contiguous file bytes received from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeepAlive {
    pub progress: u64,
}

impl KeepAlive {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>, large_file: bool) -> Result<()> {
        put_fss(buf, large_file, self.progress)
    }

    pub(crate) fn decode(buf: &[u8], large_file: bool) -> Result<Self> {
        let mut bytes = Bytes::new(buf);
        let progress = bytes.fss(large_file)?;
        if !bytes.is_empty() {
            return Err(Error::TrailingData(bytes.remaining()));
        }
        Ok(Self { progress })
    }
}
