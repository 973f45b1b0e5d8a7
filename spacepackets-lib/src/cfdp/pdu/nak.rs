use crate::bytes::{fss_len, put_fss, Bytes};
use crate::{Error, Result};

/// Requests retransmission of missing file segments within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nak {
    pub start_of_scope: u64,
    pub end_of_scope: u64,
    /// `(start, end)` offsets of each missing segment. A `(0, 0)` request asks for the
    /// metadata PDU.
    pub segment_requests: Vec<(u64, u64)>,
}

impl Nak {
    #[must_use]
    pub fn new(start_of_scope: u64, end_of_scope: u64) -> Self {
        Self {
            start_of_scope,
            end_of_scope,
            segment_requests: Vec::default(),
        }
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>, large_file: bool) -> Result<()> {
        put_fss(buf, large_file, self.start_of_scope)?;
        put_fss(buf, large_file, self.end_of_scope)?;
        for (start, end) in &self.segment_requests {
            put_fss(buf, large_file, *start)?;
            put_fss(buf, large_file, *end)?;
        }
        Ok(())
    }

    pub(crate) fn decode(buf: &[u8], large_file: bool) -> Result<Self> {
        let mut bytes = Bytes::new(buf);
        let mut nak = Self::new(bytes.fss(large_file)?, bytes.fss(large_file)?);
        let pair_len = 2 * fss_len(large_file);
        if bytes.remaining() % pair_len != 0 {
            return Err(Error::TrailingData(bytes.remaining() % pair_len));
        }
        while !bytes.is_empty() {
            nak.segment_requests
                .push((bytes.fss(large_file)?, bytes.fss(large_file)?));
        }
        Ok(nak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_only() {
        let nak = Nak::new(0, 200);
        let mut buf = Vec::default();
        nak.encode_into(&mut buf, false).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0, 0, 0, 0, 200]);
        assert_eq!(Nak::decode(&buf, false).unwrap(), nak);
    }

    #[test]
    fn segment_requests() {
        let mut nak = Nak::new(0, 200);
        nak.segment_requests = vec![(20, 40), (60, 80)];
        let mut buf = Vec::default();
        nak.encode_into(&mut buf, true).unwrap();
        assert_eq!(buf.len(), 16 + 32);
        assert_eq!(Nak::decode(&buf, true).unwrap(), nak);
    }

    #[test]
    fn partial_request() {
        let mut buf = Vec::default();
        Nak::new(0, 200).encode_into(&mut buf, false).unwrap();
        buf.extend_from_slice(&[0, 0, 0, 1]);
        assert_eq!(Nak::decode(&buf, false).unwrap_err(), Error::TrailingData(4));
    }

    #[test]
    fn request_too_large_for_normal_file() {
        let mut nak = Nak::new(0, 200);
        nak.segment_requests.push((0, 1 << 33));
        let mut buf = Vec::default();
        assert!(nak.encode_into(&mut buf, false).is_err());
    }
}
