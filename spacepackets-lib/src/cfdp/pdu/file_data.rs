use crate::bytes::{put_fss, Bytes};
use crate::{Error, Result};

/// Where a file data segment sits relative to record boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordContinuationState {
    /// Neither the start nor the end of a record.
    #[default]
    NoStartNoEnd = 0b00,
    /// First byte of the segment starts a record.
    StartWithoutEnd = 0b01,
    /// Last byte of the segment ends a record.
    EndWithoutStart = 0b10,
    StartAndEnd = 0b11,
}

impl From<u8> for RecordContinuationState {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => RecordContinuationState::NoStartNoEnd,
            0b01 => RecordContinuationState::StartWithoutEnd,
            0b10 => RecordContinuationState::EndWithoutStart,
            _ => RecordContinuationState::StartAndEnd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentMetadata {
    continuation_state: RecordContinuationState,
    metadata: Vec<u8>,
}

impl SegmentMetadata {
    pub const MAX_LEN: usize = 63;

    /// # Errors
    /// [Error::ValueTooLarge] if `metadata` is longer than 63 bytes.
    pub fn new(continuation_state: RecordContinuationState, metadata: &[u8]) -> Result<Self> {
        if metadata.len() > Self::MAX_LEN {
            return Err(Error::ValueTooLarge {
                value: metadata.len() as u64,
                bits: 6,
            });
        }
        Ok(Self {
            continuation_state,
            metadata: metadata.to_vec(),
        })
    }

    #[must_use]
    pub fn continuation_state(&self) -> RecordContinuationState {
        self.continuation_state
    }

    #[must_use]
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Encoded length, including the state/length byte.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.metadata.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push((self.continuation_state as u8) << 6 | self.metadata.len() as u8);
        buf.extend_from_slice(&self.metadata);
    }

    fn read(bytes: &mut Bytes) -> Result<Self> {
        let b = bytes.next()?;
        let len = usize::from(b & 0x3f);
        Ok(Self {
            continuation_state: RecordContinuationState::from(b >> 6),
            metadata: bytes.take(len)?.to_vec(),
        })
    }
}

/// A segment of file content starting at `offset`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileData {
    pub offset: u64,
    pub data: Vec<u8>,
    /// Present only when the header's segment metadata flag is set.
    pub segment_metadata: Option<SegmentMetadata>,
}

impl FileData {
    #[must_use]
    pub fn new(offset: u64, data: &[u8]) -> Self {
        Self {
            offset,
            data: data.to_vec(),
            segment_metadata: None,
        }
    }

    #[must_use]
    pub fn with_segment_metadata(mut self, segment_metadata: SegmentMetadata) -> Self {
        self.segment_metadata = Some(segment_metadata);
        self
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>, large_file: bool) -> Result<()> {
        if let Some(meta) = &self.segment_metadata {
            meta.encode_into(buf);
        }
        put_fss(buf, large_file, self.offset)?;
        buf.extend_from_slice(&self.data);
        Ok(())
    }

    pub(crate) fn decode(buf: &[u8], has_segment_metadata: bool, large_file: bool) -> Result<Self> {
        let mut bytes = Bytes::new(buf);
        let segment_metadata = if has_segment_metadata {
            Some(SegmentMetadata::read(&mut bytes)?)
        } else {
            None
        };
        let offset = bytes.fss(large_file)?;
        Ok(Self {
            offset,
            data: bytes.rest().to_vec(),
            segment_metadata,
        })
    }
}
