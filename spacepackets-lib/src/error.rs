use crate::cfdp::PduHeader;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A bit field does not fit inside the buffer, or its width is not 1 to 64.
    #[error("bit field out of range: offset={offset} width={width} buffer_bits={buffer_bits}")]
    OutOfRange {
        offset: usize,
        width: u32,
        buffer_bits: usize,
    },
    /// A value does not fit the width of the field it is written to.
    #[error("value {value} does not fit in {bits} bits")]
    ValueTooLarge { value: u64, bits: u32 },
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("invalid time code preamble field {0:#04x}")]
    InvalidPField(u8),

    #[error("truncated header: got {actual} bytes, need {minimum}")]
    TruncatedHeader { actual: usize, minimum: usize },
    #[error("reserved packet version {0}")]
    ReservedVersion(u8),
    #[error("unsupported version {0}")]
    UnsupportedVersion(u8),
    #[error("invalid length field value {0}")]
    InvalidLengthField(u8),
    #[error("expected a {expected:?} packet, got {actual:?}")]
    PacketTypeMismatch {
        expected: crate::spacepacket::PacketType,
        actual: crate::spacepacket::PacketType,
    },
    #[error("secondary header flag not set")]
    MissingSecondaryHeader,
    #[error("header length mismatch: declared {declared} bytes, found {actual}")]
    HeaderLengthMismatch { declared: usize, actual: usize },
    /// Both values count from the start of the packet or PDU being decoded. For a PDU with a
    /// CRC, `actual` excludes the CRC field.
    #[error("Not enough bytes: got {actual}, need {minimum}")]
    BufferUnderflow { actual: usize, minimum: usize },
    #[error("{0} trailing bytes")]
    TrailingData(usize),

    /// Unknown directive code. The header decoded fine and is carried along.
    #[error("unsupported directive code {code:#04x}")]
    UnsupportedDirective { code: u8, header: Box<PduHeader> },
    #[error("invalid {name} value {value}")]
    InvalidEnum { name: &'static str, value: u8 },
    #[error("expected TLV type {expected:#04x}, got {actual:#04x}")]
    TlvTypeMismatch { expected: u8, actual: u8 },
    #[error("invalid TLV content: {0}")]
    InvalidTlv(String),
    #[error("CRC mismatch: expected {expected:#x}, computed {actual:#x}")]
    CrcMismatch { expected: u32, actual: u32 },
    #[error("unsupported checksum type {0:?}")]
    UnsupportedChecksum(crate::cfdp::ChecksumType),

    #[error("invalid config: {0}")]
    Config(String),
}

impl Error {
    /// Move buffer positions reported while decoding a sub-slice to positions in the
    /// enclosing buffer, `start` being where the sub-slice begins.
    pub(crate) fn offset_by(self, start: usize) -> Self {
        match self {
            Error::BufferUnderflow { actual, minimum } => Error::BufferUnderflow {
                actual: actual + start,
                minimum: minimum + start,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A decoded value along with an advisory validation error, such as a CRC mismatch,
/// that did not prevent the value from being decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T> {
    pub value: T,
    pub error: Option<Error>,
}

impl<T> Validated<T> {
    #[must_use]
    pub fn valid(value: T) -> Self {
        Self { value, error: None }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a plain result, treating an advisory error as fatal.
    ///
    /// # Errors
    /// The advisory error, if any.
    pub fn into_result(self) -> Result<T> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Validated<U> {
        Validated {
            value: f(self.value),
            error: self.error,
        }
    }
}
