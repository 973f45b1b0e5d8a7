//! PUS service 1, telecommand verification reports.
use typed_builder::TypedBuilder;

use super::{PusTc, PusTm, TmSecondaryHeader};
use crate::bytes::Bytes;
use crate::cfdp::{wire_enum, ByteField, FieldWidth};
use crate::spacepacket::{Apid, PrimaryHeader, APID_MAX};
use crate::{Error, Result};

pub const SERVICE: u8 = 1;

/// Identifies the telecommand a report is about: the version, packet id and sequence control
/// of its primary header.
///
/// # Example
/// ```
/// use spacepackets::pus::RequestId;
/// use spacepackets::spacepacket::{PacketType, PrimaryHeader};
///
/// let header = PrimaryHeader {
///     packet_type: PacketType::Tc,
///     apid: 0x22,
///     sequence_count: 17,
///     ..Default::default()
/// };
/// assert_eq!(RequestId::from(&header).encode(), [0x10, 0x22, 0xc0, 0x11]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestId {
    pub version: u8,
    /// Packet type, secondary header flag and APID.
    pub packet_id: u16,
    /// Sequence flags and count.
    pub packet_seq_ctrl: u16,
}

impl RequestId {
    pub const LEN: usize = 4;

    #[must_use]
    pub fn apid(&self) -> Apid {
        self.packet_id & APID_MAX
    }

    #[must_use]
    pub fn sequence_count(&self) -> u16 {
        self.packet_seq_ctrl & PrimaryHeader::SEQ_MAX
    }

    #[must_use]
    pub fn as_u32(&self) -> u32 {
        u32::from(u16::from(self.version & 0x7) << 13 | (self.packet_id & 0x1fff)) << 16
            | u32::from(self.packet_seq_ctrl)
    }

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        self.as_u32().to_be_bytes()
    }

    fn read(bytes: &mut Bytes) -> Result<Self> {
        let first = bytes.u16()?;
        Ok(Self {
            version: (first >> 13) as u8,
            packet_id: first & 0x1fff,
            packet_seq_ctrl: bytes.u16()?,
        })
    }

    /// # Errors
    /// [Error::BufferUnderflow] if `buf` is shorter than 4 bytes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Self::read(&mut Bytes::new(buf))
    }
}

impl From<&PrimaryHeader> for RequestId {
    fn from(header: &PrimaryHeader) -> Self {
        Self {
            version: header.version,
            packet_id: header.packet_id(),
            packet_seq_ctrl: header.packet_seq_ctrl(),
        }
    }
}

impl From<&PusTc> for RequestId {
    fn from(tc: &PusTc) -> Self {
        Self::from(&tc.primary_header())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Subservice {
    AcceptanceSuccess = 1,
    AcceptanceFailure = 2,
    StartSuccess = 3,
    StartFailure = 4,
    StepSuccess = 5,
    StepFailure = 6,
    CompletionSuccess = 7,
    CompletionFailure = 8,
}
wire_enum!(Subservice {
    AcceptanceSuccess,
    AcceptanceFailure,
    StartSuccess,
    StartFailure,
    StepSuccess,
    StepFailure,
    CompletionSuccess,
    CompletionFailure
});

impl Subservice {
    #[must_use]
    pub fn is_failure(self) -> bool {
        (self as u8) % 2 == 0
    }
}

/// Error code and free-form data explaining a failed stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FailureNotice {
    pub code: ByteField,
    pub data: Vec<u8>,
}

impl FailureNotice {
    #[must_use]
    pub fn len(&self) -> usize {
        self.code.len() + self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Verification stage and its outcome. Step reports carry a step id, failures a notice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verification {
    AcceptanceSuccess,
    AcceptanceFailure(FailureNotice),
    StartSuccess,
    StartFailure(FailureNotice),
    StepSuccess(ByteField),
    StepFailure {
        step: ByteField,
        failure: FailureNotice,
    },
    CompletionSuccess,
    CompletionFailure(FailureNotice),
}

impl Verification {
    #[must_use]
    pub fn subservice(&self) -> Subservice {
        match self {
            Verification::AcceptanceSuccess => Subservice::AcceptanceSuccess,
            Verification::AcceptanceFailure(_) => Subservice::AcceptanceFailure,
            Verification::StartSuccess => Subservice::StartSuccess,
            Verification::StartFailure(_) => Subservice::StartFailure,
            Verification::StepSuccess(_) => Subservice::StepSuccess,
            Verification::StepFailure { .. } => Subservice::StepFailure,
            Verification::CompletionSuccess => Subservice::CompletionSuccess,
            Verification::CompletionFailure(_) => Subservice::CompletionFailure,
        }
    }

    #[must_use]
    pub fn step(&self) -> Option<ByteField> {
        match self {
            Verification::StepSuccess(step) | Verification::StepFailure { step, .. } => Some(*step),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&FailureNotice> {
        match self {
            Verification::AcceptanceFailure(failure)
            | Verification::StartFailure(failure)
            | Verification::StepFailure { failure, .. }
            | Verification::CompletionFailure(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Widths of the step id and error code, which are mission specific and not on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerificationConfig {
    #[builder(default)]
    pub step_id_width: FieldWidth,
    #[builder(default)]
    pub error_code_width: FieldWidth,
}

/// A service 1 report: which telecommand, and how far it got.
///
/// # Example
/// ```
/// use spacepackets::pus::{
///     PusTc, PusTm, RequestId, TcSecondaryHeader, TmSecondaryHeader, Verification,
///     VerificationConfig, VerificationReport,
/// };
///
/// let ping = TcSecondaryHeader::builder().service(17).subservice(1).build();
/// let tc = PusTc::new(0x22, 17, ping, &[]);
/// let report = VerificationReport {
///     request_id: RequestId::from(&tc),
///     verification: Verification::AcceptanceSuccess,
/// };
/// let sec = TmSecondaryHeader::builder().service(0).subservice(0).build();
/// let tm = report.to_tm(0x22, 0, sec);
/// assert_eq!((tm.sec_header.service, tm.sec_header.subservice), (1, 1));
///
/// let decoded = VerificationReport::from_tm(&tm, &VerificationConfig::default()).unwrap();
/// assert_eq!(decoded, report);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerificationReport {
    pub request_id: RequestId,
    pub verification: Verification,
}

impl VerificationReport {
    /// Telemetry source data: request id, then step id and failure notice where present.
    #[must_use]
    pub fn encode_data(&self) -> Vec<u8> {
        let mut buf = self.request_id.encode().to_vec();
        if let Some(step) = self.verification.step() {
            buf.extend(step.encode());
        }
        if let Some(failure) = self.verification.failure() {
            buf.extend(failure.code.encode());
            buf.extend_from_slice(&failure.data);
        }
        buf
    }

    /// Decode source data of a report with the given subservice.
    ///
    /// # Errors
    /// [Error::InvalidEnum] for an unknown subservice, [Error::BufferUnderflow] if `buf` is
    /// too short for its fields, and [Error::TrailingData] for extra bytes after a success
    /// report.
    pub fn decode_data(subservice: u8, buf: &[u8], conf: &VerificationConfig) -> Result<Self> {
        let subservice = Subservice::try_from(subservice)?;
        let mut bytes = Bytes::new(buf);
        let request_id = RequestId::read(&mut bytes)?;
        let step = if matches!(subservice, Subservice::StepSuccess | Subservice::StepFailure) {
            Some(read_field(&mut bytes, conf.step_id_width)?)
        } else {
            None
        };
        let failure = if subservice.is_failure() {
            Some(FailureNotice {
                code: read_field(&mut bytes, conf.error_code_width)?,
                data: bytes.rest().to_vec(),
            })
        } else {
            None
        };
        if !bytes.is_empty() {
            return Err(Error::TrailingData(bytes.remaining()));
        }
        let verification = match (subservice, step, failure) {
            (Subservice::AcceptanceSuccess, _, _) => Verification::AcceptanceSuccess,
            (Subservice::StartSuccess, _, _) => Verification::StartSuccess,
            (Subservice::CompletionSuccess, _, _) => Verification::CompletionSuccess,
            (Subservice::StepSuccess, Some(step), _) => Verification::StepSuccess(step),
            (Subservice::StepFailure, Some(step), Some(failure)) => {
                Verification::StepFailure { step, failure }
            }
            (Subservice::AcceptanceFailure, _, Some(failure)) => {
                Verification::AcceptanceFailure(failure)
            }
            (Subservice::StartFailure, _, Some(failure)) => Verification::StartFailure(failure),
            (Subservice::CompletionFailure, _, Some(failure)) => {
                Verification::CompletionFailure(failure)
            }
            (subservice, ..) => {
                return Err(Error::ValueOutOfRange(format!(
                    "incomplete {subservice:?} report"
                )))
            }
        };
        Ok(Self {
            request_id,
            verification,
        })
    }

    /// Telemetry packet carrying this report. Service and subservice of `sec_header` are
    /// replaced; its other fields are kept.
    #[must_use]
    pub fn to_tm(&self, apid: Apid, sequence_count: u16, sec_header: TmSecondaryHeader) -> PusTm {
        let sec_header = TmSecondaryHeader {
            service: SERVICE,
            subservice: self.verification.subservice() as u8,
            ..sec_header
        };
        PusTm::new(apid, sequence_count, sec_header, &self.encode_data())
    }

    /// # Errors
    /// [Error::ValueOutOfRange] for a packet of another service, otherwise see
    /// [VerificationReport::decode_data].
    pub fn from_tm(tm: &PusTm, conf: &VerificationConfig) -> Result<Self> {
        if tm.sec_header.service != SERVICE {
            return Err(Error::ValueOutOfRange(format!(
                "service {} is not a verification report",
                tm.sec_header.service
            )));
        }
        Self::decode_data(tm.sec_header.subservice, &tm.source_data, conf)
    }
}

fn read_field(bytes: &mut Bytes, width: FieldWidth) -> Result<ByteField> {
    ByteField::decode(bytes.take(width.len())?)
}
