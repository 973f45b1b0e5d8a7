//! Messages to the user reserved for CFDP itself: proxy operations, directory listings and the
//! originating transaction id.
//!
//! Each is carried in a [MessageToUser] whose value starts with `"cfdp"` and a message type
//! byte, followed by the message specific parameters.
use tracing::debug;

use super::lv::Lv;
use super::pdu::Finished;
use super::tlv::{MessageToUser, Tlv};
use super::{
    wire_enum, ByteField, ConditionCode, DeliveryCode, FieldWidth, FileStatus, TransactionId,
    TransmissionMode,
};
use crate::bytes::Bytes;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReservedMessageType {
    ProxyPutRequest = 0x00,
    ProxyMessageToUser = 0x01,
    ProxyFilestoreRequest = 0x02,
    ProxyFaultHandlerOverride = 0x03,
    ProxyTransmissionMode = 0x04,
    ProxyFlowLabel = 0x05,
    ProxySegmentationControl = 0x06,
    ProxyPutResponse = 0x07,
    ProxyFilestoreResponse = 0x08,
    ProxyPutCancel = 0x09,
    OriginatingTransactionId = 0x0a,
    ProxyClosureRequest = 0x0b,
    DirectoryListingRequest = 0x10,
    DirectoryListingResponse = 0x11,
    /// Not part of the standard; carries the recursive and all flags of a listing request.
    DirectoryListingParameters = 0x15,
}
wire_enum!(ReservedMessageType {
    ProxyPutRequest,
    ProxyMessageToUser,
    ProxyFilestoreRequest,
    ProxyFaultHandlerOverride,
    ProxyTransmissionMode,
    ProxyFlowLabel,
    ProxySegmentationControl,
    ProxyPutResponse,
    ProxyFilestoreResponse,
    ProxyPutCancel,
    OriginatingTransactionId,
    ProxyClosureRequest,
    DirectoryListingRequest,
    DirectoryListingResponse,
    DirectoryListingParameters
});

impl ReservedMessageType {
    #[must_use]
    pub fn is_proxy_operation(self) -> bool {
        (self as u8) <= ReservedMessageType::ProxyClosureRequest as u8
            && self != ReservedMessageType::OriginatingTransactionId
    }

    #[must_use]
    pub fn is_directory_operation(self) -> bool {
        matches!(
            self,
            ReservedMessageType::DirectoryListingRequest
                | ReservedMessageType::DirectoryListingResponse
                | ReservedMessageType::DirectoryListingParameters
        )
    }
}

/// Asks the receiving entity to start a put operation of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProxyPutRequest {
    pub dest_entity_id: ByteField,
    pub source_file_name: Lv,
    pub dest_file_name: Lv,
}

/// Outcome of a proxy put operation, as reported by its Finished PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProxyPutResponse {
    pub condition: ConditionCode,
    pub delivery_code: DeliveryCode,
    pub file_status: FileStatus,
}

impl From<&Finished> for ProxyPutResponse {
    fn from(finished: &Finished) -> Self {
        Self {
            condition: finished.condition,
            delivery_code: finished.delivery_code,
            file_status: finished.file_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryParams {
    pub dir_path: Lv,
    /// File the listing is written to.
    pub dir_file_name: Lv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirListingOptions {
    pub recursive: bool,
    /// Include hidden files.
    pub all: bool,
}

/// A decoded reserved CFDP message.
///
/// Message types without parameters decoded here are kept as [ReservedMessage::Other].
///
/// # Example
/// ```
/// use spacepackets::cfdp::reserved::{ReservedMessage, ProxyPutRequest};
/// use spacepackets::cfdp::ByteField;
/// use spacepackets::cfdp::lv::Lv;
///
/// let msg = ReservedMessage::ProxyPutRequest(ProxyPutRequest {
///     dest_entity_id: ByteField::u8(5),
///     source_file_name: Lv::try_from("hello.txt").unwrap(),
///     dest_file_name: Lv::try_from("hello2.txt").unwrap(),
/// });
/// let user_msg = msg.to_message();
/// assert!(user_msg.is_reserved());
/// assert_eq!(user_msg.reserved().unwrap(), Some(msg));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReservedMessage {
    ProxyPutRequest(ProxyPutRequest),
    ProxyPutResponse(ProxyPutResponse),
    ProxyPutCancel,
    ProxyClosureRequest(bool),
    ProxyTransmissionMode(TransmissionMode),
    OriginatingTransactionId(TransactionId),
    DirectoryListingRequest(DirectoryParams),
    DirectoryListingResponse {
        success: bool,
        params: DirectoryParams,
    },
    DirectoryListingParameters(DirListingOptions),
    Other {
        msg_type: u8,
        value: Vec<u8>,
    },
}

impl ReservedMessage {
    /// Bytes preceding the message type.
    pub const PREFIX: &'static [u8] = MessageToUser::RESERVED_PREFIX;

    #[must_use]
    pub fn msg_type(&self) -> u8 {
        let typ = match self {
            ReservedMessage::ProxyPutRequest(_) => ReservedMessageType::ProxyPutRequest,
            ReservedMessage::ProxyPutResponse(_) => ReservedMessageType::ProxyPutResponse,
            ReservedMessage::ProxyPutCancel => ReservedMessageType::ProxyPutCancel,
            ReservedMessage::ProxyClosureRequest(_) => ReservedMessageType::ProxyClosureRequest,
            ReservedMessage::ProxyTransmissionMode(_) => {
                ReservedMessageType::ProxyTransmissionMode
            }
            ReservedMessage::OriginatingTransactionId(_) => {
                ReservedMessageType::OriginatingTransactionId
            }
            ReservedMessage::DirectoryListingRequest(_) => {
                ReservedMessageType::DirectoryListingRequest
            }
            ReservedMessage::DirectoryListingResponse { .. } => {
                ReservedMessageType::DirectoryListingResponse
            }
            ReservedMessage::DirectoryListingParameters(_) => {
                ReservedMessageType::DirectoryListingParameters
            }
            ReservedMessage::Other { msg_type, .. } => return *msg_type,
        };
        typ as u8
    }

    /// Parameters following the message type.
    fn params(&self) -> Vec<u8> {
        let mut buf = Vec::default();
        match self {
            ReservedMessage::ProxyPutRequest(req) => {
                buf.push(req.dest_entity_id.len() as u8);
                req.dest_entity_id.encode_into(&mut buf);
                req.source_file_name.encode_into(&mut buf);
                req.dest_file_name.encode_into(&mut buf);
            }
            ReservedMessage::ProxyPutResponse(resp) => buf.push(
                (resp.condition as u8) << 4
                    | (resp.delivery_code as u8) << 2
                    | resp.file_status as u8,
            ),
            ReservedMessage::ProxyPutCancel => {}
            ReservedMessage::ProxyClosureRequest(requested) => buf.push(u8::from(*requested)),
            ReservedMessage::ProxyTransmissionMode(mode) => buf.push(*mode as u8),
            ReservedMessage::OriginatingTransactionId(id) => {
                buf.push(id.source_entity_id.width().raw() << 4 | id.seq_num.width().raw());
                id.source_entity_id.encode_into(&mut buf);
                id.seq_num.encode_into(&mut buf);
            }
            ReservedMessage::DirectoryListingRequest(params) => {
                params.dir_path.encode_into(&mut buf);
                params.dir_file_name.encode_into(&mut buf);
            }
            ReservedMessage::DirectoryListingResponse { success, params } => {
                buf.push(u8::from(*success) << 7);
                params.dir_path.encode_into(&mut buf);
                params.dir_file_name.encode_into(&mut buf);
            }
            ReservedMessage::DirectoryListingParameters(opts) => {
                buf.push(u8::from(opts.recursive) << 1 | u8::from(opts.all));
            }
            ReservedMessage::Other { value, .. } => buf.extend_from_slice(value),
        }
        buf
    }

    /// The message to user carrying this message.
    #[must_use]
    pub fn to_message(&self) -> MessageToUser {
        let mut value = Self::PREFIX.to_vec();
        value.push(self.msg_type());
        value.extend(self.params());
        MessageToUser { value }
    }

    /// # Errors
    /// [Error::ValueTooLarge] if the message does not fit a TLV.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Tlv::MessageToUser(self.to_message()).encode()
    }

    /// Decode the value of a message to user, which must start with [Self::PREFIX] and a
    /// message type.
    ///
    /// # Errors
    /// [Error::InvalidTlv] if `value` is not a reserved message, [Error::BufferUnderflow] or
    /// [Error::TrailingData] if its parameters do not match the layout of its type, and
    /// [Error::InvalidEnum] or [Error::InvalidLengthField] for bad parameter values.
    pub fn decode(value: &[u8]) -> Result<Self> {
        let Some(rest) = value.strip_prefix(Self::PREFIX) else {
            return Err(Error::InvalidTlv(
                "message to user is not a reserved CFDP message".to_string(),
            ));
        };
        let mut bytes = Bytes::new(rest);
        let msg_type = bytes.next()?;
        let Ok(typ) = ReservedMessageType::try_from(msg_type) else {
            debug!(msg_type, "unknown reserved message type");
            return Ok(ReservedMessage::Other {
                msg_type,
                value: bytes.rest().to_vec(),
            });
        };
        let msg = match typ {
            ReservedMessageType::ProxyPutRequest => {
                let id = Lv::read(&mut bytes)?;
                ReservedMessage::ProxyPutRequest(ProxyPutRequest {
                    dest_entity_id: ByteField::decode(id.value())?,
                    source_file_name: Lv::read(&mut bytes)?,
                    dest_file_name: Lv::read(&mut bytes)?,
                })
            }
            ReservedMessageType::ProxyPutResponse => {
                let b = bytes.next()?;
                ReservedMessage::ProxyPutResponse(ProxyPutResponse {
                    condition: ConditionCode::try_from(b >> 4)?,
                    delivery_code: DeliveryCode::try_from((b >> 2) & 0x1)?,
                    file_status: FileStatus::try_from(b & 0x3)?,
                })
            }
            ReservedMessageType::ProxyPutCancel => ReservedMessage::ProxyPutCancel,
            ReservedMessageType::ProxyClosureRequest => {
                ReservedMessage::ProxyClosureRequest(bytes.next()? & 0x1 != 0)
            }
            ReservedMessageType::ProxyTransmissionMode => {
                ReservedMessage::ProxyTransmissionMode(if bytes.next()? & 0x1 == 0 {
                    TransmissionMode::Acknowledged
                } else {
                    TransmissionMode::Unacknowledged
                })
            }
            ReservedMessageType::OriginatingTransactionId => {
                let b = bytes.next()?;
                let source_width = FieldWidth::from_raw((b >> 4) & 0x7)?;
                let seq_width = FieldWidth::from_raw(b & 0x7)?;
                ReservedMessage::OriginatingTransactionId(TransactionId {
                    source_entity_id: ByteField::decode(bytes.take(source_width.len())?)?,
                    seq_num: ByteField::decode(bytes.take(seq_width.len())?)?,
                })
            }
            ReservedMessageType::DirectoryListingRequest => {
                ReservedMessage::DirectoryListingRequest(read_dir_params(&mut bytes)?)
            }
            ReservedMessageType::DirectoryListingResponse => {
                let success = bytes.next()? & 0x80 != 0;
                ReservedMessage::DirectoryListingResponse {
                    success,
                    params: read_dir_params(&mut bytes)?,
                }
            }
            ReservedMessageType::DirectoryListingParameters => {
                let b = bytes.next()?;
                ReservedMessage::DirectoryListingParameters(DirListingOptions {
                    recursive: b & 0x2 != 0,
                    all: b & 0x1 != 0,
                })
            }
            // proxied TLVs and options are carried as is
            ReservedMessageType::ProxyMessageToUser
            | ReservedMessageType::ProxyFilestoreRequest
            | ReservedMessageType::ProxyFaultHandlerOverride
            | ReservedMessageType::ProxyFlowLabel
            | ReservedMessageType::ProxySegmentationControl
            | ReservedMessageType::ProxyFilestoreResponse => ReservedMessage::Other {
                msg_type,
                value: bytes.rest().to_vec(),
            },
        };
        if !bytes.is_empty() {
            return Err(Error::TrailingData(bytes.remaining()));
        }
        Ok(msg)
    }
}

fn read_dir_params(bytes: &mut Bytes) -> Result<DirectoryParams> {
    Ok(DirectoryParams {
        dir_path: Lv::read(bytes)?,
        dir_file_name: Lv::read(bytes)?,
    })
}

impl From<ReservedMessage> for MessageToUser {
    fn from(msg: ReservedMessage) -> Self {
        msg.to_message()
    }
}

impl TryFrom<&MessageToUser> for ReservedMessage {
    type Error = Error;

    fn try_from(msg: &MessageToUser) -> Result<Self> {
        ReservedMessage::decode(&msg.value)
    }
}
