//! Type-length-value fields.
use tracing::debug;

use super::lv::Lv;
use super::reserved::ReservedMessage;
use super::{wire_enum, ByteField, ConditionCode, FaultHandlerCode};
use crate::bytes::Bytes;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TlvType {
    FilestoreRequest = 0x00,
    FilestoreResponse = 0x01,
    MessageToUser = 0x02,
    FaultHandler = 0x04,
    FlowLabel = 0x05,
    EntityId = 0x06,
}
wire_enum!(TlvType {
    FilestoreRequest,
    FilestoreResponse,
    MessageToUser,
    FaultHandler,
    FlowLabel,
    EntityId
});

/// Undecoded TLV: a type byte and its value. Any type byte is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawTlv {
    pub tlv_type: u8,
    value: Vec<u8>,
}

impl RawTlv {
    pub const MIN_LEN: usize = 2;
    pub const MAX_VALUE_LEN: usize = u8::MAX as usize;

    /// # Errors
    /// [Error::ValueTooLarge] if `value` is longer than 255 bytes.
    pub fn new(tlv_type: u8, value: &[u8]) -> Result<Self> {
        if value.len() > Self::MAX_VALUE_LEN {
            return Err(Error::ValueTooLarge {
                value: value.len() as u64,
                bits: 8,
            });
        }
        Ok(Self {
            tlv_type,
            value: value.to_vec(),
        })
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Encoded length.
    #[must_use]
    pub fn len(&self) -> usize {
        Self::MIN_LEN + self.value.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.tlv_type);
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
        let tlv_type = bytes.next()?;
        let len = bytes.next()?;
        Ok(Self {
            tlv_type,
            value: bytes.take(len.into())?.to_vec(),
        })
    }

    /// Decode from the start of `buf`, returning the TLV and the number of bytes consumed.
    ///
    /// # Errors
    /// [Error::BufferUnderflow] if there are fewer bytes than the length field says.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let mut bytes = Bytes::new(buf);
        let tlv = Self::read(&mut bytes)?;
        Ok((tlv, bytes.offset()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilestoreActionCode {
    CreateFile = 0b0000,
    DeleteFile = 0b0001,
    RenameFile = 0b0010,
    AppendFile = 0b0011,
    ReplaceFile = 0b0100,
    CreateDirectory = 0b0101,
    RemoveDirectory = 0b0110,
    DenyFile = 0b0111,
    DenyDirectory = 0b1000,
}
wire_enum!(FilestoreActionCode {
    CreateFile,
    DeleteFile,
    RenameFile,
    AppendFile,
    ReplaceFile,
    CreateDirectory,
    RemoveDirectory,
    DenyFile,
    DenyDirectory
});

impl FilestoreActionCode {
    /// Rename, append and replace operate on two files.
    #[must_use]
    pub fn has_second_name(self) -> bool {
        matches!(
            self,
            FilestoreActionCode::RenameFile
                | FilestoreActionCode::AppendFile
                | FilestoreActionCode::ReplaceFile
        )
    }
}

fn check_second_name(action: FilestoreActionCode, second_name: Option<&Lv>) -> Result<()> {
    if action.has_second_name() != second_name.is_some() {
        return Err(Error::InvalidTlv(format!(
            "{action:?} {} a second file name",
            if action.has_second_name() {
                "requires"
            } else {
                "does not take"
            }
        )));
    }
    Ok(())
}

fn ensure_consumed(bytes: &Bytes) -> Result<()> {
    if !bytes.is_empty() {
        return Err(Error::TrailingData(bytes.remaining()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilestoreRequest {
    action: FilestoreActionCode,
    first_name: Lv,
    second_name: Option<Lv>,
}

impl FilestoreRequest {
    /// # Errors
    /// [Error::InvalidTlv] if `second_name` is given for an action that takes one name, or
    /// missing for an action that takes two.
    pub fn new(
        action: FilestoreActionCode,
        first_name: Lv,
        second_name: Option<Lv>,
    ) -> Result<Self> {
        check_second_name(action, second_name.as_ref())?;
        Ok(Self {
            action,
            first_name,
            second_name,
        })
    }

    #[must_use]
    pub fn action(&self) -> FilestoreActionCode {
        self.action
    }

    #[must_use]
    pub fn first_name(&self) -> &Lv {
        &self.first_name
    }

    #[must_use]
    pub fn second_name(&self) -> Option<&Lv> {
        self.second_name.as_ref()
    }

    fn value(&self) -> Vec<u8> {
        let mut buf = vec![(self.action as u8) << 4];
        self.first_name.encode_into(&mut buf);
        if let Some(name) = &self.second_name {
            name.encode_into(&mut buf);
        }
        buf
    }

    fn from_value(value: &[u8]) -> Result<Self> {
        let mut bytes = Bytes::new(value);
        let action = FilestoreActionCode::try_from(bytes.next()? >> 4)?;
        let first_name = Lv::read(&mut bytes)?;
        let second_name = if action.has_second_name() {
            Some(Lv::read(&mut bytes)?)
        } else {
            None
        };
        ensure_consumed(&bytes)?;
        Ok(Self {
            action,
            first_name,
            second_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilestoreResponse {
    action: FilestoreActionCode,
    status: u8,
    first_name: Lv,
    second_name: Option<Lv>,
    message: Lv,
}

impl FilestoreResponse {
    /// Status code for a successful action, common to all actions.
    pub const STATUS_SUCCESSFUL: u8 = 0b0000;
    /// Status code for an action that was not performed, common to all actions.
    pub const STATUS_NOT_PERFORMED: u8 = 0b1111;

    /// # Errors
    /// [Error::ValueTooLarge] if `status` is wider than 4 bits, [Error::InvalidTlv] for a second
    /// name mismatch, see [FilestoreRequest::new].
    pub fn new(
        action: FilestoreActionCode,
        status: u8,
        first_name: Lv,
        second_name: Option<Lv>,
        message: Lv,
    ) -> Result<Self> {
        if status > 0xf {
            return Err(Error::ValueTooLarge {
                value: status.into(),
                bits: 4,
            });
        }
        check_second_name(action, second_name.as_ref())?;
        Ok(Self {
            action,
            status,
            first_name,
            second_name,
            message,
        })
    }

    #[must_use]
    pub fn action(&self) -> FilestoreActionCode {
        self.action
    }

    /// Action specific status code.
    #[must_use]
    pub fn status(&self) -> u8 {
        self.status
    }

    #[must_use]
    pub fn first_name(&self) -> &Lv {
        &self.first_name
    }

    #[must_use]
    pub fn second_name(&self) -> Option<&Lv> {
        self.second_name.as_ref()
    }

    #[must_use]
    pub fn message(&self) -> &Lv {
        &self.message
    }

    fn value(&self) -> Vec<u8> {
        let mut buf = vec![(self.action as u8) << 4 | self.status];
        self.first_name.encode_into(&mut buf);
        if let Some(name) = &self.second_name {
            name.encode_into(&mut buf);
        }
        self.message.encode_into(&mut buf);
        buf
    }

    fn from_value(value: &[u8]) -> Result<Self> {
        let mut bytes = Bytes::new(value);
        let first = bytes.next()?;
        let action = FilestoreActionCode::try_from(first >> 4)?;
        let first_name = Lv::read(&mut bytes)?;
        let second_name = if action.has_second_name() {
            Some(Lv::read(&mut bytes)?)
        } else {
            None
        };
        let message = Lv::read(&mut bytes)?;
        ensure_consumed(&bytes)?;
        Ok(Self {
            action,
            status: first & 0xf,
            first_name,
            second_name,
            message,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageToUser {
    pub value: Vec<u8>,
}

impl MessageToUser {
    /// Prefix of messages reserved for the CFDP protocol itself, such as proxy operations.
    pub const RESERVED_PREFIX: &'static [u8] = b"cfdp";

    /// Whether the value holds the reserved prefix and a message type.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.value.len() > Self::RESERVED_PREFIX.len()
            && self.value.starts_with(Self::RESERVED_PREFIX)
    }

    /// Decoded reserved message, `None` for ordinary user messages.
    ///
    /// # Errors
    /// See [ReservedMessage::decode].
    pub fn reserved(&self) -> Result<Option<ReservedMessage>> {
        if !self.is_reserved() {
            return Ok(None);
        }
        ReservedMessage::decode(&self.value).map(Some)
    }

    /// Message type of a reserved message, the byte following the prefix.
    #[must_use]
    pub fn reserved_message_type(&self) -> Option<u8> {
        if self.is_reserved() {
            self.value.get(Self::RESERVED_PREFIX.len()).copied()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultHandlerOverride {
    pub condition: ConditionCode,
    pub handler: FaultHandlerCode,
}

/// A decoded TLV.
///
/// Types this crate does not know are kept as [Tlv::Unknown] rather than rejected. TLVs decoded
/// with [Tlv::from_raw_lenient] also land there when their value does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tlv {
    FilestoreRequest(FilestoreRequest),
    FilestoreResponse(FilestoreResponse),
    MessageToUser(MessageToUser),
    FaultHandler(FaultHandlerOverride),
    FlowLabel(Vec<u8>),
    EntityId(ByteField),
    Unknown(RawTlv),
}

impl Tlv {
    #[must_use]
    pub fn tlv_type(&self) -> u8 {
        match self {
            Tlv::FilestoreRequest(_) => TlvType::FilestoreRequest as u8,
            Tlv::FilestoreResponse(_) => TlvType::FilestoreResponse as u8,
            Tlv::MessageToUser(_) => TlvType::MessageToUser as u8,
            Tlv::FaultHandler(_) => TlvType::FaultHandler as u8,
            Tlv::FlowLabel(_) => TlvType::FlowLabel as u8,
            Tlv::EntityId(_) => TlvType::EntityId as u8,
            Tlv::Unknown(raw) => raw.tlv_type,
        }
    }

    /// # Errors
    /// [Error::ValueTooLarge] if the encoded value exceeds 255 bytes.
    pub fn to_raw(&self) -> Result<RawTlv> {
        let value = match self {
            Tlv::FilestoreRequest(req) => req.value(),
            Tlv::FilestoreResponse(resp) => resp.value(),
            Tlv::MessageToUser(msg) => msg.value.clone(),
            Tlv::FaultHandler(fh) => vec![(fh.condition as u8) << 4 | fh.handler as u8],
            Tlv::FlowLabel(label) => label.clone(),
            Tlv::EntityId(id) => id.encode(),
            Tlv::Unknown(raw) => return Ok(raw.clone()),
        };
        RawTlv::new(self.tlv_type(), &value)
    }

    /// # Errors
    /// See [Tlv::to_raw].
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.to_raw()?.encode_into(buf);
        Ok(())
    }

    /// # Errors
    /// See [Tlv::to_raw].
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_raw()?.encode())
    }

    /// Encoded length.
    ///
    /// # Errors
    /// See [Tlv::to_raw].
    pub fn len(&self) -> Result<usize> {
        Ok(self.to_raw()?.len())
    }

    /// Decode from the start of `buf`, returning the TLV and the number of bytes consumed.
    ///
    /// # Errors
    /// [Error::BufferUnderflow] if there are too few bytes, [Error::InvalidTlv] or
    /// [Error::InvalidEnum] if the value of a known type is malformed.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let (raw, n) = RawTlv::decode(buf)?;
        Ok((Tlv::try_from(raw)?, n))
    }

    /// Typed form of `raw`, or `raw` unchanged as [Tlv::Unknown] if its value does not parse
    /// as its type. Encoding the result gives back the original bytes.
    #[must_use]
    pub fn from_raw_lenient(raw: RawTlv) -> Self {
        match Tlv::try_from(raw.clone()) {
            Ok(tlv) => tlv,
            Err(err) => {
                debug!(tlv_type = raw.tlv_type, %err, "keeping malformed TLV undecoded");
                Tlv::Unknown(raw)
            }
        }
    }

    /// Entity id from a TLV that must be an entity id, such as a fault location.
    ///
    /// # Errors
    /// [Error::TlvTypeMismatch] for any other TLV.
    pub fn into_entity_id(self) -> Result<ByteField> {
        match self {
            Tlv::EntityId(id) => Ok(id),
            other => Err(Error::TlvTypeMismatch {
                expected: TlvType::EntityId as u8,
                actual: other.tlv_type(),
            }),
        }
    }
}

impl TryFrom<RawTlv> for Tlv {
    type Error = Error;

    fn try_from(raw: RawTlv) -> Result<Self> {
        let Ok(tlv_type) = TlvType::try_from(raw.tlv_type) else {
            debug!(tlv_type = raw.tlv_type, "unknown TLV type");
            return Ok(Tlv::Unknown(raw));
        };
        let value = raw.value();
        Ok(match tlv_type {
            TlvType::FilestoreRequest => {
                Tlv::FilestoreRequest(FilestoreRequest::from_value(value).map_err(invalid)?)
            }
            TlvType::FilestoreResponse => {
                Tlv::FilestoreResponse(FilestoreResponse::from_value(value).map_err(invalid)?)
            }
            TlvType::MessageToUser => Tlv::MessageToUser(MessageToUser {
                value: value.to_vec(),
            }),
            TlvType::FaultHandler => {
                let [b] = value else {
                    return Err(Error::InvalidTlv(format!(
                        "fault handler override value must be 1 byte; got {}",
                        value.len()
                    )));
                };
                Tlv::FaultHandler(FaultHandlerOverride {
                    condition: ConditionCode::try_from(b >> 4)?,
                    handler: FaultHandlerCode::try_from(b & 0xf)?,
                })
            }
            TlvType::FlowLabel => Tlv::FlowLabel(value.to_vec()),
            TlvType::EntityId => Tlv::EntityId(ByteField::decode(value).map_err(invalid)?),
        })
    }
}

fn invalid(err: Error) -> Error {
    match err {
        Error::InvalidEnum { .. } | Error::TrailingData(_) => err,
        other => Error::InvalidTlv(other.to_string()),
    }
}

pub(crate) fn read_raw_list(bytes: &mut Bytes) -> Result<Vec<RawTlv>> {
    let mut tlvs = Vec::default();
    while !bytes.is_empty() {
        if bytes.remaining() < RawTlv::MIN_LEN {
            return Err(Error::TrailingData(bytes.remaining()));
        }
        tlvs.push(RawTlv::read(bytes)?);
    }
    Ok(tlvs)
}

/// Decode consecutive TLVs of any type until `buf` is exhausted, without interpreting their
/// values.
///
/// # Errors
/// [Error::TrailingData] if fewer bytes than a TLV header are left over, [Error::BufferUnderflow]
/// if the last TLV's length runs past the end of `buf`.
pub fn decode_raw_list(buf: &[u8]) -> Result<Vec<RawTlv>> {
    read_raw_list(&mut Bytes::new(buf))
}

/// Encode `tlvs` back to back.
pub fn encode_raw_list(tlvs: &[RawTlv], buf: &mut Vec<u8>) {
    for tlv in tlvs {
        tlv.encode_into(buf);
    }
}

/// Decode consecutive TLVs until `buf` is exhausted, converting each to its typed form.
///
/// # Errors
/// See [decode_raw_list], plus any error decoding the value of a TLV of a known type.
pub fn decode_list(buf: &[u8]) -> Result<Vec<Tlv>> {
    decode_raw_list(buf)?
        .into_iter()
        .map(Tlv::try_from)
        .collect()
}

/// Encode `tlvs` back to back.
///
/// # Errors
/// See [Tlv::to_raw].
pub fn encode_list(tlvs: &[Tlv], buf: &mut Vec<u8>) -> Result<()> {
    for tlv in tlvs {
        tlv.encode_into(buf)?;
    }
    Ok(())
}
