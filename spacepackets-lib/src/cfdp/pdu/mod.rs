//! Complete PDUs: a [PduHeader] followed by a directive or file data body.
mod ack;
mod eof;
mod file_data;
mod finished;
mod keep_alive;
mod metadata;
mod nak;
mod prompt;

use tracing::{trace, warn};

pub use ack::Ack;
pub use eof::Eof;
pub use file_data::{FileData, RecordContinuationState, SegmentMetadata};
pub use finished::Finished;
pub use keep_alive::KeepAlive;
pub use metadata::Metadata;
pub use nak::Nak;
pub use prompt::{Prompt, ResponseRequired};

use super::{CfdpConfig, DirectiveCode, Direction, PduConfig, PduHeader, PduType};
use crate::bytes::{fss_len, Bytes};
use crate::{Error, Result, Validated};

/// PDU body, one variant per directive plus file data.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PduBody {
    FileData(FileData),
    Metadata(Metadata),
    Eof(Eof),
    Finished(Finished),
    Ack(Ack),
    Nak(Nak),
    Prompt(Prompt),
    KeepAlive(KeepAlive),
}

impl PduBody {
    #[must_use]
    pub fn pdu_type(&self) -> PduType {
        match self {
            PduBody::FileData(_) => PduType::FileData,
            _ => PduType::FileDirective,
        }
    }

    /// Directive code, `None` for file data.
    #[must_use]
    pub fn directive_code(&self) -> Option<DirectiveCode> {
        Some(match self {
            PduBody::FileData(_) => return None,
            PduBody::Metadata(_) => DirectiveCode::Metadata,
            PduBody::Eof(_) => DirectiveCode::Eof,
            PduBody::Finished(_) => DirectiveCode::Finished,
            PduBody::Ack(_) => DirectiveCode::Ack,
            PduBody::Nak(_) => DirectiveCode::Nak,
            PduBody::Prompt(_) => DirectiveCode::Prompt,
            PduBody::KeepAlive(_) => DirectiveCode::KeepAlive,
        })
    }

    /// Direction this kind of PDU normally travels in.
    #[must_use]
    pub fn default_direction(&self) -> Direction {
        match self {
            PduBody::Finished(_) | PduBody::Nak(_) | PduBody::KeepAlive(_) => {
                Direction::TowardsSender
            }
            PduBody::Ack(ack) if ack.acked_directive() == DirectiveCode::Eof => {
                Direction::TowardsSender
            }
            _ => Direction::TowardsReceiver,
        }
    }

    fn has_segment_metadata(&self) -> bool {
        matches!(self, PduBody::FileData(fd) if fd.segment_metadata.is_some())
    }

    /// Everything following the header, without a CRC.
    fn encode_into(&self, buf: &mut Vec<u8>, large_file: bool) -> Result<()> {
        if let Some(code) = self.directive_code() {
            buf.push(code as u8);
        }
        match self {
            PduBody::FileData(fd) => fd.encode_into(buf, large_file),
            PduBody::Metadata(md) => md.encode_into(buf, large_file),
            PduBody::Eof(eof) => eof.encode_into(buf, large_file),
            PduBody::Finished(finished) => finished.encode_into(buf),
            PduBody::Ack(ack) => {
                ack.encode_into(buf);
                Ok(())
            }
            PduBody::Nak(nak) => nak.encode_into(buf, large_file),
            PduBody::Prompt(prompt) => {
                prompt.encode_into(buf);
                Ok(())
            }
            PduBody::KeepAlive(ka) => ka.encode_into(buf, large_file),
        }
    }

    fn decode(header: &PduHeader, buf: &[u8]) -> Result<Self> {
        let large_file = header.config.large_file;
        if header.pdu_type == PduType::FileData {
            return Ok(FileData::decode(buf, header.segment_metadata, large_file)?.into());
        }
        let mut bytes = Bytes::new(buf);
        let code = bytes.next()?;
        let Ok(directive) = DirectiveCode::try_from(code) else {
            return Err(Error::UnsupportedDirective {
                code,
                header: Box::new(*header),
            });
        };
        trace!(?directive, "decoding directive");
        let dat = bytes.rest();
        let body: Result<Self> = match directive {
            DirectiveCode::Eof => Eof::decode(dat, large_file).map(Into::into),
            DirectiveCode::Finished => Finished::decode(dat).map(Into::into),
            DirectiveCode::Ack => Ack::decode(dat).map(Into::into),
            DirectiveCode::Metadata => Metadata::decode(dat, large_file).map(Into::into),
            DirectiveCode::Nak => Nak::decode(dat, large_file).map(Into::into),
            DirectiveCode::Prompt => Prompt::decode(dat).map(Into::into),
            DirectiveCode::KeepAlive => KeepAlive::decode(dat, large_file).map(Into::into),
        };
        body.map_err(|err| err.offset_by(1))
    }
}

/// A complete CFDP PDU.
///
/// # Example
/// ```
/// use spacepackets::cfdp::pdu::{FileData, Pdu};
/// use spacepackets::cfdp::{CfdpConfig, PduConfig};
///
/// let conf = PduConfig::builder()
///     .source_entity_id(spacepackets::cfdp::ByteField::u8(1))
///     .dest_entity_id(spacepackets::cfdp::ByteField::u8(2))
///     .transaction_seq_num(spacepackets::cfdp::ByteField::u8(3))
///     .crc_flag(true)
///     .build();
/// let pdu = Pdu::new(conf, FileData::new(0, b"hello"));
/// let raw = pdu.encode(&CfdpConfig::default()).unwrap();
///
/// let decoded = Pdu::decode(&raw, &CfdpConfig::default()).unwrap();
/// assert!(decoded.is_valid());
/// assert_eq!(decoded.value.body, pdu.body);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pdu {
    pub header: PduHeader,
    pub body: PduBody,
}

impl Pdu {
    /// Create a PDU with the body's default direction. The header data field length is
    /// filled in by [Pdu::encode].
    pub fn new<B: Into<PduBody>>(mut config: PduConfig, body: B) -> Self {
        let body = body.into();
        config.direction = body.default_direction();
        let mut header = PduHeader::new(config, body.pdu_type(), 0);
        header.segment_metadata = body.has_segment_metadata();
        Self { header, body }
    }

    #[must_use]
    pub fn directive_code(&self) -> Option<DirectiveCode> {
        self.body.directive_code()
    }

    /// Encode the header, body and, if the header's CRC flag is set, a CRC over both.
    ///
    /// The header's PDU type, segment metadata flag and data field length are derived from
    /// the body.
    ///
    /// # Errors
    /// [Error::ValueTooLarge] if a file size sensitive value does not fit, or the data field
    /// exceeds 65535 bytes. [Error::Config] for mismatched entity id widths.
    pub fn encode(&self, cfdp: &CfdpConfig) -> Result<Vec<u8>> {
        let conf = &self.header.config;
        let mut body = Vec::default();
        self.body.encode_into(&mut body, conf.large_file)?;

        let data_field_len = body.len() + crc_len(conf, cfdp);
        let Ok(pdu_data_field_len) = u16::try_from(data_field_len) else {
            return Err(Error::ValueTooLarge {
                value: data_field_len as u64,
                bits: 16,
            });
        };
        let header = PduHeader {
            pdu_type: self.body.pdu_type(),
            segment_metadata: self.body.has_segment_metadata(),
            pdu_data_field_len,
            ..self.header
        };

        let mut buf = Vec::with_capacity(header.packet_len());
        header.encode_into(&mut buf)?;
        buf.extend_from_slice(&body);
        if conf.crc_flag {
            let crc = cfdp.crc.checksum(&buf);
            buf.extend(crate::bytes::be_bytes(u64::from(crc), cfdp.crc.len()));
        }
        Ok(buf)
    }

    /// Decode a buffer holding exactly one PDU.
    ///
    /// A CRC mismatch does not fail decoding; it is reported in [Validated::error] next to the
    /// decoded PDU. If the body also fails to decode, the mismatch is returned as the error
    /// instead of whatever the corrupted body tripped over.
    ///
    /// # Errors
    /// See [PduHeader::decode] for header errors. [Error::CrcMismatch] for a body that does not
    /// decode and does not match its CRC. [Error::UnsupportedDirective] for an unknown
    /// directive code, carrying the decoded header. [Error::BufferUnderflow] or
    /// [Error::TrailingData] if the body does not match its layout.
    pub fn decode(buf: &[u8], cfdp: &CfdpConfig) -> Result<Validated<Self>> {
        let header = PduHeader::decode(buf)?;
        let header_len = header.header_len();
        let crc_len = crc_len(&header.config, cfdp);
        if buf.len() < header_len + crc_len {
            return Err(Error::BufferUnderflow {
                actual: buf.len(),
                minimum: header_len + crc_len,
            });
        }
        let (covered, crc_field) = buf.split_at(buf.len() - crc_len);

        let mut error = None;
        if header.config.crc_flag {
            let expected = crate::bytes::be_uint(crc_field) as u32;
            let actual = cfdp.crc.checksum(covered);
            if expected != actual {
                warn!(
                    transaction = %header.transaction_id(),
                    expected, actual, "PDU CRC mismatch"
                );
                error = Some(Error::CrcMismatch { expected, actual });
            }
        }

        let body = match PduBody::decode(&header, &covered[header_len..]) {
            Ok(body) => body,
            Err(err) => return Err(error.unwrap_or_else(|| err.offset_by(header_len))),
        };
        Ok(Validated {
            value: Self { header, body },
            error,
        })
    }
}

fn crc_len(conf: &PduConfig, cfdp: &CfdpConfig) -> usize {
    if conf.crc_flag {
        cfdp.crc.len()
    } else {
        0
    }
}

fn remaining_after(max_packet_len: usize, overhead: usize) -> Result<usize> {
    max_packet_len.checked_sub(overhead).ok_or_else(|| {
        Error::ValueOutOfRange(format!(
            "maximum packet length {max_packet_len} is less than the {overhead} byte PDU overhead"
        ))
    })
}

/// Largest file data segment that fits a PDU of at most `max_packet_len` bytes, for file data
/// PDUs without segment metadata.
///
/// # Errors
/// [Error::ValueOutOfRange] if not even an empty segment fits, [Error::Config] for an invalid
/// `conf`.
pub fn max_file_segment_len(
    max_packet_len: usize,
    conf: &PduConfig,
    cfdp: &CfdpConfig,
) -> Result<usize> {
    remaining_after(
        max_packet_len,
        conf.header_len()? + fss_len(conf.large_file) + crc_len(conf, cfdp),
    )
}

/// Most segment requests a NAK PDU of at most `max_packet_len` bytes can carry.
///
/// # Errors
/// [Error::ValueOutOfRange] if not even a NAK without segment requests fits, [Error::Config]
/// for an invalid `conf`.
pub fn max_nak_segment_requests(
    max_packet_len: usize,
    conf: &PduConfig,
    cfdp: &CfdpConfig,
) -> Result<usize> {
    let fss = fss_len(conf.large_file);
    let avail = remaining_after(
        max_packet_len,
        conf.header_len()? + 1 + 2 * fss + crc_len(conf, cfdp),
    )?;
    Ok(avail / (2 * fss))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfdp::lv::Lv;
    use crate::cfdp::tlv::{FilestoreActionCode, FilestoreResponse};
    use crate::cfdp::{
        ByteField, ChecksumType, ConditionCode, CrcAlgorithm, DeliveryCode, FileStatus,
        TransactionStatus, TransmissionMode,
    };
    use test_case::test_case;

    fn u16_conf() -> PduConfig {
        PduConfig::builder()
            .source_entity_id(ByteField::u16(2))
            .dest_entity_id(ByteField::u16(3))
            .transaction_seq_num(ByteField::u16(1))
            .build()
    }

    fn roundtrip(pdu: &Pdu) -> Vec<u8> {
        let cfdp = CfdpConfig::default();
        let raw = pdu.encode(&cfdp).unwrap();
        let decoded = Pdu::decode(&raw, &cfdp).unwrap().into_result().unwrap();
        assert_eq!(&decoded.body, &pdu.body);
        assert_eq!(decoded.header.packet_len(), raw.len());
        raw
    }

    #[test]
    fn file_data() {
        let pdu = Pdu::new(PduConfig::default(), FileData::new(0, b"hello world"));
        let raw = roundtrip(&pdu);
        let mut expected = hex::decode("30000f0000000000000000").unwrap();
        expected.extend_from_slice(b"hello world");
        assert_eq!(raw, expected);
    }

    #[test]
    fn file_data_with_crc() {
        let mut conf = PduConfig::default();
        conf.crc_flag = true;
        let pdu = Pdu::new(conf, FileData::new(0, b"hello world"));
        let raw = roundtrip(&pdu);
        assert_eq!(&raw[..3], &[0x32, 0x00, 0x11]);
        assert_eq!(&raw[raw.len() - 2..], &[0xf6, 0xeb]);
    }

    #[test]
    fn file_data_segment_metadata_sets_header_flag() {
        let meta =
            SegmentMetadata::new(RecordContinuationState::StartAndEnd, &[0xaa, 0xbb]).unwrap();
        let pdu = Pdu::new(
            PduConfig::default(),
            FileData::new(0, b"x").with_segment_metadata(meta),
        );
        assert!(pdu.header.segment_metadata);
        let raw = roundtrip(&pdu);
        assert_eq!(raw[3] & 0x08, 0x08);
    }

    #[test]
    fn crc_mismatch_is_advisory() {
        let mut conf = PduConfig::default();
        conf.crc_flag = true;
        let pdu = Pdu::new(conf, FileData::new(0, b"hello world"));
        let mut raw = pdu.encode(&CfdpConfig::default()).unwrap();
        raw[15] ^= 0x02;

        let decoded = Pdu::decode(&raw, &CfdpConfig::default()).unwrap();
        assert!(matches!(decoded.error, Some(Error::CrcMismatch { .. })));
        let PduBody::FileData(fd) = &decoded.value.body else {
            panic!("expected file data, got {:?}", decoded.value.body);
        };
        assert_eq!(fd.data, b"hellm world");
        assert!(decoded.into_result().is_err());
    }

    #[test_case(CrcAlgorithm::Crc32)]
    #[test_case(CrcAlgorithm::Crc32c)]
    fn crc32_algorithms(crc: CrcAlgorithm) {
        let cfdp = CfdpConfig::builder().crc(crc).build();
        let mut conf = PduConfig::default();
        conf.crc_flag = true;
        let pdu = Pdu::new(conf, KeepAlive { progress: 5 });
        let raw = pdu.encode(&cfdp).unwrap();
        assert_eq!(raw.len(), 7 + 1 + 4 + 4);
        assert_eq!(raw[2], 9);
        assert!(Pdu::decode(&raw, &cfdp).unwrap().is_valid());
        // wrong CRC width leaves two stray bytes in the body
        assert!(matches!(
            Pdu::decode(&raw, &CfdpConfig::default()),
            Err(Error::CrcMismatch { .. })
        ));
    }

    #[test]
    fn ack_finished() {
        let ack = Ack::new(
            DirectiveCode::Finished,
            ConditionCode::NoError,
            TransactionStatus::Terminated,
        )
        .unwrap();
        let pdu = Pdu::new(u16_conf(), ack);
        assert_eq!(pdu.header.config.direction, Direction::TowardsReceiver);
        let raw = roundtrip(&pdu);
        assert_eq!(raw, hex::decode("20000311000200010003065102").unwrap());
    }

    #[test]
    fn ack_eof_four_byte_ids() {
        let conf = PduConfig::builder()
            .source_entity_id(ByteField::u32(0x1000_0102))
            .dest_entity_id(ByteField::u32(0x3000_0103))
            .transaction_seq_num(ByteField::u32(0x5000_1001))
            .transmission_mode(TransmissionMode::Unacknowledged)
            .crc_flag(true)
            .build();
        let ack = Ack::new(
            DirectiveCode::Eof,
            ConditionCode::PositiveAckLimitReached,
            TransactionStatus::Active,
        )
        .unwrap();
        let pdu = Pdu::new(conf, ack);
        assert_eq!(pdu.header.config.direction, Direction::TowardsSender);
        let raw = roundtrip(&pdu);
        assert_eq!(raw.len(), 21);
        assert_eq!(
            raw[..19],
            hex::decode("2e000533100001025000100130000103064011").unwrap()
        );
    }

    #[test]
    fn finished() {
        let finished = Finished {
            file_status: FileStatus::Unreported,
            ..Default::default()
        };
        let pdu = Pdu::new(PduConfig::default(), finished);
        assert_eq!(pdu.header.config.direction, Direction::TowardsSender);
        let raw = roundtrip(&pdu);
        assert_eq!(raw, hex::decode("280002000000000503").unwrap());
    }

    #[test]
    fn finished_with_filestore_response() {
        let resp = FilestoreResponse::new(
            FilestoreActionCode::RemoveDirectory,
            FilestoreResponse::STATUS_SUCCESSFUL,
            Lv::try_from("test.txt").unwrap(),
            None,
            Lv::empty(),
        )
        .unwrap();
        let finished = Finished {
            condition: ConditionCode::FilestoreRejection,
            delivery_code: DeliveryCode::Incomplete,
            file_status: FileStatus::DiscardedDeliberately,
            filestore_responses: vec![resp],
            fault_location: None,
        };
        let raw = roundtrip(&Pdu::new(PduConfig::default(), finished));
        let mut expected = hex::decode("28000f000000000544010b6008").unwrap();
        expected.extend_from_slice(b"test.txt");
        expected.push(0x00);
        assert_eq!(raw, expected);
    }

    #[test]
    fn prompt() {
        let pdu = Pdu::new(PduConfig::default(), Prompt::new(ResponseRequired::KeepAlive));
        let raw = roundtrip(&pdu);
        assert_eq!(raw, hex::decode("200002000000000980").unwrap());
    }

    #[test]
    fn keep_alive() {
        let pdu = Pdu::new(PduConfig::default(), KeepAlive::default());
        let raw = roundtrip(&pdu);
        assert_eq!(raw, hex::decode("280005000000000c00000000").unwrap());

        let mut conf = PduConfig::default();
        conf.large_file = true;
        let raw = roundtrip(&Pdu::new(conf, KeepAlive::default()));
        assert_eq!(raw.len(), 16);
    }

    #[test]
    fn keep_alive_progress_too_large() {
        let pdu = Pdu::new(
            PduConfig::default(),
            KeepAlive {
                progress: (1 << 32) + 1,
            },
        );
        assert!(matches!(
            pdu.encode(&CfdpConfig::default()),
            Err(Error::ValueTooLarge { bits: 32, .. })
        ));
    }

    #[test]
    fn nak() {
        let pdu = Pdu::new(u16_conf(), Nak::new(0, 200));
        assert_eq!(pdu.header.config.direction, Direction::TowardsSender);
        let raw = roundtrip(&pdu);
        assert_eq!(raw.len(), 19);
        assert_eq!(raw[2], 9);

        let mut conf = u16_conf();
        conf.large_file = true;
        let raw = roundtrip(&Pdu::new(conf, Nak::new(0, 200)));
        assert_eq!(raw.len(), 27);
    }

    #[test]
    fn metadata() {
        let md = Metadata {
            checksum_type: ChecksumType::Modular,
            file_size: 2,
            source_file_name: Lv::try_from("test.txt").unwrap(),
            dest_file_name: Lv::try_from("test2.txt").unwrap(),
            ..Default::default()
        };
        let mut conf = PduConfig::default();
        let raw = roundtrip(&Pdu::new(conf, md.clone()));
        assert_eq!(raw.len(), 8 + 5 + 9 + 10);
        assert_eq!(raw[7], DirectiveCode::Metadata as u8);

        conf.crc_flag = true;
        let raw = roundtrip(&Pdu::new(conf, md));
        assert_eq!(raw.len(), 8 + 5 + 9 + 10 + 2);
    }

    #[test]
    fn eof() {
        let pdu = Pdu::new(PduConfig::default(), Eof::new(0xdead_beef, 10));
        assert_eq!(pdu.header.config.direction, Direction::TowardsReceiver);
        let raw = roundtrip(&pdu);
        assert_eq!(&raw[7..], &[0x04, 0x00, 0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 10]);
    }

    #[test]
    fn unsupported_directive() {
        let raw = hex::decode("200002000000000a00").unwrap();
        let err = Pdu::decode(&raw, &CfdpConfig::default()).unwrap_err();
        let Error::UnsupportedDirective { code, header } = err else {
            panic!("expected unsupported directive, got {err:?}");
        };
        assert_eq!(code, 0x0a);
        assert_eq!(header.encode().unwrap(), &raw[..7]);
    }

    #[test]
    fn empty_directive_body() {
        let raw = hex::decode("20000000000000").unwrap();
        assert_eq!(
            Pdu::decode(&raw, &CfdpConfig::default()).unwrap_err(),
            Error::BufferUnderflow {
                actual: 7,
                minimum: 8
            }
        );
    }

    #[test]
    fn underflow_positions_count_from_pdu_start() {
        let md = Metadata {
            source_file_name: Lv::try_from("test.txt").unwrap(),
            dest_file_name: Lv::try_from("test2.txt").unwrap(),
            ..Default::default()
        };
        let mut raw = Pdu::new(PduConfig::default(), md)
            .encode(&CfdpConfig::default())
            .unwrap();
        assert_eq!(raw.len(), 32);
        // source name length byte claims 120 bytes
        raw[13] = 120;
        assert_eq!(
            Pdu::decode(&raw, &CfdpConfig::default()).unwrap_err(),
            Error::BufferUnderflow {
                actual: 32,
                minimum: 14 + 120
            }
        );
    }

    fn crc_conf() -> PduConfig {
        let mut conf = u16_conf();
        conf.crc_flag = true;
        conf
    }

    fn assert_corruption_detected(pdu: &Pdu) {
        let cfdp = CfdpConfig::default();
        let raw = pdu.encode(&cfdp).unwrap();
        let header_len = pdu.header.header_len();
        for idx in header_len..raw.len() {
            for bit in 0..8 {
                let mut corrupt = raw.clone();
                corrupt[idx] ^= 1 << bit;
                let err = match Pdu::decode(&corrupt, &cfdp) {
                    Ok(decoded) => decoded.error,
                    Err(err) => Some(err),
                };
                assert!(
                    matches!(err, Some(Error::CrcMismatch { .. })),
                    "byte {idx} bit {bit}: {err:?}"
                );
            }
        }
    }

    #[test]
    fn corrupt_metadata_reports_crc() {
        let md = Metadata {
            closure_requested: true,
            checksum_type: ChecksumType::Crc32,
            file_size: 12,
            source_file_name: Lv::try_from("src.txt").unwrap(),
            dest_file_name: Lv::try_from("dst.txt").unwrap(),
            options: vec![crate::cfdp::tlv::Tlv::FlowLabel(vec![1, 2])],
        };
        let pdu = Pdu::new(crc_conf(), md);
        assert_corruption_detected(&pdu);

        // source name length pushed past the end of the PDU
        let cfdp = CfdpConfig::default();
        let mut raw = pdu.encode(&cfdp).unwrap();
        raw[pdu.header.header_len() + 6] ^= 0x40;
        assert!(matches!(
            Pdu::decode(&raw, &cfdp),
            Err(Error::CrcMismatch { .. })
        ));
    }

    #[test]
    fn corrupt_finished_reports_crc() {
        let pdu = Pdu::new(crc_conf(), Finished::success());
        assert_corruption_detected(&pdu);

        // condition code 9 is not assigned
        let cfdp = CfdpConfig::default();
        let mut raw = pdu.encode(&cfdp).unwrap();
        let idx = pdu.header.header_len() + 1;
        raw[idx] = 0x90 | (raw[idx] & 0x0f);
        assert!(matches!(
            Pdu::decode(&raw, &cfdp),
            Err(Error::CrcMismatch { .. })
        ));
    }

    #[test]
    fn corrupt_ack_reports_crc() {
        let ack = Ack::new(
            DirectiveCode::Eof,
            ConditionCode::NoError,
            TransactionStatus::Active,
        )
        .unwrap();
        assert_corruption_detected(&Pdu::new(crc_conf(), ack));
    }

    #[test]
    fn corrupt_nak_reports_crc() {
        let mut nak = Nak::new(0, 1024);
        nak.segment_requests = vec![(0, 10), (512, 600)];
        assert_corruption_detected(&Pdu::new(crc_conf(), nak));
    }

    #[test_case(false, false, 64, 53)]
    #[test_case(true, false, 64, 51)]
    #[test_case(false, true, 64, 49)]
    #[test_case(false, false, 11, 0)]
    fn file_segment_len(crc_flag: bool, large_file: bool, max: usize, expected: usize) {
        let mut conf = PduConfig::default();
        conf.crc_flag = crc_flag;
        conf.large_file = large_file;
        assert_eq!(
            max_file_segment_len(max, &conf, &CfdpConfig::default()).unwrap(),
            expected
        );
    }

    #[test]
    fn file_segment_len_too_small() {
        assert!(matches!(
            max_file_segment_len(10, &PduConfig::default(), &CfdpConfig::default()),
            Err(Error::ValueOutOfRange(_))
        ));
    }

    #[test_case(false, false, 64, 6)]
    #[test_case(false, false, 65, 6)]
    #[test_case(false, false, 63, 5)]
    #[test_case(false, false, 72, 7)]
    #[test_case(false, false, 16, 0)]
    #[test_case(false, true, 72, 3)]
    #[test_case(false, true, 73, 3)]
    #[test_case(false, true, 71, 2)]
    #[test_case(false, true, 88, 4)]
    #[test_case(true, true, 74, 3)]
    #[test_case(true, true, 73, 2)]
    #[test_case(true, true, 90, 4)]
    fn nak_segment_requests(crc_flag: bool, large_file: bool, max: usize, expected: usize) {
        let mut conf = PduConfig::default();
        conf.crc_flag = crc_flag;
        conf.large_file = large_file;
        assert_eq!(
            max_nak_segment_requests(max, &conf, &CfdpConfig::default()).unwrap(),
            expected
        );
    }

    #[test]
    fn nak_segment_requests_too_small() {
        assert!(
            max_nak_segment_requests(15, &PduConfig::default(), &CfdpConfig::default()).is_err()
        );
    }

    #[test]
    fn nak_at_max_segment_requests_fits() {
        let mut conf = PduConfig::default();
        conf.large_file = true;
        let n = max_nak_segment_requests(88, &conf, &CfdpConfig::default()).unwrap();
        let mut nak = Nak::new(0, 200);
        nak.segment_requests = (0..n as u64).map(|i| (i * 10, i * 10 + 5)).collect();
        let raw = Pdu::new(conf, nak).encode(&CfdpConfig::default()).unwrap();
        assert_eq!(raw.len(), 88);
    }
}
