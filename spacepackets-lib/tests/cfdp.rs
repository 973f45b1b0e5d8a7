mod common;

use common::{u16_config, unhex};
use spacepackets::cfdp::lv::Lv;
use spacepackets::cfdp::pdu::{
    Ack, Eof, FileData, Finished, KeepAlive, Metadata, Nak, Prompt, ResponseRequired,
};
use spacepackets::cfdp::reserved::{ProxyPutRequest, ReservedMessage};
use spacepackets::cfdp::tlv::{FilestoreActionCode, FilestoreRequest, MessageToUser, RawTlv, Tlv};
use spacepackets::cfdp::{
    calculate_checksum, ByteField, CfdpConfig, ChecksumType, ConditionCode, DirectiveCode,
    Direction, FileStatus, Pdu, PduBody, PduConfig, PduHeader, TransactionId,
    TransactionStatus, TransmissionMode,
};
use spacepackets::Error;

fn decode(raw: &[u8]) -> Pdu {
    Pdu::decode(raw, &CfdpConfig::default())
        .unwrap()
        .into_result()
        .unwrap()
}

#[test]
fn decode_known_vectors() {
    let ack = decode(&unhex("20 0003 11 0002 0001 0003 06 51 02"));
    assert_eq!(ack.header.transaction_id().to_string(), "2-1");
    assert_eq!(ack.header.config.dest_entity_id, ByteField::u16(3));
    let PduBody::Ack(ack) = ack.body else {
        panic!("expected ack, got {:?}", ack.body);
    };
    assert_eq!(ack.acked_directive(), DirectiveCode::Finished);
    assert_eq!(ack.transaction_status(), TransactionStatus::Terminated);

    let finished = decode(&unhex("28 0002 00 00 00 00 05 03"));
    assert_eq!(finished.header.config.direction, Direction::TowardsSender);
    assert!(matches!(
        finished.body,
        PduBody::Finished(Finished {
            file_status: FileStatus::Unreported,
            ..
        })
    ));

    let prompt = decode(&unhex("20 0002 00 00 00 00 09 80"));
    assert_eq!(
        prompt.body,
        PduBody::Prompt(Prompt::new(ResponseRequired::KeepAlive))
    );

    let keep_alive = decode(&unhex("28 0005 00 00 00 00 0c 00000000"));
    assert_eq!(keep_alive.body, PduBody::KeepAlive(KeepAlive { progress: 0 }));
}

#[test]
fn file_data_crc_vector() {
    let mut raw = unhex("32 0011 00 00 00 00 00000000");
    raw.extend_from_slice(b"hello world");
    raw.extend_from_slice(&[0xf6, 0xeb]);
    let pdu = decode(&raw);
    assert!(pdu.header.config.crc_flag);
    assert_eq!(pdu.body, PduBody::FileData(FileData::new(0, b"hello world")));
}

#[test]
fn crc_flip_reports_mismatch() {
    let mut conf = u16_config(1, 2, 3);
    conf.crc_flag = true;
    let pdu = Pdu::new(conf, Eof::new(0xcafe_babe, 1234));
    let mut raw = pdu.encode(&CfdpConfig::default()).unwrap();
    raw[12] ^= 0x80;

    let decoded = Pdu::decode(&raw, &CfdpConfig::default()).unwrap();
    assert!(matches!(decoded.error, Some(Error::CrcMismatch { .. })));
    let PduBody::Eof(eof) = decoded.value.body else {
        panic!("expected eof");
    };
    assert_eq!(eof.file_size, 1234);
    assert_ne!(eof.checksum, 0xcafe_babe);
}

#[test]
fn transaction_round_trip() {
    let file = b"The quick brown fox jumps over the lazy dog";
    let conf = PduConfig::builder()
        .source_entity_id(ByteField::u32(0x0a0b_0c0d))
        .dest_entity_id(ByteField::u32(7))
        .transaction_seq_num(ByteField::u8(99))
        .transmission_mode(TransmissionMode::Unacknowledged)
        .crc_flag(true)
        .build();
    let cfdp = CfdpConfig::default();

    let metadata = Metadata {
        closure_requested: true,
        checksum_type: ChecksumType::Crc32,
        file_size: file.len() as u64,
        source_file_name: Lv::try_from("/tmp/src.txt").unwrap(),
        dest_file_name: Lv::try_from("/data/dest.txt").unwrap(),
        options: vec![
            Tlv::MessageToUser(MessageToUser {
                value: b"hi".to_vec(),
            }),
            Tlv::FilestoreRequest(
                FilestoreRequest::new(
                    FilestoreActionCode::CreateDirectory,
                    Lv::try_from("/data").unwrap(),
                    None,
                )
                .unwrap(),
            ),
        ],
    };
    let checksum = calculate_checksum(ChecksumType::Crc32, file).unwrap();
    let mut pdus = vec![Pdu::new(conf, metadata)];
    for (idx, chunk) in file.chunks(16).enumerate() {
        pdus.push(Pdu::new(conf, FileData::new(idx as u64 * 16, chunk)));
    }
    pdus.push(Pdu::new(conf, Eof::new(checksum, file.len() as u64)));
    pdus.push(Pdu::new(conf, Finished::success()));
    pdus.push(Pdu::new(
        conf,
        Ack::new(
            DirectiveCode::Finished,
            ConditionCode::NoError,
            TransactionStatus::Terminated,
        )
        .unwrap(),
    ));

    let mut received = Vec::default();
    for pdu in &pdus {
        let raw = pdu.encode(&cfdp).unwrap();
        assert_eq!(PduHeader::packet_len_from_raw(&raw).unwrap(), raw.len());
        let decoded = Pdu::decode(&raw, &cfdp).unwrap().into_result().unwrap();
        assert_eq!(decoded.body, pdu.body);
        assert_eq!(decoded.header.config, pdu.header.config);
        if let PduBody::FileData(fd) = decoded.body {
            assert_eq!(fd.offset as usize, received.len());
            received.extend_from_slice(&fd.data);
        }
    }
    assert_eq!(received, file);
    assert_eq!(calculate_checksum(ChecksumType::Crc32, &received).unwrap(), checksum);
}

#[test]
fn nak_direction_and_layout() {
    let mut nak = Nak::new(0, 200);
    nak.segment_requests = vec![(0, 0), (50, 100)];
    let pdu = Pdu::new(u16_config(1, 2, 3), nak);
    let raw = pdu.encode(&CfdpConfig::default()).unwrap();
    assert_eq!(raw[0] & 0x08, 0x08, "NAK travels towards the sender");
    assert_eq!(raw.len(), 10 + 1 + 8 + 16);
    assert_eq!(decode(&raw).body, pdu.body);
}

#[test]
fn unsupported_directive_keeps_header() {
    let raw = unhex("24 0002 11 0002 0001 0003 0b 00");
    let Err(Error::UnsupportedDirective { code, header }) =
        Pdu::decode(&raw, &CfdpConfig::default())
    else {
        panic!("expected unsupported directive");
    };
    assert_eq!(code, 0x0b);
    assert_eq!(header.config.transmission_mode, TransmissionMode::Unacknowledged);
    assert_eq!(header.encode().unwrap(), &raw[..10]);
}

#[test]
fn header_length_mismatch() {
    let raw = unhex("20 0003 00 00 00 00 09 80");
    assert_eq!(
        Pdu::decode(&raw, &CfdpConfig::default()).unwrap_err(),
        Error::HeaderLengthMismatch {
            declared: 3,
            actual: 2
        }
    );
}

#[test]
fn proxy_put_in_metadata_options() {
    let put = ReservedMessage::ProxyPutRequest(ProxyPutRequest {
        dest_entity_id: ByteField::u16(7),
        source_file_name: Lv::try_from("/srv/in.bin").unwrap(),
        dest_file_name: Lv::try_from("/srv/out.bin").unwrap(),
    });
    let origin = ReservedMessage::OriginatingTransactionId(TransactionId {
        source_entity_id: ByteField::u16(1),
        seq_num: ByteField::u8(9),
    });
    let md = Metadata {
        options: vec![
            Tlv::MessageToUser(put.to_message()),
            Tlv::MessageToUser(origin.to_message()),
            Tlv::MessageToUser(MessageToUser {
                value: b"plain".to_vec(),
            }),
        ],
        ..Default::default()
    };
    let pdu = Pdu::new(u16_config(1, 2, 9), md);
    let raw = pdu.encode(&CfdpConfig::default()).unwrap();
    let PduBody::Metadata(md) = decode(&raw).body else {
        panic!("expected metadata");
    };
    let reserved: Vec<_> = md
        .options
        .iter()
        .map(|tlv| match tlv {
            Tlv::MessageToUser(msg) => msg.reserved().unwrap(),
            other => panic!("unexpected option {other:?}"),
        })
        .collect();
    assert_eq!(reserved, vec![Some(put), Some(origin), None]);
}

#[test]
fn malformed_metadata_option_round_trips() {
    // fault handler override whose value is three bytes long
    let odd = RawTlv::new(0x04, &[0x0a, 0x0b, 0x0c]).unwrap();
    let md = Metadata {
        options: vec![Tlv::Unknown(odd.clone()), Tlv::FlowLabel(vec![3])],
        ..Default::default()
    };
    let pdu = Pdu::new(u16_config(1, 2, 3), md);
    let raw = pdu.encode(&CfdpConfig::default()).unwrap();
    let decoded = decode(&raw);
    assert_eq!(decoded.body, pdu.body);
    assert_eq!(decoded.encode(&CfdpConfig::default()).unwrap(), raw);
}
