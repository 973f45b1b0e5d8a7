use proptest::prelude::*;

use spacepackets::cfdp::pdu::{FileData, KeepAlive, Nak};
use spacepackets::cfdp::reserved::ReservedMessage;
use spacepackets::cfdp::{tlv, ByteField, CfdpConfig, FieldWidth, Pdu, PduConfig, PduHeader};
use spacepackets::pus::{PusTc, PusTm, VerificationConfig, VerificationReport};
use spacepackets::spacepacket::{PacketType, PrimaryHeader, SequenceFlags, SpacePacket};
use spacepackets::timecode::TimeCode;
use spacepackets::uslp;

fn width() -> impl Strategy<Value = FieldWidth> {
    prop_oneof![
        Just(FieldWidth::One),
        Just(FieldWidth::Two),
        Just(FieldWidth::Four),
        Just(FieldWidth::Eight),
    ]
}

fn field(width: FieldWidth) -> impl Strategy<Value = ByteField> {
    (0..=width.max_value()).prop_map(move |v| ByteField::new(width, v).unwrap())
}

fn raw_tlv() -> impl Strategy<Value = tlv::RawTlv> {
    (any::<u8>(), proptest::collection::vec(any::<u8>(), 0..=255))
        .prop_map(|(typ, value)| tlv::RawTlv::new(typ, &value).unwrap())
}

prop_compose! {
    fn pdu_config()(entity in width(), seq in width())
        (source in field(entity), dest in field(entity), seq_num in field(seq),
         crc_flag in any::<bool>(), large_file in any::<bool>()) -> PduConfig {
        PduConfig::builder()
            .source_entity_id(source)
            .dest_entity_id(dest)
            .transaction_seq_num(seq_num)
            .crc_flag(crc_flag)
            .large_file(large_file)
            .build()
    }
}

proptest! {
    #[test]
    fn decoders_never_panic(buf in proptest::collection::vec(any::<u8>(), 0..300)) {
        let _ = Pdu::decode(&buf, &CfdpConfig::default());
        let _ = PduHeader::decode_prefix(&buf);
        let _ = tlv::decode_list(&buf);
        let _ = tlv::decode_raw_list(&buf);
        let _ = ReservedMessage::decode(&buf);
        let _ = SpacePacket::decode(&buf);
        let _ = PusTc::decode(&buf);
        let _ = PusTm::decode(&buf);
        if let Some((&subservice, data)) = buf.split_first() {
            let conf = VerificationConfig::default();
            let _ = VerificationReport::decode_data(subservice, data, &conf);
        }
        let _ = TimeCode::decode(&buf);
        let _ = uslp::PrimaryHeader::decode(&buf);
    }

    #[test]
    fn pdu_header_length(config in pdu_config()) {
        let header = PduHeader::new(config, spacepackets::cfdp::PduType::FileDirective, 0);
        let raw = header.encode().unwrap();
        prop_assert_eq!(
            raw.len(),
            4 + 2 * config.source_entity_id.len() + config.transaction_seq_num.len()
        );
        prop_assert_eq!(PduHeader::decode(&raw).unwrap(), header);
    }

    #[test]
    fn file_data_round_trip(
        config in pdu_config(),
        offset in 0u64..=u64::from(u32::MAX),
        data in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let pdu = Pdu::new(config, FileData::new(offset, &data));
        let raw = pdu.encode(&CfdpConfig::default()).unwrap();
        let decoded = Pdu::decode(&raw, &CfdpConfig::default()).unwrap();
        prop_assert!(decoded.is_valid());
        prop_assert_eq!(decoded.value.body, pdu.body);
    }

    #[test]
    fn directive_round_trip(
        config in pdu_config(),
        progress in 0u64..=u64::from(u32::MAX),
        end in any::<u32>(),
    ) {
        let cfdp = CfdpConfig::default();
        for pdu in [
            Pdu::new(config, KeepAlive { progress }),
            Pdu::new(config, Nak::new(0, end.into())),
        ] {
            let raw = pdu.encode(&cfdp).unwrap();
            let decoded = Pdu::decode(&raw, &cfdp).unwrap().into_result().unwrap();
            prop_assert_eq!(decoded.body, pdu.body);
        }
    }

    #[test]
    fn primary_header_round_trip(
        tc in any::<bool>(),
        sec in any::<bool>(),
        apid in 0u16..=0x7ff,
        flags in 0u8..4,
        count in 0u16..=0x3fff,
        data_len in 1usize..=65536,
    ) {
        let header = PrimaryHeader {
            packet_type: PacketType::from(tc),
            has_secondary_header: sec,
            apid,
            sequence_flags: SequenceFlags::from(flags),
            sequence_count: count,
            ..Default::default()
        };
        let raw = header.encode(data_len).unwrap();
        let decoded = PrimaryHeader::decode(&raw).unwrap();
        prop_assert_eq!(decoded.data_len(), data_len);
        prop_assert_eq!(PrimaryHeader { len_minus1: 0, ..decoded }, header);
    }

    #[test]
    fn raw_tlv_list_round_trip(tlvs in proptest::collection::vec(raw_tlv(), 0..8)) {
        let mut buf = Vec::default();
        tlv::encode_raw_list(&tlvs, &mut buf);
        prop_assert_eq!(tlv::decode_raw_list(&buf).unwrap(), tlvs);
    }

    #[test]
    fn truncated_tlv_list(
        tlvs in proptest::collection::vec(raw_tlv(), 1..8),
        cut in 1usize..=255,
    ) {
        let mut buf = Vec::default();
        tlv::encode_raw_list(&tlvs, &mut buf);
        let cut = cut.min(buf.len());
        let short = &buf[..buf.len() - cut];
        match tlv::decode_raw_list(short) {
            Ok(decoded) => prop_assert!(decoded.len() < tlvs.len()),
            Err(spacepackets::Error::TrailingData(n)) => prop_assert!(n < 2),
            Err(spacepackets::Error::BufferUnderflow { actual, minimum }) => {
                prop_assert_eq!(actual, short.len());
                prop_assert!(minimum > actual);
            }
            Err(err) => prop_assert!(false, "unexpected error {:?}", err),
        }
    }
}
