#![allow(dead_code)]

use spacepackets::cfdp::{ByteField, PduConfig};

/// Decode a hex string, ignoring whitespace.
pub fn unhex(s: &str) -> Vec<u8> {
    let s: String = s.split_whitespace().collect();
    hex::decode(s).expect("invalid hex in test vector")
}

/// Config with 2 byte entity ids and sequence number.
pub fn u16_config(source: u16, dest: u16, seq: u16) -> PduConfig {
    PduConfig::builder()
        .source_entity_id(ByteField::u16(source))
        .dest_entity_id(ByteField::u16(dest))
        .transaction_seq_num(ByteField::u16(seq))
        .build()
}
