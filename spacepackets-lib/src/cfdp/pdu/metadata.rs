use crate::bytes::{put_fss, Bytes};
use crate::cfdp::lv::Lv;
use crate::cfdp::tlv::{encode_list, read_raw_list, Tlv};
use crate::cfdp::ChecksumType;
use crate::Result;

/// Opens a transaction: file size, file names and option TLVs such as filestore requests or
/// messages to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    pub closure_requested: bool,
    pub checksum_type: ChecksumType,
    pub file_size: u64,
    /// Empty for transactions that only carry options.
    pub source_file_name: Lv,
    pub dest_file_name: Lv,
    /// Options whose value does not parse as their type are kept as [Tlv::Unknown].
    pub options: Vec<Tlv>,
}

impl Metadata {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>, large_file: bool) -> Result<()> {
        buf.push(u8::from(self.closure_requested) << 6 | self.checksum_type as u8);
        put_fss(buf, large_file, self.file_size)?;
        self.source_file_name.encode_into(buf);
        self.dest_file_name.encode_into(buf);
        encode_list(&self.options, buf)
    }

    pub(crate) fn decode(buf: &[u8], large_file: bool) -> Result<Self> {
        let mut bytes = Bytes::new(buf);
        let flags = bytes.next()?;
        let checksum_type = ChecksumType::try_from(flags & 0x0f)?;
        let file_size = bytes.fss(large_file)?;
        let source_file_name = Lv::read(&mut bytes)?;
        let dest_file_name = Lv::read(&mut bytes)?;
        let options = read_raw_list(&mut bytes)?
            .into_iter()
            .map(Tlv::from_raw_lenient)
            .collect();
        Ok(Self {
            closure_requested: flags & 0x40 != 0,
            checksum_type,
            file_size,
            source_file_name,
            dest_file_name,
            options,
        })
    }
}
