//! Unified Space Data Link Protocol transfer frame primary header.
//!
//! Reference: [USLP](https://public.ccsds.org/Pubs/732x1b2.pdf)
use crate::bits::{read_bits, write_bits};
use crate::bytes::ensure_len;
use crate::{Error, Result};

/// Transfer frame version number for USLP.
pub const USLP_VERSION: u8 = 0b1100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceOrDestField {
    /// Spacecraft id is the frame source.
    #[default]
    Source = 0,
    Dest = 1,
}

/// Frame fields present only in non-truncated headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameControl {
    /// Total frame octets minus 1.
    pub frame_len: u16,
    /// Set for expedited (sequence control off) frames.
    pub bypass_seq_ctrl: bool,
    pub prot_ctrl_cmd: bool,
    pub ocf_present: bool,
    /// Virtual channel frame count; its width is `vcf_count_len` bytes.
    pub vcf_count_len: u8,
    pub vcf_count: u64,
}

/// USLP primary header.
///
/// ```text
/// | version:4 | scid:16 | src/dst:1 | vcid:6 | map id:4 | end of header:1 |
/// | frame length:16 | bypass:1 | prot ctrl:1 | spare:2 | ocf:1 | vcf count len:3 |
/// | vcf count:0..56 |
/// ```
///
/// A truncated header ends after the end of header flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimaryHeader {
    pub scid: u16,
    pub src_dest: SourceOrDestField,
    pub vcid: u8,
    pub map_id: u8,
    /// `None` for a truncated header.
    pub control: Option<FrameControl>,
}

impl PrimaryHeader {
    pub const TRUNCATED_LEN: usize = 4;
    /// Full header length without the VC frame count.
    pub const MIN_FULL_LEN: usize = 7;
    pub const MAX_VCID: u8 = 0x3f;
    pub const MAX_MAP_ID: u8 = 0xf;
    pub const MAX_VCF_COUNT_LEN: u8 = 7;

    #[must_use]
    pub fn truncated(scid: u16, vcid: u8, map_id: u8) -> Self {
        Self {
            scid,
            vcid,
            map_id,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.control.is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.control {
            None => Self::TRUNCATED_LEN,
            Some(ctrl) => Self::MIN_FULL_LEN + usize::from(ctrl.vcf_count_len),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn validate(&self) -> Result<()> {
        if self.vcid > Self::MAX_VCID {
            return Err(Error::ValueTooLarge {
                value: self.vcid.into(),
                bits: 6,
            });
        }
        if self.map_id > Self::MAX_MAP_ID {
            return Err(Error::ValueTooLarge {
                value: self.map_id.into(),
                bits: 4,
            });
        }
        if let Some(ctrl) = &self.control {
            if ctrl.vcf_count_len > Self::MAX_VCF_COUNT_LEN {
                return Err(Error::InvalidLengthField(ctrl.vcf_count_len));
            }
            let bits = 8 * u32::from(ctrl.vcf_count_len);
            if bits < 64 && ctrl.vcf_count >> bits != 0 {
                return Err(Error::ValueTooLarge {
                    value: ctrl.vcf_count,
                    bits,
                });
            }
        }
        Ok(())
    }

    /// # Errors
    /// [Error::ValueTooLarge] if the VCID, MAP id or frame count do not fit their fields,
    /// [Error::InvalidLengthField] for a frame count length over 7.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let mut buf = vec![0u8; self.len()];
        write_bits(&mut buf, 0, 4, USLP_VERSION.into())?;
        write_bits(&mut buf, 4, 16, self.scid.into())?;
        write_bits(&mut buf, 20, 1, self.src_dest as u64)?;
        write_bits(&mut buf, 21, 6, self.vcid.into())?;
        write_bits(&mut buf, 27, 4, self.map_id.into())?;
        write_bits(&mut buf, 31, 1, u64::from(self.is_truncated()))?;
        if let Some(ctrl) = &self.control {
            write_bits(&mut buf, 32, 16, ctrl.frame_len.into())?;
            write_bits(&mut buf, 48, 1, ctrl.bypass_seq_ctrl.into())?;
            write_bits(&mut buf, 49, 1, ctrl.prot_ctrl_cmd.into())?;
            write_bits(&mut buf, 52, 1, ctrl.ocf_present.into())?;
            write_bits(&mut buf, 53, 3, ctrl.vcf_count_len.into())?;
            if ctrl.vcf_count_len > 0 {
                write_bits(&mut buf, 56, 8 * u32::from(ctrl.vcf_count_len), ctrl.vcf_count)?;
            }
        }
        Ok(buf)
    }

    /// Decode the header at the start of `buf`, returning it and its length.
    ///
    /// # Errors
    /// [Error::UnsupportedVersion] for anything but USLP, [Error::TruncatedHeader] if `buf`
    /// is shorter than the header.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let truncated = |minimum| {
            ensure_len(buf, minimum).map_err(|_| Error::TruncatedHeader {
                actual: buf.len(),
                minimum,
            })
        };
        truncated(Self::TRUNCATED_LEN)?;
        let version = read_bits(buf, 0, 4)? as u8;
        if version != USLP_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let mut header = Self {
            scid: read_bits(buf, 4, 16)? as u16,
            src_dest: if read_bits(buf, 20, 1)? == 0 {
                SourceOrDestField::Source
            } else {
                SourceOrDestField::Dest
            },
            vcid: read_bits(buf, 21, 6)? as u8,
            map_id: read_bits(buf, 27, 4)? as u8,
            control: None,
        };
        if read_bits(buf, 31, 1)? == 1 {
            return Ok((header, Self::TRUNCATED_LEN));
        }
        truncated(Self::MIN_FULL_LEN)?;
        let vcf_count_len = read_bits(buf, 53, 3)? as u8;
        let len = Self::MIN_FULL_LEN + usize::from(vcf_count_len);
        truncated(len)?;
        let vcf_count = if vcf_count_len == 0 {
            0
        } else {
            read_bits(buf, 56, 8 * u32::from(vcf_count_len))?
        };
        header.control = Some(FrameControl {
            frame_len: read_bits(buf, 32, 16)? as u16,
            bypass_seq_ctrl: read_bits(buf, 48, 1)? == 1,
            prot_ctrl_cmd: read_bits(buf, 49, 1)? == 1,
            ocf_present: read_bits(buf, 52, 1)? == 1,
            vcf_count_len,
            vcf_count,
        });
        Ok((header, len))
    }
}
