use hifitime::{Duration, Epoch};

use super::{TimeCodeConfig, ID_CUC_AGENCY_EPOCH, ID_CUC_CCSDS_EPOCH, NANOS_PER_SECOND};
use crate::bytes::{be_bytes, be_uint, ensure_len};
use crate::{Error, Result};

/// CCSDS Unsegmented time code field sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CucFormat {
    num_coarse: u8,
    num_fine: u8,
}

impl CucFormat {
    /// # Errors
    /// [Error::Config] unless `num_coarse` is 1 to 4 and `num_fine` is 0 to 3.
    pub fn new(num_coarse: u8, num_fine: u8) -> Result<Self> {
        if !(1..=4).contains(&num_coarse) {
            return Err(Error::Config(format!(
                "Number of CUC coarse bytes must be 1 to 4; got {num_coarse}"
            )));
        }
        if num_fine > 3 {
            return Err(Error::Config(format!(
                "Number of CUC fine bytes must be 0 to 3; got {num_fine}"
            )));
        }
        Ok(Self {
            num_coarse,
            num_fine,
        })
    }

    #[must_use]
    pub fn num_coarse(&self) -> u8 {
        self.num_coarse
    }

    #[must_use]
    pub fn num_fine(&self) -> u8 {
        self.num_fine
    }

    /// Encoded length without P-field.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.num_coarse + self.num_fine)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn max_coarse(&self) -> u64 {
        (1u64 << (8 * u32::from(self.num_coarse))) - 1
    }

    fn fine_scale(&self) -> u64 {
        1u64 << (8 * u32::from(self.num_fine))
    }
}

/// CCSDS Unsegmented time code: whole seconds since the epoch plus a binary fraction of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cuc {
    pub format: CucFormat,
    /// Set when counting from an agency defined epoch rather than the 1958 CCSDS epoch.
    pub agency_epoch: bool,
    pub coarse: u32,
    /// Fraction of a second in units of 2^-(8 * `num_fine`).
    pub fine: u32,
}

impl Cuc {
    /// # Errors
    /// [Error::ValueOutOfRange] if `secs` does not fit the coarse field.
    pub fn from_elapsed(
        format: CucFormat,
        agency_epoch: bool,
        secs: u64,
        nanos: u32,
    ) -> Result<Self> {
        if secs > format.max_coarse() {
            return Err(Error::ValueOutOfRange(format!(
                "{secs} seconds does not fit {} coarse bytes",
                format.num_coarse
            )));
        }
        if u64::from(nanos) >= NANOS_PER_SECOND {
            return Err(Error::ValueOutOfRange(format!(
                "{nanos} nanoseconds is more than a second"
            )));
        }
        let fine = u64::from(nanos) * format.fine_scale() / NANOS_PER_SECOND;
        Ok(Self {
            format,
            agency_epoch,
            coarse: secs as u32,
            fine: fine as u32,
        })
    }

    /// # Errors
    /// [Error::ValueOutOfRange] if `time` is before the epoch or too far after it.
    pub fn from_epoch(format: CucFormat, config: &TimeCodeConfig, time: Epoch) -> Result<Self> {
        let (secs, nanos) = config.elapsed(time)?;
        Self::from_elapsed(format, config.is_agency_epoch(), secs, nanos)
    }

    /// Sub-second nanoseconds, truncated to nanosecond resolution.
    #[must_use]
    pub fn nanos(&self) -> u32 {
        (u64::from(self.fine) * NANOS_PER_SECOND / self.format.fine_scale()) as u32
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::compose(
            0,
            0,
            0,
            0,
            u64::from(self.coarse),
            0,
            0,
            u64::from(self.nanos()),
        )
    }

    #[must_use]
    pub fn to_epoch(&self, config: &TimeCodeConfig) -> Epoch {
        config.to_epoch(self.elapsed())
    }

    #[must_use]
    pub fn pfield(&self) -> u8 {
        let id = if self.agency_epoch {
            ID_CUC_AGENCY_EPOCH
        } else {
            ID_CUC_CCSDS_EPOCH
        };
        (id << 4) | ((self.format.num_coarse - 1) << 2) | self.format.num_fine
    }

    /// Encode with a leading P-field.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.format.len());
        buf.push(self.pfield());
        buf.extend(self.encode_implicit());
        buf
    }

    /// Encode without a P-field.
    #[must_use]
    pub fn encode_implicit(&self) -> Vec<u8> {
        be_bytes(u64::from(self.coarse), self.format.num_coarse.into())
            .chain(be_bytes(u64::from(self.fine), self.format.num_fine.into()))
            .collect()
    }

    /// Decode a time code with a leading P-field. Returns the time code and number of bytes
    /// consumed.
    ///
    /// # Errors
    /// [Error::InvalidPField] if the P-field is extended or not a CUC P-field,
    /// [Error::BufferUnderflow] if there are not enough bytes.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        ensure_len(buf, 1)?;
        let pfield = buf[0];
        if pfield & 0x80 != 0 {
            return Err(Error::InvalidPField(pfield));
        }
        let agency_epoch = match (pfield >> 4) & 0x7 {
            ID_CUC_CCSDS_EPOCH => false,
            ID_CUC_AGENCY_EPOCH => true,
            _ => return Err(Error::InvalidPField(pfield)),
        };
        let format = CucFormat {
            num_coarse: ((pfield >> 2) & 0x3) + 1,
            num_fine: pfield & 0x3,
        };
        let mut cuc = Self::decode_implicit(format, &buf[1..])?;
        cuc.agency_epoch = agency_epoch;
        Ok((cuc, 1 + format.len()))
    }

    /// Decode a time code without a P-field.
    ///
    /// # Errors
    /// [Error::BufferUnderflow] if there are not enough bytes.
    pub fn decode_implicit(format: CucFormat, buf: &[u8]) -> Result<Self> {
        ensure_len(buf, format.len())?;
        let (coarse, rest) = buf.split_at(format.num_coarse.into());
        let fine = &rest[..format.num_fine.into()];
        Ok(Self {
            format,
            agency_epoch: false,
            coarse: be_uint(coarse) as u32,
            fine: be_uint(fine) as u32,
        })
    }
}
