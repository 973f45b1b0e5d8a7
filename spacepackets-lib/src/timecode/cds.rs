use hifitime::{Duration, Epoch};

use super::{TimeCodeConfig, ID_CDS, NANOS_PER_SECOND, SECONDS_PER_DAY};
use crate::bytes::{be_bytes, be_uint, ensure_len};
use crate::{Error, Result};

/// Width of the CDS day segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DaySegment {
    /// 16-bit day count
    #[default]
    Short,
    /// 24-bit day count
    Long,
}

impl DaySegment {
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            DaySegment::Short => 2,
            DaySegment::Long => 3,
        }
    }

    #[must_use]
    pub fn max_days(self) -> u64 {
        (1u64 << (8 * self.len())) - 1
    }
}

/// Resolution of the optional CDS sub-millisecond segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubMillis {
    #[default]
    None,
    /// 16-bit microsecond of millisecond
    Micros,
    /// 32-bit picosecond of millisecond
    Picos,
}

impl SubMillis {
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            SubMillis::None => 0,
            SubMillis::Micros => 2,
            SubMillis::Picos => 4,
        }
    }

    fn bits(self) -> u8 {
        match self {
            SubMillis::None => 0b00,
            SubMillis::Micros => 0b01,
            SubMillis::Picos => 0b10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CdsFormat {
    pub days: DaySegment,
    pub submillis: SubMillis,
}

impl CdsFormat {
    /// The common short format: 16-bit days, 32-bit milliseconds of day.
    pub const SHORT: CdsFormat = CdsFormat {
        days: DaySegment::Short,
        submillis: SubMillis::None,
    };

    /// Encoded length without P-field.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len() + 4 + self.submillis.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// CCSDS Day Segmented time code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cds {
    pub format: CdsFormat,
    /// Set when counting from an agency defined epoch rather than the 1958 CCSDS epoch.
    pub agency_epoch: bool,
    pub days: u32,
    pub ms_of_day: u32,
    /// Microseconds or picoseconds of the millisecond, per `format.submillis`.
    pub submillis: u32,
}

impl Cds {
    /// Length of a short CDS timestamp including the P-field.
    pub const SHORT_LEN: usize = 7;

    /// # Errors
    /// [Error::ValueOutOfRange] if the day count does not fit the day segment.
    pub fn from_elapsed(
        format: CdsFormat,
        agency_epoch: bool,
        secs: u64,
        nanos: u32,
    ) -> Result<Self> {
        if u64::from(nanos) >= NANOS_PER_SECOND {
            return Err(Error::ValueOutOfRange(format!(
                "{nanos} nanoseconds is more than a second"
            )));
        }
        let days = secs / SECONDS_PER_DAY;
        if days > format.days.max_days() {
            return Err(Error::ValueOutOfRange(format!(
                "{days} days does not fit {} day bytes",
                format.days.len()
            )));
        }
        let ms_of_day = (secs % SECONDS_PER_DAY) * 1000 + u64::from(nanos / 1_000_000);
        let nanos_of_ms = u64::from(nanos % 1_000_000);
        let submillis = match format.submillis {
            SubMillis::None => 0,
            SubMillis::Micros => nanos_of_ms / 1000,
            SubMillis::Picos => nanos_of_ms * 1000,
        };
        Ok(Self {
            format,
            agency_epoch,
            days: days as u32,
            ms_of_day: ms_of_day as u32,
            submillis: submillis as u32,
        })
    }

    /// # Errors
    /// [Error::ValueOutOfRange] if `time` is before the epoch or the day count overflows.
    pub fn from_epoch(format: CdsFormat, config: &TimeCodeConfig, time: Epoch) -> Result<Self> {
        let (secs, nanos) = config.elapsed(time)?;
        Self::from_elapsed(format, config.is_agency_epoch(), secs, nanos)
    }

    fn submillis_nanos(&self) -> u64 {
        match self.format.submillis {
            SubMillis::None => 0,
            SubMillis::Micros => u64::from(self.submillis) * 1000,
            SubMillis::Picos => u64::from(self.submillis) / 1000,
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::compose(
            0,
            u64::from(self.days),
            0,
            0,
            0,
            u64::from(self.ms_of_day),
            0,
            self.submillis_nanos(),
        )
    }

    #[must_use]
    pub fn to_epoch(&self, config: &TimeCodeConfig) -> Epoch {
        config.to_epoch(self.elapsed())
    }

    #[must_use]
    pub fn pfield(&self) -> u8 {
        let mut pfield = ID_CDS << 4;
        if self.agency_epoch {
            pfield |= 0b1000;
        }
        if self.format.days == DaySegment::Long {
            pfield |= 0b0100;
        }
        pfield | self.format.submillis.bits()
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
        be_bytes(u64::from(self.days), self.format.days.len())
            .chain(self.ms_of_day.to_be_bytes())
            .chain(be_bytes(
                u64::from(self.submillis),
                self.format.submillis.len(),
            ))
            .collect()
    }

    /// Decode a time code with a leading P-field. Returns the time code and number of bytes
    /// consumed.
    ///
    /// # Errors
    /// [Error::InvalidPField] if the P-field is not a CDS P-field or uses the reserved
    /// sub-millisecond resolution, [Error::BufferUnderflow] if there are not enough bytes.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        ensure_len(buf, 1)?;
        let pfield = buf[0];
        if pfield & 0x80 != 0 || (pfield >> 4) & 0x7 != ID_CDS {
            return Err(Error::InvalidPField(pfield));
        }
        let submillis = match pfield & 0b11 {
            0b00 => SubMillis::None,
            0b01 => SubMillis::Micros,
            0b10 => SubMillis::Picos,
            _ => return Err(Error::InvalidPField(pfield)),
        };
        let days = if pfield & 0b0100 == 0 {
            DaySegment::Short
        } else {
            DaySegment::Long
        };
        let format = CdsFormat { days, submillis };
        let mut cds = Self::decode_implicit(format, &buf[1..])?;
        cds.agency_epoch = pfield & 0b1000 != 0;
        Ok((cds, 1 + format.len()))
    }

    /// Decode a time code without a P-field.
    ///
    /// # Errors
    /// [Error::BufferUnderflow] if there are not enough bytes.
    pub fn decode_implicit(format: CdsFormat, buf: &[u8]) -> Result<Self> {
        ensure_len(buf, format.len())?;
        let (days, rest) = buf.split_at(format.days.len());
        let (ms, rest) = rest.split_at(4);
        let submillis = &rest[..format.submillis.len()];
        Ok(Self {
            format,
            agency_epoch: false,
            days: be_uint(days) as u32,
            ms_of_day: be_uint(ms) as u32,
            submillis: be_uint(submillis) as u32,
        })
    }
}
