//! Time code encoding and decoding.
//!
//! Reference: [CCSDS Time Code Formats](https://public.ccsds.org/Pubs/301x0b4e1.pdf)
//!
//! Time codes on the wire only carry the time elapsed since an epoch. Which epoch that is comes
//! from [TimeCodeConfig]; the preamble field (P-field) only says whether it is the CCSDS epoch of
//! 1958-01-01 or some agency defined epoch.
mod cds;
mod cuc;

use hifitime::{Duration, Epoch};
use tracing::trace;
use typed_builder::TypedBuilder;

use crate::{Error, Result};

pub use cds::{Cds, CdsFormat, DaySegment, SubMillis};
pub use cuc::{Cuc, CucFormat};

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;
pub const SECONDS_PER_DAY: u64 = 86_400;
pub const MILLIS_PER_DAY: u64 = 86_400_000;

/// P-field time code ids, bits 6-4
pub(crate) const ID_CUC_CCSDS_EPOCH: u8 = 0b001;
pub(crate) const ID_CUC_AGENCY_EPOCH: u8 = 0b010;
pub(crate) const ID_CDS: u8 = 0b100;

/// The CCSDS recommended epoch, 1958-01-01T00:00:00 UTC.
#[must_use]
pub fn ccsds_epoch() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(1958, 1, 1)
}

/// Time code configuration supplied by the caller.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct TimeCodeConfig {
    /// Epoch time codes count from.
    #[builder(default = ccsds_epoch())]
    pub epoch: Epoch,
}

impl Default for TimeCodeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TimeCodeConfig {
    /// True if the configured epoch is not the CCSDS 1958 epoch.
    #[must_use]
    pub fn is_agency_epoch(&self) -> bool {
        self.epoch != ccsds_epoch()
    }

    /// The absolute time `elapsed` after the configured epoch.
    #[must_use]
    pub fn to_epoch(&self, elapsed: Duration) -> Epoch {
        let scale = self.epoch.time_scale;
        Epoch::from_duration(self.epoch.to_duration_in_time_scale(scale) + elapsed, scale)
    }

    /// Time elapsed between the configured epoch and `time`.
    ///
    /// # Errors
    /// [Error::ValueOutOfRange] if `time` is before the configured epoch.
    pub fn elapsed(&self, time: Epoch) -> Result<(u64, u32)> {
        let scale = self.epoch.time_scale;
        let elapsed =
            time.to_duration_in_time_scale(scale) - self.epoch.to_duration_in_time_scale(scale);
        let nanos = elapsed.total_nanoseconds();
        if nanos < 0 {
            return Err(Error::ValueOutOfRange(format!(
                "{time} is before epoch {}",
                self.epoch
            )));
        }
        let secs = u64::try_from(nanos / i128::from(NANOS_PER_SECOND))
            .map_err(|_| Error::ValueOutOfRange(format!("{time} too far after epoch")))?;
        let subsec = (nanos % i128::from(NANOS_PER_SECOND)) as u32;
        Ok((secs, subsec))
    }
}

/// Time code wire format, used when the format is implicit (no P-field on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    Cds(CdsFormat),
    Cuc(CucFormat),
}

impl Format {
    /// Encoded length without P-field.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Format::Cds(f) => f.len(),
            Format::Cuc(f) => f.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded time code of either format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeCode {
    Cds(Cds),
    Cuc(Cuc),
}

impl TimeCode {
    /// Decode a time code with a leading P-field, dispatching on the time code id. Returns the
    /// time code and the number of bytes consumed.
    ///
    /// # Errors
    /// [Error::InvalidPField] for an unsupported P-field, [Error::BufferUnderflow] if `buf` is too
    /// short for the format the P-field describes.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let Some(&pfield) = buf.first() else {
            return Err(Error::BufferUnderflow {
                actual: 0,
                minimum: 1,
            });
        };
        let id = (pfield >> 4) & 0x7;
        trace!(pfield, id, "time code");
        match id {
            ID_CUC_CCSDS_EPOCH | ID_CUC_AGENCY_EPOCH => {
                Cuc::decode(buf).map(|(t, n)| (TimeCode::Cuc(t), n))
            }
            ID_CDS => Cds::decode(buf).map(|(t, n)| (TimeCode::Cds(t), n)),
            _ => Err(Error::InvalidPField(pfield)),
        }
    }

    /// Decode a time code with an implicit format.
    ///
    /// # Errors
    /// [Error::BufferUnderflow] if `buf` is too short for `format`.
    pub fn decode_implicit(format: &Format, buf: &[u8]) -> Result<Self> {
        Ok(match format {
            Format::Cds(f) => TimeCode::Cds(Cds::decode_implicit(*f, buf)?),
            Format::Cuc(f) => TimeCode::Cuc(Cuc::decode_implicit(*f, buf)?),
        })
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            TimeCode::Cds(t) => t.encode(),
            TimeCode::Cuc(t) => t.encode(),
        }
    }

    /// Time elapsed since the epoch.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match self {
            TimeCode::Cds(t) => t.elapsed(),
            TimeCode::Cuc(t) => t.elapsed(),
        }
    }

    #[must_use]
    pub fn to_epoch(&self, config: &TimeCodeConfig) -> Epoch {
        config.to_epoch(self.elapsed())
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn dispatch_on_pfield() {
        let (tc, n) = TimeCode::decode(&[0x40, 0x5f, 0x5b, 0x00, 0x00, 0x06, 0x94]).unwrap();
        assert_eq!(n, 7);
        assert!(matches!(tc, TimeCode::Cds(_)));

        let (tc, n) = TimeCode::decode(&[0x1e, 0, 0, 0, 1, 0x80, 0]).unwrap();
        assert_eq!(n, 7);
        assert!(matches!(tc, TimeCode::Cuc(_)));

        let (tc, _) = TimeCode::decode(&[0x2c, 0, 0, 0, 1]).unwrap();
        let TimeCode::Cuc(cuc) = tc else {
            panic!("expected cuc");
        };
        assert!(cuc.agency_epoch);

        assert_eq!(
            TimeCode::decode(&[0x5c, 0, 0]).unwrap_err(),
            Error::InvalidPField(0x5c)
        );
        assert!(matches!(
            TimeCode::decode(&[]),
            Err(Error::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn implicit_cds() {
        let buf = [0x5f, 0x5b, 0x00, 0x00, 0x06, 0x94, 0x02, 0x07];
        let format = Format::Cds(CdsFormat {
            days: DaySegment::Short,
            submillis: SubMillis::Micros,
        });
        let tc = TimeCode::decode_implicit(&format, &buf).unwrap();

        let expected = Epoch::from_str("2024-11-01T00:00:01.684519Z").unwrap();
        assert_eq!(tc.to_epoch(&TimeCodeConfig::default()), expected);
    }

    #[test]
    fn elapsed_round_trip() {
        let config = TimeCodeConfig::default();
        let time = Epoch::from_str("2024-11-01T00:00:01.684519Z").unwrap();
        let (secs, nanos) = config.elapsed(time).unwrap();
        assert_eq!(secs, 24411 * SECONDS_PER_DAY + 1);
        assert_eq!(nanos, 684_519_000);
    }

    #[test]
    fn agency_epoch() {
        let config = TimeCodeConfig::builder()
            .epoch(Epoch::from_gregorian_utc_at_midnight(2000, 1, 1))
            .build();
        assert!(config.is_agency_epoch());
        assert!(!TimeCodeConfig::default().is_agency_epoch());

        let before = Epoch::from_gregorian_utc_at_midnight(1999, 12, 31);
        assert!(matches!(
            config.elapsed(before),
            Err(Error::ValueOutOfRange(_))
        ));
    }
}
