//! Sequence counting for space packets.
use crate::{Error, Result};

/// Width of the space packet sequence count field.
pub const SEQ_COUNT_BITS: u32 = 14;
/// Largest space packet sequence count.
pub const SEQ_COUNT_MAX: u16 = (1 << SEQ_COUNT_BITS) - 1;

/// Wrapping sequence counter.
///
/// The first call to [SequenceCounter::next] yields 0. The counter is not synchronized; callers
/// sharing one between threads must provide their own locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCounter {
    current: u16,
    bits: u32,
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self {
            current: 0,
            bits: SEQ_COUNT_BITS,
        }
    }
}

impl SequenceCounter {
    /// Counter wrapping at 2^14.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter wrapping at 2^`bits`.
    ///
    /// # Errors
    /// [Error::Config] if `bits` is not 1 to 16.
    pub fn with_width(bits: u32) -> Result<Self> {
        if !(1..=16).contains(&bits) {
            return Err(Error::Config(format!(
                "sequence counter width must be 1 to 16 bits; got {bits}"
            )));
        }
        Ok(Self { current: 0, bits })
    }

    #[must_use]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Largest value this counter produces before wrapping to 0.
    #[must_use]
    pub fn max(&self) -> u16 {
        (((1u32) << self.bits) - 1) as u16
    }

    /// Return the current value, then advance.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u16 {
        let value = self.current;
        self.current = if value == self.max() { 0 } else { value + 1 };
        value
    }

    /// The value the next call to [SequenceCounter::next] will return.
    #[must_use]
    pub fn peek(&self) -> u16 {
        self.current
    }

    /// # Errors
    /// [Error::ValueTooLarge] if `to` does not fit the counter width.
    pub fn reset(&mut self, to: u16) -> Result<()> {
        if to > self.max() {
            return Err(Error::ValueTooLarge {
                value: u64::from(to),
                bits: self.bits,
            });
        }
        self.current = to;
        Ok(())
    }
}

/// Calculate the number of missing sequence counts.
///
/// `cur` is the current sequence count. `last` is the sequence count seen before `cur`.
#[must_use]
pub fn missing_packets(cur: u16, last: u16) -> u16 {
    let modulus = u32::from(SEQ_COUNT_MAX) + 1;
    let cur = u32::from(cur) % modulus;
    let last = u32::from(last) % modulus;
    let expected = (last + 1) % modulus;
    ((cur + modulus - expected) % modulus) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_is_zero() {
        let mut counter = SequenceCounter::new();
        assert_eq!(counter.peek(), 0);
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.peek(), 2);
    }

    #[test]
    fn wraps_after_full_cycle() {
        let mut counter = SequenceCounter::new();
        for expected in 0..=SEQ_COUNT_MAX {
            assert_eq!(counter.next(), expected);
        }
        assert_eq!(counter.next(), 0);
    }

    #[test]
    fn reset() {
        let mut counter = SequenceCounter::new();
        counter.reset(SEQ_COUNT_MAX).unwrap();
        assert_eq!(counter.next(), SEQ_COUNT_MAX);
        assert_eq!(counter.peek(), 0);

        let err = counter.reset(SEQ_COUNT_MAX + 1).unwrap_err();
        assert!(matches!(err, Error::ValueTooLarge { bits: 14, .. }));
        assert_eq!(counter.peek(), 0);
    }

    #[test]
    fn custom_width() {
        let mut counter = SequenceCounter::with_width(16).unwrap();
        counter.reset(u16::MAX).unwrap();
        assert_eq!(counter.next(), u16::MAX);
        assert_eq!(counter.next(), 0);

        let mut counter = SequenceCounter::with_width(2).unwrap();
        let got: Vec<u16> = (0..5).map(|_| counter.next()).collect();
        assert_eq!(got, vec![0, 1, 2, 3, 0]);

        assert!(SequenceCounter::with_width(0).is_err());
        assert!(SequenceCounter::with_width(17).is_err());
    }

    #[test]
    fn test_missing_packets() {
        assert_eq!(missing_packets(5, 4), 0);
        assert_eq!(missing_packets(5, 3), 1);
        assert_eq!(missing_packets(0, SEQ_COUNT_MAX), 0);
        assert_eq!(missing_packets(1, SEQ_COUNT_MAX), 1);
        assert_eq!(missing_packets(0, SEQ_COUNT_MAX - 1), 1);
        assert_eq!(missing_packets(4, 4), SEQ_COUNT_MAX);
    }
}
