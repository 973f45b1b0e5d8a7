//! Big-endian bit field access.
//!
//! Bit offset 0 is the most significant bit of the first byte. Fields may span any number of
//! bytes up to 64 bits wide.
use crate::{Error, Result};

fn check_range(buf: &[u8], offset: usize, width: u32) -> Result<()> {
    let buffer_bits = buf.len() * 8;
    let in_range = (1..=64).contains(&width)
        && offset
            .checked_add(width as usize)
            .is_some_and(|end| end <= buffer_bits);
    if !in_range {
        return Err(Error::OutOfRange {
            offset,
            width,
            buffer_bits,
        });
    }
    Ok(())
}

/// Read an unsigned integer `width` bits wide starting at bit `offset`.
///
/// # Errors
/// [Error::OutOfRange] if the field does not fit in `buf` or `width` is not 1 to 64.
pub fn read_bits(buf: &[u8], offset: usize, width: u32) -> Result<u64> {
    check_range(buf, offset, width)?;
    let mut value: u64 = 0;
    for bit in offset..offset + width as usize {
        let byte = buf[bit / 8];
        let set = (byte >> (7 - bit % 8)) & 1;
        value = (value << 1) | u64::from(set);
    }
    Ok(value)
}

/// Write `value` into a field `width` bits wide starting at bit `offset`. Bits outside the
/// field are left untouched.
///
/// # Errors
/// [Error::OutOfRange] if the field does not fit in `buf`, [Error::ValueTooLarge] if `value`
/// needs more than `width` bits.
pub fn write_bits(buf: &mut [u8], offset: usize, width: u32, value: u64) -> Result<()> {
    check_range(buf, offset, width)?;
    if width < 64 && value >> width != 0 {
        return Err(Error::ValueTooLarge { value, bits: width });
    }
    for (i, bit) in (offset..offset + width as usize).enumerate() {
        let set = (value >> (width as usize - 1 - i)) & 1 == 1;
        let mask = 1u8 << (7 - bit % 8);
        if set {
            buf[bit / 8] |= mask;
        } else {
            buf[bit / 8] &= !mask;
        }
    }
    Ok(())
}

/// Number of bytes needed to hold `value`, at least 1.
#[must_use]
pub(crate) fn min_bytes(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}
