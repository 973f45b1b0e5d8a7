use crate::{Error, Result};

/// Bytes reads big-endian fields from the front of a slice, tracking how far it has read.
/// Every read checks for enough remaining bytes and fails with [Error::BufferUnderflow]
/// otherwise. Positions in those errors are relative to the wrapped slice; decoders of nested
/// fields re-base them with [Error::offset_by].
pub(crate) struct Bytes<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Bytes<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Bytes { buf, offset: 0 }
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        ensure_len(&self.buf[self.offset..], n).map_err(|_| Error::BufferUnderflow {
            actual: self.buf.len(),
            minimum: self.offset + n,
        })?;
        let dat = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(dat)
    }

    pub fn next(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(be_uint(self.take(2)?) as u16)
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(be_uint(self.take(4)?) as u32)
    }

    /// Unsigned integer `n` bytes wide, `n` at most 8.
    pub fn uint(&mut self, n: usize) -> Result<u64> {
        Ok(be_uint(self.take(n)?))
    }

    /// File size sensitive field: 8 bytes for large files, 4 otherwise.
    pub fn fss(&mut self, large_file: bool) -> Result<u64> {
        self.uint(fss_len(large_file))
    }

    /// Everything not yet read.
    pub fn rest(&mut self) -> &'a [u8] {
        let dat = &self.buf[self.offset..];
        self.offset = self.buf.len();
        dat
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

pub(crate) fn fss_len(large_file: bool) -> usize {
    if large_file {
        8
    } else {
        4
    }
}

/// Append a file size sensitive field.
pub(crate) fn put_fss(buf: &mut Vec<u8>, large_file: bool, value: u64) -> Result<()> {
    if !large_file && value > u64::from(u32::MAX) {
        return Err(Error::ValueTooLarge { value, bits: 32 });
    }
    buf.extend(be_bytes(value, fss_len(large_file)));
    Ok(())
}

pub(crate) fn ensure_len(buf: &[u8], minimum: usize) -> Result<()> {
    if buf.len() < minimum {
        return Err(Error::BufferUnderflow {
            actual: buf.len(),
            minimum,
        });
    }
    Ok(())
}

/// Big-endian unsigned integer from up to 8 bytes.
pub(crate) fn be_uint(buf: &[u8]) -> u64 {
    buf.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

/// Lowest `len` bytes of `value`, big-endian.
pub(crate) fn be_bytes(value: u64, len: usize) -> impl Iterator<Item = u8> {
    (0..len).rev().map(move |i| (value >> (8 * i)) as u8)
}
