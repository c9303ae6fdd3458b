//! Defines the [`ByteReader`] type.

use num_traits::FromBytes;

use crate::error::TruncatedInput;

/// A cursor over a byte buffer, reading big-endian integers.
///
/// Every read either consumes exactly the requested number of bytes or fails with
/// [`TruncatedInput`] without moving the cursor.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new [`ByteReader`] positioned at the start of `bytes`.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Returns the number of bytes consumed so far.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the number of bytes left.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Returns whether the whole buffer has been consumed.
    #[inline(always)]
    pub fn finished(&self) -> bool {
        self.offset == self.bytes.len()
    }

    /// Consumes the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], TruncatedInput> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(TruncatedInput {
                offset: self.offset,
                wanted: n,
                remaining,
            });
        }

        let bytes = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    /// Consumes the next `n` bytes and interprets them as a big-endian unsigned integer.
    ///
    /// Only the last eight bytes contribute to the result when `n` is larger than eight.
    pub fn read(&mut self, n: usize) -> Result<u64, TruncatedInput> {
        let bytes = self.take(n)?;
        Ok(bytes
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Consumes a big-endian integer of type `T`.
    pub fn read_be<T>(&mut self) -> Result<T, TruncatedInput>
    where
        T: FromBytes,
        T::Bytes: Default,
    {
        let mut bytes = T::Bytes::default();
        let n = bytes.as_ref().len();
        bytes.as_mut().copy_from_slice(self.take(n)?);
        Ok(T::from_be_bytes(&bytes))
    }

    /// Consumes a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, TruncatedInput> {
        self.read_be()
    }

    /// Consumes a big-endian `u16`.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, TruncatedInput> {
        self.read_be()
    }

    /// Consumes a big-endian `u32`.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, TruncatedInput> {
        self.read_be()
    }

    /// Consumes a big-endian `i32`.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, TruncatedInput> {
        self.read_be()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian() {
        let mut reader = ByteReader::new(&[0x67, 0x31, 0xFF, 0xFF, 0xFF, 0xFE, 0x01]);
        assert_eq!(reader.read_u16(), Ok(0x6731));
        assert_eq!(reader.read_i32(), Ok(-2));
        assert!(!reader.finished());
        assert_eq!(reader.read_u8(), Ok(1));
        assert!(reader.finished());
    }

    #[test]
    fn read_n() {
        let mut reader = ByteReader::new(&[0x00, 0x01, 0x02]);
        assert_eq!(reader.read(3), Ok(0x0102));
        assert_eq!(reader.read(0), Ok(0));
    }

    #[test]
    fn truncated_does_not_advance() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        assert_eq!(reader.read_u8(), Ok(1));
        assert_eq!(
            reader.read_u32(),
            Err(TruncatedInput {
                offset: 1,
                wanted: 4,
                remaining: 2,
            })
        );
        assert_eq!(reader.offset(), 1);
        assert_eq!(reader.read_u16(), Ok(0x0203));
    }
}
