//! Big-endian reader over a font byte source
//!
//! The wire format is always big-endian. Every read is bounds checked and
//! reports `MalformedFont` rather than truncating.

use bytes::Buf;
use font_types::{F2Dot14, Fixed, Tag};

use crate::error::{FontError, bail_if};

const ONE_GIGABYTE: usize = 1024 * 1024 * 1024;

pub struct Buffer<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl bytes::Buf for Buffer<'_> {
    fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn chunk(&self) -> &[u8] {
        self.remaining_as_slice()
    }

    fn advance(&mut self, cnt: usize) {
        if self.skip(cnt).is_err() {
            panic!("Tried to advance past the end of the buffer");
        }
    }
}

impl<'a> Buffer<'a> {
    pub fn new(data: &'a [u8]) -> Buffer<'a> {
        Buffer {
            buffer: data,
            offset: 0,
        }
    }

    /// Move the cursor to an absolute offset from the start of the source
    pub fn seek(&mut self, offset: usize) -> Result<(), FontError> {
        bail_if!(offset > self.buffer.len(), "seek past end of data");
        self.offset = offset;
        Ok(())
    }

    pub fn skip(&mut self, n_bytes: usize) -> Result<(), FontError> {
        bail_if!(n_bytes > ONE_GIGABYTE, "implausibly large skip");
        bail_if!(n_bytes > self.remaining(), "skip past end of data");
        self.offset += n_bytes;
        Ok(())
    }

    /// Borrow the next `n_bytes` and advance past them
    pub fn read_bytes(&mut self, n_bytes: usize) -> Result<&'a [u8], FontError> {
        bail_if!(n_bytes > self.remaining(), "read past end of data");
        let bytes = &self.buffer[self.offset..self.offset + n_bytes];
        self.offset += n_bytes;
        Ok(bytes)
    }

    #[inline(always)]
    fn read_n_bytes<const N: usize>(&mut self) -> Result<[u8; N], FontError> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.read_bytes(N)?);
        Ok(bytes)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, FontError> {
        Ok(self.read_n_bytes::<1>()?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8, FontError> {
        Ok(self.read_u8()? as i8)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, FontError> {
        Ok(u16::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16, FontError> {
        Ok(i16::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_u24(&mut self) -> Result<u32, FontError> {
        let bytes = self.read_n_bytes::<3>()?;
        Ok((bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | (bytes[2] as u32))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, FontError> {
        Ok(u32::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, FontError> {
        Ok(i32::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, FontError> {
        Ok(u64::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_tag(&mut self) -> Result<Tag, FontError> {
        Ok(Tag::from_be_bytes(self.read_n_bytes()?))
    }

    /// 2.14 fixed point
    #[inline]
    pub fn read_f2dot14(&mut self) -> Result<f32, FontError> {
        Ok(F2Dot14::from_bits(self.read_i16()?).to_f32())
    }

    /// 16.16 fixed point
    #[inline]
    pub fn read_fixed(&mut self) -> Result<f64, FontError> {
        Ok(Fixed::from_bits(self.read_i32()?).to_f64())
    }

    pub fn read_u16_array(&mut self, count: usize) -> Result<Vec<u16>, FontError> {
        bail_if!(count * 2 > self.remaining(), "array runs past end of data");
        (0..count).map(|_| self.read_u16()).collect()
    }

    pub fn read_i16_array(&mut self, count: usize) -> Result<Vec<i16>, FontError> {
        bail_if!(count * 2 > self.remaining(), "array runs past end of data");
        (0..count).map(|_| self.read_i16()).collect()
    }

    pub fn remaining_as_slice(&self) -> &'a [u8] {
        self.buffer.get(self.offset..).unwrap_or_default()
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_primitives() {
        let data = [
            0x12, 0x34, // u16
            0xFF, 0xFE, // i16
            0x01, 0x02, 0x03, // u24
            0xDE, 0xAD, 0xBE, 0xEF, // u32
            b'g', b'l', b'y', b'f', // tag
        ];
        let mut buf = Buffer::new(&data);
        assert_eq!(buf.read_u16().unwrap(), 0x1234);
        assert_eq!(buf.read_i16().unwrap(), -2);
        assert_eq!(buf.read_u24().unwrap(), 0x010203);
        assert_eq!(buf.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(buf.read_tag().unwrap(), Tag::new(b"glyf"));
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn fixed_point_reads() {
        // 0x7000 = 1.75 in 2.14, 0xC000 = -1.0
        let data = [0x70, 0x00, 0xC0, 0x00, 0x00, 0x02, 0x80, 0x00];
        let mut buf = Buffer::new(&data);
        assert_eq!(buf.read_f2dot14().unwrap(), 1.75);
        assert_eq!(buf.read_f2dot14().unwrap(), -1.0);
        assert_eq!(buf.read_fixed().unwrap(), 2.5);
    }

    #[test]
    fn read_past_end_is_malformed() {
        let data = [0x00, 0x01, 0x02];
        let mut buf = Buffer::new(&data);
        assert!(buf.read_u16().is_ok());
        assert!(matches!(buf.read_u16(), Err(FontError::MalformedFont(_))));
        // a failed read does not move the cursor
        assert_eq!(buf.offset(), 2);
        assert_eq!(buf.read_u8().unwrap(), 0x02);
    }

    #[test]
    fn seek_is_absolute() {
        let data = [1, 2, 3, 4];
        let mut buf = Buffer::new(&data);
        buf.seek(3).unwrap();
        assert_eq!(buf.read_u8().unwrap(), 4);
        buf.seek(0).unwrap();
        assert_eq!(buf.read_u8().unwrap(), 1);
        assert!(buf.seek(5).is_err());
    }
}
