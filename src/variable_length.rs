/* Copyright 2015 Google Inc. All Rights Reserved.

   Distributed under MIT license.
   See file LICENSE for detail or copy at https://opensource.org/licenses/MIT
*/

//! Readers for the woff2 variable length types: 255UInt16 and UIntBase128

use bytes::{Buf, BufMut};

use crate::error::{FontError, bail_if};

pub(crate) trait BufVariableExt: Buf {
    /// Read a 255UInt16. Every valid encoding of a value decodes to that value.
    ///
    /// Based on section 6.1.1 of MicroType Express draft spec
    fn try_get_variable_255_u16(&mut self) -> Result<u16, FontError> {
        const WORD_CODE: u8 = 253;
        const ONE_MORE_BYTE_CODE_2: u8 = 254;
        const ONE_MORE_BYTE_CODE_1: u8 = 255;
        const LOWEST_U_CODE: u16 = 253;

        let code = self.try_get_u8()?;
        let value = match code {
            WORD_CODE => self.try_get_u16()?,
            ONE_MORE_BYTE_CODE_1 => self.try_get_u8()? as u16 + LOWEST_U_CODE,
            ONE_MORE_BYTE_CODE_2 => self.try_get_u8()? as u16 + LOWEST_U_CODE * 2,
            _ => code as u16,
        };
        Ok(value)
    }

    /// Read a UIntBase128, rejecting leading zeros and anything longer than 5 bytes
    fn try_get_variable_128_u32(&mut self) -> Result<u32, FontError> {
        let mut result: u32 = 0;
        for i in 0..5 {
            let code = self.try_get_u8()?;
            // Leading zeros are invalid.
            bail_if!(i == 0 && code == 0x80, "UIntBase128 has a leading zero");
            // If any of the top seven bits are set then we're about to overflow.
            bail_if!(result & 0xFE00_0000 != 0, "UIntBase128 overflows u32");
            result = (result << 7) | ((code & 0x7F) as u32);
            if (code & 0x80) == 0 {
                return Ok(result);
            }
        }
        // Make sure not to exceed the size bound
        Err(FontError::MalformedFont("UIntBase128 longer than 5 bytes"))
    }

    /// Copy `len` bytes from the stream onto the end of `out`
    fn try_read_bytes_into(&mut self, len: usize, out: &mut impl BufMut) -> Result<(), FontError> {
        bail_if!(self.remaining() < len, "stream too short");
        let mut taken = self.take(len);
        out.put(&mut taken);
        Ok(())
    }
}

impl<T: Buf + ?Sized> BufVariableExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_255_u16_encodings_of_506_agree() {
        for encoding in [&[255u8, 253][..], &[254, 0][..], &[253, 1, 250][..]] {
            let mut input = encoding;
            assert_eq!(input.try_get_variable_255_u16().unwrap(), 506);
            assert!(input.is_empty());
        }
    }

    #[test]
    fn small_255_u16_values_are_literal() {
        let mut input: &[u8] = &[0, 252];
        assert_eq!(input.try_get_variable_255_u16().unwrap(), 0);
        assert_eq!(input.try_get_variable_255_u16().unwrap(), 252);
    }

    #[test]
    fn truncated_255_u16_is_malformed() {
        let mut input: &[u8] = &[253, 1];
        assert!(input.try_get_variable_255_u16().is_err());
    }

    #[test]
    fn base128_decodes() {
        let mut input: &[u8] = &[0x3F];
        assert_eq!(input.try_get_variable_128_u32().unwrap(), 63);
        let mut input: &[u8] = &[0x81, 0x00];
        assert_eq!(input.try_get_variable_128_u32().unwrap(), 128);
        let mut input: &[u8] = &[0x8F, 0xFF, 0xFF, 0xFF, 0x7F];
        assert_eq!(input.try_get_variable_128_u32().unwrap(), u32::MAX);
    }

    #[test]
    fn base128_rejects_leading_zero() {
        let mut input: &[u8] = &[0x80, 0x01];
        assert!(matches!(
            input.try_get_variable_128_u32(),
            Err(FontError::MalformedFont(_))
        ));
    }

    #[test]
    fn base128_rejects_unterminated_five_bytes() {
        let mut input: &[u8] = &[0x81, 0x81, 0x81, 0x81, 0x81, 0x01];
        assert!(input.try_get_variable_128_u32().is_err());
    }

    #[test]
    fn base128_rejects_overflow() {
        let mut input: &[u8] = &[0x90, 0x80, 0x80, 0x80, 0x00];
        assert!(input.try_get_variable_128_u32().is_err());
    }

    #[test]
    fn read_bytes_into_copies() {
        let mut input: &[u8] = &[1, 2, 3, 4];
        let mut out = Vec::new();
        input.try_read_bytes_into(3, &mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(input, &[4]);
        assert!(input.try_read_bytes_into(2, &mut out).is_err());
    }
}
