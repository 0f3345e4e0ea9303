//! The [loca](https://learn.microsoft.com/en-us/typography/opentype/spec/loca) table

use std::ops::Range;

use crate::buffer::Buffer;
use crate::error::FontError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphLocations {
    /// `num_glyphs + 1` byte offsets into glyf
    offsets: Vec<u32>,
}

impl GlyphLocations {
    /// `wide` selects 32-bit offsets; short offsets are stored halved
    pub fn read(data: &[u8], num_glyphs: u16, wide: bool) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let count = num_glyphs as usize + 1;
        let offsets = if wide {
            (0..count)
                .map(|_| buf.read_u32())
                .collect::<Result<Vec<_>, _>>()?
        } else {
            buf.read_u16_array(count)?
                .into_iter()
                .map(|offset| offset as u32 * 2)
                .collect()
        };
        Ok(Self { offsets })
    }

    pub fn num_glyphs(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Byte range of one glyph within glyf. Empty for glyphs with no outline.
    pub fn glyph_range(&self, glyph_index: usize) -> Result<Range<usize>, FontError> {
        let (Some(&start), Some(&end)) = (
            self.offsets.get(glyph_index),
            self.offsets.get(glyph_index + 1),
        ) else {
            return Err(FontError::MalformedFont("glyph index outside loca"));
        };
        if end < start {
            return Err(FontError::MalformedFont("loca offsets are not ascending"));
        }
        Ok(start as usize..end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_offsets_are_doubled() {
        let data = [0x00, 0x00, 0x00, 0x06, 0x00, 0x06, 0x00, 0x10];
        let loca = GlyphLocations::read(&data, 3, false).unwrap();
        assert_eq!(loca.num_glyphs(), 3);
        assert_eq!(loca.glyph_range(0).unwrap(), 0..12);
        assert!(loca.glyph_range(1).unwrap().is_empty());
        assert_eq!(loca.glyph_range(2).unwrap(), 12..32);
        assert!(loca.glyph_range(3).is_err());
    }

    #[test]
    fn long_offsets() {
        let data = [0, 0, 0, 0, 0, 1, 0, 0];
        let loca = GlyphLocations::read(&data, 1, true).unwrap();
        assert_eq!(loca.glyph_range(0).unwrap(), 0..0x10000);
    }

    #[test]
    fn descending_offsets_are_malformed() {
        let data = [0x00, 0x08, 0x00, 0x04];
        let loca = GlyphLocations::read(&data, 1, false).unwrap();
        assert!(loca.glyph_range(0).is_err());
    }

    #[test]
    fn truncated_loca_is_malformed() {
        assert!(GlyphLocations::read(&[0, 0, 0, 4], 2, false).is_err());
    }
}
