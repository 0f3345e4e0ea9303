//! The [hmtx](https://learn.microsoft.com/en-us/typography/opentype/spec/hmtx) table

use crate::buffer::Buffer;
use crate::error::{FontError, bail_if};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HorizontalMetrics {
    advance_widths: Vec<u16>,
    left_side_bearings: Vec<i16>,
}

impl HorizontalMetrics {
    /// Decode `number_of_h_metrics` explicit pairs followed by left side
    /// bearings for the remaining glyphs, which share the last explicit advance.
    pub fn read(
        data: &[u8],
        num_glyphs: u16,
        number_of_h_metrics: u16,
    ) -> Result<Self, FontError> {
        // "...only one entry need be in the array, but that entry is required."
        bail_if!(
            number_of_h_metrics == 0 && num_glyphs > 0,
            "hmtx needs at least one long metric"
        );
        bail_if!(
            number_of_h_metrics > num_glyphs,
            "numberOfHMetrics exceeds glyph count"
        );

        let num_glyphs = num_glyphs as usize;
        let number_of_h_metrics = number_of_h_metrics as usize;
        let mut buf = Buffer::new(data);
        let mut advance_widths = Vec::with_capacity(num_glyphs);
        let mut left_side_bearings = Vec::with_capacity(num_glyphs);

        let mut last_advance: u16 = 0;
        for _ in 0..number_of_h_metrics {
            last_advance = buf.read_u16()?;
            advance_widths.push(last_advance);
            left_side_bearings.push(buf.read_i16()?);
        }
        for _ in number_of_h_metrics..num_glyphs {
            advance_widths.push(last_advance);
            left_side_bearings.push(buf.read_i16()?);
        }

        Ok(Self {
            advance_widths,
            left_side_bearings,
        })
    }

    /// Out of range indices use the final entry
    pub fn advance_width(&self, glyph_index: u16) -> u16 {
        let index = (glyph_index as usize).min(self.advance_widths.len().saturating_sub(1));
        self.advance_widths.get(index).copied().unwrap_or(0)
    }

    pub fn left_side_bearing(&self, glyph_index: u16) -> i16 {
        let index = (glyph_index as usize).min(self.left_side_bearings.len().saturating_sub(1));
        self.left_side_bearings.get(index).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.advance_widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advance_widths.is_empty()
    }
}
