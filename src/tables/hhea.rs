//! The [hhea](https://learn.microsoft.com/en-us/typography/opentype/spec/hhea) table

use font_types::Tag;

use crate::buffer::Buffer;
use crate::error::FontError;
use crate::table_tags::HHEA;
use crate::tables::FontTable;

#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalHeader {
    pub version: f64,
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub max_x_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub metric_data_format: i16,
    /// Number of explicit (advance, lsb) pairs in hmtx
    pub number_of_h_metrics: u16,
}

impl FontTable for HorizontalHeader {
    const TAG: Tag = HHEA;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let version = buf.read_fixed()?;
        let ascent = buf.read_i16()?;
        let descent = buf.read_i16()?;
        let line_gap = buf.read_i16()?;
        let advance_width_max = buf.read_u16()?;
        let min_left_side_bearing = buf.read_i16()?;
        let min_right_side_bearing = buf.read_i16()?;
        let max_x_extent = buf.read_i16()?;
        let caret_slope_rise = buf.read_i16()?;
        let caret_slope_run = buf.read_i16()?;
        let caret_offset = buf.read_i16()?;
        // four reserved int16
        buf.skip(8)?;
        Ok(Self {
            version,
            ascent,
            descent,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            max_x_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            metric_data_format: buf.read_i16()?,
            number_of_h_metrics: buf.read_u16()?,
        })
    }
}
