//! The [OS/2](https://learn.microsoft.com/en-us/typography/opentype/spec/os2) table

use font_types::Tag;

use crate::buffer::Buffer;
use crate::error::{FontError, Unsupported, bail};
use crate::table_tags::OS2;
use crate::tables::FontTable;

/// Apple's version 0 stops after `usLastCharIndex`
const VERSION_0_SHORT_LEN: usize = 68;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Os2 {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub weight_class: u16,
    pub width_class: u16,
    /// Embedding licensing rights
    pub fs_type: u16,
    pub subscript_x_size: i16,
    pub subscript_y_size: i16,
    pub subscript_x_offset: i16,
    pub subscript_y_offset: i16,
    pub superscript_x_size: i16,
    pub superscript_y_size: i16,
    pub superscript_x_offset: i16,
    pub superscript_y_offset: i16,
    pub strikeout_size: i16,
    pub strikeout_position: i16,
    pub family_class: i16,
    pub panose: [u8; 10],
    pub unicode_range: [u32; 4],
    pub vendor_id: Tag,
    pub fs_selection: u16,
    pub first_char_index: u16,
    pub last_char_index: u16,
    pub typo_ascender: i16,
    pub typo_descender: i16,
    pub typo_line_gap: i16,
    pub win_ascent: u16,
    pub win_descent: u16,
    // version 1
    pub code_page_range: [u32; 2],
    // versions 2 to 4
    pub x_height: i16,
    pub cap_height: i16,
    pub default_char: u16,
    pub break_char: u16,
    pub max_context: u16,
    // version 5, in TWIPs
    pub lower_optical_point_size: u16,
    pub upper_optical_point_size: u16,
}

impl Os2 {
    fn read_base(&mut self, buf: &mut Buffer) -> Result<(), FontError> {
        self.x_avg_char_width = buf.read_i16()?;
        self.weight_class = buf.read_u16()?;
        self.width_class = buf.read_u16()?;
        self.fs_type = buf.read_u16()?;
        self.subscript_x_size = buf.read_i16()?;
        self.subscript_y_size = buf.read_i16()?;
        self.subscript_x_offset = buf.read_i16()?;
        self.subscript_y_offset = buf.read_i16()?;
        self.superscript_x_size = buf.read_i16()?;
        self.superscript_y_size = buf.read_i16()?;
        self.superscript_x_offset = buf.read_i16()?;
        self.superscript_y_offset = buf.read_i16()?;
        self.strikeout_size = buf.read_i16()?;
        self.strikeout_position = buf.read_i16()?;
        self.family_class = buf.read_i16()?;
        self.panose.copy_from_slice(buf.read_bytes(10)?);
        for range in self.unicode_range.iter_mut() {
            *range = buf.read_u32()?;
        }
        self.vendor_id = buf.read_tag()?;
        self.fs_selection = buf.read_u16()?;
        self.first_char_index = buf.read_u16()?;
        self.last_char_index = buf.read_u16()?;
        Ok(())
    }

    fn read_vertical_metrics(&mut self, buf: &mut Buffer) -> Result<(), FontError> {
        self.typo_ascender = buf.read_i16()?;
        self.typo_descender = buf.read_i16()?;
        self.typo_line_gap = buf.read_i16()?;
        self.win_ascent = buf.read_u16()?;
        self.win_descent = buf.read_u16()?;
        Ok(())
    }
}

impl FontTable for Os2 {
    const TAG: Tag = OS2;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let mut os2 = Os2 {
            version: buf.read_u16()?,
            ..Default::default()
        };
        if os2.version > 5 {
            bail!(FontError::UnsupportedFormat(Unsupported::Os2Version(
                os2.version
            )));
        }

        os2.read_base(&mut buf)?;
        if os2.version == 0 && data.len() == VERSION_0_SHORT_LEN {
            return Ok(os2);
        }
        os2.read_vertical_metrics(&mut buf)?;
        if os2.version == 0 {
            return Ok(os2);
        }

        os2.code_page_range = [buf.read_u32()?, buf.read_u32()?];
        if os2.version == 1 {
            return Ok(os2);
        }

        os2.x_height = buf.read_i16()?;
        os2.cap_height = buf.read_i16()?;
        os2.default_char = buf.read_u16()?;
        os2.break_char = buf.read_u16()?;
        os2.max_context = buf.read_u16()?;
        if os2.version < 5 {
            return Ok(os2);
        }

        os2.lower_optical_point_size = buf.read_u16()?;
        os2.upper_optical_point_size = buf.read_u16()?;
        Ok(os2)
    }
}
