//! The [maxp](https://learn.microsoft.com/en-us/typography/opentype/spec/maxp) table

use font_types::Tag;

use crate::buffer::Buffer;
use crate::error::FontError;
use crate::table_tags::MAXP;
use crate::tables::FontTable;

const VERSION_0_5: u32 = 0x0000_5000;

/// Limits only present in version 1.0 (TrueType outlines)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrueTypeLimits {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxProfile {
    pub version: u32,
    pub num_glyphs: u16,
    /// `None` for version 0.5 (CFF fonts)
    pub limits: Option<TrueTypeLimits>,
}

impl FontTable for MaxProfile {
    const TAG: Tag = MAXP;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let version = buf.read_u32()?;
        let num_glyphs = buf.read_u16()?;
        if version == VERSION_0_5 {
            return Ok(Self {
                version,
                num_glyphs,
                limits: None,
            });
        }

        let limits = TrueTypeLimits {
            max_points: buf.read_u16()?,
            max_contours: buf.read_u16()?,
            max_composite_points: buf.read_u16()?,
            max_composite_contours: buf.read_u16()?,
            max_zones: buf.read_u16()?,
            max_twilight_points: buf.read_u16()?,
            max_storage: buf.read_u16()?,
            max_function_defs: buf.read_u16()?,
            max_instruction_defs: buf.read_u16()?,
            max_stack_elements: buf.read_u16()?,
            max_size_of_instructions: buf.read_u16()?,
            max_component_elements: buf.read_u16()?,
            max_component_depth: buf.read_u16()?,
        };
        Ok(Self {
            version,
            num_glyphs,
            limits: Some(limits),
        })
    }
}
