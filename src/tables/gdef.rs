//! Glyph classes from the [GDEF](https://learn.microsoft.com/en-us/typography/opentype/spec/gdef) table
//!
//! Only the glyph class definition is decoded. Attachment points, ligature
//! carets and mark sets are layout data this crate does not use.

use font_types::Tag;

use crate::buffer::Buffer;
use crate::error::{FontError, bail_if};
use crate::glyph::GlyphClass;
use crate::table_tags::GDEF;
use crate::tables::FontTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRange {
    pub start: u16,
    pub end: u16,
    pub class: u16,
}

/// A decoded ClassDef table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassDef {
    Format1 { start_glyph: u16, classes: Vec<u16> },
    Format2 { ranges: Vec<ClassRange> },
    Empty,
}

impl ClassDef {
    fn read(data: &[u8], offset: usize) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        buf.seek(offset)?;
        match buf.read_u16()? {
            1 => {
                let start_glyph = buf.read_u16()?;
                let count = buf.read_u16()? as usize;
                Ok(ClassDef::Format1 {
                    start_glyph,
                    classes: buf.read_u16_array(count)?,
                })
            }
            2 => {
                let count = buf.read_u16()? as usize;
                let mut ranges = Vec::with_capacity(count);
                for _ in 0..count {
                    let range = ClassRange {
                        start: buf.read_u16()?,
                        end: buf.read_u16()?,
                        class: buf.read_u16()?,
                    };
                    bail_if!(range.end < range.start, "class range ends before it starts");
                    ranges.push(range);
                }
                Ok(ClassDef::Format2 { ranges })
            }
            _ => Err(FontError::MalformedFont("unknown ClassDef format")),
        }
    }

    /// Class value of `glyph`; 0 when the glyph is not listed
    pub fn class_value(&self, glyph: u16) -> u16 {
        match self {
            ClassDef::Format1 {
                start_glyph,
                classes,
            } => glyph
                .checked_sub(*start_glyph)
                .and_then(|i| classes.get(i as usize))
                .copied()
                .unwrap_or(0),
            ClassDef::Format2 { ranges } => {
                let i = ranges.partition_point(|range| range.end < glyph);
                ranges
                    .get(i)
                    .filter(|range| range.start <= glyph)
                    .map(|range| range.class)
                    .unwrap_or(0)
            }
            ClassDef::Empty => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gdef {
    pub major_version: u16,
    pub minor_version: u16,
    glyph_class_def: ClassDef,
}

impl Gdef {
    pub fn glyph_class(&self, glyph: u16) -> GlyphClass {
        GlyphClass::from_class_value(self.glyph_class_def.class_value(glyph))
    }
}

impl FontTable for Gdef {
    const TAG: Tag = GDEF;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let major_version = buf.read_u16()?;
        let minor_version = buf.read_u16()?;
        let glyph_class_def_offset = buf.read_u16()? as usize;
        let glyph_class_def = if glyph_class_def_offset == 0 {
            ClassDef::Empty
        } else {
            ClassDef::read(data, glyph_class_def_offset)?
        };
        Ok(Self {
            major_version,
            minor_version,
            glyph_class_def,
        })
    }
}
