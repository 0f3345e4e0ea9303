//! The [gasp](https://learn.microsoft.com/en-us/typography/opentype/spec/gasp) table

use bitflags::bitflags;
use font_types::Tag;

use crate::buffer::Buffer;
use crate::error::FontError;
use crate::table_tags::GASP;
use crate::tables::FontTable;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct GaspBehavior: u16 {
        const GRIDFIT = 0x0001;
        const DOGRAY = 0x0002;
        const SYMMETRIC_GRIDFIT = 0x0004;
        const SYMMETRIC_SMOOTHING = 0x0008;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaspRange {
    /// Upper limit of the range in pixels per em, inclusive
    pub max_ppem: u16,
    pub behavior: GaspBehavior,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gasp {
    pub version: u16,
    pub ranges: Vec<GaspRange>,
}

impl Gasp {
    /// Behavior for a size, or empty flags above the last range
    pub fn behavior(&self, ppem: u16) -> GaspBehavior {
        self.ranges
            .iter()
            .find(|range| ppem <= range.max_ppem)
            .map(|range| range.behavior)
            .unwrap_or_default()
    }
}

impl FontTable for Gasp {
    const TAG: Tag = GASP;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let version = buf.read_u16()?;
        let num_ranges = buf.read_u16()?;
        let ranges = (0..num_ranges)
            .map(|_| {
                Ok(GaspRange {
                    max_ppem: buf.read_u16()?,
                    behavior: GaspBehavior::from_bits_retain(buf.read_u16()?),
                })
            })
            .collect::<Result<_, FontError>>()?;
        Ok(Self { version, ranges })
    }
}
