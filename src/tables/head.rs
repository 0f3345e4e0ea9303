//! The [head](https://learn.microsoft.com/en-us/typography/opentype/spec/head) table

use font_types::Tag;

use crate::buffer::Buffer;
use crate::error::{FontError, bail_if};
use crate::glyph::Bounds;
use crate::table_tags::HEAD;
use crate::tables::FontTable;

pub const MAGIC_NUMBER: u32 = 0x5F0F_3CF5;
const MIN_UNITS_PER_EM: u16 = 16;
const MAX_UNITS_PER_EM: u16 = 16384;

#[derive(Debug, Clone, PartialEq)]
pub struct Head {
    pub version: f64,
    pub font_revision: f64,
    pub checksum_adjustment: u32,
    pub flags: u16,
    pub units_per_em: u16,
    /// Seconds since 1904-01-01
    pub created: u64,
    pub modified: u64,
    pub bounds: Bounds,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    /// 0 for short (`Offset16`) loca offsets, 1 for long (`Offset32`)
    pub index_to_loc_format: i16,
    pub glyph_data_format: i16,
}

impl Head {
    /// True when the loca table stores 32-bit offsets
    pub fn wide_glyph_locations(&self) -> bool {
        self.index_to_loc_format > 0
    }
}

impl FontTable for Head {
    const TAG: Tag = HEAD;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let version = buf.read_fixed()?;
        let font_revision = buf.read_fixed()?;
        let checksum_adjustment = buf.read_u32()?;
        let magic = buf.read_u32()?;
        bail_if!(magic != MAGIC_NUMBER, "head table has a bad magic number");

        let flags = buf.read_u16()?;
        let units_per_em = buf.read_u16()?;
        bail_if!(
            !(MIN_UNITS_PER_EM..=MAX_UNITS_PER_EM).contains(&units_per_em),
            "unitsPerEm out of range"
        );

        Ok(Self {
            version,
            font_revision,
            checksum_adjustment,
            flags,
            units_per_em,
            created: buf.read_u64()?,
            modified: buf.read_u64()?,
            bounds: Bounds::read(&mut buf)?,
            mac_style: buf.read_u16()?,
            lowest_rec_ppem: buf.read_u16()?,
            font_direction_hint: buf.read_i16()?,
            index_to_loc_format: buf.read_i16()?,
            glyph_data_format: buf.read_i16()?,
        })
    }
}
