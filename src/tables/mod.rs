//! Per-table decoders
//!
//! Each decoder consumes the bytes of one table. Tables that depend on values
//! from other tables take those values as explicit arguments.

use font_types::Tag;

use crate::error::FontError;

pub mod cmap;
pub mod gasp;
pub mod gdef;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod loca;
pub mod maxp;
pub mod name;
pub mod os2;
pub mod post;

/// A table that can be decoded from its own bytes alone
pub trait FontTable: Sized {
    const TAG: Tag;

    fn read(data: &[u8]) -> Result<Self, FontError>;
}
