//! The sfnt table directory and the TrueType Collection header
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory>

use font_types::Tag;
use log::debug;

use crate::buffer::Buffer;
use crate::error::{FontError, Unsupported, bail_if};
use crate::woff2::header::{TTC_FLAVOR, WOFF1_SIG, WOFF2_SIG};

const TRUETYPE_VERSION: u32 = 0x0001_0000;
const OPENTYPE_CFF: Tag = Tag::new(b"OTTO");
const APPLE_TRUE: Tag = Tag::new(b"true");
const APPLE_TYPE1: Tag = Tag::new(b"typ1");

/// What the leading signature says a file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    Sfnt,
    Collection,
    Woff,
    Woff2,
}

impl FontKind {
    pub fn detect(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let signature = buf.read_tag()?;
        match signature {
            WOFF1_SIG => Ok(FontKind::Woff),
            WOFF2_SIG => Ok(FontKind::Woff2),
            TTC_FLAVOR => Ok(FontKind::Collection),
            _ if is_sfnt_version(signature) => Ok(FontKind::Sfnt),
            _ => Err(FontError::UnsupportedFormat(Unsupported::Signature(
                u32::from_be_bytes(signature.to_be_bytes()),
            ))),
        }
    }

    pub fn is_web_font(self) -> bool {
        matches!(self, FontKind::Woff | FontKind::Woff2)
    }
}

fn is_sfnt_version(version: Tag) -> bool {
    version == Tag::from_u32(TRUETYPE_VERSION)
        || version == OPENTYPE_CFF
        || version == APPLE_TRUE
        || version == APPLE_TYPE1
}

/// One table record. Compared field by field to validate a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableHeader {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// Table records of one font, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDirectory {
    sfnt_version: Tag,
    headers: Vec<TableHeader>,
}

impl TableDirectory {
    /// Read the directory starting at `offset`, which is non-zero for collection members
    pub fn read(data: &[u8], offset: usize) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        buf.seek(offset)?;
        let sfnt_version = buf.read_tag()?;
        if !is_sfnt_version(sfnt_version) {
            return Err(match sfnt_version {
                TTC_FLAVOR => FontError::UnsupportedFormat(Unsupported::FontCollection),
                _ => FontError::UnsupportedFormat(Unsupported::Signature(u32::from_be_bytes(
                    sfnt_version.to_be_bytes(),
                ))),
            });
        }

        let num_tables = buf.read_u16()?;
        // searchRange, entrySelector, rangeShift
        buf.skip(6)?;

        let mut headers: Vec<TableHeader> = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let header = TableHeader {
                tag: buf.read_tag()?,
                checksum: buf.read_u32()?,
                offset: buf.read_u32()?,
                length: buf.read_u32()?,
            };
            bail_if!(
                headers.iter().any(|existing| existing.tag == header.tag),
                "duplicate table tag"
            );
            headers.push(header);
        }

        debug!(
            "table directory: version '{}', {} tables",
            sfnt_version, num_tables
        );
        Ok(Self {
            sfnt_version,
            headers,
        })
    }

    pub fn sfnt_version(&self) -> Tag {
        self.sfnt_version
    }

    pub fn headers(&self) -> &[TableHeader] {
        &self.headers
    }

    pub fn get(&self, tag: Tag) -> Option<&TableHeader> {
        self.headers.iter().find(|header| header.tag == tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.get(tag).is_some()
    }

    /// Bytes of a table that must be present
    pub fn table_data<'a>(&self, data: &'a [u8], tag: Tag) -> Result<&'a [u8], FontError> {
        self.optional_table_data(data, tag)?
            .ok_or(FontError::MissingRequiredTable(tag))
    }

    /// Bytes of a table, or `None` when the font does not have it
    pub fn optional_table_data<'a>(
        &self,
        data: &'a [u8],
        tag: Tag,
    ) -> Result<Option<&'a [u8]>, FontError> {
        let Some(header) = self.get(tag) else {
            return Ok(None);
        };
        let start = header.offset as usize;
        let end = start
            .checked_add(header.length as usize)
            .ok_or(FontError::MalformedFont("table length overflows"))?;
        data.get(start..end)
            .map(Some)
            .ok_or(FontError::MalformedFont("table runs past the end of the font"))
    }
}

/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#ttc-header>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHeader {
    pub major_version: u16,
    pub minor_version: u16,
    /// Offset of each member's table directory from the start of the file
    pub offsets: Vec<u32>,
}

impl CollectionHeader {
    pub fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        bail_if!(buf.read_tag()? != TTC_FLAVOR, "not a font collection");
        let major_version = buf.read_u16()?;
        let minor_version = buf.read_u16()?;
        let num_fonts = buf.read_u32()? as usize;
        bail_if!(
            num_fonts * 4 > buf.remaining_as_slice().len(),
            "collection offsets run past the end of the file"
        );
        let offsets = (0..num_fonts)
            .map(|_| buf.read_u32())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            major_version,
            minor_version,
            offsets,
        })
    }

    pub fn num_fonts(&self) -> usize {
        self.offsets.len()
    }
}
