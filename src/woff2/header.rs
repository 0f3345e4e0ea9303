//! WOFF and WOFF2 file headers and the WOFF2 table directory

use bytes::Buf;
use font_types::Tag;

use crate::error::{FontError, Unsupported, bail_if, usize_will_overflow};
use crate::table_tags::{GLYF, HMTX, KNOWN_TABLE_TAGS, LOCA};
use crate::variable_length::BufVariableExt;

pub const WOFF1_SIG: Tag = Tag::new(b"wOFF");
pub const WOFF2_SIG: Tag = Tag::new(b"wOF2");
pub const TTC_FLAVOR: Tag = Tag::new(b"ttcf");

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WoffVersion {
    Woff1 = 1,
    Woff2 = 2,
}

/// WOFF header that can represent either a WOFF1 or WOFF2 header
///
/// <https://www.w3.org/TR/WOFF2/#woff20Header>
#[derive(Debug, Clone)]
pub struct WoffHeader {
    // Not in the header; derived from the signature
    pub woff_version: WoffVersion,
    /// The "sfnt version" of the input font.
    pub flavor: Tag,
    /// Total size of the WOFF file.
    pub length: u32,
    /// Number of entries in directory of font tables.
    pub num_tables: u16,
    /// Total size needed for the uncompressed font data, including the sfnt header, directory, and font tables (including padding).
    pub total_sfnt_size: u32,
    /// (WOFF2 only) Total length of the compressed data block.
    pub total_compressed_size: u32,
    pub major_version: u16,
    pub minor_version: u16,
    /// Offset to metadata block, from beginning of WOFF file.
    pub meta_offset: u32,
    /// Length of compressed metadata block.
    pub meta_length: u32,
    /// Uncompressed size of metadata block.
    pub meta_orig_length: u32,
    /// Offset to private data block, from beginning of WOFF file.
    pub priv_offset: u32,
    /// Length of private data block.
    pub priv_length: u32,
}

impl WoffHeader {
    pub fn parse(input: &mut impl Buf) -> Result<Self, FontError> {
        let input_len = input.remaining();
        let input_len_u32 = input_len as u32;

        let signature = Tag::from_u32(input.try_get_u32()?);
        let woff_version = match signature {
            WOFF1_SIG => WoffVersion::Woff1,
            WOFF2_SIG => WoffVersion::Woff2,
            _ => {
                return Err(FontError::UnsupportedFormat(Unsupported::Signature(
                    u32::from_be_bytes(signature.to_be_bytes()),
                )));
            }
        };

        let flavor = Tag::from_u32(input.try_get_u32()?);
        let length = input.try_get_u32()?;
        let num_tables = input.try_get_u16()?;
        let reserved = input.try_get_u16()?;
        let header = Self {
            woff_version,
            flavor,
            length,
            num_tables,
            total_sfnt_size: input.try_get_u32()?,
            // totalCompressedSize only exists in WOFF2 headers
            total_compressed_size: match woff_version {
                WoffVersion::Woff1 => 0,
                WoffVersion::Woff2 => input.try_get_u32()?,
            },
            major_version: input.try_get_u16()?,
            minor_version: input.try_get_u16()?,
            meta_offset: input.try_get_u32()?,
            meta_length: input.try_get_u32()?,
            meta_orig_length: input.try_get_u32()?,
            priv_offset: input.try_get_u32()?,
            priv_length: input.try_get_u32()?,
        };

        bail_if!(
            header.length != input_len_u32,
            "WOFF length does not match the file size"
        );
        bail_if!(header.num_tables == 0, "WOFF has no tables");
        bail_if!(reserved != 0, "WOFF reserved field is not zero");
        if header.meta_offset != 0 {
            bail_if!(
                header.meta_offset >= input_len_u32
                    || input_len_u32 - header.meta_offset < header.meta_length,
                "WOFF metadata block is out of bounds"
            );
        }
        if header.priv_offset != 0 {
            bail_if!(
                header.priv_offset >= input_len_u32
                    || input_len_u32 - header.priv_offset < header.priv_length,
                "WOFF private block is out of bounds"
            );
        }

        Ok(header)
    }

    pub fn is_collection(&self) -> bool {
        self.flavor == TTC_FLAVOR
    }
}

/// <https://www.w3.org/TR/WOFF2/#table_dir_format>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Woff2TableDirectoryEntry {
    pub tag: Tag,
    /// Transformation version, 0-3
    pub format: u8,
    /// Length of original table. This may be inaccurate in the case of transformed tables.
    pub orig_length: u32,
    /// Offset of the table within the decompressed data
    pub woff_offset: u32,
    /// Length of the table within the decompressed data
    pub woff_length: u32,
}

impl Woff2TableDirectoryEntry {
    pub fn parse(input: &mut impl Buf) -> Result<Self, FontError> {
        let flags = input.try_get_u8()?;
        let (known_tag, format) = Self::parse_flags(flags);
        let tag = match known_tag {
            Some(tag) => tag,
            None => Tag::from_u32(input.try_get_u32()?),
        };
        let orig_length = input.try_get_variable_128_u32()?;
        let mut entry = Self {
            tag,
            format,
            orig_length,
            woff_offset: 0,
            woff_length: orig_length,
        };
        // transformLength is only present for transformed tables
        if entry.is_transformed() {
            entry.woff_length = input.try_get_variable_128_u32()?;
        }

        bail_if!(
            entry.tag == LOCA && entry.is_transformed() && entry.woff_length != 0,
            "transformed loca must be empty"
        );

        Ok(entry)
    }

    /// Split flags into the "known tag" and the transformation version
    ///
    /// Bits [0..5] index the known tag table, 63 meaning an explicit tag
    /// follows. Bits 6 and 7 hold the transformation version.
    pub fn parse_flags(flags: u8) -> (Option<Tag>, u8) {
        const TAG_MASK: u8 = 0b0011_1111;
        const FORMAT_MASK: u8 = 0b1100_0000;
        let tag_bits = flags & TAG_MASK;
        let format = (flags & FORMAT_MASK) >> 6;
        let tag = KNOWN_TABLE_TAGS.get(tag_bits as usize).copied();
        (tag, format)
    }

    /// Whether the table has been transformed
    ///
    /// For glyf and loca version 3 is the null transform; for every other
    /// table it is version 0.
    pub fn is_transformed(&self) -> bool {
        match self.tag {
            GLYF | LOCA => self.format != 3,
            _ => self.format != 0,
        }
    }

    /// Fail for transforms this decoder cannot reverse
    pub(crate) fn check_transform(&self) -> Result<(), FontError> {
        let supported = match self.tag {
            GLYF | LOCA => matches!(self.format, 0 | 3),
            HMTX => matches!(self.format, 0 | 1),
            _ => self.format == 0,
        };
        bail_if!(
            !supported,
            FontError::UnsupportedFormat(Unsupported::Woff2Transform(self.tag, self.format))
        );
        Ok(())
    }

    pub fn data_as_slice<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], FontError> {
        let start = self.woff_offset as usize;
        let end = start + self.woff_length as usize;
        data.get(start..end)
            .ok_or(FontError::MalformedFont("WOFF2 table runs past the decompressed data"))
    }
}

/// Parse `num_tables` directory entries. Tables are stored back to back in
/// the decompressed stream, so offsets are the running sum of lengths.
pub fn parse_table_directory(
    input: &mut impl Buf,
    num_tables: usize,
) -> Result<Vec<Woff2TableDirectoryEntry>, FontError> {
    let mut offset_in_woff: usize = 0;
    let mut tables = Vec::with_capacity(num_tables);
    for _ in 0..num_tables {
        let mut table = Woff2TableDirectoryEntry::parse(input)?;
        table.woff_offset = offset_in_woff as u32;

        bail_if!(
            usize_will_overflow(offset_in_woff, table.woff_length as usize),
            "WOFF2 table lengths overflow"
        );
        offset_in_woff += table.woff_length as usize;
        tables.push(table);
    }
    Ok(tables)
}

/// WOFF1 table directory entry
///
/// <https://www.w3.org/TR/WOFF/#TableDirectory>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Woff1TableDirectoryEntry {
    pub tag: Tag,
    /// Offset of the table data from the start of the WOFF file
    pub offset: u32,
    pub comp_length: u32,
    pub orig_length: u32,
    pub orig_checksum: u32,
}

impl Woff1TableDirectoryEntry {
    pub fn parse(input: &mut impl Buf) -> Result<Self, FontError> {
        let entry = Self {
            tag: Tag::from_u32(input.try_get_u32()?),
            offset: input.try_get_u32()?,
            comp_length: input.try_get_u32()?,
            orig_length: input.try_get_u32()?,
            orig_checksum: input.try_get_u32()?,
        };
        bail_if!(
            entry.comp_length > entry.orig_length,
            "WOFF table is larger compressed than uncompressed"
        );
        Ok(entry)
    }

    pub fn is_compressed(&self) -> bool {
        self.comp_length < self.orig_length
    }

    pub fn data_as_slice<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], FontError> {
        let start = self.offset as usize;
        let end = start + self.comp_length as usize;
        data.get(start..end)
            .ok_or(FontError::MalformedFont("WOFF table runs past the end of the file"))
    }
}
