//! The [post](https://learn.microsoft.com/en-us/typography/opentype/spec/post) table

use std::collections::HashMap;

use font_types::Tag;
use log::warn;
use once_cell::unsync::OnceCell;

use crate::buffer::Buffer;
use crate::error::{FontError, Unsupported, bail};
use crate::table_tags::POST;
use crate::tables::FontTable;

const VERSION_1: u32 = 0x0001_0000;
const VERSION_2: u32 = 0x0002_0000;
const VERSION_2_5: u32 = 0x0002_5000;
const VERSION_3: u32 = 0x0003_0000;

/// The standard Macintosh glyph order
pub static MAC_GLYPH_NAMES: [&str; 258] = [
    ".notdef", ".null", "nonmarkingreturn", "space", "exclam", "quotedbl", "numbersign",
    "dollar", "percent", "ampersand", "quotesingle", "parenleft", "parenright", "asterisk",
    "plus", "comma", "hyphen", "period", "slash", "zero", "one", "two", "three", "four", "five",
    "six", "seven", "eight", "nine", "colon", "semicolon", "less", "equal", "greater",
    "question", "at", "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O",
    "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "bracketleft", "backslash",
    "bracketright", "asciicircum", "underscore", "grave", "a", "b", "c", "d", "e", "f", "g",
    "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y",
    "z", "braceleft", "bar", "braceright", "asciitilde", "Adieresis", "Aring", "Ccedilla",
    "Eacute", "Ntilde", "Odieresis", "Udieresis", "aacute", "agrave", "acircumflex",
    "adieresis", "atilde", "aring", "ccedilla", "eacute", "egrave", "ecircumflex", "edieresis",
    "iacute", "igrave", "icircumflex", "idieresis", "ntilde", "oacute", "ograve", "ocircumflex",
    "odieresis", "otilde", "uacute", "ugrave", "ucircumflex", "udieresis", "dagger", "degree",
    "cent", "sterling", "section", "bullet", "paragraph", "germandbls", "registered",
    "copyright", "trademark", "acute", "dieresis", "notequal", "AE", "Oslash", "infinity",
    "plusminus", "lessequal", "greaterequal", "yen", "mu", "partialdiff", "summation",
    "product", "pi", "integral", "ordfeminine", "ordmasculine", "Omega", "ae", "oslash",
    "questiondown", "exclamdown", "logicalnot", "radical", "florin", "approxequal", "Delta",
    "guillemotleft", "guillemotright", "ellipsis", "nonbreakingspace", "Agrave", "Atilde",
    "Otilde", "OE", "oe", "endash", "emdash", "quotedblleft", "quotedblright", "quoteleft",
    "quoteright", "divide", "lozenge", "ydieresis", "Ydieresis", "fraction", "currency",
    "guilsinglleft", "guilsinglright", "fi", "fl", "daggerdbl", "periodcentered",
    "quotesinglbase", "quotedblbase", "perthousand", "Acircumflex", "Ecircumflex", "Aacute",
    "Edieresis", "Egrave", "Iacute", "Icircumflex", "Idieresis", "Igrave", "Oacute",
    "Ocircumflex", "apple", "Ograve", "Uacute", "Ucircumflex", "Ugrave", "dotlessi",
    "circumflex", "tilde", "macron", "breve", "dotaccent", "ring", "cedilla", "hungarumlaut",
    "ogonek", "caron", "Lslash", "lslash", "Scaron", "scaron", "Zcaron", "zcaron", "brokenbar",
    "Eth", "eth", "Yacute", "yacute", "Thorn", "thorn", "minus", "multiply", "onesuperior",
    "twosuperior", "threesuperior", "onehalf", "onequarter", "threequarters", "franc", "Gbreve",
    "gbreve", "Idotaccent", "Scedilla", "scedilla", "Cacute", "cacute", "Ccaron", "ccaron",
    "dcroat",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum GlyphNames {
    /// Version 1.0: glyphs follow the standard Macintosh order
    Standard,
    /// Version 2.0: per-glyph index into the standard names, or into
    /// the custom names when `>= 258`
    Indexed {
        name_indices: Vec<u16>,
        custom_names: Vec<String>,
    },
    None,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub version: u32,
    /// Degrees counter-clockwise from vertical
    pub italic_angle: f64,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: bool,
    names: GlyphNames,
    by_name: OnceCell<HashMap<String, u16>>,
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.italic_angle == other.italic_angle
            && self.underline_position == other.underline_position
            && self.underline_thickness == other.underline_thickness
            && self.is_fixed_pitch == other.is_fixed_pitch
            && self.names == other.names
    }
}

impl Post {
    pub fn has_glyph_names(&self) -> bool {
        !matches!(self.names, GlyphNames::None)
    }

    pub fn glyph_name(&self, glyph_index: u16) -> Option<&str> {
        match &self.names {
            GlyphNames::Standard => MAC_GLYPH_NAMES.get(glyph_index as usize).copied(),
            GlyphNames::Indexed {
                name_indices,
                custom_names,
            } => {
                let name_index = *name_indices.get(glyph_index as usize)? as usize;
                match name_index.checked_sub(MAC_GLYPH_NAMES.len()) {
                    None => Some(MAC_GLYPH_NAMES[name_index]),
                    Some(custom) => custom_names.get(custom).map(String::as_str),
                }
            }
            GlyphNames::None => None,
        }
    }

    /// Reverse lookup. The map is built on the first call.
    pub fn glyph_index_by_name(&self, name: &str) -> Option<u16> {
        self.by_name
            .get_or_init(|| {
                let count = match &self.names {
                    GlyphNames::Standard => MAC_GLYPH_NAMES.len(),
                    GlyphNames::Indexed { name_indices, .. } => name_indices.len(),
                    GlyphNames::None => 0,
                };
                let mut map = HashMap::with_capacity(count);
                for index in 0..count as u16 {
                    if let Some(glyph_name) = self.glyph_name(index) {
                        // keep the lowest index for duplicated names
                        map.entry(glyph_name.to_owned()).or_insert(index);
                    }
                }
                map
            })
            .get(name)
            .copied()
    }
}

fn read_indexed_names(buf: &mut Buffer) -> Result<GlyphNames, FontError> {
    let num_glyphs = buf.read_u16()? as usize;
    let name_indices = buf.read_u16_array(num_glyphs)?;
    let num_custom = name_indices
        .iter()
        .filter_map(|&index| (index as usize).checked_sub(MAC_GLYPH_NAMES.len()))
        .map(|custom| custom + 1)
        .max()
        .unwrap_or(0);

    let mut custom_names = Vec::with_capacity(num_custom);
    for _ in 0..num_custom {
        let len = buf.read_u8()? as usize;
        let bytes = buf.read_bytes(len)?;
        custom_names.push(String::from_utf8_lossy(bytes).into_owned());
    }
    Ok(GlyphNames::Indexed {
        name_indices,
        custom_names,
    })
}

impl FontTable for Post {
    const TAG: Tag = POST;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let version = buf.read_u32()?;
        let italic_angle = buf.read_fixed()?;
        let underline_position = buf.read_i16()?;
        let underline_thickness = buf.read_i16()?;
        let is_fixed_pitch = buf.read_u32()? != 0;
        // memory usage hints for PostScript drivers
        buf.skip(16)?;

        let names = match version {
            VERSION_1 => GlyphNames::Standard,
            VERSION_2 => read_indexed_names(&mut buf)?,
            VERSION_3 => GlyphNames::None,
            VERSION_2_5 => bail!(FontError::UnsupportedFormat(Unsupported::PostVersion(version))),
            _ => {
                warn!("unknown post table version 0x{version:08X}, ignoring glyph names");
                GlyphNames::None
            }
        };

        Ok(Self {
            version,
            italic_angle,
            underline_position,
            underline_thickness,
            is_fixed_pitch,
            names,
            by_name: OnceCell::new(),
        })
    }
}
