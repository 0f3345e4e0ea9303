//! The [name](https://learn.microsoft.com/en-us/typography/opentype/spec/name) table

use font_types::Tag;
use log::warn;

use crate::buffer::Buffer;
use crate::error::FontError;
use crate::table_tags::NAME;
use crate::tables::FontTable;

const PLATFORM_UNICODE: u16 = 0;
const PLATFORM_WINDOWS: u16 = 3;
const LANGUAGE_EN_US: u16 = 0x0409;

/// The name ids this crate keeps; every other record is skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameId {
    FamilyName = 1,
    SubfamilyName = 2,
    UniqueId = 3,
    FullName = 4,
    Version = 5,
    PostScriptName = 6,
    TypographicFamilyName = 16,
    TypographicSubfamilyName = 17,
    PostScriptCidName = 20,
}

impl NameId {
    fn from_id(id: u16) -> Option<Self> {
        Some(match id {
            1 => NameId::FamilyName,
            2 => NameId::SubfamilyName,
            3 => NameId::UniqueId,
            4 => NameId::FullName,
            5 => NameId::Version,
            6 => NameId::PostScriptName,
            16 => NameId::TypographicFamilyName,
            17 => NameId::TypographicSubfamilyName,
            20 => NameId::PostScriptCidName,
            _ => return None,
        })
    }

    fn slot(self) -> usize {
        match self {
            NameId::FamilyName => 0,
            NameId::SubfamilyName => 1,
            NameId::UniqueId => 2,
            NameId::FullName => 3,
            NameId::Version => 4,
            NameId::PostScriptName => 5,
            NameId::TypographicFamilyName => 6,
            NameId::TypographicSubfamilyName => 7,
            NameId::PostScriptCidName => 8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Names {
    strings: [Option<String>; 9],
}

impl Names {
    pub fn get(&self, id: NameId) -> Option<&str> {
        self.strings[id.slot()].as_deref()
    }

    pub fn family_name(&self) -> &str {
        self.get(NameId::FamilyName).unwrap_or_default()
    }

    pub fn subfamily_name(&self) -> &str {
        self.get(NameId::SubfamilyName).unwrap_or_default()
    }

    pub fn unique_id(&self) -> &str {
        self.get(NameId::UniqueId).unwrap_or_default()
    }

    pub fn full_name(&self) -> &str {
        self.get(NameId::FullName).unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.get(NameId::Version).unwrap_or_default()
    }

    pub fn postscript_name(&self) -> &str {
        self.get(NameId::PostScriptName).unwrap_or_default()
    }

    pub fn typographic_family_name(&self) -> Option<&str> {
        self.get(NameId::TypographicFamilyName)
    }

    pub fn typographic_subfamily_name(&self) -> Option<&str> {
        self.get(NameId::TypographicSubfamilyName)
    }

    pub fn postscript_cid_name(&self) -> Option<&str> {
        self.get(NameId::PostScriptCidName)
    }
}

fn decode_string(platform_id: u16, bytes: &[u8]) -> String {
    match platform_id {
        PLATFORM_UNICODE | PLATFORM_WINDOWS => {
            if bytes.len() % 2 != 0 {
                warn!("odd-length UTF-16 name record, dropping final byte");
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

impl FontTable for Names {
    const TAG: Tag = NAME;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let _format = buf.read_u16()?;
        let count = buf.read_u16()?;
        let storage_offset = buf.read_u16()? as usize;

        let mut names = Names::default();
        let mut preferred = [false; 9];
        for _ in 0..count {
            let platform_id = buf.read_u16()?;
            let _encoding_id = buf.read_u16()?;
            let language_id = buf.read_u16()?;
            let name_id = buf.read_u16()?;
            let length = buf.read_u16()? as usize;
            let offset = buf.read_u16()? as usize;

            let Some(id) = NameId::from_id(name_id) else {
                continue;
            };
            let start = storage_offset + offset;
            let Some(bytes) = data.get(start..start + length) else {
                warn!("name record {name_id} points past the end of the table");
                continue;
            };

            // first record wins unless a Windows English one turns up later
            let is_preferred = platform_id == PLATFORM_WINDOWS && language_id == LANGUAGE_EN_US;
            let slot = id.slot();
            if names.strings[slot].is_none() || (is_preferred && !preferred[slot]) {
                names.strings[slot] = Some(decode_string(platform_id, bytes));
                preferred[slot] = is_preferred;
            }
        }
        Ok(names)
    }
}
