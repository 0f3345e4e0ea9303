//! Lightweight font identification without decoding outlines

use crate::tables::name::Names;
use crate::tables::os2::Os2;
use crate::typeface::{FsSelection, Os2FontStyle, Os2WidthClass};

/// Names and style of a font, or of every member of a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFontInfo {
    name: String,
    subfamily_name: String,
    names: Names,
    weight_class: u16,
    width_class: u16,
    fs_selection: FsSelection,
    is_web_font: bool,
    stream_offset: usize,
    members: Option<Vec<PreviewFontInfo>>,
}

impl PreviewFontInfo {
    pub(crate) fn new(names: Names, os2: Option<&Os2>, stream_offset: usize, is_web_font: bool) -> Self {
        Self {
            name: names.family_name().to_owned(),
            subfamily_name: names.subfamily_name().to_owned(),
            weight_class: os2.map(|os2| os2.weight_class).unwrap_or(0),
            width_class: os2.map(|os2| os2.width_class).unwrap_or(0),
            fs_selection: os2
                .map(|os2| FsSelection::from_bits_retain(os2.fs_selection))
                .unwrap_or_default(),
            names,
            is_web_font,
            stream_offset,
            members: None,
        }
    }

    /// A collection entry named `TTCF: <count>` followed by each distinct
    /// member family name
    pub(crate) fn collection(members: Vec<PreviewFontInfo>) -> Self {
        let mut name = format!("TTCF: {}", members.len());
        let mut seen: Vec<&str> = Vec::new();
        for member in &members {
            if !seen.contains(&member.name.as_str()) {
                seen.push(&member.name);
                name.push(',');
                name.push_str(&member.name);
            }
        }

        Self {
            name,
            subfamily_name: String::new(),
            names: Names::default(),
            weight_class: 0,
            width_class: 0,
            fs_selection: FsSelection::empty(),
            is_web_font: false,
            stream_offset: 0,
            members: Some(members),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subfamily_name(&self) -> &str {
        &self.subfamily_name
    }

    /// Every retained name record; empty for a collection entry
    pub fn names(&self) -> &Names {
        &self.names
    }

    pub fn postscript_name(&self) -> &str {
        self.names.postscript_name()
    }

    pub fn weight_class(&self) -> u16 {
        self.weight_class
    }

    pub fn width_class(&self) -> Os2WidthClass {
        Os2WidthClass::from_width_class(self.width_class)
    }

    pub fn fs_selection(&self) -> FsSelection {
        self.fs_selection
    }

    pub fn style(&self) -> Os2FontStyle {
        Os2FontStyle::from_fs_selection(self.fs_selection)
    }

    pub fn is_web_font(&self) -> bool {
        self.is_web_font
    }

    /// Offset of this font's table directory in the file
    pub fn stream_offset(&self) -> usize {
        self.stream_offset
    }

    pub fn is_font_collection(&self) -> bool {
        self.members.is_some()
    }

    pub fn members(&self) -> &[PreviewFontInfo] {
        self.members.as_deref().unwrap_or_default()
    }

    pub fn member(&self, index: usize) -> Option<&PreviewFontInfo> {
        self.members().get(index)
    }
}
