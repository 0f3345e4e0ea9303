//! The assembled font and the metrics derived from its tables

use bitflags::bitflags;
use log::warn;

use crate::directory::TableHeader;
use crate::glyph::{Bounds, Glyph};
use crate::tables::cmap::Cmap;
use crate::tables::gasp::Gasp;
use crate::tables::head::Head;
use crate::tables::hhea::HorizontalHeader;
use crate::tables::hmtx::HorizontalMetrics;
use crate::tables::maxp::MaxProfile;
use crate::tables::name::Names;
use crate::tables::os2::Os2;
use crate::tables::post::Post;
use crate::trim::TrimMode;

/// Resolution assumed by callers that have no better value
pub const DEFAULT_DPI: u32 = 96;

const POINTS_PER_INCH: f32 = 72.0;

bitflags! {
    /// The OS/2 `fsSelection` field
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct FsSelection: u16 {
        const ITALIC = 1 << 0;
        const UNDERSCORE = 1 << 1;
        const NEGATIVE = 1 << 2;
        const OUTLINED = 1 << 3;
        const STRIKEOUT = 1 << 4;
        const BOLD = 1 << 5;
        const REGULAR = 1 << 6;
        const USE_TYPO_METRICS = 1 << 7;
        const WWS = 1 << 8;
        const OBLIQUE = 1 << 9;
    }
}

bitflags! {
    /// Style summary translated from `fsSelection`
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Os2FontStyle: u16 {
        const ITALIC = 1 << 0;
        const BOLD = 1 << 1;
        const REGULAR = 1 << 2;
        const OBLIQUE = 1 << 3;
    }
}

impl Os2FontStyle {
    pub fn from_fs_selection(fs_selection: FsSelection) -> Self {
        let mut style = Os2FontStyle::empty();
        style.set(Os2FontStyle::ITALIC, fs_selection.contains(FsSelection::ITALIC));
        style.set(Os2FontStyle::BOLD, fs_selection.contains(FsSelection::BOLD));
        style.set(Os2FontStyle::REGULAR, fs_selection.contains(FsSelection::REGULAR));
        style.set(Os2FontStyle::OBLIQUE, fs_selection.contains(FsSelection::OBLIQUE));
        style
    }
}

/// `usWidthClass`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Os2WidthClass {
    #[default]
    Unknown,
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl Os2WidthClass {
    pub fn from_width_class(value: u16) -> Self {
        match value {
            1 => Os2WidthClass::UltraCondensed,
            2 => Os2WidthClass::ExtraCondensed,
            3 => Os2WidthClass::Condensed,
            4 => Os2WidthClass::SemiCondensed,
            5 => Os2WidthClass::Normal,
            6 => Os2WidthClass::SemiExpanded,
            7 => Os2WidthClass::Expanded,
            8 => Os2WidthClass::ExtraExpanded,
            9 => Os2WidthClass::UltraExpanded,
            _ => Os2WidthClass::Unknown,
        }
    }
}

/// Conventions for the distance between two baselines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpacingChoice {
    /// `ascender - descender + line_gap`
    TypoMetric,
    /// usWin metrics plus whatever hhea line gap they do not already cover
    Windows,
    /// hhea `ascent - descent + lineGap`
    Mac,
}

/// Where glyph shapes come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineFormat {
    TrueType,
    Cff,
    Bitmap,
}

/// TrueType hinting data, stored verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintPrograms {
    pub control_values: Option<Vec<i16>>,
    pub font_program: Option<Vec<u8>>,
    pub prep_program: Option<Vec<u8>>,
}

impl HintPrograms {
    pub fn is_empty(&self) -> bool {
        self.control_values.is_none() && self.font_program.is_none() && self.prep_program.is_none()
    }
}

/// Optional tables detected but not decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TablePresence {
    pub svg: bool,
    pub colr: bool,
    pub cpal: bool,
    pub bitmap: bool,
}

/// A decoded font
///
/// Glyph index 0 is `.notdef`; lookups that fall outside the glyph array
/// resolve to it instead of failing.
#[derive(Debug, Clone)]
pub struct Typeface {
    pub(crate) names: Names,
    pub(crate) os2: Option<Os2>,
    pub(crate) head: Head,
    pub(crate) maxp: MaxProfile,
    pub(crate) hhea: HorizontalHeader,
    pub(crate) hmtx: HorizontalMetrics,
    pub(crate) cmap: Cmap,
    pub(crate) post: Option<Post>,
    pub(crate) glyphs: Vec<Glyph>,
    pub(crate) outline_format: OutlineFormat,
    pub(crate) hints: HintPrograms,
    pub(crate) gasp: Option<Gasp>,
    pub(crate) presence: TablePresence,
    /// Directory snapshot taken when the font was read, checked on restore
    pub(crate) table_headers: Vec<TableHeader>,
    /// Offset of the table directory, non-zero for collection members
    pub(crate) stream_offset: usize,
    pub(crate) trim_mode: TrimMode,
}

impl Typeface {
    pub fn names(&self) -> &Names {
        &self.names
    }

    pub fn family_name(&self) -> &str {
        self.names.family_name()
    }

    pub fn subfamily_name(&self) -> &str {
        self.names.subfamily_name()
    }

    pub fn postscript_name(&self) -> &str {
        self.names.postscript_name()
    }

    pub fn os2(&self) -> Option<&Os2> {
        self.os2.as_ref()
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn maxp(&self) -> &MaxProfile {
        &self.maxp
    }

    pub fn hhea(&self) -> &HorizontalHeader {
        &self.hhea
    }

    pub fn cmap(&self) -> &Cmap {
        &self.cmap
    }

    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    pub fn gasp(&self) -> Option<&Gasp> {
        self.gasp.as_ref()
    }

    pub fn hints(&self) -> &HintPrograms {
        &self.hints
    }

    /// The table records this font was decoded from
    pub fn table_headers(&self) -> &[TableHeader] {
        &self.table_headers
    }

    pub fn stream_offset(&self) -> usize {
        self.stream_offset
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    /// Bounding box of every glyph, from the head table
    pub fn bounds(&self) -> Bounds {
        self.head.bounds
    }

    pub fn fs_selection(&self) -> FsSelection {
        self.os2
            .as_ref()
            .map(|os2| FsSelection::from_bits_retain(os2.fs_selection))
            .unwrap_or_default()
    }

    pub fn style(&self) -> Os2FontStyle {
        Os2FontStyle::from_fs_selection(self.fs_selection())
    }

    pub fn weight_class(&self) -> u16 {
        self.os2.as_ref().map(|os2| os2.weight_class).unwrap_or(0)
    }

    pub fn width_class(&self) -> Os2WidthClass {
        self.os2
            .as_ref()
            .map(|os2| Os2WidthClass::from_width_class(os2.width_class))
            .unwrap_or_default()
    }

    fn typo_metrics(&self) -> Option<&Os2> {
        self.os2
            .as_ref()
            .filter(|os2| FsSelection::from_bits_retain(os2.fs_selection).contains(FsSelection::USE_TYPO_METRICS))
    }

    /// OS/2 typo ascender when `USE_TYPO_METRICS` is set, hhea ascent otherwise
    pub fn ascender(&self) -> i16 {
        match self.typo_metrics() {
            Some(os2) => os2.typo_ascender,
            None => self.hhea.ascent,
        }
    }

    pub fn descender(&self) -> i16 {
        match self.typo_metrics() {
            Some(os2) => os2.typo_descender,
            None => self.hhea.descent,
        }
    }

    pub fn line_gap(&self) -> i16 {
        match self.typo_metrics() {
            Some(os2) => os2.typo_line_gap,
            None => self.hhea.line_gap,
        }
    }

    /// `usWinAscent`, falling back to the hhea ascent without OS/2
    pub fn clipped_ascender(&self) -> u16 {
        match &self.os2 {
            Some(os2) => os2.win_ascent,
            None => self.hhea.ascent.max(0) as u16,
        }
    }

    /// `usWinDescent`, a positive distance below the baseline
    pub fn clipped_descender(&self) -> u16 {
        match &self.os2 {
            Some(os2) => os2.win_descent,
            None => self.hhea.descent.unsigned_abs(),
        }
    }

    pub fn line_spacing(&self, choice: LineSpacingChoice) -> i32 {
        match choice {
            LineSpacingChoice::TypoMetric => {
                self.ascender() as i32 - self.descender() as i32 + self.line_gap() as i32
            }
            LineSpacingChoice::Windows => {
                let win_height = self.clipped_ascender() as i32 + self.clipped_descender() as i32;
                let hhea_height = self.hhea.ascent as i32 - self.hhea.descent as i32;
                let external_leading = (self.hhea.line_gap as i32 - (win_height - hhea_height)).max(0);
                win_height + external_leading
            }
            LineSpacingChoice::Mac => {
                self.hhea.ascent as i32 - self.hhea.descent as i32 + self.hhea.line_gap as i32
            }
        }
    }

    /// Height that clips nothing: `usWinAscent + usWinDescent`
    pub fn recommended_line_spacing(&self) -> i32 {
        self.clipped_ascender() as i32 + self.clipped_descender() as i32
    }

    pub fn underline_position(&self) -> i16 {
        self.post.as_ref().map(|post| post.underline_position).unwrap_or(0)
    }

    /// Scale factor from design units to `pixel_size`
    pub fn scale_to_pixel(&self, pixel_size: f32) -> f32 {
        pixel_size / self.units_per_em() as f32
    }

    pub fn scale_to_pixel_from_point_size(&self, point_size: f32, dpi: u32) -> f32 {
        points_to_pixels(point_size, dpi) / self.units_per_em() as f32
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// The glyph at `index`, or `.notdef` when the index is out of range
    pub fn glyph(&self, index: u16) -> &Glyph {
        match self.glyphs.get(index as usize) {
            Some(glyph) => glyph,
            None => {
                warn!(
                    "glyph index {index} out of range ({} glyphs), using .notdef",
                    self.glyphs.len()
                );
                &self.glyphs[0]
            }
        }
    }

    /// Glyph index for a codepoint, 0 when unmapped
    pub fn glyph_index(&self, codepoint: u32) -> u16 {
        self.glyph_index_with_next(codepoint, None).0
    }

    /// Glyph index for `codepoint` and whether `next_codepoint` was a
    /// variation selector consumed by the lookup
    pub fn glyph_index_with_next(&self, codepoint: u32, next_codepoint: Option<u32>) -> (u16, bool) {
        let (index, skip_next) = self.cmap.glyph_index(codepoint, next_codepoint);
        if index as usize >= self.glyphs.len() {
            warn!("cmap maps U+{codepoint:04X} to missing glyph {index}, using .notdef");
            return (0, skip_next);
        }
        (index, skip_next)
    }

    pub fn glyph_for_codepoint(&self, codepoint: u32) -> &Glyph {
        self.glyph(self.glyph_index(codepoint))
    }

    pub fn glyph_index_by_name(&self, name: &str) -> Option<u16> {
        self.post
            .as_ref()
            .and_then(|post| post.glyph_index_by_name(name))
            .filter(|index| (*index as usize) < self.glyphs.len())
    }

    pub fn glyph_by_name(&self, name: &str) -> Option<&Glyph> {
        self.glyph_index_by_name(name).map(|index| self.glyph(index))
    }

    pub fn glyph_name(&self, index: u16) -> Option<&str> {
        self.post.as_ref().and_then(|post| post.glyph_name(index))
    }

    /// Every codepoint the character map covers
    pub fn collect_unicodes(&self) -> Vec<u32> {
        self.cmap.collect_unicodes()
    }

    pub fn advance_width(&self, index: u16) -> u16 {
        self.hmtx.advance_width(index)
    }

    pub fn left_side_bearing(&self, index: u16) -> i16 {
        self.hmtx.left_side_bearing(index)
    }

    /// Advance of U+0020, or 0 when the font has no space glyph
    pub fn whitespace_width(&self) -> u16 {
        match self.glyph_index(' ' as u32) {
            0 => 0,
            index => self.advance_width(index),
        }
    }

    pub fn outline_format(&self) -> OutlineFormat {
        self.outline_format
    }

    pub fn is_cff(&self) -> bool {
        self.outline_format == OutlineFormat::Cff
    }

    pub fn is_bitmap(&self) -> bool {
        self.outline_format == OutlineFormat::Bitmap
    }

    pub fn has_svg(&self) -> bool {
        self.presence.svg
    }

    /// COLR and CPAL are both present
    pub fn has_color(&self) -> bool {
        self.presence.colr && self.presence.cpal
    }
}

/// Convert a size in points to pixels at `dpi`
pub fn points_to_pixels(point_size: f32, dpi: u32) -> f32 {
    point_size * dpi as f32 / POINTS_PER_INCH
}
