//! The [cmap](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap) table
//!
//! Every subtable is decoded up front into one of the [`CharacterMap`]
//! variants. Lookups walk all subtables in directory order; the Windows
//! Unicode BMP subtable (3, 1) overrides any earlier hit.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use font_types::Tag;
use log::{debug, warn};

use crate::buffer::Buffer;
use crate::error::{FontError, bail_if};
use crate::table_tags::CMAP;
use crate::tables::FontTable;

const PLATFORM_WINDOWS: u16 = 3;
const ENCODING_UNICODE_BMP: u16 = 1;
const MAX_CODEPOINT: u32 = 0x10FFFF;

/// Segmented mapping to delta values. Format 0 tables are converted into this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMap {
    start_codes: Vec<u16>,
    end_codes: Vec<u16>,
    id_deltas: Vec<u16>,
    id_range_offsets: Vec<u16>,
    glyph_ids: Vec<u16>,
}

impl SegmentMap {
    fn glyph_index(&self, codepoint: u32) -> u16 {
        let Ok(codepoint) = u16::try_from(codepoint) else {
            return 0;
        };
        // first segment whose end code is >= codepoint
        let i = self.end_codes.partition_point(|&end| end < codepoint);
        if i >= self.end_codes.len() || self.start_codes[i] > codepoint {
            return 0;
        }

        let delta = self.id_deltas[i];
        let range_offset = self.id_range_offsets[i];
        if range_offset == 0 {
            return codepoint.wrapping_add(delta);
        }
        // idRangeOffset is relative to its own slot in the idRangeOffset array,
        // which immediately precedes glyphIdArray
        let index = (range_offset / 2) as usize + (codepoint - self.start_codes[i]) as usize;
        let Some(index) = index.checked_sub(self.id_range_offsets.len() - i) else {
            return 0;
        };
        match self.glyph_ids.get(index) {
            Some(&0) | None => 0,
            Some(&glyph) => glyph.wrapping_add(delta),
        }
    }

    fn collect_unicodes(&self, out: &mut BTreeSet<u32>) {
        for (&start, &end) in self.start_codes.iter().zip(&self.end_codes) {
            for codepoint in start as u32..=end as u32 {
                if self.glyph_index(codepoint) != 0 {
                    out.insert(codepoint);
                }
            }
        }
    }
}

/// Trimmed table mapping: one contiguous range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmedArray {
    first_code: u16,
    glyph_ids: Vec<u16>,
}

impl TrimmedArray {
    fn glyph_index(&self, codepoint: u32) -> u16 {
        codepoint
            .checked_sub(self.first_code as u32)
            .and_then(|i| self.glyph_ids.get(i as usize))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SequentialGroup {
    start_char_code: u32,
    end_char_code: u32,
    start_glyph_id: u32,
}

/// Segmented coverage over the full Unicode range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedCoverage {
    groups: Vec<SequentialGroup>,
}

impl SegmentedCoverage {
    fn glyph_index(&self, codepoint: u32) -> u16 {
        // last group whose start is <= codepoint
        let i = self
            .groups
            .partition_point(|group| group.start_char_code <= codepoint);
        let Some(group) = i.checked_sub(1).map(|i| self.groups[i]) else {
            return 0;
        };
        if codepoint > group.end_char_code {
            return 0;
        }
        group.glyph_index(codepoint)
    }
}

impl SequentialGroup {
    fn glyph_index(&self, codepoint: u32) -> u16 {
        self.start_glyph_id
            .wrapping_add(codepoint - self.start_char_code) as u16
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct VariationSelector {
    /// Inclusive (start, end) ranges whose default glyph is the preferred one
    default_ranges: Vec<(u32, u32)>,
    non_default: HashMap<u32, u16>,
}

/// Unicode variation sequences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationSequences {
    selectors: HashMap<u32, VariationSelector>,
}

impl VariationSequences {
    /// Glyph for `codepoint` followed by `selector`, or 0 if `selector` is
    /// not a selector this table knows.
    fn pair_glyph_index(&self, codepoint: u32, default_glyph: u16, selector: u32) -> u16 {
        let Some(sel) = self.selectors.get(&selector) else {
            return 0;
        };
        if let Some(&glyph) = sel.non_default.get(&codepoint) {
            return glyph;
        }
        // a default-UVS hit and an unmatched selector both render the base glyph
        default_glyph
    }

    pub fn is_default_sequence(&self, codepoint: u32, selector: u32) -> bool {
        self.selectors.get(&selector).is_some_and(|sel| {
            sel.default_ranges
                .iter()
                .any(|&(start, end)| (start..=end).contains(&codepoint))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterMap {
    SegmentMap(SegmentMap),
    TrimmedArray(TrimmedArray),
    SegmentedCoverage(SegmentedCoverage),
    VariationSequences(VariationSequences),
    /// Formats this crate does not decode; every lookup misses
    Null { format: u16 },
}

impl CharacterMap {
    pub fn glyph_index(&self, codepoint: u32) -> u16 {
        match self {
            CharacterMap::SegmentMap(map) => map.glyph_index(codepoint),
            CharacterMap::TrimmedArray(map) => map.glyph_index(codepoint),
            CharacterMap::SegmentedCoverage(map) => map.glyph_index(codepoint),
            CharacterMap::VariationSequences(_) | CharacterMap::Null { .. } => 0,
        }
    }

    fn collect_unicodes(&self, out: &mut BTreeSet<u32>) {
        match self {
            CharacterMap::SegmentMap(map) => map.collect_unicodes(out),
            CharacterMap::TrimmedArray(map) => {
                for (i, &glyph) in map.glyph_ids.iter().enumerate() {
                    if glyph != 0 {
                        out.insert(map.first_code as u32 + i as u32);
                    }
                }
            }
            CharacterMap::SegmentedCoverage(map) => {
                for group in &map.groups {
                    let end = group.end_char_code.min(MAX_CODEPOINT);
                    out.extend(
                        (group.start_char_code..=end)
                            .filter(|&codepoint| group.glyph_index(codepoint) != 0),
                    );
                }
            }
            CharacterMap::VariationSequences(_) | CharacterMap::Null { .. } => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapSubtable {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub map: CharacterMap,
}

impl CmapSubtable {
    fn is_windows_unicode_bmp(&self) -> bool {
        self.platform_id == PLATFORM_WINDOWS && self.encoding_id == ENCODING_UNICODE_BMP
    }
}

#[derive(Debug, Clone)]
pub struct Cmap {
    subtables: Vec<CmapSubtable>,
    cache: RefCell<HashMap<u32, u16>>,
}

impl Cmap {
    pub fn subtables(&self) -> &[CmapSubtable] {
        &self.subtables
    }

    /// Resolve `codepoint`, optionally followed by `next_codepoint`.
    ///
    /// Returns the glyph index and whether `next_codepoint` was consumed as a
    /// variation selector.
    pub fn glyph_index(&self, codepoint: u32, next_codepoint: Option<u32>) -> (u16, bool) {
        let found = self.base_glyph_index(codepoint);
        if let Some(next) = next_codepoint {
            for subtable in &self.subtables {
                if let CharacterMap::VariationSequences(sequences) = &subtable.map {
                    let glyph = sequences.pair_glyph_index(codepoint, found, next);
                    if glyph != 0 {
                        return (glyph, true);
                    }
                }
            }
        }
        (found, false)
    }

    fn base_glyph_index(&self, codepoint: u32) -> u16 {
        if let Some(&glyph) = self.cache.borrow().get(&codepoint) {
            return glyph;
        }
        let mut found = 0;
        for subtable in &self.subtables {
            if found == 0 {
                found = subtable.map.glyph_index(codepoint);
            } else if subtable.is_windows_unicode_bmp() {
                let glyph = subtable.map.glyph_index(codepoint);
                if glyph != 0 {
                    found = glyph;
                }
            }
        }
        self.cache.borrow_mut().insert(codepoint, found);
        found
    }

    /// Every codepoint some subtable maps to a non-zero glyph, ascending
    pub fn collect_unicodes(&self) -> Vec<u32> {
        let mut out = BTreeSet::new();
        for subtable in &self.subtables {
            subtable.map.collect_unicodes(&mut out);
        }
        out.into_iter().collect()
    }
}

impl PartialEq for Cmap {
    fn eq(&self, other: &Self) -> bool {
        self.subtables == other.subtables
    }
}

fn read_format_0(buf: &mut Buffer) -> Result<CharacterMap, FontError> {
    let _length = buf.read_u16()?;
    let _language = buf.read_u16()?;
    let glyph_ids = buf.read_bytes(256)?.iter().map(|&b| b as u16).collect();
    // one segment covering 0..=255 through the glyph array, plus the sentinel
    Ok(CharacterMap::SegmentMap(SegmentMap {
        start_codes: vec![0, 0xFFFF],
        end_codes: vec![255, 0xFFFF],
        id_deltas: vec![0, 1],
        id_range_offsets: vec![4, 0],
        glyph_ids,
    }))
}

fn read_format_4(buf: &mut Buffer, subtable_start: usize) -> Result<CharacterMap, FontError> {
    let length = buf.read_u16()? as usize;
    let _language = buf.read_u16()?;
    let seg_count_x2 = buf.read_u16()?;
    bail_if!(seg_count_x2 % 2 != 0, "odd cmap format 4 segCountX2");
    // searchRange, entrySelector, rangeShift
    buf.skip(6)?;
    let seg_count = (seg_count_x2 / 2) as usize;
    let end_codes = buf.read_u16_array(seg_count)?;
    let _reserved_pad = buf.read_u16()?;
    let start_codes = buf.read_u16_array(seg_count)?;
    let id_deltas = buf.read_u16_array(seg_count)?;
    let id_range_offsets = buf.read_u16_array(seg_count)?;

    // some fonts declare a length past the end of the table
    let end = (subtable_start + length).min(buf.len());
    let glyph_count = end.saturating_sub(buf.offset()) / 2;
    let glyph_ids = buf.read_u16_array(glyph_count)?;
    Ok(CharacterMap::SegmentMap(SegmentMap {
        start_codes,
        end_codes,
        id_deltas,
        id_range_offsets,
        glyph_ids,
    }))
}

fn read_format_6(buf: &mut Buffer) -> Result<CharacterMap, FontError> {
    let _length = buf.read_u16()?;
    let _language = buf.read_u16()?;
    let first_code = buf.read_u16()?;
    let entry_count = buf.read_u16()? as usize;
    Ok(CharacterMap::TrimmedArray(TrimmedArray {
        first_code,
        glyph_ids: buf.read_u16_array(entry_count)?,
    }))
}

fn read_format_12(buf: &mut Buffer) -> Result<CharacterMap, FontError> {
    let _reserved = buf.read_u16()?;
    let _length = buf.read_u32()?;
    let _language = buf.read_u32()?;
    let num_groups = buf.read_u32()? as usize;
    bail_if!(
        num_groups > buf.remaining_as_slice().len() / 12,
        "cmap format 12 group count exceeds table"
    );
    let mut groups = Vec::with_capacity(num_groups);
    for _ in 0..num_groups {
        let group = SequentialGroup {
            start_char_code: buf.read_u32()?,
            end_char_code: buf.read_u32()?,
            start_glyph_id: buf.read_u32()?,
        };
        bail_if!(
            group.end_char_code < group.start_char_code,
            "cmap format 12 group ends before it starts"
        );
        groups.push(group);
    }
    Ok(CharacterMap::SegmentedCoverage(SegmentedCoverage { groups }))
}

fn read_format_14(buf: &mut Buffer, subtable_start: usize) -> Result<CharacterMap, FontError> {
    let _length = buf.read_u32()?;
    let num_records = buf.read_u32()? as usize;
    bail_if!(
        num_records > buf.remaining_as_slice().len() / 11,
        "cmap format 14 record count exceeds table"
    );
    let mut records = Vec::with_capacity(num_records);
    for _ in 0..num_records {
        records.push((buf.read_u24()?, buf.read_u32()?, buf.read_u32()?));
    }

    let mut selectors = HashMap::with_capacity(num_records);
    for (var_selector, default_offset, non_default_offset) in records {
        let mut selector = VariationSelector::default();
        if default_offset != 0 {
            buf.seek(subtable_start + default_offset as usize)?;
            let num_ranges = buf.read_u32()?;
            for _ in 0..num_ranges {
                let start = buf.read_u24()?;
                let additional = buf.read_u8()? as u32;
                selector.default_ranges.push((start, start + additional));
            }
        }
        if non_default_offset != 0 {
            buf.seek(subtable_start + non_default_offset as usize)?;
            let num_mappings = buf.read_u32()?;
            for _ in 0..num_mappings {
                let unicode = buf.read_u24()?;
                selector.non_default.insert(unicode, buf.read_u16()?);
            }
        }
        selectors.insert(var_selector, selector);
    }
    Ok(CharacterMap::VariationSequences(VariationSequences {
        selectors,
    }))
}

fn read_character_map(data: &[u8], offset: usize) -> Result<CharacterMap, FontError> {
    let mut buf = Buffer::new(data);
    buf.seek(offset)?;
    let format = buf.read_u16()?;
    let map = match format {
        0 => read_format_0(&mut buf)?,
        4 => read_format_4(&mut buf, offset)?,
        6 => read_format_6(&mut buf)?,
        12 => read_format_12(&mut buf)?,
        14 => read_format_14(&mut buf, offset)?,
        _ => {
            warn!("cmap subtable format {format} is not supported, using an empty map");
            CharacterMap::Null { format }
        }
    };
    Ok(map)
}

impl FontTable for Cmap {
    const TAG: Tag = CMAP;

    fn read(data: &[u8]) -> Result<Self, FontError> {
        let mut buf = Buffer::new(data);
        let _version = buf.read_u16()?;
        let num_tables = buf.read_u16()?;

        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            records.push((buf.read_u16()?, buf.read_u16()?, buf.read_u32()?));
        }

        let mut subtables = Vec::with_capacity(records.len());
        for (platform_id, encoding_id, offset) in records {
            let map = read_character_map(data, offset as usize)?;
            debug!("cmap subtable ({platform_id}, {encoding_id}): {map:?}", map = CmapFormat(&map));
            subtables.push(CmapSubtable {
                platform_id,
                encoding_id,
                map,
            });
        }
        Ok(Self {
            subtables,
            cache: RefCell::new(HashMap::new()),
        })
    }
}

/// Short debug form of a subtable, naming only its format
struct CmapFormat<'a>(&'a CharacterMap);

impl std::fmt::Debug for CmapFormat<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let format = match self.0 {
            CharacterMap::SegmentMap(_) => 4,
            CharacterMap::TrimmedArray(_) => 6,
            CharacterMap::SegmentedCoverage(_) => 12,
            CharacterMap::VariationSequences(_) => 14,
            CharacterMap::Null { format } => *format,
        };
        write!(f, "format {format}")
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;
    use crate::test_fonts::{Segment, cmap_format4, cmap_table};

    fn format_12(groups: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.put_u16(12);
        data.put_u16(0);
        data.put_u32(16 + 12 * groups.len() as u32);
        data.put_u32(0);
        data.put_u32(groups.len() as u32);
        for &(start, end, glyph) in groups {
            data.put_u32(start);
            data.put_u32(end);
            data.put_u32(glyph);
        }
        data
    }

    fn format_6(first_code: u16, glyph_ids: &[u16]) -> Vec<u8> {
        let mut data = Vec::new();
        data.put_u16(6);
        data.put_u16(10 + 2 * glyph_ids.len() as u16);
        data.put_u16(0);
        data.put_u16(first_code);
        data.put_u16(glyph_ids.len() as u16);
        for &glyph in glyph_ids {
            data.put_u16(glyph);
        }
        data
    }

    fn format_0(glyph_ids: &[u8; 256]) -> Vec<u8> {
        let mut data = Vec::new();
        data.put_u16(0);
        data.put_u16(262);
        data.put_u16(0);
        data.put_slice(glyph_ids);
        data
    }

    /// One selector with a default range and a single non-default mapping
    fn format_14(selector: u32, default_range: (u32, u8), mapping: (u32, u16)) -> Vec<u8> {
        let mut data = Vec::new();
        data.put_u16(14);
        data.put_u32(10 + 11 + 8 + 9);
        data.put_u32(1);
        data.put_uint(selector as u64, 3);
        data.put_u32(21);
        data.put_u32(29);
        // default UVS
        data.put_u32(1);
        data.put_uint(default_range.0 as u64, 3);
        data.put_u8(default_range.1);
        // non-default UVS
        data.put_u32(1);
        data.put_uint(mapping.0 as u64, 3);
        data.put_u16(mapping.1);
        data
    }

    fn alphabet_identity() -> Vec<u8> {
        cmap_format4(&[Segment::delta(0x41, 0x5A, 0)], &[])
    }

    #[test]
    fn format_4_binary_search() {
        let cmap = Cmap::read(&cmap_table(&[(3, 1, alphabet_identity())])).unwrap();
        assert_eq!(cmap.glyph_index(0x42, None), (0x42, false));
        assert_eq!(cmap.glyph_index(0x41, None).0, 0x41);
        assert_eq!(cmap.glyph_index(0x5A, None).0, 0x5A);
        assert_eq!(cmap.glyph_index(0x5B, None).0, 0);
        assert_eq!(cmap.glyph_index(0x40, None).0, 0);
        assert_eq!(cmap.glyph_index(0x1F600, None).0, 0);
    }

    #[test]
    fn format_4_delta_wraps() {
        let subtable = cmap_format4(&[Segment::delta(0x20, 0x22, 0xFFE1)], &[]);
        let cmap = Cmap::read(&cmap_table(&[(3, 1, subtable)])).unwrap();
        assert_eq!(cmap.glyph_index(0x20, None).0, 1);
        assert_eq!(cmap.glyph_index(0x22, None).0, 3);
    }

    #[test]
    fn format_4_range_offset() {
        // segment 0 reads from glyph array slot 0
        let subtable = cmap_format4(&[Segment::indexed(0x61, 0x63)], &[7, 0, 9]);
        let cmap = Cmap::read(&cmap_table(&[(3, 1, subtable)])).unwrap();
        assert_eq!(cmap.glyph_index(0x61, None).0, 7);
        assert_eq!(cmap.glyph_index(0x62, None).0, 0);
        assert_eq!(cmap.glyph_index(0x63, None).0, 9);
        assert_eq!(cmap.collect_unicodes(), vec![0x61, 0x63]);
    }

    #[test]
    fn windows_bmp_overrides_earlier_hit() {
        let mac = format_6(0x41, &[5, 6]);
        let windows = cmap_format4(&[Segment::delta(0x41, 0x41, 9)], &[]);
        let cmap = Cmap::read(&cmap_table(&[(1, 0, mac.clone()), (3, 1, windows.clone())])).unwrap();
        assert_eq!(cmap.glyph_index(0x41, None).0, 0x41 + 9);
        // no windows hit keeps the earlier result
        assert_eq!(cmap.glyph_index(0x42, None).0, 6);

        // order does not matter for the override
        let cmap = Cmap::read(&cmap_table(&[(3, 1, windows), (1, 0, mac)])).unwrap();
        assert_eq!(cmap.glyph_index(0x41, None).0, 0x41 + 9);
    }

    #[test]
    fn format_12_groups() {
        let subtable = format_12(&[(0x20, 0x20, 3), (0x1F600, 0x1F602, 100)]);
        let cmap = Cmap::read(&cmap_table(&[(3, 10, subtable)])).unwrap();
        assert_eq!(cmap.glyph_index(0x20, None).0, 3);
        assert_eq!(cmap.glyph_index(0x1F601, None).0, 101);
        assert_eq!(cmap.glyph_index(0x1F603, None).0, 0);
        assert_eq!(cmap.glyph_index(0x10, None).0, 0);
        assert_eq!(cmap.collect_unicodes(), vec![0x20, 0x1F600, 0x1F601, 0x1F602]);
    }

    #[test]
    fn format_12_unicodes_skip_notdef_and_stop_at_unicode_max() {
        let subtable = format_12(&[(0x30, 0x32, 0), (0x10FFFE, 0xFFFF_FFFF, 5)]);
        let cmap = Cmap::read(&cmap_table(&[(3, 10, subtable)])).unwrap();
        assert_eq!(cmap.glyph_index(0x30, None).0, 0);
        assert_eq!(
            cmap.collect_unicodes(),
            vec![0x31, 0x32, 0x10FFFE, 0x10FFFF]
        );
    }

    #[test]
    fn format_0_is_read_as_segment_map() {
        let mut glyph_ids = [0u8; 256];
        glyph_ids[0x41] = 12;
        glyph_ids[0xFF] = 200;
        let cmap = Cmap::read(&cmap_table(&[(1, 0, format_0(&glyph_ids))])).unwrap();
        assert_eq!(cmap.glyph_index(0x41, None).0, 12);
        assert_eq!(cmap.glyph_index(0xFF, None).0, 200);
        assert_eq!(cmap.glyph_index(0x42, None).0, 0);
        assert_eq!(cmap.glyph_index(0x100, None).0, 0);
    }

    #[test]
    fn unsupported_format_degrades_to_null_map() {
        let mut format_2 = vec![0u8; 8];
        format_2[1] = 2;
        let cmap = Cmap::read(&cmap_table(&[(1, 1, format_2), (3, 1, alphabet_identity())])).unwrap();
        assert_eq!(cmap.subtables()[0].map, CharacterMap::Null { format: 2 });
        assert_eq!(cmap.glyph_index(0x43, None).0, 0x43);
    }

    #[test]
    fn variation_sequences() {
        let cmap = Cmap::read(&cmap_table(&[
            (3, 1, alphabet_identity()),
            (0, 5, format_14(0xFE00, (0x41, 2), (0x44, 77))),
        ]))
        .unwrap();
        // non-default glyph consumes the selector
        assert_eq!(cmap.glyph_index(0x44, Some(0xFE00)), (77, true));
        // default range and unmatched base both fall back to the base glyph
        assert_eq!(cmap.glyph_index(0x42, Some(0xFE00)), (0x42, true));
        assert_eq!(cmap.glyph_index(0x50, Some(0xFE00)), (0x50, true));
        // not a selector
        assert_eq!(cmap.glyph_index(0x44, Some(0x45)), (0x44, false));

        let CharacterMap::VariationSequences(sequences) = &cmap.subtables()[1].map else {
            panic!("expected format 14");
        };
        assert!(sequences.is_default_sequence(0x43, 0xFE00));
        assert!(!sequences.is_default_sequence(0x44, 0xFE00));
    }

    #[test]
    fn truncated_subtable_is_malformed() {
        let mut table = cmap_table(&[(3, 1, alphabet_identity())]);
        table.truncate(20);
        assert!(Cmap::read(&table).is_err());
    }
}
