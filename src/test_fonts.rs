//! Synthetic font data for unit tests
//!
//! Every builder writes big-endian table bytes by hand so tests do not depend
//! on font files on disk.

use bytes::BufMut;
use font_types::Tag;

use crate::sfnt::SfntBuilder;
use crate::table_tags::*;
use crate::tables::head::MAGIC_NUMBER;
use crate::woff2::glyf_decoder::{Point, write_glyph_points};

pub(crate) const TRUETYPE_FLAVOR: Tag = Tag::from_u32(0x0001_0000);

pub(crate) fn head_bytes(units_per_em: u16, index_to_loc_format: i16) -> Vec<u8> {
    let mut data = Vec::with_capacity(54);
    data.put_u32(0x0001_0000);
    // fontRevision 2.5
    data.put_u32(0x0002_8000);
    data.put_u32(0);
    data.put_u32(MAGIC_NUMBER);
    data.put_u16(0x000B);
    data.put_u16(units_per_em);
    data.put_u64(3_600_000_000);
    data.put_u64(3_700_000_000);
    data.put_i16(-50);
    data.put_i16(-200);
    data.put_i16(1050);
    data.put_i16(900);
    data.put_u16(0);
    data.put_u16(8);
    data.put_i16(2);
    data.put_i16(index_to_loc_format);
    data.put_i16(0);
    data
}

pub(crate) fn maxp_bytes(num_glyphs: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(32);
    data.put_u32(0x0001_0000);
    data.put_u16(num_glyphs);
    for value in [20, 2, 8, 2, 2, 0, 0, 1, 0, 64, 16, 2, 1] {
        data.put_u16(value);
    }
    data
}

pub(crate) fn hhea_bytes(ascent: i16, descent: i16, line_gap: i16, number_of_h_metrics: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(36);
    data.put_u32(0x0001_0000);
    data.put_i16(ascent);
    data.put_i16(descent);
    data.put_i16(line_gap);
    // advanceWidthMax, minLSB, minRSB, maxXExtent
    data.put_u16(600);
    data.put_i16(0);
    data.put_i16(0);
    data.put_i16(1250);
    // caret slope rise/run, caret offset
    data.put_i16(1);
    data.put_i16(0);
    data.put_i16(0);
    data.put_bytes(0, 8);
    data.put_i16(0);
    data.put_u16(number_of_h_metrics);
    data
}

pub(crate) fn hmtx_bytes(metrics: &[(u16, i16)], left_side_bearings: &[i16]) -> Vec<u8> {
    let mut data = Vec::new();
    for &(advance, lsb) in metrics {
        data.put_u16(advance);
        data.put_i16(lsb);
    }
    for &lsb in left_side_bearings {
        data.put_i16(lsb);
    }
    data
}

#[derive(Debug, Clone)]
pub(crate) struct Os2Fixture {
    pub version: u16,
    pub weight_class: u16,
    pub width_class: u16,
    pub fs_selection: u16,
    pub typo_ascender: i16,
    pub typo_descender: i16,
    pub typo_line_gap: i16,
    pub win_ascent: u16,
    pub win_descent: u16,
}

impl Default for Os2Fixture {
    fn default() -> Self {
        Self {
            version: 4,
            weight_class: 400,
            width_class: 5,
            // REGULAR
            fs_selection: 0x0040,
            typo_ascender: 750,
            typo_descender: -250,
            typo_line_gap: 50,
            win_ascent: 900,
            win_descent: 300,
        }
    }
}

impl Os2Fixture {
    pub fn bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(100);
        data.put_u16(self.version);
        data.put_i16(500);
        data.put_u16(self.weight_class);
        data.put_u16(self.width_class);
        data.put_u16(0);
        for value in [650, 600, 0, 75, 650, 600, 0, 350, 50, 300, 0] {
            data.put_i16(value);
        }
        data.put_bytes(0, 10);
        data.put_u32(1);
        data.put_u32(0);
        data.put_u32(0);
        data.put_u32(0);
        data.put_slice(b"TEST");
        data.put_u16(self.fs_selection);
        data.put_u16(0x20);
        data.put_u16(0x42);
        data.put_i16(self.typo_ascender);
        data.put_i16(self.typo_descender);
        data.put_i16(self.typo_line_gap);
        data.put_u16(self.win_ascent);
        data.put_u16(self.win_descent);
        if self.version >= 1 {
            data.put_u32(1);
            data.put_u32(0);
        }
        if self.version >= 2 {
            data.put_i16(500);
            data.put_i16(700);
            data.put_u16(0);
            data.put_u16(0x20);
            data.put_u16(1);
        }
        if self.version >= 5 {
            data.put_u16(0);
            data.put_u16(0xFFFE);
        }
        data
    }
}

pub(crate) struct NameRecord {
    platform_id: u16,
    encoding_id: u16,
    language_id: u16,
    name_id: u16,
    bytes: Vec<u8>,
}

impl NameRecord {
    pub fn windows(name_id: u16, value: &str) -> Self {
        Self {
            platform_id: 3,
            encoding_id: 1,
            language_id: 0x0409,
            name_id,
            bytes: value.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }

    pub fn mac(name_id: u16, value: &str) -> Self {
        Self {
            platform_id: 1,
            encoding_id: 0,
            language_id: 0,
            name_id,
            bytes: value.as_bytes().to_vec(),
        }
    }
}

pub(crate) fn name_bytes(records: &[NameRecord]) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u16(0);
    data.put_u16(records.len() as u16);
    data.put_u16(6 + 12 * records.len() as u16);
    let mut offset = 0u16;
    for record in records {
        data.put_u16(record.platform_id);
        data.put_u16(record.encoding_id);
        data.put_u16(record.language_id);
        data.put_u16(record.name_id);
        data.put_u16(record.bytes.len() as u16);
        data.put_u16(offset);
        offset += record.bytes.len() as u16;
    }
    for record in records {
        data.put_slice(&record.bytes);
    }
    data
}

fn post_header(version: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(32);
    data.put_u32(version);
    data.put_u32(0);
    data.put_i16(-100);
    data.put_i16(50);
    data.put_u32(0);
    data.put_bytes(0, 16);
    data
}

pub(crate) fn post_v3_bytes() -> Vec<u8> {
    post_header(0x0003_0000)
}

pub(crate) fn post_v2_bytes(name_indices: &[u16], custom_names: &[&str]) -> Vec<u8> {
    let mut data = post_header(0x0002_0000);
    data.put_u16(name_indices.len() as u16);
    for &index in name_indices {
        data.put_u16(index);
    }
    for name in custom_names {
        data.put_u8(name.len() as u8);
        data.put_slice(name.as_bytes());
    }
    data
}

/// A format 4 segment. Indexed segments read from the glyph id array.
pub(crate) struct Segment {
    start: u16,
    end: u16,
    delta: u16,
    indexed: bool,
}

impl Segment {
    pub fn delta(start: u16, end: u16, delta: u16) -> Self {
        Self {
            start,
            end,
            delta,
            indexed: false,
        }
    }

    pub fn indexed(start: u16, end: u16) -> Self {
        Self {
            start,
            end,
            delta: 0,
            indexed: true,
        }
    }
}

/// A format 4 subtable; the 0xFFFF sentinel segment is appended
pub(crate) fn cmap_format4(segments: &[Segment], glyph_ids: &[u16]) -> Vec<u8> {
    let seg_count = segments.len() + 1;
    let mut range_offsets = Vec::with_capacity(seg_count);
    let mut glyph_cursor = 0usize;
    for (i, segment) in segments.iter().enumerate() {
        if segment.indexed {
            range_offsets.push((2 * (seg_count - i + glyph_cursor)) as u16);
            glyph_cursor += (segment.end - segment.start) as usize + 1;
        } else {
            range_offsets.push(0);
        }
    }
    range_offsets.push(0);

    let search_range = 2 * (1u16 << seg_count.ilog2());
    let entry_selector = seg_count.ilog2() as u16;
    let mut data = Vec::new();
    data.put_u16(4);
    data.put_u16((16 + 8 * seg_count + 2 * glyph_ids.len()) as u16);
    data.put_u16(0);
    data.put_u16(2 * seg_count as u16);
    data.put_u16(search_range);
    data.put_u16(entry_selector);
    data.put_u16(2 * seg_count as u16 - search_range);
    for segment in segments {
        data.put_u16(segment.end);
    }
    data.put_u16(0xFFFF);
    data.put_u16(0);
    for segment in segments {
        data.put_u16(segment.start);
    }
    data.put_u16(0xFFFF);
    for segment in segments {
        data.put_u16(segment.delta);
    }
    data.put_u16(1);
    for offset in range_offsets {
        data.put_u16(offset);
    }
    for &glyph in glyph_ids {
        data.put_u16(glyph);
    }
    data
}

/// A cmap table from (platform, encoding, subtable bytes)
pub(crate) fn cmap_table(subtables: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_u16(0);
    data.put_u16(subtables.len() as u16);
    let mut offset = 4 + 8 * subtables.len() as u32;
    for (platform_id, encoding_id, subtable) in subtables {
        data.put_u16(*platform_id);
        data.put_u16(*encoding_id);
        data.put_u32(offset);
        offset += subtable.len() as u32;
    }
    for (_, _, subtable) in subtables {
        data.put_slice(subtable);
    }
    data
}

pub(crate) fn simple_glyph(contours: &[&[(i16, i16, bool)]], instructions: &[u8]) -> Vec<u8> {
    let points: Vec<Point> = contours
        .iter()
        .flat_map(|contour| contour.iter())
        .map(|&(x, y, on_curve)| Point {
            x: x as i32,
            y: y as i32,
            on_curve,
        })
        .collect();

    let mut data = Vec::new();
    data.put_i16(contours.len() as i16);
    let xs = points.iter().map(|point| point.x as i16);
    let ys = points.iter().map(|point| point.y as i16);
    data.put_i16(xs.clone().min().unwrap_or(0));
    data.put_i16(ys.clone().min().unwrap_or(0));
    data.put_i16(xs.max().unwrap_or(0));
    data.put_i16(ys.max().unwrap_or(0));
    let mut end = -1i32;
    for contour in contours {
        end += contour.len() as i32;
        data.put_u16(end as u16);
    }
    data.put_u16(instructions.len() as u16);
    data.put_slice(instructions);
    write_glyph_points(&points, false, &mut data);
    data
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Transform {
    None,
    Scale(f32),
    XyScale(f32, f32),
    Matrix([f32; 4]),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Component {
    glyph: u16,
    dx: i16,
    dy: i16,
    transform: Transform,
}

impl Component {
    pub fn new(glyph: u16, dx: i16, dy: i16, transform: Transform) -> Self {
        Self {
            glyph,
            dx,
            dy,
            transform,
        }
    }
}

fn put_f2dot14(data: &mut Vec<u8>, value: f32) {
    data.put_i16((value * 16384.0).round() as i16);
}

/// Component records only, as stored after the glyph header
pub(crate) fn composite_components(components: &[Component], has_instructions: bool) -> Vec<u8> {
    let mut data = Vec::new();
    for (i, component) in components.iter().enumerate() {
        let last = i + 1 == components.len();
        // ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES
        let mut flags: u16 = 0x0003;
        if !last {
            flags |= 0x0020;
        } else if has_instructions {
            flags |= 0x0100;
        }
        flags |= match component.transform {
            Transform::None => 0,
            Transform::Scale(_) => 0x0008,
            Transform::XyScale(..) => 0x0040,
            Transform::Matrix(_) => 0x0080,
        };
        data.put_u16(flags);
        data.put_u16(component.glyph);
        data.put_i16(component.dx);
        data.put_i16(component.dy);
        match component.transform {
            Transform::None => {}
            Transform::Scale(scale) => put_f2dot14(&mut data, scale),
            Transform::XyScale(x, y) => {
                put_f2dot14(&mut data, x);
                put_f2dot14(&mut data, y);
            }
            Transform::Matrix(matrix) => {
                for value in matrix {
                    put_f2dot14(&mut data, value);
                }
            }
        }
    }
    data
}

pub(crate) fn composite_glyph(components: &[Component], instructions: Option<&[u8]>) -> Vec<u8> {
    let mut data = Vec::new();
    data.put_i16(-1);
    // decoders rebuild this box from the components
    data.put_bytes(0, 8);
    data.put_slice(&composite_components(components, instructions.is_some()));
    if let Some(instructions) = instructions {
        data.put_u16(instructions.len() as u16);
        data.put_slice(instructions);
    }
    data
}

/// glyf bytes and a long-format loca for them
pub(crate) fn glyf_and_loca(glyphs: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    for glyph in glyphs {
        loca.put_u32(glyf.len() as u32);
        glyf.put_slice(glyph);
        glyf.resize(glyf.len().next_multiple_of(4), 0);
    }
    loca.put_u32(glyf.len() as u32);
    (glyf, loca)
}

/// The outlines of [`FontFixture`]:
/// 0 `.notdef` box, 1 blank space, 2 `A` triangle, 3 composite `A_A`
pub(crate) fn fixture_glyphs() -> Vec<Vec<u8>> {
    vec![
        simple_glyph(
            &[&[(100, 0, true), (100, 700, true), (500, 700, true), (500, 0, true)]],
            &[],
        ),
        Vec::new(),
        simple_glyph(&[&[(0, 0, true), (300, 700, false), (600, 0, true)]], &[0xB0, 0x00]),
        composite_glyph(
            &[
                Component::new(2, 0, 0, Transform::None),
                Component::new(2, 650, 0, Transform::None),
            ],
            None,
        ),
    ]
}

/// Configurable minimal TrueType font with four glyphs
#[derive(Debug, Clone)]
pub(crate) struct FontFixture {
    pub units_per_em: u16,
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
    pub os2: Os2Fixture,
    pub family_name: &'static str,
    /// Include cvt, fpgm, prep and gasp
    pub hints: bool,
}

impl Default for FontFixture {
    fn default() -> Self {
        Self {
            units_per_em: 1000,
            ascent: 800,
            descent: -200,
            line_gap: 0,
            os2: Os2Fixture::default(),
            family_name: "Test Sans",
            hints: true,
        }
    }
}

impl FontFixture {
    pub fn tables(&self) -> Vec<(Tag, Vec<u8>)> {
        let (glyf, loca) = glyf_and_loca(&fixture_glyphs());
        let cmap = cmap_table(&[(
            3,
            1,
            cmap_format4(
                &[
                    Segment::delta(0x20, 0x20, 1u16.wrapping_sub(0x20)),
                    Segment::delta(0x41, 0x42, 2u16.wrapping_sub(0x41)),
                ],
                &[],
            ),
        )]);
        let names = name_bytes(&[
            NameRecord::windows(1, self.family_name),
            NameRecord::windows(2, "Regular"),
            NameRecord::windows(4, &format!("{} Regular", self.family_name)),
            NameRecord::windows(5, "Version 1.000"),
            NameRecord::windows(6, "TestSans-Regular"),
        ]);
        // glyph 2 is a base glyph, glyph 3 a ligature
        let mut gdef = Vec::new();
        for value in [1u16, 0, 12, 0, 0, 0, 1, 0, 4, 0, 0, 1, 2] {
            gdef.put_u16(value);
        }

        let mut tables = vec![
            (HEAD, head_bytes(self.units_per_em, 1)),
            (HHEA, hhea_bytes(self.ascent, self.descent, self.line_gap, 3)),
            (MAXP, maxp_bytes(4)),
            (OS2, self.os2.bytes()),
            (NAME, names),
            (CMAP, cmap),
            (POST, post_v2_bytes(&[0, 3, 36, 258], &["A_A"])),
            (HMTX, hmtx_bytes(&[(600, 100), (250, 0), (600, 0)], &[0])),
            (LOCA, loca),
            (GLYF, glyf),
            (GDEF, gdef),
        ];
        if self.hints {
            tables.push((CVT, vec![0x00, 0x0A, 0xFF, 0xF6]));
            tables.push((FPGM, vec![0xB0, 0x01]));
            tables.push((PREP, vec![0xB1, 0x02, 0x03]));
            tables.push((GASP, vec![0, 1, 0, 1, 0xFF, 0xFF, 0, 0x0F]));
        }
        tables
    }

    pub fn build(&self) -> Vec<u8> {
        let mut builder = SfntBuilder::new(TRUETYPE_FLAVOR);
        for (tag, data) in self.tables() {
            builder.add_table(tag, data);
        }
        builder.build(true)
    }
}

pub(crate) fn minimal_font() -> Vec<u8> {
    FontFixture::default().build()
}

/// A CFF-flavored font. The CFF table is opaque filler.
pub(crate) fn cff_font() -> Vec<u8> {
    let mut maxp = Vec::new();
    maxp.put_u32(0x0000_5000);
    maxp.put_u16(2);

    let mut builder = SfntBuilder::new(Tag::new(b"OTTO"));
    builder.add_table(HEAD, head_bytes(1000, 0));
    builder.add_table(HHEA, hhea_bytes(800, -200, 0, 1));
    builder.add_table(MAXP, maxp);
    builder.add_table(OS2, Os2Fixture::default().bytes());
    builder.add_table(
        NAME,
        name_bytes(&[NameRecord::windows(1, "Test Serif"), NameRecord::windows(2, "Italic")]),
    );
    builder.add_table(
        CMAP,
        cmap_table(&[(3, 1, cmap_format4(&[Segment::delta(0x41, 0x41, 1u16.wrapping_sub(0x41))], &[]))]),
    );
    builder.add_table(POST, post_v3_bytes());
    builder.add_table(HMTX, hmtx_bytes(&[(500, 0)], &[10]));
    builder.add_table(CFF, vec![1, 0, 4, 1]);
    builder.build(true)
}

/// A TrueType Collection holding `fonts`, with member table offsets rebased
pub(crate) fn collection(fonts: &[Vec<u8>]) -> Vec<u8> {
    let header_len = 12 + 4 * fonts.len();
    let mut data = Vec::new();
    data.put_slice(b"ttcf");
    data.put_u32(0x0001_0000);
    data.put_u32(fonts.len() as u32);

    let mut members = Vec::new();
    for font in fonts {
        let base = (header_len + members.len()) as u32;
        data.put_u32(base);
        let mut member = font.clone();
        let num_tables = u16::from_be_bytes([member[4], member[5]]) as usize;
        for i in 0..num_tables {
            let at = 12 + 16 * i + 8;
            let offset = u32::from_be_bytes([member[at], member[at + 1], member[at + 2], member[at + 3]]);
            member[at..at + 4].copy_from_slice(&(offset + base).to_be_bytes());
        }
        members.extend_from_slice(&member);
        members.resize(members.len().next_multiple_of(4), 0);
    }
    data.extend_from_slice(&members);
    data
}
