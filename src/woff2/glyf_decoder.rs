/* Copyright 2013 Google Inc. All Rights Reserved.

   Distributed under MIT license.
   See file LICENSE for detail or copy at https://opensource.org/licenses/MIT
*/

//! Reversal of the WOFF2 glyf/loca transform
//!
//! <https://www.w3.org/TR/WOFF2/#glyf_table_format>

use arrayvec::ArrayVec;
use bytes::{Buf, BufMut};
use log::debug;

use crate::Round4;
use crate::error::{FontError, bail_if, u32_will_overflow, usize_will_overflow};
use crate::tables::glyf::{CompositeGlyphFlags, SimpleGlyphFlags};
use crate::variable_length::BufVariableExt as _;

const NUM_SUB_STREAMS: usize = 7;
const FLAG_OVERLAP_SIMPLE_BITMAP: u16 = 1 << 0;
// 98% of Google Fonts have no glyph above 5k bytes. Largest glyph ever observed was 72k bytes
const DEFAULT_GLYPH_BUF_SIZE: usize = 5120;

/// An absolute outline point in font units
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Point {
    pub x: i32,
    pub y: i32,
    pub on_curve: bool,
}

/// Output of the transform reversal
pub(crate) struct GlyfAndLoca {
    pub num_glyphs: u16,
    /// loca index format
    pub index_format: u16,
    /// The x_min of the bounding box of every glyph, 0 for empty glyphs.
    /// Used to reconstruct a transformed hmtx table.
    pub x_mins: Vec<i16>,
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
}

/// Decode a WOFF2 transformed glyf table into plain glyf and loca tables
pub(crate) fn reconstruct_glyf_and_loca(data: &[u8]) -> Result<GlyfAndLoca, FontError> {
    GlyfDecoder::new(data)?.decode()
}

struct GlyfDecoder<'a> {
    n_contour_stream: &'a [u8],
    n_points_stream: &'a [u8],
    flag_stream: &'a [u8],
    glyph_stream: &'a [u8],
    composite_stream: &'a [u8],
    bbox_bitmap: &'a [u8],
    bbox_stream: &'a [u8],
    instruction_stream: &'a [u8],
    overlap_bitmap: Option<&'a [u8]>,
    /// Scratch buffer each glyph is assembled in
    glyph_buf: Vec<u8>,

    num_glyphs: u16,
    index_format: u16,
}

fn bit_is_set(bitmap: &[u8], index: usize) -> bool {
    bitmap
        .get(index >> 3)
        .is_some_and(|byte| byte & (0x80 >> (index & 7)) != 0)
}

impl<'a> GlyfDecoder<'a> {
    fn new(data: &'a [u8]) -> Result<Self, FontError> {
        let mut input = data;
        let _reserved = input.try_get_u16()?;
        let flags = input.try_get_u16()?;
        let has_overlap_bitmap = (flags & FLAG_OVERLAP_SIMPLE_BITMAP) != 0;
        let num_glyphs = input.try_get_u16()?;
        let index_format = input.try_get_u16()?;

        let mut offset: usize = (2 + NUM_SUB_STREAMS) * 4;
        bail_if!(offset > data.len(), "transformed glyf header is truncated");

        // Invariant from here on: data.len() >= offset
        let mut substreams: ArrayVec<&[u8], NUM_SUB_STREAMS> = ArrayVec::new();
        for _ in 0..NUM_SUB_STREAMS {
            let substream_size = input.try_get_u32()? as usize;
            bail_if!(
                substream_size > data.len() - offset,
                "transformed glyf sub-stream runs past the table"
            );
            substreams.push(&data[offset..offset + substream_size]);
            offset += substream_size;
        }

        let bitmap_length: usize = ((num_glyphs as usize + 31) >> 5) << 2;
        bail_if!(
            bitmap_length > substreams[5].len(),
            "bbox bitmap is truncated"
        );
        let (bbox_bitmap, bbox_stream) = substreams[5].split_at(bitmap_length);

        let overlap_bitmap = if has_overlap_bitmap {
            let overlap_bitmap_length = (num_glyphs as usize + 7) >> 3;
            bail_if!(
                overlap_bitmap_length > data.len() - offset,
                "overlap bitmap is truncated"
            );
            Some(&data[offset..offset + overlap_bitmap_length])
        } else {
            None
        };

        Ok(GlyfDecoder {
            n_contour_stream: substreams[0],
            n_points_stream: substreams[1],
            flag_stream: substreams[2],
            glyph_stream: substreams[3],
            composite_stream: substreams[4],
            bbox_bitmap,
            bbox_stream,
            instruction_stream: substreams[6],
            overlap_bitmap,
            glyph_buf: Vec::with_capacity(DEFAULT_GLYPH_BUF_SIZE),
            num_glyphs,
            index_format,
        })
    }

    fn decode(mut self) -> Result<GlyfAndLoca, FontError> {
        let num_glyphs = self.num_glyphs as usize;
        let mut glyf: Vec<u8> = Vec::with_capacity(num_glyphs * 12);
        let mut loca_values: Vec<u32> = Vec::with_capacity(num_glyphs + 1);
        let mut x_mins: Vec<i16> = Vec::with_capacity(num_glyphs);

        for i in 0..num_glyphs {
            loca_values.push(glyf.len() as u32);

            let n_contours = self.n_contour_stream.try_get_i16()?;
            let glyph_has_bbox = bit_is_set(self.bbox_bitmap, i);

            self.glyph_buf.clear();
            if n_contours == -1 {
                bail_if!(!glyph_has_bbox, "composite glyph has no explicit bbox");
                self.parse_composite_glyph()?;
            } else if n_contours > 0 {
                let has_overlap_bit = self
                    .overlap_bitmap
                    .is_some_and(|bitmap| bit_is_set(bitmap, i));
                self.parse_simple_glyph(n_contours as usize, glyph_has_bbox, has_overlap_bit)?;
            } else {
                bail_if!(n_contours < 0, "invalid contour count");
                bail_if!(glyph_has_bbox, "empty glyph has a bbox");
            }

            // xMin sits at bytes 2..4 of every non-empty glyph header
            let x_min = match self.glyph_buf.get(2..4) {
                Some(&[hi, lo]) => i16::from_be_bytes([hi, lo]),
                _ => 0,
            };
            x_mins.push(x_min);

            glyf.extend_from_slice(&self.glyph_buf);
            glyf.resize(Round4!(glyf.len()), 0);
        }

        // loca[n] is the length of the glyf table
        loca_values.push(glyf.len() as u32);
        let loca = generate_loca_table(&loca_values, self.index_format)?;

        debug!(
            "woff2: rebuilt glyf ({} bytes) and loca for {} glyphs",
            glyf.len(),
            num_glyphs
        );
        Ok(GlyfAndLoca {
            num_glyphs: self.num_glyphs,
            index_format: self.index_format,
            x_mins,
            glyf,
            loca,
        })
    }

    /// Parse glyph data into `self.glyph_buf`
    fn parse_composite_glyph(&mut self) -> Result<(), FontError> {
        // Size the components on a copy of the stream so the bytes can then be copied verbatim
        let mut sizing_stream = self.composite_stream;
        let (composite_size, have_instructions) = compute_size_of_composite(&mut sizing_stream)?;

        let instruction_size: u16 = if have_instructions {
            self.glyph_stream.try_get_variable_255_u16()?
        } else {
            0
        };

        self.glyph_buf
            .reserve(12 + composite_size + instruction_size as usize);
        self.glyph_buf.put_i16(-1);
        self.bbox_stream.try_read_bytes_into(8, &mut self.glyph_buf)?;
        self.composite_stream
            .try_read_bytes_into(composite_size, &mut self.glyph_buf)?;

        if have_instructions {
            self.glyph_buf.put_u16(instruction_size);
            self.instruction_stream
                .try_read_bytes_into(instruction_size as usize, &mut self.glyph_buf)?;
        }

        Ok(())
    }

    fn parse_simple_glyph(
        &mut self,
        n_contours: usize,
        glyph_has_bbox: bool,
        has_overlap_bit: bool,
    ) -> Result<(), FontError> {
        let mut n_points_vec: Vec<u16> = Vec::with_capacity(n_contours);
        let mut total_n_points: u32 = 0;
        for _ in 0..n_contours {
            let n_points_contour = self.n_points_stream.try_get_variable_255_u16()?;
            n_points_vec.push(n_points_contour);
            bail_if!(
                u32_will_overflow(total_n_points, n_points_contour as u32),
                "point count overflows"
            );
            total_n_points += n_points_contour as u32;
        }
        let flag_size = total_n_points as usize;
        bail_if!(
            flag_size > self.flag_stream.len(),
            "flag stream is truncated"
        );

        let mut points = Vec::with_capacity(flag_size);
        let triplet_bytes_consumed =
            decode_triplet(&self.flag_stream[..flag_size], self.glyph_stream, &mut points)?;
        self.flag_stream.advance(flag_size);
        self.glyph_stream.advance(triplet_bytes_consumed);

        let instruction_size = self.glyph_stream.try_get_variable_255_u16()?;
        bail_if!(
            total_n_points >= (1 << 27),
            "simple glyph has too many points"
        );

        self.glyph_buf.reserve(
            12 + 2 * n_contours + 5 * flag_size + instruction_size as usize,
        );
        self.glyph_buf.put_i16(n_contours as i16);

        if glyph_has_bbox {
            self.bbox_stream.try_read_bytes_into(8, &mut self.glyph_buf)?;
        } else {
            write_bbox(&points, &mut self.glyph_buf);
        }

        let mut end_point: i32 = -1;
        for contour in n_points_vec {
            end_point += contour as i32;
            bail_if!(end_point >= 65536, "contour end point overflows");
            self.glyph_buf.put_u16(end_point as u16);
        }

        self.glyph_buf.put_u16(instruction_size);
        self.instruction_stream
            .try_read_bytes_into(instruction_size as usize, &mut self.glyph_buf)?;

        write_glyph_points(&points, has_overlap_bit, &mut self.glyph_buf);

        Ok(())
    }
}

fn point_flag(dx: i32, dy: i32, on_curve: bool) -> u8 {
    let mut flag = SimpleGlyphFlags::empty();
    if on_curve {
        flag |= SimpleGlyphFlags::ON_CURVE;
    }
    if dx == 0 {
        flag |= SimpleGlyphFlags::X_SAME_OR_POSITIVE;
    } else if dx > -256 && dx < 256 {
        flag |= SimpleGlyphFlags::X_SHORT;
        if dx > 0 {
            flag |= SimpleGlyphFlags::X_SAME_OR_POSITIVE;
        }
    }
    if dy == 0 {
        flag |= SimpleGlyphFlags::Y_SAME_OR_POSITIVE;
    } else if dy > -256 && dy < 256 {
        flag |= SimpleGlyphFlags::Y_SHORT;
        if dy > 0 {
            flag |= SimpleGlyphFlags::Y_SAME_OR_POSITIVE;
        }
    }
    flag.bits()
}

fn write_coordinate(dst: &mut impl BufMut, delta: i32) {
    if delta == 0 {
        // implied by the flag
    } else if delta > -256 && delta < 256 {
        dst.put_u8(delta.unsigned_abs() as u8);
    } else {
        // will always fit for valid input, but overflow is harmless
        dst.put_i16(delta as i16);
    }
}

/// Write the flags and coordinates of a simple glyph, with flag runs
/// compressed through the repeat flag
pub(crate) fn write_glyph_points(points: &[Point], has_overlap_bit: bool, dst: &mut impl BufMut) {
    // A flag is held back until it is known whether the next one repeats it
    let mut pending: Option<(u8, u8)> = None;
    let mut last_x: i32 = 0;
    let mut last_y: i32 = 0;
    for (i, point) in points.iter().enumerate() {
        let mut flag = point_flag(point.x - last_x, point.y - last_y, point.on_curve);
        if has_overlap_bit && i == 0 {
            flag |= SimpleGlyphFlags::OVERLAP_SIMPLE.bits();
        }

        pending = match pending {
            Some((last_flag, repeat_count)) if last_flag == flag && repeat_count < 255 => {
                Some((last_flag, repeat_count + 1))
            }
            previous => {
                if let Some(previous) = previous {
                    write_flag(dst, previous);
                }
                Some((flag, 0))
            }
        };

        last_x = point.x;
        last_y = point.y;
    }
    if let Some(last) = pending {
        write_flag(dst, last);
    }

    last_x = 0;
    for point in points {
        write_coordinate(dst, point.x - last_x);
        last_x = point.x;
    }
    last_y = 0;
    for point in points {
        write_coordinate(dst, point.y - last_y);
        last_y = point.y;
    }
}

fn write_flag(dst: &mut impl BufMut, (flag, repeat_count): (u8, u8)) {
    if repeat_count > 0 {
        dst.put_u8(flag | SimpleGlyphFlags::REPEAT.bits());
        dst.put_u8(repeat_count);
    } else {
        dst.put_u8(flag);
    }
}

/// Compute the bounding box of the points and write it as a glyf header bbox
fn write_bbox(points: &[Point], dst: &mut impl BufMut) {
    let (mut x_min, mut y_min, mut x_max, mut y_max) = match points.first() {
        Some(first) => (first.x, first.y, first.x, first.y),
        None => (0, 0, 0, 0),
    };
    for &Point { x, y, .. } in points.iter().skip(1) {
        x_min = x.min(x_min);
        x_max = x.max(x_max);
        y_min = y.min(y_min);
        y_max = y.max(y_max);
    }

    dst.put_i16(x_min as i16);
    dst.put_i16(y_min as i16);
    dst.put_i16(x_max as i16);
    dst.put_i16(y_max as i16);
}

/// Byte length of one composite glyph's component records and whether it has instructions
fn compute_size_of_composite(composite_stream: &mut impl Buf) -> Result<(usize, bool), FontError> {
    let mut bytes_read: usize = 0;
    let mut we_have_instructions = false;
    let mut flags = CompositeGlyphFlags::MORE_COMPONENTS;
    while flags.contains(CompositeGlyphFlags::MORE_COMPONENTS) {
        flags = CompositeGlyphFlags::from_bits_retain(composite_stream.try_get_u16()?);
        we_have_instructions |= flags.contains(CompositeGlyphFlags::WE_HAVE_INSTRUCTIONS);
        // glyph index
        let mut arg_size: usize = 2;
        if flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS) {
            arg_size += 4;
        } else {
            arg_size += 2;
        }
        if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
            arg_size += 2;
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
            arg_size += 4;
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
            arg_size += 8;
        }
        bail_if!(
            composite_stream.remaining() < arg_size,
            "composite stream is truncated"
        );
        composite_stream.advance(arg_size);

        bytes_read += 2 + arg_size;
    }

    Ok((bytes_read, we_have_instructions))
}

/// Decode the triplet-encoded coordinates of one glyph. Returns the number of
/// bytes of `in_` consumed.
fn decode_triplet(flags_in: &[u8], in_: &[u8], result: &mut Vec<Point>) -> Result<usize, FontError> {
    #[inline(always)]
    fn with_sign(flag: i32, baseval: i32) -> i32 {
        // Precondition: 0 <= baseval < 65536 (to avoid integer overflow)
        if (flag & 1) != 0 { baseval } else { -baseval }
    }

    fn safe_add(a: i32, b: i32) -> Result<i32, FontError> {
        a.checked_add(b)
            .ok_or(FontError::MalformedFont("glyph coordinate overflows"))
    }

    let mut x: i32 = 0;
    let mut y: i32 = 0;

    bail_if!(flags_in.len() > in_.len(), "glyph stream is truncated");

    let mut triplet_index: usize = 0;

    for &flag in flags_in {
        let on_curve = (flag >> 7) == 0;
        let flag = (flag & 0x7f) as i32;

        let n_data_bytes: usize = if flag < 84 {
            1
        } else if flag < 120 {
            2
        } else if flag < 124 {
            3
        } else {
            4
        };

        bail_if!(
            usize_will_overflow(triplet_index, n_data_bytes)
                || (triplet_index + n_data_bytes) > in_.len(),
            "glyph stream is truncated"
        );
        let data = &in_[triplet_index..triplet_index + n_data_bytes];

        let (dx, dy) = if flag < 10 {
            (0, with_sign(flag, ((flag & 14) << 7) + data[0] as i32))
        } else if flag < 20 {
            (with_sign(flag, (((flag - 10) & 14) << 7) + data[0] as i32), 0)
        } else if flag < 84 {
            let b0 = flag - 20;
            let b1 = data[0] as i32;
            (
                with_sign(flag, 1 + (b0 & 0x30) + (b1 >> 4)),
                with_sign(flag >> 1, 1 + ((b0 & 0x0c) << 2) + (b1 & 0x0f)),
            )
        } else if flag < 120 {
            let b0 = flag - 84;
            (
                with_sign(flag, 1 + ((b0 / 12) << 8) + data[0] as i32),
                with_sign(flag >> 1, 1 + (((b0 % 12) >> 2) << 8) + data[1] as i32),
            )
        } else if flag < 124 {
            let b2 = data[1] as i32;
            (
                with_sign(flag, ((data[0] as i32) << 4) + (b2 >> 4)),
                with_sign(flag >> 1, ((b2 & 0x0f) << 8) + data[2] as i32),
            )
        } else {
            (
                with_sign(flag, ((data[0] as i32) << 8) + data[1] as i32),
                with_sign(flag >> 1, ((data[2] as i32) << 8) + data[3] as i32),
            )
        };
        triplet_index += n_data_bytes;
        x = safe_add(x, dx)?;
        y = safe_add(y, dy)?;

        result.push(Point { x, y, on_curve });
    }

    Ok(triplet_index)
}

/// Generate a loca table from glyph offsets and an index format
///
/// See <https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6loca.html>
fn generate_loca_table(loca_values: &[u32], index_format: u16) -> Result<Vec<u8>, FontError> {
    let offset_size: usize = if index_format != 0 { 4 } else { 2 };
    let mut loca: Vec<u8> = Vec::with_capacity(loca_values.len() * offset_size);
    if index_format != 0 {
        for &value in loca_values {
            loca.put_u32(value);
        }
    } else {
        for &value in loca_values {
            // short offsets store half the real offset
            bail_if!(value > 0x1FFFE, "glyf too large for short loca offsets");
            loca.put_u16((value >> 1) as u16);
        }
    }
    Ok(loca)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tables::glyf::{DEFAULT_MAX_COMPOSITE_DEPTH, read_glyphs};
    use crate::tables::loca::GlyphLocations;
    use crate::test_fonts::{Component, Transform, composite_components};
    use pretty_assertions::assert_eq;

    /// A glyph as the WOFF2 encoder sees it
    pub(crate) enum SourceGlyph<'a> {
        Empty,
        Simple {
            contours: &'a [&'a [(i32, i32, bool)]],
            instructions: &'a [u8],
            explicit_bbox: Option<[i16; 4]>,
        },
        Composite {
            components: &'a [Component],
            bbox: [i16; 4],
        },
    }

    /// Encode glyphs as a transformed glyf table, using the 4-byte triplet form for every point
    pub(crate) fn transformed_glyf(glyphs: &[SourceGlyph], index_format: u16) -> Vec<u8> {
        let mut n_contours = Vec::new();
        let mut n_points = Vec::new();
        let mut flags = Vec::new();
        let mut glyph_stream = Vec::new();
        let mut composite_stream = Vec::new();
        let mut bbox_bitmap = vec![0u8; ((glyphs.len() + 31) >> 5) << 2];
        let mut bbox_stream = Vec::new();
        let mut instruction_stream = Vec::new();

        for (i, glyph) in glyphs.iter().enumerate() {
            match glyph {
                SourceGlyph::Empty => n_contours.put_i16(0),
                SourceGlyph::Simple {
                    contours,
                    instructions,
                    explicit_bbox,
                } => {
                    n_contours.put_i16(contours.len() as i16);
                    let (mut last_x, mut last_y) = (0, 0);
                    for contour in contours.iter() {
                        n_points.put_u8(contour.len() as u8);
                        for &(x, y, on_curve) in contour.iter() {
                            let (dx, dy): (i32, i32) = (x - last_x, y - last_y);
                            let mut flag = 124u8;
                            if dx >= 0 {
                                flag |= 1;
                            }
                            if dy >= 0 {
                                flag |= 2;
                            }
                            if !on_curve {
                                flag |= 0x80;
                            }
                            flags.put_u8(flag);
                            glyph_stream.put_u16(dx.unsigned_abs() as u16);
                            glyph_stream.put_u16(dy.unsigned_abs() as u16);
                            (last_x, last_y) = (x, y);
                        }
                    }
                    glyph_stream.put_u8(instructions.len() as u8);
                    instruction_stream.put_slice(instructions);
                    if let Some(bbox) = explicit_bbox {
                        bbox_bitmap[i >> 3] |= 0x80 >> (i & 7);
                        for value in bbox {
                            bbox_stream.put_i16(*value);
                        }
                    }
                }
                SourceGlyph::Composite { components, bbox } => {
                    n_contours.put_i16(-1);
                    composite_stream.put_slice(&composite_components(components, false));
                    bbox_bitmap[i >> 3] |= 0x80 >> (i & 7);
                    for value in bbox {
                        bbox_stream.put_i16(*value);
                    }
                }
            }
        }

        let mut bbox = bbox_bitmap;
        bbox.extend_from_slice(&bbox_stream);
        let streams = [
            n_contours,
            n_points,
            flags,
            glyph_stream,
            composite_stream,
            bbox,
            instruction_stream,
        ];

        let mut data = Vec::new();
        data.put_u16(0);
        data.put_u16(0);
        data.put_u16(glyphs.len() as u16);
        data.put_u16(index_format);
        for stream in &streams {
            data.put_u32(stream.len() as u32);
        }
        for stream in &streams {
            data.put_slice(stream);
        }
        data
    }

    const TRIANGLE: &[(i32, i32, bool)] = &[(0, 0, true), (300, 700, false), (600, 0, true)];

    fn sample_glyphs() -> Vec<u8> {
        let components = [Component::new(0, 100, 0, Transform::None)];
        transformed_glyf(
            &[
                SourceGlyph::Simple {
                    contours: &[TRIANGLE],
                    instructions: &[1, 2],
                    explicit_bbox: None,
                },
                SourceGlyph::Empty,
                SourceGlyph::Composite {
                    components: &components,
                    bbox: [100, 0, 700, 700],
                },
            ],
            1,
        )
    }

    #[test]
    fn rebuilds_simple_empty_and_composite_glyphs() {
        let rebuilt = reconstruct_glyf_and_loca(&sample_glyphs()).unwrap();
        assert_eq!(rebuilt.num_glyphs, 3);
        assert_eq!(rebuilt.index_format, 1);
        assert_eq!(rebuilt.x_mins, vec![0, 0, 100]);

        // 27 byte triangle padded to 28, empty glyph, 18 byte composite padded to 20
        let loca = GlyphLocations::read(&rebuilt.loca, 3, true).unwrap();
        assert_eq!(loca.glyph_range(0).unwrap(), 0..28);
        assert!(loca.glyph_range(1).unwrap().is_empty());
        assert_eq!(loca.glyph_range(2).unwrap(), 28..48);

        let glyphs = read_glyphs(&rebuilt.glyf, &loca, DEFAULT_MAX_COMPOSITE_DEPTH).unwrap();
        let triangle = &glyphs[0];
        assert_eq!(triangle.bounds(), crate::glyph::Bounds::new(0, 0, 600, 700));
        assert_eq!(triangle.instructions(), &[1, 2]);
        assert_eq!(triangle.contour_end_indices(), &[2]);
        assert!(!triangle.points()[1].on_curve);

        let composite = &glyphs[2];
        assert_eq!(composite.bounds(), crate::glyph::Bounds::new(100, 0, 700, 700));
        let xs: Vec<f32> = composite.points().iter().map(|point| point.x).collect();
        assert_eq!(xs, vec![100.0, 400.0, 700.0]);
    }

    #[test]
    fn explicit_bbox_is_kept() {
        let data = transformed_glyf(
            &[SourceGlyph::Simple {
                contours: &[TRIANGLE],
                instructions: &[],
                explicit_bbox: Some([-10, -20, 610, 720]),
            }],
            0,
        );
        let rebuilt = reconstruct_glyf_and_loca(&data).unwrap();
        assert_eq!(rebuilt.x_mins, vec![-10]);
        assert_eq!(&rebuilt.glyf[2..10], &[0xFF, 0xF6, 0xFF, 0xEC, 0x02, 0x62, 0x02, 0xD0]);
        // short loca stores halved offsets
        assert_eq!(rebuilt.loca.len(), 4);
    }

    #[test]
    fn composite_without_bbox_is_malformed() {
        let mut data = sample_glyphs();
        // clear the bbox bitmap byte that follows the 7 stream sizes and the earlier streams
        let header = 36;
        let sizes: Vec<usize> = (0..7)
            .map(|i| u32::from_be_bytes(data[8 + 4 * i..12 + 4 * i].try_into().unwrap()) as usize)
            .collect();
        let bbox_start = header + sizes[..5].iter().sum::<usize>();
        data[bbox_start] = 0;
        assert!(matches!(
            reconstruct_glyf_and_loca(&data),
            Err(FontError::MalformedFont(_))
        ));
    }

    #[test]
    fn oversized_stream_is_malformed() {
        let mut data = sample_glyphs();
        data[8..12].copy_from_slice(&0xFFFFu32.to_be_bytes());
        assert!(reconstruct_glyf_and_loca(&data).is_err());
        assert!(reconstruct_glyf_and_loca(&data[..20]).is_err());
    }

    #[test]
    fn triplet_encodings() {
        let mut points = Vec::new();
        // flag 0: y only; flag 11: x only; flag 21: both deltas packed in one byte
        let consumed = decode_triplet(&[0, 11, 0x80 | 21], &[5, 7, 0x12], &mut points).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(
            points,
            vec![
                Point { x: 0, y: -5, on_curve: true },
                Point { x: 7, y: -5, on_curve: true },
                Point { x: 7 + 2, y: -5 - 3, on_curve: false },
            ]
        );
    }

    #[test]
    fn flag_runs_use_repeat() {
        let points: Vec<Point> = (0..4)
            .map(|i| Point {
                x: i * 10,
                y: 0,
                on_curve: true,
            })
            .collect();
        let mut out = Vec::new();
        write_glyph_points(&points, true, &mut out);
        // first point: same x, same y, overlap; then three short positive x moves
        assert_eq!(out, vec![0x71, 0x33 | 0x08, 2, 10, 10, 10]);
    }
}
