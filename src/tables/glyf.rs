//! The [glyf](https://learn.microsoft.com/en-us/typography/opentype/spec/glyf) table
//!
//! Simple glyphs are decoded in a first pass. Composite glyphs are resolved on
//! demand in a second pass, so a composite may reference any glyph regardless
//! of its position in the table.

use bitflags::bitflags;
use log::debug;

use crate::buffer::Buffer;
use crate::error::{FontError, Unsupported, bail, bail_if};
use crate::glyph::{Bounds, Glyph, GlyphData, GlyphPoint, TrueTypeOutline};
use crate::tables::loca::GlyphLocations;

/// Composite nesting limit used when the caller does not configure one
pub const DEFAULT_MAX_COMPOSITE_DEPTH: usize = 32;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct SimpleGlyphFlags: u8 {
        const ON_CURVE = 1 << 0;
        const X_SHORT = 1 << 1;
        const Y_SHORT = 1 << 2;
        const REPEAT = 1 << 3;
        /// Short: positive delta. Long: same as previous.
        const X_SAME_OR_POSITIVE = 1 << 4;
        const Y_SAME_OR_POSITIVE = 1 << 5;
        const OVERLAP_SIMPLE = 1 << 6;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct CompositeGlyphFlags: u16 {
        const ARG_1_AND_2_ARE_WORDS = 1 << 0;
        const ARGS_ARE_XY_VALUES = 1 << 1;
        const ROUND_XY_TO_GRID = 1 << 2;
        const WE_HAVE_A_SCALE = 1 << 3;
        const MORE_COMPONENTS = 1 << 5;
        const WE_HAVE_AN_X_AND_Y_SCALE = 1 << 6;
        const WE_HAVE_A_TWO_BY_TWO = 1 << 7;
        const WE_HAVE_INSTRUCTIONS = 1 << 8;
        const USE_MY_METRICS = 1 << 9;
        const OVERLAP_COMPOUND = 1 << 10;
        const SCALED_COMPONENT_OFFSET = 1 << 11;
        const UNSCALED_COMPONENT_OFFSET = 1 << 12;
    }
}

enum ComponentTransform {
    None,
    Scale { x: f32, y: f32 },
    Matrix { m00: f32, m01: f32, m10: f32, m11: f32 },
}

fn read_flags(buf: &mut Buffer, point_count: usize) -> Result<Vec<SimpleGlyphFlags>, FontError> {
    let mut flags = Vec::with_capacity(point_count);
    while flags.len() < point_count {
        let flag = SimpleGlyphFlags::from_bits_retain(buf.read_u8()?);
        let repeat = if flag.contains(SimpleGlyphFlags::REPEAT) {
            buf.read_u8()? as usize
        } else {
            0
        };
        bail_if!(
            flags.len() + repeat + 1 > point_count,
            "glyph flag repeat runs past the point count"
        );
        flags.extend(std::iter::repeat_n(flag, repeat + 1));
    }
    Ok(flags)
}

fn read_coordinates(
    buf: &mut Buffer,
    flags: &[SimpleGlyphFlags],
    short: SimpleGlyphFlags,
    same_or_positive: SimpleGlyphFlags,
) -> Result<Vec<i16>, FontError> {
    let mut coordinate: i16 = 0;
    let mut coordinates = Vec::with_capacity(flags.len());
    for flag in flags {
        let delta = if flag.contains(short) {
            let magnitude = buf.read_u8()? as i16;
            if flag.contains(same_or_positive) {
                magnitude
            } else {
                -magnitude
            }
        } else if flag.contains(same_or_positive) {
            0
        } else {
            buf.read_i16()?
        };
        coordinate = coordinate.wrapping_add(delta);
        coordinates.push(coordinate);
    }
    Ok(coordinates)
}

fn read_simple_glyph(index: u16, buf: &mut Buffer, contour_count: usize) -> Result<Glyph, FontError> {
    let bounds = Bounds::read(buf)?;
    let contour_end_indices = buf.read_u16_array(contour_count)?;
    bail_if!(
        contour_end_indices.windows(2).any(|pair| pair[1] < pair[0]),
        "contour end points are not ascending"
    );
    let instruction_len = buf.read_u16()? as usize;
    let instructions = buf.read_bytes(instruction_len)?.to_vec();

    let point_count = contour_end_indices
        .last()
        .map(|&last| last as usize + 1)
        .unwrap_or(0);
    let flags = read_flags(buf, point_count)?;
    let xs = read_coordinates(
        buf,
        &flags,
        SimpleGlyphFlags::X_SHORT,
        SimpleGlyphFlags::X_SAME_OR_POSITIVE,
    )?;
    let ys = read_coordinates(
        buf,
        &flags,
        SimpleGlyphFlags::Y_SHORT,
        SimpleGlyphFlags::Y_SAME_OR_POSITIVE,
    )?;

    let points = flags
        .iter()
        .zip(xs.into_iter().zip(ys))
        .map(|(flag, (x, y))| {
            GlyphPoint::new(x as f32, y as f32, flag.contains(SimpleGlyphFlags::ON_CURVE))
        })
        .collect();

    Ok(Glyph::new(
        index,
        bounds,
        GlyphData::TrueType(TrueTypeOutline {
            points,
            contour_end_indices,
            instructions,
        }),
    ))
}

/// Pre-sized glyph array plus the bookkeeping needed to resolve composites
struct GlyphArena<'a> {
    data: &'a [u8],
    loca: &'a GlyphLocations,
    glyphs: Vec<Option<Glyph>>,
    in_progress: Vec<bool>,
    max_depth: usize,
}

impl<'a> GlyphArena<'a> {
    fn glyph_bytes(&self, index: usize) -> Result<&'a [u8], FontError> {
        let data: &'a [u8] = self.data;
        let range = self.loca.glyph_range(index)?;
        data.get(range)
            .ok_or(FontError::MalformedFont("glyph data runs past the end of glyf"))
    }

    /// Clone of a resolved glyph's outline, ready to be transformed
    fn component_outline(&self, index: usize) -> Result<(TrueTypeOutline, Bounds), FontError> {
        match self.glyphs[index].as_ref().map(|glyph| (glyph.data(), glyph.bounds())) {
            Some((GlyphData::TrueType(outline), bounds)) => Ok((outline.clone(), bounds)),
            Some((_, bounds)) => Ok((TrueTypeOutline::default(), bounds)),
            None => Err(FontError::MalformedFont("unresolved composite component")),
        }
    }

    fn resolve(&mut self, index: usize, depth: usize) -> Result<(), FontError> {
        if self.glyphs[index].is_some() {
            return Ok(());
        }
        bail_if!(self.in_progress[index], "composite glyph references itself");
        bail_if!(depth > self.max_depth, "composite glyphs nested too deeply");

        self.in_progress[index] = true;
        let glyph = self.read_composite_glyph(index, depth)?;
        self.in_progress[index] = false;
        self.glyphs[index] = Some(glyph);
        Ok(())
    }

    fn read_composite_glyph(&mut self, index: usize, depth: usize) -> Result<Glyph, FontError> {
        let mut buf = Buffer::new(self.glyph_bytes(index)?);
        let _contour_count = buf.read_i16()?;
        // the stored box is ignored; it is rebuilt from the transformed components
        let _bounds = Bounds::read(&mut buf)?;

        let mut merged: Option<(TrueTypeOutline, Bounds)> = None;
        let mut flags = CompositeGlyphFlags::MORE_COMPONENTS;
        while flags.contains(CompositeGlyphFlags::MORE_COMPONENTS) {
            flags = CompositeGlyphFlags::from_bits_retain(buf.read_u16()?);
            let component = buf.read_u16()? as usize;
            bail_if!(
                component >= self.glyphs.len(),
                "composite component outside the glyph range"
            );
            if !flags.contains(CompositeGlyphFlags::ARGS_ARE_XY_VALUES) {
                bail!(FontError::UnsupportedFormat(Unsupported::PointMatching));
            }

            let (dx, dy) = if flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS) {
                (buf.read_i16()?, buf.read_i16()?)
            } else {
                (buf.read_i8()? as i16, buf.read_i8()? as i16)
            };
            let transform = if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
                let scale = buf.read_f2dot14()?;
                ComponentTransform::Scale { x: scale, y: scale }
            } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
                ComponentTransform::Scale {
                    x: buf.read_f2dot14()?,
                    y: buf.read_f2dot14()?,
                }
            } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
                ComponentTransform::Matrix {
                    m00: buf.read_f2dot14()?,
                    m01: buf.read_f2dot14()?,
                    m10: buf.read_f2dot14()?,
                    m11: buf.read_f2dot14()?,
                }
            } else {
                ComponentTransform::None
            };

            self.resolve(component, depth + 1)?;
            let (mut outline, bounds) = self.component_outline(component)?;

            // Transform normal, not a matrix product: the resulting box is
            // accumulated from the origin.
            let bounds = match transform {
                ComponentTransform::Matrix { m00, m01, m10, m11 } => {
                    let bounds = outline.transform_normal(m00, m01, m10, m11);
                    outline.offset(bounds, dx, dy)
                }
                ComponentTransform::Scale { x, y } => {
                    let bounds = if x == 1.0 && y == 1.0 {
                        bounds
                    } else {
                        outline.transform_normal(x, 0.0, 0.0, y)
                    };
                    outline.offset(bounds, dx, dy)
                }
                ComponentTransform::None => outline.offset(bounds, dx, dy),
            };
            outline.instructions.clear();

            match merged.as_mut() {
                None => merged = Some((outline, bounds)),
                Some((merged_outline, merged_bounds)) => {
                    merged_outline.append(outline);
                    *merged_bounds = merged_bounds.union(&bounds);
                }
            }
        }

        let Some((mut outline, bounds)) = merged else {
            bail!(FontError::MalformedFont("composite glyph has no components"));
        };
        if flags.contains(CompositeGlyphFlags::WE_HAVE_INSTRUCTIONS) {
            let instruction_len = buf.read_u16()? as usize;
            outline.instructions = buf.read_bytes(instruction_len)?.to_vec();
        }
        Ok(Glyph::new(index as u16, bounds, GlyphData::TrueType(outline)))
    }
}

/// Decode every glyph in `data`, using `loca` to find them
pub fn read_glyphs(
    data: &[u8],
    loca: &GlyphLocations,
    max_composite_depth: usize,
) -> Result<Vec<Glyph>, FontError> {
    let num_glyphs = loca.num_glyphs();
    let mut arena = GlyphArena {
        data,
        loca,
        glyphs: vec![None; num_glyphs],
        in_progress: vec![false; num_glyphs],
        max_depth: max_composite_depth,
    };

    let mut composites = Vec::new();
    for index in 0..num_glyphs {
        let bytes = arena.glyph_bytes(index)?;
        if bytes.is_empty() {
            arena.glyphs[index] = Some(Glyph::blank(index as u16));
            continue;
        }
        let mut buf = Buffer::new(bytes);
        let contour_count = buf.read_i16()?;
        if contour_count < 0 {
            composites.push(index);
        } else {
            let glyph = read_simple_glyph(index as u16, &mut buf, contour_count as usize)?;
            arena.glyphs[index] = Some(glyph);
        }
    }

    debug!(
        "glyf: {} glyphs, {} composite",
        num_glyphs,
        composites.len()
    );
    for index in composites {
        arena.resolve(index, 0)?;
    }

    arena
        .glyphs
        .into_iter()
        .map(|glyph| glyph.ok_or(FontError::MalformedFont("glyph left unresolved")))
        .collect()
}
