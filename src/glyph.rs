//! Glyph outline model

use crate::buffer::Buffer;
use crate::error::FontError;

/// A bounding box in font design units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl Bounds {
    pub const ZERO: Bounds = Bounds::new(0, 0, 0, 0);

    pub const fn new(x_min: i16, y_min: i16, x_max: i16, y_max: i16) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub(crate) fn read(buf: &mut Buffer<'_>) -> Result<Self, FontError> {
        Ok(Self {
            x_min: buf.read_i16()?,
            y_min: buf.read_i16()?,
            x_max: buf.read_i16()?,
            y_max: buf.read_i16()?,
        })
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Extrema of a point set, or `ZERO` when empty
    pub fn from_points(points: &[GlyphPoint]) -> Bounds {
        let Some(first) = points.first() else {
            return Bounds::ZERO;
        };
        let mut bounds = Bounds::new(
            first.x as i16,
            first.y as i16,
            first.x as i16,
            first.y as i16,
        );
        for point in &points[1..] {
            let (x, y) = (point.x as i16, point.y as i16);
            bounds.x_min = bounds.x_min.min(x);
            bounds.y_min = bounds.y_min.min(y);
            bounds.x_max = bounds.x_max.max(x);
            bounds.y_max = bounds.y_max.max(y);
        }
        bounds
    }

    pub fn width(&self) -> i32 {
        self.x_max as i32 - self.x_min as i32
    }

    pub fn height(&self) -> i32 {
        self.y_max as i32 - self.y_min as i32
    }
}

/// A contour vertex in font design units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPoint {
    pub x: f32,
    pub y: f32,
    pub on_curve: bool,
}

impl GlyphPoint {
    pub fn new(x: f32, y: f32, on_curve: bool) -> Self {
        Self { x, y, on_curve }
    }

    fn offset(self, dx: i16, dy: i16) -> Self {
        Self {
            x: self.x + dx as f32,
            y: self.y + dy as f32,
            on_curve: self.on_curve,
        }
    }
}

/// GDEF glyph classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GlyphClass {
    #[default]
    Unclassified,
    Base,
    Ligature,
    Mark,
    Component,
}

impl GlyphClass {
    pub(crate) fn from_class_value(value: u16) -> Self {
        match value {
            1 => GlyphClass::Base,
            2 => GlyphClass::Ligature,
            3 => GlyphClass::Mark,
            4 => GlyphClass::Component,
            _ => GlyphClass::Unclassified,
        }
    }
}

/// TrueType quadratic outline data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrueTypeOutline {
    pub points: Vec<GlyphPoint>,
    /// Index of the last point of each contour
    pub contour_end_indices: Vec<u16>,
    /// Raw hinting bytecode, never interpreted
    pub instructions: Vec<u8>,
}

impl TrueTypeOutline {
    /// Apply a 2x2 matrix as a *normal* transform.
    ///
    /// `x' = x*m00 + y*m10`, `y' = x*m01 + y*m11`, rounded half to even.
    /// The returned bounds start their accumulators at zero, so they always
    /// contain the origin.
    pub(crate) fn transform_normal(&mut self, m00: f32, m01: f32, m10: f32, m11: f32) -> Bounds {
        let mut x_min: f32 = 0.0;
        let mut y_min: f32 = 0.0;
        let mut x_max: f32 = 0.0;
        let mut y_max: f32 = 0.0;

        for point in self.points.iter_mut() {
            let (x, y) = (point.x, point.y);
            let new_x = ((x * m00) + (y * m10)).round_ties_even();
            let new_y = ((x * m01) + (y * m11)).round_ties_even();
            *point = GlyphPoint::new(new_x, new_y, point.on_curve);

            x_min = x_min.min(new_x);
            x_max = x_max.max(new_x);
            y_min = y_min.min(new_y);
            y_max = y_max.max(new_y);
        }

        Bounds::new(x_min as i16, y_min as i16, x_max as i16, y_max as i16)
    }

    /// Translate every point and return the shifted bounds
    pub(crate) fn offset(&mut self, bounds: Bounds, dx: i16, dy: i16) -> Bounds {
        for point in self.points.iter_mut() {
            *point = point.offset(dx, dy);
        }
        Bounds::new(
            bounds.x_min.wrapping_add(dx),
            bounds.y_min.wrapping_add(dy),
            bounds.x_max.wrapping_add(dx),
            bounds.y_max.wrapping_add(dy),
        )
    }

    /// Concatenate `other`'s contours after ours, shifting its end indices
    pub(crate) fn append(&mut self, other: TrueTypeOutline) {
        let shift = self
            .contour_end_indices
            .last()
            .map(|last| last.wrapping_add(1))
            .unwrap_or(0);
        self.points.extend(other.points);
        self.contour_end_indices.extend(
            other
                .contour_end_indices
                .into_iter()
                .map(|end| end.wrapping_add(shift)),
        );
    }
}

/// Which source a glyph's shape comes from
#[derive(Debug, Clone, PartialEq)]
pub enum GlyphData {
    TrueType(TrueTypeOutline),
    /// Outline lives in a CFF/CFF2 charstring program
    Cff,
    /// Outline lives in an embedded bitmap strike
    Bitmap,
    /// No outline: empty glyphs and trimmed TrueType glyphs
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    index: u16,
    bounds: Bounds,
    advance_width: Option<u16>,
    class: GlyphClass,
    data: GlyphData,
}

impl Glyph {
    pub(crate) fn new(index: u16, bounds: Bounds, data: GlyphData) -> Self {
        Self {
            index,
            bounds,
            advance_width: None,
            class: GlyphClass::Unclassified,
            data,
        }
    }

    pub(crate) fn blank(index: u16) -> Self {
        Self::new(index, Bounds::ZERO, GlyphData::Blank)
    }

    /// Copy of this glyph carrying only layout metadata
    pub(crate) fn trimmed(&self) -> Self {
        let data = match self.data {
            GlyphData::TrueType(_) | GlyphData::Blank => GlyphData::Blank,
            GlyphData::Cff => GlyphData::Cff,
            GlyphData::Bitmap => GlyphData::Bitmap,
        };
        Self {
            index: self.index,
            bounds: self.bounds,
            advance_width: self.advance_width,
            class: self.class,
            data,
        }
    }

    pub(crate) fn set_metrics(&mut self, advance_width: Option<u16>, class: GlyphClass) {
        self.advance_width = advance_width;
        self.class = class;
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn advance_width(&self) -> Option<u16> {
        self.advance_width
    }

    pub fn class(&self) -> GlyphClass {
        self.class
    }

    pub fn data(&self) -> &GlyphData {
        &self.data
    }

    pub fn outline(&self) -> Option<&TrueTypeOutline> {
        match &self.data {
            GlyphData::TrueType(outline) => Some(outline),
            _ => None,
        }
    }

    /// Outline points, empty for anything but a TrueType glyph
    pub fn points(&self) -> &[GlyphPoint] {
        self.outline()
            .map(|outline| outline.points.as_slice())
            .unwrap_or_default()
    }

    pub fn contour_end_indices(&self) -> &[u16] {
        self.outline()
            .map(|outline| outline.contour_end_indices.as_slice())
            .unwrap_or_default()
    }

    pub fn instructions(&self) -> &[u8] {
        self.outline()
            .map(|outline| outline.instructions.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square(size: f32) -> TrueTypeOutline {
        TrueTypeOutline {
            points: vec![
                GlyphPoint::new(0.0, 0.0, true),
                GlyphPoint::new(size, 0.0, true),
                GlyphPoint::new(size, size, true),
                GlyphPoint::new(0.0, size, true),
            ],
            contour_end_indices: vec![3],
            instructions: vec![],
        }
    }

    #[test]
    fn transform_normal_uses_column_layout() {
        let mut outline = TrueTypeOutline {
            points: vec![GlyphPoint::new(10.0, 20.0, true)],
            contour_end_indices: vec![0],
            instructions: vec![],
        };
        // x' = x*m00 + y*m10, y' = x*m01 + y*m11
        let bounds = outline.transform_normal(1.0, 0.5, 0.25, 2.0);
        assert_eq!(outline.points[0], GlyphPoint::new(15.0, 45.0, true));
        // accumulators start at zero
        assert_eq!(bounds, Bounds::new(0, 0, 15, 45));
    }

    #[test]
    fn transform_normal_rounds() {
        let mut outline = square(3.0);
        let bounds = outline.transform_normal(0.5, 0.0, 0.0, 0.5);
        assert_eq!(outline.points[2], GlyphPoint::new(2.0, 2.0, true));
        assert_eq!(bounds, Bounds::new(0, 0, 2, 2));

        // ties go to the even neighbour
        let mut outline = square(5.0);
        outline.transform_normal(0.5, 0.0, 0.0, 0.5);
        assert_eq!(outline.points[2], GlyphPoint::new(2.0, 2.0, true));
    }

    #[test]
    fn offset_moves_points_and_bounds() {
        let mut outline = square(10.0);
        let bounds = outline.offset(Bounds::new(0, 0, 10, 10), 5, -3);
        assert_eq!(outline.points[0], GlyphPoint::new(5.0, -3.0, true));
        assert_eq!(bounds, Bounds::new(5, -3, 15, 7));
    }

    #[test]
    fn append_shifts_contour_ends() {
        let mut first = square(10.0);
        let mut second = square(5.0);
        second.contour_end_indices = vec![1, 3];
        first.append(second);
        assert_eq!(first.points.len(), 8);
        assert_eq!(first.contour_end_indices, vec![3, 5, 7]);
    }

    #[test]
    fn bounds_from_points() {
        let outline = square(7.0);
        assert_eq!(Bounds::from_points(&outline.points), Bounds::new(0, 0, 7, 7));
        assert_eq!(Bounds::from_points(&[]), Bounds::ZERO);
    }

    #[test]
    fn trimming_keeps_metadata_only() {
        let mut glyph = Glyph::new(
            4,
            Bounds::new(1, 2, 3, 4),
            GlyphData::TrueType(square(3.0)),
        );
        glyph.set_metrics(Some(500), GlyphClass::Mark);
        let trimmed = glyph.trimmed();
        assert_eq!(trimmed.index(), 4);
        assert_eq!(trimmed.bounds(), glyph.bounds());
        assert_eq!(trimmed.advance_width(), Some(500));
        assert_eq!(trimmed.class(), GlyphClass::Mark);
        assert_eq!(trimmed.data(), &GlyphData::Blank);
        assert!(trimmed.points().is_empty());
    }
}
