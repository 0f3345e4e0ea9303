//! Reading whole fonts
//!
//! [`OpenFontReader`] detects the container, unwraps WOFF and WOFF2 into a
//! plain sfnt stream, and then decodes tables in dependency order: OS/2,
//! name, head, maxp, hhea, then hmtx, cmap, loca and glyf (or CFF), post, and
//! finally the optional GDEF, gasp and hinting tables.

use std::borrow::Cow;

use font_types::Tag;
use log::debug;
use once_cell::unsync::OnceCell;

use crate::buffer::Buffer;
use crate::decompress::Decompressors;
use crate::directory::{CollectionHeader, FontKind, TableDirectory};
use crate::error::{FontError, Unsupported, bail, bail_if};
use crate::glyph::{Bounds, Glyph, GlyphData};
use crate::preview::PreviewFontInfo;
use crate::table_tags::{CBLC, CFF, CFF2, COLR, CPAL, CVT, EBLC, FPGM, GLYF, HMTX, LOCA, PREP, SVG};
use crate::tables::FontTable;
use crate::tables::cmap::Cmap;
use crate::tables::gasp::Gasp;
use crate::tables::gdef::Gdef;
use crate::tables::glyf::{DEFAULT_MAX_COMPOSITE_DEPTH, read_glyphs};
use crate::tables::head::Head;
use crate::tables::hhea::HorizontalHeader;
use crate::tables::hmtx::HorizontalMetrics;
use crate::tables::loca::GlyphLocations;
use crate::tables::maxp::MaxProfile;
use crate::tables::name::Names;
use crate::tables::os2::Os2;
use crate::tables::post::Post;
use crate::trim::TrimMode;
use crate::typeface::{HintPrograms, OutlineFormat, TablePresence, Typeface};
use crate::woff::decompress_woff1;
use crate::woff2::decompress_woff2;

/// Font reader configuration
#[derive(Debug)]
pub struct OpenFontReader {
    decompressors: Decompressors,
    max_composite_depth: usize,
}

impl Default for OpenFontReader {
    fn default() -> Self {
        Self {
            decompressors: Decompressors::default(),
            max_composite_depth: DEFAULT_MAX_COMPOSITE_DEPTH,
        }
    }
}

impl OpenFontReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the codecs used to unwrap WOFF and WOFF2
    pub fn with_decompressors(mut self, decompressors: Decompressors) -> Self {
        self.decompressors = decompressors;
        self
    }

    /// Bound on nested composite glyph references
    pub fn with_max_composite_depth(mut self, max_composite_depth: usize) -> Self {
        self.max_composite_depth = max_composite_depth;
        self
    }

    pub fn decompressors(&self) -> &Decompressors {
        &self.decompressors
    }

    pub fn max_composite_depth(&self) -> usize {
        self.max_composite_depth
    }

    /// Detect the container and unwrap web fonts into sfnt bytes.
    /// Plain sfnt and collection data is borrowed as is.
    pub fn unwrap<'a>(&self, data: &'a [u8]) -> Result<(FontKind, Cow<'a, [u8]>), FontError> {
        let kind = FontKind::detect(data)?;
        let sfnt = match kind {
            FontKind::Woff => Cow::Owned(decompress_woff1(data, &self.decompressors)?),
            FontKind::Woff2 => Cow::Owned(decompress_woff2(data, &self.decompressors)?),
            FontKind::Sfnt | FontKind::Collection => Cow::Borrowed(data),
        };
        debug!("{kind:?} font, {} sfnt bytes", sfnt.len());
        Ok((kind, sfnt))
    }

    /// Decode a single font from sfnt, WOFF or WOFF2 data.
    ///
    /// Collections are refused; use [`read_preview`](Self::read_preview) to
    /// list their members and [`read_collection_member`](Self::read_collection_member)
    /// to decode one.
    pub fn read(&self, data: &[u8]) -> Result<Typeface, FontError> {
        let (kind, sfnt) = self.unwrap(data)?;
        bail_if!(
            kind == FontKind::Collection,
            FontError::UnsupportedFormat(Unsupported::FontCollection)
        );
        self.read_at(&sfnt, 0)
    }

    /// Decode member `index` of a TrueType Collection
    pub fn read_collection_member(&self, data: &[u8], index: usize) -> Result<Typeface, FontError> {
        let header = CollectionHeader::read(data)?;
        let Some(&offset) = header.offsets.get(index) else {
            bail!(FontError::MalformedFont("collection member index out of range"));
        };
        self.read_at(data, offset as usize)
    }

    /// Read only naming and style information.
    ///
    /// For a collection this returns one entry whose members describe each font.
    pub fn read_preview(&self, data: &[u8]) -> Result<PreviewFontInfo, FontError> {
        let (kind, sfnt) = self.unwrap(data)?;
        if kind != FontKind::Collection {
            return preview_at(&sfnt, 0, kind.is_web_font());
        }

        let header = CollectionHeader::read(&sfnt)?;
        let members = header
            .offsets
            .iter()
            .map(|&offset| preview_at(&sfnt, offset as usize, false))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PreviewFontInfo::collection(members))
    }

    fn read_at(&self, data: &[u8], offset: usize) -> Result<Typeface, FontError> {
        let tables = FontTables::new(data, TableDirectory::read(data, offset)?);

        tables.os2()?;
        tables.names()?;
        tables.head()?;
        bail_if!(tables.maxp()?.num_glyphs == 0, "font has no glyphs");
        tables.hhea()?;
        tables.hmtx()?;
        tables.cmap()?;
        let (glyphs, outline_format) =
            tables.glyphs(tables.head()?, tables.maxp()?, self.max_composite_depth)?;
        tables.post()?;
        let glyphs = finish_glyphs(glyphs, tables.hmtx()?, tables.gdef()?);
        tables.gasp()?;
        let hints = match outline_format {
            OutlineFormat::TrueType => HintPrograms {
                control_values: tables.control_values()?,
                font_program: tables.program(FPGM)?,
                prep_program: tables.program(PREP)?,
            },
            OutlineFormat::Cff | OutlineFormat::Bitmap => HintPrograms::default(),
        };

        let presence = tables.presence();
        let table_headers = tables.directory.headers().to_vec();
        debug!(
            "read '{}': {} glyphs, {:?} outlines",
            tables.names()?.family_name(),
            glyphs.len(),
            outline_format
        );

        let FontTables {
            head,
            maxp,
            hhea,
            hmtx,
            os2,
            names,
            cmap,
            post,
            gasp,
            ..
        } = tables;
        Ok(Typeface {
            names: decoded(names)?,
            os2: os2.into_inner().flatten(),
            head: decoded(head)?,
            maxp: decoded(maxp)?,
            hhea: decoded(hhea)?,
            hmtx: decoded(hmtx)?,
            cmap: decoded(cmap)?,
            post: post.into_inner().flatten(),
            glyphs,
            outline_format,
            hints,
            gasp: gasp.into_inner().flatten(),
            presence,
            table_headers,
            stream_offset: offset,
            trim_mode: TrimMode::Full,
        })
    }
}

fn preview_at(data: &[u8], offset: usize, is_web_font: bool) -> Result<PreviewFontInfo, FontError> {
    let tables = FontTables::new(data, TableDirectory::read(data, offset)?);
    Ok(PreviewFontInfo::new(
        tables.names()?.clone(),
        tables.os2()?,
        offset,
        is_web_font,
    ))
}

fn decoded<T>(cell: OnceCell<T>) -> Result<T, FontError> {
    cell.into_inner()
        .ok_or(FontError::MalformedFont("table was not decoded"))
}

/// Attach the per-glyph advance width and GDEF class to decoded glyphs
pub(crate) fn finish_glyphs(
    glyphs: Vec<Glyph>,
    hmtx: &HorizontalMetrics,
    gdef: Option<&Gdef>,
) -> Vec<Glyph> {
    glyphs
        .into_iter()
        .map(|mut glyph| {
            let index = glyph.index();
            let class = gdef.map(|gdef| gdef.glyph_class(index)).unwrap_or_default();
            glyph.set_metrics(Some(hmtx.advance_width(index)), class);
            glyph
        })
        .collect()
}

/// The tables of one font, each decoded at most once on first request
pub(crate) struct FontTables<'a> {
    data: &'a [u8],
    directory: TableDirectory,
    head: OnceCell<Head>,
    maxp: OnceCell<MaxProfile>,
    hhea: OnceCell<HorizontalHeader>,
    hmtx: OnceCell<HorizontalMetrics>,
    os2: OnceCell<Option<Os2>>,
    names: OnceCell<Names>,
    cmap: OnceCell<Cmap>,
    post: OnceCell<Option<Post>>,
    gdef: OnceCell<Option<Gdef>>,
    gasp: OnceCell<Option<Gasp>>,
}

impl<'a> FontTables<'a> {
    pub(crate) fn new(data: &'a [u8], directory: TableDirectory) -> Self {
        Self {
            data,
            directory,
            head: OnceCell::new(),
            maxp: OnceCell::new(),
            hhea: OnceCell::new(),
            hmtx: OnceCell::new(),
            os2: OnceCell::new(),
            names: OnceCell::new(),
            cmap: OnceCell::new(),
            post: OnceCell::new(),
            gdef: OnceCell::new(),
            gasp: OnceCell::new(),
        }
    }

    fn required<'c, T: FontTable>(&'c self, cell: &'c OnceCell<T>) -> Result<&'c T, FontError> {
        cell.get_or_try_init(|| {
            let data = self.directory.table_data(self.data, T::TAG)?;
            debug!("reading '{}' ({} bytes)", T::TAG, data.len());
            T::read(data)
        })
    }

    fn optional<'c, T: FontTable>(
        &'c self,
        cell: &'c OnceCell<Option<T>>,
    ) -> Result<Option<&'c T>, FontError> {
        cell.get_or_try_init(|| {
            self.directory
                .optional_table_data(self.data, T::TAG)?
                .map(|data| {
                    debug!("reading '{}' ({} bytes)", T::TAG, data.len());
                    T::read(data)
                })
                .transpose()
        })
        .map(Option::as_ref)
    }

    pub(crate) fn head(&self) -> Result<&Head, FontError> {
        self.required(&self.head)
    }

    pub(crate) fn maxp(&self) -> Result<&MaxProfile, FontError> {
        self.required(&self.maxp)
    }

    pub(crate) fn hhea(&self) -> Result<&HorizontalHeader, FontError> {
        self.required(&self.hhea)
    }

    pub(crate) fn names(&self) -> Result<&Names, FontError> {
        self.required(&self.names)
    }

    pub(crate) fn cmap(&self) -> Result<&Cmap, FontError> {
        self.required(&self.cmap)
    }

    pub(crate) fn os2(&self) -> Result<Option<&Os2>, FontError> {
        self.optional(&self.os2)
    }

    pub(crate) fn post(&self) -> Result<Option<&Post>, FontError> {
        self.optional(&self.post)
    }

    pub(crate) fn gdef(&self) -> Result<Option<&Gdef>, FontError> {
        self.optional(&self.gdef)
    }

    pub(crate) fn gasp(&self) -> Result<Option<&Gasp>, FontError> {
        self.optional(&self.gasp)
    }

    /// Needs maxp's glyph count and hhea's metric count
    pub(crate) fn hmtx(&self) -> Result<&HorizontalMetrics, FontError> {
        self.hmtx.get_or_try_init(|| {
            let num_glyphs = self.maxp()?.num_glyphs;
            let number_of_h_metrics = self.hhea()?.number_of_h_metrics;
            let data = self.directory.table_data(self.data, HMTX)?;
            debug!("reading '{HMTX}' ({} bytes)", data.len());
            HorizontalMetrics::read(data, num_glyphs, number_of_h_metrics)
        })
    }

    /// Decode every glyph. TrueType outlines come from glyf and loca; CFF and
    /// bitmap fonts get placeholder glyphs of the matching kind.
    pub(crate) fn glyphs(
        &self,
        head: &Head,
        maxp: &MaxProfile,
        max_composite_depth: usize,
    ) -> Result<(Vec<Glyph>, OutlineFormat), FontError> {
        if let Some(glyf) = self.directory.optional_table_data(self.data, GLYF)? {
            let loca_data = self.directory.table_data(self.data, LOCA)?;
            let loca =
                GlyphLocations::read(loca_data, maxp.num_glyphs, head.wide_glyph_locations())?;
            debug!("reading '{GLYF}' ({} bytes)", glyf.len());
            let glyphs = read_glyphs(glyf, &loca, max_composite_depth)?;
            return Ok((glyphs, OutlineFormat::TrueType));
        }

        let (format, data) = if self.directory.contains(CFF) || self.directory.contains(CFF2) {
            (OutlineFormat::Cff, GlyphData::Cff)
        } else if self.directory.contains(EBLC) || self.directory.contains(CBLC) {
            (OutlineFormat::Bitmap, GlyphData::Bitmap)
        } else {
            bail!(FontError::MissingRequiredTable(GLYF));
        };
        debug!("{format:?} font with {} glyphs", maxp.num_glyphs);
        let glyphs = (0..maxp.num_glyphs)
            .map(|index| Glyph::new(index, Bounds::ZERO, data.clone()))
            .collect();
        Ok((glyphs, format))
    }

    /// The cvt table as FWORDs
    pub(crate) fn control_values(&self) -> Result<Option<Vec<i16>>, FontError> {
        self.directory
            .optional_table_data(self.data, CVT)?
            .map(|data| Buffer::new(data).read_i16_array(data.len() / 2))
            .transpose()
    }

    /// Raw bytes of a hinting program table
    pub(crate) fn program(&self, tag: Tag) -> Result<Option<Vec<u8>>, FontError> {
        Ok(self
            .directory
            .optional_table_data(self.data, tag)?
            .map(<[u8]>::to_vec))
    }

    pub(crate) fn presence(&self) -> TablePresence {
        TablePresence {
            svg: self.directory.contains(SVG),
            colr: self.directory.contains(COLR),
            cpal: self.directory.contains(CPAL),
            bitmap: self.directory.contains(EBLC) || self.directory.contains(CBLC),
        }
    }
}
