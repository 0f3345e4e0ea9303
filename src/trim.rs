//! Trimming a typeface down to layout metadata and restoring it later
//!
//! Trimming replaces every glyph with a copy that keeps only bounds, advance
//! width and class, and drops the hinting data. The returned
//! [`RestoreTicket`] remembers which optional tables were present so a restore
//! re-reads exactly those from the original bytes.

use log::debug;

use crate::directory::{TableDirectory, TableHeader};
use crate::error::{FontError, bail_if};
use crate::glyph::Glyph;
use crate::reader::{FontTables, OpenFontReader};
use crate::table_tags::{FPGM, PREP};
use crate::typeface::{HintPrograms, OutlineFormat, Typeface};

/// How much glyph construction detail a typeface holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrimMode {
    /// As read: every decoded outline and program is resident
    #[default]
    Full,
    /// Only what layout needs
    EssentialLayoutInfo,
    /// Detail reloaded after a trim
    Restored,
}

/// What a trimmed typeface needs to reload its detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTicket {
    family_name: String,
    headers: Vec<TableHeader>,
    has_ttf: bool,
    has_cff: bool,
    has_svg: bool,
    has_bitmap: bool,
    control_values: bool,
    font_program: bool,
    prep_program: bool,
    gasp: bool,
    colr: bool,
    cpal: bool,
}

impl RestoreTicket {
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// The table directory the trimmed font was read from
    pub fn headers(&self) -> &[TableHeader] {
        &self.headers
    }
}

impl Typeface {
    pub fn trim_mode(&self) -> TrimMode {
        self.trim_mode
    }

    pub fn is_trimmed(&self) -> bool {
        self.trim_mode == TrimMode::EssentialLayoutInfo
    }

    /// Drop outlines and hinting data, keeping layout metadata.
    ///
    /// Returns `None` when the typeface is already trimmed.
    pub fn trim(&mut self) -> Option<RestoreTicket> {
        if self.is_trimmed() {
            return None;
        }

        let ticket = RestoreTicket {
            family_name: self.family_name().to_owned(),
            headers: self.table_headers.clone(),
            has_ttf: self.outline_format == OutlineFormat::TrueType,
            has_cff: self.outline_format == OutlineFormat::Cff,
            has_svg: self.presence.svg,
            has_bitmap: self.presence.bitmap,
            control_values: self.hints.control_values.is_some(),
            font_program: self.hints.font_program.is_some(),
            prep_program: self.hints.prep_program.is_some(),
            gasp: self.gasp.is_some(),
            colr: self.presence.colr,
            cpal: self.presence.cpal,
        };

        self.glyphs = self.glyphs.iter().map(Glyph::trimmed).collect();
        self.hints = HintPrograms::default();
        self.gasp = None;
        self.trim_mode = TrimMode::EssentialLayoutInfo;
        debug!("trimmed '{}' ({} glyphs)", ticket.family_name, self.glyphs.len());
        Some(ticket)
    }

    /// Reload what [`trim`](Self::trim) dropped, using the default reader
    pub fn restore(&mut self, ticket: &RestoreTicket, data: &[u8]) -> Result<(), FontError> {
        OpenFontReader::new().restore(self, ticket, data)
    }
}

impl OpenFontReader {
    /// Reload a trimmed typeface from the bytes it was read from.
    ///
    /// The table directory found in `data` must equal the one the typeface
    /// was read from, record by record. A typeface that is not trimmed is
    /// left alone.
    pub fn restore(
        &self,
        typeface: &mut Typeface,
        ticket: &RestoreTicket,
        data: &[u8],
    ) -> Result<(), FontError> {
        if !typeface.is_trimmed() {
            return Ok(());
        }
        bail_if!(
            ticket.headers != typeface.table_headers,
            FontError::RestoreIntegrityError("ticket was issued for a different font")
        );

        let (_, sfnt) = self.unwrap(data)?;
        let directory = TableDirectory::read(&sfnt, typeface.stream_offset)?;
        bail_if!(
            directory.headers() != ticket.headers.as_slice(),
            FontError::RestoreIntegrityError("table directory differs from the trimmed font")
        );
        let tables = FontTables::new(&sfnt, directory);

        if ticket.has_ttf {
            let (glyphs, _) =
                tables.glyphs(&typeface.head, &typeface.maxp, self.max_composite_depth())?;
            bail_if!(
                glyphs.len() != typeface.glyphs.len(),
                FontError::RestoreIntegrityError("glyph count differs from the trimmed font")
            );
            typeface.glyphs = glyphs
                .into_iter()
                .zip(&typeface.glyphs)
                .map(|(mut glyph, trimmed)| {
                    glyph.set_metrics(trimmed.advance_width(), trimmed.class());
                    glyph
                })
                .collect();
        }

        typeface.hints = HintPrograms {
            control_values: if ticket.control_values {
                tables.control_values()?
            } else {
                None
            },
            font_program: if ticket.font_program {
                tables.program(FPGM)?
            } else {
                None
            },
            prep_program: if ticket.prep_program {
                tables.program(PREP)?
            } else {
                None
            },
        };
        typeface.gasp = if ticket.gasp {
            tables.gasp()?.cloned()
        } else {
            None
        };

        typeface.trim_mode = TrimMode::Restored;
        debug!(
            "restored '{}' (cff: {}, svg: {}, bitmap: {}, color: {})",
            ticket.family_name,
            ticket.has_cff,
            ticket.has_svg,
            ticket.has_bitmap,
            ticket.colr && ticket.cpal
        );
        Ok(())
    }
}
