//! WOFF2 unwrapping
//!
//! The Brotli payload is decompressed with the injected codec, transformed
//! tables are reversed and everything is re-assembled into a plain sfnt
//! stream for the ordinary table reader.
//!
//! <https://www.w3.org/TR/WOFF2/>

pub(crate) mod glyf_decoder;
pub mod header;
pub(crate) mod hmtx_decoder;

use bytes::Buf as _;
use log::debug;

use crate::decompress::Decompressors;
use crate::error::{Codec, FontError, Unsupported, bail, bail_if, bail_with_msg_if};
use crate::sfnt::SfntBuilder;
use crate::table_tags::{GLYF, HHEA, HMTX, LOCA};

use self::glyf_decoder::reconstruct_glyf_and_loca;
use self::header::{WoffHeader, WoffVersion, Woff2TableDirectoryEntry, parse_table_directory};
use self::hmtx_decoder::reconstruct_hmtx;

// Over 14k test fonts the max compression ratio seen to date was ~20.
// >100 suggests you wrote a bad uncompressed size.
const MAX_PLAUSIBLE_COMPRESSION_RATIO: f32 = 100.0;

/// Offset of numberOfHMetrics in hhea
const HHEA_NUM_HMETRICS_OFFSET: usize = 34;

/// Unwrap a WOFF2 file into sfnt bytes
pub fn decompress_woff2(
    raw_woff_data: &[u8],
    decompressors: &Decompressors,
) -> Result<Vec<u8>, FontError> {
    // `input` is advanced past each parsed structure; `raw_woff_data` keeps the whole file
    let mut input = raw_woff_data;

    let header = WoffHeader::parse(&mut input)?;
    bail_if!(header.woff_version != WoffVersion::Woff2, "not a WOFF2 file");
    bail_if!(
        header.is_collection(),
        FontError::UnsupportedFormat(Unsupported::Woff2Collection)
    );

    let mut tables = parse_table_directory(&mut input, header.num_tables as usize)?;
    for table in &tables {
        table.check_transform()?;
    }

    bail_if!(header.total_sfnt_size < 1, "WOFF2 declares an empty font");
    let compression_ratio = header.total_sfnt_size as f32 / raw_woff_data.len() as f32;
    bail_with_msg_if!(
        compression_ratio > MAX_PLAUSIBLE_COMPRESSION_RATIO,
        FontError::MalformedFont("implausible WOFF2 compression ratio"),
        "Implausible compression ratio {:.1}",
        compression_ratio
    );

    let compressed_data = input
        .get(..header.total_compressed_size as usize)
        .ok_or(FontError::MalformedFont("WOFF2 compressed block is truncated"))?;
    let decompressed = decompressors.decompress(
        Codec::Brotli,
        compressed_data,
        header.total_sfnt_size as usize,
    )?;
    debug!(
        "woff2: {} tables, {} compressed bytes -> {} bytes",
        tables.len(),
        compressed_data.len(),
        decompressed.len()
    );

    reconstruct_font(&decompressed, &header, &mut tables)
}

fn find_table(tables: &[Woff2TableDirectoryEntry], tag: font_types::Tag) -> Option<&Woff2TableDirectoryEntry> {
    tables.iter().find(|table| table.tag == tag)
}

fn reconstruct_font(
    woff_data: &[u8],
    header: &WoffHeader,
    tables: &mut [Woff2TableDirectoryEntry],
) -> Result<Vec<u8>, FontError> {
    // glyf without loca does not make sense
    match (find_table(tables, GLYF), find_table(tables, LOCA)) {
        (Some(glyf), Some(loca)) => {
            bail_if!(
                glyf.is_transformed() != loca.is_transformed(),
                "cannot transform just one of glyf/loca"
            );
        }
        (Some(_), None) | (None, Some(_)) => bail!(FontError::MalformedFont(
            "cannot have just one of glyf/loca"
        )),
        (None, None) => {}
    }

    let num_hmetrics = match find_table(tables, HHEA) {
        Some(hhea) => {
            let mut hhea_data = hhea.data_as_slice(woff_data)?;
            bail_if!(
                hhea_data.len() < HHEA_NUM_HMETRICS_OFFSET + 2,
                "hhea is truncated"
            );
            hhea_data.advance(HHEA_NUM_HMETRICS_OFFSET);
            Some(hhea_data.try_get_u16()?)
        }
        None => None,
    };

    // Sorted by tag, glyf is reconstructed before hmtx needs its xMin values
    tables.sort_by_key(|table| table.tag);

    let mut builder = SfntBuilder::new(header.flavor);
    let mut glyph_x_mins: Option<(u16, Vec<i16>)> = None;

    for table in tables.iter() {
        let table_data = table.data_as_slice(woff_data)?;
        if !table.is_transformed() {
            builder.add_table(table.tag, table_data.to_vec());
        } else if table.tag == GLYF {
            let rebuilt = reconstruct_glyf_and_loca(table_data)?;
            glyph_x_mins = Some((rebuilt.num_glyphs, rebuilt.x_mins));
            builder.add_table(GLYF, rebuilt.glyf);
            builder.add_table(LOCA, rebuilt.loca);
        } else if table.tag == LOCA {
            // produced together with glyf
        } else if table.tag == HMTX {
            let Some((num_glyphs, x_mins)) = glyph_x_mins.as_ref() else {
                bail!(FontError::MalformedFont(
                    "transformed hmtx needs a transformed glyf"
                ));
            };
            let num_hmetrics =
                num_hmetrics.ok_or(FontError::MissingRequiredTable(HHEA))?;
            let hmtx = reconstruct_hmtx(table_data, *num_glyphs, num_hmetrics, x_mins)?;
            builder.add_table(HMTX, hmtx);
        } else {
            bail!(FontError::UnsupportedFormat(Unsupported::Woff2Transform(
                table.tag,
                table.format
            )));
        }
    }

    Ok(builder.build(true))
}
