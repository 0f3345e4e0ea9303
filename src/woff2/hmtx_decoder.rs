//! Reversal of the WOFF2 hmtx transform
//!
//! <https://www.w3.org/TR/WOFF2/#hmtx_table_format>

use bytes::{Buf, BufMut};

use crate::error::{FontError, bail_if};

/// Decode a transformed hmtx table into a plain one
///
/// Left side bearings left out by the encoder are the glyphs' xMin values.
pub(crate) fn reconstruct_hmtx(
    mut input: &[u8],
    num_glyphs: u16,
    num_hmetrics: u16,
    x_mins: &[i16],
) -> Result<Vec<u8>, FontError> {
    let hmtx_flags = input.try_get_u8()?;
    let has_proportional_lsbs = (hmtx_flags & 1) == 0;
    let has_monospace_lsbs = (hmtx_flags & 2) == 0;

    bail_if!(
        (hmtx_flags & 0xFC) != 0,
        "illegal hmtx flags; bits 2-7 must be 0"
    );
    // you say you transformed but there is little evidence of it
    bail_if!(
        has_proportional_lsbs && has_monospace_lsbs,
        "transformed hmtx omits no side bearings"
    );
    bail_if!(
        x_mins.len() != num_glyphs as usize,
        "hmtx and glyf disagree on the glyph count"
    );
    bail_if!(
        num_hmetrics > num_glyphs,
        "more horizontal metrics than glyphs"
    );
    // "...only one entry need be in the array, but that entry is required."
    bail_if!(num_hmetrics < 1, "hmtx needs at least one metric");

    let mut advance_widths: Vec<u16> = Vec::with_capacity(num_hmetrics as usize);
    for _ in 0..num_hmetrics {
        advance_widths.push(input.try_get_u16()?);
    }

    let mut lsbs: Vec<i16> = Vec::with_capacity(num_glyphs as usize);
    for i in 0..num_hmetrics as usize {
        lsbs.push(match has_proportional_lsbs {
            true => input.try_get_i16()?,
            false => x_mins[i],
        });
    }
    for i in num_hmetrics as usize..num_glyphs as usize {
        lsbs.push(match has_monospace_lsbs {
            true => input.try_get_i16()?,
            false => x_mins[i],
        });
    }

    let mut hmtx: Vec<u8> = Vec::with_capacity(2 * num_glyphs as usize + 2 * num_hmetrics as usize);
    for (i, lsb) in lsbs.into_iter().enumerate() {
        if let Some(advance_width) = advance_widths.get(i) {
            hmtx.put_u16(*advance_width);
        }
        hmtx.put_i16(lsb);
    }
    Ok(hmtx)
}
