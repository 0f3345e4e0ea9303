//! WOFF (version 1) unwrapping
//!
//! Each table is an independent zlib stream, stored raw when compression
//! would not shrink it.
//!
//! <https://www.w3.org/TR/WOFF/>

use log::debug;

use crate::decompress::Decompressors;
use crate::error::{Codec, FontError, bail_if};
use crate::sfnt::SfntBuilder;
use crate::woff2::header::{Woff1TableDirectoryEntry, WoffHeader, WoffVersion};

/// Unwrap a WOFF file into sfnt bytes
///
/// Table data and directory checksums are reproduced exactly, so the head
/// table is not rewritten.
pub fn decompress_woff1(
    raw_woff_data: &[u8],
    decompressors: &Decompressors,
) -> Result<Vec<u8>, FontError> {
    let mut input = raw_woff_data;

    let header = WoffHeader::parse(&mut input)?;
    bail_if!(header.woff_version != WoffVersion::Woff1, "not a WOFF file");

    let mut tables = (0..header.num_tables)
        .map(|_| Woff1TableDirectoryEntry::parse(&mut input))
        .collect::<Result<Vec<_>, _>>()?;

    // Table data is laid out in the order it appears in the WOFF file
    tables.sort_by_key(|table| table.offset);

    let mut builder = SfntBuilder::new(header.flavor);
    for table in &tables {
        let table_data = table.data_as_slice(raw_woff_data)?;
        let data = if table.is_compressed() {
            let decompressed =
                decompressors.decompress(Codec::Zlib, table_data, table.orig_length as usize)?;
            bail_if!(
                decompressed.len() != table.orig_length as usize,
                "WOFF table decompressed to the wrong length"
            );
            decompressed
        } else {
            table_data.to_vec()
        };
        builder.add_table_with_checksum(table.tag, data, table.orig_checksum);
    }

    debug!(
        "woff: unwrapped {} tables for flavor '{}'",
        builder.num_tables(),
        header.flavor
    );
    Ok(builder.build(false))
}
