/* Copyright 2014 Google Inc. All Rights Reserved.

   Distributed under MIT license.
   See file LICENSE for detail or copy at https://opensource.org/licenses/MIT
*/

//! Checksums and synthetic sfnt assembly
//!
//! The WOFF and WOFF2 unwrap layers re-synthesise a plain sfnt stream so that
//! the ordinary table directory reader and table decoders apply unmodified.

use bytes::BufMut;
use font_types::Tag;

use crate::Round4;
use crate::table_tags::HEAD;

pub const SFNT_HEADER_SIZE: usize = 12;
pub const SFNT_ENTRY_SIZE: usize = 16;

/// Offset of `checkSumAdjustment` within the head table
const HEAD_CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Compute the OpenType checksum of a table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums>
pub fn compute_checksum(buf: &[u8]) -> u32 {
    let mut checksum: u32 = 0;
    let mut iter = buf.chunks_exact(4);
    for chunk in &mut iter {
        checksum = checksum.wrapping_add(u32::from_be_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3],
        ]));
    }

    // Treat size not aligned on 4 as if it were padded to 4 with 0's.
    let remainder = iter.remainder();
    if !remainder.is_empty() {
        let mut last = [0u8; 4];
        last[..remainder.len()].copy_from_slice(remainder);
        checksum = checksum.wrapping_add(u32::from_be_bytes(last));
    }

    checksum
}

/// Writes an OpenType table directory header
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory>
pub(crate) fn write_table_directory_header(output: &mut impl BufMut, flavor: Tag, num_tables: u16) {
    let mut max_pow2: u16 = 0;
    while 1u32 << (max_pow2 + 1) <= (num_tables as u32) {
        max_pow2 += 1;
    }
    let entry_selector = max_pow2;
    let search_range: u16 = (1u16 << max_pow2) << 4;
    let range_shift = ((num_tables as u32) << 4).saturating_sub(search_range as u32) as u16;

    output.put_slice(&flavor.to_be_bytes()); // sfnt version
    output.put_u16(num_tables);
    output.put_u16(search_range);
    output.put_u16(entry_selector);
    output.put_u16(range_shift);
}

struct PendingTable {
    tag: Tag,
    data: Vec<u8>,
    checksum: Option<u32>,
}

/// Assembles tables into a single sfnt stream
///
/// Table data is laid out in insertion order, each table padded to four
/// bytes. Directory records are sorted by tag.
pub(crate) struct SfntBuilder {
    flavor: Tag,
    tables: Vec<PendingTable>,
}

impl SfntBuilder {
    pub fn new(flavor: Tag) -> Self {
        Self {
            flavor,
            tables: Vec::new(),
        }
    }

    pub fn add_table(&mut self, tag: Tag, data: Vec<u8>) {
        self.tables.push(PendingTable {
            tag,
            data,
            checksum: None,
        });
    }

    /// Add a table whose directory checksum is already known
    pub fn add_table_with_checksum(&mut self, tag: Tag, data: Vec<u8>, checksum: u32) {
        self.tables.push(PendingTable {
            tag,
            data,
            checksum: Some(checksum),
        });
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Produce the sfnt bytes. When `adjust_head_checksum` is set the head
    /// table's `checkSumAdjustment` is rewritten for the new layout.
    pub fn build(self, adjust_head_checksum: bool) -> Vec<u8> {
        let num_tables = self.tables.len();
        let header_size = SFNT_HEADER_SIZE + SFNT_ENTRY_SIZE * num_tables;
        let data_size: usize = self
            .tables
            .iter()
            .map(|table| Round4!(table.data.len()))
            .sum();

        let mut out: Vec<u8> = Vec::with_capacity(header_size + data_size);
        write_table_directory_header(&mut out, self.flavor, num_tables as u16);
        out.resize(header_size, 0);

        struct Record {
            tag: Tag,
            checksum: u32,
            offset: u32,
            length: u32,
        }
        let mut records: Vec<Record> = Vec::with_capacity(num_tables);
        let mut head_offset: Option<usize> = None;

        for mut table in self.tables {
            let offset = out.len();
            if table.tag == HEAD {
                head_offset = Some(offset);
                if adjust_head_checksum && table.data.len() >= HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4 {
                    // checksums are computed with the adjustment zeroed
                    table.data[HEAD_CHECKSUM_ADJUSTMENT_OFFSET..HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4]
                        .fill(0);
                    table.checksum = None;
                }
            }
            let checksum = table
                .checksum
                .unwrap_or_else(|| compute_checksum(&table.data));
            records.push(Record {
                tag: table.tag,
                checksum,
                offset: offset as u32,
                length: table.data.len() as u32,
            });
            out.extend_from_slice(&table.data);
            out.resize(Round4!(out.len()), 0);
        }

        records.sort_by_key(|record| record.tag);
        let mut writer = &mut out[SFNT_HEADER_SIZE..header_size];
        for record in &records {
            writer.put_slice(&record.tag.to_be_bytes());
            writer.put_u32(record.checksum);
            writer.put_u32(record.offset);
            writer.put_u32(record.length);
        }

        if let (true, Some(head_offset)) = (adjust_head_checksum, head_offset) {
            let position = head_offset + HEAD_CHECKSUM_ADJUSTMENT_OFFSET;
            if position + 4 <= out.len() {
                let adjustment = CHECKSUM_MAGIC.wrapping_sub(compute_checksum(&out));
                out[position..position + 4].copy_from_slice(&adjustment.to_be_bytes());
            }
        }

        out
    }
}
