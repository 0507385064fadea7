// This file is part of the shakmaty-mtb library.
// Copyright (C) 2019-2020 Niklas Fiekas <niklas.fiekas@backscattering.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! Raw LZMA1 block codec.
//!
//! MTB payloads are split into 4 KiB blocks, each compressed as a bare
//! LZMA1 stream with fixed properties lc=3, lp=0, pb=2 and a 16 MiB
//! dictionary (property bytes `93, 0, 0, 0, 1`). Blocks that did not
//! shrink are stored verbatim, marked by the high bit of their block
//! table entry.

use xz2::stream::{Action, Filters, LzmaOptions, Status, Stream};

use crate::errors::MtbResult;

/// Uncompressed size of a payload block.
pub const BLOCK_SIZE: usize = 4096;

/// Set on a block table entry if the block is stored uncompressed.
pub const UNCOMPRESS_BIT: u32 = 1 << 31;

const DICT_SIZE: u32 = 1 << 24;

fn lzma1_filters() -> MtbResult<Filters> {
    let mut options = LzmaOptions::new_preset(6)?;
    options
        .dict_size(DICT_SIZE)
        .literal_context_bits(3)
        .literal_position_bits(0)
        .position_bits(2);

    let mut filters = Filters::new();
    filters.lzma1(&options);
    Ok(filters)
}

/// Decode a single raw LZMA1 stream into `dst`, returning the number of
/// bytes written. Decoding stops when `dst` is full.
pub fn decompress(src: &[u8], dst: &mut [u8]) -> MtbResult<usize> {
    let mut stream = Stream::new_raw_decoder(&lzma1_filters()?)?;

    let mut consumed = 0;
    let mut written = 0;

    loop {
        let status = stream.process(&src[consumed..], &mut dst[written..], Action::Run)?;

        let stalled =
            stream.total_in() as usize == consumed && stream.total_out() as usize == written;
        consumed = stream.total_in() as usize;
        written = stream.total_out() as usize;

        if matches!(status, Status::StreamEnd) || written == dst.len() || stalled {
            return Ok(written);
        }
    }
}

/// Decode a whole block-compressed payload. `block_table[i]` is the
/// cumulative compressed end offset of block `i`, with `UNCOMPRESS_BIT`
/// marking verbatim blocks.
pub fn decompress_all_blocks(
    block_table: &[u32],
    src: &[u8],
    dst: &mut [u8],
) -> MtbResult<usize> {
    let mut offset = 0;
    let mut written = 0;

    for (i, &entry) in block_table.iter().enumerate() {
        let end = (entry & !UNCOMPRESS_BIT) as usize;
        ensure!(end >= offset);
        let block = u!(src.get(offset..end));

        if entry & UNCOMPRESS_BIT != 0 {
            u!(dst.get_mut(written..written + block.len())).copy_from_slice(block);
            written += block.len();
        } else {
            let capacity = BLOCK_SIZE.min(dst.len() - written);
            let n = decompress(block, &mut dst[written..written + capacity])?;
            ensure!(n == capacity || i + 1 == block_table.len());
            written += n;
        }

        offset = end;
    }

    Ok(written)
}
