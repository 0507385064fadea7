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

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use log::warn;
use positioned_io::ReadAt;

use crate::codec;
use crate::codec::{BLOCK_SIZE, UNCOMPRESS_BIT};
use crate::errors::{MtbError, MtbResult};
use crate::key::{Consts, Schema};
use crate::lazy::Lazy;
use crate::material::PieceSet;
use crate::types::{LoadMode, MemMode, Score, Side};
use crate::types::{
    SCORE_DRAW, SCORE_ILLEGAL, SCORE_MATE, SCORE_MISSING, SCORE_UNKNOWN, SCORE_UNSET,
    SCORE_WINNING,
};

/// Size of the on-disk header.
pub const HEADER_SIZE: usize = 128;

const SIGNATURE_V0: u16 = 23_456;

/// Tables at most this big are fully decoded in `MemMode::Smart`.
const SMART_MODE_THRESHOLD: u64 = 10 * 1024 * 1024;

// Cell values of the standard score range.
const TB_ILLEGAL: u8 = 0;
const TB_UNSET: u8 = 1;
const TB_MISSING: u8 = 2;
const TB_WINNING: u8 = 3;
const TB_UNKNOWN: u8 = 4;
const TB_DRAW: u8 = 5;
const TB_START_MATING: u8 = 6;
const TB_START_LOSING: u8 = 130;

// Cell values of the special score range, which spends almost the whole
// byte on distances.
const TB_SPECIAL_DRAW: u8 = 0;
const TB_SPECIAL_START_MATING: u8 = 1;
const TB_SPECIAL_START_LOSING: u8 = 128;

bitflags! {
    /// The header property bits.
    pub struct Props: u32 {
        /// A Black-to-move payload is present.
        const BLACK = 1;
        /// A White-to-move payload is present.
        const WHITE = 2;
        /// The payload is block-compressed.
        const COMPRESSED = 4;
        /// Cells use the special score range.
        const SPECIAL_SCORE_RANGE = 8;
    }
}

impl Props {
    fn side(side: Side) -> Props {
        side.fold(Props::BLACK, Props::WHITE)
    }
}

/// Decode one payload cell into a score for the side to move.
pub(crate) fn cell_to_score(cell: u8, special_range: bool) -> Score {
    if special_range {
        if cell == TB_SPECIAL_DRAW {
            SCORE_DRAW
        } else if cell < TB_SPECIAL_START_LOSING {
            let plies = i32::from(cell - TB_SPECIAL_START_MATING) * 2 + 1;
            SCORE_MATE - plies
        } else {
            let plies = i32::from(cell - TB_SPECIAL_START_LOSING) * 2;
            -SCORE_MATE + plies
        }
    } else if cell >= TB_DRAW {
        if cell == TB_DRAW {
            SCORE_DRAW
        } else if cell < TB_START_LOSING {
            let plies = i32::from(cell - TB_START_MATING) * 2 + 1;
            SCORE_MATE - plies
        } else {
            let plies = i32::from(cell - TB_START_LOSING) * 2;
            -SCORE_MATE + plies
        }
    } else {
        match cell {
            TB_MISSING => SCORE_MISSING,
            TB_WINNING => SCORE_WINNING,
            TB_UNKNOWN => SCORE_UNKNOWN,
            TB_ILLEGAL => SCORE_ILLEGAL,
            _ => SCORE_UNSET,
        }
    }
}

/// The fixed-size table file header.
#[derive(Debug, Clone)]
pub struct Header {
    pub property: Props,
    pub order: u32,
    pub dtm_max: u8,
    pub name: String,
    /// Stored checksum. Opaque: read but never verified.
    pub checksum: i64,
}

impl Header {
    fn parse(raw: &[u8; HEADER_SIZE]) -> MtbResult<Header> {
        if LittleEndian::read_u16(&raw[0..]) != SIGNATURE_V0 {
            return Err(MtbError::Magic);
        }

        let name_field = &raw[22..42];
        let len = name_field.iter().position(|&b| b == 0).unwrap_or(20);
        let name = std::str::from_utf8(&name_field[..len])
            .map_err(|_| MtbError::Magic)?
            .to_ascii_lowercase();

        Ok(Header {
            property: Props::from_bits_truncate(LittleEndian::read_u32(&raw[2..])),
            order: LittleEndian::read_u32(&raw[6..]),
            dtm_max: raw[10],
            name,
            checksum: LittleEndian::read_i64(&raw[106..]),
        })
    }

    pub fn has_side(&self, side: Side) -> bool {
        self.property.contains(Props::side(side))
    }

    pub fn is_compressed(&self) -> bool {
        self.property.contains(Props::COMPRESSED)
    }

    pub fn is_special_range(&self) -> bool {
        self.property.contains(Props::SPECIAL_SCORE_RANGE)
    }

    fn set_only_side(&mut self, side: Side) {
        self.property -= Props::BLACK | Props::WHITE;
        self.property |= Props::side(side);
    }
}

/// Header-derived state, loaded at most once per file.
#[derive(Debug)]
pub(crate) struct FileMeta {
    pub(crate) header: Header,
    /// The authoritative schema: recomputed from the header's slot
    /// permutation if it differs from the filename-derived guess.
    pub(crate) schema: Schema,
    block_tables: [Option<Vec<u32>>; 2],
}

#[derive(Debug, Default)]
struct Window {
    start: u64,
    end: u64,
    buf: Vec<u8>,
}

#[derive(Debug)]
struct SideState {
    /// Whole decoded payload in `MemMode::All`. Published once;
    /// lock-free to read afterwards.
    full: Lazy<Option<Box<[u8]>>>,
    /// Single cached block in `MemMode::Tiny`.
    window: Mutex<Window>,
}

impl SideState {
    fn new() -> SideState {
        SideState {
            full: Lazy::new(),
            window: Mutex::new(Window::default()),
        }
    }
}

/// One material signature's table: up to two single-side files on disk
/// (`<name>w` and `<name>b`) merged into one handle.
#[derive(Debug)]
pub struct MtbFile {
    name: String,
    paths: [Option<PathBuf>; 2],
    mem_mode: MemMode,
    schema: Schema,
    consts: Arc<Consts>,
    meta: Lazy<Option<FileMeta>>,
    sides: [SideState; 2],
}

/// Whether the path carries a table file extension.
pub(crate) fn known_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            ext.eq_ignore_ascii_case("mtb") || ext.eq_ignore_ascii_case("zmt")
        })
}

/// Split a file name like `krrkqw.mtb` or `krrkq.w.mtb` into the
/// material name and the side the file holds.
fn parse_file_name(path: &Path) -> MtbResult<(String, Side)> {
    let invalid = || MtbError::Name {
        name: path.display().to_string(),
    };

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(invalid)?
        .to_ascii_lowercase();

    if stem.len() < 3 {
        return Err(invalid());
    }

    let side = match stem.as_bytes()[stem.len() - 1] {
        b'w' => Side::White,
        b'b' => Side::Black,
        _ => return Err(invalid()),
    };

    let name = stem[..stem.len() - 1].trim_end_matches('.').to_owned();
    Ok((name, side))
}

impl MtbFile {
    /// Prepare a single-side table file. With `LoadMode::OnRequest` no
    /// I/O happens; the index layout is derived from the file name and
    /// revised if the header later disagrees.
    pub fn open<P: AsRef<Path>>(
        path: P,
        mem_mode: MemMode,
        load_mode: LoadMode,
        consts: Arc<Consts>,
    ) -> MtbResult<MtbFile> {
        let path = path.as_ref();
        let (name, side) = parse_file_name(path)?;
        let schema = Schema::new(&name, 0)?;

        let mem_mode = match mem_mode {
            MemMode::Smart => {
                if schema.size() < SMART_MODE_THRESHOLD {
                    MemMode::All
                } else {
                    MemMode::Tiny
                }
            }
            mode => mode,
        };

        let mut file = MtbFile {
            name,
            paths: [None, None],
            mem_mode,
            schema,
            consts,
            meta: Lazy::new(),
            sides: [SideState::new(), SideState::new()],
        };
        file.paths[side as usize] = Some(path.to_owned());

        if load_mode == LoadMode::Now {
            let meta = file.load_meta()?;

            if mem_mode == MemMode::All {
                let payload = file.load_full(side, &meta)?;
                file.sides[side as usize].full = Lazy::preset(Some(payload));
            }

            file.meta = Lazy::preset(Some(meta));
        }

        Ok(file)
    }

    /// The material name this table answers for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows per side.
    pub fn size(&self) -> u64 {
        self.schema.size()
    }

    pub fn path(&self, side: Side) -> Option<&Path> {
        self.paths[side as usize].as_deref()
    }

    /// Whether the header and block tables failed to load. `false` also
    /// while the file has not been touched yet.
    pub fn is_broken(&self) -> bool {
        matches!(self.meta.get(), Some(None))
    }

    /// Absorb the other half of this material signature, taking over
    /// its path, buffers and block table for any side this file lacks.
    pub(crate) fn merge(&mut self, other: MtbFile) {
        let MtbFile {
            paths,
            meta,
            sides,
            ..
        } = other;

        let [path_b, path_w] = paths;
        let [state_b, state_w] = sides;
        self.adopt_side(Side::Black, path_b, state_b);
        self.adopt_side(Side::White, path_w, state_w);

        if let Some(donor) = meta.into_inner().flatten() {
            if let Some(Some(mine)) = self.meta.get_mut() {
                mine.header.property |= donor.header.property & (Props::BLACK | Props::WHITE);

                let [bt_b, bt_w] = donor.block_tables;
                if mine.block_tables[0].is_none() {
                    mine.block_tables[0] = bt_b;
                }
                if mine.block_tables[1].is_none() {
                    mine.block_tables[1] = bt_w;
                }
            }
        }
    }

    fn adopt_side(&mut self, side: Side, path: Option<PathBuf>, state: SideState) {
        let sd = side as usize;
        if self.paths[sd].is_none() && path.is_some() {
            self.paths[sd] = path;
            self.sides[sd] = state;
        }
    }

    /// Drop buffers, block tables and the header. The next query starts
    /// over from disk. Not callable concurrently with queries.
    pub fn remove_buffers(&mut self) {
        self.meta.take();
        for state in &mut self.sides {
            state.full.take();
            let window = state.window.get_mut().unwrap();
            *window = Window::default();
        }
    }

    /// Header-derived state, loading it on first use. `None` is the
    /// latched failure state; queries then report `SCORE_MISSING`.
    pub(crate) fn meta(&self) -> Option<&FileMeta> {
        self.meta
            .get_or_init(|| match self.load_meta() {
                Ok(meta) => Some(meta),
                Err(err) => {
                    warn!("cannot load table {}: {}", self.name, err);
                    None
                }
            })
            .as_ref()
    }

    fn block_count(&self) -> usize {
        ((self.schema.size() + BLOCK_SIZE as u64 - 1) / BLOCK_SIZE as u64) as usize
    }

    fn load_meta(&self) -> MtbResult<FileMeta> {
        let mut header: Option<Header> = None;
        let mut block_tables = [None, None];

        for &side in &[Side::Black, Side::White] {
            let sd = side as usize;
            let path = match self.paths[sd] {
                Some(ref path) => path,
                None => continue,
            };

            let file = File::open(path)?;
            let mut raw = [0; HEADER_SIZE];
            file.read_exact_at(0, &mut raw)?;

            let mut side_header = Header::parse(&raw)?;
            ensure!(side_header.name == self.name);
            ensure!(side_header.has_side(side));
            side_header.set_only_side(side);

            if side_header.is_compressed() {
                let mut bytes = vec![0; self.block_count() * 4];
                file.read_exact_at(HEADER_SIZE as u64, &mut bytes)?;

                let mut table = vec![0; self.block_count()];
                LittleEndian::read_u32_into(&bytes, &mut table);
                block_tables[sd] = Some(table);
            }

            match header {
                None => header = Some(side_header),
                Some(ref mut merged) => merged.property |= Props::side(side),
            }
        }

        let header = u!(header);
        let schema = if header.order != 0 {
            Schema::new(&self.name, header.order)?
        } else {
            self.schema.clone()
        };
        ensure!(schema.size() == self.schema.size());

        Ok(FileMeta {
            header,
            schema,
            block_tables,
        })
    }

    /// Read and decode the whole payload of one side.
    fn load_full(&self, side: Side, meta: &FileMeta) -> MtbResult<Box<[u8]>> {
        let sd = side as usize;
        let path = u!(self.paths[sd].as_ref());
        let file = File::open(path)?;

        let size = meta.schema.size() as usize;
        let mut payload = vec![0; size];

        if meta.header.is_compressed() {
            let table = u!(meta.block_tables[sd].as_ref());
            ensure!(!table.is_empty());

            let compressed_len = (table[table.len() - 1] & !UNCOMPRESS_BIT) as usize;
            let mut src = vec![0; compressed_len];
            file.read_exact_at(HEADER_SIZE as u64 + table.len() as u64 * 4, &mut src)?;

            let n = codec::decompress_all_blocks(table, &src, &mut payload)?;
            ensure!(n == size);
        } else {
            file.read_exact_at(HEADER_SIZE as u64, &mut payload)?;
        }

        Ok(payload.into_boxed_slice())
    }

    /// Refill the tiny-mode window so that it covers `row`.
    fn fill_window(&self, window: &mut Window, row: u64, side: Side, meta: &FileMeta) -> MtbResult<()> {
        window.start = 0;
        window.end = 0;

        let sd = side as usize;
        let path = u!(self.paths[sd].as_ref());
        let file = File::open(path)?;
        let size = meta.schema.size();

        if meta.header.is_compressed() {
            let table = u!(meta.block_tables[sd].as_ref());
            let block = (row / BLOCK_SIZE as u64) as usize;
            let entry = *u!(table.get(block));

            let data_start = HEADER_SIZE as u64 + table.len() as u64 * 4;
            let prev = if block == 0 {
                0
            } else {
                u64::from(table[block - 1] & !UNCOMPRESS_BIT)
            };
            let end = u64::from(entry & !UNCOMPRESS_BIT);
            ensure!(end >= prev);

            let start = block as u64 * BLOCK_SIZE as u64;

            if entry & UNCOMPRESS_BIT != 0 {
                window.buf.resize((end - prev) as usize, 0);
                file.read_exact_at(data_start + prev, &mut window.buf)?;
                window.start = start;
                window.end = start + window.buf.len() as u64;
            } else {
                let mut src = vec![0; (end - prev) as usize];
                file.read_exact_at(data_start + prev, &mut src)?;

                let out_len = (BLOCK_SIZE as u64).min(size - start) as usize;
                window.buf.resize(out_len, 0);
                let n = codec::decompress(&src, &mut window.buf)?;
                window.buf.truncate(n);
                window.start = start;
                window.end = start + n as u64;
            }
        } else {
            let len = (BLOCK_SIZE as u64).min(size - row) as usize;
            window.buf.resize(len, 0);
            file.read_exact_at(HEADER_SIZE as u64 + row, &mut window.buf)?;
            window.start = row;
            window.end = row + len as u64;
        }

        Ok(())
    }

    /// Raw payload cell for a row. I/O failures come back as the
    /// `TB_MISSING` cell.
    fn cell(&self, row: u64, side: Side, meta: &FileMeta) -> u8 {
        if row >= meta.schema.size() {
            return TB_MISSING;
        }
        let sd = side as usize;

        match self.mem_mode {
            MemMode::All | MemMode::Smart => {
                let full = self.sides[sd].full.get_or_init(|| {
                    match self.load_full(side, meta) {
                        Ok(payload) => Some(payload),
                        Err(err) => {
                            warn!("cannot read table {}: {}", self.name, err);
                            None
                        }
                    }
                });

                match *full {
                    Some(ref payload) => payload.get(row as usize).copied().unwrap_or(TB_MISSING),
                    None => TB_MISSING,
                }
            }
            MemMode::Tiny => {
                let mut window = self.sides[sd].window.lock().unwrap();

                if !(window.start <= row && row < window.end) {
                    if let Err(err) = self.fill_window(&mut window, row, side, meta) {
                        warn!("cannot read table {}: {}", self.name, err);
                        return TB_MISSING;
                    }
                }

                window.buf[(row - window.start) as usize]
            }
        }
    }

    /// Score of a row for the given side to move.
    pub fn score_row(&self, row: u64, side: Side) -> Score {
        let meta = match self.meta() {
            Some(meta) => meta,
            None => return SCORE_MISSING,
        };

        if !meta.header.has_side(side) {
            return SCORE_MISSING;
        }

        cell_to_score(self.cell(row, side, meta), meta.header.is_special_range())
    }

    /// Score of a position snapshot, normalizing the queried side along
    /// with the position.
    pub fn score(&self, set: &PieceSet, side: Side) -> Score {
        let meta = match self.meta() {
            Some(meta) => meta,
            None => return SCORE_MISSING,
        };

        let rec = match self.consts.encode(set, &meta.schema) {
            Some(rec) => rec,
            None => return SCORE_MISSING,
        };

        let side = if rec.flip_side { side.other() } else { side };
        if !meta.header.has_side(side) {
            return SCORE_MISSING;
        }

        cell_to_score(self.cell(rec.row, side, meta), meta.header.is_special_range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_decoding_standard() {
        assert_eq!(cell_to_score(TB_DRAW, false), SCORE_DRAW);
        assert_eq!(cell_to_score(TB_ILLEGAL, false), SCORE_ILLEGAL);
        assert_eq!(cell_to_score(TB_UNSET, false), SCORE_UNSET);
        assert_eq!(cell_to_score(TB_MISSING, false), SCORE_MISSING);
        assert_eq!(cell_to_score(TB_WINNING, false), SCORE_WINNING);
        assert_eq!(cell_to_score(TB_UNKNOWN, false), SCORE_UNKNOWN);

        // First mating cell is mate in 1 ply.
        assert_eq!(cell_to_score(6, false), SCORE_MATE - 1);
        assert_eq!(cell_to_score(7, false), SCORE_MATE - 3);
        assert_eq!(cell_to_score(129, false), SCORE_MATE - 247);

        // First losing cell is mated in 0 plies.
        assert_eq!(cell_to_score(130, false), -SCORE_MATE);
        assert_eq!(cell_to_score(131, false), -SCORE_MATE + 2);
        assert_eq!(cell_to_score(255, false), -SCORE_MATE + 250);
    }

    #[test]
    fn test_cell_decoding_special() {
        assert_eq!(cell_to_score(0, true), SCORE_DRAW);
        assert_eq!(cell_to_score(1, true), SCORE_MATE - 1);
        assert_eq!(cell_to_score(127, true), SCORE_MATE - 253);
        assert_eq!(cell_to_score(128, true), -SCORE_MATE);
        assert_eq!(cell_to_score(255, true), -SCORE_MATE + 254);
    }

    #[test]
    fn test_ply_parity() {
        // Mating scores have odd distance, losing scores even.
        for cell in 6..=255u8 {
            let score = cell_to_score(cell, false);
            let plies = SCORE_MATE - score.abs();
            if score > 0 {
                assert_eq!(plies % 2, 1, "cell {}", cell);
            } else {
                assert_eq!(plies % 2, 0, "cell {}", cell);
            }
            assert!(score.abs() <= SCORE_MATE);
        }
    }

    #[test]
    fn test_header_parse() {
        let mut raw = [0u8; HEADER_SIZE];
        LittleEndian::write_u16(&mut raw[0..], SIGNATURE_V0);
        LittleEndian::write_u32(&mut raw[2..], 0b1110);
        LittleEndian::write_u32(&mut raw[6..], 0);
        raw[10] = 33;
        raw[22..25].copy_from_slice(b"kqk");
        LittleEndian::write_i64(&mut raw[106..], -1);

        let header = Header::parse(&raw).expect("valid header");
        assert!(!header.has_side(Side::Black));
        assert!(header.has_side(Side::White));
        assert!(header.is_compressed());
        assert!(header.is_special_range());
        assert_eq!(header.order, 0);
        assert_eq!(header.dtm_max, 33);
        assert_eq!(header.name, "kqk");
        assert_eq!(header.checksum, -1);

        raw[0] = 0;
        assert!(Header::parse(&raw).is_err());
    }

    #[test]
    fn test_file_names() {
        let (name, side) = parse_file_name(Path::new("tables/krrkqw.mtb")).expect("parses");
        assert_eq!(name, "krrkq");
        assert_eq!(side, Side::White);

        let (name, side) = parse_file_name(Path::new("krrkq.b.zmt")).expect("parses");
        assert_eq!(name, "krrkq");
        assert_eq!(side, Side::Black);

        let (name, side) = parse_file_name(Path::new("KQK.W.MTB")).expect("parses");
        assert_eq!(name, "kqk");
        assert_eq!(side, Side::White);

        assert!(parse_file_name(Path::new("kqk.mtb")).is_err());

        assert!(known_extension(Path::new("kqkw.mtb")));
        assert!(known_extension(Path::new("kqkw.ZMT")));
        assert!(!known_extension(Path::new("kqkw.rtbw")));
    }
}
