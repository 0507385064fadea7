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

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fxhash::FxHashMap;
use log::{debug, warn};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Move, Position};

use crate::key::Consts;
use crate::material::{no_mating_material, swapped_name, PieceSet};
use crate::table::{known_extension, MtbFile};
use crate::types::{LoadMode, MemMode, PieceKind, Score, Side};
use crate::types::{SCORE_DRAW, SCORE_MATE, SCORE_MISSING};

/// A collection of MTB tables, keyed by material name.
///
/// Queries are cheap once tables are loaded and may run from many
/// threads at once. `preload` and `remove_all_buffers` require
/// exclusive access.
#[derive(Debug)]
pub struct Tablebase {
    consts: Arc<Consts>,
    folders: Vec<PathBuf>,
    files: Vec<MtbFile>,
    by_name: FxHashMap<String, usize>,
}

impl Default for Tablebase {
    fn default() -> Tablebase {
        Tablebase::new()
    }
}

impl Tablebase {
    /// Create an empty collection. The symmetry and combination tables
    /// are built here and shared with every table file.
    pub fn new() -> Tablebase {
        Tablebase {
            consts: Arc::new(Consts::new()),
            folders: Vec::new(),
            files: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Record a directory to be scanned by the next `preload`.
    pub fn add_folder<P: AsRef<Path>>(&mut self, path: P) {
        self.folders.push(path.as_ref().to_owned());
    }

    /// Replace the folder list.
    pub fn set_folders<I, P>(&mut self, folders: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.folders = folders
            .into_iter()
            .map(|path| path.as_ref().to_owned())
            .collect();
    }

    /// Scan every recorded folder recursively and register all table
    /// files found. A second file for an already known material (the
    /// other side to move) is merged into the existing entry.
    ///
    /// Returns the number of files taken in.
    ///
    /// # Errors
    ///
    /// Errors if a folder cannot be listed. Files that fail to open are
    /// skipped with a log message.
    pub fn preload(&mut self, mem_mode: MemMode, load_mode: LoadMode) -> io::Result<usize> {
        let mut paths = Vec::new();
        for folder in &self.folders {
            scan_folder(folder, &mut paths)?;
        }

        let mut taken = 0;
        for path in paths {
            if !known_extension(&path) {
                continue;
            }

            match MtbFile::open(&path, mem_mode, load_mode, self.consts.clone()) {
                Ok(file) => {
                    taken += 1;
                    match self.by_name.get(file.name()) {
                        Some(&at) => self.files[at].merge(file),
                        None => self.register(file),
                    }
                }
                Err(err) => warn!("not loaded: {}: {}", path.display(), err),
            }
        }

        debug!("{} table files for {} materials", taken, self.files.len());
        Ok(taken)
    }

    /// `add_folder` followed by `preload`.
    pub fn preload_folder<P: AsRef<Path>>(
        &mut self,
        path: P,
        mem_mode: MemMode,
        load_mode: LoadMode,
    ) -> io::Result<usize> {
        self.add_folder(path);
        self.preload(mem_mode, load_mode)
    }

    /// Register a file under its canonical name and under the
    /// side-swapped rotation, so that queries from the weaker side's
    /// point of view find it as well.
    fn register(&mut self, file: MtbFile) {
        let at = self.files.len();
        let name = file.name().to_owned();
        let swapped = swapped_name(&name);
        self.files.push(file);

        self.by_name.insert(name, at);
        if let Some(swapped) = swapped {
            self.by_name.entry(swapped).or_insert(at);
        }
    }

    /// Number of registered materials.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Release all buffers, block tables and headers, keeping the file
    /// registry. Queries afterwards reload from disk.
    pub fn remove_all_buffers(&mut self) {
        for file in &mut self.files {
            file.remove_buffers();
        }
    }

    fn file(&self, name: &str) -> Option<&MtbFile> {
        self.by_name.get(name).map(|&at| &self.files[at])
    }

    /// Game-theoretic score of a position for the side to move:
    /// `SCORE_MATE - n` for a mate in `n` plies, negative if losing,
    /// `SCORE_DRAW`, or a sentinel (`SCORE_MISSING` and friends).
    ///
    /// Positions able to capture en passant are resolved by a one-ply
    /// search, since the tables do not store en passant rights.
    pub fn score(&self, pos: &Chess) -> Score {
        // Bare kings never reach a table file.
        if pos.board().occupied() == pos.board().kings() {
            return SCORE_DRAW;
        }

        let set = match PieceSet::from_board(pos.board()) {
            Some(set) => set,
            None => return SCORE_MISSING,
        };
        let side = Side::from_color(pos.turn());

        let file = match self.file(&set.name()) {
            Some(file) => file,
            None => return SCORE_MISSING,
        };

        let meta = match file.meta() {
            Some(meta) => meta,
            None => return SCORE_MISSING,
        };

        let rec = match self.consts.encode(&set, &meta.schema) {
            Some(rec) => rec,
            None => return SCORE_MISSING,
        };

        let query_side = if rec.flip_side { side.other() } else { side };

        if meta.header.has_side(query_side) && pos.maybe_ep_square().is_none() {
            file.score_row(rec.row, query_side)
        } else {
            self.score_one_ply(pos)
        }
    }

    /// Score a position given as a FEN string. `None` if the FEN does
    /// not describe a legal position.
    pub fn score_fen(&self, fen: &str) -> Option<Score> {
        Some(self.score(&position_from_fen(fen)?))
    }

    /// Score a position given as a piece listing (kind, side, table
    /// square with 0 = a8) plus the side to move.
    pub fn score_pieces(&self, pieces: &[(PieceKind, Side, u8)], turn: Side) -> Option<Score> {
        Some(self.score(&position_from_pieces(pieces, turn)?))
    }

    /// Resolve a position by searching one ply and probing the
    /// successors, negamax style. Used where the tables cannot answer
    /// directly: en passant rights, or a missing side-to-move payload.
    fn score_one_ply(&self, pos: &Chess) -> Score {
        let mut best = -SCORE_MATE;
        let mut legal = 0;

        for m in pos.legal_moves() {
            let mut after = pos.clone();
            after.play_unchecked(&m);
            legal += 1;

            let mut score = self.score(&after);
            if score == SCORE_MISSING && m.is_capture() && no_mating_material(after.board()) {
                // The capture left a dead draw; no table needed.
                score = SCORE_DRAW;
            }

            if score.abs() <= SCORE_MATE {
                best = best.max(-score);
            }
        }

        if legal == 0 {
            return if pos.is_check() {
                -SCORE_MATE
            } else {
                SCORE_DRAW
            };
        }

        if best != SCORE_DRAW && best.abs() <= SCORE_MATE {
            // Account for the ply spent on this search.
            best -= best.signum();
        }
        best
    }

    /// Score a position and reconstruct the principal variation by
    /// repeatedly probing one ply deep, appending the chosen moves to
    /// `line` until the score bottoms out at mate or a draw.
    pub fn probe(&self, pos: &Chess, line: &mut Vec<Move>) -> Score {
        let mut best: Option<(Move, Score)> = None;

        for m in pos.legal_moves() {
            let mut after = pos.clone();
            after.play_unchecked(&m);

            let mut score = self.score(&after);
            if score == SCORE_MISSING {
                if m.is_capture() && no_mating_material(after.board()) {
                    score = SCORE_DRAW;
                } else {
                    warn!("missing or broken table while probing");
                    return SCORE_MISSING;
                }
            }

            if score <= SCORE_MATE {
                let score = -score;

                if best.as_ref().map_or(true, |&(_, s)| score > s) {
                    let stop = score == SCORE_MATE;
                    best = Some((m, score));
                    if stop {
                        break;
                    }
                }
            }
        }

        let (best_move, mut best_score) = match best {
            Some(found) => found,
            None => {
                return if pos.is_check() {
                    -SCORE_MATE
                } else {
                    SCORE_DRAW
                };
            }
        };

        if best_score != SCORE_DRAW && best_score.abs() <= SCORE_MATE {
            best_score -= best_score.signum();
        }

        line.push(best_move.clone());

        if best_score != SCORE_DRAW && best_score.abs() != SCORE_MATE {
            let mut after = pos.clone();
            after.play_unchecked(&best_move);
            self.probe(&after, line);
        }

        best_score
    }

    /// `probe` for a FEN string. `None` if the FEN does not describe a
    /// legal position.
    pub fn probe_fen(&self, fen: &str, line: &mut Vec<Move>) -> Option<Score> {
        Some(self.probe(&position_from_fen(fen)?, line))
    }

    /// `probe` for a piece listing.
    pub fn probe_pieces(
        &self,
        pieces: &[(PieceKind, Side, u8)],
        turn: Side,
        line: &mut Vec<Move>,
    ) -> Option<Score> {
        Some(self.probe(&position_from_pieces(pieces, turn)?, line))
    }
}

fn position_from_fen(fen: &str) -> Option<Chess> {
    fen.parse::<Fen>()
        .ok()?
        .into_position(CastlingMode::Standard)
        .ok()
}

fn position_from_pieces(pieces: &[(PieceKind, Side, u8)], turn: Side) -> Option<Chess> {
    let mut set = PieceSet::empty();
    for &(kind, side, sq) in pieces {
        if sq > 63 {
            return None;
        }
        if kind == PieceKind::King {
            set.set_king(side, sq);
        } else if !set.push(side, kind, sq) {
            return None;
        }
    }
    set.position(turn)
}

fn scan_folder(folder: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_dir() {
            scan_folder(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_sync() {
        fn assert_send<T: Send>(_: T) {}
        fn assert_sync<T: Sync>(_: T) {}

        assert_send(Tablebase::new());
        assert_sync(Tablebase::new());
    }

    #[test]
    fn test_empty_db() {
        let tables = Tablebase::new();

        // Lone kings are always a draw, no table needed.
        assert_eq!(
            tables.score_fen("K2k4/8/8/8/8/8/8/8 w - - 0 1"),
            Some(SCORE_DRAW)
        );
        assert_eq!(
            tables.score_pieces(
                &[
                    (PieceKind::King, Side::White, 0),
                    (PieceKind::King, Side::Black, 63),
                ],
                Side::White,
            ),
            Some(SCORE_DRAW)
        );

        // Everything else is missing without table files.
        assert_eq!(
            tables.score_fen("K2k4/2p5/8/8/8/8/8/8 w - - 0 1"),
            Some(SCORE_MISSING)
        );

        // The starting position has no 3-5 man table either.
        let pos = Chess::default();
        assert_eq!(tables.score(&pos), SCORE_MISSING);
    }

    #[test]
    fn test_probe_terminal_positions() {
        let tables = Tablebase::new();
        let mut line = Vec::new();

        // Stalemate: draw even with an empty database.
        assert_eq!(
            tables.probe_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", &mut line),
            Some(SCORE_DRAW)
        );
        assert!(line.is_empty());

        // Checkmate: mated in zero plies.
        assert_eq!(
            tables.probe_fen("7k/5K2/8/8/8/8/8/7R b - - 0 1", &mut line),
            Some(-SCORE_MATE)
        );
        assert!(line.is_empty());
    }
}
