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

use std::fmt;

use arrayvec::ArrayVec;
use shakmaty::fen::Fen;
use shakmaty::{Board, CastlingMode, Chess, Square};

use crate::types::{PieceKind, Side};

/// Non-king piece kinds in material name order.
const NAME_ORDER: [PieceKind; 5] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Pawn,
];

/// A position snapshot in the table frame: squares are numbered from
/// a8 (0), rank by rank, to h1 (63), and each side is one king plus up
/// to 15 other pieces.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PieceSet {
    kings: [u8; 2],
    rest: [ArrayVec<(PieceKind, u8), 15>; 2],
}

/// Convert a shakmaty square (a1-based) to the table frame (a8-based).
pub(crate) fn square_down(sq: Square) -> u8 {
    let idx = u32::from(sq) as u8;
    ((7 - (idx >> 3)) << 3) | (idx & 7)
}

/// Convert a table-frame square back to a shakmaty square.
pub(crate) fn square_up(sq: u8) -> Square {
    Square::new(u32::from(((7 - (sq >> 3)) << 3) | (sq & 7)))
}

impl PieceSet {
    pub fn empty() -> PieceSet {
        PieceSet {
            kings: [64, 64],
            rest: [ArrayVec::new(), ArrayVec::new()],
        }
    }

    /// Snapshot a board. Returns `None` unless both kings are present.
    pub fn from_board(board: &Board) -> Option<PieceSet> {
        let mut set = PieceSet::empty();

        for sq in board.occupied() {
            let piece = board.piece_at(sq)?;
            let side = Side::from_color(piece.color);
            let kind = PieceKind::from_role(piece.role);
            let table_sq = square_down(sq);

            if kind == PieceKind::King {
                if set.kings[side as usize] != 64 {
                    return None;
                }
                set.kings[side as usize] = table_sq;
            } else if set.rest[side as usize].try_push((kind, table_sq)).is_err() {
                return None;
            }
        }

        if set.kings[0] == 64 || set.kings[1] == 64 {
            None
        } else {
            Some(set)
        }
    }

    pub fn king(&self, side: Side) -> u8 {
        self.kings[side as usize]
    }

    pub(crate) fn set_king(&mut self, side: Side, sq: u8) {
        self.kings[side as usize] = sq;
    }

    pub fn pieces(&self, side: Side) -> &[(PieceKind, u8)] {
        &self.rest[side as usize]
    }

    pub(crate) fn push(&mut self, side: Side, kind: PieceKind, sq: u8) -> bool {
        self.rest[side as usize].try_push((kind, sq)).is_ok()
    }

    /// Number of non-king pieces of a side.
    pub fn count(&self, side: Side) -> usize {
        self.rest[side as usize].len()
    }

    pub(crate) fn exchange_material(&self, side: Side) -> i32 {
        self.rest[side as usize]
            .iter()
            .map(|&(kind, _)| kind.exchange_value())
            .sum()
    }

    pub(crate) fn count_of(&self, side: Side, kind: PieceKind) -> usize {
        self.rest[side as usize]
            .iter()
            .filter(|&&(k, _)| k == kind)
            .count()
    }

    /// The canonical material name: for White then Black, a `k` followed
    /// by that side's piece letters in `q`, `r`, `b`, `h`, `p` order.
    pub fn name(&self) -> String {
        let mut name = String::with_capacity(2 + self.count(Side::White) + self.count(Side::Black));

        for &side in &[Side::White, Side::Black] {
            name.push('k');
            for &kind in &NAME_ORDER {
                for _ in 0..self.count_of(side, kind) {
                    name.push(kind.char());
                }
            }
        }

        name
    }

    /// Rebuild a playable position with the given side to move. Returns
    /// `None` if the square assignment is not a legal chess position.
    pub fn position(&self, turn: Side) -> Option<Chess> {
        if self.kings[0] > 63 || self.kings[1] > 63 {
            return None;
        }
        let fen = format!("{} {} - - 0 1", self.board_fen(), turn.fold('b', 'w'));
        fen.parse::<Fen>()
            .ok()?
            .into_position(CastlingMode::Standard)
            .ok()
    }

    fn board_fen(&self) -> String {
        let mut grid = [None; 64];
        for &side in &[Side::Black, Side::White] {
            grid[self.kings[side as usize] as usize] = Some((PieceKind::King, side));
            for &(kind, sq) in self.pieces(side) {
                grid[sq as usize] = Some((kind, side));
            }
        }

        let mut fen = String::new();
        for rank in 0..8 {
            let mut run = 0;
            for file in 0..8 {
                match grid[rank * 8 + file] {
                    None => run += 1,
                    Some((kind, side)) => {
                        if run > 0 {
                            fen.push(char::from(b'0' + run));
                            run = 0;
                        }
                        let ch = match kind {
                            PieceKind::Knight => 'n',
                            kind => kind.char(),
                        };
                        fen.push(side.fold(ch, ch.to_ascii_uppercase()));
                    }
                }
            }
            if run > 0 {
                fen.push(char::from(b'0' + run));
            }
            if rank < 7 {
                fen.push('/');
            }
        }
        fen
    }
}

impl fmt::Display for PieceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// The same material signature with the sides swapped, i.e. the name
/// split at its last `k` and rotated: `krrkq` becomes `kqkrr`.
pub(crate) fn swapped_name(name: &str) -> Option<String> {
    let at = name.rfind('k')?;
    if at == 0 {
        return None;
    }
    let mut swapped = String::with_capacity(name.len());
    swapped.push_str(&name[at..]);
    swapped.push_str(&name[..at]);
    Some(swapped)
}

/// Neither side can deliver mate: no pawns or major pieces, and at most
/// one minor piece on the whole board.
pub(crate) fn no_mating_material(board: &Board) -> bool {
    !(board.pawns() | board.rooks() | board.queens()).any()
        && (board.bishops() | board.knights()).count() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Position;

    fn set_from_fen(fen: &str) -> PieceSet {
        let pos: Chess = fen
            .parse::<Fen>()
            .expect("valid fen")
            .into_position(CastlingMode::Standard)
            .expect("legal position");
        PieceSet::from_board(pos.board()).expect("kings present")
    }

    #[test]
    fn test_square_frames() {
        assert_eq!(square_down(Square::A8), 0);
        assert_eq!(square_down(Square::H8), 7);
        assert_eq!(square_down(Square::A1), 56);
        assert_eq!(square_down(Square::H1), 63);

        for sq in 0..64 {
            assert_eq!(square_down(square_up(sq)), sq);
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(set_from_fen("K2k4/2p5/8/8/8/8/8/8 w - - 0 1").name(), "kkp");
        assert_eq!(
            set_from_fen("6k1/8/8/R7/8/1K6/8/7q w - - 0 1").name(),
            "krkq"
        );
        assert_eq!(
            set_from_fen("6k1/8/8/R7/R7/1K6/8/7q w - - 0 1").name(),
            "krrkq"
        );

        // Knights use the letter h.
        assert_eq!(
            set_from_fen("6k1/8/8/N7/8/1K6/8/8 w - - 0 1").name(),
            "khk"
        );
    }

    #[test]
    fn test_name_ignores_square_order() {
        // Same material listed from different square layouts.
        let a = set_from_fen("6k1/8/8/R6R/8/1K6/8/8 w - - 0 1");
        let b = set_from_fen("R6k/8/8/8/8/1K6/8/R7 w - - 0 1");
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_swapped_name() {
        assert_eq!(swapped_name("krrkq").as_deref(), Some("kqkrr"));
        assert_eq!(swapped_name("kkp").as_deref(), Some("kpk"));
        assert_eq!(swapped_name("kqk").as_deref(), Some("kkq"));
    }

    #[test]
    fn test_position_roundtrip() {
        let set = set_from_fen("K2k4/2p5/8/8/8/8/8/8 w - - 0 1");
        let pos = set.position(Side::White).expect("legal");
        assert_eq!(
            PieceSet::from_board(pos.board()).expect("kings"),
            set
        );
    }

    #[test]
    fn test_no_mating_material() {
        let kk = set_from_fen("K2k4/8/8/8/8/8/8/8 w - - 0 1");
        assert!(no_mating_material(kk.position(Side::White).expect("legal").board()));

        let kbk = set_from_fen("K2k4/8/8/3B4/8/8/8/8 w - - 0 1");
        assert!(no_mating_material(kbk.position(Side::White).expect("legal").board()));

        let kpk = set_from_fen("K2k4/2p5/8/8/8/8/8/8 w - - 0 1");
        assert!(!no_mating_material(kpk.position(Side::White).expect("legal").board()));
    }
}
