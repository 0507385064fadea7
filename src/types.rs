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

use shakmaty::{Color, Role};

/// Table scores are plain centiless integers: `0` is a draw, positive is
/// winning for the side to move, negative is losing. Values of magnitude
/// `SCORE_MATE - n` denote a forced mate in `n` plies. Values above
/// `SCORE_MATE` are sentinels.
pub type Score = i32;

/// Draw.
pub const SCORE_DRAW: Score = 0;
/// Mate. `SCORE_MATE - n` is a mate in `n` plies.
pub const SCORE_MATE: Score = 1000;
/// Known win, unknown distance.
pub const SCORE_WINNING: Score = 1003;
/// The position is illegal (unreachable) in this table.
pub const SCORE_ILLEGAL: Score = 1004;
/// The table does not know the result.
pub const SCORE_UNKNOWN: Score = 1005;
/// No table, broken table, or index out of range.
pub const SCORE_MISSING: Score = 1006;
/// The cell was never written by the generator.
pub const SCORE_UNSET: Score = 1007;

/// The two sides of the board, in the on-disk order: Black is side 0,
/// White is side 1 (matching bits 0 and 1 of the header property field).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Side {
    Black = 0,
    White = 1,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    pub fn fold<T>(self, black: T, white: T) -> T {
        match self {
            Side::Black => black,
            Side::White => white,
        }
    }

    pub fn from_color(color: Color) -> Side {
        match color {
            Color::Black => Side::Black,
            Color::White => Side::White,
        }
    }

    pub fn color(self) -> Color {
        self.fold(Color::Black, Color::White)
    }
}

/// Piece types in the on-disk letter order `kqrbhp` (the knight letter
/// is `h`, as in the table generator).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum PieceKind {
    King = 0,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub fn char(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'h',
            PieceKind::Pawn => 'p',
        }
    }

    pub fn from_char(ch: char) -> Option<PieceKind> {
        Some(match ch {
            'k' => PieceKind::King,
            'q' => PieceKind::Queen,
            'r' => PieceKind::Rook,
            'b' => PieceKind::Bishop,
            'h' => PieceKind::Knight,
            'p' => PieceKind::Pawn,
            _ => return None,
        })
    }

    pub fn from_role(role: Role) -> PieceKind {
        match role {
            Role::King => PieceKind::King,
            Role::Queen => PieceKind::Queen,
            Role::Rook => PieceKind::Rook,
            Role::Bishop => PieceKind::Bishop,
            Role::Knight => PieceKind::Knight,
            Role::Pawn => PieceKind::Pawn,
        }
    }

    pub fn role(self) -> Role {
        match self {
            PieceKind::King => Role::King,
            PieceKind::Queen => Role::Queen,
            PieceKind::Rook => Role::Rook,
            PieceKind::Bishop => Role::Bishop,
            PieceKind::Knight => Role::Knight,
            PieceKind::Pawn => Role::Pawn,
        }
    }

    /// Exchange value used to pick the nominally stronger side when
    /// normalizing a position for encoding.
    pub(crate) fn exchange_value(self) -> i32 {
        match self {
            PieceKind::King => 0,
            PieceKind::Queen => 9,
            PieceKind::Rook => 5,
            PieceKind::Bishop => 3,
            PieceKind::Knight => 3,
            PieceKind::Pawn => 1,
        }
    }
}

/// The eight board symmetries (the dihedral group of the 8x8 board).
///
/// Transformations act on table squares, which are numbered from a8 (0),
/// rank by rank, to h1 (63). `FlipVh` is the reflection across the
/// a8-h1 diagonal of that frame, `FlipHv` across the h8-a1 diagonal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum Flip {
    None = 0,
    Horizontal,
    Vertical,
    FlipVh,
    FlipHv,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Flip {
    /// (transpose, mirror x, mirror y) decomposition.
    fn suv(self) -> (bool, bool, bool) {
        match self {
            Flip::None => (false, false, false),
            Flip::Horizontal => (false, true, false),
            Flip::Vertical => (false, false, true),
            Flip::FlipVh => (true, false, false),
            Flip::FlipHv => (true, true, true),
            Flip::Rotate90 => (true, true, false),
            Flip::Rotate180 => (false, true, true),
            Flip::Rotate270 => (true, false, true),
        }
    }

    fn from_suv(s: bool, u: bool, v: bool) -> Flip {
        match (s, u, v) {
            (false, false, false) => Flip::None,
            (false, true, false) => Flip::Horizontal,
            (false, false, true) => Flip::Vertical,
            (true, false, false) => Flip::FlipVh,
            (true, true, true) => Flip::FlipHv,
            (true, true, false) => Flip::Rotate90,
            (false, true, true) => Flip::Rotate180,
            (true, false, true) => Flip::Rotate270,
        }
    }

    /// The transformation equivalent to applying `self` first and `next`
    /// second.
    pub fn then(self, next: Flip) -> Flip {
        let (s1, u1, v1) = self.suv();
        let (s2, u2, v2) = next.suv();
        let (u, v) = if s2 {
            (v1 ^ u2, u1 ^ v2)
        } else {
            (u1 ^ u2, v1 ^ v2)
        };
        Flip::from_suv(s1 ^ s2, u, v)
    }

    /// Transform a table square (0 = a8, 63 = h1).
    pub fn apply(self, sq: u8) -> u8 {
        debug_assert!(sq < 64);
        let (s, u, v) = self.suv();
        let (mut x, mut y) = if s {
            (sq >> 3, sq & 7)
        } else {
            (sq & 7, sq >> 3)
        };
        if u {
            x = 7 - x;
        }
        if v {
            y = 7 - y;
        }
        (y << 3) | x
    }
}

/// How much of a table is kept in memory.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MemMode {
    /// Cache a single decoded block per side.
    Tiny,
    /// Decode each requested side fully on first touch.
    All,
    /// `All` for tables below 10 MiB, `Tiny` otherwise.
    Smart,
}

/// When table files are actually opened and read.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadMode {
    /// Read headers (and payloads, in `MemMode::All`) during preload.
    Now,
    /// Defer all I/O to the first query.
    OnRequest,
}
