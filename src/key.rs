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

//! Mapping between positions and table rows.
//!
//! A table row is a mixed-radix number. Each digit encodes one slot of
//! the material signature: the two kings jointly (reduced by symmetry),
//! or a group of one to four identical pieces (as an ordered square
//! combination). Symmetry reduction fixes the leading king group inside
//! a canonical board region and applies the same transformation to all
//! other pieces.

use arrayvec::ArrayVec;

use crate::errors::{MtbError, MtbResult};
use crate::material::PieceSet;
use crate::types::{Flip, PieceKind, Side};

const SIZE_K2: u64 = 32;
const SIZE_K8: u64 = 10;
const SIZE_K: u64 = 64;
const SIZE_KK8: u64 = 564;
const SIZE_KK2: u64 = 1806;
const SIZE_X: u64 = 64;
const SIZE_XX: u64 = 2016;
const SIZE_XXX: u64 = 41_664;
const SIZE_XXXX: u64 = 635_376;
const SIZE_P: u64 = 48;
const SIZE_PP: u64 = 1128;
const SIZE_PPP: u64 = 17_296;
const SIZE_PPPP: u64 = 194_580;

/// Canonical squares for the leading king under 8-fold symmetry: the
/// a8-d8-d5 triangle of the table frame.
const K_IDX_TO_POS: [u8; 10] = [0, 1, 2, 3, 9, 10, 11, 18, 19, 27];

/// Inverse of `K_IDX_TO_POS`, -1 off the triangle.
#[rustfmt::skip]
const K_IDX: [i8; 64] = [
     0,  1,  2,  3, -1, -1, -1, -1,
    -1,  4,  5,  6, -1, -1, -1, -1,
    -1, -1,  7,  8, -1, -1, -1, -1,
    -1, -1, -1,  9, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1,
];

/// For every square, the symmetry that moves it into the canonical
/// triangle.
#[rustfmt::skip]
const FLIP_MODE: [Flip; 64] = {
    use crate::types::Flip::*;
    [
        None,     None,     None,     None,     Horizontal, Horizontal, Horizontal, Horizontal,
        FlipVh,   None,     None,     None,     Horizontal, Horizontal, Horizontal, Rotate270,
        FlipVh,   FlipVh,   None,     None,     Horizontal, Horizontal, Rotate270,  Rotate270,
        FlipVh,   FlipVh,   FlipVh,   None,     Horizontal, Rotate270,  Rotate270,  Rotate270,
        Rotate90, Rotate90, Rotate90, Vertical, Rotate180,  FlipHv,     FlipHv,     FlipHv,
        Rotate90, Rotate90, Vertical, Vertical, Rotate180,  Rotate180,  FlipHv,     FlipHv,
        Rotate90, Vertical, Vertical, Vertical, Rotate180,  Rotate180,  Rotate180,  FlipHv,
        Vertical, Vertical, Vertical, Vertical, Rotate180,  Rotate180,  Rotate180,  Rotate180,
    ]
};

fn pack2(a: u8, b: u8) -> u16 {
    u16::from(a) << 8 | u16::from(b)
}

fn pack3(a: u8, b: u8, c: u8) -> u32 {
    u32::from(a) << 16 | u32::from(b) << 8 | u32::from(c)
}

fn pack4(a: u8, b: u8, c: u8, d: u8) -> u32 {
    u32::from(a) << 24 | u32::from(b) << 16 | u32::from(c) << 8 | u32::from(d)
}

fn kings_connected(a: u8, b: u8) -> bool {
    let (fa, ra) = (i32::from(a & 7), i32::from(a >> 3));
    let (fb, rb) = (i32::from(b & 7), i32::from(b >> 3));
    (fa - fb).abs() <= 1 && (ra - rb).abs() <= 1
}

/// The precomputed symmetry and combination tables. Built once at
/// engine construction and shared by every table file.
#[derive(Debug)]
pub struct Consts {
    kk_8: Vec<u16>,
    kk_2: Vec<u16>,
    xx: Vec<u16>,
    xxx: Vec<u32>,
    xxxx: Vec<u32>,
    pp: Vec<u16>,
    ppp: Vec<u32>,
    pppp: Vec<u32>,
}

impl Consts {
    pub fn new() -> Consts {
        // Ordered king pairs with the leading king confined to the
        // triangle (8-fold) or to files a-d (2-fold, for pawns).
        let mut kk_8 = Vec::with_capacity(SIZE_KK8 as usize);
        for &k0 in &K_IDX_TO_POS {
            for k1 in 0..64 {
                if !kings_connected(k0, k1) {
                    kk_8.push(pack2(k0, k1));
                }
            }
        }

        let mut kk_2 = Vec::with_capacity(SIZE_KK2 as usize);
        for k0 in 0..64 {
            if k0 & 7 > 3 {
                continue;
            }
            for k1 in 0..64 {
                if !kings_connected(k0, k1) {
                    kk_2.push(pack2(k0, k1));
                }
            }
        }

        // Sorted square tuples for groups of identical pieces, over the
        // whole board and over the pawn ranks.
        fn push_combos(lo: u8, hi: u8, t2: &mut Vec<u16>, t3: &mut Vec<u32>, t4: &mut Vec<u32>) {
            for i0 in lo..hi {
                for i1 in i0 + 1..hi {
                    t2.push(pack2(i0, i1));
                    for i2 in i1 + 1..hi {
                        t3.push(pack3(i0, i1, i2));
                        for i3 in i2 + 1..hi {
                            t4.push(pack4(i0, i1, i2, i3));
                        }
                    }
                }
            }
        }

        let mut xx = Vec::with_capacity(SIZE_XX as usize);
        let mut xxx = Vec::with_capacity(SIZE_XXX as usize);
        let mut xxxx = Vec::with_capacity(SIZE_XXXX as usize);
        let mut pp = Vec::with_capacity(SIZE_PP as usize);
        let mut ppp = Vec::with_capacity(SIZE_PPP as usize);
        let mut pppp = Vec::with_capacity(SIZE_PPPP as usize);

        push_combos(0, 64, &mut xx, &mut xxx, &mut xxxx);
        push_combos(8, 56, &mut pp, &mut ppp, &mut pppp);

        debug_assert_eq!(kk_8.len() as u64, SIZE_KK8);
        debug_assert_eq!(kk_2.len() as u64, SIZE_KK2);
        debug_assert_eq!(xxxx.len() as u64, SIZE_XXXX);
        debug_assert_eq!(pppp.len() as u64, SIZE_PPPP);

        Consts {
            kk_8,
            kk_2,
            xx,
            xxx,
            xxxx,
            pp,
            ppp,
            pppp,
        }
    }

    /// Sub-index for a group of identical pieces. `squares` is mutated
    /// into sorted order.
    fn group_key(&self, kind: PieceKind, squares: &mut [u8]) -> Option<u64> {
        let pawn = kind == PieceKind::Pawn;
        if pawn && squares.iter().any(|&sq| !(8..56).contains(&sq)) {
            return None;
        }

        squares.sort_unstable();

        let found = match *squares {
            [a] => return Some(u64::from(if pawn { a - 8 } else { a })),
            [a, b] => {
                let t = if pawn { &self.pp } else { &self.xx };
                t.binary_search(&pack2(a, b))
            }
            [a, b, c] => {
                let t = if pawn { &self.ppp } else { &self.xxx };
                t.binary_search(&pack3(a, b, c))
            }
            [a, b, c, d] => {
                let t = if pawn { &self.pppp } else { &self.xxxx };
                t.binary_search(&pack4(a, b, c, d))
            }
            _ => return None,
        };

        found.ok().map(|idx| idx as u64)
    }

    /// Squares of a decoded group sub-index, in the ascending order of
    /// the combination tables.
    fn group_squares(&self, kind: PieceKind, count: u8, v: u64) -> Option<ArrayVec<u8, 4>> {
        let pawn = kind == PieceKind::Pawn;
        let v = v as usize;
        let mut out = ArrayVec::new();

        match count {
            1 => out.push(if pawn { v as u8 + 8 } else { v as u8 }),
            2 => {
                let packed = *(if pawn { &self.pp } else { &self.xx }).get(v)?;
                out.push((packed >> 8) as u8);
                out.push(packed as u8);
            }
            3 => {
                let packed = *(if pawn { &self.ppp } else { &self.xxx }).get(v)?;
                out.push((packed >> 16) as u8);
                out.push((packed >> 8) as u8);
                out.push(packed as u8);
            }
            4 => {
                let packed = *(if pawn { &self.pppp } else { &self.xxxx }).get(v)?;
                out.push((packed >> 24) as u8);
                out.push((packed >> 16) as u8);
                out.push((packed >> 8) as u8);
                out.push(packed as u8);
            }
            _ => return None,
        }

        Some(out)
    }

    /// Encode a position into its table row, normalizing the stronger
    /// side to the leading side of the signature. Returns `None` if the
    /// position does not fit the schema (wrong material, connected
    /// kings, pawns on a back rank).
    pub fn encode(&self, set: &PieceSet, schema: &Schema) -> Option<KeyRec> {
        let (wc, bc) = (set.count(Side::White), set.count(Side::Black));
        let flip_side = bc > wc
            || (bc == wc
                && set.exchange_material(Side::Black) > set.exchange_material(Side::White));

        let mut sd = if flip_side { Side::Black } else { Side::White };
        let mut std_sd = Side::White;
        let mut flip = if flip_side { Flip::Vertical } else { Flip::None };
        let mut row = 0;

        for i in 0..schema.slots.len() {
            let j = usize::from(schema.logical[i]);
            let slot = schema.slots[j];
            let mul = schema.mults[j];

            if slot.side != std_sd {
                std_sd = slot.side;
                sd = sd.other();
            }

            let sub = match slot.attr {
                SlotAttr::Kk8 => {
                    let mut pos0 = flip.apply(set.king(sd));
                    let mut pos1 = flip.apply(set.king(sd.other()));

                    let extra = FLIP_MODE[usize::from(pos0)];
                    if extra != Flip::None {
                        flip = flip.then(extra);
                        pos0 = extra.apply(pos0);
                        pos1 = extra.apply(pos1);
                    }

                    self.kk_8.binary_search(&pack2(pos0, pos1)).ok()? as u64
                }
                SlotAttr::Kk2 => {
                    let mut pos0 = flip.apply(set.king(sd));
                    let mut pos1 = flip.apply(set.king(sd.other()));

                    if pos0 & 7 > 3 {
                        flip = flip.then(Flip::Horizontal);
                        pos0 = Flip::Horizontal.apply(pos0);
                        pos1 = Flip::Horizontal.apply(pos1);
                    }

                    self.kk_2.binary_search(&pack2(pos0, pos1)).ok()? as u64
                }
                SlotAttr::K8 => {
                    let raw = set.king(sd);
                    flip = flip.then(FLIP_MODE[usize::from(raw)]);
                    let idx = K_IDX[usize::from(flip.apply(raw))];
                    if idx < 0 {
                        return None;
                    }
                    idx as u64
                }
                SlotAttr::K2 => {
                    let pos = flip.apply(set.king(sd));
                    let mut f = pos & 7;
                    if f > 3 {
                        flip = flip.then(Flip::Horizontal);
                        f = 7 - f;
                    }
                    u64::from((pos >> 3) << 2 | f)
                }
                SlotAttr::K => u64::from(flip.apply(set.king(sd))),
                SlotAttr::Group { kind, count } => {
                    let mut squares: ArrayVec<u8, 4> = set
                        .pieces(sd)
                        .iter()
                        .filter(|&&(k, _)| k == kind)
                        .take(usize::from(count))
                        .map(|&(_, sq)| flip.apply(sq))
                        .collect();

                    if squares.len() < usize::from(count) {
                        return None;
                    }

                    self.group_key(kind, &mut squares)?
                }
            };

            row += sub * mul;
        }

        Some(KeyRec { row, flip_side })
    }

    /// Rebuild the piece set encoded by `row`. The side owning the
    /// signature's leading slot is `first_side`. Exposed primarily for
    /// tests and table verification.
    pub fn decode(&self, row: u64, schema: &Schema, first_side: Side) -> Option<PieceSet> {
        if row >= schema.size {
            return None;
        }

        // Resolve the physical side of every slot by walking the slots
        // in logical order.
        let mut sds = [Side::White; 6];
        let mut sd = first_side;
        let mut std_sd = Side::White;
        for i in 0..schema.slots.len() {
            let j = usize::from(schema.logical[i]);
            if schema.slots[j].side != std_sd {
                std_sd = schema.slots[j].side;
                sd = sd.other();
            }
            sds[j] = sd;
        }

        let mut set = PieceSet::empty();
        let mut rest = row;

        for (i, slot) in schema.slots.iter().enumerate() {
            let mul = schema.mults[i];
            let v = rest / mul;
            rest %= mul;
            let sd = sds[i];

            match slot.attr {
                SlotAttr::K2 => {
                    let (r, f) = (v >> 2, v & 3);
                    set.set_king(sd, (r << 3 | f) as u8);
                }
                SlotAttr::K8 => set.set_king(sd, *K_IDX_TO_POS.get(v as usize)?),
                SlotAttr::K => set.set_king(sd, v as u8),
                SlotAttr::Kk8 => {
                    let kk = *self.kk_8.get(v as usize)?;
                    set.set_king(sd, (kk >> 8) as u8);
                    set.set_king(sd.other(), (kk & 0xff) as u8);
                }
                SlotAttr::Kk2 => {
                    let kk = *self.kk_2.get(v as usize)?;
                    set.set_king(sd, (kk >> 8) as u8);
                    set.set_king(sd.other(), (kk & 0xff) as u8);
                }
                SlotAttr::Group { kind, count } => {
                    for sq in self.group_squares(kind, count, v)? {
                        if !set.push(sd, kind, sq) {
                            return None;
                        }
                    }
                }
            }
        }

        Some(set)
    }
}

impl Default for Consts {
    fn default() -> Consts {
        Consts::new()
    }
}

/// A computed table row together with the side-normalization flag.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyRec {
    /// Row index into the per-side payload.
    pub row: u64,
    /// The stronger side was Black, so the queried side must be
    /// swapped before selecting a payload.
    pub flip_side: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum SlotAttr {
    K8,
    K2,
    K,
    Kk8,
    Kk2,
    Group { kind: PieceKind, count: u8 },
}

impl SlotAttr {
    fn cardinality(self) -> u64 {
        match self {
            SlotAttr::K8 => SIZE_K8,
            SlotAttr::K2 => SIZE_K2,
            SlotAttr::K => SIZE_K,
            SlotAttr::Kk8 => SIZE_KK8,
            SlotAttr::Kk2 => SIZE_KK2,
            SlotAttr::Group { kind, count } => match (kind == PieceKind::Pawn, count) {
                (false, 1) => SIZE_X,
                (false, 2) => SIZE_XX,
                (false, 3) => SIZE_XXX,
                (false, 4) => SIZE_XXXX,
                (true, 1) => SIZE_P,
                (true, 2) => SIZE_PP,
                (true, 3) => SIZE_PPP,
                (true, 4) => SIZE_PPPP,
                _ => 0,
            },
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Slot {
    pub attr: SlotAttr,
    pub side: Side,
}

/// The slot layout of one material signature: parsed slots in physical
/// order, the logical walk order from the header's permutation field,
/// and the mixed-radix multipliers.
#[derive(Debug, Clone)]
pub struct Schema {
    slots: ArrayVec<Slot, 6>,
    mults: ArrayVec<u64, 6>,
    logical: ArrayVec<u8, 6>,
    size: u64,
}

impl Schema {
    /// Parse a material name, with the header's slot permutation
    /// (`order == 0` means identity).
    pub fn new(name: &str, order: u32) -> MtbResult<Schema> {
        let invalid = || MtbError::Name {
            name: name.to_owned(),
        };

        let chars: Vec<char> = name.chars().collect();
        if chars.first() != Some(&'k') || chars.iter().filter(|&&ch| ch == 'k').count() != 2 {
            return Err(invalid());
        }
        let has_pawns = chars.contains(&'p');

        let mut slots: ArrayVec<Slot, 6> = ArrayVec::new();
        let mut side = Side::White;
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            if ch == 'k' {
                if i == 0 {
                    let attr = if has_pawns { SlotAttr::Kk2 } else { SlotAttr::Kk8 };
                    slots.try_push(Slot { attr, side }).map_err(|_| invalid())?;
                } else {
                    side = Side::Black;
                }
                i += 1;
                continue;
            }

            let kind = match PieceKind::from_char(ch) {
                Some(kind) if kind != PieceKind::King => kind,
                _ => return Err(invalid()),
            };

            let mut count = 1;
            while i + count < chars.len() && chars[i + count] == ch {
                count += 1;
            }
            if count > 4 {
                return Err(invalid());
            }

            slots
                .try_push(Slot {
                    attr: SlotAttr::Group {
                        kind,
                        count: count as u8,
                    },
                    side,
                })
                .map_err(|_| invalid())?;
            i += count;
        }

        // Physically permute the slots; the logical walk order is kept
        // alongside so encode and decode agree on side switching.
        let k = slots.len();
        let mut physical = slots.clone();
        let mut logical: ArrayVec<u8, 6> = (0..k as u8).collect();

        if order != 0 {
            let mut seen = [false; 6];
            for i in 0..k {
                let o = (order >> (3 * i) & 7) as usize;
                if o >= k || seen[o] {
                    return Err(invalid());
                }
                seen[o] = true;
                physical[o] = slots[i];
                logical[i] = o as u8;
            }
        }

        let mut size: u64 = 1;
        for slot in &physical {
            size = size
                .checked_mul(slot.attr.cardinality())
                .ok_or_else(invalid)?;
        }

        let mut mults: ArrayVec<u64, 6> = ArrayVec::new();
        for i in 0..k {
            let mut mul = 1u64;
            for slot in &physical[i + 1..] {
                mul = mul.checked_mul(slot.attr.cardinality()).ok_or_else(invalid)?;
            }
            mults.push(mul);
        }

        Ok(Schema {
            slots: physical,
            mults,
            logical,
            size,
        })
    }

    /// Number of rows per side.
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        let consts = Consts::new();
        assert_eq!(consts.kk_8.len() as u64, SIZE_KK8);
        assert_eq!(consts.kk_2.len() as u64, SIZE_KK2);
        assert_eq!(consts.xx.len() as u64, SIZE_XX);
        assert_eq!(consts.xxx.len() as u64, SIZE_XXX);
        assert_eq!(consts.xxxx.len() as u64, SIZE_XXXX);
        assert_eq!(consts.pp.len() as u64, SIZE_PP);
        assert_eq!(consts.ppp.len() as u64, SIZE_PPP);
        assert_eq!(consts.pppp.len() as u64, SIZE_PPPP);
    }

    #[test]
    fn test_first_king_pair() {
        let consts = Consts::new();
        // Leading king on a8; c8 is the first square neither occupied
        // nor adjacent.
        assert_eq!(consts.kk_8[0], pack2(0, 2));
        assert_eq!(consts.kk_2[0], pack2(0, 2));
    }

    #[test]
    fn test_schema_sizes() {
        assert_eq!(Schema::new("kk", 0).expect("valid").size(), 564);
        assert_eq!(Schema::new("kqk", 0).expect("valid").size(), 564 * 64);
        assert_eq!(Schema::new("kpk", 0).expect("valid").size(), 1806 * 48);
        assert_eq!(
            Schema::new("krrkq", 0).expect("valid").size(),
            564 * 2016 * 64
        );
        assert_eq!(
            Schema::new("kppk", 0).expect("valid").size(),
            1806 * 1128
        );
    }

    #[test]
    fn test_schema_rejects_garbage() {
        assert!(Schema::new("", 0).is_err());
        assert!(Schema::new("qk", 0).is_err());
        assert!(Schema::new("kqx", 0).is_err());
        assert!(Schema::new("kqkqk", 0).is_err());
        assert!(Schema::new("kqqqqqk", 0).is_err());
    }

    #[test]
    fn test_schema_order_permutation() {
        // Swap the king slot and the queen slot: logical slot 0 lands in
        // physical position 1 and vice versa.
        let plain = Schema::new("kqk", 0).expect("valid");
        let swapped = Schema::new("kqk", 1 | 0 << 3).expect("valid");

        assert_eq!(plain.size(), swapped.size());
        assert_eq!(plain.mults.as_slice(), &[64, 1]);
        assert_eq!(swapped.mults.as_slice(), &[564, 1]);

        assert!(Schema::new("kqk", 7 | 7 << 3).is_err());
        assert!(Schema::new("kqk", 1 | 1 << 3).is_err());
    }

    fn roundtrip(consts: &Consts, name: &str, order: u32) {
        let schema = Schema::new(name, order).expect("valid schema");
        let step = (schema.size() / 257).max(1);

        let mut row = 0;
        while row < schema.size() {
            let set = consts
                .decode(row, &schema, Side::White)
                .expect("decodable row");
            let rec = consts.encode(&set, &schema).expect("encodable set");
            assert_eq!(rec.row, row, "{} row {}", name, row);
            assert!(!rec.flip_side);
            row += step;
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let consts = Consts::new();
        roundtrip(&consts, "kk", 0);
        roundtrip(&consts, "kqk", 0);
        roundtrip(&consts, "kpk", 0);
        roundtrip(&consts, "krkh", 0);
        roundtrip(&consts, "kppk", 0);
        roundtrip(&consts, "krrkq", 0);
        roundtrip(&consts, "kqk", 1 | 0 << 3);
        roundtrip(&consts, "krrkq", 2 | 0 << 3 | 1 << 6);
    }

    #[test]
    fn test_color_mirror_same_row() {
        // Decoding with Black as the leading side yields the
        // color-mirrored position, which must encode to the same row
        // with the flip flag raised (pawnless tables only; with pawns
        // the vertical flip is part of the color swap itself).
        let consts = Consts::new();
        let schema = Schema::new("kqk", 0).expect("valid schema");

        let mut row = 0;
        while row < schema.size() {
            let set = consts
                .decode(row, &schema, Side::Black)
                .expect("decodable row");
            let rec = consts.encode(&set, &schema).expect("encodable set");
            assert_eq!(rec.row, row);
            assert!(rec.flip_side);
            row += 101;
        }
    }

    #[test]
    fn test_board_mirror_same_row() {
        let consts = Consts::new();

        for &(name, flips) in &[
            ("kqkr", &[Flip::Horizontal, Flip::Vertical][..]),
            ("kpk", &[Flip::Horizontal][..]),
        ] {
            let schema = Schema::new(name, 0).expect("valid schema");
            let mut row = 0;
            while row < schema.size() {
                let set = consts
                    .decode(row, &schema, Side::White)
                    .expect("decodable row");

                for &flip in flips {
                    let mut mirrored = PieceSet::empty();
                    for &side in &[Side::White, Side::Black] {
                        mirrored.set_king(side, flip.apply(set.king(side)));
                        for &(kind, sq) in set.pieces(side) {
                            assert!(mirrored.push(side, kind, flip.apply(sq)));
                        }
                    }

                    let rec = consts.encode(&mirrored, &schema).expect("encodable set");
                    assert_eq!(rec.row, row, "{} under {:?}", name, flip);
                }

                row += 509;
            }
        }
    }

    #[test]
    fn test_rows_in_range() {
        let consts = Consts::new();
        let schema = Schema::new("krkh", 0).expect("valid schema");

        let mut row = 0;
        while row < schema.size() {
            let set = consts
                .decode(row, &schema, Side::White)
                .expect("decodable row");
            let rec = consts.encode(&set, &schema).expect("encodable set");
            assert!(rec.row < schema.size());
            row += 1009;
        }

        assert_eq!(consts.decode(schema.size(), &schema, Side::White), None);
    }
}
