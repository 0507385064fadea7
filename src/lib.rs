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

//! Probe MTB endgame tables.
//!
//! MTB tables store the exact distance to mate for every position of a
//! material signature with few pieces (typically 3 to 5). This crate
//! reads the `.mtb` (plain) and `.zmt` (LZMA block compressed) file
//! format; it does not generate tables.
//!
//! # Example
//!
//! ```no_run
//! use shakmaty::{CastlingMode, Chess, fen::Fen};
//! use shakmaty_mtb::{LoadMode, MemMode, Tablebase, SCORE_MATE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tables = Tablebase::new();
//! tables.add_folder("tables/mtb");
//! tables.preload(MemMode::Smart, LoadMode::OnRequest)?;
//!
//! let pos: Chess = "6k1/8/8/R7/8/1K6/8/8 w - - 0 1"
//!     .parse::<Fen>()?
//!     .into_position(CastlingMode::Standard)?;
//!
//! let score = tables.score(&pos);
//! println!("mate in {} plies", SCORE_MATE - score);
//!
//! let mut line = Vec::new();
//! let score = tables.probe(&pos, &mut line);
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Queries return sentinel scores instead of errors: `SCORE_MISSING`
//! stands for an absent or broken table. See [`MtbError`] for the
//! errors reported while opening files.

#![doc(html_root_url = "https://docs.rs/shakmaty-mtb/0.3.1")]
#![warn(missing_debug_implementations)]

#[macro_use]
mod errors;
mod codec;
mod key;
mod lazy;
mod material;
mod table;
mod tablebase;
mod types;

pub use crate::codec::{decompress, decompress_all_blocks, BLOCK_SIZE, UNCOMPRESS_BIT};
pub use crate::errors::{MtbError, MtbResult};
pub use crate::key::{Consts, KeyRec, Schema};
pub use crate::material::PieceSet;
pub use crate::table::{Header, MtbFile, Props, HEADER_SIZE};
pub use crate::tablebase::Tablebase;
pub use crate::types::{Flip, LoadMode, MemMode, PieceKind, Score, Side};
pub use crate::types::{
    SCORE_DRAW, SCORE_ILLEGAL, SCORE_MATE, SCORE_MISSING, SCORE_UNKNOWN, SCORE_UNSET,
    SCORE_WINNING,
};
