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

use std::error::Error;
use std::fmt;
use std::io;

/// A [`Result`] type for opening and reading MTB tables.
///
/// [`Result`]: https://doc.rust-lang.org/std/result/enum.Result.html
pub type MtbResult<T> = Result<T, MtbError>;

/// Error when opening or reading a table file.
///
/// Errors on the query path are not surfaced as `Err` values: a query
/// against a broken or absent table yields the `SCORE_MISSING` sentinel
/// instead, as search code treats table lookups as best-effort.
#[derive(Debug)]
pub enum MtbError {
    /// I/O error.
    Read { error: io::Error },
    /// Table file has an unexpected signature.
    Magic,
    /// The file name or the header carries an invalid material name.
    Name { name: String },
    /// LZMA block failed to decode.
    Lzma,
    /// Corrupted table.
    CorruptedTable { file: &'static str, line: u32 },
}

impl fmt::Display for MtbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MtbError::Read { ref error } => write!(f, "i/o error when reading a table: {}", error),
            MtbError::Magic => f.write_str("table file has invalid signature"),
            MtbError::Name { ref name } => write!(f, "invalid material name: {}", name),
            MtbError::Lzma => f.write_str("failed to decode lzma block"),
            MtbError::CorruptedTable { file, line } => {
                write!(f, "corrupted table (detected in {} l. {})", file, line)
            }
        }
    }
}

impl Error for MtbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            MtbError::Read { ref error } => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for MtbError {
    fn from(error: io::Error) -> MtbError {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => MtbError::CorruptedTable {
                file: file!(),
                line: line!(),
            },
            _ => MtbError::Read { error },
        }
    }
}

impl From<xz2::stream::Error> for MtbError {
    fn from(_: xz2::stream::Error) -> MtbError {
        MtbError::Lzma
    }
}

/// Return a `CorruptedTable` error.
macro_rules! throw {
    () => {
        return Err($crate::errors::MtbError::CorruptedTable {
            file: file!(),
            line: line!(),
        })
    };
}

/// Unwrap an `Option` or return a `CorruptedTable` error.
macro_rules! u {
    ($e:expr) => {
        match $e {
            Some(ok) => ok,
            None => throw!(),
        }
    };
}

/// Ensure that a condition holds. Otherwise return a `CorruptedTable` error.
macro_rules! ensure {
    ($cond:expr) => {
        if !$cond {
            throw!();
        }
    };
}
