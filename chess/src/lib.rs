//! The `chess` crate implements the rules of chess on top of a compact four-bitboard position.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
//! # Representation
//! A [`Position`](struct.Position.html) is four 64-bit bitboards. Three of them hold a 3-bit
//! piece code per square, the fourth holds the squares occupied by the side to move. The side
//! to move is always the "white-like" side: [`make_move`](fn.make_move.html) flips the board
//! vertically after every move, so the move generator and the notation codecs only ever reason
//! about one side. A `black` flag travels alongside the position at the FEN and SAN boundaries
//! to print the right coordinates.
//!
//! # Move generation
//! [`movegen`](fn.movegen.html) produces fully legal moves, with pin and check discipline
//! handled up front rather than by make-and-test. Its exact output order is part of the
//! contract: the database's one-byte move encoding stores indices into this list.
//!
//! ```rust
//! use chess::{movegen, Position};
//!
//! let moves = movegen(&Position::STARTPOS);
//! assert_eq!(moves.len(), 20);
//! ```
////////////////////////////////////////////////////////////////////////////////////////////////////
#![warn(missing_docs, missing_debug_implementations, unused_extern_crates)]

use std::convert::TryFrom;
use std::fmt;
use std::mem;
use std::str::FromStr;

pub mod bits;
pub mod bitboard;
mod position;
mod moves;
mod san;
pub mod error;

pub use position::Position;
pub use moves::{Move, MoveList, movegen, movegen_full, make_move, perft};
pub use san::{parse_san, to_san};
pub use error::{FenError, SanError};

use error::TryFromIntError;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Vertical column of the board, labeled from left to right from White's perspective as
/// `A` through `H`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum File {
    // discriminants are spelled out so nothing can go wrong when we use transmute later
    A = 0, B = 1, C = 2, D = 3, E = 4, F = 5, G = 6, H = 7,
}

impl File {
    /// The number of files
    pub const COUNT: usize = File::H as usize + 1;
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (((*self as u8) + b'a') as char).fmt(f)
    }
}

impl FromStr for File {
    type Err = error::ParseFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [c @ b'a'..=b'h'] => Ok(File::try_from((c - b'a') as usize).expect("INFALLIBLE")),
            _ => Err(error::ParseFileError),
        }
    }
}

impl Default for File {
    fn default() -> Self {
        File::A
    }
}

impl TryFrom<usize> for File {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value < Self::COUNT {
            unsafe { Ok(mem::transmute::<u8, File>(value as u8)) }
        } else {
            Err(TryFromIntError)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Horizontal row of the board, labeled from nearest to farthest from White's perspective
/// as `R1` through `R8`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Rank {
    // discriminants are spelled out so nothing can go wrong when we use transmute later
    R1 = 0, R2 = 1, R3 = 2, R4 = 3, R5 = 4, R6 = 5, R7 = 6, R8 = 7,
}

impl Rank {
    /// The number of ranks
    pub const COUNT: usize = Rank::R8 as usize + 1;
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (((*self as u8) + b'1') as char).fmt(f)
    }
}

impl FromStr for Rank {
    type Err = error::ParseRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [c @ b'1'..=b'8'] => Ok(Rank::try_from((c - b'1') as usize).expect("INFALLIBLE")),
            _ => Err(error::ParseRankError),
        }
    }
}

impl Default for Rank {
    fn default() -> Self {
        Rank::R1
    }
}

impl TryFrom<usize> for Rank {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value < Self::COUNT {
            unsafe { Ok(mem::transmute::<u8, Rank>(value as u8)) }
        } else {
            Err(TryFromIntError)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A specific square on the board.
///
/// Squares are numbered rank-major from a1 = 0 to h8 = 63, so that a vertical flip of the
/// board is a byte swap of a bitboard.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Square {
    // discriminants are spelled out so nothing can go wrong when we use transmute later
    A1 = 0o00, B1 = 0o01, C1 = 0o02, D1 = 0o03, E1 = 0o04, F1 = 0o05, G1 = 0o06, H1 = 0o07,
    A2 = 0o10, B2 = 0o11, C2 = 0o12, D2 = 0o13, E2 = 0o14, F2 = 0o15, G2 = 0o16, H2 = 0o17,
    A3 = 0o20, B3 = 0o21, C3 = 0o22, D3 = 0o23, E3 = 0o24, F3 = 0o25, G3 = 0o26, H3 = 0o27,
    A4 = 0o30, B4 = 0o31, C4 = 0o32, D4 = 0o33, E4 = 0o34, F4 = 0o35, G4 = 0o36, H4 = 0o37,
    A5 = 0o40, B5 = 0o41, C5 = 0o42, D5 = 0o43, E5 = 0o44, F5 = 0o45, G5 = 0o46, H5 = 0o47,
    A6 = 0o50, B6 = 0o51, C6 = 0o52, D6 = 0o53, E6 = 0o54, F6 = 0o55, G6 = 0o56, H6 = 0o57,
    A7 = 0o60, B7 = 0o61, C7 = 0o62, D7 = 0o63, E7 = 0o64, F7 = 0o65, G7 = 0o66, H7 = 0o67,
    A8 = 0o70, B8 = 0o71, C8 = 0o72, D8 = 0o73, E8 = 0o74, F8 = 0o75, G8 = 0o76, H8 = 0o77,
}

impl Square {
    /// The number of squares
    pub const COUNT: usize = Square::H8 as usize + 1;

    /// Returns a square from its file and rank
    pub fn from_coord(file: File, rank: Rank) -> Square {
        Square::try_from(((rank as usize) << 3) + file as usize).expect("INFALLIBLE")
    }

    /// Returns the square's file
    pub fn file(self) -> File {
        File::try_from((self as usize) & 7).expect("INFALLIBLE")
    }

    /// Returns the square's rank
    pub fn rank(self) -> Rank {
        Rank::try_from((self as usize) >> 3).expect("INFALLIBLE")
    }

    /// Returns the square mirrored vertically (a1 becomes a8)
    pub fn flip_rank(self) -> Square {
        Square::try_from(self as usize ^ 0o70).expect("INFALLIBLE")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.file().to_string() + &self.rank().to_string()).fmt(f)
    }
}

impl FromStr for Square {
    type Err = error::ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c: Vec<_> = s.chars().collect();
        if c.len() == 2 {
            Ok(Square::from_coord(c[0].to_string().parse()?, c[1].to_string().parse()?))
        } else {
            Err(error::ParseSquareError)
        }
    }
}

impl Default for Square {
    fn default() -> Self {
        Square::A1
    }
}

impl TryFrom<usize> for Square {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value < Self::COUNT {
            unsafe { Ok(mem::transmute::<u8, Square>(value as u8)) }
        } else {
            Err(TryFromIntError)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The type of a chess piece.
///
/// The discriminants are the 3-bit per-square codes of the board planes. `Castle` marks a
/// rook which still carries a castling right; queries through [`Position::on`] fold it back
/// to `Rook`.
///
/// [`Position::on`]: struct.Position.html#method.on
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Piece {
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Castle = 5,
    Queen = 6,
    King = 7,
}

impl Piece {
    /// The number of piece codes, including the empty code 0
    pub const COUNT: usize = Piece::King as usize + 1;
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Piece::Pawn => "P",
            Piece::Knight => "N",
            Piece::Bishop => "B",
            Piece::Rook | Piece::Castle => "R",
            Piece::Queen => "Q",
            Piece::King => "K",
        }.fmt(f)
    }
}

impl FromStr for Piece {
    type Err = error::ParsePieceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P"|"p" => Ok(Piece::Pawn),
            "N"|"n" => Ok(Piece::Knight),
            "B"|"b" => Ok(Piece::Bishop),
            "R"|"r" => Ok(Piece::Rook),
            "Q"|"q" => Ok(Piece::Queen),
            "K"|"k" => Ok(Piece::King),
            _       => Err(error::ParsePieceError),
        }
    }
}

impl Default for Piece {
    fn default() -> Self {
        Piece::Pawn
    }
}

impl TryFrom<usize> for Piece {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value > 0 && value < Self::COUNT {
            unsafe { Ok(mem::transmute::<u8, Piece>(value as u8)) }
        } else {
            Err(TryFromIntError)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The result of a game, as recorded by a PGN result token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameResult {
    /// No result token has been seen
    Unknown = 0,
    /// The game was abandoned or is still in progress (`*`)
    Incomplete = 1,
    /// White won (`1-0`)
    White = 2,
    /// The game was drawn (`1/2-1/2`)
    Draw = 3,
    /// Black won (`0-1`)
    Black = 4,
}

impl GameResult {
    /// The number of result values
    pub const COUNT: usize = GameResult::Black as usize + 1;
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::White => "1-0",
            GameResult::Black => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Unknown | GameResult::Incomplete => "*",
        }.fmt(f)
    }
}

impl Default for GameResult {
    fn default() -> Self {
        GameResult::Unknown
    }
}

impl TryFrom<usize> for GameResult {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value < Self::COUNT {
            unsafe { Ok(mem::transmute::<u8, GameResult>(value as u8)) }
        } else {
            Err(TryFromIntError)
        }
    }
}
