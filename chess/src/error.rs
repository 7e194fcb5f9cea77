//! Defines the error types needed by the rules core
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::error::Error;
use std::fmt;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An error in parsing a chess piece
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParsePieceError;

impl fmt::Display for ParsePieceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "cannot parse chess piece".fmt(f)
    }
}

impl Error for ParsePieceError { }

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An error in parsing a file
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseFileError;

impl fmt::Display for ParseFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "cannot parse file".fmt(f)
    }
}

impl Error for ParseFileError { }

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An error in parsing a rank
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseRankError;

impl fmt::Display for ParseRankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "cannot parse rank".fmt(f)
    }
}

impl Error for ParseRankError { }

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An error in parsing a square
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseSquareError;

impl fmt::Display for ParseSquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "cannot parse square".fmt(f)
    }
}

impl Error for ParseSquareError { }

impl From<ParseFileError> for ParseSquareError {
    fn from(_: ParseFileError) -> Self {
        ParseSquareError
    }
}

impl From<ParseRankError> for ParseSquareError {
    fn from(_: ParseRankError) -> Self {
        ParseSquareError
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An error in converting an integer to another type
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TryFromIntError;

impl fmt::Display for TryFromIntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "integer out of range".fmt(f)
    }
}

impl Error for TryFromIntError { }

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An error that can be returned when parsing a position from a FEN record
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FenError {
    /// A character in the piece placement field is not a piece, digit or separator
    UnexpectedInPiecePlacement,
    /// The piece placement field does not cover all 64 squares
    IncompletePiecePlacement,
    /// The side-to-move field is not `w` or `b`
    InvalidSideToMove,
    /// A castling letter has no matching rook and king
    InvalidCastling,
    /// The en-passant field is not `-` or a legal target square
    InvalidEPSquare,
    /// A field separator is missing
    MissingSpace,
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::UnexpectedInPiecePlacement => "unexpected character in piece placement",
            FenError::IncompletePiecePlacement => "incomplete piece placement",
            FenError::InvalidSideToMove => "invalid side to move",
            FenError::InvalidCastling => "invalid castling flags",
            FenError::InvalidEPSquare => "invalid en-passant square",
            FenError::MissingSpace => "missing space between fields",
        }.fmt(f)
    }
}

impl Error for FenError { }

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An error that can be returned when parsing a move in Standard Algebraic Notation
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SanError {
    /// The input is empty or starts with a character that cannot begin a move
    InvalidInput,
    /// A file letter was expected
    InvalidFile,
    /// A rank digit was expected
    InvalidRank,
    /// The piece or promotion letter is not a piece
    InvalidPiece,
    /// More than one piece could make the move
    Ambiguous,
    /// No piece can make the move
    MissingPiece,
}

impl fmt::Display for SanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanError::InvalidInput => "cannot parse move",
            SanError::InvalidFile => "invalid file",
            SanError::InvalidRank => "invalid rank",
            SanError::InvalidPiece => "invalid piece",
            SanError::Ambiguous => "ambiguous move",
            SanError::MissingPiece => "no piece can make the move",
        }.fmt(f)
    }
}

impl Error for SanError { }
