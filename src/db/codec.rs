//! Compact on-disk encodings for tag pairs and move sequences
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
//! Two move encodings coexist. The default writes one byte per ply: the index of the move
//! in the deterministic `movegen` ordering of the current position, which is always below
//! 256 for chess. The packed 16-bit form stores the move fields directly and terminates
//! with a `src == dst` sentinel carrying the game result.
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::convert::TryFrom;

use chess::{make_move, movegen, GameResult, Move, Piece, Position, Square};

use crate::error::{CoreError, Error, Result};
use crate::io::Buffer;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The single-byte ids of the tag names the database stores
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TagId {
    Null = 0,
    Event = 1,
    Site = 2,
    Date = 3,
    Round = 4,
    White = 5,
    Black = 6,
    Result = 7,
    WhiteElo = 8,
    BlackElo = 9,
}

impl TagId {
    /// The number of tag ids
    pub const COUNT: usize = TagId::BlackElo as usize + 1;

    /// Maps a PGN tag name to its id; unknown names map to `Null` and are not stored
    pub fn from_name(name: &str) -> TagId {
        match name {
            "Event" => TagId::Event,
            "Site" => TagId::Site,
            "Date" => TagId::Date,
            "Round" => TagId::Round,
            "White" => TagId::White,
            "Black" => TagId::Black,
            "Result" => TagId::Result,
            "WhiteElo" => TagId::WhiteElo,
            "BlackElo" => TagId::BlackElo,
            _ => TagId::Null,
        }
    }

    /// The PGN tag name for this id
    pub fn name(self) -> &'static str {
        match self {
            TagId::Null => "(null)",
            TagId::Event => "Event",
            TagId::Site => "Site",
            TagId::Date => "Date",
            TagId::Round => "Round",
            TagId::White => "White",
            TagId::Black => "Black",
            TagId::Result => "Result",
            TagId::WhiteElo => "WhiteElo",
            TagId::BlackElo => "BlackElo",
        }
    }
}

impl TryFrom<u8> for TagId {
    type Error = Error;

    fn try_from(value: u8) -> Result<TagId> {
        if (value as usize) < TagId::COUNT {
            Ok(unsafe { std::mem::transmute::<u8, TagId>(value) })
        } else {
            Err(CoreError::OutOfRange.into())
        }
    }
}

/// Appends one `(id, ULEB128 length, bytes)` record to a tag block under construction.
///
/// `Null` ids are dropped, since a zero id terminates the block.
pub fn write_tag(out: &mut Vec<u8>, id: TagId, value: &[u8]) {
    if id == TagId::Null {
        return;
    }

    out.push(id as u8);
    crate::io::push_uleb128(out, value.len() as u64);
    out.extend_from_slice(value);
}

/// Terminates a tag block
pub fn finish_tags(out: &mut Vec<u8>) {
    out.push(TagId::Null as u8);
}

/// Walks a tag block, invoking `visitor` for each record. Returns the bytes consumed,
/// terminator included.
pub fn parse_tags<'a, V>(block: &'a [u8], mut visitor: V) -> Result<usize>
where
    V: FnMut(TagId, &'a [u8]),
{
    let mut buf = Buffer::new(block);

    while buf.remaining() > 0 {
        let id = buf.read_u8();
        if id == TagId::Null as u8 {
            break;
        }

        let id = TagId::try_from(id)?;
        if buf.remaining() == 0 {
            return Err(CoreError::OutOfRange.into());
        }
        let len = buf.read_uleb128() as usize;
        if len > buf.remaining() {
            return Err(CoreError::OutOfRange.into());
        }

        visitor(id, buf.read_bytes(len));
    }

    Ok(buf.pos())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// index-of-list encoding: one byte per ply

/// Appends the move-list index of `mv` in `prev` to an index-encoded move block
pub fn encode_move_index(out: &mut Vec<u8>, prev: &Position, mv: &Move) -> Result<()> {
    let moves = movegen(prev);

    match moves.index_of(mv) {
        Some(idx) => {
            debug_assert!(idx < 256);
            out.push(idx as u8);
            Ok(())
        }
        None => Err(CoreError::OutOfRange.into()),
    }
}

/// Replays an index-encoded move block from `start`, invoking `visitor` with the position
/// before the move, the move, and the position after it
pub fn decode_moves_indexed<V>(block: &[u8], start: Position, mut visitor: V) -> Result<()>
where
    V: FnMut(&Position, Move, &Position),
{
    let mut pos = start;

    for &idx in block {
        let moves = movegen(&pos);
        if usize::from(idx) >= moves.len() {
            return Err(CoreError::OutOfRange.into());
        }

        let mv = moves[usize::from(idx)];
        let next = make_move(pos, mv);
        visitor(&pos, mv, &next);
        pos = next;
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// packed 16-bit encoding: src:6 | dst:6 | piece:3 | castling:1

/// Packs a move into its 16-bit wire form
pub fn pack_move(mv: &Move) -> u16 {
    mv.src as u16 | (mv.dst as u16) << 6 | (mv.piece as u16) << 12 | (mv.castling as u16) << 15
}

/// Unpacks a 16-bit move; fails on the zero piece code (the caller handles the
/// `src == dst` sentinel first)
pub fn unpack_move(x: u16) -> Result<Move> {
    let src = Square::try_from((x & 63) as usize).map_err(|_| Error::Core(CoreError::OutOfRange))?;
    let dst =
        Square::try_from((x >> 6 & 63) as usize).map_err(|_| Error::Core(CoreError::OutOfRange))?;
    let piece =
        Piece::try_from((x >> 12 & 7) as usize).map_err(|_| Error::Core(CoreError::OutOfRange))?;

    Ok(Move::new(src, dst, piece, x >> 15 != 0))
}

/// Appends a move in packed 16-bit form
pub fn encode_move_u16(out: &mut Vec<u8>, mv: &Move) {
    out.extend_from_slice(&pack_move(mv).to_le_bytes());
}

/// Appends the `src == dst` end-of-game sentinel carrying the result in the piece field
pub fn encode_result_u16(out: &mut Vec<u8>, result: GameResult) {
    let sentinel = (result as u16) << 12;
    out.extend_from_slice(&sentinel.to_le_bytes());
}

/// Replays a packed 16-bit move block from `start` until its sentinel, invoking `visitor`
/// as [`decode_moves_indexed`](fn.decode_moves_indexed.html) does. Returns the recorded
/// result, or `Unknown` when the block ends without a sentinel.
pub fn decode_moves_u16<V>(block: &[u8], start: Position, mut visitor: V) -> Result<GameResult>
where
    V: FnMut(&Position, Move, &Position),
{
    let mut buf = Buffer::new(block);
    let mut pos = start;

    while buf.remaining() >= 2 {
        let x = buf.read_u16();

        if x & 63 == x >> 6 & 63 {
            let result = GameResult::try_from((x >> 12 & 7) as usize)
                .map_err(|_| Error::Core(CoreError::OutOfRange))?;
            return Ok(result);
        }

        let mv = unpack_move(x)?;
        let next = make_move(pos, mv);
        visitor(&pos, mv, &next);
        pos = next;
    }

    Ok(GameResult::Unknown)
}

/// Returns the byte length of a packed 16-bit move block, sentinel included
pub fn skip_moves_u16(block: &[u8]) -> usize {
    let mut buf = Buffer::new(block);

    while buf.remaining() >= 2 {
        let x = buf.read_u16();
        if x & 63 == x >> 6 & 63 {
            break;
        }
    }

    buf.pos()
}
