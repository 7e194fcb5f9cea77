//! Standard Algebraic Notation parser and printer
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use super::*;
use crate::bitboard::*;
use crate::moves::{pinned_pieces, piece_attacks};

fn file_mask(c: u8) -> Bitboard {
    Bitboard(FILE_A.0 << (c - b'a') as u64)
}

// rank digits flip when Black is to move, to land in canonical coordinates
fn rank_mask(c: u8, black: bool) -> Bitboard {
    let shift = (8 * (c - b'1') as u64) ^ if black { 56 } else { 0 };
    Bitboard(RANK_1.0 << shift)
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.file() as u8) as char
}

fn rank_char(sq: Square, black: bool) -> char {
    (b'1' + (sq.rank() as u8 ^ if black { 7 } else { 0 })) as char
}

fn piece_from_letter(c: u8) -> Option<Piece> {
    match c {
        b'N' => Some(Piece::Knight),
        b'B' => Some(Piece::Bishop),
        b'R' => Some(Piece::Rook),
        b'Q' => Some(Piece::Queen),
        b'K' => Some(Piece::King),
        _ => None,
    }
}

/// Parses a move in Standard Algebraic Notation against a canonical-form position.
///
/// `black` must be `true` when the real side to move is Black, so that rank digits are
/// flipped into canonical coordinates. Trailing check and checkmate marks are tolerated.
/// The parser resolves the move's source and destination but does not prove full legality;
/// feeding the result to [`movegen`](fn.movegen.html)'s list is the caller's check.
///
/// ```rust
/// use chess::{parse_san, Move, Piece, Position, Square};
///
/// let mv = parse_san("e4", &Position::STARTPOS, false)?;
/// assert_eq!(mv, Move::new(Square::E2, Square::E4, Piece::Pawn, false));
/// # Ok::<(), chess::SanError>(())
/// ```
pub fn parse_san(san: &str, pos: &Position, black: bool) -> Result<Move, SanError> {
    use SanError::*;

    let s = san.trim_end_matches(|c| c == '+' || c == '#').as_bytes();
    let c = *s.first().ok_or(InvalidInput)?;

    if (b'a'..=b'h').contains(&c) {
        parse_pawn_move(s, pos, black)
    } else if let Some(piece) = piece_from_letter(c) {
        parse_piece_move(s, piece, pos, black)
    } else if c == b'O' {
        match s {
            b"O-O" => Ok(Move::new(Square::E1, Square::G1, Piece::King, true)),
            b"O-O-O" => Ok(Move::new(Square::E1, Square::C1, Piece::King, true)),
            _ => Err(InvalidInput),
        }
    } else {
        Err(InvalidInput)
    }
}

fn parse_pawn_move(s: &[u8], pos: &Position, black: bool) -> Result<Move, SanError> {
    use SanError::*;

    let occ = pos.occupied();
    let file = file_mask(s[0]);
    let mut srcs = pos.white & pos.extract(Piece::Pawn) & file;
    let mut targets = !pos.white;
    let mut piece = Piece::Pawn;

    let mut i = 1;
    let c = *s.get(i).ok_or(InvalidInput)?;
    i += 1;

    if (b'1'..=b'8').contains(&c) {
        // a push: the source is one step south, or two with an empty intermediate square
        targets &= rank_mask(c, black) & file;

        let step = targets.south();
        srcs &= step | (step & !occ).south();
    } else if c == b'x' {
        // a capture; the colour bit with no piece on it is the en-passant destination
        targets |= pos.white & !occ;

        let f = *s.get(i).ok_or(InvalidFile)?;
        i += 1;
        if !(b'a'..=b'h').contains(&f) {
            return Err(InvalidFile);
        }
        targets &= file_mask(f);

        let r = *s.get(i).ok_or(InvalidRank)?;
        i += 1;
        if !(b'1'..=b'8').contains(&r) {
            return Err(InvalidRank);
        }
        targets &= rank_mask(r, black);

        srcs &= targets.south_west() | targets.south_east();
    } else {
        return Err(InvalidInput);
    }

    if s.get(i) == Some(&b'=') {
        let p = *s.get(i + 1).ok_or(InvalidPiece)?;
        piece = match piece_from_letter(p) {
            Some(p) if p != Piece::King => p,
            _ => return Err(InvalidPiece),
        };
    }

    if targets.len() != 1 || srcs.is_empty() {
        return Err(MissingPiece);
    }
    if srcs.len() > 1 {
        return Err(Ambiguous);
    }

    let src = srcs.peek().expect("INFALLIBLE");
    let dst = targets.peek().expect("INFALLIBLE");
    Ok(Move::new(src, dst, piece, false))
}

fn parse_piece_move(s: &[u8], piece: Piece, pos: &Position, black: bool) -> Result<Move, SanError> {
    use SanError::*;

    let occ = pos.occupied();
    let mut srcs = pos.white & pos.extract(piece);
    // exclude only our occupied squares; the en-passant colour bit is a valid destination
    let mut targets = !(pos.white & occ);
    let mut tmp = !Bitboard::new();
    let mut i = 1;

    if let Some(&c) = s.get(i) {
        if (b'a'..=b'h').contains(&c) {
            tmp &= file_mask(c);
            i += 1;
        }
    }
    if let Some(&c) = s.get(i) {
        if (b'1'..=b'8').contains(&c) {
            tmp &= rank_mask(c, black);
            i += 1;
        }
    }
    if s.get(i) == Some(&b'x') {
        targets &= occ;
        i += 1;
    }

    match s.get(i) {
        Some(&c) if (b'a'..=b'h').contains(&c) => {
            // the coordinates read so far were disambiguation after all
            srcs &= tmp;
            targets &= file_mask(c);
            i += 1;

            let r = *s.get(i).ok_or(InvalidRank)?;
            if !(b'1'..=b'8').contains(&r) {
                return Err(InvalidRank);
            }
            targets &= rank_mask(r, black);
        }
        Some(_) => return Err(InvalidInput),
        None => targets &= tmp,
    }

    if targets.len() != 1 {
        return Err(if targets.is_empty() { MissingPiece } else { Ambiguous });
    }
    let dst = targets.peek().expect("INFALLIBLE");

    if srcs.len() > 1 {
        srcs &= piece_attacks(piece, dst, occ);
    }
    if srcs.len() > 1 {
        // a pinned piece that would leave its king ray cannot be the one meant
        let ksq = (pos.extract(Piece::King) & pos.white).peek().expect("INFALLIBLE");
        let mut pinned = srcs & pinned_pieces(pos, ksq);

        while let Some(src) = pinned.pop() {
            if !line_connecting(ksq, src).contains(dst) {
                srcs.remove(src);
            }
        }
    }

    if srcs.is_empty() {
        return Err(MissingPiece);
    }
    if srcs.len() > 1 {
        return Err(Ambiguous);
    }

    Ok(Move::new(srcs.peek().expect("INFALLIBLE"), dst, piece, false))
}

/// Prints a move in Standard Algebraic Notation, using the minimal disambiguation that
/// uniquely identifies it among the legal moves of `pos`.
///
/// Check and checkmate marks are not emitted.
pub fn to_san(mv: Move, pos: &Position, black: bool) -> String {
    if mv.castling {
        return if mv.dst.file() == File::G { "O-O" } else { "O-O-O" }.to_string();
    }

    let occ = pos.occupied();
    let pawn = pos.on(mv.src) == Some(Piece::Pawn);
    let capture = occ.contains(mv.dst) || (pawn && pos.en_passant().contains(mv.dst));
    let mut s = String::new();

    if pawn {
        if capture {
            s.push(file_char(mv.src));
        }
    } else {
        s += &mv.piece.to_string();

        let mut eligible = Bitboard::new();
        for m in movegen(pos).iter() {
            // promotions to the same square never collide in notation
            if !m.castling && m.dst == mv.dst && m.piece == mv.piece
                && pos.on(m.src) != Some(Piece::Pawn)
            {
                eligible.insert(m.src);
            }
        }

        if eligible != Bitboard::from(mv.src) {
            if eligible & mv.src.file().into() == mv.src.into() {
                s.push(file_char(mv.src));
            } else if eligible & mv.src.rank().into() == mv.src.into() {
                s.push(rank_char(mv.src, black));
            } else {
                s.push(file_char(mv.src));
                s.push(rank_char(mv.src, black));
            }
        }
    }

    if capture {
        s.push('x');
    }
    s.push(file_char(mv.dst));
    s.push(rank_char(mv.dst, black));

    if pawn && mv.piece != Piece::Pawn {
        s.push('=');
        s += &mv.piece.to_string();
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(fen: &str, san: &str) -> String {
        let (pos, black) = Position::from_fen(fen).unwrap();
        let mv = parse_san(san, &pos, black).unwrap();
        assert!(movegen(&pos).index_of(&mv).is_some(), "{} not legal in {}", san, fen);
        make_move(pos, mv).to_fen(!black)
    }

    #[test]
    fn pawn_pushes() {
        assert_eq!(
            apply("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -", "e4"),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3"
        );
        assert_eq!(
            apply("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq -", "d4"),
            "rnbqkbnr/pppp1ppp/8/4p3/3PP3/8/PPP2PPP/RNBQKBNR b KQkq d3"
        );
    }

    #[test]
    fn black_ranks_are_flipped() {
        assert_eq!(
            apply("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -", "e5"),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6"
        );
    }

    #[test]
    fn captures_and_recaptures() {
        assert_eq!(
            apply("r1bqkbnr/1ppp1ppp/p1n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq -", "Bxc6"),
            "r1bqkbnr/1ppp1ppp/p1B5/4p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq -"
        );
        assert_eq!(
            apply("r1bqkbnr/1ppp1ppp/p1B5/4p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq -", "dxc6"),
            "r1bqkbnr/1pp2ppp/p1p5/4p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq -"
        );
    }

    #[test]
    fn short_castles() {
        assert_eq!(
            apply("rnbqkb1r/pp2pppp/5n2/2pp4/8/5NP1/PPPPPPBP/RNBQK2R w KQkq -", "O-O"),
            "rnbqkb1r/pp2pppp/5n2/2pp4/8/5NP1/PPPPPPBP/RNBQ1RK1 b kq -"
        );
    }

    #[test]
    fn en_passant_capture_removes_the_pawn() {
        assert_eq!(
            apply("rnbqkb1r/pp2pppp/5n2/2p5/3pP3/5NP1/PPPP1PBP/RNBQ1RK1 b kq e3", "dxe3"),
            "rnbqkb1r/pp2pppp/5n2/2p5/8/4pNP1/PPPP1PBP/RNBQ1RK1 w kq -"
        );
    }

    #[test]
    fn en_passant_in_kiwipete_variant() {
        // dxc6 is recognised as en passant and removes the pawn on c5
        let fen = "r3k2r/p2pqpb1/bn2pnp1/2pPN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq c6";
        let (pos, black) = Position::from_fen(fen).unwrap();
        let mv = parse_san("dxc6", &pos, black).unwrap();

        assert_eq!(mv, Move::new(Square::D5, Square::C6, Piece::Pawn, false));
        let next = make_move(pos, mv);
        assert_eq!(next.rotated().on(Square::C5), None);
    }

    #[test]
    fn ambiguous_piece_moves() {
        let fen = "r1bqkb1r/pppppppp/5n2/2n5/3PP3/2N2N2/PPP2PPP/R1BQKB1R b KQkq -";
        let (pos, black) = Position::from_fen(fen).unwrap();

        assert!(parse_san("Ncxe4", &pos, black).is_ok());
        assert_eq!(parse_san("Nxe4", &pos, black).unwrap_err(), SanError::Ambiguous);
    }

    #[test]
    fn pinned_piece_resolves_ambiguity() {
        // both knights attack d2, but the one on e4 is pinned to the e-file
        let fen = "k3r3/8/8/8/4N3/8/8/1N2K3 w - -";
        let (pos, black) = Position::from_fen(fen).unwrap();

        let mv = parse_san("Nd2", &pos, black).unwrap();
        assert_eq!(mv.src, Square::B1);
    }

    #[test]
    fn piece_may_land_on_the_en_passant_square() {
        // the colour bit with no piece on it is a normal destination for pieces
        let (pos, black) =
            Position::from_fen("rnbqkbnr/pppp1ppp/8/4p1N1/8/8/PPPPPPPP/RNBQKB1R w KQkq e6")
                .unwrap();
        let mv = parse_san("Ne6", &pos, black);
        assert_eq!(mv, Ok(Move::new(Square::G5, Square::E6, Piece::Knight, false)));
    }

    #[test]
    fn promotions() {
        let (pos, black) = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - -").unwrap();
        let mv = parse_san("b8=Q", &pos, black).unwrap();
        assert_eq!(mv, Move::new(Square::B7, Square::B8, Piece::Queen, false));
        assert_eq!(parse_san("b8=K", &pos, black).unwrap_err(), SanError::InvalidPiece);
    }

    #[test]
    fn to_san_uses_minimal_disambiguation() {
        let (pos, _) = Position::from_fen("4k3/8/8/8/8/8/4K3/R6R w - -").unwrap();
        let ra1d1 = Move::new(Square::A1, Square::D1, Piece::Rook, false);
        assert_eq!(to_san(ra1d1, &pos, false), "Rad1");

        let (pos, _) = Position::from_fen("4k3/8/8/R7/8/8/8/R3K3 w Q -").unwrap();
        let ra5a3 = Move::new(Square::A5, Square::A3, Piece::Rook, false);
        assert_eq!(to_san(ra5a3, &pos, false), "R5a3");

        let (pos, _) = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        let ke1e2 = Move::new(Square::E1, Square::E2, Piece::King, false);
        assert_eq!(to_san(ke1e2, &pos, false), "Ke2");
    }

    #[test]
    fn round_trip_over_legal_moves() {
        for fen in &[
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -",
            "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - -",
        ] {
            let (pos, black) = Position::from_fen(fen).unwrap();
            for &mv in movegen(&pos).iter() {
                let san = to_san(mv, &pos, black);
                assert_eq!(parse_san(&san, &pos, black), Ok(mv), "{} in {}", san, fen);
            }
        }
    }
}
