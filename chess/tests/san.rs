//! End-to-end tests of the SAN codec against known positions
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

use chess::{make_move, movegen, parse_san, to_san, Position};

/// Applies `san` to `fen` and compares the resulting position with `expected`, ignoring
/// the en-passant field of both records
fn check(fen: &str, san: &str, expected: &str) {
    let (pos, black) = Position::from_fen(fen).unwrap();
    let mv = parse_san(san, &pos, black).unwrap();
    assert!(movegen(&pos).index_of(&mv).is_some(), "{} not generated in {}", san, fen);

    let got = make_move(pos, mv).to_fen(!black);
    let strip = |s: &str| s.rsplitn(2, ' ').last().unwrap().to_string();
    assert_eq!(strip(&got), strip(expected), "applying {} to {}", san, fen);
}

#[test]
fn e4_from_the_starting_position() {
    check(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
        "e4",
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -",
    );
}

#[test]
fn short_castling_moves_both_king_and_rook() {
    check(
        "rnbqkb1r/pp2pppp/5n2/2pp4/8/5NP1/PPPPPPBP/RNBQK2R w KQkq -",
        "O-O",
        "rnbqkb1r/pp2pppp/5n2/2pp4/8/5NP1/PPPPPPBP/RNBQ1RK1 b kq -",
    );
}

#[test]
fn pinned_pawn_cannot_capture_en_passant() {
    // the classic horizontal pin through the en-passant square
    let (pos, _) = Position::from_fen("k7/8/8/KPp4r/8/8/8/8 w - c6").unwrap();
    let ep = pos.en_passant();

    for mv in movegen(&pos).iter() {
        assert!(!ep.contains(mv.dst), "en-passant capture must be suppressed");
    }
}

#[test]
fn dxc6_is_recognised_as_en_passant() {
    check(
        "r3k2r/p2pqpb1/bn2pnp1/2pPN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq c6",
        "dxc6",
        "r3k2r/p2pqpb1/bnP1pnp1/4N3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b KQkq -",
    );
}

#[test]
fn printing_round_trips_through_the_parser() {
    for fen in &[
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq -",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ -",
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - -",
        "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - -",
    ] {
        let (pos, black) = Position::from_fen(fen).unwrap();

        for &mv in movegen(&pos).iter() {
            let san = to_san(mv, &pos, black);
            assert_eq!(parse_san(&san, &pos, black), Ok(mv), "{} in {}", san, fen);

            // one ply deeper, to cover the opponent's replies as well
            let next = make_move(pos, mv);
            for &reply in movegen(&next).iter() {
                let san = to_san(reply, &next, !black);
                assert_eq!(parse_san(&san, &next, !black), Ok(reply), "{} after {}", san, fen);
            }
        }
    }
}
