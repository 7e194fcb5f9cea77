//! Provides the attack tables used to compute piece attacks
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
//  Sliding attacks are a single flat table indexed by `base[sq] + pext(occ, mask[sq])`,
//  where `mask[sq]` covers the inner squares of the piece's rays. The table is filled at
//  first use by enumerating every submask of each relevant mask with the carry-rippler.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use lazy_static::lazy_static;
use crate::bits::{msb, pext};
use super::*;

/// Total number of sliding-attack entries: 5,248 bishop + 102,400 rook configurations.
const SLIDING_ENTRIES: usize = 107_648;

#[derive(Debug, Copy, Clone)]
struct Slider {
    mask: u64,
    base: usize,
}

#[derive(Debug)]
struct Tables {
    king: [Bitboard; Square::COUNT],
    knight: [Bitboard; Square::COUNT],
    bishop: [Slider; Square::COUNT],
    rook: [Slider; Square::COUNT],
    sliding: Vec<Bitboard>,
}

/// The diagonal (a1-h8 direction is obtained by a byte swap) with file + rank == `n`
const fn diagonal(n: usize) -> u64 {
    if n < 8 {
        0x0102_0408_1020_4080 >> (8 * (7 - n))
    } else {
        0x0102_0408_1020_4080 << (8 * (n - 7))
    }
}

/// Attacks along `mask` from `sq` with blockers `occ`, by the o^(o-2r) subtraction trick
const fn sliding_attacks(sq: usize, mask: u64, occ: u64) -> u64 {
    let occ = occ & mask;
    let s = 1u64 << sq;

    let lo = occ & s.wrapping_sub(1);
    let hi = occ & !lo;

    let lo = 0x8000_0000_0000_0000u64 >> msb(lo | 1);
    mask & (hi ^ hi.wrapping_sub(lo)) & !s
}

impl Tables {
    fn generate() -> Tables {
        let mut king = [Bitboard::new(); Square::COUNT];
        let mut knight = [Bitboard::new(); Square::COUNT];
        let mut bishop = [Slider { mask: 0, base: 0 }; Square::COUNT];
        let mut rook = [Slider { mask: 0, base: 0 }; Square::COUNT];
        let mut sliding = Vec::with_capacity(SLIDING_ENTRIES);

        for sq in 0..Square::COUNT {
            let s = Bitboard(1u64 << sq);
            let (file, rank) = (sq & 7, sq >> 3);

            let ring = s.west() | s.east() | s;
            king[sq] = (ring | ring.north() | ring.south()) & !s;

            knight[sq] = s.north().north_east() | s.north().north_west()
                       | s.east().north_east() | s.east().south_east()
                       | s.west().north_west() | s.west().south_west()
                       | s.south().south_east() | s.south().south_west();

            let mut rippler = |mask: u64, mask1: u64, mask2: u64| {
                let base = sliding.len();
                let mut occ = 0u64;

                loop {
                    sliding.push(Bitboard(
                        sliding_attacks(sq, mask1, occ) | sliding_attacks(sq, mask2, occ)));
                    occ = occ.wrapping_sub(mask) & mask;
                    if occ == 0 {
                        break;
                    }
                }

                Slider { mask, base }
            };

            let edges = RANK_1.0 | RANK_8.0 | FILE_A.0 | FILE_H.0;
            let mask1 = diagonal(file + rank);
            let mask2 = diagonal(file + 7 - rank).swap_bytes();
            bishop[sq] = rippler((mask1 | mask2) & !(edges | s.0), mask1, mask2);

            let mask1 = RANK_1.0 << (8 * rank);
            let mask2 = FILE_A.0 << file;
            let mask = ((mask1 & !(FILE_A.0 | FILE_H.0)) | (mask2 & !(RANK_1.0 | RANK_8.0)))
                & !s.0;
            rook[sq] = rippler(mask, mask1, mask2);
        }

        debug_assert_eq!(sliding.len(), SLIDING_ENTRIES);
        Tables { king, knight, bishop, rook, sliding }
    }
}

lazy_static! {
    static ref TABLES: Tables = Tables::generate();
}

/// Computes king-like attacks to or from `sq`
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    TABLES.king[sq as usize]
}

/// Computes knight-like attacks to or from `sq`
#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    TABLES.knight[sq as usize]
}

/// Computes bishop-like attacks to or from `sq` based on the occupied squares given by `occ`
#[inline]
pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let entry = &TABLES.bishop[sq as usize];
    TABLES.sliding[entry.base + pext(occ.0, entry.mask) as usize]
}

/// Computes rook-like attacks to or from `sq` based on the occupied squares given by `occ`
#[inline]
pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let entry = &TABLES.rook[sq as usize];
    TABLES.sliding[entry.base + pext(occ.0, entry.mask) as usize]
}

/// Computes queen-like attacks to or from `sq` based on the occupied squares given by `occ`
#[inline]
pub fn queen_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    rook_attacks(sq, occ) | bishop_attacks(sq, occ)
}

/// Returns the open line segment strictly between `a` and `b`, or the empty set if they do
/// not share a rank, file or diagonal
pub fn line_between(a: Square, b: Square) -> Bitboard {
    let diag = bishop_attacks(a, b.into());
    let orth = rook_attacks(a, b.into());

    let mut line = Bitboard::new();
    if diag.contains(b) {
        line |= bishop_attacks(b, a.into()) & diag;
    }
    if orth.contains(b) {
        line |= rook_attacks(b, a.into()) & orth;
    }

    line
}

/// Returns the full ray from `a` through `b` (including `b`, excluding `a`), or the empty
/// set if they do not share a rank, file or diagonal
pub fn line_connecting(a: Square, b: Square) -> Bitboard {
    let diag = bishop_attacks(a, Bitboard::new());
    let orth = rook_attacks(a, Bitboard::new());

    let mut line = Bitboard::new();
    if diag.contains(b) {
        line |= Bitboard::from(b) | (bishop_attacks(b, Bitboard::new()) & diag);
    }
    if orth.contains(b) {
        line |= Bitboard::from(b) | (rook_attacks(b, Bitboard::new()) & orth);
    }

    line
}
