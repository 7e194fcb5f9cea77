//! Scalar bit manipulation used by the board representation
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Returns the number of set bits in `x`
#[inline]
pub const fn popcount(x: u64) -> u32 {
    x.count_ones()
}

/// Returns the index of the least significant set bit (64 if `x` is zero)
#[inline]
pub const fn lsb(x: u64) -> u32 {
    x.trailing_zeros()
}

/// Returns the number of leading zero bits (64 if `x` is zero)
#[inline]
pub const fn msb(x: u64) -> u32 {
    x.leading_zeros()
}

/// Reverses the byte order of `x`. On a bitboard this is a vertical flip.
#[inline]
pub const fn byteswap(x: u64) -> u64 {
    x.swap_bytes()
}

/// Gathers the bits of `x` selected by `mask` into the low-order positions, in mask-bit order.
///
/// Reference implementation of the BMI2 `pext` instruction; usable in const contexts, which
/// is what the attack-table generator relies on.
///
/// ```rust
/// use chess::bits::pext;
/// assert_eq!(pext(0b1010_1010, 0b1100_0110), 0b1001);
/// ```
pub const fn pext(x: u64, mut mask: u64) -> u64 {
    let mut res = 0;
    let mut bb = 1u64;

    while mask != 0 {
        if x & mask & mask.wrapping_neg() != 0 {
            res |= bb;
        }

        mask &= mask - 1;
        bb += bb;
    }

    res
}

/// Scatters the low-order bits of `x` to the positions selected by `mask`; the inverse of
/// [`pext`](fn.pext.html).
pub const fn pdep(x: u64, mut mask: u64) -> u64 {
    let mut res = 0;
    let mut bb = 1u64;

    while mask != 0 {
        if x & bb != 0 {
            res |= mask & mask.wrapping_neg();
        }

        mask &= mask - 1;
        bb += bb;
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn scan_and_count() {
        assert_eq!(popcount(0), 0);
        assert_eq!(popcount(u64::max_value()), 64);
        assert_eq!(lsb(0b1000), 3);
        assert_eq!(msb(1 << 63), 0);
        assert_eq!(byteswap(0x0102_0304_0506_0708), 0x0807_0605_0403_0201);
    }

    #[test]
    fn pext_gathers_in_mask_order() {
        assert_eq!(pext(0xffff_ffff_ffff_ffff, 0), 0);
        assert_eq!(pext(0xffff_ffff_ffff_ffff, 0x8000_0000_0000_0001), 0b11);
        assert_eq!(pext(0x8000_0000_0000_0000, 0x8000_0000_0000_0001), 0b10);
        assert_eq!(pdep(0b10, 0x8000_0000_0000_0001), 0x8000_0000_0000_0000);
    }

    #[test]
    fn pext_inverts_pdep() {
        let mut rng = rand::thread_rng();

        for _ in 0..10_000 {
            let x: u64 = rng.gen();
            let mask: u64 = rng.gen::<u64>() & rng.gen::<u64>();
            let keep = if popcount(mask) == 64 {
                u64::max_value()
            } else {
                (1u64 << popcount(mask)) - 1
            };

            assert_eq!(pext(pdep(x, mask), mask), x & keep);
            assert_eq!(pdep(pext(x, mask), mask), x & mask);
        }
    }
}
