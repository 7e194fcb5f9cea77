//! Tests the move generator against the standard perft node counts
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

mod perft {
    use chess::{perft, Position};

    fn count(fen: &str, depth: usize) -> u64 {
        println!("\n{}", fen);
        let (pos, _) = Position::from_fen(fen).unwrap();

        let count = perft(&pos, depth);
        println!("Depth {} total:\t{:12}", depth, count);

        count
    }

    mod startpos {
        use super::count;

        const FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";

        #[test]
        fn depth_1() { assert_eq!(count(FEN, 1), 20); }

        #[test]
        fn depth_2() { assert_eq!(count(FEN, 2), 400); }

        #[test]
        fn depth_3() { assert_eq!(count(FEN, 3), 8_902); }

        #[test]
        fn depth_4() { assert_eq!(count(FEN, 4), 197_281); }

        #[test]
        fn depth_5() { assert_eq!(count(FEN, 5), 4_865_609); }

        #[test]
        #[ignore]
        fn depth_6() { assert_eq!(count(FEN, 6), 119_060_324); }
    }

    mod kiwipete {
        use super::count;

        const FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -";

        #[test]
        fn depth_1() { assert_eq!(count(FEN, 1), 48); }

        #[test]
        fn depth_2() { assert_eq!(count(FEN, 2), 2_039); }

        #[test]
        fn depth_3() { assert_eq!(count(FEN, 3), 97_862); }

        #[test]
        fn depth_4() { assert_eq!(count(FEN, 4), 4_085_603); }

        #[test]
        #[ignore]
        fn depth_5() { assert_eq!(count(FEN, 5), 193_690_690); }
    }

    mod cpw_3 {
        use super::count;

        const FEN: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -";

        #[test]
        fn depth_1() { assert_eq!(count(FEN, 1), 14); }

        #[test]
        fn depth_2() { assert_eq!(count(FEN, 2), 191); }

        #[test]
        fn depth_3() { assert_eq!(count(FEN, 3), 2_812); }

        #[test]
        fn depth_4() { assert_eq!(count(FEN, 4), 43_238); }

        #[test]
        fn depth_5() { assert_eq!(count(FEN, 5), 674_624); }

        #[test]
        fn depth_6() { assert_eq!(count(FEN, 6), 11_030_083); }
    }

    mod cpw_4 {
        use super::count;

        const FEN: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq -";
        const MIRRORED: &str = "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ -";

        #[test]
        fn depth_1() { assert_eq!(count(FEN, 1), 6); }

        #[test]
        fn depth_2() { assert_eq!(count(FEN, 2), 264); }

        #[test]
        fn depth_3() { assert_eq!(count(FEN, 3), 9_467); }

        #[test]
        fn depth_4() { assert_eq!(count(FEN, 4), 422_333); }

        #[test]
        fn depth_5() { assert_eq!(count(FEN, 5), 15_833_292); }

        #[test]
        fn mirrored_depth_4() { assert_eq!(count(MIRRORED, 4), 422_333); }
    }

    mod cpw_5 {
        use super::count;

        const FEN: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ -";

        #[test]
        fn depth_1() { assert_eq!(count(FEN, 1), 44); }

        #[test]
        fn depth_2() { assert_eq!(count(FEN, 2), 1_486); }

        #[test]
        fn depth_3() { assert_eq!(count(FEN, 3), 62_379); }

        #[test]
        fn depth_4() { assert_eq!(count(FEN, 4), 2_103_487); }

        #[test]
        #[ignore]
        fn depth_5() { assert_eq!(count(FEN, 5), 89_941_194); }
    }

    mod cpw_6 {
        use super::count;

        const FEN: &str = "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - -";

        #[test]
        fn depth_1() { assert_eq!(count(FEN, 1), 46); }

        #[test]
        fn depth_2() { assert_eq!(count(FEN, 2), 2_079); }

        #[test]
        fn depth_3() { assert_eq!(count(FEN, 3), 89_890); }

        #[test]
        fn depth_4() { assert_eq!(count(FEN, 4), 3_894_594); }

        #[test]
        #[ignore]
        fn depth_5() { assert_eq!(count(FEN, 5), 164_075_551); }
    }

    mod promotions {
        use super::count;

        const FEN: &str = "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - -";

        #[test]
        fn depth_1() { assert_eq!(count(FEN, 1), 24); }

        #[test]
        fn depth_2() { assert_eq!(count(FEN, 2), 496); }

        #[test]
        fn depth_3() { assert_eq!(count(FEN, 3), 9_483); }

        #[test]
        fn depth_4() { assert_eq!(count(FEN, 4), 182_838); }

        #[test]
        fn depth_5() { assert_eq!(count(FEN, 5), 3_605_103); }
    }
}
