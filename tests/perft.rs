//! Move generation correctness via [perft]: pseudo-legal expansion with
//! king-capture filtering has to reproduce the published node counts exactly,
//! which exercises castling, en passant, promotions and pin handling at once.
//!
//! [perft]: https://www.chessprogramming.org/Perft

use pretty_assertions::assert_eq;
use skiff::chess::position::{Position, perft};

fn expect_perft(fen: &str, counts: &[u64]) {
    let (position, _) = Position::from_fen(fen).expect("test FENs are valid");
    for (plies, count) in counts.iter().enumerate() {
        let depth = plies as u8 + 1;
        assert_eq!(perft(&position, depth), *count, "depth {depth} of {fen}");
    }
}

#[test]
fn starting_position() {
    let position = Position::starting();
    for (depth, count) in [(1, 20), (2, 400), (3, 8_902), (4, 197_281)] {
        assert_eq!(perft(&position, depth), count, "depth {depth}");
    }
}

#[test]
fn kiwipete() {
    expect_perft(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
        &[48, 2_039, 97_862],
    );
}

#[test]
fn position_3() {
    expect_perft("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -", &[14, 191, 2_812, 43_238]);
}

#[test]
fn position_4() {
    expect_perft(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        &[6, 264, 9_467],
    );
}

// The deeper counts take a while without optimizations; run with
// `cargo test --release -- --ignored`.
#[test]
#[ignore]
fn deep_counts() {
    expect_perft(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
        &[48, 2_039, 97_862, 4_085_603],
    );
    assert_eq!(perft(&Position::starting(), 5), 4_865_609);
}
