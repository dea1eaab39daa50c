//! Static [evaluation]: predicting the relative value of a position without
//! [`crate::search`]. The whole evaluation is a sum of piece-square table
//! entries, which lets [`crate::chess::position::Position`] maintain its
//! score incrementally as a per-move delta; [`recompute`] exists to establish
//! the score of a freshly parsed position and to cross-check the incremental
//! bookkeeping in debug builds.
//!
//! Scores are in centipawn units throughout.
//!
//! [evaluation]: https://www.chessprogramming.org/Evaluation

pub(crate) mod pst;

use crate::chess::board::Board;

/// A position scoring below this has certainly lost its king: the king's
/// table value dwarfs everything else on the board combined.
pub const MATE_LOWER: i32 = pst::KING_VALUE - 10 * pst::QUEEN_VALUE;

/// No position can score above this; used as the "infinity" of search
/// windows.
pub const MATE_UPPER: i32 = pst::KING_VALUE + 10 * pst::QUEEN_VALUE;

/// Evaluates a board from scratch: piece-square scores of the side to move
/// minus those of the opponent, the latter read through the mirrored square
/// because the single set of tables is written for the side to move.
#[must_use]
pub fn recompute(board: &Board) -> i32 {
    let mut score = 0;
    for index in 0..120 {
        let cell = board.get(index);
        if cell.is_ascii_uppercase() {
            score += pst::score(cell, index);
        } else if cell.is_ascii_lowercase() {
            score -= pst::score(cell.to_ascii_uppercase(), 119 - index);
        }
    }
    score
}
