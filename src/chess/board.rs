//! The 10x12 [mailbox] board: a flat 120-byte array in which off-board
//! sentinels make bounds checks during move generation unnecessary.
//!
//! Cell encoding: uppercase letters are pieces of the side to move, lowercase
//! letters belong to the opponent, `b' '` is an empty playing square, `b'.'`
//! is an off-board sentinel and `b'\n'` separates ranks (doubling as the left
//! sentinel column).
//!
//! [mailbox]: https://www.chessprogramming.org/Mailbox

use std::fmt;

use super::core::{A8, BOARD_CELLS, H1};

/// The board of a side-relative position: whichever side is to move is always
/// uppercase and always plays towards the low indices.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board([u8; BOARD_CELLS]);

impl Board {
    /// The standard starting position, side to move at the bottom.
    pub const INITIAL: Self = Self(
        *b"\n.........\
           \n.........\
           \nrnbqkbnr.\
           \npppppppp.\
           \n        .\
           \n        .\
           \n        .\
           \n        .\
           \nPPPPPPPP.\
           \nRNBQKBNR.\
           \n.........\
           \n.........",
    );

    /// An empty playing area, used as the seed for FEN parsing.
    pub(crate) const EMPTY: Self = Self(
        *b"\n.........\
           \n.........\
           \n        .\
           \n        .\
           \n        .\
           \n        .\
           \n        .\
           \n        .\
           \n        .\
           \n        .\
           \n.........\
           \n.........",
    );

    pub(crate) fn get(&self, index: i16) -> u8 {
        self.0[index as usize]
    }

    pub(crate) fn set(&mut self, index: i16, cell: u8) {
        self.0[index as usize] = cell;
    }

    /// Rotates the board 180 degrees and hands it to the other player:
    /// reversing the byte array performs the rotation, swapping letter case
    /// changes the ownership of every piece.
    #[must_use]
    pub(crate) fn rotated(&self) -> Self {
        let mut cells = [0; BOARD_CELLS];
        for (cell, &original) in cells.iter_mut().zip(self.0.iter().rev()) {
            *cell = if original.is_ascii_uppercase() {
                original.to_ascii_lowercase()
            } else {
                original.to_ascii_uppercase()
            };
        }
        Self(cells)
    }

    /// All squares holding a piece of the side to move.
    pub(crate) fn own_pieces(&self) -> impl Iterator<Item = (i16, u8)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_ascii_uppercase())
            .map(|(index, cell)| (index as i16, *cell))
    }

    pub(crate) fn contains(&self, cell: u8) -> bool {
        self.0.contains(&cell)
    }
}

/// The side to move owns this piece.
pub(crate) fn is_own(cell: u8) -> bool {
    cell.is_ascii_uppercase()
}

/// The opponent owns this piece.
pub(crate) fn is_their(cell: u8) -> bool {
    cell.is_ascii_lowercase()
}

pub(crate) const EMPTY: u8 = b' ';

/// Sentinel cells surrounding the playing area.
pub(crate) fn is_off_board(cell: u8) -> bool {
    cell == b'.' || cell == b'\n'
}

impl fmt::Display for Board {
    /// Renders the playing area rank by rank, empty squares as dots.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in (A8 / 10)..=(H1 / 10) {
            for column in 1..=8 {
                let cell = self.get(row * 10 + column);
                write!(f, "{}", if cell == EMPTY { '.' } else { cell as char })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chess::core::{A1, NORTH};

    #[test]
    fn layout() {
        assert_eq!(Board::INITIAL.get(A1), b'R');
        assert_eq!(Board::INITIAL.get(H1), b'R');
        assert_eq!(Board::INITIAL.get(A8), b'r');
        assert_eq!(Board::INITIAL.get(A1 + NORTH), b'P');
        assert_eq!(Board::INITIAL.get(A1 + 4 * NORTH), EMPTY);
        assert!(is_off_board(Board::INITIAL.get(A1 - 1)));
        assert!(is_off_board(Board::INITIAL.get(H1 + 1)));
        assert!(is_off_board(Board::INITIAL.get(0)));
        assert!(is_off_board(Board::INITIAL.get(119)));
    }

    #[test]
    fn rotation_is_an_involution() {
        assert_eq!(Board::INITIAL.rotated().rotated(), Board::INITIAL);
    }

    #[test]
    fn rotation_swaps_ownership() {
        let rotated = Board::INITIAL.rotated();
        assert_eq!(rotated.get(A1), b'R');
        assert_eq!(rotated.get(A8), b'r');
        // The king and queen trade columns in the rotated view.
        assert_eq!(Board::INITIAL.get(A1 + 4), b'K');
        assert_eq!(rotated.get(A1 + 4), b'Q');
    }

    #[test]
    fn display() {
        let rendered = Board::INITIAL.to_string();
        assert_eq!(rendered.lines().count(), 8);
        assert_eq!(rendered.lines().next(), Some("rnbqkbnr"));
        assert_eq!(rendered.lines().last(), Some("RNBQKBNR"));
    }
}
