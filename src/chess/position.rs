//! A fully-specified, side-relative [chess position]: board, incremental
//! score, castling rights and the fleeting en-passant and king-passant
//! squares.
//!
//! Positions are immutable values: applying a move produces the successor
//! position as seen by the opponent, with the board rotated so that the side
//! to move is always uppercase and always plays north. Move generation is
//! pseudo-legal; legality is resolved lazily by letting the search capture a
//! king left en prise, which is also how checkmate is detected.
//!
//! [chess position]: https://www.chessprogramming.org/Chess_Position

use std::fmt;

use anyhow::{Context, bail};
use arrayvec::ArrayVec;

use super::board::{self, Board, EMPTY};
use super::core::{
    A1, A8, Color, EAST, H1, H8, Move, NORTH, Promotion, SOUTH, Square, WEST, directions,
    is_slider,
};
use crate::evaluation::{self, MATE_LOWER, pst};

/// Pseudo-legal moves of a position. 256 comfortably covers the densest known
/// middlegame positions, promotions counted four ways included.
pub type MoveList = ArrayVec<Move, 256>;

bitflags::bitflags! {
    /// Castling rights of both sides, relative to the side to move. "West" is
    /// towards the a1-corner rook of the owning side's own back rank.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CastleRights: u8 {
        #[allow(missing_docs)]
        const OUR_WEST = 1;
        #[allow(missing_docs)]
        const OUR_EAST = 1 << 1;
        #[allow(missing_docs)]
        const THEIR_WEST = 1 << 2;
        #[allow(missing_docs)]
        const THEIR_EAST = 1 << 3;
    }
}

impl CastleRights {
    /// Rights as seen by the other side.
    const fn swapped(self) -> Self {
        Self::from_bits_retain((self.bits() & 0b11) << 2 | self.bits() >> 2)
    }
}

/// An immutable chess position. Everything is stored from the side to move's
/// point of view; [`Position::apply`] returns the opponent's view of the
/// successor.
///
/// The position is its own transposition key: the board is a compact 120-byte
/// array and hashing it wholesale is cheaper to maintain than an incremental
/// Zobrist signature at this engine's scale.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    /// Static score of `board` for the side to move. Kept incrementally: the
    /// recomputed-from-scratch value is asserted after every move in debug
    /// builds.
    score: i32,
    rights: CastleRights,
    /// Square a pawn may capture onto en passant next move, 0 when none.
    ep: i16,
    /// Square the king skipped over while castling last move, 0 when none.
    /// A "capture" on or next to it catches the king mid-castle, which is
    /// what rules out castling through check.
    kp: i16,
}

impl Position {
    /// The starting position of a standard game.
    #[must_use]
    pub fn starting() -> Self {
        Self {
            board: Board::INITIAL,
            score: 0,
            rights: CastleRights::all(),
            ep: 0,
            kp: 0,
        }
    }

    /// Static score of the position for the side to move, in centipawns.
    #[must_use]
    pub const fn score(&self) -> i32 {
        self.score
    }

    /// Parses a position from [Forsyth-Edwards Notation], also reporting
    /// which color the side to move is so that the caller can mirror wire
    /// coordinates.
    ///
    /// The halfmove clock and fullmove counter are accepted and ignored (the
    /// engine does not track the fifty-move rule), so both full FEN and the
    /// four-field EPD-style prefix parse.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed placement, missing fields, or a board
    /// without both kings.
    ///
    /// [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
    pub fn from_fen(input: &str) -> anyhow::Result<(Self, Color)> {
        let mut parts = input.split_ascii_whitespace();
        let placement = parts.next().context("missing piece placement")?;
        let mut board = Board::EMPTY;
        let mut rows = 0;
        for (row, rank) in placement.split('/').enumerate() {
            if row >= 8 {
                bail!("expected 8 ranks, got '{placement}'");
            }
            let mut column = 1;
            for symbol in rank.chars() {
                match symbol {
                    '1'..='8' => column += symbol as i16 - '0' as i16,
                    'P' | 'N' | 'B' | 'R' | 'Q' | 'K' | 'p' | 'n' | 'b' | 'r' | 'q' | 'k' => {
                        if column > 8 {
                            bail!("rank '{rank}' spans more than 8 files");
                        }
                        board.set((row as i16 + 2) * 10 + column, symbol as u8);
                        column += 1;
                    }
                    _ => bail!("unknown placement symbol: '{symbol}'"),
                }
            }
            if column != 9 {
                bail!("rank '{rank}' does not span 8 files");
            }
            rows = row + 1;
        }
        if rows != 8 {
            bail!("expected 8 ranks, got '{placement}'");
        }
        let side: Color = parts.next().context("missing side to move")?.try_into()?;
        let mut rights = CastleRights::empty();
        match parts.next().context("missing castling rights")? {
            "-" => {}
            castling => {
                for symbol in castling.chars() {
                    rights.insert(match symbol {
                        'K' => CastleRights::OUR_EAST,
                        'Q' => CastleRights::OUR_WEST,
                        'k' => CastleRights::THEIR_EAST,
                        'q' => CastleRights::THEIR_WEST,
                        _ => bail!("unknown castling rights symbol: '{symbol}'"),
                    });
                }
            }
        }
        let ep = match parts.next().context("missing en passant square")? {
            "-" => 0,
            square => Square::try_from(square)?.index(),
        };
        // Halfmove clock and fullmove counter, when present, are ignored.
        if !board.contains(b'K') || !board.contains(b'k') {
            bail!("both kings must be on the board");
        }
        let position = Self {
            score: evaluation::recompute(&board),
            board,
            rights,
            ep,
            kp: 0,
        };
        // The board was laid out from White's point of view; hand it to
        // Black when Black is to move.
        match side {
            Color::White => Ok((position, side)),
            Color::Black => Ok((position.rotated(), side)),
        }
    }

    /// Generates all pseudo-legal moves of the side to move. Moves that leave
    /// the own king capturable are included; the search punishes them one ply
    /// later by taking the king.
    #[must_use]
    pub fn gen_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        for (i, piece) in self.board.own_pieces() {
            for &d in directions(piece) {
                let mut j = i + d;
                loop {
                    let target = self.board.get(j);
                    // Stay on the board and off own pieces.
                    if board::is_off_board(target) || board::is_own(target) {
                        break;
                    }
                    if piece == b'P' {
                        // Pushes only onto empty squares.
                        if (d == NORTH || d == NORTH + NORTH) && target != EMPTY {
                            break;
                        }
                        // Double push only from the home rank, through air.
                        if d == NORTH + NORTH
                            && (i < A1 + NORTH || self.board.get(i + NORTH) != EMPTY)
                        {
                            break;
                        }
                        // Diagonals must capture: a piece, the en-passant
                        // square, or the king-passant neighborhood.
                        if (d == NORTH + WEST || d == NORTH + EAST)
                            && target == EMPTY
                            && j != self.ep
                            && j != self.kp
                            && j != self.kp - 1
                            && j != self.kp + 1
                        {
                            break;
                        }
                        if (A8..=H8).contains(&j) {
                            for promotion in Promotion::ALL {
                                moves.push(Move::new(i, j, Some(promotion)));
                            }
                            break;
                        }
                    }
                    moves.push(Move::new(i, j, None));
                    // Crawlers stop here; sliders stop on captures.
                    if !is_slider(piece) || board::is_their(target) {
                        break;
                    }
                    // Castling: while the unmoved corner rook slides over
                    // empty squares and reaches the king, the king may hop
                    // two squares towards it.
                    if i == A1
                        && self.board.get(j + EAST) == b'K'
                        && self.rights.contains(CastleRights::OUR_WEST)
                    {
                        moves.push(Move::new(j + EAST, j + WEST, None));
                    }
                    if i == H1
                        && self.board.get(j + WEST) == b'K'
                        && self.rights.contains(CastleRights::OUR_EAST)
                    {
                        moves.push(Move::new(j + WEST, j + EAST, None));
                    }
                    j += d;
                }
            }
        }
        moves
    }

    /// Score delta the move would add to [`Position::score`], straight from
    /// the piece-square tables. Also the move-ordering key of the search.
    #[must_use]
    pub fn value(&self, m: &Move) -> i32 {
        let (i, j) = (m.from.index(), m.to.index());
        let piece = self.board.get(i);
        let target = self.board.get(j);
        let mut score = pst::score(piece, j) - pst::score(piece, i);
        // Captured opponent pieces are worth their table value on the
        // mirrored square: one set of tables serves both sides.
        if board::is_their(target) {
            score += pst::score(target.to_ascii_uppercase(), 119 - j);
        }
        // Landing on or next to the king-passant square catches a king that
        // castled through check.
        if (j - self.kp).abs() < 2 {
            score += pst::score(b'K', 119 - j);
        }
        if piece == b'K' && (j - i).abs() == 2 {
            // The castling rook hops to the square the king crossed.
            score += pst::score(b'R', (i + j) / 2);
            score -= pst::score(b'R', if j < i { A1 } else { H1 });
        }
        if piece == b'P' {
            if (A8..=H8).contains(&j) {
                let promoted = m.promotion.unwrap_or(Promotion::Queen).piece();
                score += pst::score(promoted, j) - pst::score(b'P', j);
            }
            if j == self.ep {
                score += pst::score(b'P', 119 - (j + SOUTH));
            }
        }
        score
    }

    /// Applies a move and returns the successor position from the opponent's
    /// point of view.
    #[must_use]
    pub fn apply(&self, m: &Move) -> Self {
        let (i, j) = (m.from.index(), m.to.index());
        let piece = self.board.get(i);
        let mut board = self.board;
        let mut rights = self.rights;
        let (mut ep, mut kp) = (0, 0);
        let score = self.score + self.value(m);
        board.set(j, piece);
        board.set(i, EMPTY);
        // A rook leaving or captured on a corner voids that corner's right.
        // The opponent corners map through rotation: our a8 is their h1.
        if i == A1 {
            rights.remove(CastleRights::OUR_WEST);
        }
        if i == H1 {
            rights.remove(CastleRights::OUR_EAST);
        }
        if j == A8 {
            rights.remove(CastleRights::THEIR_EAST);
        }
        if j == H8 {
            rights.remove(CastleRights::THEIR_WEST);
        }
        if piece == b'K' {
            rights.remove(CastleRights::OUR_WEST | CastleRights::OUR_EAST);
            if (j - i).abs() == 2 {
                kp = (i + j) / 2;
                board.set(if j < i { A1 } else { H1 }, EMPTY);
                board.set(kp, b'R');
            }
        }
        if piece == b'P' {
            if (A8..=H8).contains(&j) {
                board.set(j, m.promotion.unwrap_or(Promotion::Queen).piece());
            }
            if j - i == 2 * NORTH {
                ep = i + NORTH;
            }
            if j == self.ep {
                board.set(j + SOUTH, EMPTY);
            }
        }
        let next = Self {
            board,
            score,
            rights,
            ep,
            kp,
        }
        .rotated();
        debug_assert_eq!(next.score, evaluation::recompute(&next.board));
        next
    }

    /// The same position from the other side's point of view.
    #[must_use]
    pub fn rotated(&self) -> Self {
        self.flipped(false)
    }

    /// Passes the turn: like [`Position::rotated`], except the fleeting
    /// en-passant and king-passant rights do not survive the skipped move.
    #[must_use]
    pub fn nullmove(&self) -> Self {
        self.flipped(true)
    }

    fn flipped(&self, clear_transients: bool) -> Self {
        let transient = |square: i16| {
            if square == 0 || clear_transients {
                0
            } else {
                119 - square
            }
        };
        Self {
            board: self.board.rotated(),
            score: -self.score,
            rights: self.rights.swapped(),
            ep: transient(self.ep),
            kp: transient(self.kp),
        }
    }

    /// Whether the side to move can take the opponent's king right now. A
    /// predecessor move leading here was illegal.
    #[must_use]
    pub fn can_capture_king(&self) -> bool {
        self.gen_moves().iter().any(|m| self.value(m) >= MATE_LOWER)
    }

    /// Whether the own king is still on the board; when it is not, the game
    /// is already lost.
    pub(crate) fn own_king_alive(&self) -> bool {
        self.board.contains(b'K')
    }

    #[cfg(test)]
    pub(crate) fn board(&self) -> &Board {
        &self.board
    }
}

impl fmt::Display for Position {
    /// Renders the board rank by rank from the side to move's point of view.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.board.fmt(f)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        write!(
            f,
            "score {} rights {:?} ep {} kp {}",
            self.score, self.rights, self.ep, self.kp
        )
    }
}

/// Counts the leaf positions of legal move sequences `depth` plies deep:
/// pseudo-legal expansion with king-capture filtering recovers exactly the
/// published [perft] numbers.
///
/// [perft]: https://www.chessprogramming.org/Perft
#[must_use]
pub fn perft(position: &Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for m in position.gen_moves() {
        let next = position.apply(&m);
        if next.can_capture_king() {
            continue;
        }
        nodes += perft(&next, depth - 1);
    }
    nodes
}
