//! The search: an [iterative deepening] driver around a recursive
//! zero-window bound search ([MTD-bi], a bisecting cousin of [MTD(f)]), with
//! a transposition table, [null-move pruning] and a quiescence filter.
//!
//! Every recursive probe uses a zero-width window, so the transposition table
//! only ever stores proven lower and upper bounds, never exact scores; the
//! driver recovers the exact score by bisecting the window between probes.
//!
//! [iterative deepening]: https://www.chessprogramming.org/Iterative_Deepening
//! [MTD-bi]: https://www.chessprogramming.org/NegaC*
//! [MTD(f)]: https://www.chessprogramming.org/MTD(f)
//! [null-move pruning]: https://www.chessprogramming.org/Null_Move_Pruning

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::chess::core::Move;
use crate::chess::position::Position;
use crate::evaluation::{MATE_LOWER, MATE_UPPER};

/// Iterative deepening stops after this many plies even with time to spare.
pub const MAX_DEPTH: i32 = 64;

/// A proven score interval for a `(position, depth)` pair. Zero-window probes
/// only ever tighten one end at a time.
#[derive(Clone, Copy)]
struct Entry {
    lower: i32,
    upper: i32,
}

impl Entry {
    const OPEN: Self = Self {
        lower: -MATE_UPPER,
        upper: MATE_UPPER,
    };
}

/// Search tunables, adjustable over UCI `setoption`.
#[derive(Clone, Copy, Debug)]
pub struct Params {
    /// Quiescence threshold: at depth 0 only moves gaining at least this much
    /// are searched.
    pub qs: i32,
    /// How much the quiescence threshold relaxes per ply of remaining depth.
    pub qs_a: i32,
    /// The driver stops bisecting once the window is this narrow.
    pub eval_roughness: i32,
    /// Soft cap on the number of entries per table; tables are dropped
    /// wholesale when they outgrow it, which any consistent subset of stored
    /// bounds survives.
    pub table_cap: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            qs: 40,
            qs_a: 140,
            eval_roughness: 15,
            table_cap: 1_000_000,
        }
    }
}

/// External bounds on one `search` call.
#[derive(Clone, Copy, Debug, Default)]
pub struct Limits {
    /// Wall-clock instant the search must wind down at.
    pub deadline: Option<Instant>,
    /// Node budget, checked at the same granularity as the deadline.
    pub max_nodes: Option<u64>,
    /// Deepest iteration to run; defaults to [`MAX_DEPTH`].
    pub max_depth: Option<i32>,
}

/// The search ran out of budget and unwound; bounds stored so far stay valid.
struct Halt;

/// One finished iteration of the deepening driver.
#[derive(Clone, Debug)]
pub struct Report {
    /// Completed depth in plies.
    pub depth: i32,
    /// Converged score in centipawns, relative to the side to move.
    pub score: i32,
    /// Best root move, if any probe of this or an earlier iteration proved
    /// one. A mated root has none.
    pub best: Option<Move>,
    /// Principal variation starting with `best`.
    pub pv: Vec<Move>,
    /// Nodes visited since the `search` call started.
    pub nodes: u64,
}

/// Owns the state persisting across searches of a single game: the
/// transposition table, the best-move cache and the node counter. Dropped and
/// recreated on `ucinewgame`.
pub struct Searcher {
    tp_score: HashMap<(Position, i32), Entry>,
    tp_move: HashMap<Position, Move>,
    history: HashSet<Position>,
    nodes: u64,
    limits: Limits,
    /// Depth of the iteration being driven; turns mate detections into
    /// distance-to-mate scores.
    root_depth: i32,
    /// Tunables; adjusted between searches, constant during one.
    pub params: Params,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Searcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tp_score: HashMap::new(),
            tp_move: HashMap::new(),
            history: HashSet::new(),
            nodes: 0,
            limits: Limits::default(),
            root_depth: 0,
            params: Params::default(),
        }
    }

    /// Starts an iterative-deepening search of the last position in
    /// `history`. The returned iterator yields one [`Report`] per completed
    /// depth and ends when the limits are exhausted.
    ///
    /// # Panics
    ///
    /// Panics if `history` is empty.
    pub fn search(&mut self, history: &[Position], limits: Limits) -> Deepening<'_> {
        let root = history.last().expect("history holds at least the root");
        self.history = history.iter().cloned().collect();
        self.nodes = 0;
        self.limits = limits;
        Deepening {
            root: root.clone(),
            depth: 0,
            searcher: self,
        }
    }

    /// Zero-window probe: returns `r` such that `r >= gamma` proves the true
    /// score of `position` at `depth` is at least `r`, and `r < gamma`
    /// proves it is at most `r`.
    ///
    /// `can_null` is false exactly at the root: the root is part of the game
    /// history but must not be scored as a repetition of itself, and passing
    /// at the root would make no progress.
    fn bound(
        &mut self,
        position: &Position,
        gamma: i32,
        depth: i32,
        can_null: bool,
    ) -> Result<i32, Halt> {
        self.nodes += 1;
        if self.nodes % 1024 == 0 && self.out_of_budget() {
            return Err(Halt);
        }
        let depth = depth.max(0);

        // The opponent took the king: this line is already lost, no matter
        // how it continues.
        if position.score() <= -MATE_LOWER {
            return Ok(-MATE_UPPER);
        }

        // Any return to a position actually reached in the game is scored as
        // a draw, well before threefold. Deeper lines may still pass through
        // repetitions: this only prices in the opponent's right to repeat.
        if can_null && self.history.contains(position) {
            return Ok(0);
        }

        let entry = self
            .tp_score
            .get(&(position.clone(), depth))
            .copied()
            .unwrap_or(Entry::OPEN);
        if entry.lower >= gamma {
            return Ok(entry.lower);
        }
        if entry.upper < gamma {
            return Ok(entry.upper);
        }

        let mut best = -MATE_UPPER;
        'cutoff: {
            // Null move: hand the opponent a free shot at a reduced depth.
            // If we still clear gamma, a real move would too.
            if depth > 0 && can_null {
                let score = -self.bound(&position.nullmove(), 1 - gamma, depth - 3, false)?;
                best = best.max(score);
                if best >= gamma {
                    break 'cutoff;
                }
            }

            // Standing pat bounds quiescence from below: depth 0 is not
            // forced to capture anything.
            if depth == 0 {
                best = best.max(position.score());
                if best >= gamma {
                    break 'cutoff;
                }
            }

            // Quiescence filter: the shallower we are, the noisier a move
            // must be to get searched.
            let threshold = self.params.qs - depth * self.params.qs_a;

            // The cached best move first; it produced a cutoff here before.
            if let Some(killer) = self.tp_move.get(position).copied() {
                if position.value(&killer) >= threshold {
                    let score =
                        -self.bound(&position.apply(&killer), 1 - gamma, depth - 1, true)?;
                    best = best.max(score);
                    if best >= gamma {
                        break 'cutoff;
                    }
                }
            }

            // Then everything else, most promising first.
            let mut moves: Vec<(i32, Move)> = position
                .gen_moves()
                .iter()
                .map(|m| (position.value(m), *m))
                .collect();
            moves.sort_unstable_by_key(|(value, _)| Reverse(*value));
            for (value, m) in moves {
                if value < threshold {
                    break;
                }
                let score = -self.bound(&position.apply(&m), 1 - gamma, depth - 1, true)?;
                best = best.max(score);
                if best >= gamma {
                    self.remember_move(position, m);
                    break 'cutoff;
                }
            }

            // Nothing cleared the bar. If the opponent could take our king
            // even after a pass, we are mated here; the mate score scales
            // with the distance from the root so nearer mates dominate. A
            // stalled-but-safe side keeps the fail-low as is.
            if depth > 0 && best == -MATE_UPPER {
                let in_check = self.bound(&position.nullmove(), MATE_UPPER, 0, false)?
                    == MATE_UPPER;
                if in_check {
                    best = (self.root_depth - depth) - MATE_UPPER;
                }
            }
        }

        self.remember_score(position, depth, gamma, entry, best);
        Ok(best)
    }

    fn remember_move(&mut self, position: &Position, m: Move) {
        if self.tp_move.len() >= self.params.table_cap {
            self.tp_move.clear();
        }
        let _ = self.tp_move.insert(position.clone(), m);
    }

    fn remember_score(&mut self, position: &Position, depth: i32, gamma: i32, entry: Entry, best: i32) {
        if self.tp_score.len() >= self.params.table_cap {
            self.tp_score.clear();
        }
        let tightened = if best >= gamma {
            Entry {
                lower: best,
                upper: entry.upper,
            }
        } else {
            Entry {
                lower: entry.lower,
                upper: best,
            }
        };
        let _ = self.tp_score.insert((position.clone(), depth), tightened);
    }

    fn out_of_budget(&self) -> bool {
        if let Some(deadline) = self.limits.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        self.limits.max_nodes.is_some_and(|cap| self.nodes >= cap)
    }

    /// Walks the best-move cache from the root, stopping when the chain
    /// ends, revisits a position, or reaches `max_len` moves.
    fn principal_variation(&self, root: &Position, max_len: usize) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut position = root.clone();
        let mut seen = HashSet::from([position.clone()]);
        while pv.len() < max_len {
            let Some(&m) = self.tp_move.get(&position) else {
                break;
            };
            pv.push(m);
            position = position.apply(&m);
            if !seen.insert(position.clone()) {
                break;
            }
        }
        pv
    }
}

/// Lazy iterative-deepening driver: each `next` call runs one full MTD-bi
/// convergence at the following depth.
pub struct Deepening<'a> {
    root: Position,
    depth: i32,
    searcher: &'a mut Searcher,
}

impl Iterator for Deepening<'_> {
    type Item = Report;

    fn next(&mut self) -> Option<Report> {
        self.depth += 1;
        let max_depth = self.searcher.limits.max_depth.unwrap_or(MAX_DEPTH);
        if self.depth > max_depth || self.searcher.out_of_budget() {
            return None;
        }
        // Bisect on the score: each zero-window probe turns its result into
        // a tighter lower or upper bound until the two meet.
        self.searcher.root_depth = self.depth;
        let roughness = self.searcher.params.eval_roughness;
        let (mut lower, mut upper) = (-MATE_UPPER, MATE_UPPER);
        while lower < upper - roughness {
            let gamma = (lower + upper + 1) / 2;
            match self.searcher.bound(&self.root, gamma, self.depth, false) {
                Ok(score) if score >= gamma => lower = score,
                Ok(score) => upper = score,
                Err(Halt) => return None,
            }
        }
        Some(Report {
            depth: self.depth,
            score: lower,
            best: self.searcher.tp_move.get(&self.root).copied(),
            pv: self
                .searcher
                .principal_variation(&self.root, self.depth as usize),
            nodes: self.searcher.nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plays a scripted game, mirroring Black's coordinates into the
    /// side-relative frame, and returns every position reached.
    fn played(moves: &[&str]) -> Vec<Position> {
        let mut history = vec![Position::starting()];
        let mut white = true;
        for uci in moves {
            let mut m = Move::from_uci(uci).unwrap();
            if !white {
                m = m.mirrored();
            }
            let next = history.last().unwrap().apply(&m);
            history.push(next);
            white = !white;
        }
        history
    }

    fn depth_limited(depth: i32) -> Limits {
        Limits {
            max_depth: Some(depth),
            ..Limits::default()
        }
    }

    #[test]
    fn finds_the_back_rank_mate() {
        let (root, _) = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mut searcher = Searcher::new();
        let report = searcher
            .search(&[root], depth_limited(5))
            .last()
            .expect("at least one iteration completes");
        assert_eq!(report.best.unwrap().to_string(), "a1a8");
        assert!(report.score > MATE_LOWER);
    }

    #[test]
    fn search_is_deterministic() {
        let (root, _) =
            Position::from_fen("r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3")
                .unwrap();
        let run = |mut searcher: Searcher| {
            let report = searcher
                .search(&[root.clone()], depth_limited(4))
                .last()
                .unwrap();
            (report.score, report.best)
        };
        assert_eq!(run(Searcher::new()), run(Searcher::new()));
    }

    #[test]
    fn repetition_of_game_history_is_a_draw() {
        // Both sides shuffle their knights out and back: the final position
        // repeats the one after the first two moves.
        let history = played(&["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6"]);
        let repeated = history[2].clone();
        assert!(history[..history.len() - 1].contains(&repeated));
        let mut searcher = Searcher::new();
        searcher.history = history.iter().cloned().collect();
        for depth in [0, 1, 3] {
            let Ok(score) = searcher.bound(&repeated, 1, depth, true) else {
                panic!("no limits were set")
            };
            assert_eq!(score, 0);
        }
    }

    #[test]
    fn mtd_window_is_a_fixed_point() {
        let history = vec![Position::starting()];
        let mut searcher = Searcher::new();
        let depth = 3;
        let root = {
            let mut deepening = searcher.search(&history, depth_limited(depth));
            while deepening.next().is_some() {}
            history[0].clone()
        };
        // Replay the converged window by hand and check both ends.
        let (mut lower, mut upper) = (-MATE_UPPER, MATE_UPPER);
        while lower < upper - searcher.params.eval_roughness {
            let gamma = (lower + upper + 1) / 2;
            let score = searcher.bound(&root, gamma, depth, false).ok().unwrap();
            if score >= gamma {
                lower = score;
            } else {
                upper = score;
            }
        }
        assert!(searcher.bound(&root, lower, depth, false).ok().unwrap() >= lower);
        assert!(searcher.bound(&root, upper, depth, false).ok().unwrap() < upper);
    }

    #[test]
    fn node_cap_halts_the_search() {
        let limits = Limits {
            max_nodes: Some(2_000),
            ..Limits::default()
        };
        let mut searcher = Searcher::new();
        let reports: Vec<Report> = searcher.search(&[Position::starting()], limits).collect();
        assert!(searcher.nodes < 4_000);
        // Shallow iterations fit in the budget, deep ones do not.
        assert!(reports.len() < 10);
    }

    #[test]
    fn deeper_search_keeps_warm_tables() {
        let mut searcher = Searcher::new();
        let history = vec![Position::starting()];
        let first: Vec<Report> = searcher.search(&history, depth_limited(3)).collect();
        assert!(!first.is_empty());
        let warm_start = searcher.nodes;
        // A rerun of the same search is nearly free: every probe hits the
        // transposition table.
        let second: Vec<Report> = searcher.search(&history, depth_limited(3)).collect();
        assert!(searcher.nodes < warm_start);
        assert_eq!(
            first.last().unwrap().best.unwrap(),
            second.last().unwrap().best.unwrap()
        );
    }
}
