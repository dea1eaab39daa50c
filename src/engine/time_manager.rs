//! Converts UCI `go` time controls into a single per-move thinking budget.
//!
//! The policy is deliberately plain: a fixed fraction of the remaining clock
//! plus the increment, floored so that the engine always produces a move even
//! on a drained clock. `movetime` overrides the calculation, a `depth` limit
//! disables the clock entirely.

use std::time::Duration;

use crate::chess::core::Color;
use crate::engine::uci::GoLimits;

/// Fraction of the remaining clock spent on one move.
const CLOCK_DIVISOR: u32 = 40;

/// Never think for less than this, even with a drained clock.
const MIN_THINK: Duration = Duration::from_millis(50);

/// Budget for `go infinite` or a bare `go`: the loop is single-threaded and
/// cannot receive `stop` mid-search, so "infinite" becomes "generous".
const FALLBACK_THINK: Duration = Duration::from_secs(10);

/// Thinking budget for one `go` command, or `None` when only the depth limit
/// applies.
pub(super) fn think_time(go: &GoLimits, side: Color) -> Option<Duration> {
    if go.infinite {
        return Some(FALLBACK_THINK);
    }
    if let Some(movetime) = go.movetime {
        return Some(movetime);
    }
    if go.depth.is_some() {
        // Depth-limited searches ignore the clock.
        return None;
    }
    let (remaining, increment) = match side {
        Color::White => (go.wtime, go.winc),
        Color::Black => (go.btime, go.binc),
    };
    if let Some(remaining) = remaining {
        let budget = remaining / CLOCK_DIVISOR + increment.unwrap_or_default();
        return Some(budget.max(MIN_THINK));
    }
    Some(FALLBACK_THINK)
}
