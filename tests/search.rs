//! End-to-end search scenarios: the searcher has to find forced wins, keep
//! its material together in quiet positions and respect its budget.

use std::time::{Duration, Instant};

use skiff::chess::core::{Move, Promotion};
use skiff::chess::position::Position;
use skiff::search::{Limits, Searcher};

fn depth_limited(depth: i32) -> Limits {
    Limits {
        max_depth: Some(depth),
        ..Limits::default()
    }
}

/// Plays a scripted game from the starting position, mirroring every second
/// move into the side-relative frame, and returns all positions reached.
fn played(moves: &[&str]) -> Vec<Position> {
    let mut history = vec![Position::starting()];
    let mut white = true;
    for uci in moves {
        let mut m = Move::from_uci(uci).unwrap();
        if !white {
            m = m.mirrored();
        }
        let position = history.last().unwrap();
        assert!(position.gen_moves().contains(&m), "{uci} is not legal here");
        history.push(position.apply(&m));
        white = !white;
    }
    history
}

#[test]
fn mate_in_one_within_a_second() {
    let (root, _) = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
    let limits = Limits {
        deadline: Some(Instant::now() + Duration::from_millis(1_000)),
        ..Limits::default()
    };
    let mut searcher = Searcher::new();
    let report = searcher
        .search(&[root], limits)
        .last()
        .expect("the budget allows at least one iteration");
    assert_eq!(report.best.unwrap().to_string(), "a1a8");
}

#[test]
fn promotes_to_a_queen() {
    let (root, _) = Position::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
    let mut searcher = Searcher::new();
    let report = searcher.search(&[root], depth_limited(3)).last().unwrap();
    let best = report.best.unwrap();
    assert_eq!(best.to_string(), "a7a8q");
    assert_eq!(best.promotion, Some(Promotion::Queen));
}

#[test]
fn keeps_material_together_in_a_quiet_position() {
    // A well-trodden Ruy Lopez middlegame; Black is to move and has no
    // reason to shed anything.
    let history = played(&[
        "e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "g8f6", "e1g1", "f8e7", "f1e1",
        "b7b5", "a4b3",
    ]);
    let root = history.last().unwrap().clone();
    let before = root.score();

    let mut searcher = Searcher::new();
    let report = searcher.search(&history, depth_limited(4)).last().unwrap();
    let reply_root = root.apply(&report.best.expect("a quiet position has a best move"));

    // Let a fresh searcher find the strongest punishment.
    let mut opponent = Searcher::new();
    let punishment = opponent
        .search(&[reply_root.clone()], depth_limited(4))
        .last()
        .unwrap();
    let after = reply_root.apply(&punishment.best.unwrap()).score();

    // Two plies later the balance may shift positionally, but no piece may
    // have been dropped outright.
    assert!(
        after >= before - 150,
        "dropped from {before} to {after} after the exchange"
    );
}

#[test]
fn the_deadline_is_respected() {
    let budget = Duration::from_millis(300);
    let limits = Limits {
        deadline: Some(Instant::now() + budget),
        ..Limits::default()
    };
    let started = Instant::now();
    let mut searcher = Searcher::new();
    let reports: Vec<_> = searcher.search(&[Position::starting()], limits).collect();
    // Generous slack: the point is that the search winds down near the
    // deadline instead of running to the depth ceiling.
    assert!(started.elapsed() < budget + Duration::from_millis(500));
    assert!(!reports.is_empty());
}
