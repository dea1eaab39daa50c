//! The engine puts the pieces together: it owns the game history and the
//! [`crate::search::Searcher`] and drives both from the [Universal Chess
//! Interface] (UCI) on the input/output streams it is given.
//!
//! [`Engine::uci_loop`] is the main loop of the program. The implementation
//! covers the command subset common GUIs and tournament runners actually
//! send; anything unrecognized is reported on stderr and skipped, the loop
//! carries on.
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

use std::io::{BufRead, Write};
use std::time::Instant;

use itertools::Itertools;

use crate::chess::core::{Color, Move};
use crate::chess::position::Position;
use crate::engine::uci::{Command, EngineOption, GoLimits};
use crate::search::{Limits, Searcher};

mod time_manager;
mod uci;

/// Connects the searcher to a UCI client. Created once at program start and
/// run via [`Engine::uci_loop`].
///
/// The internal position is always oriented with the side to move at the
/// bottom, so every move crossing the wire is mirrored whenever the absolute
/// side to move is Black.
pub struct Engine<'a, R: BufRead, W: Write> {
    /// Positions actually reached in the game, oldest first. The last one is
    /// the search root.
    history: Vec<Position>,
    /// Absolute color of the side to move in `history.last()`.
    side: Color,
    searcher: Searcher,
    /// UCI commands are read from this stream.
    input: &'a mut R,
    /// Responses are written to this stream.
    out: &'a mut W,
}

impl<'a, R: BufRead, W: Write> Engine<'a, R, W> {
    /// Creates an engine idling at the starting position.
    #[must_use]
    pub fn new(input: &'a mut R, out: &'a mut W) -> Self {
        Self {
            history: vec![Position::starting()],
            side: Color::White,
            searcher: Searcher::new(),
            input,
            out,
        }
    }

    /// Reads and executes UCI commands until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error when reading from the input or writing to the output
    /// stream fails; protocol-level garbage is only logged.
    pub fn uci_loop(&mut self) -> anyhow::Result<()> {
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            match Command::parse(&line) {
                Command::Uci => self.handshake()?,
                Command::IsReady => self.sync()?,
                Command::NewGame => self.new_game(),
                Command::SetPosition { fen, moves } => self.set_position(fen.as_deref(), &moves),
                Command::Go(limits) => self.go(&limits)?,
                // The search is synchronous, so by the time a `stop` can be
                // read there is nothing left to stop.
                Command::Stop => {}
                Command::Quit => break,
                Command::SetOption { option, value } => self.set_option(&option, value),
                Command::Unknown(command) => {
                    if !command.is_empty() {
                        eprintln!("info string unknown command: {command}");
                    }
                }
            }
        }
        Ok(())
    }

    /// Responds to the `uci` handshake by identifying the engine and listing
    /// its options.
    fn handshake(&mut self) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "id name {} {}",
            env!("CARGO_PKG_NAME"),
            crate::engine_version()
        )?;
        writeln!(self.out, "id author {}", env!("CARGO_PKG_AUTHORS"))?;
        writeln!(
            self.out,
            "option name Hash type spin default {} min 1000 max 100000000",
            self.searcher.params.table_cap
        )?;
        writeln!(
            self.out,
            "option name QS type spin default {} min 0 max 300",
            self.searcher.params.qs
        )?;
        writeln!(
            self.out,
            "option name QSA type spin default {} min 0 max 300",
            self.searcher.params.qs_a
        )?;
        writeln!(
            self.out,
            "option name EvalRoughness type spin default {} min 1 max 100",
            self.searcher.params.eval_roughness
        )?;
        writeln!(self.out, "uciok")?;
        Ok(())
    }

    /// Syncs with the client by responding `readyok`.
    fn sync(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "readyok")?;
        Ok(())
    }

    /// Drops all learned state and returns to the starting position.
    fn new_game(&mut self) {
        let params = self.searcher.params;
        self.searcher = Searcher::new();
        self.searcher.params = params;
        self.history = vec![Position::starting()];
        self.side = Color::White;
    }

    fn set_option(&mut self, option: &EngineOption, value: i64) {
        let params = &mut self.searcher.params;
        match option {
            EngineOption::Hash => params.table_cap = value.max(1_000) as usize,
            EngineOption::Qs => params.qs = value as i32,
            EngineOption::QsA => params.qs_a = value as i32,
            EngineOption::EvalRoughness => params.eval_roughness = (value as i32).max(1),
        }
    }

    /// Rebuilds the game history from a starting position and a move list.
    /// Moves that do not parse or are not legal in their position are logged
    /// and skipped, which keeps the history reachable-by-construction.
    fn set_position(&mut self, fen: Option<&str>, moves: &[String]) {
        let (start, side) = match fen {
            Some(fen) => match Position::from_fen(fen) {
                Ok(parsed) => parsed,
                Err(error) => {
                    eprintln!("info string ignoring unparsable fen '{fen}': {error:#}");
                    return;
                }
            },
            None => (Position::starting(), Color::White),
        };
        self.history = vec![start];
        self.side = side;
        for uci in moves {
            let m = match Move::from_uci(uci) {
                Ok(m) if self.side == Color::Black => m.mirrored(),
                Ok(m) => m,
                Err(error) => {
                    eprintln!("info string skipping unparsable move '{uci}': {error:#}");
                    continue;
                }
            };
            let position = self.history.last().expect("history holds at least the root");
            if !position.gen_moves().contains(&m) {
                eprintln!("info string skipping illegal move '{uci}'");
                continue;
            }
            let next = position.apply(&m);
            if next.can_capture_king() {
                eprintln!("info string skipping illegal move '{uci}'");
                continue;
            }
            self.history.push(next);
            self.side = !self.side;
        }
    }

    /// Runs a search under the given limits, streaming one `info` line per
    /// completed depth and finishing with `bestmove`.
    fn go(&mut self, go: &GoLimits) -> anyhow::Result<()> {
        let started = Instant::now();
        let limits = Limits {
            deadline: time_manager::think_time(go, self.side).map(|budget| started + budget),
            max_nodes: go.nodes,
            max_depth: go.depth,
        };
        let side = self.side;
        let mut best = None;
        for report in self.searcher.search(&self.history, limits) {
            best = report.best.or(best);
            let elapsed = started.elapsed();
            let nps = (report.nodes as f64 / elapsed.as_secs_f64().max(1e-9)) as u64;
            let mut pv_side = side;
            let pv = report
                .pv
                .iter()
                .map(|m| {
                    let rendered = wire_move(m, pv_side);
                    pv_side = !pv_side;
                    rendered
                })
                .join(" ");
            writeln!(
                self.out,
                "info depth {} score cp {} nodes {} time {} nps {} pv {}",
                report.depth,
                report.score,
                report.nodes,
                elapsed.as_millis(),
                nps,
                pv
            )?;
            self.out.flush()?;
        }
        match best.or_else(|| self.any_root_move()) {
            Some(m) => writeln!(self.out, "bestmove {}", wire_move(&m, side))?,
            // Mated or stalemated: there is nothing to play, the client
            // adjudicates.
            None => writeln!(self.out, "bestmove 0000")?,
        }
        self.out.flush()?;
        Ok(())
    }

    /// Fallback when no iteration completed or the root is lost: any legal
    /// move will do.
    fn any_root_move(&self) -> Option<Move> {
        let position = self.history.last()?;
        position
            .gen_moves()
            .into_iter()
            .find(|m| !position.apply(m).can_capture_king())
    }
}

/// Renders a side-relative move as absolute UCI coordinates.
fn wire_move(m: &Move, side: Color) -> String {
    match side {
        Color::White => m.to_string(),
        Color::Black => m.mirrored().to_string(),
    }
}
