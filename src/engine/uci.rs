//! Parsing of the [Universal Chess Interface] command subset the engine
//! speaks. The parser is pure string-to-enum translation; execution lives in
//! [`crate::engine::Engine`].
//!
//! Unknown or malformed input never aborts anything: it maps to
//! [`Command::Unknown`] and the caller decides how loudly to complain.
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

use std::time::Duration;

#[derive(Debug, PartialEq)]
pub(super) enum Command {
    Uci,
    IsReady,
    NewGame,
    SetPosition {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(GoLimits),
    SetOption {
        option: EngineOption,
        value: i64,
    },
    Stop,
    Quit,
    Unknown(String),
}

/// Limits carried by a `go` command; all optional, all combinable.
#[derive(Debug, PartialEq, Default, Clone, Copy)]
pub(crate) struct GoLimits {
    pub(crate) depth: Option<i32>,
    pub(crate) wtime: Option<Duration>,
    pub(crate) btime: Option<Duration>,
    pub(crate) winc: Option<Duration>,
    pub(crate) binc: Option<Duration>,
    pub(crate) movetime: Option<Duration>,
    pub(crate) nodes: Option<u64>,
    pub(crate) infinite: bool,
}

/// Options the engine exposes over `setoption`. `Hash` caps the
/// transposition tables (in entries); the rest are search tunables.
#[derive(Debug, PartialEq)]
pub(super) enum EngineOption {
    Hash,
    Qs,
    QsA,
    EvalRoughness,
}

fn parse_go(parts: &[&str]) -> Command {
    let mut limits = GoLimits::default();

    let millis = |token: Option<&&str>| {
        token
            .and_then(|value| value.parse().ok())
            .map(Duration::from_millis)
    };

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => limits.depth = parts.get(i + 1).and_then(|value| value.parse().ok()),
            "wtime" => limits.wtime = millis(parts.get(i + 1)),
            "btime" => limits.btime = millis(parts.get(i + 1)),
            "winc" => limits.winc = millis(parts.get(i + 1)),
            "binc" => limits.binc = millis(parts.get(i + 1)),
            "movetime" => limits.movetime = millis(parts.get(i + 1)),
            "nodes" => limits.nodes = parts.get(i + 1).and_then(|value| value.parse().ok()),
            "infinite" => {
                limits.infinite = true;
                i += 1;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Command::Go(limits)
}

fn parse_setoption(parts: &[&str]) -> Command {
    // setoption name <id> value <x>
    if parts.len() < 5 || parts[1] != "name" || parts[3] != "value" {
        return Command::Unknown(parts.join(" "));
    }
    let option = match parts[2] {
        "Hash" => EngineOption::Hash,
        "QS" => EngineOption::Qs,
        "QSA" => EngineOption::QsA,
        "EvalRoughness" => EngineOption::EvalRoughness,
        _ => return Command::Unknown(parts.join(" ")),
    };
    match parts[4].parse() {
        Ok(value) => Command::SetOption { option, value },
        Err(_) => Command::Unknown(parts.join(" ")),
    }
}

fn parse_setposition(parts: &[&str]) -> Command {
    let moves_index = parts.iter().position(|&token| token == "moves");
    let fen = parts
        .iter()
        .position(|&token| token == "fen")
        .map(|index| parts[index + 1..moves_index.unwrap_or(parts.len())].join(" "));
    let moves = match moves_index {
        Some(index) => parts[index + 1..]
            .iter()
            .map(ToString::to_string)
            .collect(),
        None => vec![],
    };
    Command::SetPosition { fen, moves }
}

impl Command {
    pub(super) fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();

        match parts.first() {
            Some(&"uci") => Command::Uci,
            Some(&"isready") => Command::IsReady,
            Some(&"ucinewgame") => Command::NewGame,
            Some(&"position") => parse_setposition(&parts),
            Some(&"go") => parse_go(&parts),
            Some(&"setoption") => parse_setoption(&parts),
            Some(&"stop") => Command::Stop,
            Some(&"quit") => Command::Quit,
            _ => Command::Unknown(input.trim().to_string()),
        }
    }
}
