//! UCI protocol glue: message parsing and the `UciEngine` abstraction the
//! driver plays against.
//!
//! `UciEngine` is implemented by the real subprocess transport
//! (`transport.rs`, grounded in `engine/process.rs` +
//! `engine/communication.rs`) and, in tests, by an in-process fake —
//! decoupling `driver.rs` from real child processes the way the teacher's
//! `EngineManager` is decoupled from `EngineProcess` by trait-shaped
//! methods (`start_analysis`, `stop`, `kill`).

use async_trait::async_trait;
use vampirc_uci::{UciInfoAttribute, UciMessage};

use crate::error::MatchResult;
use crate::position::{Info, MATE_SCORE_MAX, MATE_SCORE_MIN};

/// Everything the driver learned from one `go` round trip.
#[derive(Debug, Clone, Default)]
pub struct BestMoveReply {
    /// `None` if the engine never produced a `bestmove` line before the
    /// transport's deadline elapsed (spec.md §4.3 "hard timeout").
    pub best: Option<String>,
    /// The last `pv` string seen, if any `info` line carried one.
    pub pv: Option<String>,
    pub info: Info,
    /// Milliseconds actually spent waiting for `bestmove`.
    pub elapsed_ms: i64,
}

/// Abstraction over "a running UCI engine", narrowed to exactly the
/// operations the game driver needs (spec.md §6.1).
#[async_trait]
pub trait UciEngine: Send {
    fn name(&self) -> &str;

    /// Declares the engine supports Chess960 castling rules (from static
    /// capability discovery, not from runtime negotiation).
    fn supports_chess960(&self) -> bool;

    /// `setoption name UCI_Chess960 value true`.
    async fn set_chess960(&mut self) -> MatchResult<()>;

    /// `ucinewgame` followed by an `isready`/`readyok` handshake.
    async fn new_game(&mut self) -> MatchResult<()>;

    /// Sends a raw `position ...` command, then synchronizes.
    async fn send_position(&mut self, command: &str) -> MatchResult<()>;

    /// Sends a raw `go ...` command and waits up to `deadline_ms` (plus a
    /// small transport grace period) for `bestmove`, collecting the last
    /// `info` line seen along the way.
    async fn go(&mut self, command: &str, deadline_ms: i64) -> MatchResult<BestMoveReply>;
}

/// Parses one `info` line's attributes into `Info` + the last PV string,
/// folding the mate-score convention from spec.md §6.1 into a plain
/// centipawn-shaped `i32` (see `position::is_mate` for how callers detect
/// that this is actually a mate score and not a centipawn one).
pub fn parse_info_line(line: &str, elapsed_ms: i64) -> Option<(Info, Option<String>)> {
    let message = vampirc_uci::parse_one(line);
    let attrs = match message {
        UciMessage::Info(attrs) => attrs,
        _ => return None,
    };

    let mut info = Info {
        depth: 0,
        score: 0,
        time_ms: elapsed_ms,
    };
    let mut pv = None;
    let mut saw_score = false;

    for attr in attrs {
        match attr {
            UciInfoAttribute::Depth(depth) => info.depth = depth as i32,
            UciInfoAttribute::Score { cp, mate, .. } => {
                saw_score = true;
                info.score = if let Some(m) = mate {
                    mate_to_score(m as i32)
                } else {
                    cp.unwrap_or(0)
                };
            }
            UciInfoAttribute::Time(ms) => info.time_ms = ms.num_milliseconds(),
            UciInfoAttribute::Pv(moves) => {
                pv = Some(
                    moves
                        .into_iter()
                        .map(|m| m.to_string())
                        .collect::<Vec<_>>()
                        .join(" "),
                );
            }
            _ => {}
        }
    }

    if saw_score || pv.is_some() {
        Some((info, pv))
    } else {
        None
    }
}

/// `score mate M` maps to `INT16_MAX - M` for `M >= 0` (white is mating)
/// or `INT16_MIN - M` for `M < 0` (white is mated), per spec.md §6.1.
pub fn mate_to_score(mate_in: i32) -> i32 {
    if mate_in >= 0 {
        MATE_SCORE_MAX - mate_in
    } else {
        MATE_SCORE_MIN - mate_in
    }
}

/// Parses a `bestmove <lan> [ponder <lan>]` line, returning the best-move
/// token.
pub fn parse_bestmove_line(line: &str) -> Option<String> {
    match vampirc_uci::parse_one(line) {
        UciMessage::BestMove { best_move, .. } => Some(best_move.to_string()),
        _ => None,
    }
}
