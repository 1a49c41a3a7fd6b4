//! Crate-wide error type and fatal-error helpers.
//!
//! Mirrors the shape of a typical UCI-engine-process error enum: IO and
//! protocol failures convert in via `#[from]`, per-game faults never reach
//! here (they are encoded in `Game::state` instead, see `position.rs`).

use std::path::PathBuf;

/// Errors that can cross an `async fn` boundary while driving a match.
///
/// Per-game faults (illegal move, time forfeit, adjudication) are *not*
/// represented here: they are terminal `GameState` values. This type is
/// reserved for things that make a worker unable to continue at all.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine at {path:?} exited before completing the UCI handshake")]
    EngineDied { path: PathBuf },

    #[error("engine at {path:?} did not respond within {timeout_ms}ms during startup")]
    InitTimeout { path: PathBuf, timeout_ms: u64 },

    #[error("engine has no stdin handle")]
    NoStdin,

    #[error("engine has no stdout handle")]
    NoStdout,

    #[error("FEN parsing error: {0}")]
    FenParsing(#[from] shakmaty::fen::ParseFenError),

    #[error("position setup error: {0}")]
    PositionSetup(#[from] shakmaty::PositionError<shakmaty::Chess>),

    #[error("opening book {path:?} is empty or unreadable")]
    EmptyOpeningBook { path: PathBuf },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type MatchResult<T> = Result<T, MatchError>;

/// Log a fatal diagnostic and terminate the current process.
///
/// Used for configuration errors discovered mid-run that the source
/// project (`c-chess-cli`) treats as `DIE`: not recoverable by continuing
/// the match, but not worth a Rust panic/backtrace either.
macro_rules! die {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
        std::process::exit(1);
    }};
}
pub(crate) use die;
