//! Library surface for the match runner: the game driver and all of its
//! supporting components, re-exported the way `chess/mod.rs` and
//! `engine/mod.rs` re-export their own submodules' public types.

pub mod adjudicate;
pub mod cli;
pub mod clock;
pub mod config;
pub mod driver;
pub mod engine_proto;
pub mod error;
pub mod openings;
pub mod pgn;
pub mod position;
pub mod sampler;
pub mod samples;
pub mod transport;
pub mod uci_format;
pub mod worker;

pub use config::{EngineSpec, FileConfig, Options, SamplePolicy};
pub use engine_proto::{BestMoveReply, UciEngine};
pub use error::{MatchError, MatchResult};
pub use position::{Game, GameState, Info, MatchOutcome, Sample, SampleResult};
pub use worker::WorkerSummary;
