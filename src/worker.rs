//! One match worker: owns a pair of engine processes and a private RNG,
//! and plays its share of the match's games against them sequentially.
//!
//! Grounded in `engine/manager.rs`'s "own the process, own the analysis
//! loop" resource model, stripped of the GUI-specific multi-tab registry
//! (`DashMap<(tab, path), ...>`) since a worker here only ever drives
//! exactly two engines for its own lifetime.

use std::sync::Arc;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess};

use crate::config::{EngineSpec, Options};
use crate::driver::play;
use crate::engine_proto::UciEngine;
use crate::error::MatchResult;
use crate::openings::Openings;
use crate::position::{Game, MatchOutcome};
use crate::transport::EngineTransport;
use crate::{pgn, samples};

/// Tally of engine 0's results across every game this worker played.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerSummary {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl WorkerSummary {
    fn record(&mut self, outcome: MatchOutcome) {
        match outcome {
            MatchOutcome::Win => self.wins += 1,
            MatchOutcome::Loss => self.losses += 1,
            MatchOutcome::Draw => self.draws += 1,
        }
    }
}

/// Plays games `round_start..round_start + game_count` (a contiguous
/// slice of the match's total game count, assigned by `main.rs`), each
/// round alternating which engine moves first when `options.reverse`.
pub async fn run(
    worker_id: usize,
    specs: [EngineSpec; 2],
    options: Arc<Options>,
    openings: Option<Arc<Openings>>,
    round_start: u32,
    game_count: u32,
) -> MatchResult<WorkerSummary> {
    info!("worker {worker_id}: starting, {game_count} games");

    let mut engines: [Box<dyn UciEngine>; 2] = [
        Box::new(spawn(&specs[0]).await?),
        Box::new(spawn(&specs[1]).await?),
    ];

    let mut rng = StdRng::seed_from_u64(options.seed ^ (worker_id as u64).wrapping_mul(0x9E3779B97F4A7C15));
    let mut summary = WorkerSummary::default();

    for offset in 0..game_count {
        let round = round_start + offset;
        let reverse = options.reverse && round % 2 == 1;

        let start_pos = starting_position(openings.as_deref(), worker_id, options.chess960)?;
        let mut game = Game::with_chess960(round, 0, start_pos, options.chess960);

        let outcome = play(&mut engines, &specs, &options, &mut game, reverse, &mut rng).await?;
        summary.record(outcome);

        info!(
            "worker {worker_id}: game {round} finished, state={:?}, outcome={:?}",
            game.state, outcome
        );

        if let Some(path) = &options.pgn_out {
            pgn::append_to_file(path, &game, options.pgn_verbosity)?;
        }
        if let Some(path) = &options.samples_out {
            samples::append_to_file(path, &game.samples, options.samples_bin)?;
        }
    }

    for engine in &mut engines {
        let _ = engine.new_game().await;
    }

    Ok(summary)
}

async fn spawn(spec: &EngineSpec) -> MatchResult<EngineTransport> {
    EngineTransport::spawn(
        &spec.path,
        spec.name.as_deref(),
        &spec.options,
        spec.supports_chess960,
    )
    .await
}

fn starting_position(
    openings: Option<&Openings>,
    worker_id: usize,
    chess960: bool,
) -> MatchResult<Chess> {
    let mode = if chess960 { CastlingMode::Chess960 } else { CastlingMode::Standard };
    match openings {
        Some(book) => {
            let fen_str = book.next(worker_id)?;
            let fen: Fen = fen_str.parse()?;
            Ok(fen.into_position(mode)?)
        }
        None => Ok(Chess::default()),
    }
}
