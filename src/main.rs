//! Entry point: parse CLI flags, partition `--games * --rounds` games
//! evenly across `--concurrency` workers (each worker owns its own
//! engine pair for its whole share), and print a final score line, in
//! the spirit of the internal gauntlet runner's `"Final score: Engine A
//! X - Engine B Y"` summary.

use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use match_runner::cli::Cli;
use match_runner::openings::Openings;
use match_runner::worker;
use tokio::task::JoinSet;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let specs = match cli.engine_specs() {
        Ok(specs) => specs,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    let options = match cli.options() {
        Ok(options) => Arc::new(options),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let openings = match &options.book {
        Some(path) => match Openings::open(path, options.book_random, options.seed) {
            Ok(book) => Some(Arc::new(book)),
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let total_games = options.games * options.rounds;
    let worker_count = options.concurrency.min(total_games.max(1) as usize).max(1);
    let mut tasks = JoinSet::new();

    info!(
        "starting match: {} vs {}, {total_games} games, {worker_count} workers",
        specs[0].path.display(),
        specs[1].path.display(),
    );

    for worker_id in 0..worker_count {
        let share = total_games / worker_count as u32;
        let extra = total_games % worker_count as u32;
        let game_count = share + if (worker_id as u32) < extra { 1 } else { 0 };
        let round_start = worker_id as u32 * share + (worker_id as u32).min(extra);

        if game_count == 0 {
            continue;
        }

        let specs = specs.clone();
        let options = options.clone();
        let openings = openings.clone();

        tasks.spawn(async move {
            worker::run(worker_id, specs, options, openings, round_start, game_count).await
        });
    }

    let mut wins = 0u32;
    let mut losses = 0u32;
    let mut draws = 0u32;

    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(summary)) => {
                wins += summary.wins;
                losses += summary.losses;
                draws += summary.draws;
            }
            Ok(Err(e)) => error!("worker failed: {e}"),
            Err(e) => error!("worker task panicked: {e}"),
        }
    }

    println!(
        "Final score: Engine A {:.1} - Engine B {:.1}",
        wins as f64 + 0.5 * draws as f64,
        losses as f64 + 0.5 * draws as f64
    );
}
