//! Command-line parsing: turns flags into `EngineSpec`/`Options`, then
//! lets an optional `--config` TOML file overlay on top of CLI-derived
//! defaults before any `--` flag that was explicitly passed overrides it
//! again. Grounded in the `usi-gauntlet`-style gauntlet runner's
//! `clap::Parser` struct (`other_examples`), generalized from that
//! runner's fixed two-named-sides shape to two fully independent engine
//! specs the way spec.md §2's C1–C5 split expects.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{EngineSpec, FileConfig, Options, SamplePolicy};
use crate::error::MatchError;

#[derive(Parser, Debug)]
#[command(name = "match-runner", about = "Command-line match runner for two UCI chess engines")]
pub struct Cli {
    /// Path to the first engine's executable.
    #[arg(long)]
    pub engine1: PathBuf,
    /// Display name for the first engine (defaults to its filename).
    #[arg(long)]
    pub name1: Option<String>,
    /// Path to the second engine's executable.
    #[arg(long)]
    pub engine2: PathBuf,
    #[arg(long)]
    pub name2: Option<String>,

    /// `setoption` pairs for both engines, repeatable (`--option
    /// Threads=4`).
    #[arg(long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Base time per side in milliseconds.
    #[arg(long)]
    pub time: Option<u64>,
    /// Increment per move in milliseconds.
    #[arg(long)]
    pub increment: Option<u64>,
    /// Fixed think time per move, overriding `--time`/`--increment`.
    #[arg(long)]
    pub movetime: Option<u64>,
    #[arg(long)]
    pub nodes: Option<u64>,
    #[arg(long)]
    pub depth: Option<u32>,
    #[arg(long)]
    pub movestogo: Option<u32>,
    /// Both engines declare `UCI_Chess960` support.
    #[arg(long)]
    pub chess960: bool,

    #[arg(long, default_value_t = 1)]
    pub games: u32,
    #[arg(long, default_value_t = 1)]
    pub rounds: u32,
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,
    /// Alternate which engine plays White every other game.
    #[arg(long)]
    pub reverse: bool,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[arg(long, default_value_t = 0)]
    pub draw_count: u32,
    #[arg(long, default_value_t = 0)]
    pub draw_score: i32,
    #[arg(long, default_value_t = 0)]
    pub draw_number: u32,
    #[arg(long, default_value_t = 0)]
    pub resign_count: u32,
    #[arg(long, default_value_t = 0)]
    pub resign_score: i32,
    #[arg(long, default_value_t = 0)]
    pub resign_number: u32,

    #[arg(long, default_value_t = 1.0)]
    pub sample_freq: f64,
    #[arg(long, default_value_t = 0.0)]
    pub sample_decay: f64,
    #[arg(long)]
    pub sample_resolve: bool,

    #[arg(long)]
    pub pgn_out: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    pub pgn_verbosity: u8,
    #[arg(long)]
    pub samples_out: Option<PathBuf>,
    #[arg(long)]
    pub samples_bin: bool,

    #[arg(long)]
    pub book: Option<PathBuf>,
    #[arg(long)]
    pub book_random: bool,

    /// Optional TOML file overlaying every run-wide option not also given
    /// explicitly on the command line.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn engine_specs(&self) -> Result<[EngineSpec; 2], MatchError> {
        let options = parse_options(&self.options)?;
        let build = |path: &PathBuf, name: &Option<String>| EngineSpec {
            path: path.clone(),
            name: name.clone(),
            supports_chess960: self.chess960,
            options: options.clone(),
            time: self.time,
            increment: self.increment,
            movetime: self.movetime,
            nodes: self.nodes,
            depth: self.depth,
            movestogo: self.movestogo,
        };
        Ok([build(&self.engine1, &self.name1), build(&self.engine2, &self.name2)])
    }

    pub fn options(&self) -> Result<Options, MatchError> {
        let mut options = Options {
            games: self.games,
            rounds: self.rounds,
            concurrency: self.concurrency.max(1),
            draw_count: self.draw_count,
            draw_score: self.draw_score,
            draw_number: self.draw_number,
            resign_count: self.resign_count,
            resign_score: self.resign_score,
            resign_number: self.resign_number,
            sample_policy: SamplePolicy {
                resolve: self.sample_resolve,
                freq: self.sample_freq,
                decay: self.sample_decay,
            },
            pgn_out: self.pgn_out.clone(),
            pgn_verbosity: self.pgn_verbosity,
            samples_out: self.samples_out.clone(),
            samples_bin: self.samples_bin,
            book: self.book.clone(),
            book_random: self.book_random,
            seed: self.seed,
            reverse: self.reverse,
            chess960: self.chess960,
        };

        if let Some(path) = &self.config {
            FileConfig::load(path)?.apply(&mut options);
        }

        Ok(options)
    }
}

fn parse_options(raw: &[String]) -> Result<Vec<(String, String)>, MatchError> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| MatchError::Config(format!("malformed --option '{entry}', expected NAME=VALUE")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_options_splits_on_first_equals() {
        let parsed = parse_options(&["Threads=4".to_string(), "Hash=256".to_string()]).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("Threads".to_string(), "4".to_string()),
                ("Hash".to_string(), "256".to_string())
            ]
        );
    }

    #[test]
    fn parse_options_rejects_missing_equals() {
        assert!(parse_options(&["Threads".to_string()]).is_err());
    }
}
