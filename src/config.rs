//! Match configuration: per-engine settings and run-wide options.
//!
//! Grounded in `engine/config.rs`'s `EngineOptions` (a plain struct with
//! `Default`, constructed from CLI flags and merged with an optional file)
//! and supplemented with the run-wide knobs spec.md §2 lists as CLI flags
//! (`-each`, `-engine`, `-games`, `-draw`, `-resign`, `-sample*`, ...).

use std::path::PathBuf;

/// One engine's identity, launch options and search/clock limits.
///
/// At most one of `movetime`, `{time, increment, movestogo}`, or
/// `{depth, nodes}` is expected to be meaningful at once, but nothing here
/// enforces that — `clock::prepare_time_left` and `uci_format::go_command`
/// apply the same precedence the reference engine driver does.
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub path: PathBuf,
    pub name: Option<String>,
    /// Declared (not negotiated) support for `UCI_Chess960`, from `-each`
    /// / `-engine` flags. A Chess960 game with an engine that doesn't
    /// declare this is a configuration error (spec.md §7).
    pub supports_chess960: bool,
    /// `setoption name <0> value <1>` pairs sent right after the UCI
    /// handshake, in declaration order.
    pub options: Vec<(String, String)>,
    /// Base time budget in milliseconds (`tc=time+increment`, `-each`).
    pub time: Option<u64>,
    pub increment: Option<u64>,
    pub movetime: Option<u64>,
    pub nodes: Option<u64>,
    pub depth: Option<u32>,
    pub movestogo: Option<u32>,
}

/// `sp` in the C source: governs which positions get written to the
/// sample output and at what rate.
#[derive(Debug, Clone, Copy)]
pub struct SamplePolicy {
    /// Resolve the position forward along the reported PV before sampling
    /// it, skipping tactical sequences, rather than sampling the position
    /// actually sent to the engine.
    pub resolve: bool,
    /// Base acceptance probability at `rule50 == 0`.
    pub freq: f64,
    /// Exponential decay applied as `rule50` grows, so quiet long games
    /// don't flood the sample file with near-duplicate positions.
    pub decay: f64,
}

impl Default for SamplePolicy {
    fn default() -> Self {
        Self {
            resolve: false,
            freq: 1.0,
            decay: 0.0,
        }
    }
}

/// Run-wide knobs, independent of either engine, mirroring the C source's
/// `Options` struct and spec.md §2's flag table.
#[derive(Debug, Clone)]
pub struct Options {
    pub games: u32,
    pub rounds: u32,
    pub concurrency: usize,
    /// `0` disables draw adjudication.
    pub draw_count: u32,
    pub draw_score: i32,
    pub draw_number: u32,
    /// `0` disables resign adjudication.
    pub resign_count: u32,
    pub resign_score: i32,
    pub resign_number: u32,
    pub sample_policy: SamplePolicy,
    pub pgn_out: Option<PathBuf>,
    /// `0`: tags only. `1`: + moves, no comments. `2`: + `{score/depth}`.
    /// `3`: + `{score/depth time}`.
    pub pgn_verbosity: u8,
    pub samples_out: Option<PathBuf>,
    pub samples_bin: bool,
    pub book: Option<PathBuf>,
    pub book_random: bool,
    pub seed: u64,
    /// Alternates which engine plays White every other game when true.
    pub reverse: bool,
    /// Every opening served by the book (or the default start position,
    /// if there is no book) is a Chess960 setup, requiring `-each`'s
    /// engines to declare `UCI_Chess960` support.
    pub chess960: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            games: 1,
            rounds: 1,
            concurrency: 1,
            draw_count: 0,
            draw_score: 0,
            draw_number: 0,
            resign_count: 0,
            resign_score: 0,
            resign_number: 0,
            sample_policy: SamplePolicy::default(),
            pgn_out: None,
            pgn_verbosity: 0,
            samples_out: None,
            samples_bin: false,
            book: None,
            book_random: false,
            seed: 0,
            reverse: false,
            chess960: false,
        }
    }
}

/// File-based overlay for `Options`/`EngineSpec`, loaded with `toml`
/// before CLI flags are applied on top (CLI always wins — see `cli.rs`).
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct FileConfig {
    pub games: Option<u32>,
    pub rounds: Option<u32>,
    pub concurrency: Option<usize>,
    pub draw_count: Option<u32>,
    pub draw_score: Option<i32>,
    pub draw_number: Option<u32>,
    pub resign_count: Option<u32>,
    pub resign_score: Option<i32>,
    pub resign_number: Option<u32>,
    pub sample_freq: Option<f64>,
    pub sample_decay: Option<f64>,
    pub sample_resolve: Option<bool>,
    pub pgn_out: Option<PathBuf>,
    pub pgn_verbosity: Option<u8>,
    pub samples_out: Option<PathBuf>,
    pub samples_bin: Option<bool>,
    pub book: Option<PathBuf>,
    pub book_random: Option<bool>,
    pub seed: Option<u64>,
    pub reverse: Option<bool>,
    pub chess960: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &std::path::Path) -> crate::error::MatchResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| crate::error::MatchError::Config(e.to_string()))
    }

    /// Applies every `Some` field over `base`, leaving unset fields alone.
    pub fn apply(&self, base: &mut Options) {
        macro_rules! overlay {
            ($field:ident) => {
                if let Some(v) = self.$field.clone() {
                    base.$field = v;
                }
            };
        }
        macro_rules! overlay_opt {
            ($field:ident) => {
                if let Some(v) = self.$field.clone() {
                    base.$field = Some(v);
                }
            };
        }
        overlay!(games);
        overlay!(rounds);
        overlay!(concurrency);
        overlay!(draw_count);
        overlay!(draw_score);
        overlay!(draw_number);
        overlay!(resign_count);
        overlay!(resign_score);
        overlay!(resign_number);
        overlay_opt!(pgn_out);
        overlay!(pgn_verbosity);
        overlay_opt!(samples_out);
        overlay!(samples_bin);
        overlay_opt!(book);
        overlay!(book_random);
        overlay!(seed);
        overlay!(reverse);
        overlay!(chess960);

        if let Some(freq) = self.sample_freq {
            base.sample_policy.freq = freq;
        }
        if let Some(decay) = self.sample_decay {
            base.sample_policy.decay = decay;
        }
        if let Some(resolve) = self.sample_resolve {
            base.sample_policy.resolve = resolve;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_overlay_only_touches_set_fields() {
        let mut options = Options::default();
        options.games = 10;

        let file = FileConfig {
            rounds: Some(4),
            sample_freq: Some(0.5),
            ..Default::default()
        };
        file.apply(&mut options);

        assert_eq!(options.games, 10);
        assert_eq!(options.rounds, 4);
        assert_eq!(options.sample_policy.freq, 0.5);
    }
}
