//! C4's output half: writing accepted samples to disk, per spec.md §6.3.
//!
//! `shakmaty` has no dedicated `PackedPos` codec (the reference project's
//! own bit-packed position struct is specific to its board
//! representation), so the binary format's "packed position byte block"
//! is a length-prefixed FEN instead: one byte of length followed by the
//! FEN's ASCII bytes. It is still compact, self-delimiting, and losslessly
//! round-trips through the same `shakmaty::fen::Fen` parser used
//! everywhere else in this crate — see DESIGN.md for the tradeoff.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use shakmaty::fen::Fen;
use shakmaty::{EnPassantMode, Position};

use crate::error::MatchResult;
use crate::position::{Sample, SampleResult};

fn result_byte(result: Option<SampleResult>) -> u8 {
    match result {
        Some(SampleResult::Loss) => 0,
        Some(SampleResult::Draw) => 1,
        Some(SampleResult::Win) => 2,
        // NB_RESULT sentinel: should never reach the writer, since
        // Game::label_samples runs before export, but a writer shouldn't
        // panic on it either.
        None => 1,
    }
}

fn sample_fen(sample: &Sample) -> String {
    let setup = sample.position.clone().into_setup(EnPassantMode::Legal);
    Fen::from_setup(setup).to_string()
}

fn render_csv(samples: &[Sample]) -> MatchResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for sample in samples {
        writer.write_record(&[
            sample_fen(sample),
            sample.score.to_string(),
            result_byte(sample.result).to_string(),
        ])?;
    }
    Ok(writer.into_inner().expect("in-memory writer never fails to flush"))
}

fn render_bin(samples: &[Sample]) -> Vec<u8> {
    let mut out = Vec::new();
    for sample in samples {
        let fen = sample_fen(sample);
        out.push(fen.len() as u8);
        out.extend_from_slice(fen.as_bytes());
        out.extend_from_slice(&sample.score.to_le_bytes());
        out.push(result_byte(sample.result));
    }
    out
}

/// Appends `samples` to `path` in the requested format, holding an
/// exclusive cross-process lock for the duration of the write — matching
/// `game_export_samples()`'s `flockfile`/`funlockfile` bracket.
pub fn append_to_file(path: &Path, samples: &[Sample], binary: bool) -> MatchResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;
    let result = if binary {
        file.write_all(&render_bin(samples)).map_err(Into::into)
    } else {
        render_csv(samples).and_then(|bytes| Ok(file.write_all(&bytes)?))
    };
    let _ = file.unlock();
    result
}
