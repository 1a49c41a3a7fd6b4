//! Opening book: a thread-safe cursor over a file of one FEN per line.
//!
//! Grounded in `original_source/src/openings.h`'s `Openings` struct (a
//! mutex-guarded file handle plus an offset index), reimplemented with a
//! `Mutex<usize>` cursor over an in-memory offset table instead of a raw
//! `pthread_mutex_t` + `FILE*` pair — the book file is read once at
//! startup and held open read-only for the life of the run, so indexing
//! it into memory costs nothing a production match runner would notice.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{MatchError, MatchResult};

/// A FEN book opened from disk, offering `next()` as the only operation
/// workers need: "give me the next opening, worker `worker_id`'s turn".
pub struct Openings {
    file: Mutex<File>,
    /// Byte offsets of each line's first character, in the order openings
    /// should be dealt out — sequential file order, or pre-shuffled.
    offsets: Vec<u64>,
    cursor: Mutex<usize>,
    path: PathBuf,
}

impl Openings {
    /// Indexes `path` line by line and optionally shuffles the resulting
    /// offset table with `seed`, mirroring `openings_new(fileName, random,
    /// threadId)`.
    pub fn open(path: &Path, random: bool, seed: u64) -> MatchResult<Self> {
        let mut file = File::open(path)?;
        let offsets = index_lines(&mut file)?;

        if offsets.is_empty() {
            return Err(MatchError::EmptyOpeningBook {
                path: path.to_path_buf(),
            });
        }

        let mut offsets = offsets;
        if random {
            let mut rng = StdRng::seed_from_u64(seed);
            offsets.shuffle(&mut rng);
        }

        Ok(Self {
            file: Mutex::new(file),
            offsets,
            cursor: Mutex::new(0),
            path: path.to_path_buf(),
        })
    }

    /// Returns the next FEN in the book, wrapping around once exhausted.
    /// `worker_id` is accepted (and logged on error) purely for parity
    /// with the reference interface's per-thread diagnostics — the cursor
    /// itself is shared, not partitioned by worker.
    pub fn next(&self, worker_id: usize) -> MatchResult<String> {
        let offset = {
            let mut cursor = self.cursor.lock().unwrap();
            let offset = self.offsets[*cursor % self.offsets.len()];
            *cursor += 1;
            offset
        };

        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(offset)).map_err(|e| {
            log::error!("worker {worker_id}: failed to seek opening book {:?}: {e}", self.path);
            MatchError::Io(e)
        })?;

        let mut reader = BufReader::new(&mut *file);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

fn index_lines(file: &mut File) -> MatchResult<Vec<u64>> {
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let mut offsets = Vec::new();
    let mut offset = 0u64;
    for line in contents.split_inclusive('\n') {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            offsets.push(offset);
        }
        offset += line.len() as u64;
    }
    Ok(offsets)
}
