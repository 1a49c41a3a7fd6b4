//! C3: clock manager.
//!
//! Tracks each engine's remaining time in milliseconds and decides when a
//! refill/increment applies, per spec.md §4.3. Deliberately just a plain
//! value type operated on by free functions — the driver owns the array
//! and the transport layer is the one that subtracts elapsed wall-clock
//! time after a move (see `transport.rs`).

use crate::config::EngineSpec;

/// A large but overflow-safe "infinite" time budget for depth/nodes-only
/// searches, matching the C source's `INT64_MAX / 2` constant.
pub const INFINITE_TIME_MS: i64 = i64::MAX / 2;

/// Prepares `time_left[ei]` before engine `ei` is asked to move, per
/// spec.md §4.3 "Before engine `ei` moves".
pub fn prepare_time_left(spec: &EngineSpec, ply: usize, time_left: &mut i64) {
    if let Some(movetime) = spec.movetime {
        *time_left = movetime as i64;
        return;
    }

    if spec.time.is_some() || spec.increment.is_some() {
        *time_left += spec.increment.unwrap_or(0) as i64;

        if let Some(movestogo) = spec.movestogo {
            if movestogo > 0 && ply > 1 && (ply as u32 / 2) % movestogo == 0 {
                *time_left += spec.time.unwrap_or(0) as i64;
            }
        }
        return;
    }

    *time_left = INFINITE_TIME_MS;
}

/// Whether a negative `time_left[ei]` after the move should be treated as
/// a forfeit: only when some timed control (time, increment or movetime)
/// is actually active.
pub fn is_timed_control(spec: &EngineSpec) -> bool {
    spec.time.is_some() || spec.increment.is_some() || spec.movetime.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn spec() -> EngineSpec {
        EngineSpec {
            path: PathBuf::from("/bin/true"),
            name: None,
            supports_chess960: false,
            options: Vec::new(),
            time: None,
            increment: None,
            movetime: None,
            nodes: None,
            depth: None,
            movestogo: None,
        }
    }

    #[test]
    fn movetime_overwrites_and_discards_accumulation() {
        let mut s = spec();
        s.movetime = Some(500);
        let mut time_left = 10_000;
        prepare_time_left(&s, 4, &mut time_left);
        assert_eq!(time_left, 500);
    }

    #[test]
    fn increment_always_applies_even_when_zero() {
        let mut s = spec();
        s.time = Some(60_000);
        s.increment = Some(0);
        let mut time_left = 5_000;
        prepare_time_left(&s, 4, &mut time_left);
        assert_eq!(time_left, 5_000);
    }

    #[test]
    fn movestogo_refill_on_window_boundary() {
        let mut s = spec();
        s.time = Some(60_000);
        s.increment = Some(1_000);
        s.movestogo = Some(40);
        let mut time_left = 100;
        // ply = 82 -> ply/2 = 41 -> 41 % 40 == 1, no refill
        prepare_time_left(&s, 82, &mut time_left);
        assert_eq!(time_left, 1_100);

        // ply = 80 -> ply/2 = 40 -> 40 % 40 == 0, refill (but ply > 1 required)
        let mut time_left = 100;
        prepare_time_left(&s, 80, &mut time_left);
        assert_eq!(time_left, 100 + 1_000 + 60_000);
    }

    #[test]
    fn depth_only_search_gets_infinite_budget() {
        let mut s = spec();
        s.depth = Some(12);
        let mut time_left = 0;
        prepare_time_left(&s, 4, &mut time_left);
        assert_eq!(time_left, INFINITE_TIME_MS);
    }

    #[test]
    fn is_timed_control_detects_any_of_time_inc_movetime() {
        let mut s = spec();
        assert!(!is_timed_control(&s));
        s.increment = Some(0);
        assert!(is_timed_control(&s));
    }
}
