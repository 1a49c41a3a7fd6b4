//! C4: PV resolution and training-sample acceptance.
//!
//! `resolve_pv` walks an engine's reported principal variation forward
//! from the current position, stopping at the first quiet (non-tactical)
//! move — mirroring `resolve_pv()` in `original_source/src/game.c`, which
//! exists because sampling the position right after a capture sequence
//! captures a transient material imbalance rather than the position's
//! actual evaluation. `accept_sample` reimplements the `game_play()`
//! acceptance test: `freq * exp(-decay * rule50)` against a per-worker
//! RNG draw.

use rand::Rng;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Position};

use crate::config::SamplePolicy;
use crate::position::{is_mate, Game, Sample};

/// Plays `pv` (a space-separated LAN move list) forward from `game`'s
/// current position, stopping at the first move that is not a capture,
/// en-passant capture, promotion, or a reply forced by check (the
/// position before the move is in check). Illegal or unparseable tokens
/// end the walk early rather than panicking — an engine's PV is not
/// guaranteed to stay legal once illusory lines are explored.
///
/// Returns the last position reached that was not itself in check, or the
/// starting position if no such position was reached (a valid position is
/// always returned, even if it is in check).
pub fn resolve_pv(game: &Game, pv: &str) -> Chess {
    let mut current = game.current().clone();
    let mut resolved = current.clone();

    for token in pv.split_whitespace() {
        let uci: UciMove = match token.parse() {
            Ok(uci) => uci,
            Err(_) => break,
        };
        let mv = match uci.to_move(&current) {
            Ok(mv) => mv,
            Err(_) => break,
        };

        if !(mv.is_capture() || mv.is_en_passant() || mv.is_promotion() || current.is_check()) {
            break;
        }

        current.play_unchecked(&mv);

        if !current.is_check() {
            resolved = current.clone();
        }
    }

    resolved
}

/// Whether the position reached after resolving `pv` (or the raw current
/// position, if `policy.resolve` is false) should be written to the
/// sample file, and if so, under which score and position.
///
/// `score` is the engine's reported centipawn/mate score for the position
/// actually sent to the engine (`game.current()`), not for `resolved`.
pub fn accept_sample(
    policy: &SamplePolicy,
    game: &Game,
    resolved: &Chess,
    score: i32,
    rng: &mut impl Rng,
) -> Option<Sample> {
    if policy.resolve && is_mate(score) {
        return None;
    }

    let rule50 = game.current().halfmoves() as f64;
    let threshold = policy.freq * (-policy.decay * rule50).exp();
    if rng.gen::<f64>() > threshold {
        return None;
    }

    let position = if policy.resolve {
        resolved.clone()
    } else {
        game.current().clone()
    };

    // Discarded if PV resolution landed on an in-check position: a valid
    // FEN, but not representative of a quiescent evaluation.
    if policy.resolve && position.is_check() {
        return None;
    }

    let score = if position.turn() == game.current().turn() {
        score
    } else {
        -score
    };

    Some(Sample {
        position,
        score,
        result: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;
    use shakmaty::CastlingMode;

    fn game_from_fen(fen: &str) -> Game {
        let fen: Fen = fen.parse().unwrap();
        let pos: Chess = fen.into_position(CastlingMode::Standard).unwrap();
        Game::new(0, 0, pos)
    }

    #[test]
    fn resolve_pv_stops_at_first_quiet_move() {
        // Position with a capture available on e4 x d5, then a quiet move.
        let game = game_from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let resolved = resolve_pv(&game, "e4d5 d8d5 b1c3");
        // e4d5 is a capture (resolved once), d8d5 is a capture (resolved
        // again), b1c3 is quiet so the walk stops before applying it.
        let expected_fen = {
            let mut pos = game.current().clone();
            let mv = "e4d5".parse::<UciMove>().unwrap().to_move(&pos).unwrap();
            pos.play_unchecked(&mv);
            let mv = "d8d5".parse::<UciMove>().unwrap().to_move(&pos).unwrap();
            pos.play_unchecked(&mv);
            pos
        };
        assert_eq!(resolved.board().clone(), expected_fen.board().clone());
    }

    #[test]
    fn resolve_pv_with_no_tactical_moves_returns_current_position() {
        let game = game_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let resolved = resolve_pv(&game, "g1f3 g8f6");
        assert_eq!(resolved.board().clone(), game.current().board().clone());
    }

    #[test]
    fn accept_sample_rejects_mate_scores_when_resolve_enabled() {
        let policy = SamplePolicy {
            resolve: true,
            freq: 1.0,
            decay: 0.0,
        };
        let game = game_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let resolved = game.current().clone();
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let sample = accept_sample(&policy, &game, &resolved, crate::position::MATE_SCORE_MAX, &mut rng);
        assert!(sample.is_none());
    }

    #[test]
    fn accept_sample_always_fires_at_freq_one_decay_zero() {
        let policy = SamplePolicy {
            resolve: false,
            freq: 1.0,
            decay: 0.0,
        };
        let game = game_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let resolved = game.current().clone();
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let sample = accept_sample(&policy, &game, &resolved, 42, &mut rng).unwrap();
        assert_eq!(sample.score, 42);
        assert_eq!(sample.result, None);
    }
}
