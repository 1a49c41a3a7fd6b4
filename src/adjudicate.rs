//! C1: chess-rule adjudicator.
//!
//! Classifies the state of a game from its position history, in the
//! precedence order spec.md §4.1 requires (mate/stalemate first, then
//! fifty-move, then insufficient material, then threefold) and returns
//! the legal moves from the current position when the game is still
//! ongoing.

use shakmaty::{MoveList, Position};

use crate::position::{Game, GameState, PositionExt};

/// Result of one adjudication pass: either the game continues (with its
/// legal moves attached, so the driver doesn't have to regenerate them),
/// or it has just ended.
pub enum Adjudication {
    Ongoing(MoveList),
    Ended(GameState),
}

/// Runs the five-step precedence chain from spec.md §4.1 against
/// `game.pos[game.ply]`.
pub fn adjudicate(game: &Game) -> Adjudication {
    let pos = &game.pos[game.ply];
    let legal_moves = pos.legal_moves();

    if legal_moves.is_empty() {
        return Adjudication::Ended(if pos.is_check() {
            GameState::Checkmate
        } else {
            GameState::Stalemate
        });
    }

    if pos.rule50() >= 100 {
        debug_assert_eq!(pos.rule50(), 100, "rule50 should never overshoot 100");
        return Adjudication::Ended(GameState::FiftyMoves);
    }

    if pos.is_insufficient_material() {
        return Adjudication::Ended(GameState::InsufficientMaterial);
    }

    if is_threefold(game) {
        return Adjudication::Ended(GameState::Threefold);
    }

    Adjudication::Ongoing(legal_moves)
}

/// Walks backward in strides of 2 ply, bounded by `min(rule50, ply)` (any
/// rule50-resetting move makes earlier positions unreachable by
/// repetition), counting occurrences of the current key. Three total
/// occurrences (the current position plus two prior ones) triggers the
/// draw.
fn is_threefold(game: &Game) -> bool {
    let pos = &game.pos[game.ply];
    let key = pos.repetition_key();
    let bound = pos.rule50().min(game.ply as u32);

    let mut repetitions = 1;
    let mut i = 4u32;
    while i <= bound {
        let earlier = &game.pos[game.ply - i as usize];
        if earlier.repetition_key() == key {
            repetitions += 1;
            if repetitions >= 3 {
                return true;
            }
        }
        i += 2;
    }
    false
}
