//! C2: UCI command formatter.
//!
//! Produces the exact `position ...` and `go ...` strings sent to
//! engines, per spec.md §4.2. Pure functions over `&Game`/`&EngineSpec`
//! so they're trivial to unit test against the reference algorithm in
//! `original_source/src/game.c`.

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{EnPassantMode, Position};

use crate::config::EngineSpec;
use crate::position::{Game, PositionExt};

/// `position fen <FEN> [moves <lan>...]`, pruned to the last rule50 reset
/// (any position before it cannot be repeated or counted toward the
/// 50-move rule, so dropping it loses no information the engine needs).
pub fn position_command(game: &Game) -> String {
    let ply0 = game.ply.saturating_sub(game.pos[game.ply].rule50() as usize);
    let setup = game.pos[ply0].clone().into_setup(EnPassantMode::Legal);
    let fen = Fen::from_setup(setup);

    let mut cmd = format!("position fen {fen}");
    if ply0 < game.ply {
        cmd.push_str(" moves");
        for ply in (ply0 + 1)..=game.ply {
            let mv = game.last_move[ply]
                .as_ref()
                .expect("last_move must be set for ply >= 1");
            let uci = UciMove::from_move(mv, game.castling_mode());
            cmd.push(' ');
            cmd.push_str(&uci.to_string());
        }
    }
    cmd
}

/// `go [nodes N] [depth D] [movetime MS] [wtime .. winc .. btime .. binc ..] [movestogo R]`.
///
/// `ei` is the index (0 or 1) of the engine about to move; `time_left` is
/// indexed the same way. The `ei ^ color` mapping from spec.md §4.2 is
/// implemented directly: `color` is 0 for White and 1 for Black, so
/// `ei ^ color` recovers the *other* engine's index when `ei` itself is
/// seated on the color that is not to move.
pub fn go_command(game: &Game, specs: &[EngineSpec; 2], ei: usize, time_left: &[i64; 2]) -> String {
    let spec = &specs[ei];
    let mut cmd = String::from("go");

    if let Some(nodes) = spec.nodes {
        cmd.push_str(&format!(" nodes {nodes}"));
    }
    if let Some(depth) = spec.depth {
        cmd.push_str(&format!(" depth {depth}"));
    }
    if let Some(movetime) = spec.movetime {
        cmd.push_str(&format!(" movetime {movetime}"));
    }

    if spec.time.is_some() || spec.increment.is_some() {
        let color = color_index(&game.pos[game.ply]);
        let white_ei = ei ^ color;
        let black_ei = white_ei ^ 1;
        cmd.push_str(&format!(
            " wtime {} winc {} btime {} binc {}",
            time_left[white_ei],
            specs[white_ei].increment.unwrap_or(0),
            time_left[black_ei],
            specs[black_ei].increment.unwrap_or(0),
        ));
    }

    if let Some(movestogo) = spec.movestogo {
        if movestogo > 0 {
            let remaining = movestogo - ((game.ply as u32 / 2) % movestogo);
            cmd.push_str(&format!(" movestogo {remaining}"));
        }
    }

    cmd
}

/// White = 0, Black = 1 — the "color as engine index" convention spec.md
/// §4.5 calls a "3-way XOR" symmetry.
pub fn color_index(pos: &shakmaty::Chess) -> usize {
    match pos.turn() {
        shakmaty::Color::White => 0,
        shakmaty::Color::Black => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSpec;
    use shakmaty::{CastlingMode, Chess};
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
    fn position_command_omits_moves_at_game_start() {
        let game = Game::new(0, 0, Chess::default());
        assert_eq!(
            position_command(&game),
            "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn position_command_prunes_before_rule50_reset() {
        let fen: Fen = "8/8/4k3/8/8/4K3/8/7R w - - 3 50".parse().unwrap();
        let pos: Chess = fen.into_position(CastlingMode::Standard).unwrap();
        let game = Game::new(0, 0, pos);
        let cmd = position_command(&game);
        assert!(cmd.starts_with("position fen 8/8/4k3/8/8/4K3/8/7R"));
        assert!(!cmd.contains("moves"));
    }

    #[test]
    fn go_command_with_depth_only() {
        let game = Game::new(0, 0, Chess::default());
        let mut s = spec();
        s.depth = Some(10);
        let cmd = go_command(&game, &[s.clone(), s], 0, &[0, 0]);
        assert_eq!(cmd, "go depth 10");
    }

    #[test]
    fn go_command_maps_engine_index_to_color() {
        let game = Game::new(0, 0, Chess::default());
        let mut white = spec();
        white.time = Some(60_000);
        white.increment = Some(500);
        let mut black = spec();
        black.time = Some(30_000);
        black.increment = Some(250);
        // Engine 0 is seated as White (turn is White, ei == color).
        let cmd = go_command(&game, &[white, black], 0, &[60_000, 30_000]);
        assert_eq!(cmd, "go wtime 60000 winc 500 btime 30000 binc 250");
    }

    #[test]
    fn go_command_movestogo_counts_down_window() {
        let fen: Fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            .parse()
            .unwrap();
        let pos: Chess = fen.into_position(CastlingMode::Standard).unwrap();
        let mut game = Game::new(0, 0, pos);
        game.ply = 6; // ply/2 == 3
        let mut s = spec();
        s.movestogo = Some(5);
        let cmd = go_command(&game, &[s.clone(), s], 0, &[0, 0]);
        assert_eq!(cmd, "go movestogo 2");
    }
}
