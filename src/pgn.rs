//! PGN writer: tag section + movetext, matching `game_export_pgn()` in
//! `original_source/src/game.c` exactly (tag order, comment formats,
//! ply-wrap width per verbosity level).
//!
//! Output is appended to a shared file across workers, so writes are
//! wrapped in an `fs2` advisory lock the way the C source wraps
//! `game_export_pgn`/`game_export_samples` in `flockfile`/`funlockfile`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use shakmaty::fen::Fen;
use shakmaty::{Color, EnPassantMode, Position};

use crate::error::MatchResult;
use crate::position::{is_mated, is_mating, Game, GameState, MATE_SCORE_MAX, MATE_SCORE_MIN};

/// PGN `Result` tag value + a human-readable termination reason, from
/// `game_decode_state()`.
pub fn decode_state(game: &Game) -> (&'static str, &'static str) {
    let result = match game.state {
        GameState::None => "*",
        GameState::Checkmate | GameState::IllegalMove | GameState::Resign | GameState::TimeLoss => {
            if game.current().turn() == Color::White {
                "0-1"
            } else {
                "1-0"
            }
        }
        _ => "1/2-1/2",
    };
    (result, game.state.termination_reason())
}

/// Renders one finished game's PGN, per spec.md §6.2.
pub fn render(game: &Game, verbosity: u8) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "[Round \"{}.{}\"]\n",
        game.round + 1,
        game.game_id + 1
    ));
    out.push_str(&format!("[White \"{}\"]\n", game.names[0]));
    out.push_str(&format!("[Black \"{}\"]\n", game.names[1]));

    let (result, reason) = decode_state(game);
    out.push_str(&format!("[Result \"{result}\"]\n"));
    out.push_str(&format!("[Termination \"{reason}\"]\n"));

    let start_setup = game.pos[0].clone().into_setup(EnPassantMode::Legal);
    out.push_str(&format!("[FEN \"{}\"]\n", Fen::from_setup(start_setup)));

    if game.chess960 {
        out.push_str("[Variant \"Chess960\"]\n");
    }
    out.push_str(&format!("[PlyCount \"{}\"]\n", game.ply));

    if verbosity > 0 {
        out.push('\n');
        let plies_per_line: usize = match verbosity {
            2 => 6,
            3 => 5,
            _ => 16,
        };

        for ply in 1..=game.ply {
            let before = &game.pos[ply - 1];
            if before.turn() == Color::White || ply == 1 {
                let full_move = before.fullmoves().get();
                if before.turn() == Color::White {
                    out.push_str(&format!("{full_move}. "));
                } else {
                    out.push_str(&format!("{full_move}... "));
                }
            }

            let mv = game.last_move[ply].as_ref().expect("lastMove set for ply >= 1");
            let san = shakmaty::san::SanPlus::from_move(before.clone(), mv);
            out.push_str(&san.to_string());

            if game.pos[ply].is_check() {
                if ply == game.ply && game.state == GameState::Checkmate {
                    out.push('#');
                } else {
                    out.push('+');
                }
            }

            if verbosity >= 2 {
                let info = &game.info[ply - 1];
                let (depth, score) = (info.depth, info.score);
                if verbosity == 3 {
                    let time = info.time_ms;
                    if is_mating(score) {
                        out.push_str(&format!(" {{M{}/{depth} {time}ms}}", MATE_SCORE_MAX - score));
                    } else if is_mated(score) {
                        out.push_str(&format!(" {{-M{}/{depth} {time}ms}}", score - MATE_SCORE_MIN));
                    } else {
                        out.push_str(&format!(" {{{score}/{depth} {time}ms}}"));
                    }
                } else if is_mating(score) {
                    out.push_str(&format!(" {{M{}/{depth}}}", MATE_SCORE_MAX - score));
                } else if is_mated(score) {
                    out.push_str(&format!(" {{-M{}/{depth}}}", score - MATE_SCORE_MIN));
                } else {
                    out.push_str(&format!(" {{{score}/{depth}}}"));
                }
            }

            out.push(if ply % plies_per_line == 0 { '\n' } else { ' ' });
        }
    }

    out.push_str(result);
    out.push_str("\n\n");
    out
}

/// Appends `render(game, verbosity)` to `path`, holding an exclusive
/// cross-process lock for the duration of the write.
pub fn append_to_file(path: &Path, game: &Game, verbosity: u8) -> MatchResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;
    let result = file.write_all(render(game, verbosity).as_bytes());
    let _ = file.unlock();
    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen as ParseFen;
    use shakmaty::{CastlingMode, Chess};

    fn checkmated_game() -> Game {
        let fen: ParseFen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"
            .parse()
            .unwrap();
        let pos: Chess = fen.into_position(CastlingMode::Standard).unwrap();
        let mut game = Game::new(2, 1, Chess::default());
        game.names = ["Engine A".into(), "Engine B".into()];
        // Replay the actual moves so last_move/info line up with pos history.
        for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            let mv = uci
                .parse::<shakmaty::uci::UciMove>()
                .unwrap()
                .to_move(game.current())
                .unwrap();
            game.info.push(crate::position::Info {
                depth: 1,
                score: 0,
                time_ms: 10,
            });
            game.push_move(mv);
        }
        assert_eq!(game.current().board().clone(), pos.board().clone());
        game.state = GameState::Checkmate;
        game
    }

    #[test]
    fn decode_state_reports_black_win_on_checkmate() {
        let game = checkmated_game();
        assert_eq!(decode_state(&game), ("0-1", "checkmate"));
    }

    #[test]
    fn render_includes_tags_and_terminal_hash() {
        let game = checkmated_game();
        let pgn = render(&game, 1);
        assert!(pgn.contains("[Round \"3.2\"]"));
        assert!(pgn.contains("[White \"Engine A\"]"));
        assert!(pgn.contains("Qxh4#"));
        assert!(pgn.trim_end().ends_with("0-1"));
    }

    #[test]
    fn render_verbosity_zero_has_no_movetext() {
        let game = checkmated_game();
        let pgn = render(&game, 0);
        assert!(!pgn.contains("Qxh4"));
    }
}
