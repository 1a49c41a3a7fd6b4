//! C5: the game driver — the ply-by-ply state machine that plays one game
//! to completion against two `UciEngine`s.
//!
//! Grounded directly on `game_play()` in `original_source/src/game.c`:
//! the move-deferred-application pattern (a move chosen on ply N is only
//! pushed onto the position history at the top of the ply N+1 iteration)
//! is preserved exactly, because it's what makes the "apply move, then
//! adjudicate, then ask the next engine to move" ordering fall out of a
//! single loop instead of needing a lookahead.

use rand::rngs::StdRng;
use shakmaty::uci::UciMove;

use crate::adjudicate::{adjudicate, Adjudication};
use crate::clock::{is_timed_control, prepare_time_left, INFINITE_TIME_MS};
use crate::config::{EngineSpec, Options};
use crate::engine_proto::UciEngine;
use crate::error::{die, MatchResult};
use crate::position::{Game, GameState, MatchOutcome};
use crate::sampler::{accept_sample, resolve_pv};
use crate::uci_format::{color_index, go_command, position_command};

/// Plays `game` to completion, mutating it in place (`game.state`,
/// `game.pos`, `game.info`, `game.samples` all end up fully populated),
/// and returns the result from engine 0's point of view.
///
/// `reverse` seats `engines[reverse]` to move first, independent of which
/// color that turns out to be in `game.pos[0]` — matching spec.md §4.5's
/// "engine/color symmetry" requirement for fair pairing across a match.
pub async fn play(
    engines: &mut [Box<dyn UciEngine>; 2],
    specs: &[EngineSpec; 2],
    options: &Options,
    game: &mut Game,
    reverse: bool,
    rng: &mut StdRng,
) -> MatchResult<MatchOutcome> {
    seat_names(game, engines, reverse);

    for i in 0..2 {
        if game.chess960 {
            if specs[i].supports_chess960 {
                engines[i].set_chess960().await?;
            } else {
                die!(
                    "engine '{}' does not support Chess960, required by this opening",
                    engines[i].name()
                );
            }
        }
        engines[i].new_game().await?;
    }

    let mut ei = reverse as usize;
    let mut time_left = [
        specs[0].time.unwrap_or(0) as i64,
        specs[1].time.unwrap_or(0) as i64,
    ];
    let mut played: Option<shakmaty::Move> = None;
    let mut draw_ply_count: u32 = 0;
    let mut resign_count = [0u32; 2];

    loop {
        if let Some(mv) = played.take() {
            game.push_move(mv);
        }

        let legal_moves = match adjudicate(game) {
            Adjudication::Ended(state) => {
                game.state = state;
                break;
            }
            Adjudication::Ongoing(moves) => moves,
        };

        let position_cmd = position_command(game);
        engines[ei].send_position(&position_cmd).await?;

        if specs[ei].movetime.is_some() {
            time_left[ei] = specs[ei].movetime.unwrap() as i64;
        } else if is_timed_control(&specs[ei]) {
            prepare_time_left(&specs[ei], game.ply, &mut time_left[ei]);
        } else {
            time_left[ei] = INFINITE_TIME_MS;
        }

        let go_cmd = go_command(game, specs, ei, &time_left);
        let reply = engines[ei].go(&go_cmd, time_left[ei]).await?;
        game.info.push(reply.info);

        let resolved = reply.pv.as_deref().map(|pv| resolve_pv(game, pv));

        let Some(best) = reply.best else {
            game.state = GameState::TimeLoss;
            break;
        };

        let played_move = UciMove::from_ascii(best.as_bytes())
            .ok()
            .and_then(|uci| uci.to_move(game.current()).ok())
            .filter(|mv| legal_moves.contains(mv));

        let Some(mv) = played_move else {
            game.state = GameState::IllegalMove;
            break;
        };

        time_left[ei] -= reply.elapsed_ms;
        if is_timed_control(&specs[ei]) && time_left[ei] < 0 {
            game.state = GameState::TimeLoss;
            break;
        }

        let score = reply.info.score;

        if options.draw_count > 0 && score.abs() <= options.draw_score {
            draw_ply_count += 1;
            if draw_ply_count >= 2 * options.draw_count
                && game.ply as u32 / 2 + 1 >= options.draw_number
            {
                game.state = GameState::DrawAdjudication;
                break;
            }
        } else {
            draw_ply_count = 0;
        }

        if options.resign_count > 0 && score <= -options.resign_score {
            resign_count[ei] += 1;
            if resign_count[ei] >= options.resign_count
                && game.ply as u32 / 2 + 1 >= options.resign_number
            {
                game.state = GameState::Resign;
                break;
            }
        } else {
            resign_count[ei] = 0;
        }

        let resolved_pos = resolved.as_ref().unwrap_or(game.current());
        if let Some(sample) = accept_sample(&options.sample_policy, game, resolved_pos, score, rng)
        {
            game.samples.push(sample);
        }

        played = Some(mv);
        ei = 1 - ei;
    }

    game.label_samples();

    Ok(if game.state.is_decisive() {
        if ei == 0 {
            MatchOutcome::Loss
        } else {
            MatchOutcome::Win
        }
    } else {
        MatchOutcome::Draw
    })
}

/// `names[color] = engines[color ^ turn0 ^ reverse].name`, per spec.md
/// §4.5: the engine seated in a given color is determined by who has the
/// move first in the starting position, XORed with the pairing reversal.
fn seat_names(game: &mut Game, engines: &[Box<dyn UciEngine>; 2], reverse: bool) {
    let turn0 = color_index(&game.pos[0]);
    for color in 0..2 {
        let engine_index = color ^ turn0 ^ (reverse as usize);
        game.names[color] = engines[engine_index].name().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_proto::BestMoveReply;
    use crate::position::Info;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use shakmaty::Chess;
    use std::collections::VecDeque;

    /// An in-process stand-in for a real engine: replies with a
    /// pre-scripted sequence of best moves (and optional PVs/scores),
    /// exercising the driver without spawning a subprocess.
    struct ScriptedEngine {
        name: String,
        supports_chess960: bool,
        replies: VecDeque<BestMoveReply>,
    }

    impl ScriptedEngine {
        fn new(name: &str, moves: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                supports_chess960: false,
                replies: moves
                    .iter()
                    .map(|m| BestMoveReply {
                        best: Some(m.to_string()),
                        pv: None,
                        info: Info {
                            depth: 1,
                            score: 0,
                            time_ms: 1,
                        },
                        elapsed_ms: 1,
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl UciEngine for ScriptedEngine {
        fn name(&self) -> &str {
            &self.name
        }

        fn supports_chess960(&self) -> bool {
            self.supports_chess960
        }

        async fn set_chess960(&mut self) -> MatchResult<()> {
            Ok(())
        }

        async fn new_game(&mut self) -> MatchResult<()> {
            Ok(())
        }

        async fn send_position(&mut self, _command: &str) -> MatchResult<()> {
            Ok(())
        }

        async fn go(&mut self, _command: &str, _deadline_ms: i64) -> MatchResult<BestMoveReply> {
            Ok(self.replies.pop_front().unwrap_or_default())
        }
    }

    fn spec() -> EngineSpec {
        EngineSpec {
            path: "/bin/true".into(),
            name: None,
            supports_chess960: false,
            options: Vec::new(),
            time: None,
            increment: None,
            movetime: None,
            nodes: None,
            depth: Some(1),
            movestogo: None,
        }
    }

    #[tokio::test]
    async fn fools_mate_ends_in_checkmate_and_engine_zero_wins() {
        // White (engine 0) plays f3 and g4; Black (engine 1) plays e5 and Qh4#.
        let mut engines: [Box<dyn UciEngine>; 2] = [
            Box::new(ScriptedEngine::new("white-engine", &["f2f3", "g2g4"])),
            Box::new(ScriptedEngine::new("black-engine", &["e7e5", "d8h4"])),
        ];
        let specs = [spec(), spec()];
        let options = Options::default();
        let mut game = Game::new(0, 0, Chess::default());
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = play(&mut engines, &specs, &options, &mut game, false, &mut rng)
            .await
            .unwrap();

        assert_eq!(game.state, GameState::Checkmate);
        // Black delivered mate, so engine 0 (seated White) lost.
        assert_eq!(outcome, MatchOutcome::Loss);
    }

    #[tokio::test]
    async fn missing_bestmove_is_a_time_loss_for_the_engine_on_move() {
        let mut white = ScriptedEngine::new("white-engine", &[]);
        white.replies.push_back(BestMoveReply::default());
        let mut engines: [Box<dyn UciEngine>; 2] =
            [Box::new(white), Box::new(ScriptedEngine::new("black-engine", &[]))];
        let specs = [spec(), spec()];
        let options = Options::default();
        let mut game = Game::new(0, 0, Chess::default());
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = play(&mut engines, &specs, &options, &mut game, false, &mut rng)
            .await
            .unwrap();

        assert_eq!(game.state, GameState::TimeLoss);
        assert_eq!(outcome, MatchOutcome::Loss);
    }

    #[tokio::test]
    async fn illegal_move_ends_the_game_immediately() {
        let mut white = ScriptedEngine::new("white-engine", &[]);
        white.replies.push_back(BestMoveReply {
            best: Some("a1a8".to_string()),
            ..Default::default()
        });
        let mut engines: [Box<dyn UciEngine>; 2] =
            [Box::new(white), Box::new(ScriptedEngine::new("black-engine", &[]))];
        let specs = [spec(), spec()];
        let options = Options::default();
        let mut game = Game::new(0, 0, Chess::default());
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = play(&mut engines, &specs, &options, &mut game, false, &mut rng)
            .await
            .unwrap();

        assert_eq!(game.state, GameState::IllegalMove);
        assert_eq!(outcome, MatchOutcome::Loss);
    }
}
